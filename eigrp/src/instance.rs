//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use eigrp_utils::ip::AddressFamily;
use eigrp_utils::southbound::Protocol;
use eigrp_utils::{Receiver, Sender, UnboundedReceiver, UnboundedSender};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::collections::{NeighborIndex, Neighbors, Replies};
use crate::debug::Debug;
use crate::dual;
use crate::events;
use crate::interface::Interfaces;
use crate::metric::LinkAttrs;
use crate::neighbor::{Neighbor, NeighborFlags};
use crate::northbound;
use crate::southbound;
use crate::tasks::messages::input::{
    NetworkMsg, ProtocolInputMsg, ReplyTimeoutMsg, TopologyDumpMsg,
    TransportRxMsg,
};
use crate::tasks::messages::output::{ProtocolMsg, SouthboundMsg};
use crate::topology::Topology;

// One EIGRP routing instance: the topology table and everything operating
// on it, driven exclusively by the message channels.
#[derive(Debug)]
pub struct Instance {
    pub name: String,
    pub config: InstanceCfg,
    pub state: InstanceState,
    pub tx: InstanceChannelsTx,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct InstanceCfg {
    pub af: AddressFamily,
    pub as_number: u16,
    pub router_id: Ipv4Addr,
    // Seconds a queried neighbor is given to reply before being declared
    // stuck. Zero disables the supervision entirely.
    pub active_timeout: u16,
    pub default_metric: LinkAttrs,
    pub redistribute: Vec<RedistRule>,
}

// One redistribution policy rule. `None` fields match anything; the first
// matching rule decides.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RedistRule {
    pub protocol: Option<Protocol>,
    pub prefix: Option<IpNetwork>,
    pub allow: bool,
    pub metric: Option<LinkAttrs>,
}

#[derive(Debug)]
pub struct InstanceState {
    pub topology: Topology,
    pub neighbors: Neighbors,
    pub replies: Replies,
    pub interfaces: Interfaces,
    // Synthetic neighbor originating connected routes.
    pub self_nbr: NeighborIndex,
    // Synthetic neighbor originating redistributed routes.
    pub redist_nbr: NeighborIndex,
}

#[derive(Clone, Debug)]
pub struct InstanceChannelsTx {
    pub protocol_input: ProtocolInputChannelsTx,
    pub transport: UnboundedSender<ProtocolMsg>,
    pub southbound: UnboundedSender<SouthboundMsg>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    pub transport: Sender<TransportRxMsg>,
    pub reply_active_timeout: Sender<ReplyTimeoutMsg>,
    pub reply_sia_timeout: Sender<ReplyTimeoutMsg>,
    pub network: Sender<NetworkMsg>,
    pub topology_dump: Sender<TopologyDumpMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    pub transport: Receiver<TransportRxMsg>,
    pub reply_active_timeout: Receiver<ReplyTimeoutMsg>,
    pub reply_sia_timeout: Receiver<ReplyTimeoutMsg>,
    pub network: Receiver<NetworkMsg>,
    pub topology_dump: Receiver<TopologyDumpMsg>,
}

// ===== impl Instance =====

impl Instance {
    pub fn new(
        name: String,
        config: InstanceCfg,
        tx: InstanceChannelsTx,
    ) -> Instance {
        Debug::InstanceCreate(&name).log();

        let af = config.af;
        let mut neighbors = Neighbors::default();
        let (self_nbr, _) = neighbors
            .insert(None, |id| Neighbor::new_self(id, af, NeighborFlags::empty()));
        let (redist_nbr, _) = neighbors
            .insert(None, |id| Neighbor::new_self(id, af, NeighborFlags::REDIST));

        Instance {
            name,
            config,
            state: InstanceState {
                topology: Default::default(),
                neighbors,
                replies: Default::default(),
                interfaces: Default::default(),
                self_nbr,
                redist_nbr,
            },
            tx,
        }
    }

    // Instance event loop.
    pub async fn run(&mut self, mut rx: ProtocolInputChannelsRx) {
        while let Some(msg) = rx.recv().await {
            self.process_protocol_msg(msg);
        }
    }

    pub fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        match msg {
            ProtocolInputMsg::Transport(msg) => {
                self.process_transport_msg(msg)
            }
            ProtocolInputMsg::ReplyActiveTimeout(msg) => {
                dual::handle_reply_active_timeout(self, msg)
            }
            ProtocolInputMsg::ReplySiaTimeout(msg) => {
                dual::handle_reply_sia_timeout(self, msg)
            }
            ProtocolInputMsg::Network(NetworkMsg::Add(msg)) => {
                southbound::rx::process_route_add(self, msg)
            }
            ProtocolInputMsg::Network(NetworkMsg::Del(msg)) => {
                southbound::rx::process_route_del(self, msg)
            }
            ProtocolInputMsg::TopologyDump(msg) => {
                let dump = northbound::topology_dump(self, &msg.filter);
                let _ = msg.responder.send(dump);
            }
        }
    }

    fn process_transport_msg(&mut self, msg: TransportRxMsg) {
        match msg {
            TransportRxMsg::NeighborUp { addr, ifindex } => {
                events::process_neighbor_up(self, addr, ifindex)
            }
            TransportRxMsg::NeighborDown { addr } => {
                if let Err(error) = events::process_neighbor_down(self, addr)
                {
                    error.log();
                }
            }
            TransportRxMsg::UpdateRequest { addr } => {
                if let Err(error) = events::process_update_request(self, addr)
                {
                    error.log();
                }
            }
            TransportRxMsg::InterfaceUpdate {
                ifindex,
                name,
                config,
            } => events::process_interface_update(self, ifindex, name, config),
            TransportRxMsg::LinkDown { ifindex } => {
                events::process_link_down(self, ifindex)
            }
            TransportRxMsg::AddressAdd { ifindex, prefix } => {
                events::process_addr_add(self, ifindex, prefix)
            }
            TransportRxMsg::AddressDel { ifindex, prefix } => {
                events::process_addr_del(self, ifindex, prefix)
            }
            TransportRxMsg::Update { src, routes } => {
                for ri in routes {
                    if let Err(error) =
                        events::process_route_update(self, src, ri)
                    {
                        error.log();
                    }
                }
            }
            TransportRxMsg::Query { src, routes } => {
                for ri in routes {
                    if let Err(error) =
                        events::process_route_query(self, src, ri, false)
                    {
                        error.log();
                    }
                }
            }
            TransportRxMsg::Reply { src, routes } => {
                for ri in routes {
                    if let Err(error) =
                        events::process_route_reply(self, src, ri, false)
                    {
                        error.log();
                    }
                }
            }
            TransportRxMsg::SiaQuery { src, route } => {
                if let Err(error) =
                    events::process_route_query(self, src, route, true)
                {
                    error.log();
                }
            }
            TransportRxMsg::SiaReply { src, route } => {
                if let Err(error) =
                    events::process_route_reply(self, src, route, true)
                {
                    error.log();
                }
            }
        }
    }
}

// ===== impl ProtocolInputChannelsRx =====

impl ProtocolInputChannelsRx {
    pub async fn recv(&mut self) -> Option<ProtocolInputMsg> {
        tokio::select! {
            biased;
            msg = self.reply_active_timeout.recv() => {
                msg.map(ProtocolInputMsg::ReplyActiveTimeout)
            }
            msg = self.reply_sia_timeout.recv() => {
                msg.map(ProtocolInputMsg::ReplySiaTimeout)
            }
            msg = self.transport.recv() => {
                msg.map(ProtocolInputMsg::Transport)
            }
            msg = self.network.recv() => {
                msg.map(ProtocolInputMsg::Network)
            }
            msg = self.topology_dump.recv() => {
                msg.map(ProtocolInputMsg::TopologyDump)
            }
        }
    }
}

// ===== global functions =====

// Creates the full channel set wiring one instance to its transport layer
// and the RIB.
pub fn instance_channels() -> (
    InstanceChannelsTx,
    ProtocolInputChannelsRx,
    UnboundedReceiver<ProtocolMsg>,
    UnboundedReceiver<SouthboundMsg>,
) {
    let (transport_inp, transport_inr) = mpsc::channel(4);
    let (reply_active_timeoutp, reply_active_timeoutr) = mpsc::channel(4);
    let (reply_sia_timeoutp, reply_sia_timeoutr) = mpsc::channel(4);
    let (networkp, networkr) = mpsc::channel(4);
    let (topology_dumpp, topology_dumpr) = mpsc::channel(4);
    let (transport_outp, transport_outr) = mpsc::unbounded_channel();
    let (southboundp, southboundr) = mpsc::unbounded_channel();

    let tx = InstanceChannelsTx {
        protocol_input: ProtocolInputChannelsTx {
            transport: transport_inp,
            reply_active_timeout: reply_active_timeoutp,
            reply_sia_timeout: reply_sia_timeoutp,
            network: networkp,
            topology_dump: topology_dumpp,
        },
        transport: transport_outp,
        southbound: southboundp,
    };
    let rx = ProtocolInputChannelsRx {
        transport: transport_inr,
        reply_active_timeout: reply_active_timeoutr,
        reply_sia_timeout: reply_sia_timeoutr,
        network: networkr,
        topology_dump: topology_dumpr,
    };
    (tx, rx, transport_outr, southboundr)
}
