//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use eigrp_utils::Sender;
use eigrp_utils::task::TimeoutTask;
use ipnetwork::IpNetwork;

use crate::collections::{NeighborId, ReplyIndex};
use crate::tasks::messages::input::ReplyTimeoutMsg;

// EIGRP inter-task message types.
pub mod messages {
    // Messages received by the instance (from the transport layer, the RIB
    // or the instance's own timers).
    pub mod input {
        use std::net::IpAddr;

        use eigrp_utils::Responder;
        use eigrp_utils::southbound::{RouteKeyMsg, RouteMsg};
        use ipnetwork::IpNetwork;
        use serde::{Deserialize, Serialize};

        use crate::collections::{NeighborId, ReplyIndex};
        use crate::interface::InterfaceCfg;
        use crate::northbound::{RouteSnapshot, TopologyDumpFilter};
        use crate::route::RouteInfo;

        #[derive(Debug)]
        pub enum ProtocolInputMsg {
            Transport(TransportRxMsg),
            ReplyActiveTimeout(ReplyTimeoutMsg),
            ReplySiaTimeout(ReplyTimeoutMsg),
            Network(NetworkMsg),
            TopologyDump(TopologyDumpMsg),
        }

        // Adjacency, link and routing messages decoded by the transport
        // layer.
        #[derive(Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub enum TransportRxMsg {
            NeighborUp { addr: IpAddr, ifindex: u32 },
            NeighborDown { addr: IpAddr },
            // Request to resend the full topology table to one neighbor.
            UpdateRequest { addr: IpAddr },
            InterfaceUpdate {
                ifindex: u32,
                name: String,
                config: InterfaceCfg,
            },
            LinkDown { ifindex: u32 },
            AddressAdd { ifindex: u32, prefix: IpNetwork },
            AddressDel { ifindex: u32, prefix: IpNetwork },
            Update { src: IpAddr, routes: Vec<RouteInfo> },
            Query { src: IpAddr, routes: Vec<RouteInfo> },
            Reply { src: IpAddr, routes: Vec<RouteInfo> },
            SiaQuery { src: IpAddr, route: RouteInfo },
            SiaReply { src: IpAddr, route: RouteInfo },
        }

        // The arena handle pins the message to one generation of the reply
        // record; a message queued behind the record's resolution no longer
        // matches any slot and is dropped.
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct ReplyTimeoutMsg {
            pub prefix: IpNetwork,
            pub nbr_id: NeighborId,
            pub reply_idx: ReplyIndex,
        }

        // RIB redistribution messages.
        #[derive(Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub enum NetworkMsg {
            Add(RouteMsg),
            Del(RouteKeyMsg),
        }

        #[derive(Debug)]
        pub struct TopologyDumpMsg {
            pub filter: TopologyDumpFilter,
            pub responder: Responder<Vec<RouteSnapshot>>,
        }
    }

    // Messages sent by the instance (to the transport layer and the RIB).
    pub mod output {
        use std::net::IpAddr;

        use eigrp_utils::southbound::{RouteKeyMsg, RouteMsg};
        use serde::Serialize;

        use crate::route::RouteInfo;

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Serialize)]
        pub enum ProtocolMsg {
            Update {
                dst: SendDestination,
                routes: Vec<RouteInfo>,
            },
            Query {
                dst: SendDestination,
                routes: Vec<RouteInfo>,
            },
            Reply {
                dst: IpAddr,
                routes: Vec<RouteInfo>,
            },
            SiaQuery {
                dst: IpAddr,
                route: RouteInfo,
            },
            SiaReply {
                dst: IpAddr,
                route: RouteInfo,
            },
        }

        // Either every adjacency on one interface or one single neighbor.
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        #[derive(Serialize)]
        pub enum SendDestination {
            Interface(u32),
            Neighbor(IpAddr),
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Serialize)]
        pub enum SouthboundMsg {
            RouteInstall(RouteMsg),
            RouteUninstall(RouteKeyMsg),
        }
    }
}

// ===== EIGRP tasks =====

// Watchdog for one reply record: fires once the full active timeout elapses
// without the queried neighbor answering.
pub(crate) fn reply_active_timeout(
    prefix: IpNetwork,
    nbr_id: NeighborId,
    reply_idx: ReplyIndex,
    timeout: Duration,
    reply_active_timeoutp: &Sender<ReplyTimeoutMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let reply_active_timeoutp = reply_active_timeoutp.clone();
        TimeoutTask::new(timeout, move || {
            let reply_active_timeoutp = reply_active_timeoutp.clone();
            async move {
                let msg = ReplyTimeoutMsg {
                    prefix,
                    nbr_id,
                    reply_idx,
                };
                let _ = reply_active_timeoutp.send(msg).await;
            }
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// Escalation timer for one reply record: fires at half the active timeout
// to trigger stuck-in-active probing.
pub(crate) fn reply_sia_timeout(
    prefix: IpNetwork,
    nbr_id: NeighborId,
    reply_idx: ReplyIndex,
    timeout: Duration,
    reply_sia_timeoutp: &Sender<ReplyTimeoutMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let reply_sia_timeoutp = reply_sia_timeoutp.clone();
        TimeoutTask::new(timeout, move || {
            let reply_sia_timeoutp = reply_sia_timeoutp.clone();
            async move {
                let msg = ReplyTimeoutMsg {
                    prefix,
                    nbr_id,
                    reply_idx,
                };
                let _ = reply_sia_timeoutp.send(msg).await;
            }
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}
