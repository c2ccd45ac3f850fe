//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use const_addrs::{ip, net};
use eigrp::collections::ReplyIndex;
use eigrp::dual::fsm;
use eigrp::instance::{
    Instance, InstanceCfg, ProtocolInputChannelsRx, RedistRule,
    instance_channels,
};
use eigrp::interface::InterfaceCfg;
use eigrp::metric::{LinkAttrs, Metric};
use eigrp::northbound::{self, TopologyDumpFilter};
use eigrp::route::{RouteInfo, RouteKind};
use eigrp::tasks::messages::input::{
    NetworkMsg, ProtocolInputMsg, ReplyTimeoutMsg, TransportRxMsg,
};
use eigrp::tasks::messages::output::{
    ProtocolMsg, SendDestination, SouthboundMsg,
};
use eigrp_utils::UnboundedReceiver;
use eigrp_utils::ip::AddressFamily;
use eigrp_utils::southbound::{Protocol, RouteKeyMsg, RouteMsg};
use ipnetwork::IpNetwork;

struct TestSetup {
    instance: Instance,
    transport_rx: UnboundedReceiver<ProtocolMsg>,
    southbound_rx: UnboundedReceiver<SouthboundMsg>,
    _input_rx: ProtocolInputChannelsRx,
}

fn setup() -> TestSetup {
    setup_with(|_| ())
}

fn setup_with(patch_config: impl FnOnce(&mut InstanceCfg)) -> TestSetup {
    let (tx, input_rx, transport_rx, southbound_rx) = instance_channels();
    let mut config = InstanceCfg {
        af: AddressFamily::Ipv4,
        as_number: 1,
        router_id: "1.1.1.1".parse().unwrap(),
        active_timeout: 180,
        default_metric: LinkAttrs {
            delay: 10,
            bandwidth: 100000,
            mtu: 1500,
        },
        redistribute: vec![],
    };
    patch_config(&mut config);
    let instance = Instance::new("test".to_owned(), config, tx);
    TestSetup {
        instance,
        transport_rx,
        southbound_rx,
        _input_rx: input_rx,
    }
}

impl TestSetup {
    fn process(&mut self, msg: TransportRxMsg) {
        self.instance
            .process_protocol_msg(ProtocolInputMsg::Transport(msg));
    }

    fn nbr_up(&mut self, addr: IpAddr, ifindex: u32) {
        self.process(TransportRxMsg::NeighborUp { addr, ifindex });
        self.drain_protocol();
    }

    fn update(&mut self, src: IpAddr, ri: RouteInfo) {
        self.process(TransportRxMsg::Update {
            src,
            routes: vec![ri],
        });
    }

    fn reply(&mut self, src: IpAddr, ri: RouteInfo) {
        self.process(TransportRxMsg::Reply {
            src,
            routes: vec![ri],
        });
    }

    fn drain_protocol(&mut self) -> Vec<ProtocolMsg> {
        let mut msgs = vec![];
        while let Ok(msg) = self.transport_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    fn drain_southbound(&mut self) -> Vec<SouthboundMsg> {
        let mut msgs = vec![];
        while let Ok(msg) = self.southbound_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    fn dump(&self) -> Vec<northbound::RouteSnapshot> {
        northbound::topology_dump(
            &self.instance,
            &TopologyDumpFilter::default(),
        )
    }

    fn nbr_id(&self, addr: IpAddr) -> usize {
        northbound::neighbor_dump(&self.instance)
            .into_iter()
            .find(|nbr| nbr.addr == addr)
            .map(|nbr| nbr.id)
            .unwrap()
    }

    fn pending_replies(&self, addr: IpAddr) -> usize {
        northbound::neighbor_dump(&self.instance)
            .into_iter()
            .find(|nbr| nbr.addr == addr)
            .map(|nbr| nbr.replies.len())
            .unwrap()
    }

    // Arena handle of the open reply record the given neighbor owes for the
    // given destination.
    fn reply_idx(&self, addr: IpAddr, prefix: IpNetwork) -> ReplyIndex {
        northbound::neighbor_dump(&self.instance)
            .into_iter()
            .find(|nbr| nbr.addr == addr)
            .and_then(|nbr| {
                nbr.replies
                    .into_iter()
                    .find(|reply| reply.prefix == prefix)
            })
            .map(|reply| reply.index)
            .unwrap()
    }
}

fn internal(prefix: IpNetwork, delay: u32) -> RouteInfo {
    let link = LinkAttrs {
        delay,
        bandwidth: 100000,
        mtu: 1500,
    };
    RouteInfo::new(RouteKind::Internal, prefix, Metric::from_link(&link), None)
}

fn withdraw(prefix: IpNetwork) -> RouteInfo {
    RouteInfo::new_withdraw(RouteKind::Internal, prefix)
}

fn nbr_a() -> IpAddr {
    ip!("10.0.1.2")
}

fn nbr_b() -> IpAddr {
    ip!("10.0.2.2")
}

// Composite distances with the default link attributes: a route advertised
// with delay 10 arrives as 28160 and ages to 30720 over one default hop.
const DIST_ONE_HOP: u32 = 30720;

#[test]
fn feasible_update_becomes_successor() {
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);

    s.update(nbr_a(), internal(net!("192.168.1.0/24"), 10));

    let dump = s.dump();
    assert_eq!(dump.len(), 1);
    let node = &dump[0];
    assert_eq!(node.state, fsm::State::Passive);
    assert_eq!(node.successor, Some(nbr_a()));
    assert_eq!(node.distance, DIST_ONE_HOP);
    assert_eq!(node.fdistance, DIST_ONE_HOP);

    // One FIB install, with the internal administrative distance.
    let msgs = s.drain_southbound();
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        SouthboundMsg::RouteInstall(msg) => {
            assert_eq!(msg.protocol, Protocol::Eigrp);
            assert_eq!(msg.distance, 90);
            assert_eq!(msg.metric, DIST_ONE_HOP);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // Split horizon: the only interface is the one the route came from.
    assert!(s.drain_protocol().is_empty());
}

#[test]
fn better_feasible_route_switches_successor() {
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(net!("192.168.1.0/24"), 10));
    s.drain_protocol();
    s.drain_southbound();

    // Lower delay via B: reported distance passes the feasibility check.
    s.update(nbr_b(), internal(net!("192.168.1.0/24"), 5));

    let dump = s.dump();
    assert_eq!(dump[0].state, fsm::State::Passive);
    assert_eq!(dump[0].successor, Some(nbr_b()));
    assert_eq!(dump[0].routes.len(), 2);

    // The switch reaches the FIB and is advertised away from B's link.
    let msgs = s.drain_southbound();
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0], SouthboundMsg::RouteInstall(..)));
    let msgs = s.drain_protocol();
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        ProtocolMsg::Update { dst, .. } => {
            assert_eq!(*dst, SendDestination::Interface(1));
        }
        msg => panic!("unexpected message: {:?}", msg),
    }
}

#[test]
fn successor_loss_starts_computation() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    // B's path fails the feasibility check and stays a mere candidate.
    s.update(nbr_b(), internal(prefix, 200));
    s.drain_protocol();
    s.drain_southbound();

    s.update(nbr_a(), withdraw(prefix));

    let dump = s.dump();
    assert_eq!(dump[0].state, fsm::State::Active1);
    assert_eq!(s.pending_replies(nbr_b()), 1);
    // A is behind the old successor's interface: split horizon keeps it
    // out of the computation.
    assert_eq!(s.pending_replies(nbr_a()), 0);

    let msgs = s.drain_protocol();
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        ProtocolMsg::Query { dst, routes } => {
            assert_eq!(*dst, SendDestination::Interface(2));
            assert!(routes[0].metric.flags.contains(
                eigrp::metric::MetricFlags::ACTIVE
            ));
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // The old route stays installed while the computation runs.
    assert!(s.drain_southbound().is_empty());
}

#[test]
fn all_infinite_replies_start_second_round() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    s.update(nbr_a(), withdraw(prefix));
    s.drain_protocol();
    s.drain_southbound();

    // Round one: B has no path either.
    s.reply(nbr_b(), withdraw(prefix));

    let dump = s.dump();
    assert_eq!(dump[0].state, fsm::State::Active0);
    assert_eq!(s.pending_replies(nbr_b()), 1);
    let msgs = s.drain_protocol();
    assert!(
        msgs.iter().any(|msg| matches!(msg, ProtocolMsg::Query { .. })),
        "expected a second query round"
    );
    assert!(s.drain_southbound().is_empty());

    // Round two: B found a path. A single FIB change concludes the
    // computation.
    s.reply(nbr_b(), internal(prefix, 200));

    let dump = s.dump();
    assert_eq!(dump[0].state, fsm::State::Passive);
    assert_eq!(dump[0].successor, Some(nbr_b()));
    let msgs = s.drain_southbound();
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0], SouthboundMsg::RouteInstall(..)));
}

#[test]
fn neighbor_removal_settles_all_its_replies() {
    let prefix1 = net!("192.168.1.0/24");
    let prefix2 = net!("192.168.2.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix1, 10));
    s.update(nbr_a(), internal(prefix2, 10));
    s.update(nbr_a(), withdraw(prefix1));
    s.update(nbr_a(), withdraw(prefix2));
    assert_eq!(s.pending_replies(nbr_b()), 2);
    s.drain_protocol();
    s.drain_southbound();

    s.process(TransportRxMsg::NeighborDown { addr: nbr_b() });

    // Both computations conclude with nobody left to ask; both
    // destinations are gone.
    assert!(s.dump().is_empty());
    let nbrs = northbound::neighbor_dump(&s.instance);
    assert_eq!(nbrs.len(), 1);
    assert_eq!(nbrs[0].addr, nbr_a());
    assert!(nbrs[0].replies.is_empty());

    let uninstalls = s
        .drain_southbound()
        .into_iter()
        .filter(|msg| matches!(msg, SouthboundMsg::RouteUninstall(..)))
        .count();
    assert_eq!(uninstalls, 2);
}

#[test]
fn query_with_feasible_successor_answered_immediately() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    s.drain_protocol();
    s.drain_southbound();

    // B lost its own path and asks around. This router is unaffected.
    s.process(TransportRxMsg::Query {
        src: nbr_b(),
        routes: vec![internal(prefix, 200)],
    });

    assert_eq!(s.dump()[0].state, fsm::State::Passive);
    let msgs = s.drain_protocol();
    let reply = msgs
        .iter()
        .find_map(|msg| match msg {
            ProtocolMsg::Reply { dst, routes } => Some((dst, routes)),
            _ => None,
        })
        .expect("expected an immediate reply");
    assert_eq!(*reply.0, nbr_b());
    assert!(!reply.1[0].is_withdraw());
    assert!(
        !reply.1[0]
            .metric
            .flags
            .contains(eigrp::metric::MetricFlags::ACTIVE)
    );
}

#[test]
fn successor_query_without_alternative_is_answered_with_infinity() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);

    s.update(nbr_a(), internal(prefix, 10));
    s.drain_protocol();
    s.drain_southbound();

    // The successor itself lost the destination. With no other neighbor
    // the computation concludes on the spot: exactly one reply, infinite.
    s.process(TransportRxMsg::Query {
        src: nbr_a(),
        routes: vec![withdraw(prefix)],
    });

    assert!(s.dump().is_empty());
    let replies = s
        .drain_protocol()
        .into_iter()
        .filter_map(|msg| match msg {
            ProtocolMsg::Reply { dst, routes } => Some((dst, routes)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, nbr_a());
    assert!(replies[0].1[0].is_withdraw());

    let msgs = s.drain_southbound();
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0], SouthboundMsg::RouteUninstall(..)));
}

#[test]
fn stuck_neighbor_is_probed_then_evicted() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    s.update(nbr_a(), withdraw(prefix));
    s.drain_protocol();
    s.drain_southbound();
    let nbr_b_id = s.nbr_id(nbr_b());
    let reply_idx = s.reply_idx(nbr_b(), prefix);

    // First expiry: a probe goes out.
    s.instance.process_protocol_msg(ProtocolInputMsg::ReplySiaTimeout(
        ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx,
        },
    ));
    let msgs = s.drain_protocol();
    assert!(
        msgs.iter()
            .any(|msg| matches!(msg, ProtocolMsg::SiaQuery { .. }))
    );

    // The probe is answered without progress: the record stays open.
    s.process(TransportRxMsg::SiaReply {
        src: nbr_b(),
        route: withdraw(prefix),
    });
    assert_eq!(s.pending_replies(nbr_b()), 1);

    // Second expiry: another probe.
    s.instance.process_protocol_msg(ProtocolInputMsg::ReplySiaTimeout(
        ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx,
        },
    ));
    let msgs = s.drain_protocol();
    assert!(
        msgs.iter()
            .any(|msg| matches!(msg, ProtocolMsg::SiaQuery { .. }))
    );

    // Third expiry with the probe unanswered: eviction.
    s.instance.process_protocol_msg(ProtocolInputMsg::ReplySiaTimeout(
        ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx,
        },
    ));
    let nbrs = northbound::neighbor_dump(&s.instance);
    assert_eq!(nbrs.len(), 1);
    assert_eq!(nbrs[0].addr, nbr_a());
    assert!(s.dump().is_empty());
}

#[test]
fn active_timeout_evicts_neighbor() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    s.update(nbr_a(), withdraw(prefix));
    let nbr_b_id = s.nbr_id(nbr_b());
    let reply_idx = s.reply_idx(nbr_b(), prefix);

    s.instance.process_protocol_msg(
        ProtocolInputMsg::ReplyActiveTimeout(ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx,
        }),
    );

    let nbrs = northbound::neighbor_dump(&s.instance);
    assert_eq!(nbrs.len(), 1);
    assert_eq!(nbrs[0].addr, nbr_a());
}

#[test]
fn stale_timeout_is_ignored_after_record_turnover() {
    let prefix = net!("192.168.1.0/24");
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);

    s.update(nbr_a(), internal(prefix, 10));
    s.update(nbr_a(), withdraw(prefix));
    let nbr_b_id = s.nbr_id(nbr_b());
    let stale_idx = s.reply_idx(nbr_b(), prefix);
    s.drain_protocol();
    s.drain_southbound();

    // B's infinite reply settles the first record; the second round reopens
    // one under the very same destination and neighbor.
    s.reply(nbr_b(), withdraw(prefix));
    let fresh_idx = s.reply_idx(nbr_b(), prefix);
    assert_ne!(stale_idx, fresh_idx);

    // A timeout queued against the settled record must not punish the
    // neighbor for the record that replaced it.
    s.instance.process_protocol_msg(
        ProtocolInputMsg::ReplyActiveTimeout(ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx: stale_idx,
        }),
    );
    assert_eq!(northbound::neighbor_dump(&s.instance).len(), 2);
    assert_eq!(s.pending_replies(nbr_b()), 1);

    // The fresh record's own timeout still evicts.
    s.instance.process_protocol_msg(
        ProtocolInputMsg::ReplyActiveTimeout(ReplyTimeoutMsg {
            prefix,
            nbr_id: nbr_b_id,
            reply_idx: fresh_idx,
        }),
    );
    let nbrs = northbound::neighbor_dump(&s.instance);
    assert_eq!(nbrs.len(), 1);
    assert_eq!(nbrs[0].addr, nbr_a());
}

#[test]
fn new_neighbor_receives_full_table() {
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.update(nbr_a(), internal(net!("192.168.1.0/24"), 10));
    s.drain_protocol();

    // A fresh adjacency on another link gets the whole table.
    s.process(TransportRxMsg::NeighborUp {
        addr: nbr_b(),
        ifindex: 2,
    });
    let msgs = s.drain_protocol();
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        ProtocolMsg::Update { dst, routes } => {
            assert_eq!(*dst, SendDestination::Neighbor(nbr_b()));
            assert_eq!(routes.len(), 1);
            assert_eq!(routes[0].prefix, net!("192.168.1.0/24"));
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // A fresh adjacency on the route's own link gets nothing.
    s.process(TransportRxMsg::NeighborUp {
        addr: ip!("10.0.1.3"),
        ifindex: 1,
    });
    assert!(s.drain_protocol().is_empty());
}

#[test]
fn update_request_resends_full_table() {
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.nbr_up(nbr_b(), 2);
    s.update(nbr_a(), internal(net!("192.168.1.0/24"), 10));
    s.drain_protocol();

    s.process(TransportRxMsg::UpdateRequest { addr: nbr_b() });
    let msgs = s.drain_protocol();
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        ProtocolMsg::Update { dst, routes } => {
            assert_eq!(*dst, SendDestination::Neighbor(nbr_b()));
            assert_eq!(routes.len(), 1);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // The requester sits on the route's own link: split horizon leaves the
    // batch empty.
    s.process(TransportRxMsg::UpdateRequest { addr: nbr_a() });
    assert!(s.drain_protocol().is_empty());
}

#[test]
fn connected_prefix_is_originated_and_withdrawn() {
    let prefix = net!("10.0.1.0/24");
    let mut s = setup();
    s.process(TransportRxMsg::InterfaceUpdate {
        ifindex: 1,
        name: "eth0".to_owned(),
        config: InterfaceCfg::default(),
    });
    s.process(TransportRxMsg::AddressAdd { ifindex: 1, prefix });

    let dump = s.dump();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].state, fsm::State::Passive);
    assert_eq!(dump[0].kind, RouteKind::Internal);
    // Locally originated: no remote successor, nothing to install.
    assert_eq!(dump[0].successor, None);
    assert!(dump[0].routes[0].local);
    assert_eq!(dump[0].routes[0].rdistance, 0);
    assert!(s.drain_southbound().is_empty());

    s.process(TransportRxMsg::LinkDown { ifindex: 1 });
    assert!(s.dump().is_empty());
}

#[test]
fn redistribution_follows_policy() {
    let mut s = setup_with(|config| {
        config.redistribute = vec![RedistRule {
            protocol: Some(Protocol::Static),
            prefix: None,
            allow: true,
            metric: None,
        }];
    });
    s.nbr_up(nbr_a(), 1);

    // A static route matches the policy and becomes an external route.
    s.instance.process_protocol_msg(ProtocolInputMsg::Network(
        NetworkMsg::Add(RouteMsg {
            protocol: Protocol::Static,
            prefix: net!("172.16.0.0/16"),
            distance: 1,
            metric: 0,
            tag: None,
            nexthops: Default::default(),
        }),
    ));

    let dump = s.dump();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].kind, RouteKind::External);
    assert!(s.drain_southbound().is_empty());
    let msgs = s.drain_protocol();
    match &msgs[0] {
        ProtocolMsg::Update { routes, .. } => {
            let external = routes[0].external.expect("external attributes");
            assert_eq!(external.protocol, Protocol::Static);
            assert_eq!(external.as_number, 1);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // An OSPF route matches no rule and is ignored.
    s.instance.process_protocol_msg(ProtocolInputMsg::Network(
        NetworkMsg::Add(RouteMsg {
            protocol: Protocol::Ospf,
            prefix: net!("172.17.0.0/16"),
            distance: 110,
            metric: 20,
            tag: None,
            nexthops: Default::default(),
        }),
    ));
    assert_eq!(s.dump().len(), 1);

    // Withdrawing the source route leaves no candidate: a computation
    // starts and the neighbor is queried.
    s.instance.process_protocol_msg(ProtocolInputMsg::Network(
        NetworkMsg::Del(RouteKeyMsg {
            protocol: Protocol::Static,
            prefix: net!("172.16.0.0/16"),
        }),
    ));
    let dump = s.dump();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].state, fsm::State::Active1);
    assert_eq!(s.pending_replies(nbr_a()), 1);
    let msgs = s.drain_protocol();
    assert!(
        msgs.iter().any(|msg| matches!(msg, ProtocolMsg::Query { .. }))
    );

    // The neighbor has no path either; the locally originated destination
    // keeps asking whoever is still around.
    s.reply(
        nbr_a(),
        RouteInfo::new_withdraw(RouteKind::External, net!("172.16.0.0/16")),
    );
    assert_eq!(s.dump()[0].state, fsm::State::Active0);
    assert_eq!(s.pending_replies(nbr_a()), 1);

    // Once nobody is left to ask the destination is gone for good.
    s.process(TransportRxMsg::NeighborDown { addr: nbr_a() });
    assert!(s.dump().is_empty());
}

#[test]
fn topology_dump_filters() {
    let mut s = setup();
    s.nbr_up(nbr_a(), 1);
    s.update(nbr_a(), internal(net!("192.168.1.0/24"), 10));
    s.update(nbr_a(), internal(net!("192.168.2.0/24"), 10));

    assert_eq!(s.dump().len(), 2);
    // Dumps come out in prefix order.
    let prefixes = s
        .dump()
        .iter()
        .map(|node| node.prefix)
        .collect::<Vec<_>>();
    assert_eq!(
        prefixes,
        vec![net!("192.168.1.0/24"), net!("192.168.2.0/24")]
    );

    let filtered = northbound::topology_dump(
        &s.instance,
        &TopologyDumpFilter {
            prefix: Some(net!("192.168.2.0/24")),
            ..Default::default()
        },
    );
    assert_eq!(filtered.len(), 1);

    let active_only = northbound::topology_dump(
        &s.instance,
        &TopologyDumpFilter {
            active_only: true,
            ..Default::default()
        },
    );
    assert!(active_only.is_empty());
}
