//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;

use eigrp_utils::southbound::InterfaceFlags;

use crate::collections::Neighbors;
use crate::debug::Debug;
use crate::instance::InstanceChannelsTx;
use crate::interface::Interfaces;
use crate::route::RouteInfo;
use crate::tasks::messages::output::{ProtocolMsg, SendDestination};

// ===== global functions =====

pub(crate) fn send_update(
    tx: &InstanceChannelsTx,
    dst: SendDestination,
    routes: Vec<RouteInfo>,
) {
    Debug::MsgTx(&dst, "update", routes.len()).log();
    let msg = ProtocolMsg::Update { dst, routes };
    let _ = tx.transport.send(msg);
}

// Advertises one route record out of every interface holding at least one
// adjacency, minus the split-horizon suppressed one.
pub(crate) fn send_update_all(
    interfaces: &Interfaces,
    neighbors: &Neighbors,
    tx: &InstanceChannelsTx,
    rinfo: &RouteInfo,
    suppress_ifindex: Option<u32>,
) {
    let ifaces = neighbors
        .iter()
        .filter(|(_, nbr)| !nbr.is_self())
        .map(|(_, nbr)| nbr.ifindex)
        .collect::<BTreeSet<_>>();
    for ifindex in ifaces {
        if Some(ifindex) == suppress_ifindex {
            continue;
        }
        if !iface_eligible(interfaces, ifindex) {
            continue;
        }
        send_update(
            tx,
            SendDestination::Interface(ifindex),
            vec![rinfo.clone()],
        );
    }
}

pub(crate) fn send_query(
    tx: &InstanceChannelsTx,
    dst: SendDestination,
    rinfo: &RouteInfo,
    sia: bool,
) {
    let msg = match (sia, dst) {
        (true, SendDestination::Neighbor(addr)) => {
            Debug::MsgTx(&dst, "sia-query", 1).log();
            ProtocolMsg::SiaQuery {
                dst: addr,
                route: rinfo.clone(),
            }
        }
        _ => {
            Debug::MsgTx(&dst, "query", 1).log();
            ProtocolMsg::Query {
                dst,
                routes: vec![rinfo.clone()],
            }
        }
    };
    let _ = tx.transport.send(msg);
}

pub(crate) fn send_reply(
    tx: &InstanceChannelsTx,
    dst: IpAddr,
    rinfo: &RouteInfo,
    sia: bool,
) {
    let msg = if sia {
        Debug::MsgTx(&SendDestination::Neighbor(dst), "sia-reply", 1).log();
        ProtocolMsg::SiaReply {
            dst,
            route: rinfo.clone(),
        }
    } else {
        Debug::MsgTx(&SendDestination::Neighbor(dst), "reply", 1).log();
        ProtocolMsg::Reply {
            dst,
            routes: vec![rinfo.clone()],
        }
    };
    let _ = tx.transport.send(msg);
}

// ===== helper functions =====

fn iface_eligible(interfaces: &Interfaces, ifindex: u32) -> bool {
    match interfaces.get(ifindex) {
        Some(iface) => {
            iface.flags.contains(InterfaceFlags::OPERATIVE)
                && !iface.config.passive
        }
        None => false,
    }
}
