//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use eigrp_utils::southbound::{Nexthop, Protocol, RouteKeyMsg, RouteMsg};

use crate::debug::Debug;
use crate::instance::InstanceChannelsTx;
use crate::route::RouteKind;
use crate::tasks::messages::output::SouthboundMsg;
use crate::topology::{Route, RouteNode};

// Fixed administrative distances of installed routes.
pub const DISTANCE_INTERNAL: u32 = 90;
pub const DISTANCE_EXTERNAL: u32 = 170;

// ===== global functions =====

// Installs (or replaces) the successor path in the FIB. Reinstalling the
// same path is suppressed so metric churn elsewhere in the table doesn't
// translate into FIB churn.
pub(crate) fn route_install(
    tx: &InstanceChannelsTx,
    node: &mut RouteNode,
    route: &Route,
) {
    if node.installed == Some((route.nbr, route.distance)) {
        return;
    }

    let distance = match route.kind {
        RouteKind::Internal => DISTANCE_INTERNAL,
        RouteKind::External => DISTANCE_EXTERNAL,
    };
    let nexthop = match node.successor.nexthop {
        Some(addr) => Nexthop::Address {
            ifindex: route.ifindex,
            addr,
        },
        None => Nexthop::Interface {
            ifindex: route.ifindex,
        },
    };
    let msg = RouteMsg {
        protocol: Protocol::Eigrp,
        prefix: node.prefix,
        distance,
        metric: route.distance,
        tag: route.external.map(|external| external.tag),
        nexthops: [nexthop].into(),
    };

    Debug::RouteInstall(&node.prefix, distance).log();
    let _ = tx.southbound.send(SouthboundMsg::RouteInstall(msg));
    node.installed = Some((route.nbr, route.distance));
}

pub(crate) fn route_uninstall(tx: &InstanceChannelsTx, node: &mut RouteNode) {
    if node.installed.take().is_none() {
        return;
    }

    Debug::RouteUninstall(&node.prefix).log();
    let msg = RouteKeyMsg {
        protocol: Protocol::Eigrp,
        prefix: node.prefix,
    };
    let _ = tx.southbound.send(SouthboundMsg::RouteUninstall(msg));
}
