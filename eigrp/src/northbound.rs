//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::collections::{NeighborId, ReplyIndex};
use crate::dual::fsm;
use crate::instance::Instance;
use crate::route::RouteKind;
use crate::topology::RouteFlags;

// Filter applied to topology dumps. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default)]
#[derive(Deserialize, Serialize)]
pub struct TopologyDumpFilter {
    pub prefix: Option<IpNetwork>,
    pub kind: Option<RouteKind>,
    pub active_only: bool,
}

// Read-only view of one destination node.
#[derive(Clone, Debug)]
#[derive(Serialize)]
pub struct RouteSnapshot {
    pub prefix: IpNetwork,
    pub state: fsm::State,
    pub kind: RouteKind,
    pub fdistance: u32,
    pub distance: u32,
    pub successor: Option<IpAddr>,
    pub routes: Vec<RouteEntrySnapshot>,
}

#[derive(Clone, Debug)]
#[derive(Serialize)]
pub struct RouteEntrySnapshot {
    pub addr: IpAddr,
    pub kind: RouteKind,
    pub distance: u32,
    pub rdistance: u32,
    pub feasible: bool,
    pub local: bool,
}

// Read-only view of one adjacency.
#[derive(Clone, Debug)]
#[derive(Serialize)]
pub struct NeighborSnapshot {
    pub id: NeighborId,
    pub addr: IpAddr,
    pub ifindex: u32,
    pub uptime: DateTime<Utc>,
    pub replies: Vec<ReplyRecordSnapshot>,
    pub updates_rcvd: u32,
    pub queries_rcvd: u32,
    pub replies_rcvd: u32,
    pub sia_queries_rcvd: u32,
    pub sia_replies_rcvd: u32,
}

// One outstanding reply owed by a neighbor, with the arena handle of its
// supervision record.
#[derive(Clone, Copy, Debug)]
#[derive(Serialize)]
pub struct ReplyRecordSnapshot {
    pub prefix: IpNetwork,
    pub index: ReplyIndex,
}

// ===== global functions =====

// Dumps the topology table in deterministic (prefix) order.
pub fn topology_dump(
    instance: &Instance,
    filter: &TopologyDumpFilter,
) -> Vec<RouteSnapshot> {
    let neighbors = &instance.state.neighbors;

    instance
        .state
        .topology
        .iter()
        .filter(|node| {
            filter.prefix.is_none_or(|prefix| node.prefix == prefix)
        })
        .filter(|node| filter.kind.is_none_or(|kind| node.successor.kind == kind))
        .filter(|node| !filter.active_only || node.state.is_active())
        .map(|node| {
            let successor = node
                .successor
                .nbr
                .and_then(|nbr_id| neighbors.get_by_id(nbr_id).ok())
                .filter(|(_, nbr)| !nbr.is_self())
                .map(|(_, nbr)| nbr.addr);
            let routes = node
                .routes
                .values()
                .map(|route| {
                    let addr = neighbors
                        .get_by_id(route.nbr)
                        .ok()
                        .map(|(_, nbr)| nbr.addr);
                    RouteEntrySnapshot {
                        addr: addr.unwrap_or(IpAddr::V4(
                            std::net::Ipv4Addr::UNSPECIFIED,
                        )),
                        kind: route.kind,
                        distance: route.distance,
                        rdistance: route.rdistance,
                        feasible: route.is_feasible(node.successor.fdistance),
                        local: route.flags.contains(RouteFlags::LOCAL),
                    }
                })
                .collect();
            RouteSnapshot {
                prefix: node.prefix,
                state: node.state,
                kind: node.successor.kind,
                fdistance: node.successor.fdistance,
                distance: node.successor.metric.distance(),
                successor,
                routes,
            }
        })
        .collect()
}

// Dumps the neighbor registry (remote adjacencies only), ordered by
// address.
pub fn neighbor_dump(instance: &Instance) -> Vec<NeighborSnapshot> {
    let mut neighbors = instance
        .state
        .neighbors
        .iter()
        .filter(|(_, nbr)| !nbr.is_self())
        .map(|(_, nbr)| NeighborSnapshot {
            id: nbr.id,
            addr: nbr.addr,
            ifindex: nbr.ifindex,
            uptime: nbr.uptime,
            replies: nbr
                .replies
                .iter()
                .map(|(prefix, index)| ReplyRecordSnapshot {
                    prefix: *prefix,
                    index: *index,
                })
                .collect(),
            updates_rcvd: nbr.statistics.updates_rcvd,
            queries_rcvd: nbr.statistics.queries_rcvd,
            replies_rcvd: nbr.statistics.replies_rcvd,
            sia_queries_rcvd: nbr.statistics.sia_queries_rcvd,
            sia_replies_rcvd: nbr.statistics.sia_replies_rcvd,
        })
        .collect::<Vec<_>>();
    neighbors.sort_by_key(|nbr| nbr.addr);
    neighbors
}
