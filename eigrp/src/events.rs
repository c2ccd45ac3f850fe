//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use eigrp_utils::ip;
use eigrp_utils::southbound::InterfaceFlags;
use ipnetwork::IpNetwork;

use crate::collections::{NeighborId, NeighborIndex};
use crate::debug::Debug;
use crate::dual::{self, fsm};
use crate::error::Error;
use crate::instance::Instance;
use crate::interface::InterfaceCfg;
use crate::metric::{INFINITE_DISTANCE, Metric};
use crate::neighbor::{MessageKind, Neighbor, NeighborFlags};
use crate::output;
use crate::route::{RouteInfo, RouteKind};
use crate::tasks::messages::output::SendDestination;
use crate::topology::{Route, RouteFlags};

// ===== UPDATE message =====

pub(crate) fn process_route_update(
    instance: &mut Instance,
    src: IpAddr,
    ri: RouteInfo,
) -> Result<(), Error> {
    ri.validate(instance.config.af)
        .map_err(|error| Error::InvalidRouteInfo(Some(src), error))?;
    let (_, nbr) = instance
        .state
        .neighbors
        .get_mut_by_addr(&src)
        .ok_or(Error::NbrNotFound(src))?;
    nbr.statistics.update(MessageKind::Update);
    let nbr_id = nbr.id;
    let nbr_ifindex = nbr.ifindex;
    Debug::MsgRx(&src, "update", &ri.prefix).log();

    // A withdrawal of something this router never heard of.
    let prefix = ri.prefix;
    if ri.is_withdraw() && instance.state.topology.get(&prefix).is_none() {
        return Ok(());
    }

    remote_candidate_update(instance, nbr_id, nbr_ifindex, &ri);
    dual::reevaluate(instance, &prefix, None);
    Ok(())
}

// ===== QUERY message =====

pub(crate) fn process_route_query(
    instance: &mut Instance,
    src: IpAddr,
    ri: RouteInfo,
    sia: bool,
) -> Result<(), Error> {
    ri.validate(instance.config.af)
        .map_err(|error| Error::InvalidRouteInfo(Some(src), error))?;
    let (_, nbr) = instance
        .state
        .neighbors
        .get_mut_by_addr(&src)
        .ok_or(Error::NbrNotFound(src))?;
    nbr.statistics.update(if sia {
        MessageKind::SiaQuery
    } else {
        MessageKind::Query
    });
    let nbr_id = nbr.id;
    let nbr_ifindex = nbr.ifindex;
    let prefix = ri.prefix;
    Debug::MsgRx(&src, if sia { "sia-query" } else { "query" }, &prefix)
        .log();

    if sia {
        // A stuck-in-active probe: confirm this router is still working on
        // the destination. No state changes.
        let rinfo = match instance.state.topology.get(&prefix) {
            Some(node) => node.successor_rinfo(),
            None => RouteInfo::new_withdraw(ri.kind, prefix),
        };
        output::send_reply(&instance.tx, src, &rinfo, true);
        return Ok(());
    }

    let known = instance.state.topology.get(&prefix).is_some();
    remote_candidate_update(instance, nbr_id, nbr_ifindex, &ri);

    if !known {
        // Unknown destination: answer infinity. A finite metric in the
        // query was adopted above as a candidate route.
        let withdraw = RouteInfo::new_withdraw(ri.kind, prefix);
        output::send_reply(&instance.tx, src, &withdraw, false);
        dual::reevaluate(instance, &prefix, None);
        return Ok(());
    }

    let (is_active, from_successor) = {
        let Some(node) = instance.state.topology.get(&prefix) else {
            return Ok(());
        };
        (node.state.is_active(), node.successor.nbr == Some(nbr_id))
    };

    if !is_active {
        // If the query starts a computation, the reply is owed to the
        // querier only once it concludes, and the computation machinery
        // takes care of it.
        if !dual::reevaluate(instance, &prefix, Some(nbr_id)) {
            match instance.state.topology.get(&prefix) {
                Some(node) => {
                    let rinfo = node.successor_rinfo();
                    output::send_reply(&instance.tx, src, &rinfo, false);
                }
                None => {
                    let withdraw = RouteInfo::new_withdraw(ri.kind, prefix);
                    output::send_reply(&instance.tx, src, &withdraw, false);
                }
            }
        }
    } else if from_successor {
        if let Some(node) = instance.state.topology.get_mut(&prefix)
            && let Err(error) = dual::fsm_event(node, fsm::Event::SuccessorQuery)
        {
            error.log();
        }
    } else {
        // Queries from non-successors never disturb the computation; they
        // are answered with the current, active-flagged state.
        if let Some(node) = instance.state.topology.get(&prefix) {
            let rinfo = node.successor_rinfo();
            output::send_reply(&instance.tx, src, &rinfo, false);
        }
    }
    Ok(())
}

// ===== REPLY message =====

pub(crate) fn process_route_reply(
    instance: &mut Instance,
    src: IpAddr,
    ri: RouteInfo,
    sia: bool,
) -> Result<(), Error> {
    ri.validate(instance.config.af)
        .map_err(|error| Error::InvalidRouteInfo(Some(src), error))?;
    let (_, nbr) = instance
        .state
        .neighbors
        .get_mut_by_addr(&src)
        .ok_or(Error::NbrNotFound(src))?;
    nbr.statistics.update(if sia {
        MessageKind::SiaReply
    } else {
        MessageKind::Reply
    });
    let nbr_id = nbr.id;
    let nbr_ifindex = nbr.ifindex;
    let prefix = ri.prefix;
    Debug::MsgRx(&src, if sia { "sia-reply" } else { "reply" }, &prefix)
        .log();

    // Replies are only meaningful against an open record.
    let reply_idx = {
        let node = instance
            .state
            .topology
            .get(&prefix)
            .ok_or(Error::ReplyNotFound(src, prefix))?;
        node.replies
            .get(&nbr_id)
            .copied()
            .ok_or(Error::ReplyNotFound(src, prefix))?
    };

    if sia {
        let current = instance
            .state
            .topology
            .get(&prefix)
            .and_then(|node| node.routes.get(&nbr_id))
            .map(|route| route.rdistance)
            .unwrap_or(INFINITE_DISTANCE);
        let Some(reply) = instance.state.replies.get_mut(reply_idx) else {
            return Ok(());
        };
        reply.sia_reply_pending = false;
        if let Some(task) = reply.sia_task.as_mut() {
            task.reset(None);
        }
        // An unchanged metric means the neighbor is itself still waiting;
        // the record stays open.
        if current == ri.metric.distance() {
            return Ok(());
        }
    }

    remote_candidate_update(instance, nbr_id, nbr_ifindex, &ri);

    let last = {
        let Some(node) = instance.state.topology.get_mut(&prefix) else {
            return Ok(());
        };
        node.replies.remove(&nbr_id);
        node.replies.is_empty() && node.state.is_active()
    };
    instance.state.replies.delete(reply_idx);
    if let Ok((_, nbr)) = instance.state.neighbors.get_mut_by_id(nbr_id) {
        nbr.replies.remove(&prefix);
    }
    if last {
        dual::last_reply(instance, &prefix);
    }
    Ok(())
}

// ===== neighbor events =====

pub(crate) fn process_neighbor_up(
    instance: &mut Instance,
    addr: IpAddr,
    ifindex: u32,
) {
    if instance.state.neighbors.get_by_addr(&addr).is_some() {
        return;
    }

    // The adjacency implies the link exists; track it if nothing else did.
    if instance.state.interfaces.get(ifindex).is_none() {
        instance.state.interfaces.insert(
            ifindex,
            format!("if{}", ifindex),
            InterfaceCfg::default(),
        );
    }
    instance.state.neighbors.insert(Some(addr), |id| {
        Neighbor::new(id, addr, ifindex, NeighborFlags::empty())
    });

    // Initial synchronization: the whole topology in one batch.
    send_full_table(instance, addr, ifindex);
}

// The neighbor asked for a full resynchronization (e.g. after restarting
// with empty state).
pub(crate) fn process_update_request(
    instance: &mut Instance,
    addr: IpAddr,
) -> Result<(), Error> {
    let (_, nbr) = instance
        .state
        .neighbors
        .get_by_addr(&addr)
        .ok_or(Error::NbrNotFound(addr))?;
    let ifindex = nbr.ifindex;
    send_full_table(instance, addr, ifindex);
    Ok(())
}

// Sends every reachable destination to one neighbor, honoring split horizon
// on the neighbor's interface.
fn send_full_table(instance: &mut Instance, addr: IpAddr, ifindex: u32) {
    let split = instance.state.interfaces.split_horizon(ifindex);
    let routes = instance
        .state
        .topology
        .iter()
        .filter(|node| node.successor.nbr.is_some())
        .filter(|node| {
            !(split
                && node.successor.ifindex == ifindex
                && !node.successor.flags.contains(RouteFlags::LOCAL))
        })
        .map(|node| node.successor_rinfo())
        .collect::<Vec<_>>();
    if !routes.is_empty() {
        output::send_update(
            &instance.tx,
            SendDestination::Neighbor(addr),
            routes,
        );
    }
}

pub(crate) fn process_neighbor_down(
    instance: &mut Instance,
    addr: IpAddr,
) -> Result<(), Error> {
    let (nbr_idx, _) = instance
        .state
        .neighbors
        .get_by_addr(&addr)
        .ok_or(Error::NbrNotFound(addr))?;
    dual::nbr_delete(instance, nbr_idx);
    Ok(())
}

// ===== interface events =====

// Interface creation or reconfiguration. Connected prefixes are
// re-originated since the link attributes may have changed.
pub(crate) fn process_interface_update(
    instance: &mut Instance,
    ifindex: u32,
    name: String,
    config: InterfaceCfg,
) {
    let iface = instance.state.interfaces.insert(ifindex, name, config);
    iface.config = config;
    iface.flags.insert(InterfaceFlags::OPERATIVE);
    let addrs = iface.addrs.clone();

    for prefix in addrs {
        connected_route_add(instance, ifindex, prefix);
    }
}

pub(crate) fn process_link_down(instance: &mut Instance, ifindex: u32) {
    Debug::InterfaceDown(ifindex).log();

    let addrs = {
        let Some(iface) = instance.state.interfaces.get_mut(ifindex) else {
            return;
        };
        iface.flags.remove(InterfaceFlags::OPERATIVE);
        iface.addrs.clone()
    };

    // Connected prefixes go first so their withdrawal is computed against
    // the adjacencies that are about to disappear.
    for prefix in addrs {
        connected_route_del(instance, ifindex, prefix);
    }
    for nbr_idx in neighbors_on_link(instance, ifindex) {
        dual::nbr_delete(instance, nbr_idx);
    }
}

pub(crate) fn process_addr_add(
    instance: &mut Instance,
    ifindex: u32,
    prefix: IpNetwork,
) {
    if !ip::routable_prefix(&prefix) {
        return;
    }
    let operative = {
        let Some(iface) = instance.state.interfaces.get_mut(ifindex) else {
            return;
        };
        iface.addrs.insert(prefix);
        iface.flags.contains(InterfaceFlags::OPERATIVE)
    };
    if operative {
        connected_route_add(instance, ifindex, prefix);
    }
}

pub(crate) fn process_addr_del(
    instance: &mut Instance,
    ifindex: u32,
    prefix: IpNetwork,
) {
    let Some(iface) = instance.state.interfaces.get_mut(ifindex) else {
        return;
    };
    if !iface.addrs.remove(&prefix) {
        return;
    }
    connected_route_del(instance, ifindex, prefix);
}

// ===== helper functions =====

// Creates, refreshes or withdraws the candidate route advertised by a
// remote neighbor.
fn remote_candidate_update(
    instance: &mut Instance,
    nbr_id: NeighborId,
    nbr_ifindex: u32,
    ri: &RouteInfo,
) {
    let link = instance.state.interfaces.link_attrs(nbr_ifindex);
    let node = instance.state.topology.get_or_insert(ri.prefix);
    if ri.is_withdraw() {
        node.route_del(nbr_id);
    } else {
        let route = node.routes.entry(nbr_id).or_insert_with(|| {
            Route::new(nbr_id, ri.kind, nbr_ifindex, RouteFlags::empty())
        });
        route.update(ri, Some(&link));
    }
}

// Injects or withdraws a locally originated route through one of the
// synthetic neighbors.
pub(crate) fn local_route_input(
    instance: &mut Instance,
    nbr_idx: NeighborIndex,
    ri: RouteInfo,
    ifindex: u32,
    connected: bool,
) {
    let nbr_id = instance.state.neighbors[nbr_idx].id;
    let prefix = ri.prefix;

    if ri.is_withdraw() && instance.state.topology.get(&prefix).is_none() {
        return;
    }

    {
        let node = instance.state.topology.get_or_insert(prefix);
        if ri.is_withdraw() {
            node.route_del(nbr_id);
        } else {
            let mut flags = RouteFlags::LOCAL;
            if connected {
                flags.insert(RouteFlags::CONNECTED);
            }
            let route = node.routes.entry(nbr_id).or_insert_with(|| {
                Route::new(nbr_id, ri.kind, ifindex, flags)
            });
            route.ifindex = ifindex;
            route.flags = flags;
            route.update(&ri, None);
        }
    }
    dual::reevaluate(instance, &prefix, None);
}

fn connected_route_add(
    instance: &mut Instance,
    ifindex: u32,
    prefix: IpNetwork,
) {
    let link = instance.state.interfaces.link_attrs(ifindex);
    let ri = RouteInfo::new(
        RouteKind::Internal,
        prefix,
        Metric::from_link(&link),
        None,
    );
    let self_nbr = instance.state.self_nbr;
    local_route_input(instance, self_nbr, ri, ifindex, true);
}

fn connected_route_del(
    instance: &mut Instance,
    ifindex: u32,
    prefix: IpNetwork,
) {
    let ri = RouteInfo::new_withdraw(RouteKind::Internal, prefix);
    let self_nbr = instance.state.self_nbr;
    local_route_input(instance, self_nbr, ri, ifindex, true);
}

fn neighbors_on_link(
    instance: &Instance,
    ifindex: u32,
) -> Vec<NeighborIndex> {
    instance
        .state
        .neighbors
        .iter()
        .filter(|(_, nbr)| !nbr.is_self() && nbr.ifindex == ifindex)
        .map(|(nbr_idx, _)| nbr_idx)
        .collect()
}
