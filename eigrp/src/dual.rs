//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::time::Duration;

use eigrp_utils::southbound::InterfaceFlags;
use eigrp_utils::task::TimeoutTask;
use ipnetwork::IpNetwork;

use crate::collections::{NeighborId, NeighborIndex, Replies};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, InstanceChannelsTx, InstanceState};
use crate::metric::INFINITE_DISTANCE;
use crate::neighbor::Neighbor;
use crate::output;
use crate::route::RouteInfo;
use crate::southbound;
use crate::tasks;
use crate::tasks::messages::input::ReplyTimeoutMsg;
use crate::tasks::messages::output::SendDestination;
use crate::topology::{Route, RouteFlags, RouteNode, Successor};

// Maximum number of stuck-in-active probes sent for a single reply record
// before the neighbor is declared unresponsive.
pub const REPLY_SIA_MAX_QUERIES: u8 = 3;

pub mod fsm {
    use serde::{Deserialize, Serialize};

    // Computation state of one destination. A passive destination has a
    // usable successor; an active one is waiting for replies to a query it
    // flooded. The four active variants encode whether a feasible successor
    // was found since the computation started (0/1 vs. 2/3 track relative to
    // a query from the old successor, 1 vs. 3 whether the computation was
    // locally or remotely originated).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    pub enum State {
        Passive,
        Active0,
        Active1,
        Active2,
        Active3,
    }

    // Events driving the computation state of one destination.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum Event {
        // A local topology change left the destination without a feasible
        // successor.
        LocalComputation,
        // A query from the successor left the destination without a
        // feasible successor.
        RemoteComputation,
        // The successor queried the destination while a computation was
        // already in progress.
        SuccessorQuery,
        // The last outstanding reply arrived and a successor is available.
        LastReplyWithFs,
        // The last outstanding reply arrived and no successor is available.
        LastReplyNoFs,
    }

    impl State {
        pub fn is_active(&self) -> bool {
            *self != State::Passive
        }
    }

    impl std::fmt::Display for State {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                State::Passive => write!(f, "passive"),
                State::Active0 => write!(f, "active-0"),
                State::Active1 => write!(f, "active-1"),
                State::Active2 => write!(f, "active-2"),
                State::Active3 => write!(f, "active-3"),
            }
        }
    }
}

// Record of one reply owed by one neighbor for one destination. The record
// owns the timers supervising the neighbor; dropping it cancels them.
#[derive(Debug)]
pub struct Reply {
    pub nbr: NeighborId,
    pub prefix: IpNetwork,
    pub sia_queries_sent: u8,
    // A stuck-in-active probe was sent and hasn't been answered yet.
    pub sia_reply_pending: bool,
    pub active_task: Option<TimeoutTask>,
    pub sia_task: Option<TimeoutTask>,
}

// ===== global functions =====

// The DUAL transition function. Undefined combinations are protocol errors
// and leave the state untouched.
pub(crate) fn fsm(
    state: fsm::State,
    event: fsm::Event,
) -> Option<fsm::State> {
    use fsm::{Event, State};

    match (state, event) {
        (State::Passive, Event::LocalComputation) => Some(State::Active1),
        (State::Passive, Event::RemoteComputation) => Some(State::Active3),
        (State::Active0 | State::Active1, Event::SuccessorQuery) => {
            Some(State::Active2)
        }
        (State::Active2, Event::SuccessorQuery) => Some(State::Active3),
        (
            State::Active0 | State::Active1 | State::Active2 | State::Active3,
            Event::LastReplyWithFs,
        ) => Some(State::Passive),
        (State::Active0 | State::Active1, Event::LastReplyNoFs) => {
            Some(State::Active0)
        }
        (State::Active2 | State::Active3, Event::LastReplyNoFs) => {
            Some(State::Active2)
        }
        _ => None,
    }
}

pub(crate) fn fsm_event(
    node: &mut RouteNode,
    event: fsm::Event,
) -> Result<(), Error> {
    match fsm(node.state, event) {
        Some(new_state) => {
            if new_state != node.state {
                Debug::FsmTransition(&node.prefix, node.state, event, new_state)
                    .log();
                node.state = new_state;
            }
            Ok(())
        }
        None => Err(Error::FsmUnexpectedEvent(node.prefix, node.state, event)),
    }
}

// Re-runs the route decision for one destination after its candidate routes
// changed. While passive, a candidate passing the feasibility test replaces
// the successor without any distributed computation; lacking one, a
// diffusing computation starts. Active destinations are left alone until
// their last outstanding reply arrives.
//
// Returns whether a diffusing computation was started. Computations
// triggered by a query answer the querier themselves, even when they
// conclude on the spot.
pub(crate) fn reevaluate(
    instance: &mut Instance,
    prefix: &IpNetwork,
    origin: Option<NeighborId>,
) -> bool {
    let (is_active, best) = {
        let Some(node) = instance.state.topology.get(prefix) else {
            return false;
        };
        (node.state.is_active(), node.best_route(true).copied())
    };
    if is_active {
        return false;
    }

    match best {
        Some(route) => {
            promote_successor(instance, prefix, &route, false);
            false
        }
        None => enter_active(instance, prefix, origin),
    }
}

// Starts a diffusing computation for the given destination.
fn enter_active(
    instance: &mut Instance,
    prefix: &IpNetwork,
    origin: Option<NeighborId>,
) -> bool {
    let event = match origin {
        Some(_) => fsm::Event::RemoteComputation,
        None => fsm::Event::LocalComputation,
    };
    {
        let Some(node) = instance.state.topology.get_mut(prefix) else {
            return false;
        };
        // A destination that never had a successor has nothing to compute.
        if node.successor.nbr.is_none() && node.routes.is_empty() {
            if node.replies.is_empty() {
                instance.state.topology.delete(prefix);
            }
            return false;
        }
        if let Err(error) = fsm_event(node, event) {
            error.log();
            return false;
        }
    }

    // With nobody to ask, the computation concludes on the spot.
    if start_computation(instance, prefix) == 0 {
        last_reply(instance, prefix);
    }
    true
}

// Makes the given candidate route the successor, refreshing the feasible
// distance, the FIB and the neighbors' view of the destination. With
// `reset_fd` the feasible distance is recomputed from scratch (the
// destination just completed a computation); otherwise it can only decrease.
fn promote_successor(
    instance: &mut Instance,
    prefix: &IpNetwork,
    route: &Route,
    reset_fd: bool,
) {
    let Instance { state, tx, .. } = instance;
    let InstanceState {
        topology,
        neighbors,
        interfaces,
        ..
    } = state;
    let Some(node) = topology.get_mut(prefix) else {
        return;
    };

    let old_nbr = node.successor.nbr;
    let old_distance = node.successor.metric.distance();
    let fdistance = if reset_fd {
        route.distance
    } else {
        std::cmp::min(node.successor.fdistance, route.distance)
    };
    let local = route.flags.contains(RouteFlags::LOCAL);
    let nexthop = if local {
        None
    } else {
        let nbr_addr =
            neighbors.get_by_id(route.nbr).ok().map(|(_, nbr)| nbr.addr);
        route.nexthop.or(nbr_addr)
    };

    node.successor = Successor {
        nbr: Some(route.nbr),
        kind: route.kind,
        fdistance,
        rdistance: route.rdistance,
        metric: route.metric,
        external: route.external,
        nexthop,
        ifindex: route.ifindex,
        flags: route.flags,
    };

    // Locally originated paths are already present in the FIB.
    if local {
        southbound::tx::route_uninstall(tx, node);
    } else {
        southbound::tx::route_install(tx, node, route);
    }

    if old_nbr != Some(route.nbr) || old_distance != route.distance {
        let rinfo = node.successor_rinfo();
        let suppress = (!local && interfaces.split_horizon(route.ifindex))
            .then_some(route.ifindex);
        output::send_update_all(interfaces, neighbors, tx, &rinfo, suppress);
    }
}

// The destination became unreachable: pull it from the FIB, tell the
// neighbors, and destroy the node once nothing references it anymore.
pub(crate) fn withdraw_destination(instance: &mut Instance, prefix: &IpNetwork) {
    let Instance { state, tx, .. } = instance;
    let InstanceState {
        topology,
        neighbors,
        interfaces,
        ..
    } = state;
    let Some(node) = topology.get_mut(prefix) else {
        return;
    };

    southbound::tx::route_uninstall(tx, node);
    node.successor = Successor {
        kind: node.successor.kind,
        ..Successor::unreachable()
    };
    let rinfo = node.successor_rinfo();
    output::send_update_all(interfaces, neighbors, tx, &rinfo, None);

    if node.routes.is_empty()
        && node.replies.is_empty()
        && node.state == fsm::State::Passive
    {
        topology.delete(prefix);
    }
}

// Starts one round of a diffusing computation: opens a reply record for,
// and sends a query to, every eligible neighbor. Returns how many neighbors
// were queried.
fn start_computation(instance: &mut Instance, prefix: &IpNetwork) -> usize {
    let Instance {
        config, state, tx, ..
    } = instance;
    let InstanceState {
        topology,
        neighbors,
        replies,
        interfaces,
        ..
    } = state;
    let Some(node) = topology.get_mut(prefix) else {
        return 0;
    };

    // Split horizon suppresses queries out the old successor's interface.
    let suppress = match node.successor.nbr {
        Some(_)
            if !node.successor.flags.contains(RouteFlags::LOCAL)
                && interfaces.split_horizon(node.successor.ifindex) =>
        {
            Some(node.successor.ifindex)
        }
        _ => None,
    };

    let rinfo = node.successor_rinfo();
    let mut queried_ifaces = BTreeSet::new();
    let mut count = 0;
    for nbr_idx in neighbors.indexes() {
        let nbr = &mut neighbors[nbr_idx];
        if nbr.is_self() || Some(nbr.ifindex) == suppress {
            continue;
        }
        match interfaces.get(nbr.ifindex) {
            Some(iface)
                if iface.flags.contains(InterfaceFlags::OPERATIVE)
                    && !iface.config.passive => {}
            _ => continue,
        }
        reply_outstanding_add(
            replies,
            node,
            nbr,
            config.active_timeout,
            tx,
        );
        queried_ifaces.insert(nbr.ifindex);
        count += 1;
    }
    for ifindex in queried_ifaces {
        output::send_query(
            tx,
            SendDestination::Interface(ifindex),
            &rinfo,
            false,
        );
    }
    count
}

fn reply_outstanding_add(
    replies: &mut Replies,
    node: &mut RouteNode,
    nbr: &mut Neighbor,
    active_timeout: u16,
    tx: &InstanceChannelsTx,
) {
    // The record is allocated first so its timers can carry the arena
    // handle; a timeout message outliving the record then matches no slot.
    let reply_idx = replies.insert(Reply {
        nbr: nbr.id,
        prefix: node.prefix,
        sia_queries_sent: 0,
        sia_reply_pending: false,
        active_task: None,
        sia_task: None,
    });
    if active_timeout != 0 {
        let timeout = Duration::from_secs(active_timeout as u64);
        let reply = &mut replies[reply_idx];
        reply.active_task = Some(tasks::reply_active_timeout(
            node.prefix,
            nbr.id,
            reply_idx,
            timeout,
            &tx.protocol_input.reply_active_timeout,
        ));
        // Stuck-in-active probing starts at half the active timeout.
        reply.sia_task = Some(tasks::reply_sia_timeout(
            node.prefix,
            nbr.id,
            reply_idx,
            timeout / 2,
            &tx.protocol_input.reply_sia_timeout,
        ));
    }
    node.replies.insert(nbr.id, reply_idx);
    nbr.replies.insert(node.prefix, reply_idx);
}

// Processes the arrival of the last outstanding reply of a computation
// round. The feasible distance is reset before looking for a successor, so
// any finite candidate qualifies; lacking one, another round is started
// against whoever is left to ask.
pub(crate) fn last_reply(instance: &mut Instance, prefix: &IpNetwork) {
    let (old_state, old_successor, best) = {
        let Some(node) = instance.state.topology.get_mut(prefix) else {
            return;
        };
        node.successor.fdistance = INFINITE_DISTANCE;
        (node.state, node.successor.nbr, node.best_route(false).copied())
    };

    match best {
        Some(route) => {
            if let Some(node) = instance.state.topology.get_mut(prefix)
                && let Err(error) =
                    fsm_event(node, fsm::Event::LastReplyWithFs)
            {
                error.log();
            }
            promote_successor(instance, prefix, &route, true);
            send_deferred_reply(instance, prefix, old_state, old_successor);
        }
        None => {
            if let Some(node) = instance.state.topology.get_mut(prefix)
                && let Err(error) = fsm_event(node, fsm::Event::LastReplyNoFs)
            {
                error.log();
            }
            if start_computation(instance, prefix) == 0 {
                // Nobody left to ask: the destination is lost.
                if let Some(node) = instance.state.topology.get_mut(prefix) {
                    node.state = fsm::State::Passive;
                }
                withdraw_destination(instance, prefix);
                send_deferred_reply(
                    instance,
                    prefix,
                    old_state,
                    old_successor,
                );
            }
        }
    }
}

// Computations triggered by a query owe the old successor a reply, sent
// only once the computation has run its course.
fn send_deferred_reply(
    instance: &mut Instance,
    prefix: &IpNetwork,
    old_state: fsm::State,
    old_successor: Option<NeighborId>,
) {
    if !matches!(old_state, fsm::State::Active2 | fsm::State::Active3) {
        return;
    }
    let Some(nbr_id) = old_successor else {
        return;
    };
    let Instance { state, tx, .. } = instance;
    let Ok((_, nbr)) = state.neighbors.get_by_id(nbr_id) else {
        return;
    };
    let rinfo = match state.topology.get(prefix) {
        Some(node) => node.successor_rinfo(),
        None => RouteInfo::new_withdraw(crate::route::RouteKind::Internal, *prefix),
    };
    output::send_reply(tx, nbr.addr, &rinfo, false);
}

// Evicts one neighbor, cascading over everything referencing it: its
// candidate routes are withdrawn and every reply it still owed is settled
// as if it had arrived with an infinite metric.
pub(crate) fn nbr_delete(instance: &mut Instance, nbr_idx: NeighborIndex) {
    let nbr = instance.state.neighbors.delete(nbr_idx);
    Debug::NbrDelete(&nbr.addr).log();

    // Drop the neighbor's candidate routes first so a later selection can't
    // pick a dead path.
    let mut affected = vec![];
    for prefix in instance.state.topology.prefixes() {
        if let Some(node) = instance.state.topology.get_mut(&prefix)
            && node.route_del(nbr.id).is_some()
        {
            affected.push(prefix);
        }
    }

    // Settle the replies the neighbor still owed.
    for (prefix, reply_idx) in &nbr.replies {
        let last = {
            let Some(node) = instance.state.topology.get_mut(prefix) else {
                continue;
            };
            node.replies.remove(&nbr.id);
            node.replies.is_empty() && node.state.is_active()
        };
        instance.state.replies.delete(*reply_idx);
        if last {
            last_reply(instance, prefix);
        }
    }

    // Re-run the decision for everything the neighbor was advertising.
    for prefix in &affected {
        reevaluate(instance, prefix, None);
    }
}

// The full active timeout elapsed without a reply. The neighbor is
// unresponsive and gets evicted, which settles this record and everything
// else it owed.
pub(crate) fn handle_reply_active_timeout(
    instance: &mut Instance,
    msg: ReplyTimeoutMsg,
) {
    // The timeout races with the reply; a message whose record was already
    // resolved matches no arena slot and is dropped, even if a new record
    // was opened under the same destination and neighbor since.
    let Some(reply) = instance.state.replies.get(msg.reply_idx) else {
        return;
    };
    let prefix = reply.prefix;
    let Ok((nbr_idx, nbr)) = instance.state.neighbors.get_by_id(reply.nbr)
    else {
        return;
    };

    Debug::NbrStuck(&nbr.addr, &prefix).log();
    nbr_delete(instance, nbr_idx);
}

// Half the active timeout elapsed without a reply: probe the neighbor with
// a stuck-in-active query. A neighbor that stops answering the probes, or
// exhausts the probe budget, is evicted before the active timeout fires.
pub(crate) fn handle_reply_sia_timeout(
    instance: &mut Instance,
    msg: ReplyTimeoutMsg,
) {
    let Some(reply) = instance.state.replies.get_mut(msg.reply_idx) else {
        return;
    };
    let prefix = reply.prefix;
    let nbr_id = reply.nbr;

    if reply.sia_reply_pending
        || reply.sia_queries_sent >= REPLY_SIA_MAX_QUERIES
    {
        let Ok((nbr_idx, nbr)) = instance.state.neighbors.get_by_id(nbr_id)
        else {
            return;
        };
        Debug::NbrStuck(&nbr.addr, &prefix).log();
        nbr_delete(instance, nbr_idx);
        return;
    }

    reply.sia_queries_sent += 1;
    reply.sia_reply_pending = true;
    if let Some(task) = reply.active_task.as_mut() {
        task.reset(None);
    }
    if let Some(task) = reply.sia_task.as_mut() {
        task.reset(None);
    }

    let Ok((_, nbr)) = instance.state.neighbors.get_by_id(nbr_id) else {
        return;
    };
    let addr = nbr.addr;
    let Some(node) = instance.state.topology.get(&prefix) else {
        return;
    };
    let rinfo = node.successor_rinfo();
    output::send_query(
        &instance.tx,
        SendDestination::Neighbor(addr),
        &rinfo,
        true,
    );
}
