//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::IpAddr;

use bitflags::bitflags;
use ipnetwork::IpNetwork;

use crate::collections::{NeighborId, ReplyIndex};
use crate::debug::Debug;
use crate::dual::fsm;
use crate::metric::{INFINITE_DISTANCE, LinkAttrs, Metric};
use crate::route::{ExternalMetric, RouteInfo, RouteKind};

// Topology table of one routing instance: one node per destination prefix,
// kept in a balanced ordered tree for deterministic control-plane dumps.
#[derive(Debug, Default)]
pub struct Topology {
    tree: BTreeMap<IpNetwork, RouteNode>,
}

// Per-destination node. Owns all candidate routes (one per advertising
// neighbor), the cached successor, the computation state and the handles of
// any outstanding reply records.
#[derive(Debug)]
pub struct RouteNode {
    pub prefix: IpNetwork,
    pub state: fsm::State,
    pub successor: Successor,
    // Candidate routes, keyed by advertising neighbor.
    pub routes: BTreeMap<NeighborId, Route>,
    // Outstanding replies for the computation in progress.
    pub replies: BTreeMap<NeighborId, ReplyIndex>,
    // Advertising neighbor and distance of the route currently present in
    // the FIB, if any.
    pub installed: Option<(NeighborId, u32)>,
}

// Cached best path. `nbr` is `None` while the destination is unreachable,
// in which case the feasible distance is infinite.
#[derive(Debug)]
pub struct Successor {
    pub nbr: Option<NeighborId>,
    pub kind: RouteKind,
    // Feasible distance: this node's best distance at the last moment it
    // was passive. The threshold of the feasibility test.
    pub fdistance: u32,
    // The successor's own distance to the destination.
    pub rdistance: u32,
    pub metric: Metric,
    pub external: Option<ExternalMetric>,
    pub nexthop: Option<IpAddr>,
    // Outgoing interface (zero for locally originated paths).
    pub ifindex: u32,
    pub flags: RouteFlags,
}

// One candidate route, belonging to exactly one (destination, neighbor)
// pair.
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub nbr: NeighborId,
    pub kind: RouteKind,
    pub ifindex: u32,
    pub nexthop: Option<IpAddr>,
    // Metric as seen from this router (aged by the incoming link).
    pub metric: Metric,
    pub external: Option<ExternalMetric>,
    // Distance via this neighbor.
    pub distance: u32,
    // The neighbor's own advertised distance.
    pub rdistance: u32,
    pub flags: RouteFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RouteFlags: u8 {
        // Locally originated (self neighbor).
        const LOCAL = 0x01;
        // Directly connected prefix; reported distance is zero.
        const CONNECTED = 0x02;
    }
}

// ===== impl Topology =====

impl Topology {
    pub(crate) fn get(&self, prefix: &IpNetwork) -> Option<&RouteNode> {
        self.tree.get(prefix)
    }

    pub(crate) fn get_mut(
        &mut self,
        prefix: &IpNetwork,
    ) -> Option<&mut RouteNode> {
        self.tree.get_mut(prefix)
    }

    pub(crate) fn get_or_insert(&mut self, prefix: IpNetwork) -> &mut RouteNode {
        self.tree
            .entry(prefix)
            .or_insert_with(|| RouteNode::new(prefix))
    }

    // Destroys a destination node once its last candidate route is gone and
    // it has returned to passive with no outstanding replies. Calling this
    // in any other situation is a logic error in the caller.
    pub(crate) fn delete(&mut self, prefix: &IpNetwork) {
        if let Some(node) = self.tree.get(prefix) {
            debug_assert!(node.routes.is_empty());
            debug_assert!(node.replies.is_empty());
            debug_assert_eq!(node.state, fsm::State::Passive);
            Debug::NodeDelete(prefix).log();
            self.tree.remove(prefix);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RouteNode> + '_ {
        self.tree.values()
    }

    pub(crate) fn prefixes(&self) -> Vec<IpNetwork> {
        self.tree.keys().copied().collect()
    }
}

// ===== impl RouteNode =====

impl RouteNode {
    fn new(prefix: IpNetwork) -> RouteNode {
        Debug::NodeCreate(&prefix).log();

        RouteNode {
            prefix,
            state: fsm::State::Passive,
            successor: Successor::unreachable(),
            routes: Default::default(),
            replies: Default::default(),
            installed: None,
        }
    }

    // Selects the best candidate route. With `feasible_only` set, only
    // routes passing the feasibility test against the current feasible
    // distance are considered; this is the loop-freedom guarantee.
    //
    // Preference among eligible routes: connected first, then internal over
    // external regardless of metric, then lowest distance.
    pub(crate) fn best_route(&self, feasible_only: bool) -> Option<&Route> {
        let fdistance = self.successor.fdistance;
        self.routes
            .values()
            .filter(|route| route.distance < INFINITE_DISTANCE)
            .filter(|route| !feasible_only || route.is_feasible(fdistance))
            .min_by_key(|route| {
                (
                    !route.flags.contains(RouteFlags::CONNECTED),
                    route.kind,
                    route.distance,
                    route.nbr,
                )
            })
    }

    // Route information describing the current best path, used to answer
    // queries and to advertise the destination. Unreachable destinations
    // yield an infinite-metric record.
    pub(crate) fn successor_rinfo(&self) -> RouteInfo {
        let mut rinfo = match self.successor.nbr {
            Some(_) => RouteInfo::new(
                self.successor.kind,
                self.prefix,
                self.successor.metric,
                self.successor.external,
            ),
            None => RouteInfo::new_withdraw(self.successor.kind, self.prefix),
        };
        if self.state != fsm::State::Passive {
            rinfo.metric.flags.insert(crate::metric::MetricFlags::ACTIVE);
        }
        rinfo
    }

    pub(crate) fn route_del(&mut self, nbr_id: NeighborId) -> Option<Route> {
        let route = self.routes.remove(&nbr_id);
        if route.is_some() {
            Debug::RouteDelete(&self.prefix, nbr_id).log();
        }
        route
    }
}

// ===== impl Successor =====

impl Successor {
    pub(crate) fn unreachable() -> Successor {
        Successor {
            nbr: None,
            kind: RouteKind::Internal,
            fdistance: INFINITE_DISTANCE,
            rdistance: INFINITE_DISTANCE,
            metric: Metric::infinite(),
            external: None,
            nexthop: None,
            ifindex: 0,
            flags: RouteFlags::empty(),
        }
    }
}

// ===== impl Route =====

impl Route {
    pub(crate) fn new(
        nbr_id: NeighborId,
        kind: RouteKind,
        ifindex: u32,
        flags: RouteFlags,
    ) -> Route {
        Route {
            nbr: nbr_id,
            kind,
            ifindex,
            nexthop: None,
            metric: Metric::infinite(),
            external: None,
            distance: INFINITE_DISTANCE,
            rdistance: INFINITE_DISTANCE,
            flags,
        }
    }

    // Refreshes the route from a received record. Remote routes age the
    // advertised metric by the attributes of the incoming link; local
    // routes adopt the record metric as-is.
    pub(crate) fn update(&mut self, ri: &RouteInfo, link: Option<&LinkAttrs>) {
        self.kind = ri.kind;
        self.external = ri.external;
        self.nexthop = ri.nexthop;
        match link {
            Some(link) => {
                self.rdistance = ri.metric.distance();
                self.metric = ri.metric.aged(link);
                self.distance = self.metric.distance();
            }
            None => {
                self.metric = ri.metric;
                self.distance = self.metric.distance();
                self.rdistance = if self.flags.contains(RouteFlags::CONNECTED)
                {
                    0
                } else {
                    self.distance
                };
            }
        }
    }

    // The feasibility condition: the neighbor's reported distance must be
    // strictly below the feasible distance, proving the neighbor cannot be
    // routing through this node. Locally originated routes are feasible by
    // definition.
    pub(crate) fn is_feasible(&self, fdistance: u32) -> bool {
        self.flags.contains(RouteFlags::LOCAL)
            || self.rdistance == 0
            || self.rdistance < fdistance
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn test_prefix() -> IpNetwork {
        IpNetwork::from_str("192.168.1.0/24").unwrap()
    }

    fn test_route(nbr: NeighborId, delay: u32, link: &LinkAttrs) -> Route {
        let attrs = LinkAttrs { delay, ..*link };
        let ri = RouteInfo::new(
            RouteKind::Internal,
            test_prefix(),
            Metric::from_link(&attrs),
            None,
        );
        let mut route = Route::new(nbr, ri.kind, 1, RouteFlags::empty());
        route.update(&ri, Some(link));
        route
    }

    #[test]
    fn successor_rinfo_round_trips_metric() {
        let link = LinkAttrs {
            delay: 10,
            bandwidth: 100000,
            mtu: 1500,
        };
        let route = test_route(1, 10, &link);

        let mut node = RouteNode::new(test_prefix());
        node.successor = Successor {
            nbr: Some(route.nbr),
            kind: route.kind,
            fdistance: route.distance,
            rdistance: route.rdistance,
            metric: route.metric,
            external: route.external,
            nexthop: None,
            ifindex: route.ifindex,
            flags: route.flags,
        };

        // The record given to neighbors reconstructs the exact same metric.
        let rinfo = node.successor_rinfo();
        let mut relearned = Route::new(2, rinfo.kind, 2, RouteFlags::empty());
        relearned.update(&rinfo, None);
        assert_eq!(relearned.metric, route.metric);
        assert_eq!(relearned.distance, route.distance);
    }

    #[test]
    fn best_route_applies_feasibility_and_preference() {
        let link = LinkAttrs {
            delay: 10,
            bandwidth: 100000,
            mtu: 1500,
        };
        let mut node = RouteNode::new(test_prefix());
        let near = test_route(1, 10, &link);
        let far = test_route(2, 200, &link);
        node.routes.insert(near.nbr, near);
        node.routes.insert(far.nbr, far);

        node.successor.fdistance = INFINITE_DISTANCE;
        assert_eq!(node.best_route(true).map(|route| route.nbr), Some(1));

        // With the feasible distance below both reported distances, only
        // the unconstrained selection still finds a route.
        node.successor.fdistance = near.rdistance;
        assert!(node.best_route(true).is_none());
        assert_eq!(node.best_route(false).map(|route| route.nbr), Some(1));
    }
}
