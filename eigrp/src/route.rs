//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr};

use eigrp_utils::ip::{self, AddressFamily};
use eigrp_utils::southbound::Protocol;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::error::RouteInfoError;
use crate::metric::Metric;

// Route kind. Internal routes are always preferred over external ones,
// regardless of metric, so the ordering of the variants matters.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum RouteKind {
    Internal,
    External,
}

// Attributes carried by routes redistributed from other protocols.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct ExternalMetric {
    pub router_id: Ipv4Addr,
    pub as_number: u32,
    pub tag: u32,
    pub metric: u32,
    pub protocol: Protocol,
    pub flags: u8,
}

// Route information record. This is the universal currency crossing the
// engine boundary: updates, queries and replies all carry one of these, and
// redistributed or connected prefixes are injected as one. A withdrawal is a
// record with an infinite metric, not a distinct message kind.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteInfo {
    pub af: AddressFamily,
    pub kind: RouteKind,
    pub prefix: IpNetwork,
    pub nexthop: Option<IpAddr>,
    pub metric: Metric,
    pub external: Option<ExternalMetric>,
}

// ===== impl RouteKind =====

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteKind::Internal => write!(f, "internal"),
            RouteKind::External => write!(f, "external"),
        }
    }
}

// ===== impl RouteInfo =====

impl RouteInfo {
    pub fn new(
        kind: RouteKind,
        prefix: IpNetwork,
        metric: Metric,
        external: Option<ExternalMetric>,
    ) -> RouteInfo {
        RouteInfo {
            af: AddressFamily::of_network(&prefix),
            kind,
            prefix,
            nexthop: None,
            metric,
            external,
        }
    }

    // Record announcing the given destination as unreachable.
    pub fn new_withdraw(kind: RouteKind, prefix: IpNetwork) -> RouteInfo {
        RouteInfo::new(kind, prefix, Metric::infinite(), None)
    }

    pub fn is_withdraw(&self) -> bool {
        self.metric.is_infinite()
    }

    // Boundary validation. Records failing these checks never reach the
    // topology table.
    pub fn validate(&self, af: AddressFamily) -> Result<(), RouteInfoError> {
        if self.af != af || AddressFamily::of_network(&self.prefix) != af {
            return Err(RouteInfoError::AddressFamilyMismatch);
        }
        if !ip::routable_prefix(&self.prefix) {
            return Err(RouteInfoError::UnroutablePrefix);
        }
        if let Some(nexthop) = &self.nexthop
            && (!ip::routable_nexthop(nexthop)
                || AddressFamily::of_addr(nexthop) != af)
        {
            return Err(RouteInfoError::InvalidNexthop);
        }
        // Withdrawals strip the external block, so only reachable external
        // routes are required to carry one.
        if self.kind == RouteKind::External
            && self.external.is_none()
            && !self.is_withdraw()
        {
            return Err(RouteInfoError::MissingExternalBlock);
        }
        Ok(())
    }
}
