//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

// IP address family.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

// ===== impl AddressFamily =====

impl AddressFamily {
    pub fn max_prefixlen(&self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }

    pub fn of_addr(addr: &IpAddr) -> AddressFamily {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn of_network(network: &IpNetwork) -> AddressFamily {
        match network {
            IpNetwork::V4(_) => AddressFamily::Ipv4,
            IpNetwork::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "ipv4"),
            AddressFamily::Ipv6 => write!(f, "ipv6"),
        }
    }
}

// ===== global functions =====

// Checks whether the given prefix is acceptable as a routing destination.
//
// Loopback, multicast and link-local destinations never belong in a routing
// table and are rejected before they can reach the route-computation core.
pub fn routable_prefix(prefix: &IpNetwork) -> bool {
    match prefix.ip() {
        IpAddr::V4(addr) => {
            !addr.is_loopback() && !addr.is_multicast() && !addr.is_link_local()
        }
        IpAddr::V6(addr) => {
            !addr.is_loopback()
                && !addr.is_multicast()
                && !addr.is_unicast_link_local()
        }
    }
}

// Checks whether the given address is usable as a nexthop.
pub fn routable_nexthop(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(addr) => !addr.is_loopback() && !addr.is_multicast(),
        IpAddr::V6(addr) => !addr.is_loopback() && !addr.is_multicast(),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn reject_unroutable_prefixes() {
        for prefix in ["127.0.0.0/8", "224.0.0.10/32", "ff02::a/128", "::1/128"]
        {
            let prefix = IpNetwork::from_str(prefix).unwrap();
            assert!(!routable_prefix(&prefix), "{prefix}");
        }
        for prefix in ["10.0.1.0/24", "172.16.0.0/16", "2001:db8::/32"] {
            let prefix = IpNetwork::from_str(prefix).unwrap();
            assert!(routable_prefix(&prefix), "{prefix}");
        }
    }
}
