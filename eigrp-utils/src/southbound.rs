//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::str::FromStr;

use bitflags::bitflags;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

// Routing protocols recognized as route sources for redistribution.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Connected,
    Static,
    Rip,
    Ospf,
    Bgp,
    Eigrp,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct InterfaceFlags: u8 {
        const LOOPBACK = 0x01;
        const OPERATIVE = 0x02;
    }
}

// Route nexthop.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum Nexthop {
    Address { ifindex: u32, addr: IpAddr },
    Interface { ifindex: u32 },
}

// Request to install or replace a route in the FIB.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteMsg {
    pub protocol: Protocol,
    pub prefix: IpNetwork,
    pub distance: u32,
    pub metric: u32,
    pub tag: Option<u32>,
    pub nexthops: BTreeSet<Nexthop>,
}

// Request to remove a route from the FIB.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteKeyMsg {
    pub protocol: Protocol,
    pub prefix: IpNetwork,
}

// ===== impl Protocol =====

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Connected => write!(f, "connected"),
            Protocol::Static => write!(f, "static"),
            Protocol::Rip => write!(f, "rip"),
            Protocol::Ospf => write!(f, "ospf"),
            Protocol::Bgp => write!(f, "bgp"),
            Protocol::Eigrp => write!(f, "eigrp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "connected" => Ok(Protocol::Connected),
            "static" => Ok(Protocol::Static),
            "rip" => Ok(Protocol::Rip),
            "ospf" => Ok(Protocol::Ospf),
            "bgp" => Ok(Protocol::Bgp),
            "eigrp" => Ok(Protocol::Eigrp),
            _ => Err(()),
        }
    }
}
