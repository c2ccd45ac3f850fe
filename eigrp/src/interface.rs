//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use eigrp_utils::southbound::InterfaceFlags;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::metric::LinkAttrs;

// Per-link attributes the route-computation engine needs: metric components
// for aging received routes by one hop, and the knobs controlling update and
// query fan-out. Full interface management lives outside the engine.
#[derive(Debug)]
pub struct Interface {
    pub ifindex: u32,
    pub name: String,
    pub flags: InterfaceFlags,
    pub config: InterfaceCfg,
    // Directly connected prefixes.
    pub addrs: BTreeSet<IpNetwork>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct InterfaceCfg {
    // Delay in tens of microseconds.
    pub delay: u32,
    // Bandwidth in kbit/s.
    pub bandwidth: u32,
    pub mtu: u32,
    pub split_horizon: bool,
    pub passive: bool,
}

#[derive(Debug, Default)]
pub struct Interfaces {
    ifindex_tree: BTreeMap<u32, Interface>,
}

// ===== impl Interface =====

impl Interface {
    pub(crate) fn link_attrs(&self) -> LinkAttrs {
        LinkAttrs {
            delay: self.config.delay,
            bandwidth: self.config.bandwidth,
            mtu: self.config.mtu,
        }
    }
}

impl Default for InterfaceCfg {
    fn default() -> InterfaceCfg {
        InterfaceCfg {
            delay: 10,
            bandwidth: 100000,
            mtu: 1500,
            split_horizon: true,
            passive: false,
        }
    }
}

// ===== impl Interfaces =====

impl Interfaces {
    pub(crate) fn insert(
        &mut self,
        ifindex: u32,
        name: String,
        config: InterfaceCfg,
    ) -> &mut Interface {
        self.ifindex_tree.entry(ifindex).or_insert_with(|| Interface {
            ifindex,
            name,
            flags: InterfaceFlags::OPERATIVE,
            config,
            addrs: Default::default(),
        })
    }

    pub(crate) fn get(&self, ifindex: u32) -> Option<&Interface> {
        self.ifindex_tree.get(&ifindex)
    }

    pub(crate) fn get_mut(&mut self, ifindex: u32) -> Option<&mut Interface> {
        self.ifindex_tree.get_mut(&ifindex)
    }

    // Link attributes used to age metrics received over the given interface.
    // Unknown interfaces fall back to the default attributes so a route
    // learned during interface churn is penalized, not lost.
    pub(crate) fn link_attrs(&self, ifindex: u32) -> LinkAttrs {
        match self.get(ifindex) {
            Some(iface) => iface.link_attrs(),
            None => {
                let config = InterfaceCfg::default();
                LinkAttrs {
                    delay: config.delay,
                    bandwidth: config.bandwidth,
                    mtu: config.mtu,
                }
            }
        }
    }

    pub(crate) fn split_horizon(&self, ifindex: u32) -> bool {
        self.get(ifindex)
            .map(|iface| iface.config.split_horizon)
            .unwrap_or(true)
    }
}
