//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// Fixed-point scaling factor applied to the delay and bandwidth components.
pub const SCALING_FACTOR: u32 = 256;

// Reference bandwidth used by the composite formula, in kbit/s.
pub const BANDWIDTH_BASE: u32 = 10_000_000;

// Composite distance of an unreachable destination.
pub const INFINITE_DISTANCE: u32 = u32::MAX;

// Composite metric of a route, as advertised on the wire and as kept in the
// topology table. Delay and bandwidth are stored in their scaled fixed-point
// representation; the raw link values are recovered with [`real_delay`] and
// [`real_bandwidth`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Metric {
    pub delay: u32,
    pub bandwidth: u32,
    pub mtu: u32,
    pub hop_count: u8,
    pub reliability: u8,
    pub load: u8,
    pub tag: u8,
    pub flags: MetricFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct MetricFlags: u8 {
        // The advertising router is in active state for the destination.
        const ACTIVE = 0x01;
    }
}

// Raw attributes of a local link, used to age metrics by one hop and to
// originate metrics for directly connected prefixes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LinkAttrs {
    // Delay in tens of microseconds.
    pub delay: u32,
    // Bandwidth in kbit/s.
    pub bandwidth: u32,
    pub mtu: u32,
}

// ===== impl Metric =====

impl Metric {
    // Sentinel representing an unreachable destination.
    pub const INFINITE_COMPONENT: u32 = u32::MAX;

    // Metric used to withdraw a route or to represent an unknown destination.
    pub fn infinite() -> Metric {
        Metric {
            delay: Metric::INFINITE_COMPONENT,
            bandwidth: 0,
            mtu: 0,
            hop_count: 0,
            reliability: 0,
            load: 0,
            tag: 0,
            flags: MetricFlags::empty(),
        }
    }

    // Metric of a prefix directly attached to the given link.
    pub fn from_link(link: &LinkAttrs) -> Metric {
        Metric {
            delay: composite_delay(link.delay),
            bandwidth: composite_bandwidth(link.bandwidth),
            mtu: link.mtu,
            hop_count: 0,
            reliability: 255,
            load: 1,
            tag: 0,
            flags: MetricFlags::empty(),
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.delay == Metric::INFINITE_COMPONENT
    }

    // Composite distance: scaled delay plus scaled bandwidth. Overflow clamps
    // to the infinite metric instead of wrapping.
    pub fn distance(&self) -> u32 {
        if self.is_infinite() {
            return Metric::INFINITE_COMPONENT;
        }
        self.delay.saturating_add(self.bandwidth)
    }

    // Returns this metric as seen through one additional hop over the given
    // link.
    pub fn aged(&self, link: &LinkAttrs) -> Metric {
        if self.is_infinite() {
            return *self;
        }

        let mut metric = *self;
        metric.delay =
            metric.delay.saturating_add(composite_delay(link.delay));
        if metric.delay == Metric::INFINITE_COMPONENT {
            return Metric::infinite();
        }

        // The path bandwidth is constrained by the slowest link.
        let bandwidth =
            std::cmp::min(real_bandwidth(metric.bandwidth), link.bandwidth);
        metric.bandwidth = composite_bandwidth(bandwidth);
        metric.mtu = std::cmp::min(metric.mtu, link.mtu);
        metric.hop_count = metric.hop_count.saturating_add(1);
        metric
    }
}

// ===== global functions =====

// Scales a raw link delay (tens of microseconds) into its fixed-point
// composite representation.
pub fn composite_delay(delay: u32) -> u32 {
    if delay == Metric::INFINITE_COMPONENT {
        return Metric::INFINITE_COMPONENT;
    }
    delay.saturating_mul(SCALING_FACTOR)
}

pub fn real_delay(delay: u32) -> u32 {
    if delay == Metric::INFINITE_COMPONENT {
        return Metric::INFINITE_COMPONENT;
    }
    delay / SCALING_FACTOR
}

// Scales a raw bandwidth (kbit/s) into its inverted fixed-point composite
// representation: slower links yield bigger values.
pub fn composite_bandwidth(bandwidth: u32) -> u32 {
    if bandwidth == 0 {
        return Metric::INFINITE_COMPONENT;
    }
    (BANDWIDTH_BASE / bandwidth).saturating_mul(SCALING_FACTOR)
}

pub fn real_bandwidth(bandwidth: u32) -> u32 {
    if bandwidth == 0 || bandwidth == Metric::INFINITE_COMPONENT {
        return 0;
    }
    BANDWIDTH_BASE / (bandwidth / SCALING_FACTOR)
}
