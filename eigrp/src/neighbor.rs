//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use eigrp_utils::ip::AddressFamily;
use ipnetwork::IpNetwork;

use crate::collections::{NeighborId, ReplyIndex};
use crate::debug::Debug;

// An abstract neighbor: either a remote peer reached through one local
// interface, or a synthetic "self" neighbor used to inject locally
// originated and redistributed routes into the topology table.
#[derive(Debug)]
pub struct Neighbor {
    pub id: NeighborId,
    pub addr: IpAddr,
    pub ifindex: u32,
    pub flags: NeighborFlags,
    // Outstanding replies owed by this neighbor, keyed by destination.
    // Used to detect and evict stuck peers.
    pub replies: BTreeMap<IpNetwork, ReplyIndex>,
    pub uptime: DateTime<Utc>,
    pub statistics: MessageStatistics,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct NeighborFlags: u8 {
        // Synthetic neighbor representing the local router.
        const SELF = 0x01;
        // Synthetic neighbor originating redistributed routes.
        const REDIST = 0x02;
    }
}

// Inbound statistic counters.
#[derive(Debug, Default)]
pub struct MessageStatistics {
    pub discontinuity_time: Option<DateTime<Utc>>,
    pub updates_rcvd: u32,
    pub queries_rcvd: u32,
    pub replies_rcvd: u32,
    pub sia_queries_rcvd: u32,
    pub sia_replies_rcvd: u32,
}

// Protocol message kinds, for statistics purposes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageKind {
    Update,
    Query,
    Reply,
    SiaQuery,
    SiaReply,
}

// ===== impl Neighbor =====

impl Neighbor {
    pub(crate) fn new(
        id: NeighborId,
        addr: IpAddr,
        ifindex: u32,
        flags: NeighborFlags,
    ) -> Neighbor {
        if !flags.contains(NeighborFlags::SELF) {
            Debug::NbrCreate(&addr).log();
        }

        Neighbor {
            id,
            addr,
            ifindex,
            flags,
            replies: Default::default(),
            uptime: Utc::now(),
            statistics: Default::default(),
        }
    }

    // Synthetic neighbors inject local routes and are exempt from
    // split-horizon suppression.
    pub(crate) fn new_self(
        id: NeighborId,
        af: AddressFamily,
        flags: NeighborFlags,
    ) -> Neighbor {
        let addr = match af {
            AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Neighbor::new(id, addr, 0, flags | NeighborFlags::SELF)
    }

    pub(crate) fn is_self(&self) -> bool {
        self.flags.contains(NeighborFlags::SELF)
    }
}

// ===== impl MessageStatistics =====

impl MessageStatistics {
    pub(crate) fn update(&mut self, kind: MessageKind) {
        self.discontinuity_time = Some(Utc::now());
        match kind {
            MessageKind::Update => self.updates_rcvd += 1,
            MessageKind::Query => self.queries_rcvd += 1,
            MessageKind::Reply => self.replies_rcvd += 1,
            MessageKind::SiaQuery => self.sia_queries_rcvd += 1,
            MessageKind::SiaReply => self.sia_replies_rcvd += 1,
        }
    }
}
