//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use tracing::debug;

use crate::collections::NeighborId;
use crate::dual::fsm;
use crate::tasks::messages::output::SendDestination;

// EIGRP debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate(&'a str),
    NbrCreate(&'a IpAddr),
    NbrDelete(&'a IpAddr),
    NbrStuck(&'a IpAddr, &'a IpNetwork),
    NodeCreate(&'a IpNetwork),
    NodeDelete(&'a IpNetwork),
    RouteDelete(&'a IpNetwork, NeighborId),
    FsmTransition(&'a IpNetwork, fsm::State, fsm::Event, fsm::State),
    MsgRx(&'a IpAddr, &'static str, &'a IpNetwork),
    MsgTx(&'a SendDestination, &'static str, usize),
    RouteInstall(&'a IpNetwork, u32),
    RouteUninstall(&'a IpNetwork),
    RedistributeAdd(&'a IpNetwork),
    RedistributeDel(&'a IpNetwork),
    InterfaceDown(u32),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate(name) => {
                debug!(%name, "{}", self);
            }
            Debug::NbrCreate(addr) | Debug::NbrDelete(addr) => {
                debug!(%addr, "{}", self);
            }
            Debug::NbrStuck(addr, prefix) => {
                debug!(%addr, %prefix, "{}", self);
            }
            Debug::NodeCreate(prefix)
            | Debug::NodeDelete(prefix)
            | Debug::RouteUninstall(prefix)
            | Debug::RedistributeAdd(prefix)
            | Debug::RedistributeDel(prefix) => {
                debug!(%prefix, "{}", self);
            }
            Debug::RouteDelete(prefix, nbr_id) => {
                debug!(%prefix, %nbr_id, "{}", self);
            }
            Debug::FsmTransition(prefix, old_state, event, new_state) => {
                debug!(%prefix, %old_state, ?event, %new_state, "{}", self);
            }
            Debug::MsgRx(src, kind, prefix) => {
                debug!(%src, %kind, %prefix, "{}", self);
            }
            Debug::MsgTx(dst, kind, routes) => {
                debug!(?dst, %kind, %routes, "{}", self);
            }
            Debug::RouteInstall(prefix, distance) => {
                debug!(%prefix, %distance, "{}", self);
            }
            Debug::InterfaceDown(ifindex) => {
                debug!(%ifindex, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate(..) => {
                write!(f, "instance created")
            }
            Debug::NbrCreate(..) => {
                write!(f, "neighbor created")
            }
            Debug::NbrDelete(..) => {
                write!(f, "neighbor deleted")
            }
            Debug::NbrStuck(..) => {
                write!(f, "neighbor stuck in active")
            }
            Debug::NodeCreate(..) => {
                write!(f, "destination created")
            }
            Debug::NodeDelete(..) => {
                write!(f, "destination deleted")
            }
            Debug::RouteDelete(..) => {
                write!(f, "route deleted")
            }
            Debug::FsmTransition(..) => {
                write!(f, "DUAL state transition")
            }
            Debug::MsgRx(..) => {
                write!(f, "message received")
            }
            Debug::MsgTx(..) => {
                write!(f, "message sent")
            }
            Debug::RouteInstall(..) => {
                write!(f, "installing route")
            }
            Debug::RouteUninstall(..) => {
                write!(f, "uninstalling route")
            }
            Debug::RedistributeAdd(..) => {
                write!(f, "redistributing route")
            }
            Debug::RedistributeDel(..) => {
                write!(f, "withdrawing redistributed route")
            }
            Debug::InterfaceDown(..) => {
                write!(f, "interface down")
            }
        }
    }
}
