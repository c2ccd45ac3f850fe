//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use tracing::warn;

use crate::collections::NeighborId;
use crate::dual::fsm;

// EIGRP errors.
#[derive(Debug)]
pub enum Error {
    NbrIdNotFound(NeighborId),
    NbrNotFound(IpAddr),
    ReplyNotFound(IpAddr, IpNetwork),
    FsmUnexpectedEvent(IpNetwork, fsm::State, fsm::Event),
    InvalidRouteInfo(Option<IpAddr>, RouteInfoError),
}

// Reasons a route record is rejected at the instance boundary.
#[derive(Debug, Eq, PartialEq)]
pub enum RouteInfoError {
    AddressFamilyMismatch,
    UnroutablePrefix,
    InvalidNexthop,
    MissingExternalBlock,
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::NbrIdNotFound(nbr_id) => {
                warn!(%nbr_id, "{}", self);
            }
            Error::NbrNotFound(addr) => {
                warn!(%addr, "{}", self);
            }
            Error::ReplyNotFound(addr, prefix) => {
                warn!(%addr, %prefix, "{}", self);
            }
            Error::FsmUnexpectedEvent(prefix, state, event) => {
                warn!(%prefix, %state, ?event, "{}", self);
            }
            Error::InvalidRouteInfo(src, error) => {
                warn!(?src, %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NbrIdNotFound(..) => {
                write!(f, "neighbor ID not found")
            }
            Error::NbrNotFound(..) => {
                write!(f, "neighbor not found")
            }
            Error::ReplyNotFound(..) => {
                write!(f, "no outstanding reply for this neighbor")
            }
            Error::FsmUnexpectedEvent(..) => {
                write!(f, "unexpected DUAL event")
            }
            Error::InvalidRouteInfo(..) => {
                write!(f, "invalid route information")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidRouteInfo(_, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl RouteInfoError =====

impl std::fmt::Display for RouteInfoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteInfoError::AddressFamilyMismatch => {
                write!(f, "address-family mismatch")
            }
            RouteInfoError::UnroutablePrefix => {
                write!(f, "prefix is not routable")
            }
            RouteInfoError::InvalidNexthop => {
                write!(f, "invalid nexthop address")
            }
            RouteInfoError::MissingExternalBlock => {
                write!(f, "external route without external attributes")
            }
        }
    }
}

impl std::error::Error for RouteInfoError {}
