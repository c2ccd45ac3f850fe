//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]

pub mod collections;
pub mod debug;
pub mod dual;
pub mod error;
pub mod events;
pub mod instance;
pub mod interface;
pub mod metric;
pub mod neighbor;
pub mod northbound;
pub mod output;
pub mod route;
pub mod southbound;
pub mod tasks;
pub mod topology;
