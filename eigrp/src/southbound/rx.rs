//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use eigrp_utils::southbound::{Protocol, RouteKeyMsg, RouteMsg};
use ipnetwork::IpNetwork;

use crate::debug::Debug;
use crate::error::Error;
use crate::events;
use crate::instance::{Instance, InstanceCfg, RedistRule};
use crate::metric::Metric;
use crate::route::{ExternalMetric, RouteInfo, RouteKind};

// ===== global functions =====

// A route from another protocol showed up in the RIB. When the
// redistribution policy accepts it, it enters the topology table as an
// external route originated by the synthetic redistribute neighbor.
pub(crate) fn process_route_add(instance: &mut Instance, msg: RouteMsg) {
    // Routes of this instance echoed back by the RIB.
    if msg.protocol == Protocol::Eigrp {
        return;
    }

    let Some(rule) =
        redist_rule_find(&instance.config, msg.protocol, &msg.prefix)
    else {
        return;
    };
    if !rule.allow {
        // A previously accepted route may be covered by the deny rule after
        // a policy change.
        redist_withdraw(instance, msg.prefix);
        return;
    }

    let link = rule.metric.unwrap_or(instance.config.default_metric);
    let external = ExternalMetric {
        router_id: instance.config.router_id,
        as_number: instance.config.as_number as u32,
        tag: msg.tag.unwrap_or(0),
        metric: msg.metric,
        protocol: msg.protocol,
        flags: 0,
    };
    let ri = RouteInfo::new(
        RouteKind::External,
        msg.prefix,
        Metric::from_link(&link),
        Some(external),
    );
    if let Err(error) = ri.validate(instance.config.af) {
        Error::InvalidRouteInfo(None, error).log();
        return;
    }

    Debug::RedistributeAdd(&msg.prefix).log();
    let redist_nbr = instance.state.redist_nbr;
    events::local_route_input(instance, redist_nbr, ri, 0, false);
}

pub(crate) fn process_route_del(instance: &mut Instance, msg: RouteKeyMsg) {
    if msg.protocol == Protocol::Eigrp {
        return;
    }

    Debug::RedistributeDel(&msg.prefix).log();
    redist_withdraw(instance, msg.prefix);
}

// ===== helper functions =====

fn redist_withdraw(instance: &mut Instance, prefix: IpNetwork) {
    let ri = RouteInfo::new_withdraw(RouteKind::External, prefix);
    let redist_nbr = instance.state.redist_nbr;
    events::local_route_input(instance, redist_nbr, ri, 0, false);
}

// First matching rule wins; routes matching no rule are not redistributed.
fn redist_rule_find<'a>(
    config: &'a InstanceCfg,
    protocol: Protocol,
    prefix: &IpNetwork,
) -> Option<&'a RedistRule> {
    config.redistribute.iter().find(|rule| {
        rule.protocol.is_none_or(|rule_proto| rule_proto == protocol)
            && rule.prefix.is_none_or(|rule_prefix| {
                rule_prefix.contains(prefix.network())
                    && rule_prefix.prefix() <= prefix.prefix()
            })
    })
}
