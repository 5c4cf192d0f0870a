// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashSet;

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    host::Host,
    resource::Resource,
};

use super::child_elements;

/// Parse the output of `drbdadm dump-xml` into resources, in document order.
///
/// Only malformed XML is an error. Missing pieces of an otherwise well-formed document are
/// tolerated: a resource without hosts gets an empty host list, and a host without e.g. an
/// `<address>` gets an empty string for it.
///
/// Resource names are unique in the result: a resource without a name is skipped, and a resource
/// repeating an earlier name is dropped so the first one wins.
pub fn parse_config(xml: &str) -> Result<Vec<Resource>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::ConfigParse(e.to_string()))?;

    let mut resources = Vec::new();
    let mut seen = HashSet::new();
    for config in doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("config"))
    {
        // A resource without its own protocol inherits the one from the `common` section.
        let common_protocol = child_elements(config, "common")
            .find_map(|common| common.attribute("protocol"))
            .unwrap_or("");

        for res in child_elements(config, "resource") {
            let Some(name) = res.attribute("name").filter(|n| !n.is_empty()) else {
                warn!("skipping configured resource without a name");
                continue;
            };
            if !seen.insert(name) {
                warn!("resource '{name}' is configured more than once; keeping the first");
                continue;
            }
            let name = name.to_string();
            let protocol = res
                .attribute("protocol")
                .unwrap_or(common_protocol)
                .to_string();
            let hosts: Vec<Host> = child_elements(res, "host").map(parse_host).collect();

            if hosts.is_empty() {
                debug!("resource '{name}' has no hosts in its configuration");
            }

            resources.push(Resource::new(name, protocol, hosts));
        }
    }

    Ok(resources)
}

fn parse_host(host: roxmltree::Node) -> Host {
    let device = first_child(host, "device");
    let address = first_child(host, "address");

    Host {
        name: host.attribute("name").unwrap_or("").to_string(),
        device: element_text(device),
        minor: device
            .and_then(|d| d.attribute("minor"))
            .and_then(|m| m.trim().parse().ok()),
        disk: element_text(first_child(host, "disk")),
        address: element_text(address),
        family: address
            .and_then(|a| a.attribute("family"))
            .map(str::to_string),
        port: address
            .and_then(|a| a.attribute("port"))
            .and_then(|p| p.trim().parse().ok()),
        meta_disk: element_text(first_child(host, "meta-disk")),
    }
}

fn first_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &'a str,
) -> Option<roxmltree::Node<'a, 'input>> {
    child_elements(node, tag).next()
}

fn element_text(node: Option<roxmltree::Node>) -> String {
    node.and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}
