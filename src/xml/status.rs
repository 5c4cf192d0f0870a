// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use log::warn;

use crate::{
    error::{Error, Result},
    resource::Status,
};

use super::child_elements;

/// Parse the output of `drbdadm status` into one Status record per reported resource, in
/// document order.
///
/// Attributes drbdadm did not report stay `None`. A `<resource>` element without a name cannot be
/// matched to anything and is skipped.
pub fn parse_status(xml: &str) -> Result<Vec<Status>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::StatusParse(e.to_string()))?;

    let mut statuses = Vec::new();
    for drbd_status in doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("drbd-status"))
    {
        for resources in child_elements(drbd_status, "resources") {
            for res in child_elements(resources, "resource") {
                let attr = |key: &str| res.attribute(key).map(str::to_string);

                let Some(name) = attr("name") else {
                    warn!("status document contains a resource without a name; ignoring it");
                    continue;
                };

                statuses.push(Status {
                    name,
                    minor: attr("minor"),
                    cs: attr("cs"),
                    ro1: attr("ro1"),
                    ro2: attr("ro2"),
                    ds1: attr("ds1"),
                    ds2: attr("ds2"),
                    resynced_percent: attr("resynced_percent"),
                });
            }
        }
    }

    Ok(statuses)
}
