// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;

use crate::host::{Host, LocalIdentity};

const UP_TO_DATE: &str = "UpToDate";
const CONNECTED: &str = "Connected";
const UNCONFIGURED: &str = "Unconfigured";
const PRIMARY: &str = "Primary";
const SECONDARY: &str = "Secondary";

/// A snapshot of the runtime state of one resource, taken from one `<resource>` element of the
/// `drbdadm status` document.
///
/// Every attribute other than the name is optional: drbdadm omits attributes that do not apply
/// (e.g. an Unconfigured resource reports no roles or disk states), and the predicates on
/// `Resource` rely on telling "absent" apart from any particular value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub name: String,
    pub minor: Option<String>,
    /// Connection state.
    pub cs: Option<String>,
    /// Local role.
    pub ro1: Option<String>,
    /// Peer role.
    pub ro2: Option<String>,
    /// Local disk state.
    pub ds1: Option<String>,
    /// Peer disk state.
    pub ds2: Option<String>,
    /// Present only while a resync is running.
    pub resynced_percent: Option<String>,
}

impl Status {
    fn cs_is(&self, value: &str) -> bool {
        self.cs.as_deref() == Some(value)
    }

    /// The resync progress as a number, if a resync is running and drbdadm reported a parseable
    /// percentage.
    pub fn resync_percent(&self) -> Option<f64> {
        self.resynced_percent.as_deref()?.trim().parse().ok()
    }
}

/// A named DRBD resource: its replication topology from the configuration, plus the most recent
/// status snapshot, if any.
///
/// A Resource is an immutable snapshot. `Cluster` publishes a new Resource every time it reloads
/// configuration or status, so a previously obtained Resource keeps describing the state at the
/// time it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    name: String,
    protocol: String,
    hosts: Arc<[Host]>,
    status: Option<Status>,
}

impl Resource {
    pub fn new(name: String, protocol: String, hosts: Vec<Host>) -> Self {
        Resource {
            name,
            protocol,
            hosts: hosts.into(),
            status: None,
        }
    }

    /// Build the snapshot that replaces this one after a status reload. The topology is shared,
    /// the status is replaced as a whole.
    pub fn with_status(&self, status: Option<Status>) -> Self {
        Resource {
            name: self.name.clone(),
            protocol: self.protocol.clone(),
            hosts: Arc::clone(&self.hosts),
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// The first host whose name identifies the observed node.
    pub fn local_host(&self, identity: &LocalIdentity) -> Option<&Host> {
        self.hosts.iter().find(|host| identity.matches(host))
    }

    /// Every host other than the local one, in configuration order.
    pub fn peer_hosts<'a>(&'a self, identity: &'a LocalIdentity) -> impl Iterator<Item = &'a Host> {
        self.hosts.iter().filter(move |host| !identity.matches(host))
    }

    pub fn has_disk(&self, disk: &str) -> bool {
        self.hosts.iter().any(|host| host.disk == disk)
    }

    pub fn resync_running(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.resynced_percent.is_some())
    }

    /// Both replicas are UpToDate and no resync is in flight.
    pub fn consistent(&self) -> bool {
        self.status.as_ref().is_some_and(|s| {
            s.ds1.as_deref() == Some(UP_TO_DATE)
                && s.ds2.as_deref() == Some(UP_TO_DATE)
                && s.resynced_percent.is_none()
        })
    }

    pub fn connected(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.cs_is(CONNECTED))
    }

    /// A resource with no status at all is treated the same as one drbdadm reports as
    /// Unconfigured.
    pub fn down(&self) -> bool {
        match &self.status {
            None => true,
            Some(s) => s.cs_is(UNCONFIGURED),
        }
    }

    pub fn up(&self) -> bool {
        !self.down()
    }

    pub fn primary(&self) -> bool {
        self.role() == Some(PRIMARY)
    }

    pub fn secondary(&self) -> bool {
        self.role() == Some(SECONDARY)
    }

    pub fn peer_primary(&self) -> bool {
        self.peer_role() == Some(PRIMARY)
    }

    pub fn peer_secondary(&self) -> bool {
        self.peer_role() == Some(SECONDARY)
    }

    pub fn connection_state(&self) -> Option<&str> {
        self.status.as_ref()?.cs.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.status.as_ref()?.ro1.as_deref()
    }

    pub fn peer_role(&self) -> Option<&str> {
        self.status.as_ref()?.ro2.as_deref()
    }

    pub fn disk_state(&self) -> Option<&str> {
        self.status.as_ref()?.ds1.as_deref()
    }

    pub fn peer_disk_state(&self) -> Option<&str> {
        self.status.as_ref()?.ds2.as_deref()
    }
}
