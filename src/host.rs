// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

/// One replication peer of a resource, as described by the `<host>` element of `drbdadm
/// dump-xml`.
///
/// Hosts are never modified after parsing. A configuration reload produces entirely new Host
/// objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// The node name, as written in the `on <name> { ... }` section of the DRBD config.
    pub name: String,
    pub device: String,
    pub minor: Option<u32>,
    pub disk: String,
    pub address: String,
    pub family: Option<String>,
    pub port: Option<u16>,
    pub meta_disk: String,
}

impl Host {
    /// The replication endpoint in "<address>:<port>" form, or just the address if no port was
    /// configured.
    pub fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.address, port),
            None => self.address.clone(),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The set of names under which the observed node appears in the DRBD configuration.
///
/// A host is local when its configured name is exactly equal (case-sensitive) to one of these
/// names. No DNS resolution or domain stripping is attempted: if the node is reached through an IP
/// address but configured under a hostname, the hostname has to be listed here explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    names: Vec<String>,
}

impl LocalIdentity {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LocalIdentity {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, host: &Host) -> bool {
        self.names.iter().any(|name| *name == host.name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
