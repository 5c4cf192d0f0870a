// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! adm.rs
//!
//! Structured construction of drbdadm command lines. Every token is validated before it is
//! joined into the string that gets sent over the remote channel, so nothing that came out of an
//! XML attribute can smuggle shell syntax into a command.

use std::fmt;

use crate::error::{Error, Result};

/// drbdadm sub-commands used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    DumpXml,
    Status,
    Up,
    Down,
    Attach,
    Detach,
    Connect,
    Disconnect,
    Primary,
    Secondary,
    Syncer,
    Resize,
    CreateMd,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Verb::DumpXml => "dump-xml",
                Verb::Status => "status",
                Verb::Up => "up",
                Verb::Down => "down",
                Verb::Attach => "attach",
                Verb::Detach => "detach",
                Verb::Connect => "connect",
                Verb::Disconnect => "disconnect",
                Verb::Primary => "primary",
                Verb::Secondary => "secondary",
                Verb::Syncer => "syncer",
                Verb::Resize => "resize",
                Verb::CreateMd => "create-md",
            }
        )
    }
}

/// Options passed through to the backend tool (drbdsetup / drbdmeta) after `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    OverwriteDataOfPeer,
    AssumePeerHasSpace,
    Force,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Modifier::OverwriteDataOfPeer => "--overwrite-data-of-peer",
                Modifier::AssumePeerHasSpace => "--assume-peer-has-space",
                Modifier::Force => "--force",
            }
        )
    }
}

/// Whether a role change may discard the peer's data. Forcing is always an explicit opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Force {
    #[default]
    No,
    OverwritePeer,
}

/// The fixed leading tokens used to invoke drbdadm on the remote host, e.g. `sudo /sbin/drbdadm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrefix {
    tokens: Vec<String>,
}

pub const DEFAULT_ADMIN_COMMAND: &str = "sudo /sbin/drbdadm";

impl AdminPrefix {
    /// Split `prefix` on whitespace. Tokens containing shell metacharacters are rejected.
    pub fn parse(prefix: &str) -> std::result::Result<Self, String> {
        let tokens: Vec<String> = prefix.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Err("admin command must not be empty".to_string());
        }
        if let Some(bad) = tokens.iter().find(|t| !t.chars().all(is_plain_char)) {
            return Err(format!("admin command token \"{bad}\" contains unsupported characters"));
        }
        Ok(AdminPrefix { tokens })
    }
}

impl Default for AdminPrefix {
    fn default() -> Self {
        AdminPrefix {
            tokens: DEFAULT_ADMIN_COMMAND
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for AdminPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | '=' | ':' | ',' | '+')
}

/// Check that a resource name is safe to put on a command line.
pub fn validate_resource_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidResourceName(name.to_string()))
    }
}

/// One drbdadm invocation: a verb, the modifiers passed through after `--`, and optionally the
/// resource it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand {
    verb: Verb,
    modifiers: Vec<Modifier>,
    resource: Option<String>,
}

impl AdminCommand {
    /// A command that applies to no particular resource, e.g. `dump-xml`.
    pub fn global(verb: Verb) -> Self {
        AdminCommand {
            verb,
            modifiers: Vec::new(),
            resource: None,
        }
    }

    /// A command for a single resource. Fails if the name could be interpreted as anything other
    /// than a single plain argument.
    pub fn for_resource(verb: Verb, resource: &str) -> Result<Self> {
        validate_resource_name(resource)?;
        Ok(AdminCommand {
            verb,
            modifiers: Vec::new(),
            resource: Some(resource.to_string()),
        })
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn force(self, force: Force) -> Self {
        match force {
            Force::No => self,
            Force::OverwritePeer => self.modifier(Modifier::OverwriteDataOfPeer),
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Serialize as `<prefix> [-- <modifiers>] <verb> [<resource>]`.
    pub fn to_command_line(&self, prefix: &AdminPrefix) -> String {
        let mut line = prefix.to_string();
        if !self.modifiers.is_empty() {
            line.push_str(" --");
            for m in &self.modifiers {
                line.push(' ');
                line.push_str(&m.to_string());
            }
        }
        line.push(' ');
        line.push_str(&self.verb.to_string());
        if let Some(resource) = &self.resource {
            line.push(' ');
            line.push_str(resource);
        }
        line
    }
}
