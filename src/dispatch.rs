// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Lifecycle commands for a single resource.
//!
//! Each action runs one drbdadm command on the bound host and then reloads the cluster status,
//! whatever the outcome of the command, so the caller always observes post-action state through
//! the next lookup. No state transition is ever simulated locally.

use crate::{
    adm::{AdminCommand, Force, Modifier, Verb},
    cluster::Cluster,
    error::Result,
    resource::Resource,
};

/// Lifecycle actions that can be requested for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Attach,
    Detach,
    Connect,
    Disconnect,
    Primary(Force),
    Secondary(Force),
    Syncer,
    Resize,
    InitMetadata,
}

impl Action {
    /// The drbdadm command implementing this action on `resource`.
    pub fn command(self, resource: &str) -> Result<AdminCommand> {
        let command = match self {
            Action::Up => AdminCommand::for_resource(Verb::Up, resource)?,
            Action::Down => AdminCommand::for_resource(Verb::Down, resource)?,
            Action::Attach => AdminCommand::for_resource(Verb::Attach, resource)?,
            Action::Detach => AdminCommand::for_resource(Verb::Detach, resource)?,
            Action::Connect => AdminCommand::for_resource(Verb::Connect, resource)?,
            Action::Disconnect => AdminCommand::for_resource(Verb::Disconnect, resource)?,
            Action::Primary(force) => {
                AdminCommand::for_resource(Verb::Primary, resource)?.force(force)
            }
            Action::Secondary(force) => {
                AdminCommand::for_resource(Verb::Secondary, resource)?.force(force)
            }
            Action::Syncer => AdminCommand::for_resource(Verb::Syncer, resource)?,
            Action::Resize => AdminCommand::for_resource(Verb::Resize, resource)?
                .modifier(Modifier::AssumePeerHasSpace),
            // drbdmeta would otherwise ask for confirmation on stdin when it finds existing data.
            Action::InitMetadata => {
                AdminCommand::for_resource(Verb::CreateMd, resource)?.modifier(Modifier::Force)
            }
        };
        Ok(command)
    }

    /// Whether the action may be issued given the current snapshot of the resource.
    fn permitted(self, resource: &Resource) -> bool {
        match self {
            Action::InitMetadata => resource.down(),
            _ => true,
        }
    }
}

/// Issues lifecycle commands for one resource of a `Cluster`. Obtained from
/// `Cluster::actions()`.
#[derive(Debug)]
pub struct ActionDispatcher<'c> {
    cluster: &'c Cluster,
    resource: String,
}

impl<'c> ActionDispatcher<'c> {
    pub(crate) fn new(cluster: &'c Cluster, resource: &str) -> Self {
        ActionDispatcher {
            cluster,
            resource: resource.to_string(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Run `action`. Returns `Ok(false)` if the action's precondition did not hold, in which case
    /// nothing was sent to the remote host and no reload happened.
    pub fn run(&self, action: Action) -> Result<bool> {
        let command = action.command(&self.resource)?;
        self.cluster
            .dispatch(&self.resource, command, |res| action.permitted(res))
    }

    fn run_unconditional(&self, action: Action) -> Result<()> {
        self.run(action).map(|_| ())
    }

    pub fn up(&self) -> Result<()> {
        self.run_unconditional(Action::Up)
    }

    pub fn down(&self) -> Result<()> {
        self.run_unconditional(Action::Down)
    }

    pub fn attach(&self) -> Result<()> {
        self.run_unconditional(Action::Attach)
    }

    pub fn detach(&self) -> Result<()> {
        self.run_unconditional(Action::Detach)
    }

    pub fn connect(&self) -> Result<()> {
        self.run_unconditional(Action::Connect)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.run_unconditional(Action::Disconnect)
    }

    /// Promote to primary. `Force::OverwritePeer` makes this node's data authoritative and
    /// discards the peer's.
    pub fn primary(&self, force: Force) -> Result<()> {
        self.run_unconditional(Action::Primary(force))
    }

    /// Demote to secondary. Forcing is never implied, the same as for `primary`.
    pub fn secondary(&self, force: Force) -> Result<()> {
        self.run_unconditional(Action::Secondary(force))
    }

    pub fn syncer(&self) -> Result<()> {
        self.run_unconditional(Action::Syncer)
    }

    /// Grow the device to the size of the backing disk, assuming the peer has space for it.
    pub fn resize(&self) -> Result<()> {
        self.run_unconditional(Action::Resize)
    }

    /// Write fresh DRBD metadata for the resource. Only allowed while the resource is down;
    /// otherwise returns `Ok(false)` without doing anything.
    pub fn init_metadata(&self) -> Result<bool> {
        self.run(Action::InitMetadata)
    }
}
