// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::{
    adm::{AdminCommand, AdminPrefix, Verb},
    dispatch::ActionDispatcher,
    error::{Error, Result},
    host::LocalIdentity,
    remote::{CommandOutput, RemoteExecutor},
    resource::{Resource, Status},
    xml,
};

/// Cluster is the in-memory model of the DRBD resources configured on one observed node, together
/// with the channel used to talk to that node.
///
/// The model is rebuilt from scratch by `load()`: configuration first, then status. Lookups hand
/// out `Arc<Resource>` snapshots; a reload publishes new snapshots and never mutates the ones
/// already handed out.
///
/// Every remote round trip (load, status reload, action) holds the same lock for its whole
/// duration, so operations on one Cluster are strictly sequential even when it is shared between
/// threads.
pub struct Cluster {
    prefix: AdminPrefix,
    identity: LocalIdentity,
    target: String,
    inner: Mutex<Inner>,
}

/// State guarded by the in-flight lock.
struct Inner {
    executor: Box<dyn RemoteExecutor + Send>,
    resources: Vec<Arc<Resource>>,
}

impl Cluster {
    /// Bind to the host reached through `executor`. The local identity defaults to the executor's
    /// bare host name; nothing is fetched until `load()` is called.
    pub fn new<E>(executor: E, prefix: AdminPrefix) -> Self
    where
        E: RemoteExecutor + Send + 'static,
    {
        let target = executor.target().to_string();
        Cluster {
            prefix,
            identity: LocalIdentity::new([executor.host()]),
            target,
            inner: Mutex::new(Inner {
                executor: Box::new(executor),
                resources: Vec::new(),
            }),
        }
    }

    pub fn with_identity(mut self, identity: LocalIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn admin_prefix(&self) -> &AdminPrefix {
        &self.prefix
    }

    pub fn local_identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// Fetch configuration and status from the remote host and replace the whole model.
    ///
    /// If any step fails, the previous model is left untouched.
    pub fn load(&self) -> Result<()> {
        let mut inner = self.lock();

        let config = self.fetch(&mut inner, AdminCommand::global(Verb::DumpXml))?;
        let resources = xml::parse_config(&config)?;

        let status = self.fetch(&mut inner, AdminCommand::global(Verb::Status))?;
        let statuses = xml::parse_status(&status)?;

        inner.resources = reconcile(resources, statuses);
        info!(
            "{}: loaded {} resources ({} with status)",
            self.target,
            inner.resources.len(),
            inner.resources.iter().filter(|r| r.status().is_some()).count()
        );
        Ok(())
    }

    /// Fetch only the status document and attach it to the currently known resources.
    pub fn load_status(&self) -> Result<()> {
        let mut inner = self.lock();
        self.refresh_status(&mut inner)
    }

    /// Snapshots of every resource, in configuration order.
    pub fn resources(&self) -> Vec<Arc<Resource>> {
        self.lock().resources.clone()
    }

    pub fn find_resource_by_name(&self, name: &str) -> Option<Arc<Resource>> {
        self.lock()
            .resources
            .iter()
            .find(|r| r.name() == name)
            .cloned()
    }

    /// The first resource, in configuration order, with a host using `disk` as its backing disk.
    pub fn find_resource_by_disk(&self, disk: &str) -> Option<Arc<Resource>> {
        self.lock()
            .resources
            .iter()
            .find(|r| r.has_disk(disk))
            .cloned()
    }

    /// Lifecycle commands for the named resource.
    pub fn actions(&self, resource: &str) -> ActionDispatcher<'_> {
        ActionDispatcher::new(self, resource)
    }

    /// Run `command` against `resource` if `precondition` holds for the current snapshot of that
    /// resource, then reload the status whether or not the command succeeded.
    ///
    /// Returns `Ok(false)` without contacting the remote host if the precondition does not hold.
    pub(crate) fn dispatch<P>(
        &self,
        resource: &str,
        command: AdminCommand,
        precondition: P,
    ) -> Result<bool>
    where
        P: FnOnce(&Resource) -> bool,
    {
        let mut inner = self.lock();

        let Some(current) = inner.resources.iter().find(|r| r.name() == resource) else {
            return Err(Error::UnknownResource(resource.to_string()));
        };
        if !precondition(&**current) {
            debug!(
                "{}: precondition for '{}' on {resource} not met",
                self.target,
                command.verb()
            );
            return Ok(false);
        }

        let result = self.execute(&mut inner, &command);
        let refreshed = self.refresh_status(&mut inner);

        match (result, refreshed) {
            (Err(e), Err(refresh_err)) => {
                warn!(
                    "{}: status reload after failed '{}' on {resource} also failed: {refresh_err}",
                    self.target,
                    command.verb()
                );
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(refresh_err)) => Err(refresh_err),
            (Ok(_), Ok(())) => Ok(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn refresh_status(&self, inner: &mut Inner) -> Result<()> {
        let status = self.fetch(inner, AdminCommand::global(Verb::Status))?;
        let statuses = xml::parse_status(&status)?;

        let topology: Vec<Resource> = inner
            .resources
            .iter()
            .map(|r| r.with_status(None))
            .collect();
        inner.resources = reconcile(topology, statuses);
        Ok(())
    }

    /// Run `command` and return its stdout, turning a non-zero exit into an error.
    fn fetch(&self, inner: &mut Inner, command: AdminCommand) -> Result<String> {
        self.execute(inner, &command).map(|out| out.stdout)
    }

    fn execute(&self, inner: &mut Inner, command: &AdminCommand) -> Result<CommandOutput> {
        let line = command.to_command_line(&self.prefix);
        debug!("{}: {line}", self.target);

        let output = inner
            .executor
            .run(&line)
            .map_err(|source| Error::Transport {
                command: line.clone(),
                source,
            })?;

        if output.success() {
            Ok(output)
        } else {
            Err(Error::CommandExecution {
                command: line,
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("target", &self.target)
            .field("prefix", &self.prefix)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Attach each status record to the resource of the same name.
///
/// Records naming an unknown resource are dropped: drbdadm's configuration and status views can
/// briefly disagree while a resource is being added or removed. Resources without a record end up
/// with no status.
fn reconcile(resources: Vec<Resource>, statuses: Vec<Status>) -> Vec<Arc<Resource>> {
    let mut by_name: HashMap<String, Status> = HashMap::with_capacity(statuses.len());
    for status in statuses {
        if let Some(previous) = by_name.insert(status.name.clone(), status) {
            warn!(
                "status document reports resource '{}' more than once; using the last entry",
                previous.name
            );
        }
    }

    let resources: Vec<Arc<Resource>> = resources
        .into_iter()
        .map(|r| {
            let status = by_name.remove(r.name());
            Arc::new(r.with_status(status))
        })
        .collect();

    for name in by_name.keys() {
        warn!("status reported for resource '{name}' which is not in the configuration; ignoring");
    }

    resources
}
