// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::error::Error;
use std::io;

use serde::{Deserialize, Serialize};

use crate::{
    adm::{AdminPrefix, DEFAULT_ADMIN_COMMAND},
    cluster::Cluster,
    host::LocalIdentity,
    remote::{LocalExecutor, RemoteExecutor, SshExecutor},
};

/// Config is the model of the drbdctl settings file. It describes how to reach the observed node
/// and how to invoke drbdadm there; the DRBD resources themselves always come from the node.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The node to observe, as passed to ssh.
    pub host: Option<String>,

    /// Command used to invoke drbdadm on the node. Defaults to `sudo /sbin/drbdadm`.
    pub admin_command: Option<String>,

    /// Names under which the observed node appears in the DRBD configuration. Defaults to
    /// `host`.
    pub local_names: Option<Vec<String>>,

    #[serde(default)]
    pub ssh: Ssh,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Ssh {
    /// When false, commands run on this machine through `sh -c` instead.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ssh_program")]
    pub program: String,

    pub user: Option<String>,

    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for Ssh {
    fn default() -> Self {
        Ssh {
            enabled: true,
            program: default_ssh_program(),
            user: None,
            options: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ssh_program() -> String {
    "ssh".to_string()
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for ConfigError {}

impl Config {
    /// Read the settings file at `path`, else the one named by `DRBDCTL_CONFIG`, else the default
    /// location. Only a missing file at the default location means "use the defaults".
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let (path, explicit) = config_location(path, crate::env_config_path());
        Config::read(&path, explicit)
    }

    fn read(path: &str, explicit: bool) -> Result<Self, Box<dyn Error>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                return Ok(Config::default())
            }
            Err(e) => {
                return Err(Box::new(ConfigError(format!(
                    "Could not open config file \"{path}\": {e}"
                ))))
            }
        };

        Ok(toml::from_str(&contents)?)
    }

    /// The admin command prefix: the configured `admin_command` if set, else `DRBDCTL_ADMIN`,
    /// else the built-in default.
    pub fn admin_prefix(&self) -> Result<AdminPrefix, ConfigError> {
        let prefix = match &self.admin_command {
            Some(p) => p.clone(),
            None => std::env::var("DRBDCTL_ADMIN").unwrap_or(DEFAULT_ADMIN_COMMAND.to_string()),
        };
        AdminPrefix::parse(&prefix).map_err(ConfigError)
    }

    pub fn local_identity(&self, host: &str) -> LocalIdentity {
        match &self.local_names {
            Some(names) if !names.is_empty() => LocalIdentity::new(names.iter().cloned()),
            _ => LocalIdentity::new([host]),
        }
    }

    pub fn executor(&self, host: &str) -> Box<dyn RemoteExecutor + Send> {
        if self.ssh.enabled {
            Box::new(
                SshExecutor::new(host)
                    .program(&self.ssh.program)
                    .user(self.ssh.user.as_deref())
                    .options(&self.ssh.options),
            )
        } else {
            Box::new(LocalExecutor::new(host))
        }
    }

    /// Bind a Cluster to the configured host. Nothing is fetched yet.
    pub fn cluster(&self) -> Result<Cluster, ConfigError> {
        let Some(host) = self.host.as_deref() else {
            return Err(ConfigError(
                "No host to observe: set `host` in the config file or pass --host.".to_string(),
            ));
        };

        let executor = self.executor(host);
        let identity = self.local_identity(executor.host());
        Ok(Cluster::new(executor, self.admin_prefix()?).with_identity(identity))
    }
}

/// Pick the settings file and whether it was named explicitly, by flag or by environment.
fn config_location(flag: Option<&str>, env: Option<String>) -> (String, bool) {
    match (flag, env) {
        (Some(path), _) => (path.to_string(), true),
        (None, Some(path)) => (path, true),
        (None, None) => (crate::DEFAULT_CONFIG_PATH.to_string(), false),
    }
}
