// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod adm;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod remote;
pub mod resource;
pub mod test_env;
pub mod xml;

pub use cluster::Cluster;
pub use error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/drbdctl/drbdctl.conf";

/// The settings file named by `DRBDCTL_CONFIG`, if set.
pub fn env_config_path() -> Option<String> {
    std::env::var("DRBDCTL_CONFIG").ok()
}
