// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod action;
pub mod status;

use {
    action::{ActionArgs, ForceArgs},
    status::{FindDiskArgs, ShowArgs, StatusArgs},
};

use clap::{Parser, Subcommand};

use crate::{cluster::Cluster, config::Config};

/// A `HandledError` represents an error that has already been handled. When you call a function
/// that returns a `HandledError` or `HandledResult`, you don't need to do anything with that error,
/// other than just be aware that it happened, and return it on to your caller.
///
/// `main()` has a special responsibility: since its "caller" is, in a certain sense, the operating
/// system, `main()` must return a nonzero exit status when it gets a `HandledError`.
///
/// The primary way to construct a `HandledError` is with the `handle_err()` function, which turns a
/// generic error into a `HandledError`, and also runs some caller-provided code to handle the
/// error. That provided code would normally do something like report the error to stderr.
#[derive(Debug, PartialEq)]
pub struct HandledError {}

pub type HandledResult<T> = std::result::Result<T, HandledError>;

pub fn handled_error<T>() -> HandledResult<T> {
    HandledResult::Err(HandledError {})
}

pub trait Handle<T, F> {
    fn handle_err(self, handler: F) -> HandledResult<T>;
}

impl<T, E, F: FnOnce(E)> Handle<T, F> for std::result::Result<T, E> {
    /// Handle an error by running the provided `handler` code, giving it the error.
    ///
    /// Then, return a `HandledResult`, so that transitive callers of this function know that they
    /// do not need to do anything further to handle the error.
    fn handle_err(self, handler: F) -> HandledResult<T> {
        self.map_err(|e| {
            handler(e);
            HandledError {}
        })
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: $DRBDCTL_CONFIG or /etc/drbdctl/drbdctl.conf)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Node to observe; overrides `host` from the settings file
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Command used to run drbdadm on the node, e.g. "sudo /sbin/drbdadm"
    #[arg(long, global = true)]
    pub admin_command: Option<String>,

    /// Log drbdadm commands as they run (sets the default log level to debug; DRBDCTL_LOG still
    /// takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every resource with its replication state
    Status(StatusArgs),
    /// Show one resource and its hosts
    Show(ShowArgs),
    /// Print the resource that uses a backing disk
    FindDisk(FindDiskArgs),
    /// Attach the backing disk and connect to the peer
    Up(ActionArgs),
    /// Disconnect and detach the resource
    Down(ActionArgs),
    /// Attach the backing disk
    Attach(ActionArgs),
    /// Detach the backing disk
    Detach(ActionArgs),
    /// Connect to the peer
    Connect(ActionArgs),
    /// Disconnect from the peer
    Disconnect(ActionArgs),
    /// Promote this node to Primary
    Primary(ForceArgs),
    /// Demote this node to Secondary
    Secondary(ForceArgs),
    /// Apply the resource's syncer settings
    Syncer(ActionArgs),
    /// Grow the device to the size of the backing disk
    Resize(ActionArgs),
    /// Create DRBD metadata on the backing disk (resource must be down)
    InitMetadata(ActionArgs),
}

impl Cli {
    /// Log level used when DRBDCTL_LOG is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Resolve the settings file and CLI overrides into a Cluster and load it.
fn load_cluster(cli: &Cli) -> HandledResult<Cluster> {
    let mut config = Config::load(cli.config.as_deref())
        .handle_err(|e| eprintln!("Could not read settings: {e}"))?;

    if let Some(host) = &cli.host {
        config.host = Some(host.clone());
    }
    if let Some(admin) = &cli.admin_command {
        config.admin_command = Some(admin.clone());
    }

    let cluster = config.cluster().handle_err(|e| eprintln!("{e}"))?;

    if cli.verbose {
        eprintln!(
            "Loading DRBD state from {} using '{}'",
            cluster.target(),
            cluster.admin_prefix()
        );
    }

    cluster
        .load()
        .handle_err(|e| eprintln!("Could not load DRBD state from {}: {e}", cluster.target()))?;

    Ok(cluster)
}

pub fn main(cli: &Cli) -> HandledResult<()> {
    let cluster = load_cluster(cli)?;

    match &cli.command {
        Commands::Status(args) => status::status(&cluster, args),
        Commands::Show(args) => status::show(&cluster, args),
        Commands::FindDisk(args) => status::find_disk(&cluster, args),
        Commands::InitMetadata(args) => action::init_metadata(&cluster, args),
        other => action::action(&cluster, other),
    }
}
