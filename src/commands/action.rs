// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::{
    adm::Force,
    cluster::Cluster,
    commands::{handled_error, status::status_line, Commands, Handle, HandledResult},
    dispatch::Action,
};

#[derive(Args, Debug, Clone)]
pub struct ActionArgs {
    /// Resource name
    name: String,
}

#[derive(Args, Debug, Clone)]
pub struct ForceArgs {
    /// Overwrite the peer's data with this node's data
    #[arg(long)]
    force: bool,

    /// Resource name
    name: String,
}

impl ForceArgs {
    fn force(&self) -> Force {
        if self.force {
            Force::OverwritePeer
        } else {
            Force::No
        }
    }
}

/// Map a lifecycle subcommand to the action it requests, along with the target resource.
fn requested_action(command: &Commands) -> Option<(Action, &str)> {
    let requested = match command {
        Commands::Up(a) => (Action::Up, a.name.as_str()),
        Commands::Down(a) => (Action::Down, a.name.as_str()),
        Commands::Attach(a) => (Action::Attach, a.name.as_str()),
        Commands::Detach(a) => (Action::Detach, a.name.as_str()),
        Commands::Connect(a) => (Action::Connect, a.name.as_str()),
        Commands::Disconnect(a) => (Action::Disconnect, a.name.as_str()),
        Commands::Primary(a) => (Action::Primary(a.force()), a.name.as_str()),
        Commands::Secondary(a) => (Action::Secondary(a.force()), a.name.as_str()),
        Commands::Syncer(a) => (Action::Syncer, a.name.as_str()),
        Commands::Resize(a) => (Action::Resize, a.name.as_str()),
        Commands::InitMetadata(a) => (Action::InitMetadata, a.name.as_str()),
        Commands::Status(_) | Commands::Show(_) | Commands::FindDisk(_) => return None,
    };
    Some(requested)
}

pub fn action(cluster: &Cluster, command: &Commands) -> HandledResult<()> {
    let Some((action, name)) = requested_action(command) else {
        eprintln!("Not a lifecycle command: {command:?}");
        return handled_error();
    };

    cluster
        .actions(name)
        .run(action)
        .handle_err(|e| eprintln!("{action:?} on '{name}' failed: {e}"))?;

    print_after(cluster, name);
    Ok(())
}

pub fn init_metadata(cluster: &Cluster, args: &ActionArgs) -> HandledResult<()> {
    let done = cluster
        .actions(&args.name)
        .init_metadata()
        .handle_err(|e| eprintln!("Initializing metadata for '{}' failed: {e}", args.name))?;

    if !done {
        eprintln!(
            "Not initializing metadata for '{}': the resource must be down first.",
            args.name
        );
        return handled_error();
    }

    print_after(cluster, &args.name);
    Ok(())
}

/// Print the state observed by the reload that followed the action.
fn print_after(cluster: &Cluster, name: &str) {
    if let Some(res) = cluster.find_resource_by_name(name) {
        println!("{}", status_line(&res));
    }
}
