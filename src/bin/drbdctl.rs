// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Parser;

use drbd_lib::commands::{self, Cli};

/// The drbdctl binary inspects and drives the DRBD resources of one node.
fn main() {
    let args = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("DRBDCTL_LOG", args.default_log_level()),
    )
    .init();

    if commands::main(&args).is_err() {
        std::process::exit(1);
    }
}
