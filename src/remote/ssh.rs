// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::io;
use std::process::Command;

use super::{CommandOutput, RemoteExecutor};

/// ssh reserves this exit status for its own failures (unreachable host, authentication, ...).
const SSH_FAILURE: i32 = 255;

/// Runs commands on a remote host by invoking the system `ssh` client, as in
/// `ssh <options> [user@]host "<command>"`.
///
/// Authentication is left to ssh itself (agent, keys, `~/.ssh/config`).
#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
    options: Vec<String>,
    host: String,
    destination: String,
}

impl SshExecutor {
    /// `destination` is `host` or `user@host`, as accepted by ssh.
    pub fn new(destination: &str) -> Self {
        let host = destination.rsplit_once('@').map_or(destination, |(_, h)| h);
        SshExecutor {
            program: "ssh".to_string(),
            options: Vec::new(),
            host: host.to_string(),
            destination: destination.to_string(),
        }
    }

    pub fn program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn user(mut self, user: Option<&str>) -> Self {
        if let Some(user) = user {
            self.destination = format!("{user}@{}", self.host);
        }
        self
    }

    pub fn options(mut self, options: &[String]) -> Self {
        self.options = options.to_vec();
        self
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.options).arg(&self.destination).arg(command);
        cmd
    }
}

impl RemoteExecutor for SshExecutor {
    fn target(&self) -> &str {
        &self.destination
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        let output: CommandOutput = self.command(command).output()?.into();

        if output.exit_code == Some(SSH_FAILURE) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "ssh to {} failed: {}",
                    self.destination,
                    output.stderr.trim()
                ),
            ));
        }

        Ok(output)
    }
}
