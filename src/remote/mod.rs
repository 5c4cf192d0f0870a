// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! The channel through which commands reach the observed DRBD node.

use std::io;
use std::process::{Command, Output};

pub mod ssh;

pub use ssh::SshExecutor;

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// Runs a shell command line on the host a `Cluster` is bound to.
///
/// `run` blocks until the command finishes. An `Err` means the command could not be delivered or
/// run at all; a command that ran and failed is an `Ok` with a non-zero exit code. Any timeout
/// policy belongs to the implementation.
pub trait RemoteExecutor {
    /// A human-readable name for the target, used in log messages.
    fn target(&self) -> &str;

    /// The bare host name of the target, without any login user. This is the name the node is
    /// expected to carry in its DRBD configuration.
    fn host(&self) -> &str {
        self.target()
    }

    fn run(&mut self, command: &str) -> io::Result<CommandOutput>;
}

impl<E: RemoteExecutor + ?Sized> RemoteExecutor for Box<E> {
    fn target(&self) -> &str {
        (**self).target()
    }

    fn host(&self) -> &str {
        (**self).host()
    }

    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs commands on the current machine through `sh -c`, for when the tool runs on the DRBD node
/// itself.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    target: String,
}

impl LocalExecutor {
    pub fn new(target: &str) -> Self {
        LocalExecutor {
            target: target.to_string(),
        }
    }
}

impl RemoteExecutor for LocalExecutor {
    fn target(&self) -> &str {
        &self.target
    }

    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        Command::new("sh")
            .args(["-c", command])
            .output()
            .map(CommandOutput::from)
    }
}
