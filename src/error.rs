// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fmt;
use std::io;

/// Errors surfaced by the cluster model. Every error is returned to the immediate caller; nothing
/// in this crate retries on its own.
#[derive(Debug)]
pub enum Error {
    /// The remote channel could not run the command at all (ssh missing, connection refused,
    /// permission denied by the local OS, etc.).
    Transport { command: String, source: io::Error },

    /// The `dump-xml` output was not well-formed XML.
    ConfigParse(String),

    /// The `status` output was not well-formed XML.
    StatusParse(String),

    /// The administration tool ran but reported failure.
    CommandExecution {
        command: String,
        /// `None` when the remote process was terminated by a signal.
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A resource name that cannot be placed safely on a command line.
    InvalidResourceName(String),

    /// An action was requested for a resource the model does not know about.
    UnknownResource(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport { command, source } => {
                write!(f, "could not run \"{command}\": {source}")
            }
            Error::ConfigParse(detail) => write!(f, "malformed configuration document: {detail}"),
            Error::StatusParse(detail) => write!(f, "malformed status document: {detail}"),
            Error::CommandExecution {
                command,
                exit_code,
                stderr,
            } => {
                match exit_code {
                    Some(code) => write!(f, "\"{command}\" exited with status {code}")?,
                    None => write!(f, "\"{command}\" was terminated by a signal")?,
                };
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Error::InvalidResourceName(name) => write!(f, "invalid resource name \"{name}\""),
            Error::UnknownResource(name) => write!(f, "no resource named \"{name}\""),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
