// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use crate::{
    adm::AdminPrefix,
    cluster::Cluster,
    remote::{CommandOutput, RemoteExecutor},
};

/// The admin prefix used by every test cluster.
pub const TEST_ADMIN: &str = "sudo /sbin/drbdadm";

/// Given a relative `path` in the test directory, prepend the full path to the test directory.
pub fn test_path(path: &str) -> String {
    std::env::var("CARGO_MANIFEST_DIR").unwrap() + "/tests/" + path
}

/// Read a file from `tests/fixtures/`.
pub fn fixture(name: &str) -> String {
    let path = test_path(&format!("fixtures/{name}"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read '{path}': {e}"))
}

/// The full command line a test cluster sends for the given drbdadm arguments.
pub fn command_line(args: &str) -> String {
    format!("{TEST_ADMIN} {args}")
}

/// What the scripted remote host does in response to one command.
#[derive(Debug, Clone)]
pub enum Reply {
    Output(CommandOutput),
    /// The command never reaches the host.
    Transport(io::ErrorKind),
}

/// A reply that exits 0 with the given stdout.
pub fn ok(stdout: &str) -> Reply {
    Reply::Output(CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    })
}

/// A reply that exits with `code` and the given stderr.
pub fn failed(code: i32, stderr: &str) -> Reply {
    Reply::Output(CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(code),
    })
}

#[derive(Debug, Default)]
struct Script {
    /// Replies used once, in order, before falling back to `standing`.
    once: HashMap<String, VecDeque<Reply>>,
    standing: HashMap<String, Reply>,
    log: Vec<String>,
}

/// A RemoteExecutor standing in for a DRBD node. Replies are looked up by exact command line;
/// commands with no scripted reply succeed with empty output. Every command is recorded.
///
/// The executor is moved into the Cluster under test; the test keeps a `ScriptHandle` to change
/// replies and inspect the command log.
pub struct ScriptedExecutor {
    target: String,
    script: Arc<Mutex<Script>>,
}

#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExecutor {
    pub fn new(target: &str) -> (Self, ScriptHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            ScriptedExecutor {
                target: target.to_string(),
                script: Arc::clone(&script),
            },
            ScriptHandle { script },
        )
    }
}

impl RemoteExecutor for ScriptedExecutor {
    fn target(&self) -> &str {
        &self.target
    }

    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        let mut guard = self.script.lock().unwrap();
        let script = &mut *guard;
        script.log.push(command.to_string());

        let reply = script
            .once
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .or_else(|| script.standing.get(command).cloned())
            .unwrap_or_else(|| ok(""));

        match reply {
            Reply::Output(output) => Ok(output),
            Reply::Transport(kind) => Err(io::Error::new(kind, "scripted transport failure")),
        }
    }
}

impl ScriptHandle {
    /// Reply to `args` (drbdadm arguments, without the admin prefix) with `reply` from now on.
    pub fn reply(&self, args: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .standing
            .insert(command_line(args), reply);
    }

    /// Reply to the next `args` command with `reply`, then fall back to the standing reply.
    pub fn reply_once(&self, args: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .once
            .entry(command_line(args))
            .or_default()
            .push_back(reply);
    }

    /// Serve the given fixture files as the configuration and status documents.
    pub fn serve_fixtures(&self, config: &str, status: &str) {
        self.reply("dump-xml", ok(&fixture(config)));
        self.reply("status", ok(&fixture(status)));
    }

    /// Every command line received so far.
    pub fn commands(&self) -> Vec<String> {
        self.script.lock().unwrap().log.clone()
    }

    /// How many times `args` was received.
    pub fn count(&self, args: &str) -> usize {
        let line = command_line(args);
        self.script
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|c| **c == line)
            .count()
    }

    pub fn clear_log(&self) {
        self.script.lock().unwrap().log.clear();
    }
}

/// Build a Cluster bound to a scripted host named `target`, without loading it.
pub fn scripted_cluster(target: &str) -> (Cluster, ScriptHandle) {
    let (executor, handle) = ScriptedExecutor::new(target);
    let prefix = AdminPrefix::parse(TEST_ADMIN).unwrap();
    (Cluster::new(executor, prefix), handle)
}

/// Build and load a Cluster bound to `nodeA`, serving the given fixture files. The command log is
/// cleared after the initial load.
pub fn loaded_cluster(config: &str, status: &str) -> (Cluster, ScriptHandle) {
    let (cluster, handle) = scripted_cluster("nodeA");
    handle.serve_fixtures(config, status);
    cluster.load().unwrap();
    handle.clear_log();
    (cluster, handle)
}
