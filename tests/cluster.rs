// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use drbd_lib::{
        adm::AdminPrefix,
        host::LocalIdentity,
        remote::{CommandOutput, RemoteExecutor},
        test_env::*,
        Cluster, Error,
    };

    /// The predicates a caller can observe for each resource, in model order.
    fn observed(cluster: &Cluster) -> Vec<(String, bool, bool, bool, bool, bool, bool)> {
        cluster
            .resources()
            .iter()
            .map(|r| {
                (
                    r.name().to_string(),
                    r.consistent(),
                    r.resync_running(),
                    r.connected(),
                    r.down(),
                    r.primary(),
                    r.secondary(),
                )
            })
            .collect()
    }

    #[test]
    fn status_for_one_of_two_resources() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_r0_only.xml");

        let r0 = cluster.find_resource_by_name("r0").unwrap();
        assert!(r0.consistent());
        assert!(r0.primary());
        assert!(r0.connected());
        assert!(!r0.down());

        let r1 = cluster.find_resource_by_name("r1").unwrap();
        assert!(r1.status().is_none());
        assert!(r1.down());
        assert!(!r1.consistent());
    }

    #[test]
    fn topology_in_document_order() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_r0_only.xml");

        let names: Vec<String> = cluster
            .resources()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, ["r0", "r1"]);

        let r1 = cluster.find_resource_by_name("r1").unwrap();
        assert_eq!(r1.protocol(), "A");
        let hosts: Vec<&str> = r1.hosts().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(hosts, ["nodeA", "nodeB"]);
        assert_eq!(r1.hosts()[1].disk, "/dev/sdc2");
        assert_eq!(r1.hosts()[1].endpoint(), "10.0.0.2:7789");
        assert_eq!(r1.hosts()[0].meta_disk, "/dev/sdd1");
        assert_eq!(r1.hosts()[0].minor, Some(1));
    }

    #[test]
    fn load_fetches_config_then_status() {
        let (cluster, script) = scripted_cluster("nodeA");
        script.serve_fixtures("config.xml", "status_r0_only.xml");
        cluster.load().unwrap();

        assert_eq!(
            script.commands(),
            [command_line("dump-xml"), command_line("status")]
        );
    }

    #[test]
    fn unknown_status_record_is_dropped() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_ghost.xml");

        assert_eq!(cluster.resources().len(), 2);
        assert!(cluster.find_resource_by_name("ghost").is_none());
        assert_eq!(
            cluster.find_resource_by_name("r1").unwrap().connection_state(),
            Some("StandAlone")
        );
    }

    #[test]
    fn resync_and_unconfigured() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_resync.xml");

        let r0 = cluster.find_resource_by_name("r0").unwrap();
        assert!(r0.resync_running());
        assert!(!r0.consistent());
        assert_eq!(r0.status().unwrap().resync_percent(), Some(42.7));

        let r1 = cluster.find_resource_by_name("r1").unwrap();
        assert!(r1.status().is_some());
        assert!(r1.down());
        assert!(!r1.primary());
        assert!(!r1.secondary());
    }

    #[test]
    fn find_by_name() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_r0_only.xml");
        assert_eq!(cluster.find_resource_by_name("r1").unwrap().name(), "r1");
        assert!(cluster.find_resource_by_name("r2").is_none());
        assert!(cluster.find_resource_by_name("").is_none());
    }

    #[test]
    fn find_by_disk_returns_first_match() {
        let (cluster, _script) = loaded_cluster("config_duplicate_disk.xml", "status_r0_only.xml");

        assert_eq!(
            cluster.find_resource_by_disk("/dev/sdb1").unwrap().name(),
            "r0"
        );
        assert_eq!(
            cluster.find_resource_by_disk("/dev/sde1").unwrap().name(),
            "r8"
        );
        assert!(cluster.find_resource_by_disk("/dev/sdz9").is_none());

        let empty = cluster.find_resource_by_name("r7").unwrap();
        assert!(empty.hosts().is_empty());
        assert!(empty.local_host(cluster.local_identity()).is_none());
    }

    #[test]
    fn repeated_resource_name_keeps_the_first() {
        let (cluster, _script) = loaded_cluster("config_duplicate_name.xml", "status_r0_only.xml");

        assert_eq!(cluster.resources().len(), 1);
        let r0 = cluster.find_resource_by_name("r0").unwrap();
        assert_eq!(r0.protocol(), "C");
        assert_eq!(r0.connection_state(), Some("Connected"));

        // The repeated definition and the nameless one never enter the model.
        assert!(cluster.find_resource_by_disk("/dev/sdc1").is_none());
        assert!(cluster.find_resource_by_disk("/dev/sdf1").is_none());
        assert!(cluster.find_resource_by_name("").is_none());
        assert_eq!(
            cluster.find_resource_by_disk("/dev/sdb1").unwrap().connection_state(),
            Some("Connected")
        );
    }

    #[test]
    fn find_by_disk_on_peer_host() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_r0_only.xml");
        assert_eq!(
            cluster.find_resource_by_disk("/dev/sdc2").unwrap().name(),
            "r1"
        );
    }

    #[test]
    fn reload_is_idempotent() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_resync.xml");
        let before = observed(&cluster);

        cluster.load().unwrap();
        assert_eq!(observed(&cluster), before);

        cluster.load_status().unwrap();
        assert_eq!(observed(&cluster), before);
    }

    #[test]
    fn reload_replaces_status_wholesale() {
        let (cluster, script) = loaded_cluster("config.xml", "status_ghost.xml");
        let old_r1 = cluster.find_resource_by_name("r1").unwrap();
        assert_eq!(old_r1.connection_state(), Some("StandAlone"));

        script.reply("status", ok(&fixture("status_r0_only.xml")));
        cluster.load_status().unwrap();

        // The snapshot handed out earlier is unchanged; the model now has no status for r1.
        assert_eq!(old_r1.connection_state(), Some("StandAlone"));
        let r1 = cluster.find_resource_by_name("r1").unwrap();
        assert!(r1.status().is_none());
        assert!(r1.down());
    }

    #[test]
    fn config_reload_drops_removed_resources() {
        let (cluster, script) = loaded_cluster("config.xml", "status_r0_only.xml");
        assert!(cluster.find_resource_by_name("r1").is_some());

        script.reply("dump-xml", ok(&fixture("config_duplicate_disk.xml")));
        cluster.load().unwrap();

        assert!(cluster.find_resource_by_name("r1").is_none());
        assert!(cluster.find_resource_by_name("r8").is_some());
    }

    #[test]
    fn malformed_config_keeps_previous_model() {
        let (cluster, script) = loaded_cluster("config.xml", "status_r0_only.xml");
        let before = observed(&cluster);

        script.reply("dump-xml", ok(&fixture("malformed.xml")));
        assert!(matches!(cluster.load(), Err(Error::ConfigParse(_))));
        assert_eq!(observed(&cluster), before);
    }

    #[test]
    fn malformed_status_keeps_previous_model() {
        let (cluster, script) = loaded_cluster("config.xml", "status_r0_only.xml");
        let before = observed(&cluster);

        script.reply("status", ok(&fixture("malformed.xml")));
        assert!(matches!(cluster.load(), Err(Error::StatusParse(_))));
        assert!(matches!(cluster.load_status(), Err(Error::StatusParse(_))));
        assert_eq!(observed(&cluster), before);
    }

    #[test]
    fn remote_failures() {
        let (cluster, script) = scripted_cluster("nodeA");
        script.reply("dump-xml", Reply::Transport(io::ErrorKind::ConnectionRefused));
        match cluster.load() {
            Err(Error::Transport { command, .. }) => {
                assert_eq!(command, command_line("dump-xml"))
            }
            other => panic!("expected transport error, got {other:?}"),
        }

        script.reply("dump-xml", failed(20, "no resources defined!"));
        match cluster.load() {
            Err(Error::CommandExecution {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(20));
                assert_eq!(stderr, "no resources defined!");
            }
            other => panic!("expected command failure, got {other:?}"),
        }

        assert!(cluster.resources().is_empty());
    }

    #[test]
    fn local_host_uses_explicit_identity() {
        let (cluster, _script) = loaded_cluster("config.xml", "status_r0_only.xml");
        let r0 = cluster.find_resource_by_name("r0").unwrap();

        // Bound to "nodeA", which is how the node is named in the configuration.
        let local = r0.local_host(cluster.local_identity()).unwrap();
        assert_eq!(local.name, "nodeA");
        assert_eq!(local.address, "10.0.0.1");
        let peers: Vec<&str> = r0
            .peer_hosts(cluster.local_identity())
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(peers, ["nodeB"]);

        // Bound by IP address: no host is named that, so there is no local host.
        let (by_ip, script) = scripted_cluster("10.0.0.2");
        script.serve_fixtures("config.xml", "status_r0_only.xml");
        by_ip.load().unwrap();
        let r0 = by_ip.find_resource_by_name("r0").unwrap();
        assert!(r0.local_host(by_ip.local_identity()).is_none());

        // ... unless the configured name is listed explicitly.
        let (executor, script) = ScriptedExecutor::new("10.0.0.2");
        script.serve_fixtures("config.xml", "status_r0_only.xml");
        let aliased = Cluster::new(executor, AdminPrefix::parse(TEST_ADMIN).unwrap())
            .with_identity(LocalIdentity::new(["10.0.0.2", "nodeB"]));
        aliased.load().unwrap();
        let r0 = aliased.find_resource_by_name("r0").unwrap();
        assert_eq!(r0.local_host(aliased.local_identity()).unwrap().name, "nodeB");
    }

    /// An executor that fails the test if two commands ever run at the same time.
    struct OverlapDetector {
        in_flight: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
        config: String,
        status: String,
    }

    impl RemoteExecutor for OverlapDetector {
        fn target(&self) -> &str {
            "nodeA"
        }

        fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let stdout = if command.ends_with("dump-xml") {
                self.config.clone()
            } else if command.ends_with(" status") {
                self.status.clone()
            } else {
                String::new()
            };
            Ok(CommandOutput {
                stdout,
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    #[test]
    fn concurrent_callers_are_serialized() {
        let max_seen = Arc::new(AtomicUsize::new(0));
        let executor = OverlapDetector {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_seen: Arc::clone(&max_seen),
            config: fixture("config.xml"),
            status: fixture("status_r0_only.xml"),
        };
        let cluster = Arc::new(Cluster::new(
            executor,
            AdminPrefix::parse(TEST_ADMIN).unwrap(),
        ));
        cluster.load().unwrap();

        let threads: Vec<_> = (0..4)
            .map(|i| {
                let cluster = Arc::clone(&cluster);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        if i % 2 == 0 {
                            cluster.load().unwrap();
                        } else {
                            cluster.actions("r0").connect().unwrap();
                        }
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(cluster.find_resource_by_name("r0").unwrap().consistent());
    }
}
