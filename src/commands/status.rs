// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::{
    cluster::Cluster,
    commands::{handled_error, HandledResult},
    host::LocalIdentity,
    resource::Resource,
};

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Hide resources that are connected and consistent
    #[arg(short = 'x')]
    exclude_normal: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Resource name
    name: String,
}

#[derive(Args, Debug, Clone)]
pub struct FindDiskArgs {
    /// Backing disk path, e.g. /dev/sdb1
    disk: String,
}

pub fn status(cluster: &Cluster, args: &StatusArgs) -> HandledResult<()> {
    for res in cluster.resources() {
        if args.exclude_normal && res.connected() && res.consistent() {
            continue;
        }
        println!("{}", status_line(&res));
    }
    Ok(())
}

pub fn show(cluster: &Cluster, args: &ShowArgs) -> HandledResult<()> {
    let Some(res) = cluster.find_resource_by_name(&args.name) else {
        eprintln!("No resource named '{}' on {}.", args.name, cluster.target());
        return handled_error();
    };

    println!("{}", status_line(&res));
    for line in host_lines(&res, cluster.local_identity()) {
        println!("{line}");
    }
    Ok(())
}

pub fn find_disk(cluster: &Cluster, args: &FindDiskArgs) -> HandledResult<()> {
    match cluster.find_resource_by_disk(&args.disk) {
        Some(res) => {
            println!("{}", res.name());
            Ok(())
        }
        None => {
            eprintln!("No resource on {} uses disk '{}'.", cluster.target(), args.disk);
            handled_error()
        }
    }
}

/// One-line summary of a resource, e.g.
/// `r0 [C]: Connected Primary/Secondary UpToDate/UpToDate OK`.
pub fn status_line(res: &Resource) -> String {
    let Some(status) = res.status() else {
        return format!("{} [{}]: down (no status)", res.name(), res.protocol());
    };

    let or_dash = |v: &Option<String>| v.clone().unwrap_or("-".to_string());

    let mut line = format!(
        "{} [{}]: {} {}/{} {}/{}",
        res.name(),
        res.protocol(),
        or_dash(&status.cs),
        or_dash(&status.ro1),
        or_dash(&status.ro2),
        or_dash(&status.ds1),
        or_dash(&status.ds2),
    );

    if let Some(percent) = &status.resynced_percent {
        line.push_str(&format!(" resync {percent}%"));
    } else if res.consistent() {
        line.push_str(" OK");
    }

    line
}

fn host_lines(res: &Resource, identity: &LocalIdentity) -> Vec<String> {
    let local = res.local_host(identity);
    res.hosts()
        .iter()
        .map(|h| {
            format!(
                "  {}{}: device {} disk {} address {} meta-disk {}",
                h.name,
                if local.is_some_and(|l| std::ptr::eq(l, h)) {
                    " (local)"
                } else {
                    ""
                },
                h.device,
                h.disk,
                h.endpoint(),
                h.meta_disk
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{host::Host, resource::Status};

    fn status(resynced: Option<&str>) -> Status {
        Status {
            name: "r0".to_string(),
            minor: Some("0".to_string()),
            cs: Some("SyncSource".to_string()),
            ro1: Some("Primary".to_string()),
            ro2: Some("Secondary".to_string()),
            ds1: Some("UpToDate".to_string()),
            ds2: Some("Inconsistent".to_string()),
            resynced_percent: resynced.map(str::to_string),
        }
    }

    #[test]
    fn status_lines() {
        let res = Resource::new("r0".to_string(), "C".to_string(), vec![]);
        assert_eq!(status_line(&res), "r0 [C]: down (no status)");

        let res = res.with_status(Some(status(Some("12.5"))));
        assert_eq!(
            status_line(&res),
            "r0 [C]: SyncSource Primary/Secondary UpToDate/Inconsistent resync 12.5%"
        );

        let mut done = status(None);
        done.cs = Some("Connected".to_string());
        done.ds2 = Some("UpToDate".to_string());
        assert_eq!(
            status_line(&res.with_status(Some(done))),
            "r0 [C]: Connected Primary/Secondary UpToDate/UpToDate OK"
        );
    }

    #[test]
    fn local_host_is_marked() {
        let host = |name: &str| Host {
            name: name.to_string(),
            device: "/dev/drbd0".to_string(),
            minor: Some(0),
            disk: "/dev/sdb1".to_string(),
            address: "10.0.0.1".to_string(),
            family: None,
            port: Some(7788),
            meta_disk: "internal".to_string(),
        };
        let res = Resource::new(
            "r0".to_string(),
            "C".to_string(),
            vec![host("nodeA"), host("nodeB")],
        );
        let lines = host_lines(&res, &LocalIdentity::new(["nodeB"]));
        assert!(!lines[0].contains("(local)"));
        assert!(lines[1].starts_with("  nodeB (local): "));
    }
}
