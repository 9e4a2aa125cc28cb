//! `nexus-route status` command.

use std::path::Path;

use clap::Args;
use nexus_route_core::{backup, daemon, hosts};

use super::wrapper::{current_state, WrapperState};
use crate::context::Context;
use crate::output::{describe_backup, new_table};

/// Marker line written at the top of managed files.
const MANAGED_MARKER: &str = "# Managed by nexus-route";

#[derive(Args)]
pub struct StatusArgs;

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: &'static str,
    pub state: String,
    pub file: String,
    pub backup: String,
}

pub async fn execute(_args: StatusArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = new_table(&["COMPONENT", "STATE", "FILE", "BACKUP"]);
    for row in collect(&ctx) {
        table.add_row([row.component.to_string(), row.state, row.file, row.backup]);
    }
    println!("{table}");
    Ok(())
}

fn is_managed(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|c| c.starts_with(MANAGED_MARKER))
        .unwrap_or(false)
}

fn configured(yes: bool) -> String {
    if yes { "configured" } else { "not configured" }.to_string()
}

fn file_row(component: &'static str, path: &Path, state: String) -> ComponentStatus {
    ComponentStatus {
        component,
        state,
        file: path.display().to_string(),
        backup: describe_backup(backup::latest(path).ok().flatten().as_ref()),
    }
}

/// Gather the status of every managed component.
pub fn collect(ctx: &Context) -> Vec<ComponentStatus> {
    let paths = &ctx.paths;
    let mut rows = Vec::new();

    let sources_list = paths.sources_list();
    rows.push(file_row("apt", &sources_list, configured(is_managed(&sources_list))));

    let pip_conf = paths.pip_conf();
    rows.push(file_row("pip", &pip_conf, configured(is_managed(&pip_conf))));

    let daemon_json = paths.daemon_json();
    let mirror = match super::daemon::settings(&ctx.config) {
        Ok(settings) => {
            let contents = std::fs::read_to_string(&daemon_json).unwrap_or_default();
            configured(daemon::has_mirror(&contents, &settings))
        }
        Err(e) => format!("invalid config: {e}"),
    };
    rows.push(file_row("docker-daemon", &daemon_json, mirror));

    let hosts_path = paths.hosts();
    let contents = std::fs::read_to_string(&hosts_path).unwrap_or_default();
    let blocked = hosts::blocked_hosts(&contents).len();
    let state = if hosts::has_block(&contents) {
        format!("blocking {blocked} hosts")
    } else {
        "not blocking".to_string()
    };
    rows.push(ComponentStatus {
        component: "hosts",
        state,
        file: hosts_path.display().to_string(),
        backup: "-".to_string(),
    });

    let state = match current_state(ctx) {
        WrapperState::Installed(_) => "installed".to_string(),
        WrapperState::Missing => "not installed".to_string(),
        WrapperState::Foreign(other) => format!("occupied by {}", other.display()),
    };
    rows.push(ComponentStatus {
        component: "docker-wrapper",
        state,
        file: paths.wrapper_link().display().to_string(),
        backup: "-".to_string(),
    });

    rows
}
