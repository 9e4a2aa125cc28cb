//! `nexus-route daemon` command: Docker daemon registry mirror.

use clap::{Args, Subcommand};
use nexus_route_core::backup;
use nexus_route_core::config::Config;
use nexus_route_core::daemon::{merge_daemon_json, DaemonSettings};

use crate::context::Context;
use crate::system::{require_root, restart_docker};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub action: DaemonAction,
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Add the Nexus registry mirror to daemon.json
    Configure(ConfigureArgs),
    /// Restore the original daemon.json
    Restore(RestoreArgs),
}

#[derive(Args, Default)]
pub struct ConfigureArgs {
    /// Print the daemon.json that would be written
    #[arg(long)]
    pub dry_run: bool,

    /// Skip restarting the Docker daemon
    #[arg(long)]
    pub no_restart: bool,
}

#[derive(Args, Default)]
pub struct RestoreArgs {
    /// Skip restarting the Docker daemon
    #[arg(long)]
    pub no_restart: bool,
}

pub async fn execute(args: DaemonArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        DaemonAction::Configure(args) => configure(&ctx, &args).await,
        DaemonAction::Restore(args) => restore(&ctx, &args).await,
    }
}

/// Daemon settings from the configuration.
pub fn settings(config: &Config) -> nexus_route_core::Result<DaemonSettings> {
    Ok(DaemonSettings {
        hub_prefix: config.hub_prefix()?,
        ghcr_prefix: config.ghcr_prefix()?,
        insecure: config.docker.insecure,
    })
}

pub async fn configure(ctx: &Context, args: &ConfigureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.paths.daemon_json();
    let existing = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };
    let merged = merge_daemon_json(&existing, &settings(&ctx.config)?, &path.display().to_string())?;

    if args.dry_run {
        print!("{merged}");
        return Ok(());
    }

    require_root(&ctx.paths, "Configuring the Docker daemon")?;
    backup::backup(&path)?;
    backup::write_atomic(&path, merged.as_bytes())?;
    println!("Configured Docker daemon: {}", path.display());

    if !args.no_restart {
        restart_docker(&ctx.paths).await?;
    }
    Ok(())
}

pub async fn restore(ctx: &Context, args: &RestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_root(&ctx.paths, "Restoring the Docker daemon configuration")?;
    let path = ctx.paths.daemon_json();
    let changed = super::apt::report(&path, backup::restore(&path)?);

    if changed && !args.no_restart {
        restart_docker(&ctx.paths).await?;
    }
    Ok(())
}
