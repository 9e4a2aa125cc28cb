//! CLI command definitions and dispatch.

mod apt;
mod block;
mod config;
mod daemon;
pub mod docker;
mod pip;
mod rewrite;
mod setup;
mod status;
mod teardown;
mod version;
mod wrapper;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::context::Context;

/// nexus-route: route APT, pip and Docker pulls through a Nexus proxy.
#[derive(Parser)]
#[command(name = "nexus-route", version, about)]
pub struct Cli {
    /// Stage all host files under this directory instead of `/`
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Configuration file (default: $NEXUS_ROUTE_CONFIG or /etc/nexus-route/config.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Show how image references would be rewritten
    Rewrite(rewrite::RewriteArgs),
    /// Run docker with the pull reference routed through the proxy
    Docker(docker::DockerArgs),
    /// Install or remove the docker CLI wrapper
    Wrapper(wrapper::WrapperArgs),
    /// Point APT at the Nexus apt proxies
    Apt(apt::AptArgs),
    /// Point pip at the Nexus PyPI proxy
    Pip(pip::PipArgs),
    /// Configure the Docker daemon registry mirror
    Daemon(daemon::DaemonArgs),
    /// Block direct access to upstream registries in /etc/hosts
    Block(block::BlockArgs),
    /// Remove the /etc/hosts block
    Unblock(block::UnblockArgs),
    /// Configure everything in one go
    Setup(setup::SetupArgs),
    /// Undo everything setup did
    Teardown(teardown::TeardownArgs),
    /// Show what is currently configured
    Status(status::StatusArgs),
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = cli.root;
    let config = cli.config;
    let load = || Context::load(&root, config.as_deref());
    let load_validated = || Context::load_validated(&root, config.as_deref());

    match cli.command {
        Command::Rewrite(args) => rewrite::execute(args, load()?).await,
        Command::Docker(args) => docker::execute(args, load()?).await,
        Command::Wrapper(args) => wrapper::execute(args, load()?).await,
        Command::Apt(args) => apt::execute(args, load_validated()?).await,
        Command::Pip(args) => pip::execute(args, load_validated()?).await,
        Command::Daemon(args) => daemon::execute(args, load_validated()?).await,
        Command::Block(args) => block::execute_block(args, load()?).await,
        Command::Unblock(args) => block::execute_unblock(args, load()?).await,
        Command::Setup(args) => setup::execute(args, load_validated()?).await,
        Command::Teardown(args) => teardown::execute(args, load()?).await,
        Command::Status(args) => status::execute(args, load()?).await,
        Command::Config(args) => config::execute(args, load()?).await,
        Command::Version(args) => version::execute(args).await,
    }
}
