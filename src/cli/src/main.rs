//! nexus-route CLI entry point.
//!
//! When installed as `/usr/local/bin/docker` the binary behaves as the
//! docker wrapper; otherwise it is the regular management CLI.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nexus_route_cli::commands::{dispatch, docker, Cli};
use nexus_route_cli::context;

#[tokio::main]
async fn main() {
    let default_level = if context::debug_enabled() { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut argv = std::env::args_os();
    let argv0 = argv.next().unwrap_or_default();

    if docker::invoked_as_docker(&argv0) {
        let args = argv
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let e = docker::run_as_docker(args);
        eprintln!("nexus-route: {e}");
        std::process::exit(127);
    }

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
