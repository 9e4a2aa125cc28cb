//! `nexus-route version` command.

use clap::Args;

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("nexus-route version {}", nexus_route_core::VERSION);
    Ok(())
}
