//! `nexus-route config` command.

use clap::{Args, Subcommand};

use crate::context::Context;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as YAML
    Show,
    /// Validate the effective configuration
    Check,
}

pub async fn execute(args: ConfigArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", ctx.config.to_yaml()?);
        }
        ConfigAction::Check => {
            ctx.config.validate()?;
            let source = if ctx.config_path.exists() {
                ctx.config_path.display().to_string()
            } else {
                format!("defaults ({} not found)", ctx.config_path.display())
            };
            println!("Configuration OK: {source}");
        }
    }
    Ok(())
}
