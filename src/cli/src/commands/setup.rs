//! `nexus-route setup` command: configure every package manager at once.

use clap::Args;

use crate::context::Context;

#[derive(Args, Default)]
pub struct SetupArgs {
    /// Also block upstream hosts and install the docker wrapper
    #[arg(long)]
    pub enforce: bool,

    /// Leave APT sources alone
    #[arg(long)]
    pub skip_apt: bool,

    /// Leave pip alone
    #[arg(long)]
    pub skip_pip: bool,

    /// Leave the Docker daemon and wrapper alone
    #[arg(long)]
    pub skip_docker: bool,

    /// Skip `apt-get update` and the Docker daemon restart
    #[arg(long)]
    pub no_reload: bool,
}

pub async fn execute(args: SetupArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    crate::system::require_root(&ctx.paths, "Setup")?;

    if !args.skip_apt {
        super::apt::configure(
            &ctx,
            &super::apt::ConfigureArgs {
                dry_run: false,
                no_update: args.no_reload,
            },
        )
        .await?;
    }

    if !args.skip_pip {
        super::pip::configure(&ctx, &super::pip::ConfigureArgs::default())?;
    }

    if !args.skip_docker {
        super::daemon::configure(
            &ctx,
            &super::daemon::ConfigureArgs {
                dry_run: false,
                no_restart: args.no_reload,
            },
        )
        .await?;
    }

    if args.enforce {
        super::block::block(&ctx, &super::block::BlockArgs::default())?;
        if !args.skip_docker {
            let link = super::wrapper::install(&ctx)?;
            println!("Installed docker wrapper: {}", link.display());
        }
    }

    tracing::info!(enforce = args.enforce, "Setup complete");
    println!("Setup complete");
    Ok(())
}
