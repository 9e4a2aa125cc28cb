//! `nexus-route teardown` command: undo setup.
//!
//! Every step is attempted even if an earlier one fails; failures are
//! reported together at the end.

use clap::Args;

use crate::context::Context;

#[derive(Args, Default)]
pub struct TeardownArgs {
    /// Skip `apt-get update` and the Docker daemon restart
    #[arg(long)]
    pub no_reload: bool,
}

pub async fn execute(args: TeardownArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    crate::system::require_root(&ctx.paths, "Teardown")?;

    let mut failures: Vec<String> = Vec::new();
    let mut record = |step: &str, result: Result<(), Box<dyn std::error::Error>>| {
        if let Err(e) = result {
            tracing::warn!(step, error = %e, "Teardown step failed");
            failures.push(format!("{step}: {e}"));
        }
    };

    record("hosts", super::block::unblock(&ctx));
    record("wrapper", super::wrapper::uninstall(&ctx).map(|_| ()));
    record(
        "daemon",
        super::daemon::restore(
            &ctx,
            &super::daemon::RestoreArgs {
                no_restart: args.no_reload,
            },
        )
        .await,
    );
    record("pip", super::pip::restore(&ctx, &super::pip::TargetArgs::default()));
    record(
        "apt",
        super::apt::restore(
            &ctx,
            &super::apt::RestoreArgs {
                no_update: args.no_reload,
            },
        )
        .await,
    );

    if failures.is_empty() {
        println!("Teardown complete");
        Ok(())
    } else {
        Err(format!("Teardown incomplete:\n  {}", failures.join("\n  ")).into())
    }
}
