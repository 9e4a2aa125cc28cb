//! `nexus-route pip` command: pip through the Nexus PyPI proxy.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use nexus_route_core::backup;
use nexus_route_core::pip::render_pip_conf;

use crate::context::Context;
use crate::system::require_root;

#[derive(Args)]
pub struct PipArgs {
    #[command(subcommand)]
    pub action: PipAction,
}

#[derive(Subcommand)]
pub enum PipAction {
    /// Write pip.conf pointing at the Nexus PyPI proxy
    Configure(ConfigureArgs),
    /// Restore the original pip.conf
    Restore(TargetArgs),
}

#[derive(Args, Default)]
pub struct ConfigureArgs {
    /// Print the pip.conf that would be written
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Default)]
pub struct TargetArgs {
    /// Per-user pip.conf instead of /etc/pip.conf
    #[arg(long)]
    pub user: bool,
}

pub async fn execute(args: PipArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        PipAction::Configure(args) => configure(&ctx, &args),
        PipAction::Restore(args) => restore(&ctx, &args),
    }
}

fn target_path(ctx: &Context, target: &TargetArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if target.user {
        ctx.paths
            .user_pip_conf()
            .ok_or_else(|| "Cannot determine the user config directory".into())
    } else {
        Ok(ctx.paths.pip_conf())
    }
}

pub fn configure(ctx: &Context, args: &ConfigureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let contents = render_pip_conf(&ctx.config)?;
    if args.dry_run {
        print!("{contents}");
        return Ok(());
    }

    if !args.target.user {
        require_root(&ctx.paths, "Configuring system pip")?;
    }
    let path = target_path(ctx, &args.target)?;
    backup::backup(&path)?;
    backup::write_atomic(&path, contents.as_bytes())?;
    println!("Configured pip: {}", path.display());
    Ok(())
}

pub fn restore(ctx: &Context, target: &TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !target.user {
        require_root(&ctx.paths, "Restoring system pip")?;
    }
    let path = target_path(ctx, target)?;
    super::apt::report(&path, backup::restore(&path)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "nexus_url: http://nexus.lan:8081\n").unwrap();
        let ctx = Context::load(dir.path(), Some(&config)).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_configure_creates_and_restore_removes() {
        let (_dir, ctx) = staged();
        let path = ctx.paths.pip_conf();

        configure(&ctx, &ConfigureArgs::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[global]"));
        assert!(written.contains("trusted-host = nexus.lan"));

        restore(&ctx, &TargetArgs::default()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_configure_user() {
        let (_dir, ctx) = staged();
        let args = ConfigureArgs {
            dry_run: false,
            target: TargetArgs { user: true },
        };
        if ctx.paths.user_pip_conf().is_none() {
            return;
        }
        configure(&ctx, &args).unwrap();
        let path = ctx.paths.user_pip_conf().unwrap();
        assert!(path.starts_with(ctx.paths.root()));
        assert!(path.exists());
        assert!(!ctx.paths.pip_conf().exists());
    }
}
