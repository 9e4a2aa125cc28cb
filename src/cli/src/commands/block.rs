//! `nexus-route block` / `nexus-route unblock` commands.

use clap::Args;
use nexus_route_core::hosts;

use crate::context::Context;
use crate::system::require_root;

#[derive(Args, Default)]
pub struct BlockArgs {
    /// Print the hosts file that would be written
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Default)]
pub struct UnblockArgs;

pub async fn execute_block(args: BlockArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    block(&ctx, &args)
}

pub async fn execute_unblock(
    _args: UnblockArgs,
    ctx: Context,
) -> Result<(), Box<dyn std::error::Error>> {
    unblock(&ctx)
}

fn read_hosts(ctx: &Context) -> Result<String, Box<dyn std::error::Error>> {
    let path = ctx.paths.hosts();
    if !path.exists() {
        return Ok(String::new());
    }
    Ok(std::fs::read_to_string(&path)?)
}

/// /etc/hosts is often a bind mount, so it is rewritten in place
/// rather than replaced by rename.
fn write_hosts(ctx: &Context, contents: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.paths.hosts();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(())
}

pub fn block(ctx: &Context, args: &BlockArgs) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.config.block.hosts.is_empty() {
        return Err("block.hosts is empty; nothing to block".into());
    }

    let current = read_hosts(ctx)?;
    let path = ctx.paths.hosts();
    let updated = hosts::add_block(
        &current,
        &ctx.config.block.hosts,
        &path.display().to_string(),
    )?;
    if args.dry_run {
        print!("{updated}");
        return Ok(());
    }

    if updated == current {
        println!("Upstream hosts already blocked");
        return Ok(());
    }

    require_root(&ctx.paths, "Editing /etc/hosts")?;
    write_hosts(ctx, &updated)?;
    let count = hosts::blocked_hosts(&updated).len();
    tracing::info!(count, "Blocked upstream hosts");
    println!("Blocked {count} upstream hosts in {}", path.display());
    Ok(())
}

pub fn unblock(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let current = read_hosts(ctx)?;
    if !hosts::has_block(&current) {
        println!("No upstream hosts blocked");
        return Ok(());
    }

    let path = ctx.paths.hosts();
    let updated = hosts::remove_block(&current, &path.display().to_string())?;
    require_root(&ctx.paths, "Editing /etc/hosts")?;
    write_hosts(ctx, &updated)?;
    tracing::info!("Removed upstream host block");
    println!("Unblocked upstream hosts in {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTS: &str = "127.0.0.1 localhost\n";

    fn staged() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "block:\n  hosts: [ghcr.io, pypi.org]\n").unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/hosts"), HOSTS).unwrap();
        let ctx = Context::load(dir.path(), Some(&config)).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_block_and_unblock() {
        let (_dir, ctx) = staged();
        block(&ctx, &BlockArgs::default()).unwrap();
        let blocked = std::fs::read_to_string(ctx.paths.hosts()).unwrap();
        assert_eq!(hosts::blocked_hosts(&blocked), vec!["ghcr.io", "pypi.org"]);

        // Idempotent.
        block(&ctx, &BlockArgs::default()).unwrap();
        assert_eq!(std::fs::read_to_string(ctx.paths.hosts()).unwrap(), blocked);

        unblock(&ctx).unwrap();
        assert_eq!(std::fs::read_to_string(ctx.paths.hosts()).unwrap(), HOSTS);
    }

    #[test]
    fn test_block_dry_run() {
        let (_dir, ctx) = staged();
        block(&ctx, &BlockArgs { dry_run: true }).unwrap();
        assert_eq!(std::fs::read_to_string(ctx.paths.hosts()).unwrap(), HOSTS);
    }

    #[test]
    fn test_block_empty_list() {
        let (_dir, mut ctx) = staged();
        ctx.config.block.hosts.clear();
        assert!(block(&ctx, &BlockArgs::default()).is_err());
    }

    #[test]
    fn test_unterminated_block_is_reported() {
        let (_dir, ctx) = staged();
        let damaged = "127.0.0.1 localhost\n# BEGIN nexus-route\n0.0.0.0 ghcr.io\n10.0.0.5 nexus.lan\n";
        std::fs::write(ctx.paths.hosts(), damaged).unwrap();

        let err = unblock(&ctx).unwrap_err();
        assert!(err.to_string().contains("no matching"));
        assert!(block(&ctx, &BlockArgs::default()).is_err());
        assert_eq!(std::fs::read_to_string(ctx.paths.hosts()).unwrap(), damaged);
    }
}
