//! `nexus-route apt` command: APT sources through Nexus.

use clap::{Args, Subcommand};
use nexus_route_core::apt::{render_sources_list, AptTarget, OsRelease, DEB822_SOURCES};
use nexus_route_core::backup::{self, RestoreOutcome};

use crate::context::Context;
use crate::system::{apt_update, require_root};

#[derive(Args)]
pub struct AptArgs {
    #[command(subcommand)]
    pub action: AptAction,
}

#[derive(Subcommand)]
pub enum AptAction {
    /// Write sources.list pointing at the Nexus apt proxies
    Configure(ConfigureArgs),
    /// Restore the original APT sources
    Restore(RestoreArgs),
}

#[derive(Args, Default)]
pub struct ConfigureArgs {
    /// Print the sources.list that would be written
    #[arg(long)]
    pub dry_run: bool,

    /// Skip `apt-get update`
    #[arg(long)]
    pub no_update: bool,
}

#[derive(Args, Default)]
pub struct RestoreArgs {
    /// Skip `apt-get update`
    #[arg(long)]
    pub no_update: bool,
}

pub async fn execute(args: AptArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        AptAction::Configure(args) => configure(&ctx, &args).await,
        AptAction::Restore(args) => restore(&ctx, &args).await,
    }
}

/// Render the managed sources.list for this host.
pub fn render(ctx: &Context) -> Result<String, Box<dyn std::error::Error>> {
    let os_release_path = ctx.paths.os_release();
    let contents = std::fs::read_to_string(&os_release_path)
        .map_err(|e| format!("Failed to read {}: {}", os_release_path.display(), e))?;
    let target = AptTarget::from_os_release(&OsRelease::parse(&contents))?;
    tracing::debug!(distro = %target.distro, codename = %target.codename, "Detected distribution");
    Ok(render_sources_list(&ctx.config, &target))
}

pub async fn configure(ctx: &Context, args: &ConfigureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sources = render(ctx)?;
    if args.dry_run {
        print!("{sources}");
        return Ok(());
    }

    require_root(&ctx.paths, "Configuring APT")?;

    let sources_list = ctx.paths.sources_list();
    backup::backup(&sources_list)?;
    backup::write_atomic(&sources_list, sources.as_bytes())?;

    // deb822 files would keep pointing at the upstream mirrors.
    let sources_dir = ctx.paths.sources_dir();
    for name in DEB822_SOURCES {
        let path = sources_dir.join(name);
        if path.exists() {
            backup::backup(&path)?;
            std::fs::remove_file(&path)?;
            tracing::info!(path = %path.display(), "Disabled deb822 sources");
        }
    }

    println!("Configured APT: {}", sources_list.display());

    if !args.no_update {
        apt_update(&ctx.paths).await?;
    }
    Ok(())
}

pub async fn restore(ctx: &Context, args: &RestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_root(&ctx.paths, "Restoring APT sources")?;

    let sources_list = ctx.paths.sources_list();
    let mut restored = report(&sources_list, backup::restore(&sources_list)?);

    let sources_dir = ctx.paths.sources_dir();
    for name in DEB822_SOURCES {
        let path = sources_dir.join(name);
        restored |= report(&path, backup::restore(&path)?);
    }

    if restored && !args.no_update {
        apt_update(&ctx.paths).await?;
    }
    Ok(())
}

/// Print a restore outcome; true when something changed.
pub(crate) fn report(path: &std::path::Path, outcome: RestoreOutcome) -> bool {
    match outcome {
        RestoreOutcome::Restored(_) => {
            println!("Restored {}", path.display());
            true
        }
        RestoreOutcome::Removed => {
            println!("Removed {}", path.display());
            true
        }
        RestoreOutcome::NothingToRestore => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = "ID=ubuntu\nVERSION_CODENAME=noble\nUBUNTU_CODENAME=noble\n";

    fn staged() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "nexus_url: https://nexus.test\n").unwrap();
        let etc = dir.path().join("etc");
        std::fs::create_dir_all(etc.join("apt/sources.list.d")).unwrap();
        std::fs::write(etc.join("os-release"), UBUNTU).unwrap();
        std::fs::write(etc.join("apt/sources.list"), "deb http://archive.ubuntu.com/ubuntu noble main\n").unwrap();
        std::fs::write(etc.join("apt/sources.list.d/ubuntu.sources"), "Types: deb\n").unwrap();
        let ctx = Context::load(dir.path(), Some(&config)).unwrap();
        (dir, ctx)
    }

    #[tokio::test]
    async fn test_configure_and_restore() {
        let (_dir, ctx) = staged();
        let sources_list = ctx.paths.sources_list();
        let deb822 = ctx.paths.sources_dir().join("ubuntu.sources");

        configure(&ctx, &ConfigureArgs::default()).await.unwrap();
        let written = std::fs::read_to_string(&sources_list).unwrap();
        assert!(written.contains("/repository/apt-ubuntu/ noble "));
        assert!(!deb822.exists());

        restore(&ctx, &RestoreArgs::default()).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&sources_list).unwrap(),
            "deb http://archive.ubuntu.com/ubuntu noble main\n"
        );
        assert_eq!(std::fs::read_to_string(&deb822).unwrap(), "Types: deb\n");
    }

    #[tokio::test]
    async fn test_configure_twice_keeps_original_backup() {
        let (_dir, ctx) = staged();
        configure(&ctx, &ConfigureArgs::default()).await.unwrap();
        configure(&ctx, &ConfigureArgs::default()).await.unwrap();
        restore(&ctx, &RestoreArgs::default()).await.unwrap();
        assert!(std::fs::read_to_string(ctx.paths.sources_list())
            .unwrap()
            .contains("archive.ubuntu.com"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (_dir, ctx) = staged();
        configure(
            &ctx,
            &ConfigureArgs {
                dry_run: true,
                no_update: true,
            },
        )
        .await
        .unwrap();
        assert!(backup::latest(&ctx.paths.sources_list()).unwrap().is_none());
    }

    #[test]
    fn test_render_missing_os_release() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path(), Some(&dir.path().join("c.yaml"))).unwrap();
        let err = render(&ctx).unwrap_err();
        assert!(err.to_string().contains("os-release"));
    }
}
