//! `nexus-route wrapper` command: install or remove the docker wrapper.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::context::Context;
use crate::system::require_root;

#[derive(Args)]
pub struct WrapperArgs {
    #[command(subcommand)]
    pub action: WrapperAction,
}

#[derive(Subcommand)]
pub enum WrapperAction {
    /// Symlink /usr/local/bin/docker to nexus-route
    Install,
    /// Remove the symlink if it points at nexus-route
    Uninstall,
}

/// State of the wrapper link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperState {
    /// Link points at the given nexus-route binary.
    Installed(PathBuf),
    /// Nothing at the link path.
    Missing,
    /// Something else occupies the link path.
    Foreign(PathBuf),
}

pub async fn execute(args: WrapperArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        WrapperAction::Install => {
            let link = install(&ctx)?;
            println!("Installed docker wrapper: {}", link.display());
        }
        WrapperAction::Uninstall => {
            if uninstall(&ctx)? {
                println!("Removed docker wrapper: {}", ctx.paths.wrapper_link().display());
            } else {
                println!("Docker wrapper not installed");
            }
        }
    }
    Ok(())
}

fn current_exe() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let exe = std::env::current_exe()?;
    Ok(exe.canonicalize().unwrap_or(exe))
}

/// Inspect the wrapper link against the binary `exe`.
pub fn state(link: &Path, exe: &Path) -> WrapperState {
    let Ok(meta) = std::fs::symlink_metadata(link) else {
        return WrapperState::Missing;
    };
    if meta.file_type().is_symlink() {
        if let Ok(target) = std::fs::read_link(link) {
            let target = match link.parent() {
                Some(dir) if target.is_relative() => dir.join(target),
                _ => target,
            };
            let resolved = target.canonicalize().unwrap_or(target);
            if resolved == exe {
                return WrapperState::Installed(resolved);
            }
            return WrapperState::Foreign(resolved);
        }
    }
    WrapperState::Foreign(link.to_path_buf())
}

/// Current wrapper state for this binary.
pub fn current_state(ctx: &Context) -> WrapperState {
    match current_exe() {
        Ok(exe) => state(&ctx.paths.wrapper_link(), &exe),
        Err(_) => WrapperState::Missing,
    }
}

/// Create the wrapper symlink. Refuses to replace anything it did not create.
pub fn install(ctx: &Context) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let link = ctx.paths.wrapper_link();
    let exe = current_exe()?;

    match state(&link, &exe) {
        WrapperState::Installed(_) => {
            tracing::info!(link = %link.display(), "Docker wrapper already installed");
            return Ok(link);
        }
        WrapperState::Foreign(other) => {
            return Err(format!(
                "{} already exists ({}); remove it first",
                link.display(),
                other.display()
            )
            .into());
        }
        WrapperState::Missing => {}
    }

    let real = ctx.paths.resolve(&ctx.config.docker.real_binary);
    if ctx.paths.is_system_root() && !real.exists() {
        tracing::warn!(
            real = %real.display(),
            "Real docker CLI not found; the wrapper will fail until it is installed"
        );
    }

    require_root(&ctx.paths, "Installing the docker wrapper")?;
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(&exe, &link)?;
    tracing::info!(link = %link.display(), target = %exe.display(), "Installed docker wrapper");
    Ok(link)
}

/// Remove the wrapper symlink. Returns false if it was not installed.
pub fn uninstall(ctx: &Context) -> Result<bool, Box<dyn std::error::Error>> {
    let link = ctx.paths.wrapper_link();
    match state(&link, &current_exe()?) {
        WrapperState::Installed(_) => {
            require_root(&ctx.paths, "Removing the docker wrapper")?;
            std::fs::remove_file(&link)?;
            tracing::info!(link = %link.display(), "Removed docker wrapper");
            Ok(true)
        }
        WrapperState::Foreign(other) => {
            tracing::warn!(
                link = %link.display(),
                target = %other.display(),
                "Not removing docker entry not created by nexus-route"
            );
            Ok(false)
        }
        WrapperState::Missing => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        let ctx = Context::load(dir.path(), Some(&config)).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_install_and_uninstall() {
        let (_dir, ctx) = staged();
        let link = install(&ctx).unwrap();
        assert!(matches!(current_state(&ctx), WrapperState::Installed(_)));

        // Second install is a no-op.
        assert_eq!(install(&ctx).unwrap(), link);

        assert!(uninstall(&ctx).unwrap());
        assert_eq!(current_state(&ctx), WrapperState::Missing);
        assert!(!uninstall(&ctx).unwrap());
    }

    #[test]
    fn test_install_refuses_foreign_file() {
        let (_dir, ctx) = staged();
        let link = ctx.paths.wrapper_link();
        std::fs::create_dir_all(link.parent().unwrap()).unwrap();
        std::fs::write(&link, "#!/bin/sh\n").unwrap();

        assert!(install(&ctx).is_err());
        assert!(matches!(current_state(&ctx), WrapperState::Foreign(_)));
        // Uninstall leaves it alone.
        assert!(!uninstall(&ctx).unwrap());
        assert!(link.exists());
    }

    #[test]
    fn test_relative_link_is_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let exe = bin.join("nexus-route");
        std::fs::write(&exe, "").unwrap();
        let link = bin.join("docker");
        std::os::unix::fs::symlink("nexus-route", &link).unwrap();

        let exe = exe.canonicalize().unwrap();
        assert_eq!(state(&link, &exe), WrapperState::Installed(exe.clone()));
    }
}
