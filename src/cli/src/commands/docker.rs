//! `nexus-route docker` command: docker CLI wrapper.
//!
//! Also entered when the binary is invoked as `docker` through the
//! symlink installed by `nexus-route wrapper install`.

use std::ffi::OsStr;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};

use clap::Args;
use nexus_route_core::{rewrite_pull_args, Config, Rewrite};

use crate::context::{debug_enabled, Context};

/// Fallback when the configuration cannot be loaded at all.
const DEFAULT_REAL_DOCKER: &str = "/usr/bin/docker";

/// Environment override for the real docker binary.
const REAL_DOCKER_ENV: &str = "NEXUS_REAL_DOCKER";

#[derive(Args)]
#[command(disable_help_flag = true)]
pub struct DockerArgs {
    /// Arguments passed through to docker
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub args: Vec<String>,
}

pub async fn execute(args: DockerArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    Err(exec_docker(&ctx.config, &args.args))
}

/// Whether argv[0] names the docker CLI.
pub fn invoked_as_docker(argv0: &OsStr) -> bool {
    Path::new(argv0).file_name() == Some(OsStr::new("docker"))
}

/// Wrapper entry point when invoked as `docker`. Only returns on failure.
pub fn run_as_docker(args: Vec<String>) -> Box<dyn std::error::Error> {
    match Context::load(Path::new("/"), None) {
        Ok(ctx) => exec_docker(&ctx.config, &args),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot load configuration, not rewriting");
            let real = fallback_real_docker(|key| std::env::var(key).ok());
            exec_real(&real, &args)
        }
    }
}

/// Real docker binary when the configuration file is unusable:
/// `NEXUS_REAL_DOCKER` if set, else `/usr/bin/docker`.
fn fallback_real_docker(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(REAL_DOCKER_ENV)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REAL_DOCKER))
}

/// Arguments to hand to the real docker, with the pull reference rewritten.
///
/// An invalid proxy configuration leaves the arguments untouched so that
/// docker itself keeps working.
pub fn prepare(config: &Config, args: &[String]) -> (Vec<String>, Option<Rewrite>) {
    match config.rewriter() {
        Ok(rewriter) => {
            let result = rewrite_pull_args(args, &rewriter);
            (result.args, result.rewrite)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid proxy prefix, not rewriting");
            (args.to_vec(), None)
        }
    }
}

/// Rewrite and exec the real docker. Only returns on failure.
pub fn exec_docker(config: &Config, args: &[String]) -> Box<dyn std::error::Error> {
    let (args, rewrite) = prepare(config, args);

    if let Some(r) = &rewrite {
        if debug_enabled() {
            eprintln!(
                "[nexus-route] {} -> {} ({})",
                r.original, r.rewritten, r.rule
            );
        }
    }

    exec_real(&config.docker.real_binary, &args)
}

fn exec_real(real: &Path, args: &[String]) -> Box<dyn std::error::Error> {
    if is_self(real) {
        return format!(
            "{} points back at nexus-route; set docker.real_binary to the real docker CLI",
            real.display()
        )
        .into();
    }

    tracing::debug!(binary = %real.display(), args = ?args, "Exec docker");
    let err = std::process::Command::new(real).args(args).exec();
    format!("Failed to exec {}: {}", real.display(), err).into()
}

/// Whether `path` resolves to the running executable.
fn is_self(path: &Path) -> bool {
    let (Ok(target), Ok(me)) = (
        path.canonicalize(),
        std::env::current_exe().and_then(|p| p.canonicalize()),
    ) else {
        return false;
    };
    target == me
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.docker.hub_prefix = "nexus:8082".to_string();
        config.docker.ghcr_prefix = "nexus:8083".to_string();
        config
    }

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_invoked_as_docker() {
        assert!(invoked_as_docker(OsStr::new("docker")));
        assert!(invoked_as_docker(OsStr::new("/usr/local/bin/docker")));
        assert!(!invoked_as_docker(OsStr::new("nexus-route")));
        assert!(!invoked_as_docker(OsStr::new("/usr/bin/docker-compose")));
    }

    #[test]
    fn test_prepare_rewrites_pull() {
        let (out, rewrite) = prepare(&config(), &args("pull --quiet alpine:3.20"));
        assert_eq!(out, args("pull --quiet nexus:8082/library/alpine:3.20"));
        assert_eq!(rewrite.unwrap().original, "alpine:3.20");
    }

    #[test]
    fn test_prepare_passes_other_commands() {
        let a = args("compose up -d");
        let (out, rewrite) = prepare(&config(), &a);
        assert_eq!(out, a);
        assert!(rewrite.is_none());
    }

    #[test]
    fn test_prepare_invalid_prefix_passes_through() {
        let mut config = config();
        config.docker.hub_prefix = "nexus/docker".to_string();
        let a = args("pull alpine");
        let (out, rewrite) = prepare(&config, &a);
        assert_eq!(out, a);
        assert!(rewrite.is_none());
    }

    #[test]
    fn test_is_self() {
        let me = std::env::current_exe().unwrap();
        assert!(is_self(&me));
        assert!(!is_self(Path::new("/definitely/not/here")));
    }

    #[test]
    fn test_exec_self_is_refused() {
        let mut config = config();
        config.docker.real_binary = std::env::current_exe().unwrap();
        let err = exec_docker(&config, &args("version"));
        assert!(err.to_string().contains("points back at nexus-route"));
    }

    #[test]
    fn test_fallback_real_docker_honors_env() {
        let real = fallback_real_docker(|key| {
            (key == "NEXUS_REAL_DOCKER").then(|| "/opt/docker/bin/docker".to_string())
        });
        assert_eq!(real, PathBuf::from("/opt/docker/bin/docker"));

        assert_eq!(fallback_real_docker(|_| None), PathBuf::from("/usr/bin/docker"));
        assert_eq!(
            fallback_real_docker(|_| Some("  ".to_string())),
            PathBuf::from("/usr/bin/docker")
        );
    }
}
