//! Per-invocation context: host paths plus the effective configuration.

use std::path::{Path, PathBuf};

use nexus_route_core::config::{is_truthy, Config, CONFIG_PATH_ENV, DEBUG_ENV};
use nexus_route_core::Result;

use crate::paths::HostPaths;

/// Everything a command needs to know about where and how to act.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: HostPaths,
    pub config: Config,
    pub config_path: PathBuf,
}

impl Context {
    /// Load configuration for `root`.
    ///
    /// The file is `config_override`, else `$NEXUS_ROUTE_CONFIG`, else
    /// `/etc/nexus-route/config.yaml` under the root. Environment
    /// overrides are applied afterwards.
    pub fn load(root: &Path, config_override: Option<&Path>) -> Result<Self> {
        let paths = HostPaths::new(root);
        let config_path = match config_override {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| paths.config_file()),
        };

        let mut config = Config::load(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        tracing::debug!(
            config = %config_path.display(),
            root = %paths.root().display(),
            "Loaded configuration"
        );

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Load and validate; for commands that act on the configuration.
    pub fn load_validated(root: &Path, config_override: Option<&Path>) -> Result<Self> {
        let ctx = Self::load(root, config_override)?;
        ctx.config.validate()?;
        Ok(ctx)
    }
}

/// Whether `NEXUS_ROUTE_DEBUG` asks for rewrite diagnostics.
pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}
