//! nexus-route core
//!
//! Routes package manager traffic through a Nexus proxy: image reference
//! rewriting for Docker pulls, plus the file renderers for APT, pip, the
//! Docker daemon and `/etc/hosts` blocking. Nothing here spawns processes.

pub mod apt;
pub mod backup;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hosts;
pub mod pip;
pub mod pull;
pub mod reference;

// Re-export commonly used types
pub use config::Config;
pub use error::{NexusError, Result};
pub use pull::{rewrite_pull_args, PullCommand, PullRewrite};
pub use reference::{classify, rewrite, ImageReference, ProxyPrefix, Rewrite, RewriteRule, Rewriter};

/// nexus-route version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
