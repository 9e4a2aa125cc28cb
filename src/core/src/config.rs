use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NexusError, Result};
use crate::reference::{ProxyPrefix, Rewriter};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nexus-route/config.yaml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "NEXUS_ROUTE_CONFIG";

/// Environment variable enabling rewrite diagnostics.
pub const DEBUG_ENV: &str = "NEXUS_ROUTE_DEBUG";

/// nexus-route configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nexus base URL (e.g. https://nexus.example.com)
    pub nexus_url: String,

    /// Docker registry proxy configuration
    pub docker: DockerConfig,

    /// APT proxy repositories
    pub apt: AptConfig,

    /// PyPI proxy repository
    pub pip: PipConfig,

    /// Direct upstream hosts to block when enforcing
    pub block: BlockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nexus_url: "http://localhost:8081".to_string(),
            docker: DockerConfig::default(),
            apt: AptConfig::default(),
            pip: PipConfig::default(),
            block: BlockConfig::default(),
        }
    }
}

/// Docker registry proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Proxy prefix for Docker Hub images (host[:port])
    pub hub_prefix: String,

    /// Proxy prefix for GHCR images (host[:port])
    pub ghcr_prefix: String,

    /// Path of the real docker CLI the wrapper hands off to
    pub real_binary: PathBuf,

    /// Proxies are served over plain HTTP
    pub insecure: bool,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            hub_prefix: "localhost:8082".to_string(),
            ghcr_prefix: "localhost:8083".to_string(),
            real_binary: PathBuf::from("/usr/bin/docker"),
            insecure: false,
        }
    }
}

/// APT proxy configuration.
///
/// Repository names default to `apt-{distro}` and `apt-{distro}-security`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AptConfig {
    /// Nexus repository proxying the main archive
    pub main_repo: Option<String>,

    /// Nexus repository proxying the security archive
    pub security_repo: Option<String>,

    /// Components override (distribution default when empty)
    pub components: Vec<String>,
}

/// PyPI proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    /// Nexus repository proxying PyPI
    pub repository: String,

    /// pip network timeout in seconds
    pub timeout: u32,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            repository: "pypi-proxy".to_string(),
            timeout: 60,
        }
    }
}

/// Blocked upstream hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub hosts: Vec<String>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            hosts: crate::hosts::DEFAULT_BLOCKED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

/// Environment variables overriding config values.
const ENV_OVERRIDES: &[&str] = &[
    "NEXUS_URL",
    "NEXUS_DOCKER_HUB_PREFIX",
    "NEXUS_GHCR_PREFIX",
    "NEXUS_REAL_DOCKER",
];

impl Config {
    /// Load configuration from a YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|e| {
            NexusError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&data).map_err(|e| {
            NexusError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a function so callers (and tests) decide where
    /// values come from.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for &name in ENV_OVERRIDES {
            let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let value = value.trim().to_string();
            tracing::debug!(var = name, "Config overridden from environment");
            match name {
                "NEXUS_URL" => self.nexus_url = value,
                "NEXUS_DOCKER_HUB_PREFIX" => self.docker.hub_prefix = value,
                "NEXUS_GHCR_PREFIX" => self.docker.ghcr_prefix = value,
                "NEXUS_REAL_DOCKER" => self.docker.real_binary = PathBuf::from(value),
                _ => {}
            }
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        self.nexus_host()?;
        self.hub_prefix()?;
        self.ghcr_prefix()?;
        if self.pip.repository.trim().is_empty() {
            return Err(NexusError::ConfigError(
                "pip.repository must not be empty".to_string(),
            ));
        }
        for (key, value) in [
            ("apt.main_repo", &self.apt.main_repo),
            ("apt.security_repo", &self.apt.security_repo),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(NexusError::ConfigError(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn hub_prefix(&self) -> Result<ProxyPrefix> {
        ProxyPrefix::parse(&self.docker.hub_prefix)
    }

    pub fn ghcr_prefix(&self) -> Result<ProxyPrefix> {
        ProxyPrefix::parse(&self.docker.ghcr_prefix)
    }

    /// Build the reference rewriter from the validated prefixes.
    pub fn rewriter(&self) -> Result<Rewriter> {
        Ok(Rewriter::new(&self.hub_prefix()?, &self.ghcr_prefix()?))
    }

    /// Nexus base URL without a trailing slash.
    pub fn nexus_base(&self) -> &str {
        self.nexus_url.trim().trim_end_matches('/')
    }

    /// Whether Nexus is reached over plain HTTP.
    pub fn nexus_is_http(&self) -> bool {
        self.nexus_base().starts_with("http://")
    }

    /// Host part of the Nexus URL (no scheme, port or path).
    pub fn nexus_host(&self) -> Result<&str> {
        let base = self.nexus_base();
        let rest = base
            .strip_prefix("https://")
            .or_else(|| base.strip_prefix("http://"))
            .ok_or_else(|| {
                NexusError::ConfigError(format!(
                    "nexus_url must start with http:// or https://, got '{}'",
                    self.nexus_url
                ))
            })?;
        let authority = rest.split('/').next().unwrap_or_default();
        let host = match authority.rsplit_once(':') {
            Some((host, _)) => host,
            None => authority,
        };
        if host.is_empty() {
            return Err(NexusError::ConfigError(format!(
                "nexus_url has no host: '{}'",
                self.nexus_url
            )));
        }
        Ok(host)
    }

    /// URL of a Nexus repository, with a trailing slash.
    pub fn repository_url(&self, repository: &str) -> String {
        format!("{}/repository/{}/", self.nexus_base(), repository)
    }
}

/// Whether a debug toggle value enables diagnostics.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.pip.timeout, 60);
        assert!(config.block.hosts.contains(&"registry-1.docker.io".to_string()));
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
nexus_url: https://nexus.example.com/
docker:
  hub_prefix: nexus.example.com:8082
  ghcr_prefix: nexus.example.com:8083
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.nexus_base(), "https://nexus.example.com");
        assert_eq!(config.docker.hub_prefix, "nexus.example.com:8082");
        assert_eq!(config.docker.real_binary, PathBuf::from("/usr/bin/docker"));
        assert_eq!(config.pip.repository, "pypi-proxy");
        config.validate().unwrap();
    }

    #[test]
    fn test_from_yaml_empty() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = Config::from_yaml("docker: [1, 2").unwrap_err();
        assert!(matches!(err, NexusError::SerializationError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pip:\n  repository: pypi-group\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.pip.repository, "pypi-group");
    }

    #[test]
    fn test_load_parse_error_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pip: [").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, NexusError::ConfigError(_)));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            ("NEXUS_URL", "https://nexus.corp"),
            ("NEXUS_DOCKER_HUB_PREFIX", " nexus.corp:8082 "),
            ("NEXUS_GHCR_PREFIX", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.nexus_url, "https://nexus.corp");
        assert_eq!(config.docker.hub_prefix, "nexus.corp:8082");
        // Empty values are ignored.
        assert_eq!(config.docker.ghcr_prefix, "localhost:8083");
    }

    #[test]
    fn test_validate_rejects_path_prefix() {
        let mut config = Config::default();
        config.docker.ghcr_prefix = "nexus.example.com/ghcr".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, NexusError::InvalidPrefix { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.nexus_url = "nexus.example.com".to_string();
        assert!(config.validate().is_err());

        config.nexus_url = "https://".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_repos() {
        let mut config = Config::default();
        config.pip.repository = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.apt.main_repo = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nexus_host() {
        let mut config = Config::default();
        config.nexus_url = "http://nexus.lan:8081/".to_string();
        assert_eq!(config.nexus_host().unwrap(), "nexus.lan");
        assert!(config.nexus_is_http());

        config.nexus_url = "https://nexus.example.com/nexus".to_string();
        assert_eq!(config.nexus_host().unwrap(), "nexus.example.com");
        assert!(!config.nexus_is_http());
    }

    #[test]
    fn test_repository_url() {
        let mut config = Config::default();
        config.nexus_url = "https://nexus.example.com/".to_string();
        assert_eq!(
            config.repository_url("apt-ubuntu"),
            "https://nexus.example.com/repository/apt-ubuntu/"
        );
    }

    #[test]
    fn test_rewriter_from_config() {
        let config = Config::default();
        let rewriter = config.rewriter().unwrap();
        assert_eq!(rewriter.docker_hub_prefix(), "localhost:8082");
        assert_eq!(
            rewriter.rewrite("alpine").rewritten,
            "localhost:8082/library/alpine"
        );
    }

    #[test]
    fn test_yaml_roundtrip_keeps_defaults() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("hub_prefix"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" yes "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
