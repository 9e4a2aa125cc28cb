//! APT sources rendering for Nexus apt proxy repositories.
//!
//! Detects the distribution from `/etc/os-release` and renders a
//! one-line-format `sources.list` whose entries point at
//! `{nexus_url}/repository/{repo}/`.

use std::collections::HashMap;
use std::fmt;

use crate::config::Config;
use crate::error::{NexusError, Result};

/// deb822 source files shipped by recent releases; superseded by the
/// managed `sources.list`.
pub const DEB822_SOURCES: &[&str] = &["ubuntu.sources", "debian.sources"];

/// Supported distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Ubuntu,
    Debian,
}

impl Distro {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
        }
    }

    /// Components enabled when the config does not override them.
    pub fn default_components(&self) -> &'static [&'static str] {
        match self {
            Self::Ubuntu => &["main", "restricted", "universe", "multiverse"],
            Self::Debian => &["main", "contrib", "non-free", "non-free-firmware"],
        }
    }

    /// Suites served from the main archive.
    fn main_suites(&self, codename: &str) -> Vec<String> {
        let mut suites = vec![codename.to_string(), format!("{codename}-updates")];
        if *self == Self::Ubuntu {
            suites.push(format!("{codename}-backports"));
        }
        suites
    }

    fn security_suite(&self, codename: &str) -> String {
        format!("{codename}-security")
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Fields of `/etc/os-release` relevant to source selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    fields: HashMap<String, String>,
}

impl OsRelease {
    /// Parse `KEY=value` lines; quotes are stripped, comments skipped.
    pub fn parse(contents: &str) -> Self {
        let fields = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| {
                let v = v.trim();
                let v = v
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                    .unwrap_or(v);
                (k.trim().to_string(), v.to_string())
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Resolve the distribution, following `ID_LIKE` for derivatives.
    pub fn distro(&self) -> Result<Distro> {
        let id = self.get("ID").unwrap_or("unknown");
        let like = self.get("ID_LIKE").unwrap_or_default();
        let candidates = std::iter::once(id).chain(like.split_whitespace());
        for candidate in candidates {
            match candidate {
                "ubuntu" => return Ok(Distro::Ubuntu),
                "debian" => return Ok(Distro::Debian),
                _ => {}
            }
        }
        Err(NexusError::UnsupportedDistro { id: id.to_string() })
    }

    /// Release codename (`UBUNTU_CODENAME` wins for Ubuntu derivatives).
    pub fn codename(&self, distro: Distro) -> Result<&str> {
        let codename = match distro {
            Distro::Ubuntu => self
                .get("UBUNTU_CODENAME")
                .or_else(|| self.get("VERSION_CODENAME")),
            Distro::Debian => self.get("VERSION_CODENAME"),
        };
        codename.ok_or_else(|| {
            NexusError::ConfigError(format!(
                "os-release has no codename for {distro}; cannot select APT suites"
            ))
        })
    }
}

/// A resolved APT source target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptTarget {
    pub distro: Distro,
    pub codename: String,
}

impl AptTarget {
    pub fn from_os_release(os: &OsRelease) -> Result<Self> {
        let distro = os.distro()?;
        let codename = os.codename(distro)?.to_string();
        Ok(Self { distro, codename })
    }
}

/// Render the managed `sources.list`.
pub fn render_sources_list(config: &Config, target: &AptTarget) -> String {
    let distro = target.distro;
    let main_repo = config
        .apt
        .main_repo
        .clone()
        .unwrap_or_else(|| format!("apt-{}", distro.id()));
    let security_repo = config
        .apt
        .security_repo
        .clone()
        .unwrap_or_else(|| format!("apt-{}-security", distro.id()));
    let components = if config.apt.components.is_empty() {
        distro.default_components().join(" ")
    } else {
        config.apt.components.join(" ")
    };

    let main_url = config.repository_url(&main_repo);
    let security_url = config.repository_url(&security_repo);

    let mut out = String::new();
    out.push_str("# Managed by nexus-route. Changes will be overwritten.\n");
    out.push_str(&format!(
        "# {} {} via {}\n",
        distro,
        target.codename,
        config.nexus_base()
    ));
    for suite in distro.main_suites(&target.codename) {
        out.push_str(&format!("deb {main_url} {suite} {components}\n"));
    }
    out.push_str(&format!(
        "deb {} {} {}\n",
        security_url,
        distro.security_suite(&target.codename),
        components
    ));
    out
}
