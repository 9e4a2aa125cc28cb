//! Image reference rewriting.
//!
//! Routes image references like `alpine:latest` or `ghcr.io/org/app:v1`
//! through a Nexus registry proxy, e.g. `nexus:8082/library/alpine:latest`.
//! References that already target a proxy, or that name a third-party
//! registry the proxy does not front, are left alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NexusError, Result};

/// Registry host prefix for GitHub Container Registry references.
const GHCR_REGISTRY: &str = "ghcr.io/";

/// Registry host prefix for explicit Docker Hub references.
const DOCKER_HUB_REGISTRY: &str = "docker.io/";

/// Namespace Docker Hub uses for official images.
const OFFICIAL_NAMESPACE: &str = "library/";

/// Borrowed view over an image reference string.
///
/// The reference has the form `[registry-host[:port]/]repository[:tag|@digest]`
/// but is not validated; `docker` reports malformed references itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReference<'a> {
    raw: &'a str,
}

impl<'a> ImageReference<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// The reference as given.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Substring up to the first `/`, or the whole reference.
    pub fn first_segment(&self) -> &'a str {
        match self.raw.find('/') {
            Some(pos) => &self.raw[..pos],
            None => self.raw,
        }
    }

    /// Whether the reference contains a `/` at all.
    pub fn has_path(&self) -> bool {
        self.raw.contains('/')
    }

    /// Whether the first segment looks like a registry hostname
    /// (contains a dot or colon, or is "localhost").
    pub fn is_explicit_registry(&self) -> bool {
        let first = self.first_segment();
        first.contains('.') || first.contains(':') || first == "localhost"
    }

    /// Whether the reference already starts with one of the proxy prefixes.
    pub fn is_already_proxied(&self, docker_hub_prefix: &str, ghcr_prefix: &str) -> bool {
        strip_prefix_segment(self.raw, docker_hub_prefix).is_some()
            || strip_prefix_segment(self.raw, ghcr_prefix).is_some()
    }
}

/// `value` with `prefix + "/"` removed, if it starts with that.
fn strip_prefix_segment<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value.strip_prefix(prefix)?.strip_prefix('/')
}

/// Which rewrite rule applied to a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteRule {
    /// Already routed through one of the proxies; unchanged.
    AlreadyProxied,
    /// Explicit `ghcr.io/` reference; moved onto the GHCR proxy.
    Ghcr,
    /// Explicit `docker.io/` reference; moved onto the Docker Hub proxy.
    DockerHub,
    /// Bare name like `alpine:latest`; official image under `library/`.
    OfficialImage,
    /// Third-party registry the proxy does not front; unchanged.
    ThirdPartyRegistry,
    /// Docker Hub namespace like `myorg/app`; moved onto the Docker Hub proxy.
    DockerHubNamespace,
}

impl RewriteRule {
    /// Whether this rule leaves the reference untouched.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::AlreadyProxied | Self::ThirdPartyRegistry)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyProxied => "already-proxied",
            Self::Ghcr => "ghcr",
            Self::DockerHub => "docker-hub",
            Self::OfficialImage => "official-image",
            Self::ThirdPartyRegistry => "third-party-registry",
            Self::DockerHubNamespace => "docker-hub-namespace",
        }
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide which rule applies to `reference`. First match wins.
///
/// The proxy check must run before the `ghcr.io`/`docker.io` checks, and
/// those before the explicit-registry heuristic: both the proxy prefixes
/// and the two upstream hosts contain a `.` or `:`.
pub fn classify(reference: &str, docker_hub_prefix: &str, ghcr_prefix: &str) -> RewriteRule {
    let image = ImageReference::new(reference);

    if image.is_already_proxied(docker_hub_prefix, ghcr_prefix) {
        RewriteRule::AlreadyProxied
    } else if reference.starts_with(GHCR_REGISTRY) {
        RewriteRule::Ghcr
    } else if reference.starts_with(DOCKER_HUB_REGISTRY) {
        RewriteRule::DockerHub
    } else if !image.has_path() {
        // Also catches `host:5000` with no path; kept for compatibility.
        RewriteRule::OfficialImage
    } else if image.is_explicit_registry() {
        RewriteRule::ThirdPartyRegistry
    } else {
        RewriteRule::DockerHubNamespace
    }
}

/// Rewrite `reference` to route through the matching proxy prefix.
///
/// Total over all inputs and idempotent: rewriting an already rewritten
/// reference returns it unchanged.
///
/// - `alpine:latest` → `{hub}/library/alpine:latest`
/// - `myorg/app:1.0` → `{hub}/myorg/app:1.0`
/// - `docker.io/library/nginx` → `{hub}/library/nginx`
/// - `ghcr.io/owner/repo:tag` → `{ghcr}/owner/repo:tag`
/// - `quay.io/org/image` → unchanged
pub fn rewrite(reference: &str, docker_hub_prefix: &str, ghcr_prefix: &str) -> String {
    apply(
        classify(reference, docker_hub_prefix, ghcr_prefix),
        reference,
        docker_hub_prefix,
        ghcr_prefix,
    )
}

fn apply(rule: RewriteRule, reference: &str, docker_hub_prefix: &str, ghcr_prefix: &str) -> String {
    match rule {
        RewriteRule::AlreadyProxied | RewriteRule::ThirdPartyRegistry => reference.to_string(),
        RewriteRule::Ghcr => {
            format!("{}/{}", ghcr_prefix, &reference[GHCR_REGISTRY.len()..])
        }
        RewriteRule::DockerHub => format!(
            "{}/{}",
            docker_hub_prefix,
            &reference[DOCKER_HUB_REGISTRY.len()..]
        ),
        RewriteRule::OfficialImage => {
            format!("{}/{}{}", docker_hub_prefix, OFFICIAL_NAMESPACE, reference)
        }
        RewriteRule::DockerHubNamespace => format!("{}/{}", docker_hub_prefix, reference),
    }
}

/// A bare `host[:port]` through which pulls for one upstream registry
/// are routed. Path-bearing endpoints cannot act as a registry mirror.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProxyPrefix(String);

impl ProxyPrefix {
    /// Validate a proxy prefix.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = |reason: &str| NexusError::InvalidPrefix {
            prefix: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if value.contains("://") {
            return Err(invalid("must not include a scheme"));
        }
        if value.contains('/') {
            return Err(invalid("must not contain a path"));
        }
        if value.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(invalid("contains invalid characters"));
        }

        let (host, port) = match value.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (value, None),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if host.contains(':') {
            return Err(invalid("more than one ':' separator"));
        }
        if let Some(port) = port {
            match port.parse::<u16>() {
                Ok(p) if p > 0 => {}
                _ => return Err(invalid("port must be a number between 1 and 65535")),
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host part without the port.
    pub fn host(&self) -> &str {
        match self.0.rsplit_once(':') {
            Some((host, _)) => host,
            None => &self.0,
        }
    }
}

impl FromStr for ProxyPrefix {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProxyPrefix {
    type Error = NexusError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProxyPrefix> for String {
    fn from(prefix: ProxyPrefix) -> Self {
        prefix.0
    }
}

impl fmt::Display for ProxyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of rewriting a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub original: String,
    pub rewritten: String,
    pub rule: RewriteRule,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        self.original != self.rewritten
    }
}

/// Rewrites references against a fixed pair of proxy prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewriter {
    docker_hub_prefix: String,
    ghcr_prefix: String,
}

impl Rewriter {
    pub fn new(docker_hub_prefix: &ProxyPrefix, ghcr_prefix: &ProxyPrefix) -> Self {
        Self::from_raw(docker_hub_prefix.as_str(), ghcr_prefix.as_str())
    }

    /// Build a rewriter without validating the prefixes.
    pub fn from_raw(docker_hub_prefix: &str, ghcr_prefix: &str) -> Self {
        Self {
            docker_hub_prefix: docker_hub_prefix.to_string(),
            ghcr_prefix: ghcr_prefix.to_string(),
        }
    }

    pub fn docker_hub_prefix(&self) -> &str {
        &self.docker_hub_prefix
    }

    pub fn ghcr_prefix(&self) -> &str {
        &self.ghcr_prefix
    }

    pub fn rewrite(&self, reference: &str) -> Rewrite {
        let rule = classify(reference, &self.docker_hub_prefix, &self.ghcr_prefix);
        Rewrite {
            original: reference.to_string(),
            rewritten: apply(rule, reference, &self.docker_hub_prefix, &self.ghcr_prefix),
            rule,
        }
    }
}
