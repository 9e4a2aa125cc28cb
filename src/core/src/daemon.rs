//! Docker daemon configuration (`daemon.json`) merging.
//!
//! Only the keys nexus-route owns are touched; everything else in an
//! existing `daemon.json` is preserved.

use serde_json::{Map, Value};

use crate::error::{NexusError, Result};
use crate::reference::ProxyPrefix;

const REGISTRY_MIRRORS: &str = "registry-mirrors";
const INSECURE_REGISTRIES: &str = "insecure-registries";

/// Registry settings nexus-route writes into `daemon.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSettings {
    pub hub_prefix: ProxyPrefix,
    pub ghcr_prefix: ProxyPrefix,
    /// Proxies are plain HTTP
    pub insecure: bool,
}

impl DaemonSettings {
    /// Mirror URL for Docker Hub pulls.
    pub fn mirror_url(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}", scheme, self.hub_prefix)
    }

    fn insecure_registries(&self) -> Vec<String> {
        if self.insecure {
            vec![
                self.hub_prefix.to_string(),
                self.ghcr_prefix.to_string(),
            ]
        } else {
            Vec::new()
        }
    }

    /// Every entry nexus-route may have added, regardless of `insecure`.
    fn owned_entries(&self) -> Vec<String> {
        vec![
            format!("http://{}", self.hub_prefix),
            format!("https://{}", self.hub_prefix),
            self.hub_prefix.to_string(),
            self.ghcr_prefix.to_string(),
        ]
    }
}

fn parse_object(existing: &str, path: &str) -> Result<Map<String, Value>> {
    if existing.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(existing).map_err(|e| NexusError::ManagedFileError {
        path: path.to_string(),
        message: format!("invalid JSON: {e}"),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(NexusError::ManagedFileError {
            path: path.to_string(),
            message: "expected a JSON object".to_string(),
        }),
    }
}

fn string_list(map: &Map<String, Value>, key: &str, path: &str) -> Result<Vec<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| NexusError::ManagedFileError {
                    path: path.to_string(),
                    message: format!("'{key}' must contain only strings"),
                })
            })
            .collect(),
        Some(_) => Err(NexusError::ManagedFileError {
            path: path.to_string(),
            message: format!("'{key}' must be an array"),
        }),
    }
}

fn set_list(map: &mut Map<String, Value>, key: &str, items: Vec<String>) {
    if items.is_empty() {
        map.remove(key);
    } else {
        map.insert(
            key.to_string(),
            Value::Array(items.into_iter().map(Value::String).collect()),
        );
    }
}

fn render(map: Map<String, Value>) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&Value::Object(map))?;
    out.push('\n');
    Ok(out)
}

/// Merge the proxy settings into existing `daemon.json` contents.
///
/// `path` is only used in error messages. Unparsable or non-object
/// contents are an error rather than being overwritten.
pub fn merge_daemon_json(existing: &str, settings: &DaemonSettings, path: &str) -> Result<String> {
    let mut map = parse_object(existing, path)?;
    let owned = settings.owned_entries();

    let mirror = settings.mirror_url();
    let mut mirrors: Vec<String> = string_list(&map, REGISTRY_MIRRORS, path)?
        .into_iter()
        .filter(|m| !owned.contains(m))
        .collect();
    mirrors.insert(0, mirror);
    set_list(&mut map, REGISTRY_MIRRORS, mirrors);

    let mut insecure: Vec<String> = string_list(&map, INSECURE_REGISTRIES, path)?
        .into_iter()
        .filter(|r| !owned.contains(r))
        .collect();
    insecure.extend(settings.insecure_registries());
    set_list(&mut map, INSECURE_REGISTRIES, insecure);

    render(map)
}

/// Remove the proxy settings from `daemon.json` contents, keeping
/// everything else.
pub fn strip_daemon_json(existing: &str, settings: &DaemonSettings, path: &str) -> Result<String> {
    let mut map = parse_object(existing, path)?;
    let owned = settings.owned_entries();

    for key in [REGISTRY_MIRRORS, INSECURE_REGISTRIES] {
        let kept: Vec<String> = string_list(&map, key, path)?
            .into_iter()
            .filter(|v| !owned.contains(v))
            .collect();
        set_list(&mut map, key, kept);
    }

    render(map)
}

/// Whether `daemon.json` contents already point Docker Hub at the proxy.
pub fn has_mirror(existing: &str, settings: &DaemonSettings) -> bool {
    parse_object(existing, "daemon.json")
        .and_then(|map| string_list(&map, REGISTRY_MIRRORS, "daemon.json"))
        .map(|mirrors| mirrors.contains(&settings.mirror_url()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(insecure: bool) -> DaemonSettings {
        DaemonSettings {
            hub_prefix: ProxyPrefix::parse("nexus:8082").unwrap(),
            ghcr_prefix: ProxyPrefix::parse("nexus:8083").unwrap(),
            insecure,
        }
    }

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_into_empty() {
        let out = merge_daemon_json("", &settings(false), "daemon.json").unwrap();
        assert_eq!(
            parse(&out),
            serde_json::json!({ "registry-mirrors": ["https://nexus:8082"] })
        );
    }

    #[test]
    fn test_merge_preserves_other_keys() {
        let existing = r#"{"log-driver": "journald", "registry-mirrors": ["https://mirror.gcr.io"]}"#;
        let out = merge_daemon_json(existing, &settings(false), "daemon.json").unwrap();
        assert_eq!(
            parse(&out),
            serde_json::json!({
                "log-driver": "journald",
                "registry-mirrors": ["https://nexus:8082", "https://mirror.gcr.io"]
            })
        );
    }

    #[test]
    fn test_merge_insecure() {
        let out = merge_daemon_json("{}", &settings(true), "daemon.json").unwrap();
        assert_eq!(
            parse(&out),
            serde_json::json!({
                "registry-mirrors": ["http://nexus:8082"],
                "insecure-registries": ["nexus:8082", "nexus:8083"]
            })
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_daemon_json("{}", &settings(true), "daemon.json").unwrap();
        let twice = merge_daemon_json(&once, &settings(true), "daemon.json").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_switching_to_secure_drops_insecure_entries() {
        let insecure = merge_daemon_json("{}", &settings(true), "daemon.json").unwrap();
        let secure = merge_daemon_json(&insecure, &settings(false), "daemon.json").unwrap();
        assert_eq!(
            parse(&secure),
            serde_json::json!({ "registry-mirrors": ["https://nexus:8082"] })
        );
    }

    #[test]
    fn test_merge_rejects_invalid_json() {
        let err = merge_daemon_json("{ nope", &settings(false), "/etc/docker/daemon.json")
            .unwrap_err();
        assert!(matches!(err, NexusError::ManagedFileError { .. }));
        assert!(err.to_string().contains("/etc/docker/daemon.json"));
    }

    #[test]
    fn test_merge_rejects_non_object() {
        assert!(merge_daemon_json("[1]", &settings(false), "daemon.json").is_err());
    }

    #[test]
    fn test_merge_rejects_bad_mirror_list() {
        let err = merge_daemon_json(r#"{"registry-mirrors": "x"}"#, &settings(false), "d")
            .unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_strip_keeps_foreign_entries() {
        let existing = r#"{"debug": true, "registry-mirrors": ["https://mirror.gcr.io"]}"#;
        let merged = merge_daemon_json(existing, &settings(true), "daemon.json").unwrap();
        let stripped = strip_daemon_json(&merged, &settings(true), "daemon.json").unwrap();
        assert_eq!(parse(&stripped), parse(existing));
    }

    #[test]
    fn test_has_mirror() {
        let merged = merge_daemon_json("{}", &settings(false), "daemon.json").unwrap();
        assert!(has_mirror(&merged, &settings(false)));
        assert!(!has_mirror("{}", &settings(false)));
        assert!(!has_mirror("garbage", &settings(false)));
    }
}
