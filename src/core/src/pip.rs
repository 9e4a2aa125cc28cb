//! pip configuration pointing at a Nexus PyPI proxy.

use crate::config::Config;
use crate::error::Result;

/// Render `pip.conf` contents.
///
/// `trusted-host` is only emitted when Nexus is served over plain HTTP,
/// since pip refuses unverified hosts otherwise.
pub fn render_pip_conf(config: &Config) -> Result<String> {
    let host = config.nexus_host()?;
    let index_url = format!(
        "{}simple",
        config.repository_url(config.pip.repository.trim())
    );

    let mut out = String::new();
    out.push_str("# Managed by nexus-route. Changes will be overwritten.\n");
    out.push_str("[global]\n");
    out.push_str(&format!("index-url = {index_url}\n"));
    if config.nexus_is_http() {
        out.push_str(&format!("trusted-host = {host}\n"));
    }
    out.push_str(&format!("timeout = {}\n", config.pip.timeout));
    Ok(out)
}
