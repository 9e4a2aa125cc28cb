//! Managed block in `/etc/hosts` that blackholes upstream registries.
//!
//! The block is delimited by marker comments so it can be replaced or
//! removed without touching the rest of the file.

use crate::error::{NexusError, Result};

/// Start marker of the managed block.
pub const BLOCK_BEGIN: &str = "# BEGIN nexus-route";

/// End marker of the managed block.
pub const BLOCK_END: &str = "# END nexus-route";

/// Address blocked hosts resolve to.
const BLACKHOLE_ADDR: &str = "0.0.0.0";

/// Upstream hosts reached directly when the proxy is bypassed.
pub const DEFAULT_BLOCKED_HOSTS: &[&str] = &[
    // Docker Hub
    "registry-1.docker.io",
    "index.docker.io",
    "auth.docker.io",
    "production.cloudflare.docker.com",
    // GitHub Container Registry
    "ghcr.io",
    "pkg-containers.githubusercontent.com",
    // PyPI
    "pypi.org",
    "files.pythonhosted.org",
];

/// Whether `contents` carries a managed block.
pub fn has_block(contents: &str) -> bool {
    contents.lines().any(|l| l.trim() == BLOCK_BEGIN)
}

/// Hosts listed in the managed block, in file order.
pub fn blocked_hosts(contents: &str) -> Vec<String> {
    let mut inside = false;
    let mut hosts = Vec::new();
    for line in contents.lines() {
        match line.trim() {
            BLOCK_BEGIN => inside = true,
            BLOCK_END => inside = false,
            l if inside => {
                if let Some(host) = l.split_whitespace().nth(1) {
                    hosts.push(host.to_string());
                }
            }
            _ => {}
        }
    }
    hosts
}

/// Render the managed block for `hosts` (duplicates and blanks dropped).
pub fn render_block<S: AsRef<str>>(hosts: &[S]) -> String {
    let mut block = String::new();
    block.push_str(BLOCK_BEGIN);
    block.push('\n');
    let mut seen = std::collections::HashSet::new();
    for host in hosts {
        let host = host.as_ref().trim();
        if host.is_empty() || !seen.insert(host) {
            continue;
        }
        block.push_str(&format!("{BLACKHOLE_ADDR} {host}\n"));
    }
    block.push_str(BLOCK_END);
    block.push('\n');
    block
}

/// Return `contents` with any managed block replaced by one for `hosts`.
///
/// Applying this twice yields the same file. `path` is only used in
/// error messages.
pub fn add_block<S: AsRef<str>>(contents: &str, hosts: &[S], path: &str) -> Result<String> {
    let mut out = remove_block(contents, path)?;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&render_block(hosts));
    Ok(out)
}

/// Return `contents` without the managed block. Everything outside the
/// markers is kept byte-for-byte.
///
/// A begin marker without a matching end marker is an error and nothing
/// is removed.
pub fn remove_block(contents: &str, path: &str) -> Result<String> {
    if !has_block(contents) {
        return Ok(contents.to_string());
    }

    let mut out = String::with_capacity(contents.len());
    let mut inside = false;
    for line in contents.split_inclusive('\n') {
        let trimmed = line.trim();
        if !inside && trimmed == BLOCK_BEGIN {
            inside = true;
            continue;
        }
        if inside {
            if trimmed == BLOCK_END {
                inside = false;
            }
            continue;
        }
        out.push_str(line);
    }

    if inside {
        return Err(NexusError::ManagedFileError {
            path: path.to_string(),
            message: format!("'{BLOCK_BEGIN}' has no matching '{BLOCK_END}'; fix the file by hand"),
        });
    }
    Ok(out)
}
