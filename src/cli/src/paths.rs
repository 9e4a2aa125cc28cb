//! Host file locations, optionally staged under an alternate root.

use std::path::{Component, Path, PathBuf};

/// Where nexus-route reads and writes host configuration.
///
/// With the default root `/` these are the real system paths. Any other
/// root stages every file underneath it and disables privileged actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    root: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HostPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether paths target the live system rather than a staging root.
    ///
    /// `--root /tmp/..` or a symlink to `/` still counts as the system.
    pub fn is_system_root(&self) -> bool {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| normalize(&self.root));
        root == Path::new("/")
    }

    /// Map an absolute system path under the root.
    pub fn resolve(&self, absolute: impl AsRef<Path>) -> PathBuf {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix("/").unwrap_or(absolute);
        self.root.join(relative)
    }

    pub fn config_file(&self) -> PathBuf {
        self.resolve(nexus_route_core::config::DEFAULT_CONFIG_PATH)
    }

    pub fn os_release(&self) -> PathBuf {
        self.resolve("/etc/os-release")
    }

    pub fn sources_list(&self) -> PathBuf {
        self.resolve("/etc/apt/sources.list")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.resolve("/etc/apt/sources.list.d")
    }

    pub fn pip_conf(&self) -> PathBuf {
        self.resolve("/etc/pip.conf")
    }

    /// Per-user pip config (`~/.config/pip/pip.conf`).
    pub fn user_pip_conf(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| self.resolve(d.join("pip").join("pip.conf")))
    }

    pub fn daemon_json(&self) -> PathBuf {
        self.resolve("/etc/docker/daemon.json")
    }

    pub fn hosts(&self) -> PathBuf {
        self.resolve("/etc/hosts")
    }

    /// Wrapper symlink; precedes `/usr/bin` on the default PATH.
    pub fn wrapper_link(&self) -> PathBuf {
        self.resolve("/usr/local/bin/docker")
    }
}

/// Lexically fold `.` and `..` for paths that do not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
