//! Privilege checks and external commands (`apt-get`, `systemctl`).

use crate::paths::HostPaths;

/// Fail unless running as root, when writing to the live system.
pub fn require_root(paths: &HostPaths, action: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !paths.is_system_root() {
        return Ok(());
    }
    if unsafe { libc::geteuid() } != 0 {
        return Err(format!("{action} requires root privileges; re-run with sudo").into());
    }
    Ok(())
}

/// Run a command to completion, failing on a non-zero exit.
///
/// Skipped when staging under an alternate root.
pub async fn run(
    paths: &HostPaths,
    program: &str,
    args: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    if !paths.is_system_root() {
        tracing::info!(program, args = ?args, "Staging root, not running");
        return Ok(());
    }

    tracing::info!(program, args = ?args, "Running");
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| format!("Failed to run {program}: {e}"))?;

    if !status.success() {
        return Err(format!("{} {} failed: {}", program, args.join(" "), status).into());
    }
    Ok(())
}

/// Refresh APT package lists.
pub async fn apt_update(paths: &HostPaths) -> Result<(), Box<dyn std::error::Error>> {
    run(paths, "apt-get", &["update"]).await
}

/// Restart the Docker daemon so it picks up `daemon.json`.
pub async fn restart_docker(paths: &HostPaths) -> Result<(), Box<dyn std::error::Error>> {
    run(paths, "systemctl", &["restart", "docker"]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_root_skipped_for_staging() {
        let paths = HostPaths::new("/tmp/stage");
        assert!(require_root(&paths, "test").is_ok());
    }

    #[tokio::test]
    async fn test_run_skipped_for_staging() {
        let paths = HostPaths::new("/tmp/stage");
        run(&paths, "definitely-not-a-real-program", &[]).await.unwrap();
    }
}
