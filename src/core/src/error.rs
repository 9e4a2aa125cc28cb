use thiserror::Error;

/// nexus-route error types
#[derive(Error, Debug)]
pub enum NexusError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Proxy prefix is not a bare host[:port]
    #[error("Invalid proxy prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    /// Host distribution cannot be routed through the APT proxy
    #[error("Unsupported distribution: {id}")]
    UnsupportedDistro { id: String },

    /// A managed file exists but cannot be merged
    #[error("Cannot update {path}: {message}")]
    ManagedFileError { path: String, message: String },

    /// Backup or restore failed
    #[error("Backup error: {path} - {message}")]
    BackupError { path: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for NexusError {
    fn from(err: serde_json::Error) -> Self {
        NexusError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for NexusError {
    fn from(err: serde_yaml::Error) -> Self {
        NexusError::SerializationError(err.to_string())
    }
}

/// Result type alias for nexus-route operations
pub type Result<T> = std::result::Result<T, NexusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = NexusError::ConfigError("nexus_url is required".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: nexus_url is required"
        );
    }

    #[test]
    fn test_invalid_prefix_display() {
        let error = NexusError::InvalidPrefix {
            prefix: "nexus.example.com/docker".to_string(),
            reason: "must not contain a path".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid proxy prefix 'nexus.example.com/docker': must not contain a path"
        );
    }

    #[test]
    fn test_unsupported_distro_display() {
        let error = NexusError::UnsupportedDistro {
            id: "fedora".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported distribution: fedora");
    }

    #[test]
    fn test_managed_file_error_display() {
        let error = NexusError::ManagedFileError {
            path: "/etc/docker/daemon.json".to_string(),
            message: "expected a JSON object".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot update /etc/docker/daemon.json: expected a JSON object"
        );
    }

    #[test]
    fn test_backup_error_display() {
        let error = NexusError::BackupError {
            path: "/etc/pip.conf".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Backup error: /etc/pip.conf - permission denied"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: NexusError = io_error.into();
        assert!(matches!(error, NexusError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let error: NexusError = result.unwrap_err().into();
        assert!(matches!(error, NexusError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: NexusError = result.unwrap_err().into();
        assert!(matches!(error, NexusError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = NexusError::Other("something went wrong".to_string());
        assert_eq!(error.to_string(), "something went wrong");
    }
}
