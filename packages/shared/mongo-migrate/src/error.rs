use std::time::Duration;

/// Errors surfaced by the migration framework itself.
///
/// Migration bodies return `anyhow::Result` for flexibility; failures are
/// wrapped into [`MigrationError::Failed`] at the runner boundary.
#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("BSON decode error: {0}")]
    Bson(#[from] bson::de::Error),

    #[error("migration version {version} not found in the registry")]
    NotFound { version: u32 },

    #[error("migration version {version} is already applied")]
    AlreadyApplied { version: u32 },

    #[error("migration version {version} is not applied, cannot roll back")]
    NotApplied { version: u32 },

    #[error("migration {version} failed")]
    Failed {
        version: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("migration {version} validation failed")]
    ValidationFailed {
        version: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("migration {version} timed out after {timeout:?}")]
    Timeout { version: u32, timeout: Duration },

    #[error("migration sequence error: {0}")]
    Sequence(String),

    #[error(
        "fingerprint drift for migration {version}: recorded {recorded:?}, registered {registered:?}"
    )]
    FingerprintDrift {
        version: u32,
        recorded: Option<String>,
        registered: Option<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for migration framework operations
pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrationError::NotFound { version: 7 };
        assert_eq!(err.to_string(), "migration version 7 not found in the registry");

        let err = MigrationError::Sequence("gap after 2".to_string());
        assert!(err.to_string().contains("gap after 2"));
    }

    #[test]
    fn test_fingerprint_drift_display() {
        let err = MigrationError::FingerprintDrift {
            version: 1,
            recorded: Some("users-v1".to_string()),
            registered: Some("users-v2".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("users-v1"));
        assert!(msg.contains("users-v2"));
    }
}
