use thiserror::Error;

/// Convenience alias for `Result<T, FanoutError>`.
pub type FanoutResult<T> = Result<T, FanoutError>;

/// Error classification for propagation decisions.
///
/// - `RunScoped`   — aborts before any per-shard unit starts; propagated to
///   the caller directly.
/// - `ShardScoped` — caught at the unit boundary and recorded as a
///   `ShardFailure`; never aborts sibling units under the parallel or
///   cooperative strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    RunScoped,
    ShardScoped,
}

/// Shard-scoped failures surfaced by the database collaborator.
///
/// One variant per phase of the per-shard unit: connection acquisition,
/// query execution, and row draining. Payloads are plain strings so that
/// failures can be cloned into the final fan-out report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Connection failed to {target}: {reason}")]
    Connect { target: String, reason: String },

    #[error("Query execution failed for {query:?}: {reason}")]
    Execute { query: String, reason: String },

    #[error("Row read failed: {reason}")]
    RowRead { reason: String },
}

impl DriverError {
    /// Short stable name for metrics/log labels.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DriverError::Connect { .. } => "connect",
            DriverError::Execute { .. } => "execute",
            DriverError::RowRead { .. } => "row_read",
        }
    }
}

/// Run-scoped configuration errors. These abort before any unit starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid shard count: {0} (must be >= 0)")]
    InvalidShardCount(i64),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error type that all crate-specific errors convert into.
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FanoutError {
    /// Classify this error for propagation decisions.
    pub fn scope(&self) -> ErrorScope {
        match self {
            FanoutError::Driver(_) => ErrorScope::ShardScoped,
            FanoutError::Config(_) => ErrorScope::RunScoped,
            FanoutError::Internal(_) => ErrorScope::RunScoped,
        }
    }

    /// Returns true if this error is caught at the unit boundary.
    pub fn is_shard_scoped(&self) -> bool {
        matches!(self.scope(), ErrorScope::ShardScoped)
    }

    /// Returns true if this error aborts the run before any unit starts.
    pub fn is_run_scoped(&self) -> bool {
        matches!(self.scope(), ErrorScope::RunScoped)
    }
}

#[cfg(test)]
mod error_classification {
    use super::*;

    #[test]
    fn test_driver_errors_are_shard_scoped() {
        let e: FanoutError = DriverError::Connect {
            target: "server=a;".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(e.scope(), ErrorScope::ShardScoped);
        assert!(e.is_shard_scoped());
        assert!(!e.is_run_scoped());
    }

    #[test]
    fn test_config_errors_are_run_scoped() {
        let e: FanoutError = ConfigError::InvalidShardCount(-1).into();
        assert_eq!(e.scope(), ErrorScope::RunScoped);
        assert!(e.is_run_scoped());
    }

    #[test]
    fn test_internal_is_run_scoped() {
        let e = FanoutError::Internal("runtime build failed".into());
        assert_eq!(e.scope(), ErrorScope::RunScoped);
    }

    #[test]
    fn test_kind_names() {
        let connect = DriverError::Connect {
            target: "t".into(),
            reason: "r".into(),
        };
        let execute = DriverError::Execute {
            query: "select 1".into(),
            reason: "r".into(),
        };
        let row_read = DriverError::RowRead { reason: "r".into() };
        assert_eq!(connect.kind_name(), "connect");
        assert_eq!(execute.kind_name(), "execute");
        assert_eq!(row_read.kind_name(), "row_read");
    }

    #[test]
    fn test_driver_error_is_cloneable_into_reports() {
        let e = DriverError::RowRead {
            reason: "stream reset".into(),
        };
        let copy = e.clone();
        assert_eq!(e, copy);
    }

    #[test]
    fn test_display_messages() {
        let e = DriverError::Execute {
            query: "select value from t".into(),
            reason: "table missing".into(),
        };
        let s = e.to_string();
        assert!(s.contains("select value from t"));
        assert!(s.contains("table missing"));

        let c = ConfigError::InvalidShardCount(-3);
        assert!(c.to_string().contains("-3"));
    }
}
