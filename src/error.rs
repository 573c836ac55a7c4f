//! Unified driver error model.
//! Every failure that reaches the caller of `FileDriver::connect` is one of these variants,
//! each carrying a stable machine-readable code plus a human message, and mapping to a
//! five-character SQL state for connection-provider frontends.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverError {
    /// Invalid, out-of-range or unknown option value. Raised before any I/O.
    #[error("{code}: {message}")]
    Configuration { code: String, message: String },
    /// Path traversal or null-byte path. Always fatal to the attempt.
    #[error("{code}: {message}")]
    Security { code: String, message: String },
    /// Glob or listing failure on one source. Normally swallowed and logged.
    #[error("{code}: {message}")]
    Discovery { code: String, message: String },
    /// Accelerated factory unusable. Never surfaced from `connect`.
    #[error("{code}: {message}")]
    NativeCapabilityUnavailable { code: String, message: String },
    /// Views or materializations failed to load. Logged, connection proceeds.
    #[error("{code}: {message}")]
    OptionalFeature { code: String, message: String },
    /// A requested source could not be realized by its table-source factory.
    #[error("{code}: {message}")]
    SchemaSetup { code: String, message: String },
    #[error("{code}: {message}")]
    Internal { code: String, message: String },
}

impl DriverError {
    pub fn code_str(&self) -> &str {
        match self {
            DriverError::Configuration { code, .. }
            | DriverError::Security { code, .. }
            | DriverError::Discovery { code, .. }
            | DriverError::NativeCapabilityUnavailable { code, .. }
            | DriverError::OptionalFeature { code, .. }
            | DriverError::SchemaSetup { code, .. }
            | DriverError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DriverError::Configuration { message, .. }
            | DriverError::Security { message, .. }
            | DriverError::Discovery { message, .. }
            | DriverError::NativeCapabilityUnavailable { message, .. }
            | DriverError::OptionalFeature { message, .. }
            | DriverError::SchemaSetup { message, .. }
            | DriverError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn config<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::Configuration { code: code.into(), message: msg.into() } }
    pub fn security<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::Security { code: code.into(), message: msg.into() } }
    pub fn discovery<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::Discovery { code: code.into(), message: msg.into() } }
    pub fn native_unavailable<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::NativeCapabilityUnavailable { code: code.into(), message: msg.into() } }
    pub fn optional<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::OptionalFeature { code: code.into(), message: msg.into() } }
    pub fn setup<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::SchemaSetup { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DriverError::Internal { code: code.into(), message: msg.into() } }

    /// Stable SQL state for connection-provider frontends.
    pub fn sql_state(&self) -> &'static str {
        match self {
            DriverError::Configuration { .. } => "22023",               // invalid_parameter_value
            DriverError::Security { .. } => "42501",                    // insufficient_privilege
            DriverError::Discovery { .. } => "58030",                   // io_error
            DriverError::NativeCapabilityUnavailable { .. } => "0A000", // feature_not_supported
            DriverError::OptionalFeature { .. } => "01000",             // warning
            DriverError::SchemaSetup { .. } => "08001",                 // sqlclient_unable_to_establish_sqlconnection
            DriverError::Internal { .. } => "XX000",                    // internal_error
        }
    }

    /// Return (sqlstate, severity, message)
    pub fn sql_state_fields(&self) -> (&'static str, &'static str, String) {
        let msg = self.message().to_string();
        let severity = match self {
            DriverError::OptionalFeature { .. } | DriverError::NativeCapabilityUnavailable { .. } => "WARNING",
            DriverError::Security { .. } => "FATAL",
            _ => "ERROR",
        };
        (self.sql_state(), severity, msg)
    }

    /// Errors that make the requested contract unsatisfiable; the rest are degraded locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Configuration { .. } | DriverError::Security { .. } | DriverError::SchemaSetup { .. } | DriverError::Internal { .. }
        )
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

impl From<anyhow::Error> for DriverError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping for collaborator failures that were not classified at the call site
        DriverError::Internal { code: "internal_error".into(), message: format!("{:#}", err) }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
