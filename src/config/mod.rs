//! Connection configuration: normalization, defaults, validation and config documents.

pub mod connection;
pub mod defaults;
pub mod file_config;
pub mod validate;

pub use connection::{normalize, ConnectionSpec, SourceDescriptor, SourceOrigin};
pub use file_config::{FileConfig, SchemaDeclaration};
pub use validate::{validate, validate_operand, validate_path, AuthSettings, ExecutionEngine, GlobMode, Settings};
