//! File-backed table driver: resolves `file:` connection locators into a schema tree whose
//! tables are produced by pluggable table-source factories.

pub mod assembler;
pub mod capability;
pub mod config;
pub mod context;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod factory;
pub mod format;
pub mod locator;
pub mod metrics;
pub mod operand;
pub mod options;
pub mod registry;
pub mod schema;
pub mod views;

pub use capability::{Capability, CapabilityProbe, ProbeOutcome, SharedLibraryProbe, StaticProbe};
pub use context::DriverContext;
pub use driver::{Connection, FileDriver};
pub use error::{DriverError, DriverResult};
pub use factory::{FactorySet, FallbackFactory, SchemaFactory};
pub use format::FormatTag;
pub use locator::Locator;
pub use operand::Operand;
pub use options::OptionBag;
pub use schema::{Casing, CasingPolicy, Schema, SchemaPlus, Table};
