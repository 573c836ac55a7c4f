//! Table-source factory seam and the accelerated/generic fallback.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::capability::{Capability, ProbeOutcome};
use crate::format::FormatTag;
use crate::operand::Operand;
use crate::schema::{Schema, SchemaPlus};

pub const FILE_FACTORY: &str = "file";
pub const COLUMNAR_FACTORY: &str = "columnar";

/// Turns an operand into a schema of one or more tables. Implemented by the format readers.
pub trait SchemaFactory: Send + Sync {
    fn create(&self, parent: &SchemaPlus, name: &str, operand: &Operand) -> Result<Arc<dyn Schema>>;
}

/// Accelerated factory guarded by the capability probe, with the generic factory behind it.
/// Absence of the native library, or any failure of the accelerated factory, hands the same
/// operand to the generic factory.
pub struct FallbackFactory {
    accelerated: Arc<dyn SchemaFactory>,
    generic: Arc<dyn SchemaFactory>,
    capability: Arc<Capability>,
}

impl FallbackFactory {
    pub fn new(accelerated: Arc<dyn SchemaFactory>, generic: Arc<dyn SchemaFactory>, capability: Arc<Capability>) -> Self {
        Self { accelerated, generic, capability }
    }
}

impl SchemaFactory for FallbackFactory {
    fn create(&self, parent: &SchemaPlus, name: &str, operand: &Operand) -> Result<Arc<dyn Schema>> {
        match self.capability.outcome() {
            ProbeOutcome::Unavailable => {
                debug!(target: "filedriver::capability", schema = name, "using generic factory");
                self.generic.create(parent, name, operand)
            }
            ProbeOutcome::Indeterminate(why) => Err(anyhow!("native acceleration library present but unusable: {}", why)),
            ProbeOutcome::Available => match self.accelerated.create(parent, name, operand) {
                Ok(schema) => Ok(schema),
                Err(e) => {
                    warn!(target: "filedriver::capability", schema = name, error = %format!("{:#}", e), "accelerated factory failed; falling back to generic factory");
                    self.generic.create(parent, name, operand)
                }
            },
        }
    }
}

/// Factories known to a driver, addressable by selector name.
#[derive(Clone)]
pub struct FactorySet {
    generic: Arc<dyn SchemaFactory>,
    columnar: Arc<dyn SchemaFactory>,
    named: BTreeMap<String, Arc<dyn SchemaFactory>>,
}

impl FactorySet {
    /// Generic factory only; columnar sources also use it.
    pub fn new(generic: Arc<dyn SchemaFactory>) -> Self {
        Self { columnar: generic.clone(), generic, named: BTreeMap::new() }
    }

    /// Route columnar sources through `accelerated`, guarded by `capability`.
    pub fn with_accelerated(mut self, accelerated: Arc<dyn SchemaFactory>, capability: Arc<Capability>) -> Self {
        self.columnar = Arc::new(FallbackFactory::new(accelerated, self.generic.clone(), capability));
        self
    }

    pub fn with_named(mut self, selector: impl Into<String>, factory: Arc<dyn SchemaFactory>) -> Self {
        self.named.insert(selector.into(), factory);
        self
    }

    pub fn generic(&self) -> &Arc<dyn SchemaFactory> { &self.generic }

    pub fn columnar(&self) -> &Arc<dyn SchemaFactory> { &self.columnar }

    /// Factory for a source of the given format.
    pub fn for_format(&self, format: Option<FormatTag>) -> &Arc<dyn SchemaFactory> {
        match format {
            Some(f) if f.is_columnar() => &self.columnar,
            _ => &self.generic,
        }
    }

    /// Resolve a config-document selector. `file` and `columnar` are built in; caller-registered
    /// names take precedence.
    pub fn by_selector(&self, selector: &str) -> Option<&Arc<dyn SchemaFactory>> {
        if let Some(f) = self.named.get(selector) {
            return Some(f);
        }
        match selector.to_ascii_lowercase().as_str() {
            FILE_FACTORY => Some(&self.generic),
            COLUMNAR_FACTORY | "arrow" | "parquet" => Some(&self.columnar),
            _ => None,
        }
    }

    pub fn selectors(&self) -> Vec<String> {
        let mut out = vec![FILE_FACTORY.to_string(), COLUMNAR_FACTORY.to_string()];
        out.extend(self.named.keys().cloned());
        out
    }
}
