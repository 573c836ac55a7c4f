//! State shared by every connection a driver makes: the dedup registry, counters, the cached
//! capability outcome, factories and the optional storage collaborators. Created once by the
//! caller and passed by reference.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capability::{Capability, CapabilityProbe};
use crate::discovery::object_store::ObjectLister;
use crate::factory::{FactorySet, SchemaFactory};
use crate::metrics::DriverMetrics;
use crate::registry::SchemaRegistry;
use crate::views::RemoteFetcher;

pub struct DriverContext {
    registry: SchemaRegistry,
    metrics: DriverMetrics,
    capability: Arc<Capability>,
    factories: FactorySet,
    lister: Option<Arc<dyn ObjectLister>>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    working_dir: PathBuf,
}

impl DriverContext {
    /// Context whose sources are all read by `generic`; the working directory is the process's.
    pub fn new(generic: Arc<dyn SchemaFactory>) -> Self {
        Self {
            registry: SchemaRegistry::new(),
            metrics: DriverMetrics::new(),
            capability: Arc::new(Capability::default()),
            factories: FactorySet::new(generic),
            lister: None,
            fetcher: None,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Replace the capability probe. Call before `with_accelerated`, which binds the current one.
    pub fn with_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.capability = Arc::new(Capability::new(probe));
        self
    }

    pub fn with_accelerated(mut self, accelerated: Arc<dyn SchemaFactory>) -> Self {
        self.factories = self.factories.with_accelerated(accelerated, self.capability.clone());
        self
    }

    pub fn with_factory(mut self, selector: impl Into<String>, factory: Arc<dyn SchemaFactory>) -> Self {
        self.factories = self.factories.with_named(selector, factory);
        self
    }

    pub fn with_object_lister(mut self, lister: Arc<dyn ObjectLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn registry(&self) -> &SchemaRegistry { &self.registry }
    pub fn metrics(&self) -> &DriverMetrics { &self.metrics }
    pub fn capability(&self) -> &Capability { &self.capability }
    pub fn factories(&self) -> &FactorySet { &self.factories }
    pub fn object_lister(&self) -> Option<&dyn ObjectLister> { self.lister.as_deref() }
    pub fn fetcher(&self) -> Option<&dyn RemoteFetcher> { self.fetcher.as_deref() }
    pub fn working_dir(&self) -> &Path { &self.working_dir }
}
