//! Connection entry point: locator + options in, root schema with every source registered out.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::assembler::{prepare_materializations, single_glob_name, Assembler};
use crate::config::connection::{normalize, ConnectionSpec, SourceDescriptor};
use crate::config::file_config::FileConfig;
use crate::config::validate::{validate, validate_operand, GlobMode, Settings};
use crate::context::DriverContext;
use crate::discovery::glob::{self, split_base_pattern};
use crate::discovery::naming::derive_all;
use crate::discovery::object_store::resolve_objects;
use crate::error::{DriverError, DriverResult};
use crate::format::{self, FormatTag};
use crate::locator::{Locator, StorageScheme};
use crate::metrics::MetricsSnapshot;
use crate::operand::{self, promote_region, Operand};
use crate::options::OptionBag;
use crate::registry::DedupKey;
use crate::schema::casing::CasingPolicy;
use crate::schema::{Schema, SchemaPlus};
use crate::views::{load_views_file, parse_inline_materializations, parse_inline_views, ViewsDocument};

/// An assembled connection: a root holding one schema per declared source.
#[derive(Debug)]
pub struct Connection {
    root: Arc<SchemaPlus>,
    default_schema: String,
    locator: String,
}

impl Connection {
    pub fn root(&self) -> &Arc<SchemaPlus> { &self.root }

    /// Schema that unqualified names resolve against.
    pub fn default_schema(&self) -> &str { &self.default_schema }

    pub fn locator(&self) -> &str { &self.locator }

    pub fn schema(&self, name: &str) -> Option<Arc<SchemaPlus>> { self.root.get_sub_schema(name) }

    /// Table names of the default schema; empty when it was never registered.
    pub fn table_names(&self) -> Vec<String> {
        self.schema(&self.default_schema).map(|s| s.table_names()).unwrap_or_default()
    }
}

pub struct FileDriver {
    ctx: DriverContext,
}

impl FileDriver {
    pub fn new(ctx: DriverContext) -> Self { Self { ctx } }

    /// Whether `locator` is addressed to this driver.
    pub fn accepts(&self, locator: &str) -> bool { Locator::accepts(locator) }

    pub fn context(&self) -> &DriverContext { &self.ctx }

    pub fn metrics(&self) -> MetricsSnapshot { self.ctx.metrics().snapshot(self.ctx.registry().len()) }

    pub fn connect(&self, locator: &str, options: &OptionBag) -> DriverResult<Connection> {
        let started = Instant::now();
        self.ctx.metrics().record_connection(self.ctx.registry().len());
        let result = self.try_connect(locator, options, started);
        if let Err(e) = &result {
            self.ctx.metrics().record_error();
            warn!(target: "filedriver::locator", locator, code = e.code_str(), error = %e, "connection failed");
        }
        result
    }

    fn try_connect(&self, locator: &str, options: &OptionBag, started: Instant) -> DriverResult<Connection> {
        let parsed = Locator::parse(locator)?;
        debug!(target: "filedriver::locator", kind = parsed.kind(), locator = %parsed.describe(), "parsed locator");
        let spec = normalize(parsed, options, self.ctx.working_dir())?;

        let settings = validate(&spec)?;
        if let Some(path) = spec.config_path.as_deref() {
            return self.connect_config(locator, path, &settings, started);
        }

        promote_region(settings.auth.aws_region.as_deref());
        let root = SchemaPlus::root();
        let views = self.collect_views(&settings);
        let (schema, label) = self.assemble_sources(&root, &spec, &settings, &views)?;

        let assembler = Assembler::new(&self.ctx, &root);
        assembler.register_views(&schema, &views.views);
        assembler.register_materializations(&schema, &views.materializations);

        self.ctx.metrics().record_setup(&label, started.elapsed().as_millis());
        info!(target: "filedriver::assemble", schema = %settings.schema_name, tables = schema.table_names().len(), source = %label, "connection ready");
        Ok(Connection { root, default_schema: settings.schema_name, locator: locator.to_string() })
    }

    /// Dispatch on the source shape; returns the registered schema and a metrics label.
    fn assemble_sources(&self, root: &SchemaPlus, spec: &ConnectionSpec, settings: &Settings, views: &ViewsDocument) -> DriverResult<(Arc<SchemaPlus>, String)> {
        let assembler = Assembler::new(&self.ctx, root);
        let name = settings.schema_name.as_str();
        let decorate = settings.casing;
        // The factory folds identifiers itself under the default policy; any other policy is
        // applied by the decorator over unchanged names.
        let operand_casing = if decorate.needs_wrapping() { CasingPolicy::unchanged() } else { decorate };
        let finish = |op: Operand| prepare_materializations(op.with_casing(operand_casing), &views.materializations);

        let primary = spec.primary().ok_or_else(|| DriverError::config("missing_source", "connection names no source"))?;

        match &spec.locator {
            Locator::Multi { .. } => {
                let entries: Vec<(String, String, FormatTag)> = spec
                    .sources
                    .iter()
                    .map(|s| (s.table_name_hint.clone().unwrap_or_else(|| "table".to_string()), s.location.clone(), settings.format.unwrap_or(s.format)))
                    .collect();
                let joined = spec.sources.iter().map(|s| s.location.as_str()).collect::<Vec<_>>().join("|");
                let op = finish(operand::multi_operand(&entries, settings));
                let key = DedupKey::new(name, joined, "");
                let done = assembler.assemble(key, decorate, |parent| create(self.ctx.factories().generic().as_ref(), parent, name, &op, "multi"))?;
                Ok((done.schema, "multi".to_string()))
            }
            Locator::ObjectStore { scheme, bucket, key, .. } if glob::is_glob(key) => {
                let split = split_base_pattern(key);
                let base_url = object_base_url(*scheme, bucket, &split.base);
                let dedup = DedupKey::new(name, base_url.clone(), split.pattern.clone());
                if settings.glob_mode == GlobMode::SingleTable {
                    return self.single_glob(&assembler, dedup, primary, settings, decorate, &finish);
                }
                let done = assembler.assemble(dedup, decorate, |parent| {
                    let matches = match self.ctx.object_lister() {
                        Some(lister) => resolve_objects(lister, *scheme, bucket, &split.base, &split.pattern),
                        None => {
                            warn!(target: "filedriver::discovery", bucket = %bucket, "no object lister configured; glob has no matches");
                            Vec::new()
                        }
                    };
                    let named = derive_all(&matches, &base_url)?;
                    assembler.build_glob_schema(parent, name, &named, settings)
                })?;
                Ok((done.schema, "glob".to_string()))
            }
            Locator::Local { .. } if primary.is_glob() => {
                let split = split_base_pattern(&primary.location);
                let dedup = DedupKey::new(name, split.base.clone(), split.pattern.clone());
                if settings.glob_mode == GlobMode::SingleTable {
                    return self.single_glob(&assembler, dedup, primary, settings, decorate, &finish);
                }
                let done = assembler.assemble(dedup, decorate, |parent| {
                    let matches: Vec<String> = glob::resolve_local(Path::new(&split.base), &split.pattern)
                        .into_iter()
                        .map(|p| p.to_string_lossy().replace('\\', "/"))
                        .collect();
                    let named = derive_all(&matches, &split.base)?;
                    assembler.build_glob_schema(parent, name, &named, settings)
                })?;
                Ok((done.schema, "glob".to_string()))
            }
            Locator::Local { .. } if Path::new(&primary.location).is_dir() => {
                let op = finish(operand::directory_operand(&primary.location, settings.format, settings));
                let factory = self.ctx.factories().for_format(settings.format).clone();
                let key = DedupKey::new(name, primary.location.clone(), "");
                let done = assembler.assemble(key, decorate, |parent| create(factory.as_ref(), parent, name, &op, &primary.location))?;
                Ok((done.schema, "directory".to_string()))
            }
            Locator::Local { .. } => {
                let fmt = settings.format.unwrap_or(primary.format);
                let table = primary.table_name_hint.clone().unwrap_or_else(|| "table".to_string());
                let op = finish(operand::file_operand(&primary.location, &table, fmt, settings));
                let factory = self.ctx.factories().for_format(Some(fmt)).clone();
                let key = DedupKey::new(name, primary.location.clone(), "");
                let done = assembler.assemble(key, decorate, |parent| create(factory.as_ref(), parent, name, &op, &primary.location))?;
                Ok((done.schema, fmt.as_str().to_string()))
            }
            Locator::Remote { .. } | Locator::ObjectStore { .. } => {
                let fmt = settings.format.unwrap_or(primary.format);
                let table = primary.table_name_hint.clone().unwrap_or_else(|| "remote_table".to_string());
                let op = finish(operand::remote_operand(&primary.location, &table, fmt, settings));
                let factory = self.ctx.factories().for_format(Some(fmt)).clone();
                let key = DedupKey::new(name, primary.location.clone(), "");
                let done = assembler.assemble(key, decorate, |parent| create(factory.as_ref(), parent, name, &op, &primary.location))?;
                Ok((done.schema, fmt.as_str().to_string()))
            }
            Locator::ConfigFile { .. } => Err(DriverError::internal("unexpected_locator", "config locators are handled before source dispatch")),
        }
    }

    fn single_glob<F>(&self, assembler: &Assembler<'_>, key: DedupKey, source: &SourceDescriptor, settings: &Settings, decorate: CasingPolicy, finish: &F) -> DriverResult<(Arc<SchemaPlus>, String)>
    where
        F: Fn(Operand) -> Operand,
    {
        let name = settings.schema_name.as_str();
        let table = settings.table.clone().unwrap_or_else(|| single_glob_name(&source.location));
        let fmt = settings.format.unwrap_or_else(|| format::detect(&source.location));
        let op = finish(operand::single_glob_operand(&source.location, &table, fmt, settings));
        let factory = self.ctx.factories().for_format(Some(fmt)).clone();
        let done = assembler.assemble(key, decorate, |parent| create(factory.as_ref(), parent, name, &op, &source.location))?;
        Ok((done.schema, "glob".to_string()))
    }

    /// Inline views, inline materializations and the views file, merged. A source that fails to
    /// load is logged and contributes nothing.
    fn collect_views(&self, settings: &Settings) -> ViewsDocument {
        let mut doc = ViewsDocument::default();
        if let Some(raw) = &settings.views {
            match parse_inline_views(raw) {
                Ok(v) => doc.views.extend(v),
                Err(e) => warn!(target: "filedriver::views", error = %format!("{:#}", e), "ignoring inline views"),
            }
        }
        if let Some(raw) = &settings.materializations {
            match parse_inline_materializations(raw) {
                Ok(m) => doc.materializations.extend(m),
                Err(e) => warn!(target: "filedriver::views", error = %format!("{:#}", e), "ignoring inline materializations"),
            }
        }
        if let Some(file) = &settings.views_file {
            match load_views_file(file, self.ctx.working_dir(), self.ctx.fetcher()) {
                Ok(d) => {
                    doc.views.extend(d.views);
                    doc.materializations.extend(d.materializations);
                }
                Err(e) => warn!(target: "filedriver::views", file = %file, error = %format!("{:#}", e), "ignoring views file"),
            }
        }
        doc
    }

    fn connect_config(&self, locator: &str, path: &str, settings: &Settings, started: Instant) -> DriverResult<Connection> {
        let cfg = FileConfig::load(Path::new(path)).map_err(|e| DriverError::config("invalid_config_file", format!("{:#}", e)))?;

        let decorate = cfg.casing(settings.casing);
        let operand_casing = if decorate.needs_wrapping() { CasingPolicy::unchanged() } else { decorate };

        // Every declaration is resolved and checked before the first factory runs.
        let mut planned = Vec::with_capacity(cfg.schemas.len());
        for decl in &cfg.schemas {
            let factory = self.ctx.factories().by_selector(decl.selector()).cloned().ok_or_else(|| {
                DriverError::config(
                    "unknown_factory",
                    format!("schema '{}' names unknown factory '{}'; known: {}", decl.name, decl.selector(), self.ctx.factories().selectors().join(", ")),
                )
            })?;
            let op = cfg.effective_operand(decl).map_err(|e| DriverError::config("invalid_operand", format!("{:#}", e)))?;
            validate_operand(&op).inspect_err(|e| {
                warn!(target: "filedriver::config", schema = %decl.name, code = e.code_str(), "declared operand rejected");
            })?;
            let op = if op.table_name_casing.is_some() || op.column_name_casing.is_some() { op } else { op.with_casing(operand_casing) };
            planned.push((decl, factory, op));
        }

        promote_region(cfg.aws_region.as_deref());
        let root = SchemaPlus::root();
        let assembler = Assembler::new(&self.ctx, &root);
        for (decl, factory, op) in planned {
            let materializations = op.materializations.clone();
            let views = op.views.clone();
            let op = prepare_materializations(op, &materializations);

            let key = DedupKey::new(decl.name.clone(), path, "");
            let done = assembler.assemble(key, decorate, |parent| create(factory.as_ref(), parent, &decl.name, &op, path))?;
            assembler.register_views(&done.schema, &views);
            assembler.register_materializations(&done.schema, &materializations);
        }

        self.ctx.metrics().record_setup("config", started.elapsed().as_millis());
        info!(target: "filedriver::assemble", path, schemas = cfg.schemas.len(), default_schema = %cfg.default_schema, "connection ready from config document");
        Ok(Connection { root, default_schema: cfg.default_schema, locator: locator.to_string() })
    }
}

fn create(factory: &dyn crate::factory::SchemaFactory, parent: &SchemaPlus, name: &str, op: &Operand, source: &str) -> DriverResult<Arc<dyn Schema>> {
    factory
        .create(parent, name, op)
        .map_err(|e| DriverError::setup("schema_setup_failed", format!("failed to create schema '{}' from {}: {:#}", name, source, e)))
}

fn object_base_url(scheme: StorageScheme, bucket: &str, base: &str) -> String {
    let b = base.trim_matches('/');
    if b.is_empty() || b == "." { format!("{}://{}", scheme.as_str(), bucket) } else { format!("{}://{}/{}", scheme.as_str(), bucket, b) }
}
