//! Locator normalization: locator + option bag -> `ConnectionSpec`.
//! Pure string work. Relative local paths are joined onto the supplied working directory but
//! never canonicalised, so traversal segments survive for the validator to judge.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::defaults;
use crate::discovery::glob::is_glob;
use crate::error::DriverResult;
use crate::format::{self, FormatTag};
use crate::locator::{leaf_stem, Locator, RemoteScheme, StorageScheme};
use crate::options::OptionBag;

/// Where a source lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceOrigin {
    Local,
    Remote { scheme: RemoteScheme },
    ObjectStore { scheme: StorageScheme },
}

impl SourceOrigin {
    pub fn is_remote(&self) -> bool { !matches!(self, SourceOrigin::Local) }
}

/// One location to be turned into tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub location: String,
    pub origin: SourceOrigin,
    /// Detected from the location suffix; directories are re-dispatched per file later.
    pub format: FormatTag,
    pub table_name_hint: Option<String>,
}

impl SourceDescriptor {
    pub fn is_glob(&self) -> bool { is_glob(&self.location) }
}

/// Normalized connection request, immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub locator: Locator,
    /// Defaults < caller options < locator parameters, with camel/snake aliases mirrored.
    pub options: OptionBag,
    pub sources: Vec<SourceDescriptor>,
    /// Resolved document path for config-file locators.
    pub config_path: Option<String>,
}

impl ConnectionSpec {
    pub fn option(&self, key: &str) -> Option<&str> { self.options.get_non_empty(key) }

    pub fn is_multi(&self) -> bool { matches!(self.locator, Locator::Multi { .. }) }

    pub fn primary(&self) -> Option<&SourceDescriptor> { self.sources.first() }

    /// Local paths named by this request, for path-safety checks.
    pub fn local_paths(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter(|s| s.origin == SourceOrigin::Local)
            .map(|s| s.location.as_str())
            .chain(self.config_path.as_deref())
    }
}

/// Build the `ConnectionSpec` for one connection attempt.
pub fn normalize(locator: Locator, options: &OptionBag, cwd: &Path) -> DriverResult<ConnectionSpec> {
    let mut bag = options.clone();
    bag.overlay_pairs(locator.params());
    let table_override = bag.get_non_empty("table").map(str::to_string);

    let (sources, config_path) = match &locator {
        Locator::Local { path, .. } => {
            defaults::apply_spill_defaults(&mut bag);
            let resolved = resolve_local(path, cwd);
            let hint = if is_glob(&resolved) { table_override.clone() } else { leaf_stem(&resolved) };
            (vec![local_source(resolved, hint)], None)
        }
        Locator::Remote { scheme, url, .. } => {
            defaults::apply_remote_defaults(&mut bag);
            let hint = table_override.clone().or_else(|| leaf_stem(url)).unwrap_or_else(|| "remote_table".to_string());
            (vec![SourceDescriptor { location: url.clone(), origin: SourceOrigin::Remote { scheme: *scheme }, format: format::detect(url), table_name_hint: Some(hint) }], None)
        }
        Locator::ObjectStore { scheme, bucket, key, .. } => {
            let url = format!("{}://{}/{}", scheme.as_str(), bucket, key);
            if is_glob(key) { defaults::apply_spill_defaults(&mut bag) } else { defaults::apply_remote_defaults(&mut bag) }
            bag.set_if_absent("storageType", scheme.storage_type());
            let hint = if is_glob(key) { table_override.clone() } else { table_override.clone().or_else(|| leaf_stem(&url)) };
            (vec![SourceDescriptor { location: url.clone(), origin: SourceOrigin::ObjectStore { scheme: *scheme }, format: format::detect(&url), table_name_hint: hint }], None)
        }
        Locator::Multi { locations, .. } => {
            defaults::apply_spill_defaults(&mut bag);
            let sources = locations.iter().map(|loc| multi_source(loc, cwd)).collect();
            (sources, None)
        }
        Locator::ConfigFile { path, .. } => (Vec::new(), Some(resolve_local(path, cwd))),
    };

    debug!(target: "filedriver::locator", kind = locator.kind(), sources = sources.len(), "normalized locator");
    Ok(ConnectionSpec { locator, options: bag.with_aliases(), sources, config_path })
}

fn local_source(location: String, hint: Option<String>) -> SourceDescriptor {
    let format = format::detect(&location);
    SourceDescriptor { location, origin: SourceOrigin::Local, format, table_name_hint: hint }
}

fn multi_source(location: &str, cwd: &Path) -> SourceDescriptor {
    let hint = Some(leaf_stem(location).unwrap_or_else(|| "table".to_string()));
    let lower = location.to_ascii_lowercase();
    for scheme in [RemoteScheme::Https, RemoteScheme::Http, RemoteScheme::Ftps, RemoteScheme::Ftp, RemoteScheme::Sftp] {
        if lower.starts_with(&format!("{}://", scheme.as_str())) {
            return SourceDescriptor { location: location.to_string(), origin: SourceOrigin::Remote { scheme }, format: format::detect(location), table_name_hint: hint };
        }
    }
    for scheme in [StorageScheme::S3, StorageScheme::Gs, StorageScheme::Az] {
        if lower.starts_with(&format!("{}://", scheme.as_str())) {
            return SourceDescriptor { location: location.to_string(), origin: SourceOrigin::ObjectStore { scheme }, format: format::detect(location), table_name_hint: hint };
        }
    }
    let resolved = resolve_local(location, cwd);
    SourceDescriptor { format: format::detect(&resolved), location: resolved, origin: SourceOrigin::Local, table_name_hint: hint }
}

/// Join a relative path onto `cwd`. Absolute paths and drive paths are returned as written.
pub fn resolve_local(path: &str, cwd: &Path) -> String {
    let p = path.strip_prefix("file://").unwrap_or(path);
    let b = p.as_bytes();
    let drive = b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':';
    if Path::new(p).is_absolute() || p.starts_with('/') || drive {
        return p.to_string();
    }
    let rel = p.strip_prefix("./").unwrap_or(p);
    cwd.join(rel).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cwd() -> PathBuf { PathBuf::from("/work") }

    #[test]
    fn relative_local_paths_join_cwd() {
        let spec = normalize(Locator::parse("file:data/sales.csv").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        let src = spec.primary().unwrap();
        assert_eq!(src.location, "/work/data/sales.csv");
        assert_eq!(src.format, FormatTag::Csv);
        assert_eq!(src.table_name_hint.as_deref(), Some("sales"));
        assert_eq!(spec.option("batch_size"), Some("8192"));
        assert_eq!(spec.option("batchSize"), Some("8192"));
    }

    #[test]
    fn traversal_segments_survive_normalization() {
        let spec = normalize(Locator::parse("file:../secret/x.csv").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        assert_eq!(spec.primary().unwrap().location, "/work/../secret/x.csv");
    }

    #[test]
    fn query_parameters_override_options() {
        let opts = OptionBag::from_pairs([("format", "json"), ("batchSize", "5")]);
        let spec = normalize(Locator::parse("file:///d/x.csv?format=csv").unwrap(), &opts, &cwd()).unwrap();
        assert_eq!(spec.option("format"), Some("csv"));
        assert_eq!(spec.option("batch_size"), Some("5"));
    }

    #[test]
    fn remote_name_hint_and_refresh_default() {
        let spec = normalize(Locator::parse("file:https://h/p/prices.csv").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        let src = spec.primary().unwrap();
        assert!(src.origin.is_remote());
        assert_eq!(src.table_name_hint.as_deref(), Some("prices"));
        assert_eq!(spec.option("refreshInterval"), Some("5 minutes"));

        let spec = normalize(Locator::parse("file:https://h/?table=px").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        assert_eq!(spec.primary().unwrap().table_name_hint.as_deref(), Some("px"));

        let spec = normalize(Locator::parse("file:https://h/").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        assert_eq!(spec.primary().unwrap().table_name_hint.as_deref(), Some("remote_table"));
    }

    #[test]
    fn multi_sources_keep_order_and_origin() {
        let loc = Locator::parse("file:multi?locations=a/x.csv|https://h/y.json|s3://b/z.parquet").unwrap();
        let spec = normalize(loc, &OptionBag::new(), &cwd()).unwrap();
        assert!(spec.is_multi());
        let names: Vec<_> = spec.sources.iter().map(|s| s.table_name_hint.clone().unwrap()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(spec.sources[0].location, "/work/a/x.csv");
        assert!(matches!(spec.sources[1].origin, SourceOrigin::Remote { scheme: RemoteScheme::Https }));
        assert!(matches!(spec.sources[2].origin, SourceOrigin::ObjectStore { scheme: StorageScheme::S3 }));
    }

    #[test]
    fn config_form_only_extracts_path() {
        let spec = normalize(Locator::parse("file:config=conf/model.yaml").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        assert!(spec.sources.is_empty());
        assert_eq!(spec.config_path.as_deref(), Some("/work/conf/model.yaml"));
    }

    #[test]
    fn object_store_sets_storage_type() {
        let spec = normalize(Locator::parse("file:s3://bkt/raw/*.csv").unwrap(), &OptionBag::new(), &cwd()).unwrap();
        assert_eq!(spec.option("storageType"), Some("s3"));
        assert!(spec.primary().unwrap().is_glob());
        assert!(spec.option("refreshInterval").is_none());
    }
}
