//! Connection locator grammar.
//!
//! ```text
//! file://<path>                              local file, directory or glob
//! file:<http|https|ftp|ftps|sftp>://<url>    remote single source
//! file:<s3|gs|az>://<bucket>/<key>           object storage
//! file:multi?locations=<loc>|<loc>|...       several independent sources
//! file:config=<path>                         external hybrid config document
//! file://<anything>?config=<path>            same, query form
//! ```
//! Every shape may carry `?k=v&...` parameters which later override the option bag.

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, DriverResult};
use crate::options::parse_query;

pub const LOCATOR_PREFIX: &str = "file:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteScheme { Http, Https, Ftp, Ftps, Sftp }

impl RemoteScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteScheme::Http => "http",
            RemoteScheme::Https => "https",
            RemoteScheme::Ftp => "ftp",
            RemoteScheme::Ftps => "ftps",
            RemoteScheme::Sftp => "sftp",
        }
    }

    fn all() -> [RemoteScheme; 5] { [RemoteScheme::Https, RemoteScheme::Http, RemoteScheme::Ftps, RemoteScheme::Ftp, RemoteScheme::Sftp] }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScheme { S3, Gs, Az }

impl StorageScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageScheme::S3 => "s3",
            StorageScheme::Gs => "gs",
            StorageScheme::Az => "az",
        }
    }

    fn all() -> [StorageScheme; 3] { [StorageScheme::S3, StorageScheme::Gs, StorageScheme::Az] }

    /// `s3` for S3, and so on; used as the `storageType` operand value.
    pub fn storage_type(&self) -> &'static str { self.as_str() }
}

/// One parsed connection locator. Paths are kept as written; resolution against the working
/// directory happens in the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local { path: String, params: Vec<(String, String)> },
    Remote { scheme: RemoteScheme, url: String, params: Vec<(String, String)> },
    ObjectStore { scheme: StorageScheme, bucket: String, key: String, params: Vec<(String, String)> },
    Multi { locations: Vec<String>, params: Vec<(String, String)> },
    ConfigFile { path: String, params: Vec<(String, String)> },
}

impl Locator {
    pub fn params(&self) -> &[(String, String)] {
        match self {
            Locator::Local { params, .. }
            | Locator::Remote { params, .. }
            | Locator::ObjectStore { params, .. }
            | Locator::Multi { params, .. }
            | Locator::ConfigFile { params, .. } => params,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Locator::Local { .. } => "local",
            Locator::Remote { .. } => "remote",
            Locator::ObjectStore { .. } => "object_store",
            Locator::Multi { .. } => "multi",
            Locator::ConfigFile { .. } => "config_file",
        }
    }

    /// Parse a full locator, including the `file:` prefix.
    pub fn parse(locator: &str) -> DriverResult<Locator> {
        let trimmed = locator.trim();
        let rest = trimmed
            .strip_prefix(LOCATOR_PREFIX)
            .ok_or_else(|| DriverError::config("unsupported_locator", format!("locator must start with '{}': {}", LOCATOR_PREFIX, locator)))?;
        if rest.is_empty() {
            return Err(DriverError::config("unsupported_locator", "locator has no location after the prefix"));
        }
        if let Some(path) = rest.strip_prefix("config=") {
            return parse_config(path);
        }
        if rest == "multi" || rest.starts_with("multi?") {
            return parse_multi(rest);
        }
        let (address, query) = split_query(rest);
        let params = parse_query(query);
        if let Some(config) = params.iter().find(|(k, _)| k == "config").map(|(_, v)| v.clone()) {
            let others = params.into_iter().filter(|(k, _)| k != "config").collect();
            return Ok(Locator::ConfigFile { path: config, params: others });
        }
        if let Some(scheme) = remote_scheme_of(address) {
            return Ok(Locator::Remote { scheme, url: address.to_string(), params });
        }
        if let Some((scheme, tail)) = storage_scheme_of(address) {
            let (bucket, key) = match tail.split_once('/') {
                Some((b, k)) => (b.to_string(), k.to_string()),
                None => (tail.to_string(), String::new()),
            };
            if bucket.is_empty() {
                return Err(DriverError::config("unsupported_locator", format!("object storage locator has no bucket: {}", locator)));
            }
            return Ok(Locator::ObjectStore { scheme, bucket, key, params });
        }
        Ok(Locator::Local { path: local_path(address), params })
    }

    /// Cheap acceptance test that never fails: true when `parse` would produce a locator.
    pub fn accepts(locator: &str) -> bool {
        let Some(rest) = locator.trim().strip_prefix(LOCATOR_PREFIX) else { return false };
        if rest.is_empty() { return false; }
        if rest.starts_with("//") || rest.starts_with("config=") || rest == "multi" || rest.starts_with("multi?") {
            return true;
        }
        if remote_scheme_of(rest).is_some() || storage_scheme_of(rest).is_some() {
            return true;
        }
        is_windows_drive(rest) || !rest.contains("://")
    }

    /// Display form with the object storage URL rebuilt.
    pub fn describe(&self) -> String {
        match self {
            Locator::Local { path, .. } => path.clone(),
            Locator::Remote { url, .. } => url.clone(),
            Locator::ObjectStore { scheme, bucket, key, .. } => format!("{}://{}/{}", scheme.as_str(), bucket, key),
            Locator::Multi { locations, .. } => locations.join("|"),
            Locator::ConfigFile { path, .. } => format!("config={}", path),
        }
    }
}

fn parse_config(rest: &str) -> DriverResult<Locator> {
    let (path, query) = match rest.split_once('&') {
        Some((p, q)) => (p, q),
        None => (rest, ""),
    };
    if path.trim().is_empty() {
        return Err(DriverError::config("missing_config_path", "config locator names no file"));
    }
    Ok(Locator::ConfigFile { path: crate::options::decode(path), params: parse_query(query) })
}

fn parse_multi(rest: &str) -> DriverResult<Locator> {
    let query = rest.strip_prefix("multi").unwrap_or("").trim_start_matches('?');
    let mut locations = Vec::new();
    let mut params = Vec::new();
    for (k, v) in parse_query(query) {
        match k.as_str() {
            "locations" => locations.extend(v.split('|').map(str::trim).filter(|s| !s.is_empty()).map(String::from)),
            // glob discovery is inferred from the location text only
            "glob" => {}
            _ => params.push((k, v)),
        }
    }
    if locations.is_empty() {
        return Err(DriverError::config("missing_locations", "multi locator requires a non-empty 'locations' parameter"));
    }
    Ok(Locator::Multi { locations, params })
}

fn split_query(s: &str) -> (&str, &str) {
    match s.split_once('?') {
        Some((a, q)) => (a, q),
        None => (s, ""),
    }
}

fn remote_scheme_of(address: &str) -> Option<RemoteScheme> {
    let lower = address.to_ascii_lowercase();
    RemoteScheme::all().into_iter().find(|s| lower.starts_with(&format!("{}://", s.as_str())))
}

fn storage_scheme_of(address: &str) -> Option<(StorageScheme, &str)> {
    for scheme in StorageScheme::all() {
        let prefix = format!("{}://", scheme.as_str());
        if address.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(&prefix)) {
            return Some((scheme, &address[prefix.len()..]));
        }
    }
    None
}

fn is_windows_drive(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// `///abs/path` -> `/abs/path`, `//rel/path` -> `rel/path`, `///c:/x` -> `c:/x`.
fn local_path(address: &str) -> String {
    let path = address.strip_prefix("//").unwrap_or(address);
    if path.len() >= 3 && path.starts_with('/') && is_windows_drive(&path[1..]) {
        return path[1..].to_string();
    }
    path.to_string()
}

/// Leaf name of a location with its extension removed, or `None` when the leaf is empty.
pub fn leaf_stem(location: &str) -> Option<String> {
    let without_query = location.split('?').next().unwrap_or(location);
    let leaf = without_query.rsplit(['/', '\\']).next().unwrap_or(without_query);
    let stem = match leaf.rfind('.') {
        Some(i) if i > 0 => &leaf[..i],
        _ => leaf,
    };
    if stem.is_empty() || stem.contains(':') { None } else { Some(stem.to_string()) }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod locator_tests;
