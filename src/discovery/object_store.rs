//! Object storage listing with glob filtering.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tracing::{debug, warn};

use super::glob::{compile, matches};
use crate::locator::StorageScheme;

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

/// Storage client seam. Implementations return object keys under `prefix` one page at a time.
pub trait ObjectLister: Send + Sync {
    fn list_objects(&self, scheme: StorageScheme, bucket: &str, prefix: &str, continuation: Option<&str>) -> Result<ListPage>;
}

/// Full URLs of objects under `bucket/base` whose key (relative to `base`) or leaf matches
/// `pattern`, in listing order. Listing errors are logged and yield an empty result.
pub fn resolve_objects(lister: &dyn ObjectLister, scheme: StorageScheme, bucket: &str, base: &str, pattern: &str) -> Vec<String> {
    let matcher = match compile(pattern) {
        Ok(m) => m,
        Err(e) => {
            warn!(target: "filedriver::discovery", bucket, pattern, error = %e, "object glob rejected");
            return Vec::new();
        }
    };
    let prefix = listing_prefix(base);
    let keys = match list_all(lister, scheme, bucket, &prefix) {
        Ok(k) => k,
        Err(e) => {
            warn!(target: "filedriver::discovery", scheme = scheme.as_str(), bucket, prefix = %prefix, error = %format!("{:#}", e), "object listing failed; no matches for this source");
            return Vec::new();
        }
    };
    let mut found = Vec::new();
    for key in keys {
        if key.ends_with('/') { continue; }
        let relative = key.strip_prefix(&prefix).unwrap_or(&key).trim_start_matches('/');
        let leaf = relative.rsplit('/').next().unwrap_or(relative);
        if matches(&matcher, relative, leaf) {
            found.push(format!("{}://{}/{}", scheme.as_str(), bucket, key));
        }
    }
    debug!(target: "filedriver::discovery", bucket, prefix = %prefix, matched = found.len(), "resolved object glob");
    found
}

/// `""` and `"."` list the whole bucket; other bases list as a directory prefix.
pub fn listing_prefix(base: &str) -> String {
    let b = base.trim_start_matches('/');
    if b.is_empty() || b == "." { String::new() } else { format!("{}/", b.trim_end_matches('/')) }
}

fn list_all(lister: &dyn ObjectLister, scheme: StorageScheme, bucket: &str, prefix: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = lister.list_objects(scheme, bucket, prefix, token.as_deref())?;
        keys.extend(page.keys);
        match page.next_token {
            Some(next) if Some(&next) != token.as_ref() => token = Some(next),
            Some(_) => anyhow::bail!("listing returned the same continuation token twice"),
            None => return Ok(keys),
        }
    }
}

/// In-memory lister serving a fixed key set in pages; also counts calls.
pub struct StaticObjectLister {
    keys: Vec<String>,
    page_size: usize,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl StaticObjectLister {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self { keys: keys.into_iter().map(Into::into).collect(), page_size: 1000, failure: None, calls: AtomicUsize::new(0) }
    }

    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    /// Every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { failure: Some(message.into()), ..Self::new(Vec::<String>::new()) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl ObjectLister for StaticObjectLister {
    fn list_objects(&self, _scheme: StorageScheme, _bucket: &str, prefix: &str, continuation: Option<&str>) -> Result<ListPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.failure {
            anyhow::bail!("{}", msg);
        }
        let under: Vec<&String> = self.keys.iter().filter(|k| k.starts_with(prefix)).collect();
        let start: usize = match continuation {
            Some(t) => t.parse()?,
            None => 0,
        };
        let end = (start + self.page_size).min(under.len());
        let keys = under[start.min(end)..end].iter().map(|k| (*k).clone()).collect();
        let next_token = if end < under.len() { Some(end.to_string()) } else { None };
        Ok(ListPage { keys, next_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_continuation_tokens() {
        let keys: Vec<String> = (0..25).map(|i| format!("raw/2024/part-{:03}.parquet", i)).collect();
        let lister = StaticObjectLister::new(keys).with_page_size(10);
        let found = resolve_objects(&lister, StorageScheme::S3, "bkt", "raw/2024", "*.parquet");
        assert_eq!(found.len(), 25);
        assert_eq!(found[0], "s3://bkt/raw/2024/part-000.parquet");
        assert_eq!(lister.calls(), 3);
    }

    #[test]
    fn matches_relative_to_prefix() {
        let lister = StaticObjectLister::new([
            "raw/2024/01/sales.csv",
            "raw/2024/02/sales.csv",
            "raw/2024/02/readme.md",
            "raw/2024/",
            "other/x.csv",
        ]);
        let found = resolve_objects(&lister, StorageScheme::S3, "bkt", "raw/2024", "**/*.csv");
        assert_eq!(found, vec!["s3://bkt/raw/2024/01/sales.csv", "s3://bkt/raw/2024/02/sales.csv"]);
    }

    #[test]
    fn listing_failure_is_empty() {
        let lister = StaticObjectLister::failing("access denied");
        assert!(resolve_objects(&lister, StorageScheme::Gs, "bkt", "x", "*.csv").is_empty());
        assert_eq!(lister.calls(), 1);
    }

    #[test]
    fn prefixes() {
        assert_eq!(listing_prefix("."), "");
        assert_eq!(listing_prefix(""), "");
        assert_eq!(listing_prefix("raw/2024/"), "raw/2024/");
        assert_eq!(listing_prefix("/raw"), "raw/");
    }
}
