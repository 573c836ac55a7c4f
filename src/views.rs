//! View and materialization declarations: inline options or a JSON/YAML views file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::decode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDeclaration {
    pub name: String,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationDeclaration {
    #[serde(alias = "viewName")]
    pub view: String,
    #[serde(default, alias = "backingTableName", skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub sql: String,
}

impl MaterializationDeclaration {
    pub fn backing_table(&self) -> String {
        match self.table.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("{}_materialized", self.view),
        }
    }

    /// Copy with the backing table filled in.
    pub fn resolved(&self) -> Self { Self { table: Some(self.backing_table()), ..self.clone() } }
}

/// Parsed views file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsDocument {
    #[serde(default)]
    pub views: Vec<ViewDeclaration>,
    #[serde(default)]
    pub materializations: Vec<MaterializationDeclaration>,
}

impl ViewsDocument {
    pub fn is_empty(&self) -> bool { self.views.is_empty() && self.materializations.is_empty() }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ViewsShape {
    List(Vec<ViewDeclaration>),
    Document(ViewsDocument),
}

impl From<ViewsShape> for ViewsDocument {
    fn from(shape: ViewsShape) -> Self {
        match shape {
            ViewsShape::List(views) => ViewsDocument { views, materializations: Vec::new() },
            ViewsShape::Document(doc) => doc,
        }
    }
}

/// Fetches remote documents (views files named by URL).
pub trait RemoteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Parse a views document. YAML is used for `.yaml`/`.yml` locations, JSON otherwise.
pub fn parse_document(text: &str, location: &str) -> Result<ViewsDocument> {
    let lower = location.to_ascii_lowercase();
    let lower = lower.split('?').next().unwrap_or(&lower);
    let shape: ViewsShape = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml::from_str(text).with_context(|| format!("invalid YAML views document {}", location))?
    } else {
        serde_json::from_str(text).with_context(|| format!("invalid JSON views document {}", location))?
    };
    Ok(shape.into())
}

/// Inline `views` option: a URL-encoded JSON list.
pub fn parse_inline_views(raw: &str) -> Result<Vec<ViewDeclaration>> {
    let decoded = decode(raw);
    serde_json::from_str(&decoded).context("invalid inline views JSON")
}

/// Inline `materializations` option: a URL-encoded JSON list.
pub fn parse_inline_materializations(raw: &str) -> Result<Vec<MaterializationDeclaration>> {
    let decoded = decode(raw);
    serde_json::from_str(&decoded).context("invalid inline materializations JSON")
}

/// Load a views file from a URL (through `fetcher`) or a local path relative to `cwd`.
pub fn load_views_file(location: &str, cwd: &Path, fetcher: Option<&dyn RemoteFetcher>) -> Result<ViewsDocument> {
    let text = if location.contains("://") {
        let fetcher = fetcher.with_context(|| format!("no remote fetcher configured for views file {}", location))?;
        fetcher.fetch(location).with_context(|| format!("fetching views file {}", location))?
    } else {
        let path = Path::new(location);
        let path = if path.is_absolute() { path.to_path_buf() } else { cwd.join(path) };
        std::fs::read_to_string(&path).with_context(|| format!("reading views file {}", path.display()))?
    };
    let doc = parse_document(&text, location)?;
    debug!(target: "filedriver::views", location, views = doc.views.len(), materializations = doc.materializations.len(), "loaded views file");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_table_defaults() {
        let m = MaterializationDeclaration { view: "daily".into(), table: None, sql: "SELECT 1".into() };
        assert_eq!(m.backing_table(), "daily_materialized");
        let m = MaterializationDeclaration { view: "daily".into(), table: Some("  ".into()), sql: "SELECT 1".into() };
        assert_eq!(m.backing_table(), "daily_materialized");
        let m = MaterializationDeclaration { view: "daily".into(), table: Some("mv_daily".into()), sql: "SELECT 1".into() };
        assert_eq!(m.resolved().table.as_deref(), Some("mv_daily"));
    }

    #[test]
    fn list_and_object_shapes() {
        let doc = parse_document(r#"[{"name":"v1","sql":"SELECT * FROM SALES"}]"#, "views.json").unwrap();
        assert_eq!(doc.views.len(), 1);
        assert!(doc.materializations.is_empty());

        let yaml = "views:\n  - name: v1\n    sql: SELECT 1\n    description: one\nmaterializations:\n  - view: m1\n    sql: SELECT 2\n";
        let doc = parse_document(yaml, "defs.YML").unwrap();
        assert_eq!(doc.views[0].description.as_deref(), Some("one"));
        assert_eq!(doc.materializations[0].backing_table(), "m1_materialized");
    }

    #[test]
    fn inline_views_are_url_decoded() {
        let raw = "%5B%7B%22name%22%3A%22top%22%2C%22sql%22%3A%22SELECT%201%22%7D%5D";
        let v = parse_inline_views(raw).unwrap();
        assert_eq!(v[0].name, "top");
        assert_eq!(v[0].sql, "SELECT 1");
        assert!(parse_inline_views("not json").is_err());
        let m = parse_inline_materializations(r#"[{"viewName":"a","backingTableName":"b","sql":"x"}]"#).unwrap();
        assert_eq!(m[0].backing_table(), "b");
    }

    #[test]
    fn local_file_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("v.json"), r#"{"views":[{"name":"a","sql":"SELECT 1"}]}"#).unwrap();
        let doc = load_views_file("v.json", dir.path(), None).unwrap();
        assert_eq!(doc.views[0].name, "a");
        assert!(load_views_file("missing.json", dir.path(), None).is_err());
    }

    struct Fixed(&'static str);
    impl RemoteFetcher for Fixed {
        fn fetch(&self, _url: &str) -> Result<String> { Ok(self.0.to_string()) }
    }

    #[test]
    fn remote_file_needs_fetcher() {
        assert!(load_views_file("https://h/views.json", Path::new("/"), None).is_err());
        let fetcher = Fixed(r#"[{"name":"r","sql":"SELECT 2"}]"#);
        let doc = load_views_file("https://h/views.json?token=x", Path::new("/"), Some(&fetcher)).unwrap();
        assert_eq!(doc.views[0].name, "r");
    }
}
