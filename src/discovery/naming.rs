//! Table names for glob matches.
//! A match's path relative to its base becomes a dotted identifier: separators turn into `.`,
//! a trailing extension is dropped, and anything outside `[A-Za-z0-9_.]` becomes `_`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DriverError, DriverResult};

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[A-Za-z0-9]+$").expect("static regex"));
static ILLEGAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.]").expect("static regex"));

/// `derive("/data/2024/01/sales.csv", "/data")` is `2024.01.sales`.
pub fn derive(matched: &str, base: &str) -> String {
    let relative = relative_to(matched, base);
    let dotted = relative.replace(['/', '\\'], ".");
    let stem = strip_extension(&dotted);
    ILLEGAL_RE.replace_all(stem, "_").into_owned()
}

fn relative_to<'a>(matched: &'a str, base: &str) -> &'a str {
    let b = base.trim_end_matches(['/', '\\']);
    if b.is_empty() || b == "." {
        return matched.trim_start_matches("./").trim_start_matches(['/', '\\']);
    }
    match matched.strip_prefix(b) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest.trim_start_matches(['/', '\\']),
        _ => matched,
    }
}

// Only a suffix preceded by a non-separator character counts as an extension, so `.hidden`
// names and `dir..x` keep their text.
fn strip_extension(dotted: &str) -> &str {
    if !EXTENSION_RE.is_match(dotted) {
        return dotted;
    }
    match dotted.rfind('.') {
        Some(i) if i > 0 && dotted.as_bytes()[i - 1] != b'.' => &dotted[..i],
        _ => dotted,
    }
}

/// Derive names for every match of one resolver call. Two matches deriving the same name is a
/// configuration error rather than a silent overwrite.
pub fn derive_all<S: AsRef<str>>(matches: &[S], base: &str) -> DriverResult<Vec<(String, String)>> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(matches.len());
    let mut out = Vec::with_capacity(matches.len());
    for m in matches {
        let m = m.as_ref();
        let name = derive(m, base);
        if let Some(prev) = seen.get(&name) {
            return Err(DriverError::config(
                "duplicate_table_name",
                format!("'{}' and '{}' both map to table name '{}' under base '{}'", prev, m, name, base),
            ));
        }
        seen.insert(name.clone(), m);
        out.push((name, m.to_string()));
    }
    Ok(out)
}
