//! Connection option bag.
//! Keys are stored verbatim; lookups accept either the camel-case or the snake-case spelling
//! of a name, and `with_aliases` materialises both spellings so collaborators reading the raw
//! map see a consistent view.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionBag {
    entries: BTreeMap<String, String>,
}

impl OptionBag {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut bag = Self::new();
        for (k, v) in pairs { bag.insert(k, v); }
        bag
    }

    /// Insert or replace a value. Any value stored under the other spelling of the same name is
    /// dropped so the newest write wins regardless of spelling.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let alias = alias_of(&key);
        if alias != key { self.entries.remove(&alias); }
        self.entries.insert(key, value.into());
    }

    pub fn set_if_absent<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        if !self.contains(&key) { self.insert(key, value); }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.entries.get(key) { return Some(v.as_str()); }
        self.entries.get(&alias_of(key)).map(|s| s.as_str())
    }

    /// Lookup that treats blank values as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool { self.get(key).is_some() }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let direct = self.entries.remove(key);
        let aliased = self.entries.remove(&alias_of(key));
        direct.or(aliased)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Layer `other` on top of this bag; values in `other` win.
    pub fn overlay(&mut self, other: &OptionBag) {
        for (k, v) in other.iter() { self.insert(k, v); }
    }

    /// Layer URL query parameters on top of this bag; parameters win over existing options.
    pub fn overlay_pairs(&mut self, pairs: &[(String, String)]) {
        for (k, v) in pairs { self.insert(k.as_str(), v.as_str()); }
    }

    /// Copy of the bag where every name is present under both its camel and snake spelling.
    pub fn with_aliases(&self) -> OptionBag {
        let mut out = self.entries.clone();
        for (k, v) in self.entries.iter() {
            let alias = alias_of(k);
            out.entry(alias).or_insert_with(|| v.clone());
        }
        OptionBag { entries: out }
    }
}

/// The other spelling of an option name: `batchSize` <-> `batch_size`.
/// Names with neither an upper-case letter nor an underscore are their own alias.
pub fn alias_of(key: &str) -> String {
    if key.contains('_') { snake_to_camel(key) } else if key.chars().any(|c| c.is_ascii_uppercase()) { camel_to_snake(key) } else { key.to_string() }
}

pub fn camel_to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 { out.push('_'); }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn snake_to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for ch in s.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next { out.push(ch.to_ascii_uppercase()); upper_next = false; } else { out.push(ch); }
    }
    out
}

/// Parse an `a=b&c=d` query string. Keys without `=` map to an empty value; both sides are
/// percent-decoded, and undecodable input is kept verbatim.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

pub(crate) fn decode(s: &str) -> String {
    let plus_as_space = s.replace('+', " ");
    match urlencoding::decode(&plus_as_space) {
        Ok(v) => v.into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Lenient boolean parse: only a case-insensitive `true` is true.
pub fn parse_bool(value: &str) -> bool { value.trim().eq_ignore_ascii_case("true") }
