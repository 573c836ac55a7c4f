//! Extension based format detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag { Csv, Tsv, Json, Yaml, Parquet, Arrow, Excel, Html, Markdown, Docx }

/// Accepted spellings for the `format` option.
pub const FORMAT_NAMES: &[&str] = &["csv", "tsv", "json", "yaml", "yml", "parquet", "arrow", "excel", "html", "htm", "markdown", "md", "docx", "doc"];

// Longest suffix wins, so compound suffixes are listed alongside their short forms.
const EXTENSIONS: &[(&str, FormatTag)] = &[
    (".csv.gz", FormatTag::Csv),
    (".tsv.gz", FormatTag::Tsv),
    (".json.gz", FormatTag::Json),
    (".geojson", FormatTag::Json),
    (".jsonl", FormatTag::Json),
    (".ndjson", FormatTag::Json),
    (".csv", FormatTag::Csv),
    (".tsv", FormatTag::Tsv),
    (".tab", FormatTag::Tsv),
    (".json", FormatTag::Json),
    (".yaml", FormatTag::Yaml),
    (".yml", FormatTag::Yaml),
    (".parquet", FormatTag::Parquet),
    (".arrow", FormatTag::Arrow),
    (".feather", FormatTag::Arrow),
    (".ipc", FormatTag::Arrow),
    (".xlsx", FormatTag::Excel),
    (".xls", FormatTag::Excel),
    (".html", FormatTag::Html),
    (".htm", FormatTag::Html),
    (".markdown", FormatTag::Markdown),
    (".md", FormatTag::Markdown),
    (".docx", FormatTag::Docx),
];

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Csv => "csv",
            FormatTag::Tsv => "tsv",
            FormatTag::Json => "json",
            FormatTag::Yaml => "yaml",
            FormatTag::Parquet => "parquet",
            FormatTag::Arrow => "arrow",
            FormatTag::Excel => "excel",
            FormatTag::Html => "html",
            FormatTag::Markdown => "markdown",
            FormatTag::Docx => "docx",
        }
    }

    /// Formats read by the columnar engine; single files are exposed through their parent directory.
    pub fn is_columnar(&self) -> bool { matches!(self, FormatTag::Parquet | FormatTag::Arrow) }

    /// Formats whose tables are extracted by directory discovery (sheets, rendered tables).
    pub fn is_directory_shaped(&self) -> bool { matches!(self, FormatTag::Excel | FormatTag::Html | FormatTag::Markdown | FormatTag::Docx) }

    pub fn is_delimited(&self) -> bool { matches!(self, FormatTag::Csv | FormatTag::Tsv) }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for FormatTag {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_ascii_lowercase().as_str() {
            "csv" => FormatTag::Csv,
            "tsv" => FormatTag::Tsv,
            "json" => FormatTag::Json,
            "yaml" | "yml" => FormatTag::Yaml,
            "parquet" => FormatTag::Parquet,
            "arrow" => FormatTag::Arrow,
            "excel" => FormatTag::Excel,
            "html" | "htm" => FormatTag::Html,
            "markdown" | "md" => FormatTag::Markdown,
            "docx" | "doc" => FormatTag::Docx,
            _ => {
                return Err(DriverError::config(
                    "invalid_format",
                    format!("Invalid format: '{}'. Supported formats: {}", s, FORMAT_NAMES.join(", ")),
                ))
            }
        };
        Ok(tag)
    }
}

/// Detect the format of a location by its longest matching suffix; unknown suffixes are csv.
pub fn detect(location: &str) -> FormatTag {
    let path = location.split('?').next().unwrap_or(location).to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .filter(|(ext, _)| path.ends_with(ext))
        .max_by_key(|(ext, _)| ext.len())
        .map(|(_, tag)| *tag)
        .unwrap_or(FormatTag::Csv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect("/data/sales.csv"), FormatTag::Csv);
        assert_eq!(detect("/data/sales.TSV"), FormatTag::Tsv);
        assert_eq!(detect("https://h/events.json?x=1"), FormatTag::Json);
        assert_eq!(detect("s3://b/k/part-0001.parquet"), FormatTag::Parquet);
        assert_eq!(detect("book.xlsx"), FormatTag::Excel);
        assert_eq!(detect("report.HTML"), FormatTag::Html);
        assert_eq!(detect("notes.md"), FormatTag::Markdown);
        assert_eq!(detect("spec.docx"), FormatTag::Docx);
        assert_eq!(detect("frame.feather"), FormatTag::Arrow);
    }

    #[test]
    fn longest_suffix_wins() {
        assert_eq!(detect("dump.json.gz"), FormatTag::Json);
        assert_eq!(detect("dump.tsv.gz"), FormatTag::Tsv);
    }

    #[test]
    fn unknown_defaults_to_csv() {
        assert_eq!(detect("README"), FormatTag::Csv);
        assert_eq!(detect("data.bin"), FormatTag::Csv);
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("YML".parse::<FormatTag>().unwrap(), FormatTag::Yaml);
        assert_eq!("htm".parse::<FormatTag>().unwrap(), FormatTag::Html);
        let err = "xml".parse::<FormatTag>().unwrap_err();
        assert_eq!(err.code_str(), "invalid_format");
        assert!(err.message().contains("csv, tsv, json"));
    }

    #[test]
    fn shape_classes() {
        assert!(FormatTag::Parquet.is_columnar());
        assert!(!FormatTag::Csv.is_columnar());
        assert!(FormatTag::Html.is_directory_shaped());
        assert!(FormatTag::Excel.is_directory_shaped());
        assert!(!FormatTag::Json.is_directory_shaped());
    }
}
