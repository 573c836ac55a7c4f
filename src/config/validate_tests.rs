use super::*;
use crate::config::connection::normalize;
use crate::locator::Locator;
use crate::options::OptionBag;
use std::path::PathBuf;

fn spec_with(locator: &str, pairs: &[(&str, &str)]) -> ConnectionSpec {
    let opts = OptionBag::from_pairs(pairs.iter().copied());
    normalize(Locator::parse(locator).unwrap(), &opts, &PathBuf::from("/work")).unwrap()
}

#[test]
fn defaults_are_typed() {
    let s = validate(&spec_with("file:///data/sales.csv", &[])).unwrap();
    assert_eq!(s.schema_name, "files");
    assert_eq!(s.batch_size, Some(8192));
    assert_eq!(s.memory_threshold, Some(67_108_864));
    assert_eq!(s.casing, CasingPolicy::default());
    assert_eq!(s.glob_mode, GlobMode::MultiTable);
    assert!(s.recursive);
    assert!(s.execution_engine.is_none());
    assert!(s.format.is_none());
}

#[test]
fn batch_size_zero_reports_bound() {
    let err = validate(&spec_with("file:///data/sales.csv", &[("batchSize", "0")])).unwrap_err();
    assert!(matches!(err, DriverError::Configuration { .. }));
    assert_eq!(err.code_str(), "numeric_out_of_range");
    assert!(err.message().contains("[1, 1000000]"), "{}", err.message());
}

#[test]
fn numeric_bounds_and_parse_errors() {
    let err = validate(&spec_with("file:///d/x.csv", &[("batch_size", "ten")])).unwrap_err();
    assert_eq!(err.code_str(), "invalid_number");
    let err = validate(&spec_with("file:///d/x.csv", &[("memoryThreshold", "1023")])).unwrap_err();
    assert!(err.message().contains("memoryThreshold"));
    let err = validate(&spec_with("file:///d/x.csv", &[("maxSpillFiles", "10001")])).unwrap_err();
    assert!(err.message().contains("[1, 10000]"));
    let err = validate(&spec_with("file:///d/x.csv", &[("skipLines", "-1")])).unwrap_err();
    assert!(err.message().contains("skipLines"));
    let ok = validate(&spec_with("file:///d/x.csv", &[("skipLines", "0"), ("batchSize", "1000000")])).unwrap();
    assert_eq!(ok.skip_lines, Some(0));
    assert_eq!(ok.batch_size, Some(1_000_000));
}

#[test]
fn enumerations_echo_allow_list() {
    let err = validate(&spec_with("file:///d/x.csv", &[("format", "xml")])).unwrap_err();
    assert!(err.message().contains("parquet"));
    let err = validate(&spec_with("file:///d/x.csv", &[("executionEngine", "spark")])).unwrap_err();
    assert!(err.message().contains("parquet, vectorized, arrow, linq4j"));
    let err = validate(&spec_with("file:///d/x.csv", &[("tableNameCasing", "title")])).unwrap_err();
    assert_eq!(err.code_str(), "invalid_casing");
    let err = validate(&spec_with("file:///d/*.csv", &[("globMode", "both")])).unwrap_err();
    assert!(err.message().contains("single-table"));

    let s = validate(&spec_with("file:///d/*.csv", &[("globMode", "single-table"), ("column_name_casing", "lower"), ("format", "TSV")])).unwrap();
    assert_eq!(s.glob_mode, GlobMode::SingleTable);
    assert_eq!(s.casing.column, Casing::Lower);
    assert_eq!(s.format, Some(FormatTag::Tsv));
}

#[test]
fn refresh_interval_forms() {
    for ok in ["10 seconds", "1 minute", "3hours", "2 Days", "7 days"] {
        assert_eq!(check_refresh_interval(ok).unwrap(), ok);
    }
    for bad in ["soon", "5 weeks", "minutes", "-1"] {
        assert!(check_refresh_interval(bad).is_err(), "{}", bad);
    }
}

#[test]
fn traversal_rejected_before_io() {
    let err = validate(&spec_with("file:///data/../etc/passwd", &[])).unwrap_err();
    assert!(matches!(err, DriverError::Security { .. }));
    let err = validate(&spec_with("file:../../outside.csv", &[])).unwrap_err();
    assert_eq!(err.code_str(), "path_traversal");
    assert!(validate(&spec_with("file:///data/a..b.csv", &[])).is_ok());
}

#[test]
fn dotted_names_are_not_traversal() {
    for ok in ["/data/v1..v2/", "/data//v1..v2/x.csv", "/data/./v1..v2", "reports/..hidden/q.csv", "C:\\data\\a..b\\"] {
        assert!(validate_path(ok).is_ok(), "{}", ok);
    }
    for bad in ["/data/../etc", "/data/x/..", "..", "../x.csv", "C:\\data\\..\\secret", "/data//..//etc/"] {
        assert_eq!(validate_path(bad).unwrap_err().code_str(), "path_traversal", "{}", bad);
    }
}

#[test]
fn null_byte_rejected() {
    let err = validate_path("/data/x\0.csv").unwrap_err();
    assert_eq!(err.code_str(), "null_byte_in_path");
}

#[test]
fn security_checked_before_numbers() {
    let err = validate(&spec_with("file:///a/../b.csv", &[("batchSize", "0")])).unwrap_err();
    assert!(matches!(err, DriverError::Security { .. }));
}

#[test]
fn auth_fields_collected() {
    let s = validate(&spec_with(
        "file:s3://bkt/k.csv",
        &[("awsRegion", "eu-west-1"), ("client_id", "cid"), ("tenantId", "tid"), ("username", "u")],
    ))
    .unwrap();
    assert_eq!(s.auth.aws_region.as_deref(), Some("eu-west-1"));
    assert_eq!(s.auth.client_id.as_deref(), Some("cid"));
    assert!(s.auth.has_oauth());
    assert_eq!(s.storage_type.as_deref(), Some("s3"));
}

#[test]
fn declared_operands_follow_option_rules() {
    let op = |v: serde_json::Value| serde_json::from_value::<Operand>(v).unwrap();
    assert!(validate_operand(&op(serde_json::json!({"batchSize": 64, "refreshInterval": "-1", "executionEngine": "LINQ4J"}))).is_ok());
    assert!(validate_operand(&op(serde_json::json!({"tables": [{"name": "r", "url": "https://h/../r.csv"}]}))).is_ok());

    let err = validate_operand(&op(serde_json::json!({"directory": "/a/../b", "batchSize": 0}))).unwrap_err();
    assert!(matches!(err, DriverError::Security { .. }));
    let err = validate_operand(&op(serde_json::json!({"memoryThreshold": u64::MAX}))).unwrap_err();
    assert_eq!(err.code_str(), "numeric_out_of_range");
    let err = validate_operand(&op(serde_json::json!({"tables": [{"name": "t", "url": "/d/t.csv", "skipLines": 2000000}]}))).unwrap_err();
    assert!(err.message().contains("skipLines"));
    let err = validate_operand(&op(serde_json::json!({"tables": [{"name": "t", "url": "/d/t.csv", "refreshInterval": "often"}]}))).unwrap_err();
    assert_eq!(err.code_str(), "invalid_refresh_interval");
}
