mod common;

use std::sync::Arc;

use common::{write, ListingFactory};
use filedriver::{DriverContext, FileDriver, OptionBag, Schema};

const MODEL: &str = r#"{
  "version": "1.0",
  "defaultSchema": "SALES",
  "executionEngine": "vectorized",
  "schemas": [
    {
      "name": "SALES",
      "factory": "file",
      "operand": {
        "tables": [{"name": "orders", "url": "/data/orders.csv"}],
        "executionEngine": "linq4j",
        "views": [{"name": "recent", "sql": "SELECT * FROM ORDERS"}]
      }
    },
    {
      "name": "ARCHIVE",
      "factory": "archive",
      "operand": {"tables": [{"name": "old", "url": "/data/old.csv"}], "batchSize": 64}
    }
  ]
}"#;

fn driver(generic: &Arc<ListingFactory>, archive: &Arc<ListingFactory>) -> FileDriver {
    FileDriver::new(DriverContext::new(generic.clone()).with_factory("archive", archive.clone()))
}

#[test]
fn declared_schemas_are_registered() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "model.json", MODEL);
    let generic = ListingFactory::new();
    let archive = ListingFactory::new();
    let d = driver(&generic, &archive);
    let conn = d.connect(&format!("file:config={}", dir.path().join("model.json").display()), &OptionBag::new()).unwrap();

    assert_eq!(conn.default_schema(), "SALES");
    assert_eq!(conn.table_names(), vec!["ORDERS", "recent"]);
    assert_eq!(conn.schema("ARCHIVE").unwrap().table_names(), vec!["OLD"]);

    let sales = generic.last_operand();
    assert_eq!(sales.engine(), Some("vectorized"));
    assert_eq!(sales.batch_size, Some(2048));
    assert_eq!(sales.refresh_interval.as_deref(), Some("-1"));
    let old = archive.last_operand();
    assert_eq!(old.batch_size, Some(64));
    assert_eq!(d.metrics().format_usage["config"], 1);
}

#[test]
fn query_form_and_relative_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "conf/model.yaml", "schemas:\n  - name: s\n    operand:\n      tables:\n        - name: t\n          url: /d/t.csv\n");
    let generic = ListingFactory::new();
    let d = FileDriver::new(DriverContext::new(generic.clone()).with_working_dir(dir.path()));
    let conn = d.connect("file:///ignored?config=conf/model.yaml", &OptionBag::new()).unwrap();
    assert_eq!(conn.default_schema(), "files");
    assert!(conn.schema("s").unwrap().table("T").is_some());
}

#[test]
fn document_casing_wins_over_options() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "m.json",
        r#"{"tableNameCasing":"LOWER","schemas":[{"name":"s","operand":{"tables":[{"name":"Orders","url":"/d/o.csv"}]}}]}"#,
    );
    let generic = ListingFactory::new();
    let d = FileDriver::new(DriverContext::new(generic.clone()));
    let opts = OptionBag::from_pairs([("tableNameCasing", "UPPER"), ("columnNameCasing", "LOWER")]);
    let conn = d.connect(&format!("file:config={}", dir.path().join("m.json").display()), &opts).unwrap();
    let s = conn.schema("s").unwrap();
    assert_eq!(s.table_names(), vec!["orders"]);
    assert_eq!(s.table("orders").unwrap().row_type().field_names(), vec!["id"]);
}

#[test]
fn unknown_factory_and_bad_document() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "m.json", r#"{"schemas":[{"name":"s","factory":"nope","operand":{}}]}"#);
    write(dir.path(), "broken.json", "{");
    let generic = ListingFactory::new();
    let d = FileDriver::new(DriverContext::new(generic.clone()));

    let err = d.connect(&format!("file:config={}", dir.path().join("m.json").display()), &OptionBag::new()).unwrap_err();
    assert_eq!(err.code_str(), "unknown_factory");
    assert!(err.message().contains("file, columnar"));

    let err = d.connect(&format!("file:config={}", dir.path().join("broken.json").display()), &OptionBag::new()).unwrap_err();
    assert_eq!(err.code_str(), "invalid_config_file");

    let err = d.connect("file:config=/etc/../root/m.json", &OptionBag::new()).unwrap_err();
    assert_eq!(err.code_str(), "path_traversal");
    assert_eq!(generic.call_count(), 0);
}

#[test]
fn document_operands_are_validated_before_any_reader_runs() {
    let dir = tempfile::tempdir().unwrap();
    let good = r#"{"name":"ok","operand":{"tables":[{"name":"t","url":"/d/t.csv"}]}}"#;
    let cases = [
        (r#"{"name":"bad","operand":{"batchSize":0}}"#, "numeric_out_of_range"),
        (r#"{"name":"bad","operand":{"executionEngine":"bogus"}}"#, "invalid_execution_engine"),
        (r#"{"name":"bad","operand":{"directory":"/data/../etc"}}"#, "path_traversal"),
        (r#"{"name":"bad","operand":{"tables":[{"name":"p","url":"../secret/p.csv"}]}}"#, "path_traversal"),
        (r#"{"name":"bad","operand":{"refreshInterval":"soon"}}"#, "invalid_refresh_interval"),
    ];
    let generic = ListingFactory::new();
    let d = FileDriver::new(DriverContext::new(generic.clone()));
    for (i, (bad, code)) in cases.iter().enumerate() {
        let name = format!("m{}.json", i);
        write(dir.path(), &name, &format!(r#"{{"schemas":[{},{}]}}"#, good, bad));
        let err = d.connect(&format!("file:config={}", dir.path().join(&name).display()), &OptionBag::new()).unwrap_err();
        assert_eq!(err.code_str(), *code, "{}", bad);
    }

    write(dir.path(), "global.json", &format!(r#"{{"executionEngine":"bogus","schemas":[{}]}}"#, good));
    let err = d.connect(&format!("file:config={}", dir.path().join("global.json").display()), &OptionBag::new()).unwrap_err();
    assert_eq!(err.code_str(), "invalid_execution_engine");

    write(dir.path(), "fine.json", &format!(r#"{{"schemas":[{}]}}"#, good));
    let fine = dir.path().join("fine.json");
    let err = d.connect(&format!("file:config={}&batchSize=0", fine.display()), &OptionBag::new()).unwrap_err();
    assert_eq!(err.code_str(), "numeric_out_of_range");
    let opts = OptionBag::from_pairs([("executionEngine", "nope")]);
    let err = d.connect(&format!("file:config={}", fine.display()), &opts).unwrap_err();
    assert_eq!(err.code_str(), "invalid_execution_engine");

    assert_eq!(generic.call_count(), 0);
    assert!(d.context().registry().is_empty());
    assert!(d.connect(&format!("file:config={}", fine.display()), &OptionBag::new()).is_ok());
    assert_eq!(generic.call_count(), 1);
}
