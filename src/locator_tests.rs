use super::*;

#[test]
fn local_shapes() {
    match Locator::parse("file:///data/sales.csv").unwrap() {
        Locator::Local { path, params } => {
            assert_eq!(path, "/data/sales.csv");
            assert!(params.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
    match Locator::parse("file://reports/q1.json?format=json&batchSize=10").unwrap() {
        Locator::Local { path, params } => {
            assert_eq!(path, "reports/q1.json");
            assert_eq!(params.len(), 2);
            assert_eq!(params[1], ("batchSize".to_string(), "10".to_string()));
        }
        other => panic!("unexpected {:?}", other),
    }
    match Locator::parse("file:///c:/data/x.csv").unwrap() {
        Locator::Local { path, .. } => assert_eq!(path, "c:/data/x.csv"),
        other => panic!("unexpected {:?}", other),
    }
    match Locator::parse("file:data/*.csv").unwrap() {
        Locator::Local { path, .. } => assert_eq!(path, "data/*.csv"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn non_ascii_local_paths() {
    for raw in ["file:donné.csv", "file:é", "file:日本/売上.csv", "file:///données/été.csv?format=csv"] {
        match Locator::parse(raw) {
            Ok(Locator::Local { path, .. }) => assert!(!path.is_empty(), "{}", raw),
            other => panic!("unexpected {:?} for {}", other, raw),
        }
    }
    match Locator::parse("file:S3://bkt/é.csv").unwrap() {
        Locator::ObjectStore { key, .. } => assert_eq!(key, "é.csv"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn remote_shapes() {
    match Locator::parse("file:https://example.com/data/prices.csv?table=px&refreshInterval=1%20hour").unwrap() {
        Locator::Remote { scheme, url, params } => {
            assert_eq!(scheme, RemoteScheme::Https);
            assert_eq!(url, "https://example.com/data/prices.csv");
            assert_eq!(params[1].1, "1 hour");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(Locator::parse("file:sftp://host/x.csv").unwrap(), Locator::Remote { scheme: RemoteScheme::Sftp, .. }));
    assert!(matches!(Locator::parse("file:ftp://host/x.csv").unwrap(), Locator::Remote { scheme: RemoteScheme::Ftp, .. }));
}

#[test]
fn object_store_shapes() {
    match Locator::parse("file:s3://bucket/raw/2024/**/*.parquet?awsRegion=eu-west-1").unwrap() {
        Locator::ObjectStore { scheme, bucket, key, params } => {
            assert_eq!(scheme, StorageScheme::S3);
            assert_eq!(bucket, "bucket");
            assert_eq!(key, "raw/2024/**/*.parquet");
            assert_eq!(params[0].0, "awsRegion");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(Locator::parse("file:gs://b/k.csv").unwrap(), Locator::ObjectStore { scheme: StorageScheme::Gs, .. }));
    assert!(Locator::parse("file:s3:///nokey").is_err());
}

#[test]
fn multi_drops_glob_key() {
    match Locator::parse("file:multi?locations=/a/x.csv|/b/y.json&glob=true&schema=mixed").unwrap() {
        Locator::Multi { locations, params } => {
            assert_eq!(locations, vec!["/a/x.csv".to_string(), "/b/y.json".to_string()]);
            assert_eq!(params, vec![("schema".to_string(), "mixed".to_string())]);
        }
        other => panic!("unexpected {:?}", other),
    }
    let err = Locator::parse("file:multi?glob=true").unwrap_err();
    assert_eq!(err.code_str(), "missing_locations");
}

#[test]
fn config_shapes() {
    match Locator::parse("file:config=/etc/models/hybrid.yaml").unwrap() {
        Locator::ConfigFile { path, .. } => assert_eq!(path, "/etc/models/hybrid.yaml"),
        other => panic!("unexpected {:?}", other),
    }
    match Locator::parse("file://ignored?config=conf.json&schema=s").unwrap() {
        Locator::ConfigFile { path, params } => {
            assert_eq!(path, "conf.json");
            assert_eq!(params, vec![("schema".to_string(), "s".to_string())]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rejects_foreign_prefixes() {
    assert!(Locator::parse("jdbc:other:x").is_err());
    assert!(Locator::parse("file:").is_err());
}

#[test]
fn acceptance() {
    assert!(Locator::accepts("file:///data"));
    assert!(Locator::accepts("file:https://x/y.csv"));
    assert!(Locator::accepts("file:s3://b/k"));
    assert!(Locator::accepts("file:multi?locations=a"));
    assert!(Locator::accepts("file:config=x.json"));
    assert!(Locator::accepts("file:C:/data/x.csv"));
    assert!(Locator::accepts("file:relative/dir"));
    assert!(!Locator::accepts("file:mailto://x"));
    assert!(!Locator::accepts("postgres://x"));
    assert!(!Locator::accepts("file:"));
}

#[test]
fn leaf_stems() {
    assert_eq!(leaf_stem("https://h/p/prices.csv").as_deref(), Some("prices"));
    assert_eq!(leaf_stem("/data/archive.tar.gz").as_deref(), Some("archive.tar"));
    assert_eq!(leaf_stem("/data/dir/").as_deref(), None);
    assert_eq!(leaf_stem("https://h/").as_deref(), None);
}
