//! Build manifest layout checks.

use toml::Value;

fn manifest() -> Value {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let text = std::fs::read_to_string(path).unwrap();
    toml::from_str(&text).unwrap()
}

#[test]
fn autobins_is_a_package_key() {
    let manifest = manifest();
    assert_eq!(
        manifest["package"].get("autobins").and_then(Value::as_bool),
        Some(false)
    );
    assert!(manifest["lib"].get("autobins").is_none());
}

#[test]
fn declared_binaries_exist() {
    let manifest = manifest();
    let bins = manifest["bin"].as_array().unwrap();
    assert_eq!(bins.len(), 3);
    for bin in bins {
        let path = bin["path"].as_str().unwrap();
        let full = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(path);
        assert!(full.exists(), "{} missing", path);
    }
}
