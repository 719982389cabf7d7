use super::*;
use serde_json::json;

fn inputs(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn later_layers_override_earlier_ones() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("env.json");
    fs::write(
        &env_path,
        r#"{"NAME": "FromFile", "RECIPE_CACHE_DIR": "/cache/file", "keep": 1}"#,
    )
    .unwrap();

    let mut defaults = Env::new();
    defaults.insert("RECIPE_CACHE_DIR", "/cache/default");
    defaults.insert("only_default", "yes");

    let env = build_env(
        &defaults,
        Some(&env_path),
        &inputs(&["NAME=FromFlag", r#"changes=[{"path": "/a", "type": "file"}]"#]),
    )
    .unwrap();

    assert_eq!(env.get_str("NAME"), Some("FromFlag"));
    assert_eq!(env.get_str("RECIPE_CACHE_DIR"), Some("/cache/file"));
    assert_eq!(env.get_str("only_default"), Some("yes"));
    assert_eq!(env.get("keep"), Some(&json!(1)));
    assert_eq!(env.get("changes"), Some(&json!([{"path": "/a", "type": "file"}])));
}

#[test]
fn env_document_must_be_an_object() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("env.json");
    fs::write(&env_path, "[1, 2]").unwrap();
    assert!(build_env(&Env::new(), Some(&env_path), &[]).is_err());
}

#[test]
fn missing_env_file_is_io_error() {
    let err = build_env(&Env::new(), Some(Path::new("/nonexistent/env.json")), &[]).unwrap_err();
    assert!(matches!(err, ProcessorError::Io { .. }));
}

#[test]
fn malformed_assignment_is_rejected() {
    assert!(build_env(&Env::new(), None, &inputs(&["novalue"])).is_err());
}
