use super::*;
use crate::core::execute;
use crate::testing;
use serde_json::json;

fn name_input(value: serde_json::Value) -> XcodeNameInput {
    serde_json::from_value(value).unwrap()
}

#[test]
fn split_version_normalizes_patch() {
    let parts = split_version("10.2").unwrap();
    assert_eq!(parts.major_version, "10");
    assert_eq!(parts.minor_version, "2");
    assert_eq!(parts.patch_version, "0");

    assert_eq!(split_version("11.3.1").unwrap().patch_version, "1");
}

#[test]
fn split_version_rejects_single_component() {
    let err = split_version("11").unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { .. }));
}

#[test]
fn unversioned_names() {
    let base = json!({
        "should_produce_versioned_name": "",
        "major_version": "11", "minor_version": "3", "patch_version": "1",
        "is_beta": false
    });
    assert_eq!(xcode_filename(&name_input(base.clone())), "Xcode");

    let mut beta = base;
    beta["is_beta"] = json!(true);
    assert_eq!(xcode_filename(&name_input(beta)), "Xcode-beta");
}

#[test]
fn versioned_beta_lowercase_with_suffix() {
    let input = name_input(json!({
        "should_produce_versioned_name": "yes",
        "major_version": 10, "minor_version": 2, "patch_version": 0,
        "is_beta": "True",
        "beta_version": "4",
        "should_lowercase": "1",
        "suffix": "_cache"
    }));
    assert_eq!(xcode_filename(&input), "xcode_10.2.0_beta_4_cache");
}

#[test]
fn file_namer_defaults_beta_number_to_zero() {
    let env: Env = serde_json::from_value(json!({
        "should_produce_versioned_name": true,
        "major_version": "11", "minor_version": "0", "patch_version": "0",
        "is_beta": true
    }))
    .unwrap();
    let out = execute(&XcodeFileNamer, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("xcode_filename"), Some("Xcode_11.0.0_beta_0"));
}

#[test]
fn derived_filename_uses_url_path() {
    assert_eq!(
        derived_filename("https://download.developer.apple.com/Developer_Tools/Xcode_10.2.1/Xcode_10.2.1.xip").unwrap(),
        "xcode_10.2.1"
    );
}

#[test]
fn version_emitter_skips_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("version.txt");
    let mut env = Env::new();
    env.insert("url", "https://download.developer.apple.com/Xcode_11.xip");
    env.insert("output_filepath", target.to_str().unwrap());

    let out = execute(&XcodeVersionEmitter, &testing::offline(), &env).unwrap();
    assert!(out.is_empty());
    assert!(!target.exists());
}

#[test]
fn version_emitter_writes_derived_name() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("version.txt");
    let mut env = Env::new();
    env.insert("dont_skip", true);
    env.insert("url", "https://download.developer.apple.com/Developer_Tools/Xcode_11_Beta_2/Xcode_11_Beta_2.xip");
    env.insert("output_filepath", target.to_str().unwrap());

    let out = execute(&XcodeVersionEmitter, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("derived_filename"), Some("xcode_11_beta_2"));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "xcode_11_beta_2");
}

#[test]
fn build_number_emitter_writes_build() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("build.txt");
    let mut env = Env::new();
    env.insert("dont_skip", "1");
    env.insert("build_version", "11C505");
    env.insert("output_filepath", target.to_str().unwrap());

    let out = execute(&XcodeBuildNumberEmitter, &testing::offline(), &env).unwrap();
    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "11C505");
}

#[test]
fn version_emitter_rewrites_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("version.txt");
    let ctx = testing::offline();
    let mut env = Env::new();
    env.insert("dont_skip", true);
    env.insert("url", "https://download.developer.apple.com/Developer_Tools/Xcode_11.3.1/Xcode_11.3.1.xip");
    env.insert("output_filepath", target.to_str().unwrap());

    let first = execute(&XcodeVersionEmitter, &ctx, &env).unwrap();
    let written = std::fs::read_to_string(&target).unwrap();
    let second = execute(&XcodeVersionEmitter, &ctx, &env).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), written);
}
