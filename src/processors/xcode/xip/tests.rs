use super::*;
use crate::core::execute;
use crate::testing::{self, MockFetcher, ScriptedRunner};
use std::io::Cursor;

fn pbzx_stream(chunks: &[&[u8]]) -> Vec<u8> {
    let mut stream = PBZX_MAGIC.to_vec();
    stream.extend_from_slice(&PBZX_MORE_CHUNKS.to_be_bytes());
    for (idx, chunk) in chunks.iter().enumerate() {
        let flags = if idx + 1 < chunks.len() { PBZX_MORE_CHUNKS } else { 0 };
        stream.extend_from_slice(&flags.to_be_bytes());
        stream.extend_from_slice(&(chunk.len() as u64).to_be_bytes());
        stream.extend_from_slice(chunk);
    }
    stream
}

fn xz_chunk(payload: &[u8]) -> Vec<u8> {
    let mut chunk = XZ_MAGIC.to_vec();
    chunk.extend_from_slice(payload);
    chunk
}

#[test]
fn decode_pbzx_concatenates_xz_chunks() {
    let first = xz_chunk(b"first");
    let second = xz_chunk(b"second");
    let stream = pbzx_stream(&[&first, &second]);

    let mut out = Vec::new();
    let written = decode_pbzx(Cursor::new(stream), &mut out).unwrap();

    let mut expected = first.clone();
    expected.extend_from_slice(&second);
    assert_eq!(out, expected);
    assert_eq!(written, expected.len() as u64);
}

#[test]
fn decode_pbzx_rejects_wrong_magic() {
    let err = decode_pbzx(Cursor::new(b"xar!\0\0\0\0".to_vec()), Vec::new()).unwrap_err();
    assert!(err.to_string().contains("Not a pbzx file"));
}

#[test]
fn decode_pbzx_rejects_non_xz_chunk() {
    let stream = pbzx_stream(&[b"plain payload"]);
    let err = decode_pbzx(Cursor::new(stream), Vec::new()).unwrap_err();
    assert!(err.to_string().contains("xz header"));
}

#[test]
fn decode_pbzx_stops_on_short_flags() {
    let mut stream = PBZX_MAGIC.to_vec();
    stream.extend_from_slice(&PBZX_MORE_CHUNKS.to_be_bytes());
    stream.extend_from_slice(&[0, 0, 1]);
    let mut out = Vec::new();
    assert_eq!(decode_pbzx(Cursor::new(stream), &mut out).unwrap(), 0);
    assert!(out.is_empty());
}

fn xip_env(dir: &Path) -> Env {
    let xip = dir.join("Xcode_11.xip");
    fs::write(&xip, b"xar!").unwrap();
    let mut env = Env::new();
    env.insert("PKG", xip.to_str().unwrap());
    env.insert("RECIPE_CACHE_DIR", dir.to_str().unwrap());
    env.insert("NAME", "Xcode");
    env
}

/// xar drops a pbzx `Content`, gunzip turns `Content.xz` into `Content`, and
/// ditto lays down an app bundle.
fn unpacking_runner(content: Vec<u8>) -> ScriptedRunner {
    ScriptedRunner::new()
        .on("xar", move |spec| {
            let dest = PathBuf::from(&spec.args[3]);
            fs::write(dest.join("Content"), &content).unwrap();
            Ok(testing::ok(""))
        })
        .on("gunzip", |spec| {
            let xz = PathBuf::from(&spec.args[1]);
            fs::write(xz.with_extension(""), b"cpio").unwrap();
            fs::remove_file(xz).unwrap();
            Ok(testing::ok(""))
        })
        .on("ditto", |spec| {
            let dest = PathBuf::from(&spec.args[2]);
            fs::create_dir_all(dest.join("Xcode-beta.app/Contents")).unwrap();
            Ok(testing::ok(""))
        })
}

#[test]
fn unpacks_into_default_output_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let env = xip_env(dir.path());
    let runner = unpacking_runner(pbzx_stream(&[&xz_chunk(b"payload")]));
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);

    let out = execute(&XcodeXIPUnpacker, &ctx, &env).unwrap();

    let unpack = dir.path().join("Xcode_unpack");
    assert_eq!(
        out.get_str("output_app"),
        Some(unpack.join("Xcode-beta.app").to_str().unwrap())
    );
    assert!(!unpack.join("xar").exists());
    assert!(!unpack.join("temp").exists());

    let programs: Vec<String> = calls.borrow().iter().map(|c| c.program_name()).collect();
    assert_eq!(programs, ["xar", "gunzip", "ditto"]);
    assert_eq!(
        calls.borrow()[1].cwd.as_deref(),
        Some(unpack.join("temp").as_path())
    );
}

#[test]
fn nocleanup_keeps_intermediate_archives() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = xip_env(dir.path());
    env.insert("nocleanup", true);
    let runner = unpacking_runner(pbzx_stream(&[&xz_chunk(b"payload")]));
    let ctx = testing::context(MockFetcher::new(), runner);

    execute(&XcodeXIPUnpacker, &ctx, &env).unwrap();

    let unpack = dir.path().join("Xcode_unpack");
    assert!(unpack.join("xar/Content").is_file());
    assert!(unpack.join("temp/Content").is_file());
}

#[test]
fn missing_xip_fails_before_creating_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = Env::new();
    env.insert("PKG", dir.path().join("absent.xip").to_str().unwrap());
    let output = dir.path().join("out");
    env.insert("output_path", output.to_str().unwrap());

    let runner = ScriptedRunner::new();
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);
    let err = execute(&XcodeXIPUnpacker, &ctx, &env).unwrap_err();

    assert!(matches!(err, ProcessorError::NotFound(_)));
    assert!(!output.exists());
    assert!(calls.borrow().is_empty());
}

#[test]
fn corrupt_payload_removes_created_output() {
    let dir = tempfile::tempdir().unwrap();
    let env = xip_env(dir.path());
    let runner = unpacking_runner(b"garbage".to_vec());
    let ctx = testing::context(MockFetcher::new(), runner);

    let err = execute(&XcodeXIPUnpacker, &ctx, &env).unwrap_err();

    assert!(matches!(err, ProcessorError::Format(_)));
    assert!(!dir.path().join("Xcode_unpack").exists());
}

#[test]
fn output_path_needs_cache_dir_and_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = Env::new();
    let xip = dir.path().join("Xcode.xip");
    fs::write(&xip, b"xar!").unwrap();
    env.insert("PKG", xip.to_str().unwrap());

    let err = execute(&XcodeXIPUnpacker, &testing::offline(), &env).unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { .. }));
}
