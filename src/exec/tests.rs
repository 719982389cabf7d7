use super::*;
use crate::testing::{self, MockFetcher, ScriptedRunner};
use crate::traits::CommandRunner;
use std::time::Duration;

#[test]
fn display_quotes_arguments_with_spaces() {
    let spec = CommandSpec::new("/usr/bin/ditto")
        .args(["-x", "/tmp/Xcode unpack/Content"]);
    assert_eq!(
        spec.to_string(),
        "/usr/bin/ditto -x '/tmp/Xcode unpack/Content'"
    );
}

#[test]
fn nonzero_exit_is_fatal_under_both_policies() {
    for policy in [StderrPolicy::Fatal, StderrPolicy::Warn] {
        let runner = ScriptedRunner::new().on("make", |_| Ok(testing::exit(2, "no rule")));
        let ctx = testing::context(MockFetcher::new(), runner);
        let err = run_checked(&ctx, &CommandSpec::new("/usr/bin/make"), policy).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit status 2"), "{}", msg);
        assert!(msg.contains("no rule"), "{}", msg);
    }
}

#[test]
fn stderr_fails_only_under_fatal_policy() {
    let runner = || ScriptedRunner::new().on("xar", |_| Ok(testing::ok_with_stderr("", "odd")));
    let spec = CommandSpec::new("/usr/bin/xar").arg("-xf");

    let ctx = testing::context(MockFetcher::new(), runner());
    assert!(run_checked(&ctx, &spec, StderrPolicy::Fatal).is_err());

    let ctx = testing::context(MockFetcher::new(), runner());
    let out = run_checked(&ctx, &spec, StderrPolicy::Warn).expect("warn policy passes");
    assert_eq!(out.stderr, "odd");
}

#[test]
fn system_runner_captures_both_streams() {
    let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2"]);
    let output = SystemRunner::default().run(&spec).expect("sh runs");
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
}

#[test]
fn system_runner_honours_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec::new("sh")
        .args(["-c", "pwd"])
        .current_dir(dir.path());
    let output = SystemRunner::default().run(&spec).unwrap();
    let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
    assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
}

#[test]
fn system_runner_kills_on_timeout() {
    let spec = CommandSpec::new("sleep").arg("5");
    let err = SystemRunner::new(Some(Duration::from_millis(100)))
        .run(&spec)
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[test]
fn missing_program_is_command_failure() {
    let spec = CommandSpec::new("/nonexistent/procpack-tool");
    let err = SystemRunner::default().run(&spec).unwrap_err();
    assert!(matches!(err, crate::error::ProcessorError::CommandFailed { .. }));
}
