use super::*;
use crate::core::execute;
use crate::testing::{self, MockFetcher, ScriptedRunner};

fn cache_env(cache: &Path) -> Env {
    let mut env = Env::new();
    env.insert("RECIPE_CACHE_DIR", cache.to_str().unwrap());
    env
}

#[test]
fn payload_encodes_apple_id() {
    assert_eq!(
        login_payload("dev@example.com", "891bd3417a7776362562d2197f89480a8547b108fd934911bcbea0110d07f757", "pw"),
        "appleId=dev%40example.com&appIdKey=891bd3417a7776362562d2197f89480a8547b108fd934911bcbea0110d07f757&accountPassword=pw"
    );
}

#[test]
fn data_gatherer_prefers_password_file() {
    let dir = tempfile::tempdir().unwrap();
    let secret = dir.path().join("secret");
    fs::write(&secret, "from-file\n").unwrap();

    let mut env = cache_env(dir.path());
    env.insert("apple_id", "dev@example.com");
    env.insert("appID_key", "KEY");
    env.insert("password", "inline");
    env.insert("password_file", secret.to_str().unwrap());

    let out = execute(&AppleDataGatherer, &testing::offline(), &env).unwrap();
    let path = out.get_str("data_pathname").unwrap();
    assert_eq!(Path::new(path), dir.path().join("downloads").join("login_data"));
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "appleId=dev%40example.com&appIdKey=KEY&accountPassword=from-file"
    );
}

#[test]
fn data_gatherer_requires_some_password() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = cache_env(dir.path());
    env.insert("apple_id", "dev@example.com");
    env.insert("appID_key", "KEY");
    env.insert("password", "");

    let err = execute(&AppleDataGatherer, &testing::offline(), &env).unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { .. }));
    assert!(!dir.path().join("downloads").exists());
}

/// curl stand-in that writes `list_body` wherever `--output` points.
fn portal_runner(list_body: &'static [u8]) -> ScriptedRunner {
    ScriptedRunner::new().on("curl", move |spec| {
        let output = spec
            .args
            .iter()
            .position(|a| a == "--output")
            .map(|i| spec.args[i + 1].clone())
            .unwrap();
        if output != "-" {
            fs::write(&output, list_body).unwrap();
        }
        Ok(testing::ok("HTTP/1.1 200 OK\r\n\r\n"))
    })
}

fn cookie_env(cache: &Path) -> Env {
    let mut env = cache_env(cache);
    env.insert("login_data", cache.join("downloads/login_data").to_str().unwrap());
    env
}

#[test]
fn cookie_downloader_runs_login_list_and_gunzip() {
    let dir = tempfile::tempdir().unwrap();
    let runner = portal_runner(b"\x1f\x8b\x08\x00gzip");
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);

    let out = execute(&AppleCookieDownloader, &ctx, &cookie_env(dir.path())).unwrap();
    let downloads = dir.path().join("downloads");
    assert_eq!(
        Path::new(out.get_str("download_cookies").unwrap()),
        downloads.join("download_cookies")
    );

    let calls = calls.borrow();
    let programs: Vec<String> = calls.iter().map(|c| c.program_name()).collect();
    assert_eq!(programs, vec!["curl", "curl", "gunzip"]);

    assert!(calls[0].args.contains(&AUTH_URL.to_string()));
    assert!(calls[0].args.iter().any(|a| a.starts_with('@')));
    assert!(calls[1].args.contains(&"Content-length: 0".to_string()));
    assert_eq!(calls[2].cwd.as_deref(), Some(downloads.as_path()));
}

#[test]
fn cookie_downloader_detects_json_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = testing::context(
        MockFetcher::new(),
        portal_runner(br#"{"resultCode": 1100, "resultString": "not signed in"}"#),
    );
    let err = execute(&AppleCookieDownloader, &ctx, &cookie_env(dir.path())).unwrap_err();
    assert!(err.to_string().contains("Apple credentials"));
}

#[test]
fn cookie_downloader_missing_list_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().on("curl", |_| Ok(testing::exit(22, "curl: (22) 403")));
    let ctx = testing::context(MockFetcher::new(), runner);
    let err = execute(&AppleCookieDownloader, &ctx, &cookie_env(dir.path())).unwrap_err();
    assert!(matches!(err, ProcessorError::NotFound(_)));
}

#[test]
fn cookie_downloader_gunzip_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let runner = portal_runner(b"\x1f\x8b\x08\x00gzip")
        .on("gunzip", |_| Ok(testing::exit(1, "gunzip: not in gzip format")));
    let ctx = testing::context(MockFetcher::new(), runner);
    let err = execute(&AppleCookieDownloader, &ctx, &cookie_env(dir.path())).unwrap_err();
    assert!(err.to_string().contains("not in gzip format"));
}
