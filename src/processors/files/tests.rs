use super::*;
use crate::core::execute;
use crate::testing::{self, MockFetcher, ScriptedRunner};
use serde_json::json;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

#[test]
fn directory_list_joins_sorted_basenames() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.plist", "a.plist", "c.txt"] {
        touch(&dir.path().join(name));
    }
    let mut env = Env::new();
    env.insert("pattern", format!("{}/*.plist", dir.path().display()));

    let out = execute(&DirectoryList, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("found_filenames"), Some("a.plist,b.plist"));
}

#[test]
fn directory_list_can_strip_extensions_and_change_suffix() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["Foo.mobileconfig", "Bar.mobileconfig"] {
        touch(&dir.path().join(name));
    }
    let mut env = Env::new();
    env.insert("pattern", format!("{}/*", dir.path().display()));
    env.insert("remove_extension", "true");
    env.insert("suffix_string", " ");

    let out = execute(&DirectoryList, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("found_filenames"), Some("Bar Foo"));
}

#[test]
fn directory_list_without_match_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = Env::new();
    env.insert("pattern", format!("{}/*.pkg", dir.path().display()));
    let err = execute(&DirectoryList, &testing::offline(), &env).unwrap_err();
    assert!(matches!(err, ProcessorError::NotFound(_)));
}

#[test]
fn directory_list_rejects_other_find_methods() {
    let mut env = Env::new();
    env.insert("pattern", "*");
    env.insert("find_method", "regex");
    let err = execute(&DirectoryList, &testing::offline(), &env).unwrap_err();
    assert!(err.to_string().contains("Unsupported find_method"));
}

#[test]
fn directory_list_skips_dotfiles() {
    let dir = tempfile::tempdir().unwrap();
    for name in [".DS_Store", "a.plist"] {
        touch(&dir.path().join(name));
    }
    let mut env = Env::new();
    env.insert("pattern", format!("{}/*", dir.path().display()));

    let out = execute(&DirectoryList, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("found_filenames"), Some("a.plist"));
}

#[test]
fn walk_tree_is_sorted_pre_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("payload");
    touch(&root.join("z.txt"));
    touch(&root.join(".DS_Store"));
    touch(&root.join("Library/b.plist"));
    touch(&root.join("Library/Prefs/a.plist"));
    touch(&root.join("Applications/App.txt"));

    let listing = walk_tree(&root).unwrap();
    assert_eq!(
        listing.directories,
        ["Applications", "Library", "Library/Prefs"]
    );
    assert_eq!(
        listing.files,
        [
            "z.txt",
            "Applications/App.txt",
            "Library/b.plist",
            "Library/Prefs/a.plist"
        ]
    );
}

#[cfg(unix)]
#[test]
fn walk_tree_does_not_follow_directory_links() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("payload");
    touch(&root.join("real/file.txt"));
    touch(&dir.path().join("outside/secret.txt"));
    std::os::unix::fs::symlink(dir.path().join("outside"), root.join("linked")).unwrap();
    std::os::unix::fs::symlink(root.join("real/file.txt"), root.join("alias.txt")).unwrap();

    let listing = walk_tree(&root).unwrap();
    assert_eq!(listing.directories, ["real"]);
    assert_eq!(listing.files, ["alias.txt", "real/file.txt"]);
}

#[test]
fn sub_directory_list_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("payload");
    touch(&root.join("etc/motd"));
    let mut env = Env::new();
    env.insert("root_path", root.to_str().unwrap());

    let out = execute(&SubDirectoryList, &testing::offline(), &env).unwrap();
    assert_eq!(out.get_str("found_directories"), Some("etc"));
    assert_eq!(out.get_str("found_filenames"), Some("etc/motd"));
    assert_eq!(out.get_str("relative_root"), Some("payload"));
}

#[test]
fn sub_directory_list_missing_root() {
    let mut env = Env::new();
    env.insert("root_path", "/nonexistent/root");
    let err = execute(&SubDirectoryList, &testing::offline(), &env).unwrap_err();
    assert!(matches!(err, ProcessorError::NotFound(_)));
}

#[test]
fn file_appender_creates_then_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("postinstall");
    let mut env = Env::new();
    env.insert("file_path", path.to_str().unwrap());
    env.insert("file_content", "line one\n");

    execute(&FileAppender, &testing::offline(), &env).unwrap();
    env.insert("file_content", "line two\n");
    execute(&FileAppender, &testing::offline(), &env).unwrap();

    assert_eq!(fs::read_to_string(path).unwrap(), "line one\nline two\n");
}

#[test]
fn hash_of_file_md5_and_sha256() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"abc").unwrap();

    assert_eq!(
        hash_file(&path, "md5").unwrap(),
        "900150983cd24fb0d6963f7d28e17f72"
    );
    assert_eq!(
        hash_file(&path, "sha256").unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn hash_spans_multiple_chunks() {
    let data = vec![b'a'; HASH_CHUNK * 3 + 7];
    let whole = hash_reader::<Md5, _>(data.as_slice()).unwrap();
    assert_eq!(whole, hex::encode(Md5::digest(&data)));
}

#[test]
fn hash_of_file_defaults_to_md5() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty");
    fs::write(&path, b"").unwrap();
    let mut env = Env::new();
    env.insert("hashfile_path", path.to_str().unwrap());

    let out = execute(&HashOfFile, &testing::offline(), &env).unwrap();
    assert_eq!(
        out.get_str("hashoffile"),
        Some("d41d8cd98f00b204e9800998ecf8427e")
    );
}

#[test]
fn hash_of_file_rejects_unknown_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"abc").unwrap();
    let err = hash_file(&path, "crc32").unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { .. }));
}

#[test]
fn sha_checksum_takes_first_token() {
    let runner = ScriptedRunner::new().on("shasum", |_| {
        Ok(testing::ok("a9993e364706816aba3e25717850c26c9cd0d89d  /tmp/file\n"))
    });
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);
    let mut env = Env::new();
    env.insert("source_file", "/tmp/file");
    env.insert("checksum_type", "256");

    let out = execute(&SHAChecksum, &ctx, &env).unwrap();
    assert_eq!(
        out.get_str("checksum"),
        Some("a9993e364706816aba3e25717850c26c9cd0d89d")
    );
    assert_eq!(calls.borrow()[0].args, ["-a", "256", "/tmp/file"]);
}

#[test]
fn sha_checksum_fails_on_stderr() {
    let runner = ScriptedRunner::new()
        .on("shasum", |_| Ok(testing::ok_with_stderr("", "No such file")));
    let ctx = testing::context(MockFetcher::new(), runner);
    let mut env = Env::new();
    env.insert("source_file", "/tmp/missing");
    assert!(execute(&SHAChecksum, &ctx, &env).is_err());
}

#[test]
fn rsync_splits_arguments() {
    let runner = ScriptedRunner::new();
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);
    let mut env = Env::new();
    env.insert("source_path", "/src/");
    env.insert("destination_path", "/dest/");
    env.insert("rsync_arguments", "-a --exclude 'Read Me.txt'");

    execute(&Rsync, &ctx, &env).unwrap();

    let calls = calls.borrow();
    assert_eq!(calls[0].program, PathBuf::from("/usr/bin/rsync"));
    assert_eq!(
        calls[0].args,
        ["-a", "--exclude", "Read Me.txt", "/src/", "/dest/"]
    );
}

#[test]
fn rsync_honours_custom_path() {
    let runner = ScriptedRunner::new();
    let calls = runner.calls();
    let ctx = testing::context(MockFetcher::new(), runner);
    let mut env = Env::new();
    env.insert("source_path", "a");
    env.insert("destination_path", "b");
    env.insert("rsync_path", "/opt/local/bin/rsync");

    execute(&Rsync, &ctx, &env).unwrap();
    let calls = calls.borrow();
    assert_eq!(calls[0].program, PathBuf::from("/opt/local/bin/rsync"));
    assert_eq!(calls[0].args, ["a", "b"]);
}

#[test]
fn installs_array_type_is_replaced() {
    let mut env = Env::new();
    env.insert(
        "additional_pkginfo",
        json!({
            "name": "Tool",
            "installs": [
                {"path": "/Applications/Tool.app", "type": "application"},
                {"path": "/usr/local/bin/tool", "type": "file"}
            ]
        }),
    );
    env.insert(
        "changes",
        json!([{"path": "/Applications/Tool.app", "type": "file"}]),
    );

    let out = execute(&InstallsArrayFineTuning, &testing::offline(), &env).unwrap();
    assert_eq!(
        out.get("changed_pkginfo"),
        Some(&json!({
            "name": "Tool",
            "installs": [
                {"path": "/Applications/Tool.app", "type": "file"},
                {"path": "/usr/local/bin/tool", "type": "file"}
            ]
        }))
    );
}

#[test]
fn installs_change_needs_path_and_type() {
    let pkginfo = json!({"installs": []}).as_object().unwrap().clone();
    let change = json!({"path": "/Applications/Tool.app"})
        .as_object()
        .unwrap()
        .clone();
    let err = apply_install_changes(pkginfo, &[change]).unwrap_err();
    assert!(err.to_string().contains("No type found"));
}

#[test]
fn listing_and_installs_tweaks_repeat_identically() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("b/c.txt"));
    touch(&dir.path().join("a.txt"));
    let ctx = testing::offline();

    let mut listing_env = Env::new();
    listing_env.insert("root_path", dir.path().to_str().unwrap());
    let first = execute(&SubDirectoryList, &ctx, &listing_env).unwrap();
    let second = execute(&SubDirectoryList, &ctx, &listing_env).unwrap();
    assert_eq!(first, second);

    let mut installs_env = Env::new();
    installs_env.insert(
        "additional_pkginfo",
        json!({"installs": [{"path": "/Applications/Tool.app", "type": "application"}]}),
    );
    installs_env.insert(
        "changes",
        json!([{"path": "/Applications/Tool.app", "type": "file"}]),
    );
    let first = execute(&InstallsArrayFineTuning, &ctx, &installs_env).unwrap();
    let second = execute(&InstallsArrayFineTuning, &ctx, &installs_env).unwrap();
    assert_eq!(first, second);
}
