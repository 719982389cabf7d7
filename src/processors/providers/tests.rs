use super::*;
use crate::core::execute;
use crate::net::FetchResponse;
use crate::testing::{self, MockFetcher, ScriptedRunner};

const UPDATES_XML: &str = r#"<products>
  <product name="IntelliJ IDEA">
    <code>IC</code>
    <channel id="IC-IU-EAP-licensing-EAP" status="eap">
      <build number="201.3803" version="2020.1"/>
    </channel>
    <channel id="IC-IU-RELEASE-licensing-RELEASE" status="release">
      <build number="193.6015.39" version="2019.3.2"/>
      <build number="192.7142.36" version="2019.2.4"/>
      <build number="193.5662.53" version="2019.3.1"/>
    </channel>
  </product>
  <product name="PyCharm">
    <channel id="PC-RELEASE" status="release"><build version="2030.1"/></channel>
  </product>
</products>"#;

#[test]
fn intellij_picks_highest_release_build() {
    assert_eq!(latest_intellij_version(UPDATES_XML).unwrap(), "2019.3.2");
}

#[test]
fn intellij_builds_edition_url() {
    let feed = "https://feeds.example.test/updates.xml";
    let ctx = testing::context(MockFetcher::new().respond(feed, UPDATES_XML), ScriptedRunner::new());
    let mut env = Env::new();
    env.insert("version_url", feed);
    env.insert("edition", "U");
    let out = execute(&IntellijURLProvider, &ctx, &env).unwrap();
    assert_eq!(
        out.get_str("url"),
        Some("https://download.jetbrains.com/idea/ideaIU-2019.3.2.dmg")
    );
    assert_eq!(out.get_str("version"), Some("2019.3.2"));
}

#[test]
fn intellij_without_release_channel_is_not_found() {
    let feed = r#"<products><product name="IntelliJ IDEA"><channel status="eap"><build version="1"/></channel></product></products>"#;
    assert!(matches!(
        latest_intellij_version(feed),
        Err(ProcessorError::NotFound(_))
    ));
}

const RELEASES_JSON: &str = r#"{
  "release_name": "jdk8u232-b09",
  "binaries": [{
    "os": "mac",
    "binary_link": "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.tar.gz",
    "checksum_link": "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.tar.gz.sha256.txt",
    "installer_link": "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.pkg",
    "installer_checksum_link": "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.pkg.sha256.txt",
    "version_data": {"openjdk_version": "1.8.0_232-b09", "semver": "8.0.232+9"}
  }]
}"#;

fn adopt_context() -> (AppContext, testing::CallLog<FetchRequest>) {
    let api = adoptopenjdk_query_url(ADOPTOPENJDK_API_URL, "8", "hotspot", "jdk", "latest");
    let fetcher = MockFetcher::new()
        .respond(&api, RELEASES_JSON)
        .respond(
            "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.pkg.sha256.txt",
            "a1b2c3  OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.pkg\n",
        )
        .respond(
            "https://github.test/OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.tar.gz.sha256.txt",
            "d4e5f6  OpenJDK8U-jdk_x64_mac_hotspot_8u232b09.tar.gz\n",
        );
    let requests = fetcher.requests();
    (testing::context(fetcher, ScriptedRunner::new()), requests)
}

#[test]
fn adoptopenjdk_query_layout() {
    assert_eq!(
        adoptopenjdk_query_url(ADOPTOPENJDK_API_URL, "11", "openj9", "jre", "latest"),
        "https://api.adoptopenjdk.net/v2/info/releases/openjdk11?os=mac&openjdk_impl=openj9&type=jre&release=latest"
    );
}

#[test]
fn adoptopenjdk_pkg_uses_installer_links() {
    let (ctx, requests) = adopt_context();
    let mut env = Env::new();
    env.insert("jdk_version", "8");
    let out = execute(&AdoptOpenJDKURLProvider, &ctx, &env).unwrap();
    assert_eq!(out.get_str("version"), Some("8.0.232+9"));
    assert_eq!(out.get_str("checksum"), Some("a1b2c3"));
    assert!(out.get_str("url").unwrap().ends_with(".pkg"));
    assert_eq!(requests.borrow().len(), 2);
}

#[test]
fn adoptopenjdk_tgz_uses_binary_links() {
    let (ctx, _) = adopt_context();
    let mut env = Env::new();
    env.insert("jdk_version", "8");
    env.insert("binary_type", "tgz");
    let out = execute(&AdoptOpenJDKURLProvider, &ctx, &env).unwrap();
    assert_eq!(out.get_str("checksum"), Some("d4e5f6"));
    assert!(out.get_str("url").unwrap().ends_with(".tar.gz"));
}

#[test]
fn adoptopenjdk_rejects_unknown_jvm() {
    let (ctx, requests) = adopt_context();
    let mut env = Env::new();
    env.insert("jdk_version", "8");
    env.insert("jvm_type", "graal");
    let err = execute(&AdoptOpenJDKURLProvider, &ctx, &env).unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { ref key, .. } if key == "jvm_type"));
    assert!(requests.borrow().is_empty());
}

#[test]
fn acrolinx_returns_redirect_target() {
    let redirected = FetchResponse {
        status: 200,
        final_url: "https://cdn.acrolinx.test/acrolinx-2019.10.zip".to_string(),
        ..FetchResponse::default()
    };
    let fetcher = MockFetcher::new().respond_with(ACROLINX_URL, redirected);
    let requests = fetcher.requests();
    let ctx = testing::context(fetcher, ScriptedRunner::new());

    let mut env = Env::new();
    env.insert("username", "builder");
    env.insert("password", "secret");
    let out = execute(&AcrolinxURLProvider, &ctx, &env).unwrap();
    assert_eq!(out.get_str("url"), Some("https://cdn.acrolinx.test/acrolinx-2019.10.zip"));

    let sent = &requests.borrow()[0];
    assert_eq!(sent.method, crate::net::Method::Head);
    assert_eq!(sent.basic_auth, Some(("builder".to_string(), "secret".to_string())));
}

#[test]
fn acrolinx_without_redirect_is_not_found() {
    let fetcher = MockFetcher::new().respond(ACROLINX_URL, "");
    let ctx = testing::context(fetcher, ScriptedRunner::new());
    let mut env = Env::new();
    env.insert("username", "builder");
    env.insert("password", "wrong");
    let err = execute(&AcrolinxURLProvider, &ctx, &env).unwrap_err();
    assert!(err.to_string().contains("username and password"));
}
