use skillforge_sources::{
    fetch_marketplace, FetchError, FetchOptions, ProviderHosts, SourceCache, SourceFetcher,
};
use skillforge_test_utils::tarball;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOURCE: &str = "github:acme/skills";
const ARCHIVE: &str = "/acme/skills/archive/main.tar.gz";

fn archive() -> Vec<u8> {
    tarball(
        "skills-main",
        &[
            ("web/react/SKILL.md", "---\nname: react\ndescription: React\n---\n"),
            (
                ".claude-plugin/marketplace.json",
                r#"{"name": "acme", "plugins": [{"name": "web", "source": "./web"}]}"#,
            ),
        ],
    )
    .unwrap()
}

fn fetcher(server: &MockServer, cache: &std::path::Path) -> SourceFetcher {
    SourceFetcher::new(SourceCache::new(cache)).with_hosts(ProviderHosts::all(server.uri()))
}

#[tokio::test]
async fn second_fetch_is_served_from_cache_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path());

    let first = fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();
    assert!(!first.from_cache);
    assert!(first.path.join("web/react/SKILL.md").is_file());

    let second = fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(first.path, second.path);
}

#[tokio::test]
async fn forced_refresh_redownloads_without_conditional_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .and(header_exists("if-none-match"))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_bytes(archive()),
        )
        .expect(2)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path());
    fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();
    assert!(fetcher.cache().cached_tarball(SOURCE).is_some());

    let refreshed = fetcher
        .fetch(
            SOURCE,
            &FetchOptions {
                force_refresh: true,
                subdir: Some("web".into()),
            },
        )
        .await
        .unwrap();
    assert!(!refreshed.from_cache);
    assert!(refreshed.path.ends_with("web"));
    assert!(refreshed.path.join("react/SKILL.md").is_file());
}

#[tokio::test]
async fn etag_revalidation_reuses_cached_tarball() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .and(header("if-none-match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_bytes(archive()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path());
    fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();

    // Extracted tree gone, transport cache still present.
    fetcher.cache().remove(SOURCE).unwrap();
    let again = fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();
    assert!(!again.from_cache);
    assert!(again.path.join("web/react/SKILL.md").is_file());
}

#[tokio::test]
async fn http_statuses_map_to_actionable_errors() {
    let server = MockServer::start().await;
    for (org, status) in [("missing", 404u16), ("noauth", 401), ("denied", 403), ("broken", 500)] {
        Mock::given(method("GET"))
            .and(path(format!("/{org}/skills/archive/main.tar.gz")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path());
    let fetch = |org: &'static str| {
        let fetcher = fetcher.clone();
        async move {
            fetcher
                .fetch(&format!("github:{org}/skills"), &FetchOptions::default())
                .await
                .unwrap_err()
        }
    };

    assert!(matches!(fetch("missing").await, FetchError::NotFound { .. }));
    assert!(matches!(fetch("noauth").await, FetchError::Unauthorized { .. }));
    assert!(matches!(fetch("denied").await, FetchError::Forbidden { .. }));
    let other = fetch("broken").await;
    assert!(matches!(other, FetchError::Other { .. }));
    assert!(other.to_string().contains("500"));
    assert!(!tmp.path().join("sources").read_dir().map(|mut d| d.next().is_some()).unwrap_or(false));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = SourceFetcher::new(SourceCache::new(tmp.path()))
        .with_hosts(ProviderHosts::all("http://127.0.0.1:1"));
    let err = fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));
    assert!(err.remediation().is_some());
}

#[tokio::test]
async fn auth_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive()))
        .expect(1)
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path()).with_auth_token(Some("s3cret".into()));
    fetcher.fetch(SOURCE, &FetchOptions::default()).await.unwrap();
}

#[tokio::test]
async fn marketplace_loads_from_remote_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive()))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(&server, tmp.path());

    let loaded = fetch_marketplace(&fetcher, SOURCE, false).await.unwrap();
    assert_eq!(loaded.marketplace.name, "acme");
    assert_eq!(loaded.marketplace.plugins[0].name, "web");
    assert!(loaded.root.join("web/react/SKILL.md").is_file());
    assert!(loaded.warnings.is_empty());
}

#[tokio::test]
async fn marketplace_without_manifest_is_a_hard_error() {
    let tmp = tempfile::tempdir().unwrap();
    let content = tmp.path().join("content");
    std::fs::create_dir_all(&content).unwrap();
    let fetcher = SourceFetcher::new(SourceCache::new(tmp.path().join("cache")));

    let err = fetch_marketplace(&fetcher, &content.to_string_lossy(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MarketplaceMissing { .. }));
    assert!(err.remediation().unwrap().contains("marketplace.json"));
}
