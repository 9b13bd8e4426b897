use repo_slice::{EntryKind, FetchError, Provider, ResolvedLocation, browse};
use repo_slice_forge::{GitHubConfig, GitHubProvider};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer, token: Option<&str>) -> GitHubProvider {
    GitHubProvider::new(GitHubConfig {
        owner: "acme".into(),
        repo: "widgets".into(),
        token: token.map(str::to_owned),
        api_base_url: Some(server.uri()),
    })
}

async fn mount_refs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/heads/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ref": "refs/heads/main"},
            {"ref": "refs/heads/release"},
            {"ref": "refs/heads/release/1.x"},
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/tags/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ref": "refs/tags/v1.0"},
        ])))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn references_are_stripped_of_namespace() {
    let server = MockServer::start().await;
    mount_refs(&server).await;

    let refs = provider_for(&server, None).list_references().await.unwrap();

    assert_eq!(refs.branches, vec!["main", "release", "release/1.x"]);
    assert_eq!(refs.tags, vec!["v1.0"]);
}

#[tokio::test]
async fn browse_resolves_longest_ref_then_lists_tree() {
    let server = MockServer::start().await;
    mount_refs(&server).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/docs"))
        .and(query_param("ref", "release/1.x"))
        .and(header("Accept", "application/vnd.github.object+json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"type": "dir", "sha": "t-docs"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let blob_url = format!("{}/repos/acme/widgets/git/blobs/b1", server.uri());
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/t-docs"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "t-docs",
            "tree": [
                {"path": "guide.md", "type": "blob", "sha": "b1", "url": blob_url},
                {"path": "api", "type": "tree", "sha": "t2"},
                {"path": "api/index.md", "type": "blob", "sha": "b2"},
            ],
            "truncated": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, None);
    let result = browse(&provider, "release/1.x/docs").await.unwrap();

    assert_eq!(result.location, ResolvedLocation::new("release/1.x", "docs"));

    let paths: Vec<&str> = result.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["docs/guide.md", "docs/api", "docs/api/index.md"]);
    assert_eq!(result.entries[1].kind, EntryKind::Tree);
    assert_eq!(result.entries[0].content_url, blob_url);
    assert_eq!(result.entries[0].handle.as_deref(), Some("b1"));

    // rows without a url fall back to the contents endpoint
    assert!(
        result.entries[2]
            .content_url
            .ends_with("/repos/acme/widgets/contents/docs/api/index.md?ref=release%2F1.x")
    );
    assert_eq!(result.blobs().count(), 2);
}

#[tokio::test]
async fn empty_suffix_skips_reference_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "root"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [{"path": "README.md", "type": "blob", "sha": "r"}]
        })))
        .mount(&server)
        .await;

    let result = browse(&provider_for(&server, None), "").await.unwrap();

    assert_eq!(result.location, ResolvedLocation::default());
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].path, "README.md");
}

#[tokio::test]
async fn missing_sha_falls_back_to_ref() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tree": []})))
        .expect(1)
        .mount(&server)
        .await;

    let entries = provider_for(&server, None)
        .list_tree(&ResolvedLocation::new("main", ""))
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn missing_sha_below_root_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    // the ref would list the repository root, not `docs`
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [
                {"path": "README.md", "type": "blob", "sha": "r"},
                {"path": "docs/guide.md", "type": "blob", "sha": "g"},
            ]
        })))
        .expect(0)
        .mount(&server)
        .await;

    let result = provider_for(&server, None)
        .list_tree(&ResolvedLocation::new("main", "docs"))
        .await;
    assert!(matches!(result, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn failed_tag_listing_fails_references() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/heads/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ref": "refs/heads/main"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/tags/"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
        .mount(&server)
        .await;

    let result = provider_for(&server, None).list_references().await;
    assert_eq!(result.unwrap_err(), FetchError::RateLimited);
}

#[tokio::test]
async fn token_is_sent_with_github_scheme() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/heads/"))
        .and(header("Authorization", "token s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/matching-refs/tags/"))
        .and(header("Authorization", "token s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let refs = provider_for(&server, Some("s3cret"))
        .list_references()
        .await
        .unwrap();
    assert!(refs.branches.is_empty());
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let result = provider_for(&server, None).list_references().await;
    assert_eq!(result.unwrap_err(), FetchError::NotFound);
}

#[tokio::test]
async fn exhausted_quota_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let result = provider_for(&server, None)
        .list_tree(&ResolvedLocation::new("main", "src"))
        .await;
    assert_eq!(result.unwrap_err(), FetchError::RateLimited);
}

#[tokio::test]
async fn forbidden_with_quota_left_is_transport() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "12"))
        .mount(&server)
        .await;

    let result = provider_for(&server, None).list_references().await;
    assert_eq!(result.unwrap_err(), FetchError::Transport(403));
}

#[tokio::test]
async fn server_error_is_transport() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = provider_for(&server, None)
        .list_tree(&ResolvedLocation::new("main", ""))
        .await;
    assert_eq!(result.unwrap_err(), FetchError::Transport(502));
}

#[tokio::test]
async fn truncated_tree_still_returns_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "big"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/big"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [{"path": "a.txt", "type": "blob", "sha": "a"}],
            "truncated": true
        })))
        .mount(&server)
        .await;

    let entries = provider_for(&server, None)
        .list_tree(&ResolvedLocation::new("main", ""))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = provider_for(&server, None).list_references().await;
    assert!(matches!(result, Err(FetchError::Decode(_))));
}
