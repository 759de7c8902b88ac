//! Client authentication in front of `POST /v1/messages`, exercised through the real router
//! rather than the middleware in isolation.

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;

fn request_body() -> serde_json::Value {
    serde_json::json!({
        "model": "claude-opus-4-5",
        "max_tokens": 16,
        "messages": [{"role": "user", "content": "hi"}],
    })
}

#[tokio::test]
async fn rejects_requests_missing_the_configured_api_key() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).with_client_auth(Some("relay-secret"), None).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().post(server.url("/v1/messages")).json(&request_body()).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn accepts_a_matching_api_key() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).with_client_auth(Some("relay-secret"), None).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/messages"))
        .header("x-api-key", "relay-secret")
        .json(&request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn models_and_health_stay_open_even_when_messages_requires_auth() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).with_client_auth(Some("relay-secret"), None).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/v1/models")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn anonymous_access_is_allowed_when_no_auth_is_configured() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().post(server.url("/v1/messages")).json(&request_body()).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
