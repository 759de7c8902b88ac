mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let mock = MockUpstream::start().await;
    let config = ConfigBuilder::new().with_provider("anthropic", &mock.url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/nope")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}
