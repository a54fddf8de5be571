//! Marathon submission tests against a stub scheduler

use std::time::Duration;

use mockito::{Matcher, Server};
use tokio::net::TcpListener;

use deployctl::config::headers::to_header_map;
use deployctl::errors::DeployError;
use deployctl::marathon::client::MarathonClient;

const PAYLOAD: &str = r#"{
    "id": "/hello",
    "apps": [
        {
            "id": "web",
            "container": {
                "type": "DOCKER",
                "docker": {
                    "image": "index.docker.io/library/hello-world:1.0"
                }
            }
        }
    ]
}"#;

fn client() -> MarathonClient {
    MarathonClient::new(Duration::from_secs(5))
        .unwrap()
        .with_scheme("http")
}

fn groups_path() -> Matcher {
    Matcher::Regex(r"^/v2/groups".to_string())
}

/// Accept connections and never answer them
async fn silent_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr.to_string()
}

async fn submit(server: &Server, force: bool) -> Result<deployctl::marathon::models::DeploymentResult, DeployError> {
    client()
        .submit(
            &server.host_with_port(),
            PAYLOAD.as_bytes(),
            &Default::default(),
            force,
        )
        .await
}

#[tokio::test]
async fn test_submit_accepted() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", groups_path())
        .match_header("content-type", "application/json")
        .match_body(PAYLOAD)
        .with_status(200)
        .with_body(r#"{"version":"2017-08-01T12:00:00.000Z","deploymentId":"abc123"}"#)
        .expect(1)
        .create_async()
        .await;

    let result = submit(&server, false).await.unwrap();
    assert_eq!(result.deployment_id, "abc123");
    assert_eq!(result.version, "2017-08-01T12:00:00.000Z");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_created_counts_as_success() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(201)
        .with_body(r#"{"deploymentId":"def456"}"#)
        .create_async()
        .await;

    let result = submit(&server, false).await.unwrap();
    assert_eq!(result.deployment_id, "def456");
}

#[tokio::test]
async fn test_submit_forced() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", groups_path())
        .match_query(Matcher::UrlEncoded("force".into(), "true".into()))
        .with_status(200)
        .with_body(r#"{"deploymentId":"abc123"}"#)
        .expect(1)
        .create_async()
        .await;

    submit(&server, true).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_sends_configured_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", groups_path())
        .match_header("oauthemail", "no-reply@example.com")
        .match_header("oauthaccesstoken", "s3cret")
        .with_status(200)
        .with_body(r#"{"deploymentId":"abc123"}"#)
        .expect(1)
        .create_async()
        .await;

    let headers = to_header_map(&[
        ("OauthEmail".to_string(), "no-reply@example.com".to_string()),
        ("OauthAccessToken".to_string(), "s3cret".to_string()),
    ])
    .unwrap();

    client()
        .submit(&server.host_with_port(), PAYLOAD.as_bytes(), &headers, false)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_missing_deployment_id() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(200)
        .with_body(r#"{"version":"2017-08-01T12:00:00.000Z"}"#)
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    assert!(matches!(err, DeployError::IncompleteResultError(_)), "{:?}", err);
    assert!(err.to_string().starts_with("Deployment ID empty."));
}

#[tokio::test]
async fn test_submit_empty_body() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(200)
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    assert!(matches!(err, DeployError::IncompleteResultError(_)), "{:?}", err);
}

#[tokio::test]
async fn test_submit_rejected_echoes_payload() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(422)
        .with_body(
            r#"{"message":"Object is not valid","details":[{"path":"/apps(0)/cpus","errors":["error.min"]}]}"#,
        )
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    assert!(matches!(err, DeployError::SchedulerRejectedError { .. }), "{:?}", err);

    let message = err.to_string();
    assert!(message.starts_with("422"));
    assert!(message.contains("message: 'Object is not valid'"));
    assert!(message.contains("/apps(0)/cpus: error.min"));
    assert!(message.ends_with(PAYLOAD));
}

#[tokio::test]
async fn test_submit_redirect_is_not_followed() {
    let mut server = Server::new_async().await;
    let location = format!("{}/marathon/v2/groups", server.url());
    server
        .mock("PUT", groups_path())
        .with_status(302)
        .with_header("location", &location)
        .create_async()
        .await;
    let followed = server
        .mock("PUT", "/marathon/v2/groups")
        .with_status(200)
        .with_body(r#"{"deploymentId":"abc123"}"#)
        .expect(0)
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    match err {
        DeployError::RedirectError { status, location: found, .. } => {
            assert!(status.starts_with("302"));
            assert_eq!(found, location);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    followed.assert_async().await;
}

#[tokio::test]
async fn test_submit_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(500)
        .with_body(r#"{"message":"internal error"}"#)
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    match err {
        DeployError::UnexpectedStatusError { method, status, body, .. } => {
            assert_eq!(method, "PUT");
            assert!(status.starts_with("500"));
            assert!(body.contains("internal error"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_non_json_response() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", groups_path())
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let err = submit(&server, false).await.unwrap_err();
    assert!(matches!(err, DeployError::ParseError(_)), "{:?}", err);
    assert!(err.to_string().contains("Bad Gateway"));
}

#[tokio::test]
async fn test_submit_timeout_is_cancelled() {
    let host = silent_listener().await;
    let client = MarathonClient::new(Duration::from_secs(1))
        .unwrap()
        .with_scheme("http");

    let err = client
        .submit(&host, PAYLOAD.as_bytes(), &Default::default(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::CancelledError(_)), "{:?}", err);
    assert!(err.to_string().contains("PUT"));
}
