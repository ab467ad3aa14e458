use serde_json::json;
use warren_client::{ApiError, ClientConfig, HttpClient, ManagementApi, ObjectKey, ObjectKind};
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = ClientConfig {
        endpoint: format!("{}/", server.uri()),
        username: "admin".into(),
        password: "secret".into(),
        ..ClientConfig::default()
    };
    HttpClient::new(&config).unwrap()
}

#[tokio::test]
async fn get_escapes_default_vhost_and_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vhosts/%2F"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "/"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vhost = client
        .get(&ObjectKey::new(ObjectKind::Vhost, ["/"]))
        .await
        .unwrap();
    assert_eq!(vhost["name"], "/");
}

#[tokio::test]
async fn get_missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/ghost"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "Object Not Found", "reason": "Not Found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get(&ObjectKey::new(ObjectKind::User, ["ghost"]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn create_puts_body_to_object_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/mctest"))
        .and(body_json(json!({"password": "foobar", "tags": "management"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server)
        .create(
            &ObjectKey::new(ObjectKind::User, ["mctest"]),
            &json!({"password": "foobar", "tags": "management"}),
        )
        .await
        .unwrap();
    assert_eq!(created.location, None);
}

#[tokio::test]
async fn binding_create_posts_and_returns_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bindings/%2F/e/events/q/audit"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "../../../../%2F/e/events/q/audit/orders.%2A"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let key = ObjectKey::new(ObjectKind::Binding, ["/", "e", "events", "q", "audit"]);
    let created = client_for(&server)
        .create(&key, &json!({"routing_key": "orders.*", "arguments": {}}))
        .await
        .unwrap();
    assert_eq!(
        created.location.as_deref(),
        Some("../../../../%2F/e/events/q/audit/orders.%2A")
    );
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/policies/%2F/ha"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad policy definition"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .update(
            &ObjectKey::new(ObjectKind::Policy, ["/", "ha"]),
            &json!({"pattern": ".*", "definition": {}}),
        )
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad policy definition");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_reports_404() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/vhosts/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete(&ObjectKey::new(ObjectKind::Vhost, ["gone"]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_and_whoami() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "admin"}, {"name": "mctest"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "admin"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let users = client.list(ObjectKind::User).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(client.whoami().await.unwrap()["name"], "admin");
}

#[test]
fn key_path_escapes_reserved_characters() {
    let key = ObjectKey::new(ObjectKind::Queue, ["prod/eu", "jobs#1"]);
    assert_eq!(key.path(), "queues/prod%2Feu/jobs%231");
    assert_eq!(key.child("bindings").path(), "queues/prod%2Feu/jobs%231/bindings");
}

#[test]
fn key_display_matches_request_path() {
    let key = ObjectKey::new(ObjectKind::Vhost, ["/"]);
    assert_eq!(key.to_string(), "vhosts/%2F");
    assert_eq!(key.to_string(), key.path());
}

#[tokio::test]
async fn truncated_error_body_keeps_status_and_read_failure() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // Promise more bytes than are sent, then hang up.
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let config = ClientConfig {
        endpoint,
        ..ClientConfig::default()
    };
    let err = HttpClient::new(&config)
        .unwrap()
        .get(&ObjectKey::new(ObjectKind::Vhost, ["v1"]))
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("failed to read response body"), "{body}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
