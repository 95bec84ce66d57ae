use std::time::Duration;

use hybrid_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_json_with_header_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "serper-key"))
        .and(body_json(json!({"q": "rust"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        auth: Some(Auth::header("x-api-key", "serper-key").unwrap()),
        ..Default::default()
    };
    let got: Value = client
        .post_json("search", &json!({"q": "rust"}), opts)
        .await
        .unwrap();
    assert_eq!(got, json!({"ok": true}));
}

#[tokio::test]
async fn bearer_token_is_sanitized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer xai-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1", server.uri())).unwrap();
    let opts = RequestOpts {
        auth: Some(Auth::Bearer(" \"xai-123\"\n")),
        ..Default::default()
    };
    let _: Value = client.post_json("responses", &json!({}), opts).await.unwrap();
}

#[tokio::test]
async fn non_success_status_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("x-request-id", "req-42")
                .set_body_json(json!({"message": "Unauthorized."})),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json::<_, Value>("search", &json!({}), RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status,
            message,
            body,
            request_id,
        } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Unauthorized.");
            assert!(body.contains("Unauthorized."));
            assert_eq!(request_id, "req-42");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json::<_, Value>("anything", &json!({}), RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Decode { body_snippet, .. } => assert!(body_snippet.contains("nope")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_is_classified_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let err = client
        .post_json::<_, Value>("search", &json!({}), opts)
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    // Bind then drop a listener so the port is very likely closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = HttpClient::new(&format!("http://127.0.0.1:{port}")).unwrap();
    let err = client
        .post_json::<_, Value>("x", &json!({}), RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}
