mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behavior, StubSource, text_result};
use hybrid_common::{ErrorKind, GrokMode, HybridError, SearchRequest, SourceName};
use hybrid_config::{SERPER_API_KEY, StaticCredentials, XAI_API_KEY};
use hybrid_report::{AggregateReport, render_json, render_text};
use hybrid_runtime::Coordinator;
use hybrid_sources::{GoogleSource, GrokSource};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn google_succeeds_while_grok_times_out() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [
                {"title": "First title", "link": "https://one.example", "snippet": "one", "position": 1},
                {"title": "Second title", "link": "https://two.example", "snippet": "two", "position": 2},
                {"title": "Third title", "link": "https://three.example", "snippet": "three", "position": 3}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = Arc::new(StaticCredentials::default().with(SERPER_API_KEY, "k"));
    let google = GoogleSource::new(&server.uri(), creds).unwrap();
    let coordinator = Coordinator::new()
        .with_adapter(Arc::new(google))
        .with_adapter(Arc::new(StubSource::new(
            SourceName::GrokWeb,
            Behavior::SucceedAfter(Duration::from_secs(5), text_result("Grok Web", "late")),
        )));

    let report = coordinator
        .run(
            &SearchRequest::new("A", Duration::from_millis(500)),
            &[SourceName::Google, SourceName::GrokWeb],
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    let google = report.outcomes[0].outcome.result().expect("google success");
    assert_eq!(google.entries.len(), 3);
    assert!(report.summary.text().contains("First title"));

    assert_eq!(report.summary.failures.len(), 1);
    assert_eq!(report.summary.failures[0].source, SourceName::GrokWeb);
    assert_eq!(report.summary.failures[0].kind, ErrorKind::Timeout);

    let json = render_json(&report).unwrap();
    let back: AggregateReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);

    let text = render_text(&report);
    assert!(text.contains("1. First title"));
    assert!(text.contains("- grok_web: timeout"));
}

#[tokio::test]
async fn missing_key_for_the_only_source_never_touches_the_network() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output_text": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let grok = GrokSource::new(
        GrokMode::Web,
        &server.uri(),
        Arc::new(StaticCredentials::default()),
    )
    .unwrap();
    let coordinator = Coordinator::new().with_adapter(Arc::new(grok));

    let err = coordinator
        .run(
            &SearchRequest::new("A", Duration::from_secs(2)),
            &[SourceName::GrokWeb],
        )
        .await
        .unwrap_err();
    match err {
        HybridError::MissingCredentials { missing } => {
            assert_eq!(missing, vec![XAI_API_KEY.to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn one_grok_key_serves_every_grok_mode() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output_text": "grok says hi"})))
        .expect(2)
        .mount(&server)
        .await;

    let creds = Arc::new(StaticCredentials::default().with(XAI_API_KEY, "xai"));
    let mut coordinator = Coordinator::new();
    for mode in [GrokMode::Web, GrokMode::X] {
        coordinator.register(Arc::new(
            GrokSource::new(mode, &server.uri(), creds.clone()).unwrap(),
        ));
    }

    let report = coordinator
        .run(
            &SearchRequest::new("A", Duration::from_secs(5)),
            &[SourceName::GrokWeb, SourceName::GrokX],
        )
        .await
        .unwrap();

    assert!(report.outcomes.iter().all(|r| r.outcome.is_success()));
    let text = report.summary.text();
    assert!(text.contains("[Grok Web]\ngrok says hi"));
    assert!(text.contains("[X/Twitter]\ngrok says hi"));
}
