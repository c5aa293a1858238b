use std::time::Duration;

use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webhook_trigger::{FormPostStrategy, Payload, StrategyChain, StrategyKind};

#[tokio::test]
async fn direct_strategy_posts_the_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "action": "dispatch_messages",
            "source": "whatsapp-dispatcher-web",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/hook", server.uri());
    let chain = StrategyChain::for_endpoint(&endpoint, None);
    let outcome = chain
        .deliver(&Payload::new(), Duration::from_secs(2))
        .await;

    assert!(outcome.accepted);
    assert_eq!(outcome.via, Some(StrategyKind::Direct));
    server.verify().await;
}

#[tokio::test]
async fn unreachable_endpoint_is_still_accepted_via_form_post() {
    // Nothing listens on port 1; both the direct call and the form post are
    // refused at the transport level, but the form post swallows it.
    let chain = StrategyChain::for_endpoint("http://127.0.0.1:1/hook", None);
    let outcome = chain
        .deliver(&Payload::new(), Duration::from_millis(500))
        .await;

    assert!(outcome.accepted);
    assert_eq!(outcome.via, Some(StrategyKind::FormPost));
}

#[tokio::test]
async fn relay_timeout_falls_through_to_form_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relay"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
        .expect(1)
        .mount(&server)
        .await;

    let relay_base = format!("{}/relay?url=", server.uri());
    let chain = StrategyChain::for_endpoint("http://127.0.0.1:1/hook", Some(&relay_base));
    let outcome = chain
        .deliver(&Payload::new(), Duration::from_millis(100))
        .await;

    assert!(outcome.accepted);
    assert_eq!(outcome.via, Some(StrategyKind::FormPost));
}

#[tokio::test]
async fn form_post_sends_flattened_urlencoded_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header(
            "Content-Type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("action=dispatch_messages"))
        .and(body_string_contains("clientContext="))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let strategy = FormPostStrategy::new(
        reqwest::Client::new(),
        format!("{}/hook", server.uri()),
    );
    let chain = StrategyChain::new(vec![Box::new(strategy)]);
    let outcome = chain
        .deliver(&Payload::new(), Duration::from_secs(2))
        .await;

    assert!(outcome.accepted);
    assert_eq!(outcome.via, Some(StrategyKind::FormPost));
    server.verify().await;
}
