use super::*;

fn test_client(base_url: &str) -> StripeClient {
    StripeClient::with_base_url("sk_test_123", 30, base_url, 0)
        .expect("client construction should not fail")
}

#[test]
fn endpoint_appends_segments_to_base() {
    let client = test_client("https://api.stripe.com");
    let url = client
        .endpoint(&["v1", "checkout", "sessions"])
        .expect("endpoint");
    assert_eq!(url.as_str(), "https://api.stripe.com/v1/checkout/sessions");
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client = test_client("http://localhost:12111/stripe/");
    let url = client.endpoint(&["v1", "checkout", "sessions", "cs_1"]).expect("endpoint");
    assert_eq!(
        url.as_str(),
        "http://localhost:12111/stripe/v1/checkout/sessions/cs_1"
    );
}

#[test]
fn endpoint_encodes_session_id() {
    let client = test_client("https://api.stripe.com");
    let url = client
        .endpoint(&["v1", "checkout", "sessions", "cs/../x"])
        .expect("endpoint");
    assert_eq!(
        url.as_str(),
        "https://api.stripe.com/v1/checkout/sessions/cs%2F..%2Fx"
    );
}

#[test]
fn rejects_relative_base_url() {
    let err = StripeClient::with_base_url("sk", 30, "not a url", 0).unwrap_err();
    assert!(matches!(err, StripeError::InvalidBaseUrl(_)));
}

#[test]
fn map_error_reads_stripe_envelope() {
    let body = r#"{"error":{"type":"invalid_request_error","code":"parameter_missing","message":"Missing required param: line_items."}}"#;
    match StripeClient::map_error(400, body, "create") {
        StripeError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("parameter_missing"));
            assert_eq!(message, "Missing required param: line_items.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn map_error_treats_resource_missing_as_not_found() {
    let body = r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such checkout.session: 'cs_x'"}}"#;
    assert!(matches!(
        StripeClient::map_error(400, body, "retrieve"),
        StripeError::NotFound(_)
    ));
}

#[test]
fn map_error_falls_back_when_body_is_not_json() {
    match StripeClient::map_error(502, "<html>bad gateway</html>", "retrieve checkout session cs_1") {
        StripeError::Api { status, message, .. } => {
            assert_eq!(status, 502);
            assert!(message.contains("HTTP 502"), "message: {message}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
