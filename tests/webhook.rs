use lettermint::{
    DEFAULT_WEBHOOK_TOLERANCE, Error, ErrorKind, HEADER_DELIVERY, HEADER_SIGNATURE, Webhook,
    sign_payload, verify_webhook, verify_webhook_request,
};
use reqwest::header::{HeaderMap, HeaderValue};
use std::io::{self, Read};
use std::time::{SystemTime, UNIX_EPOCH};

const SECRET: &str = "test-secret";
const PAYLOAD: &str = r#"{"id":"wh_123","event":"message.delivered","timestamp":1234567890,"data":{"message_id":"msg_123","recipient":"user@example.com","response":{"status_code":250,"message":"OK"}}}"#;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn headers(signature: &str, delivery: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HEADER_SIGNATURE, HeaderValue::from_str(signature).unwrap());
    if let Some(delivery) = delivery {
        headers.insert(HEADER_DELIVERY, HeaderValue::from_str(delivery).unwrap());
    }
    headers
}

struct FailingBody;

impl Read for FailingBody {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away"))
    }
}

#[test]
fn verifies_signed_delivery() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let event = verify_webhook(
        &signature,
        PAYLOAD.as_bytes(),
        Some(timestamp),
        SECRET,
        DEFAULT_WEBHOOK_TOLERANCE,
    )
    .unwrap();

    assert_eq!(event.id, "wh_123");
    assert_eq!(event.event, "message.delivered");
    assert_eq!(event.timestamp, 1234567890);
    assert_eq!(event.data.recipient, "user@example.com");
    assert_eq!(event.data.response.as_ref().unwrap().status_code, 250);
    assert_eq!(event.raw_payload, PAYLOAD.as_bytes());
}

#[test]
fn request_adapter_success() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();
    let headers = headers(&signature, Some(&timestamp.to_string()));

    let event = verify_webhook_request(
        &headers,
        PAYLOAD.as_bytes(),
        SECRET,
        DEFAULT_WEBHOOK_TOLERANCE,
    )
    .unwrap();
    assert_eq!(event.data.message_id, "msg_123");
}

#[test]
fn request_adapter_header_names_are_case_insensitive() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();
    let mut headers = HeaderMap::new();
    headers.insert(
        "X-Lettermint-Signature",
        HeaderValue::from_str(&signature).unwrap(),
    );

    let event = Webhook::new(SECRET)
        .verify_request(&headers, PAYLOAD.as_bytes())
        .unwrap();
    assert_eq!(event.id, "wh_123");
}

#[test]
fn request_adapter_without_delivery_header() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let result = Webhook::new(SECRET).verify_request(&headers(&signature, None), PAYLOAD.as_bytes());
    assert!(result.is_ok());
}

#[test]
fn request_adapter_missing_signature() {
    let err = verify_webhook_request(
        &HeaderMap::new(),
        PAYLOAD.as_bytes(),
        SECRET,
        DEFAULT_WEBHOOK_TOLERANCE,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn request_adapter_empty_delivery_header_is_absent() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let event = Webhook::new(SECRET)
        .verify_request(&headers(&signature, Some("")), PAYLOAD.as_bytes())
        .unwrap();
    assert_eq!(event.id, "wh_123");
}

#[test]
fn request_adapter_invalid_delivery_header() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let err = Webhook::new(SECRET)
        .verify_request(&headers(&signature, Some("yesterday")), PAYLOAD.as_bytes())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn request_adapter_mismatched_delivery_header() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();
    let delivery = (timestamp + 1).to_string();

    let err = Webhook::new(SECRET)
        .verify_request(&headers(&signature, Some(&delivery)), PAYLOAD.as_bytes())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn request_adapter_body_read_failure_is_transport_error() {
    let timestamp = now();
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let err = Webhook::new(SECRET)
        .verify_request(&headers(&signature, None), FailingBody)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn stale_delivery_is_expired() {
    let timestamp = now() - 3600;
    let signature = sign_payload(SECRET, timestamp, PAYLOAD.as_bytes()).to_string();

    let err = Webhook::new(SECRET)
        .verify(&signature, PAYLOAD.as_bytes(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimestampExpired);
}

#[test]
fn authentic_non_json_body_is_payload_error() {
    let body = b"this is not json";
    let signature = sign_payload(SECRET, now(), body).to_string();

    let err = Webhook::new(SECRET)
        .verify(&signature, body, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PayloadParse);
}
