//! Integration tests for webhook verification.

use proptest::prelude::*;
use shopify_bridge::auth::oauth::hmac::compute_signature_base64;
use shopify_bridge::webhooks::{
    verify_hmac, verify_payload, WebhookEnvelope, WebhookError, WebhookVerifier,
};

const ORDER_BODY: &[u8] = br##"{"id":123,"name":"#1001"}"##;

fn order_envelope(body: &[u8], signature: Option<String>) -> WebhookEnvelope {
    WebhookEnvelope::new(
        body.to_vec(),
        signature,
        Some("orders/create".to_string()),
        Some("test-shop.myshopify.com".to_string()),
        Some("2024-01".to_string()),
        Some("b54557e4-bdd9-4b37-8a5f-bf7d70bcd043".to_string()),
    )
}

#[test]
fn test_authentic_order_webhook_is_accepted() {
    let verifier = WebhookVerifier::from_raw("topsecret").unwrap();
    let signature = compute_signature_base64(ORDER_BODY, b"topsecret");

    let webhook = verifier
        .verify(&order_envelope(ORDER_BODY, Some(signature)))
        .unwrap();

    assert_eq!(webhook.topic(), "orders/create");
    assert_eq!(webhook.shop_domain(), "test-shop.myshopify.com");
    assert_eq!(webhook.payload()["id"], 123);
    assert_eq!(webhook.payload()["name"], "#1001");
    assert_eq!(webhook.api_version(), Some("2024-01"));
    assert_eq!(
        webhook.idempotency_key().as_deref(),
        Some("b54557e4-bdd9-4b37-8a5f-bf7d70bcd043")
    );
}

#[test]
fn test_digest_from_other_secret_is_rejected() {
    let verifier = WebhookVerifier::from_raw("topsecret").unwrap();
    let signature = compute_signature_base64(ORDER_BODY, b"not-the-secret");

    let result = verifier.verify(&order_envelope(ORDER_BODY, Some(signature)));

    assert_eq!(result, Err(WebhookError::InvalidSignature));
    assert_eq!(WebhookError::InvalidSignature.to_string(), "Invalid HMAC");
}

#[test]
fn test_reserialized_body_is_rejected() {
    let raw = b"{ \"id\": 123,\n  \"name\": \"#1001\" }";
    let reserialized =
        serde_json::to_vec(&serde_json::from_slice::<serde_json::Value>(raw).unwrap()).unwrap();
    assert_ne!(raw.as_slice(), reserialized.as_slice());

    let signature_of_reserialized = compute_signature_base64(&reserialized, b"topsecret");

    assert!(!verify_hmac(raw, &signature_of_reserialized, b"topsecret"));
    assert_eq!(
        verify_payload(raw, Some(signature_of_reserialized.as_str()), b"topsecret"),
        Err(WebhookError::InvalidSignature)
    );

    let signature_of_raw = compute_signature_base64(raw, b"topsecret");
    assert!(verify_payload(raw, Some(signature_of_raw.as_str()), b"topsecret").is_ok());
}

#[test]
fn test_missing_signature_regardless_of_body() {
    let verifier = WebhookVerifier::from_raw("topsecret").unwrap();

    let bodies: [&[u8]; 3] = [ORDER_BODY, b"", b"not json at all"];
    for body in bodies {
        assert_eq!(
            verifier.verify(&order_envelope(body, None)),
            Err(WebhookError::MissingSignature)
        );
    }
}

#[test]
fn test_secret_is_used_verbatim() {
    let padded = WebhookVerifier::from_raw("topsecret\n").unwrap();
    let signature = compute_signature_base64(ORDER_BODY, b"topsecret");

    assert_eq!(
        padded.verify(&order_envelope(ORDER_BODY, Some(signature))),
        Err(WebhookError::InvalidSignature)
    );
}

#[test]
fn test_verification_is_idempotent() {
    let verifier = WebhookVerifier::from_raw("topsecret").unwrap();
    let signature = compute_signature_base64(ORDER_BODY, b"topsecret");
    let envelope = order_envelope(ORDER_BODY, Some(signature));

    let first = verifier.verify(&envelope);
    let second = verifier.verify(&envelope);

    assert!(first.is_ok());
    assert_eq!(first, second);
}

#[test]
fn test_authentic_non_json_body_is_malformed() {
    let verifier = WebhookVerifier::from_raw("topsecret").unwrap();
    let body = b"id=123";
    let signature = compute_signature_base64(body, b"topsecret");

    assert!(matches!(
        verifier.verify(&order_envelope(body, Some(signature))),
        Err(WebhookError::MalformedPayload { .. })
    ));
}

proptest! {
    #[test]
    fn prop_correct_digest_is_accepted(
        secret in proptest::collection::vec(any::<u8>(), 1..64),
        body in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let signature = compute_signature_base64(&body, &secret);
        prop_assert!(verify_hmac(&body, &signature, &secret));
    }

    #[test]
    fn prop_single_bit_flip_is_rejected(
        id in any::<u32>(),
        note in "[a-zA-Z0-9 ]{0,40}",
        bit in any::<prop::sample::Index>(),
    ) {
        let body = serde_json::to_vec(&serde_json::json!({"id": id, "note": note})).unwrap();
        let signature = compute_signature_base64(&body, b"topsecret");

        let mut tampered = body.clone();
        let position = bit.index(tampered.len() * 8);
        tampered[position / 8] ^= 1 << (position % 8);

        prop_assert_eq!(
            verify_payload(&tampered, Some(signature.as_str()), b"topsecret"),
            Err(WebhookError::InvalidSignature)
        );
    }
}
