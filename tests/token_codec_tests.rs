use blog_portal::{
    models::Role,
    token::{Claims, DEFAULT_TOKEN_TTL_DAYS, TokenCodec, TokenError},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn codec() -> TokenCodec {
    TokenCodec::new(TEST_JWT_SECRET, Duration::days(DEFAULT_TOKEN_TTL_DAYS)).unwrap()
}

/// Signs an arbitrary JSON payload with the test secret, bypassing the codec.
fn sign_raw(payload: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Replaces the first character of the signature segment.
fn tamper_signature(token: &str) -> String {
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut chars = signature.chars();
    let first = chars.next().unwrap();
    let replacement = if first == 'A' { 'B' } else { 'A' };
    format!("{head}.{replacement}{}", chars.as_str())
}

// --- Tests ---

#[test]
fn test_sign_then_verify_round_trips_subject_and_role() {
    let codec = codec();

    for role in [Role::User, Role::Admin] {
        let id = Uuid::new_v4();
        let token = codec.sign(id, role).unwrap();

        let user = codec.verify(&token).expect("fresh token must verify");
        assert_eq!(user.id, id);
        assert_eq!(user.role, role);
    }
}

#[test]
fn test_default_validity_window_is_seven_days() {
    let codec = codec();
    let claims = codec
        .decode_claims(&codec.sign(Uuid::new_v4(), Role::User).unwrap())
        .unwrap();

    assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    assert!((claims.iat - Utc::now().timestamp()).abs() <= 5);
}

#[test]
fn test_expired_token_is_rejected() {
    let codec = codec();
    let token = codec
        .issue(Uuid::new_v4(), Role::Admin, Duration::seconds(-60))
        .unwrap();

    assert!(codec.verify(&token).is_none());
}

#[test]
fn test_tampered_signature_is_rejected() {
    let codec = codec();
    let token = codec.sign(Uuid::new_v4(), Role::User).unwrap();

    assert!(codec.verify(&tamper_signature(&token)).is_none());
}

#[test]
fn test_payload_with_foreign_signature_is_rejected() {
    let codec = codec();
    let user_token = codec.sign(Uuid::new_v4(), Role::User).unwrap();
    let admin_token = codec.sign(Uuid::new_v4(), Role::Admin).unwrap();

    // Admin payload carrying the user token's signature.
    let (admin_head, _) = admin_token.rsplit_once('.').unwrap();
    let (_, user_signature) = user_token.rsplit_once('.').unwrap();
    let forged = format!("{admin_head}.{user_signature}");

    assert!(codec.verify(&forged).is_none());
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let other = TokenCodec::new("a-completely-different-secret", Duration::days(7)).unwrap();
    let token = other.sign(Uuid::new_v4(), Role::Admin).unwrap();

    assert!(codec().verify(&token).is_none());
}

#[test]
fn test_malformed_tokens_are_rejected() {
    let codec = codec();
    for token in ["", "not-a-token", "a.b.c", "...."] {
        assert!(codec.verify(token).is_none(), "accepted {token:?}");
    }
}

#[test]
fn test_claims_missing_role_are_rejected() {
    let now = Utc::now().timestamp();
    let token = sign_raw(json!({
        "sub": Uuid::new_v4(),
        "iat": now,
        "exp": now + 3600,
    }));

    assert!(codec().verify(&token).is_none());
}

#[test]
fn test_claims_with_unknown_role_are_rejected() {
    let now = Utc::now().timestamp();
    let token = sign_raw(json!({
        "sub": Uuid::new_v4(),
        "role": "superuser",
        "iat": now,
        "exp": now + 3600,
    }));

    assert!(codec().verify(&token).is_none());
}

#[test]
fn test_claims_missing_expiry_are_rejected() {
    let token = sign_raw(json!({
        "sub": Uuid::new_v4(),
        "role": "admin",
        "iat": Utc::now().timestamp(),
    }));

    assert!(codec().verify(&token).is_none());
}

#[test]
fn test_hand_built_claims_verify() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4(),
        role: Role::Admin,
        iat: now,
        exp: now + 60,
    };
    let token = sign_raw(serde_json::to_value(&claims).unwrap());

    assert_eq!(codec().decode_claims(&token), Some(claims));
}

#[test]
fn test_blank_secret_is_refused() {
    for secret in ["", "   "] {
        let result = TokenCodec::new(secret, Duration::days(7));
        assert!(matches!(result, Err(TokenError::MissingSecret)));
    }
}
