// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that session tokens created at sign-in can be decoded
//! by the auth middleware, catching compatibility issues early.

use bookclub_tracker::middleware::auth::{create_jwt, verify_jwt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims structure that must match what the middleware expects.
/// This is the canonical format - if either create_jwt or the middleware
/// changes, this test should catch the incompatibility.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

#[test]
fn test_jwt_roundtrip() {
    let user_id = "110248495921238986420";

    let token = create_jwt(user_id, SIGNING_KEY).unwrap();

    // Decode independently of the middleware
    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, user_id);
    assert!(token_data.claims.exp > token_data.claims.iat);

    // And through the middleware's own verifier
    assert_eq!(verify_jwt(&token, SIGNING_KEY).unwrap().sub, user_id);
}

#[test]
fn test_jwt_expiration_is_future() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let token = create_jwt("reader", SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false; // We'll check manually

    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    // Token should expire at least 29 days in the future
    assert!(
        token_data.claims.exp > now + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
}

#[test]
fn test_expired_jwt_rejected() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "reader".to_string(),
        iat: now - 86400 * 31,
        exp: now - 86400,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, SIGNING_KEY).is_err());
}

#[test]
fn test_algorithm_none_rejected() {
    // Header {"alg":"none"} with an empty signature
    let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiJyZWFkZXIiLCJleHAiOjk5OTk5OTk5OTksImlhdCI6MH0.";
    assert!(verify_jwt(token, SIGNING_KEY).is_err());
}
