// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use bookclub_tracker::config::Config;
use bookclub_tracker::db::FirestoreDb;
use bookclub_tracker::routes::create_router;
use bookclub_tracker::services::{GoogleIdTokenVerifier, PhotoStorage};
use bookclub_tracker::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;

/// Key ID the static test verifier accepts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-google-key";

const TEST_RSA_PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/test_google_rsa_private.pem");
const TEST_RSA_PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/test_google_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// A verifier that trusts only the fixture RSA key.
#[allow(dead_code)]
pub fn test_verifier(config: &Config) -> GoogleIdTokenVerifier {
    let key = DecodingKey::from_rsa_pem(TEST_RSA_PUBLIC_PEM).expect("Invalid test public key");
    GoogleIdTokenVerifier::new_with_static_key(config, TEST_KID, key)
        .expect("Failed to build test verifier")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub async fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let google_verifier = Arc::new(test_verifier(&config));

    let state = Arc::new(AppState {
        config,
        db: test_db_offline(),
        google_verifier,
        photo_storage: PhotoStorage::new_mock(),
    });

    (create_router(state.clone()), state)
}

/// Create a session JWT the way the sign-in route does.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    bookclub_tracker::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create JWT")
}

/// Claims of a Google ID token, with overridable fields.
#[derive(Serialize, Clone)]
#[allow(dead_code)]
pub struct GoogleClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleClaims {
    /// A valid token for `sub` addressed to the test client ID.
    #[allow(dead_code)]
    pub fn valid(sub: &str) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Self {
            iss: "https://accounts.google.com".to_string(),
            aud: Config::test_default().google_client_id,
            sub: sub.to_string(),
            exp: now + 3600,
            iat: now,
            email: Some(format!("{}@example.com", sub)),
            email_verified: Some(true),
            name: Some("Test Reader".to_string()),
            picture: None,
        }
    }
}

/// Sign Google ID token claims with the fixture key.
#[allow(dead_code)]
pub fn sign_google_token(claims: &GoogleClaims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_PEM).expect("Invalid test private key");
    encode(&header, claims, &key).expect("Failed to sign test ID token")
}
