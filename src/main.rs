// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bookclub-Tracker API Server
//!
//! Serves reading groups, daily check-ins and group leaderboards.

use bookclub_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{GoogleIdTokenVerifier, PhotoStorage},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Bookclub-Tracker API");

    // One store handle for the lifetime of the process
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let google_verifier = Arc::new(
        GoogleIdTokenVerifier::new(&config).expect("Failed to initialize Google ID token verifier"),
    );

    let photo_storage = PhotoStorage::new(&config.photo_bucket)
        .await
        .expect("Failed to initialize photo storage");
    tracing::info!(bucket = %config.photo_bucket, "Photo storage initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        google_verifier,
        photo_storage,
    });

    // Build router
    let app = bookclub_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bookclub_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
