//! Helpers compartidos por los tests de los handlers: Router real sobre un
//! `MemoryStore`, cuentas sembradas y un cliente mínimo.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    config::{Config, ContentProfile, Deployment, Environment},
    db::{AccountStore, MemoryStore},
    models::account::{Account, NewAccount, ADMIN_ROLE},
    routes::create_routes,
    state::AppState,
    utils::{jwt::issue_token, security::hash_password},
};

pub const TEST_PASSWORD: &str = "secreto123";

pub fn test_config(profile: ContentProfile) -> Config {
    Config {
        port: 0,
        database_url: "memory".into(),
        jwt_secret: "test-secret".into(),
        jwt_expiration_hours: 1,
        environment: Environment::Production,
        deployment: Deployment::Standalone,
        profile,
        allowed_origins: vec!["*".into()],
        run_migrations: false,
    }
}

pub fn test_app_with_config(config: Config) -> (Router, AppState) {
    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    (create_routes(state.clone()), state)
}

pub fn test_app_with(profile: ContentProfile) -> (Router, AppState) {
    test_app_with_config(test_config(profile))
}

pub fn test_app() -> (Router, AppState) {
    test_app_with(ContentProfile::Post)
}

/// Crea la cuenta directamente en el store y devuelve un token válido.
pub async fn seed_account(state: &AppState, name: &str, email: &str) -> (Account, String) {
    let account = state
        .pool
        .insert_account(NewAccount {
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role: ADMIN_ROLE.into(),
        })
        .await
        .unwrap();
    let token = issue_token(account.id, &state.config).unwrap();
    (account, token)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
