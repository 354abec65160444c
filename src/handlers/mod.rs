pub mod admin;
pub mod article;
pub mod auth;
pub mod category;
pub mod contact;
pub mod tag;

use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;

// Un id mal formado se trata igual que uno que no existe
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found))
}

pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "message": "Servidor funcionando", "status": "OK" }))
}
