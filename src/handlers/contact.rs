use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::parse_id;
use crate::{
    db::{ContactStore, DbPool},
    error::AppError,
    models::contact::{Contact, ContactPayload, ContactReceipt, ContactStatus, ContactStatusPayload},
    utils::{extract::AppJson, validation::validate_fields},
};

const NOT_FOUND: &str = "Mensaje no encontrado";

// POST /api/contact (público)
pub async fn submit_contact_handler(
    State(pool): State<DbPool>,
    AppJson(payload): AppJson<ContactPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    validate_fields(&payload, &["name", "email", "subject", "message"])?;

    let now = Utc::now();
    let contact = Contact {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        subject: payload.subject,
        message: payload.message,
        status: ContactStatus::New,
        created_at: now,
        updated_at: now,
    };
    pool.insert_contact(&contact).await?;
    tracing::info!("Nuevo mensaje de contacto {}", contact.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Mensaje enviado correctamente",
            "contact": ContactReceipt::from(&contact),
        })),
    ))
}

// GET /api/contact - más recientes primero
pub async fn list_contacts_handler(State(pool): State<DbPool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(pool.list_contacts().await?))
}

// GET /api/contact/:id
pub async fn get_contact_handler(
    Path(id): Path<String>,
    State(pool): State<DbPool>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let contact = pool.find_contact(id).await?.ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(Json(contact))
}

// PUT /api/contact/:id/status
pub async fn update_contact_status_handler(
    Path(id): Path<String>,
    State(pool): State<DbPool>,
    AppJson(body): AppJson<ContactStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let status = body
        .status
        .trim()
        .parse::<ContactStatus>()
        .map_err(|_| AppError::validation("status", "El estado debe ser 'new', 'read' o 'replied'"))?;

    let contact = pool
        .update_contact_status(id, status)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(Json(contact))
}
