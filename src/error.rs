use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{config::Config, db::StoreError};

pub const INTERNAL_MESSAGE: &str = "Error interno del servidor";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("No autorizado")]
    Unauthorized,

    #[error("{0}")]
    InvalidCredentials(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// El cuerpo o la query no se pudieron interpretar.
    #[error("{message}")]
    Rejected { status: StatusCode, field: Option<String>, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Causa de un error interno; viaja en las extensiones de la respuesta para
/// que `expose_internal_errors` la muestre solo en desarrollo.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation { field, message: message.into() }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Rejected { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => {
                AppError::Conflict(format!("Ya existe un registro con ese {field}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

// serde_path_to_error antepone la ruta: "tags[1]: invalid type: ..."
fn offending_field(detail: &str) -> Option<String> {
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    if !is_path {
        return None;
    }
    let top = path.split(['.', '[']).next().unwrap_or(path);
    Some(top.to_string())
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        use std::error::Error as _;

        match rejection {
            JsonRejection::JsonDataError(err) => {
                let detail = err.source().map(|e| e.to_string()).unwrap_or_else(|| err.body_text());
                AppError::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    field: offending_field(&detail),
                    message: format!("Datos inválidos: {detail}"),
                }
            }
            other => AppError::Rejected {
                status: other.status(),
                field: None,
                message: format!("Cuerpo inválido: {}", other.body_text()),
            },
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: StatusCode::BAD_REQUEST,
            field: None,
            message: format!("Parámetros inválidos: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::Internal(detail) => {
                tracing::error!("Error interno: {}", detail);
                let mut response =
                    (status, Json(json!({ "message": INTERNAL_MESSAGE }))).into_response();
                response.extensions_mut().insert(InternalDetail(detail));
                response
            }
            AppError::Validation { field, message } => {
                tracing::debug!("Validación fallida en '{}': {}", field, message);
                (status, Json(json!({ "message": message, "field": field }))).into_response()
            }
            AppError::Rejected { field, message, .. } => {
                tracing::debug!("Petición mal formada: {}", message);
                let body = match field {
                    Some(field) => json!({ "message": message, "field": field }),
                    None => json!({ "message": message }),
                };
                (status, Json(body)).into_response()
            }
            other => {
                tracing::debug!("Petición rechazada ({}): {}", status, other);
                (status, Json(json!({ "message": other.to_string() }))).into_response()
            }
        }
    }
}

/// Fuera de producción devolvemos la causa de los errores internos.
pub async fn expose_internal_errors(State(config): State<Arc<Config>>, mut response: Response) -> Response {
    if !config.is_development() {
        return response;
    }

    match response.extensions_mut().remove::<InternalDetail>() {
        Some(InternalDetail(detail)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": INTERNAL_MESSAGE, "error": detail })),
        )
            .into_response(),
        None => response,
    }
}
