use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `Json` cuyo rechazo sale por `AppError`: siempre cuerpo JSON y, si se
/// puede, el campo culpable.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
