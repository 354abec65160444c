use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Valida y reporta solo el primer campo que falla, en el orden dado.
pub fn validate_fields<T: Validate>(payload: &T, order: &[&'static str]) -> Result<(), AppError> {
    match payload.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(first_error(&errors, order)),
    }
}

fn first_error(errors: &ValidationErrors, order: &[&'static str]) -> AppError {
    let fields = errors.field_errors();

    for field in order {
        if let Some(error) = fields.get(*field).and_then(|errs| errs.first()) {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Campo inválido: {field}"));
            return AppError::validation(*field, message);
        }
    }

    AppError::validation("body", "Datos inválidos")
}
