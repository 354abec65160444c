use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use super::message;
use crate::{
    config::Config,
    db::{AccountStore, DbPool},
    error::AppError,
    models::account::{
        normalize_email, Account, AccountChanges, AuthResponse, LoginPayload, NewAccount,
        RegisterPayload, UpdatePasswordPayload, UpdateProfilePayload, ADMIN_ROLE,
    },
    state::AppState,
    utils::{
        extract::AppJson,
        jwt::{issue_token, resolve_account},
        security::{hash_password, verify_password},
        validation::validate_fields,
    },
};

const BAD_CREDENTIALS: &str = "Credenciales inválidas";
const EMAIL_TAKEN: &str = "El email ya está registrado";

fn auth_response(account: Account, config: &Config) -> Result<AuthResponse, AppError> {
    let token = issue_token(account.id, config)?;
    Ok(AuthResponse { account, token, token_type: "Bearer".to_string() })
}

// POST /api/auth/register (la primera cuenta se crea sin token; después hace falta una sesión)
pub async fn register_handler(
    State(state): State<AppState>,
    maybe_auth: Option<TypedHeader<Authorization<Bearer>>>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    validate_fields(&payload, &["name", "email", "password"])?;

    if state.pool.count_accounts().await? > 0 {
        let TypedHeader(auth) = maybe_auth.ok_or(AppError::Unauthorized)?;
        let creator = resolve_account(&state, auth.token()).await?;
        tracing::info!("Cuenta {} registra una cuenta nueva", creator.id);
    }

    if state.pool.find_credentials_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    // Nunca guardamos la contraseña plana
    let password_hash = hash_password(&payload.password)?;

    let account = state
        .pool
        .insert_account(NewAccount {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: ADMIN_ROLE.to_string(),
        })
        .await?;
    tracing::info!("Cuenta creada: {} ({})", account.email, account.id);

    Ok((StatusCode::CREATED, Json(auth_response(account, &state.config)?)))
}

// POST /api/auth/login
pub async fn login_handler(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    validate_fields(&payload, &["email", "password"])?;
    let email = normalize_email(&payload.email);

    // Mismo mensaje para email desconocido y contraseña incorrecta
    let creds = pool
        .find_credentials_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials(BAD_CREDENTIALS))?;

    if !verify_password(&payload.password, &creds.password_hash) {
        tracing::warn!("Login fallido para {}", email);
        return Err(AppError::InvalidCredentials(BAD_CREDENTIALS));
    }

    Ok(Json(auth_response(creds.account, &config)?))
}

// GET /api/auth/me
pub async fn me_handler(Extension(account): Extension<Account>) -> impl IntoResponse {
    Json(account)
}

// PUT /api/auth/update-profile
pub async fn update_profile_handler(
    State(pool): State<DbPool>,
    Extension(account): Extension<Account>,
    AppJson(payload): AppJson<UpdateProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    validate_fields(&payload, &["name", "email"])?;

    if let Some(email) = &payload.email {
        if pool.email_taken_by_other(email, account.id).await? {
            return Err(AppError::Conflict("El email ya está en uso".to_string()));
        }
    }

    let changes = AccountChanges { name: payload.name, email: payload.email };
    let updated = pool
        .update_account(account.id, changes)
        .await?
        .ok_or(AppError::NotFound("Cuenta no encontrada"))?;

    Ok(Json(updated))
}

// PUT /api/auth/update-password
pub async fn update_password_handler(
    State(pool): State<DbPool>,
    Extension(account): Extension<Account>,
    AppJson(payload): AppJson<UpdatePasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    validate_fields(&payload, &["current_password", "new_password"])?;

    let creds = pool
        .find_credentials_by_id(account.id)
        .await?
        .ok_or(AppError::NotFound("Cuenta no encontrada"))?;

    if !verify_password(&payload.current_password, &creds.password_hash) {
        return Err(AppError::InvalidCredentials("La contraseña actual es incorrecta"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    pool.update_password(account.id, &password_hash).await?;
    tracing::info!("Contraseña actualizada para {}", account.id);

    Ok(message("Contraseña actualizada correctamente"))
}
