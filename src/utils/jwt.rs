use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    config::Config,
    db::AccountStore,
    error::AppError,
    models::account::{Account, Claims},
    state::AppState,
};

/// Firma un token HS256 para la cuenta.
pub fn issue_token(account_id: Uuid, config: &Config) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = Duration::try_hours(config.jwt_expiration_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::internal("Fecha de expiración inválida"))?;

    let claims = Claims {
        sub: account_id.to_string(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(config.jwt_secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Error generando token: {e}")))
}

// Firma y expiración; cualquier fallo es "no autorizado"
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Token rechazado: {}", e);
            AppError::Unauthorized
        })
}

/// Token -> cuenta existente. Errores del store se propagan como internos.
pub async fn resolve_account(state: &AppState, token: &str) -> Result<Account, AppError> {
    let claims = decode_token(token, &state.config.jwt_secret)?;
    let account_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    state
        .pool
        .find_account_by_id(account_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

// Rutas protegidas: sin cuenta válida no se llega al handler
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = auth.ok_or(AppError::Unauthorized)?;
    let account = resolve_account(&state, auth.token()).await?;

    // Adjuntamos la cuenta para que los handlers sepan quién es
    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

// Rutas públicas: si el token sirve adjuntamos la cuenta, si no seguimos como anónimo
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(TypedHeader(auth)) = auth {
        match resolve_account(&state, auth.token()).await {
            Ok(account) => {
                request.extensions_mut().insert(account);
            }
            Err(e) => tracing::debug!("Token opcional ignorado: {}", e),
        }
    }

    next.run(request).await
}
