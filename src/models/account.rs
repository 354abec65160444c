use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const ADMIN_ROLE: &str = "admin";

// Cuenta tal como se expone al cliente y a los handlers (sin hash)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cuenta + hash; solo circula entre el store y el login / cambio de contraseña
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    #[sqlx(flatten)]
    pub account: Account,
    pub password_hash: String,
}

/// Datos para dar de alta una cuenta; el email ya viene normalizado.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Default, Clone)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Proporcione un email válido"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[serde(default)]
    #[validate(email(message = "Proporcione un email válido"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío"))]
    pub name: Option<String>,
    #[validate(email(message = "Proporcione un email válido"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordPayload {
    #[serde(default, alias = "currentPassword")]
    #[validate(length(min = 1, message = "La contraseña actual es obligatoria"))]
    pub current_password: String,
    #[serde(default, alias = "newPassword")]
    #[validate(length(min = 6, message = "La nueva contraseña debe tener al menos 6 caracteres"))]
    pub new_password: String,
}

// Lo que devolvemos tras registro o login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub account: Account,
    pub token: String,
    pub token_type: String,
}

// Lo que viaja dentro del token firmado
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // id de la cuenta
    pub exp: usize,
    pub iat: usize,
}

/// Emails se comparan sin distinguir mayúsculas.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RegisterPayload {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

impl UpdateProfilePayload {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| normalize_email(&e)),
        }
    }
}
