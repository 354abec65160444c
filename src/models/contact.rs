use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Read,
    Replied,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ContactStatus::New),
            "read" => Ok(ContactStatus::Read),
            "replied" => Ok(ContactStatus::Replied),
            other => Err(format!("Estado de contacto inválido: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = String;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Formulario público de contacto
#[derive(Debug, Deserialize, Validate)]
pub struct ContactPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Proporcione un email válido"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "El asunto es obligatorio"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "El mensaje es obligatorio"))]
    pub message: String,
}

impl ContactPayload {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactStatusPayload {
    #[serde(default)]
    pub status: String,
}

// Resumen que ve quien envía el formulario
#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Contact> for ContactReceipt {
    fn from(c: &Contact) -> Self {
        ContactReceipt {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            subject: c.subject.clone(),
            created_at: c.created_at,
        }
    }
}
