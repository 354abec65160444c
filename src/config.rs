use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::article::Category;

const DEFAULT_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1499750310107-5fef28a66643?w=1200&h=600&fit=crop";

const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} no está definido en .env")]
    Missing(&'static str),

    #[error("Valor inválido para {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Standalone,
    Serverless,
}

/// Las dos variantes de artículo ("Post" y "Blog") comparten modelo y solo
/// difieren en estas reglas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentProfile {
    Post,
    Blog,
}

impl ContentProfile {
    pub fn categories(&self) -> &'static [Category] {
        match self {
            ContentProfile::Post => &[
                Category::Design,
                Category::Development,
                Category::Technology,
                Category::Business,
                Category::Lifestyle,
            ],
            ContentProfile::Blog => &[Category::Design, Category::Development, Category::Technology],
        }
    }

    pub fn allows(&self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    pub fn cover_image_required(&self) -> bool {
        matches!(self, ContentProfile::Blog)
    }

    pub fn excerpt_required(&self) -> bool {
        matches!(self, ContentProfile::Blog)
    }

    // Solo los posts llevan contador de lecturas
    pub fn counts_views(&self) -> bool {
        matches!(self, ContentProfile::Post)
    }

    pub fn default_cover_image(&self) -> &'static str {
        DEFAULT_COVER_IMAGE
    }

    pub fn slug_prefix(&self) -> &'static str {
        match self {
            ContentProfile::Post => "post",
            ContentProfile::Blog => "blog",
        }
    }
}

impl FromStr for ContentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "post" => Ok(ContentProfile::Post),
            "blog" => Ok(ContentProfile::Blog),
            other => Err(format!("perfil desconocido '{other}' (post | blog)")),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("entorno desconocido '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub environment: Environment,
    pub deployment: Deployment,
    pub profile: ContentProfile,
    pub allowed_origins: Vec<String>,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let serverless = try_load::<String>("SERVERLESS", "false")?;
        let deployment = if matches!(serverless.as_str(), "1" | "true") {
            Deployment::Serverless
        } else {
            Deployment::Standalone
        };

        let allowed_origins = try_load::<String>("FRONTEND_URL", "http://localhost:5173")?
            .split(',')
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        Ok(Self {
            port: try_load("PORT", "5000")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: expiration_hours()?,
            environment: try_load("APP_ENV", "development")?,
            deployment,
            profile: try_load("CONTENT_PROFILE", "post")?,
            allowed_origins,
            run_migrations: try_load("RUN_MIGRATIONS", "true")?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

// Un año como máximo; fuera de rango se rechaza al arrancar
fn expiration_hours() -> Result<i64, ConfigError> {
    let hours: i64 = try_load("JWT_EXPIRATION_HOURS", "24")?;
    check_expiration_hours(hours)
}

fn check_expiration_hours(hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_JWT_EXPIRATION_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid {
            key: "JWT_EXPIRATION_HOURS",
            reason: format!("debe estar entre 1 y {MAX_JWT_EXPIRATION_HOURS}"),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} no definido, usando valor por defecto: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Valor inválido para {key}: {e}");
            ConfigError::Invalid { key, reason: e.to_string() }
        })
}
