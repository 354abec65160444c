pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{Config, Deployment},
    models::{
        account::{Account, AccountChanges, Credentials, NewAccount},
        article::{Article, ArticleFilter, ArticleView},
        contact::{Contact, ContactStatus},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credenciales y perfiles de las cuentas.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn count_accounts(&self) -> StoreResult<i64>;
    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account>;
    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;
    async fn find_credentials_by_id(&self, id: Uuid) -> StoreResult<Option<Credentials>>;
    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>>;
    async fn email_taken_by_other(&self, email: &str, except: Uuid) -> StoreResult<bool>;
    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> StoreResult<Option<Account>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;
}

/// Artículos. Los listados salen ordenados por `published_at` descendente
/// (sin fecha al final) y con el autor resuelto.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<ArticleView>>;
    async fn find_article_by_id(&self, id: Uuid) -> StoreResult<Option<ArticleView>>;
    async fn find_article_by_slug(&self, slug: &str) -> StoreResult<Option<ArticleView>>;
    /// `true` si otro artículo (distinto de `except`) ya usa el slug.
    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> StoreResult<bool>;
    /// Falla con `Duplicate { field: "slug" }` si el slug ya existe.
    async fn insert_article(&self, article: &Article) -> StoreResult<()>;
    async fn update_article(&self, article: &Article) -> StoreResult<bool>;
    async fn delete_article(&self, id: Uuid) -> StoreResult<bool>;
    /// Suma una vista y devuelve el contador resultante.
    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<i64>>;
    async fn count_articles(&self, filter: &ArticleFilter) -> StoreResult<i64>;
    async fn distinct_categories(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>>;
    async fn distinct_tags(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>>;
}

/// Mensajes del formulario de contacto.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()>;
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>>;
    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> StoreResult<Option<Contact>>;
    async fn count_contacts(&self, status: Option<ContactStatus>) -> StoreResult<i64>;
}

pub trait Store: AccountStore + ArticleStore + ContactStore {}

impl<T: AccountStore + ArticleStore + ContactStore> Store for T {}

pub type DbPool = Arc<dyn Store>;

pub const MEMORY_URL: &str = "memory";

pub async fn init_db(config: &Config) -> StoreResult<DbPool> {
    if config.database_url == MEMORY_URL {
        tracing::warn!("Usando store en memoria: los datos se pierden al reiniciar");
        return Ok(Arc::new(MemoryStore::new()));
    }

    match PgStore::connect(&config.database_url, config.run_migrations).await {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) if config.deployment == Deployment::Serverless => {
            // En serverless seguimos vivos; cada petición reintenta la conexión
            tracing::error!("❌ No se pudo conectar a Postgres: {}. Continuando en modo degradado", e);
            Ok(Arc::new(PgStore::connect_lazy(&config.database_url)?))
        }
        Err(e) => Err(e),
    }
}
