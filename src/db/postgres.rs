use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AccountStore, ArticleStore, ContactStore, StoreError, StoreResult};
use crate::models::{
    account::{Account, AccountChanges, Credentials, NewAccount},
    article::{Article, ArticleFilter, ArticleRow, ArticleView},
    contact::{Contact, ContactRow, ContactStatus},
};

const ACCOUNT_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

const ARTICLE_SELECT: &str = r#"
    SELECT
        a.id, a.title, a.slug, a.excerpt, a.content, a.cover_image,
        a.author, a.author_id, a.category, a.tags, a.published_at,
        a.featured, a.status, a.views, a.created_at, a.updated_at,
        u.name AS author_name, u.email AS author_email
    FROM articles a
    LEFT JOIN accounts u ON u.id = a.author_id
"#;

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, status, created_at, updated_at";

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(db_url: &str, run_migrations: bool) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migraciones aplicadas");
        }

        Ok(Self { pool })
    }

    // Pool que no toca la base hasta la primera consulta
    pub fn connect_lazy(db_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect_lazy(db_url)?;
        Ok(Self { pool })
    }
}

// Traduce violaciones de UNIQUE al error de dominio
fn map_unique(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                _ => "slug",
            };
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

// Cada campo ausente del filtro no restringe nada
fn push_article_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ArticleFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND a.status = ").push_bind(status.as_str());
    }
    if let Some(category) = &filter.category {
        qb.push(" AND a.category = ").push_bind(category.clone());
    }
    if let Some(tag) = &filter.tag {
        qb.push(" AND ").push_bind(tag.clone()).push(" = ANY(a.tags)");
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND a.featured = ").push_bind(featured);
    }
    if let Some(search) = &filter.search {
        let pattern = escape_like(search);
        qb.push(" AND (a.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.excerpt ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn into_views(rows: Vec<ArticleRow>) -> StoreResult<Vec<ArticleView>> {
    rows.into_iter()
        .map(|row| ArticleView::try_from(row).map_err(StoreError::Corrupt))
        .collect()
}

#[async_trait]
impl AccountStore for PgStore {
    async fn count_accounts(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account> {
        let sql = format!(
            "INSERT INTO accounts (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.role)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique)
    }

    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> StoreResult<Option<Credentials>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE id = $1");
        let creds = sqlx::query_as::<_, Credentials>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(creds)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE email = $1");
        let creds = sqlx::query_as::<_, Credentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(creds)
    }

    async fn email_taken_by_other(&self, email: &str, except: Uuid) -> StoreResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> StoreResult<Option<Account>> {
        // COALESCE: si el campo no viene, se queda el valor anterior
        let sql = format!(
            "UPDATE accounts SET \
                name = COALESCE($1, name), \
                email = COALESCE($2, email), \
                updated_at = NOW() \
             WHERE id = $3 RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(changes.name)
            .bind(changes.email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE accounts SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<ArticleView>> {
        let mut qb = QueryBuilder::<Postgres>::new(ARTICLE_SELECT);
        push_article_filter(&mut qb, filter);
        qb.push(" ORDER BY a.published_at DESC NULLS LAST, a.created_at DESC");

        let rows = qb.build_query_as::<ArticleRow>().fetch_all(&self.pool).await?;
        into_views(rows)
    }

    async fn find_article_by_id(&self, id: Uuid) -> StoreResult<Option<ArticleView>> {
        let sql = format!("{ARTICLE_SELECT} WHERE a.id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| ArticleView::try_from(r).map_err(StoreError::Corrupt)).transpose()
    }

    async fn find_article_by_slug(&self, slug: &str) -> StoreResult<Option<ArticleView>> {
        let sql = format!("{ARTICLE_SELECT} WHERE a.slug = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| ArticleView::try_from(r).map_err(StoreError::Corrupt)).transpose()
    }

    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> StoreResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_article(&self, article: &Article) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO articles (
                id, title, slug, excerpt, content, cover_image, author, author_id,
                category, tags, published_at, featured, status, views, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.excerpt)
        .bind(&article.content)
        .bind(&article.cover_image)
        .bind(&article.author)
        .bind(article.author_id)
        .bind(article.category.as_str())
        .bind(&article.tags)
        .bind(article.published_at)
        .bind(article.featured)
        .bind(article.status.as_str())
        .bind(article.views)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(())
    }

    async fn update_article(&self, article: &Article) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE articles SET
                title = $1, slug = $2, excerpt = $3, content = $4, cover_image = $5,
                category = $6, tags = $7, published_at = $8, featured = $9, status = $10,
                updated_at = $11
            WHERE id = $12
            "#,
        )
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.excerpt)
        .bind(&article.content)
        .bind(&article.cover_image)
        .bind(article.category.as_str())
        .bind(&article.tags)
        .bind(article.published_at)
        .bind(article.featured)
        .bind(article.status.as_str())
        .bind(article.updated_at)
        .bind(article.id)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_article(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE articles SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(views)
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM articles a");
        push_article_filter(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn distinct_categories(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT a.category FROM articles a");
        push_article_filter(&mut qb, filter);
        qb.push(" ORDER BY a.category");
        let categories = qb.build_query_scalar::<String>().fetch_all(&self.pool).await?;
        Ok(categories)
    }

    async fn distinct_tags(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT DISTINCT t.tag FROM articles a CROSS JOIN LATERAL unnest(a.tags) AS t(tag)");
        push_article_filter(&mut qb, filter);
        qb.push(" ORDER BY t.tag");
        let tags = qb.build_query_scalar::<String>().fetch_all(&self.pool).await?;
        Ok(tags)
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO contacts (id, name, email, subject, message, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.subject)
        .bind(&contact.message)
        .bind(contact.status.as_str())
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, ContactRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Contact::try_from(r).map_err(StoreError::Corrupt))
            .collect()
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Contact::try_from(r).map_err(StoreError::Corrupt)).transpose()
    }

    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> StoreResult<Option<Contact>> {
        let sql = format!(
            "UPDATE contacts SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Contact::try_from(r).map_err(StoreError::Corrupt)).transpose()
    }

    async fn count_contacts(&self, status: Option<ContactStatus>) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contacts WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
