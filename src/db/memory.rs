use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, ArticleStore, ContactStore, StoreError, StoreResult};
use crate::models::{
    account::{Account, AccountChanges, Credentials, NewAccount},
    article::{Article, ArticleFilter, ArticleView, AuthorSummary},
    contact::{Contact, ContactStatus},
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Credentials>,
    articles: HashMap<Uuid, Article>,
    contacts: Vec<Contact>,
}

impl Tables {
    fn view(&self, article: &Article) -> ArticleView {
        let author_account = self.accounts.get(&article.author_id).map(|c| AuthorSummary {
            id: c.account.id,
            name: c.account.name.clone(),
            email: c.account.email.clone(),
        });
        ArticleView { article: article.clone(), author_account }
    }

    fn slug_in_use(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.articles
            .values()
            .any(|a| a.slug == slug && Some(a.id) != except)
    }

    fn email_in_use(&self, email: &str, except: Option<Uuid>) -> bool {
        self.accounts
            .values()
            .any(|c| c.account.email == email && Some(c.account.id) != except)
    }
}

/// Store en proceso con las mismas restricciones UNIQUE que Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn count_accounts(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.accounts.len() as i64)
    }

    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables.write().await;
        if tables.email_in_use(&new.email, None) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(
            account.id,
            Credentials { account: account.clone(), password_hash: new.password_hash },
        );
        Ok(account)
    }

    async fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&id).map(|c| c.account.clone()))
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> StoreResult<Option<Credentials>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|c| c.account.email == email).cloned())
    }

    async fn email_taken_by_other(&self, email: &str, except: Uuid) -> StoreResult<bool> {
        Ok(self.tables.read().await.email_in_use(email, Some(except)))
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> StoreResult<Option<Account>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.email_in_use(email, Some(id)) {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }

        let Some(creds) = tables.accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            creds.account.name = name;
        }
        if let Some(email) = changes.email {
            creds.account.email = email;
        }
        creds.account.updated_at = Utc::now();
        Ok(Some(creds.account.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.accounts.get_mut(&id) {
            Some(creds) => {
                creds.password_hash = password_hash.to_string();
                creds.account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<ArticleView>> {
        let tables = self.tables.read().await;
        let mut found: Vec<&Article> = tables.articles.values().filter(|a| filter.matches(a)).collect();
        // published_at DESC NULLS LAST, luego created_at DESC
        found.sort_by(|a, b| {
            let by_published = match (a.published_at, b.published_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            by_published.then(b.created_at.cmp(&a.created_at))
        });
        Ok(found.into_iter().map(|a| tables.view(a)).collect())
    }

    async fn find_article_by_id(&self, id: Uuid) -> StoreResult<Option<ArticleView>> {
        let tables = self.tables.read().await;
        Ok(tables.articles.get(&id).map(|a| tables.view(a)))
    }

    async fn find_article_by_slug(&self, slug: &str) -> StoreResult<Option<ArticleView>> {
        let tables = self.tables.read().await;
        Ok(tables.articles.values().find(|a| a.slug == slug).map(|a| tables.view(a)))
    }

    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> StoreResult<bool> {
        Ok(self.tables.read().await.slug_in_use(slug, except))
    }

    async fn insert_article(&self, article: &Article) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.slug_in_use(&article.slug, None) {
            return Err(StoreError::Duplicate { field: "slug" });
        }
        tables.articles.insert(article.id, article.clone());
        Ok(())
    }

    async fn update_article(&self, article: &Article) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.slug_in_use(&article.slug, Some(article.id)) {
            return Err(StoreError::Duplicate { field: "slug" });
        }
        match tables.articles.get_mut(&article.id) {
            Some(stored) => {
                // views y autoría no se tocan desde una edición
                let views = stored.views;
                *stored = Article { views, author: stored.author.clone(), ..article.clone() };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_article(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.articles.remove(&id).is_some())
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<i64>> {
        let mut tables = self.tables.write().await;
        Ok(tables.articles.get_mut(&id).map(|a| {
            a.views += 1;
            a.views
        }))
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.articles.values().filter(|a| filter.matches(a)).count() as i64)
    }

    async fn distinct_categories(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;
        let set: BTreeSet<String> = tables
            .articles
            .values()
            .filter(|a| filter.matches(a))
            .map(|a| a.category.as_str().to_string())
            .collect();
        Ok(set.into_iter().collect())
    }

    async fn distinct_tags(&self, filter: &ArticleFilter) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;
        let set: BTreeSet<String> = tables
            .articles
            .values()
            .filter(|a| filter.matches(a))
            .flat_map(|a| a.tags.iter().cloned())
            .collect();
        Ok(set.into_iter().collect())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()> {
        self.tables.write().await.contacts.push(contact.clone());
        Ok(())
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let mut contacts = self.tables.read().await.contacts.clone();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> StoreResult<Option<Contact>> {
        let mut tables = self.tables.write().await;
        Ok(tables.contacts.iter_mut().find(|c| c.id == id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn count_contacts(&self, status: Option<ContactStatus>) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .contacts
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .count();
        Ok(count as i64)
    }
}
