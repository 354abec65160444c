use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::{
    db::{ArticleStore, ContactStore, DbPool},
    error::AppError,
    models::{
        article::{ArticleFilter, ArticleStatus},
        contact::ContactStatus,
    },
};

#[derive(Debug, Serialize)]
pub struct PostStats {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub featured: i64,
}

#[derive(Debug, Serialize)]
pub struct ContactStats {
    pub total: i64,
    pub new: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub posts: PostStats,
    pub categories: usize,
    pub contacts: ContactStats,
}

// GET /api/admin/stats - números del panel
pub async fn stats_handler(State(pool): State<DbPool>) -> Result<impl IntoResponse, AppError> {
    let total = pool.count_articles(&ArticleFilter::default()).await?;
    let published = pool
        .count_articles(&ArticleFilter { status: Some(ArticleStatus::Published), ..Default::default() })
        .await?;
    let featured = pool
        .count_articles(&ArticleFilter { featured: Some(true), ..Default::default() })
        .await?;
    let categories = pool.distinct_categories(&ArticleFilter::default()).await?.len();

    Ok(Json(DashboardStats {
        posts: PostStats { total, published, draft: total - published, featured },
        categories,
        contacts: ContactStats {
            total: pool.count_contacts(None).await?,
            new: pool.count_contacts(Some(ContactStatus::New)).await?,
        },
    }))
}
