use axum::{extract::State, response::IntoResponse, Json};

use crate::{db::{ArticleStore, DbPool}, error::AppError, models::article::ArticleFilter};

// GET /api/posts/categories - siempre sobre publicados, haya sesión o no
pub async fn list_categories_handler(State(pool): State<DbPool>) -> Result<impl IntoResponse, AppError> {
    let categories = pool.distinct_categories(&ArticleFilter::published()).await?;
    Ok(Json(categories))
}
