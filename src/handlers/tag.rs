use axum::{extract::State, response::IntoResponse, Json};

use crate::{db::{ArticleStore, DbPool}, error::AppError, models::article::ArticleFilter};

// GET /api/posts/tags (público)
pub async fn list_tags_handler(State(pool): State<DbPool>) -> Result<impl IntoResponse, AppError> {
    let tags = pool.distinct_tags(&ArticleFilter::published()).await?;
    Ok(Json(tags))
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::json;

    use crate::testing::{seed_account, send, test_app};

    #[tokio::test]
    async fn categories_and_tags_only_come_from_published_articles() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let published = json!({
            "title": "Publicado", "content": "x", "category": "Design", "tags": ["ui", "css", "ui"],
        });
        let draft = json!({
            "title": "Borrador", "content": "x", "category": "Business", "tags": "secreto",
            "status": "draft",
        });
        send(&app, Method::POST, "/api/posts", Some(&token), Some(published)).await;
        send(&app, Method::POST, "/api/posts", Some(&token), Some(draft)).await;

        // Con sesión tampoco aparecen los borradores
        let (_, categories) = send(&app, Method::GET, "/api/posts/categories", Some(&token), None).await;
        assert_eq!(categories, json!(["Design"]));

        let (_, tags) = send(&app, Method::GET, "/api/posts/tags", None, None).await;
        assert_eq!(tags, json!(["css", "ui"]));
    }
}
