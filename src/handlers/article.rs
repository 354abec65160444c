use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use chrono::Utc;
use uuid::Uuid;

use super::{message, parse_id};
use crate::{
    config::{Config, ContentProfile},
    db::{ArticleStore, DbPool},
    error::AppError,
    models::{
        account::Account,
        article::{
            Article, ArticleFilter, ArticleStatus, ArticleView, Category, CreateArticleSchema,
            FilterOptions, UpdateArticleSchema,
        },
    },
    utils::{
        extract::{AppJson, AppQuery},
        filter::build_filter,
        slug::{slug_or_fallback, slugify},
        validation::validate_fields,
    },
};

const NOT_FOUND: &str = "Artículo no encontrado";
const SLUG_TAKEN: &str = "Ya existe un artículo con este título";

// Anónimos solo ven publicados, pidan lo que pidan
fn scope_to_viewer(mut filter: ArticleFilter, viewer: Option<&Account>) -> ArticleFilter {
    if viewer.is_none() {
        filter.status = Some(ArticleStatus::Published);
    }
    filter
}

fn visible_to(view: &ArticleView, viewer: Option<&Account>) -> bool {
    viewer.is_some() || view.article.status == ArticleStatus::Published
}

fn parse_category(raw: Option<&str>, profile: ContentProfile) -> Result<Category, AppError> {
    raw.and_then(|c| c.parse::<Category>().ok())
        .filter(|c| profile.allows(*c))
        .ok_or_else(|| AppError::validation("category", "Categoría inválida"))
}

fn parse_status(raw: Option<&str>) -> Result<Option<ArticleStatus>, AppError> {
    raw.map(|s| s.trim().parse::<ArticleStatus>())
        .transpose()
        .map_err(|_| AppError::validation("status", "El estado debe ser 'draft' o 'published'"))
}

// Slug explícito normalizado; None si no trae nada utilizable
fn explicit_slug(raw: Option<&str>) -> Option<String> {
    raw.map(slugify).filter(|s| !s.is_empty())
}

async fn ensure_slug_free(pool: &DbPool, slug: &str, except: Option<Uuid>) -> Result<(), AppError> {
    if pool.slug_taken(slug, except).await? {
        tracing::warn!("Slug '{}' ya en uso", slug);
        return Err(AppError::Conflict(SLUG_TAKEN.to_string()));
    }
    Ok(())
}

// Lectura con efecto: en el perfil Post cada lectura suma exactamente una vista
async fn read_and_count(pool: &DbPool, profile: ContentProfile, mut view: ArticleView) -> Result<ArticleView, AppError> {
    if !profile.counts_views() {
        return Ok(view);
    }
    let views = pool
        .increment_views(view.article.id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    view.article.views = views;
    Ok(view)
}

// GET /api/posts (?category=Design&tag=rust&featured=true&status=draft&search=texto)
pub async fn list_articles_handler(
    State(pool): State<DbPool>,
    viewer: Option<Extension<Account>>,
    AppQuery(opts): AppQuery<FilterOptions>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.as_ref().map(|Extension(account)| account);
    let filter = scope_to_viewer(build_filter(&opts)?, viewer);

    let articles = pool.list_articles(&filter).await?;
    Ok(Json(articles))
}

// GET /api/posts/:id
pub async fn get_article_handler(
    Path(id): Path<String>,
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    viewer: Option<Extension<Account>>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let viewer = viewer.as_ref().map(|Extension(account)| account);

    let view = pool
        .find_article_by_id(id)
        .await?
        .filter(|v| visible_to(v, viewer))
        .ok_or(AppError::NotFound(NOT_FOUND))?;

    Ok(Json(read_and_count(&pool, config.profile, view).await?))
}

// GET /api/posts/slug/:slug
pub async fn get_article_by_slug_handler(
    Path(slug): Path<String>,
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    viewer: Option<Extension<Account>>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.as_ref().map(|Extension(account)| account);

    // Un borrador pedido por un anónimo responde igual que si no existiera
    let view = pool
        .find_article_by_slug(&slug)
        .await?
        .filter(|v| visible_to(v, viewer))
        .ok_or(AppError::NotFound(NOT_FOUND))?;

    Ok(Json(read_and_count(&pool, config.profile, view).await?))
}

// POST /api/posts
pub async fn create_article_handler(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Extension(account): Extension<Account>,
    AppJson(body): AppJson<CreateArticleSchema>,
) -> Result<impl IntoResponse, AppError> {
    let profile = config.profile;
    let body = body.normalized();

    validate_fields(&body, &["title", "content"])?;
    let excerpt = body.excerpt.clone().unwrap_or_default();
    if profile.excerpt_required() && excerpt.is_empty() {
        return Err(AppError::validation("excerpt", "El extracto es obligatorio"));
    }
    let cover_image = match body.cover_image.clone().filter(|c| !c.is_empty()) {
        Some(url) => url,
        None if profile.cover_image_required() => {
            return Err(AppError::validation("cover_image", "La imagen de portada es obligatoria"));
        }
        None => profile.default_cover_image().to_string(),
    };
    let category = parse_category(body.category.as_deref(), profile)?;
    let status = parse_status(body.status.as_deref())?.unwrap_or(ArticleStatus::Published);

    let slug = explicit_slug(body.slug.as_deref())
        .unwrap_or_else(|| slug_or_fallback(Some(&body.title), profile.slug_prefix()));
    ensure_slug_free(&pool, &slug, None).await?;

    let now = Utc::now();
    let article = Article {
        id: Uuid::new_v4(),
        title: body.title,
        slug,
        excerpt,
        content: body.content,
        cover_image,
        author: account.name.clone(),
        author_id: account.id,
        category,
        tags: body.tags.map(|t| t.into_tags()).unwrap_or_default(),
        published_at: (status == ArticleStatus::Published).then_some(now),
        featured: body.featured.unwrap_or(false),
        status,
        views: 0,
        created_at: now,
        updated_at: now,
    };

    // Si otra petición ganó la carrera, el UNIQUE del store responde Conflict
    pool.insert_article(&article).await?;
    tracing::info!("Artículo creado: {} ({})", article.slug, article.id);

    let view = pool
        .find_article_by_id(article.id)
        .await?
        .ok_or_else(|| AppError::internal("Artículo recién creado no encontrado"))?;

    Ok((StatusCode::CREATED, Json(view)))
}

// Carga el artículo y verifica que la cuenta sea la dueña
async fn load_owned(pool: &DbPool, raw_id: &str, account: &Account, action: &'static str) -> Result<Article, AppError> {
    let id = parse_id(raw_id, NOT_FOUND)?;
    let view = pool
        .find_article_by_id(id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;

    if view.article.author_id != account.id {
        tracing::warn!("Cuenta {} intentó {} el artículo {}", account.id, action, id);
        return Err(AppError::Forbidden("No tienes permiso sobre este artículo"));
    }
    Ok(view.article)
}

// PUT /api/posts/:id - solo se cambia lo que viene en el JSON
pub async fn update_article_handler(
    Path(id): Path<String>,
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Extension(account): Extension<Account>,
    AppJson(body): AppJson<UpdateArticleSchema>,
) -> Result<impl IntoResponse, AppError> {
    let profile = config.profile;
    let body = body.normalized();

    // Todo lo que se valida sin tocar el store va antes de cargar el artículo
    validate_fields(&body, &["title", "content"])?;
    if profile.excerpt_required() && body.excerpt.as_deref() == Some("") {
        return Err(AppError::validation("excerpt", "El extracto no puede estar vacío"));
    }
    if profile.cover_image_required() && body.cover_image.as_deref() == Some("") {
        return Err(AppError::validation("cover_image", "La imagen de portada no puede estar vacía"));
    }
    let category = body
        .category
        .as_deref()
        .map(|raw| parse_category(Some(raw), profile))
        .transpose()?;
    let status = parse_status(body.status.as_deref())?;

    let mut article = load_owned(&pool, &id, &account, "editar").await?;

    // Nuevo slug: el explícito manda; si no, se recalcula cuando cambia el título
    let title_changed = body.title.as_deref().is_some_and(|t| t != article.title);
    let new_slug = explicit_slug(body.slug.as_deref()).or_else(|| {
        title_changed.then(|| slug_or_fallback(body.title.as_deref(), profile.slug_prefix()))
    });
    if let Some(slug) = new_slug {
        if slug != article.slug {
            ensure_slug_free(&pool, &slug, Some(article.id)).await?;
            article.slug = slug;
        }
    }

    if let Some(title) = body.title {
        article.title = title;
    }
    if let Some(excerpt) = body.excerpt {
        article.excerpt = excerpt;
    }
    if let Some(content) = body.content {
        article.content = content;
    }
    if let Some(cover_image) = body.cover_image {
        article.cover_image = cover_image;
    }
    if let Some(category) = category {
        article.category = category;
    }
    if let Some(tags) = body.tags {
        article.tags = tags.into_tags();
    }
    if let Some(featured) = body.featured {
        article.featured = featured;
    }
    if let Some(status) = status {
        article.status = status;
        // La fecha de publicación se fija la primera vez que se publica
        if status == ArticleStatus::Published && article.published_at.is_none() {
            article.published_at = Some(Utc::now());
        }
    }
    article.updated_at = Utc::now();

    if !pool.update_article(&article).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }

    let view = pool
        .find_article_by_id(article.id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;

    Ok(Json(view))
}

// DELETE /api/posts/:id - borrado definitivo
pub async fn delete_article_handler(
    Path(id): Path<String>,
    State(pool): State<DbPool>,
    Extension(account): Extension<Account>,
) -> Result<impl IntoResponse, AppError> {
    let article = load_owned(&pool, &id, &account, "borrar").await?;

    if !pool.delete_article(article.id).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }
    tracing::info!("Artículo eliminado: {}", article.id);

    Ok(message("Artículo eliminado correctamente"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::{
        config::ContentProfile,
        testing::{seed_account, send, test_app, test_app_with},
    };

    fn post_body(title: &str) -> Value {
        json!({
            "title": title,
            "content": "Contenido del artículo",
            "category": "Development",
            "tags": "rust, axum",
        })
    }

    #[tokio::test]
    async fn create_derives_slug_and_rejects_colliding_titles() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let (status, body) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Hello, World! 2024"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "hello-world-2024");
        assert_eq!(body["author"], "Ana");
        assert_eq!(body["author_account"]["email"], "ana@example.com");
        assert_eq!(body["tags"], json!(["rust", "axum"]));
        assert_eq!(body["status"], "published");
        assert!(body["published_at"].is_string());

        let (status, _) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Hello World 2024"))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, list) = send(&app, Method::GET, "/api/posts", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_requires_a_title_and_creates_nothing_without_one() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let (status, body) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("   "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "title");

        let (_, list) = send(&app, Method::GET, "/api/posts", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_validates_category_and_requires_auth() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let mut body = post_body("Una categoría rara");
        body["category"] = json!("Cooking");
        let (status, err) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "category");

        let (status, _) = send(&app, Method::POST, "/api/posts", None, Some(post_body("Sin token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blog_profile_requires_cover_image_and_limits_categories() {
        let (app, state) = test_app_with(ContentProfile::Blog);
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let mut body = post_body("Sin portada");
        body["excerpt"] = json!("Resumen");
        let (status, err) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "cover_image");

        body["cover_image"] = json!("https://example.com/a.png");
        body["category"] = json!("Lifestyle");
        let (status, err) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "category");

        body["category"] = json!("Design");
        let (status, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["cover_image"], "https://example.com/a.png");
    }

    #[tokio::test]
    async fn post_profile_defaults_the_cover_image() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Con portada"))).await;
        assert!(created["cover_image"].as_str().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn title_without_alphanumerics_gets_a_fallback_slug() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let (status, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("!!!"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["slug"].as_str().unwrap().starts_with("post-"));
    }

    #[tokio::test]
    async fn anonymous_list_never_includes_drafts() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let mut draft = post_body("Borrador secreto");
        draft["status"] = json!("draft");
        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(draft)).await;
        assert!(created["published_at"].is_null());
        send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Publicado"))).await;

        let (_, anon) = send(&app, Method::GET, "/api/posts?status=draft", None, None).await;
        let anon = anon.as_array().unwrap();
        assert_eq!(anon.len(), 1);
        assert!(anon.iter().all(|a| a["status"] == "published"));

        // Un token inválido cuenta como anónimo
        let (_, bad) = send(&app, Method::GET, "/api/posts?status=draft", Some("basura"), None).await;
        assert_eq!(bad.as_array().unwrap().len(), 1);

        let (_, admin) = send(&app, Method::GET, "/api/posts?status=draft", Some(&token), None).await;
        let admin = admin.as_array().unwrap();
        assert_eq!(admin.len(), 1);
        assert_eq!(admin[0]["status"], "draft");

        let (_, all) = send(&app, Method::GET, "/api/posts", Some(&token), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_filters_by_search_tag_category_and_featured() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let mut a = post_body("Axum en producción");
        a["featured"] = json!(true);
        a["tags"] = json!(["rust", "web"]);
        let mut b = post_body("Diseño de interfaces");
        b["category"] = json!("Design");
        b["tags"] = json!(["ui"]);
        b["excerpt"] = json!("Notas sobre AXUM y CSS");
        send(&app, Method::POST, "/api/posts", Some(&token), Some(a)).await;
        send(&app, Method::POST, "/api/posts", Some(&token), Some(b)).await;

        let count = |v: Value| v.as_array().unwrap().len();
        assert_eq!(count(send(&app, Method::GET, "/api/posts?search=axum", None, None).await.1), 2);
        assert_eq!(count(send(&app, Method::GET, "/api/posts?tag=web", None, None).await.1), 1);
        assert_eq!(count(send(&app, Method::GET, "/api/posts?category=Design", None, None).await.1), 1);
        assert_eq!(count(send(&app, Method::GET, "/api/posts?featured=true", None, None).await.1), 1);
        assert_eq!(count(send(&app, Method::GET, "/api/posts?tag=nada", None, None).await.1), 0);

        let (status, _) = send(&app, Method::GET, "/api/posts?featured=quizas", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_is_sorted_by_publication_date_descending() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        for title in ["Primero", "Segundo", "Tercero"] {
            send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body(title))).await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let (_, list) = send(&app, Method::GET, "/api/posts", None, None).await;
        let titles: Vec<_> = list.as_array().unwrap().iter().map(|a| a["title"].clone()).collect();
        assert_eq!(titles, vec![json!("Tercero"), json!("Segundo"), json!("Primero")]);
    }

    #[tokio::test]
    async fn reads_by_id_and_slug_count_every_view() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;
        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Contador"))).await;
        let id = created["id"].as_str().unwrap().to_string();

        for expected in 1..=3 {
            let (status, body) = send(&app, Method::GET, &format!("/api/posts/{id}"), None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["views"], expected);
        }
        let (_, body) = send(&app, Method::GET, "/api/posts/slug/contador", Some(&token), None).await;
        assert_eq!(body["views"], 4);
    }

    #[tokio::test]
    async fn blog_profile_does_not_count_views() {
        let (app, state) = test_app_with(ContentProfile::Blog);
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;
        let mut body = post_body("Sin contador");
        body["excerpt"] = json!("Resumen");
        body["cover_image"] = json!("https://example.com/a.png");
        send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;

        for _ in 0..2 {
            let (status, read) = send(&app, Method::GET, "/api/posts/slug/sin-contador", None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(read["views"], 0);
        }
    }

    #[tokio::test]
    async fn drafts_are_not_found_for_anonymous_readers() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;
        let mut draft = post_body("Borrador");
        draft["status"] = json!("draft");
        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(draft)).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::GET, "/api/posts/slug/borrador", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("/api/posts/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, "/api/posts/slug/borrador", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["views"], 1);

        let (status, _) = send(&app, Method::GET, "/api/posts/no-es-un-uuid", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_is_partial_and_recomputes_slug_on_title_change() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;
        let mut draft = post_body("Título original");
        draft["status"] = json!("draft");
        draft["excerpt"] = json!("Resumen");
        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(draft)).await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/posts/{id}");

        let (status, updated) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "Nuevo título" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["slug"], "nuevo-t-tulo");
        assert_eq!(updated["excerpt"], "Resumen");
        assert_eq!(updated["tags"], json!(["rust", "axum"]));
        assert!(updated["published_at"].is_null());

        let (_, published) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "published" }))).await;
        let first_published_at = published["published_at"].clone();
        assert!(first_published_at.is_string());

        // Volver a borrador y republicar conserva la fecha original
        send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "draft" }))).await;
        let (_, again) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "published" }))).await;
        assert_eq!(again["published_at"], first_published_at);

        let (status, err) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "title");
    }

    #[tokio::test]
    async fn update_rejects_slug_collisions_with_other_articles() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;
        send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Ocupado"))).await;
        let (_, other) = send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Libre"))).await;
        let uri = format!("/api/posts/{}", other["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "Ocupado!" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Mismo slug que ya tiene: no es colisión
        let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "LIBRE" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "libre");
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_before_looking_up_the_article() {
        let (app, state) = test_app();
        let (_, owner) = seed_account(&state, "Ana", "ana@example.com").await;
        let (_, intruder) = seed_account(&state, "Beto", "beto@example.com").await;

        let missing = format!("/api/posts/{}", uuid::Uuid::nil());
        let (status, err) = send(&app, Method::PUT, &missing, Some(&owner), Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "title");

        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&owner), Some(post_body("De Ana"))).await;
        let uri = format!("/api/posts/{}", created["id"].as_str().unwrap());
        let (status, err) =
            send(&app, Method::PUT, &uri, Some(&intruder), Some(json!({ "category": "Cooking" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "category");
    }

    #[tokio::test]
    async fn mistyped_fields_get_a_json_error_naming_the_field() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let mut body = post_body("Tipos raros");
        body["featured"] = json!("yes");
        let (status, err) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["message"].is_string());
        assert_eq!(err["field"], "featured");

        let mut body = post_body("Tags numéricos");
        body["tags"] = json!(["a", 5]);
        let (status, created) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["tags"], json!(["a", "5"]));
    }

    #[tokio::test]
    async fn concurrent_creates_with_the_same_slug_admit_only_one() {
        let (app, state) = test_app();
        let (_, token) = seed_account(&state, "Ana", "ana@example.com").await;

        let (first, second) = tokio::join!(
            send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("Carrera"))),
            send(&app, Method::POST, "/api/posts", Some(&token), Some(post_body("¡Carrera!"))),
        );
        let mut statuses = [first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

        let (_, list) = send(&app, Method::GET, "/api/posts", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_owners_cannot_update_or_delete() {
        let (app, state) = test_app();
        let (_, owner) = seed_account(&state, "Ana", "ana@example.com").await;
        let (_, intruder) = seed_account(&state, "Beto", "beto@example.com").await;
        let (_, created) = send(&app, Method::POST, "/api/posts", Some(&owner), Some(post_body("Mío"))).await;
        let uri = format!("/api/posts/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::PUT, &uri, Some(&intruder), Some(json!({ "title": "Robado" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, unchanged) = send(&app, Method::GET, "/api/posts/slug/m-o", None, None).await;
        assert_eq!(unchanged["title"], "Mío");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
