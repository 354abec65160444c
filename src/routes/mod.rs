use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::expose_internal_errors,
    handlers::{admin, article, auth, category, contact, health_handler, tag},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Origen CORS inválido ignorado: {}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

pub fn create_routes(state: AppState) -> Router {
    // 1. Rutas públicas (todo el mundo)
    let public_routes = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/posts/categories", get(category::list_categories_handler))
        .route("/api/posts/tags", get(tag::list_tags_handler))
        .route("/api/contact", post(contact::submit_contact_handler));

    // 2. Lectura de artículos: con token válido se ven también los borradores
    let reader_routes = Router::new()
        .route("/api/posts", get(article::list_articles_handler))
        .route("/api/posts/slug/:slug", get(article::get_article_by_slug_handler))
        .route("/api/posts/:id", get(article::get_article_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    // 3. Panel de administración - requieren sesión
    let admin_routes = Router::new()
        .route("/api/posts", post(article::create_article_handler))
        .route(
            "/api/posts/:id",
            put(article::update_article_handler).delete(article::delete_article_handler),
        )
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/auth/update-profile", put(auth::update_profile_handler))
        .route("/api/auth/update-password", put(auth::update_password_handler))
        .route("/api/admin/profile", put(auth::update_profile_handler))
        .route("/api/admin/password", put(auth::update_password_handler))
        .route("/api/admin/stats", get(admin::stats_handler))
        .route("/api/contact", get(contact::list_contacts_handler))
        .route("/api/contact/:id", get(contact::get_contact_handler))
        .route("/api/contact/:id/status", put(contact::update_contact_status_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Fusionamos todo
    Router::new()
        .merge(public_routes)
        .merge(reader_routes)
        .merge(admin_routes)
        .layer(middleware::map_response_with_state(state.clone(), expose_internal_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}
