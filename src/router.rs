use axum::{
    extract::DefaultBodyLimit,
    http::header,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, error::AppError, handlers, AppState};

/// Room for multipart boundaries and text fields around the résumé itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Routes that need a bearer token
    let protected_routes = Router::new()
        .route("/jobs/{id}/apply", post(handlers::apply_handler))
        .route("/applications", get(handlers::list_applications_handler))
        .route("/applications/{id}", get(handlers::get_application_handler))
        .route(
            "/applications/{id}/status",
            patch(handlers::update_status_handler),
        )
        .route("/uploads/{reference}", get(handlers::get_upload_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(handlers::health_handler))
        .route("/auth/register", post(auth::handlers::register_handler))
        .route("/auth/login", post(auth::handlers::login_handler))
        .route(
            "/jobs",
            get(handlers::list_jobs_handler).post(handlers::create_job_handler),
        )
        .route(
            "/jobs/{id}",
            get(handlers::get_job_handler).delete(handlers::delete_job_handler),
        )
        // Listing is public, publishing checks for an admin token in the handler
        .route(
            "/news",
            get(handlers::list_news_handler).post(handlers::create_news_handler),
        )
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(
            state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route".to_string())
}
