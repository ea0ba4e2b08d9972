//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. Everything except the health check
//! and the auth endpoints requires a bearer token.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer); endpoint handlers use `State<ApiContext>` via `with_state`.
pub fn api_router(ctx: ApiContext) -> Router {
    // Protected routes — bearer token required
    let protected = Router::new()
        .route(
            "/patients",
            post(endpoints::patients::create).get(endpoints::patients::list),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail).patch(endpoints::patients::update),
        )
        .route(
            "/patients/:id/prescriptions",
            get(endpoints::prescriptions::list_for_patient),
        )
        .route(
            "/patients/:id/invoices",
            get(endpoints::invoices::list_for_patient),
        )
        .route("/prescriptions", post(endpoints::prescriptions::create))
        .route("/prescriptions/:id", get(endpoints::prescriptions::detail))
        .route("/invoices", post(endpoints::invoices::create))
        .route("/invoices/number/next", get(endpoints::invoices::next_number))
        .route("/invoices/:id", get(endpoints::invoices::detail))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}
