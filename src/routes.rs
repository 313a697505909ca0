// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::assessment, state::AppState, utils::jwt::auth_middleware};

/// Assembles the main application router.
///
/// * Every assessment route requires a bearer token.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (question bank, session store, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let assessment_routes = Router::new()
        .route("/", post(assessment::create_session))
        .route("/{id}", get(assessment::get_session))
        .route("/{id}/next", post(assessment::next_question))
        .route("/{id}/answers", post(assessment::submit_answer))
        .route("/{id}/finalize", post(assessment::finalize))
        .route("/{id}/abandon", post(assessment::abandon))
        .route("/{id}/result", get(assessment::get_result))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/assessments", assessment_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
