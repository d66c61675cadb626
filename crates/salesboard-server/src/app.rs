use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.settings.media.static_dir.clone();
    let body_limit = state.settings.server.max_upload_bytes;

    // Dashboard feeds
    let dashboard_routes = Router::new()
        .route("/data", get(handlers::sales::monthly_sales_handler))
        .route("/goals", get(handlers::goals::goals_handler))
        .route("/people", get(handlers::manage::people_handler));

    // Roster admin
    let admin_routes = Router::new()
        .route(
            "/manage",
            get(handlers::manage::manage_view_handler)
                .post(handlers::manage::manage_submit_handler),
        )
        .route("/delete/{name}", get(handlers::manage::delete_person_handler))
        .route("/update/{name}", post(handlers::manage::update_person_handler));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(dashboard_routes)
        .merge(admin_routes)
        // Uploaded photos, icons and videos live under the static root
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(DefaultBodyLimit::max(body_limit))
}
