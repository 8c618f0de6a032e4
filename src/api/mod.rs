mod handlers;
pub mod middleware;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;

pub use handlers::MAX_HISTORY_DAYS;
pub use middleware::SecurityConfig;

/// Router with authentication disabled and permissive CORS.
pub fn create_router(db: Database) -> Router {
    create_router_with(db, SecurityConfig::disabled())
}

pub fn create_router_with(db: Database, security: SecurityConfig) -> Router {
    let doses = Router::new()
        // Dose log
        .route("/users/{user_id}/doses", get(handlers::list_doses))
        .route("/users/{user_id}/doses", post(handlers::create_dose))
        .route("/users/{user_id}/doses", delete(handlers::clear_doses))
        .route("/users/{user_id}/doses/{id}", get(handlers::get_dose))
        .route("/users/{user_id}/doses/{id}", put(handlers::update_dose))
        .route("/users/{user_id}/doses/{id}", delete(handlers::delete_dose))
        // Derived load
        .route("/users/{user_id}/load", get(handlers::current_load))
        .route("/users/{user_id}/history", get(handlers::load_history))
        // Raw rows for troubleshooting
        .route("/users/{user_id}/debug", get(handlers::dump_doses))
        .route_layer(axum::middleware::from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(doses);

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&security))
        .with_state(db)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &security.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
