use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tripshare_api::database::DatabaseManager;
use tripshare_api::{config, handlers, middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Tripshare API in {:?} mode", config.environment);

    if let Err(e) = DatabaseManager::migrate().await {
        // Lazy pool creation will retry on first query; /health reports degraded
        tracing::warn!("Could not apply migrations at startup: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("TRIPSHARE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Tripshare API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(users_routes())
        .merge(messages_routes())
        // Global middleware: identification is advisory, gates live in handlers
        .layer(from_fn(middleware::authenticate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn users_routes() -> Router {
    use handlers::users;

    // Note: username lookup lives under a literal prefix because the
    // router requires one capture name per position, and every other
    // /users route captures :user_id there.
    Router::new()
        .route("/users/by-username/:username", get(users::user_get))
        .route("/users/:user_id/connections", get(users::connections_get))
        .route(
            "/users/:user_id/connections/trips",
            get(users::connections_trips_get),
        )
        .route(
            "/users/:user_id/follow/:followee_id",
            post(users::follow_post),
        )
        .route(
            "/users/:user_id/unfollow/:followee_id",
            delete(users::unfollow_delete),
        )
        .route("/users/:user_id/like/:trip_id", post(users::like_post))
        .route("/users/:user_id/unlike/:trip_id", delete(users::unlike_delete))
        .route("/users/:user_id/avatar", post(users::avatar_post))
}

fn messages_routes() -> Router {
    use handlers::messages;

    Router::new()
        .route(
            "/messages/:to_user_id/:from_user_id",
            get(messages::conversation_get),
        )
        .route("/messages/create", post(messages::message_post))
        .route("/messages/edit/:msg_id", patch(messages::message_patch))
        .route("/messages/delete/:msg_id", delete(messages::message_delete))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Tripshare API",
            "version": version,
            "description": "Social travel-sharing backend: follows, likes, direct messages",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "users": "/users/by-username/:username, /users/:user_id/connections[/trips] (protected)",
                "follows": "/users/:user_id/follow|unfollow/:followee_id (protected)",
                "likes": "/users/:user_id/like|unlike/:trip_id (protected)",
                "messages": "/messages/:to_user_id/:from_user_id, /messages/create|edit|delete (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
