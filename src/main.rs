use axum::middleware as axum_middleware;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use studyvault_api::database::{schema, DatabaseManager};
use studyvault_api::handlers::{admin, public};
use studyvault_api::middleware::{admin_guard, jwt_auth_middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = studyvault_api::config::config();
    tracing::info!("Starting StudyVault API in {:?} mode", config.environment);

    let pool = DatabaseManager::pool().await.expect("database pool");
    schema::migrate(&pool).await.expect("schema migration");

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("STUDYVAULT_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("StudyVault API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected admin API
        .merge(admin_routes())
        // Global middleware
        .layer(axum::extract::DefaultBodyLimit::max(
            studyvault_api::config::config().api.max_upload_size_bytes,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/auth/login", post(public::login))
        // Catalog browsing
        .route("/browse/fields", get(public::list_fields))
        .route("/browse/fields/:slug", get(public::field_detail))
        .route(
            "/browse/fields/:slug/semesters/:number",
            get(public::semester_modules),
        )
        .route("/browse/modules/:id", get(public::module_detail))
        // Search and download
        .route("/search/resources", get(public::search_resources))
        .route("/download/:id", get(public::download))
}

fn admin_routes() -> Router {
    Router::new()
        .route("/api/admin/whoami", get(admin::whoami::whoami))
        // Hierarchy
        .route(
            "/api/admin/fields",
            get(admin::fields::list).post(admin::fields::create),
        )
        .route(
            "/api/admin/fields/:id",
            put(admin::fields::update).delete(admin::fields::remove),
        )
        .route(
            "/api/admin/fields/:id/semesters",
            get(admin::semesters::list).post(admin::semesters::create),
        )
        .route(
            "/api/admin/semesters/:id",
            put(admin::semesters::update).delete(admin::semesters::remove),
        )
        .route(
            "/api/admin/semesters/:id/modules",
            get(admin::modules::list).post(admin::modules::create),
        )
        .route(
            "/api/admin/modules/:id",
            put(admin::modules::update).delete(admin::modules::remove),
        )
        .route(
            "/api/admin/modules/:id/submodules",
            get(admin::submodules::list).post(admin::submodules::create),
        )
        .route(
            "/api/admin/submodules/:id",
            put(admin::submodules::update).delete(admin::submodules::remove),
        )
        // Resources and moderation
        .route(
            "/api/admin/resources",
            get(admin::resources::list).post(admin::resources::create),
        )
        .route(
            "/api/admin/resources/:id",
            put(admin::resources::update).delete(admin::resources::remove),
        )
        .route("/api/admin/resources/:id/approve", post(admin::resources::approve))
        .route("/api/admin/resources/:id/reject", post(admin::resources::reject))
        // Scope grants
        .route(
            "/api/admin/scopes",
            get(admin::scopes::list)
                .post(admin::scopes::grant)
                .delete(admin::scopes::revoke),
        )
        // Analytics reports
        .route("/api/admin/analytics/top-searches", get(admin::analytics::top_searches))
        .route("/api/admin/analytics/by-field", get(admin::analytics::by_field))
        .route("/api/admin/analytics/by-module", get(admin::analytics::by_module))
        .route("/api/admin/analytics/heatmap", get(admin::analytics::heatmap))
        // Guard runs after auth, so auth is the outer layer.
        .layer(axum_middleware::from_fn(admin_guard))
        .layer(axum_middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "StudyVault API",
            "version": version,
            "description": "Academic resource-sharing backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login (public - token acquisition)",
                "browse": "/browse/fields[/:slug[/semesters/:number]], /browse/modules/:id (public)",
                "search": "/search/resources (public)",
                "download": "/download/:id (public)",
                "admin": "/api/admin/* (protected - hierarchy, resources, moderation)",
                "scopes": "/api/admin/scopes (restricted - super-admin only)",
                "analytics": "/api/admin/analytics/* (protected)",
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

