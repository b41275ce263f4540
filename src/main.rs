use akahidegn::{
    AkahidegnService, InMemoryLogging, InMemoryPreferences, InMemoryStore,
    api::{ApiDoc, AppService, api_routes},
    config::CONFIG,
};
use axum::{Router, http::header, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Periodically removes expired groups and repairs drifted member counts
fn spawn_cleanup(service: Arc<AppService>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match service.cleanup_expired_groups().await {
                Ok(report) => info!(
                    removed = report.removed.len(),
                    reconciled = report.reconciled.len(),
                    failed = report.failed.len(),
                    "Cleanup finished"
                ),
                Err(e) => error!("Cleanup failed: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter(CONFIG.log_level.as_str()).init();
    info!("Starting with {:?}", *CONFIG);

    // Initialize store, logging and preferences
    let storage = InMemoryStore::new();
    let logging = InMemoryLogging::new();
    let preferences = InMemoryPreferences::new();
    let service: Arc<AppService> = Arc::new(
        AkahidegnService::new(storage, logging, preferences, CONFIG.jwt_secret.clone())
            .with_join_strategy(CONFIG.join_strategy)
            .with_token_ttl(CONFIG.token_ttl()),
    );

    spawn_cleanup(service.clone(), CONFIG.cleanup_interval());

    let app = Router::new()
        // add / route with a simple health check
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30))) // 30-second timeout
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http()); // Request tracing

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
