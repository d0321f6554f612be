//! NexusTrade Backend Server
//!
//! REST API server gating AI chart analysis behind license activation.

use nexustrade_backend::api::create_router;
use nexustrade_backend::config::Config;
use nexustrade_backend::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use nexustrade_backend::models::{
    ActivateRequest, ActivateResponse, AnalysisResponse, AnalyzeRequest, HealthResponse, Signal,
};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        nexustrade_backend::api::handlers::health_check,
        nexustrade_backend::api::handlers::analyze_chart,
        nexustrade_backend::api::handlers::activate_license,
    ),
    components(
        schemas(
            HealthResponse,
            AnalyzeRequest,
            AnalysisResponse,
            Signal,
            ActivateRequest,
            ActivateResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Analysis", description = "AI chart analysis"),
        (name = "License", description = "PRO license activation"),
    ),
    info(
        title = "NexusTrade API",
        version = "0.1.0",
        description = "REST API for AI-assisted trading chart analysis",
        license(name = "MIT"),
        contact(name = "NexusTrade", email = "dev@nexustrade.app")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Resolve configuration once: optional TOML file, then required secrets
    let config = match std::env::var("NEXUS_CONFIG") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    let config = config.resolve()?;

    let host = config.server.host.clone();
    let port = config.server.port;

    // Create application state
    let state = Arc::new(AppState::from_config(config)?);

    info!("Starting NexusTrade backend on {}:{}", host, port);
    info!(
        "Swagger UI available at http://{}:{}/swagger-ui/",
        host, port
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server; connect info feeds the rate limiter's IP fallback
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
