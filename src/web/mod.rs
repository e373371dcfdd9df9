use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::store::ProductStore;

pub mod handlers;
pub mod responses;

pub use handlers::{get_product_by_id, get_product_by_name, health_check, list_products};
pub use responses::{ApiError, ErrorBody};

#[derive(Clone)]
pub struct AppState {
    pub store: ProductStore,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/products", get(list_products))
        // static segment takes precedence over the id parameter
        .route("/products/name/:name", get(get_product_by_name))
        .route("/products/:id", get(get_product_by_id))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server starting on {}:{}", config.host, config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
