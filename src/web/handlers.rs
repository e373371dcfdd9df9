use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::Value;

use super::{ApiError, AppState};
use crate::models::ProductRecord;

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    match state.store.list_all().await {
        Ok(products) => Ok(Json(products)),
        Err(e) => {
            tracing::error!(error = %e, "failed to list products");
            Err(ApiError::internal())
        }
    }
}

pub async fn get_product_by_id(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductRecord>, ApiError> {
    match state.store.find_by_id(&product_id).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(ApiError::not_found(format!(
            "Product with ID '{}' not found",
            product_id
        ))),
        Err(e) => {
            tracing::error!(%product_id, error = %e, "failed to fetch product by id");
            Err(ApiError::internal())
        }
    }
}

pub async fn get_product_by_name(
    State(state): State<AppState>,
    Path(product_name): Path<String>,
) -> Result<Json<ProductRecord>, ApiError> {
    match state.store.find_by_name(&product_name).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(ApiError::not_found(format!(
            "Product with name '{}' not found",
            product_name
        ))),
        Err(e) => {
            tracing::error!(%product_name, error = %e, "failed to fetch product by name");
            Err(ApiError::internal())
        }
    }
}

pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "yarn-scout",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
