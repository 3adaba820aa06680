// HTTP request handlers
use crate::application::config_service::{
    ConfigFile, GeneratedFiles, PublishRequest, ServiceError,
};
use crate::domain::dashboard::CanonicalModel;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub message: String,
    pub files: Vec<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::UnknownFile(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "Request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Raw content of every known config file
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConfigFile>>, ServiceError> {
    Ok(Json(state.config_service.read_files().await?))
}

/// Canonical model built from the files on disk
pub async fn get_canonical(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CanonicalModel>, ServiceError> {
    Ok(Json(state.config_service.load_canonical().await?))
}

/// YAML that publishing this model would write
pub async fn preview_canonical(
    State(state): State<Arc<AppState>>,
    Json(model): Json<CanonicalModel>,
) -> Result<Json<GeneratedFiles>, ServiceError> {
    Ok(Json(state.config_service.preview(&model).await?))
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ServiceError> {
    let files = state.config_service.publish(request).await?;
    Ok(Json(PublishResponse {
        message: "Published successfully".to_string(),
        files,
    }))
}
