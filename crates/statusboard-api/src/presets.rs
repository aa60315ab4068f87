use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use statusboard_types::api::{CreatePresetRequest, MessageResponse, Preset, UpdatePresetRequest};

use crate::error::{ApiError, parse_id};
use crate::extract::JsonBody;
use crate::state::AppState;

fn preset_not_found() -> ApiError {
    ApiError::not_found("Preset not found")
}

pub async fn list_presets(State(state): State<AppState>) -> Result<Json<Vec<Preset>>, ApiError> {
    let presets = state.with_store(|store| store.list_presets()).await?;
    Ok(Json(presets))
}

pub async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Preset>, ApiError> {
    let id = parse_id(&id, "preset")?;
    state
        .with_store(move |store| store.get_preset(id))
        .await?
        .map(Json)
        .ok_or_else(preset_not_found)
}

pub async fn create_preset(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreatePresetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }
    let priority = req.priority.unwrap_or_default();

    let preset = state
        .with_store(move |store| store.create_preset(&text, priority))
        .await?;

    info!("Created preset {}", preset.id);
    Ok((StatusCode::CREATED, Json(preset)))
}

pub async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdatePresetRequest>,
) -> Result<Json<Preset>, ApiError> {
    let id = parse_id(&id, "preset")?;

    let text = req.text.map(|t| t.trim().to_string());
    if text.as_deref() == Some("") {
        return Err(ApiError::bad_request("Text is required"));
    }
    let priority = req.priority;

    state
        .with_store(move |store| store.update_preset(id, text.as_deref(), priority))
        .await?
        .map(Json)
        .ok_or_else(preset_not_found)
}

pub async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, "preset")?;

    if !state.with_store(move |store| store.delete_preset(id)).await? {
        return Err(preset_not_found());
    }

    info!("Deleted preset {}", id);
    Ok(Json(MessageResponse {
        message: "Preset deleted successfully".into(),
    }))
}
