use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use statusboard_types::api::{CreateNoteRequest, MessageResponse, Note, UpdateNoteRequest};

use crate::error::{ApiError, parse_id};
use crate::extract::JsonBody;
use crate::state::AppState;

fn note_not_found() -> ApiError {
    ApiError::not_found("Note not found")
}

/// GET /api/notes: newest first.
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.with_store(|store| store.list_notes()).await?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(&id, "note")?;
    state
        .with_store(move |store| store.get_note(id))
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

/// POST /api/notes. The server picks the id (lowest free) and timestamp.
pub async fn create_note(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    let priority = req.priority.unwrap_or_default();

    let note = state
        .with_store(move |store| store.create_note(&message, priority))
        .await?;

    info!("Created note {} ({})", note.id, note.priority);
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/notes/{id}. Partial update; the timestamp refreshes even when
/// nothing else changes.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(&id, "note")?;

    let message = req.message.map(|m| m.trim().to_string());
    if message.as_deref() == Some("") {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }
    let priority = req.priority;

    state
        .with_store(move |store| store.update_note(id, message.as_deref(), priority))
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, "note")?;

    if !state.with_store(move |store| store.delete_note(id)).await? {
        return Err(note_not_found());
    }

    info!("Deleted note {}", id);
    Ok(Json(MessageResponse {
        message: "Note deleted successfully".into(),
    }))
}

/// DELETE /api/notes: always succeeds, even on an empty table.
pub async fn clear_notes(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.with_store(|store| store.clear_notes()).await?;

    info!("Cleared {} notes", removed);
    Ok(Json(MessageResponse {
        message: "All notes cleared".into(),
    }))
}
