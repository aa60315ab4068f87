use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use statusboard_types::api::{
    PersonSchedule, ReplaceScheduleRequest, ScheduleEntry, UpsertDayRequest, WorkingHours,
};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

/// GET /api/working-hours: every person's week.
pub async fn get_working_hours(
    State(state): State<AppState>,
) -> Result<Json<WorkingHours>, ApiError> {
    let hours = state.with_store(|store| store.working_hours()).await?;
    Ok(Json(hours))
}

pub async fn get_person_schedule(
    State(state): State<AppState>,
    Path(person): Path<String>,
) -> Result<Json<PersonSchedule>, ApiError> {
    state
        .with_store(move |store| store.person_schedule(&person))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Person not found"))
}

/// PUT /api/working-hours/{person}: replaces the whole week of a known person.
/// Without a `schedule` the current week is returned unchanged.
pub async fn replace_person_schedule(
    State(state): State<AppState>,
    Path(person): Path<String>,
    JsonBody(req): JsonBody<ReplaceScheduleRequest>,
) -> Result<Json<PersonSchedule>, ApiError> {
    let Some(schedule) = req.schedule else {
        return get_person_schedule(State(state), Path(person)).await;
    };

    let days = schedule.len();
    let key = person.clone();

    let replaced = state
        .with_store(move |store| store.replace_person_schedule(&key, &schedule))
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))?;

    info!("Replaced schedule for {} ({} days)", replaced.name, days);
    Ok(Json(replaced))
}

/// PUT /api/working-hours/{person}/{day}: insert-or-update one day.
pub async fn upsert_day(
    State(state): State<AppState>,
    Path((person, day)): Path<(String, String)>,
    JsonBody(req): JsonBody<UpsertDayRequest>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    if person.trim().is_empty() || day.trim().is_empty() {
        return Err(ApiError::bad_request("Person and day are required"));
    }

    let entry = state
        .with_store(move |store| {
            store.upsert_day(&person, &day, req.location.as_deref(), req.hours.as_deref())
        })
        .await?;

    info!("Updated {} on {}", entry.person, entry.day);
    Ok(Json(entry))
}
