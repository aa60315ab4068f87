use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::priority::{self, Priority};

/// Days the display renders, in order.
pub const WEEKDAYS: [&str; 5] = ["monday", "tuesday", "wednesday", "thursday", "friday"];

// -- Notes --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub message: String,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "priority::deserialize_optional")]
    pub priority: Option<Priority>,
}

/// Partial update: only the supplied fields change.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "priority::deserialize_optional"
    )]
    pub priority: Option<Priority>,
}

// -- Presets --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: i64,
    pub text: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreatePresetRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "priority::deserialize_optional")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePresetRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "priority::deserialize_optional"
    )]
    pub priority: Option<Priority>,
}

// -- Working hours --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub location: Option<String>,
    pub hours: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSchedule {
    pub name: String,
    pub schedule: BTreeMap<String, DaySchedule>,
}

/// Full snapshot keyed by lowercase person key.
pub type WorkingHours = BTreeMap<String, PersonSchedule>;

/// A body without `schedule` leaves the person's week as it is.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReplaceScheduleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<BTreeMap<String, DaySchedule>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpsertDayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}

/// One stored (person, day) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub person: String,
    pub day: String,
    pub location: Option<String>,
    pub hours: Option<String>,
}

// -- Generic bodies --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// "tim" -> "Tim". The display shows person keys this way.
pub fn display_name(person: &str) -> String {
    let mut chars = person.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sort key for day names: weekdays in calendar order, anything else after.
pub fn day_rank(day: &str) -> usize {
    const WEEK: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    WEEK.iter().position(|d| *d == day).unwrap_or(WEEK.len())
}
