//! Database row types. These map directly to SQLite rows.
//! Distinct from statusboard-types API models to keep the DB layer independent.
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use tracing::warn;

use statusboard_types::Priority;
use statusboard_types::api::{Note, Preset, ScheduleEntry};

pub struct NoteRow {
    pub id: i64,
    pub message: String,
    pub timestamp: String,
    pub priority: String,
}

pub struct PresetRow {
    pub id: i64,
    pub text: String,
    pub priority: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct WorkingHoursRow {
    pub person: String,
    pub day: String,
    pub location: Option<String>,
    pub hours: Option<String>,
}

impl NoteRow {
    /// Expects columns `id, message, timestamp, priority`.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            message: row.get(1)?,
            timestamp: row.get(2)?,
            priority: row.get(3)?,
        })
    }
}

impl PresetRow {
    /// Expects columns `id, text, priority, created_at, updated_at`.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            priority: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl WorkingHoursRow {
    /// Expects columns `person, day, location, hours`.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            person: row.get(0)?,
            day: row.get(1)?,
            location: row.get(2)?,
            hours: row.get(3)?,
        })
    }
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            priority: parse_priority(&row.priority, "note", row.id),
            timestamp: parse_timestamp(&row.timestamp, "note", row.id),
            id: row.id,
            message: row.message,
        }
    }
}

impl From<PresetRow> for Preset {
    fn from(row: PresetRow) -> Self {
        Preset {
            priority: parse_priority(&row.priority, "preset", row.id),
            created_at: parse_timestamp(&row.created_at, "preset", row.id),
            updated_at: parse_timestamp(&row.updated_at, "preset", row.id),
            id: row.id,
            text: row.text,
        }
    }
}

impl From<WorkingHoursRow> for ScheduleEntry {
    fn from(row: WorkingHoursRow) -> Self {
        ScheduleEntry {
            person: row.person,
            day: row.day,
            location: row.location,
            hours: row.hours,
        }
    }
}

/// Timestamps are stored as RFC 3339 with millisecond precision so that
/// text ordering matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str, table: &str, id: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            // Rows written by SQLite's datetime('now') have no timezone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} {}: {}", raw, table, id, e);
            DateTime::default()
        })
}

fn parse_priority(raw: &str, table: &str, id: i64) -> Priority {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt priority on {} {}: {}", table, id, e);
        Priority::default()
    })
}
