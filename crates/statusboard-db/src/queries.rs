use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::{debug, warn};

use statusboard_types::Priority;
use statusboard_types::api::{
    DaySchedule, Note, PersonSchedule, Preset, ScheduleEntry, WorkingHours, display_name,
};

use crate::models::{NoteRow, PresetRow, WorkingHoursRow, format_timestamp};

/// Attempts at claiming the lowest free note id before giving up. Only
/// another writer on the same file can make an attempt collide.
const NOTE_ID_ATTEMPTS: usize = 3;

/// Person and day keys are stored trimmed and lowercase.
fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// -- Notes --

pub fn list_notes(conn: &Connection) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, message, timestamp, priority FROM notes ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], NoteRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(Note::from).collect())
}

pub fn get_note(conn: &Connection, id: i64) -> Result<Option<Note>> {
    let row = conn
        .query_row(
            "SELECT id, message, timestamp, priority FROM notes WHERE id = ?1",
            [id],
            NoteRow::from_row,
        )
        .optional()?;

    Ok(row.map(Note::from))
}

/// Insert a note under the lowest id not currently in use. The gap scan and
/// the insert are one statement, so no other write can slip between them.
pub fn insert_note(conn: &Connection, message: &str, priority: Priority) -> Result<Note> {
    let timestamp = format_timestamp(Utc::now());

    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = conn.query_row(
            "INSERT INTO notes (id, message, timestamp, priority)
             SELECT CASE
                        WHEN NOT EXISTS (SELECT 1 FROM notes WHERE id = 1) THEN 1
                        ELSE (SELECT MIN(n.id) + 1 FROM notes n
                              WHERE NOT EXISTS (SELECT 1 FROM notes m WHERE m.id = n.id + 1))
                    END,
                    ?1, ?2, ?3
             RETURNING id, message, timestamp, priority",
            (message, &timestamp, priority.as_str()),
            NoteRow::from_row,
        );

        match result {
            Ok(row) => {
                debug!("Inserted note {}", row.id);
                return Ok(row.into());
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation && attempt < NOTE_ID_ATTEMPTS =>
            {
                warn!("Note id collision on attempt {}, retrying", attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Apply the supplied fields. The timestamp moves forward on every call,
/// by at least a millisecond even when the clock has not.
pub fn update_note(
    conn: &Connection,
    id: i64,
    message: Option<&str>,
    priority: Option<Priority>,
) -> Result<Option<Note>> {
    let row = conn
        .query_row(
            "UPDATE notes
             SET message = COALESCE(?1, message),
                 priority = COALESCE(?2, priority),
                 timestamp = MAX(?3, COALESCE(strftime('%Y-%m-%dT%H:%M:%fZ', timestamp, '+0.001 seconds'), ?3))
             WHERE id = ?4
             RETURNING id, message, timestamp, priority",
            (
                message,
                priority.map(|p| p.as_str()),
                format_timestamp(Utc::now()),
                id,
            ),
            NoteRow::from_row,
        )
        .optional()?;

    Ok(row.map(Note::from))
}

pub fn delete_note(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

pub fn clear_notes(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM notes", [])?)
}

// -- Presets --

pub fn list_presets(conn: &Connection) -> Result<Vec<Preset>> {
    let mut stmt = conn.prepare(
        "SELECT id, text, priority, created_at, updated_at FROM presets
         ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], PresetRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(Preset::from).collect())
}

pub fn get_preset(conn: &Connection, id: i64) -> Result<Option<Preset>> {
    let row = conn
        .query_row(
            "SELECT id, text, priority, created_at, updated_at FROM presets WHERE id = ?1",
            [id],
            PresetRow::from_row,
        )
        .optional()?;

    Ok(row.map(Preset::from))
}

pub fn insert_preset(conn: &Connection, text: &str, priority: Priority) -> Result<Preset> {
    let now = format_timestamp(Utc::now());
    let row = conn.query_row(
        "INSERT INTO presets (text, priority, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
         RETURNING id, text, priority, created_at, updated_at",
        (text, priority.as_str(), &now),
        PresetRow::from_row,
    )?;

    Ok(row.into())
}

pub fn update_preset(
    conn: &Connection,
    id: i64,
    text: Option<&str>,
    priority: Option<Priority>,
) -> Result<Option<Preset>> {
    let row = conn
        .query_row(
            "UPDATE presets
             SET text = COALESCE(?1, text),
                 priority = COALESCE(?2, priority),
                 updated_at = MAX(?3, COALESCE(strftime('%Y-%m-%dT%H:%M:%fZ', updated_at, '+0.001 seconds'), ?3))
             WHERE id = ?4
             RETURNING id, text, priority, created_at, updated_at",
            (
                text,
                priority.map(|p| p.as_str()),
                format_timestamp(Utc::now()),
                id,
            ),
            PresetRow::from_row,
        )
        .optional()?;

    Ok(row.map(Preset::from))
}

pub fn delete_preset(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM presets WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// -- Working hours --

pub fn working_hours(conn: &Connection) -> Result<WorkingHours> {
    let mut stmt =
        conn.prepare("SELECT person, day, location, hours FROM working_hours ORDER BY person, day")?;

    let rows = stmt
        .query_map([], WorkingHoursRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut snapshot = WorkingHours::new();
    for row in rows {
        snapshot
            .entry(row.person.clone())
            .or_insert_with(|| PersonSchedule {
                name: display_name(&row.person),
                schedule: BTreeMap::new(),
            })
            .schedule
            .insert(
                row.day,
                DaySchedule {
                    location: row.location,
                    hours: row.hours,
                },
            );
    }

    Ok(snapshot)
}

pub fn person_schedule(conn: &Connection, person: &str) -> Result<Option<PersonSchedule>> {
    let person = normalize_key(person);
    let mut stmt = conn.prepare(
        "SELECT person, day, location, hours FROM working_hours WHERE person = ?1 ORDER BY day",
    )?;

    let rows = stmt
        .query_map([&person], WorkingHoursRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Ok(None);
    }

    let schedule = rows
        .into_iter()
        .map(|row| {
            (
                row.day,
                DaySchedule {
                    location: row.location,
                    hours: row.hours,
                },
            )
        })
        .collect();

    Ok(Some(PersonSchedule {
        name: display_name(&person),
        schedule,
    }))
}

/// Swap a person's whole week in one transaction. Returns `None` when the
/// person has no rows yet.
pub fn replace_person_schedule(
    conn: &mut Connection,
    person: &str,
    schedule: &BTreeMap<String, DaySchedule>,
) -> Result<Option<PersonSchedule>> {
    let person = normalize_key(person);
    let tx = conn.transaction()?;

    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM working_hours WHERE person = ?1",
        [&person],
        |row| row.get(0),
    )?;
    if existing == 0 {
        return Ok(None);
    }

    tx.execute("DELETE FROM working_hours WHERE person = ?1", [&person])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO working_hours (person, day, location, hours) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(person, day) DO UPDATE SET location = excluded.location, hours = excluded.hours",
        )?;
        for (day, entry) in schedule {
            stmt.execute((&person, normalize_key(day), &entry.location, &entry.hours))?;
        }
    }
    tx.commit()?;

    // An empty replacement leaves no rows behind but is still a valid week.
    let replaced = person_schedule(conn, &person)?.unwrap_or_else(|| PersonSchedule {
        name: display_name(&person),
        schedule: BTreeMap::new(),
    });
    Ok(Some(replaced))
}

/// Insert-or-update keyed on (person, day). Fields left as `None` keep
/// their stored value.
pub fn upsert_day(
    conn: &Connection,
    person: &str,
    day: &str,
    location: Option<&str>,
    hours: Option<&str>,
) -> Result<ScheduleEntry> {
    let row = conn.query_row(
        "INSERT INTO working_hours (person, day, location, hours) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(person, day) DO UPDATE SET
             location = COALESCE(excluded.location, working_hours.location),
             hours = COALESCE(excluded.hours, working_hours.hours)
         RETURNING person, day, location, hours",
        (normalize_key(person), normalize_key(day), location, hours),
        WorkingHoursRow::from_row,
    )?;

    Ok(row.into())
}
