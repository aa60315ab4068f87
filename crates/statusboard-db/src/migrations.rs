use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

const DEFAULT_HOURS: &str = "9:00 AM - 5:00 PM";

/// Seeded when `working_hours` is empty: two people, five weekdays.
const DEFAULT_SCHEDULE: &[(&str, &str, &str)] = &[
    ("tim", "monday", "Office"),
    ("tim", "tuesday", "Office"),
    ("tim", "wednesday", "Office"),
    ("tim", "thursday", "Office"),
    ("tim", "friday", "Work from Home"),
    ("ramzi", "monday", "Office"),
    ("ramzi", "tuesday", "Office"),
    ("ramzi", "wednesday", "Office"),
    ("ramzi", "thursday", "Office"),
    ("ramzi", "friday", "Work from Home"),
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS notes (
            id          INTEGER PRIMARY KEY,
            message     TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            priority    TEXT NOT NULL DEFAULT 'normal'
        );

        CREATE INDEX IF NOT EXISTS idx_notes_timestamp
            ON notes(timestamp);

        CREATE TABLE IF NOT EXISTS presets (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            priority    TEXT NOT NULL DEFAULT 'normal',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS working_hours (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            person      TEXT NOT NULL,
            day         TEXT NOT NULL,
            location    TEXT,
            hours       TEXT,
            UNIQUE(person, day)
        );
        ",
    )?;

    seed_working_hours(conn)?;

    info!("Database migrations complete");
    Ok(())
}

fn seed_working_hours(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM working_hours", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "INSERT INTO working_hours (person, day, location, hours) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (person, day, location) in DEFAULT_SCHEDULE {
        stmt.execute((person, day, location, DEFAULT_HOURS))?;
    }

    info!("Seeded default working hours ({} rows)", DEFAULT_SCHEDULE.len());
    Ok(())
}
