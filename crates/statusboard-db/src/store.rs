use std::collections::BTreeMap;

use anyhow::Result;

use statusboard_types::Priority;
use statusboard_types::api::{DaySchedule, Note, PersonSchedule, Preset, ScheduleEntry, WorkingHours};

use crate::Database;
use crate::queries;

/// Record store the REST layer is written against. Every method is one
/// atomic store operation; `None`/`false` means the keyed record is absent.
pub trait Store: Send + Sync {
    fn list_notes(&self) -> Result<Vec<Note>>;
    fn get_note(&self, id: i64) -> Result<Option<Note>>;
    fn create_note(&self, message: &str, priority: Priority) -> Result<Note>;
    fn update_note(
        &self,
        id: i64,
        message: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<Option<Note>>;
    fn delete_note(&self, id: i64) -> Result<bool>;
    /// Returns how many notes were removed.
    fn clear_notes(&self) -> Result<usize>;

    fn list_presets(&self) -> Result<Vec<Preset>>;
    fn get_preset(&self, id: i64) -> Result<Option<Preset>>;
    fn create_preset(&self, text: &str, priority: Priority) -> Result<Preset>;
    fn update_preset(
        &self,
        id: i64,
        text: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<Option<Preset>>;
    fn delete_preset(&self, id: i64) -> Result<bool>;

    fn working_hours(&self) -> Result<WorkingHours>;
    fn person_schedule(&self, person: &str) -> Result<Option<PersonSchedule>>;
    fn replace_person_schedule(
        &self,
        person: &str,
        schedule: &BTreeMap<String, DaySchedule>,
    ) -> Result<Option<PersonSchedule>>;
    fn upsert_day(
        &self,
        person: &str,
        day: &str,
        location: Option<&str>,
        hours: Option<&str>,
    ) -> Result<ScheduleEntry>;
}

impl Store for Database {
    fn list_notes(&self) -> Result<Vec<Note>> {
        self.with_conn(|conn| queries::list_notes(conn))
    }

    fn get_note(&self, id: i64) -> Result<Option<Note>> {
        self.with_conn(|conn| queries::get_note(conn, id))
    }

    fn create_note(&self, message: &str, priority: Priority) -> Result<Note> {
        self.with_conn(|conn| queries::insert_note(conn, message, priority))
    }

    fn update_note(
        &self,
        id: i64,
        message: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<Option<Note>> {
        self.with_conn(|conn| queries::update_note(conn, id, message, priority))
    }

    fn delete_note(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| queries::delete_note(conn, id))
    }

    fn clear_notes(&self) -> Result<usize> {
        self.with_conn(|conn| queries::clear_notes(conn))
    }

    fn list_presets(&self) -> Result<Vec<Preset>> {
        self.with_conn(|conn| queries::list_presets(conn))
    }

    fn get_preset(&self, id: i64) -> Result<Option<Preset>> {
        self.with_conn(|conn| queries::get_preset(conn, id))
    }

    fn create_preset(&self, text: &str, priority: Priority) -> Result<Preset> {
        self.with_conn(|conn| queries::insert_preset(conn, text, priority))
    }

    fn update_preset(
        &self,
        id: i64,
        text: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<Option<Preset>> {
        self.with_conn(|conn| queries::update_preset(conn, id, text, priority))
    }

    fn delete_preset(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| queries::delete_preset(conn, id))
    }

    fn working_hours(&self) -> Result<WorkingHours> {
        self.with_conn(|conn| queries::working_hours(conn))
    }

    fn person_schedule(&self, person: &str) -> Result<Option<PersonSchedule>> {
        self.with_conn(|conn| queries::person_schedule(conn, person))
    }

    fn replace_person_schedule(
        &self,
        person: &str,
        schedule: &BTreeMap<String, DaySchedule>,
    ) -> Result<Option<PersonSchedule>> {
        self.with_conn(|conn| queries::replace_person_schedule(conn, person, schedule))
    }

    fn upsert_day(
        &self,
        person: &str,
        day: &str,
        location: Option<&str>,
        hours: Option<&str>,
    ) -> Result<ScheduleEntry> {
        self.with_conn(|conn| queries::upsert_day(conn, person, day, location, hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn note_ids_fill_lowest_gap() {
        let db = store();
        let a = db.create_note("one", Priority::Normal).unwrap();
        let b = db.create_note("two", Priority::Normal).unwrap();
        let c = db.create_note("three", Priority::Normal).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));

        assert!(db.delete_note(2).unwrap());
        let reused = db.create_note("four", Priority::High).unwrap();
        assert_eq!(reused.id, 2);

        let next = db.create_note("five", Priority::Low).unwrap();
        assert_eq!(next.id, 4);
    }

    #[test]
    fn note_ids_start_at_one_when_first_is_free() {
        let db = store();
        db.create_note("one", Priority::Normal).unwrap();
        db.create_note("two", Priority::Normal).unwrap();
        db.delete_note(1).unwrap();
        assert_eq!(db.create_note("again", Priority::Normal).unwrap().id, 1);
    }

    #[test]
    fn update_note_is_partial_and_refreshes_timestamp() {
        let db = store();
        let note = db.create_note("hello", Priority::Normal).unwrap();

        let updated = db.update_note(note.id, None, Some(Priority::High)).unwrap().unwrap();
        assert_eq!(updated.message, "hello");
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.timestamp > note.timestamp);

        assert!(db.update_note(99, Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn back_to_back_updates_always_advance_timestamp() {
        let db = store();
        for _ in 0..200 {
            let note = db.create_note("Lunch", Priority::Normal).unwrap();
            let first = db.update_note(note.id, None, Some(Priority::High)).unwrap().unwrap();
            let second = db.update_note(note.id, None, Some(Priority::Low)).unwrap().unwrap();
            assert!(first.timestamp > note.timestamp);
            assert!(second.timestamp > first.timestamp);
            db.delete_note(note.id).unwrap();
        }
    }

    #[test]
    fn back_to_back_preset_updates_advance_updated_at() {
        let db = store();
        let preset = db.create_preset("Come in", Priority::Normal).unwrap();
        let mut last = preset.updated_at;
        for _ in 0..50 {
            let updated = db.update_preset(preset.id, None, Some(Priority::High)).unwrap().unwrap();
            assert!(updated.updated_at > last);
            assert_eq!(updated.created_at, preset.created_at);
            last = updated.updated_at;
        }
    }

    #[test]
    fn clear_notes_empties_table() {
        let db = store();
        db.create_note("a", Priority::Normal).unwrap();
        db.create_note("b", Priority::Normal).unwrap();
        assert_eq!(db.clear_notes().unwrap(), 2);
        assert!(db.list_notes().unwrap().is_empty());
        assert_eq!(db.clear_notes().unwrap(), 0);
    }

    #[test]
    fn preset_ids_are_not_reused() {
        let db = store();
        let first = db.create_preset("Back soon", Priority::Low).unwrap();
        let second = db.create_preset("In a meeting", Priority::Normal).unwrap();
        assert!(db.delete_preset(second.id).unwrap());

        let third = db.create_preset("Focus time", Priority::Low).unwrap();
        assert!(third.id > second.id);
        assert_eq!(db.get_preset(first.id).unwrap().unwrap().text, "Back soon");
    }

    #[test]
    fn update_preset_keeps_unsupplied_fields() {
        let db = store();
        let preset = db.create_preset("Come in", Priority::Normal).unwrap();
        let updated = db.update_preset(preset.id, Some("Come in!"), None).unwrap().unwrap();
        assert_eq!(updated.text, "Come in!");
        assert_eq!(updated.priority, Priority::Normal);
        assert_eq!(updated.created_at, preset.created_at);
        assert!(updated.updated_at > preset.updated_at);
    }

    #[test]
    fn seeded_schedule_has_two_people() {
        let db = store();
        let hours = db.working_hours().unwrap();
        assert_eq!(hours.keys().collect::<Vec<_>>(), vec!["ramzi", "tim"]);
        let tim = &hours["tim"];
        assert_eq!(tim.name, "Tim");
        assert_eq!(tim.schedule.len(), 5);
        assert_eq!(tim.schedule["friday"].location.as_deref(), Some("Work from Home"));
    }

    #[test]
    fn upsert_day_keeps_one_row_per_key() {
        let db = store();
        db.upsert_day("Tim", "Monday", Some("Remote"), None).unwrap();
        let entry = db.upsert_day("tim", "monday", Some("Client site"), None).unwrap();
        assert_eq!(entry.location.as_deref(), Some("Client site"));
        assert_eq!(entry.hours.as_deref(), Some("9:00 AM - 5:00 PM"));

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM working_hours WHERE person = 'tim' AND day = 'monday'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn upsert_day_creates_new_keys() {
        let db = store();
        let entry = db.upsert_day("alex", "saturday", Some("Office"), Some("10-2")).unwrap();
        assert_eq!(entry.person, "alex");
        assert_eq!(db.person_schedule("alex").unwrap().unwrap().name, "Alex");
    }

    #[test]
    fn replace_schedule_swaps_whole_week() {
        let db = store();
        let mut week = BTreeMap::new();
        week.insert(
            "Monday".to_string(),
            DaySchedule {
                location: Some("Home".into()),
                hours: Some("8-4".into()),
            },
        );

        let replaced = db.replace_person_schedule("ramzi", &week).unwrap().unwrap();
        assert_eq!(replaced.schedule.len(), 1);
        assert_eq!(replaced.schedule["monday"].location.as_deref(), Some("Home"));

        assert!(db.replace_person_schedule("nobody", &week).unwrap().is_none());
        assert!(db.person_schedule("nobody").unwrap().is_none());
    }

    #[test]
    fn person_and_day_keys_are_trimmed() {
        let db = store();
        let entry = db.upsert_day(" Tim ", " Monday", Some("Remote"), None).unwrap();
        assert_eq!((entry.person.as_str(), entry.day.as_str()), ("tim", "monday"));

        let week = db.person_schedule("  TIM").unwrap().unwrap();
        assert_eq!(week.schedule["monday"].location.as_deref(), Some("Remote"));

        let mut replacement = BTreeMap::new();
        replacement.insert(" Friday ".to_string(), DaySchedule::default());
        let replaced = db.replace_person_schedule(" tim ", &replacement).unwrap().unwrap();
        assert!(replaced.schedule.contains_key("friday"));
        assert_eq!(replaced.name, "Tim");
    }
}
