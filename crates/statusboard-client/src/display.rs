//! Board state for an always-on display.
//!
//! The board polls notes and working hours, keeps showing the last good
//! data when a fetch fails, rotates through people on a wall-clock
//! schedule and overlays pushed display-messages.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, warn};

use statusboard_types::Priority;
use statusboard_types::api::{Note, PersonSchedule, WEEKDAYS, WorkingHours, display_name};
use statusboard_types::events::DisplayMessage;

use crate::api::ApiClient;
use crate::popup::Popup;

/// How often the board refetches, and how long each person stays on screen.
pub const REFRESH_INTERVAL_MS: i64 = 5_000;

const NOT_SET: &str = "Not set";

#[derive(Debug, Default)]
pub struct DisplayBoard {
    notes: Vec<Note>,
    working_hours: WorkingHours,
    connected: bool,
    last_update: Option<DateTime<Utc>>,
    popup: Option<Popup>,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn working_hours(&self) -> &WorkingHours {
        &self.working_hours
    }

    /// Whether the last notes fetch succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Fetch notes and working hours. The two fetches are independent; a
    /// failure in either leaves that part of the board unchanged.
    pub async fn refresh(&mut self, api: &ApiClient, now: DateTime<Utc>) {
        let (notes, hours) = tokio::join!(api.notes(), api.working_hours());
        self.apply_notes(notes, now);
        self.apply_working_hours(hours);
    }

    pub fn apply_notes(&mut self, result: Result<Vec<Note>>, now: DateTime<Utc>) {
        match result {
            Ok(notes) => {
                debug!("Fetched {} notes", notes.len());
                self.notes = notes;
                self.connected = true;
                self.last_update = Some(now);
            }
            Err(e) => {
                if self.connected {
                    warn!("Lost connection to server: {:#}", e);
                }
                self.connected = false;
            }
        }
    }

    pub fn apply_working_hours(&mut self, result: Result<WorkingHours>) {
        match result {
            Ok(hours) => self.working_hours = hours,
            Err(e) => warn!("Failed to fetch working hours: {:#}", e),
        }
    }

    /// Person shown at `now`. Every display derives this from the clock, so
    /// screens side by side show the same person.
    pub fn current_person(&self, now: DateTime<Utc>) -> Option<(&str, &PersonSchedule)> {
        let index = person_index(now.timestamp_millis(), self.working_hours.len())?;
        self.working_hours
            .iter()
            .nth(index)
            .map(|(key, schedule)| (key.as_str(), schedule))
    }

    pub fn show_message(&mut self, message: DisplayMessage, now: DateTime<Utc>) {
        self.popup = Some(Popup::new(message, now));
    }

    pub fn dismiss_popup(&mut self) {
        if let Some(popup) = self.popup.as_mut() {
            popup.dismiss();
        }
    }

    /// The popup still counting down at `now`, if any. Expired popups are
    /// dropped.
    pub fn active_popup(&mut self, now: DateTime<Utc>) -> Option<&Popup> {
        if self.popup.as_ref().is_some_and(|p| !p.is_active(now)) {
            self.popup = None;
        }
        self.popup.as_ref()
    }

    /// Plain-text rendering of the board.
    pub fn render(&mut self, now: DateTime<Utc>) -> String {
        let mut out = String::new();

        if let Some(popup) = self.active_popup(now) {
            let _ = writeln!(
                out,
                "*** {} MESSAGE ({}s) ***",
                priority_label(popup.message.priority),
                popup.remaining(now)
            );
            let _ = writeln!(out, "{}", popup.message.text);
            let _ = writeln!(out);
        }

        let status = if self.connected { "online" } else { "offline" };
        let updated = match self.last_update {
            Some(at) => at.with_timezone(&Local).format("%H:%M:%S").to_string(),
            None => "never".to_string(),
        };
        let _ = writeln!(out, "== Notes ({}, updated {}) ==", status, updated);
        if self.notes.is_empty() {
            let _ = writeln!(out, "No notes");
        }
        for note in &self.notes {
            let _ = writeln!(
                out,
                "[{}] {}  ({})",
                priority_label(note.priority),
                note.message,
                note.timestamp.with_timezone(&Local).format("%a %H:%M")
            );
        }

        let _ = writeln!(out);
        match self.current_person(now) {
            Some((key, person)) => {
                let name = if person.name.is_empty() {
                    display_name(key)
                } else {
                    person.name.clone()
                };
                let _ = writeln!(out, "== {} ==", name);
                for day in WEEKDAYS {
                    let entry = person.schedule.get(day);
                    let location = entry
                        .and_then(|d| d.location.as_deref())
                        .unwrap_or(NOT_SET);
                    let hours = entry.and_then(|d| d.hours.as_deref()).unwrap_or(NOT_SET);
                    let _ = writeln!(
                        out,
                        "{:<10} {:<16} {}",
                        display_name(day),
                        location,
                        hours
                    );
                }
            }
            None => {
                let _ = writeln!(out, "== Working hours ==");
                let _ = writeln!(out, "No schedules");
            }
        }

        out
    }
}

/// `floor(now_ms / 5000) mod count`, or `None` when there is nobody to show.
pub fn person_index(now_ms: i64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let slot = now_ms.div_euclid(REFRESH_INTERVAL_MS);
    Some(slot.rem_euclid(count as i64) as usize)
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "LOW",
        Priority::Normal => "NORMAL",
        Priority::High => "HIGH",
    }
}
