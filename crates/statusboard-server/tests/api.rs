//! REST API tests against a live server with an in-memory store.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use reqwest::StatusCode;
use serde_json::{Value, json};

use statusboard_db::Store;
use statusboard_types::Priority;
use statusboard_types::api::{DaySchedule, Note, PersonSchedule, Preset, ScheduleEntry, WorkingHours};

use common::{start_server_with_store, start_test_server, url};

async fn post_note(client: &reqwest::Client, addr: std::net::SocketAddr, message: &str) -> Value {
    let resp = client
        .post(url(addr, "/api/notes"))
        .json(&json!({ "message": message }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn list(client: &reqwest::Client, addr: std::net::SocketAddr, path: &str) -> Vec<Value> {
    client
        .get(url(addr, path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Notes
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn blank_note_is_rejected_and_not_stored() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    for body in [json!({ "message": "   " }), json!({ "message": "" }), json!({})] {
        let resp = client
            .post(url(addr, "/api/notes"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"], "Message is required");
    }

    assert!(list(&client, addr, "/api/notes").await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn note_create_trims_and_defaults_priority() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let note = post_note(&client, addr, "  Welcome  ").await;
    assert_eq!(note["id"], 1);
    assert_eq!(note["message"], "Welcome");
    assert_eq!(note["priority"], "normal");
    assert!(note["timestamp"].is_string());

    let fetched: Value = client
        .get(url(addr, "/api/notes/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, note);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_note_id_is_reused() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    for message in ["one", "two", "three"] {
        post_note(&client, addr, message).await;
    }

    let resp = client.delete(url(addr, "/api/notes/2")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Note deleted successfully");

    let note = post_note(&client, addr, "four").await;
    assert_eq!(note["id"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_all_then_list_is_empty() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    post_note(&client, addr, "a").await;
    post_note(&client, addr, "b").await;

    for _ in 0..2 {
        let resp = client.delete(url(addr, "/api/notes")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "All notes cleared");
    }

    assert!(list(&client, addr, "/api/notes").await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn priority_only_update_keeps_message_and_moves_timestamp() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let note = post_note(&client, addr, "Lunch").await;

    let updated: Value = client
        .put(url(addr, "/api/notes/1"))
        .json(&json!({ "priority": "high" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(updated["message"], "Lunch");
    assert_eq!(updated["priority"], "high");

    let before: chrono::DateTime<chrono::Utc> = note["timestamp"].as_str().unwrap().parse().unwrap();
    let after: chrono::DateTime<chrono::Utc> = updated["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(after > before);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_and_invalid_note_ids() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(url(addr, "/api/notes/42")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Note not found");

    let resp = client
        .put(url(addr, "/api/notes/42"))
        .json(&json!({ "message": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.delete(url(addr, "/api/notes/42")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.get(url(addr, "/api/notes/abc")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Invalid note ID");
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_bodies_are_bad_requests() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/notes"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert!(err["error"].is_string());

    let resp = client
        .post(url(addr, "/api/notes"))
        .body("message=hi")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(url(addr, "/api/notes"))
        .json(&json!({ "message": "hi", "priority": "urgent" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(list(&client, addr, "/api/notes").await.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Presets
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn preset_create_then_get() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/presets"))
        .json(&json!({ "text": "Back soon", "priority": "low" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let preset: Value = resp.json().await.unwrap();
    assert!(preset["id"].is_i64());
    assert_eq!(preset["priority"], "low");

    let id = preset["id"].as_i64().unwrap();
    let fetched: Value = client
        .get(url(addr, &format!("/api/presets/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["text"], "Back soon");
}

#[tokio::test(flavor = "multi_thread")]
async fn preset_update_and_delete() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/presets"))
        .json(&json!({ "text": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let preset: Value = client
        .post(url(addr, "/api/presets"))
        .json(&json!({ "text": "In a meeting" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let path = format!("/api/presets/{}", preset["id"]);

    let updated: Value = client
        .put(url(addr, &path))
        .json(&json!({ "priority": "high" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["text"], "In a meeting");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["created_at"], preset["created_at"]);

    let resp = client.delete(url(addr, &path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client.delete(url(addr, &path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Preset not found");

    assert!(list(&client, addr, "/api/presets").await.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Working hours
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn seeded_schedule_snapshot() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let hours: Value = client
        .get(url(addr, "/api/working-hours"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(hours["tim"]["name"], "Tim");
    assert_eq!(hours["ramzi"]["schedule"]["friday"]["location"], "Work from Home");
    assert_eq!(hours["ramzi"]["schedule"]["monday"]["hours"], "9:00 AM - 5:00 PM");
}

#[tokio::test(flavor = "multi_thread")]
async fn day_upsert_keeps_single_latest_row() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    for location in ["Remote", "Client site"] {
        let resp = client
            .put(url(addr, "/api/working-hours/tim/monday"))
            .json(&json!({ "location": location }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let tim: Value = client
        .get(url(addr, "/api/working-hours/tim"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let schedule = tim["schedule"].as_object().unwrap();
    assert_eq!(schedule.len(), 5);
    assert_eq!(schedule["monday"]["location"], "Client site");
    assert_eq!(schedule["monday"]["hours"], "9:00 AM - 5:00 PM");
}

#[tokio::test(flavor = "multi_thread")]
async fn person_schedule_replace() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let body = json!({
        "schedule": {
            "monday": { "location": "Home", "hours": "8:00 AM - 4:00 PM" },
            "tuesday": { "location": "Office", "hours": "8:00 AM - 4:00 PM" }
        }
    });

    let replaced: Value = client
        .put(url(addr, "/api/working-hours/Ramzi"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replaced["name"], "Ramzi");
    assert_eq!(replaced["schedule"].as_object().unwrap().len(), 2);
    assert_eq!(replaced["schedule"]["monday"]["location"], "Home");

    let resp = client
        .put(url(addr, "/api/working-hours/nobody"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Person not found");

    // No schedule in the body: nothing changes
    let resp = client
        .put(url(addr, "/api/working-hours/tim"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tim: Value = resp.json().await.unwrap();
    assert_eq!(tim["schedule"].as_object().unwrap().len(), 5);
    assert_eq!(tim["schedule"]["friday"]["location"], "Work from Home");

    let resp = client
        .put(url(addr, "/api/working-hours/nobody"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn padded_person_keys_resolve_everywhere() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let entry: Value = client
        .put(url(addr, "/api/working-hours/%20Tim/monday"))
        .json(&json!({ "location": "Remote" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry["person"], "tim");

    let resp = client
        .get(url(addr, "/api/working-hours/%20tim"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tim: Value = resp.json().await.unwrap();
    assert_eq!(tim["schedule"]["monday"]["location"], "Remote");

    let resp = client
        .put(url(addr, "/api/working-hours/tim%20"))
        .json(&json!({ "schedule": { "monday": { "location": "Office", "hours": "9-5" } } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ═══════════════════════════════════════════════════════════════════════
// Misc
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn health_and_unknown_routes() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(url(addr, "/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let resp = client.get(url(addr, "/api/nothing")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn cors_is_permissive() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(url(addr, "/api/notes"))
        .header("origin", "http://display.local")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Store faults
// ═══════════════════════════════════════════════════════════════════════

const FAULT_DETAIL: &str = "disk I/O error at /var/lib/statusboard/statusboard.db";

/// Fails every call, or panics when `panic` is set.
struct BrokenStore {
    panic: bool,
}

impl BrokenStore {
    fn fail<T>(&self) -> Result<T> {
        if self.panic {
            panic!("{}", FAULT_DETAIL);
        }
        bail!(FAULT_DETAIL)
    }
}

impl Store for BrokenStore {
    fn list_notes(&self) -> Result<Vec<Note>> {
        self.fail()
    }
    fn get_note(&self, _id: i64) -> Result<Option<Note>> {
        self.fail()
    }
    fn create_note(&self, _message: &str, _priority: Priority) -> Result<Note> {
        self.fail()
    }
    fn update_note(&self, _id: i64, _message: Option<&str>, _priority: Option<Priority>) -> Result<Option<Note>> {
        self.fail()
    }
    fn delete_note(&self, _id: i64) -> Result<bool> {
        self.fail()
    }
    fn clear_notes(&self) -> Result<usize> {
        self.fail()
    }
    fn list_presets(&self) -> Result<Vec<Preset>> {
        self.fail()
    }
    fn get_preset(&self, _id: i64) -> Result<Option<Preset>> {
        self.fail()
    }
    fn create_preset(&self, _text: &str, _priority: Priority) -> Result<Preset> {
        self.fail()
    }
    fn update_preset(&self, _id: i64, _text: Option<&str>, _priority: Option<Priority>) -> Result<Option<Preset>> {
        self.fail()
    }
    fn delete_preset(&self, _id: i64) -> Result<bool> {
        self.fail()
    }
    fn working_hours(&self) -> Result<WorkingHours> {
        self.fail()
    }
    fn person_schedule(&self, _person: &str) -> Result<Option<PersonSchedule>> {
        self.fail()
    }
    fn replace_person_schedule(
        &self,
        _person: &str,
        _schedule: &BTreeMap<String, DaySchedule>,
    ) -> Result<Option<PersonSchedule>> {
        self.fail()
    }
    fn upsert_day(
        &self,
        _person: &str,
        _day: &str,
        _location: Option<&str>,
        _hours: Option<&str>,
    ) -> Result<ScheduleEntry> {
        self.fail()
    }
}

async fn assert_generic_500(resp: reqwest::Response) {
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("disk I/O"), "cause leaked: {}", text);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn store_errors_become_generic_500() {
    let addr = start_server_with_store(Arc::new(BrokenStore { panic: false })).await;
    let client = reqwest::Client::new();

    assert_generic_500(client.get(url(addr, "/api/notes")).send().await.unwrap()).await;
    assert_generic_500(
        client
            .post(url(addr, "/api/presets"))
            .json(&json!({ "text": "Back soon" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_generic_500(client.get(url(addr, "/api/working-hours")).send().await.unwrap()).await;

    // Validation still runs before the store is touched
    let resp = client
        .post(url(addr, "/api/notes"))
        .json(&json!({ "message": " " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn store_panic_becomes_generic_500_and_server_survives() {
    let addr = start_server_with_store(Arc::new(BrokenStore { panic: true })).await;
    let client = reqwest::Client::new();

    assert_generic_500(client.get(url(addr, "/api/notes")).send().await.unwrap()).await;

    let health: Value = client
        .get(url(addr, "/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
