use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use statusboard_api::{ApiError, AppStateInner, notes, presets, working_hours};
use statusboard_db::Store;
use statusboard_relay::{Dispatcher, connection};
use statusboard_types::api::HealthResponse;

/// Assemble every route: the REST resources, the relay socket and health.
pub fn build_app(store: Arc<dyn Store>, dispatcher: Dispatcher) -> Router {
    let app_state = AppStateInner::new(store);

    let api_routes = Router::new()
        .route(
            "/api/notes",
            get(notes::list_notes)
                .post(notes::create_note)
                .delete(notes::clear_notes),
        )
        .route(
            "/api/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/api/presets",
            get(presets::list_presets).post(presets::create_preset),
        )
        .route(
            "/api/presets/{id}",
            get(presets::get_preset)
                .put(presets::update_preset)
                .delete(presets::delete_preset),
        )
        .route("/api/working-hours", get(working_hours::get_working_hours))
        .route(
            "/api/working-hours/{person}",
            get(working_hours::get_person_schedule).put(working_hours::replace_person_schedule),
        )
        .route(
            "/api/working-hours/{person}/{day}",
            put(working_hours::upsert_day),
        )
        .with_state(app_state);

    let ws_route = Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(dispatcher);

    Router::new()
        .merge(api_routes)
        .merge(ws_route)
        .route("/health", get(health))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(State(dispatcher): State<Dispatcher>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::Internal(anyhow::anyhow!("handler panicked")).into_response()
}
