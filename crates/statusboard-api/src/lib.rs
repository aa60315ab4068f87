pub mod error;
pub mod extract;
pub mod notes;
pub mod presets;
pub mod state;
pub mod working_hours;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
