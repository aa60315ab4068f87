pub mod api;
pub mod cli;
pub mod display;
pub mod popup;
pub mod presets;
pub mod relay;

pub use api::ApiClient;
pub use display::DisplayBoard;
pub use popup::Popup;
pub use relay::RelayClient;
