pub mod api;
pub mod events;
pub mod priority;

pub use priority::Priority;
