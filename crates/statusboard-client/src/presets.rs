use statusboard_types::api::{CreateNoteRequest, Preset};
use statusboard_types::events::{DisplayMessage, SignalMessage};

/// Where a preset goes when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresetTarget {
    /// Posted as a persistent note.
    #[default]
    Note,
    /// Pushed to displays as a popup over the relay.
    Message,
}

pub fn as_note(preset: &Preset) -> CreateNoteRequest {
    CreateNoteRequest {
        message: preset.text.clone(),
        priority: Some(preset.priority),
    }
}

pub fn as_message(preset: &Preset) -> SignalMessage {
    SignalMessage::DisplayMessage(DisplayMessage::popup(preset.text.clone(), preset.priority))
}
