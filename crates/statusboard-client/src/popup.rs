use chrono::{DateTime, Duration, Utc};

use statusboard_types::events::DisplayMessage;

/// How long a display-message stays on screen unless dismissed.
pub const POPUP_SECONDS: i64 = 10;

/// A display-message shown on top of the board with a countdown.
#[derive(Debug, Clone)]
pub struct Popup {
    pub message: DisplayMessage,
    shown_at: DateTime<Utc>,
    dismissed: bool,
}

impl Popup {
    pub fn new(message: DisplayMessage, shown_at: DateTime<Utc>) -> Self {
        Self {
            message,
            shown_at,
            dismissed: false,
        }
    }

    /// Whole seconds left on the countdown, 0 once expired or dismissed.
    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.dismissed {
            return 0;
        }
        let left = self.shown_at + Duration::seconds(POPUP_SECONDS) - now;
        // Round up so the countdown reads 10..1 rather than 9..0.
        let millis = left.num_milliseconds();
        if millis <= 0 { 0 } else { (millis + 999) / 1000 }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) > 0
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}
