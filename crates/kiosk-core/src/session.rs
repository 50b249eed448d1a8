//! Who is at the register.
//!
//! Passed explicitly to settlement instead of being read from ambient state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Recorded on each sale as the cashier id.
    pub user_id: String,
    pub display_name: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            display_name: display_name.into(),
            started_at: Utc::now(),
        }
    }

    /// The id stored on sales, `None` for an anonymous register.
    pub fn cashier_id(&self) -> Option<String> {
        let id = self.user_id.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }
}
