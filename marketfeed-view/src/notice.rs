//! Dismissible notices that expire on their own.
//!
//! Time is passed in explicitly so the board has no clock of its own.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use marketfeed_core::constants::NOTICE_TTL;

/// Identifier of a posted notice.
pub type NoticeId = u64;

/// A message shown to the user until dismissed or expired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Identifier used to dismiss the notice
    pub id: NoticeId,
    /// Message text
    pub message: String,
    /// When the notice was posted
    pub posted_at: DateTime<Utc>,
    /// When the notice disappears on its own
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    /// Returns true while the notice should be shown.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Ordered set of active notices, newest first.
#[derive(Clone, Debug)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    ttl: chrono::Duration,
    next_id: NoticeId,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    /// Creates a board whose notices last [`NOTICE_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }

    /// Creates a board with a custom notice lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            notices: Vec::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            next_id: 1,
        }
    }

    /// Posts a notice at `now` and returns its id.
    pub fn post(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> NoticeId {
        let id = self.next_id;
        self.next_id += 1;

        let notice = Notice {
            id,
            message: message.into(),
            posted_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        debug!(id, message = %notice.message, "Notice posted");
        self.notices.insert(0, notice);
        id
    }

    /// Removes a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Drops expired notices and returns how many were dropped.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.notices.len();
        self.notices.retain(|n| n.is_visible(now));
        before - self.notices.len()
    }

    /// Notices visible at `now`, newest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notice> {
        self.notices.iter().filter(|n| n.is_visible(now)).cloned().collect()
    }

    /// Returns true if nothing is posted (expired notices included).
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
