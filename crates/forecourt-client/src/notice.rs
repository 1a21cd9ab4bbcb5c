//! # Notices
//!
//! Non-blocking messages for the operator: a failed lookup, a finished
//! submission. The front end drains and renders them however it likes.
//!
//! The log holds at most [`MAX_PENDING_NOTICES`]; past that the oldest is
//! dropped. Every notice is also logged through `tracing` when pushed.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

/// Notices kept between drains.
pub const MAX_PENDING_NOTICES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Shared, bounded queue of notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    inner: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(message = %notice.message, "Notice"),
            NoticeLevel::Success => info!(message = %notice.message, "Notice"),
        }
        let mut pending = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() == MAX_PENDING_NOTICES {
            if let Some(dropped) = pending.pop_front() {
                debug!(message = %dropped.message, "Undrained notice dropped");
            }
        }
        pending.push_back(notice);
    }

    /// Takes every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        let mut pending = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let log = NoticeLog::new();
        log.push(Notice::error("Unable to load products"));
        log.clone().push(Notice::success("done"));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Error);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn test_undrained_log_keeps_newest() {
        let log = NoticeLog::new();
        for n in 0..MAX_PENDING_NOTICES + 3 {
            log.push(Notice::error(format!("lookup {} failed", n)));
        }

        let drained = log.drain();
        assert_eq!(drained.len(), MAX_PENDING_NOTICES);
        assert_eq!(drained[0].message, "lookup 3 failed");
        assert_eq!(
            drained.last().unwrap().message,
            format!("lookup {} failed", MAX_PENDING_NOTICES + 2)
        );
    }
}
