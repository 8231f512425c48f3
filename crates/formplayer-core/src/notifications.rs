use std::collections::VecDeque;

use crate::error::NavError;
use crate::response::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

impl NoticeLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSource {
    Server,
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub ts_ms: i64,
    pub source: NoticeSource,
    pub message: String,
}

impl Notice {
    pub fn from_server(notification: &Notification) -> Option<Self> {
        let message = notification.message.as_deref()?.trim();
        if message.is_empty() {
            return None;
        }
        let level = if notification.error {
            NoticeLevel::Error
        } else {
            NoticeLevel::Info
        };
        Some(Self::new(level, NoticeSource::Server, message))
    }

    pub fn from_error(err: &NavError) -> Self {
        Self::new(NoticeLevel::Error, NoticeSource::Navigation, err.to_string())
    }

    fn new(level: NoticeLevel, source: NoticeSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: chrono::Utc::now().timestamp_millis(),
            source,
            message: message.into(),
        }
    }
}

/// Bounded queue of user-visible toasts, oldest dropped first.
#[derive(Debug, Clone)]
pub struct NoticeLog {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<Notice>,
}

impl NoticeLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            next_seq: 1,
            buf: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub fn push(&mut self, mut notice: Notice) -> u64 {
        notice.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        let seq = notice.seq;
        self.buf.push_back(notice);
        seq
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn info(message: &str) -> Notice {
        Notice::from_server(&Notification {
            message: Some(message.to_string()),
            error: false,
        })
        .expect("notice")
    }

    #[test]
    fn ring_buffer_drops_oldest_and_keeps_sequence() {
        let mut log = NoticeLog::new(2);
        log.push(info("one"));
        log.push(info("two"));
        let seq = log.push(info("three"));

        let messages: Vec<&str> = log.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(seq, 3);
        assert_eq!(log.latest().map(|n| n.seq), Some(3));
    }

    #[test]
    fn empty_server_notification_is_skipped() {
        assert!(Notice::from_server(&Notification::default()).is_none());
        assert!(Notice::from_server(&Notification {
            message: Some("  ".to_string()),
            error: true,
        })
        .is_none());
    }

    #[test]
    fn server_error_flag_maps_to_error_level() {
        let notice = Notice::from_server(&Notification {
            message: Some("Case closed".to_string()),
            error: true,
        })
        .expect("notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.source, NoticeSource::Server);
    }
}
