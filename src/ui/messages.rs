// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Message and alert stacks of the CMS UI

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;

/// Which stack a message goes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageLevel {
    /// Informational messages
    #[default]
    Messages,
    /// Warnings the user should act on
    Alerts,
}

impl MessageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLevel::Messages => "messages",
            MessageLevel::Alerts => "alerts",
        }
    }
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of messages that was displayed
#[derive(Debug, Clone, PartialEq)]
pub struct ShownBatch {
    pub level: MessageLevel,
    pub messages: Vec<String>,
    /// Auto-hide delay
    pub timeout: Duration,
    pub shown_at: DateTime<Utc>,
}

/// Shown batches kept for inspection
const DEFAULT_SHOWN_LIMIT: usize = 32;

#[derive(Debug)]
struct BoardState {
    messages: Vec<String>,
    alerts: Vec<String>,
    shown: VecDeque<ShownBatch>,
    shown_limit: usize,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            alerts: Vec::new(),
            shown: VecDeque::new(),
            shown_limit: DEFAULT_SHOWN_LIMIT,
        }
    }
}

impl BoardState {
    fn stack(&mut self, level: MessageLevel) -> &mut Vec<String> {
        match level {
            MessageLevel::Messages => &mut self.messages,
            MessageLevel::Alerts => &mut self.alerts,
        }
    }
}

/// Shared message board; clones refer to the same stacks
#[derive(Debug, Clone, Default)]
pub struct MessageBoard {
    state: Arc<Mutex<BoardState>>,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` shown batches, dropping the oldest
    pub fn with_shown_limit(self, limit: usize) -> Self {
        self.state.lock().shown_limit = limit;
        self
    }

    /// Push a message onto a stack
    pub fn add(&self, message: impl Into<String>, level: MessageLevel) {
        self.state.lock().stack(level).push(message.into());
    }

    /// Empty a stack without showing it
    pub fn clear(&self, level: MessageLevel) {
        self.state.lock().stack(level).clear();
    }

    /// Display and empty a stack; returns false when there was nothing to show
    pub fn show(&self, level: MessageLevel, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        let messages = std::mem::take(state.stack(level));
        if messages.is_empty() {
            return false;
        }

        tracing::info!(level = %level, count = messages.len(), "Showing messages");
        state.shown.push_back(ShownBatch {
            level,
            messages,
            timeout,
            shown_at: Utc::now(),
        });
        while state.shown.len() > state.shown_limit {
            state.shown.pop_front();
        }
        true
    }

    /// Messages waiting on a stack
    pub fn pending(&self, level: MessageLevel) -> Vec<String> {
        self.state.lock().stack(level).clone()
    }

    /// Recently shown batches, oldest first
    pub fn shown(&self) -> Vec<ShownBatch> {
        self.state.lock().shown.iter().cloned().collect()
    }

    /// Route the `alerts`, `messages` and `status`/`msg` fields of a CMS
    /// response onto the board
    pub fn apply_response(&self, payload: &Value, timeout: Duration) {
        self.clear(MessageLevel::Messages);
        self.clear(MessageLevel::Alerts);

        if payload.is_null() {
            return;
        }

        for alert in strings(payload.get("alerts")) {
            self.add(alert, MessageLevel::Alerts);
        }
        self.show(MessageLevel::Alerts, timeout);

        let legacy = payload.get("messages");
        for message in strings(legacy) {
            self.add(message, MessageLevel::Messages);
        }

        let ok = payload.get("status").and_then(Value::as_str) == Some("ok");
        if ok {
            if let Some(msg) = payload.get("msg").and_then(Value::as_str) {
                self.add(msg, MessageLevel::Messages);
            }
        }

        if legacy.is_some() || ok {
            self.show(MessageLevel::Messages, timeout);
        }
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_and_show() {
        let board = MessageBoard::new();
        board.add("Saved", MessageLevel::Messages);
        board.add("Check spelling", MessageLevel::Alerts);
        assert_eq!(board.pending(MessageLevel::Messages), vec!["Saved"]);

        assert!(board.show(MessageLevel::Messages, Duration::from_secs(5)));
        assert!(board.pending(MessageLevel::Messages).is_empty());
        assert!(!board.show(MessageLevel::Messages, Duration::from_secs(5)));

        let shown = board.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].messages, vec!["Saved"]);
        assert_eq!(board.pending(MessageLevel::Alerts), vec!["Check spelling"]);
    }

    #[test]
    fn test_apply_ok_response() {
        let board = MessageBoard::new();
        board.add("stale", MessageLevel::Messages);

        board.apply_response(
            &json!({"status": "ok", "msg": "Story 42 saved", "alerts": ["Slug changed"]}),
            Duration::from_secs(3),
        );

        let shown = board.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].level, MessageLevel::Alerts);
        assert_eq!(shown[0].messages, vec!["Slug changed"]);
        assert_eq!(shown[1].level, MessageLevel::Messages);
        assert_eq!(shown[1].messages, vec!["Story 42 saved"]);
        assert_eq!(shown[1].timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_apply_legacy_messages() {
        let board = MessageBoard::new();
        board.apply_response(&json!({"messages": ["one", "two"]}), Duration::from_secs(5));

        let shown = board.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].messages, vec!["one", "two"]);
    }

    #[test]
    fn test_shown_history_is_capped() {
        let board = MessageBoard::new().with_shown_limit(2);
        for text in ["a", "b", "c"] {
            board.add(text, MessageLevel::Messages);
            board.show(MessageLevel::Messages, Duration::from_secs(5));
        }

        let kept: Vec<_> = board.shown().into_iter().flat_map(|b| b.messages).collect();
        assert_eq!(kept, vec!["b", "c"]);
    }

    #[test]
    fn test_apply_error_status_shows_nothing() {
        let board = MessageBoard::new();
        board.apply_response(&json!({"status": "error", "msg": "nope"}), Duration::from_secs(5));
        assert!(board.shown().is_empty());
    }
}
