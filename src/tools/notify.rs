// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transient notifications raised while tools run

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A toast-style message for the host to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Error => "✗",
            NotificationLevel::Info => "•",
        };
        write!(f, "{} {}", marker, self.text)
    }
}

/// Sender half handed to the tool executor
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Receiver half drained by the host
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_level() {
        assert_eq!(Notification::success("a").level, NotificationLevel::Success);
        assert_eq!(Notification::error("b").level, NotificationLevel::Error);
        assert_eq!(Notification::info("c").level, NotificationLevel::Info);
    }

    #[test]
    fn test_display() {
        assert_eq!(Notification::error("Failed to patch css").to_string(), "✗ Failed to patch css");
    }

    #[test]
    fn test_serialize() {
        let value = serde_json::to_value(Notification::info("Running tests...")).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["text"], "Running tests...");
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (tx, mut rx) = notification_channel();
        tx.send(Notification::info("one")).unwrap();
        tx.send(Notification::success("two")).unwrap();
        drop(tx);

        assert_eq!(rx.recv().await.unwrap().text, "one");
        assert_eq!(rx.recv().await.unwrap().text, "two");
        assert!(rx.recv().await.is_none());
    }
}
