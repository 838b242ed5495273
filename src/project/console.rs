// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Console output captured from the live preview

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Default number of entries kept before the oldest are dropped
pub const DEFAULT_CONSOLE_CAPACITY: usize = 500;

const EMPTY_CONSOLE: &str = "No console logs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Error,
    Warn,
    Info,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsoleLevel::Log => "LOG",
            ConsoleLevel::Error => "ERROR",
            ConsoleLevel::Warn => "WARN",
            ConsoleLevel::Info => "INFO",
        })
    }
}

/// A single console entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLog {
    #[serde(rename = "type")]
    pub level: ConsoleLevel,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl ConsoleLog {
    /// Entry stamped with the current time
    pub fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl fmt::Display for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Bounded console history, oldest entries dropped first
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    entries: VecDeque<ConsoleLog>,
    capacity: usize,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CONSOLE_CAPACITY)
    }
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CONSOLE_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: ConsoleLog) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = ConsoleLog>) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleLog> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `[LEVEL] message` lines, or a placeholder when nothing was logged
    pub fn format(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_CONSOLE.to_string();
        }
        self.entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_format() {
        assert_eq!(ConsoleBuffer::new().format(), "No console logs.");
    }

    #[test]
    fn test_format_lines() {
        let mut buffer = ConsoleBuffer::new();
        buffer.push(ConsoleLog::new(ConsoleLevel::Log, "ready"));
        buffer.push(ConsoleLog::new(
            ConsoleLevel::Error,
            "TypeError: x is undefined",
        ));
        assert_eq!(
            buffer.format(),
            "[LOG] ready\n[ERROR] TypeError: x is undefined"
        );
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut buffer = ConsoleBuffer::with_capacity(2);
        buffer.extend([
            ConsoleLog::new(ConsoleLevel::Info, "one"),
            ConsoleLog::new(ConsoleLevel::Info, "two"),
            ConsoleLog::new(ConsoleLevel::Warn, "three"),
        ]);
        assert_eq!(buffer.len(), 2);
        let messages: Vec<_> = buffer.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_wire_format() {
        let entry = ConsoleLog {
            level: ConsoleLevel::Warn,
            message: "deprecated".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "warn");
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_new_entries_are_timestamped() {
        let entry = ConsoleLog::new(ConsoleLevel::Info, "x");
        assert!(entry.timestamp > 0);
    }
}
