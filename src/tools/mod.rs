// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool system for Zenith
//!
//! The LLM requests tools on the server, but they run on the client against
//! the project store. Tools form a closed set:
//!
//! - [`ToolName`]: the six advertised names
//! - [`ToolCall`]: a parsed request with typed arguments
//! - [`ToolOutcome`]: the JSON object handed back to the model
//! - [`ToolExecutor`]: dispatches calls and raises [`Notification`]s

pub mod definition;
pub mod executor;
pub mod notify;
pub mod runtime;

pub use definition::{tool_definition, tool_definitions, SchemaBuilder};
pub use executor::ToolExecutor;
pub use notify::{
    notification_channel, Notification, NotificationLevel, NotificationReceiver,
    NotificationSender,
};
pub use runtime::{DetachedRuntime, PreviewRuntime, Screenshot, TestReport};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ZenithError};
use crate::project::FileTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ReadFiles,
    UpdateFile,
    PatchFile,
    ScreenshotWebsite,
    ValidateFunctionality,
    ReadConsoleLogs,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::ReadFiles,
        ToolName::UpdateFile,
        ToolName::PatchFile,
        ToolName::ScreenshotWebsite,
        ToolName::ValidateFunctionality,
        ToolName::ReadConsoleLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadFiles => "read_files",
            ToolName::UpdateFile => "update_file",
            ToolName::PatchFile => "patch_file",
            ToolName::ScreenshotWebsite => "screenshot_website",
            ToolName::ValidateFunctionality => "validate_functionality",
            ToolName::ReadConsoleLogs => "read_console_logs",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ZenithError;

    fn from_str(s: &str) -> Result<Self> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ZenithError::ToolExecution(format!("Unknown tool: {}", s)))
    }
}

/// A tool request with validated arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ReadFiles,
    UpdateFile {
        target: FileTarget,
        content: String,
    },
    PatchFile {
        target: FileTarget,
        search_string: String,
        replacement_string: String,
    },
    ScreenshotWebsite,
    ValidateFunctionality {
        test_script: String,
    },
    ReadConsoleLogs,
}

#[derive(Deserialize)]
struct UpdateArgs {
    target: FileTarget,
    content: String,
}

#[derive(Deserialize)]
struct PatchArgs {
    target: FileTarget,
    search_string: String,
    replacement_string: String,
}

#[derive(Deserialize)]
struct ValidateArgs {
    test_script: String,
}

fn parse_args<T: DeserializeOwned>(name: ToolName, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| {
        ZenithError::InvalidInput(format!("invalid arguments for {}: {}", name, e))
    })
}

impl ToolCall {
    /// Parse the arguments for `name`. Parameterless tools ignore `args`.
    pub fn parse(name: ToolName, args: Value) -> Result<Self> {
        Ok(match name {
            ToolName::ReadFiles => ToolCall::ReadFiles,
            ToolName::UpdateFile => {
                let UpdateArgs { target, content } = parse_args(name, args)?;
                ToolCall::UpdateFile { target, content }
            }
            ToolName::PatchFile => {
                let PatchArgs {
                    target,
                    search_string,
                    replacement_string,
                } = parse_args(name, args)?;
                ToolCall::PatchFile {
                    target,
                    search_string,
                    replacement_string,
                }
            }
            ToolName::ScreenshotWebsite => ToolCall::ScreenshotWebsite,
            ToolName::ValidateFunctionality => {
                let ValidateArgs { test_script } = parse_args(name, args)?;
                ToolCall::ValidateFunctionality { test_script }
            }
            ToolName::ReadConsoleLogs => ToolCall::ReadConsoleLogs,
        })
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::ReadFiles => ToolName::ReadFiles,
            ToolCall::UpdateFile { .. } => ToolName::UpdateFile,
            ToolCall::PatchFile { .. } => ToolName::PatchFile,
            ToolCall::ScreenshotWebsite => ToolName::ScreenshotWebsite,
            ToolCall::ValidateFunctionality { .. } => ToolName::ValidateFunctionality,
            ToolCall::ReadConsoleLogs => ToolName::ReadConsoleLogs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Result object returned to the model: `{status, message?, ...data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ToolOutcome {
    pub fn success() -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: None,
            data: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: Some(message.into()),
            data: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
