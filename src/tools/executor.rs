// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool execution engine
//!
//! Dispatches tool calls against the project store and converts every failure,
//! including panics inside a handler, into an error outcome.

use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::error::Result;
use crate::project::{ConsoleBuffer, ProjectStore};

use super::{
    DetachedRuntime, Notification, NotificationSender, PreviewRuntime, ToolCall, ToolName,
    ToolOutcome,
};

/// Runs tools for one client session
pub struct ToolExecutor {
    store: ProjectStore,
    console: ConsoleBuffer,
    runtime: Arc<dyn PreviewRuntime>,
    notifier: Option<NotificationSender>,
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("store_version", &self.store.version())
            .field("console_entries", &self.console.len())
            .field("has_notifier", &self.notifier.is_some())
            .finish()
    }
}

impl ToolExecutor {
    /// Create an executor with no preview attached
    pub fn new(store: ProjectStore) -> Self {
        Self {
            store,
            console: ConsoleBuffer::new(),
            runtime: Arc::new(DetachedRuntime),
            notifier: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn PreviewRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_notifier(mut self, notifier: NotificationSender) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_console(mut self, console: ConsoleBuffer) -> Self {
        self.console = console;
        self
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProjectStore {
        &mut self.store
    }

    pub fn console(&self) -> &ConsoleBuffer {
        &self.console
    }

    /// Hosts push preview console output here
    pub fn console_mut(&mut self) -> &mut ConsoleBuffer {
        &mut self.console
    }

    /// Execute a tool requested by name. Always produces an outcome.
    pub async fn execute(&mut self, name: &str, args: Value) -> ToolOutcome {
        let tool_name = match name.parse::<ToolName>() {
            Ok(tool_name) => tool_name,
            Err(_) => {
                tracing::warn!(tool = name, "model requested an unknown tool");
                return ToolOutcome::error("Unknown tool");
            }
        };

        tracing::debug!(tool = name, "executing tool");

        let result = AssertUnwindSafe(self.dispatch(tool_name, args))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => self.fail(tool_name, e.to_string()),
            Err(payload) => self.fail(tool_name, panic_message(payload.as_ref())),
        }
    }

    async fn dispatch(&mut self, name: ToolName, args: Value) -> Result<ToolOutcome> {
        let call = ToolCall::parse(name, args)?;
        self.run(call).await
    }

    /// Execute an already-parsed call. Handler errors are returned, not converted.
    pub async fn run(&mut self, call: ToolCall) -> Result<ToolOutcome> {
        match call {
            ToolCall::ReadFiles => {
                Ok(ToolOutcome::success().with_data("files", self.store.snapshot()))
            }
            ToolCall::UpdateFile { target, content } => {
                self.store.replace(target, content);
                let message = format!("Updated {}", target);
                self.notify(Notification::success(message.clone()));
                Ok(ToolOutcome::success().with_message(message))
            }
            ToolCall::PatchFile {
                target,
                search_string,
                replacement_string,
            } => match self
                .store
                .patch(target, &search_string, &replacement_string)
            {
                Ok(()) => {
                    let message = format!("Patched {}", target);
                    self.notify(Notification::success(message.clone()));
                    Ok(ToolOutcome::success().with_message(message))
                }
                Err(e) => {
                    tracing::warn!(file = %target, error = %e, "patch rejected");
                    self.notify(Notification::error(format!("Failed to patch {}", target)));
                    Ok(ToolOutcome::error(e.to_string()))
                }
            },
            ToolCall::ScreenshotWebsite => {
                self.notify(Notification::info("Taking screenshot..."));
                let project = self.store.snapshot();
                let screenshot = self.runtime.screenshot(&project).await?;
                Ok(ToolOutcome::success().with_data("image", screenshot))
            }
            ToolCall::ValidateFunctionality { test_script } => {
                self.notify(Notification::info("Running tests..."));
                let project = self.store.snapshot();
                let report = self.runtime.run_test(&project, &test_script).await?;
                self.console.extend(report.logs);

                let outcome = if report.passed {
                    self.notify(Notification::success("Test Passed"));
                    ToolOutcome::success()
                } else {
                    self.notify(Notification::error("Test Failed"));
                    ToolOutcome::error(String::new())
                };
                Ok(outcome
                    .with_message(report.message)
                    .with_data("diagnostics", report.diagnostics))
            }
            ToolCall::ReadConsoleLogs => {
                Ok(ToolOutcome::success().with_data("logs", self.console.format()))
            }
        }
    }

    fn fail(&self, name: ToolName, message: String) -> ToolOutcome {
        tracing::warn!(tool = %name, error = %message, "tool execution failed");
        self.notify(Notification::error(format!("Error executing {}", name)));
        ToolOutcome::error(message)
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            // Host may have stopped listening
            let _ = notifier.send(notification);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool handler panicked".to_string()
    }
}
