// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Preview runtime collaborators
//!
//! Screenshots and test runs need a rendered page. The host supplies a
//! [`PreviewRuntime`]; [`DetachedRuntime`] is used when none is attached.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZenithError};
use crate::project::{ConsoleLog, WebProject};

/// Encoded image of the rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub media_type: String,
    /// Base64 image data
    pub data: String,
}

impl Screenshot {
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            media_type: "image/png".to_string(),
            data: data.into(),
        }
    }
}

/// Result of running a test script against the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
    pub passed: bool,
    pub message: String,
    pub diagnostics: Vec<String>,
    /// Console output produced while the script ran
    pub logs: Vec<ConsoleLog>,
}

impl TestReport {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>, diagnostics: Vec<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            diagnostics,
            logs: Vec::new(),
        }
    }

    pub fn with_logs(mut self, logs: Vec<ConsoleLog>) -> Self {
        self.logs = logs;
        self
    }
}

#[async_trait]
pub trait PreviewRuntime: Send + Sync {
    /// Capture the currently rendered project
    async fn screenshot(&self, project: &WebProject) -> Result<Screenshot>;

    /// Run `script` against the rendered project
    async fn run_test(&self, project: &WebProject, script: &str) -> Result<TestReport>;
}

/// Runtime used when no preview is attached; both operations fail
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedRuntime;

const DETACHED: &str = "no preview runtime is attached";

#[async_trait]
impl PreviewRuntime for DetachedRuntime {
    async fn screenshot(&self, _project: &WebProject) -> Result<Screenshot> {
        Err(ZenithError::ToolExecution(DETACHED.to_string()))
    }

    async fn run_test(&self, _project: &WebProject, _script: &str) -> Result<TestReport> {
        Err(ZenithError::ToolExecution(DETACHED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detached_runtime_fails() {
        let project = WebProject::default();
        let err = DetachedRuntime.screenshot(&project).await.unwrap_err();
        assert!(err.to_string().contains("no preview runtime"));
        assert!(DetachedRuntime.run_test(&project, "1").await.is_err());
    }

    #[test]
    fn test_screenshot_wire_format() {
        let value = serde_json::to_value(Screenshot::png("aGVsbG8=")).unwrap();
        assert_eq!(value["mediaType"], "image/png");
        assert_eq!(value["data"], "aGVsbG8=");
    }

    #[test]
    fn test_report_constructors() {
        assert!(TestReport::passed("ok").passed);
        let failed = TestReport::failed("no", vec!["button missing".into()]);
        assert!(!failed.passed);
        assert_eq!(failed.diagnostics.len(), 1);
    }
}
