// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::json;
use zenith::project::{ConsoleLevel, ConsoleLog, FileTarget, ProjectStore, WebProject};
use zenith::tools::{
    notification_channel, tool_definitions, NotificationLevel, PreviewRuntime, Screenshot,
    TestReport, ToolExecutor, ToolName,
};
use zenith::Result;

struct PassingRuntime;

#[async_trait]
impl PreviewRuntime for PassingRuntime {
    async fn screenshot(&self, _project: &WebProject) -> Result<Screenshot> {
        Ok(Screenshot::png("iVBORw0KGgo="))
    }

    async fn run_test(&self, _project: &WebProject, script: &str) -> Result<TestReport> {
        Ok(TestReport::passed(format!("ran {} bytes", script.len()))
            .with_logs(vec![ConsoleLog::new(ConsoleLevel::Log, "clicked")]))
    }
}

#[test]
fn test_definitions_cover_every_tool() {
    let definitions = tool_definitions();
    let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        ToolName::ALL.iter().map(|n| n.as_str()).collect::<Vec<_>>()
    );

    let patch = definitions
        .iter()
        .find(|d| d.name == "patch_file")
        .unwrap();
    assert_eq!(
        patch.input_schema.required,
        vec!["target", "search_string", "replacement_string"]
    );
}

#[tokio::test]
async fn test_read_files_returns_snapshot() {
    let mut executor = ToolExecutor::new(ProjectStore::new(WebProject::new("<p></p>", "p{}", "")));
    let outcome = executor.execute("read_files", json!({})).await;

    let value = outcome.to_value();
    assert_eq!(value["status"], "success");
    assert_eq!(value["files"]["html"], "<p></p>");
    assert_eq!(value["files"]["css"], "p{}");
}

#[tokio::test]
async fn test_patch_missing_search_reports_error() {
    let (notifier, mut notifications) = notification_channel();
    let mut executor = ToolExecutor::new(ProjectStore::default()).with_notifier(notifier);
    let before = executor.store().snapshot();

    let outcome = executor
        .execute(
            "patch_file",
            json!({"target": "css", "search_string": "purple", "replacement_string": "blue"}),
        )
        .await;

    assert!(outcome.is_error());
    assert_eq!(executor.store().snapshot(), before);
    let toast = notifications.try_recv().unwrap();
    assert_eq!(toast.level, NotificationLevel::Error);
    assert_eq!(toast.text, "Failed to patch css");
}

#[tokio::test]
async fn test_invalid_arguments_are_reported() {
    let mut executor = ToolExecutor::new(ProjectStore::default());
    let outcome = executor
        .execute("update_file", json!({"target": "python", "content": "x"}))
        .await;

    assert!(outcome.is_error());
    assert_eq!(executor.store().version(), 0);
}

#[tokio::test]
async fn test_unknown_tool() {
    let (notifier, mut notifications) = notification_channel();
    let mut executor = ToolExecutor::new(ProjectStore::default()).with_notifier(notifier);

    let value = executor.execute("delete_everything", json!({})).await.to_value();
    assert_eq!(value["status"], "error");
    assert_eq!(value["message"], "Unknown tool");
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn test_detached_runtime_fails_gracefully() {
    let (notifier, mut notifications) = notification_channel();
    let mut executor = ToolExecutor::new(ProjectStore::default()).with_notifier(notifier);

    let outcome = executor.execute("screenshot_website", json!({})).await;
    assert!(outcome.is_error());

    let texts: Vec<_> = std::iter::from_fn(|| notifications.try_recv().ok())
        .map(|n| n.text)
        .collect();
    assert_eq!(texts, vec!["Taking screenshot...", "Error executing screenshot_website"]);
}

#[tokio::test]
async fn test_validation_logs_reach_console() {
    let mut executor =
        ToolExecutor::new(ProjectStore::default()).with_runtime(std::sync::Arc::new(PassingRuntime));

    let outcome = executor
        .execute(
            "validate_functionality",
            json!({"test_script": "document.getElementById('action').click()"}),
        )
        .await;
    assert!(!outcome.is_error());

    let logs = executor.execute("read_console_logs", json!({})).await.to_value();
    assert_eq!(logs["logs"], "[LOG] clicked");

    let shot = executor.execute("screenshot_website", json!({})).await.to_value();
    assert_eq!(shot["image"]["mediaType"], "image/png");
}

proptest! {
    #[test]
    fn prop_update_then_read_returns_content(content in ".*", target in prop::sample::select(FileTarget::ALL.to_vec())) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let value = runtime.block_on(async {
            let mut executor = ToolExecutor::new(ProjectStore::default());
            let update = executor
                .execute("update_file", json!({"target": target.as_str(), "content": content.clone()}))
                .await;
            assert!(!update.is_error());
            executor.execute("read_files", json!({})).await.to_value()
        });
        prop_assert_eq!(value["files"][target.as_str()].as_str(), Some(content.as_str()));
    }
}
