// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! End-to-end agent turns: client session, transport, chat engine and tools

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use zenith::agent::{
    AgentSession, HttpTransport, InProcessTransport, NoopTurnObserver, TurnObserver, TurnStop,
};
use zenith::chat::convert::ABANDONED_RESULT;
use zenith::chat::ChatEngine;
use zenith::config::{LlmSettings, ProviderKind, ServerConfig};
use zenith::llm::mock_provider::{MockProvider, MockResponse, MockToolCall};
use zenith::llm::{ContentBlock, ModelCatalog};
use zenith::project::{FileTarget, ProjectStore, WebProject};
use zenith::protocol::{InvocationState, ToolInvocation};
use zenith::server::{serve, ServerState};
use zenith::tools::{notification_channel, PreviewRuntime, Screenshot, TestReport, ToolExecutor};
use zenith::{Result, ZenithError};

fn settings() -> LlmSettings {
    let mut settings = LlmSettings::default();
    settings.config_mut(ProviderKind::Google).api_key = "AIza-test".to_string();
    settings
}

fn engine(mock: &MockProvider) -> ChatEngine {
    ChatEngine::new(Arc::new(mock.clone()), ServerConfig::default())
}

fn local_session(mock: &MockProvider, executor: ToolExecutor) -> AgentSession {
    AgentSession::new(
        Arc::new(InProcessTransport::new(engine(mock))),
        executor,
        settings(),
    )
}

fn blue_button_script() -> Vec<MockResponse> {
    vec![
        MockResponse::tool_call("read_files", json!({})).with_text("Let me look at the styles."),
        MockResponse::tool_call(
            "patch_file",
            json!({
                "target": "css",
                "search_string": "background: gray;",
                "replacement_string": "background: blue;"
            }),
        ),
        MockResponse::text("The button is blue now."),
    ]
}

fn assert_button_is_blue(store: &ProjectStore) {
    let css = store.read(FileTarget::Css);
    assert!(css.contains("background: blue;"));
    assert!(!css.contains("background: gray;"));
}

#[tokio::test]
async fn test_make_the_button_blue_in_process() {
    let mock = MockProvider::new().with_script(blue_button_script());
    let (notifier, mut notifications) = notification_channel();
    let executor = ToolExecutor::new(ProjectStore::default()).with_notifier(notifier);
    let mut session = local_session(&mock, executor);

    let outcome = session
        .send("make the button blue", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap();

    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.stop, TurnStop::Completed);
    assert_eq!(mock.call_count(), 3);
    assert_button_is_blue(session.executor().store());
    assert_eq!(notifications.try_recv().unwrap().text, "Patched css");

    // user, two tool rounds, final answer
    let messages = session.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].content, "The button is blue now.");

    // the last request replayed both tool results to the model
    let last = mock.last_request().unwrap();
    let results = last
        .messages
        .iter()
        .flat_map(|m| m.blocks())
        .filter(|b| matches!(b, ContentBlock::ToolResult { .. }))
        .count();
    assert_eq!(results, 2);
}

#[tokio::test]
async fn test_make_the_button_blue_over_http() {
    let mock = MockProvider::new().with_script(blue_button_script());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(
        listener,
        ServerState::new(engine(&mock), ModelCatalog::new()),
        async move {
            let _ = stopped.await;
        },
    ));

    let mut session = AgentSession::new(
        Arc::new(HttpTransport::new(format!("http://{}", addr))),
        ToolExecutor::new(ProjectStore::default()),
        settings(),
    );
    let outcome = session
        .send("make the button blue", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap();

    assert_eq!(outcome.stop, TurnStop::Completed);
    assert_button_is_blue(session.executor().store());
    drop(session);

    let _ = stop.send(());
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_key_over_http() {
    let mock = MockProvider::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(
        listener,
        ServerState::new(engine(&mock), ModelCatalog::new()),
        std::future::pending(),
    ));

    let mut session = AgentSession::new(
        Arc::new(HttpTransport::new(format!("http://{}", addr))),
        ToolExecutor::new(ProjectStore::default()),
        LlmSettings::default(),
    );
    let err = session
        .send("hello", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("401"));
    assert_eq!(mock.call_count(), 0);
    server.abort();
}

#[tokio::test]
async fn test_runaway_tool_loop_stops_at_step_limit() {
    let mock = MockProvider::new().with_script(vec![MockResponse::tool_call("read_console_logs", json!({}))]);
    let mut session = local_session(&mock, ToolExecutor::new(ProjectStore::default()));

    let outcome = session
        .send("keep checking the logs", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap();

    assert_eq!(outcome.stop, TurnStop::StepLimit);
    assert_eq!(mock.call_count(), 5);
}

struct PanickingRuntime;

#[async_trait]
impl PreviewRuntime for PanickingRuntime {
    async fn screenshot(&self, _project: &WebProject) -> Result<Screenshot> {
        panic!("renderer crashed")
    }

    async fn run_test(&self, _project: &WebProject, _script: &str) -> Result<TestReport> {
        Err(ZenithError::ToolExecution("iframe not ready".to_string()))
    }
}

#[tokio::test]
async fn test_failing_handlers_become_error_results() {
    let mock = MockProvider::new().with_script(vec![
        MockResponse::tool_calls(vec![
            MockToolCall::new("call_shot", "screenshot_website", json!({})),
            MockToolCall::new("call_test", "validate_functionality", json!({"test_script": "1"})),
        ]),
        MockResponse::text("Something went wrong with the preview."),
    ]);
    let executor = ToolExecutor::new(ProjectStore::default()).with_runtime(Arc::new(PanickingRuntime));
    let mut session = local_session(&mock, executor);

    let outcome = session
        .send("take a screenshot", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap();
    assert_eq!(outcome.stop, TurnStop::Completed);

    let invocations = &session.messages()[1].tool_invocations;
    assert!(invocations.iter().all(|inv| inv.is_error()));
    assert_eq!(
        invocations[0].result.as_ref().unwrap()["message"],
        "renderer crashed"
    );
    assert_eq!(
        invocations[1].result.as_ref().unwrap()["message"],
        "Tool execution failed: iframe not ready"
    );
}

struct CancelOnToolCall(CancellationToken);

impl TurnObserver for CancelOnToolCall {
    fn on_tool_call(&mut self, _invocation: &ToolInvocation) {
        self.0.cancel();
    }
}

#[tokio::test]
async fn test_cancelled_turn_abandons_calls_and_recovers() {
    let mock = MockProvider::new().with_script(vec![
        MockResponse::tool_call(
            "update_file",
            json!({"target": "html", "content": "<p>gone</p>"}),
        ),
        MockResponse::text("Okay, stopping."),
    ]);
    let mut session = local_session(&mock, ToolExecutor::new(ProjectStore::default()));
    let cancel = CancellationToken::new();

    let outcome = session
        .send("rewrite the page", &cancel, &mut CancelOnToolCall(cancel.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.stop, TurnStop::Cancelled);
    assert_eq!(session.executor().store().version(), 0);
    let invocation = &session.messages()[1].tool_invocations[0];
    assert_eq!(invocation.state, InvocationState::Abandoned);

    // the next turn reports the abandoned call to the model
    let outcome = session
        .send("never mind", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap();
    assert_eq!(outcome.stop, TurnStop::Completed);

    let request = mock.last_request().unwrap();
    let abandoned = request.messages.iter().flat_map(|m| m.blocks()).any(|b| {
        matches!(b, ContentBlock::ToolResult { content, is_error: true, .. } if content == ABANDONED_RESULT)
    });
    assert!(abandoned);
}

#[tokio::test]
async fn test_stalled_provider_times_out() {
    let mock = MockProvider::new().with_script(vec![MockResponse::stalled()]);
    let engine = engine(&mock).with_turn_timeout(Duration::from_millis(50));
    let mut session = AgentSession::new(
        Arc::new(InProcessTransport::new(engine)),
        ToolExecutor::new(ProjectStore::default()),
        settings(),
    );

    let err = session
        .send("hello", &CancellationToken::new(), &mut NoopTurnObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, ZenithError::TurnTimeout));
}
