// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use zenith::{ApiError, ZenithError};

#[test]
fn test_missing_credential_display_and_status() {
    let err = ZenithError::MissingCredential("google".to_string());
    assert_eq!(err.to_string(), "API key missing for provider 'google'");
    assert_eq!(err.status_code(), 401);
}

#[test]
fn test_server_errors_default_to_500() {
    let errors = [
        ZenithError::UnsupportedProvider("mistral".to_string()),
        ZenithError::TurnTimeout,
        ZenithError::StepLimitExceeded(5),
        ZenithError::InvalidInput("bad".to_string()),
        ZenithError::Api(ApiError::StreamError("reset".to_string())),
    ];
    for err in errors {
        assert_eq!(err.status_code(), 500, "{}", err);
    }
}

#[test]
fn test_patch_errors_name_the_target() {
    let not_found = ZenithError::PatchNotFound {
        target: "css".to_string(),
    };
    assert_eq!(not_found.to_string(), "Search string not found in css");

    let ambiguous = ZenithError::PatchAmbiguous {
        target: "html".to_string(),
        occurrences: 3,
    };
    assert!(ambiguous.to_string().contains("3 occurrences"));
}

#[test]
fn test_api_error_wraps_into_zenith_error() {
    let err: ZenithError = ApiError::ServerError {
        status: 429,
        message: "slow down".to_string(),
    }
    .into();
    assert_eq!(err.to_string(), "API error: API error (429): slow down");
}

#[test]
fn test_tool_execution_display() {
    let err = ZenithError::ToolExecution("no preview runtime is attached".to_string());
    assert_eq!(
        err.to_string(),
        "Tool execution failed: no preview runtime is attached"
    );
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: ZenithError = io.into();
    assert!(matches!(err, ZenithError::Io(_)));
}
