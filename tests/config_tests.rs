// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use tempfile::TempDir;
use zenith::config::{LlmSettings, ProviderConfig, ProviderKind, Settings};
use zenith::ZenithError;

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.server.bind, "127.0.0.1:3000");
    assert_eq!(settings.server.max_steps, 5);
    assert_eq!(settings.server.max_tokens, 8192);
    assert_eq!(settings.server.turn_timeout().as_secs(), 30);
    assert_eq!(settings.client.server_url, "http://127.0.0.1:3000");
    assert_eq!(settings.client.turn_timeout().as_secs(), 180);
    assert_eq!(settings.client.llm.selected_provider, "google");
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("settings.json");

    let mut settings = Settings::default();
    settings.server.max_steps = 3;
    settings.client.llm.select(ProviderKind::Groq);
    settings.client.llm.groq = ProviderConfig::new("gemma2-9b-it").with_api_key("gsk-test");
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.server.max_steps, 3);
    assert_eq!(loaded.client.llm, settings.client.llm);
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, r#"{"server": {"max_steps": 2}}"#).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.server.max_steps, 2);
    assert_eq!(loaded.server.bind, "127.0.0.1:3000");
    assert_eq!(loaded.client.llm.groq.model, "llama-3.3-70b-versatile");
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Settings::load_from(&path), Err(ZenithError::Json(_))));
}

#[test]
fn test_active_requires_credential() {
    let mut llm = LlmSettings::default();
    match llm.active() {
        Err(ZenithError::MissingCredential(provider)) => assert_eq!(provider, "google"),
        other => panic!("Expected MissingCredential, got {:?}", other),
    }

    llm.config_mut(ProviderKind::Google).api_key = "AIza-test".to_string();
    let (kind, config) = llm.active().unwrap();
    assert_eq!(kind, ProviderKind::Google);
    assert_eq!(config.model, "gemini-2.5-flash");
}

#[test]
fn test_unknown_provider_is_rejected() {
    let llm = LlmSettings {
        selected_provider: "mistral".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        llm.active(),
        Err(ZenithError::UnsupportedProvider(_))
    ));
}

#[test]
fn test_llm_settings_wire_format() {
    let llm: LlmSettings = serde_json::from_value(serde_json::json!({
        "selectedProvider": "openai",
        "openai": {"apiKey": "sk-test", "model": "gpt-4o"}
    }))
    .unwrap();

    let (kind, config) = llm.active().unwrap();
    assert_eq!(kind, ProviderKind::OpenAi);
    assert_eq!(config.model, "gpt-4o");
}
