// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Zenith
//!
//! Two kinds of configuration live here:
//! - [`Settings`], persisted in ~/.zenith/settings.json, holding server limits and
//!   the defaults the terminal client sends with each turn
//! - [`LlmSettings`], the provider selection that travels with every chat request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ZenithError};

mod io;

/// Main settings structure, stored in ~/.zenith/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Chat server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Terminal client settings
    #[serde(default)]
    pub client: ClientConfig,
}

/// Limits and sampling parameters applied by the chat server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum request/response round trips per user turn
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Wall-clock budget for a single streamed response, in seconds
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,

    /// Maximum tokens requested from the provider
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Settings for the terminal chat client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Provider selection sent with every request
    #[serde(default)]
    pub llm: LlmSettings,

    /// Wall-clock budget for a whole turn, tool runs included, in seconds
    #[serde(default = "default_client_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_steps() -> usize {
    5
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.7
}

fn default_client_turn_timeout_secs() -> u64 {
    180
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_steps: default_max_steps(),
            turn_timeout_secs: default_turn_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl ServerConfig {
    /// Turn timeout as a [`Duration`]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            llm: LlmSettings::default(),
            turn_timeout_secs: default_client_turn_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Turn timeout as a [`Duration`]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

/// The recognized chat-completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Google, ProviderKind::Groq, ProviderKind::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Environment variable consulted by [`Settings::apply_env`]
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Google => "GOOGLE_GENERATIVE_AI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ZenithError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "google" => Ok(ProviderKind::Google),
            "groq" => Ok(ProviderKind::Groq),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(ZenithError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Credential, model and endpoint for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,

    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: String::new(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether the config carries a usable API key
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn default_google() -> ProviderConfig {
    ProviderConfig::new("gemini-2.5-flash")
}

fn default_groq() -> ProviderConfig {
    ProviderConfig::new("llama-3.3-70b-versatile")
}

fn default_openai() -> ProviderConfig {
    ProviderConfig::new("gpt-4-turbo").with_base_url("https://api.openai.com/v1")
}

fn default_selected_provider() -> String {
    ProviderKind::Google.as_str().to_string()
}

/// Provider selection sent by the client with every chat request.
///
/// `selected_provider` stays a plain string on the wire so an unrecognized value
/// reaches [`LlmSettings::active`] and is reported as `UnsupportedProvider`
/// rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(default = "default_selected_provider")]
    pub selected_provider: String,

    #[serde(default = "default_google")]
    pub google: ProviderConfig,

    #[serde(default = "default_groq")]
    pub groq: ProviderConfig,

    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            selected_provider: default_selected_provider(),
            google: default_google(),
            groq: default_groq(),
            openai: default_openai(),
        }
    }
}

impl LlmSettings {
    /// Config for a specific provider
    pub fn config(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Google => &self.google,
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenAi => &self.openai,
        }
    }

    /// Mutable config for a specific provider
    pub fn config_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::Google => &mut self.google,
            ProviderKind::Groq => &mut self.groq,
            ProviderKind::OpenAi => &mut self.openai,
        }
    }

    /// Make `kind` the active provider
    pub fn select(&mut self, kind: ProviderKind) {
        self.selected_provider = kind.as_str().to_string();
    }

    /// Resolve the selected provider and validate its credential.
    ///
    /// Performs no I/O; callers rely on this to reject a request before any
    /// network call is attempted.
    pub fn active(&self) -> Result<(ProviderKind, &ProviderConfig)> {
        let kind: ProviderKind = self.selected_provider.parse()?;
        let config = self.config(kind);
        if !config.has_credential() {
            return Err(ZenithError::MissingCredential(kind.to_string()));
        }
        Ok((kind, config))
    }
}

impl Settings {
    /// Fill empty client API keys from the provider environment variables.
    pub fn apply_env(&mut self) {
        for kind in ProviderKind::ALL {
            let config = self.client.llm.config_mut(kind);
            if config.has_credential() {
                continue;
            }
            if let Ok(key) = std::env::var(kind.api_key_env()) {
                if !key.trim().is_empty() {
                    config.api_key = key;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_llm_settings() {
        let settings = LlmSettings::default();
        assert_eq!(settings.selected_provider, "google");
        assert_eq!(settings.google.model, "gemini-2.5-flash");
        assert_eq!(settings.groq.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.openai.model, "gpt-4-turbo");
        assert_eq!(
            settings.openai.base_url.as_deref(),
            Some("https://api.openai.com/v1")
        );
        assert!(!settings.google.has_credential());
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.turn_timeout(), Duration::from_secs(30));
        assert_eq!(config.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);

        let err = "anthropic".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ZenithError::UnsupportedProvider(name) if name == "anthropic"));
    }

    #[test]
    fn test_active_requires_api_key() {
        let settings = LlmSettings::default();
        let err = settings.active().unwrap_err();
        assert!(matches!(err, ZenithError::MissingCredential(p) if p == "google"));
    }

    #[test]
    fn test_active_rejects_whitespace_key() {
        let mut settings = LlmSettings::default();
        settings.google.api_key = "   ".to_string();
        assert!(matches!(
            settings.active(),
            Err(ZenithError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_active_checks_provider_before_key() {
        let settings = LlmSettings {
            selected_provider: "mistral".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            settings.active(),
            Err(ZenithError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_active_returns_selected_config() {
        let mut settings = LlmSettings::default();
        settings.select(ProviderKind::Groq);
        settings.groq.api_key = "gsk_test".to_string();

        let (kind, config) = settings.active().unwrap();
        assert_eq!(kind, ProviderKind::Groq);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_llm_settings_wire_format() {
        let json = serde_json::json!({
            "selectedProvider": "openai",
            "openai": {
                "apiKey": "sk-test",
                "model": "gpt-4o",
                "baseUrl": "http://localhost:8080/v1"
            }
        });
        let settings: LlmSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.selected_provider, "openai");
        assert_eq!(settings.openai.api_key, "sk-test");
        assert_eq!(
            settings.openai.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        // Missing providers fall back to their defaults
        assert_eq!(settings.google.model, "gemini-2.5-flash");

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["openai"]["apiKey"], "sk-test");
        assert!(value["google"].get("baseUrl").is_none());
    }
}
