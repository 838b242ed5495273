// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model catalog
//!
//! Lists the models a provider offers. Fetch failures never reach the caller:
//! a fixed per-provider fallback list is returned instead.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{LlmSettings, ProviderConfig, ProviderKind};
use crate::error::{Result, ZenithError};
use crate::llm::factory::ProviderFactory;
use crate::llm::providers::common::server_error;

/// A selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Upper bound on one model list fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches model lists from provider APIs
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    client: Client,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::with_timeout(FETCH_TIMEOUT)
    }
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose fetches give up after `timeout`; a stalled provider
    /// then yields the fallback list.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build catalog client, fetches have no timeout");
                Client::new()
            });
        Self { client }
    }

    /// Models for the selected provider.
    ///
    /// Returns an empty list when no key is configured or the provider is not
    /// recognized, and the fallback list when the fetch fails.
    pub async fn list(&self, settings: &LlmSettings) -> Vec<ModelInfo> {
        let kind: ProviderKind = match settings.selected_provider.parse() {
            Ok(kind) => kind,
            Err(_) => return vec![],
        };
        let config = settings.config(kind);
        if !config.has_credential() {
            return vec![];
        }

        match self.fetch(kind, config).await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(provider = %kind, error = %e, "model fetch failed, using fallback list");
                fallback_models(kind)
            }
        }
    }

    async fn fetch(&self, kind: ProviderKind, config: &ProviderConfig) -> Result<Vec<ModelInfo>> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(ProviderFactory::default_base_url(kind))
            .trim_end_matches('/');
        let url = format!("{}/models", base_url);

        let request = match kind {
            ProviderKind::Google => self.client.get(&url).header("x-goog-api-key", &config.api_key),
            ProviderKind::Groq | ProviderKind::OpenAi => {
                self.client.get(&url).bearer_auth(&config.api_key)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(server_error(
                status.as_u16(),
                format!("{} model list request failed", kind),
            ));
        }

        match kind {
            ProviderKind::Google => {
                let body: GoogleModelList = response.json().await?;
                let models = google_models(body);
                if models.is_empty() {
                    return Err(ZenithError::Config("No models found".to_string()));
                }
                Ok(models)
            }
            ProviderKind::Groq => {
                let body: OpenAiModelList = response.json().await?;
                Ok(openai_style_models(body, |_| true))
            }
            ProviderKind::OpenAi => {
                let body: OpenAiModelList = response.json().await?;
                Ok(openai_style_models(body, |id| {
                    let id = id.to_lowercase();
                    id.contains("gpt") || id.contains("o1")
                }))
            }
        }
    }
}

fn google_models(body: GoogleModelList) -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = body
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| {
            let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
            let name = m
                .display_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| m.name.clone());
            ModelInfo { id, name }
        })
        .collect();
    models.sort_by(|a, b| a.name.cmp(&b.name));
    models
}

fn openai_style_models(body: OpenAiModelList, keep: impl Fn(&str) -> bool) -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = body
        .data
        .into_iter()
        .filter(|m| keep(&m.id))
        .map(|m| ModelInfo::new(m.id.clone(), m.id))
        .collect();
    models.sort_by(|a, b| a.id.cmp(&b.id));
    models
}

/// Fixed list returned when the live catalog cannot be fetched
pub fn fallback_models(kind: ProviderKind) -> Vec<ModelInfo> {
    match kind {
        ProviderKind::Google => vec![
            ModelInfo::new("gemini-2.5-flash", "Gemini 2.5 Flash"),
            ModelInfo::new("gemini-2.5-flash-lite-latest", "Gemini 2.5 Flash Lite"),
            ModelInfo::new("gemini-3-pro-preview", "Gemini 3 Pro Preview"),
            ModelInfo::new("gemini-2.0-flash", "Gemini 2.0 Flash"),
        ],
        ProviderKind::Groq => vec![
            ModelInfo::new("llama-3.3-70b-versatile", "Llama 3.3 70b (Default)"),
            ModelInfo::new("mixtral-8x7b-32768", "Mixtral 8x7b"),
            ModelInfo::new("gemma2-9b-it", "Gemma 2 9b"),
            ModelInfo::new(
                "deepseek-r1-distill-llama-70b",
                "DeepSeek R1 Distill Llama 70b",
            ),
        ],
        ProviderKind::OpenAi => vec![],
    }
}

#[derive(Debug, Deserialize)]
struct GoogleModelList {
    #[serde(default)]
    models: Vec<GoogleModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
}
