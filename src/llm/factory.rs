// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Provider factory for creating LLM providers
//!
//! Turns the per-request [`LlmSettings`] into a ready-to-use model handle.

use std::sync::Arc;

use crate::config::{LlmSettings, ProviderConfig, ProviderKind};
use crate::error::Result;
use crate::llm::provider::LlmProvider;
use crate::llm::providers::google::GOOGLE_BASE_URL;
use crate::llm::providers::openai::{GROQ_BASE_URL, OPENAI_BASE_URL};
use crate::llm::providers::{GoogleProvider, OpenAiCompatProvider};

/// A provider paired with the model to request from it
#[derive(Clone)]
pub struct ModelHandle {
    pub provider: Arc<dyn LlmProvider>,
    pub model: String,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Resolves request settings to a model handle
pub trait ProviderResolver: Send + Sync {
    /// Must not perform I/O: credential and provider errors are reported
    /// before any network call.
    fn resolve(&self, settings: &LlmSettings) -> Result<ModelHandle>;
}

/// Factory for creating LLM providers
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a model handle for `kind` from its configuration
    pub fn create(kind: ProviderKind, config: &ProviderConfig) -> ModelHandle {
        let base_url = config
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| Self::default_base_url(kind).to_string());

        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::Google => {
                Arc::new(GoogleProvider::with_base_url(&config.api_key, base_url))
            }
            ProviderKind::Groq | ProviderKind::OpenAi => Arc::new(OpenAiCompatProvider::new(
                kind.as_str(),
                &config.api_key,
                base_url,
            )),
        };

        tracing::debug!(provider = %kind, model = %config.model, "created provider");

        ModelHandle {
            provider,
            model: config.model.clone(),
        }
    }

    /// Public endpoint used when the config carries no base URL
    pub fn default_base_url(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Google => GOOGLE_BASE_URL,
            ProviderKind::Groq => GROQ_BASE_URL,
            ProviderKind::OpenAi => OPENAI_BASE_URL,
        }
    }

    /// List all supported provider names
    pub fn supported_providers() -> Vec<&'static str> {
        ProviderKind::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl ProviderResolver for ProviderFactory {
    fn resolve(&self, settings: &LlmSettings) -> Result<ModelHandle> {
        let (kind, config) = settings.active()?;
        Ok(Self::create(kind, config))
    }
}
