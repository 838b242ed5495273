// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for Zenith
//!
//! Provides abstraction over the supported LLM providers and their model catalogs.

pub mod catalog;
pub mod factory;
pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;

pub use catalog::{ModelCatalog, ModelInfo};
pub use factory::{ModelHandle, ProviderFactory, ProviderResolver};
pub use message::*;
pub use provider::*;
