// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Configuration module for Zenith
//!
//! Handles loading and saving settings and the per-request provider selection.

pub mod settings;

pub use settings::*;
