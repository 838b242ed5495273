// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Client-side agent loop: transports and the multi-step turn driver

pub mod session;
pub mod transport;

pub use session::{
    AgentSession, NoopTurnObserver, TurnObserver, TurnOutcome, TurnStop, DEFAULT_MAX_STEPS,
};
pub use transport::{ChatTransport, HttpTransport, InProcessTransport, TransportStream};
