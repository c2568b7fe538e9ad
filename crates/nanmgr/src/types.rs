// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request value types the manager consumes.
//!
//! `ConfigRequest`, `PublishConfig`, and `SubscribeConfig` are, per the
//! design, owned by the IPC layer and built there (the builders themselves
//! are out of scope). What's defined here is just the data the manager
//! reads and merges — plain structs, no fluent builder.

use serde::{Deserialize, Serialize};

/// Device-level or per-client NAN configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub cluster_low: u16,
    pub cluster_high: u16,
    pub master_preference: u8,
    pub support_5g_band: bool,
    pub identity_change_callback_enabled: bool,
}

impl Default for ConfigRequest {
    fn default() -> Self {
        Self {
            cluster_low: 0,
            cluster_high: 0,
            master_preference: 0,
            support_5g_band: false,
            identity_change_callback_enabled: false,
        }
    }
}

/// Parameters for a publish session. The service name and match/transmit
/// filters are opaque byte blobs as far as the manager is concerned — it
/// never inspects them, only forwards them to the HAL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishConfig {
    pub service_name: String,
    pub service_specific_info: Vec<u8>,
    pub match_filter: Vec<u8>,
}

/// Parameters for a subscribe session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscribeConfig {
    pub service_name: String,
    pub service_specific_info: Vec<u8>,
    pub match_filter: Vec<u8>,
}

/// A session's kind, fixed at creation (spec.md §3, invariant (a)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Publish,
    Subscribe,
}
