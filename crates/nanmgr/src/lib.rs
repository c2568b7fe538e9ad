// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nanmgr: a single-process, single-threaded state manager for Neighbor
//! Awareness Networking (NAN) discovery sessions sitting above a fire-and-
//! forget HAL boundary.
//!
//! Callers own one [`StateManager`], post client requests and HAL callbacks
//! onto it, and call [`StateManager::dispatch_all`] to run the queue to
//! completion. There is no internal threading or locking — see
//! [`StateManager`] for the concurrency model.

pub mod callbacks;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod hal;
pub mod ids;
pub mod manager;
pub mod merge;
pub mod peer;
pub mod session;
pub mod transaction;
pub mod types;

pub use callbacks::{EventCallback, SessionCallback};
pub use error::Reason;
pub use event::ClusterEventKind;
pub use hal::NanHal;
pub use ids::{ClientId, MessageId, PeerInstanceId, PeerMac, PubSubId, SessionId, TransactionId};
pub use manager::StateManager;
pub use types::{ConfigRequest, PublishConfig, SessionKind, SubscribeConfig};
