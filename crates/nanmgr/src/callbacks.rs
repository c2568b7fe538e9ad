// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upward callback capabilities.
//!
//! The IPC layer hands the manager a callback when a client connects or
//! opens a session; the manager never inspects it beyond "is one present",
//! it only invokes the small fixed vocabulary below. Modeled as trait
//! objects rather than an enum of message payloads because each client owns
//! exactly one and its identity never needs to be compared or looked up —
//! an opaque handle, not a routable address.

use crate::error::Reason;
use crate::ids::{MessageId, PeerInstanceId, SessionId};
use crate::types::ConfigRequest;

/// Callback surface for a connected client (§6 "Upward event callbacks").
pub trait EventCallback {
    fn on_config_completed(&mut self, request: &ConfigRequest);
    fn on_config_failed(&mut self, request: &ConfigRequest, reason: Reason);
    fn on_identity_changed(&mut self);
    fn on_nan_down(&mut self, reason: Reason);
}

/// Callback surface for one publish/subscribe session (§6 "Upward session
/// callbacks").
pub trait SessionCallback {
    fn on_session_started(&mut self, session_id: SessionId);
    fn on_session_config_fail(&mut self, reason: Reason);
    fn on_session_terminated(&mut self, reason: Reason);
    fn on_match(
        &mut self,
        peer_id: PeerInstanceId,
        service_specific_info: &[u8],
        match_filter: &[u8],
    );
    fn on_message_received(&mut self, peer_id: PeerInstanceId, message: &[u8]);
    fn on_message_send_success(&mut self, message_id: MessageId);
    fn on_message_send_fail(&mut self, message_id: MessageId, reason: Reason);
}
