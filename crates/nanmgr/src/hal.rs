// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downward HAL API (§6).
//!
//! The manager owns a single `Box<dyn NanHal>` the way the mux proxy owns a
//! single upstream connection handle per session — one external collaborator,
//! addressed through a narrow trait rather than a concrete transport type so
//! tests can substitute a recording mock.
//!
//! Every call here is fire-and-forget: the HAL does not return a result
//! synchronously, it answers later through one of the `StateManager`
//! `on_*` callback entry points, tagged with the same `TransactionId`.

use crate::ids::{PeerInstanceId, PeerMac, PubSubId, TransactionId};
use crate::types::{ConfigRequest, PublishConfig, SubscribeConfig};

pub trait NanHal {
    fn enable_and_configure(&mut self, tx: TransactionId, config: &ConfigRequest);
    fn disable(&mut self, tx: TransactionId);
    fn publish(&mut self, tx: TransactionId, pub_sub_id: u16, config: &PublishConfig);
    fn stop_publish(&mut self, tx: TransactionId, pub_sub_id: PubSubId);
    fn subscribe(&mut self, tx: TransactionId, pub_sub_id: u16, config: &SubscribeConfig);
    fn stop_subscribe(&mut self, tx: TransactionId, pub_sub_id: PubSubId);
    #[allow(clippy::too_many_arguments)]
    fn send_message(
        &mut self,
        tx: TransactionId,
        pub_sub_id: PubSubId,
        peer_instance_id: PeerInstanceId,
        peer_mac: PeerMac,
        data: &[u8],
    );
}
