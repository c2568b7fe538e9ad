// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single publish or subscribe session (spec.md §3, §4.2).

use crate::callbacks::SessionCallback;
use crate::ids::{PeerInstanceId, PeerMac, PubSubId};
use crate::peer::PeerTable;
use crate::types::SessionKind;

pub struct SessionState {
    kind: SessionKind,
    pub_sub_id: Option<PubSubId>,
    callback: Box<dyn SessionCallback>,
    peers: PeerTable,
}

impl SessionState {
    pub fn new(kind: SessionKind, callback: Box<dyn SessionCallback>) -> Self {
        Self { kind, pub_sub_id: None, callback, peers: PeerTable::new() }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn pub_sub_id(&self) -> Option<PubSubId> {
        self.pub_sub_id
    }

    /// Install the HAL-assigned id. A no-op once already set — invariant
    /// (c) in spec.md §3: it never changes, even across later update
    /// attempts that fail.
    pub fn set_pub_sub_id(&mut self, id: PubSubId) {
        if self.pub_sub_id.is_none() {
            self.pub_sub_id = Some(id);
        }
    }

    pub fn update_peer(&mut self, peer_id: PeerInstanceId, mac: PeerMac) {
        self.peers.update_peer(peer_id, mac);
    }

    pub fn lookup_peer(&self, peer_id: PeerInstanceId) -> Option<PeerMac> {
        self.peers.lookup_peer(peer_id)
    }

    pub fn callback(&mut self) -> &mut dyn SessionCallback {
        self.callback.as_mut()
    }

    /// Consume the session, handing back its callback for a tombstone.
    pub fn into_callback(self) -> Box<dyn SessionCallback> {
        self.callback
    }
}
