// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session peer instance id → MAC mapping (spec.md §3, §4.2).

use std::collections::HashMap;

use crate::ids::{PeerInstanceId, PeerMac};

/// Tracks the freshest MAC seen for each peer instance id within one
/// session. `onMatch` and `onMessageReceived` both update it; the MAC for a
/// given instance id can change mid-conversation (the firmware rotates
/// addresses) while the instance id itself stays stable, so lookups always
/// return the most recent write.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<PeerInstanceId, PeerMac>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_peer(&mut self, peer_id: PeerInstanceId, mac: PeerMac) {
        self.peers.insert(peer_id, mac);
    }

    pub fn lookup_peer(&self, peer_id: PeerInstanceId) -> Option<PeerMac> {
        self.peers.get(&peer_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_on_empty_table() {
        let table = PeerTable::new();
        assert!(table.lookup_peer(PeerInstanceId(1)).is_none());
    }

    #[test]
    fn freshest_mac_wins() {
        let mut table = PeerTable::new();
        table.update_peer(PeerInstanceId(22), PeerMac([0, 1, 2, 3, 4, 5]));
        table.update_peer(PeerInstanceId(22), PeerMac([9, 9, 9, 9, 9, 9]));
        assert_eq!(table.lookup_peer(PeerInstanceId(22)), Some(PeerMac([9, 9, 9, 9, 9, 9])));
    }

    #[test]
    fn distinct_instance_ids_are_independent() {
        let mut table = PeerTable::new();
        table.update_peer(PeerInstanceId(1), PeerMac([1, 1, 1, 1, 1, 1]));
        table.update_peer(PeerInstanceId(2), PeerMac([2, 2, 2, 2, 2, 2]));
        assert_eq!(table.lookup_peer(PeerInstanceId(1)), Some(PeerMac([1, 1, 1, 1, 1, 1])));
        assert_eq!(table.lookup_peer(PeerInstanceId(2)), Some(PeerMac([2, 2, 2, 2, 2, 2])));
    }
}
