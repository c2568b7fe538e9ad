// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction id allocation and the pending-transaction table (spec.md §3,
//! §4.1).
//!
//! Grounded on the correlation-id pending map in the teacher's
//! `upstream/bridge.rs` (`PendingRequest`, keyed by a bridge-assigned
//! `request_id`, resolved when the matching upstream response arrives, and
//! silently dropped when the id is unknown). The orphan-compensation case
//! here — an owner disconnects while a `CreateSession` is still in flight —
//! has no analogue in the bridge's simple drop-on-unknown-id handling, so
//! `sweep_client` keeps a tombstone for that one variant instead of
//! deleting it outright.

use std::collections::HashMap;

use crate::callbacks::SessionCallback;
use crate::ids::{ClientId, MessageId, SessionId, TransactionId};
use crate::types::{ConfigRequest, SessionKind};

/// A continuation record bound to an in-flight HAL command.
pub enum PendingTransaction {
    /// `enableAndConfigure` on behalf of one client's `requestConfig`. Carries
    /// the request as it stood at the time of the call, since a later
    /// `requestConfig` from the same client may overwrite its current config
    /// before this transaction's response arrives.
    Config { client: ClientId, request: ConfigRequest },
    /// An initial `publish`/`subscribe` not yet acknowledged by the HAL.
    CreateSession { client: ClientId, kind: SessionKind, callback: Box<dyn SessionCallback> },
    /// A `CreateSession` whose owning client disconnected before the HAL
    /// answered. Kept (not dropped) so that when `onPublishSuccess` /
    /// `onSubscribeSuccess` eventually arrives the manager can issue a
    /// compensating `stopPublish`/`stopSubscribe` instead of treating it as
    /// a plain unknown transaction.
    CreateSessionOrphaned { kind: SessionKind },
    /// A re-`publish`/re-`subscribe` on an existing session.
    UpdateSession { client: ClientId, session: SessionId },
    /// An outgoing `sendMessage`.
    SendMessage { client: ClientId, session: SessionId, message_id: MessageId },
    /// Internal commands with no semantic payload on response
    /// (`stopPublish`, `stopSubscribe`, `disable`).
    NoOp,
}

impl PendingTransaction {
    /// The client this record names, if any — used by `sweep_client`.
    fn owner(&self) -> Option<ClientId> {
        match self {
            Self::Config { client, .. }
            | Self::UpdateSession { client, .. }
            | Self::SendMessage { client, .. }
            | Self::CreateSession { client, .. } => Some(*client),
            Self::CreateSessionOrphaned { .. } | Self::NoOp => None,
        }
    }
}

/// Allocates transaction ids and tracks the continuation bound to each.
#[derive(Default)]
pub struct TransactionRegistry {
    next: u16,
    table: HashMap<u16, PendingTransaction>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self { next: 0, table: HashMap::new() }
    }

    /// Bind `record` to a fresh id. Ids increase monotonically within a
    /// process run; on the rare wrap at `u16::MAX` the search skips any id
    /// still occupied by a live entry.
    pub fn allocate(&mut self, record: PendingTransaction) -> TransactionId {
        loop {
            let candidate = self.next;
            self.next = self.next.wrapping_add(1);
            if !self.table.contains_key(&candidate) {
                self.table.insert(candidate, record);
                return TransactionId(candidate);
            }
        }
    }

    /// Remove and return the record for `id`, or `None` if unknown —
    /// callers treat a miss as an orphan.
    pub fn take(&mut self, id: TransactionId) -> Option<PendingTransaction> {
        self.table.remove(&id.0)
    }

    /// Remove every entry owned by `client`, except `CreateSession`
    /// entries, which are converted in place to `CreateSessionOrphaned` so
    /// a later HAL response can still trigger compensating cleanup.
    pub fn sweep_client(&mut self, client: ClientId) {
        let stale: Vec<u16> = self
            .table
            .iter()
            .filter(|(_, record)| record.owner() == Some(client))
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(PendingTransaction::CreateSession { kind, .. }) = self.table.get(&id) {
                let kind = *kind;
                self.table.insert(id, PendingTransaction::CreateSessionOrphaned { kind });
            } else {
                self.table.remove(&id);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
