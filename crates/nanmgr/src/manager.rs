// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: client API, HAL callback handlers, invariants,
//! cleanup (spec.md §4.4, §4.5).

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::callbacks::{EventCallback, SessionCallback};
use crate::client::ClientState;
use crate::error::Reason;
use crate::event::{ClusterEventKind, Event, EventQueue};
use crate::hal::NanHal;
use crate::ids::{ClientId, MessageId, PeerInstanceId, PeerMac, PubSubId, SessionId, TransactionId};
use crate::merge::merge;
use crate::session::SessionState;
use crate::transaction::{PendingTransaction, TransactionRegistry};
use crate::types::{ConfigRequest, PublishConfig, SessionKind, SubscribeConfig};

/// Owns every connected client, every session, the pending-transaction
/// table, and the single HAL handle. An ordinary value — no global
/// singleton, no interior mutability — owned by whatever plays the role of
/// the service entry point (see Design Notes §9).
pub struct StateManager {
    hal: Box<dyn NanHal>,
    clients: IndexMap<ClientId, ClientState>,
    transactions: TransactionRegistry,
    queue: EventQueue,
}

impl StateManager {
    pub fn new(hal: Box<dyn NanHal>) -> Self {
        Self { hal, clients: IndexMap::new(), transactions: TransactionRegistry::new(), queue: EventQueue::new() }
    }

    /// Drain the event queue, running each handler to completion before
    /// starting the next. The required test hook from Design Notes §9.
    pub fn dispatch_all(&mut self) {
        while let Some(event) = self.queue.pop() {
            self.handle(event);
        }
    }

    #[cfg(test)]
    pub fn pending_event_count(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    #[cfg(test)]
    pub fn has_session(&self, client: ClientId, session: SessionId) -> bool {
        self.clients.get(&client).is_some_and(|c| c.sessions().any(|(id, _)| *id == session))
    }

    // -- Upward client API (spec.md §4.4) ------------------------------

    pub fn connect(&mut self, client: ClientId, callback: Option<Box<dyn EventCallback>>) {
        self.queue.push(Event::Connect { client, callback });
    }

    pub fn disconnect(&mut self, client: ClientId) {
        self.queue.push(Event::Disconnect { client });
    }

    pub fn request_config(&mut self, client: ClientId, request: ConfigRequest) {
        self.queue.push(Event::RequestConfig { client, request });
    }

    pub fn publish(&mut self, client: ClientId, config: PublishConfig, callback: Box<dyn SessionCallback>) {
        self.queue.push(Event::Publish { client, config, callback });
    }

    pub fn update_publish(&mut self, client: ClientId, session: SessionId, config: PublishConfig) {
        self.queue.push(Event::UpdatePublish { client, session, config });
    }

    pub fn subscribe(&mut self, client: ClientId, config: SubscribeConfig, callback: Box<dyn SessionCallback>) {
        self.queue.push(Event::Subscribe { client, config, callback });
    }

    pub fn update_subscribe(&mut self, client: ClientId, session: SessionId, config: SubscribeConfig) {
        self.queue.push(Event::UpdateSubscribe { client, session, config });
    }

    pub fn terminate_session(&mut self, client: ClientId, session: SessionId) {
        self.queue.push(Event::TerminateSession { client, session });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_message(
        &mut self,
        client: ClientId,
        session: SessionId,
        peer_id: PeerInstanceId,
        data: Vec<u8>,
        message_id: MessageId,
    ) {
        self.queue.push(Event::SendMessage { client, session, peer_id, data, message_id });
    }

    // -- Downward HAL callbacks (spec.md §4.5) -------------------------

    pub fn on_config_completed(&mut self, tx: TransactionId) {
        self.queue.push(Event::ConfigCompleted { tx });
    }

    pub fn on_config_failed(&mut self, tx: TransactionId, reason: Reason) {
        self.queue.push(Event::ConfigFailed { tx, reason });
    }

    pub fn on_publish_success(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        self.queue.push(Event::PublishSuccess { tx, pub_sub_id });
    }

    pub fn on_subscribe_success(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        self.queue.push(Event::SubscribeSuccess { tx, pub_sub_id });
    }

    pub fn on_publish_fail(&mut self, tx: TransactionId, reason: Reason) {
        self.queue.push(Event::PublishFail { tx, reason });
    }

    pub fn on_subscribe_fail(&mut self, tx: TransactionId, reason: Reason) {
        self.queue.push(Event::SubscribeFail { tx, reason });
    }

    pub fn on_message_send_success(&mut self, tx: TransactionId) {
        self.queue.push(Event::MessageSendSuccess { tx });
    }

    pub fn on_message_send_fail(&mut self, tx: TransactionId, reason: Reason) {
        self.queue.push(Event::MessageSendFail { tx, reason });
    }

    pub fn on_publish_terminated(&mut self, pub_sub_id: PubSubId, reason: Reason) {
        self.queue.push(Event::PublishTerminated { pub_sub_id, reason });
    }

    pub fn on_subscribe_terminated(&mut self, pub_sub_id: PubSubId, reason: Reason) {
        self.queue.push(Event::SubscribeTerminated { pub_sub_id, reason });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn on_match(
        &mut self,
        pub_sub_id: PubSubId,
        peer_id: PeerInstanceId,
        peer_mac: PeerMac,
        service_specific_info: Vec<u8>,
        match_filter: Vec<u8>,
    ) {
        self.queue.push(Event::Match { pub_sub_id, peer_id, peer_mac, service_specific_info, match_filter });
    }

    pub fn on_message_received(&mut self, pub_sub_id: PubSubId, peer_id: PeerInstanceId, peer_mac: PeerMac, message: Vec<u8>) {
        self.queue.push(Event::MessageReceived { pub_sub_id, peer_id, peer_mac, message });
    }

    pub fn on_cluster_change(&mut self, kind: ClusterEventKind, mac: PeerMac) {
        self.queue.push(Event::ClusterChange { kind, mac });
    }

    pub fn on_interface_address_change(&mut self, mac: PeerMac) {
        self.queue.push(Event::InterfaceAddressChange { mac });
    }

    pub fn on_nan_down(&mut self, reason: Reason) {
        self.queue.push(Event::NanDown { reason });
    }

    pub fn on_capabilities_update(&mut self, tx: TransactionId) {
        self.queue.push(Event::CapabilitiesUpdate { tx });
    }

    pub fn on_unknown_transaction(&mut self, tx: TransactionId) {
        self.queue.push(Event::UnknownTransaction { tx });
    }

    pub fn on_no_op_transaction(&mut self, tx: TransactionId) {
        self.queue.push(Event::NoOpTransaction { tx });
    }

    // -- Dispatch ------------------------------------------------------

    fn handle(&mut self, event: Event) {
        match event {
            Event::Connect { client, callback } => self.handle_connect(client, callback),
            Event::Disconnect { client } => self.handle_disconnect(client),
            Event::RequestConfig { client, request } => self.handle_request_config(client, request),
            Event::Publish { client, config, callback } => self.handle_publish(client, config, callback),
            Event::UpdatePublish { client, session, config } => self.handle_update_publish(client, session, config),
            Event::Subscribe { client, config, callback } => self.handle_subscribe(client, config, callback),
            Event::UpdateSubscribe { client, session, config } => self.handle_update_subscribe(client, session, config),
            Event::TerminateSession { client, session } => self.handle_terminate_session(client, session),
            Event::SendMessage { client, session, peer_id, data, message_id } => {
                self.handle_send_message(client, session, peer_id, data, message_id)
            }
            Event::ConfigCompleted { tx } => self.handle_config_completed(tx),
            Event::ConfigFailed { tx, reason } => self.handle_config_failed(tx, reason),
            Event::PublishSuccess { tx, pub_sub_id } => self.handle_create_success(tx, pub_sub_id),
            Event::SubscribeSuccess { tx, pub_sub_id } => self.handle_create_success(tx, pub_sub_id),
            Event::PublishFail { tx, reason } => self.handle_create_or_update_fail(tx, reason),
            Event::SubscribeFail { tx, reason } => self.handle_create_or_update_fail(tx, reason),
            Event::MessageSendSuccess { tx } => self.handle_message_send_success(tx),
            Event::MessageSendFail { tx, reason } => self.handle_message_send_fail(tx, reason),
            Event::PublishTerminated { pub_sub_id, reason } => self.handle_session_terminated(pub_sub_id, reason),
            Event::SubscribeTerminated { pub_sub_id, reason } => self.handle_session_terminated(pub_sub_id, reason),
            Event::Match { pub_sub_id, peer_id, peer_mac, service_specific_info, match_filter } => {
                self.handle_match(pub_sub_id, peer_id, peer_mac, &service_specific_info, &match_filter)
            }
            Event::MessageReceived { pub_sub_id, peer_id, peer_mac, message } => {
                self.handle_message_received(pub_sub_id, peer_id, peer_mac, &message)
            }
            Event::ClusterChange { mac, .. } => self.handle_identity_changed(mac),
            Event::InterfaceAddressChange { mac } => self.handle_identity_changed(mac),
            Event::NanDown { reason } => self.handle_nan_down(reason),
            Event::CapabilitiesUpdate { tx } => {
                let _ = self.transactions.take(tx);
            }
            Event::UnknownTransaction { tx } => {
                debug!(%tx, "absorbing onUnknownTransaction");
                let _ = self.transactions.take(tx);
            }
            Event::NoOpTransaction { tx } => {
                let _ = self.transactions.take(tx);
            }
        }
    }

    // -- Client API handlers --------------------------------------------

    fn handle_connect(&mut self, client: ClientId, callback: Option<Box<dyn EventCallback>>) {
        if self.clients.contains_key(&client) {
            warn!(%client, "duplicate connect for already-connected client; ignoring");
            return;
        }
        debug!(%client, "client connected");
        self.clients.insert(client, ClientState::new(callback));
    }

    fn handle_disconnect(&mut self, client: ClientId) {
        let Some(mut client_state) = self.clients.shift_remove(&client) else {
            return;
        };
        debug!(%client, "client disconnected");
        self.transactions.sweep_client(client);

        for (_, session) in client_state.sessions_mut() {
            if let Some(pub_sub_id) = session.pub_sub_id() {
                let tx = self.transactions.allocate(PendingTransaction::NoOp);
                match session.kind() {
                    SessionKind::Publish => self.hal.stop_publish(tx, pub_sub_id),
                    SessionKind::Subscribe => self.hal.stop_subscribe(tx, pub_sub_id),
                }
            }
        }

        let had_config = client_state.config_request().is_some();
        drop(client_state);
        if had_config {
            self.push_device_config(PendingTransaction::NoOp);
        }
    }

    fn handle_request_config(&mut self, client: ClientId, request: ConfigRequest) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        client_state.set_config_request(request);
        // The requesting client just contributed a config, so this can
        // never be empty.
        let Some(merged) = merge(self.clients.values().filter_map(|c| c.config_request())) else {
            return;
        };
        let tx = self.transactions.allocate(PendingTransaction::Config { client, request });
        self.hal.enable_and_configure(tx, &merged);
    }

    /// Recompute the merged config across all connected clients and push it
    /// (or `disable()` if nobody has one). Used for the disconnect-time
    /// resync, which is not attributable to any single requesting client.
    fn push_device_config(&mut self, record: PendingTransaction) {
        match merge(self.clients.values().filter_map(|c| c.config_request())) {
            Some(merged) => {
                let tx = self.transactions.allocate(record);
                self.hal.enable_and_configure(tx, &merged);
            }
            None => {
                let tx = self.transactions.allocate(record);
                self.hal.disable(tx);
            }
        }
    }

    fn handle_publish(&mut self, client: ClientId, config: PublishConfig, callback: Box<dyn SessionCallback>) {
        if !self.clients.contains_key(&client) {
            warn!(%client, "publish from unknown client; ignoring");
            return;
        }
        let tx = self.transactions.allocate(PendingTransaction::CreateSession { client, kind: SessionKind::Publish, callback });
        self.hal.publish(tx, 0, &config);
    }

    fn handle_subscribe(&mut self, client: ClientId, config: SubscribeConfig, callback: Box<dyn SessionCallback>) {
        if !self.clients.contains_key(&client) {
            warn!(%client, "subscribe from unknown client; ignoring");
            return;
        }
        let tx = self.transactions.allocate(PendingTransaction::CreateSession { client, kind: SessionKind::Subscribe, callback });
        self.hal.subscribe(tx, 0, &config);
    }

    fn handle_update_publish(&mut self, client: ClientId, session: SessionId, config: PublishConfig) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        let Some(session_state) = client_state.session_mut(session) else {
            Self::fail_missing_session(client_state, session);
            return;
        };
        if session_state.kind() != SessionKind::Publish {
            session_state.callback().on_session_config_fail(Reason::Other);
            return;
        }
        let pub_sub_id = session_state.pub_sub_id().unwrap_or(PubSubId(0)).0;
        let tx = self.transactions.allocate(PendingTransaction::UpdateSession { client, session });
        self.hal.publish(tx, pub_sub_id, &config);
    }

    fn handle_update_subscribe(&mut self, client: ClientId, session: SessionId, config: SubscribeConfig) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        let Some(session_state) = client_state.session_mut(session) else {
            Self::fail_missing_session(client_state, session);
            return;
        };
        if session_state.kind() != SessionKind::Subscribe {
            session_state.callback().on_session_config_fail(Reason::Other);
            return;
        }
        let pub_sub_id = session_state.pub_sub_id().unwrap_or(PubSubId(0)).0;
        let tx = self.transactions.allocate(PendingTransaction::UpdateSession { client, session });
        self.hal.subscribe(tx, pub_sub_id, &config);
    }

    /// A session-scoped call (update, send) referenced a session id the
    /// manager no longer knows about. Deliver the one-shot tombstone
    /// failure if one is still available; otherwise it's already been
    /// reported once and this is silently absorbed.
    fn fail_missing_session(client_state: &mut ClientState, session: SessionId) {
        if let Some(mut callback) = client_state.take_tombstone(session) {
            callback.on_session_config_fail(Reason::SessionTerminated);
        }
    }

    fn handle_terminate_session(&mut self, client: ClientId, session: SessionId) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        let Some(session_state) = client_state.remove_session(session) else {
            return;
        };
        if let Some(pub_sub_id) = session_state.pub_sub_id() {
            let tx = self.transactions.allocate(PendingTransaction::NoOp);
            match session_state.kind() {
                SessionKind::Publish => self.hal.stop_publish(tx, pub_sub_id),
                SessionKind::Subscribe => self.hal.stop_subscribe(tx, pub_sub_id),
            }
        }
        client_state.tombstone(session, session_state.into_callback());
    }

    fn handle_send_message(
        &mut self,
        client: ClientId,
        session: SessionId,
        peer_id: PeerInstanceId,
        data: Vec<u8>,
        message_id: MessageId,
    ) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        let Some(session_state) = client_state.session_mut(session) else {
            if let Some(mut callback) = client_state.take_tombstone(session) {
                callback.on_message_send_fail(message_id, Reason::SessionTerminated);
            }
            return;
        };
        match session_state.lookup_peer(peer_id) {
            None => session_state.callback().on_message_send_fail(message_id, Reason::NoMatchSession),
            Some(mac) => {
                let pub_sub_id = session_state.pub_sub_id().unwrap_or(PubSubId(0));
                let tx = self.transactions.allocate(PendingTransaction::SendMessage { client, session, message_id });
                self.hal.send_message(tx, pub_sub_id, peer_id, mac, &data);
            }
        }
    }

    // -- HAL callback handlers --------------------------------------------

    fn handle_config_completed(&mut self, tx: TransactionId) {
        let Some(PendingTransaction::Config { client, request }) = self.transactions.take(tx) else {
            debug!(%tx, "absorbing onConfigCompleted for unknown transaction");
            return;
        };
        if let Some(client_state) = self.clients.get_mut(&client) {
            if let Some(callback) = client_state.event_callback() {
                callback.on_config_completed(&request);
            }
        }
    }

    fn handle_config_failed(&mut self, tx: TransactionId, reason: Reason) {
        let Some(PendingTransaction::Config { client, request }) = self.transactions.take(tx) else {
            debug!(%tx, "absorbing onConfigFailed for unknown transaction");
            return;
        };
        if let Some(client_state) = self.clients.get_mut(&client) {
            if let Some(callback) = client_state.event_callback() {
                callback.on_config_failed(&request, reason);
            }
        }
    }

    fn handle_create_success(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        match self.transactions.take(tx) {
            Some(PendingTransaction::CreateSession { client, kind, callback }) => {
                let Some(client_state) = self.clients.get_mut(&client) else {
                    // Owner disconnected without the sweep converting this entry
                    // (shouldn't happen given sweep ordering, but fail safe).
                    let tx2 = self.transactions.allocate(PendingTransaction::NoOp);
                    self.issue_stop(kind, tx2, pub_sub_id);
                    return;
                };
                let session_id = client_state.next_session_id();
                let mut session = SessionState::new(kind, callback);
                session.set_pub_sub_id(pub_sub_id);
                client_state.add_session(session_id, session);
                if let Some(session) = client_state.session_mut(session_id) {
                    session.callback().on_session_started(session_id);
                }
            }
            Some(PendingTransaction::CreateSessionOrphaned { kind }) => {
                debug!(%tx, %pub_sub_id, "compensating stop for orphaned create-session");
                let tx2 = self.transactions.allocate(PendingTransaction::NoOp);
                self.issue_stop(kind, tx2, pub_sub_id);
            }
            Some(PendingTransaction::UpdateSession { .. }) => {
                // No client callback on update success (spec.md §4.5).
            }
            Some(_) => warn!(%tx, "onPublishSuccess/onSubscribeSuccess resolved to an unexpected transaction kind"),
            None => debug!(%tx, "absorbing onPublishSuccess/onSubscribeSuccess for unknown transaction"),
        }
    }

    fn issue_stop(&mut self, kind: SessionKind, tx: TransactionId, pub_sub_id: PubSubId) {
        match kind {
            SessionKind::Publish => self.hal.stop_publish(tx, pub_sub_id),
            SessionKind::Subscribe => self.hal.stop_subscribe(tx, pub_sub_id),
        }
    }

    fn handle_create_or_update_fail(&mut self, tx: TransactionId, reason: Reason) {
        match self.transactions.take(tx) {
            Some(PendingTransaction::CreateSession { mut callback, .. }) => {
                callback.on_session_config_fail(reason);
            }
            Some(PendingTransaction::CreateSessionOrphaned { .. }) => {
                // Never created, owner already gone; nothing to clean up or report.
            }
            Some(PendingTransaction::UpdateSession { client, session }) => {
                if let Some(client_state) = self.clients.get_mut(&client) {
                    if let Some(session_state) = client_state.session_mut(session) {
                        // Session remains alive and established (spec.md §4.5).
                        session_state.callback().on_session_config_fail(reason);
                    }
                }
            }
            Some(_) => warn!(%tx, "onPublishFail/onSubscribeFail resolved to an unexpected transaction kind"),
            None => debug!(%tx, "absorbing onPublishFail/onSubscribeFail for unknown transaction"),
        }
    }

    fn handle_message_send_success(&mut self, tx: TransactionId) {
        let Some(PendingTransaction::SendMessage { client, session, message_id }) = self.transactions.take(tx) else {
            debug!(%tx, "absorbing onMessageSendSuccess for unknown transaction");
            return;
        };
        self.deliver_to_session_or_tombstone(client, session, |cb| cb.on_message_send_success(message_id));
    }

    fn handle_message_send_fail(&mut self, tx: TransactionId, reason: Reason) {
        let Some(PendingTransaction::SendMessage { client, session, message_id }) = self.transactions.take(tx) else {
            debug!(%tx, "absorbing onMessageSendFail for unknown transaction");
            return;
        };
        self.deliver_to_session_or_tombstone(client, session, |cb| cb.on_message_send_fail(message_id, reason));
    }

    fn deliver_to_session_or_tombstone(&mut self, client: ClientId, session: SessionId, f: impl FnOnce(&mut dyn SessionCallback)) {
        let Some(client_state) = self.clients.get_mut(&client) else {
            return;
        };
        if let Some(session_state) = client_state.session_mut(session) {
            f(session_state.callback());
        } else if let Some(mut callback) = client_state.take_tombstone(session) {
            f(callback.as_mut());
        }
    }

    fn find_session(&self, pub_sub_id: PubSubId) -> Option<(ClientId, SessionId)> {
        for (&client_id, client_state) in self.clients.iter() {
            for (&session_id, session) in client_state.sessions() {
                if session.pub_sub_id() == Some(pub_sub_id) {
                    return Some((client_id, session_id));
                }
            }
        }
        None
    }

    fn handle_session_terminated(&mut self, pub_sub_id: PubSubId, reason: Reason) {
        let Some((client_id, session_id)) = self.find_session(pub_sub_id) else {
            debug!(%pub_sub_id, "absorbing termination for unknown session");
            return;
        };
        let Some(client_state) = self.clients.get_mut(&client_id) else {
            return;
        };
        let Some(mut session_state) = client_state.remove_session(session_id) else {
            return;
        };
        session_state.callback().on_session_terminated(reason);
        client_state.tombstone(session_id, session_state.into_callback());
    }

    fn handle_match(&mut self, pub_sub_id: PubSubId, peer_id: PeerInstanceId, peer_mac: PeerMac, ssi: &[u8], match_filter: &[u8]) {
        let Some((client_id, session_id)) = self.find_session(pub_sub_id) else {
            return;
        };
        if let Some(client_state) = self.clients.get_mut(&client_id) {
            if let Some(session_state) = client_state.session_mut(session_id) {
                session_state.update_peer(peer_id, peer_mac);
                session_state.callback().on_match(peer_id, ssi, match_filter);
            }
        }
    }

    fn handle_message_received(&mut self, pub_sub_id: PubSubId, peer_id: PeerInstanceId, peer_mac: PeerMac, message: &[u8]) {
        let Some((client_id, session_id)) = self.find_session(pub_sub_id) else {
            return;
        };
        if let Some(client_state) = self.clients.get_mut(&client_id) {
            if let Some(session_state) = client_state.session_mut(session_id) {
                session_state.update_peer(peer_id, peer_mac);
                session_state.callback().on_message_received(peer_id, message);
            }
        }
    }

    fn handle_identity_changed(&mut self, _mac: PeerMac) {
        for client_state in self.clients.values_mut() {
            let opted_in = client_state.config_request().is_some_and(|c| c.identity_change_callback_enabled);
            if opted_in {
                if let Some(callback) = client_state.event_callback() {
                    callback.on_identity_changed();
                }
            }
        }
    }

    fn handle_nan_down(&mut self, reason: Reason) {
        // Design Notes §9: notify every client, leave client/session tables
        // intact — it is up to each client to decide whether to disconnect.
        for client_state in self.clients.values_mut() {
            if let Some(callback) = client_state.event_callback() {
                callback.on_nan_down(reason);
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
