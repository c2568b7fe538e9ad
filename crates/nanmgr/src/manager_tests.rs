// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::types::{PublishConfig, SubscribeConfig};

#[derive(Default, Clone)]
struct HalCall {
    kind: &'static str,
    tx: u16,
    pub_sub_id: u16,
    config: Option<ConfigRequest>,
}

#[derive(Default, Clone)]
struct HalLog(Rc<RefCell<Vec<HalCall>>>);

impl HalLog {
    fn push(&self, call: HalCall) {
        self.0.borrow_mut().push(call);
    }
    fn entries(&self) -> Vec<HalCall> {
        self.0.borrow().clone()
    }
}

struct RecordingHal {
    log: HalLog,
}

impl NanHal for RecordingHal {
    fn enable_and_configure(&mut self, tx: TransactionId, config: &ConfigRequest) {
        self.log.push(HalCall { kind: "enable_and_configure", tx: tx.0, pub_sub_id: 0, config: Some(*config) });
    }
    fn disable(&mut self, tx: TransactionId) {
        self.log.push(HalCall { kind: "disable", tx: tx.0, ..Default::default() });
    }
    fn publish(&mut self, tx: TransactionId, pub_sub_id: u16, _config: &PublishConfig) {
        self.log.push(HalCall { kind: "publish", tx: tx.0, pub_sub_id, ..Default::default() });
    }
    fn stop_publish(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        self.log.push(HalCall { kind: "stop_publish", tx: tx.0, pub_sub_id: pub_sub_id.0, ..Default::default() });
    }
    fn subscribe(&mut self, tx: TransactionId, pub_sub_id: u16, _config: &SubscribeConfig) {
        self.log.push(HalCall { kind: "subscribe", tx: tx.0, pub_sub_id, ..Default::default() });
    }
    fn stop_subscribe(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        self.log.push(HalCall { kind: "stop_subscribe", tx: tx.0, pub_sub_id: pub_sub_id.0, ..Default::default() });
    }
    fn send_message(&mut self, tx: TransactionId, pub_sub_id: PubSubId, _peer: PeerInstanceId, _mac: PeerMac, _data: &[u8]) {
        self.log.push(HalCall { kind: "send_message", tx: tx.0, pub_sub_id: pub_sub_id.0, ..Default::default() });
    }
}

#[derive(Default, Clone)]
struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    fn push(&self, line: impl Into<String>) {
        self.0.borrow_mut().push(line.into());
    }
    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

struct LoggingEventCallback(EventLog);
impl EventCallback for LoggingEventCallback {
    fn on_config_completed(&mut self, _request: &ConfigRequest) {
        self.0.push("config_completed");
    }
    fn on_config_failed(&mut self, _request: &ConfigRequest, reason: Reason) {
        self.0.push(format!("config_failed:{reason}"));
    }
    fn on_identity_changed(&mut self) {
        self.0.push("identity_changed");
    }
    fn on_nan_down(&mut self, reason: Reason) {
        self.0.push(format!("nan_down:{reason}"));
    }
}

struct LoggingSessionCallback(EventLog);
impl SessionCallback for LoggingSessionCallback {
    fn on_session_started(&mut self, session_id: SessionId) {
        self.0.push(format!("session_started:{session_id}"));
    }
    fn on_session_config_fail(&mut self, reason: Reason) {
        self.0.push(format!("session_config_fail:{reason}"));
    }
    fn on_session_terminated(&mut self, reason: Reason) {
        self.0.push(format!("session_terminated:{reason}"));
    }
    fn on_match(&mut self, peer_id: PeerInstanceId, _ssi: &[u8], _mf: &[u8]) {
        self.0.push(format!("match:{peer_id}"));
    }
    fn on_message_received(&mut self, peer_id: PeerInstanceId, _message: &[u8]) {
        self.0.push(format!("message_received:{peer_id}"));
    }
    fn on_message_send_success(&mut self, message_id: MessageId) {
        self.0.push(format!("message_send_success:{message_id}"));
    }
    fn on_message_send_fail(&mut self, message_id: MessageId, reason: Reason) {
        self.0.push(format!("message_send_fail:{message_id}:{reason}"));
    }
}

fn manager() -> StateManager {
    StateManager::new(Box::new(RecordingHal { log: HalLog::default() }))
}

fn manager_with_hal_log() -> (StateManager, HalLog) {
    let log = HalLog::default();
    (StateManager::new(Box::new(RecordingHal { log: log.clone() })), log)
}

fn config(cluster_low: u16, cluster_high: u16, master_preference: u8, support_5g_band: bool) -> ConfigRequest {
    ConfigRequest { cluster_low, cluster_high, master_preference, support_5g_band, identity_change_callback_enabled: false }
}

#[test]
fn duplicate_connect_is_idempotent() {
    let mut mgr = manager();
    mgr.connect(ClientId(1), None);
    mgr.connect(ClientId(1), None);
    mgr.dispatch_all();
    assert_eq!(mgr.client_count(), 1);
}

#[test]
fn disconnect_unknown_client_is_silent() {
    let mut mgr = manager();
    mgr.disconnect(ClientId(99));
    mgr.dispatch_all();
    assert_eq!(mgr.client_count(), 0);
}

#[test]
fn publish_then_terminate_race_orphans_cleanly() {
    let mut mgr = manager();
    let log = EventLog::default();
    mgr.connect(ClientId(1), Some(Box::new(LoggingEventCallback(log.clone()))));
    mgr.publish(ClientId(1), PublishConfig::default(), Box::new(LoggingSessionCallback(log.clone())));
    mgr.dispatch_all();

    // Client disconnects while the publish is still in flight.
    mgr.disconnect(ClientId(1));
    mgr.dispatch_all();

    // The HAL now answers the create that raced the disconnect.
    mgr.on_publish_success(TransactionId(0), PubSubId(7));
    mgr.dispatch_all();

    assert_eq!(mgr.client_count(), 0);
    // No session_started should ever reach the (gone) client's callback.
    assert!(!log.entries().iter().any(|e| e.starts_with("session_started")));
}

#[test]
fn update_fail_keeps_session_alive() {
    let mut mgr = manager();
    let log = EventLog::default();
    mgr.connect(ClientId(1), None);
    mgr.publish(ClientId(1), PublishConfig::default(), Box::new(LoggingSessionCallback(log.clone())));
    mgr.dispatch_all();
    mgr.on_publish_success(TransactionId(0), PubSubId(3));
    mgr.dispatch_all();

    mgr.update_publish(ClientId(1), SessionId(0), PublishConfig::default());
    mgr.dispatch_all();
    mgr.on_publish_fail(TransactionId(1), Reason::InvalidArgs);
    mgr.dispatch_all();

    assert!(mgr.has_session(ClientId(1), SessionId(0)));
    assert!(log.entries().contains(&"session_config_fail:INVALID_ARGS".to_string()));
}

#[test]
fn terminate_then_update_reports_once_then_silent() {
    let mut mgr = manager();
    let log = EventLog::default();
    mgr.connect(ClientId(1), None);
    mgr.publish(ClientId(1), PublishConfig::default(), Box::new(LoggingSessionCallback(log.clone())));
    mgr.dispatch_all();
    mgr.on_publish_success(TransactionId(0), PubSubId(3));
    mgr.dispatch_all();

    mgr.terminate_session(ClientId(1), SessionId(0));
    mgr.dispatch_all();
    assert!(!mgr.has_session(ClientId(1), SessionId(0)));

    mgr.update_publish(ClientId(1), SessionId(0), PublishConfig::default());
    mgr.dispatch_all();
    mgr.update_publish(ClientId(1), SessionId(0), PublishConfig::default());
    mgr.dispatch_all();

    let fails = log.entries().iter().filter(|e| e.starts_with("session_config_fail")).count();
    assert_eq!(fails, 1, "only the first post-terminate update should be reported");
}

#[test]
fn send_message_to_unknown_peer_fails_without_hal_call() {
    let mut mgr = manager();
    let log = EventLog::default();
    mgr.connect(ClientId(1), None);
    mgr.publish(ClientId(1), PublishConfig::default(), Box::new(LoggingSessionCallback(log.clone())));
    mgr.dispatch_all();
    mgr.on_publish_success(TransactionId(0), PubSubId(3));
    mgr.dispatch_all();

    mgr.send_message(ClientId(1), SessionId(0), PeerInstanceId(42), vec![1, 2, 3], MessageId(9));
    mgr.dispatch_all();

    assert!(log.entries().contains(&"message_send_fail:9:NO_MATCH_SESSION".to_string()));
}

#[test]
fn config_merge_reverts_on_disconnect() {
    let (mut mgr, hal_log) = manager_with_hal_log();
    mgr.connect(ClientId(1), None);
    mgr.connect(ClientId(2), None);
    mgr.dispatch_all();

    mgr.request_config(ClientId(1), config(5, 100, 111, false));
    mgr.dispatch_all();
    mgr.request_config(ClientId(2), config(7, 155, 0, true));
    mgr.dispatch_all();

    let merged = hal_log.entries().pop().and_then(|c| c.config);
    assert_eq!(merged, Some(config(5, 155, 111, true)), "merged across both clients");

    mgr.disconnect(ClientId(2));
    mgr.dispatch_all();

    // Only client 1 is left, so the merge passes its request through unchanged.
    let reverted = hal_log.entries().pop().and_then(|c| c.config);
    assert_eq!(reverted, Some(config(5, 100, 111, false)), "reverts to the remaining client's own request");

    // A second disconnect leaves nobody and should trigger `disable()`.
    mgr.disconnect(ClientId(1));
    mgr.dispatch_all();

    assert_eq!(hal_log.entries().last().map(|c| c.kind), Some("disable"));
    assert_eq!(mgr.client_count(), 0);
}

#[test]
fn nan_down_notifies_without_clearing_state() {
    let mut mgr = manager();
    let log = EventLog::default();
    mgr.connect(ClientId(1), Some(Box::new(LoggingEventCallback(log.clone()))));
    mgr.publish(ClientId(1), PublishConfig::default(), Box::new(LoggingSessionCallback(EventLog::default())));
    mgr.dispatch_all();
    mgr.on_publish_success(TransactionId(0), PubSubId(1));
    mgr.dispatch_all();

    mgr.on_nan_down(Reason::Other);
    mgr.dispatch_all();

    assert!(log.entries().contains(&"nan_down:OTHER".to_string()));
    assert!(mgr.has_session(ClientId(1), SessionId(0)), "nan_down must not tear down sessions itself");
}

#[test]
fn identity_changed_only_reaches_opted_in_clients() {
    let mut mgr = manager();
    let log_a = EventLog::default();
    let log_b = EventLog::default();
    mgr.connect(ClientId(1), Some(Box::new(LoggingEventCallback(log_a.clone()))));
    mgr.connect(ClientId(2), Some(Box::new(LoggingEventCallback(log_b.clone()))));
    mgr.dispatch_all();

    mgr.request_config(ClientId(1), ConfigRequest { identity_change_callback_enabled: true, ..config(1, 2, 0, false) });
    mgr.dispatch_all();
    mgr.request_config(ClientId(2), config(1, 2, 0, false));
    mgr.dispatch_all();

    mgr.on_interface_address_change(PeerMac([1, 2, 3, 4, 5, 6]));
    mgr.dispatch_all();

    assert!(log_a.entries().contains(&"identity_changed".to_string()));
    assert!(!log_b.entries().contains(&"identity_changed".to_string()));
}
