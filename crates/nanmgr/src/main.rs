// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::{error, info};

use nanmgr::{
    ConfigRequest, EventCallback, MessageId, NanHal, PeerInstanceId, PeerMac, PubSubId, PublishConfig, Reason,
    SessionCallback, SessionId, StateManager, SubscribeConfig, TransactionId,
};

use nanmgr::config::NanDemoConfig;

/// A HAL stand-in that just logs what the firmware would have been asked to
/// do. Real callers plug in the actual vendor HAL binding here.
struct LoggingHal;

impl NanHal for LoggingHal {
    fn enable_and_configure(&mut self, tx: TransactionId, config: &ConfigRequest) {
        info!(%tx, ?config, "hal: enableAndConfigure");
    }
    fn disable(&mut self, tx: TransactionId) {
        info!(%tx, "hal: disable");
    }
    fn publish(&mut self, tx: TransactionId, pub_sub_id: u16, config: &PublishConfig) {
        info!(%tx, pub_sub_id, service = %config.service_name, "hal: publish");
    }
    fn stop_publish(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        info!(%tx, %pub_sub_id, "hal: stopPublish");
    }
    fn subscribe(&mut self, tx: TransactionId, pub_sub_id: u16, config: &SubscribeConfig) {
        info!(%tx, pub_sub_id, service = %config.service_name, "hal: subscribe");
    }
    fn stop_subscribe(&mut self, tx: TransactionId, pub_sub_id: PubSubId) {
        info!(%tx, %pub_sub_id, "hal: stopSubscribe");
    }
    fn send_message(&mut self, tx: TransactionId, pub_sub_id: PubSubId, peer: PeerInstanceId, mac: PeerMac, data: &[u8]) {
        info!(%tx, %pub_sub_id, %peer, %mac, len = data.len(), "hal: sendMessage");
    }
}

struct LoggingEventCallback;
impl EventCallback for LoggingEventCallback {
    fn on_config_completed(&mut self, request: &ConfigRequest) {
        info!(?request, "client: configCompleted");
    }
    fn on_config_failed(&mut self, request: &ConfigRequest, reason: Reason) {
        info!(?request, %reason, "client: configFailed");
    }
    fn on_identity_changed(&mut self) {
        info!("client: identityChanged");
    }
    fn on_nan_down(&mut self, reason: Reason) {
        info!(%reason, "client: nanDown");
    }
}

struct LoggingSessionCallback;
impl SessionCallback for LoggingSessionCallback {
    fn on_session_started(&mut self, session_id: SessionId) {
        info!(%session_id, "session: started");
    }
    fn on_session_config_fail(&mut self, reason: Reason) {
        info!(%reason, "session: configFail");
    }
    fn on_session_terminated(&mut self, reason: Reason) {
        info!(%reason, "session: terminated");
    }
    fn on_match(&mut self, peer_id: PeerInstanceId, service_specific_info: &[u8], match_filter: &[u8]) {
        info!(%peer_id, ssi_len = service_specific_info.len(), mf_len = match_filter.len(), "session: match");
    }
    fn on_message_received(&mut self, peer_id: PeerInstanceId, message: &[u8]) {
        info!(%peer_id, len = message.len(), "session: messageReceived");
    }
    fn on_message_send_success(&mut self, message_id: MessageId) {
        info!(%message_id, "session: messageSendSuccess");
    }
    fn on_message_send_fail(&mut self, message_id: MessageId, reason: Reason) {
        info!(%message_id, %reason, "session: messageSendFail");
    }
}

fn main() {
    let config = NanDemoConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(config) {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Walk one client through connect, config, publish, and teardown against a
/// logging HAL stand-in, demonstrating the `dispatch_all` cooperative loop.
fn run(config: NanDemoConfig) -> anyhow::Result<()> {
    let client = nanmgr::ClientId(1);
    let mut manager = StateManager::new(Box::new(LoggingHal));

    manager.connect(client, Some(Box::new(LoggingEventCallback)));
    manager.request_config(
        client,
        ConfigRequest {
            cluster_low: config.cluster_low,
            cluster_high: config.cluster_high,
            master_preference: config.master_preference,
            support_5g_band: config.support_5g_band,
            identity_change_callback_enabled: true,
        },
    );
    manager.dispatch_all();
    manager.on_config_completed(TransactionId(0));
    manager.dispatch_all();

    manager.publish(
        client,
        PublishConfig { service_name: config.service_name.clone(), ..PublishConfig::default() },
        Box::new(LoggingSessionCallback),
    );
    manager.dispatch_all();
    manager.on_publish_success(TransactionId(1), PubSubId(1));
    manager.dispatch_all();

    manager.disconnect(client);
    manager.dispatch_all();

    Ok(())
}
