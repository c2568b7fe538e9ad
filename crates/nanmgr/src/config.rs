// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the `nanmgr-demo` binary.
///
/// The manager library itself takes no configuration of its own — a
/// [`crate::ConfigRequest`] arrives per connected client at runtime. This is
/// just what the demo binary needs to stand one up and drive it.
#[derive(Debug, Clone, clap::Parser)]
pub struct NanDemoConfig {
    /// Preferred cluster low edge to request on behalf of the demo client.
    #[arg(long, default_value_t = 0, env = "NANMGR_CLUSTER_LOW")]
    pub cluster_low: u16,

    /// Preferred cluster high edge to request on behalf of the demo client.
    #[arg(long, default_value_t = 0, env = "NANMGR_CLUSTER_HIGH")]
    pub cluster_high: u16,

    /// Master preference value (0-255, higher wins cluster merge).
    #[arg(long, default_value_t = 0, env = "NANMGR_MASTER_PREFERENCE")]
    pub master_preference: u8,

    /// Request 5 GHz band support.
    #[arg(long, default_value_t = false, env = "NANMGR_SUPPORT_5G")]
    pub support_5g_band: bool,

    /// Service name to publish under.
    #[arg(long, default_value = "demo-service", env = "NANMGR_SERVICE_NAME")]
    pub service_name: String,
}
