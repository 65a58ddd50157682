use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::GroupId;

/// Default ledger location, relative to the working directory.
pub const DEFAULT_LEDGER_PATH: &str = "./sent.json";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Group the bot welcomes members of
    pub group_id: GroupId,

    /// Ledger file holding the already-notified member ids (default: ./sent.json)
    pub ledger_path: PathBuf,

    /// Base URL of the WhatsApp bridge REST API
    pub bridge_url: String,

    /// Optional bearer token sent to the bridge
    pub bridge_token: Option<String>,

    /// Address the event webhook listens on
    pub webhook_addr: SocketAddr,

    /// Optional shared secret expected in the `x-subbot-secret` header
    pub webhook_secret: Option<String>,

    /// Per-request timeout for bridge calls, in seconds (default: 30)
    pub http_timeout_secs: u64,

    /// First reconnect delay in milliseconds (default: 1000)
    pub reconnect_initial_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds (default: 60000)
    pub reconnect_max_ms: u64,

    /// Session probes attempted before giving up (default: 10)
    pub reconnect_max_attempts: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let group_id = lookup("SUBBOT_GROUP_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("SUBBOT_GROUP_ID environment variable is required"))?;

        Ok(Self {
            group_id: GroupId::new(group_id),
            ledger_path: lookup("SUBBOT_LEDGER_PATH")
                .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string())
                .into(),
            bridge_url: lookup("SUBBOT_BRIDGE_URL")
                .unwrap_or_else(|| "http://localhost:3001".to_string()),
            bridge_token: lookup("SUBBOT_BRIDGE_TOKEN").filter(|v| !v.is_empty()),
            webhook_addr: lookup("SUBBOT_WEBHOOK_ADDR")
                .unwrap_or_else(|| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SUBBOT_WEBHOOK_ADDR must be a valid socket address"))?,
            webhook_secret: lookup("SUBBOT_WEBHOOK_SECRET").filter(|v| !v.is_empty()),
            http_timeout_secs: lookup("SUBBOT_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SUBBOT_HTTP_TIMEOUT_SECS must be a valid u64"))?,
            reconnect_initial_ms: lookup("SUBBOT_RECONNECT_INITIAL_MS")
                .unwrap_or_else(|| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SUBBOT_RECONNECT_INITIAL_MS must be a valid u64"))?,
            reconnect_max_ms: lookup("SUBBOT_RECONNECT_MAX_MS")
                .unwrap_or_else(|| "60000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SUBBOT_RECONNECT_MAX_MS must be a valid u64"))?,
            reconnect_max_attempts: lookup("SUBBOT_RECONNECT_MAX_ATTEMPTS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SUBBOT_RECONNECT_MAX_ATTEMPTS must be a valid u32"))?,
        })
    }
}
