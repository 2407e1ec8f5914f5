use crate::error::{AppError, Result};

pub const MATCH_API_URL: &str = "http://localhost:8000";

/// Fixed-point scale of contest odds (ratio * 1e6).
pub const ODDS_SCALE: u128 = 1_000_000;

/// Decimal places of the stake token.
pub const TOKEN_DECIMALS: u32 = 6;

/// Base units per whole token.
pub const TOKEN_SCALE: u128 = 10u128.pow(TOKEN_DECIMALS);

/// How often contest snapshots are re-fetched from the contract (seconds).
pub const CONTEST_REFRESH_INTERVAL_SECS: u64 = 15;

/// Timeout applied to every outbound HTTP request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Settlement buffers after match end, per match format.
pub mod settle_buffers {
    pub const SHORT_FORMAT_MINUTES: u64 = 90;
    pub const LONG_FORMAT_MINUTES: u64 = 150;
}

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC gateway in front of the contest and token contracts (CONTRACT_GATEWAY_URL).
    /// Unset means the in-memory contract is used.
    pub gateway_url: Option<String>,
    pub contest_address: String,
    pub token_address: String,
    /// Account allowed to settle contests (AVS_ADDRESS).
    pub avs_address: String,
    pub match_api_url: String,
    pub log_level: String,
    pub api_port: u16,
    pub refresh_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub settle_buffer_short_minutes: u64,
    pub settle_buffer_long_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: None,
            contest_address: ZERO_ADDRESS.to_string(),
            token_address: ZERO_ADDRESS.to_string(),
            avs_address: ZERO_ADDRESS.to_string(),
            match_api_url: MATCH_API_URL.to_string(),
            log_level: "info".to_string(),
            api_port: 3000,
            refresh_interval_secs: CONTEST_REFRESH_INTERVAL_SECS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            settle_buffer_short_minutes: settle_buffers::SHORT_FORMAT_MINUTES,
            settle_buffer_long_minutes: settle_buffers::LONG_FORMAT_MINUTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gateway_url: std::env::var("CONTRACT_GATEWAY_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            contest_address: std::env::var("CONTEST_ADDRESS")
                .unwrap_or_else(|_| ZERO_ADDRESS.to_string()),
            token_address: std::env::var("TOKEN_ADDRESS")
                .unwrap_or_else(|_| ZERO_ADDRESS.to_string()),
            avs_address: std::env::var("AVS_ADDRESS")
                .unwrap_or_else(|_| ZERO_ADDRESS.to_string()),
            match_api_url: std::env::var("MATCH_API_URL")
                .unwrap_or_else(|_| MATCH_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            refresh_interval_secs: std::env::var("CONTEST_REFRESH_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(CONTEST_REFRESH_INTERVAL_SECS),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
            settle_buffer_short_minutes: std::env::var("SETTLE_BUFFER_SHORT_MINUTES")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(settle_buffers::SHORT_FORMAT_MINUTES),
            settle_buffer_long_minutes: std::env::var("SETTLE_BUFFER_LONG_MINUTES")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(settle_buffers::LONG_FORMAT_MINUTES),
        })
    }
}
