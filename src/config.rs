use std::env;
use std::time::Duration;

use crate::state::GameType;

const DEFAULT_API_BASE: &str = "https://api.tmi.gg";
const DEFAULT_STALE_SECS: u64 = 60;
const MIN_STALE_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub nickname: Option<String>,
    pub game_type: GameType,
    pub stale_after: Duration,
    pub request_timeout: Duration,
    pub demo: bool,
}

impl AppConfig {
    /// Reads `.env.local`, then `.env`, then the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let api_base = env::var("TMI_API_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let nickname = env::var("TMI_NICKNAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let game_type = env::var("TMI_GAME_TYPE")
            .ok()
            .and_then(|v| GameType::parse(&v))
            .unwrap_or_default();
        let stale_secs = parse_u64_env("TMI_STALE_SECS")
            .unwrap_or(DEFAULT_STALE_SECS)
            .max(MIN_STALE_SECS);
        let timeout_secs = parse_u64_env("TMI_REQUEST_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);
        let demo = env::var("TMI_DEMO")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            api_base,
            nickname,
            game_type,
            stale_after: Duration::from_secs(stale_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            demo,
        }
    }
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.trim().parse::<u64>().ok())
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
