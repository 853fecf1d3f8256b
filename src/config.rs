use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::warn;

use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::transport::RetryPolicy;

pub const DEFAULT_ENDPOINT: &str = "https://webl.vivi.com/cgi-bin/query.fcgi";
pub const DEFAULT_HOUSE_MANAGER: &str = "77894";
const SNAPSHOT_DIR: &str = "eko_agent";
const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub username: String,
    pub password: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub house_manager: String,
    pub snapshot_path: Option<PathBuf>,
    pub dry_run: bool,
    pub replenish: bool,
    /// When non-empty, only these fighters are processed.
    pub fighters: Vec<String>,
}

impl AgentConfig {
    /// Reads the process environment; call after `.env` files are loaded.
    pub fn from_env() -> Result<Self> {
        let password = env::var("GYM_PASSWORD").unwrap_or_default();
        if password.trim().is_empty() {
            bail!("GYM_PASSWORD is not set");
        }
        let defaults = RetryPolicy::default();
        Ok(Self {
            username: env::var("GYM_USERNAME").unwrap_or_default(),
            password,
            endpoint: env_string("EKO_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            request_timeout: Duration::from_secs(
                env_parse("EKO_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS).max(1),
            ),
            retry: RetryPolicy {
                attempts: env_parse("EKO_MAX_ATTEMPTS", defaults.attempts).max(1),
                base_secs: env_parse("EKO_BACKOFF_BASE_SECS", defaults.base_secs),
                step_secs: env_parse("EKO_BACKOFF_STEP_SECS", defaults.step_secs),
            },
            house_manager: env_string("EKO_HOUSE_MANAGER")
                .unwrap_or_else(|| DEFAULT_HOUSE_MANAGER.to_string()),
            snapshot_path: env_string("EKO_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .or_else(default_snapshot_path),
            dry_run: env_bool("EKO_DRY_RUN", false),
            replenish: env_bool("EKO_REPLENISH", false),
            fighters: Vec::new(),
        })
    }

    /// Applies command-line flags on top of the environment.
    pub fn apply_args<I: IntoIterator<Item = String>>(&mut self, args: I) -> Result<()> {
        let args = args.into_iter().collect::<Vec<_>>();
        let mut idx = 0;
        while idx < args.len() {
            let arg = args[idx].as_str();
            match arg {
                "--dry-run" => self.dry_run = true,
                "--replenish" => self.replenish = true,
                "--snapshot" | "--fighter" => {
                    let Some(value) = args.get(idx + 1).filter(|v| !v.trim().is_empty()) else {
                        bail!("{arg} needs a value");
                    };
                    self.apply_value(arg, value);
                    idx += 1;
                }
                _ => {
                    if let Some(path) = arg.strip_prefix("--snapshot=") {
                        self.apply_value("--snapshot", path);
                    } else if let Some(id) = arg.strip_prefix("--fighter=") {
                        self.apply_value("--fighter", id);
                    } else {
                        bail!("unknown argument: {arg}");
                    }
                }
            }
            idx += 1;
        }
        Ok(())
    }

    fn apply_value(&mut self, flag: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match flag {
            "--snapshot" => self.snapshot_path = Some(PathBuf::from(value)),
            _ => {
                if !self.fighters.iter().any(|f| f == value) {
                    self.fighters.push(value.to_string());
                }
            }
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    let Some(raw) = env_string(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed setting");
            default
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_string(key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn default_snapshot_path() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(SNAPSHOT_DIR).join(SNAPSHOT_FILE));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(SNAPSHOT_DIR)
            .join(SNAPSHOT_FILE),
    )
}
