use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::CACHE_CONTROL;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::http_client::http_client;

/// Every healthy page from the game server carries this body colour.
pub const LIVENESS_MARKER: &str = "bgcolor=#eeeeee";

/// Sends one command with form fields and returns the response body, or an
/// empty string when the server could not be reached.
pub trait Transport {
    fn send(&self, command: &str, fields: &[(String, String)]) -> String;
}

pub fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn is_live(body: &str) -> bool {
    body.to_ascii_lowercase().contains(LIVENESS_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_secs: f64,
    pub step_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 7,
            base_secs: 2.75,
            step_secs: 15.0,
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt` (zero based), including the first.
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.base_secs + self.step_secs * attempt as f64;
        Duration::from_secs_f64(secs.max(0.0))
    }
}

pub struct HttpTransport {
    client: &'static Client,
    endpoint: String,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = http_client(config.request_timeout)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: config.retry,
        })
    }

    fn form(&self, command: &str, fields: &[(String, String)]) -> Vec<(String, String)> {
        let mut form = fields.to_vec();
        form.push(("username".to_string(), self.username.clone()));
        form.push(("password".to_string(), self.password.clone()));
        form.push(("block_ad".to_string(), "1".to_string()));
        form.push(("command".to_string(), command.to_string()));
        form
    }

    fn attempt(&self, form: &[(String, String)]) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .form(form)
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}"));
        }
        Ok(body)
    }
}

impl Transport for HttpTransport {
    fn send(&self, command: &str, fields: &[(String, String)]) -> String {
        let form = self.form(command, fields);
        for attempt in 0..self.retry.attempts.max(1) {
            thread::sleep(self.retry.delay(attempt));
            match self.attempt(&form) {
                Ok(body) if is_live(&body) => {
                    debug!(command, attempt, bytes = body.len(), "response received");
                    return body;
                }
                Ok(_) => warn!(command, attempt, "response failed liveness check"),
                Err(err) => warn!(command, attempt, "request failed: {err:#}"),
            }
        }
        warn!(command, attempts = self.retry.attempts, "giving up");
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs_f64(2.75));
        assert_eq!(policy.delay(2), Duration::from_secs_f64(32.75));
    }

    #[test]
    fn liveness_is_case_insensitive() {
        assert!(is_live("</HEAD><BODY bgcolor=#EEEEEE>"));
        assert!(!is_live("<html>maintenance</html>"));
    }

    #[test]
    fn fields_are_owned_pairs() {
        let f = fields(&[("team_id", "12"), ("session", "9")]);
        assert_eq!(f[1], ("session".to_string(), "9".to_string()));
    }
}
