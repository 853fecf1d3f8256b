use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use reqwest::blocking::Client;
use tracing::warn;

use crate::http_client::http_client;

const RANDOM_PERSON_URL: &str =
    "https://en.wikipedia.org/wiki/Special:RandomInCategory/Category:Living_people";
const PREFIXES: [&str; 5] = ["Byl", "Ell", "Fel", "Kel", "Kul"];

static TITLE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>\s*([^\s<,(]+)").expect("title regex"));

/// Produces names for new fighters. An empty string means no name could be
/// produced and the caller should skip that fighter.
pub trait NameGenerator {
    fn generate(&mut self) -> String;
}

/// Prefix plus the lowercase first word of a page title, ASCII letters only.
pub fn name_from_title(prefix: &str, html: &str) -> Option<String> {
    let word = TITLE_WORD.captures(html)?.get(1)?.as_str();
    let ascii: String = word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ascii.is_empty() {
        return None;
    }
    Some(format!("{prefix}'{ascii}"))
}

pub struct WikipediaNames {
    client: &'static Client,
}

impl WikipediaNames {
    pub fn new(client: &'static Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self> {
        Ok(Self::new(http_client(timeout)?))
    }

    fn random_title_page(&self) -> Result<String> {
        self.client
            .get(RANDOM_PERSON_URL)
            .send()
            .context("wikipedia request failed")?
            .error_for_status()
            .context("wikipedia returned an error")?
            .text()
            .context("failed reading wikipedia body")
    }
}

impl NameGenerator for WikipediaNames {
    fn generate(&mut self) -> String {
        let prefix = PREFIXES[rand::thread_rng().gen_range(0..PREFIXES.len())];
        match self.random_title_page() {
            Ok(html) => name_from_title(prefix, &html).unwrap_or_default(),
            Err(err) => {
                warn!("name lookup failed: {err:#}");
                String::new()
            }
        }
    }
}
