//! Blocking HTTP fetch with a fixed retry budget, behind a seam the
//! collectors (and their tests) can substitute.

use std::thread;
use std::time::{Duration, Instant};

use scraper::Html;
use tracing::warn;

use crate::error::ScrapeError;
use crate::settings::Settings;

/// A definitive failure is only reported after this many attempts.
const MAX_ATTEMPTS: u32 = 20;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fetch collaborator contract: given a URL, a parsed document (or JSON
/// body) comes back, or a definitive failure once the retry budget is
/// spent. Collectors treat exhaustion as "skip this identifier".
pub trait Fetch {
    fn get_html(&mut self, url: &str) -> Result<Html, ScrapeError>;
    fn get_json(&mut self, url: &str) -> Result<serde_json::Value, ScrapeError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(HttpFetcher { client })
    }

    fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_get(url) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(url, attempt, error = %e, "fetch failed, retrying");
                    if attempt < MAX_ATTEMPTS {
                        thread::sleep(RETRY_DELAY);
                    }
                }
            }
        }
        Err(ScrapeError::FetchExhausted {
            url: url.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    fn try_get(&self, url: &str) -> reqwest::Result<String> {
        self.client.get(url).send()?.error_for_status()?.text()
    }
}

impl Fetch for HttpFetcher {
    fn get_html(&mut self, url: &str) -> Result<Html, ScrapeError> {
        self.get_text(url).map(|body| Html::parse_document(&body))
    }

    fn get_json(&mut self, url: &str) -> Result<serde_json::Value, ScrapeError> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body).map_err(|_| ScrapeError::malformed("response body", url))
    }
}

/// Enforces a source's mandatory minimum interval between request starts —
/// a rate-limit courtesy the upstream portals ask for, not an optimization.
/// The sleep is the interval minus whatever processing time already passed.
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            last: None,
        }
    }

    /// Block until at least the interval has passed since the previous call.
    pub fn pace(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pace_never_sleeps() {
        let mut pacer = Pacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.pace();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn pace_enforces_interval() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let start = Instant::now();
        pacer.pace();
        pacer.pace();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
