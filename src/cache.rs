//! In-memory response cache honouring `Cache-Control: max-age`.

use reqwest::header::{HeaderMap, CACHE_CONTROL};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

/// How long a response may be reused according to its `Cache-Control`
/// header. `None` means it must not be cached.
pub fn cache_lifetime(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    let mut max_age = None;

    for directive in value.split(',').map(str::trim) {
        let lower = directive.to_ascii_lowercase();
        if lower == "no-store" || lower == "no-cache" {
            return None;
        }
        if let Some(secs) = lower.strip_prefix("max-age=") {
            max_age = secs.trim_matches('"').parse::<u64>().ok();
        }
    }

    max_age.filter(|secs| *secs > 0).map(Duration::from_secs)
}

struct Entry {
    body: Vec<u8>,
    expires_at: Instant,
}

/// Response bodies keyed by request URL.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.get_at(url, Instant::now())
    }

    pub fn insert(&self, url: &str, body: Vec<u8>, lifetime: Duration) {
        self.insert_at(url, body, lifetime, Instant::now());
    }

    fn get_at(&self, url: &str, now: Instant) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(url) {
            Some(entry) if entry.expires_at > now => {
                trace!(url, "Response cache hit");
                Some(entry.body.clone())
            }
            Some(_) => {
                entries.remove(url);
                None
            }
            None => None,
        }
    }

    fn insert_at(&self, url: &str, body: Vec<u8>, lifetime: Duration, now: Instant) {
        if let Ok(mut entries) = self.entries.lock() {
            // Window URLs rarely repeat, so expired entries are swept here
            entries.retain(|_, entry| entry.expires_at > now);
            entries.insert(
                url.to_string(),
                Entry {
                    body,
                    expires_at: now + lifetime,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
