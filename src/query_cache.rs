use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};

/// Short-lived in-memory cache of API responses keyed by request URL.
///
/// Entries younger than `stale_after` are served without touching the network.
/// Older entries are revalidated with the stored validators. Nothing is written
/// to disk, so the cache dies with the process.
#[derive(Debug)]
pub struct QueryCache {
    stale_after: Duration,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Revalidated,
    Fetched,
}

#[derive(Debug, Clone)]
pub struct CachedBody {
    pub body: String,
    pub status: CacheStatus,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: HashMap::new(),
        }
    }

    /// Cached body for `url` if it is still inside the freshness window at `now`.
    pub fn fresh(&self, url: &str, now: Instant) -> Option<&str> {
        let entry = self.entries.get(url)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        (age < self.stale_after).then_some(entry.body.as_str())
    }

    pub fn invalidate(&mut self, url: &str) {
        self.entries.remove(url);
    }

    pub fn fetch_json(&mut self, client: &Client, url: &str) -> Result<CachedBody> {
        if let Some(body) = self.fresh(url, Instant::now()) {
            return Ok(CachedBody {
                body: body.to_string(),
                status: CacheStatus::Fresh,
            });
        }

        let cached_entry = self.entries.get(url).cloned();
        let mut req = client.get(url).header(ACCEPT, "application/json");
        if let Some(entry) = cached_entry.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req.send().context("request failed")?;
        let status = resp.status();
        let headers = resp.headers().clone();
        if status == StatusCode::NOT_MODIFIED {
            let Some(mut entry) = cached_entry else {
                return Err(anyhow!("received 304 without cache body"));
            };
            entry.fetched_at = Instant::now();
            let body = entry.body.clone();
            self.entries.insert(url.to_string(), entry);
            return Ok(CachedBody {
                body,
                status: CacheStatus::Revalidated,
            });
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, truncate(&body, 200)));
        }

        let etag = headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        self.store(url, body.clone(), etag, last_modified, Instant::now());
        Ok(CachedBody {
            body,
            status: CacheStatus::Fetched,
        })
    }

    fn store(
        &mut self,
        url: &str,
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
        fetched_at: Instant,
    ) {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                body,
                etag,
                last_modified,
                fetched_at,
            },
        );
    }
}

fn truncate(raw: &str, max_chars: usize) -> &str {
    match raw.char_indices().nth(max_chars) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
