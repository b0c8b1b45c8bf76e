use super::Response;

use std::time::Duration;

use chrono::Utc;
use http::header::{self, HeaderName, HeaderValue};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Key/value store for rendered responses.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// A stored response: status, headers and the rendered body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub output: String,
}

impl CachedResponse {
    pub(crate) fn capture(res: &dyn Response, output: &str) -> Self {
        let headers = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        Self {
            status: res.status().as_u16(),
            headers,
            output: output.to_owned(),
        }
    }

    pub(crate) fn replay(&self, res: &mut dyn Response) {
        if let Ok(status) = StatusCode::from_u16(self.status) {
            res.set_status(status);
        }

        let headers = res.headers_mut();
        let parsed: Vec<(HeaderName, HeaderValue)> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
                let value = HeaderValue::from_str(value).ok()?;
                Some((name, value))
            })
            .collect();
        for (name, _) in &parsed {
            headers.remove(name);
        }
        for (name, value) in parsed {
            headers.append(name, value);
        }
    }
}

const MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// `Cache-Control`, `Expires`, `Pragma` and `Vary` for a response cached for `ttl`.
///
/// `ttl` is capped at one year, the longest `Expires` HTTP/1.1 allows.
pub(crate) fn cache_headers(ttl: Duration) -> Vec<(HeaderName, String)> {
    let ttl = ttl.min(MAX_AGE);
    let now = Utc::now();
    let expires = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now);

    vec![
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", ttl.as_secs()),
        ),
        (
            header::EXPIRES,
            expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        ),
        (header::PRAGMA, "cache".to_owned()),
        (header::VARY, "Accept-Encoding".to_owned()),
    ]
}

pub(crate) fn apply_cache_headers(res: &mut dyn Response, ttl: Duration) {
    for (name, value) in cache_headers(ttl) {
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                res.headers_mut().insert(name, v);
            }
            Err(e) => warn!(header = %name, error = %e, "invalid cache header"),
        }
    }
}

#[cfg(feature = "memory-cache")]
pub use self::memory::MemoryCache;

#[cfg(feature = "memory-cache")]
mod memory {
    use super::Cache;

    use std::time::{Duration, Instant};

    use dashmap::DashMap;

    /// Process-local cache with per-entry expiry.
    #[derive(Debug, Default)]
    pub struct MemoryCache {
        /// `None` deadlines lie past what `Instant` can represent.
        entries: DashMap<String, (Option<Instant>, String)>,
    }

    fn alive(deadline: &Option<Instant>, now: Instant) -> bool {
        deadline.map_or(true, |d| d > now)
    }

    impl MemoryCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }

        /// Drops expired entries.
        pub fn purge(&self) {
            let now = Instant::now();
            self.entries.retain(|_, (deadline, _)| alive(deadline, now));
        }
    }

    impl Cache for MemoryCache {
        fn get(&self, key: &str) -> Option<String> {
            let now = Instant::now();
            if let Some(entry) = self.entries.get(key) {
                if alive(&entry.0, now) {
                    return Some(entry.1.clone());
                }
            }
            self.entries.remove_if(key, |_, (deadline, _)| !alive(deadline, now));
            None
        }

        fn set(&self, key: &str, value: String, ttl: Duration) {
            let deadline = Instant::now().checked_add(ttl);
            self.entries.insert(key.to_owned(), (deadline, value));
        }
    }
}
