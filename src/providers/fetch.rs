//! Rate-limited HTTP fetcher with retry and backoff.
//!
//! One instance per agent. Successful responses are kept in a small
//! in-run LRU so repeated lookups (team tables, shared rosters) do not
//! burn provider quota.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FetchError;

use super::rate_limit::{RateLimitConfig, RateLimiter};

/// Exponential backoff base; attempts sleep `base * 2^attempt`.
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Total attempts including the first.
const MAX_ATTEMPTS: u32 = 3;
/// Per-request deadline; cancellation lets an in-flight call run this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const RESPONSE_CACHE_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub body: Arc<Value>,
    pub latency: Duration,
    pub from_cache: bool,
}

pub struct ProviderFetcher {
    provider: String,
    client: Client,
    limiter: RateLimiter,
    responses: LruCache<String, Arc<Value>>,
}

impl ProviderFetcher {
    pub fn new(provider: impl Into<String>, limit: RateLimitConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent("fieldhouse-ingest")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(ProviderFetcher {
            provider: provider.into(),
            client,
            limiter: RateLimiter::new(limit),
            responses: LruCache::new(
                NonZeroUsize::new(RESPONSE_CACHE_SIZE).expect("nonzero cache size"),
            ),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// GET `url` as JSON, honoring the provider quota and retrying 429s
    /// and transport errors with exponential backoff.
    pub async fn fetch_json(
        &mut self,
        url: &str,
        headers: Option<HeaderMap>,
        query: &[(&str, String)],
    ) -> Result<FetchedPayload, FetchError> {
        let cache_key = cache_key(url, query);
        if let Some(body) = self.responses.get(&cache_key) {
            debug!(provider = %self.provider, %url, "response cache hit");
            return Ok(FetchedPayload {
                body: Arc::clone(body),
                latency: Duration::ZERO,
                from_cache: true,
            });
        }

        let mut last_rate_limited = false;
        let mut last_timeout = false;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                warn!(
                    provider = %self.provider,
                    attempt,
                    ?backoff,
                    "retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
            }

            self.limiter.acquire().await;

            let started = tokio::time::Instant::now();
            let mut request = self.client.get(url).query(query);
            if let Some(h) = &headers {
                request = request.headers(h.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_rate_limited = true;
                        last_timeout = false;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(FetchError::ProviderRejected {
                            status: status.as_u16(),
                        });
                    }

                    let latency = started.elapsed();
                    let body: Value = response.json().await.map_err(|e| {
                        FetchError::MalformedResponse {
                            provider: self.provider.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    let body = Arc::new(body);
                    self.responses.put(cache_key, Arc::clone(&body));
                    debug!(provider = %self.provider, %url, ?latency, "fetch ok");
                    return Ok(FetchedPayload {
                        body,
                        latency,
                        from_cache: false,
                    });
                }
                Err(err) => {
                    last_rate_limited = false;
                    last_timeout = err.is_timeout();
                    warn!(provider = %self.provider, %url, error = %err, "transport error");
                    if attempt + 1 == MAX_ATTEMPTS {
                        if last_timeout {
                            return Err(FetchError::TimedOut {
                                url: url.to_string(),
                            });
                        }
                        return Err(FetchError::Transport(err));
                    }
                }
            }
        }

        // transport errors return inside the loop; only 429 exhaustion
        // falls through
        debug_assert!(last_rate_limited && !last_timeout);
        Err(FetchError::RateLimited {
            provider: self.provider.clone(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

fn cache_key(url: &str, query: &[(&str, String)]) -> String {
    let mut key = url.to_string();
    for (name, value) in query {
        key.push('&');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}
