//! Outbound provider plumbing: rate limiting, HTTP fetch with retry,
//! fixture payloads, the live-payload replay cache, and credentials.
//!
//! Agents own one fetcher each; rate-limit windows live inside the
//! fetcher for the duration of the process and are never shared.

pub mod cache;
pub mod credentials;
pub mod fetch;
pub mod fixtures;
pub mod rate_limit;

pub use cache::PayloadCache;
pub use credentials::Credentials;
pub use fetch::{FetchedPayload, ProviderFetcher};
pub use fixtures::FixtureStore;
pub use rate_limit::{RateLimitConfig, RateLimiter};

use crate::model::League;

/// Per-provider quota defaults, matching each provider's published or
/// observed tolerance.
pub fn default_limit(league: League) -> RateLimitConfig {
    use std::time::Duration;
    let (calls, period) = match league {
        League::Mlb => (30, 60),
        League::Nfl => (60, 60),
        League::Ncaa => (120, 60),
        League::Nba => (60, 60),
        League::Hs => (30, 60),
        League::Nil => (10, 60),
        League::Intl => (20, 60),
    };
    RateLimitConfig {
        calls,
        period: Duration::from_secs(period),
    }
}
