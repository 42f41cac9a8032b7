//! Texas high-school football ingestion via the Perfect Game feed.
//!
//! The feed is already flat:
//!
//! ```json
//! {
//!   "players": [
//!     { "pg_id": "PG-2026-0117", "name": "...", "team": "DUNCANVILLE",
//!       "position": "RB", "class_year": "2026", "height": "5'11\"",
//!       "weight_lb": 195.0, "stats": { "rushing_yards": 1800.0 },
//!       "recruiting": { "stars": 4 }, "wearables": { ... } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::model::Recruiting;
use crate::normalize::RawRecord;
use crate::providers::{default_limit, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["Perfect Game", "Texas HS Football"];

const PG_BASE: &str = "https://api.perfectgame.org/v1";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    players: Vec<FeedPlayer>,
}

#[derive(Debug, Deserialize)]
struct FeedPlayer {
    pg_id: Option<String>,
    name: Option<String>,
    team: Option<String>,
    position: Option<String>,
    class_year: Option<String>,
    dob: Option<String>,
    height: Option<String>,
    weight_lb: Option<f64>,
    #[serde(default)]
    stats: BTreeMap<String, f64>,
    recruiting: Option<FeedRecruiting>,
}

#[derive(Debug, Deserialize)]
struct FeedRecruiting {
    stars: Option<u8>,
    national_rank: Option<u32>,
    position_rank: Option<u32>,
}

pub struct HsAgent {
    fetcher: ProviderFetcher,
}

impl HsAgent {
    pub fn new() -> Result<Self, FetchError> {
        Ok(HsAgent {
            fetcher: ProviderFetcher::new("perfect-game", default_limit(crate::model::League::Hs))?,
        })
    }

    pub async fn fetch_live(&mut self, ctx: &AgentContext) -> Result<Value, FetchError> {
        let key = ctx
            .credentials
            .perfect_game_api_key
            .clone()
            .unwrap_or_default();
        let feed = self
            .fetcher
            .fetch_json(
                &format!("{PG_BASE}/players/football"),
                None,
                &[("state", "TX".to_string()), ("key", key)],
            )
            .await?;
        Ok(json!({ "players": feed.body.as_ref().get("players").cloned().unwrap_or_default() }))
    }
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let feed: Feed = serde_json::from_value(payload.clone()).unwrap_or(Feed { players: vec![] });

    feed.players
        .into_iter()
        .map(|player| {
            let id = player.pg_id.unwrap_or_default();
            RawRecord {
                provider_id: id.clone(),
                name: player.name,
                position: player.position,
                team_code: player.team,
                class_year: player.class_year,
                dob: player.dob,
                height: player.height,
                weight_lb: player.weight_lb,
                metrics: player.stats,
                biometrics: super::mlb::wearables(payload, &id),
                recruiting: player.recruiting.map(|r| Recruiting {
                    stars: r.stars,
                    national_rank: r.national_rank,
                    position_rank: r.position_rank,
                }),
                external_ids: vec![("pg_id".to_string(), id)],
                ..RawRecord::default()
            }
        })
        .collect()
}
