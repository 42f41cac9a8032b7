//! NIL valuation board ingestion (On3-style rankings).
//!
//! Payload shape:
//!
//! ```json
//! {
//!   "rankings": [
//!     { "athlete_id": "on3-88412", "name": "Arch Manning", "school": "Texas",
//!       "sport": "Football", "position": "QB", "valuation_usd": 6500000.0,
//!       "engagement_rate": 0.067, "followers_total": 450000,
//!       "deals_last_90d": 8, "deal_value_90d_usd": 285000.0,
//!       "search_index": 95.2, "local_popularity_index": 98.5 }
//!   ]
//! }
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::model::NilProfile;
use crate::normalize::RawRecord;
use crate::providers::{default_limit, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["On3 NIL", "Opendorse"];

const ON3_BASE: &str = "https://api.on3.com/v1";

#[derive(Debug, Deserialize)]
struct Rankings {
    #[serde(default)]
    rankings: Vec<RankingRow>,
}

#[derive(Debug, Deserialize)]
struct RankingRow {
    athlete_id: Option<String>,
    name: Option<String>,
    school: Option<String>,
    sport: Option<String>,
    position: Option<String>,
    class_year: Option<String>,
    valuation_usd: Option<f64>,
    engagement_rate: Option<f64>,
    followers_total: Option<u64>,
    deals_last_90d: Option<u32>,
    deal_value_90d_usd: Option<f64>,
    search_index: Option<f64>,
    local_popularity_index: Option<f64>,
}

/// School names as the NIL board spells them, mapped to team codes.
fn school_code(school: &str) -> Option<&'static str> {
    match school {
        "Texas" => Some("TEX"),
        "Alabama" => Some("ALA"),
        "Oklahoma" => Some("OU"),
        "Texas A&M" => Some("TAMU"),
        "LSU" => Some("LSU"),
        _ => None,
    }
}

pub struct NilAgent {
    fetcher: ProviderFetcher,
}

impl NilAgent {
    pub fn new() -> Result<Self, FetchError> {
        Ok(NilAgent {
            fetcher: ProviderFetcher::new("on3-nil", default_limit(crate::model::League::Nil))?,
        })
    }

    pub async fn fetch_live(&mut self, ctx: &AgentContext) -> Result<Value, FetchError> {
        let key = ctx.credentials.on3_api_key.clone().unwrap_or_default();
        let rankings = self
            .fetcher
            .fetch_json(
                &format!("{ON3_BASE}/nil/rankings"),
                None,
                &[("sport", "football".to_string()), ("key", key)],
            )
            .await?;
        Ok(json!({
            "rankings": rankings.body.as_ref().get("rankings").cloned().unwrap_or_default()
        }))
    }
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let rankings: Rankings =
        serde_json::from_value(payload.clone()).unwrap_or(Rankings { rankings: vec![] });

    rankings
        .rankings
        .into_iter()
        .map(|row| {
            let id = row.athlete_id.unwrap_or_default();
            let profile = NilProfile {
                valuation_usd: row.valuation_usd,
                engagement_rate: row.engagement_rate,
                followers_total: row.followers_total,
                deals_last_90d: row.deals_last_90d,
                deal_value_90d_usd: row.deal_value_90d_usd,
                search_index: row.search_index,
                local_popularity_index: row.local_popularity_index,
            };

            RawRecord {
                provider_id: id.clone(),
                name: row.name,
                position: row.position,
                team_code: row.school.as_deref().and_then(school_code).map(str::to_string),
                sport_hint: row.sport,
                class_year: row.class_year,
                nil_profile: if profile.is_empty() { None } else { Some(profile) },
                external_ids: vec![("on3_id".to_string(), id)],
                ..RawRecord::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rankings() {
        let payload = json!({
            "rankings": [
                {"athlete_id": "on3-88412", "name": "Arch Manning", "school": "Texas",
                 "sport": "Football", "position": "QB", "valuation_usd": 6500000.0,
                 "engagement_rate": 0.067, "followers_total": 450000,
                 "deals_last_90d": 8, "deal_value_90d_usd": 285000.0,
                 "search_index": 95.2, "local_popularity_index": 98.5},
                {"athlete_id": "on3-91002", "name": "Hoops Star", "school": "Kentucky",
                 "sport": "Basketball", "position": "PG", "valuation_usd": 900000.0}
            ]
        });

        let records = parse(&payload);
        assert_eq!(records.len(), 2);

        let manning = &records[0];
        assert_eq!(manning.team_code.as_deref(), Some("TEX"));
        let profile = manning.nil_profile.as_ref().unwrap();
        assert_eq!(profile.engagement_rate, Some(0.067));
        assert_eq!(profile.deals_last_90d, Some(8));

        // unknown school leaves no team; basketball hint mismatches the
        // football board and is dropped by the normalizer
        assert!(records[1].team_code.is_none());
        assert_eq!(records[1].sport_hint.as_deref(), Some("Basketball"));
    }
}
