//! NCAA football ingestion: CollegeFootballData roster, pivoted season
//! stats, and recruiting rankings; NIL attributes when the feed has them.
//!
//! Composed payload shape:
//!
//! ```json
//! {
//!   "roster": [ { "id": 4685720, "first_name": "Arch", ... } ],
//!   "stats": [ { "playerId": 4685720, "category": "passing", "statType": "YDS", "stat": "3200" } ],
//!   "recruiting": [ { "athleteId": 4685720, "stars": 5, "ranking": 4, "positionRanking": 1 } ],
//!   "nil": { "<id>": { "valuation_usd": 6500000.0, ... } },
//!   "wearables": { "<id>": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::model::{NilProfile, Recruiting};
use crate::normalize::RawRecord;
use crate::providers::{default_limit, Credentials, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["CollegeFootballData", "On3 NIL"];

const CFBD_BASE: &str = "https://api.collegefootballdata.com";

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: Value,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    jersey: Option<Value>,
    height: Option<f64>,
    weight: Option<f64>,
    home_city: Option<String>,
    home_state: Option<String>,
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatRow {
    #[serde(rename = "playerId")]
    player_id: Value,
    category: String,
    #[serde(rename = "statType")]
    stat_type: String,
    stat: Value,
}

#[derive(Debug, Deserialize)]
struct RecruitRow {
    #[serde(rename = "athleteId")]
    athlete_id: Value,
    stars: Option<u8>,
    ranking: Option<u32>,
    #[serde(rename = "positionRanking")]
    position_ranking: Option<u32>,
}

pub struct NcaaAgent {
    school: String,
    fetcher: ProviderFetcher,
    bearer: Option<String>,
}

impl NcaaAgent {
    pub fn new(school: &str, credentials: &Credentials) -> Result<Self, FetchError> {
        Ok(NcaaAgent {
            school: school.to_string(),
            fetcher: ProviderFetcher::new("cfbd", default_limit(crate::model::League::Ncaa))?,
            bearer: credentials.cfbd_api_key.clone(),
        })
    }

    fn headers(&self) -> Result<Option<HeaderMap>, FetchError> {
        let Some(token) = &self.bearer else {
            return Ok(None);
        };
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            FetchError::MalformedResponse {
                provider: "cfbd".to_string(),
                reason: "credential is not a valid header value".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(Some(headers))
    }

    pub async fn fetch_live(&mut self, _ctx: &AgentContext) -> Result<Value, FetchError> {
        let headers = self.headers()?;
        let roster = self
            .fetcher
            .fetch_json(
                &format!("{CFBD_BASE}/roster"),
                headers.clone(),
                &[("team", self.school.clone()), ("year", "2025".to_string())],
            )
            .await?;
        let stats = self
            .fetcher
            .fetch_json(
                &format!("{CFBD_BASE}/stats/player/season"),
                headers.clone(),
                &[("team", self.school.clone()), ("year", "2025".to_string())],
            )
            .await?;
        let recruiting = self
            .fetcher
            .fetch_json(
                &format!("{CFBD_BASE}/recruiting/players"),
                headers,
                &[("team", self.school.clone()), ("year", "2025".to_string())],
            )
            .await?;

        Ok(json!({
            "roster": (*roster.body).clone(),
            "stats": (*stats.body).clone(),
            "recruiting": (*recruiting.body).clone(),
        }))
    }
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let roster: Vec<RosterRow> = payload
        .get("roster")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let stats: Vec<StatRow> = payload
        .get("stats")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let recruits: Vec<RecruitRow> = payload
        .get("recruiting")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let mut metrics_by_id: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for row in &stats {
        let Some(name) = canonical_stat(&row.category, &row.stat_type) else {
            continue;
        };
        let Some(value) = loose_f64(&row.stat) else {
            continue;
        };
        metrics_by_id
            .entry(id_string(&row.player_id))
            .or_default()
            .insert(name.to_string(), value);
    }

    let recruiting_by_id: BTreeMap<String, Recruiting> = recruits
        .iter()
        .map(|r| {
            (
                id_string(&r.athlete_id),
                Recruiting {
                    stars: r.stars,
                    national_rank: r.ranking,
                    position_rank: r.position_ranking,
                },
            )
        })
        .collect();

    roster
        .into_iter()
        .map(|row| {
            let id = id_string(&row.id);
            let name = match (&row.first_name, &row.last_name) {
                (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
                (Some(f), None) => Some(f.clone()),
                (None, Some(l)) => Some(l.clone()),
                (None, None) => None,
            };

            RawRecord {
                provider_id: id.clone(),
                name,
                position: row.position,
                team_code: None,
                jersey_number: row.jersey.as_ref().map(jersey_string),
                birthplace: match (row.home_city, row.home_state) {
                    (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
                    (Some(c), None) => Some(c),
                    (None, s) => s,
                },
                height: row.height.map(|h| format!("{}", h)),
                weight_lb: row.weight,
                class_year: row.year.map(class_year_label),
                metrics: metrics_by_id.remove(&id).unwrap_or_default(),
                nil_profile: nil_profile(payload, &id),
                biometrics: super::mlb::wearables(payload, &id),
                recruiting: recruiting_by_id.get(&id).cloned(),
                external_ids: vec![("cfbd_id".to_string(), id)],
                ..RawRecord::default()
            }
        })
        .collect()
}

/// CFBD pivots stats into (category, statType) rows.
fn canonical_stat(category: &str, stat_type: &str) -> Option<&'static str> {
    match (category, stat_type) {
        ("passing", "YDS") => Some("passing_yards"),
        ("passing", "TD") => Some("passing_tds"),
        ("passing", "PCT") => Some("completion_pct"),
        ("passing", "QBR") => Some("passer_rating"),
        ("rushing", "YDS") => Some("rushing_yards"),
        ("rushing", "TD") => Some("rushing_tds"),
        ("receiving", "YDS") => Some("receiving_yards"),
        ("receiving", "TD") => Some("receiving_tds"),
        _ => None,
    }
}

pub(super) fn nil_profile(payload: &Value, id: &str) -> Option<NilProfile> {
    let block = payload.get("nil")?.get(id)?;
    let get = |key: &str| block.get(key).and_then(Value::as_f64);
    let profile = NilProfile {
        valuation_usd: get("valuation_usd"),
        engagement_rate: get("engagement_rate"),
        followers_total: block.get("followers_total").and_then(Value::as_u64),
        deals_last_90d: block
            .get("deals_last_90d")
            .and_then(Value::as_u64)
            .map(|v| v as u32),
        deal_value_90d_usd: get("deal_value_90d_usd"),
        search_index: get("search_index"),
        local_popularity_index: get("local_popularity_index"),
    };
    if profile.is_empty() {
        None
    } else {
        Some(profile)
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn jersey_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn loose_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn class_year_label(year: u32) -> String {
    match year {
        1 => "FR".to_string(),
        2 => "SO".to_string(),
        3 => "JR".to_string(),
        4 => "SR".to_string(),
        other => format!("Y{}", other),
    }
}
