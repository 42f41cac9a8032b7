//! NBA ingestion: NBA Stats API roster (header/rowSet tables) plus
//! per-player dashboard averages.
//!
//! Composed payload shape:
//!
//! ```json
//! {
//!   "roster": { "resultSets": [ { "name": "CommonTeamRoster",
//!                                 "headers": ["PLAYER_ID", "PLAYER", ...],
//!                                 "rowSet": [[1629630, "Ja Morant", ...]] } ] },
//!   "stats": { "<player_id>": { "PTS": 23.2, "REB": 4.1, ... } },
//!   "wearables": { "<player_id>": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::normalize::RawRecord;
use crate::providers::{default_limit, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["NBA Stats API"];

const NBA_BASE: &str = "https://stats.nba.com/stats";

/// NBA Stats team ids for the focus franchises.
fn nba_team_id(abbr: &str) -> &'static str {
    match abbr {
        "MEM" => "1610612763",
        "DAL" => "1610612742",
        "SAS" => "1610612759",
        _ => "1610612763",
    }
}

pub struct NbaAgent {
    team: String,
    fetcher: ProviderFetcher,
}

impl NbaAgent {
    pub fn new(team: &str) -> Result<Self, FetchError> {
        Ok(NbaAgent {
            team: team.to_string(),
            fetcher: ProviderFetcher::new("nba-stats", default_limit(crate::model::League::Nba))?,
        })
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// The NBA API rejects unadorned clients.
    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            ),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
        headers
    }

    pub async fn fetch_live(&mut self, _ctx: &AgentContext) -> Result<Value, FetchError> {
        let roster = self
            .fetcher
            .fetch_json(
                &format!("{NBA_BASE}/commonteamroster"),
                Some(Self::headers()),
                &[
                    ("TeamID", nba_team_id(&self.team).to_string()),
                    ("Season", "2025-26".to_string()),
                ],
            )
            .await?;

        let player_ids: Vec<String> = table(roster.body.as_ref(), "CommonTeamRoster")
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("PLAYER_ID"))
                    .filter_map(loose_id)
                    .collect()
            })
            .unwrap_or_default();

        let mut stats = serde_json::Map::new();
        for player_id in player_ids.iter().take(8) {
            let dashboard = self
                .fetcher
                .fetch_json(
                    &format!("{NBA_BASE}/playerdashboardbygeneralsplits"),
                    Some(Self::headers()),
                    &[
                        ("PlayerID", player_id.clone()),
                        ("Season", "2025-26".to_string()),
                        ("SeasonType", "Regular Season".to_string()),
                    ],
                )
                .await?;
            if let Some(rows) = table(dashboard.body.as_ref(), "OverallPlayerDashboard") {
                if let Some(first) = rows.into_iter().next() {
                    stats.insert(player_id.clone(), Value::Object(first));
                }
            }
        }

        Ok(json!({
            "roster": (*roster.body).clone(),
            "stats": Value::Object(stats),
        }))
    }
}

/// Zip a named resultSet's headers onto each row.
fn table(payload: &Value, name: &str) -> Option<Vec<serde_json::Map<String, Value>>> {
    let sets = payload.get("resultSets")?.as_array()?;
    let set = sets
        .iter()
        .find(|s| s.get("name").and_then(Value::as_str) == Some(name))
        .or_else(|| sets.first())?;
    let headers: Vec<&str> = set
        .get("headers")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let rows = set.get("rowSet")?.as_array()?;

    Some(
        rows.iter()
            .filter_map(Value::as_array)
            .map(|row| {
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.to_string(), v.clone()))
                    .collect()
            })
            .collect(),
    )
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let Some(roster_rows) = payload
        .get("roster")
        .and_then(|r| table(r, "CommonTeamRoster"))
    else {
        return Vec::new();
    };

    roster_rows
        .into_iter()
        .filter_map(|row| {
            let id = row.get("PLAYER_ID").and_then(loose_id)?;
            let mut metrics = BTreeMap::new();
            if let Some(stat) = payload.get("stats").and_then(|s| s.get(&id)) {
                for (provider_key, canonical) in [
                    ("PTS", "points_per_game"),
                    ("REB", "rebounds_per_game"),
                    ("AST", "assists_per_game"),
                    ("FG_PCT", "field_goal_pct"),
                    ("FG3_PCT", "three_point_pct"),
                    ("FT_PCT", "free_throw_pct"),
                    ("MIN", "minutes_per_game"),
                    ("GP", "games_played"),
                ] {
                    if let Some(v) = stat.get(provider_key).and_then(Value::as_f64) {
                        metrics.insert(canonical.to_string(), v);
                    }
                }
            }

            Some(RawRecord {
                provider_id: id.clone(),
                name: row.get("PLAYER").and_then(Value::as_str).map(str::to_string),
                position: row
                    .get("POSITION")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                team_code: None,
                jersey_number: row.get("NUM").and_then(Value::as_str).map(str::to_string),
                dob: row
                    .get("BIRTH_DATE")
                    .and_then(Value::as_str)
                    .and_then(parse_birth_date),
                height: row.get("HEIGHT").and_then(Value::as_str).map(str::to_string),
                weight_lb: row.get("WEIGHT").and_then(loose_f64),
                college: row.get("SCHOOL").and_then(Value::as_str).map(str::to_string),
                metrics,
                biometrics: super::mlb::wearables(payload, &id),
                external_ids: vec![("nba_id".to_string(), id)],
                ..RawRecord::default()
            })
        })
        .collect()
}

/// The roster table dates players like `AUG 10, 1999`.
fn parse_birth_date(raw: &str) -> Option<String> {
    let mut parts = raw.split_whitespace();
    let month = match parts.next()?.to_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    let day: u32 = parts.next()?.trim_end_matches(',').parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

fn loose_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn loose_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
