//! NFL ingestion: ESPN roster, SportsData.io season stats, nflverse EPA.
//!
//! Composed payload shape:
//!
//! ```json
//! {
//!   "roster": { "athletes": [ { "items": [ {espn athlete} ] } ] },
//!   "stats": [ { "PlayerID": 3043078, "RushingYards": 1921.0, ... } ],
//!   "advanced": { "<espn_id>": { "epa": 12.4 } },
//!   "wearables": { "<espn_id>": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::normalize::RawRecord;
use crate::providers::{default_limit, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["SportsData.io", "ESPN", "nflverse"];

const ESPN_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";
const SPORTSDATA_BASE: &str = "https://api.sportsdata.io/v3/nfl";

/// ESPN numeric team ids for the franchises we focus on.
fn espn_team_id(abbr: &str) -> &'static str {
    match abbr {
        "TEN" => "10",
        "HOU" => "34",
        "DAL" => "6",
        "KC" => "12",
        _ => "10",
    }
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    athletes: Vec<PositionGroup>,
}

#[derive(Debug, Deserialize)]
struct PositionGroup {
    #[serde(default)]
    items: Vec<EspnAthlete>,
}

#[derive(Debug, Deserialize)]
struct EspnAthlete {
    id: String,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    jersey: Option<String>,
    position: Option<EspnPosition>,
    /// ESPN sends height as total inches.
    height: Option<f64>,
    weight: Option<f64>,
    #[serde(rename = "dateOfBirth")]
    date_of_birth: Option<String>,
    #[serde(rename = "birthPlace")]
    birth_place: Option<EspnBirthPlace>,
    college: Option<EspnCollege>,
}

#[derive(Debug, Deserialize)]
struct EspnPosition {
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnBirthPlace {
    city: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnCollege {
    name: Option<String>,
}

/// SportsData.io PlayerSeason row, PascalCase on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SeasonStatRow {
    #[serde(rename = "PlayerID")]
    player_id: i64,
    #[serde(default)]
    rushing_yards: Option<f64>,
    #[serde(default)]
    rushing_touchdowns: Option<f64>,
    #[serde(default)]
    receiving_yards: Option<f64>,
    #[serde(default)]
    receiving_touchdowns: Option<f64>,
    #[serde(default)]
    passing_yards: Option<f64>,
    #[serde(default)]
    passing_touchdowns: Option<f64>,
    #[serde(default)]
    completion_percentage: Option<f64>,
    /// Cross-reference back to ESPN roster entries.
    #[serde(default, rename = "EspnPlayerID")]
    espn_player_id: Option<i64>,
}

pub struct NflAgent {
    team: String,
    fetcher: ProviderFetcher,
}

impl NflAgent {
    pub fn new(team: &str) -> Result<Self, FetchError> {
        Ok(NflAgent {
            team: team.to_string(),
            fetcher: ProviderFetcher::new("sportsdata-io", default_limit(crate::model::League::Nfl))?,
        })
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub async fn fetch_live(&mut self, ctx: &AgentContext) -> Result<Value, FetchError> {
        let roster = self
            .fetcher
            .fetch_json(
                &format!("{ESPN_BASE}/teams/{}/roster", espn_team_id(&self.team)),
                None,
                &[],
            )
            .await?;

        let key = ctx
            .credentials
            .sportsdata_io_key
            .clone()
            .unwrap_or_default();
        let stats = self
            .fetcher
            .fetch_json(
                &format!("{SPORTSDATA_BASE}/stats/json/PlayerSeasonStatsByTeam/2025/{}", self.team),
                None,
                &[("key", key)],
            )
            .await?;

        Ok(json!({
            "roster": (*roster.body).clone(),
            "stats": (*stats.body).clone(),
        }))
    }
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let roster: RosterResponse = payload
        .get("roster")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(RosterResponse { athletes: vec![] });

    let stat_rows: Vec<SeasonStatRow> = payload
        .get("stats")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let stats_by_espn_id: BTreeMap<String, &SeasonStatRow> = stat_rows
        .iter()
        .map(|row| {
            let key = row
                .espn_player_id
                .unwrap_or(row.player_id)
                .to_string();
            (key, row)
        })
        .collect();

    roster
        .athletes
        .into_iter()
        .flat_map(|group| group.items)
        .map(|athlete| {
            let id = athlete.id.clone();
            let mut metrics = BTreeMap::new();
            if let Some(row) = stats_by_espn_id.get(&id) {
                for (name, value) in [
                    ("rushing_yards", row.rushing_yards),
                    ("rushing_tds", row.rushing_touchdowns),
                    ("receiving_yards", row.receiving_yards),
                    ("receiving_tds", row.receiving_touchdowns),
                    ("passing_yards", row.passing_yards),
                    ("passing_tds", row.passing_touchdowns),
                    ("completion_pct", row.completion_percentage),
                ] {
                    if let Some(v) = value {
                        metrics.insert(name.to_string(), v);
                    }
                }
            }
            if let Some(adv) = payload.get("advanced").and_then(|a| a.get(&id)) {
                if let Some(epa) = adv.get("epa").and_then(Value::as_f64) {
                    metrics.insert("epa".to_string(), epa);
                }
            }

            RawRecord {
                provider_id: id.clone(),
                name: athlete.full_name,
                position: athlete.position.and_then(|p| p.abbreviation),
                team_code: None,
                jersey_number: athlete.jersey,
                dob: athlete.date_of_birth,
                birthplace: athlete.birth_place.and_then(|bp| match (bp.city, bp.state) {
                    (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
                    (Some(c), None) => Some(c),
                    (None, s) => s,
                }),
                // ESPN height is inches; route through the shared parser.
                height: athlete.height.map(|h| format!("{}", h)),
                weight_lb: athlete.weight,
                college: athlete.college.and_then(|c| c.name),
                metrics,
                biometrics: super::mlb::wearables(payload, &id),
                external_ids: vec![("espn_id".to_string(), id)],
                ..RawRecord::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "roster": {
                "athletes": [
                    {"items": [
                        {
                            "id": "3043078",
                            "fullName": "Derrick Henry",
                            "jersey": "22",
                            "position": {"abbreviation": "RB"},
                            "height": 75.0,
                            "weight": 247.0,
                            "dateOfBirth": "1994-01-04",
                            "birthPlace": {"city": "Yulee", "state": "FL"},
                            "college": {"name": "Alabama"}
                        }
                    ]},
                    {"items": [
                        {"id": "4685720", "fullName": "Backup Passer",
                         "position": {"abbreviation": "QB"}, "height": 74.0}
                    ]}
                ]
            },
            "stats": [
                {"PlayerID": 19766, "EspnPlayerID": 3043078,
                 "RushingYards": 1921.0, "RushingTouchdowns": 16.0,
                 "ReceivingYards": 214.0, "ReceivingTouchdowns": 1.0}
            ],
            "advanced": {"3043078": {"epa": 12.4}}
        })
    }

    #[test]
    fn test_parse_flattens_position_groups() {
        let records = parse(&sample_payload());
        assert_eq!(records.len(), 2);

        let henry = &records[0];
        assert_eq!(henry.provider_id, "3043078");
        assert_eq!(henry.metrics["rushing_yards"], 1921.0);
        assert_eq!(henry.metrics["epa"], 12.4);
        assert_eq!(henry.height.as_deref(), Some("75"));
        assert_eq!(henry.college.as_deref(), Some("Alabama"));

        let backup = &records[1];
        assert!(backup.metrics.is_empty());
    }

    #[test]
    fn test_parse_without_stats_section() {
        let payload = json!({"roster": {"athletes": [{"items": [
            {"id": "1", "fullName": "Solo Athlete", "position": {"abbreviation": "WR"}}
        ]}]}});
        let records = parse(&payload);
        assert_eq!(records.len(), 1);
        assert!(records[0].metrics.is_empty());
    }
}
