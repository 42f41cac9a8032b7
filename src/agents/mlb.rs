//! MLB ingestion: MLB Stats API roster + season stats, Baseball Savant
//! value metrics, optional wearable feed.
//!
//! The composed payload (live or fixture) looks like:
//!
//! ```json
//! {
//!   "roster": [ { "person": {...}, "jerseyNumber": "46", "position": {...} } ],
//!   "stats": { "<mlbam_id>": { "stats": [ { "group": {...}, "splits": [...] } ] } },
//!   "savant": { "<mlbam_id>": { "war": 2.5, "wpa": 1.8 } },
//!   "wearables": { "<mlbam_id>": { "hrv_rmssd_ms": 58.0 } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FetchError;
use crate::model::{Biometrics, InjuryStatus};
use crate::normalize::{MetersPerSecond, RawRecord};
use crate::providers::{default_limit, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["MLB Stats API", "Baseball Savant"];

const STATS_API: &str = "https://statsapi.mlb.com/api/v1";
/// Live mode pulls stats for this many roster entries per run; the full
/// roster still lands with bio fields only.
const STATS_FETCH_LIMIT: usize = 8;

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    teams: Vec<TeamEntry>,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    id: u32,
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    roster: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    person: Person,
    #[serde(rename = "jerseyNumber")]
    jersey_number: Option<String>,
    position: Option<Position>,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: i64,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    #[serde(rename = "birthDate")]
    birth_date: Option<String>,
    #[serde(rename = "birthCity")]
    birth_city: Option<String>,
    #[serde(rename = "birthStateProvince")]
    birth_state: Option<String>,
    height: Option<String>,
    weight: Option<f64>,
    #[serde(rename = "batSide")]
    bat_side: Option<CodedValue>,
}

#[derive(Debug, Deserialize)]
struct CodedValue {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Position {
    abbreviation: Option<String>,
}

pub struct MlbAgent {
    team: String,
    fetcher: ProviderFetcher,
}

impl MlbAgent {
    pub fn new(team: &str) -> Result<Self, FetchError> {
        Ok(MlbAgent {
            team: team.to_string(),
            fetcher: ProviderFetcher::new("mlb-statsapi", default_limit(crate::model::League::Mlb))?,
        })
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// Compose roster + per-player stats into the canned payload shape.
    pub async fn fetch_live(&mut self, _ctx: &AgentContext) -> Result<Value, FetchError> {
        let teams = self
            .fetcher
            .fetch_json(
                &format!("{STATS_API}/teams"),
                None,
                &[("sportId", "1".to_string())],
            )
            .await?;
        let teams: TeamsResponse = serde_json::from_value((*teams.body).clone())
            .map_err(|e| malformed(e.to_string()))?;
        let team_id = teams
            .teams
            .iter()
            .find(|t| t.abbreviation.as_deref() == Some(self.team.as_str()))
            .map(|t| t.id)
            .ok_or_else(|| malformed(format!("team {} not in /teams", self.team)))?;

        let roster = self
            .fetcher
            .fetch_json(
                &format!("{STATS_API}/teams/{team_id}/roster/Active"),
                None,
                &[],
            )
            .await?;
        let parsed: RosterResponse = serde_json::from_value((*roster.body).clone())
            .map_err(|e| malformed(e.to_string()))?;
        let roster_value = roster.body.as_ref()["roster"].clone();

        let mut stats = serde_json::Map::new();
        for entry in parsed.roster.iter().take(STATS_FETCH_LIMIT) {
            let person_id = entry.person.id;
            let response = self
                .fetcher
                .fetch_json(
                    &format!("{STATS_API}/people/{person_id}/stats"),
                    None,
                    &[
                        ("stats", "season".to_string()),
                        ("group", "hitting,pitching".to_string()),
                    ],
                )
                .await?;
            stats.insert(person_id.to_string(), (*response.body).clone());
        }

        Ok(json!({
            "roster": roster_value,
            "stats": Value::Object(stats),
        }))
    }
}

fn birthplace(city: Option<String>, state: Option<String>) -> Option<String> {
    match (city, state) {
        (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
        (Some(city), None) => Some(city),
        (None, Some(state)) => Some(state),
        (None, None) => None,
    }
}

fn malformed(reason: String) -> FetchError {
    FetchError::MalformedResponse {
        provider: "mlb-statsapi".to_string(),
        reason,
    }
}

/// Walk the composed payload into raw records, in roster order.
pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let entries: Vec<RosterEntry> = payload
        .get("roster")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    entries
        .into_iter()
        .map(|entry| {
            let id = entry.person.id.to_string();
            let mut metrics = payload
                .get("stats")
                .and_then(|s| s.get(&id))
                .map(stat_metrics)
                .unwrap_or_default();
            let mut external_ids = vec![("mlbam_id".to_string(), id.clone())];
            if let Some(savant) = payload.get("savant").and_then(|s| s.get(&id)) {
                for key in ["war", "wpa"] {
                    if let Some(v) = savant.get(key).and_then(Value::as_f64) {
                        metrics.insert(key.to_string(), v);
                    }
                }
                // Savant reports sprint speed in mph; canonical is m/s,
                // original preserved alongside the other external ids.
                if let Some(mph) = savant.get("sprint_speed_mph").and_then(Value::as_f64) {
                    metrics.insert(
                        "sprint_speed_ms".to_string(),
                        MetersPerSecond::from_mph(mph).value(),
                    );
                    external_ids.push(("sprint_speed_mph".to_string(), mph.to_string()));
                }
            }

            RawRecord {
                provider_id: id.clone(),
                name: entry.person.full_name,
                position: entry.position.and_then(|p| p.abbreviation),
                team_code: None, // agent default fills the focus team
                jersey_number: entry.jersey_number,
                dob: entry.person.birth_date,
                birthplace: birthplace(entry.person.birth_city, entry.person.birth_state),
                height: entry.person.height,
                weight_lb: entry.person.weight,
                handedness: entry.person.bat_side.and_then(|b| b.code),
                metrics,
                biometrics: wearables(payload, &id),
                injury: injury_status(payload, &id),
                external_ids,
                ..RawRecord::default()
            }
        })
        .collect()
}

/// Flatten the Stats API `stats[].splits[].stat` nesting into canonical
/// metric names. The API sends rate stats as strings.
fn stat_metrics(stats: &Value) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    let Some(groups) = stats.get("stats").and_then(Value::as_array) else {
        return out;
    };

    for group in groups {
        let Some(splits) = group.get("splits").and_then(Value::as_array) else {
            continue;
        };
        for split in splits {
            let Some(stat) = split.get("stat") else {
                continue;
            };
            for (provider_key, canonical) in [
                ("avg", "avg"),
                ("obp", "obp"),
                ("slg", "slg"),
                ("ops", "ops"),
                ("homeRuns", "hr"),
                ("rbi", "rbi"),
                ("stolenBases", "sb"),
                ("era", "era"),
                ("whip", "whip"),
                ("strikeoutsPer9Inn", "k9"),
                ("walksPer9Inn", "bb9"),
            ] {
                if let Some(v) = numeric(stat.get(provider_key)) {
                    out.insert(canonical.to_string(), v);
                }
            }
        }
    }
    out
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Injury report keyed by player id, when the feed carries one.
fn injury_status(payload: &Value, id: &str) -> Option<InjuryStatus> {
    let block = payload.get("injuries")?.get(id)?;
    let status = block.get("status")?.as_str()?.to_string();
    Some(InjuryStatus {
        current_status: status,
        since: block
            .get("since")
            .and_then(Value::as_str)
            .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        notes: block.get("notes").and_then(Value::as_str).map(str::to_string),
    })
}

pub(super) fn wearables(payload: &Value, id: &str) -> Option<Biometrics> {
    let block = payload.get("wearables")?.get(id)?;
    let get = |key: &str| block.get(key).and_then(Value::as_f64);
    let bio = Biometrics {
        hrv_rmssd_ms: get("hrv_rmssd_ms"),
        reaction_ms: get("reaction_ms"),
        gsr_microsiemens: get("gsr_microsiemens"),
        sleep_hours: get("sleep_hours"),
    };
    if bio.is_empty() {
        None
    } else {
        Some(bio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "roster": [
                {
                    "person": {
                        "id": 571448,
                        "fullName": "Nolan Arenado",
                        "birthDate": "1991-04-16",
                        "birthCity": "Newport Beach",
                        "birthStateProvince": "CA",
                        "height": "6'2\"",
                        "weight": 215,
                        "batSide": {"code": "R"}
                    },
                    "jerseyNumber": "28",
                    "position": {"abbreviation": "3B"}
                },
                {
                    "person": {"id": 669357, "fullName": "Sonny Gray", "height": "5'10\"", "weight": 195},
                    "jerseyNumber": "54",
                    "position": {"abbreviation": "P"}
                }
            ],
            "stats": {
                "571448": {
                    "stats": [
                        {"group": {"displayName": "hitting"}, "splits": [
                            {"stat": {"avg": ".272", "obp": ".325", "slg": ".455", "ops": ".780",
                                      "homeRuns": 26, "rbi": 93, "stolenBases": 2}}
                        ]}
                    ]
                },
                "669357": {
                    "stats": [
                        {"group": {"displayName": "pitching"}, "splits": [
                            {"stat": {"era": "3.84", "whip": "1.09",
                                      "strikeoutsPer9Inn": "10.85", "walksPer9Inn": "2.25"}}
                        ]}
                    ]
                }
            },
            "savant": {"571448": {"war": 2.5, "wpa": 1.8, "sprint_speed_mph": 26.8}},
            "wearables": {"571448": {"hrv_rmssd_ms": 58.0, "sleep_hours": 7.5}}
        })
    }

    #[test]
    fn test_parse_roster_order_and_fields() {
        let records = parse(&sample_payload());
        assert_eq!(records.len(), 2);

        let arenado = &records[0];
        assert_eq!(arenado.provider_id, "571448");
        assert_eq!(arenado.name.as_deref(), Some("Nolan Arenado"));
        assert_eq!(arenado.position.as_deref(), Some("3B"));
        assert_eq!(arenado.jersey_number.as_deref(), Some("28"));
        assert_eq!(arenado.dob.as_deref(), Some("1991-04-16"));
        assert_eq!(arenado.handedness.as_deref(), Some("R"));
        assert_eq!(arenado.metrics["hr"], 26.0);
        assert_eq!(arenado.metrics["avg"], 0.272);
        assert_eq!(arenado.metrics["war"], 2.5);
        // 26.8 mph -> 11.98 m/s, original preserved for meta.external_ids
        assert_eq!(arenado.metrics["sprint_speed_ms"], 11.98);
        assert!(arenado
            .external_ids
            .iter()
            .any(|(k, v)| k == "sprint_speed_mph" && v == "26.8"));
        assert!(arenado.biometrics.is_some());

        let gray = &records[1];
        assert_eq!(gray.metrics["era"], 3.84);
        assert_eq!(gray.metrics["k9"], 10.85);
        assert!(gray.biometrics.is_none());
    }

    #[test]
    fn test_parse_empty_payload() {
        assert!(parse(&json!({})).is_empty());
        assert!(parse(&json!({"roster": []})).is_empty());
    }

    #[test]
    fn test_string_rate_stats_parse() {
        assert_eq!(numeric(Some(&json!(".272"))), Some(0.272));
        assert_eq!(numeric(Some(&json!(26))), Some(26.0));
        assert_eq!(numeric(Some(&json!("n/a"))), None);
    }
}
