//! International baseball ingestion (KBO/NPB) via TheSportsDB search.
//!
//! Payload shape (TheSportsDB `searchplayers.php`, one block per team):
//!
//! ```json
//! {
//!   "teams": {
//!     "Kia Tigers": { "player": [ { "idPlayer": "34145937", "strPlayer": "...",
//!                                   "strTeam": "Kia Tigers", "strSport": "Baseball",
//!                                   "strPosition": "Third Base", "dateBorn": "2003-10-02",
//!                                   "strHeight": "1.83 m", "strWeight": "85 kg" } ] }
//!   }
//! }
//! ```

use serde_json::{json, Map, Value};

use crate::error::FetchError;
use crate::normalize::RawRecord;
use crate::providers::{default_limit, Credentials, ProviderFetcher};

use super::AgentContext;

pub const SOURCES: &[&str] = &["TheSportsDB"];

/// KBO clubs polled per run; capped to keep free-tier quota sane.
const KBO_TEAMS: &[&str] = &["Kia Tigers", "Samsung Lions", "LG Twins"];
const NPB_TEAMS: &[&str] = &["Yomiuri Giants", "Hanshin Tigers", "Fukuoka SoftBank Hawks"];

pub struct IntlAgent {
    circuit: String,
    fetcher: ProviderFetcher,
    api_key: Option<String>,
}

impl IntlAgent {
    pub fn new(circuit: &str, credentials: &Credentials) -> Result<Self, FetchError> {
        Ok(IntlAgent {
            circuit: circuit.to_string(),
            fetcher: ProviderFetcher::new("thesportsdb", default_limit(crate::model::League::Intl))?,
            api_key: credentials.thesportsdb_api_key.clone(),
        })
    }

    fn base_url(&self) -> String {
        // Keyless callers ride the free tier.
        let key = self.api_key.as_deref().unwrap_or("3");
        format!("https://www.thesportsdb.com/api/v1/json/{key}")
    }

    pub async fn fetch_live(&mut self, _ctx: &AgentContext) -> Result<Value, FetchError> {
        let clubs = if self.circuit.eq_ignore_ascii_case("npb") {
            NPB_TEAMS
        } else {
            KBO_TEAMS
        };

        let mut teams = Map::new();
        for club in clubs {
            let response = self
                .fetcher
                .fetch_json(
                    &format!("{}/searchplayers.php", self.base_url()),
                    None,
                    &[("t", club.to_string())],
                )
                .await?;
            teams.insert(club.to_string(), (*response.body).clone());
        }

        Ok(json!({ "teams": Value::Object(teams) }))
    }
}

pub fn parse(payload: &Value) -> Vec<RawRecord> {
    let Some(teams) = payload.get("teams").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for (club, block) in teams {
        let Some(players) = block.get("player").and_then(Value::as_array) else {
            continue;
        };
        for player in players {
            let id = player
                .get("idPlayer")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            records.push(RawRecord {
                provider_id: id.clone(),
                name: str_field(player, "strPlayer"),
                position: str_field(player, "strPosition"),
                team_code: Some(club_code(
                    str_field(player, "strTeam").as_deref().unwrap_or(club),
                )),
                sport_hint: str_field(player, "strSport"),
                dob: str_field(player, "dateBorn"),
                birthplace: str_field(player, "strNationality"),
                height_cm: metric_height_cm(str_field(player, "strHeight").as_deref()),
                weight_kg: metric_weight_kg(str_field(player, "strWeight").as_deref()),
                external_ids: vec![("thesportsdb_id".to_string(), id)],
                ..RawRecord::default()
            });
        }
    }
    records
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// TheSportsDB heights come as `1.83 m` (sometimes with an imperial
/// prefix); weights as `85 kg`.
fn metric_height_cm(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let metric = raw
        .split('(')
        .find(|part| part.contains('m'))
        .unwrap_or(raw)
        .trim_end_matches(')')
        .trim();
    let number: f64 = metric
        .trim_end_matches("cm")
        .trim_end_matches('m')
        .trim()
        .parse()
        .ok()?;
    if number < 3.0 {
        Some((number * 100.0 * 10.0).round() / 10.0)
    } else {
        Some(number)
    }
}

fn metric_weight_kg(raw: Option<&str>) -> Option<f64> {
    raw?.trim_end_matches("kg").trim().parse().ok()
}

/// Club nicknames collapse into short team codes (`Kia Tigers` -> `KIA`).
fn club_code(club: &str) -> String {
    let known = match club {
        "Kia Tigers" => Some("KIA"),
        "Samsung Lions" => Some("SAM"),
        "LG Twins" => Some("LG"),
        "Doosan Bears" => Some("DOO"),
        "Yomiuri Giants" => Some("YOM"),
        "Hanshin Tigers" => Some("HAN"),
        "Fukuoka SoftBank Hawks" => Some("SFT"),
        _ => None,
    };
    match known {
        Some(code) => code.to_string(),
        None => club
            .split_whitespace()
            .next()
            .unwrap_or(club)
            .to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_blocks() {
        let payload = json!({
            "teams": {
                "Kia Tigers": {
                    "player": [
                        {"idPlayer": "34145937", "strPlayer": "Kim Do-yeong",
                         "strTeam": "Kia Tigers", "strSport": "Baseball",
                         "strPosition": "Third Base", "dateBorn": "2003-10-02",
                         "strHeight": "1.83 m", "strWeight": "85 kg",
                         "strNationality": "South Korea"},
                        {"idPlayer": "34145999", "strPlayer": "Crossover Import",
                         "strTeam": "Kia Tigers", "strSport": "Soccer",
                         "strPosition": "Goalkeeper"}
                    ]
                }
            }
        });

        let records = parse(&payload);
        assert_eq!(records.len(), 2);

        let kim = records.iter().find(|r| r.provider_id == "34145937").unwrap();
        assert_eq!(kim.team_code.as_deref(), Some("KIA"));
        assert_eq!(kim.height_cm, Some(183.0));
        assert_eq!(kim.weight_kg, Some(85.0));
        assert_eq!(kim.sport_hint.as_deref(), Some("Baseball"));

        // wrong-sport rows survive parse and die in the normalizer
        let import = records.iter().find(|r| r.provider_id == "34145999").unwrap();
        assert_eq!(import.sport_hint.as_deref(), Some("Soccer"));
    }

    #[test]
    fn test_height_formats() {
        assert_eq!(metric_height_cm(Some("1.83 m")), Some(183.0));
        assert_eq!(metric_height_cm(Some("183 cm")), Some(183.0));
        assert_eq!(metric_height_cm(Some("6 ft 0 in (1.83 m)")), Some(183.0));
        assert_eq!(metric_height_cm(Some("")), None);
    }

    #[test]
    fn test_club_codes() {
        assert_eq!(club_code("Kia Tigers"), "KIA");
        assert_eq!(club_code("Lotte Giants"), "LOTTE");
    }
}
