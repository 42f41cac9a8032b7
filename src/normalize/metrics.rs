//! Sport-namespaced metric selection.
//!
//! Providers attach every stat they know; the canonical record keeps the
//! sport's whitelisted box-score metrics plus the value metrics the
//! scoring engine reads (WAR/WPA, EPA, total yards/TDs).

use std::collections::BTreeMap;

use crate::model::Sport;

const MLB_HITTING: &[&str] = &[
    "avg",
    "obp",
    "slg",
    "ops",
    "hr",
    "rbi",
    "sb",
    "war",
    "wpa",
    "sprint_speed_ms",
];
const MLB_PITCHING: &[&str] = &["era", "whip", "k9", "bb9", "war", "wpa"];
const NFL_SKILL: &[&str] = &[
    "rushing_yards",
    "rushing_tds",
    "receiving_yards",
    "receiving_tds",
    "passing_yards",
    "passing_tds",
    "completion_pct",
    "epa",
    "total_yards",
    "total_tds",
];
const NCAA_FB: &[&str] = &[
    "rushing_yards",
    "rushing_tds",
    "receiving_yards",
    "receiving_tds",
    "passing_yards",
    "passing_tds",
    "completion_pct",
    "passer_rating",
    "total_yards",
    "total_tds",
];
const NBA: &[&str] = &[
    "points_per_game",
    "rebounds_per_game",
    "assists_per_game",
    "field_goal_pct",
    "three_point_pct",
    "free_throw_pct",
    "minutes_per_game",
    "games_played",
];

/// Select and, for football, derive the canonical metric set.
pub fn select_metrics(
    sport: Sport,
    position: &str,
    raw: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let whitelist = match sport {
        Sport::Baseball | Sport::IntlBaseball => {
            if is_pitcher(position) {
                MLB_PITCHING
            } else {
                MLB_HITTING
            }
        }
        Sport::Nfl => NFL_SKILL,
        Sport::NcaaFootball | Sport::HsFootball => NCAA_FB,
        Sport::Basketball => NBA,
    };

    let mut selected: BTreeMap<String, f64> = raw
        .iter()
        .filter(|(name, _)| whitelist.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), *value))
        .collect();

    if matches!(sport, Sport::Nfl | Sport::NcaaFootball | Sport::HsFootball) {
        derive_football_totals(&mut selected, raw);
    }

    selected
}

fn is_pitcher(position: &str) -> bool {
    matches!(position.to_uppercase().as_str(), "P" | "SP" | "RP" | "CP" | "LHP" | "RHP")
}

/// `total_yards` / `total_tds` feed the football readiness formula;
/// derive them from the component stats when the provider doesn't send
/// totals directly.
fn derive_football_totals(selected: &mut BTreeMap<String, f64>, raw: &BTreeMap<String, f64>) {
    if !selected.contains_key("total_yards") {
        let yards: f64 = ["rushing_yards", "receiving_yards", "passing_yards"]
            .iter()
            .filter_map(|k| raw.get(*k))
            .sum();
        if yards > 0.0 {
            selected.insert("total_yards".to_string(), yards);
        }
    }
    if !selected.contains_key("total_tds") {
        let tds: f64 = ["rushing_tds", "receiving_tds", "passing_tds"]
            .iter()
            .filter_map(|k| raw.get(*k))
            .sum();
        if tds > 0.0 {
            selected.insert("total_tds".to_string(), tds);
        }
    }
}

/// Loose match between a provider's sport label and the league's sport.
pub fn sport_matches_hint(sport: Sport, hint: &str) -> bool {
    let hint = hint.to_lowercase();
    match sport {
        Sport::Baseball | Sport::IntlBaseball => hint.contains("baseball") || hint == "mlb",
        Sport::Nfl | Sport::NcaaFootball | Sport::HsFootball => {
            hint.contains("football") || hint == "nfl"
        }
        Sport::Basketball => hint.contains("basketball") || hint == "nba",
    }
}
