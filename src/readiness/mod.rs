//! Readiness aggregator: team and league rollups over scored
//! athletes, plus the focus-team board surfaced to clients.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{Athlete, TeamId};
use crate::teams;

/// Composite assumed for athletes whose HAV-F is the absent sentinel, so
/// sparse rosters are not punished below the caution threshold.
const ABSENT_COMPOSITE: f64 = 50.0;
/// Composite at or above which an athlete counts as a star.
const STAR_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    Ready,
    Monitor,
    Caution,
}

impl ReadinessStatus {
    /// Banding: ready >= 75, monitor >= 50, caution below.
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            ReadinessStatus::Ready
        } else if score >= 50.0 {
            ReadinessStatus::Monitor
        } else {
            ReadinessStatus::Caution
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamReadiness {
    pub team_id: TeamId,
    pub league: String,
    pub readiness_score: f64,
    pub status: ReadinessStatus,
    pub players_count: usize,
    pub stars_count: usize,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeagueReadiness {
    pub teams: Vec<TeamReadiness>,
    #[serde(rename = "averageReadiness")]
    pub average_readiness: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessBoard {
    pub generated_at: DateTime<Utc>,
    pub sports: BTreeMap<String, LeagueReadiness>,
    /// Focus teams in their declared order, regardless of score.
    pub featured: Vec<TeamReadiness>,
}

/// Roll one league's athletes up into per-team readiness records.
pub fn league_rollup(
    league_key: &str,
    athletes: &[Athlete],
    now: DateTime<Utc>,
) -> Vec<TeamReadiness> {
    let mut rosters: BTreeMap<TeamId, Vec<&Athlete>> = BTreeMap::new();
    for athlete in athletes {
        rosters.entry(athlete.team_id.clone()).or_default().push(athlete);
    }

    let mut teams: Vec<TeamReadiness> = rosters
        .into_par_iter()
        .map(|(team_id, roster)| team_rollup(league_key, team_id, &roster, now))
        .collect();

    teams.sort_by(|a, b| {
        b.readiness_score
            .partial_cmp(&a.readiness_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    teams
}

fn team_rollup(
    league_key: &str,
    team_id: TeamId,
    roster: &[&Athlete],
    now: DateTime<Utc>,
) -> TeamReadiness {
    let composite_sum: f64 = roster
        .iter()
        .map(|a| {
            a.hav_f
                .composite_score
                .map(|s| s.value())
                .unwrap_or(ABSENT_COMPOSITE)
        })
        .sum();
    let average = composite_sum / roster.len() as f64;

    // Fold in last season's results when the franchise is known.
    let adjusted = match teams::franchise(team_id.as_str()) {
        Some(franchise) => {
            let form = 50.0 + 40.0 * (franchise.season_record().win_pct - 0.5);
            (average + form) / 2.0
        }
        None => average,
    };
    let score = round1(adjusted);

    let stars = roster
        .iter()
        .filter(|a| {
            a.hav_f
                .composite_score
                .is_some_and(|s| s.value() >= STAR_THRESHOLD)
        })
        .count();

    TeamReadiness {
        team_id,
        league: league_key.to_uppercase(),
        readiness_score: score,
        status: ReadinessStatus::from_score(score),
        players_count: roster.len(),
        stars_count: stars,
        computed_at: now,
    }
}

/// Build the full board from per-league athlete sets.
///
/// `leagues` maps the league key (file stem) to that league's scored
/// athletes; `focus` is the declared priority team list.
pub fn compute_board(
    leagues: &[(String, Vec<Athlete>)],
    focus: &[TeamId],
    now: DateTime<Utc>,
) -> ReadinessBoard {
    let mut sports = BTreeMap::new();
    for (key, athletes) in leagues {
        if athletes.is_empty() {
            continue;
        }
        let teams = league_rollup(key, athletes, now);
        let average = round1(
            teams.iter().map(|t| t.readiness_score).sum::<f64>() / teams.len() as f64,
        );
        sports.insert(
            key.clone(),
            LeagueReadiness {
                teams,
                average_readiness: average,
            },
        );
    }

    let featured = focus
        .iter()
        .filter_map(|team_id| {
            sports
                .values()
                .flat_map(|league| league.teams.iter())
                .find(|t| &t.team_id == team_id)
                .cloned()
        })
        .collect();

    ReadinessBoard {
        generated_at: now,
        sports,
        featured,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
