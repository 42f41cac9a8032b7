//! Normalization layer: provider-shaped records in, canonical
//! athlete records out.
//!
//! Every provider divergence is absorbed here so scoring and beyond see
//! one shape. Records failing required-field validation are dropped and
//! counted; the batch always survives.

pub mod metrics;
pub mod units;


use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::error::{NormalizeError, NormalizeReason};
use crate::model::{
    Athlete, Bio, Biometrics, HavF, InjuryStatus, League, Meta, NilProfile, PlayerId, Projection,
    Recruiting, StatLine, Team, TeamId,
};

pub use units::{parse_height, Centimeters, Kilograms, MetersPerSecond};

/// Provider-agnostic intermediate record. Each agent walks its own
/// payload shape into this; the normalizer does the rest.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// Provider-side identifier; hashed into the stable player id.
    pub provider_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    /// Team code within the league, e.g. `STL`.
    pub team_code: Option<String>,
    pub jersey_number: Option<String>,
    /// Sport tag as the provider labels it, when it labels one at all.
    /// Used to reject records from outside the league's sport.
    pub sport_hint: Option<String>,
    pub dob: Option<String>,
    pub birthplace: Option<String>,
    /// Height in any encountered encoding (`6'2"`, `6-2`, `74`).
    pub height: Option<String>,
    /// Height already in centimeters (re-normalization fixed point).
    pub height_cm: Option<f64>,
    pub weight_lb: Option<f64>,
    pub weight_kg: Option<f64>,
    pub handedness: Option<String>,
    pub class_year: Option<String>,
    pub college: Option<String>,
    pub season: Option<String>,
    pub metrics: BTreeMap<String, f64>,
    pub projections: Option<RawProjection>,
    pub nil_profile: Option<NilProfile>,
    pub biometrics: Option<Biometrics>,
    pub injury: Option<InjuryStatus>,
    pub recruiting: Option<Recruiting>,
    pub external_ids: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct RawProjection {
    pub season: String,
    pub model: Option<String>,
    pub metrics: BTreeMap<String, f64>,
}

/// Batch result: canonical records in provider order plus the dropped
/// record signals.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub athletes: Vec<Athlete>,
    pub dropped: Vec<NormalizeError>,
}

/// Normalize a provider batch for one league. `default_team` fills in
/// when the provider omits a team code; `sources` becomes the ordered
/// `meta.sources` list.
pub fn normalize_batch(
    league: League,
    default_team: Option<&str>,
    sources: &[&str],
    records: Vec<RawRecord>,
    now: DateTime<Utc>,
) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for (record_index, record) in records.into_iter().enumerate() {
        match normalize_record(league, default_team, sources, record, now) {
            Ok(athlete) => outcome.athletes.push(athlete),
            Err(reason) => {
                let err = NormalizeError {
                    record_index,
                    reason,
                };
                warn!(league = %league, %err, "dropping record");
                outcome.dropped.push(err);
            }
        }
    }

    outcome
}

fn normalize_record(
    league: League,
    default_team: Option<&str>,
    sources: &[&str],
    record: RawRecord,
    now: DateTime<Utc>,
) -> Result<Athlete, NormalizeReason> {
    let sport = league.sport();
    if let Some(hint) = record.sport_hint.as_deref() {
        if !metrics::sport_matches_hint(sport, hint) {
            return Err(NormalizeReason::UnknownSport);
        }
    }

    if record.provider_id.trim().is_empty() {
        return Err(NormalizeReason::BadEncoding);
    }

    let name = required(record.name.as_deref())?;
    let position = required(record.position.as_deref())?;
    let team_code = record
        .team_code
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(default_team)
        .ok_or(NormalizeReason::MissingRequired)?;

    let team_id = TeamId::new(league.team_code_prefix(), team_code);
    let player_id = PlayerId::derive(&team_id, &record.provider_id);

    let height_cm = record
        .height_cm
        .or_else(|| record.height.as_deref().and_then(|h| parse_height(h).map(|c| c.value())));
    let weight_kg = record
        .weight_kg
        .or_else(|| record.weight_lb.map(|lb| Kilograms::from_pounds(lb).value()));
    let dob = record.dob.as_deref().and_then(parse_dob);

    let bio = Bio {
        dob,
        birthplace: record.birthplace,
        height_cm,
        weight_kg,
        handedness: record.handedness,
        class_year: record.class_year,
        college: record.college,
    };
    let bio = if bio.dob.is_none()
        && bio.birthplace.is_none()
        && bio.height_cm.is_none()
        && bio.weight_kg.is_none()
        && bio.handedness.is_none()
        && bio.class_year.is_none()
        && bio.college.is_none()
    {
        None
    } else {
        Some(bio)
    };

    let season = record.season.unwrap_or_else(|| "2025".to_string());
    let performances = metrics::select_metrics(sport, position, &record.metrics);

    let projections = record.projections.map(|p| Projection {
        performances: metrics::select_metrics(sport, position, &p.metrics),
        season: p.season,
        model: p.model,
    });

    let mut meta = Meta::new(sources.iter().map(|s| s.to_string()).collect(), now);
    meta = meta.with_external_id("provider_id", record.provider_id.clone());
    for (key, value) in record.external_ids {
        meta.external_ids.insert(key, value);
    }

    Ok(Athlete {
        player_id,
        name: name.to_string(),
        sport,
        league: league.label().to_string(),
        team_id,
        position: position.to_string(),
        jersey_number: record
            .jersey_number
            .filter(|j| !j.trim().is_empty()),
        bio,
        stats: StatLine {
            season,
            performances,
        },
        projections,
        nil_profile: record.nil_profile,
        biometrics: record.biometrics,
        hav_f: HavF::default(),
        injury_status: record.injury,
        recruiting: record.recruiting,
        meta,
    })
}

fn required(field: Option<&str>) -> Result<&str, NormalizeReason> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(NormalizeReason::MissingRequired)
}

fn parse_dob(raw: &str) -> Option<NaiveDate> {
    // Providers send either a bare date or a full timestamp.
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// Group scored athletes into Team records, enriched from the franchise
/// registry when the team is known there. Roster order follows athlete
/// order within the batch.
pub fn teams_from_athletes(athletes: &[Athlete]) -> Vec<Team> {
    let mut teams: Vec<Team> = Vec::new();
    let mut index: BTreeMap<TeamId, usize> = BTreeMap::new();

    for athlete in athletes {
        let slot = match index.get(&athlete.team_id) {
            Some(&i) => i,
            None => {
                let franchise = crate::teams::franchise(athlete.team_id.as_str());
                let team = Team {
                    team_id: athlete.team_id.clone(),
                    name: franchise
                        .map(|f| f.name.to_string())
                        .unwrap_or_else(|| {
                            athlete
                                .team_id
                                .team_code()
                                .unwrap_or(athlete.team_id.as_str())
                                .to_string()
                        }),
                    sport: athlete.sport,
                    league: athlete.league.clone(),
                    division: franchise.and_then(|f| f.division.map(str::to_string)),
                    location: franchise.map(|f| f.location()),
                    season: franchise.map(|f| f.season_record()),
                    roster: Vec::new(),
                };
                teams.push(team);
                index.insert(athlete.team_id.clone(), teams.len() - 1);
                teams.len() - 1
            }
        };
        teams[slot].roster.push(athlete.player_id.clone());
    }

    teams
}
