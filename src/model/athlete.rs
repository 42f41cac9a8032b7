//! The canonical athlete record that every downstream consumer relies on.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::league::Sport;
use super::team::TeamId;

/// Opaque stable player identifier: `<LEAGUE>-<TEAM_CODE>-<8-hex hash>`.
///
/// The hash suffix is the first 8 hex chars of the MD5 of the provider's
/// own id, uppercased. Not a security primitive, only a short stable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Derive the id from a team id and the provider-side identifier.
    pub fn derive(team_id: &TeamId, provider_id: &str) -> Self {
        let digest = md5::compute(provider_id.as_bytes());
        let hex = format!("{:x}", digest);
        PlayerId(format!("{}-{}", team_id, hex[..8].to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId(s)
    }
}

/// A HAV-F sub-score or composite, bounded to [0, 100] at one decimal
/// place. Construction clamps and rounds; the bound can never be violated
/// by arithmetic elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    /// Clamp to [0, 100] and round to one decimal place.
    pub fn clamped(value: f64) -> Self {
        let bounded = value.clamp(0.0, 100.0);
        Score((bounded * 10.0).round() / 10.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Canonical athlete record. Created by the normalizer, stamped by the
/// HAV-F engine, frozen by the store at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    pub player_id: PlayerId,
    pub name: String,
    pub sport: Sport,
    pub league: String,
    pub team_id: TeamId,
    pub position: String,
    /// Kept as a string: leading zeros are meaningful ("07" != "7").
    pub jersey_number: Option<String>,
    pub bio: Option<Bio>,
    pub stats: StatLine,
    pub projections: Option<Projection>,
    pub nil_profile: Option<NilProfile>,
    pub biometrics: Option<Biometrics>,
    pub hav_f: HavF,
    pub injury_status: Option<InjuryStatus>,
    pub recruiting: Option<Recruiting>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bio {
    pub dob: Option<NaiveDate>,
    pub birthplace: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub handedness: Option<String>,
    pub class_year: Option<String>,
    pub college: Option<String>,
}

/// One season of sport-namespaced performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatLine {
    pub season: String,
    pub performances: BTreeMap<String, f64>,
}

impl StatLine {
    pub fn empty(season: impl Into<String>) -> Self {
        StatLine {
            season: season.into(),
            performances: BTreeMap::new(),
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.performances.get(name).copied()
    }
}

/// Projected stat line plus the model that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub season: String,
    pub model: Option<String>,
    pub performances: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NilProfile {
    pub valuation_usd: Option<f64>,
    pub engagement_rate: Option<f64>,
    pub followers_total: Option<u64>,
    pub deals_last_90d: Option<u32>,
    pub deal_value_90d_usd: Option<f64>,
    pub search_index: Option<f64>,
    pub local_popularity_index: Option<f64>,
}

impl NilProfile {
    /// True when every field is null — treated the same as a missing
    /// profile by the NIL trust score.
    pub fn is_empty(&self) -> bool {
        self.valuation_usd.is_none()
            && self.engagement_rate.is_none()
            && self.followers_total.is_none()
            && self.deals_last_90d.is_none()
            && self.deal_value_90d_usd.is_none()
            && self.search_index.is_none()
            && self.local_popularity_index.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Biometrics {
    pub hrv_rmssd_ms: Option<f64>,
    pub reaction_ms: Option<f64>,
    pub gsr_microsiemens: Option<f64>,
    pub sleep_hours: Option<f64>,
}

impl Biometrics {
    pub fn is_empty(&self) -> bool {
        self.hrv_rmssd_ms.is_none()
            && self.reaction_ms.is_none()
            && self.gsr_microsiemens.is_none()
            && self.sleep_hours.is_none()
    }
}

/// HAV-F stamp. `composite_score` is populated only when all three
/// sub-scores are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HavF {
    pub champion_readiness: Option<Score>,
    pub cognitive_leverage: Option<Score>,
    pub nil_trust_score: Option<Score>,
    pub composite_score: Option<Score>,
    pub last_computed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjuryStatus {
    pub current_status: String,
    pub since: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recruiting {
    pub stars: Option<u8>,
    pub national_rank: Option<u32>,
    pub position_rank: Option<u32>,
}

/// Provenance block. `updated_at` is the latest timestamp in the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub sources: Vec<String>,
    pub updated_at: DateTime<Utc>,
    pub external_ids: BTreeMap<String, String>,
}

impl Meta {
    pub fn new(sources: Vec<String>, updated_at: DateTime<Utc>) -> Self {
        Meta {
            sources,
            updated_at,
            external_ids: BTreeMap::new(),
        }
    }

    pub fn with_external_id(mut self, key: &str, value: impl Into<String>) -> Self {
        self.external_ids.insert(key.to_string(), value.into());
        self
    }
}
