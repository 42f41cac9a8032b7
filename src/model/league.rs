//! League and sport identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldhouseError;

/// Provider families the ingestion orchestrator knows how to run, in
/// priority order (focus franchises first within their leagues).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Mlb,
    Nfl,
    Ncaa,
    Nba,
    Hs,
    Nil,
    Intl,
}

impl League {
    /// All leagues in orchestration priority order.
    pub const ALL: [League; 7] = [
        League::Mlb,
        League::Nfl,
        League::Ncaa,
        League::Nba,
        League::Hs,
        League::Nil,
        League::Intl,
    ];

    /// Lowercase key used for CLI selection and league file names
    /// (`leagues/<key>.json`).
    pub fn key(&self) -> &'static str {
        match self {
            League::Mlb => "mlb",
            League::Nfl => "nfl",
            League::Ncaa => "ncaa",
            League::Nba => "nba",
            League::Hs => "hs",
            League::Nil => "nil",
            League::Intl => "intl",
        }
    }

    /// League label stamped into canonical records and envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            League::Mlb => "MLB",
            League::Nfl => "NFL",
            League::Ncaa => "NCAA",
            League::Nba => "NBA",
            League::Hs => "HS",
            League::Nil => "NIL",
            League::Intl => "INTL",
        }
    }

    /// Code used as the first segment of team and player identifiers.
    /// The NIL board covers college athletes, so its records key into
    /// NCAA team ids.
    pub fn team_code_prefix(&self) -> &'static str {
        match self {
            League::Nil => "NCAA",
            other => other.label(),
        }
    }

    /// The sport played in this league's default competition.
    pub fn sport(&self) -> Sport {
        match self {
            League::Mlb | League::Intl => Sport::Baseball,
            League::Nfl => Sport::Nfl,
            League::Ncaa | League::Nil => Sport::NcaaFootball,
            League::Hs => Sport::HsFootball,
            League::Nba => Sport::Basketball,
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for League {
    type Err = FieldhouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mlb" => Ok(League::Mlb),
            "nfl" => Ok(League::Nfl),
            "ncaa" | "ncaa-fb" => Ok(League::Ncaa),
            "nba" => Ok(League::Nba),
            "hs" | "hs-fb" => Ok(League::Hs),
            "nil" => Ok(League::Nil),
            "intl" | "international" => Ok(League::Intl),
            other => Err(FieldhouseError::config(format!("unknown league: {other}"))),
        }
    }
}

/// Sport namespaces for stat metrics and the HAV-F performance blend.
///
/// College and high-school football are distinct sports here because the
/// performance formulas and metric whitelists differ from the NFL's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    #[serde(rename = "MLB")]
    Baseball,
    #[serde(rename = "NFL")]
    Nfl,
    #[serde(rename = "NCAA-FB")]
    NcaaFootball,
    #[serde(rename = "HS-FB")]
    HsFootball,
    #[serde(rename = "NBA")]
    Basketball,
    #[serde(rename = "INTL-BB")]
    IntlBaseball,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Baseball => "MLB",
            Sport::Nfl => "NFL",
            Sport::NcaaFootball => "NCAA-FB",
            Sport::HsFootball => "HS-FB",
            Sport::Basketball => "NBA",
            Sport::IntlBaseball => "INTL-BB",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
