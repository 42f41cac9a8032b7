//! Team records: rosters reference athletes by id, never embed them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::athlete::PlayerId;
use super::league::Sport;

/// `<LEAGUE>-<TEAM_CODE>`, e.g. `MLB-STL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(league_code: &str, team_code: &str) -> Self {
        TeamId(format!("{}-{}", league_code, team_code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<TEAM_CODE>` segment, when the id is well-formed.
    pub fn team_code(&self) -> Option<&str> {
        self.0.split('-').nth(1)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TeamId {
    fn from(s: String) -> Self {
        TeamId(s)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId(s.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub venue: Option<String>,
    pub timezone: Option<String>,
}

/// Win-loss record. `win_pct` is derived at construction so it cannot
/// drift from the counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_pct: f64,
}

impl SeasonRecord {
    pub fn new(wins: u32, losses: u32, ties: u32) -> Self {
        let games = wins + losses + ties;
        let win_pct = if games > 0 {
            wins as f64 / games as f64
        } else {
            0.0
        };
        SeasonRecord {
            wins,
            losses,
            ties,
            win_pct,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub name: String,
    pub sport: Sport,
    pub league: String,
    pub division: Option<String>,
    pub location: Option<Location>,
    pub season: Option<SeasonRecord>,
    /// Ordered player-id references, in roster observation order.
    pub roster: Vec<PlayerId>,
}
