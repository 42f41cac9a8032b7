//! Static franchise registry.
//!
//! Synthesized teams (grouped from rosters) are enriched from this table:
//! proper names, divisions, venues, and last-season records that feed the
//! readiness win-pct adjustment. Unknown team ids still work; they just
//! stay un-enriched.

use crate::model::{Location, SeasonRecord};

#[derive(Debug, Clone, Copy)]
pub struct Franchise {
    pub team_id: &'static str,
    pub name: &'static str,
    pub division: Option<&'static str>,
    pub city: &'static str,
    pub state: &'static str,
    pub venue: &'static str,
    pub timezone: &'static str,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Franchise {
    pub fn location(&self) -> Location {
        Location {
            city: Some(self.city.to_string()),
            state: Some(self.state.to_string()),
            country: Some("USA".to_string()),
            venue: Some(self.venue.to_string()),
            timezone: Some(self.timezone.to_string()),
        }
    }

    pub fn season_record(&self) -> SeasonRecord {
        SeasonRecord::new(self.wins, self.losses, self.ties)
    }
}

#[rustfmt::skip]
const FRANCHISES: &[Franchise] = &[
    // MLB
    Franchise { team_id: "MLB-STL", name: "St. Louis Cardinals", division: Some("NL Central"), city: "St. Louis", state: "MO", venue: "Busch Stadium", timezone: "America/Chicago", wins: 83, losses: 79, ties: 0 },
    Franchise { team_id: "MLB-CHC", name: "Chicago Cubs", division: Some("NL Central"), city: "Chicago", state: "IL", venue: "Wrigley Field", timezone: "America/Chicago", wins: 83, losses: 79, ties: 0 },
    Franchise { team_id: "MLB-HOU", name: "Houston Astros", division: Some("AL West"), city: "Houston", state: "TX", venue: "Daikin Park", timezone: "America/Chicago", wins: 88, losses: 73, ties: 0 },
    Franchise { team_id: "MLB-TEX", name: "Texas Rangers", division: Some("AL West"), city: "Arlington", state: "TX", venue: "Globe Life Field", timezone: "America/Chicago", wins: 78, losses: 84, ties: 0 },
    Franchise { team_id: "MLB-LAD", name: "Los Angeles Dodgers", division: Some("NL West"), city: "Los Angeles", state: "CA", venue: "Dodger Stadium", timezone: "America/Los_Angeles", wins: 98, losses: 64, ties: 0 },
    // NFL
    Franchise { team_id: "NFL-TEN", name: "Tennessee Titans", division: Some("AFC South"), city: "Nashville", state: "TN", venue: "Nissan Stadium", timezone: "America/Chicago", wins: 3, losses: 14, ties: 0 },
    Franchise { team_id: "NFL-DAL", name: "Dallas Cowboys", division: Some("NFC East"), city: "Arlington", state: "TX", venue: "AT&T Stadium", timezone: "America/Chicago", wins: 7, losses: 10, ties: 0 },
    Franchise { team_id: "NFL-HOU", name: "Houston Texans", division: Some("AFC South"), city: "Houston", state: "TX", venue: "NRG Stadium", timezone: "America/Chicago", wins: 10, losses: 7, ties: 0 },
    Franchise { team_id: "NFL-KC", name: "Kansas City Chiefs", division: Some("AFC West"), city: "Kansas City", state: "MO", venue: "GEHA Field at Arrowhead", timezone: "America/Chicago", wins: 15, losses: 2, ties: 0 },
    // NCAA football
    Franchise { team_id: "NCAA-TEX", name: "Texas Longhorns", division: Some("SEC"), city: "Austin", state: "TX", venue: "DKR-Texas Memorial Stadium", timezone: "America/Chicago", wins: 13, losses: 3, ties: 0 },
    Franchise { team_id: "NCAA-ALA", name: "Alabama Crimson Tide", division: Some("SEC"), city: "Tuscaloosa", state: "AL", venue: "Bryant-Denny Stadium", timezone: "America/Chicago", wins: 9, losses: 4, ties: 0 },
    Franchise { team_id: "NCAA-OU", name: "Oklahoma Sooners", division: Some("SEC"), city: "Norman", state: "OK", venue: "Gaylord Family Memorial Stadium", timezone: "America/Chicago", wins: 6, losses: 7, ties: 0 },
    // NBA
    Franchise { team_id: "NBA-MEM", name: "Memphis Grizzlies", division: Some("Southwest"), city: "Memphis", state: "TN", venue: "FedExForum", timezone: "America/Chicago", wins: 48, losses: 34, ties: 0 },
    Franchise { team_id: "NBA-DAL", name: "Dallas Mavericks", division: Some("Southwest"), city: "Dallas", state: "TX", venue: "American Airlines Center", timezone: "America/Chicago", wins: 39, losses: 43, ties: 0 },
    Franchise { team_id: "NBA-SAS", name: "San Antonio Spurs", division: Some("Southwest"), city: "San Antonio", state: "TX", venue: "Frost Bank Center", timezone: "America/Chicago", wins: 34, losses: 48, ties: 0 },
    // Texas high school (UIL 6A)
    Franchise { team_id: "HS-AUSTIN-WESTLAKE", name: "Westlake Chaparrals", division: Some("UIL 6A-DI"), city: "Austin", state: "TX", venue: "Chaparral Stadium", timezone: "America/Chicago", wins: 12, losses: 1, ties: 0 },
    Franchise { team_id: "HS-DUNCANVILLE", name: "Duncanville Panthers", division: Some("UIL 6A-DI"), city: "Duncanville", state: "TX", venue: "Panther Stadium", timezone: "America/Chicago", wins: 14, losses: 1, ties: 0 },
];

pub fn franchise(team_id: &str) -> Option<&'static Franchise> {
    FRANCHISES.iter().find(|f| f.team_id == team_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_franchises_present() {
        for id in ["MLB-STL", "NFL-TEN", "NCAA-TEX", "NBA-MEM"] {
            let f = franchise(id).expect(id);
            assert!(!f.name.is_empty());
            assert!(f.division.is_some());
        }
    }

    #[test]
    fn test_unknown_team_is_none() {
        assert!(franchise("XFL-HOU").is_none());
    }

    #[test]
    fn test_season_record_win_pct_consistency() {
        let kc = franchise("NFL-KC").unwrap().season_record();
        assert!((kc.win_pct - 15.0 / 17.0).abs() < 1e-9);
    }
}
