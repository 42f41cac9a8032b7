//! Provider credentials, read from the environment at agent construction.
//!
//! Live requests require both the `--live` flag and `LIVE_FETCH=1`;
//! either one absent forces fixtures. A league whose credential is
//! missing also falls back to fixtures, without failing the run.

use crate::model::League;

pub const MLB_STATS_API_KEY: &str = "MLB_STATS_API_KEY";
pub const BASEBALL_SAVANT_TOKEN: &str = "BASEBALL_SAVANT_TOKEN";
pub const CFBD_API_KEY: &str = "CFBD_API_KEY";
pub const PERFECT_GAME_API_KEY: &str = "PERFECT_GAME_API_KEY";
pub const ON3_API_KEY: &str = "ON3_API_KEY";
pub const OPENDORSE_API_KEY: &str = "OPENDORSE_API_KEY";
pub const KBO_API_KEY: &str = "KBO_API_KEY";
pub const NPB_API_KEY: &str = "NPB_API_KEY";
pub const SPORTSDATA_IO_KEY: &str = "SPORTSDATA_IO_KEY";
pub const THESPORTSDB_API_KEY: &str = "THESPORTSDB_API_KEY";

pub const LIVE_FETCH: &str = "LIVE_FETCH";

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub mlb_stats_api_key: Option<String>,
    pub baseball_savant_token: Option<String>,
    pub cfbd_api_key: Option<String>,
    pub perfect_game_api_key: Option<String>,
    pub on3_api_key: Option<String>,
    pub opendorse_api_key: Option<String>,
    pub kbo_api_key: Option<String>,
    pub npb_api_key: Option<String>,
    pub sportsdata_io_key: Option<String>,
    pub thesportsdb_api_key: Option<String>,
    live_fetch: bool,
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

impl Credentials {
    pub fn from_env() -> Self {
        Credentials {
            mlb_stats_api_key: non_empty(MLB_STATS_API_KEY),
            baseball_savant_token: non_empty(BASEBALL_SAVANT_TOKEN),
            cfbd_api_key: non_empty(CFBD_API_KEY),
            perfect_game_api_key: non_empty(PERFECT_GAME_API_KEY),
            on3_api_key: non_empty(ON3_API_KEY),
            opendorse_api_key: non_empty(OPENDORSE_API_KEY),
            kbo_api_key: non_empty(KBO_API_KEY),
            npb_api_key: non_empty(NPB_API_KEY),
            sportsdata_io_key: non_empty(SPORTSDATA_IO_KEY),
            thesportsdb_api_key: non_empty(THESPORTSDB_API_KEY),
            live_fetch: std::env::var(LIVE_FETCH).as_deref() == Ok("1"),
        }
    }

    /// The primary credential gating live fetches for `league`.
    pub fn for_league(&self, league: League) -> Option<&str> {
        let key = match league {
            League::Mlb => &self.mlb_stats_api_key,
            League::Nfl => &self.sportsdata_io_key,
            League::Ncaa => &self.cfbd_api_key,
            League::Nba => &self.sportsdata_io_key,
            League::Hs => &self.perfect_game_api_key,
            League::Nil => &self.on3_api_key,
            League::Intl => &self.thesportsdb_api_key,
        };
        key.as_deref()
    }

    /// True only when `--live` was passed and `LIVE_FETCH=1` is set and
    /// the league's credential is present.
    pub fn live_enabled(&self, live_flag: bool, league: League) -> bool {
        live_flag && self.live_fetch && self.for_league(league).is_some()
    }
}
