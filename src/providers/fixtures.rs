//! Fixture loader: canned provider payloads used whenever live
//! fetching is disabled or a credential is missing.
//!
//! A missing or unreadable fixture is not an error; the agent simply
//! reports zero players for that league and the run continues.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::model::League;

#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl FixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FixtureStore { dir: dir.into() }
    }

    pub fn path_for(&self, league: League) -> PathBuf {
        self.dir.join(format!("{}.json", league.key()))
    }

    /// Load the canned payload for `league`, shaped exactly as the live
    /// provider would respond.
    pub fn load(&self, league: League) -> Option<Value> {
        let path = self.path_for(league);
        match read_json(&path) {
            Some(value) => Some(value),
            None => {
                warn!(league = %league, path = %path.display(), "fixture missing or unreadable");
                None
            }
        }
    }
}

fn read_json(path: &Path) -> Option<Value> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}
