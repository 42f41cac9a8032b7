//! Persistence layer.
//!
//! Append-only run outputs: one envelope per league under `leagues/`,
//! one unified file with teams and players, and the readiness board.
//! Every write is atomic: serialize to a temp file in the target
//! directory, fsync, rename.

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::error::{FieldhouseError, Result};
use crate::model::{Athlete, League, Team};

/// Schema version stamped into the unified file.
pub const UNIFIED_VERSION: &str = "2.0.0";

#[derive(Debug, Serialize, Deserialize)]
pub struct LeagueEnvelope {
    pub league: String,
    pub generated_at: DateTime<Utc>,
    pub players: Vec<Athlete>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnifiedEnvelope {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub teams: Vec<Team>,
    pub players: Vec<Athlete>,
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn leagues_dir(&self) -> PathBuf {
        self.root.join("leagues")
    }

    pub fn league_path(&self, league: League) -> PathBuf {
        self.leagues_dir().join(format!("{}.json", league.key()))
    }

    pub fn unified_path(&self) -> PathBuf {
        self.root.join("unified").join("unified_data_latest.json")
    }

    pub fn readiness_path(&self) -> PathBuf {
        self.root.join("readiness.json")
    }

    /// Persist one league's scored players, in provider order.
    pub fn write_league(
        &self,
        league: League,
        players: &[Athlete],
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let envelope = LeagueEnvelope {
            league: league.label().to_string(),
            generated_at: now,
            players: players.to_vec(),
        };
        let path = self.league_path(league);
        write_json_atomic(&path, &envelope)?;
        Ok(path)
    }

    /// Persist the run-level unified dataset.
    pub fn write_unified(
        &self,
        teams: Vec<Team>,
        players: Vec<Athlete>,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let envelope = UnifiedEnvelope {
            version: UNIFIED_VERSION.to_string(),
            generated_at: now,
            teams,
            players,
        };
        let path = self.unified_path();
        write_json_atomic(&path, &envelope)?;
        Ok(path)
    }

    pub fn write_readiness<T: Serialize>(&self, board: &T) -> Result<PathBuf> {
        let path = self.readiness_path();
        write_json_atomic(&path, board)?;
        Ok(path)
    }

    /// Load every persisted league envelope. Malformed files are skipped
    /// with a warning so the remaining leagues still aggregate.
    pub fn read_all_leagues(&self) -> Vec<LeagueEnvelope> {
        let dir = self.leagues_dir();
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut envelopes = Vec::new();
        for path in paths {
            match read_json::<LeagueEnvelope>(&path) {
                Ok(envelope) => envelopes.push(envelope),
                Err(err) => {
                    let err = FieldhouseError::Aggregate {
                        path: path.clone(),
                        reason: err.to_string(),
                    };
                    warn!("{err}");
                }
            }
        }
        envelopes
    }
}

/// Write to a temp file in the destination directory, fsync, rename.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp = tempfile::NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(tmp.as_file(), value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
