//! Live-payload replay cache.
//!
//! After a successful live fetch the raw payload is written under the
//! user cache dir. A later live run can replay it when the provider is
//! down, before falling back to fixtures.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::model::League;

#[derive(Debug, Clone)]
pub struct PayloadCache {
    dir: PathBuf,
}

impl PayloadCache {
    /// Cache under `~/.cache/fieldhouse/`, falling back to `.cache` in
    /// the home (or current) directory when the platform dir is unknown.
    pub fn default_location() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(|| {
            let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.push(".cache");
            home
        });
        PayloadCache {
            dir: base.join("fieldhouse"),
        }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        PayloadCache { dir: dir.into() }
    }

    fn path_for(&self, league: League) -> PathBuf {
        self.dir.join(format!("live-{}.json", league.key()))
    }

    pub fn load(&self, league: League) -> Option<Value> {
        let path = self.path_for(league);
        let raw = try_read_to_string(&path)?;
        let value = serde_json::from_str(&raw).ok()?;
        debug!(league = %league, path = %path.display(), "replaying cached live payload");
        Some(value)
    }

    /// Best-effort write; a failed cache write never fails the run.
    pub fn store(&self, league: League, payload: &Value) {
        let path = self.path_for(league);
        if let Ok(raw) = serde_json::to_string_pretty(payload) {
            let _ = write_string(&path, &raw);
        }
    }
}

fn try_read_to_string(path: &Path) -> Option<String> {
    let mut f = fs::File::open(path).ok()?;
    let mut s = String::new();

    f.read_to_string(&mut s).ok()?;

    Some(s)
}

fn write_string(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut f = fs::File::create(path)?;
    f.write_all(contents.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PayloadCache::at(dir.path());

        let payload = json!({"roster": [{"id": 42}]});
        cache.store(League::Nfl, &payload);
        assert_eq!(cache.load(League::Nfl).unwrap(), payload);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PayloadCache::at(dir.path());
        assert!(cache.load(League::Intl).is_none());
    }
}
