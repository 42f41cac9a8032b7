use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::model::League;
use crate::providers::{Credentials, FixtureStore, PayloadCache};
use crate::store::Store;

fn context(fixtures_dir: &std::path::Path, cache_dir: &std::path::Path) -> AgentContext {
    AgentContext {
        live: false,
        credentials: Credentials::default(),
        fixtures: FixtureStore::new(fixtures_dir),
        payload_cache: PayloadCache::at(cache_dir),
        now: Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(),
        shutdown: Arc::new(AtomicBool::new(false)),
    }
}

fn write_mlb_fixture(dir: &std::path::Path) {
    let payload = json!({
        "roster": [
            {"person": {"id": 1, "fullName": "Lead Hitter", "birthDate": "1998-05-01",
                        "height": "6'1\"", "weight": 205},
             "jerseyNumber": "9", "position": {"abbreviation": "CF"}},
            {"person": {"id": 2, "fullName": "No Position Guy"}, "jerseyNumber": "0"},
            {"person": {"id": 3, "fullName": "Relief Arm", "height": "6'4\"", "weight": 230},
             "jerseyNumber": "31", "position": {"abbreviation": "RP"}}
        ],
        "stats": {
            "1": {"stats": [{"splits": [{"stat": {"avg": ".288", "homeRuns": 24, "rbi": 80}}]}]},
            "3": {"stats": [{"splits": [{"stat": {"era": "2.95", "whip": "1.02"}}]}]}
        },
        "savant": {"1": {"war": 3.1, "wpa": 2.2}}
    });
    std::fs::write(dir.join("mlb.json"), payload.to_string()).unwrap();
}

#[tokio::test]
async fn test_pipeline_runs_from_fixture_to_disk() {
    let fixtures = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_mlb_fixture(fixtures.path());

    let ctx = context(fixtures.path(), cache.path());
    let store = Store::new(out.path());
    let report = run_league(League::Mlb, &ctx, &store).await;

    assert!(report.succeeded(), "error: {:?}", report.error);
    assert_eq!(report.stage, AgentStage::Done);
    assert_eq!(report.players, 2);
    assert_eq!(report.dropped, 1);

    // every surviving athlete is scored and bounded
    for athlete in &report.athletes {
        let havf = &athlete.hav_f;
        assert!(havf.composite_score.is_some());
        assert!(havf.champion_readiness.unwrap().value() <= 100.0);
        assert_eq!(havf.last_computed_at, Some(ctx.now));
    }

    // the league file landed where the aggregator will look for it
    let envelopes = store.read_all_leagues();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].players.len(), 2);
}

#[tokio::test]
async fn test_missing_fixture_is_zero_player_success() {
    let fixtures = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let ctx = context(fixtures.path(), cache.path());
    let store = Store::new(out.path());
    let report = run_league(League::Intl, &ctx, &store).await;

    assert!(report.succeeded());
    assert_eq!(report.players, 0);
    assert_eq!(report.dropped, 0);
}

#[tokio::test]
async fn test_persist_failure_parks_agent_in_failed() {
    let fixtures = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    write_mlb_fixture(fixtures.path());

    let ctx = context(fixtures.path(), cache.path());
    // a file where the output directory should be
    let out = tempfile::tempdir().unwrap();
    let blocked = out.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    let store = Store::new(&blocked);

    let report = run_league(League::Mlb, &ctx, &store).await;
    assert_eq!(report.stage, AgentStage::Failed);
    assert!(report.error.is_some());
}

#[tokio::test]
async fn test_team_grouping_follows_athletes() {
    let fixtures = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_mlb_fixture(fixtures.path());

    let ctx = context(fixtures.path(), cache.path());
    let store = Store::new(out.path());
    let report = run_league(League::Mlb, &ctx, &store).await;

    assert_eq!(report.teams.len(), 1);
    let team = &report.teams[0];
    assert_eq!(team.team_id.as_str(), "MLB-STL");
    assert_eq!(team.name, "St. Louis Cardinals");
    assert_eq!(team.roster.len(), 2);
}

#[test]
fn test_stage_display_names() {
    assert_eq!(AgentStage::Fetching.to_string(), "fetching");
    assert_eq!(AgentStage::Done.to_string(), "done");
    assert_eq!(AgentStage::Failed.to_string(), "failed");
}
