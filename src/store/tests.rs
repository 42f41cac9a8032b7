use chrono::{TimeZone, Utc};

use super::*;
use crate::model::{Athlete, HavF, League, Meta, PlayerId, Sport, StatLine, TeamId};

fn athlete(provider_id: &str) -> Athlete {
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let team_id = TeamId::new("MLB", "STL");
    Athlete {
        player_id: PlayerId::derive(&team_id, provider_id),
        name: format!("Player {provider_id}"),
        sport: Sport::Baseball,
        league: "MLB".to_string(),
        team_id,
        position: "1B".to_string(),
        jersey_number: None,
        bio: None,
        stats: StatLine::empty("2025"),
        projections: None,
        nil_profile: None,
        biometrics: None,
        hav_f: HavF::default(),
        injury_status: None,
        recruiting: None,
        meta: Meta::new(vec!["test".to_string()], now),
    }
}

#[test]
fn test_league_write_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();

    let players = vec![athlete("a"), athlete("b")];
    let path = store.write_league(League::Mlb, &players, now).unwrap();
    assert_eq!(path, dir.path().join("leagues/mlb.json"));

    let envelopes = store.read_all_leagues();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].league, "MLB");
    assert_eq!(envelopes[0].generated_at, now);
    assert_eq!(envelopes[0].players.len(), 2);
    // provider order preserved
    assert_eq!(envelopes[0].players[0].name, "Player a");
}

#[test]
fn test_write_replaces_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();

    store.write_league(League::Nfl, &[athlete("a")], now).unwrap();
    store
        .write_league(League::Nfl, &[athlete("b"), athlete("c")], now)
        .unwrap();

    let envelopes = store.read_all_leagues();
    assert_eq!(envelopes[0].players.len(), 2);
}

#[test]
fn test_malformed_league_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();

    store.write_league(League::Mlb, &[athlete("a")], now).unwrap();
    std::fs::write(store.leagues_dir().join("nba.json"), "{ truncated").unwrap();

    let envelopes = store.read_all_leagues();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].league, "MLB");
}

#[test]
fn test_unified_envelope_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();

    let players = vec![athlete("a")];
    let teams = crate::normalize::teams_from_athletes(&players);
    let path = store.write_unified(teams, players, now).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], UNIFIED_VERSION);
    assert_eq!(value["teams"][0]["team_id"], "MLB-STL");
    assert_eq!(value["players"][0]["league"], "MLB");
    // rosters are id references, not embedded records
    assert!(value["teams"][0]["roster"][0].is_string());
}

#[test]
fn test_no_leagues_dir_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("missing"));
    assert!(store.read_all_leagues().is_empty());
}
