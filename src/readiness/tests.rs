use chrono::{DateTime, TimeZone, Utc};

use super::*;
use crate::model::{Athlete, HavF, Meta, PlayerId, Score, Sport, StatLine, TeamId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
}

fn athlete(team: &str, provider_id: &str, composite: Option<f64>) -> Athlete {
    let team_id = TeamId::from(team);
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
        hav_f: HavF {
            composite_score: composite.map(Score::clamped),
            ..HavF::default()
        },
        injury_status: None,
        recruiting: None,
        meta: Meta::new(vec!["test".to_string()], now()),
    }
}

#[test]
fn test_banding_thresholds() {
    assert_eq!(ReadinessStatus::from_score(75.0), ReadinessStatus::Ready);
    assert_eq!(ReadinessStatus::from_score(74.9), ReadinessStatus::Monitor);
    assert_eq!(ReadinessStatus::from_score(50.0), ReadinessStatus::Monitor);
    assert_eq!(ReadinessStatus::from_score(49.9), ReadinessStatus::Caution);
}

#[test]
fn test_banding_property_over_rollups() {
    // No team may be labelled ready below 75 or caution at 50+.
    let athletes: Vec<Athlete> = (0..40)
        .map(|i| {
            athlete(
                &format!("XX-T{}", i % 8),
                &format!("p{i}"),
                Some((i * 7 % 101) as f64),
            )
        })
        .collect();

    for team in league_rollup("xx", &athletes, now()) {
        match team.status {
            ReadinessStatus::Ready => assert!(team.readiness_score >= 75.0),
            ReadinessStatus::Monitor => {
                assert!(team.readiness_score >= 50.0 && team.readiness_score < 75.0)
            }
            ReadinessStatus::Caution => assert!(team.readiness_score < 50.0),
        }
    }
}

#[test]
fn test_absent_composite_counts_as_fifty() {
    // Unknown franchise, so no win-pct adjustment applies.
    let athletes = vec![
        athlete("XX-AAA", "a", Some(90.0)),
        athlete("XX-AAA", "b", None),
    ];
    let teams = league_rollup("xx", &athletes, now());
    assert_eq!(teams[0].readiness_score, 70.0);
    assert_eq!(teams[0].players_count, 2);
}

#[test]
fn test_win_pct_adjustment_for_known_franchise() {
    // NFL-KC finished 15-2: form = 50 + 40 * (15/17 - 0.5) ~ 85.29
    let athletes = vec![athlete("NFL-KC", "qb", Some(60.0))];
    let teams = league_rollup("nfl", &athletes, now());
    let form: f64 = 50.0 + 40.0 * (15.0 / 17.0 - 0.5);
    let expected = ((60.0 + form) / 2.0 * 10.0).round() / 10.0;
    assert_eq!(teams[0].readiness_score, expected);
}

#[test]
fn test_star_counting_ignores_sentinels() {
    let athletes = vec![
        athlete("XX-AAA", "a", Some(92.0)),
        athlete("XX-AAA", "b", Some(80.0)),
        athlete("XX-AAA", "c", Some(79.9)),
        athlete("XX-AAA", "d", None),
    ];
    let teams = league_rollup("xx", &athletes, now());
    assert_eq!(teams[0].stars_count, 2);
}

#[test]
fn test_teams_sorted_by_readiness_desc() {
    let athletes = vec![
        athlete("XX-LOW", "a", Some(20.0)),
        athlete("XX-HIGH", "b", Some(95.0)),
        athlete("XX-MID", "c", Some(55.0)),
    ];
    let teams = league_rollup("xx", &athletes, now());
    let ids: Vec<&str> = teams.iter().map(|t| t.team_id.as_str()).collect();
    assert_eq!(ids, vec!["XX-HIGH", "XX-MID", "XX-LOW"]);
}

#[test]
fn test_featured_follows_declared_order_regardless_of_score() {
    let mut leagues = Vec::new();
    leagues.push((
        "mlb".to_string(),
        vec![
            athlete("MLB-STL", "a", Some(10.0)),
            athlete("MLB-CHC", "x", Some(99.0)),
        ],
    ));
    leagues.push((
        "nfl".to_string(),
        vec![
            athlete("NFL-TEN", "b", Some(45.0)),
            athlete("NFL-KC", "y", Some(99.0)),
        ],
    ));
    leagues.push((
        "ncaa".to_string(),
        vec![athlete("NCAA-TEX", "c", Some(88.0))],
    ));
    leagues.push((
        "nba".to_string(),
        vec![athlete("NBA-MEM", "d", Some(70.0))],
    ));

    let focus: Vec<TeamId> = ["MLB-STL", "NFL-TEN", "NCAA-TEX", "NBA-MEM"]
        .into_iter()
        .map(TeamId::from)
        .collect();
    let board = compute_board(&leagues, &focus, now());

    let featured: Vec<&str> = board.featured.iter().map(|t| t.team_id.as_str()).collect();
    assert_eq!(featured, vec!["MLB-STL", "NFL-TEN", "NCAA-TEX", "NBA-MEM"]);
    assert_eq!(board.sports.len(), 4);
}

#[test]
fn test_missing_focus_team_is_skipped() {
    let leagues = vec![(
        "mlb".to_string(),
        vec![athlete("MLB-STL", "a", Some(60.0))],
    )];
    let focus: Vec<TeamId> = ["MLB-STL", "NBA-MEM"].into_iter().map(TeamId::from).collect();
    let board = compute_board(&leagues, &focus, now());
    assert_eq!(board.featured.len(), 1);
    assert_eq!(board.featured[0].team_id.as_str(), "MLB-STL");
}

#[test]
fn test_board_serialization_shape() {
    let leagues = vec![(
        "mlb".to_string(),
        vec![athlete("XX-AAA", "a", Some(60.0))],
    )];
    let board = compute_board(&leagues, &[], now());
    let value = serde_json::to_value(&board).unwrap();

    assert!(value["generated_at"].is_string());
    assert!(value["sports"]["mlb"]["averageReadiness"].is_number());
    assert_eq!(value["sports"]["mlb"]["teams"][0]["status"], "monitor");
    assert!(value["featured"].as_array().unwrap().is_empty());
}
