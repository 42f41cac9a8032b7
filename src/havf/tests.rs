use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};

use super::*;
use crate::model::{
    Athlete, Bio, Biometrics, HavF, Meta, NilProfile, PlayerId, Score, Sport, StatLine, TeamId,
};

fn base_athlete(sport: Sport) -> Athlete {
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
    let team_id = TeamId::new("MLB", "STL");
    Athlete {
        player_id: PlayerId::derive(&team_id, "test"),
        name: "Test Athlete".to_string(),
        sport,
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

fn perfs(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_mlb_hitter_scenario() {
    // War-heavy hitter with solid biometrics and a peak-adjacent age.
    let mut athlete = base_athlete(Sport::Baseball);
    athlete.stats.performances = perfs(&[("war", 2.5), ("wpa", 1.8), ("ops", 0.716)]);
    athlete.biometrics = Some(Biometrics {
        hrv_rmssd_ms: Some(60.0),
        reaction_ms: Some(160.0),
        gsr_microsiemens: None,
        sleep_hours: Some(8.0),
    });
    athlete.bio = Some(Bio {
        dob: Some(NaiveDate::from_ymd_opt(1995, 6, 15).unwrap()),
        ..Bio::default()
    });

    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    stamp(&mut athlete, now);

    let havf = &athlete.hav_f;
    assert!(havf.champion_readiness.unwrap().value() >= 65.0);
    assert!(havf.cognitive_leverage.is_some());
    assert!(havf.nil_trust_score.is_some());
    assert!(havf.composite_score.is_some());
    assert_eq!(havf.last_computed_at, Some(now));
    assert_eq!(athlete.meta.updated_at, now);
}

#[test]
fn test_missing_biometrics_yields_cognitive_floor() {
    let mut athlete = base_athlete(Sport::Baseball);
    athlete.stats.performances = perfs(&[("war", 1.0)]);
    athlete.biometrics = None;

    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    stamp(&mut athlete, now);

    assert_eq!(athlete.hav_f.cognitive_leverage.unwrap().value(), 25.0);
    // physical falls back to 50 but champion readiness is still populated
    assert!(athlete.hav_f.champion_readiness.is_some());
}

#[test]
fn test_all_null_biometrics_yields_cognitive_floor() {
    let mut athlete = base_athlete(Sport::Baseball);
    athlete.biometrics = Some(Biometrics::default());

    assert_eq!(cognitive_leverage(&athlete).value(), 25.0);
}

#[test]
fn test_all_null_nil_profile_yields_trust_floor() {
    let mut athlete = base_athlete(Sport::NcaaFootball);
    athlete.nil_profile = Some(NilProfile::default());

    assert_eq!(nil_trust(&athlete).value(), 15.0);
    assert_eq!(nil_trust(&base_athlete(Sport::NcaaFootball)).value(), 15.0);
}

#[test]
fn test_nil_trust_from_full_profile() {
    let mut athlete = base_athlete(Sport::NcaaFootball);
    athlete.nil_profile = Some(NilProfile {
        valuation_usd: Some(3_100_000.0),
        engagement_rate: Some(0.067),
        followers_total: Some(450_000),
        deals_last_90d: Some(8),
        deal_value_90d_usd: Some(285_000.0),
        search_index: Some(95.2),
        local_popularity_index: Some(98.5),
    });

    // authenticity saturates (0.067 * 2000 > 100), velocity averages
    // clamp(80) and clamp(100), salience averages the two indices.
    let expected = 0.6 * 100.0 + 0.25 * ((80.0 + 100.0) / 2.0) + 0.15 * ((95.2 + 98.5) / 2.0);
    assert_eq!(nil_trust(&athlete).value(), Score::clamped(expected).value());
}

#[test]
fn test_empty_stats_performance_baseline() {
    let mut athlete = base_athlete(Sport::Nfl);
    athlete.stats.performances.clear();

    let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    // performance 50, physical 50, trajectory 50 => champion 50.0
    assert_eq!(champion_readiness(&athlete, today).value(), 50.0);
}

#[test]
fn test_football_performance_blend() {
    let mut athlete = base_athlete(Sport::HsFootball);
    athlete.stats.performances = perfs(&[("total_yards", 1800.0), ("total_tds", 22.0)]);

    let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    // perf clamp(18 + 110) = 100; physical/trajectory default 50
    let expected = 0.5 * 100.0 + 0.4 * 50.0 + 0.1 * 50.0;
    assert_eq!(champion_readiness(&athlete, today).value(), expected);
}

#[test]
fn test_trajectory_bands() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let dob = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

    let score = |d| {
        let mut athlete = base_athlete(Sport::Baseball);
        athlete.stats.performances = perfs(&[("war", 0.0)]);
        athlete.bio = Some(Bio {
            dob: Some(d),
            ..Bio::default()
        });
        champion_readiness(&athlete, today).value()
    };

    // performance = clamp(30) = 30, physical = 50 -> 0.5*30 + 0.4*50 = 35
    // trajectory contributes 0.1 * band
    assert_eq!(score(dob(1999, 1, 1)), 44.0); // 26yo, peak band (90)
    assert_eq!(score(dob(2003, 1, 1)), 43.0); // 22yo, ramp band (~80)
    assert_eq!(score(dob(1985, 1, 1)), 40.0); // 40yo, out of band (50)

    // 33yo decline band: 90 - (age - 28) * 5, a hair over 64.9
    let decline = score(dob(1992, 1, 1));
    assert!((41.0..42.0).contains(&decline), "decline band score: {decline}");
}

#[test]
fn test_composite_requires_all_three() {
    let some = Some(Score::clamped(80.0));
    assert!(composite(some, some, None).is_none());
    assert!(composite(some, None, some).is_none());
    assert!(composite(None, some, some).is_none());

    let full = composite(
        Some(Score::clamped(90.0)),
        Some(Score::clamped(74.0)),
        Some(Score::clamped(15.0)),
    )
    .unwrap();
    assert_eq!(full.value(), Score::clamped(0.40 * 90.0 + 0.35 * 74.0 + 0.25 * 15.0).value());
}

#[test]
fn test_stamping_is_deterministic() {
    let build = || {
        let mut athlete = base_athlete(Sport::Baseball);
        athlete.stats.performances = perfs(&[("war", 2.5), ("wpa", 1.8)]);
        athlete.biometrics = Some(Biometrics {
            hrv_rmssd_ms: Some(55.0),
            reaction_ms: Some(175.0),
            gsr_microsiemens: Some(4.0),
            sleep_hours: Some(6.5),
        });
        athlete.bio = Some(Bio {
            dob: Some(NaiveDate::from_ymd_opt(1998, 2, 2).unwrap()),
            ..Bio::default()
        });
        athlete
    };

    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let mut first = build();
    let mut second = build();
    stamp(&mut first, now);
    stamp(&mut second, now);

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_all_scores_stay_in_bounds() {
    // Sweep extreme inputs; every populated score must land in [0, 100].
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let extremes = [-1e9, -1.0, 0.0, 0.5, 1.0, 100.0, 1e9];

    for &war in &extremes {
        for &hrv in &extremes {
            for &rate in &extremes {
                let mut athlete = base_athlete(Sport::Baseball);
                athlete.stats.performances = perfs(&[("war", war), ("wpa", war / 2.0)]);
                athlete.biometrics = Some(Biometrics {
                    hrv_rmssd_ms: Some(hrv),
                    reaction_ms: Some(hrv.abs()),
                    gsr_microsiemens: Some(hrv / 10.0),
                    sleep_hours: Some(hrv / 8.0),
                });
                athlete.nil_profile = Some(NilProfile {
                    engagement_rate: Some(rate),
                    deals_last_90d: Some(3),
                    deal_value_90d_usd: Some(war.abs()),
                    search_index: Some(rate * 100.0),
                    local_popularity_index: Some(rate),
                    ..NilProfile::default()
                });
                stamp(&mut athlete, now);

                for score in [
                    athlete.hav_f.champion_readiness,
                    athlete.hav_f.cognitive_leverage,
                    athlete.hav_f.nil_trust_score,
                    athlete.hav_f.composite_score,
                ] {
                    let value = score.expect("populated").value();
                    assert!((0.0..=100.0).contains(&value), "score out of bounds: {value}");
                }
            }
        }
    }
}
