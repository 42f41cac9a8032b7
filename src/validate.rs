//! Schema validation stage: re-reads persisted league files and checks
//! the contract downstream consumers rely on.

use std::collections::HashSet;

use crate::model::Score;
use crate::store::LeagueEnvelope;

/// Check every persisted envelope; returns human-readable violations
/// (empty means the stage passed).
pub fn validate_envelopes(envelopes: &[LeagueEnvelope]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for envelope in envelopes {
        for player in &envelope.players {
            let id = player.player_id.as_str();

            if !seen_ids.insert(id) {
                problems.push(format!("{}: duplicate player_id {}", envelope.league, id));
            }

            if player.meta.sources.is_empty() {
                problems.push(format!("{id}: meta.sources is empty"));
            }

            let havf = &player.hav_f;
            for (name, score) in [
                ("champion_readiness", havf.champion_readiness),
                ("cognitive_leverage", havf.cognitive_leverage),
                ("nil_trust_score", havf.nil_trust_score),
                ("composite_score", havf.composite_score),
            ] {
                if let Some(score) = score {
                    if !in_bounds(score) {
                        problems.push(format!("{id}: {name} out of bounds ({score})"));
                    }
                }
            }

            if havf.composite_score.is_some()
                && (havf.champion_readiness.is_none()
                    || havf.cognitive_leverage.is_none()
                    || havf.nil_trust_score.is_none())
            {
                problems.push(format!("{id}: composite populated without all sub-scores"));
            }

            if let Some(computed) = havf.last_computed_at {
                if player.meta.updated_at < computed {
                    problems.push(format!("{id}: meta.updated_at older than last_computed_at"));
                }
            }
        }
    }

    problems
}

fn in_bounds(score: Score) -> bool {
    (0.0..=100.0).contains(&score.value())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{Athlete, HavF, Meta, PlayerId, Sport, StatLine, TeamId};
    use crate::store::LeagueEnvelope;

    fn athlete(provider_id: &str) -> Athlete {
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let team_id = TeamId::new("MLB", "STL");
        Athlete {
            player_id: PlayerId::derive(&team_id, provider_id),
            name: "A".to_string(),
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

    fn envelope(league: &str, players: Vec<Athlete>) -> LeagueEnvelope {
        LeagueEnvelope {
            league: league.to_string(),
            generated_at: Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(),
            players,
        }
    }

    #[test]
    fn test_clean_run_validates() {
        let envelopes = vec![
            envelope("MLB", vec![athlete("a"), athlete("b")]),
            envelope("NFL", vec![athlete("c")]),
        ];
        assert!(validate_envelopes(&envelopes).is_empty());
    }

    #[test]
    fn test_duplicate_ids_across_leagues_flagged() {
        let envelopes = vec![
            envelope("MLB", vec![athlete("a")]),
            envelope("NFL", vec![athlete("a")]),
        ];
        let problems = validate_envelopes(&envelopes);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("duplicate player_id"));
    }

    #[test]
    fn test_composite_without_subscores_flagged() {
        let mut bad = athlete("x");
        bad.hav_f.composite_score = Some(Score::clamped(70.0));
        let problems = validate_envelopes(&[envelope("MLB", vec![bad])]);
        assert!(problems.iter().any(|p| p.contains("without all sub-scores")));
    }

    #[test]
    fn test_empty_sources_flagged() {
        let mut bad = athlete("y");
        bad.meta.sources.clear();
        let problems = validate_envelopes(&[envelope("MLB", vec![bad])]);
        assert!(problems.iter().any(|p| p.contains("meta.sources")));
    }

    #[test]
    fn test_stale_updated_at_flagged() {
        let mut bad = athlete("z");
        bad.hav_f.last_computed_at =
            Some(Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap());
        let problems = validate_envelopes(&[envelope("MLB", vec![bad])]);
        assert!(problems.iter().any(|p| p.contains("updated_at")));
    }
}
