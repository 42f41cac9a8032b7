//! HAV-F (High-performance Athlete Valuation Framework) engine.
//!
//! Three sub-scores — champion readiness, cognitive leverage, NIL trust —
//! blended into a composite. Every score is clamped to [0, 100] at one
//! decimal. Missing inputs fall back to the documented defaults or the
//! absent sentinel; given identical inputs and the same `now`, output is
//! bit-identical across runs.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{Athlete, Biometrics, Score, Sport, StatLine};

#[cfg(test)]
mod tests;

/// Composite blend weights, fixed by the scoring contract.
const W_CHAMPION: f64 = 0.40;
const W_COGNITIVE: f64 = 0.35;
const W_NIL: f64 = 0.25;

/// Champion readiness: 0.5·performance + 0.4·physical + 0.1·trajectory.
pub fn champion_readiness(athlete: &Athlete, today: NaiveDate) -> Score {
    let performance = performance_score(athlete.sport, &athlete.stats);
    let physical = physical_score(athlete.biometrics.as_ref());
    let trajectory = trajectory_score(athlete.bio.as_ref().and_then(|b| b.dob), today);

    Score::clamped(0.5 * performance + 0.4 * physical + 0.1 * trajectory)
}

/// Sport-specific performance blend. An empty stat line scores the
/// baseline 50 regardless of sport.
fn performance_score(sport: Sport, stats: &StatLine) -> f64 {
    if stats.performances.is_empty() {
        return 50.0;
    }

    match sport {
        Sport::Baseball => {
            let war = stats.metric("war").unwrap_or(0.0);
            let wpa = stats.metric("wpa").unwrap_or(0.0);
            Score::clamped(30.0 * war + 200.0 * wpa + 30.0).value()
        }
        Sport::Nfl => {
            let epa = stats.metric("epa").unwrap_or(0.0);
            Score::clamped(50.0 + 2.0 * epa).value()
        }
        Sport::NcaaFootball | Sport::HsFootball => {
            let yards = stats.metric("total_yards").unwrap_or(0.0);
            let tds = stats.metric("total_tds").unwrap_or(0.0);
            Score::clamped(yards / 100.0 + 5.0 * tds).value()
        }
        // No performance formula is defined for these sports; the
        // baseline keeps their physical and trajectory signals relevant.
        Sport::Basketball | Sport::IntlBaseball => 50.0,
    }
}

/// Mean of the available biometric sub-scores; 50 when none are observed.
fn physical_score(biometrics: Option<&Biometrics>) -> f64 {
    let Some(bio) = biometrics else {
        return 50.0;
    };

    let mut scores = Vec::with_capacity(4);

    if let Some(hrv) = bio.hrv_rmssd_ms {
        scores.push(Score::clamped((hrv - 20.0) * 1.25).value());
    }
    if let Some(reaction) = bio.reaction_ms {
        scores.push(Score::clamped(100.0 - (reaction - 150.0) * 0.5).value());
    }
    if let Some(gsr) = bio.gsr_microsiemens {
        scores.push(Score::clamped(100.0 - (gsr - 2.0) * 10.0).value());
    }
    if let Some(sleep) = bio.sleep_hours {
        let sleep_score = if (7.0..=9.0).contains(&sleep) {
            100.0
        } else {
            Score::clamped(100.0 - (8.0 - sleep).abs() * 20.0).value()
        };
        scores.push(sleep_score);
    }

    if scores.is_empty() {
        50.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Peak-age trajectory band. 24-28 is modelled as the athletic peak.
fn trajectory_score(dob: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(dob) = dob else {
        return 50.0;
    };

    let age = (today - dob).num_days() as f64 / 365.25;
    if (24.0..=28.0).contains(&age) {
        90.0
    } else if (20.0..24.0).contains(&age) {
        70.0 + (age - 20.0) * 5.0
    } else if age > 28.0 && age <= 35.0 {
        90.0 - (age - 28.0) * 5.0
    } else {
        50.0
    }
}

/// Cognitive leverage: 0.6·neural efficiency + 0.4·composure.
///
/// Returns the documented 25.0 floor whenever no biometric observation
/// exists (missing structure or all-null fields).
pub fn cognitive_leverage(athlete: &Athlete) -> Score {
    let bio = match athlete.biometrics.as_ref() {
        Some(bio) if !bio.is_empty() => bio,
        _ => return Score::clamped(25.0),
    };

    let neural = match bio.reaction_ms {
        // 150 ms maps to 100, 250 ms to 0.
        Some(reaction) => Score::clamped(100.0 - (reaction - 150.0)).value(),
        None => 50.0,
    };

    let mut composure_parts = Vec::with_capacity(2);
    if let Some(hrv) = bio.hrv_rmssd_ms {
        composure_parts.push(Score::clamped((hrv - 20.0) * 1.25).value());
    }
    if let Some(gsr) = bio.gsr_microsiemens {
        composure_parts.push(Score::clamped(100.0 - (gsr - 2.0) * 10.0).value());
    }
    let composure = if composure_parts.is_empty() {
        50.0
    } else {
        composure_parts.iter().sum::<f64>() / composure_parts.len() as f64
    };

    Score::clamped(0.6 * neural + 0.4 * composure)
}

/// NIL trust: 0.6·authenticity + 0.25·velocity + 0.15·salience.
///
/// Returns the documented 15.0 floor for a missing or all-null profile.
pub fn nil_trust(athlete: &Athlete) -> Score {
    let nil = match athlete.nil_profile.as_ref() {
        Some(nil) if !nil.is_empty() => nil,
        _ => return Score::clamped(15.0),
    };

    // engagement_rate is a 0-1 fraction; 5% engagement saturates at 100.
    let authenticity = match nil.engagement_rate {
        Some(rate) => Score::clamped(rate * 2000.0).value(),
        None => 50.0,
    };

    let mut velocity_parts = Vec::with_capacity(2);
    if let Some(deals) = nil.deals_last_90d {
        velocity_parts.push(Score::clamped(deals as f64 * 10.0).value());
    }
    if let Some(value) = nil.deal_value_90d_usd {
        velocity_parts.push(Score::clamped(value / 1000.0).value());
    }
    let velocity = if velocity_parts.is_empty() {
        50.0
    } else {
        velocity_parts.iter().sum::<f64>() / velocity_parts.len() as f64
    };

    let mut salience_parts = Vec::with_capacity(2);
    if let Some(search) = nil.search_index {
        salience_parts.push(Score::clamped(search).value());
    }
    if let Some(local) = nil.local_popularity_index {
        salience_parts.push(Score::clamped(local).value());
    }
    let salience = if salience_parts.is_empty() {
        50.0
    } else {
        salience_parts.iter().sum::<f64>() / salience_parts.len() as f64
    };

    Score::clamped(0.6 * authenticity + 0.25 * velocity + 0.15 * salience)
}

/// Composite of the three sub-scores; populated only when all three are.
pub fn composite(
    champion: Option<Score>,
    cognitive: Option<Score>,
    nil: Option<Score>,
) -> Option<Score> {
    match (champion, cognitive, nil) {
        (Some(ch), Some(co), Some(ni)) => Some(Score::clamped(
            W_CHAMPION * ch.value() + W_COGNITIVE * co.value() + W_NIL * ni.value(),
        )),
        _ => None,
    }
}

/// Compute and stamp HAV-F on one athlete. Also advances
/// `meta.updated_at` so it stays the newest timestamp in the record.
pub fn stamp(athlete: &mut Athlete, now: DateTime<Utc>) {
    let champion = Some(champion_readiness(athlete, now.date_naive()));
    let cognitive = Some(cognitive_leverage(athlete));
    let nil = Some(nil_trust(athlete));

    athlete.hav_f.champion_readiness = champion;
    athlete.hav_f.cognitive_leverage = cognitive;
    athlete.hav_f.nil_trust_score = nil;
    athlete.hav_f.composite_score = composite(champion, cognitive, nil);
    athlete.hav_f.last_computed_at = Some(now);
    athlete.meta.updated_at = now;
}

/// Stamp a whole batch with a single shared timestamp.
pub fn stamp_all(athletes: &mut [Athlete], now: DateTime<Utc>) {
    for athlete in athletes {
        stamp(athlete, now);
    }
}
