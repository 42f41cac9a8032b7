//! Ingestion orchestrator: sequences agents in priority order,
//! aggregates readiness, validates the persisted schema, and reports a
//! per-stage summary.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tracing::warn;

use crate::agents::{run_league, AgentContext, AgentReport};
use crate::error::{FieldhouseError, Result};
use crate::model::{Athlete, League, Team, TeamId};
use crate::providers::{Credentials, FixtureStore, PayloadCache};
use crate::readiness;
use crate::store::Store;
use crate::validate;

use super::{EXIT_OK, EXIT_STAGE_FAILED};

#[derive(Debug)]
pub struct RunParams {
    pub live: bool,
    pub leagues: Option<Vec<String>>,
    pub focus_teams: Vec<String>,
    pub agent: Option<String>,
    pub skip_tests: bool,
    pub skip_readiness: bool,
    pub out_dir: PathBuf,
    pub fixtures_dir: PathBuf,
}

/// One ✓/✗ row in the final summary.
struct StageResult {
    name: String,
    ok: bool,
    detail: Option<String>,
}

impl StageResult {
    fn ok(name: impl Into<String>) -> Self {
        StageResult {
            name: name.into(),
            ok: true,
            detail: None,
        }
    }

    fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StageResult {
            name: name.into(),
            ok: false,
            detail: Some(reason.into()),
        }
    }
}

/// Run the pipeline; the returned code is the process exit status.
/// Configuration problems surface as `Err` before any work begins.
pub async fn handle_run(params: RunParams) -> Result<i32> {
    let leagues = resolve_leagues(params.leagues.as_deref())?;
    let focus: Vec<TeamId> = params
        .focus_teams
        .iter()
        .map(|t| TeamId::from(t.trim()))
        .collect();

    let store = Store::new(&params.out_dir);
    let ctx = AgentContext {
        live: params.live,
        credentials: Credentials::from_env(),
        fixtures: FixtureStore::new(&params.fixtures_dir),
        payload_cache: PayloadCache::default_location(),
        now: Utc::now(),
        shutdown: spawn_signal_watch(),
    };

    // Single-agent mode: run one league, report, exit with its status.
    if let Some(agent) = &params.agent {
        let league = League::from_str(agent)?;
        let report = run_league(league, &ctx, &store).await;
        print_agent_block(&report, params.live);
        return Ok(if report.succeeded() { EXIT_OK } else { EXIT_STAGE_FAILED });
    }

    println!("{:=<60}", "");
    println!("FIELDHOUSE INGESTION ORCHESTRATOR");
    println!("{:=<60}", "");
    println!("Live fetch mode: {}", params.live);
    println!(
        "Target leagues: {}",
        leagues.iter().map(|l| l.key()).collect::<Vec<_>>().join(", ")
    );

    let mut stages: Vec<StageResult> = Vec::new();
    let mut reports: Vec<AgentReport> = Vec::new();
    let mut interrupted = false;

    for league in &leagues {
        if ctx.shutting_down() {
            warn!("shutdown requested, skipping remaining leagues");
            interrupted = true;
            break;
        }
        let report = run_league(*league, &ctx, &store).await;
        print_agent_block(&report, params.live);
        stages.push(match &report.error {
            None => StageResult::ok(format!("agent:{}", league.key())),
            Some(reason) => StageResult::failed(format!("agent:{}", league.key()), reason.clone()),
        });
        reports.push(report);
    }

    // Run-level unified file covers everything that made it to disk.
    let (teams, athletes) = collect_unified(&mut reports);
    stages.push(match store.write_unified(teams, athletes, ctx.now) {
        Ok(path) => {
            println!("\nUnified dataset: {}", path.display());
            StageResult::ok("unified")
        }
        Err(err) => StageResult::failed("unified", err.to_string()),
    });

    if params.skip_readiness || interrupted {
        println!("Readiness board skipped");
    } else {
        stages.push(run_readiness(&store, &focus, &ctx));
    }

    if params.skip_tests || interrupted {
        println!("Validation skipped");
    } else {
        stages.push(run_validation(&store));
    }

    if interrupted {
        stages.push(StageResult::failed("run", "interrupted by signal"));
    }

    print_summary(&stages);
    let all_ok = stages.iter().all(|s| s.ok);
    Ok(if all_ok { EXIT_OK } else { EXIT_STAGE_FAILED })
}

/// Resolve the CLI league list, preserving the declared priority order
/// when none is given. Unknown names are fatal config errors.
fn resolve_leagues(raw: Option<&[String]>) -> Result<Vec<League>> {
    let Some(raw) = raw else {
        return Ok(League::ALL.to_vec());
    };
    let mut leagues = Vec::with_capacity(raw.len());
    for name in raw {
        let league = League::from_str(name.trim())?;
        if leagues.contains(&league) {
            return Err(FieldhouseError::config(format!("league listed twice: {league}")));
        }
        leagues.push(league);
    }
    if leagues.is_empty() {
        return Err(FieldhouseError::config("no leagues selected"));
    }
    Ok(leagues)
}

/// Concatenate athletes across leagues and merge teams observed by more
/// than one agent (the NIL board shares franchises with NCAA).
fn collect_unified(reports: &mut Vec<AgentReport>) -> (Vec<Team>, Vec<Athlete>) {
    let mut teams: Vec<Team> = Vec::new();
    let mut athletes = Vec::new();
    for report in reports.iter_mut() {
        for team in report.teams.drain(..) {
            match teams.iter_mut().find(|t| t.team_id == team.team_id) {
                Some(existing) => existing.roster.extend(team.roster),
                None => teams.push(team),
            }
        }
        athletes.append(&mut report.athletes);
    }
    (teams, athletes)
}

fn run_readiness(store: &Store, focus: &[TeamId], ctx: &AgentContext) -> StageResult {
    let envelopes = store.read_all_leagues();
    if envelopes.is_empty() {
        return StageResult::failed("readiness", "no league data found; run agents first");
    }

    let leagues: Vec<(String, Vec<Athlete>)> = envelopes
        .into_iter()
        .map(|e| (e.league.to_lowercase(), e.players))
        .collect();
    let board = readiness::compute_board(&leagues, focus, ctx.now);

    println!("\n{:=<20} READINESS BOARD {:=<20}", "", "");
    for (key, league) in &board.sports {
        println!(
            "  {:<6} {:>3} teams, average {:.1}",
            key,
            league.teams.len(),
            league.average_readiness
        );
    }
    for team in &board.featured {
        println!(
            "  * {:<12} {:>5.1} {:?} ({} players, {} stars)",
            team.team_id.as_str(),
            team.readiness_score,
            team.status,
            team.players_count,
            team.stars_count
        );
    }

    match store.write_readiness(&board) {
        Ok(path) => {
            println!("Readiness board: {}", path.display());
            StageResult::ok("readiness")
        }
        Err(err) => StageResult::failed("readiness", err.to_string()),
    }
}

fn run_validation(store: &Store) -> StageResult {
    let envelopes = store.read_all_leagues();
    let problems = validate::validate_envelopes(&envelopes);
    if problems.is_empty() {
        println!(
            "\nValidation: {} leagues, {} players ok",
            envelopes.len(),
            envelopes.iter().map(|e| e.players.len()).sum::<usize>()
        );
        StageResult::ok("validation")
    } else {
        for problem in &problems {
            warn!(%problem, "schema violation");
        }
        StageResult::failed(
            "validation",
            anyhow!("{} schema violations, first: {}", problems.len(), problems[0]).to_string(),
        )
    }
}

fn print_agent_block(report: &AgentReport, live: bool) {
    println!("\n{:=<20} {} AGENT {:=<20}", "", report.league.key().to_uppercase(), "");
    println!("Live mode: {live}");
    println!("Stage reached: {}", report.stage);
    println!(
        "Players: {} ({} dropped), duration: {:.2}s",
        report.players,
        report.dropped,
        report.duration.as_secs_f64()
    );
    if let Some(error) = &report.error {
        println!("Error: {error}");
    }
}

fn print_summary(stages: &[StageResult]) {
    println!("\n{:=<60}", "");
    println!("FINAL STATUS");
    println!("{:=<60}", "");
    let ok_count = stages.iter().filter(|s| s.ok).count();
    for stage in stages {
        let mark = if stage.ok { "✓" } else { "✗" };
        match &stage.detail {
            Some(reason) if !stage.ok => println!("  {mark} {:<16} {reason}", stage.name),
            _ => println!("  {mark} {}", stage.name),
        }
    }
    println!("Stages passed: {}/{}", ok_count, stages.len());
}

/// SIGINT/SIGTERM set a flag; agents finish their current stage, the
/// orchestrator writes what is complete and exits non-zero.
fn spawn_signal_watch() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watched = Arc::clone(&flag);
    tokio::spawn(async move {
        super::shutdown_signal().await;
        warn!("shutdown signal received, finishing current league");
        watched.store(true, Ordering::Relaxed);
    });
    flag
}
