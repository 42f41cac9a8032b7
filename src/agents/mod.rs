//! League ingestion agents.
//!
//! Each agent owns one provider family: it composes the provider's
//! responses into a single payload (live mode) or loads the equivalent
//! canned payload, then walks that shape into provider-agnostic
//! `RawRecord`s. The shared pipeline here runs fetch → normalize →
//! score → write as a small state machine; any error parks the agent in
//! `Failed` and is reported, never propagated past the orchestrator.

pub mod hs;
pub mod intl;
pub mod mlb;
pub mod nba;
pub mod ncaa;
pub mod nfl;
pub mod nil;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::model::{Athlete, League, Team};
use crate::normalize::{self, RawRecord};
use crate::havf;
use crate::providers::{Credentials, FixtureStore, PayloadCache};
use crate::store::Store;

/// Everything an agent needs that outlives a single league run.
pub struct AgentContext {
    pub live: bool,
    pub credentials: Credentials,
    pub fixtures: FixtureStore,
    pub payload_cache: PayloadCache,
    pub now: DateTime<Utc>,
    /// Set by the signal handler; agents finish the current stage and
    /// stop before starting the next league.
    pub shutdown: Arc<AtomicBool>,
}

impl AgentContext {
    pub fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Pipeline position reached by an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStage {
    Idle,
    Fetching,
    Normalizing,
    Scoring,
    Writing,
    Done,
    Failed,
}

impl std::fmt::Display for AgentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentStage::Idle => "idle",
            AgentStage::Fetching => "fetching",
            AgentStage::Normalizing => "normalizing",
            AgentStage::Scoring => "scoring",
            AgentStage::Writing => "writing",
            AgentStage::Done => "done",
            AgentStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one agent run, consumed by the orchestrator and by the
/// unified-file writer.
#[derive(Debug)]
pub struct AgentReport {
    pub league: League,
    pub stage: AgentStage,
    pub players: usize,
    pub dropped: usize,
    pub error: Option<String>,
    pub duration: Duration,
    pub athletes: Vec<Athlete>,
    pub teams: Vec<Team>,
}

impl AgentReport {
    pub fn succeeded(&self) -> bool {
        self.stage == AgentStage::Done
    }
}

/// Concrete agents behind one dispatch point.
pub enum AnyAgent {
    Mlb(mlb::MlbAgent),
    Nfl(nfl::NflAgent),
    Ncaa(ncaa::NcaaAgent),
    Nba(nba::NbaAgent),
    Hs(hs::HsAgent),
    Nil(nil::NilAgent),
    Intl(intl::IntlAgent),
}

impl AnyAgent {
    /// Construct the agent for `league` with its default franchise focus.
    pub fn for_league(league: League, credentials: &Credentials) -> Result<Self, FetchError> {
        Ok(match league {
            League::Mlb => AnyAgent::Mlb(mlb::MlbAgent::new("STL")?),
            League::Nfl => AnyAgent::Nfl(nfl::NflAgent::new("TEN")?),
            League::Ncaa => AnyAgent::Ncaa(ncaa::NcaaAgent::new("Texas", credentials)?),
            League::Nba => AnyAgent::Nba(nba::NbaAgent::new("MEM")?),
            League::Hs => AnyAgent::Hs(hs::HsAgent::new()?),
            League::Nil => AnyAgent::Nil(nil::NilAgent::new()?),
            League::Intl => AnyAgent::Intl(intl::IntlAgent::new("KBO", credentials)?),
        })
    }

    pub fn league(&self) -> League {
        match self {
            AnyAgent::Mlb(_) => League::Mlb,
            AnyAgent::Nfl(_) => League::Nfl,
            AnyAgent::Ncaa(_) => League::Ncaa,
            AnyAgent::Nba(_) => League::Nba,
            AnyAgent::Hs(_) => League::Hs,
            AnyAgent::Nil(_) => League::Nil,
            AnyAgent::Intl(_) => League::Intl,
        }
    }

    pub fn sources(&self) -> &'static [&'static str] {
        match self {
            AnyAgent::Mlb(_) => mlb::SOURCES,
            AnyAgent::Nfl(_) => nfl::SOURCES,
            AnyAgent::Ncaa(_) => ncaa::SOURCES,
            AnyAgent::Nba(_) => nba::SOURCES,
            AnyAgent::Hs(_) => hs::SOURCES,
            AnyAgent::Nil(_) => nil::SOURCES,
            AnyAgent::Intl(_) => intl::SOURCES,
        }
    }

    /// Default team code for records the provider leaves unattributed.
    pub fn default_team(&self) -> Option<&str> {
        match self {
            AnyAgent::Mlb(a) => Some(a.team()),
            AnyAgent::Nfl(a) => Some(a.team()),
            AnyAgent::Ncaa(_) => Some("TEX"),
            AnyAgent::Nba(a) => Some(a.team()),
            AnyAgent::Hs(_) => None,
            AnyAgent::Nil(_) => None,
            AnyAgent::Intl(_) => None,
        }
    }

    async fn fetch_live(&mut self, ctx: &AgentContext) -> Result<Value, FetchError> {
        match self {
            AnyAgent::Mlb(a) => a.fetch_live(ctx).await,
            AnyAgent::Nfl(a) => a.fetch_live(ctx).await,
            AnyAgent::Ncaa(a) => a.fetch_live(ctx).await,
            AnyAgent::Nba(a) => a.fetch_live(ctx).await,
            AnyAgent::Hs(a) => a.fetch_live(ctx).await,
            AnyAgent::Nil(a) => a.fetch_live(ctx).await,
            AnyAgent::Intl(a) => a.fetch_live(ctx).await,
        }
    }

    pub fn parse(&self, payload: &Value) -> Vec<RawRecord> {
        match self {
            AnyAgent::Mlb(_) => mlb::parse(payload),
            AnyAgent::Nfl(_) => nfl::parse(payload),
            AnyAgent::Ncaa(_) => ncaa::parse(payload),
            AnyAgent::Nba(_) => nba::parse(payload),
            AnyAgent::Hs(_) => hs::parse(payload),
            AnyAgent::Nil(_) => nil::parse(payload),
            AnyAgent::Intl(_) => intl::parse(payload),
        }
    }

    /// Live payload when enabled (caching it for replay), else the
    /// replay cache in live mode, else fixtures. `None` means "nothing
    /// to ingest", which is a successful zero-player run.
    async fn fetch_raw(&mut self, ctx: &AgentContext) -> Option<Value> {
        let league = self.league();
        if ctx.credentials.live_enabled(ctx.live, league) {
            match self.fetch_live(ctx).await {
                Ok(payload) => {
                    ctx.payload_cache.store(league, &payload);
                    return Some(payload);
                }
                Err(err) => {
                    warn!(league = %league, error = %err, "live fetch failed, falling back");
                    if let Some(cached) = ctx.payload_cache.load(league) {
                        return Some(cached);
                    }
                }
            }
        } else if ctx.live {
            info!(league = %league, "credential or LIVE_FETCH missing, using fixtures");
        }
        ctx.fixtures.load(league)
    }
}

/// Run the full agent pipeline for one league.
pub async fn run_league(league: League, ctx: &AgentContext, store: &Store) -> AgentReport {
    let started = std::time::Instant::now();
    let mut report = AgentReport {
        league,
        stage: AgentStage::Idle,
        players: 0,
        dropped: 0,
        error: None,
        duration: Duration::ZERO,
        athletes: Vec::new(),
        teams: Vec::new(),
    };

    let mut agent = match AnyAgent::for_league(league, &ctx.credentials) {
        Ok(agent) => agent,
        Err(err) => {
            report.stage = AgentStage::Failed;
            report.error = Some(err.to_string());
            report.duration = started.elapsed();
            return report;
        }
    };

    // idle -> fetching
    report.stage = AgentStage::Fetching;
    let payload = agent.fetch_raw(ctx).await;

    // fetching -> normalizing (an absent payload normalizes to zero records)
    report.stage = AgentStage::Normalizing;
    let records = payload.as_ref().map(|p| agent.parse(p)).unwrap_or_default();
    let outcome = normalize::normalize_batch(
        league,
        agent.default_team(),
        agent.sources(),
        records,
        ctx.now,
    );
    report.dropped = outcome.dropped.len();
    let mut athletes = outcome.athletes;

    // normalizing -> scoring
    report.stage = AgentStage::Scoring;
    havf::stamp_all(&mut athletes, ctx.now);

    // scoring -> writing
    report.stage = AgentStage::Writing;
    let teams = normalize::teams_from_athletes(&athletes);
    match store.write_league(league, &athletes, ctx.now) {
        Ok(path) => {
            info!(league = %league, players = athletes.len(), path = %path.display(), "league persisted");
            report.players = athletes.len();
            report.athletes = athletes;
            report.teams = teams;
            report.stage = AgentStage::Done;
        }
        Err(err) => {
            report.stage = AgentStage::Failed;
            report.error = Some(err.to_string());
        }
    }

    report.duration = started.elapsed();
    report
}
