//! CLI argument definitions and parsing structures.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "fieldhouse", about = "Multi-sport athlete intelligence pipeline")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the ingestion pipeline: fetch, normalize, score, persist,
    /// then aggregate readiness and validate the persisted schema.
    Run {
        /// Perform outbound requests (also requires `LIVE_FETCH=1` and
        /// per-provider credentials; anything missing falls back to
        /// fixtures).
        #[clap(long)]
        live: bool,

        /// Leagues to ingest, comma separated
        /// (`mlb,nfl,ncaa,nba,hs,nil,intl`). Defaults to all, in
        /// priority order.
        #[clap(long, value_delimiter = ',')]
        leagues: Option<Vec<String>>,

        /// Teams surfaced in the readiness board's featured block, in
        /// order.
        #[clap(
            long,
            value_delimiter = ',',
            default_value = "MLB-STL,NFL-TEN,NCAA-TEX,NBA-MEM"
        )]
        focus_teams: Vec<String>,

        /// Run a single agent and exit with its status.
        #[clap(long)]
        agent: Option<String>,

        /// Skip the schema validation stage.
        #[clap(long)]
        skip_tests: bool,

        /// Skip readiness board generation.
        #[clap(long)]
        skip_readiness: bool,

        /// Output directory for leagues/, unified/, readiness.json.
        #[clap(long, default_value = "data")]
        out_dir: PathBuf,

        /// Directory of canned provider payloads.
        #[clap(long, default_value = "fixtures")]
        fixtures_dir: PathBuf,
    },

    /// Serve the vision inference worker pool on TCP loopback.
    Vision {
        /// Worker process count; defaults to the CPU count.
        #[clap(long)]
        workers: Option<usize>,

        /// First loopback port (worker N listens on port + N); 0 picks
        /// ephemeral ports.
        #[clap(long, default_value_t = 0)]
        port: u16,

        /// Primary detector weights; unloadable or absent weights
        /// degrade the pool to the functional fallback.
        #[clap(long)]
        model: Option<PathBuf>,

        /// Feed N synthetic frames through the pool, print the latency
        /// histogram and compliance rate, then exit.
        #[clap(long)]
        bench_frames: Option<usize>,

        /// Run as a single worker process instead of the pool owner:
        /// bind `--port`, print a one-line JSON ready report on stdout,
        /// serve until the shutdown command. The dispatcher passes this
        /// when spawning its children.
        #[clap(long)]
        worker_id: Option<usize>,
    },
}
