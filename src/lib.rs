//! fieldhouse: multi-sport athlete intelligence pipeline.
//!
//! Ingests heterogeneous provider data into one canonical athlete
//! record, computes the HAV-F composite evaluation, rolls scored
//! rosters up into team readiness, and serves a real-time vision
//! inference worker pool over a loopback transport.

pub mod agents;
pub mod cli;
pub mod commands;
pub mod error;
pub mod havf;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod readiness;
pub mod store;
pub mod teams;
pub mod validate;
pub mod vision;

// Re-export commonly used types
pub use error::{FieldhouseError, FetchError, NormalizeError, Result, VisionError};
pub use model::{Athlete, HavF, League, PlayerId, Score, Sport, Team, TeamId};
pub use providers::credentials::LIVE_FETCH;
