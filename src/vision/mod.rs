//! Real-time vision inference pool.
//!
//! A dispatcher owns N worker processes (not threads) on TCP loopback,
//! each single-threaded internally; frames are balanced round-robin
//! with bounded per-worker queues. Workers run the primary detector
//! when one can be loaded and otherwise degrade permanently to the
//! functional fallback. The transport is 4-byte big-endian
//! length-prefixed JSON with message boundaries preserved, so any
//! worker speaking the same frames interoperates.

pub mod detector;
pub mod dispatcher;
pub mod protocol;
pub mod worker;

pub use detector::{Detector, FallbackDetector};
pub use dispatcher::{Dispatcher, VisionPoolConfig};
pub use protocol::{
    Detection, DetectionFrame, InferenceOptions, Request, Response, SportAnalysis, VisionSport,
    WorkerStats,
};
pub use worker::{Worker, WorkerState};

/// Per-frame latency budget; frames at or under it are championship
/// compliant.
pub const CHAMPIONSHIP_LATENCY_MS: f64 = 33.0;
