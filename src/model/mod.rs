//! Canonical data model shared by every pipeline stage.
//!
//! Provider-shaped payloads live with their agents; everything downstream
//! of the normalizer sees only these types. Absence is always `None`
//! (serialized as JSON `null`), never 0 or an empty string.

pub mod athlete;
pub mod league;
pub mod team;


pub use athlete::{
    Athlete, Bio, Biometrics, HavF, InjuryStatus, Meta, NilProfile, PlayerId, Projection,
    Recruiting, Score, StatLine,
};
pub use league::{League, Sport};
pub use team::{Location, SeasonRecord, Team, TeamId};
