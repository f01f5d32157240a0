//! Error taxonomy for the engine.
//!
//! Configuration problems surface as [`CatalogError`] at startup. Calling an
//! operation with out-of-range input or in the wrong phase is a caller bug and
//! surfaces as [`SimulationError`], [`ShotError`] or [`ContestError`].
//! [`SessionError`] wraps all of them for the session facade.
use thiserror::Error;

use crate::equipment::EquipmentSlot;
use crate::shot::ShotPhase;
use crate::venue::VenueLockReason;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{table} catalog failed to parse: {source}")]
    Parse {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown {slot} equipment id `{id}`")]
    UnknownEquipment { id: String, slot: EquipmentSlot },
    #[error("unknown venue id `{0}`")]
    UnknownVenue(String),
    #[error("unknown weather id `{0}`")]
    UnknownWeather(String),
    #[error("unknown chest type `{0}`")]
    UnknownChest(String),
    #[error("duplicate {table} id `{id}`")]
    DuplicateId { table: &'static str, id: String },
    #[error("{table} entry `{id}` is malformed: {reason}")]
    Malformed {
        table: &'static str,
        id: String,
        reason: String,
    },
    #[error("{0} catalog is empty")]
    Empty(&'static str),
}

impl CatalogError {
    pub(crate) fn malformed(table: &'static str, id: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            table,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("{field} must be within 0..=100 (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ShotError {
    #[error("`{trigger}` is not valid while the shot is {phase:?}")]
    InvalidTrigger {
        trigger: &'static str,
        phase: ShotPhase,
    },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContestError {
    #[error("no contest is active")]
    NoActiveContest,
    #[error("the current round has no balls remaining")]
    RoundComplete,
    #[error("the contest is already decided")]
    ContestDecided,
    #[error("the current round has not been won yet")]
    RoundNotWon,
    #[error("no opponent is available for tier {0}")]
    NoOpponentForTier(u8),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Shot(#[from] ShotError),
    #[error(transparent)]
    Contest(#[from] ContestError),
    #[error("venue `{venue}` is locked: {reason:?}")]
    VenueLocked {
        venue: String,
        reason: VenueLockReason,
    },
    #[error("equipment `{0}` is not owned")]
    NotOwned(String),
}
