//! Slot allocation engine for Parkade.
//!
//! The in-memory facility is a `Lot` of ordered `Level`s, each an ordered run
//! of `Slot`s. Vehicles are placed first-fit by size class, or at an exact
//! coordinate when occupancy is restored from durable storage. The `Engine`
//! wraps a lot behind a single mutex, keeps it synchronized with a
//! `FacilityStore`, and exposes the park/leave/admin operations used by the
//! CLI and the HTTP server.

pub mod engine;
pub mod level;
pub mod lot;
pub mod restore;
pub mod slot;
pub mod vehicle;

pub use engine::{
    Engine, EngineOptions, LeaveOutcome, LevelView, Occupancy, ParkingTicket, SlotView,
};
pub use level::Level;
pub use lot::{Lot, SlotLocation};
pub use restore::{restore_lot, RestoreReport, SkippedOccupant};
pub use slot::Slot;
pub use vehicle::{resolve_kind, Vehicle};

use parkade_schema::{LayoutError, PlateError, VehicleKind};
use parkade_store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`CoreError`], used by the outer surfaces to
/// pick exit codes and HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NoAvailableSpot,
    NotFound,
    IntegrityViolation,
    InconsistentState,
    StorageUnavailable,
    InvalidInput,
    Internal,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("vehicle already parked: {0}")]
    AlreadyExists(String),
    #[error("no available spot for {0}")]
    NoAvailableSpot(VehicleKind),
    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),
    #[error("level {0} not found")]
    LevelNotFound(u32),
    #[error("slot {slot} not found on level {level}")]
    SlotNotFound { level: u32, slot: u32 },
    #[error("slot {0} does not belong to any level")]
    DetachedSlot(u32),
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("invalid vehicle type: '{0}'")]
    InvalidVehicleType(String),
    #[error("invalid license plate: {0}")]
    Plate(#[from] PlateError),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            return CoreError::StorageUnavailable(e.to_string());
        }
        match e {
            StoreError::VehicleExists(plate) => CoreError::AlreadyExists(plate),
            StoreError::VehicleNotFound(plate) => CoreError::VehicleNotFound(plate),
            StoreError::LevelNotFound(level) => CoreError::LevelNotFound(level),
            StoreError::SlotNotFound { level, slot } => CoreError::SlotNotFound { level, slot },
            StoreError::LevelExists(_)
            | StoreError::SlotExists { .. }
            | StoreError::SlotOccupied { .. } => CoreError::IntegrityViolation(e.to_string()),
            other => CoreError::Store(other),
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CoreError::NoAvailableSpot(_) => ErrorKind::NoAvailableSpot,
            CoreError::VehicleNotFound(_)
            | CoreError::LevelNotFound(_)
            | CoreError::SlotNotFound { .. }
            | CoreError::DetachedSlot(_) => ErrorKind::NotFound,
            CoreError::IntegrityViolation(_) => ErrorKind::IntegrityViolation,
            CoreError::InconsistentState(_) => ErrorKind::InconsistentState,
            CoreError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            CoreError::InvalidVehicleType(_) | CoreError::Plate(_) | CoreError::Layout(_) => {
                ErrorKind::InvalidInput
            }
            CoreError::Store(_) => ErrorKind::Internal,
        }
    }
}
