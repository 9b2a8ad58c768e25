//! Durable facility storage for Parkade.
//!
//! The allocation engine treats durable storage as an external collaborator it
//! synchronizes against. This crate provides that boundary: the
//! [`FacilityStore`] trait, the [`FacilityDocument`] shape both backends share,
//! a file-backed [`FileStore`] (atomic JSON writes, blake3 checksum, format
//! version marker, advisory lock), and an in-process [`MemoryStore`].

pub mod backend;
pub mod document;
pub mod file;
pub mod layout;
pub mod lock;
pub mod memory;

pub use backend::{select_store, FacilityStore};
pub use document::FacilityDocument;
pub use file::FileStore;
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use lock::StoreLock;
pub use memory::MemoryStore;

use std::path::Path;
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("integrity check failed for facility document: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("level {0} already exists")]
    LevelExists(u32),
    #[error("level {0} not found")]
    LevelNotFound(u32),
    #[error("slot {slot} already exists on level {level}")]
    SlotExists { level: u32, slot: u32 },
    #[error("slot {slot} not found on level {level}")]
    SlotNotFound { level: u32, slot: u32 },
    #[error("slot {slot} on level {level} is occupied")]
    SlotOccupied { level: u32, slot: u32 },
    #[error("vehicle record already exists: {0}")]
    VehicleExists(String),
    #[error("vehicle record not found: {0}")]
    VehicleNotFound(String),
}

impl StoreError {
    /// Whether the error means the store could not be reached at all, as
    /// opposed to rejecting a particular operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Io(_) | StoreError::LockFailed(_) | StoreError::Unavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_slot_coordinates() {
        let e = StoreError::SlotOccupied { level: 2, slot: 7 };
        let msg = e.to_string();
        assert!(msg.contains("level 2"));
        assert!(msg.contains("slot 7"));
    }

    #[test]
    fn store_error_display_version_mismatch() {
        let e = StoreError::VersionMismatch {
            expected: 2,
            found: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn store_error_display_integrity_failure() {
        let e = StoreError::IntegrityFailure {
            expected: "exp".to_owned(),
            actual: "act".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exp"));
        assert!(msg.contains("act"));
    }

    #[test]
    fn unavailable_classification() {
        assert!(StoreError::Unavailable("down".to_owned()).is_unavailable());
        assert!(StoreError::LockFailed("busy".to_owned()).is_unavailable());
        assert!(!StoreError::LevelNotFound(1).is_unavailable());
        assert!(!StoreError::VehicleExists("AAA111".to_owned()).is_unavailable());
    }
}
