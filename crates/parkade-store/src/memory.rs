use crate::{FacilityDocument, FacilityStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// In-process store for tests and ephemeral servers.
///
/// Can be switched offline to simulate an unreachable database.
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<FacilityDocument>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: FacilityDocument) -> Self {
        Self {
            document: Mutex::new(document),
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every read and write fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_owned()));
        }
        Ok(())
    }
}

impl FacilityStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read_document(&self) -> Result<FacilityDocument, StoreError> {
        self.check_online()?;
        Ok(self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn update_document(
        &self,
        apply: &mut dyn FnMut(&mut FacilityDocument) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let mut guard = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        let mut draft = guard.clone();
        apply(&mut draft)?;
        *guard = draft;
        Ok(())
    }
}
