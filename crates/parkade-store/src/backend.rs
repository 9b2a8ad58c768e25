use crate::{FacilityDocument, StoreError};
use parkade_schema::{LevelRecord, ParkedVehicle, SizeClass, VehicleRecord};
use std::sync::Arc;

/// Durable storage for one facility.
///
/// Implementors supply whole-document reads and an atomic read-modify-write;
/// the record-level operations are provided on top of those two.
pub trait FacilityStore: Send + Sync {
    fn name(&self) -> &str;

    fn read_document(&self) -> Result<FacilityDocument, StoreError>;

    /// Load the current document, apply `apply`, and persist the result.
    /// Nothing is persisted when `apply` fails.
    fn update_document(
        &self,
        apply: &mut dyn FnMut(&mut FacilityDocument) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// All levels ordered by level number.
    fn levels(&self) -> Result<Vec<LevelRecord>, StoreError> {
        Ok(self.read_document()?.sorted_levels())
    }

    fn parked_vehicles(&self) -> Result<Vec<ParkedVehicle>, StoreError> {
        Ok(self.read_document()?.parked_vehicles())
    }

    fn vehicle(&self, plate: &str) -> Result<Option<VehicleRecord>, StoreError> {
        Ok(self.read_document()?.vehicle(plate).cloned())
    }

    fn record_parking(
        &self,
        vehicle: &VehicleRecord,
        level: u32,
        slot: u32,
    ) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.record_parking(vehicle, level, slot))
    }

    /// Delete a vehicle record, returning the slot it was assigned to.
    fn remove_vehicle(&self, plate: &str) -> Result<Option<(u32, u32)>, StoreError> {
        let mut freed = None;
        self.update_document(&mut |doc| {
            freed = doc.remove_vehicle(plate)?;
            Ok(())
        })?;
        Ok(freed)
    }

    fn insert_level(&self, level_number: u32) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.insert_level(level_number))
    }

    fn remove_level(&self, level_number: u32) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.remove_level(level_number))
    }

    fn insert_slot(&self, level: u32, slot: u32, size: SizeClass) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.insert_slot(level, slot, size))
    }

    fn remove_slot(&self, level: u32, slot: u32) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.remove_slot(level, slot))
    }

    /// Add several levels in one write. Fails without writing anything if any
    /// level number is already taken.
    fn insert_levels(&self, levels: &[LevelRecord]) -> Result<(), StoreError> {
        self.update_document(&mut |doc| doc.insert_levels(levels))
    }
}

impl<S: FacilityStore + ?Sized> FacilityStore for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_document(&self) -> Result<FacilityDocument, StoreError> {
        (**self).read_document()
    }

    fn update_document(
        &self,
        apply: &mut dyn FnMut(&mut FacilityDocument) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        (**self).update_document(apply)
    }
}

/// Open a store backend by name. `root` is ignored by the memory backend.
pub fn select_store(
    name: &str,
    root: &std::path::Path,
) -> Result<Box<dyn FacilityStore>, StoreError> {
    match name {
        "file" => Ok(Box::new(crate::FileStore::new(root))),
        "memory" => Ok(Box::new(crate::MemoryStore::new())),
        other => Err(StoreError::Unavailable(format!(
            "unknown store backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn select_valid_stores() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(select_store("file", dir.path()).unwrap().name(), "file");
        assert_eq!(select_store("memory", dir.path()).unwrap().name(), "memory");
    }

    #[test]
    fn select_unknown_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(select_store("mongo", dir.path()).is_err());
    }

    #[test]
    fn arc_forwards_to_inner_store() {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<MemoryStore> = Arc::clone(&store);
        shared.insert_level(1).unwrap();
        assert_eq!(store.levels().unwrap().len(), 1);
    }

    #[test]
    fn remove_vehicle_reports_freed_slot() {
        let store = MemoryStore::new();
        store.insert_level(1).unwrap();
        store.insert_slot(1, 1, SizeClass::Car).unwrap();
        let record = VehicleRecord {
            license_plate: "AAA111".into(),
            vehicle_type: "Car".to_owned(),
            parked_at: "2025-01-01T00:00:00Z".to_owned(),
        };
        store.record_parking(&record, 1, 1).unwrap();
        assert_eq!(store.remove_vehicle("AAA111").unwrap(), Some((1, 1)));
        assert!(store.vehicle("AAA111").unwrap().is_none());
    }

    #[test]
    fn failed_update_leaves_document_untouched() {
        let store = MemoryStore::new();
        store.insert_level(1).unwrap();
        assert!(store.insert_level(1).is_err());
        assert!(store
            .insert_levels(&[LevelRecord::new(2), LevelRecord::new(1)])
            .is_err());
        assert_eq!(store.levels().unwrap().len(), 1);
    }
}
