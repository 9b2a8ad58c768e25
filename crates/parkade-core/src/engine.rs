use crate::lot::{Lot, SlotLocation};
use crate::restore::{restore_lot, RestoreReport};
use crate::vehicle::{resolve_kind, Vehicle};
use crate::CoreError;
use parkade_schema::{
    FacilityLayout, LicensePlate, ParkedVehicle, SizeClass, VehicleKind, VehicleRecord,
};
use parkade_store::{FacilityStore, FileStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Reject unrecognized vehicle types instead of treating them as cars.
    pub strict_vehicle_types: bool,
}

/// Issued for every successful park.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingTicket {
    pub license_plate: LicensePlate,
    pub vehicle_type: VehicleKind,
    pub level: u32,
    pub slot: u32,
    pub parked_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LeaveOutcome {
    Released {
        license_plate: LicensePlate,
        level: u32,
        slot: u32,
    },
    /// The durable record had no matching occupant; the record was dropped.
    StaleRecordRemoved { license_plate: LicensePlate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub free: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub slot_number: u32,
    pub size: SizeClass,
    pub occupant: Option<LicensePlate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelView {
    pub level_number: u32,
    pub capacity: usize,
    pub free: usize,
    pub slots: Vec<SlotView>,
}

impl LevelView {
    fn of(level: &crate::Level) -> Self {
        Self {
            level_number: level.number(),
            capacity: level.capacity(),
            free: level.free_count(),
            slots: level
                .slots()
                .iter()
                .map(|s| SlotView {
                    slot_number: s.number(),
                    size: s.size(),
                    occupant: s.occupant().map(|v| v.plate().clone()),
                })
                .collect(),
        }
    }
}

enum Placement {
    Recorded(SlotLocation),
    /// The store's shape no longer matches the lot.
    Stale(StoreError),
}

/// The allocation engine: one lot kept in step with one durable store.
///
/// Every operation runs under a single mutex that is held across its store
/// calls, so check-then-act on a slot is atomic. When the store cannot be
/// loaded the engine holds no lot at all; each request then retries the load
/// once and fails with [`CoreError::StorageUnavailable`] rather than serving
/// an empty or partial facility.
pub struct Engine {
    store: Box<dyn FacilityStore>,
    options: EngineOptions,
    state: Mutex<Option<Lot>>,
}

impl Engine {
    /// Create an engine and load the facility from `store`.
    ///
    /// A failed initial load is logged, not returned: the engine starts
    /// unavailable and recovers on the first request that loads successfully.
    pub fn new(store: Box<dyn FacilityStore>, options: EngineOptions) -> Self {
        let lot = match restore_lot(store.as_ref()) {
            Ok((lot, _)) => Some(lot),
            Err(e) => {
                error!("initial facility load from {} store failed: {e}", store.name());
                None
            }
        };
        Self {
            store,
            options,
            state: Mutex::new(lot),
        }
    }

    pub fn with_file_store(root: impl Into<PathBuf>, options: EngineOptions) -> Self {
        Self::new(Box::new(FileStore::new(root)), options)
    }

    pub fn store(&self) -> &dyn FacilityStore {
        self.store.as_ref()
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Whether a lot is currently loaded.
    pub fn is_available(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Lot>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reload_locked(&self, state: &mut Option<Lot>) -> Result<RestoreReport, CoreError> {
        *state = None;
        match restore_lot(self.store.as_ref()) {
            Ok((lot, report)) => {
                *state = Some(lot);
                Ok(report)
            }
            Err(e) => {
                error!("facility reload failed, engine unavailable: {e}");
                Err(CoreError::StorageUnavailable(e.to_string()))
            }
        }
    }

    fn lot_mut<'a>(&self, state: &'a mut Option<Lot>) -> Result<&'a mut Lot, CoreError> {
        if state.is_none() {
            debug!("engine unavailable, retrying facility load");
            self.reload_locked(state)?;
        }
        state
            .as_mut()
            .ok_or_else(|| CoreError::StorageUnavailable("facility not loaded".to_owned()))
    }

    fn vehicle_kind(&self, raw: &str) -> Result<VehicleKind, CoreError> {
        if self.options.strict_vehicle_types {
            VehicleKind::parse(raw).ok_or_else(|| CoreError::InvalidVehicleType(raw.to_owned()))
        } else {
            Ok(resolve_kind(raw))
        }
    }

    /// Discard the in-memory lot and rebuild it from the store.
    pub fn reload(&self) -> Result<RestoreReport, CoreError> {
        let mut state = self.lock();
        let report = self.reload_locked(&mut state)?;
        info!(
            "reloaded facility: {} levels, {} slots",
            report.levels, report.slots
        );
        Ok(report)
    }

    /// First-fit a vehicle and persist its record and slot assignment.
    pub fn park(&self, vehicle_type: &str, license_plate: &str) -> Result<ParkingTicket, CoreError> {
        let plate = LicensePlate::parse(license_plate)?;
        let kind = self.vehicle_kind(vehicle_type)?;
        let vehicle = Vehicle::new(plate.clone(), kind);

        let mut state = self.lock();
        let lot = self.lot_mut(&mut state)?;

        if self.store.vehicle(&plate)?.is_some() || lot.find_vehicle(&plate).is_some() {
            return Err(CoreError::AlreadyExists(plate.into_inner()));
        }

        let record = VehicleRecord {
            license_plate: plate.clone(),
            vehicle_type: kind.name().to_owned(),
            parked_at: chrono::Utc::now().to_rfc3339(),
        };
        let location = match self.place_and_record(lot, &vehicle, &record)? {
            Placement::Recorded(location) => location,
            Placement::Stale(e) => {
                // Another process changed the store; retry once on a fresh lot.
                debug!("lot out of step with the store ({e}), reloading before retrying {plate}");
                self.reload_locked(&mut state)?;
                let lot = self.lot_mut(&mut state)?;
                if lot.find_vehicle(&plate).is_some() {
                    return Err(CoreError::AlreadyExists(plate.into_inner()));
                }
                match self.place_and_record(lot, &vehicle, &record)? {
                    Placement::Recorded(location) => location,
                    Placement::Stale(e) => {
                        *state = None;
                        return Err(CoreError::InconsistentState(e.to_string()));
                    }
                }
            }
        };

        info!(
            "parked {plate} ({kind}) at level {} slot {}",
            location.level, location.slot
        );
        Ok(ParkingTicket {
            license_plate: plate,
            vehicle_type: kind,
            level: location.level,
            slot: location.slot,
            parked_at: record.parked_at,
        })
    }

    /// First-fit `vehicle` and persist the assignment, undoing the placement
    /// if the store refuses it.
    fn place_and_record(
        &self,
        lot: &mut Lot,
        vehicle: &Vehicle,
        record: &VehicleRecord,
    ) -> Result<Placement, CoreError> {
        let location = lot
            .park(vehicle)
            .ok_or(CoreError::NoAvailableSpot(vehicle.kind()))?;
        match self
            .store
            .record_parking(record, location.level, location.slot)
        {
            Ok(()) => Ok(Placement::Recorded(location)),
            Err(e) => {
                lot.leave_from_spot(vehicle.plate(), location.level, location.slot);
                warn!(
                    "failed to persist {} at level {} slot {}: {e}",
                    vehicle.plate(),
                    location.level,
                    location.slot
                );
                match e {
                    StoreError::LevelNotFound(_)
                    | StoreError::SlotNotFound { .. }
                    | StoreError::SlotOccupied { .. } => Ok(Placement::Stale(e)),
                    other => Err(other.into()),
                }
            }
        }
    }

    /// Release a vehicle and delete its durable record.
    pub fn leave(&self, license_plate: &str) -> Result<LeaveOutcome, CoreError> {
        let mut state = self.lock();
        let lot = self.lot_mut(&mut state)?;

        if self.store.vehicle(license_plate)?.is_none() {
            if let Some(loc) = lot.locate(license_plate) {
                lot.leave_from_spot(license_plate, loc.level, loc.slot);
                warn!(
                    "{license_plate} held level {} slot {} without a durable record; released",
                    loc.level, loc.slot
                );
            }
            return Err(CoreError::VehicleNotFound(license_plate.to_owned()));
        }

        let plate = LicensePlate::from(license_plate);
        if let Some(loc) = lot.locate(license_plate) {
            self.store.remove_vehicle(license_plate)?;
            lot.leave_from_spot(license_plate, loc.level, loc.slot);
            info!(
                "{license_plate} left level {} slot {}",
                loc.level, loc.slot
            );
            Ok(LeaveOutcome::Released {
                license_plate: plate,
                level: loc.level,
                slot: loc.slot,
            })
        } else {
            warn!("{license_plate} has a durable record but no slot in memory; removing stale record");
            self.store.remove_vehicle(license_plate)?;
            Ok(LeaveOutcome::StaleRecordRemoved {
                license_plate: plate,
            })
        }
    }

    /// Every parked vehicle with its coordinate, as recorded in the store.
    pub fn parked(&self) -> Result<Vec<ParkedVehicle>, CoreError> {
        let mut state = self.lock();
        self.lot_mut(&mut state)?;
        Ok(self.store.parked_vehicles()?)
    }

    pub fn occupancy(&self) -> Result<Occupancy, CoreError> {
        let mut state = self.lock();
        let lot = self.lot_mut(&mut state)?;
        Ok(Occupancy {
            free: lot.free_spots(),
            total: lot.total_spots(),
        })
    }

    pub fn free_space(&self) -> Result<usize, CoreError> {
        Ok(self.occupancy()?.free)
    }

    pub fn total_space(&self) -> Result<usize, CoreError> {
        Ok(self.occupancy()?.total)
    }

    pub fn levels(&self) -> Result<Vec<LevelView>, CoreError> {
        let mut state = self.lock();
        let lot = self.lot_mut(&mut state)?;
        Ok(lot.levels().iter().map(LevelView::of).collect())
    }

    pub fn level(&self, level_number: u32) -> Result<LevelView, CoreError> {
        let mut state = self.lock();
        let lot = self.lot_mut(&mut state)?;
        lot.level(level_number)
            .map(LevelView::of)
            .ok_or(CoreError::LevelNotFound(level_number))
    }

    /// Add an empty level numbered one past the highest existing level.
    pub fn create_level(&self) -> Result<u32, CoreError> {
        let mut state = self.lock();
        self.lot_mut(&mut state)?;

        let next = self
            .store
            .levels()?
            .iter()
            .map(|l| l.level_number)
            .max()
            .map_or(1, |n| n + 1);
        self.store.insert_level(next)?;
        info!("created level {next}");
        self.reload_locked(&mut state)?;
        Ok(next)
    }

    /// Remove the highest-numbered level. Refused while any slot on it is
    /// occupied.
    pub fn delete_level(&self, level_number: u32) -> Result<(), CoreError> {
        let mut state = self.lock();
        self.lot_mut(&mut state)?;

        let levels = self.store.levels()?;
        let level = levels
            .iter()
            .find(|l| l.level_number == level_number)
            .ok_or(CoreError::LevelNotFound(level_number))?;
        let highest = levels.iter().map(|l| l.level_number).max();
        if highest != Some(level_number) {
            return Err(CoreError::IntegrityViolation(format!(
                "level {level_number} is not the highest-numbered level"
            )));
        }
        let occupied = level.occupied_count();
        if occupied > 0 {
            return Err(CoreError::IntegrityViolation(format!(
                "level {level_number} has {occupied} occupied slots"
            )));
        }

        self.store.remove_level(level_number)?;
        info!("deleted level {level_number}");
        self.reload_locked(&mut state)?;
        Ok(())
    }

    /// Append a slot numbered one past the highest slot on the level.
    pub fn create_slot(&self, level_number: u32, size: SizeClass) -> Result<u32, CoreError> {
        let mut state = self.lock();
        self.lot_mut(&mut state)?;

        let levels = self.store.levels()?;
        let level = levels
            .iter()
            .find(|l| l.level_number == level_number)
            .ok_or(CoreError::LevelNotFound(level_number))?;
        let next = level.highest_slot_number().map_or(1, |n| n + 1);

        self.store.insert_slot(level_number, next, size)?;
        info!("created {size} slot {next} on level {level_number}");
        self.reload_locked(&mut state)?;
        Ok(next)
    }

    /// Remove the highest-numbered slot of a level, if unoccupied.
    pub fn delete_slot(&self, level_number: u32, slot_number: u32) -> Result<(), CoreError> {
        let mut state = self.lock();
        self.lot_mut(&mut state)?;

        let levels = self.store.levels()?;
        let level = levels
            .iter()
            .find(|l| l.level_number == level_number)
            .ok_or(CoreError::LevelNotFound(level_number))?;
        let slot = level.slot(slot_number).ok_or(CoreError::SlotNotFound {
            level: level_number,
            slot: slot_number,
        })?;
        if level.highest_slot_number() != Some(slot_number) {
            return Err(CoreError::IntegrityViolation(format!(
                "slot {slot_number} is not the highest-numbered slot on level {level_number}"
            )));
        }
        if let Some(ref plate) = slot.occupant {
            return Err(CoreError::IntegrityViolation(format!(
                "slot {slot_number} on level {level_number} is occupied by {plate}"
            )));
        }

        self.store.remove_slot(level_number, slot_number)?;
        info!("deleted slot {slot_number} on level {level_number}");
        self.reload_locked(&mut state)?;
        Ok(())
    }

    /// Create every level and slot of `layout` in an empty facility.
    pub fn seed(&self, layout: &FacilityLayout) -> Result<RestoreReport, CoreError> {
        let records = layout.to_records()?;

        let mut state = self.lock();
        self.lot_mut(&mut state)?;
        if !self.store.levels()?.is_empty() {
            return Err(CoreError::IntegrityViolation(
                "facility already has levels; seeding requires an empty store".to_owned(),
            ));
        }

        self.store.insert_levels(&records)?;
        info!(
            "seeded facility with {} levels, {} slots",
            records.len(),
            layout.slot_count()
        );
        self.reload_locked(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkade_store::MemoryStore;
    use std::sync::Arc;

    fn engine_with(shape: &[&[SizeClass]]) -> (Engine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for (level_number, sizes) in (1u32..).zip(shape) {
            store.insert_level(level_number).unwrap();
            for (slot_number, size) in (1u32..).zip(*sizes) {
                store.insert_slot(level_number, slot_number, *size).unwrap();
            }
        }
        let engine = Engine::new(Box::new(Arc::clone(&store)), EngineOptions::default());
        (engine, store)
    }

    #[test]
    fn park_persists_record_and_assignment() {
        let (engine, store) = engine_with(&[&[SizeClass::Car, SizeClass::Bus]]);
        let ticket = engine.park("Bus", "BUS001").unwrap();
        assert_eq!(ticket.level, 1);
        assert_eq!(ticket.slot, 2);
        assert_eq!(ticket.vehicle_type, VehicleKind::Bus);

        let parked = store.parked_vehicles().unwrap();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].vehicle_type, "Bus");
        assert_eq!(parked[0].slot_number, 2);
    }

    #[test]
    fn park_rejects_known_plate() {
        let (engine, _) = engine_with(&[&[SizeClass::Car, SizeClass::Car]]);
        engine.park("Car", "AAA111").unwrap();
        assert!(matches!(
            engine.park("Car", "AAA111"),
            Err(CoreError::AlreadyExists(_))
        ));
        assert_eq!(engine.free_space().unwrap(), 1);
    }

    #[test]
    fn park_rejects_invalid_plate() {
        let (engine, _) = engine_with(&[&[SizeClass::Car]]);
        assert!(matches!(engine.park("Car", ""), Err(CoreError::Plate(_))));
        assert_eq!(engine.free_space().unwrap(), 1);
    }

    #[test]
    fn lenient_and_strict_vehicle_types() {
        let (engine, _) = engine_with(&[&[SizeClass::Car]]);
        let ticket = engine.park("hovercraft", "AAA111").unwrap();
        assert_eq!(ticket.vehicle_type, VehicleKind::Car);

        let store = MemoryStore::new();
        store.insert_level(1).unwrap();
        store.insert_slot(1, 1, SizeClass::Car).unwrap();
        let strict = Engine::new(
            Box::new(store),
            EngineOptions {
                strict_vehicle_types: true,
            },
        );
        assert!(matches!(
            strict.park("hovercraft", "AAA111"),
            Err(CoreError::InvalidVehicleType(_))
        ));
        assert!(strict.park("car", "AAA111").is_ok());
    }

    #[test]
    fn failed_persist_reloads_before_giving_up() {
        let (engine, store) = engine_with(&[&[SizeClass::Car]]);
        engine.occupancy().unwrap();
        // Slot removed behind the engine's back.
        store.remove_slot(1, 1).unwrap();

        assert!(matches!(
            engine.park("Car", "AAA111"),
            Err(CoreError::NoAvailableSpot(VehicleKind::Car))
        ));
        assert!(store.vehicle("AAA111").unwrap().is_none());
        assert_eq!(engine.total_space().unwrap(), 0);
    }

    #[test]
    fn park_retries_when_slot_was_taken_elsewhere() {
        let (engine, store) = engine_with(&[&[SizeClass::Car, SizeClass::Car]]);
        engine.occupancy().unwrap();
        let record = VehicleRecord {
            license_plate: "OTHER1".into(),
            vehicle_type: "Car".to_owned(),
            parked_at: "2025-01-01T00:00:00Z".to_owned(),
        };
        store.record_parking(&record, 1, 1).unwrap();

        let ticket = engine.park("Car", "AAA111").unwrap();
        assert_eq!((ticket.level, ticket.slot), (1, 2));
        assert_eq!(engine.free_space().unwrap(), 0);
        assert!(matches!(
            engine.park("Car", "OTHER1"),
            Err(CoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn stale_record_is_removed_on_leave() {
        let (engine, store) = engine_with(&[&[SizeClass::Car]]);
        store
            .update_document(&mut |doc| {
                doc.vehicles.push(VehicleRecord {
                    license_plate: "GHOST1".into(),
                    vehicle_type: "Car".to_owned(),
                    parked_at: "2025-01-01T00:00:00Z".to_owned(),
                });
                Ok(())
            })
            .unwrap();

        let outcome = engine.leave("GHOST1").unwrap();
        assert!(matches!(outcome, LeaveOutcome::StaleRecordRemoved { .. }));
        assert!(store.vehicle("GHOST1").unwrap().is_none());
        assert!(matches!(
            engine.leave("GHOST1"),
            Err(CoreError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn unavailable_store_fails_fast_then_recovers() {
        let (engine, store) = engine_with(&[&[SizeClass::Car]]);
        store.set_offline(true);
        assert!(matches!(
            engine.reload(),
            Err(CoreError::StorageUnavailable(_))
        ));
        assert!(!engine.is_available());
        assert!(matches!(
            engine.park("Car", "AAA111"),
            Err(CoreError::StorageUnavailable(_))
        ));

        store.set_offline(false);
        assert_eq!(engine.free_space().unwrap(), 1);
        assert!(engine.is_available());
    }

    #[test]
    fn level_view_lists_slots_and_occupants() {
        let (engine, _) = engine_with(&[&[SizeClass::Motorcycle, SizeClass::Bus]]);
        engine.park("Bus", "BUS001").unwrap();
        let view = engine.level(1).unwrap();
        assert_eq!(view.capacity, 2);
        assert_eq!(view.free, 1);
        assert_eq!(view.slots[1].occupant.as_deref(), Some("BUS001"));
        assert!(matches!(engine.level(9), Err(CoreError::LevelNotFound(9))));
    }

    #[test]
    fn leave_outcome_serializes_with_tag() {
        let outcome = LeaveOutcome::Released {
            license_plate: "AAA111".into(),
            level: 1,
            slot: 2,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "released");
        assert_eq!(json["slot"], 2);
    }
}
