//! Rebuilding the in-memory lot from durable storage.
//!
//! The lot is always rebuilt from scratch: levels in ascending order with
//! their slots in stored order, then every stored occupant is placed at its
//! exact recorded coordinate. Stored assignments are trusted, so the size
//! rule is not re-checked; an occupant that cannot be placed is skipped and
//! reported instead of failing the whole reload.

use crate::lot::Lot;
use crate::vehicle::{resolve_kind, Vehicle};
use parkade_schema::LicensePlate;
use parkade_store::{FacilityStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOccupant {
    pub license_plate: LicensePlate,
    pub level: u32,
    pub slot: u32,
    pub reason: String,
}

/// Summary of one reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub levels: usize,
    pub slots: usize,
    pub restored: usize,
    pub skipped: Vec<SkippedOccupant>,
}

pub fn restore_lot(store: &dyn FacilityStore) -> Result<(Lot, RestoreReport), StoreError> {
    let doc = store.read_document()?;
    let levels = doc.sorted_levels();

    let mut lot = Lot::new();
    let mut report = RestoreReport::default();
    for level in &levels {
        lot.add_level(level.level_number);
        for slot in &level.slots {
            // The level was just added, so this cannot miss.
            if lot
                .add_slot(level.level_number, slot.size, slot.slot_number)
                .is_ok()
            {
                report.slots += 1;
            }
        }
        report.levels += 1;
    }

    for parked in doc.parked_vehicles() {
        let kind = resolve_kind(&parked.vehicle_type);
        let vehicle = Vehicle::new(parked.license_plate.clone(), kind);

        let stored_size = doc
            .level(parked.level)
            .and_then(|l| l.slot(parked.slot_number))
            .map(|s| s.size);
        if let Some(size) = stored_size {
            if !size.accepts(kind.size_class()) {
                warn!(
                    "restoring {} ({kind}) into {size} slot {} on level {}",
                    parked.license_plate, parked.slot_number, parked.level
                );
            }
        }

        let placed_elsewhere = lot.find_vehicle(&parked.license_plate).is_some();
        if !placed_elsewhere && lot.park_at_spot(&vehicle, parked.level, parked.slot_number) {
            report.restored += 1;
            continue;
        }

        let reason = if placed_elsewhere {
            "vehicle already placed elsewhere"
        } else if lot
            .level(parked.level)
            .and_then(|l| l.slot(parked.slot_number))
            .is_some()
        {
            "slot already occupied"
        } else {
            "slot does not exist"
        };
        warn!(
            "skipping occupant {} at level {} slot {}: {reason}",
            parked.license_plate, parked.level, parked.slot_number
        );
        report.skipped.push(SkippedOccupant {
            license_plate: parked.license_plate,
            level: parked.level,
            slot: parked.slot_number,
            reason: reason.to_owned(),
        });
    }

    debug!(
        "rebuilt lot from {} store: {} free of {}",
        store.name(),
        lot.free_spots(),
        lot.total_spots()
    );
    info!(
        "facility loaded: {} levels, {} slots, {} vehicles restored, {} skipped",
        report.levels,
        report.slots,
        report.restored,
        report.skipped.len()
    );
    Ok((lot, report))
}
