use crate::StoreError;
use parkade_schema::{LevelRecord, ParkedVehicle, SizeClass, SlotRecord, VehicleRecord};
use serde::{Deserialize, Serialize};

/// The complete durable state of one facility.
///
/// Both store backends persist exactly this shape; every mutation is a method
/// here so the two backends cannot drift apart in their integrity rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacilityDocument {
    #[serde(default)]
    pub levels: Vec<LevelRecord>,
    #[serde(default)]
    pub vehicles: Vec<VehicleRecord>,
    /// blake3 checksum over the document with this field cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl FacilityDocument {
    pub(crate) fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string_pretty(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Verify the embedded checksum. Documents without one are accepted.
    pub fn verify_checksum(&self) -> Result<(), StoreError> {
        if let Some(ref expected) = self.checksum {
            let actual = self.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Levels ordered by level number; slots keep their stored order.
    pub fn sorted_levels(&self) -> Vec<LevelRecord> {
        let mut levels = self.levels.clone();
        levels.sort_by_key(|l| l.level_number);
        levels
    }

    pub fn level(&self, level_number: u32) -> Option<&LevelRecord> {
        self.levels.iter().find(|l| l.level_number == level_number)
    }

    fn level_mut(&mut self, level_number: u32) -> Result<&mut LevelRecord, StoreError> {
        self.levels
            .iter_mut()
            .find(|l| l.level_number == level_number)
            .ok_or(StoreError::LevelNotFound(level_number))
    }

    fn slot_mut(&mut self, level: u32, slot: u32) -> Result<&mut SlotRecord, StoreError> {
        self.level_mut(level)?
            .slots
            .iter_mut()
            .find(|s| s.slot_number == slot)
            .ok_or(StoreError::SlotNotFound { level, slot })
    }

    pub fn vehicle(&self, plate: &str) -> Option<&VehicleRecord> {
        self.vehicles.iter().find(|v| v.license_plate == *plate)
    }

    /// Every occupied slot joined with its vehicle record, in level then slot
    /// order. Slots pointing at a missing vehicle record are left out.
    pub fn parked_vehicles(&self) -> Vec<ParkedVehicle> {
        let mut parked = Vec::new();
        for level in self.sorted_levels() {
            for slot in &level.slots {
                let Some(ref plate) = slot.occupant else {
                    continue;
                };
                let Some(record) = self.vehicle(plate) else {
                    tracing::warn!(
                        "slot {} on level {} references missing vehicle record {plate}",
                        slot.slot_number,
                        level.level_number
                    );
                    continue;
                };
                parked.push(ParkedVehicle {
                    license_plate: record.license_plate.clone(),
                    vehicle_type: record.vehicle_type.clone(),
                    level: level.level_number,
                    slot_number: slot.slot_number,
                    parked_at: record.parked_at.clone(),
                });
            }
        }
        parked
    }

    /// Create the vehicle record and assign it to the given slot.
    pub fn record_parking(
        &mut self,
        vehicle: &VehicleRecord,
        level: u32,
        slot: u32,
    ) -> Result<(), StoreError> {
        if self.vehicle(&vehicle.license_plate).is_some() {
            return Err(StoreError::VehicleExists(
                vehicle.license_plate.to_string(),
            ));
        }
        let target = self.slot_mut(level, slot)?;
        if target.is_occupied() {
            return Err(StoreError::SlotOccupied { level, slot });
        }
        target.occupant = Some(vehicle.license_plate.clone());
        self.vehicles.push(vehicle.clone());
        Ok(())
    }

    /// Delete the vehicle record and clear any slot assigned to it.
    ///
    /// Returns the `(level, slot)` that was freed, if the vehicle had one.
    pub fn remove_vehicle(&mut self, plate: &str) -> Result<Option<(u32, u32)>, StoreError> {
        let before = self.vehicles.len();
        self.vehicles.retain(|v| v.license_plate != *plate);
        if self.vehicles.len() == before {
            return Err(StoreError::VehicleNotFound(plate.to_owned()));
        }

        let mut freed = None;
        for level in &mut self.levels {
            for slot in &mut level.slots {
                if slot.occupant.as_deref() == Some(plate) {
                    slot.occupant = None;
                    freed = Some((level.level_number, slot.slot_number));
                }
            }
        }
        Ok(freed)
    }

    pub fn insert_level(&mut self, level_number: u32) -> Result<(), StoreError> {
        if self.level(level_number).is_some() {
            return Err(StoreError::LevelExists(level_number));
        }
        self.levels.push(LevelRecord::new(level_number));
        Ok(())
    }

    /// Remove a level and its slots. Refused while any slot is occupied.
    pub fn remove_level(&mut self, level_number: u32) -> Result<(), StoreError> {
        let level = self.level_mut(level_number)?;
        if let Some(slot) = level.slots.iter().find(|s| s.is_occupied()) {
            return Err(StoreError::SlotOccupied {
                level: level_number,
                slot: slot.slot_number,
            });
        }
        self.levels.retain(|l| l.level_number != level_number);
        Ok(())
    }

    pub fn insert_slot(
        &mut self,
        level_number: u32,
        slot_number: u32,
        size: SizeClass,
    ) -> Result<(), StoreError> {
        let level = self.level_mut(level_number)?;
        if level.slot(slot_number).is_some() {
            return Err(StoreError::SlotExists {
                level: level_number,
                slot: slot_number,
            });
        }
        level.slots.push(SlotRecord::new(slot_number, size));
        Ok(())
    }

    /// Remove an unoccupied slot.
    pub fn remove_slot(&mut self, level_number: u32, slot_number: u32) -> Result<(), StoreError> {
        if self.slot_mut(level_number, slot_number)?.is_occupied() {
            return Err(StoreError::SlotOccupied {
                level: level_number,
                slot: slot_number,
            });
        }
        self.level_mut(level_number)?
            .slots
            .retain(|s| s.slot_number != slot_number);
        Ok(())
    }

    /// Add whole levels at once, as when seeding an empty facility.
    pub fn insert_levels(&mut self, levels: &[LevelRecord]) -> Result<(), StoreError> {
        for level in levels {
            if self.level(level.level_number).is_some() {
                return Err(StoreError::LevelExists(level.level_number));
            }
        }
        self.levels.extend_from_slice(levels);
        Ok(())
    }
}
