use crate::kind::SizeClass;
use crate::types::LicensePlate;
use serde::{Deserialize, Serialize};

/// A slot as persisted by the durable store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot_number: u32,
    pub size: SizeClass,
    /// Plate of the vehicle assigned to this slot, if any.
    #[serde(default)]
    pub occupant: Option<LicensePlate>,
}

impl SlotRecord {
    pub fn new(slot_number: u32, size: SizeClass) -> Self {
        Self {
            slot_number,
            size,
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// A level and its ordered slots as persisted by the durable store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelRecord {
    pub level_number: u32,
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
}

impl LevelRecord {
    pub fn new(level_number: u32) -> Self {
        Self {
            level_number,
            slots: Vec::new(),
        }
    }

    pub fn slot(&self, slot_number: u32) -> Option<&SlotRecord> {
        self.slots.iter().find(|s| s.slot_number == slot_number)
    }

    pub fn highest_slot_number(&self) -> Option<u32> {
        self.slots.iter().map(|s| s.slot_number).max()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }
}

/// The canonical record of a parked vehicle.
///
/// `vehicle_type` is kept as the raw stored string: records written by older
/// tooling may carry a type the engine no longer recognizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRecord {
    pub license_plate: LicensePlate,
    pub vehicle_type: String,
    pub parked_at: String,
}

/// A vehicle joined with the coordinate of the slot it occupies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkedVehicle {
    pub license_plate: LicensePlate,
    pub vehicle_type: String,
    pub level: u32,
    pub slot_number: u32,
    pub parked_at: String,
}
