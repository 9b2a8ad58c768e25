use crate::level::Level;
use crate::slot::Slot;
use crate::vehicle::Vehicle;
use crate::CoreError;
use parkade_schema::SizeClass;
use serde::{Deserialize, Serialize};

/// A level + slot coordinate inside the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLocation {
    pub level: u32,
    pub slot: u32,
}

/// The whole facility: levels in storage order.
#[derive(Debug, Clone, Default)]
pub struct Lot {
    levels: Vec<Level>,
}

impl Lot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_level(&mut self, level_number: u32) {
        self.levels.push(Level::new(level_number));
    }

    pub fn add_slot(
        &mut self,
        level_number: u32,
        size: SizeClass,
        slot_number: u32,
    ) -> Result<(), CoreError> {
        self.level_mut(level_number)
            .ok_or(CoreError::LevelNotFound(level_number))?
            .add_slot(size, slot_number);
        Ok(())
    }

    /// Global first-fit: levels in order, the first level with room wins.
    pub fn park(&mut self, vehicle: &Vehicle) -> Option<SlotLocation> {
        self.levels.iter_mut().find_map(|level| {
            let number = level.number();
            level.first_fit(vehicle).map(|slot| SlotLocation {
                level: number,
                slot: slot.number(),
            })
        })
    }

    /// Exact placement at a stored coordinate, bypassing first-fit and the
    /// size rule. Returns false for a missing level or slot, or a taken slot.
    pub fn park_at_spot(&mut self, vehicle: &Vehicle, level_number: u32, slot_number: u32) -> bool {
        self.level_mut(level_number)
            .is_some_and(|level| level.place_at(vehicle, slot_number))
    }

    /// Number of the level that owns `slot`.
    pub fn find_vehicle_level(&self, slot: &Slot) -> Result<u32, CoreError> {
        self.levels
            .iter()
            .find(|level| level.contains(slot))
            .map(Level::number)
            .ok_or(CoreError::DetachedSlot(slot.number()))
    }

    pub fn find_vehicle(&self, plate: &str) -> Option<&Slot> {
        self.levels.iter().find_map(|level| level.find_by_plate(plate))
    }

    /// Plate lookup resolved to a coordinate.
    pub fn locate(&self, plate: &str) -> Option<SlotLocation> {
        let slot = self.find_vehicle(plate)?;
        let level = self.find_vehicle_level(slot).ok()?;
        Some(SlotLocation {
            level,
            slot: slot.number(),
        })
    }

    pub fn leave_from_spot(
        &mut self,
        plate: &str,
        level_number: u32,
        slot_number: u32,
    ) -> Option<Vehicle> {
        self.level_mut(level_number)?
            .release_by_plate(plate, slot_number)
    }

    pub fn free_spots(&self) -> usize {
        self.levels.iter().map(Level::free_count).sum()
    }

    pub fn total_spots(&self) -> usize {
        self.levels.iter().map(Level::capacity).sum()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, level_number: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.number() == level_number)
    }

    fn level_mut(&mut self, level_number: u32) -> Option<&mut Level> {
        self.levels.iter_mut().find(|l| l.number() == level_number)
    }
}
