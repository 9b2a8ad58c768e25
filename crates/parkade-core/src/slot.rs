use crate::vehicle::Vehicle;
use parkade_schema::SizeClass;

/// A single parking unit holding at most one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    number: u32,
    size: SizeClass,
    occupant: Option<Vehicle>,
}

impl Slot {
    pub fn new(number: u32, size: SizeClass) -> Self {
        Self {
            number,
            size,
            occupant: None,
        }
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn size(&self) -> SizeClass {
        self.size
    }

    pub fn occupant(&self) -> Option<&Vehicle> {
        self.occupant.as_ref()
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// Unoccupied and large enough for the vehicle.
    pub fn can_accept(&self, vehicle: &Vehicle) -> bool {
        self.is_free() && self.size.accepts(vehicle.size_class())
    }

    /// Occupy the slot if [`can_accept`](Self::can_accept) holds. No side
    /// effect on refusal.
    pub fn place(&mut self, vehicle: &Vehicle) -> bool {
        if !self.can_accept(vehicle) {
            return false;
        }
        self.occupant = Some(vehicle.clone());
        true
    }

    /// Occupy a vacant slot without the size check. Restoration only: stored
    /// assignments are trusted even when they break the fit rule.
    pub(crate) fn occupy(&mut self, vehicle: &Vehicle) -> bool {
        if !self.is_free() {
            return false;
        }
        self.occupant = Some(vehicle.clone());
        true
    }

    /// Clear the occupant, returning it. Releasing an empty slot is a no-op.
    pub fn release(&mut self) -> Option<Vehicle> {
        self.occupant.take()
    }
}
