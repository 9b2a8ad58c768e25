use crate::slot::Slot;
use crate::vehicle::Vehicle;
use parkade_schema::SizeClass;

/// An ordered run of slots with a cached free count.
///
/// The cache is adjusted by every placement and release that goes through the
/// level; slots are never handed out mutably, so it cannot drift.
#[derive(Debug, Clone)]
pub struct Level {
    number: u32,
    slots: Vec<Slot>,
    free: usize,
}

impl Level {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            slots: Vec::new(),
            free: 0,
        }
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Append an empty slot. Numbering is the caller's responsibility.
    pub fn add_slot(&mut self, size: SizeClass, slot_number: u32) {
        self.slots.push(Slot::new(slot_number, size));
        self.free += 1;
    }

    /// Place the vehicle in the first slot, in order, that accepts it.
    pub fn first_fit(&mut self, vehicle: &Vehicle) -> Option<&Slot> {
        let idx = self.slots.iter().position(|s| s.can_accept(vehicle))?;
        self.slots[idx].place(vehicle);
        self.free -= 1;
        Some(&self.slots[idx])
    }

    /// Exact placement used by restoration. Refuses a missing or occupied
    /// slot; the size rule is not checked.
    pub fn place_at(&mut self, vehicle: &Vehicle, slot_number: u32) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.number() == slot_number) else {
            return false;
        };
        if !slot.occupy(vehicle) {
            return false;
        }
        self.free -= 1;
        true
    }

    /// Release slot `slot_number` if its occupant carries `plate`.
    pub fn release_by_plate(&mut self, plate: &str, slot_number: u32) -> Option<Vehicle> {
        let slot = self.slots.iter_mut().find(|s| {
            s.number() == slot_number && s.occupant().is_some_and(|v| *v.plate() == *plate)
        })?;
        let vehicle = slot.release()?;
        self.free += 1;
        Some(vehicle)
    }

    pub fn find_by_plate(&self, plate: &str) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.occupant().is_some_and(|v| *v.plate() == *plate))
    }

    pub fn free_count(&self) -> usize {
        self.free
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, slot_number: u32) -> Option<&Slot> {
        self.slots.iter().find(|s| s.number() == slot_number)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether `slot` is one of this level's own slots (identity, not equality).
    pub fn contains(&self, slot: &Slot) -> bool {
        self.slots.iter().any(|s| std::ptr::eq(s, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with(sizes: &[SizeClass]) -> Level {
        let mut level = Level::new(1);
        for (n, size) in (1u32..).zip(sizes) {
            level.add_slot(*size, n);
        }
        level
    }

    fn counted_free(level: &Level) -> usize {
        level.slots().iter().filter(|s| s.is_free()).count()
    }

    #[test]
    fn first_fit_takes_first_acceptable_slot() {
        let mut level = level_with(&[SizeClass::Car, SizeClass::Motorcycle, SizeClass::Bus]);
        let slot = level.first_fit(&Vehicle::car("CAR001")).unwrap();
        assert_eq!(slot.number(), 1);
        assert_eq!(level.free_count(), 2);
    }

    #[test]
    fn first_fit_skips_small_and_taken_slots() {
        let mut level = level_with(&[SizeClass::Motorcycle, SizeClass::Car, SizeClass::Bus]);
        assert_eq!(level.first_fit(&Vehicle::bus("B1")).unwrap().number(), 3);
        assert_eq!(level.first_fit(&Vehicle::car("C1")).unwrap().number(), 2);
        assert!(level.first_fit(&Vehicle::car("C2")).is_none());
        assert_eq!(level.first_fit(&Vehicle::motorcycle("M1")).unwrap().number(), 1);
        assert_eq!(level.free_count(), 0);
        assert_eq!(counted_free(&level), 0);
    }

    #[test]
    fn add_slot_grows_capacity_and_free() {
        let mut level = Level::new(4);
        level.add_slot(SizeClass::Bus, 1);
        level.add_slot(SizeClass::Car, 2);
        assert_eq!(level.capacity(), 2);
        assert_eq!(level.free_count(), 2);
        assert_eq!(level.number(), 4);
    }

    #[test]
    fn place_at_refuses_missing_and_taken() {
        let mut level = level_with(&[SizeClass::Motorcycle, SizeClass::Car]);
        assert!(!level.place_at(&Vehicle::car("C1"), 9));
        assert!(level.place_at(&Vehicle::bus("B1"), 1));
        assert!(!level.place_at(&Vehicle::car("C2"), 1));
        assert_eq!(level.free_count(), 1);
        assert_eq!(counted_free(&level), 1);
    }

    #[test]
    fn release_by_plate_requires_matching_occupant() {
        let mut level = level_with(&[SizeClass::Car, SizeClass::Car]);
        level.first_fit(&Vehicle::car("AAA111"));
        assert!(level.release_by_plate("BBB222", 1).is_none());
        assert!(level.release_by_plate("AAA111", 2).is_none());
        assert_eq!(level.free_count(), 1);

        let released = level.release_by_plate("AAA111", 1).unwrap();
        assert_eq!(released.plate(), "AAA111");
        assert_eq!(level.free_count(), 2);
        assert!(level.release_by_plate("AAA111", 1).is_none());
        assert_eq!(level.free_count(), 2);
    }

    #[test]
    fn find_by_plate_and_contains() {
        let mut level = level_with(&[SizeClass::Car, SizeClass::Bus]);
        level.place_at(&Vehicle::bus("BUS001"), 2);
        let slot = level.find_by_plate("BUS001").unwrap();
        assert_eq!(slot.number(), 2);
        assert!(level.contains(slot));

        let other = Slot::new(2, SizeClass::Bus);
        assert!(!level.contains(&other));
        assert!(level.find_by_plate("NOPE").is_none());
    }
}
