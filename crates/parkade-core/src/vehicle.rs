use crate::lot::{Lot, SlotLocation};
use crate::slot::Slot;
use parkade_schema::{LicensePlate, SizeClass, VehicleKind};
use tracing::warn;

/// A vehicle in the facility. Its size class is fixed by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    plate: LicensePlate,
    kind: VehicleKind,
}

impl Vehicle {
    pub fn new(plate: impl Into<LicensePlate>, kind: VehicleKind) -> Self {
        Self {
            plate: plate.into(),
            kind,
        }
    }

    pub fn motorcycle(plate: impl Into<LicensePlate>) -> Self {
        Self::new(plate, VehicleKind::Motorcycle)
    }

    pub fn car(plate: impl Into<LicensePlate>) -> Self {
        Self::new(plate, VehicleKind::Car)
    }

    pub fn bus(plate: impl Into<LicensePlate>) -> Self {
        Self::new(plate, VehicleKind::Bus)
    }

    pub fn plate(&self) -> &LicensePlate {
        &self.plate
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn size_class(&self) -> SizeClass {
        self.kind.size_class()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn can_fit(&self, slot: &Slot) -> bool {
        slot.can_accept(self)
    }

    /// First-fit this vehicle into the lot.
    pub fn park(&self, lot: &mut Lot) -> Option<SlotLocation> {
        lot.park(self)
    }
}

/// Lenient vehicle-type lookup: unrecognized or empty names become
/// [`VehicleKind::FALLBACK`].
pub fn resolve_kind(raw: &str) -> VehicleKind {
    VehicleKind::parse(raw).unwrap_or_else(|| {
        warn!(
            "unrecognized vehicle type '{raw}', treating as {}",
            VehicleKind::FALLBACK
        );
        VehicleKind::FALLBACK
    })
}
