//! Value types shared by every Parkade crate.
//!
//! This crate defines the schema layer: the ordinal `SizeClass` that governs
//! slot fit, the closed `VehicleKind` variant with its kind table, the
//! `LicensePlate` newtype, the record shapes persisted by the durable store
//! (`LevelRecord`, `SlotRecord`, `VehicleRecord`, `ParkedVehicle`), and the
//! TOML facility layout used to seed an empty store (`FacilityLayout`).

pub mod kind;
pub mod layout;
pub mod records;
pub mod types;

pub use kind::{SizeClass, VehicleKind};
pub use layout::{
    parse_layout_file, parse_layout_str, FacilityLayout, LayoutError, LevelSection,
    LAYOUT_VERSION, MAX_SLOTS_PER_LEVEL,
};
pub use records::{LevelRecord, ParkedVehicle, SlotRecord, VehicleRecord};
pub use types::{validate_license_plate, LicensePlate, PlateError};
