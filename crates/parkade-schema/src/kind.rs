//! Size classes and vehicle kinds.
//!
//! A vehicle fits a slot iff the slot's size class is at least the vehicle's:
//! larger slots accept smaller vehicles, never the reverse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal capacity ranking. Serialized as its rank (`0`, `1`, `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum SizeClass {
    Motorcycle = 0,
    Car = 1,
    Bus = 2,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Motorcycle, SizeClass::Car, SizeClass::Bus];

    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(SizeClass::Motorcycle),
            1 => Some(SizeClass::Car),
            2 => Some(SizeClass::Bus),
            _ => None,
        }
    }

    /// Whether a slot of this size can hold a vehicle of size `vehicle`.
    #[inline]
    pub fn accepts(self, vehicle: SizeClass) -> bool {
        self >= vehicle
    }

    pub fn name(self) -> &'static str {
        match self {
            SizeClass::Motorcycle => "motorcycle",
            SizeClass::Car => "car",
            SizeClass::Bus => "bus",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SizeClass> for u8 {
    fn from(size: SizeClass) -> u8 {
        size.rank()
    }
}

impl TryFrom<u8> for SizeClass {
    type Error = String;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        SizeClass::from_rank(rank).ok_or_else(|| format!("invalid size class rank: {rank}"))
    }
}

impl FromStr for SizeClass {
    type Err = String;

    /// Accepts a name (`"car"`, case-insensitive) or a rank (`"1"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rank) = trimmed.parse::<u8>() {
            return SizeClass::try_from(rank);
        }
        SizeClass::ALL
            .into_iter()
            .find(|size| size.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown size class: '{trimmed}'"))
    }
}

/// The closed set of vehicle kinds the facility serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Motorcycle,
    Car,
    Bus,
}

struct KindInfo {
    kind: VehicleKind,
    size: SizeClass,
    name: &'static str,
}

static KIND_TABLE: [KindInfo; 3] = [
    KindInfo {
        kind: VehicleKind::Motorcycle,
        size: SizeClass::Motorcycle,
        name: "Motorcycle",
    },
    KindInfo {
        kind: VehicleKind::Car,
        size: SizeClass::Car,
        name: "Car",
    },
    KindInfo {
        kind: VehicleKind::Bus,
        size: SizeClass::Bus,
        name: "Bus",
    },
];

impl VehicleKind {
    pub const ALL: [VehicleKind; 3] = [VehicleKind::Motorcycle, VehicleKind::Car, VehicleKind::Bus];

    /// Kind assumed for unrecognized vehicle-type strings in lenient mode.
    pub const FALLBACK: VehicleKind = VehicleKind::Car;

    fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    pub fn size_class(self) -> SizeClass {
        self.info().size
    }

    /// Display name, also the value persisted in vehicle records.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Strict lookup by display name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        KIND_TABLE
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(trimmed))
            .map(|info| info.kind)
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
