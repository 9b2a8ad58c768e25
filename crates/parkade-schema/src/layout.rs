//! TOML facility layouts used to seed an empty store.
//!
//! ```toml
//! layout_version = 1
//!
//! [[levels]]
//! slots = ["car", "car", "motorcycle", "bus"]
//!
//! [[levels]]
//! motorcycle = 5
//! car = 20
//! ```
//!
//! Explicit `slots` come first, in the order written; per-size counts are
//! appended smallest class first. Levels are numbered from 1 in file order,
//! slots from 1 within each level.

use crate::kind::SizeClass;
use crate::records::{LevelRecord, SlotRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const LAYOUT_VERSION: u32 = 1;

/// Upper bound on the slots a single layout level may declare.
pub const MAX_SLOTS_PER_LEVEL: usize = 10_000;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported layout_version: {0}, expected {LAYOUT_VERSION}")]
    UnsupportedVersion(u32),
    #[error("layout declares no levels")]
    NoLevels,
    #[error("level {level} declares no slots")]
    EmptyLevel { level: u32 },
    #[error("level {level}: {reason}")]
    InvalidSlot { level: u32, reason: String },
    #[error("level {level} declares too many slots (limit {MAX_SLOTS_PER_LEVEL})")]
    TooManySlots { level: u32 },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FacilityLayout {
    pub layout_version: u32,
    #[serde(default)]
    pub levels: Vec<LevelSection>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LevelSection {
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default)]
    pub motorcycle: u32,
    #[serde(default)]
    pub car: u32,
    #[serde(default)]
    pub bus: u32,
}

impl LevelSection {
    /// Total declared slots, or `None` if the counts overflow `usize`.
    fn declared_slots(&self) -> Option<usize> {
        [self.motorcycle, self.car, self.bus]
            .into_iter()
            .try_fold(self.slots.len(), |acc, n| {
                acc.checked_add(usize::try_from(n).ok()?)
            })
    }

    fn sizes(&self, level: u32) -> Result<Vec<SizeClass>, LayoutError> {
        let declared = self
            .declared_slots()
            .filter(|&n| n <= MAX_SLOTS_PER_LEVEL)
            .ok_or(LayoutError::TooManySlots { level })?;
        let mut sizes = Vec::with_capacity(declared);
        for raw in &self.slots {
            let size = raw
                .parse::<SizeClass>()
                .map_err(|reason| LayoutError::InvalidSlot { level, reason })?;
            sizes.push(size);
        }
        for (size, count) in [
            (SizeClass::Motorcycle, self.motorcycle),
            (SizeClass::Car, self.car),
            (SizeClass::Bus, self.bus),
        ] {
            sizes.extend(std::iter::repeat(size).take(count as usize));
        }
        if sizes.is_empty() {
            return Err(LayoutError::EmptyLevel { level });
        }
        Ok(sizes)
    }
}

impl FacilityLayout {
    /// Validate the layout and expand it into numbered level records.
    pub fn to_records(&self) -> Result<Vec<LevelRecord>, LayoutError> {
        if self.layout_version != LAYOUT_VERSION {
            return Err(LayoutError::UnsupportedVersion(self.layout_version));
        }
        if self.levels.is_empty() {
            return Err(LayoutError::NoLevels);
        }
        let mut records = Vec::with_capacity(self.levels.len());
        for (level_number, section) in (1u32..).zip(&self.levels) {
            let slots = (1u32..)
                .zip(section.sizes(level_number)?)
                .map(|(slot_number, size)| SlotRecord::new(slot_number, size))
                .collect();
            records.push(LevelRecord {
                level_number,
                slots,
            });
        }
        Ok(records)
    }

    /// Declared slot count across all levels, saturating on overflow.
    pub fn slot_count(&self) -> usize {
        self.levels
            .iter()
            .map(|l| l.declared_slots().unwrap_or(usize::MAX))
            .fold(0, usize::saturating_add)
    }
}

pub fn parse_layout_str(input: &str) -> Result<FacilityLayout, LayoutError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_layout_file(path: impl AsRef<Path>) -> Result<FacilityLayout, LayoutError> {
    let content = fs::read_to_string(path)?;
    parse_layout_str(&content)
}
