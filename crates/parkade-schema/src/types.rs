//! The license plate newtype and its validation rules.
//!
//! Plates serialize as plain strings so durable records stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Longest plate accepted at the boundary.
pub const MAX_PLATE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlateError {
    #[error("license plate must not be empty")]
    Empty,
    #[error("license plate '{0}' is longer than {MAX_PLATE_LEN} characters")]
    TooLong(String),
    #[error("license plate '{0}' must match [A-Za-z0-9 -]")]
    InvalidCharacters(String),
}

/// A license plate, unique across the whole facility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicensePlate(String);

impl LicensePlate {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Validate and wrap a plate received from a caller.
    pub fn parse(s: &str) -> Result<Self, PlateError> {
        validate_license_plate(s)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for LicensePlate {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LicensePlate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LicensePlate {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LicensePlate {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for LicensePlate {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for LicensePlate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

pub fn validate_license_plate(plate: &str) -> Result<(), PlateError> {
    if plate.trim().is_empty() {
        return Err(PlateError::Empty);
    }
    if plate.len() > MAX_PLATE_LEN {
        return Err(PlateError::TooLong(plate.to_owned()));
    }
    if !plate
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b' ')
    {
        return Err(PlateError::InvalidCharacters(plate.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_display_and_as_ref() {
        let plate = LicensePlate::new("AAA111");
        assert_eq!(plate.to_string(), "AAA111");
        assert_eq!(plate.as_str(), "AAA111");
        assert_eq!(AsRef::<str>::as_ref(&plate), "AAA111");
        assert!(plate == "AAA111");
    }

    #[test]
    fn plate_serializes_as_plain_string() {
        let plate = LicensePlate::new("BBB222");
        let json = serde_json::to_string(&plate).unwrap();
        assert_eq!(json, "\"BBB222\"");
        let back: LicensePlate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plate);
    }

    #[test]
    fn parse_accepts_common_formats() {
        assert!(LicensePlate::parse("CCC333").is_ok());
        assert!(LicensePlate::parse("AB-123-CD").is_ok());
        assert!(LicensePlate::parse("7 ABC 123").is_ok());
    }

    #[test]
    fn parse_rejects_empty_and_blank() {
        assert_eq!(LicensePlate::parse(""), Err(PlateError::Empty));
        assert_eq!(LicensePlate::parse("   "), Err(PlateError::Empty));
    }

    #[test]
    fn parse_rejects_too_long() {
        let long = "X".repeat(MAX_PLATE_LEN + 1);
        assert!(matches!(
            LicensePlate::parse(&long),
            Err(PlateError::TooLong(_))
        ));
        assert!(LicensePlate::parse(&"X".repeat(MAX_PLATE_LEN)).is_ok());
    }

    #[test]
    fn parse_rejects_path_and_punctuation() {
        assert!(LicensePlate::parse("AB/12").is_err());
        assert!(LicensePlate::parse("AB.12").is_err());
        assert!(LicensePlate::parse("ÄB12").is_err());
    }
}
