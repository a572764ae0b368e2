//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Floating point wrappers with total equality and percentages.
//!
//! Only finite values are admitted: NaN and infinities have no JSON number
//! form. Equality and hashing go through the bit pattern after folding `-0.0`
//! onto `0.0`, so floats can live inside hashed, deduplicated collections.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{ModelError, ModelResult};

/// `f32` with total equality, used for coordinates and accuracy values.
#[derive(Clone, Copy, Default)]
pub struct Float32(f32);

impl Float32 {
    /// Wrap a finite value.
    pub fn new(value: f32) -> ModelResult<Self> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ModelError::NonFiniteNumber(f64::from(value)))
        }
    }

    /// Narrow an `f64`; a magnitude beyond `f32::MAX` is rejected.
    pub fn narrow(value: f64) -> ModelResult<Self> {
        if !value.is_finite() {
            return Err(ModelError::NonFiniteNumber(value));
        }
        Self::new(value as f32).map_err(|_| ModelError::NonFiniteNumber(value))
    }

    /// Raw value.
    pub fn get(self) -> f32 {
        self.0
    }

    fn canonical_bits(self) -> u32 {
        if self.0 == 0.0 {
            0
        } else {
            self.0.to_bits()
        }
    }

    /// Widen for JSON output using the shortest `f32` representation, so
    /// `0.1f32` is written as `0.1` rather than `0.10000000149011612`.
    pub fn to_wire(self) -> f64 {
        self.0.to_string().parse().unwrap_or(f64::from(self.0))
    }
}

impl PartialEq for Float32 {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for Float32 {}

impl Hash for Float32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.canonical_bits());
    }
}

impl TryFrom<f32> for Float32 {
    type Error = ModelError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Debug for Float32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Float32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `f64` with total equality, used for decimal payload values.
#[derive(Clone, Copy, Default)]
pub struct Float64(f64);

impl Float64 {
    /// Wrap a finite value.
    pub fn new(value: f64) -> ModelResult<Self> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ModelError::NonFiniteNumber(value))
        }
    }

    /// Raw value.
    pub fn get(self) -> f64 {
        self.0
    }

    fn canonical_bits(self) -> u64 {
        if self.0 == 0.0 {
            0
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Float64 {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for Float64 {}

impl Hash for Float64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.canonical_bits());
    }
}

impl TryFrom<f64> for Float64 {
    type Error = ModelError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Debug for Float64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Float64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole percentage in `0..=100`, stored in one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(u8);

impl Percentage {
    /// Largest admissible value.
    pub const MAX: u8 = 100;

    /// Validate `value` against `0..=100`.
    pub fn new(value: i64) -> ModelResult<Self> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(ModelError::PercentageOutOfRange(value)),
        }
    }

    /// Raw value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Percentage {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_zero_compares_equal() {
        assert_eq!(Float32::new(0.0).unwrap(), Float32::new(-0.0).unwrap());
        assert_eq!(Float64::new(0.0).unwrap(), Float64::new(-0.0).unwrap());
        assert_ne!(Float64::new(0.17).unwrap(), Float64::new(0.18).unwrap());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(Float64::new(f64::NAN), Err(ModelError::NonFiniteNumber(_))));
        assert_eq!(
            Float64::new(f64::INFINITY),
            Err(ModelError::NonFiniteNumber(f64::INFINITY))
        );
        assert!(Float32::new(f32::NEG_INFINITY).is_err());
        assert!(Float32::try_from(f32::NAN).is_err());
    }

    #[test]
    fn narrowing_past_f32_range_is_rejected() {
        assert_eq!(Float32::narrow(1e39), Err(ModelError::NonFiniteNumber(1e39)));
        assert_eq!(Float32::narrow(-1e39), Err(ModelError::NonFiniteNumber(-1e39)));
        assert_eq!(Float32::narrow(2.5).unwrap().get(), 2.5);
    }

    #[test]
    fn f32_wire_value_uses_shortest_form() {
        assert_eq!(Float32::new(0.1).unwrap().to_wire(), 0.1);
        assert_eq!(Float32::new(-12.5).unwrap().to_wire(), -12.5);
    }

    #[test]
    fn percentage_bounds() {
        assert_eq!(Percentage::new(100).unwrap().get(), 100);
        assert_eq!(Percentage::new(0).unwrap().get(), 0);
        assert_eq!(Percentage::new(101), Err(ModelError::PercentageOutOfRange(101)));
        assert_eq!(Percentage::new(-1), Err(ModelError::PercentageOutOfRange(-1)));
    }
}
