//! Quantities with a unit: memory sizes and durations.
//!
//! A [`Measure`] keeps the quantity and unit exactly as written so that
//! `"120s"` is exported as `"120s"` and not normalized to `"2m"`.

use crate::error::{DynConfigError, DynConfigResult};
use std::fmt;
use std::hash::Hash;

/// A unit a [`Measure`] can be expressed in.
pub trait Unit: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Every unit of this kind, smallest first.
    const ALL: &'static [Self];

    /// The suffix written after the quantity.
    fn short_name(&self) -> &'static str;

    /// How many base units one of this unit holds.
    fn base_factor(&self) -> u64;
}

/// Units of memory size, base 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryUnit {
    /// Bytes.
    B,
    /// Kibibytes.
    KB,
    /// Mebibytes.
    MB,
    /// Gibibytes.
    GB,
    /// Tebibytes.
    TB,
    /// Pebibytes.
    PB,
}

impl Unit for MemoryUnit {
    const ALL: &'static [Self] = &[Self::B, Self::KB, Self::MB, Self::GB, Self::TB, Self::PB];

    fn short_name(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
            Self::PB => "PB",
        }
    }

    fn base_factor(&self) -> u64 {
        match self {
            Self::B => 1,
            Self::KB => 1 << 10,
            Self::MB => 1 << 20,
            Self::GB => 1 << 30,
            Self::TB => 1 << 40,
            Self::PB => 1 << 50,
        }
    }
}

/// Units of duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
}

impl Unit for TimeUnit {
    const ALL: &'static [Self] = &[Self::Milliseconds, Self::Seconds, Self::Minutes, Self::Hours];

    fn short_name(&self) -> &'static str {
        match self {
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }

    fn base_factor(&self) -> u64 {
        match self {
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
        }
    }
}

/// A non-negative quantity with a unit.
///
/// # Example
///
/// ```
/// use dynconf_core::{Measure, MemoryUnit, TimeUnit};
///
/// let size: Measure<MemoryUnit> = Measure::parse("512MB").unwrap();
/// assert_eq!(size.quantity(), 512);
/// assert_eq!(size.to_string(), "512MB");
///
/// let window = Measure::of(120, TimeUnit::Seconds);
/// assert_eq!(window.to_string(), "120s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Measure<U: Unit> {
    quantity: u64,
    unit: U,
}

impl<U: Unit> Measure<U> {
    /// Creates a measure.
    #[must_use]
    pub const fn of(quantity: u64, unit: U) -> Self {
        Self { quantity, unit }
    }

    /// Returns the quantity as written.
    pub const fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Returns the unit as written.
    pub const fn unit(&self) -> U {
        self.unit
    }

    /// Returns the quantity converted to the smallest unit, saturating.
    pub fn to_base(&self) -> u64 {
        self.quantity.saturating_mul(self.unit.base_factor())
    }

    /// Parses a measure accepting any unit of this kind.
    pub fn parse(input: &str) -> DynConfigResult<Self> {
        Self::parse_with(input, U::ALL)
    }

    /// Parses a measure accepting only the given units.
    pub fn parse_with(input: &str, allowed: &[U]) -> DynConfigResult<Self> {
        let value = input.trim();
        if value.is_empty() {
            return Err(DynConfigError::invalid_measure(
                input,
                "<quantity><unit> is missing",
            ));
        }
        if value.starts_with('-') {
            return Err(DynConfigError::invalid_measure(
                input,
                "Quantity must be positive",
            ));
        }
        let split = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());
        let (digits, suffix) = value.split_at(split);
        if digits.is_empty() {
            return Err(DynConfigError::invalid_measure(input, "Quantity is missing"));
        }
        let quantity: u64 = digits.parse().map_err(|_| {
            DynConfigError::invalid_measure(input, format!("Invalid quantity: '{digits}'"))
        })?;
        let suffix = suffix.trim();
        let unit = allowed
            .iter()
            .copied()
            .find(|u| u.short_name() == suffix)
            .ok_or_else(|| {
                let names: Vec<&str> = allowed.iter().map(Unit::short_name).collect();
                let reason = if suffix.is_empty() {
                    format!("Unit is missing. Allowed units: {}", names.join(", "))
                } else {
                    format!(
                        "Invalid unit: '{suffix}'. Allowed units: {}",
                        names.join(", ")
                    )
                };
                DynConfigError::invalid_measure(input, reason)
            })?;
        Ok(Self { quantity, unit })
    }
}

impl<U: Unit> fmt::Display for Measure<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quantity, self.unit.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Measure::of(1, TimeUnit::Seconds).to_string(), "1s");
        assert_eq!(Measure::of(150, TimeUnit::Milliseconds).to_string(), "150ms");
        assert_eq!(Measure::of(1, MemoryUnit::GB).to_string(), "1GB");
    }

    #[test]
    fn test_parse_memory() {
        let m: Measure<MemoryUnit> = Measure::parse("1GB").unwrap();
        assert_eq!(m, Measure::of(1, MemoryUnit::GB));
        assert_eq!(m.to_base(), 1 << 30);
        assert_eq!(Measure::<MemoryUnit>::parse(" 64 KB ").unwrap().to_base(), 64 * 1024);
    }

    #[test]
    fn test_parse_time_prefers_exact_suffix() {
        let ms: Measure<TimeUnit> = Measure::parse("10ms").unwrap();
        assert_eq!(ms.unit(), TimeUnit::Milliseconds);
        let m: Measure<TimeUnit> = Measure::parse("10m").unwrap();
        assert_eq!(m.unit(), TimeUnit::Minutes);
        assert_eq!(m.to_base(), 600_000);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "s", "1", "-1s", "1x", "1.5s"] {
            let err = Measure::<TimeUnit>::parse(bad).unwrap_err();
            assert!(
                matches!(err, DynConfigError::InvalidMeasure { .. }),
                "expected error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_with_allowed_units() {
        let allowed = [TimeUnit::Seconds, TimeUnit::Minutes, TimeUnit::Hours];
        assert!(Measure::parse_with("5s", &allowed).is_ok());
        let err = Measure::parse_with("500ms", &allowed).unwrap_err();
        assert!(err.to_string().contains("Allowed units: s, m, h"));
    }

    #[test]
    fn test_to_base_saturates() {
        assert_eq!(Measure::of(u64::MAX, MemoryUnit::PB).to_base(), u64::MAX);
    }
}
