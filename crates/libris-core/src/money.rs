//! # Money Module
//!
//! Provides the `Money` type for fines.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004  ❌                                    │
//! │                                                                         │
//! │  Fines accrue per day, so they are summed a lot:                       │
//! │    23 days × $0.50 must be exactly $11.50                              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    23 × 50 cents = 1150 cents                                          │
//! │                                                                         │
//! │  The REST API still speaks decimal dollars (`"fine": 11.5`), so the    │
//! │  conversion happens once, at the serde boundary ([`dollars`]).         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::money::Money;
//!
//! let per_day = Money::from_cents(50);
//! let fine = per_day * 23;
//! assert_eq!(fine.to_string(), "$11.50");
//! assert_eq!(Money::zero().fine_display(), "-");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Stored in SQLite as an INTEGER column (`fine_cents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// ## Example
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(2, 50).cents(), 250);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (0-99) without sign.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Table cell text for a fine: `$1.50`, or `-` when nothing is owed.
    pub fn fine_display(&self) -> String {
        if self.is_positive() {
            self.to_string()
        } else {
            "-".to_string()
        }
    }

    /// Decimal dollar amount, used only for the JSON wire format.
    pub fn as_dollars_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Rounds a decimal dollar amount from the wire to the nearest cent.
    pub fn from_dollars_f64(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by a day count.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, days: i64) -> Self {
        Money(self.0 * days)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// `#[serde(with = "libris_core::money::dollars")]`
///
/// Serializes as a JSON number of dollars (`2.5`) and accepts either a
/// number or a numeric string (`"2.50"`), which is how decimal columns
/// sometimes come back from Java servers.
pub mod dollars {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(money: &Money, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(money.as_dollars_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Money, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(Money::zero()),
            Some(Raw::Number(n)) => Ok(Money::from_dollars_f64(n)),
            Some(Raw::Text(t)) => t
                .trim()
                .parse::<f64>()
                .map(Money::from_dollars_f64)
                .map_err(|_| serde::de::Error::custom(format!("invalid amount: {}", t))),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
