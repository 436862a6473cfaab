//! Fixed-point decimal numbers for prices and volumes
//!
//! `Fixed` is a transparent wrapper over `rust_decimal::Decimal`, so it
//! decodes directly from JSON numbers or strings. Exchanges that quote order
//! prices as integers use [`Fixed::to_exchange_units`] with a scale of 1e-8.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// Number of exchange units in one whole coin or currency unit
pub const EXCHANGE_UNIT_SCALE: i64 = 100_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed {
    value: Decimal,
}

impl Fixed {
    pub const ZERO: Fixed = Fixed { value: Decimal::ZERO };
    pub const ONE: Fixed = Fixed { value: Decimal::ONE };

    /// `num * 10^-scale`, e.g. `Fixed::new(85, 2)` is 0.85
    pub const fn new(num: i64, scale: u32) -> Self {
        Self {
            value: Decimal::from_parts(
                num.unsigned_abs() as u32,
                (num.unsigned_abs() >> 32) as u32,
                0,
                num < 0,
                scale,
            ),
        }
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self { value }
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            value: Decimal::from(value),
        }
    }

    /// Lossy: binary floats rarely have an exact decimal form.
    pub fn from_f64(value: f64) -> Result<Self, FixedError> {
        Decimal::from_f64(value)
            .map(Self::from_decimal)
            .ok_or(FixedError::InvalidValue)
    }

    pub fn from_str_exact(s: &str) -> Result<Self, FixedError> {
        Decimal::from_str(s.trim())
            .map(Self::from_decimal)
            .map_err(|_| FixedError::InvalidValue)
    }

    /// Build from an integer count of 1e-8 units, as order payloads carry them.
    pub fn from_exchange_units(units: i64) -> Self {
        Self {
            value: Decimal::new(units, 8).normalize(),
        }
    }

    /// Convert to an integer count of 1e-8 units, truncating finer digits.
    pub fn to_exchange_units(&self) -> Result<i64, FixedError> {
        self.value
            .checked_mul(Decimal::from(EXCHANGE_UNIT_SCALE))
            .ok_or(FixedError::Overflow)?
            .trunc()
            .to_i64()
            .ok_or(FixedError::Overflow)
    }

    pub fn to_decimal(&self) -> Decimal {
        self.value
    }

    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    pub fn round_dp(&self, dp: u32) -> Self {
        Self {
            value: self.value.round_dp(dp),
        }
    }

    pub fn checked_div(&self, rhs: Fixed) -> Result<Fixed, FixedError> {
        if rhs.is_zero() {
            return Err(FixedError::DivisionByZero);
        }
        self.value
            .checked_div(rhs.value)
            .map(Self::from_decimal)
            .ok_or(FixedError::Overflow)
    }

    /// `self` reduced by `percent` percent, e.g. a trading fee.
    pub fn less_percent(&self, percent: Fixed) -> Fixed {
        let hundred = Decimal::from(100);
        Self {
            value: self.value * (hundred - percent.value) / hundred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    #[error("Invalid value")]
    InvalidValue,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Overflow in arithmetic operation")]
    Overflow,
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value + rhs.value,
        }
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value - rhs.value,
        }
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value * rhs.value,
        }
    }
}

// Panics on a zero divisor like Decimal does; use `checked_div` for untrusted input.
impl Div for Fixed {
    type Output = Fixed;

    fn div(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value / rhs.value,
        }
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.value -= rhs.value;
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl FromStr for Fixed {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_exact(s)
    }
}

impl From<Decimal> for Fixed {
    fn from(value: Decimal) -> Self {
        Fixed { value }
    }
}

impl From<Fixed> for Decimal {
    fn from(fixed: Fixed) -> Self {
        fixed.value
    }
}

/// `fixed!(123.45)` for literals known to parse
#[macro_export]
macro_rules! fixed {
    ($value:expr) => {
        $crate::fixed::Fixed::from_str_exact(stringify!($value)).unwrap()
    };
}
