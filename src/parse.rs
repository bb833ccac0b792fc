use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Amounts are plain f64s. Sums are computed by repeated addition, and f64
// addition is order-sensitive: every subtree sum adds in commit order so the
// result does not depend on how it was derived.
//
// INVARIANT: an Amount is finite and >= 0.0. Enforced via Amount::new; every
// other constructor (From<u32>, Add, Sum) preserves it, short of overflowing
// to infinity.

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
pub enum AmountParseError {
    Negative(f64),
    NotFinite(f64),
}

impl AmountParseError {
    pub fn to_deserializer_error<E>(&self) -> E
    where
        E: serde::de::Error,
    {
        let (&amount, msg) = match self {
            AmountParseError::Negative(amount) => (amount, "amount cannot be negative"),
            AmountParseError::NotFinite(amount) => (amount, "a finite amount"),
        };
        serde::de::Error::invalid_value(serde::de::Unexpected::Float(amount), &msg)
    }
}

impl Display for AmountParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountParseError::Negative(amount) => f.write_fmt(format_args!("Negative({amount})")),
            AmountParseError::NotFinite(amount) => {
                f.write_fmt(format_args!("NotFinite({amount})"))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Self = Amount(0.0);

    pub fn new(amount: f64) -> Result<Amount, AmountParseError> {
        if !amount.is_finite() {
            return Err(AmountParseError::NotFinite(amount));
        }
        if amount < 0.0 {
            return Err(AmountParseError::Negative(amount));
        }

        // -0.0 passes the check above; normalize it so it prints as 0
        Ok(Amount(amount + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<u32> for Amount {
    fn from(amount: u32) -> Self {
        Amount(f64::from(amount))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Amount::new(raw).map_err(|err| err.to_deserializer_error::<D::Error>())
    }
}

// A type tag is any non-empty string. Surrounding whitespace is kept as-is;
// the csv reader is configured to trim before we get here.
pub fn is_valid_kind(kind: &str) -> bool {
    !kind.is_empty()
}

pub(crate) fn deserialize_kind<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let kind = String::deserialize(deserializer)?;
    if !is_valid_kind(&kind) {
        return Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(&kind),
            &"a non-empty type",
        ));
    }
    Ok(kind)
}
