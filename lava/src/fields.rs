//! Signed field maps.
//!
//! Requests and webhooks are exchanged as flat JSON objects whose fields are
//! covered by a signature. [`FieldMap`] is that object; [`Amount`] keeps the
//! numeric form of the invoice sum intact, since `30` and `30.0` serialize
//! differently and therefore sign differently.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A JSON object of request or webhook fields.
///
/// Key order is irrelevant to callers; signing normalizes it.
pub type FieldMap = serde_json::Map<String, Value>;

/// An invoice sum as it appears on the wire.
///
/// Integer amounts stay integers (`30`), fractional amounts stay floats
/// (`30.5`, `30.0`).
///
/// # Example
///
/// ```rust
/// use lava::Amount;
///
/// assert_eq!(Amount::from(30u32).to_string(), "30");
/// assert_eq!(Amount::from_f64(30.0).unwrap().to_string(), "30.0");
/// assert!(Amount::from_f64(f64::NAN).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Number);

impl Amount {
    /// Creates a floating-point amount. Returns `None` for NaN or infinity.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self)
    }

    /// Returns the amount as a float.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    /// Returns the underlying JSON number.
    #[must_use]
    pub const fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<Amount> for Value {
    fn from(amount: Amount) -> Self {
        Self::Number(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_amount_keeps_integer_form() {
        let amount = Amount::from(30u32);
        assert_eq!(Value::from(amount.clone()), serde_json::json!(30));
        assert!((amount.as_f64() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_float_amount_keeps_fraction() {
        let amount = Amount::from_f64(10.5).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "10.5");
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert!(Amount::from_f64(f64::INFINITY).is_none());
    }
}
