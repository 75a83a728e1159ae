// Loosely-typed scalars from the router's JSON.
//
// The firmware is inconsistent about whether ip/port fields are strings
// or numbers (`"dstports": 443` vs `"dstports": "80,443"`), and whether
// flags are `0`/`1`, `"0"`/`"1"`, or booleans. Everything here normalizes
// on decode and emits the form-field representation on encode.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A scalar that may arrive as a JSON string or number, always held as a string.
///
/// An empty value means "any" for ip/port specifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WireValue(String);

impl WireValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The "any" specifier.
    pub fn any() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u32> for WireValue {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl AsRef<str> for WireValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct WireValueVisitor;

impl Visitor<'_> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<WireValue, E> {
        Ok(WireValue(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<WireValue, E> {
        Ok(WireValue(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireValue, E> {
        Ok(WireValue(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireValue, E> {
        Ok(WireValue(v.to_string()))
    }

    // Non-integral numbers truncate toward zero, matching the integer
    // rendering the router itself uses for these fields. Anything outside
    // the i64 range is rejected rather than saturated.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireValue, E> {
        const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

        let t = v.trunc();
        if !v.is_finite() || !(-I64_BOUND..I64_BOUND).contains(&t) {
            return Err(E::invalid_value(de::Unexpected::Float(v), &self));
        }
        Ok(WireValue((t as i64).to_string()))
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

/// Serde adapter for `0`/`1` flags (`enable`, `srcipnot`, ...).
///
/// Decodes numbers, numeric strings and booleans; encodes as `0`/`1`.
pub mod flag {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a 0/1 flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        #[allow(clippy::float_cmp)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            if !v.is_finite() {
                return Err(E::invalid_value(de::Unexpected::Float(v), &self));
            }
            Ok(v != 0.0)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

/// Render a flag the way form bodies expect it.
pub(crate) fn flag_str(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn decode(v: serde_json::Value) -> Result<WireValue, serde_json::Error> {
        serde_json::from_value(v)
    }

    #[test]
    fn strings_pass_through_unchanged() {
        for s in ["", "192.168.1.10", "80,443", "1000-2000", " spaced "] {
            assert_eq!(decode(json!(s)).unwrap().as_str(), s);
        }
    }

    #[test]
    fn numbers_normalize_to_decimal_strings() {
        assert_eq!(decode(json!(443)).unwrap().as_str(), "443");
        assert_eq!(decode(json!(0)).unwrap().as_str(), "0");
        assert_eq!(decode(json!(-7)).unwrap().as_str(), "-7");
        assert_eq!(decode(json!(8080.9)).unwrap().as_str(), "8080");
    }

    #[test]
    fn other_json_kinds_are_rejected() {
        assert!(decode(json!({"port": 80})).is_err());
        assert!(decode(json!([80])).is_err());
        assert!(decode(json!(true)).is_err());
        assert!(decode(json!(null)).is_err());
    }

    #[test]
    fn out_of_range_floats_are_rejected() {
        assert!(decode(json!(1e20)).is_err());
        assert!(decode(json!(-1e20)).is_err());
        assert_eq!(decode(json!(-0.5)).unwrap().as_str(), "0");
        assert_eq!(decode(json!(1e15)).unwrap().as_str(), "1000000000000000");
    }

    #[test]
    fn empty_means_any() {
        assert!(WireValue::any().is_any());
        assert!(!WireValue::from("22").is_any());
    }

    #[test]
    fn serializes_as_plain_string() {
        assert_eq!(
            serde_json::to_value(WireValue::from(53u32)).unwrap(),
            json!("53")
        );
    }

    #[derive(Deserialize)]
    struct Flagged {
        #[serde(with = "flag")]
        on: bool,
    }

    #[test]
    fn flags_accept_every_router_spelling() {
        for (input, expected) in [
            (json!(1), true),
            (json!(0), false),
            (json!("1"), true),
            (json!("0"), false),
            (json!(""), false),
            (json!(true), true),
            (json!(1.0), true),
            (json!(0.0), false),
        ] {
            let f: Flagged = serde_json::from_value(json!({ "on": input })).unwrap();
            assert_eq!(f.on, expected);
        }
        assert!(serde_json::from_value::<Flagged>(json!({ "on": "yes" })).is_err());
    }
}
