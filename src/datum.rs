//! Datum - heterogeneous key/value type
//!
//! Keys and values are both datums. A datum can hold:
//! - Null (the canonical "absent" key)
//! - Booleans, 64-bit integers, 64-bit floats
//! - Strings, UTC datetimes
//! - Nested arrays and objects
//!
//! ## Numeric class
//!
//! `Long` and `Double` form a single comparison class: equal mathematical
//! values are the same key regardless of representation, so
//! `Long(3) == Double(3.0)` and both hash identically. Integer-valued
//! doubles in i64 range hash as that integer.
//!
//! ## Normalization
//!
//! Construct datums through the `From` conversions; they apply key
//! normalization: `None`/`()` become `Null`, arbitrary-precision integers
//! become the tagged string form `"<digits>n"`, every NaN maps to the quiet
//! canonical bit pattern, and `-0.0` maps to `+0.0`.

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical quiet-NaN bit pattern carried by every NaN datum.
pub(crate) const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// `i64::MIN` as f64 (exactly representable).
pub(crate) const LONG_MIN_F: f64 = i64::MIN as f64;
/// 2^63; doubles at or above it cannot hold an i64 value.
pub(crate) const LONG_LIM_F: f64 = -(i64::MIN as f64);

/// Heterogeneous key/value type.
///
/// Serialized form is externally tagged (`{"Long": 42}`, `{"Str": "a"}`, …)
/// so persisted records are self-describing and round-trip losslessly.
/// Non-finite doubles serialize as the marker strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Datum {
    /// Null / absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit floating point (canonicalized: single NaN, +0.0 only)
    Double(#[serde(with = "double_repr")] f64),
    /// UTF-8 string
    Str(String),
    /// Instant in UTC
    DateTime(DateTime<Utc>),
    /// Ordered sequence of datums
    Array(Vec<Datum>),
    /// Ordered (name, value) entries
    Object(Vec<(String, Datum)>),
}

impl Datum {
    /// Runtime type tag used by the default cross-type ordering.
    ///
    /// Tags are compared lexically when two keys differ in type, so the
    /// cross-type order is `array < boolean < date < null < number <
    /// object < string`. `Long` and `Double` share the `number` tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "boolean",
            Datum::Long(_) | Datum::Double(_) => "number",
            Datum::Str(_) => "string",
            Datum::DateTime(_) => "date",
            Datum::Array(_) => "array",
            Datum::Object(_) => "object",
        }
    }

    /// Check if this is a numeric datum (`Long` or `Double`)
    pub fn is_number(&self) -> bool {
        matches!(self, Datum::Long(_) | Datum::Double(_))
    }

    /// Try to get as i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Datum::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64 (converts Long to f64)
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Datum::Double(v) => Some(*v),
            Datum::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Canonicalize a double: every NaN becomes the quiet canonical NaN,
/// `-0.0` becomes `+0.0`.
pub(crate) fn canonical_f64(v: f64) -> f64 {
    if v.is_nan() {
        f64::from_bits(CANONICAL_NAN_BITS)
    } else if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Bit pattern with NaN and zero canonicalized; equal for equal doubles.
pub(crate) fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN_BITS
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

/// True when the double holds exactly the integer `l`.
fn long_eq_double(l: i64, d: f64) -> bool {
    d.fract() == 0.0 && d >= LONG_MIN_F && d < LONG_LIM_F && d as i64 == l
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Long(a), Datum::Long(b)) => a == b,
            (Datum::Double(a), Datum::Double(b)) => canonical_bits(*a) == canonical_bits(*b),
            // Numeric class: 3 and 3.0 are the same key
            (Datum::Long(a), Datum::Double(b)) | (Datum::Double(b), Datum::Long(a)) => {
                long_eq_double(*a, *b)
            }
            (Datum::Str(a), Datum::Str(b)) => a == b,
            (Datum::DateTime(a), Datum::DateTime(b)) => a == b,
            (Datum::Array(a), Datum::Array(b)) => a == b,
            (Datum::Object(a), Datum::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash must be consistent with PartialEq across the numeric class:
        // integer-valued doubles in i64 range hash exactly like the Long.
        match self {
            Datum::Null => state.write_u8(0),
            Datum::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Datum::Long(l) => {
                state.write_u8(2);
                l.hash(state);
            }
            Datum::Double(d) => {
                let d = *d;
                if d.fract() == 0.0 && d >= LONG_MIN_F && d < LONG_LIM_F {
                    state.write_u8(2);
                    (d as i64).hash(state);
                } else if d.is_nan() {
                    state.write_u8(3);
                } else if d.is_infinite() {
                    state.write_u8(4);
                    (d > 0.0).hash(state);
                } else {
                    state.write_u8(5);
                    d.to_bits().hash(state);
                }
            }
            Datum::Str(s) => {
                state.write_u8(6);
                s.hash(state);
            }
            Datum::DateTime(t) => {
                state.write_u8(7);
                t.hash(state);
            }
            Datum::Array(items) => {
                state.write_u8(8);
                items.hash(state);
            }
            Datum::Object(entries) => {
                state.write_u8(9);
                entries.hash(state);
            }
        }
    }
}

// === Construction / normalization ===

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Long(v as i64)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Long(v)
    }
}

impl From<u32> for Datum {
    fn from(v: u32) -> Self {
        Datum::Long(v as i64)
    }
}

impl From<u64> for Datum {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(l) => Datum::Long(l),
            Err(_) => Datum::Str(format!("{v}n")),
        }
    }
}

impl From<i128> for Datum {
    fn from(v: i128) -> Self {
        match i64::try_from(v) {
            Ok(l) => Datum::Long(l),
            Err(_) => Datum::Str(format!("{v}n")),
        }
    }
}

impl From<u128> for Datum {
    fn from(v: u128) -> Self {
        match i64::try_from(v) {
            Ok(l) => Datum::Long(l),
            Err(_) => Datum::Str(format!("{v}n")),
        }
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Datum::Double(canonical_f64(v as f64))
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Double(canonical_f64(v))
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Str(v.to_owned())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Str(v)
    }
}

impl From<DateTime<Utc>> for Datum {
    fn from(v: DateTime<Utc>) -> Self {
        Datum::DateTime(v)
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(v: Vec<Datum>) -> Self {
        Datum::Array(v)
    }
}

impl From<Vec<(String, Datum)>> for Datum {
    fn from(v: Vec<(String, Datum)>) -> Self {
        Datum::Object(v)
    }
}

/// Absent input is the canonical null key.
impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Datum::Null,
        }
    }
}

impl From<()> for Datum {
    fn from(_: ()) -> Self {
        Datum::Null
    }
}

/// Arbitrary-precision integers take the tagged string form so they stay
/// hashable and order-comparable alongside other string keys.
impl From<BigInt> for Datum {
    fn from(v: BigInt) -> Self {
        Datum::Str(format!("{v}n"))
    }
}

impl From<&Datum> for Datum {
    fn from(v: &Datum) -> Self {
        v.clone()
    }
}

/// JSON bridge: maps a `serde_json::Value` onto the datum universe.
/// Integers become `Long` when they fit i64; u64 overflow takes the
/// tagged string form like any other out-of-range integer.
impl From<serde_json::Value> for Datum {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Datum::Null,
            serde_json::Value::Bool(b) => Datum::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(l) = n.as_i64() {
                    Datum::Long(l)
                } else if let Some(u) = n.as_u64() {
                    Datum::from(u)
                } else {
                    Datum::Double(canonical_f64(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Datum::Str(s),
            serde_json::Value::Array(items) => {
                Datum::Array(items.into_iter().map(Datum::from).collect())
            }
            serde_json::Value::Object(entries) => Datum::Object(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, Datum::from(value)))
                    .collect(),
            ),
        }
    }
}

// === Display (diagnostic forms used by the tree dump) ===

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Long(v) => write!(f, "{v}"),
            Datum::Double(v) => write!(f, "{v}"),
            Datum::Str(s) => f.write_str(s),
            Datum::DateTime(t) => f.write_str(&t.to_rfc3339()),
            Datum::Array(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Datum::Object(entries) => {
                f.write_str("{")?;
                let mut first = true;
                for (name, value) in entries {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Serde representation for the `Double` payload: finite values as JSON
/// numbers, non-finite values as marker strings (JSON has no NaN/Inf).
mod double_repr {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            serializer.serialize_f64(*v)
        } else if v.is_nan() {
            serializer.serialize_str("NaN")
        } else if *v > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        struct DoubleVisitor;

        impl Visitor<'_> for DoubleVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or one of \"NaN\", \"Infinity\", \"-Infinity\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                match v {
                    "NaN" => Ok(f64::NAN),
                    "Infinity" => Ok(f64::INFINITY),
                    "-Infinity" => Ok(f64::NEG_INFINITY),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer
            .deserialize_any(DoubleVisitor)
            .map(super::canonical_f64)
    }
}
