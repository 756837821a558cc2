//! Key ordering
//!
//! The index orders keys with a plain function pointer so an `Index` stays
//! `Clone` and the comparator costs nothing to copy around. [`default_compare`]
//! is the built-in ordering; callers can supply their own through
//! `IndexConfig::with_comparator`.
//!
//! ## Contract
//!
//! A comparator must be a total order over datums, and it must return
//! `Equal` exactly when two datums are equal (`==`). Point lookups go
//! through a hash map keyed on datum equality, so a comparator that calls
//! unequal datums `Equal` would let the tree and the map disagree about
//! which keys exist.

use crate::datum::{canonical_f64, Datum, LONG_LIM_F, LONG_MIN_F};
use std::cmp::Ordering;

/// Key comparison function. Drives key placement in the tree and the
/// direction of every range scan.
pub type Comparator = fn(&Datum, &Datum) -> Ordering;

/// Built-in key ordering.
///
/// Keys of the same type compare by value: numbers numerically (`Long` and
/// `Double` are one class), strings by Unicode code point, booleans with
/// `false < true`, datetimes chronologically, arrays element-wise then by
/// length, objects entry-wise then by length. NaN sorts after every other
/// number. Keys of different types compare by their [`Datum::type_tag`]
/// lexically: `array < boolean < date < null < number < object < string`.
pub fn default_compare(a: &Datum, b: &Datum) -> Ordering {
    match (a, b) {
        (Datum::Long(x), Datum::Long(y)) => x.cmp(y),
        (Datum::Double(x), Datum::Double(y)) => double_cmp(*x, *y),
        (Datum::Long(x), Datum::Double(y)) => cmp_long_double(*x, *y),
        (Datum::Double(x), Datum::Long(y)) => cmp_long_double(*y, *x).reverse(),
        (Datum::Null, Datum::Null) => Ordering::Equal,
        (Datum::Bool(x), Datum::Bool(y)) => x.cmp(y),
        (Datum::Str(x), Datum::Str(y)) => x.cmp(y),
        (Datum::DateTime(x), Datum::DateTime(y)) => x.cmp(y),
        (Datum::Array(x), Datum::Array(y)) => seq_cmp(x, y),
        (Datum::Object(x), Datum::Object(y)) => entries_cmp(x, y),
        _ => a.type_tag().cmp(b.type_tag()),
    }
}

/// Total order over doubles: the usual numeric order with NaN sorted last.
fn double_cmp(a: f64, b: f64) -> Ordering {
    let (a, b) = (canonical_f64(a), canonical_f64(b));
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Exact comparison of an i64 against an f64, no precision loss on the
/// integer side. Returns the ordering of `l` relative to `d`.
fn cmp_long_double(l: i64, d: f64) -> Ordering {
    if d.is_nan() {
        return Ordering::Less;
    }
    if d >= LONG_LIM_F {
        return Ordering::Less;
    }
    if d < LONG_MIN_F {
        return Ordering::Greater;
    }
    // d is in [-2^63, 2^63): truncation is exact in i64
    match l.cmp(&(d.trunc() as i64)) {
        Ordering::Equal => {
            let frac = d.fract();
            if frac > 0.0 {
                Ordering::Less
            } else if frac < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}

fn seq_cmp(a: &[Datum], b: &[Datum]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = default_compare(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn entries_cmp(a: &[(String, Datum)], b: &[(String, Datum)]) -> Ordering {
    for ((name_a, value_a), (name_b, value_b)) in a.iter().zip(b) {
        let ord = name_a.cmp(name_b);
        if ord != Ordering::Equal {
            return ord;
        }
        let ord = default_compare(value_a, value_b);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}
