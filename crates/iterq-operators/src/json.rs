//! Runtime classification of JSON inputs plus small JSON helpers shared by the
//! expression evaluator and the registry.

use std::cmp::Ordering;

use serde_json::Value;

use iterq_core::{Error, Result};

use crate::source::ArraySource;

/// Classify a JSON value as a sequence source.
///
/// - array: array-like over its items
/// - string: one string element per character
/// - object with a non-negative integer `length`: array-like over the keys
///   `"0"..length`, missing keys reading as `null`
///
/// Anything else is a TypeKind error. Classification does not consume
/// anything beyond reading the input value.
pub fn classify(value: Value) -> Result<ArraySource<Value>> {
    match value {
        Value::Array(items) => Ok(ArraySource::from(items)),
        Value::String(s) => Ok(ArraySource::from(
            s.chars()
                .map(|c| Value::String(c.to_string()))
                .collect::<Vec<_>>(),
        )),
        Value::Object(mut map) => {
            let len = map
                .get("length")
                .and_then(array_like_length)
                .ok_or_else(|| Error::invalid_argument("source", "Iterable expected"))?;
            let items = (0..len)
                .map(|i| map.remove(&i.to_string()).unwrap_or(Value::Null))
                .collect::<Vec<_>>();
            Ok(ArraySource::from(items))
        }
        _ => Err(Error::invalid_argument("source", "Iterable expected")),
    }
}

fn array_like_length(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

/// Resolve a dotted path (`a.b.0.c`). Numeric segments index arrays.
pub fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || path == "." {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Total-enough ordering over JSON values.
///
/// Null sorts first; numbers compare numerically; arrays lexicographically.
/// Values of different kinds (and objects) compare as equal.
pub fn json_cmp(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (l, r) in a.iter().zip(b) {
                let ord = json_cmp(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Sequence;
    use serde_json::json;

    fn items(src: &ArraySource<Value>) -> Vec<Value> {
        src.as_slice().to_vec()
    }

    #[test]
    fn test_classify_array_and_string() {
        assert_eq!(items(&classify(json!([1, 2])).unwrap()), vec![json!(1), json!(2)]);
        assert_eq!(
            items(&classify(json!("ab")).unwrap()),
            vec![json!("a"), json!("b")]
        );
    }

    #[test]
    fn test_classify_array_like_object() {
        let src = classify(json!({"length": 3, "0": "x", "2": "z"})).unwrap();
        assert_eq!(items(&src), vec![json!("x"), Value::Null, json!("z")]);
        assert!(src.open().is_ok());
    }

    #[test]
    fn test_classify_rejects_non_iterables() {
        for bad in [json!(1), json!(null), json!({"a": 1}), json!({"length": -1})] {
            let err = classify(bad).unwrap_err();
            assert!(err.is_type_error());
        }
    }

    #[test]
    fn test_field_paths() {
        let v = json!({"a": {"b": [10, {"c": true}]}});
        assert_eq!(field(&v, "a.b.0"), Some(&json!(10)));
        assert_eq!(field(&v, "a.b.1.c"), Some(&json!(true)));
        assert_eq!(field(&v, "a.x"), None);
    }

    #[test]
    fn test_json_cmp() {
        assert_eq!(json_cmp(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(json_cmp(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(json_cmp(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(json_cmp(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(json_cmp(&json!([1, 2]), &json!([1])), Ordering::Greater);
        assert_eq!(json_cmp(&json!("1"), &json!(1)), Ordering::Equal);
    }
}
