//! Dynamically-typed inventory values
//!
//! Inventory data is represented as a recursive [`Value`] tree. Numeric values
//! keep their signedness and width class (`Int`, `UInt`, `Float`) because the
//! arithmetic functions promote based on the *pair* of operand kinds.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::error::RenderError;

/// String-keyed mapping that preserves insertion order
pub type Mapping = IndexMap<String, Value>;

/// A single inventory datum
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// The variant of a [`Value`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }

    /// True for the integer and floating-point kinds
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::UInt | ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
        }
    }

    pub fn as_str(&self) -> Result<&str, RenderError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(RenderError::mismatch("string", other.kind())),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RenderError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(RenderError::mismatch("bool", other.kind())),
        }
    }

    pub fn as_i64(&self) -> Result<i64, RenderError> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(RenderError::mismatch("int", other.kind())),
        }
    }

    pub fn as_u64(&self) -> Result<u64, RenderError> {
        match self {
            Value::UInt(n) => Ok(*n),
            other => Err(RenderError::mismatch("uint", other.kind())),
        }
    }

    pub fn as_f64(&self) -> Result<f64, RenderError> {
        match self {
            Value::Float(n) => Ok(*n),
            other => Err(RenderError::mismatch("float", other.kind())),
        }
    }

    pub fn as_sequence(&self) -> Result<&[Value], RenderError> {
        match self {
            Value::Sequence(items) => Ok(items),
            other => Err(RenderError::mismatch("sequence", other.kind())),
        }
    }

    pub fn as_mapping(&self) -> Result<&Mapping, RenderError> {
        match self {
            Value::Mapping(map) => Ok(map),
            other => Err(RenderError::mismatch("mapping", other.kind())),
        }
    }

    /// Look up `key` in a mapping; `None` if absent or if this is not a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Element `index` of a sequence; `None` if out of range or not a sequence
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// Truthiness as used by `if`, `with`, `and`, `or` and `not`
    ///
    /// False, zero, null and empty strings/sequences/mappings are false;
    /// everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::UInt(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(map) => !map.is_empty(),
        }
    }
}

/// Go-style float formatting: shortest representation, exponent form
/// outside `1e-4 <= |f| < 1e21`
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{:e}", f);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if f != 0.0 && (exponent < -4 || exponent >= 21) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        format!("{}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<no value>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(n) => f.write_str(&format_float(*n)),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                f.write_str("map[")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, map[key.as_str()])?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => items.serialize(serializer),
            Value::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any inventory value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    // Non-negative integers arrive here from most formats; keep them signed
    // unless they only fit unsigned.
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map(Value::Int).unwrap_or(Value::UInt(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_typed_accessors() {
        let v = Value::from("text");
        assert_eq!(v.kind(), ValueKind::String);
        assert_eq!(v.as_str().unwrap(), "text");
        assert_eq!(
            v.as_i64(),
            Err(RenderError::TypeMismatch {
                expected: "int",
                actual: ValueKind::String
            })
        );
        assert_eq!(Value::UInt(7).as_u64().unwrap(), 7);
        assert!(Value::Float(1.5).as_bool().is_err());
    }

    #[test]
    fn test_mapping_get_reports_found() {
        let v: Value = [("a", 1i64)].into_iter().collect();
        assert_eq!(v.get("a"), Some(&Value::Int(1)));
        assert_eq!(v.get("b"), None);
        assert_eq!(Value::Int(3).get("a"), None);
    }

    #[test]
    fn test_sequence_get_index() {
        let v = Value::Sequence(vec![Value::from("x"), Value::from("y")]);
        assert_eq!(v.get_index(1), Some(&Value::from("y")));
        assert_eq!(v.get_index(2), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Sequence(vec![]).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(Value::from("0").is_truthy());
    }

    #[test]
    fn test_display_matches_template_printing() {
        assert_eq!(Value::Int(-2).to_string(), "-2");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(1e21).to_string(), "1e+21");
        assert_eq!(Value::Float(0.00001).to_string(), "1e-05");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "+Inf");
        assert_eq!(Value::Null.to_string(), "<no value>");
        let seq = Value::Sequence(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(seq.to_string(), "[1 a]");
        let map: Value = [("b", 2i64), ("a", 1i64)].into_iter().collect();
        assert_eq!(map.to_string(), "map[a:1 b:2]");
    }

    #[test]
    fn test_deserialize_keeps_numeric_kinds() {
        let v: Value =
            serde_json::from_str(r#"{"i": -3, "n": 2, "big": 18446744073709551615, "f": 2.5}"#)
                .unwrap();
        assert_eq!(v.get("i"), Some(&Value::Int(-3)));
        assert_eq!(v.get("n"), Some(&Value::Int(2)));
        assert_eq!(v.get("big"), Some(&Value::UInt(u64::MAX)));
        assert_eq!(v.get("f"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_deserialize_preserves_key_order() {
        let v: Value = serde_json::from_str(r#"{"b": 1, "a": {"z": null, "y": [true]}}"#).unwrap();
        let keys: Vec<&str> = v.as_mapping().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        let nested = v.get("a").unwrap();
        assert_eq!(nested.get("z"), Some(&Value::Null));
        assert_eq!(
            nested.get("y"),
            Some(&Value::Sequence(vec![Value::Bool(true)]))
        );
    }
}
