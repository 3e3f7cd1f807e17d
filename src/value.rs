use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A Mustache context value.
///
/// `Null`, `Bool(false)`, an empty `List`, an empty `Text`, and an absent key
/// are all falsy. Numeric zero is deliberately **not** falsy: it renders as
/// `"0"` and participates in sections as a truthy singleton.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Lambda(Lambda),
    /// A value bridged in from a foreign object graph through the
    /// host-object binding capability (see [`Bindable`]).
    Host(Rc<dyn Bindable>),
}

/// A numeric context value. Integers and floats are tracked separately so
/// that interpolation can render integers without a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Canonical, shortest round-trip rendering of the number.
    pub fn to_text(self) -> String {
        match self {
            Number::Int(n) => n.to_string(),
            Number::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{n:.1}")
                } else {
                    let mut s = format!("{n}");
                    if !s.contains('.') && !s.contains(['e', 'E']) {
                        s.push_str(".0");
                    }
                    s
                }
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(xs: Vec<T>) -> Self {
        Value::List(xs.into_iter().map(Into::into).collect())
    }
}

/// The shape a callable context value is invoked with. The classic Mustache
/// implementations dispatch on a lambda's reflected arity; this crate avoids
/// reflection entirely by requiring the shape to be declared up front and
/// dispatching on the render site instead (interpolation vs. section).
#[derive(Clone)]
pub enum Lambda {
    /// Invoked with no arguments at an interpolation site.
    Interpolation(Rc<dyn Fn() -> Value>),
    /// Invoked with the section's raw, unparsed body text at a section site.
    Section(Rc<dyn Fn(&str) -> Value>),
}

impl Lambda {
    /// Wraps a zero-argument closure as an interpolation lambda.
    pub fn interpolation<F>(f: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Lambda::Interpolation(Rc::new(f))
    }

    /// Wraps a one-argument closure as a section lambda.
    pub fn section<F>(f: F) -> Self
    where
        F: Fn(&str) -> Value + 'static,
    {
        Lambda::Section(Rc::new(f))
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lambda::Interpolation(_) => f.write_str("Lambda::Interpolation(..)"),
            Lambda::Section(_) => f.write_str("Lambda::Section(..)"),
        }
    }
}

/// The minimal read-only interface a foreign host object must expose to be
/// treated as a Mustache map. This is the "view/object-binding convenience
/// layer" collaborator (spec §6): the crate defines the trait and the
/// `Value::Host` variant but ships no concrete adapter.
pub trait Bindable {
    fn has_key(&self, key: &str) -> bool;
    fn get_key(&self, key: &str) -> Value;
}

impl Value {
    /// Falsiness per the value model: `Null`, `Bool(false)`, empty `List`,
    /// empty `Text`, and absent keys (represented as `Null`) are falsy.
    /// Numeric zero is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(_) => true,
            Value::Text(s) => !s.is_empty(),
            Value::List(xs) => !xs.is_empty(),
            Value::Map(_) => true,
            Value::Lambda(_) => true,
            Value::Host(_) => true,
        }
    }

    /// Looks up `key` on this value as if it were a map, per the dotted-name
    /// navigation rules of §4.2. Non-map values (other than `Host`) yield
    /// `Null`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Map(entries) => entries.get(key).cloned().unwrap_or(Value::Null),
            Value::Host(obj) => {
                if obj.has_key(key) {
                    obj.get_key(key)
                } else {
                    Value::Null
                }
            }
            _ => Value::Null,
        }
    }

    /// Returns `true` when this value exposes `key`, used by context lookup
    /// to pick the first containing scope even when the value is falsy.
    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Value::Map(entries) => entries.contains_key(key),
            Value::Host(obj) => obj.has_key(key),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n:?})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::List(xs) => f.debug_list().entries(xs).finish(),
            Value::Map(entries) => f.debug_map().entries(entries).finish(),
            Value::Lambda(l) => l.fmt(f),
            Value::Host(_) => f.write_str("Host(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_truthy() {
        assert!(Value::from(0i64).is_truthy());
        assert!(Value::from(0.0f64).is_truthy());
    }

    #[test]
    fn null_and_false_and_empty_are_falsy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from("".to_string()).is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn number_text_rendering() {
        assert_eq!(Number::Int(42).to_text(), "42");
        assert_eq!(Number::Float(1.5).to_text(), "1.5");
        assert_eq!(Number::Float(2.0).to_text(), "2.0");
    }

    #[test]
    fn map_get_missing_is_null() {
        let mut m = IndexMap::new();
        m.insert("a".to_string(), Value::from(1i64));
        let v = Value::Map(m);
        assert!(matches!(v.get("a"), Value::Number(Number::Int(1))));
        assert!(matches!(v.get("b"), Value::Null));
    }
}
