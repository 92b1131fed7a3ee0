//! Casting and language-level equality

use std::sync::Arc;

use super::types::{TypeName, BOOL, DUBBLE, INTEGR, NOTHIN, STRIN};
use super::Value;
use crate::error::{Result, RuntimeError};

impl Value {
    /// Cast this value to `target`.
    ///
    /// Casting to `TypeName::Any` or to the value's own type is the identity.
    /// Every other pair either converts or fails with `RuntimeError::Cast`.
    pub fn cast(&self, target: &TypeName) -> Result<Value> {
        if target.is_any() {
            return Ok(self.clone());
        }

        match self {
            Value::Nothing => match target {
                TypeName::Nothing => Ok(Value::Nothing),
                TypeName::Boolean => Ok(Value::Boolean(false)),
                TypeName::String => Ok(Value::string("")),
                TypeName::Integer => Ok(Value::Integer(0)),
                TypeName::Double => Ok(Value::Double(0.0)),
                _ => Err(RuntimeError::cast(NOTHIN, target.as_str())),
            },

            Value::Boolean(b) => match target {
                TypeName::Boolean => Ok(self.clone()),
                TypeName::Integer => Ok(Value::Integer(i64::from(*b))),
                TypeName::Double => Ok(Value::Double(if *b { 1.0 } else { 0.0 })),
                TypeName::String => Ok(Value::string(self.to_string())),
                _ => Err(RuntimeError::cast(BOOL, target.as_str())),
            },

            Value::Integer(n) => match target {
                TypeName::Integer => Ok(self.clone()),
                TypeName::Double => Ok(Value::Double(*n as f64)),
                TypeName::Boolean => Ok(Value::Boolean(*n != 0)),
                TypeName::String => Ok(Value::string(n.to_string())),
                _ => Err(RuntimeError::cast(INTEGR, target.as_str())),
            },

            Value::Double(n) => match target {
                TypeName::Double => Ok(self.clone()),
                // `as` truncates toward zero
                TypeName::Integer => Ok(Value::Integer(*n as i64)),
                TypeName::Boolean => Ok(Value::Boolean(*n != 0.0)),
                TypeName::String => Ok(Value::string(self.to_string())),
                _ => Err(RuntimeError::cast(DUBBLE, target.as_str())),
            },

            Value::String(s) => cast_string(s, target),

            Value::Object(obj) => match target {
                TypeName::String => Ok(Value::string(self.to_string())),
                TypeName::Boolean => Ok(Value::Boolean(true)),
                TypeName::Nothing | TypeName::Integer | TypeName::Double => Err(
                    RuntimeError::cast(obj.class().name(), target.as_str()),
                ),
                TypeName::Class(name) => {
                    if obj.is_instance_of(name) {
                        Ok(self.clone())
                    } else {
                        Err(RuntimeError::cast_with(
                            obj.class().name(),
                            name.to_string(),
                            format!(
                                "{} is not in the hierarchy of {}",
                                name,
                                obj.class().qualified_name()
                            ),
                        ))
                    }
                }
                TypeName::Any => Ok(self.clone()),
            },
        }
    }

    /// Language-level equality with `self` as the authoritative left operand.
    ///
    /// `Nothing` equals only `Nothing`. Otherwise the right operand is cast
    /// to the left operand's type; a failed cast means "not equal". The
    /// relation is therefore not symmetric for mixed types.
    pub fn equal_to(&self, other: &Value) -> bool {
        match self {
            Value::Nothing => other.is_nothing(),

            Value::Boolean(b) => match other {
                Value::Nothing => false,
                _ => matches!(other.cast(&TypeName::Boolean), Ok(Value::Boolean(c)) if *b == c),
            },

            Value::Integer(n) => match other {
                Value::Nothing => false,
                Value::Integer(m) => n == m,
                Value::Double(m) => (*n as f64) == *m,
                _ => matches!(other.cast(&TypeName::Integer), Ok(Value::Integer(m)) if *n == m),
            },

            Value::Double(n) => match other {
                Value::Nothing => false,
                Value::Double(m) => n == m,
                Value::Integer(m) => *n == (*m as f64),
                _ => matches!(other.cast(&TypeName::Double), Ok(Value::Double(m)) if *n == m),
            },

            Value::String(s) => match other {
                Value::Nothing => false,
                Value::String(t) => s == t,
                _ => matches!(other.cast(&TypeName::String), Ok(Value::String(t)) if *s == t),
            },

            Value::Object(obj) => match other {
                Value::Nothing => obj.is_detached(),
                Value::Object(rhs) => obj.ptr_eq(rhs),
                _ => false,
            },
        }
    }
}

/// String casts: literal booleans, decimal then hex integers, floats.
fn cast_string(s: &Arc<str>, target: &TypeName) -> Result<Value> {
    match target {
        TypeName::String | TypeName::Any => Ok(Value::String(Arc::clone(s))),
        TypeName::Boolean => {
            let upper = s.to_uppercase();
            match upper.as_str() {
                "YEZ" => Ok(Value::Boolean(true)),
                "NO" => Ok(Value::Boolean(false)),
                _ => Ok(Value::Boolean(!s.is_empty())),
            }
        }
        TypeName::Integer => parse_integer(s).map(Value::Integer).ok_or_else(|| {
            RuntimeError::cast_with(STRIN, INTEGR, format!("'{}' is not an integer", s))
        }),
        TypeName::Double => s.parse::<f64>().map(Value::Double).map_err(|_| {
            RuntimeError::cast_with(STRIN, DUBBLE, format!("'{}' is not a number", s))
        }),
        _ => Err(RuntimeError::cast(STRIN, target.as_str())),
    }
}

/// Decimal parse, falling back to a `0x`/`0X` prefixed hexadecimal parse.
fn parse_integer(s: &str) -> Option<i64> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    i64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_decimal_and_hex() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("0xff"), Some(255));
        assert_eq!(parse_integer("0XFF"), Some(255));
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("12abc"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn test_string_bool_literals_case_insensitive() {
        let yez = Value::string("yez").cast(&TypeName::Boolean).unwrap();
        let no = Value::string("No").cast(&TypeName::Boolean).unwrap();
        let other = Value::string("false").cast(&TypeName::Boolean).unwrap();
        let empty = Value::string("").cast(&TypeName::Boolean).unwrap();
        assert_eq!(yez, Value::Boolean(true));
        assert_eq!(no, Value::Boolean(false));
        assert_eq!(other, Value::Boolean(true));
        assert_eq!(empty, Value::Boolean(false));
    }

    #[test]
    fn test_double_to_integer_truncates() {
        assert_eq!(Value::Double(2.9).cast(&TypeName::Integer).unwrap(), Value::Integer(2));
        assert_eq!(Value::Double(-2.9).cast(&TypeName::Integer).unwrap(), Value::Integer(-2));
    }
}
