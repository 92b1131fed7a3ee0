//! Display and Debug implementations for Value

use std::fmt;

use super::*;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "{}", types::NOTHIN),
            Value::Boolean(true) => write!(f, "YEZ"),
            Value::Boolean(false) => write!(f, "NO"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Double(n) => fmt_double(*n, f),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "<{} object>", obj.class().name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::Object(obj) => write!(
                f,
                "<{} object #{:p}>",
                obj.class().qualified_name(),
                obj.as_ptr()
            ),
            other => write!(f, "{}", other),
        }
    }
}

/// Shortest round-trippable decimal, never in exponent form.
fn fmt_double(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}Inf", if n > 0.0 { "+" } else { "-" })
    } else {
        write!(f, "{}", n)
    }
}
