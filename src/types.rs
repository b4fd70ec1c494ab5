use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value.
///
/// Only numbers exist so far; new kinds get a variant here and the VM's
/// operand handling grows a match arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
}

impl Value {
    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
        }
    }

    /// Fixed six-decimal rendering used by the disassembler.
    pub fn debug_repr(&self) -> String {
        match self {
            Value::Number(n) => format!("{:.6}", n),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_on_payload() {
        assert_eq!(Value::from(1.5), Value::Number(1.5));
        assert_ne!(Value::from(1.5), Value::Number(2.5));
    }

    #[test]
    fn renders() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(-0.5).to_string(), "-0.5");
        assert_eq!(Value::from(1.0).debug_repr(), "1.000000");
    }
}
