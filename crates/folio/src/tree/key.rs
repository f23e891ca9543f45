use std::fmt;

use crate::error::{Error, Result};
use crate::objects::{Kind, PdfString, Value};

/// Key type of a balanced tree.
///
/// The natural ordering of the key is the tree ordering: byte-wise for
/// strings, numeric for integers.
pub trait TreeKey: Ord + Clone + fmt::Debug {
    /// Entry of a leaf holding the interleaved key/value pairs.
    const PAIRS_KEY: &'static str;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self>;
}

impl TreeKey for PdfString {
    const PAIRS_KEY: &'static str = "Names";

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(Error::type_mismatch(Kind::String, other.kind(), "name tree key")),
        }
    }
}

impl TreeKey for i64 {
    const PAIRS_KEY: &'static str = "Nums";

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(Error::type_mismatch(Kind::Integer, other.kind(), "number tree key")),
        }
    }
}
