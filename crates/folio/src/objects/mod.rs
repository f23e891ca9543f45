//! Node model: the closed set of node kinds.
//!
//! # Node kinds
//!
//! | Variant      | Stored as          | Ownership                        |
//! |--------------|--------------------|----------------------------------|
//! | `Null`       | inline             | scalar, never parented           |
//! | `Boolean`    | inline             | scalar                           |
//! | `Integer`    | inline             | scalar                           |
//! | `Real`       | inline             | scalar                           |
//! | `Name`       | inline             | scalar                           |
//! | `String`     | inline             | scalar                           |
//! | `Date`       | inline             | scalar                           |
//! | `Array`      | arena slot         | single owner (copy-on-attach)    |
//! | `Dictionary` | arena slot         | single owner (copy-on-attach)    |
//! | `Stream`     | arena slot         | single owner (copy-on-attach)    |
//! | `Reference`  | inline handle      | never owns data                  |
//!
//! Composite variants carry a [`NodeId`] into the owning
//! [`Registry`](crate::registry::Registry) arena. A [`Value`] is therefore
//! only meaningful together with the registry that produced it; the owned,
//! registry-independent form is [`Primitive`].

mod primitive;

pub use primitive::{Primitive, PrimitiveDict};

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};

/// Generation number that marks an object slot as no longer reusable.
pub const UNREUSABLE_GENERATION: u16 = u16::MAX;

// ── Name ──────────────────────────────────────────────────────────────────

/// Name scalar (`/Type`). Stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

// ── PdfString ─────────────────────────────────────────────────────────────

/// Byte string scalar.
///
/// `hex` only records the preferred serialization form; equality and
/// ordering look at the bytes alone.
#[derive(Debug, Clone)]
pub struct PdfString {
    bytes: Vec<u8>,
    hex: bool,
}

impl PdfString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hex: false,
        }
    }

    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hex: true,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_hex(&self) -> bool {
        self.hex
    }

    /// Lossy UTF-8 view of the bytes.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl PartialEq for PdfString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PdfString {}

impl std::hash::Hash for PdfString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for PdfString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PdfString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

// ── Reference / NodeId ────────────────────────────────────────────────────

/// Handle to an indirect object: object number plus generation.
///
/// Equality is identity on the handle, never structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub number: u32,
    pub generation: u16,
}

impl Reference {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Index of a composite node in a registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Kind ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Integer,
    Real,
    Name,
    String,
    Date,
    Array,
    Dictionary,
    Stream,
    Reference,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Name => "name",
            Self::String => "string",
            Self::Date => "date",
            Self::Array => "array",
            Self::Dictionary => "dictionary",
            Self::Stream => "stream",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// A node handle as stored inside composites and indirect objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Date(DateTime<FixedOffset>),
    Array(NodeId),
    Dictionary(NodeId),
    Stream(NodeId),
    Reference(Reference),
}

impl Value {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(Name::new(name))
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::String(PdfString::new(bytes))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Boolean(_) => Kind::Boolean,
            Self::Integer(_) => Kind::Integer,
            Self::Real(_) => Kind::Real,
            Self::Name(_) => Kind::Name,
            Self::String(_) => Kind::String,
            Self::Date(_) => Kind::Date,
            Self::Array(_) => Kind::Array,
            Self::Dictionary(_) => Kind::Dictionary,
            Self::Stream(_) => Kind::Stream,
            Self::Reference(_) => Kind::Reference,
        }
    }

    /// Arena node behind a composite value.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Array(id) | Self::Dictionary(id) | Self::Stream(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.node().is_none() && !matches!(self, Self::Reference(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Self::Reference(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to reals.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.as_name() == Some(name)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<Name> for Value {
    fn from(n: Name) -> Self {
        Self::Name(n)
    }
}

impl From<PdfString> for Value {
    fn from(s: PdfString) -> Self {
        Self::String(s)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Self::Reference(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_equality_ignores_form() {
        assert_eq!(PdfString::new(b"ab".to_vec()), PdfString::hex(b"ab".to_vec()));
        assert!(PdfString::from("a") < PdfString::from("b"));
        assert!(PdfString::from("a") < PdfString::from("aa"));
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::Integer(3).kind(), Kind::Integer);
        assert!(Value::name("Page").is_name("Page"));
        assert!(Value::Null.is_scalar());
        assert!(!Value::Reference(Reference::new(1, 0)).is_scalar());
        assert_eq!(Value::Integer(2).as_real(), Some(2.0));
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(Reference::new(12, 0).to_string(), "12 0 R");
        assert_eq!(Name::new("Kids").to_string(), "/Kids");
    }
}
