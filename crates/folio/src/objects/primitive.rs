use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use super::{Kind, Name, PdfString, Reference};

pub type PrimitiveDict = IndexMap<Name, Primitive>;

/// Owned, registry-independent node tree.
///
/// This is what an object source materializes and what callers build graphs
/// from; [`Registry::import`](crate::registry::Registry::import) turns it
/// into arena nodes. References stay symbolic.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Date(DateTime<FixedOffset>),
    Array(Vec<Primitive>),
    Dictionary(PrimitiveDict),
    Stream { header: PrimitiveDict, body: Vec<u8> },
    Reference(Reference),
}

impl Primitive {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(Name::new(name))
    }

    pub fn string(text: impl Into<Vec<u8>>) -> Self {
        Self::String(PdfString::new(text))
    }

    pub fn reference(number: u32, generation: u16) -> Self {
        Self::Reference(Reference::new(number, generation))
    }

    pub fn array(items: impl IntoIterator<Item = Primitive>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Build a dictionary from `(key, value)` pairs, keeping their order.
    pub fn dict<K: Into<Name>>(entries: impl IntoIterator<Item = (K, Primitive)>) -> Self {
        Self::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn stream<K: Into<Name>>(
        entries: impl IntoIterator<Item = (K, Primitive)>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Stream {
            header: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            body: body.into(),
        }
    }

    /// Rectangle array `[llx lly urx ury]`.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self::Array(vec![
            Self::Real(llx),
            Self::Real(lly),
            Self::Real(urx),
            Self::Real(ury),
        ])
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
            Self::Stream { .. } => Kind::Stream,
            Self::Reference(_) => Kind::Reference,
        }
    }

    /// Entry lookup on dictionaries and stream headers.
    pub fn get(&self, key: &str) -> Option<&Primitive> {
        match self {
            Self::Dictionary(dict) | Self::Stream { header: dict, .. } => dict.get(key),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Primitive {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Primitive {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<Reference> for Primitive {
    fn from(r: Reference) -> Self {
        Self::Reference(r)
    }
}
