//! Interfaces of the collaborators the registry consumes.

use crate::error::SourceError;
use crate::objects::{Primitive, Reference};

/// Header facts of an object stream, passed to [`ObjectSource::load_inline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStreamInfo {
    pub container: Reference,
    /// `/N`: number of objects stored.
    pub count: i64,
    /// `/First`: offset of the first object inside the decoded body.
    pub first: i64,
}

/// The parsing layer, invoked lazily on first access to an object.
pub trait ObjectSource {
    /// Materialize the object written at `offset`.
    fn load(&mut self, reference: Reference, offset: u64) -> Result<Primitive, SourceError>;

    /// Parse the `index`-th object of a decoded object stream body.
    fn load_inline(
        &mut self,
        info: &ObjectStreamInfo,
        body: &[u8],
        index: u32,
    ) -> Result<Primitive, SourceError>;
}

/// A stream codec named by a `/Filter` entry.
pub trait StreamFilter {
    fn decode(&self, data: &[u8], params: Option<&Primitive>) -> Result<Vec<u8>, SourceError>;

    fn encode(&self, data: &[u8], params: Option<&Primitive>) -> Result<Vec<u8>, SourceError>;
}
