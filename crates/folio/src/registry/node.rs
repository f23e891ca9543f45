use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::objects::{Kind, Name, NodeId, Value};

/// Entries of a dictionary or stream header.
pub type Entries = IndexMap<Name, Value>;

/// The single owner of a composite node.
///
/// Used only to find the containing indirect object and to propagate
/// dirtiness; ownership itself lives in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Node(NodeId),
    Object(u32),
}

#[derive(Debug, Clone)]
pub(crate) enum NodeBody {
    Array(Vec<Value>),
    Dictionary(Entries),
    Stream { header: Entries, body: StreamBody },
}

/// Body of a stream node.
///
/// `decoded` is tracked apart from the header's dirty flag: it only says
/// whether the bytes still carry the header's `/Filter` encoding.
#[derive(Debug, Clone, Default)]
pub struct StreamBody {
    pub(crate) bytes: Option<Vec<u8>>,
    pub(crate) external: Option<PathBuf>,
    pub(crate) decoded: bool,
    pub(crate) dirty: bool,
}

impl StreamBody {
    pub(crate) fn in_memory(bytes: Vec<u8>, decoded: bool) -> Self {
        Self {
            bytes: Some(bytes),
            external: None,
            decoded,
            dirty: false,
        }
    }

    pub(crate) fn external(path: PathBuf, decoded: bool) -> Self {
        Self {
            bytes: None,
            external: Some(path),
            decoded,
            dirty: false,
        }
    }

    /// Bytes currently held in memory, if any.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn external_path(&self) -> Option<&Path> {
        self.external.as_deref()
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Arena slot of a composite node.
#[derive(Debug, Clone)]
pub struct NodeSlot {
    pub(crate) body: NodeBody,
    pub(crate) parent: Option<Owner>,
    pub(crate) updateable: bool,
    pub(crate) updated: bool,
    pub(crate) virtual_: bool,
}

impl NodeSlot {
    pub(crate) fn new(body: NodeBody) -> Self {
        Self {
            body,
            parent: None,
            updateable: true,
            updated: false,
            virtual_: false,
        }
    }

    pub fn kind(&self) -> Kind {
        match self.body {
            NodeBody::Array(_) => Kind::Array,
            NodeBody::Dictionary(_) => Kind::Dictionary,
            NodeBody::Stream { .. } => Kind::Stream,
        }
    }

    pub fn parent(&self) -> Option<Owner> {
        self.parent
    }

    pub fn is_updateable(&self) -> bool {
        self.updateable
    }

    /// Dirty flag.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_
    }

    /// Stream body, for stream nodes.
    pub fn stream_body(&self) -> Option<&StreamBody> {
        match &self.body {
            NodeBody::Stream { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Handles of every direct child, in storage order.
    pub(crate) fn children(&self) -> Vec<Value> {
        match &self.body {
            NodeBody::Array(items) => items.clone(),
            NodeBody::Dictionary(entries) | NodeBody::Stream { header: entries, .. } => {
                entries.values().cloned().collect()
            }
        }
    }
}
