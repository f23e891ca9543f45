use crate::objects::{Reference, Value, UNREUSABLE_GENERATION};

/// Cross-reference usage state of an object slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    Free,
    InUse,
    /// In use, stored inside an object stream.
    InUseCompressed,
}

/// Where the object's data lives in the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Not backed by the file (new or relocated object).
    None,
    /// Byte offset of `n g obj`.
    Offset(u64),
    /// Index inside the object stream `container`.
    Compressed { container: u32, index: u32 },
}

/// Cross-reference entry handed over by the parsing layer when a registry
/// is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    pub reference: Reference,
    pub usage: Usage,
    pub location: Location,
}

impl XrefEntry {
    pub fn in_use(number: u32, generation: u16, offset: u64) -> Self {
        Self {
            reference: Reference::new(number, generation),
            usage: Usage::InUse,
            location: Location::Offset(offset),
        }
    }

    pub fn compressed(number: u32, container: u32, index: u32) -> Self {
        Self {
            reference: Reference::new(number, 0),
            usage: Usage::InUseCompressed,
            location: Location::Compressed { container, index },
        }
    }

    pub fn free(number: u32, generation: u16) -> Self {
        Self {
            reference: Reference::new(number, generation),
            usage: Usage::Free,
            location: Location::None,
        }
    }
}

/// Registry entry: the unit of identity and lazy loading.
#[derive(Debug, Clone)]
pub struct IndirectObject {
    pub(crate) reference: Reference,
    pub(crate) usage: Usage,
    pub(crate) location: Location,
    pub(crate) data: Option<Value>,
    pub(crate) updateable: bool,
    pub(crate) updated: bool,
    pub(crate) virtual_: bool,
}

impl IndirectObject {
    pub(crate) fn new(reference: Reference, usage: Usage, location: Location) -> Self {
        Self {
            reference,
            usage,
            location,
            data: None,
            updateable: true,
            updated: false,
            virtual_: false,
        }
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Data, when already materialized.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_in_use(&self) -> bool {
        self.usage != Usage::Free
    }

    pub fn is_compressed(&self) -> bool {
        self.usage == Usage::InUseCompressed
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_
    }

    pub fn is_unreusable(&self) -> bool {
        self.reference.generation == UNREUSABLE_GENERATION
    }
}
