//! folio — document-object substrate for PDF-style files.
//!
//! Provides the typed node graph, the indirect-object registry that owns
//! it, a visitor-based traversal contract, balanced name/number trees,
//! cross-document cloning and typed facades over raw nodes.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`objects`] | `Value`, `Primitive`, names, strings, references |
//! | [`registry`] | arena, object table, lazy loading, streams, dirtiness |
//! | [`traversal`] | `Visitor` and reachability |
//! | [`clone`] | `Cloner` and its filter chain |
//! | [`tree`] | balanced sorted maps realized as node dictionaries |
//! | [`facade`] | `Catalog`, `Page`, `FieldList`, `TypedArray` |
//!
//! Parsing and file framing are external: objects arrive through
//! [`registry::ObjectSource`] and stream codecs through
//! [`registry::StreamFilter`].

pub mod clone;
pub mod config;
pub mod equal;
pub mod error;
pub mod facade;
pub mod objects;
pub mod registry;
mod serialize;
pub mod traversal;
pub mod tree;
mod view;

pub use clone::Cloner;
pub use config::FolioConfig;
pub use error::{Error, Result};
pub use facade::{Catalog, Facade, NameTree, NumberTree};
pub use objects::{Name, PdfString, Primitive, Reference, Value};
pub use registry::Registry;
pub use tree::Tree;
