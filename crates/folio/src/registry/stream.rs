//! Stream bodies: lazy external resources and the `/Filter` codec chain.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::node::{NodeBody, StreamBody};
use super::Registry;
use crate::error::{Error, Result};
use crate::objects::{Kind, NodeId, PdfString, Primitive, Value};

impl Registry {
    fn body(&self, id: NodeId) -> Result<&StreamBody> {
        let slot = self.node(id)?;
        slot.stream_body()
            .ok_or_else(|| Error::type_mismatch(Kind::Stream, slot.kind(), format!("node {}", id.0)))
    }

    fn body_mut(&mut self, id: NodeId) -> Result<&mut StreamBody> {
        let slot = self.node_mut(id)?;
        let kind = slot.kind();
        match &mut slot.body {
            NodeBody::Stream { body, .. } => Ok(body),
            _ => Err(Error::type_mismatch(Kind::Stream, kind, format!("node {}", id.0))),
        }
    }

    /// Raw body bytes, encoded as the header's `/Filter` says.
    ///
    /// An external body is read from disk on first access and cached.
    pub fn stream_body(&mut self, id: NodeId) -> Result<Vec<u8>> {
        let body = self.body(id)?;
        if let Some(bytes) = body.bytes() {
            return Ok(bytes.to_vec());
        }
        let Some(path) = body.external.clone() else {
            return Ok(Vec::new());
        };
        let bytes = std::fs::read(&path).map_err(|source| Error::ExternalResource {
            path: path.clone(),
            source,
        })?;
        debug!(registry = self.id, path = %path.display(), len = bytes.len(), "loaded external stream body");
        self.body_mut(id)?.bytes = Some(bytes.clone());
        Ok(bytes)
    }

    /// Replace the body with in-memory bytes, encoded per the current header.
    ///
    /// Any external resource link (`/F`) is dropped.
    pub fn set_stream_body(&mut self, id: NodeId, bytes: Vec<u8>) -> Result<()> {
        self.ensure_mutable(id)?;
        let decoded = !self.dict_contains(id, "Filter")?;
        let body = self.body_mut(id)?;
        body.bytes = Some(bytes);
        body.external = None;
        body.dirty = true;
        body.decoded = decoded;
        if self.dict_contains(id, "F")? {
            self.dict_remove(id, "F")?;
        }
        self.update(id)
    }

    pub fn is_decoded(&self, id: NodeId) -> Result<bool> {
        Ok(self.body(id)?.decoded)
    }

    pub(crate) fn set_decoded(&mut self, id: NodeId, decoded: bool) -> Result<()> {
        self.body_mut(id)?.decoded = decoded;
        Ok(())
    }

    /// Filter names and decode parameters from the header, in chain order.
    fn filter_chain(&mut self, id: NodeId) -> Result<Vec<(String, Option<Primitive>)>> {
        let names = match self.resolve_entry(id, "Filter")? {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Name(name)) => vec![name.as_str().to_string()],
            Some(Value::Array(array)) => {
                let mut names = Vec::new();
                for item in self.array_items(array)? {
                    match self.resolve(&item)? {
                        Value::Name(name) => names.push(name.as_str().to_string()),
                        other => {
                            return Err(Error::type_mismatch(Kind::Name, other.kind(), "stream /Filter item"))
                        }
                    }
                }
                names
            }
            Some(other) => return Err(Error::type_mismatch(Kind::Name, other.kind(), "stream /Filter")),
        };
        let params: Vec<Option<Primitive>> = match self.resolve_entry(id, "DecodeParms")? {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(array)) => {
                let mut params = Vec::new();
                for item in self.array_items(array)? {
                    let item = self.resolve(&item)?;
                    params.push(match item {
                        Value::Null => None,
                        other => Some(self.export(&other)?),
                    });
                }
                params
            }
            Some(other) => vec![Some(self.export(&other)?)],
        };
        Ok(names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, params.get(i).cloned().flatten()))
            .collect())
    }

    /// Body with every filter of the chain applied; the node is unchanged.
    pub fn decoded_bytes(&mut self, id: NodeId) -> Result<Vec<u8>> {
        let chain = self.filter_chain(id)?;
        let mut bytes = self.stream_body(id)?;
        if chain.is_empty() {
            if !self.body(id)?.decoded {
                return Err(Error::corrupt(format!(
                    "stream node {} is marked encoded but has no /Filter",
                    id.0
                )));
            }
            return Ok(bytes);
        }
        for (name, params) in &chain {
            bytes = self
                .filter(name)?
                .decode(&bytes, params.as_ref())
                .map_err(|e| Error::filter(name.as_str(), e.to_string()))?;
        }
        Ok(bytes)
    }

    /// Decode the body in place, stripping `/Filter` and `/DecodeParms`.
    pub fn decode_stream(&mut self, id: NodeId) -> Result<()> {
        self.ensure_mutable(id)?;
        if self.body(id)?.decoded {
            return Ok(());
        }
        let bytes = self.decoded_bytes(id)?;
        self.dict_remove(id, "Filter")?;
        self.dict_remove(id, "DecodeParms")?;
        let body = self.body_mut(id)?;
        body.bytes = Some(bytes);
        body.external = None;
        body.decoded = true;
        body.dirty = true;
        self.update(id)
    }

    /// Encode a decoded body with the filter `name`.
    pub fn encode_stream(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.ensure_mutable(id)?;
        if !self.body(id)?.decoded {
            return Err(Error::filter(name, "stream is already encoded"));
        }
        let bytes = self.stream_body(id)?;
        let encoded = self
            .filter(name)?
            .encode(&bytes, None)
            .map_err(|e| Error::filter(name, e.to_string()))?;
        let body = self.body_mut(id)?;
        body.bytes = Some(encoded);
        body.external = None;
        body.decoded = false;
        body.dirty = true;
        self.dict_set(id, "Filter", Value::name(name))?;
        Ok(())
    }

    /// Write the body to `path` and link it through the header's `/F`.
    pub fn store_external(&mut self, id: NodeId, path: &Path) -> Result<()> {
        self.ensure_mutable(id)?;
        let bytes = self.stream_body(id)?;
        std::fs::write(path, &bytes).map_err(|source| Error::ExternalResource {
            path: path.to_path_buf(),
            source,
        })?;
        let body = self.body_mut(id)?;
        body.external = Some(PathBuf::from(path));
        body.dirty = true;
        let spec = PdfString::new(path.to_string_lossy().into_owned());
        self.dict_set(id, "F", Value::String(spec))?;
        Ok(())
    }
}
