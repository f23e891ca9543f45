//! Canonical object syntax.
//!
//! | Kind | Output |
//! |------|--------|
//! | null / boolean | `null`, `true`, `false` |
//! | integer / real | `42`, `0.5` (no exponent, trailing zeros trimmed) |
//! | name | `/Name` with `#xx` escapes |
//! | string | `(literal)` or `<hex>` |
//! | date | `(D:YYYYMMDDHHmmSS+HH'mm')` |
//! | array | `[a b]` |
//! | dictionary | `<< /K v >>` |
//! | stream | `<< header >>\nstream\r\n…\r\nendstream` |
//! | reference | `n g R` |
//! | indirect object | `n g obj\n…\nendobj\n` |
//!
//! Each value renders without knowledge of its container. Virtual
//! composites, references to virtual objects and dictionary entries holding
//! either render nothing.

use std::io::Write;

use folio_util::{escape_literal, escape_name, format_date, format_real, needs_hex, to_hex};

use crate::error::{Error, Result};
use crate::objects::{Name, NodeId, PdfString, Reference, Value};
use crate::registry::Registry;

impl Registry {
    /// Whether `value` is a placeholder that must not be written.
    pub fn is_invisible(&self, value: &Value) -> bool {
        match value {
            Value::Array(id) | Value::Dictionary(id) | Value::Stream(id) => {
                self.node(*id).map(|slot| slot.is_virtual()).unwrap_or(true)
            }
            Value::Reference(reference) => self
                .object(reference.number)
                .map(|o| o.is_virtual())
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn write_value(&mut self, out: &mut dyn Write, value: &Value) -> Result<()> {
        match value {
            Value::Null => out.write_all(b"null")?,
            Value::Boolean(true) => out.write_all(b"true")?,
            Value::Boolean(false) => out.write_all(b"false")?,
            Value::Integer(i) => write!(out, "{i}")?,
            Value::Real(r) => out.write_all(format_real(*r).as_bytes())?,
            Value::Name(name) => write_name(out, name)?,
            Value::String(s) => write_string(out, s)?,
            Value::Date(date) => {
                out.write_all(b"(")?;
                out.write_all(format_date(date).as_bytes())?;
                out.write_all(b")")?;
            }
            Value::Reference(reference) => write_reference(out, *reference)?,
            Value::Array(id) => self.write_array(out, *id)?,
            Value::Dictionary(id) => self.write_dictionary(out, *id, None)?,
            Value::Stream(id) => self.write_stream(out, *id)?,
        }
        Ok(())
    }

    fn write_array(&mut self, out: &mut dyn Write, id: NodeId) -> Result<()> {
        if self.node(id)?.is_virtual() {
            return Ok(());
        }
        out.write_all(b"[")?;
        let mut first = true;
        for item in self.array_items(id)? {
            if self.is_invisible(&item) {
                continue;
            }
            if !first {
                out.write_all(b" ")?;
            }
            first = false;
            self.write_value(out, &item)?;
        }
        out.write_all(b"]")?;
        Ok(())
    }

    /// `length` overrides (or supplies) a stream header's `/Length`.
    fn write_dictionary(&mut self, out: &mut dyn Write, id: NodeId, length: Option<usize>) -> Result<()> {
        if length.is_none() && self.node(id)?.is_virtual() {
            return Ok(());
        }
        out.write_all(b"<<")?;
        let mut wrote_length = false;
        for (key, value) in self.dict_entries(id)? {
            if self.is_invisible(&value) {
                continue;
            }
            out.write_all(b" ")?;
            write_name(out, &key)?;
            out.write_all(b" ")?;
            match length {
                Some(length) if key.as_str() == "Length" => {
                    write!(out, "{length}")?;
                    wrote_length = true;
                }
                _ => self.write_value(out, &value)?,
            }
        }
        if let (Some(length), false) = (length, wrote_length) {
            write!(out, " /Length {length}")?;
        }
        out.write_all(b" >>")?;
        Ok(())
    }

    fn write_stream(&mut self, out: &mut dyn Write, id: NodeId) -> Result<()> {
        if self.node(id)?.is_virtual() {
            return Ok(());
        }
        let external = self
            .node(id)?
            .stream_body()
            .map(|b| b.external_path().is_some())
            .unwrap_or(false);
        let body = if external {
            Vec::new()
        } else {
            self.stream_body(id)?
        };
        self.write_dictionary(out, id, Some(body.len()))?;
        out.write_all(b"\nstream\r\n")?;
        out.write_all(&body)?;
        out.write_all(b"\r\nendstream")?;
        Ok(())
    }

    /// Write `n g obj … endobj` for one in-use object.
    pub fn write_object(&mut self, out: &mut dyn Write, reference: Reference) -> Result<()> {
        let data = self.object_data(reference)?;
        writeln!(out, "{} {} obj", reference.number, reference.generation)?;
        self.write_value(out, &data)?;
        out.write_all(b"\nendobj\n")?;
        Ok(())
    }

    /// Write every registered, in-use object in number order.
    pub fn write_body(&mut self, out: &mut dyn Write) -> Result<()> {
        self.load_all()?;
        for reference in self.references() {
            self.write_object(out, reference)?;
        }
        Ok(())
    }

    pub fn write_trailer(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(b"trailer\n")?;
        let trailer = Value::Dictionary(self.trailer());
        self.write_value(out, &trailer)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Object body followed by the trailer dictionary.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_body(&mut out)?;
        self.write_trailer(&mut out)?;
        Ok(out)
    }

    /// Serialization of a single value, mostly useful in tests.
    pub fn value_to_bytes(&mut self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_value(&mut out, value)?;
        Ok(out)
    }

    /// Whether any object is dirty and would be part of an incremental update.
    pub fn has_changes(&self) -> bool {
        self.objects().any(|o| o.is_updated() && !o.is_virtual())
    }
}

fn write_name(out: &mut dyn Write, name: &Name) -> Result<()> {
    out.write_all(b"/")?;
    out.write_all(escape_name(name.as_str()).as_bytes())?;
    Ok(())
}

fn write_string(out: &mut dyn Write, s: &PdfString) -> Result<()> {
    if s.is_hex() || needs_hex(s.as_bytes()) {
        out.write_all(b"<")?;
        out.write_all(to_hex(s.as_bytes()).as_bytes())?;
        out.write_all(b">")?;
    } else {
        out.write_all(b"(")?;
        out.write_all(&escape_literal(s.as_bytes()))?;
        out.write_all(b")")?;
    }
    Ok(())
}

fn write_reference(out: &mut dyn Write, reference: Reference) -> Result<()> {
    write!(out, "{} {} R", reference.number, reference.generation).map_err(Error::from)
}
