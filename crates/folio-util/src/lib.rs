//! folio-util - Lexical helpers for folio
//!
//! Everything a node needs to render its own syntax without knowing its
//! container: string and name escaping, hexadecimal encoding, real-number
//! formatting and date strings.

pub mod date;
pub mod number;
pub mod strings;

// Re-exports for convenience
pub use date::{format_date, parse_date};
pub use number::format_real;
pub use strings::{escape_literal, escape_name, from_hex, needs_hex, to_hex, unescape_name};
