//! String utilities.
//!
//! Escaping for literal strings `( … )`, hexadecimal strings `< … >` and
//! names `/…`.

mod escape;
mod hex;
mod name;

pub use escape::{escape_literal, needs_hex};
pub use hex::{from_hex, to_hex};
pub use name::{escape_name, unescape_name};
