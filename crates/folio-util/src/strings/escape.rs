/// Escape the bytes of a literal string body.
///
/// This function escapes:
/// - Parentheses and backslash (`(`, `)`, `\`)
/// - Line feed, carriage return, tab, backspace and form feed
///
/// Every other byte is copied verbatim, so the output is a valid body for
/// `( … )` regardless of encoding.
///
/// # Examples
///
/// ```
/// use folio_util::strings::escape_literal;
///
/// assert_eq!(escape_literal(b"hello"), b"hello".to_vec());
/// assert_eq!(escape_literal(b"a(b)c"), b"a\\(b\\)c".to_vec());
/// assert_eq!(escape_literal(b"line1\nline2"), b"line1\\nline2".to_vec());
/// ```
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        let escaped: Option<&[u8]> = match b {
            b'(' => Some(b"\\("),
            b')' => Some(b"\\)"),
            b'\\' => Some(b"\\\\"),
            b'\n' => Some(b"\\n"),
            b'\r' => Some(b"\\r"),
            b'\t' => Some(b"\\t"),
            0x08 => Some(b"\\b"),
            0x0C => Some(b"\\f"),
            _ => None,
        };
        match escaped {
            Some(esc) => result.extend_from_slice(esc),
            None => result.push(b),
        }
    }
    result
}

/// Whether a byte string reads better as a hexadecimal string.
///
/// True when more than a quarter of the bytes are outside printable ASCII.
pub fn needs_hex(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let binary = bytes
        .iter()
        .filter(|&&b| !(0x20..0x7F).contains(&b) && !matches!(b, b'\n' | b'\r' | b'\t'))
        .count();
    binary * 4 > bytes.len()
}
