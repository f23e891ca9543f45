const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes as upper-case hexadecimal digits.
///
/// ```
/// use folio_util::strings::to_hex;
///
/// assert_eq!(to_hex(&[0x00, 0xAB, 0x7F]), "00AB7F");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0F) as usize] as char);
    }
    out
}

/// Decode hexadecimal digits, ignoring whitespace.
///
/// An odd trailing digit is padded with `0`, as hexadecimal strings allow.
/// Returns `None` on any non-hex, non-whitespace character.
pub fn from_hex(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            continue;
        }
        let digit = ch.to_digit(16)? as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | digit),
            None => high = Some(digit),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(b""), "");
        assert_eq!(to_hex(b"AB"), "4142");
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(from_hex("4142"), Some(b"AB".to_vec()));
        assert_eq!(from_hex("41 42\n43"), Some(b"ABC".to_vec()));
        assert_eq!(from_hex("414"), Some(vec![0x41, 0x40]));
        assert_eq!(from_hex("zz"), None);
    }
}
