/// Escape a name for output after its leading `/`.
///
/// Bytes outside `!`..`~`, the delimiters `()<>[]{}/%` and `#` itself are
/// written as `#xx`.
///
/// ```
/// use folio_util::strings::escape_name;
///
/// assert_eq!(escape_name("Type"), "Type");
/// assert_eq!(escape_name("A B"), "A#20B");
/// assert_eq!(escape_name("x#y"), "x#23y");
/// ```
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name.as_bytes() {
        let delimiter = matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        );
        if (0x21..=0x7E).contains(&b) && !delimiter {
            out.push(b as char);
        } else {
            out.push_str(&format!("#{:02X}", b));
        }
    }
    out
}

/// Reverse [`escape_name`]. Malformed `#` sequences are kept literally.
pub fn unescape_name(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && i + 2 < bytes.len() {
            let high = (bytes[i + 1] as char).to_digit(16);
            let low = (bytes[i + 2] as char).to_digit(16);
            if let (Some(h), Some(l)) = (high, low) {
                out.push((h * 16 + l) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
