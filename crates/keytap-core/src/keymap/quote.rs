//! Character-literal quoting for key code bytes.
//!
//! The byte is read as a Unicode scalar in U+0000–U+00FF and printed between
//! single quotes.  Printable characters appear as themselves, the usual
//! single-letter escapes are used where they exist, C0 controls and DEL use
//! `\xNN`, and the remaining non-printable Latin-1 code points (C1 controls,
//! no-break space, soft hyphen) use `\uNNNN`.

/// Quotes `byte` as a character literal, e.g. `'A'`, `'\n'`, `'\x00'`.
pub fn quote_byte(byte: u8) -> String {
    let mut out = String::with_capacity(8);
    out.push('\'');
    push_escaped(&mut out, byte);
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, byte: u8) {
    match byte {
        b'\'' => out.push_str("\\'"),
        b'\\' => out.push_str("\\\\"),
        0x07 => out.push_str("\\a"),
        0x08 => out.push_str("\\b"),
        0x0C => out.push_str("\\f"),
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        0x0B => out.push_str("\\v"),
        b if is_printable(b) => out.push(char::from(b)),
        b @ (0x00..=0x1F | 0x7F) => out.push_str(&format!("\\x{b:02x}")),
        b => out.push_str(&format!("\\u{b:04x}")),
    }
}

/// Graphic characters plus the ASCII space.
fn is_printable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7E | 0xA1..=0xAC | 0xAE..=0xFF)
}
