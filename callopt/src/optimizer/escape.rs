///
/// C String Literal Escaping
///
/// Literal text folded into an emitted instruction is embedded between
/// double quotes, so anything that would end the literal early or change
/// its bytes has to be escaped:
///
/// - backslash and double quote
/// - newline, carriage return and tab (short escapes)
/// - `?` directly after another `?` (would otherwise start a trigraph)
/// - every other byte outside printable ASCII, including each byte of a
///   multi-byte UTF-8 sequence, as a three digit octal escape
///
/// Octal escapes stop after three digits; `\x` escapes would swallow any
/// hex digit that follows them in the literal.
///

pub fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = 0u8;
    for &b in s.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'?' if prev == b'?' => out.push_str("\\?"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
        prev = b;
    }
    out
}

/// A literal folded at compile time: escaped body plus its unescaped byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedLiteral {
    pub escaped: String,
    pub len: usize,
}

impl FoldedLiteral {
    pub fn new(raw: &str) -> Self {
        Self {
            escaped: escape_c_string(raw),
            len: raw.len(),
        }
    }

    /// `"escaped", len` as passed to the literal instruction forms.
    pub fn arguments(&self) -> String {
        format!("\"{}\", {}", self.escaped, self.len)
    }
}
