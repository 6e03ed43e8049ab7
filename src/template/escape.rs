// Percent-encoding of expanded values, per RFC 6570 section 1.5

use std::borrow::Cow;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

const UPPERHEX: &[u8; 16] = b"0123456789ABCDEF";

/// A set of byte classes that must be percent-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mask(u8);

impl Mask {
    /// Everything that is neither reserved nor unreserved, including every
    /// byte above 0x7F.
    pub const DISALLOWED: Mask = Mask(1);
    /// `ALPHA / DIGIT / "-" / "." / "_" / "~"`
    pub const UNRESERVED: Mask = Mask(1 << 1);
    /// gen-delims `:/?#[]@` and sub-delims `!$&'()*+,;=`
    pub const RESERVED: Mask = Mask(1 << 2);

    pub const fn empty() -> Self {
        Mask(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Mask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether `byte` belongs to any class of this mask.
    pub fn matches(self, byte: u8) -> bool {
        CLASSES[byte as usize] & self.0 != 0
    }
}

impl BitOr for Mask {
    type Output = Mask;

    fn bitor(self, rhs: Mask) -> Mask {
        Mask(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Mask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Mask::DISALLOWED, "disallowed"),
            (Mask::UNRESERVED, "unreserved"),
            (Mask::RESERVED, "reserved"),
        ]
        .into_iter()
        .filter(|(class, _)| self.contains(*class))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

const D: u8 = Mask::DISALLOWED.0;
const U: u8 = Mask::UNRESERVED.0;
const R: u8 = Mask::RESERVED.0;

/// Class of every byte value.
static CLASSES: [u8; 256] = build_classes();

const fn build_classes() -> [u8; 256] {
    let mut table = [D; 256];

    let mut c = 0;
    while c < 128 {
        let b = c as u8;
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_' || b == b'~' {
            table[c] = U;
        }
        c += 1;
    }

    let reserved = b":/?#[]@!$&'()*+,;=";
    let mut i = 0;
    while i < reserved.len() {
        table[reserved[i] as usize] = R;
        i += 1;
    }

    table
}

fn count_matches(bytes: &[u8], mask: Mask) -> usize {
    bytes.iter().filter(|&&b| mask.matches(b)).count()
}

fn push_encoded(out: &mut Vec<u8>, byte: u8) {
    out.push(b'%');
    out.push(UPPERHEX[(byte >> 4) as usize]);
    out.push(UPPERHEX[(byte & 0xF) as usize]);
}

/// Percent-encode every byte of `bytes` whose class is in `mask`.
///
/// When nothing matches the input is handed back borrowed.
pub fn escape_bytes(bytes: &[u8], mask: Mask) -> Cow<'_, [u8]> {
    let matches = count_matches(bytes, mask);
    if matches == 0 {
        return Cow::Borrowed(bytes);
    }

    let mut out = Vec::with_capacity(bytes.len() + 2 * matches);
    for &b in bytes {
        if mask.matches(b) {
            push_encoded(&mut out, b);
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

/// Percent-encode every byte of `s` whose class is in `mask`, using
/// uppercase hex digits.
///
/// When no byte matches, `s` itself is returned and nothing is allocated.
/// Otherwise the result is exactly `s.len() + 2 * matches` bytes long.
pub fn escape(s: &str, mask: Mask) -> Cow<'_, str> {
    let matches = count_matches(s.as_bytes(), mask);
    if matches == 0 {
        return Cow::Borrowed(s);
    }

    // Bytes above 0x7F are only ever DISALLOWED, so a multi-byte character is
    // either encoded whole or copied whole.
    let mut out = String::with_capacity(s.len() + 2 * matches);
    let mut utf8 = [0u8; 4];
    for ch in s.chars() {
        let encoded = ch.encode_utf8(&mut utf8);
        if mask.matches(encoded.as_bytes()[0]) {
            for &b in encoded.as_bytes() {
                out.push('%');
                out.push(UPPERHEX[(b >> 4) as usize] as char);
                out.push(UPPERHEX[(b & 0xF) as usize] as char);
            }
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
