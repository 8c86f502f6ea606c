/*!
Character encodings understood by the compiler and the matching engine.

A pattern and every haystack searched with it share one [`Encoding`], which
is chosen when the pattern is compiled. There is no global or process wide
encoding setting.

All offsets used throughout this crate are byte offsets into the encoded
data, regardless of the encoding.
*/

/// The encoding of a pattern and of the haystacks it searches.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Encoding {
    /// UTF-8. Invalid sequences are permitted in haystacks, but never match
    /// anything that consumes a character.
    #[default]
    Utf8,
    /// UTF-16, little endian. Offsets are still measured in bytes, so every
    /// character boundary is at an even offset.
    Utf16Le,
    /// ISO-8859-1. Every byte is a character in the range `U+0000` to
    /// `U+00FF`.
    Latin1,
}

impl Encoding {
    /// Return the number of bytes in the smallest code unit of this encoding.
    pub fn unit_len(self) -> usize {
        match self {
            Encoding::Utf8 | Encoding::Latin1 => 1,
            Encoding::Utf16Le => 2,
        }
    }

    /// Return true if and only if this encoding represents every ASCII
    /// character as the identical single byte and never uses ASCII bytes
    /// for anything else. Byte oriented literal scanning is only correct in
    /// these encodings.
    pub(crate) fn is_ascii_compatible(self) -> bool {
        match self {
            Encoding::Utf8 | Encoding::Latin1 => true,
            Encoding::Utf16Le => false,
        }
    }

    /// Decodes the character at the beginning of `bytes`.
    ///
    /// On success, this returns the character and the number of bytes it
    /// occupies. If the bytes at the beginning are not a valid encoding of a
    /// character, this returns `Err(len)` where `len` is the number of bytes
    /// that should be skipped to make progress.
    ///
    /// This returns `None` if and only if `bytes` is empty.
    #[inline(always)]
    pub(crate) fn decode(
        self,
        bytes: &[u8],
    ) -> Option<Result<(char, usize), usize>> {
        if bytes.is_empty() {
            return None;
        }
        Some(match self {
            Encoding::Utf8 => utf8_decode(bytes),
            Encoding::Utf16Le => utf16le_decode(bytes),
            Encoding::Latin1 => Ok((char::from(bytes[0]), 1)),
        })
    }

    /// Decodes the character at the end of `bytes`.
    ///
    /// This has the same return value as [`Encoding::decode`], except the
    /// length returned on failure is the number of bytes to skip backwards.
    ///
    /// This returns `None` if and only if `bytes` is empty.
    #[inline(always)]
    pub(crate) fn decode_last(
        self,
        bytes: &[u8],
    ) -> Option<Result<(char, usize), usize>> {
        if bytes.is_empty() {
            return None;
        }
        Some(match self {
            Encoding::Utf8 => utf8_decode_last(bytes),
            Encoding::Utf16Le => utf16le_decode_last(bytes),
            Encoding::Latin1 => Ok((char::from(bytes[bytes.len() - 1]), 1)),
        })
    }

    /// Appends the encoding of `ch` to `out`.
    ///
    /// If `ch` cannot be represented in this encoding, then nothing is
    /// written and `false` is returned.
    pub fn encode(self, ch: char, out: &mut Vec<u8>) -> bool {
        match self {
            Encoding::Utf8 => {
                let mut buf = [0; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            Encoding::Utf16Le => {
                let mut buf = [0; 2];
                for unit in ch.encode_utf16(&mut buf) {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Encoding::Latin1 => match u8::try_from(u32::from(ch)) {
                Ok(b) => out.push(b),
                Err(_) => return false,
            },
        }
        true
    }

    /// Encodes an entire string in this encoding.
    ///
    /// This returns `None` if any character of `s` cannot be represented.
    pub fn encode_str(self, s: &str) -> Option<Vec<u8>> {
        if self == Encoding::Utf8 {
            return Some(s.as_bytes().to_vec());
        }
        let mut out = Vec::with_capacity(s.len() * self.unit_len());
        for ch in s.chars() {
            if !self.encode(ch, &mut out) {
                return None;
            }
        }
        Some(out)
    }

    /// Returns the offset of the character boundary that follows `at`.
    ///
    /// Invalid sequences are stepped over by the smallest amount that makes
    /// progress. If `at` is at or past the end of `bytes`, then `at + 1` is
    /// returned.
    #[inline]
    pub(crate) fn next_boundary(self, bytes: &[u8], at: usize) -> usize {
        match self.decode(bytes.get(at..).unwrap_or(&[])) {
            None => at + 1,
            Some(Ok((_, len))) | Some(Err(len)) => at + len,
        }
    }
}

/// Given a UTF-8 leading byte, this returns the total number of code units
/// in the following encoded codepoint.
///
/// If the given byte is not a valid UTF-8 leading byte, then this returns
/// `None`.
#[inline(always)]
fn utf8_len(byte: u8) -> Option<usize> {
    if byte <= 0x7F {
        Some(1)
    } else if byte & 0b1100_0000 == 0b1000_0000 {
        None
    } else if byte <= 0b1101_1111 {
        Some(2)
    } else if byte <= 0b1110_1111 {
        Some(3)
    } else if byte <= 0b1111_0111 {
        Some(4)
    } else {
        None
    }
}

#[inline(always)]
fn utf8_decode(bytes: &[u8]) -> Result<(char, usize), usize> {
    let len = match utf8_len(bytes[0]) {
        None => return Err(1),
        Some(len) if len > bytes.len() => return Err(1),
        Some(1) => return Ok((char::from(bytes[0]), 1)),
        Some(len) => len,
    };
    match core::str::from_utf8(&bytes[..len]) {
        Ok(s) => s.chars().next().map(|ch| (ch, len)).ok_or(1),
        Err(_) => Err(1),
    }
}

#[inline(always)]
fn utf8_decode_last(bytes: &[u8]) -> Result<(char, usize), usize> {
    let mut start = bytes.len() - 1;
    let limit = bytes.len().saturating_sub(4);
    while start > limit && !is_leading_or_invalid_byte(bytes[start]) {
        start -= 1;
    }
    match utf8_decode(&bytes[start..]) {
        Ok((ch, len)) if start + len == bytes.len() => Ok((ch, len)),
        _ => Err(1),
    }
}

/// Returns true if and only if the given byte is either a valid leading UTF-8
/// byte, or is otherwise an invalid byte that can never appear anywhere in a
/// valid UTF-8 sequence.
#[inline(always)]
fn is_leading_or_invalid_byte(b: u8) -> bool {
    (b & 0b1100_0000) != 0b1000_0000
}

#[inline(always)]
fn utf16le_unit(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline(always)]
fn utf16le_decode(bytes: &[u8]) -> Result<(char, usize), usize> {
    if bytes.len() < 2 {
        return Err(bytes.len());
    }
    let unit = utf16le_unit(bytes, 0);
    match unit {
        0xD800..=0xDBFF => {
            if bytes.len() < 4 {
                return Err(2);
            }
            let low = utf16le_unit(bytes, 2);
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(2);
            }
            let cp = 0x10000
                + ((u32::from(unit) - 0xD800) << 10)
                + (u32::from(low) - 0xDC00);
            char::from_u32(cp).map(|ch| (ch, 4)).ok_or(2)
        }
        0xDC00..=0xDFFF => Err(2),
        _ => char::from_u32(u32::from(unit)).map(|ch| (ch, 2)).ok_or(2),
    }
}

#[inline(always)]
fn utf16le_decode_last(bytes: &[u8]) -> Result<(char, usize), usize> {
    if bytes.len() % 2 != 0 {
        return Err(1);
    }
    let end = bytes.len();
    let unit = utf16le_unit(bytes, end - 2);
    match unit {
        0xDC00..=0xDFFF => {
            if end < 4 {
                return Err(2);
            }
            match utf16le_decode(&bytes[end - 4..]) {
                Ok((ch, 4)) => Ok((ch, 4)),
                _ => Err(2),
            }
        }
        0xD800..=0xDBFF => Err(2),
        _ => char::from_u32(u32::from(unit)).map(|ch| (ch, 2)).ok_or(2),
    }
}
