use crate::util::encoding::Encoding;

/// A zero-width look-around assertion.
///
/// Every assertion is evaluated against the entire haystack, and never just
/// the search window. The only assertion that depends on the window is
/// [`Look::SearchStart`] (`\G`), which matches only at the window's start.
///
/// Line anchors only recognize `\n` as a line terminator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Look {
    /// `^`: the current position is the beginning of the haystack or the
    /// previous character is `\n`.
    StartLine,
    /// `$`: the current position is the end of the haystack or the next
    /// character is `\n`.
    EndLine,
    /// `\A`: the current position is the beginning of the haystack.
    StartText,
    /// `\z`: the current position is the end of the haystack.
    EndText,
    /// `\Z`: the current position is the end of the haystack, or is just
    /// before a `\n` that ends the haystack.
    EndTextOptionalNewline,
    /// `\b`: exactly one of the characters on either side of the current
    /// position is a word character. The edges of the haystack count as
    /// non-word characters.
    WordBoundary,
    /// `\B`: the negation of `\b`.
    NotWordBoundary,
    /// `\G`: the current position is the start of the search window.
    SearchStart,
}

impl Look {
    /// Returns the concrete syntax for this assertion.
    pub fn as_str(self) -> &'static str {
        match self {
            Look::StartLine => "^",
            Look::EndLine => "$",
            Look::StartText => r"\A",
            Look::EndText => r"\z",
            Look::EndTextOptionalNewline => r"\Z",
            Look::WordBoundary => r"\b",
            Look::NotWordBoundary => r"\B",
            Look::SearchStart => r"\G",
        }
    }

    /// Returns true when the position `at` in `haystack` satisfies this
    /// assertion. `search_start` is the start of the current search window.
    ///
    /// This panics if `at > haystack.len()`.
    #[inline]
    pub(crate) fn matches(
        self,
        enc: Encoding,
        haystack: &[u8],
        at: usize,
        search_start: usize,
    ) -> bool {
        match self {
            Look::StartLine => {
                at == 0 || prev_char(enc, haystack, at) == Some('\n')
            }
            Look::EndLine => {
                at == haystack.len()
                    || next_char(enc, haystack, at) == Some('\n')
            }
            Look::StartText => at == 0,
            Look::EndText => at == haystack.len(),
            Look::EndTextOptionalNewline => {
                at == haystack.len()
                    || (next_char(enc, haystack, at) == Some('\n')
                        && at + enc.unit_len() == haystack.len())
            }
            Look::WordBoundary => is_word_boundary(enc, haystack, at),
            Look::NotWordBoundary => !is_word_boundary(enc, haystack, at),
            Look::SearchStart => at == search_start,
        }
    }
}

impl core::fmt::Display for Look {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[inline]
fn prev_char(enc: Encoding, haystack: &[u8], at: usize) -> Option<char> {
    match enc.decode_last(&haystack[..at]) {
        Some(Ok((ch, _))) => Some(ch),
        _ => None,
    }
}

#[inline]
fn next_char(enc: Encoding, haystack: &[u8], at: usize) -> Option<char> {
    match enc.decode(&haystack[at..]) {
        Some(Ok((ch, _))) => Some(ch),
        _ => None,
    }
}

#[inline]
fn is_word_boundary(enc: Encoding, haystack: &[u8], at: usize) -> bool {
    let is_word = |ch: Option<char>| {
        ch.map_or(false, crate::syntax::unicode::is_word_char)
    };
    let word_before = is_word(prev_char(enc, haystack, at));
    let word_after = is_word(next_char(enc, haystack, at));
    word_before != word_after
}
