use core::ops::Range;

use crate::util::encoding::Encoding;

/// The parameters for a regex search.
///
/// An `Input` describes a search window: a haystack together with the
/// subrange of it that a match must fall within. The haystack is borrowed
/// for the duration of the search only; it need not outlive the compiled
/// [`Regex`](crate::Regex).
///
/// Look-around assertions such as `^`, `$` and `\b` are resolved against the
/// *entire* haystack, not just the window. For example, `^` does not match
/// at the start of a window that begins in the middle of a line. The `\G`
/// assertion, on the other hand, matches exactly at the start of the window.
///
/// The minimal search configuration is simply a call to [`Input::new`].
/// The builder-like methods [`Input::span`], [`Input::window`] and
/// [`Input::anchored`] transform an `Input` by value.
#[derive(Clone, Copy)]
pub struct Input<'h> {
    haystack: &'h [u8],
    span: Span,
    anchored: bool,
}

impl<'h> Input<'h> {
    /// Create a new search configuration for the given haystack. The window
    /// spans the entire haystack.
    #[inline]
    pub fn new<H: ?Sized + AsRef<[u8]>>(haystack: &'h H) -> Input<'h> {
        let haystack = haystack.as_ref();
        Input {
            haystack,
            span: Span { start: 0, end: haystack.len() },
            anchored: false,
        }
    }

    /// Set the window for this search.
    ///
    /// This does not validate the span. Searching with a span that does not
    /// fit the haystack returns [`MatchError::InvalidWindow`].
    #[inline]
    pub fn span<S: Into<Span>>(mut self, span: S) -> Input<'h> {
        self.span = span.into();
        self
    }

    /// Set the window for this search from an offset and a length, which is
    /// the form used by the boundary API.
    ///
    /// Overflowing values are saturated, which always results in an
    /// [`MatchError::InvalidWindow`] when searching.
    #[inline]
    pub fn window(self, offset: usize, length: usize) -> Input<'h> {
        self.span(Span { start: offset, end: offset.saturating_add(length) })
    }

    /// When enabled, a match must begin exactly at the start of the window.
    #[inline]
    pub fn anchored(mut self, yes: bool) -> Input<'h> {
        self.anchored = yes;
        self
    }

    /// Return the full haystack.
    #[inline]
    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// Return the start of the window.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Return the end of the window (exclusive).
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Return the window as a span.
    #[inline]
    pub fn get_span(&self) -> Span {
        self.span
    }

    /// Return whether this search is anchored at the start of the window.
    #[inline]
    pub fn get_anchored(&self) -> bool {
        self.anchored
    }

    /// Return an error if the window does not describe a valid range of the
    /// haystack, or if one of its bounds falls inside a code unit of the
    /// given encoding. The end of the haystack is always a valid bound, even
    /// when the haystack ends with a partial code unit.
    pub(crate) fn validate(&self, enc: Encoding) -> Result<(), MatchError> {
        let unit = enc.unit_len();
        let len = self.haystack.len();
        if self.span.start > self.span.end
            || self.span.end > len
            || self.span.start % unit != 0
            || (self.span.end % unit != 0 && self.span.end != len)
        {
            return Err(MatchError::InvalidWindow {
                start: self.span.start,
                end: self.span.end,
                haystack_len: self.haystack.len(),
            });
        }
        Ok(())
    }
}

impl<'h, H: ?Sized + AsRef<[u8]>> From<&'h H> for Input<'h> {
    fn from(haystack: &'h H) -> Input<'h> {
        Input::new(haystack)
    }
}

impl<'h> core::fmt::Debug for Input<'h> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use bstr_lite::Lossy;

        f.debug_struct("Input")
            .field("haystack", &Lossy(self.haystack))
            .field("span", &self.span)
            .field("anchored", &self.anchored)
            .finish()
    }
}

mod bstr_lite {
    /// Formats bytes as a string, escaping anything that isn't printable
    /// ASCII.
    pub(super) struct Lossy<'a>(pub(super) &'a [u8]);

    impl<'a> core::fmt::Debug for Lossy<'a> {
        fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            write!(f, "\"")?;
            for &b in self.0 {
                for e in core::ascii::escape_default(b) {
                    write!(f, "{}", char::from(e))?;
                }
            }
            write!(f, "\"")
        }
    }
}

/// A representation of a span reported by a regex engine.
///
/// A span corresponds to the starting and ending _byte offsets_ of a
/// contiguous region of bytes. The starting offset is inclusive while the
/// ending offset is exclusive. That is, a span is a half-open interval.
///
/// This is basically equivalent to a `std::ops::Range<usize>`, except this
/// type implements `Copy` which makes it more ergonomic to use in the context
/// of this crate. Like a range, this implements `Index` for `[u8]` and `str`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Span {
    /// The start offset of the span, inclusive.
    pub start: usize,
    /// The end offset of the span, exclusive.
    pub end: usize,
}

impl Span {
    /// Returns this span as a range.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        Range::from(*self)
    }

    /// Returns the length of this span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true when this span is empty. That is, when `start >= end`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl core::fmt::Debug for Span {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl core::ops::Index<Span> for [u8] {
    type Output = [u8];

    #[inline]
    fn index(&self, index: Span) -> &[u8] {
        &self[index.range()]
    }
}

impl core::ops::Index<Span> for str {
    type Output = str;

    #[inline]
    fn index(&self, index: Span) -> &str {
        &self[index.range()]
    }
}

impl From<Range<usize>> for Span {
    #[inline]
    fn from(range: Range<usize>) -> Span {
        Span { start: range.start, end: range.end }
    }
}

impl From<Span> for Range<usize> {
    #[inline]
    fn from(span: Span) -> Range<usize> {
        Range { start: span.start, end: span.end }
    }
}

impl PartialEq<Range<usize>> for Span {
    #[inline]
    fn eq(&self, range: &Range<usize>) -> bool {
        self.start == range.start && self.end == range.end
    }
}

impl PartialEq<Span> for Range<usize> {
    #[inline]
    fn eq(&self, span: &Span) -> bool {
        self.start == span.start && self.end == span.end
    }
}

/// The budget that a search ran out of.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Exhausted {
    /// The number of pending choice points exceeded
    /// [`Config::backtrack_limit`](crate::backtrack::Config::backtrack_limit).
    BacktrackDepth,
    /// The number of executed instructions exceeded
    /// [`Config::step_limit`](crate::backtrack::Config::step_limit).
    StepBudget,
    /// The search ran longer than
    /// [`Config::time_limit`](crate::backtrack::Config::time_limit).
    TimeBudget,
}

/// An error that occurred during a search.
///
/// Not finding a match is *not* an error. Searches return `Ok(None)` in that
/// case. A `MatchError` means the search could not determine whether a match
/// exists at all.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MatchError {
    /// The search gave up because it exceeded one of its configured budgets.
    /// This is how pathological backtracking is reported, instead of hanging
    /// or growing memory without bound.
    ResourceExhausted {
        /// Which budget was exceeded.
        reason: Exhausted,
        /// The start offset being tried when the search gave up.
        offset: usize,
    },
    /// The search window does not describe a valid range of the haystack,
    /// or one of its bounds falls inside a code unit of the encoding.
    InvalidWindow {
        /// The start of the window.
        start: usize,
        /// The end of the window (exclusive).
        end: usize,
        /// The length of the haystack.
        haystack_len: usize,
    },
}

impl MatchError {
    /// Return the exhausted budget if this error reports resource
    /// exhaustion.
    pub fn exhausted(&self) -> Option<Exhausted> {
        match *self {
            MatchError::ResourceExhausted { reason, .. } => Some(reason),
            MatchError::InvalidWindow { .. } => None,
        }
    }
}

impl std::error::Error for MatchError {}

impl core::fmt::Display for MatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            MatchError::ResourceExhausted { reason, offset } => {
                let what = match reason {
                    Exhausted::BacktrackDepth => "backtrack depth limit",
                    Exhausted::StepBudget => "step limit",
                    Exhausted::TimeBudget => "time limit",
                };
                write!(
                    f,
                    "gave up searching at offset {} after exceeding the {}",
                    offset, what,
                )
            }
            MatchError::InvalidWindow { start, end, haystack_len } => write!(
                f,
                "invalid search window {}..{} for haystack of length {}",
                start, end, haystack_len,
            ),
        }
    }
}
