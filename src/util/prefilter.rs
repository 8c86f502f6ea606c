/*!
Literal prefix scanning.

When every match of a pattern must begin with the same literal, the search
loop doesn't need to run the backtracker at every start offset. Instead, a
[`Prefilter`] finds the next occurrence of that literal and only the offsets
it reports are tried.

A prefilter is only built for encodings where a literal's bytes can't occur
anywhere but at the start of an encoded character, which rules out UTF-16.
*/

use memchr::memmem;

use crate::util::search::Span;

/// A literal scanner for the required prefix of a pattern.
#[derive(Clone, Debug)]
pub(crate) enum Prefilter {
    Memchr(u8),
    Memmem(memmem::Finder<'static>),
}

impl Prefilter {
    /// Create a prefilter for the given needle. This returns `None` when the
    /// needle is empty, since it would then report a candidate at every
    /// position.
    pub(crate) fn new(needle: &[u8]) -> Option<Prefilter> {
        match needle.len() {
            0 => {
                debug!("prefilter building failed: no required prefix");
                None
            }
            1 => {
                debug!("prefilter built: memchr");
                Some(Prefilter::Memchr(needle[0]))
            }
            _ => {
                debug!("prefilter built: memmem");
                Some(Prefilter::Memmem(
                    memmem::Finder::new(needle).into_owned(),
                ))
            }
        }
    }

    /// Returns the start of the first occurrence of the needle that lies
    /// entirely within `span`.
    #[inline]
    pub(crate) fn find(&self, haystack: &[u8], span: Span) -> Option<usize> {
        let slice = &haystack[span];
        let i = match *self {
            Prefilter::Memchr(b) => memchr::memchr(b, slice)?,
            Prefilter::Memmem(ref finder) => finder.find(slice)?,
        };
        Some(span.start + i)
    }
}
