use std::error;
use std::fmt;

/// An error that occurred while compiling a pattern.
///
/// A compile error always aborts the whole compilation. No partially built
/// pattern is ever returned.
///
/// Every error carries a [`CompileErrorKind`], the byte offset into the
/// pattern at which the problem was detected and a short human readable
/// message. Offsets are measured in the code units of the pattern's
/// [`Encoding`](crate::Encoding), so for UTF-16 patterns they are always even.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompileError {
    kind: CompileErrorKind,
    position: usize,
    message: &'static str,
}

/// The kind of a [`CompileError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompileErrorKind {
    /// A group was opened without being closed, or a `)` was found without
    /// a matching `(`.
    UnbalancedGroup,
    /// A repetition operator was malformed. For example, `{3,2}` (where the
    /// minimum exceeds the maximum), a bound that is too big or an operator
    /// with nothing to repeat.
    InvalidQuantifier,
    /// A character class was malformed. For example, an unclosed `[`, an
    /// empty class or a reversed range like `[z-a]`.
    InvalidClass,
    /// A backreference named a group that does not exist in the pattern.
    DanglingBackreference,
    /// Anything else: bad escapes, invalid group names, unsupported syntax,
    /// patterns that are not valid in their encoding, exceeded limits.
    Other,
}

impl CompileError {
    pub(crate) fn new(
        kind: CompileErrorKind,
        position: usize,
        message: &'static str,
    ) -> CompileError {
        CompileError { kind, position, message }
    }

    pub(crate) fn unbalanced(position: usize, message: &'static str) -> Self {
        CompileError::new(CompileErrorKind::UnbalancedGroup, position, message)
    }

    pub(crate) fn quantifier(position: usize, message: &'static str) -> Self {
        CompileError::new(
            CompileErrorKind::InvalidQuantifier,
            position,
            message,
        )
    }

    pub(crate) fn class(position: usize, message: &'static str) -> Self {
        CompileError::new(CompileErrorKind::InvalidClass, position, message)
    }

    pub(crate) fn backref(position: usize, message: &'static str) -> Self {
        CompileError::new(
            CompileErrorKind::DanglingBackreference,
            position,
            message,
        )
    }

    pub(crate) fn other(position: usize, message: &'static str) -> Self {
        CompileError::new(CompileErrorKind::Other, position, message)
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    /// Return the byte offset into the pattern at which this error was
    /// detected. For errors detected at the end of the pattern (like an
    /// unclosed group), this is the length of the pattern.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Return a short description of what went wrong.
    pub fn message(&self) -> &str {
        self.message
    }
}

impl error::Error for CompileError {}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "regex compile error at offset {}: {}",
            self.position, self.message
        )
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            CompileErrorKind::UnbalancedGroup => "unbalanced group",
            CompileErrorKind::InvalidQuantifier => "invalid quantifier",
            CompileErrorKind::InvalidClass => "invalid character class",
            CompileErrorKind::DanglingBackreference => {
                "dangling backreference"
            }
            CompileErrorKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offset() {
        let err = CompileError::unbalanced(2, "unclosed group");
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(err.position(), 2);
        assert_eq!(
            err.to_string(),
            "regex compile error at offset 2: unclosed group"
        );
    }
}
