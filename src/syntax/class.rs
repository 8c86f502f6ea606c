/*!
Sets of Unicode scalar values used by character classes.

The set algebra (union, intersection, negation and simple case folding) is
provided by `regex-syntax`'s [`ClassUnicode`]. This module adds what the
backtracker needs on top of it: a membership test and a way to spot classes
that are really a single literal.
*/

use regex_syntax::hir::{ClassUnicode, ClassUnicodeRange};

/// A single inclusive range of characters.
pub type ClassRange = ClassUnicodeRange;

/// A set of characters represented as a sequence of inclusive ranges.
///
/// The ranges are always sorted, non-overlapping and non-adjacent, so
/// membership is a binary search and equal sets compare equal.
#[derive(Clone, Eq, PartialEq)]
pub struct ClassSet(ClassUnicode);

impl ClassSet {
    /// Create a class from ranges given as pairs. The pairs may overlap and
    /// come in any order.
    pub fn from_pairs<I: IntoIterator<Item = (char, char)>>(
        pairs: I,
    ) -> ClassSet {
        ClassSet(ClassUnicode::new(
            pairs.into_iter().map(|(start, end)| ClassRange::new(start, end)),
        ))
    }

    /// Create a class containing exactly one character.
    pub fn from_char(ch: char) -> ClassSet {
        ClassSet::from_pairs([(ch, ch)])
    }

    /// Create a class that contains every character.
    pub fn full() -> ClassSet {
        ClassSet::from_pairs([('\x00', char::MAX)])
    }

    /// Returns the ranges of this class in ascending order.
    pub fn ranges(&self) -> &[ClassRange] {
        self.0.ranges()
    }

    /// Returns true if this class matches nothing.
    pub fn is_empty(&self) -> bool {
        self.ranges().is_empty()
    }

    /// If this class contains exactly one character, return it.
    pub fn single_char(&self) -> Option<char> {
        match *self.ranges() {
            [r] if r.start() == r.end() => Some(r.start()),
            _ => None,
        }
    }

    /// Returns true if and only if the given character is in this class.
    #[inline]
    pub fn contains(&self, ch: char) -> bool {
        self.ranges()
            .binary_search_by(|r| {
                if r.end() < ch {
                    core::cmp::Ordering::Less
                } else if r.start() > ch {
                    core::cmp::Ordering::Greater
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Add all characters in `other` to this class.
    pub fn union(&mut self, other: &ClassSet) {
        self.0.union(&other.0);
    }

    /// Add a single range to this class.
    pub fn push(&mut self, range: ClassRange) {
        self.0.push(range);
    }

    /// Remove every character from this class that is not in `other`.
    pub fn intersect(&mut self, other: &ClassSet) {
        self.0.intersect(&other.0);
    }

    /// Negate this set.
    pub fn negate(&mut self) {
        self.0.negate();
    }

    /// Expand this class such that it contains all case folded characters,
    /// according to Unicode's "simple" mapping. Without the `unicode`
    /// feature, only ASCII letters are folded.
    pub fn case_fold_simple(&mut self) {
        if self.0.try_case_fold_simple().is_ok() {
            return;
        }
        for range in super::unicode::ascii_case_fold(self.ranges()) {
            self.0.push(range);
        }
    }
}

impl Default for ClassSet {
    fn default() -> ClassSet {
        ClassSet(ClassUnicode::empty())
    }
}

impl From<ClassUnicode> for ClassSet {
    fn from(cls: ClassUnicode) -> ClassSet {
        ClassSet(cls)
    }
}

impl core::fmt::Debug for ClassSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "[")?;
        for r in self.ranges().iter() {
            if r.start() == r.end() {
                write!(f, "{:?}", r.start())?;
            } else {
                write!(f, "{:?}-{:?}", r.start(), r.end())?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let set = ClassSet::from_pairs([('x', 'z'), ('a', 'c'), ('d', 'f')]);
        assert!(set.contains('a'));
        assert!(set.contains('e'));
        assert!(set.contains('z'));
        assert!(!set.contains('g'));
        assert!(!set.contains('\u{10FFFF}'));
        assert!(ClassSet::full().contains('\u{10FFFF}'));
        assert!(!ClassSet::default().contains('a'));
        assert_eq!(format!("{:?}", set), "['a'-'f''x'-'z']");
    }

    #[test]
    fn single_char() {
        assert_eq!(ClassSet::from_char('q').single_char(), Some('q'));
        assert_eq!(ClassSet::from_pairs([('a', 'b')]).single_char(), None);
        assert_eq!(ClassSet::default().single_char(), None);

        let mut folded = ClassSet::from_char('q');
        folded.case_fold_simple();
        assert!(folded.contains('Q'));
        assert_eq!(folded.single_char(), None);
    }

    #[test]
    fn case_fold() {
        let mut set = ClassSet::from_pairs([('a', 'c'), ('0', '9')]);
        set.case_fold_simple();
        assert!(set.contains('B'));
        assert!(set.contains('5'));
        assert!(!set.contains('D'));
    }
}
