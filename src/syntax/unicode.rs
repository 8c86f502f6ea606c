/*!
Unicode data used by the parser and by word boundary assertions.

With the `unicode` feature enabled, the tables for `\w`, `\d`, `\s`, `\p{..}`
and simple case folding are extracted from `regex-syntax`. Each table is
built at most once per process. Without the feature, the perl classes and
case folding are ASCII only and `\p{..}` is rejected.
*/

use std::sync::OnceLock;

use super::class::{ClassRange, ClassSet};

/// An error returned when a Unicode property name can't be resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PropertyError {
    /// No property with that name exists.
    NotFound,
    /// Unicode data isn't available in this build.
    Unsupported,
}

/// Returns the class for `\w`.
pub(crate) fn perl_word() -> &'static ClassSet {
    static WORD: OnceLock<ClassSet> = OnceLock::new();
    WORD.get_or_init(|| {
        imp::perl_class(r"\w").unwrap_or_else(|| {
            ClassSet::from_pairs([
                ('0', '9'),
                ('A', 'Z'),
                ('_', '_'),
                ('a', 'z'),
            ])
        })
    })
}

/// Returns the class for `\d`.
pub(crate) fn perl_digit() -> &'static ClassSet {
    static DIGIT: OnceLock<ClassSet> = OnceLock::new();
    DIGIT.get_or_init(|| {
        imp::perl_class(r"\d")
            .unwrap_or_else(|| ClassSet::from_pairs([('0', '9')]))
    })
}

/// Returns the class for `\s`.
pub(crate) fn perl_space() -> &'static ClassSet {
    static SPACE: OnceLock<ClassSet> = OnceLock::new();
    SPACE.get_or_init(|| {
        imp::perl_class(r"\s").unwrap_or_else(|| {
            ClassSet::from_pairs([('\t', '\r'), (' ', ' ')])
        })
    })
}

/// Returns the class for `\h`, which is always the ASCII hex digits.
pub(crate) fn hex_digit() -> ClassSet {
    ClassSet::from_pairs([('0', '9'), ('A', 'F'), ('a', 'f')])
}

/// Returns true if the given character is matched by `\w`.
#[inline]
pub(crate) fn is_word_char(ch: char) -> bool {
    if ch.is_ascii() {
        return ch == '_' || ch.is_ascii_alphanumeric();
    }
    perl_word().contains(ch)
}

/// Returns true when `a` and `b` are equal under simple case folding.
pub(crate) fn simple_fold_eq(a: char, b: char) -> bool {
    if a == b {
        return true;
    }
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(&b);
    }
    let mut set = ClassSet::from_char(a);
    set.case_fold_simple();
    set.contains(b)
}

/// Resolves a Unicode property name as written inside `\p{..}`.
///
/// Names are matched loosely: case, spaces, underscores and hyphens are
/// ignored. A handful of POSIX style names (`Alnum`, `Word`, `Any`, ...)
/// are recognized in addition to the general categories, scripts and binary
/// properties known to `regex-syntax`.
pub(crate) fn property(name: &str) -> Result<ClassSet, PropertyError> {
    let valid = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-' | '=' | '.')
    };
    if name.is_empty() || !name.chars().all(valid) {
        return Err(PropertyError::NotFound);
    }
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match normalized.as_str() {
        "any" => return Ok(ClassSet::full()),
        "word" => return imp::require(perl_word().clone()),
        "xdigit" => return imp::require(hex_digit()),
        _ => {}
    }
    let alias = match normalized.as_str() {
        "alnum" => r"[\p{Alphabetic}\p{Nd}]",
        "alpha" => r"\p{Alphabetic}",
        "blank" => r"[\p{Zs}\t]",
        "cntrl" => r"\p{Cc}",
        "digit" => r"\p{Nd}",
        "graph" => r"[^\p{White_Space}\p{Cc}\p{Cn}]",
        "lower" => r"\p{Lowercase}",
        "print" => r"[[^\p{White_Space}\p{Cc}\p{Cn}]\p{Zs}]",
        "punct" => r"\p{P}",
        "space" => r"\p{White_Space}",
        "upper" => r"\p{Uppercase}",
        _ => "",
    };
    let pattern = if alias.is_empty() {
        format!(r"\p{{{}}}", name)
    } else {
        alias.to_string()
    };
    imp::parse_class(&pattern)
}

/// Returns the ASCII case variants of every character in the given ranges.
/// This is used when the Unicode case folding tables aren't available.
pub(crate) fn ascii_case_fold(ranges: &[ClassRange]) -> Vec<ClassRange> {
    let mut out = vec![];
    for r in ranges.iter() {
        for (lo, hi, to_lo) in [('a', 'z', 'A'), ('A', 'Z', 'a')] {
            let start = core::cmp::max(r.start(), lo);
            let end = core::cmp::min(r.end(), hi);
            if start > end {
                continue;
            }
            let shift = |c: char| {
                let offset = u32::from(c) - u32::from(lo);
                char::from_u32(u32::from(to_lo) + offset).unwrap_or(c)
            };
            out.push(ClassRange::new(shift(start), shift(end)));
        }
    }
    out
}

#[cfg(feature = "unicode")]
mod imp {
    use regex_syntax::hir::{Class, HirKind};

    use super::{ClassSet, PropertyError};

    pub(super) fn perl_class(pattern: &str) -> Option<ClassSet> {
        parse_class(pattern).ok()
    }

    pub(super) fn require(set: ClassSet) -> Result<ClassSet, PropertyError> {
        Ok(set)
    }

    pub(super) fn parse_class(
        pattern: &str,
    ) -> Result<ClassSet, PropertyError> {
        let hir = regex_syntax::Parser::new()
            .parse(pattern)
            .map_err(|_| PropertyError::NotFound)?;
        match *hir.kind() {
            HirKind::Class(Class::Unicode(ref cls)) => Ok(cls.clone().into()),
            HirKind::Class(Class::Bytes(ref cls))
                if cls.ranges().is_empty() =>
            {
                Ok(ClassSet::default())
            }
            HirKind::Literal(ref lit) => {
                let s = core::str::from_utf8(&lit.0)
                    .map_err(|_| PropertyError::NotFound)?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(ClassSet::from_char(ch)),
                    _ => Err(PropertyError::NotFound),
                }
            }
            _ => Err(PropertyError::NotFound),
        }
    }
}

#[cfg(not(feature = "unicode"))]
mod imp {
    use super::{ClassSet, PropertyError};

    pub(super) fn perl_class(_pattern: &str) -> Option<ClassSet> {
        None
    }

    pub(super) fn require(_set: ClassSet) -> Result<ClassSet, PropertyError> {
        Err(PropertyError::Unsupported)
    }

    pub(super) fn parse_class(
        _pattern: &str,
    ) -> Result<ClassSet, PropertyError> {
        Err(PropertyError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_chars() {
        assert!(is_word_char('a'));
        assert!(is_word_char('_'));
        assert!(is_word_char('7'));
        assert!(!is_word_char('-'));
        assert!(!is_word_char(' '));
    }

    #[test]
    fn ascii_folding() {
        assert!(simple_fold_eq('a', 'A'));
        assert!(simple_fold_eq('Z', 'z'));
        assert!(!simple_fold_eq('a', 'b'));
        let folded = ascii_case_fold(&[ClassRange::new('x', '}')]);
        assert_eq!(folded, vec![ClassRange::new('X', 'Z')]);
    }

    #[cfg(feature = "unicode")]
    #[test]
    fn unicode_tables() {
        assert!(is_word_char('β'));
        assert!(perl_digit().contains('٣'));
        assert!(perl_space().contains('\u{3000}'));
        assert!(simple_fold_eq('β', 'Β'));
        assert!(simple_fold_eq('k', '\u{212A}'));

        let greek = property("Greek").unwrap();
        assert!(greek.contains('λ'));
        assert!(!greek.contains('a'));
        assert!(property("Lu").unwrap().contains('Q'));
        assert!(property("alpha").unwrap().contains('é'));
        assert_eq!(property("NotAProperty"), Err(PropertyError::NotFound));
        assert_eq!(property("a}b"), Err(PropertyError::NotFound));
    }

    #[cfg(not(feature = "unicode"))]
    #[test]
    fn no_unicode_tables() {
        assert!(!is_word_char('β'));
        assert_eq!(property("Greek"), Err(PropertyError::Unsupported));
    }
}
