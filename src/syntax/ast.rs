/*!
The abstract syntax tree produced by the parser.

Flags are resolved while parsing, so every node already carries the
behavior it needs (case folded literals and classes, the meaning of `.`).
Capture groups carry the index assigned to them by the parser, which is the
textual order of their opening parenthesis.
*/

use crate::{syntax::class::ClassSet, util::look::Look};

/// A single node of a parsed pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Ast {
    /// Matches the empty string.
    Empty,
    /// A single character. When `fold` is set, it matches any character that
    /// is equal to `ch` under simple case folding.
    Literal { ch: char, fold: bool },
    /// `.`. Unless `dot_all` is set, it doesn't match `\n`.
    Dot { dot_all: bool },
    /// A character class. Case folding has already been applied.
    Class(ClassSet),
    /// A zero-width assertion.
    Look(Look),
    /// A quantified sub-expression.
    Repetition(Repetition),
    /// A parenthesized sub-expression.
    Group(Group),
    /// A sequence of sub-expressions. Always has at least two elements.
    Concat(Vec<Ast>),
    /// A choice between sub-expressions, in priority order. Always has at
    /// least two elements.
    Alternation(Vec<Ast>),
    /// A backreference to the text matched by a capture group.
    Backref(Backref),
}

/// A repetition operator applied to a sub-expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Repetition {
    pub(crate) min: u32,
    /// `None` means unbounded.
    pub(crate) max: Option<u32>,
    pub(crate) greed: Greed,
    pub(crate) sub: Box<Ast>,
}

/// The matching preference of a repetition operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Greed {
    /// Prefer more iterations, backtracking to fewer.
    Greedy,
    /// Prefer fewer iterations, backtracking to more.
    Lazy,
    /// Take as many iterations as possible and never give any back.
    Possessive,
}

/// A parenthesized group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Group {
    pub(crate) kind: GroupKind,
    pub(crate) sub: Box<Ast>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum GroupKind {
    /// `( )`, `(?<name> )` and friends. `position` is the offset of the
    /// opening parenthesis.
    Capture { index: usize, name: Option<String>, position: usize },
    /// `(?: )` and scoped flag groups.
    NonCapture,
    /// `(?> )`.
    Atomic,
    /// `(?= )` or, when `negate` is set, `(?! )`.
    LookAhead { negate: bool },
}

/// A backreference as written in the pattern. Targets are resolved against
/// the capture table after parsing, since a reference may name a group that
/// appears later in the pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Backref {
    pub(crate) target: BackrefTarget,
    pub(crate) fold: bool,
    /// The offset of the backslash that starts the reference.
    pub(crate) position: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum BackrefTarget {
    Number(usize),
    Name(String),
}

impl Ast {
    /// Build a concatenation, collapsing trivial cases.
    pub(crate) fn concat(mut asts: Vec<Ast>) -> Ast {
        match asts.len() {
            0 => Ast::Empty,
            1 => asts.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(asts),
        }
    }

    /// Build an alternation, collapsing trivial cases.
    pub(crate) fn alternation(mut asts: Vec<Ast>) -> Ast {
        match asts.len() {
            0 => Ast::Empty,
            1 => asts.pop().unwrap_or(Ast::Empty),
            _ => Ast::Alternation(asts),
        }
    }

    /// Returns true if this expression might match without consuming any
    /// input. This is conservative: it may return true for expressions that
    /// can never actually match the empty string (like `\b` followed by
    /// `\B`), but never returns false for one that can.
    pub(crate) fn can_be_empty(&self) -> bool {
        match *self {
            Ast::Empty | Ast::Look(_) | Ast::Backref(_) => true,
            Ast::Literal { .. } | Ast::Dot { .. } | Ast::Class(_) => false,
            Ast::Repetition(ref rep) => rep.min == 0 || rep.sub.can_be_empty(),
            Ast::Group(ref group) => match group.kind {
                GroupKind::LookAhead { .. } => true,
                _ => group.sub.can_be_empty(),
            },
            Ast::Concat(ref asts) => asts.iter().all(|a| a.can_be_empty()),
            Ast::Alternation(ref asts) => {
                asts.iter().any(|a| a.can_be_empty())
            }
        }
    }

    /// Returns the sub-expressions of this node.
    pub(crate) fn children(&self) -> &[Ast] {
        match *self {
            Ast::Repetition(ref rep) => core::slice::from_ref(&*rep.sub),
            Ast::Group(ref group) => core::slice::from_ref(&*group.sub),
            Ast::Concat(ref asts) | Ast::Alternation(ref asts) => asts,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ch: char) -> Ast {
        Ast::Literal { ch, fold: false }
    }

    #[test]
    fn collapse() {
        assert_eq!(Ast::concat(vec![]), Ast::Empty);
        assert_eq!(Ast::concat(vec![lit('a')]), lit('a'));
        assert_eq!(Ast::alternation(vec![lit('a')]), lit('a'));
    }

    #[test]
    fn nullable() {
        let star = Ast::Repetition(Repetition {
            min: 0,
            max: None,
            greed: Greed::Greedy,
            sub: Box::new(lit('a')),
        });
        assert!(star.can_be_empty());
        assert!(!Ast::Concat(vec![star.clone(), lit('b')]).can_be_empty());
        assert!(Ast::Alternation(vec![lit('b'), star]).can_be_empty());
        assert!(Ast::Look(Look::WordBoundary).can_be_empty());
    }
}
