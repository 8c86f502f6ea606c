/*!
Compiled programs for the backtracking engine.

A [`Program`] is a flat sequence of [`Inst`]ructions. Control flows from one
instruction to the next unless an instruction says otherwise. Every program
begins with `Save(0)` and ends with `Save(1)` followed by `Match`, so a
successful run always records the bounds of the whole match.

Programs are built by the compiler in [`compiler`] and are immutable once
built.
*/

use core::fmt;

use crate::{
    syntax::class::ClassSet,
    util::{captures::GroupInfo, encoding::Encoding, look::Look},
};

pub(crate) use self::compiler::Compiler;

mod compiler;

/// The index of an instruction in a program.
pub type InstPtr = usize;

/// A single instruction of a compiled program.
#[derive(Clone, Eq, PartialEq)]
pub enum Inst {
    /// A successful end of the program.
    Match,
    /// Consumes exactly the given character.
    Char(char),
    /// Consumes any character in the given class.
    Class(ClassSet),
    /// Consumes any character. Unless `dot_all` is set, `\n` is excluded.
    Any { dot_all: bool },
    /// A choice point. `x` is tried first, and `y` only if everything
    /// following `x` fails.
    Split { x: InstPtr, y: InstPtr },
    /// An unconditional jump.
    Jump(InstPtr),
    /// Records the current position in the given capture slot.
    Save(usize),
    /// A zero-width assertion.
    Look(Look),
    /// Consumes the text most recently captured by the given group. Fails if
    /// the group hasn't participated in the match.
    Backref { group: usize, fold: bool },
    /// Records the current position in a loop register, at the start of an
    /// iteration of a loop whose body may match the empty string.
    NullCheckStart { reg: usize },
    /// Ends an iteration of a loop started with `NullCheckStart`. If the
    /// iteration consumed nothing, control moves to `exit` instead of
    /// looping again.
    NullCheckEnd { reg: usize, exit: InstPtr },
    /// Opens an atomic group.
    AtomicStart,
    /// Closes an atomic group, discarding every choice point made since the
    /// matching `AtomicStart`.
    AtomicEnd,
    /// Opens a lookahead. For a negative lookahead, `next` is where matching
    /// resumes when the lookahead body fails.
    LookStart { negate: bool, next: InstPtr },
    /// Closes a lookahead, returning to the position at which it started.
    LookEnd { negate: bool },
}

impl fmt::Debug for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Inst::Match => write!(f, "MATCH"),
            Inst::Char(ch) => write!(f, "char({:?})", ch),
            Inst::Class(ref cls) => write!(f, "class({:?})", cls),
            Inst::Any { dot_all: true } => write!(f, "any"),
            Inst::Any { dot_all: false } => write!(f, "any-no-nl"),
            Inst::Split { x, y } => write!(f, "split({}, {})", x, y),
            Inst::Jump(pc) => write!(f, "jump({})", pc),
            Inst::Save(slot) => write!(f, "save({})", slot),
            Inst::Look(look) => write!(f, "look({})", look),
            Inst::Backref { group, fold } => {
                write!(f, "backref(group={}, fold={})", group, fold)
            }
            Inst::NullCheckStart { reg } => {
                write!(f, "null-check-start(reg={})", reg)
            }
            Inst::NullCheckEnd { reg, exit } => {
                write!(f, "null-check-end(reg={}) => {}", reg, exit)
            }
            Inst::AtomicStart => write!(f, "atomic-start"),
            Inst::AtomicEnd => write!(f, "atomic-end"),
            Inst::LookStart { negate: false, .. } => write!(f, "look-ahead"),
            Inst::LookStart { negate: true, next } => {
                write!(f, "neg-look-ahead => {}", next)
            }
            Inst::LookEnd { negate } => {
                write!(f, "look-end(negate={})", negate)
            }
        }
    }
}

/// The configuration of the compiler.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    size_limit: Option<Option<usize>>,
}

impl Config {
    /// Return a new default program configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set a limit on the number of instructions in a compiled program.
    ///
    /// Counted repetitions are compiled by copying their sub-expression, so
    /// a short pattern like `(a{100}){100}` can compile to a large program.
    /// When the limit is exceeded, compilation fails with a
    /// [`CompileError`](crate::CompileError) of kind
    /// [`Other`](crate::CompileErrorKind::Other).
    ///
    /// `None` disables the limit. The default is `Some(1_000_000)`.
    pub fn size_limit(mut self, limit: Option<usize>) -> Config {
        self.size_limit = Some(limit);
        self
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit.unwrap_or(Some(1_000_000))
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config { size_limit: o.size_limit.or(self.size_limit) }
    }
}

/// A compiled program.
#[derive(Clone)]
pub struct Program {
    pub(crate) insts: Vec<Inst>,
    pub(crate) group_info: GroupInfo,
    pub(crate) encoding: Encoding,
    /// The number of loop registers used by `NullCheck*` instructions.
    pub(crate) reg_len: usize,
    /// True when the result of running the program from a given instruction
    /// and position never depends on how that state was reached. Only then
    /// can the engine remember failed states.
    pub(crate) memoizable: bool,
    /// True when every match must begin at the start of the search window.
    pub(crate) anchored: bool,
    /// A literal that every match begins with, encoded in `encoding`.
    pub(crate) prefix: Vec<u8>,
}

impl Program {
    /// Returns the instructions of this program.
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// Returns the number of instructions in this program.
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    /// Returns true if this program has no instructions. A program built by
    /// the compiler is never empty.
    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Returns the capture groups of this program.
    pub fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }

    /// Returns the encoding this program matches.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns true if failed states can be memoized while running this
    /// program.
    pub fn is_memoizable(&self) -> bool {
        self.memoizable
    }

    /// Returns true if every match of this program must begin at the start
    /// of the search window.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Returns the literal bytes every match begins with. This is empty when
    /// no such literal is known.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program(")?;
        for (pc, inst) in self.insts.iter().enumerate() {
            writeln!(f, "{:06?}: {:?}", pc, inst)?;
        }
        writeln!(f, ")")?;
        writeln!(f, "groups: {:?}", self.group_info.group_len())?;
        writeln!(f, "registers: {:?}", self.reg_len)?;
        writeln!(f, "memoizable: {:?}", self.memoizable)?;
        writeln!(f, "anchored: {:?}", self.anchored)?;
        if !self.prefix.is_empty() {
            writeln!(f, "prefix: {:?}", escape_bytes(&self.prefix))?;
        }
        Ok(())
    }
}

/// Formats bytes as a string literal, escaping anything that isn't
/// printable ASCII.
fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &b in bytes {
        out.extend(core::ascii::escape_default(b).map(char::from));
    }
    out
}
