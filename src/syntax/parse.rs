use core::cell::Cell;

use crate::{
    error::CompileError,
    syntax::{
        ast::{
            Ast, Backref, BackrefTarget, Greed, Group, GroupKind, Repetition,
        },
        class::{ClassRange, ClassSet},
        unicode::{self, PropertyError},
        Config, Flags,
    },
    util::look::Look,
};

// Each message is used in exactly one place, so that a message identifies
// the branch of the parser that reported it.
const ERR_INVALID_ENCODING: &str = "pattern is not valid in its encoding";
const ERR_TOO_MUCH_NESTING: &str = "pattern has too much nesting";
const ERR_TOO_MANY_CAPTURES: &str = "too many capture groups";
const ERR_UNCLOSED_GROUP: &str = "found open group without closing ')'";
const ERR_UNOPENED_GROUP: &str = "found closing ')' without matching '('";
const ERR_LOOKBEHIND_UNSUPPORTED: &str = "look-behind is not supported";
const ERR_EMPTY_FLAGS: &str = "empty flag directive '(?)' is not allowed";
const ERR_FLAG_UNRECOGNIZED: &str = "unrecognized inline flag or group type";
const ERR_FLAG_REPEATED_NEGATION: &str =
    "inline flag negation cannot be repeated";
const ERR_FLAG_DANGLING_NEGATION: &str =
    "inline flags cannot end with negation directive";
const ERR_INVALID_GROUP_NAME: &str = "invalid group name";
const ERR_UNCLOSED_GROUP_NAME: &str =
    "expected end of group name, but got end of pattern";
const ERR_EMPTY_GROUP_NAME: &str = "empty group names are not allowed";
const ERR_REPETITION_MISSING: &str =
    "repetition operator must be applied to a sub-expression";
const ERR_REPETITION_TOO_BIG: &str =
    "repetition bound exceeds the maximum of 100000";
const ERR_REPETITION_INVALID_RANGE: &str =
    "found counted repetition with a min bigger than its max";
const ERR_ESCAPE_UNEXPECTED_EOF: &str =
    "saw start of escape sequence, but saw end of pattern before it finished";
const ERR_ESCAPE_UNRECOGNIZED: &str = "unrecognized escape sequence";
const ERR_HEX_EMPTY: &str = "expected hexadecimal digits after '\\x'";
const ERR_HEX_BRACE_UNCLOSED: &str =
    "expected hexadecimal number in braces, but got no closing brace";
const ERR_HEX_FIXED_INVALID: &str =
    "expected exactly four hexadecimal digits after '\\u'";
const ERR_HEX_INVALID: &str = "escape does not denote a valid codepoint";
const ERR_BACKREF_SYNTAX: &str =
    "expected '<' or '\\'' to start a named backreference";
const ERR_BACKREF_RELATIVE: &str = "relative backreferences are not supported";
const ERR_PROPERTY_SYNTAX: &str =
    "expected '{' to start a Unicode property name";
const ERR_PROPERTY_UNCLOSED: &str = "found unclosed Unicode property name";
const ERR_PROPERTY_UNKNOWN: &str = "unknown Unicode property name";
const ERR_PROPERTY_UNSUPPORTED: &str =
    "Unicode properties require the 'unicode' feature";
const ERR_CLASS_UNCLOSED: &str = "found unclosed character class";
const ERR_CLASS_EMPTY: &str = "empty character class is not allowed";
const ERR_CLASS_RANGE_ITEM: &str =
    "character class ranges must start and end with a single character";
const ERR_CLASS_INVALID_RANGE: &str =
    "invalid range in character class, start is bigger than end";
const ERR_CLASS_INVALID_ESCAPE: &str =
    "invalid escape sequence in character class";
const ERR_POSIX_CLASS_UNRECOGNIZED: &str =
    "unrecognized POSIX character class";

/// The largest bound permitted in a counted repetition.
const MAX_REPETITION: u32 = 100_000;
/// The largest number of capture groups in a single pattern.
const MAX_CAPTURES: usize = 32_767;

/// A regular expression parser.
///
/// The pattern is decoded from its encoding up front, so the parser itself
/// works on characters. Every error is reported at the byte offset of the
/// character where it was detected.
#[derive(Clone, Debug)]
pub(super) struct Parser {
    /// The configuration of the parser as given by the caller.
    config: Config,
    /// The decoded pattern.
    chars: Vec<char>,
    /// The byte offset of each character in `chars`, followed by the length
    /// of the pattern in bytes.
    offsets: Vec<usize>,
    /// The call depth of the parser.
    depth: Cell<u32>,
    /// The index of the current character in `chars`.
    pos: Cell<usize>,
    /// The index of the most recently opened capture group.
    capture_index: Cell<usize>,
    /// The flags that are currently set.
    flags: Cell<Flags>,
}

/// A single item inside a character class.
enum ClassItem {
    Char(char),
    Set(ClassSet),
}

/// The constructor and a variety of helper routines.
impl Parser {
    /// Build a parser for the given encoded pattern.
    pub(super) fn new(
        config: Config,
        pattern: &[u8],
    ) -> Result<Parser, CompileError> {
        let enc = config.get_encoding();
        let (mut chars, mut offsets) = (vec![], vec![]);
        let mut at = 0;
        while let Some(result) = enc.decode(&pattern[at..]) {
            match result {
                Ok((ch, len)) => {
                    chars.push(ch);
                    offsets.push(at);
                    at += len;
                }
                Err(_) => {
                    return Err(CompileError::other(at, ERR_INVALID_ENCODING))
                }
            }
        }
        offsets.push(pattern.len());
        Ok(Parser {
            config,
            chars,
            offsets,
            depth: Cell::new(0),
            pos: Cell::new(0),
            capture_index: Cell::new(0),
            flags: Cell::new(config.get_flags()),
        })
    }

    /// Return the index of the current character.
    fn pos(&self) -> usize {
        self.pos.get()
    }

    /// Return the byte offset of the current character. At the end of the
    /// pattern, this is the length of the pattern.
    fn offset(&self) -> usize {
        self.offsets[self.pos()]
    }

    /// Increments the call depth of the parser.
    ///
    /// The top level of the pattern is depth 0, and every group or bracket
    /// adds one. Entering a level deeper than the configured nest limit
    /// returns an error.
    ///
    /// This returns the old depth.
    fn increment_depth(&self) -> Result<u32, CompileError> {
        let old = self.depth.get();
        if old > self.config.get_nest_limit() {
            return Err(CompileError::other(
                self.offset(),
                ERR_TOO_MUCH_NESTING,
            ));
        }
        self.depth.set(old + 1);
        Ok(old)
    }

    /// Decrements the call depth of the parser.
    fn decrement_depth(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    /// Return the character at the current position of the parser.
    ///
    /// This panics if the parser is positioned at the end of the pattern.
    fn char(&self) -> char {
        self.chars[self.pos()]
    }

    /// Return the character at the current position, or `None` at the end
    /// of the pattern.
    fn char_opt(&self) -> Option<char> {
        self.chars.get(self.pos()).copied()
    }

    /// Peek at the character after the current one.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos() + 1).copied()
    }

    /// Returns true if the next call to `bump` would return false.
    fn is_done(&self) -> bool {
        self.pos() >= self.chars.len()
    }

    /// Returns the flags that are currently set.
    fn flags(&self) -> Flags {
        self.flags.get()
    }

    /// Bump the parser to the next character.
    ///
    /// If the end of the input has been reached, then `false` is returned.
    fn bump(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.pos.set(self.pos() + 1);
        !self.is_done()
    }

    /// If the pattern starting at the current position of the parser has
    /// the given prefix, then bump the parser past the prefix and return
    /// true. Otherwise, don't bump the parser and return false.
    fn bump_if(&self, prefix: &str) -> bool {
        let rest = &self.chars[self.pos()..];
        let len = prefix.chars().count();
        if rest.len() < len || !prefix.chars().zip(rest).all(|(a, &b)| a == b)
        {
            return false;
        }
        self.pos.set(self.pos() + len);
        true
    }

    /// If extended mode is enabled, advance the parser through all
    /// whitespace and comments to the next meaningful character.
    fn bump_space(&self) {
        if !self.flags().contains(Flags::EXTENDED) {
            return;
        }
        while !self.is_done() {
            if self.char().is_whitespace() {
                self.bump();
            } else if self.char() == '#' {
                self.bump();
                while !self.is_done() {
                    let c = self.char();
                    self.bump();
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Return the next capturing index. Since capture indices are assigned
    /// in the textual order of opening parentheses, use of this routine
    /// depends on the parser being depth first and left-to-right.
    fn next_capture_index(&self) -> Result<usize, CompileError> {
        let next = self.capture_index.get() + 1;
        if next > MAX_CAPTURES {
            return Err(CompileError::other(
                self.offset(),
                ERR_TOO_MANY_CAPTURES,
            ));
        }
        self.capture_index.set(next);
        Ok(next)
    }

    fn literal(&self, ch: char) -> Ast {
        Ast::Literal { ch, fold: self.flags().contains(Flags::IGNORE_CASE) }
    }
}

/// The actual parser. Each kind of syntax gets its own routine.
impl Parser {
    pub(super) fn parse(&self) -> Result<Ast, CompileError> {
        let ast = self.parse_inner()?;
        // Stacked repetition operators don't recurse in the parser, so the
        // tree can still be nested too deeply for the compiler.
        check_nesting(&ast, self.config.get_nest_limit())
            .map_err(|_| CompileError::other(0, ERR_TOO_MUCH_NESTING))?;
        Ok(ast)
    }

    fn parse_inner(&self) -> Result<Ast, CompileError> {
        let depth = self.increment_depth()?;
        let mut alternates = vec![];
        let mut concat = vec![];
        loop {
            self.bump_space();
            if self.is_done() {
                break;
            }
            match self.char() {
                '(' => {
                    // Save the old flags and reset them only when we close
                    // the group. A flag directive like '(?i)' returns None
                    // and stays active until the end of the enclosing group.
                    let oldflags = self.flags();
                    if let Some(sub) = self.parse_group()? {
                        concat.push(sub);
                        self.flags.set(oldflags);
                    }
                    if self.char_opt() != Some(')') {
                        return Err(CompileError::unbalanced(
                            self.offset(),
                            ERR_UNCLOSED_GROUP,
                        ));
                    }
                    self.bump();
                }
                ')' => {
                    if depth == 0 {
                        return Err(CompileError::unbalanced(
                            self.offset(),
                            ERR_UNOPENED_GROUP,
                        ));
                    }
                    break;
                }
                '|' => {
                    alternates.push(Ast::concat(core::mem::take(&mut concat)));
                    self.bump();
                }
                '[' => concat.push(Ast::Class(self.parse_class()?)),
                '?' | '*' | '+' => {
                    concat = self.parse_uncounted_repetition(concat)?;
                }
                '{' => {
                    concat = self.parse_counted_repetition(concat)?;
                }
                _ => concat.push(self.parse_primitive()?),
            }
        }
        self.decrement_depth();
        alternates.push(Ast::concat(concat));
        Ok(Ast::alternation(alternates))
    }

    /// Parses a "primitive" pattern. A primitive is any expression that does
    /// not contain any sub-expressions.
    fn parse_primitive(&self) -> Result<Ast, CompileError> {
        let start = self.offset();
        let ch = self.char();
        self.bump();
        match ch {
            '\\' => self.parse_escape(start),
            '.' => Ok(Ast::Dot {
                dot_all: self.flags().contains(Flags::DOT_ALL),
            }),
            '^' => Ok(Ast::Look(Look::StartLine)),
            '$' => Ok(Ast::Look(Look::EndLine)),
            ch => Ok(self.literal(ch)),
        }
    }

    /// Parse an escape sequence. The parser must be positioned just after
    /// the backslash, whose offset is `start`.
    fn parse_escape(&self, start: usize) -> Result<Ast, CompileError> {
        let ch = match self.char_opt() {
            None => {
                return Err(CompileError::other(
                    start,
                    ERR_ESCAPE_UNEXPECTED_EOF,
                ))
            }
            Some(ch) => ch,
        };
        match ch {
            '1'..='9' => {
                let number = self.parse_decimal().unwrap_or(u32::MAX);
                return Ok(self.backref(
                    BackrefTarget::Number(number as usize),
                    start,
                ));
            }
            'k' => {
                self.bump();
                return self.parse_named_backref(start);
            }
            'x' => {
                self.bump();
                return self.parse_hex(start);
            }
            'u' => {
                self.bump();
                return self.parse_hex_fixed(start, 4);
            }
            'p' | 'P' => {
                self.bump();
                return self.parse_property(start, ch == 'P');
            }
            '0' => {
                self.bump();
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.char_opt().and_then(|c| c.to_digit(8)) {
                        None => break,
                        Some(d) => {
                            value = value * 8 + d;
                            self.bump();
                        }
                    }
                }
                return match char::from_u32(value) {
                    Some(ch) => Ok(self.literal(ch)),
                    None => Err(CompileError::other(start, ERR_HEX_INVALID)),
                };
            }
            _ => {}
        }
        self.bump();
        match ch {
            'A' => Ok(Ast::Look(Look::StartText)),
            'z' => Ok(Ast::Look(Look::EndText)),
            'Z' => Ok(Ast::Look(Look::EndTextOptionalNewline)),
            'b' => Ok(Ast::Look(Look::WordBoundary)),
            'B' => Ok(Ast::Look(Look::NotWordBoundary)),
            'G' => Ok(Ast::Look(Look::SearchStart)),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' => {
                Ok(Ast::Class(perl_class(ch)))
            }
            't' => Ok(self.literal('\t')),
            'n' => Ok(self.literal('\n')),
            'r' => Ok(self.literal('\r')),
            'f' => Ok(self.literal('\x0C')),
            'v' => Ok(self.literal('\x0B')),
            'a' => Ok(self.literal('\x07')),
            'e' => Ok(self.literal('\x1B')),
            ch if ch.is_ascii_alphanumeric() => {
                Err(CompileError::other(start, ERR_ESCAPE_UNRECOGNIZED))
            }
            ch => Ok(self.literal(ch)),
        }
    }

    fn backref(&self, target: BackrefTarget, position: usize) -> Ast {
        Ast::Backref(Backref {
            target,
            fold: self.flags().contains(Flags::IGNORE_CASE),
            position,
        })
    }

    /// Parse the remainder of `\k<name>`, `\k'name'` or `\k<N>`. The parser
    /// must be positioned just after the `k`.
    fn parse_named_backref(&self, start: usize) -> Result<Ast, CompileError> {
        let close = match self.char_opt() {
            Some('<') => '>',
            Some('\'') => '\'',
            _ => return Err(CompileError::other(start, ERR_BACKREF_SYNTAX)),
        };
        self.bump();
        if matches!(self.char_opt(), Some('-') | Some('+')) {
            return Err(CompileError::other(start, ERR_BACKREF_RELATIVE));
        }
        if self.char_opt().map_or(false, |c| c.is_ascii_digit()) {
            let number = self.parse_decimal().unwrap_or(u32::MAX);
            if self.char_opt() != Some(close) {
                return Err(CompileError::other(
                    self.offset(),
                    ERR_INVALID_GROUP_NAME,
                ));
            }
            self.bump();
            return Ok(
                self.backref(BackrefTarget::Number(number as usize), start)
            );
        }
        let name = self.parse_capture_name(close)?;
        Ok(self.backref(BackrefTarget::Name(name), start))
    }

    /// Parse a hex escape after `\x`: either `{H..}` or one or two digits.
    fn parse_hex(&self, start: usize) -> Result<Ast, CompileError> {
        let value = if self.char_opt() == Some('{') {
            self.bump();
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(d) = self.char_opt().and_then(|c| c.to_digit(16)) {
                value = value.saturating_mul(16).saturating_add(d);
                digits += 1;
                self.bump();
            }
            if self.char_opt() != Some('}') {
                return Err(CompileError::other(start, ERR_HEX_BRACE_UNCLOSED));
            }
            self.bump();
            if digits == 0 || digits > 8 {
                return Err(CompileError::other(start, ERR_HEX_INVALID));
            }
            value
        } else {
            let mut value = 0u32;
            let mut digits = 0;
            while digits < 2 {
                match self.char_opt().and_then(|c| c.to_digit(16)) {
                    None => break,
                    Some(d) => {
                        value = value * 16 + d;
                        digits += 1;
                        self.bump();
                    }
                }
            }
            if digits == 0 {
                return Err(CompileError::other(start, ERR_HEX_EMPTY));
            }
            value
        };
        match char::from_u32(value) {
            Some(ch) => Ok(self.literal(ch)),
            None => Err(CompileError::other(start, ERR_HEX_INVALID)),
        }
    }

    /// Parse exactly `len` hex digits.
    fn parse_hex_fixed(
        &self,
        start: usize,
        len: usize,
    ) -> Result<Ast, CompileError> {
        let mut value = 0u32;
        for _ in 0..len {
            match self.char_opt().and_then(|c| c.to_digit(16)) {
                None => {
                    return Err(CompileError::other(
                        start,
                        ERR_HEX_FIXED_INVALID,
                    ))
                }
                Some(d) => {
                    value = value * 16 + d;
                    self.bump();
                }
            }
        }
        match char::from_u32(value) {
            Some(ch) => Ok(self.literal(ch)),
            None => Err(CompileError::other(start, ERR_HEX_INVALID)),
        }
    }

    /// Parse a Unicode property after `\p` or `\P`.
    fn parse_property(
        &self,
        start: usize,
        mut negate: bool,
    ) -> Result<Ast, CompileError> {
        if self.char_opt() != Some('{') {
            return Err(CompileError::other(start, ERR_PROPERTY_SYNTAX));
        }
        self.bump();
        if self.char_opt() == Some('^') {
            negate = !negate;
            self.bump();
        }
        let name_start = self.pos();
        while self.char_opt().map_or(false, |c| c != '}') {
            self.bump();
        }
        if self.is_done() {
            return Err(CompileError::other(start, ERR_PROPERTY_UNCLOSED));
        }
        let name: String = self.chars[name_start..self.pos()].iter().collect();
        self.bump();
        let mut set = match unicode::property(&name) {
            Ok(set) => set,
            Err(PropertyError::NotFound) => {
                return Err(CompileError::other(start, ERR_PROPERTY_UNKNOWN))
            }
            Err(PropertyError::Unsupported) => {
                return Err(CompileError::other(
                    start,
                    ERR_PROPERTY_UNSUPPORTED,
                ))
            }
        };
        if self.flags().contains(Flags::IGNORE_CASE) {
            set.case_fold_simple();
        }
        if negate {
            set.negate();
        }
        Ok(Ast::Class(set))
    }

    /// Parse a decimal number starting at the current position. This
    /// returns `None` if the number doesn't fit in a `u32` (all digits are
    /// consumed regardless) or if there are no digits.
    fn parse_decimal(&self) -> Option<u32> {
        let mut value: Option<u32> = Some(0);
        let mut digits = 0;
        while let Some(d) = self.char_opt().and_then(|c| c.to_digit(10)) {
            value = value
                .and_then(|v| v.checked_mul(10))
                .and_then(|v| v.checked_add(d));
            digits += 1;
            self.bump();
        }
        if digits == 0 {
            return None;
        }
        value
    }

    /// Parses an uncounted repetition operator (`?`, `*` or `+`) together
    /// with an optional `?` (lazy) or `+` (possessive) suffix.
    ///
    /// The concatenation returned includes the repetition operator applied
    /// to the last expression in the given concatenation.
    fn parse_uncounted_repetition(
        &self,
        mut concat: Vec<Ast>,
    ) -> Result<Vec<Ast>, CompileError> {
        let start = self.offset();
        let sub = match concat.pop() {
            Some(ast) => ast,
            None => {
                return Err(CompileError::quantifier(
                    start,
                    ERR_REPETITION_MISSING,
                ))
            }
        };
        let (min, max) = match self.char() {
            '?' => (0, Some(1)),
            '*' => (0, None),
            '+' => (1, None),
            unk => unreachable!("unrecognized repetition operator '{}'", unk),
        };
        self.bump();
        let greed = self.parse_greed();
        concat.push(Ast::Repetition(Repetition {
            min,
            max,
            greed,
            sub: Box::new(sub),
        }));
        Ok(concat)
    }

    /// Parses a counted repetition operation, `{n}`, `{n,}`, `{,m}` or
    /// `{n,m}`. A `{` that doesn't begin a well formed bound is a literal.
    fn parse_counted_repetition(
        &self,
        mut concat: Vec<Ast>,
    ) -> Result<Vec<Ast>, CompileError> {
        let start = self.offset();
        let start_pos = self.pos();
        let (min, max) = match self.parse_bounds()? {
            Some(bounds) => bounds,
            None => {
                self.pos.set(start_pos);
                self.bump();
                concat.push(self.literal('{'));
                return Ok(concat);
            }
        };
        let sub = match concat.pop() {
            Some(ast) => ast,
            None => {
                return Err(CompileError::quantifier(
                    start,
                    ERR_REPETITION_MISSING,
                ))
            }
        };
        if max.map_or(false, |max| min > max) {
            return Err(CompileError::quantifier(
                start,
                ERR_REPETITION_INVALID_RANGE,
            ));
        }
        let greed = self.parse_greed();
        concat.push(Ast::Repetition(Repetition {
            min,
            max,
            greed,
            sub: Box::new(sub),
        }));
        Ok(concat)
    }

    /// Parse the bounds of a counted repetition, starting at `{`. On success,
    /// the parser is positioned after the closing `}`. If the text isn't a
    /// bound, this returns `None` and the parser position is unspecified.
    fn parse_bounds(
        &self,
    ) -> Result<Option<(u32, Option<u32>)>, CompileError> {
        let start = self.offset();
        self.bump();
        let check = |n: Option<u32>| match n {
            Some(n) if n > MAX_REPETITION => {
                Err(CompileError::quantifier(start, ERR_REPETITION_TOO_BIG))
            }
            n => Ok(n),
        };
        let digits_at = |p: &Parser| {
            p.char_opt().map_or(false, |c| c.is_ascii_digit())
        };
        let min = if digits_at(self) {
            check(Some(self.parse_decimal().unwrap_or(u32::MAX)))?
        } else {
            None
        };
        let bounds = match self.char_opt() {
            Some('}') => match min {
                None => return Ok(None),
                Some(n) => (n, Some(n)),
            },
            Some(',') => {
                self.bump();
                let max = if digits_at(self) {
                    check(Some(self.parse_decimal().unwrap_or(u32::MAX)))?
                } else {
                    None
                };
                if self.char_opt() != Some('}') {
                    return Ok(None);
                }
                match (min, max) {
                    (None, None) => return Ok(None),
                    (min, max) => (min.unwrap_or(0), max),
                }
            }
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(bounds))
    }

    /// Parse an optional `?` or `+` suffix after a repetition operator.
    fn parse_greed(&self) -> Greed {
        match self.char_opt() {
            Some('?') => {
                self.bump();
                Greed::Lazy
            }
            Some('+') => {
                self.bump();
                Greed::Possessive
            }
            _ => Greed::Greedy,
        }
    }

    /// Parses the part of a pattern that starts with a `(`. This is usually
    /// a group sub-expression, but might just be a directive that enables
    /// (or disables) certain flags, or a comment.
    ///
    /// On success, the parser is positioned at the closing `)` (if any).
    fn parse_group(&self) -> Result<Option<Ast>, CompileError> {
        let open = self.offset();
        self.bump();
        let group = |kind, sub| Ast::Group(Group { kind, sub: Box::new(sub) });
        if self.char_opt() != Some('?') {
            let index = self.next_capture_index()?;
            let kind =
                GroupKind::Capture { index, name: None, position: open };
            return Ok(Some(group(kind, self.parse_inner()?)));
        }
        if self.bump_if("?<=") || self.bump_if("?<!") {
            return Err(CompileError::other(open, ERR_LOOKBEHIND_UNSUPPORTED));
        }
        let close = if self.bump_if("?P<") || self.bump_if("?<") {
            Some('>')
        } else if self.bump_if("?'") {
            Some('\'')
        } else {
            None
        };
        if let Some(close) = close {
            let index = self.next_capture_index()?;
            let name = Some(self.parse_capture_name(close)?);
            let kind = GroupKind::Capture { index, name, position: open };
            return Ok(Some(group(kind, self.parse_inner()?)));
        }
        if self.bump_if("?:") {
            return Ok(Some(group(GroupKind::NonCapture, self.parse_inner()?)));
        }
        if self.bump_if("?>") {
            return Ok(Some(group(GroupKind::Atomic, self.parse_inner()?)));
        }
        if self.bump_if("?=") {
            let kind = GroupKind::LookAhead { negate: false };
            return Ok(Some(group(kind, self.parse_inner()?)));
        }
        if self.bump_if("?!") {
            let kind = GroupKind::LookAhead { negate: true };
            return Ok(Some(group(kind, self.parse_inner()?)));
        }
        if self.bump_if("?#") {
            while self.char_opt().map_or(false, |c| c != ')') {
                self.bump();
            }
            return Ok(None);
        }
        // Otherwise, we have a flag directive or a scoped flag group.
        self.bump();
        let flags_start = self.pos();
        let flags = self.parse_flags()?;
        if self.is_done() {
            return Ok(None);
        }
        self.flags.set(flags);
        if self.char() == ')' {
            if self.pos() == flags_start {
                return Err(CompileError::other(open, ERR_EMPTY_FLAGS));
            }
            return Ok(None);
        }
        // parse_flags guarantees we're at ':'.
        self.bump();
        Ok(Some(group(GroupKind::NonCapture, self.parse_inner()?)))
    }

    /// Parses a group name terminated by `close`. Assumes that the parser is
    /// positioned at the first character of the name. This advances the
    /// parser past the terminator.
    fn parse_capture_name(&self, close: char) -> Result<String, CompileError> {
        let start = self.pos();
        let start_offset = self.offset();
        loop {
            match self.char_opt() {
                None => {
                    return Err(CompileError::other(
                        self.offset(),
                        ERR_UNCLOSED_GROUP_NAME,
                    ))
                }
                Some(c) if c == close => break,
                Some(c) if is_capture_char(c, self.pos() == start) => {
                    self.bump();
                }
                Some(_) => {
                    return Err(CompileError::other(
                        self.offset(),
                        ERR_INVALID_GROUP_NAME,
                    ))
                }
            }
        }
        if self.pos() == start {
            return Err(CompileError::other(
                start_offset,
                ERR_EMPTY_GROUP_NAME,
            ));
        }
        let name = self.chars[start..self.pos()].iter().collect();
        self.bump();
        Ok(name)
    }

    /// Parse a sequence of flags starting at the current character.
    ///
    /// This advances the parser to the character immediately following the
    /// flags, which is guaranteed to be either `:` or `)`, or to the end of
    /// the pattern (which the caller reports as an unclosed group).
    fn parse_flags(&self) -> Result<Flags, CompileError> {
        let mut flags = self.flags();
        let mut negate = false;
        // Keeps track of whether the previous flag item was a '-'. We use this
        // to detect whether there is a dangling '-', which is invalid.
        let mut last_was_negation = false;
        while let Some(c) = self.char_opt() {
            if c == ':' || c == ')' {
                break;
            }
            if c == '-' {
                if negate {
                    return Err(CompileError::other(
                        self.offset(),
                        ERR_FLAG_REPEATED_NEGATION,
                    ));
                }
                negate = true;
                last_was_negation = true;
            } else {
                let flag = match c {
                    'i' => Flags::IGNORE_CASE,
                    'm' => Flags::DOT_ALL,
                    'x' => Flags::EXTENDED,
                    _ => {
                        return Err(CompileError::other(
                            self.offset(),
                            ERR_FLAG_UNRECOGNIZED,
                        ))
                    }
                };
                flags.set(flag, !negate);
                last_was_negation = false;
            }
            self.bump();
        }
        if last_was_negation {
            return Err(CompileError::other(
                self.offset(),
                ERR_FLAG_DANGLING_NEGATION,
            ));
        }
        Ok(flags)
    }

    /// Parse a bracketed character class, including nested classes,
    /// intersections and POSIX classes.
    ///
    /// This assumes the parser is positioned at the opening `[`. If parsing
    /// is successful, then the parser is advanced to the position immediately
    /// following the closing `]`.
    fn parse_class(&self) -> Result<ClassSet, CompileError> {
        let open = self.offset();
        self.increment_depth()?;
        self.bump();
        let negate = if self.char_opt() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut operands: Vec<ClassSet> = vec![];
        let mut union = ClassSet::default();
        let mut has_items = false;
        // A ']' right after the opening bracket is a literal, as long as the
        // class is closed later on.
        if self.char_opt() == Some(']') {
            if !self.chars[self.pos() + 1..].contains(&']') {
                return Err(CompileError::class(open, ERR_CLASS_EMPTY));
            }
            union.push(ClassRange::new(']', ']'));
            has_items = true;
            self.bump();
        }
        loop {
            let c = match self.char_opt() {
                None => {
                    return Err(CompileError::class(open, ERR_CLASS_UNCLOSED))
                }
                Some(c) => c,
            };
            match c {
                ']' => {
                    self.bump();
                    break;
                }
                '[' => {
                    let set = match self.maybe_parse_posix_class()? {
                        Some(set) => set,
                        None => self.parse_class()?,
                    };
                    union.union(&set);
                    has_items = true;
                }
                '&' if self.peek() == Some('&') => {
                    self.bump();
                    self.bump();
                    if has_items {
                        operands.push(core::mem::take(&mut union));
                    }
                    has_items = false;
                }
                _ => {
                    self.parse_class_range(&mut union)?;
                    has_items = true;
                }
            }
        }
        if has_items {
            operands.push(union);
        }
        let mut operands = operands.into_iter();
        let mut set = match operands.next() {
            None => return Err(CompileError::class(open, ERR_CLASS_EMPTY)),
            Some(set) => set,
        };
        for operand in operands {
            set.intersect(&operand);
        }
        if self.flags().contains(Flags::IGNORE_CASE) {
            set.case_fold_simple();
        }
        if negate {
            set.negate();
        }
        self.decrement_depth();
        Ok(set)
    }

    /// Parse a single class item or a range of two items, adding it to the
    /// given set.
    fn parse_class_range(
        &self,
        set: &mut ClassSet,
    ) -> Result<(), CompileError> {
        let start = self.offset();
        let first = self.parse_class_item()?;
        let is_range = self.char_opt() == Some('-')
            && self.peek().map_or(false, |c| c != ']');
        if !is_range {
            match first {
                ClassItem::Char(ch) => set.push(ClassRange::new(ch, ch)),
                ClassItem::Set(ref other) => set.union(other),
            }
            return Ok(());
        }
        self.bump();
        if self.char_opt() == Some('[') {
            return Err(CompileError::class(
                self.offset(),
                ERR_CLASS_RANGE_ITEM,
            ));
        }
        let end_offset = self.offset();
        let last = self.parse_class_item()?;
        let (lo, hi) = match (first, last) {
            (ClassItem::Char(lo), ClassItem::Char(hi)) => (lo, hi),
            (ClassItem::Set(_), _) => {
                return Err(CompileError::class(start, ERR_CLASS_RANGE_ITEM))
            }
            (_, ClassItem::Set(_)) => {
                return Err(CompileError::class(
                    end_offset,
                    ERR_CLASS_RANGE_ITEM,
                ))
            }
        };
        if lo > hi {
            return Err(CompileError::class(start, ERR_CLASS_INVALID_RANGE));
        }
        set.push(ClassRange::new(lo, hi));
        Ok(())
    }

    /// Parse a single character or escape inside a class.
    fn parse_class_item(&self) -> Result<ClassItem, CompileError> {
        let start = self.offset();
        let ch = self.char();
        self.bump();
        if ch != '\\' {
            return Ok(ClassItem::Char(ch));
        }
        // Inside a class, '\b' is a backspace.
        if self.char_opt() == Some('b') {
            self.bump();
            return Ok(ClassItem::Char('\x08'));
        }
        match self.parse_escape(start)? {
            Ast::Literal { ch, .. } => Ok(ClassItem::Char(ch)),
            Ast::Class(set) => Ok(ClassItem::Set(set)),
            _ => Err(CompileError::class(start, ERR_CLASS_INVALID_ESCAPE)),
        }
    }

    /// Attempt to parse a POSIX class like `[:alpha:]` or `[:^alpha:]`. If
    /// the text at the current position doesn't have that shape, the parser
    /// isn't moved and `None` is returned.
    fn maybe_parse_posix_class(
        &self,
    ) -> Result<Option<ClassSet>, CompileError> {
        let start = self.pos();
        let start_offset = self.offset();
        if !self.bump_if("[:") {
            return Ok(None);
        }
        let negate = self.bump_if("^");
        let name_start = self.pos();
        while self.char_opt().map_or(false, |c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        let name_end = self.pos();
        if name_start == name_end || !self.bump_if(":]") {
            self.pos.set(start);
            return Ok(None);
        }
        let name: String = self.chars[name_start..name_end].iter().collect();
        let mut set = match posix_class(&name) {
            Some(set) => set,
            None => {
                return Err(CompileError::class(
                    start_offset,
                    ERR_POSIX_CLASS_UNRECOGNIZED,
                ))
            }
        };
        if negate {
            set.negate();
        }
        Ok(Some(set))
    }
}

/// Returns the class for a perl class escape like `\d` or `\W`.
fn perl_class(ch: char) -> ClassSet {
    let mut set = match ch.to_ascii_lowercase() {
        'd' => unicode::perl_digit().clone(),
        's' => unicode::perl_space().clone(),
        'h' => unicode::hex_digit(),
        _ => unicode::perl_word().clone(),
    };
    if ch.is_ascii_uppercase() {
        set.negate();
    }
    set
}

/// Returns the class for the named POSIX class. With Unicode data available,
/// the classes are Unicode aware. If no such class exists, then `None` is
/// returned.
fn posix_class(name: &str) -> Option<ClassSet> {
    let slice: &'static [(u8, u8)] = match name {
        "alnum" => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
        "alpha" => &[(b'A', b'Z'), (b'a', b'z')],
        "ascii" => &[(b'\x00', b'\x7F')],
        "blank" => &[(b'\t', b'\t'), (b' ', b' ')],
        "cntrl" => &[(b'\x00', b'\x1F'), (b'\x7F', b'\x7F')],
        "digit" => &[(b'0', b'9')],
        "graph" => &[(b'!', b'~')],
        "lower" => &[(b'a', b'z')],
        "print" => &[(b' ', b'~')],
        "punct" => &[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')],
        "space" => &[(b'\t', b'\r'), (b' ', b' ')],
        "upper" => &[(b'A', b'Z')],
        "word" => &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')],
        "xdigit" => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
        _ => return None,
    };
    if name != "ascii" {
        if let Ok(set) = unicode::property(name) {
            return Some(set);
        }
    }
    Some(ClassSet::from_pairs(
        slice.iter().map(|&(s, e)| (char::from(s), char::from(e))),
    ))
}

/// Returns true if the given character is valid in a capture group name.
///
/// If `first` is true, then `c` is treated as the first character in the
/// group name (which must not be a digit).
fn is_capture_char(c: char, first: bool) -> bool {
    if first {
        c == '_' || c.is_alphabetic()
    } else {
        c == '_' || c.is_alphanumeric()
    }
}

/// Returns an error if more than `limit` groups, classes and repetitions
/// enclose one another anywhere in the given tree.
fn check_nesting(ast: &Ast, limit: u32) -> Result<(), ()> {
    fn recurse(ast: &Ast, limit: u32, depth: u32) -> Result<(), ()> {
        let depth = match *ast {
            Ast::Group(_) | Ast::Repetition(_) | Ast::Class(_) => depth + 1,
            _ => depth,
        };
        if depth > limit {
            return Err(());
        }
        for child in ast.children() {
            recurse(child, limit, depth)?;
        }
        Ok(())
    }
    recurse(ast, limit, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{error::CompileErrorKind, util::encoding::Encoding};

    fn p(pattern: &str) -> Ast {
        Parser::new(Config::default(), pattern.as_bytes())
            .unwrap()
            .parse()
            .unwrap()
    }

    fn pflags(pattern: &str, flags: Flags) -> Ast {
        Parser::new(Config::new().flags(flags), pattern.as_bytes())
            .unwrap()
            .parse()
            .unwrap()
    }

    fn perr(pattern: &str) -> CompileError {
        Parser::new(Config::default(), pattern.as_bytes())
            .and_then(|p| p.parse())
            .unwrap_err()
    }

    fn lit(ch: char) -> Ast {
        Ast::Literal { ch, fold: false }
    }

    fn cat(asts: Vec<Ast>) -> Ast {
        Ast::Concat(asts)
    }

    fn cap(index: usize, position: usize, sub: Ast) -> Ast {
        Ast::Group(Group {
            kind: GroupKind::Capture { index, name: None, position },
            sub: Box::new(sub),
        })
    }

    fn rep(min: u32, max: Option<u32>, greed: Greed, sub: Ast) -> Ast {
        Ast::Repetition(Repetition { min, max, greed, sub: Box::new(sub) })
    }

    fn class(pairs: &[(char, char)]) -> Ast {
        Ast::Class(ClassSet::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn ok_literal() {
        assert_eq!(p("a"), lit('a'));
        assert_eq!(p("ab"), cat(vec![lit('a'), lit('b')]));
        assert_eq!(p(r"\.\*"), cat(vec![lit('.'), lit('*')]));
        assert_eq!(p(r"\x41é\x{263a}"), cat(vec![
            lit('A'),
            lit('é'),
            lit('☺'),
        ]));
        assert_eq!(p(r"\t\n\e\012"), cat(vec![
            lit('\t'),
            lit('\n'),
            lit('\x1B'),
            lit('\n'),
        ]));
        assert_eq!(p("a}"), cat(vec![lit('a'), lit('}')]));
    }

    #[test]
    fn ok_repetition() {
        assert_eq!(p("a*"), rep(0, None, Greed::Greedy, lit('a')));
        assert_eq!(p("a+?"), rep(1, None, Greed::Lazy, lit('a')));
        assert_eq!(p("a?+"), rep(0, Some(1), Greed::Possessive, lit('a')));
        assert_eq!(p("a{3}"), rep(3, Some(3), Greed::Greedy, lit('a')));
        assert_eq!(p("a{2,}"), rep(2, None, Greed::Greedy, lit('a')));
        assert_eq!(p("a{,4}?"), rep(0, Some(4), Greed::Lazy, lit('a')));
        assert_eq!(p("a{2,5}"), rep(2, Some(5), Greed::Greedy, lit('a')));
        assert_eq!(
            p("ab*"),
            cat(vec![lit('a'), rep(0, None, Greed::Greedy, lit('b'))])
        );
    }

    #[test]
    fn ok_brace_literals() {
        assert_eq!(p("a{"), cat(vec![lit('a'), lit('{')]));
        assert_eq!(p("a{}"), cat(vec![lit('a'), lit('{'), lit('}')]));
        assert_eq!(
            p("a{,}"),
            cat(vec![lit('a'), lit('{'), lit(','), lit('}')])
        );
        assert_eq!(p("{x"), cat(vec![lit('{'), lit('x')]));
        assert_eq!(
            p("a{1,b}"),
            cat(vec![
                lit('a'),
                lit('{'),
                lit('1'),
                lit(','),
                lit('b'),
                lit('}'),
            ])
        );
    }

    #[test]
    fn ok_groups() {
        assert_eq!(p("(a)"), cap(1, 0, lit('a')));
        assert_eq!(
            p("(a)(b)"),
            cat(vec![cap(1, 0, lit('a')), cap(2, 3, lit('b'))])
        );
        assert_eq!(p("((a))"), cap(1, 0, cap(2, 1, lit('a'))));
        assert_eq!(
            p("(?<foo>a)"),
            Ast::Group(Group {
                kind: GroupKind::Capture {
                    index: 1,
                    name: Some("foo".to_string()),
                    position: 0,
                },
                sub: Box::new(lit('a')),
            })
        );
        assert_eq!(
            p("(?:a)(?'x'b)"),
            cat(vec![
                Ast::Group(Group {
                    kind: GroupKind::NonCapture,
                    sub: Box::new(lit('a')),
                }),
                Ast::Group(Group {
                    kind: GroupKind::Capture {
                        index: 1,
                        name: Some("x".to_string()),
                        position: 5,
                    },
                    sub: Box::new(lit('b')),
                }),
            ])
        );
        assert_eq!(
            p("(?!a)"),
            Ast::Group(Group {
                kind: GroupKind::LookAhead { negate: true },
                sub: Box::new(lit('a')),
            })
        );
        assert_eq!(p("a(?#comment)b"), cat(vec![lit('a'), lit('b')]));
    }

    #[test]
    fn ok_alternation() {
        assert_eq!(p("a|b"), Ast::Alternation(vec![lit('a'), lit('b')]));
        assert_eq!(p("a|"), Ast::Alternation(vec![lit('a'), Ast::Empty]));
        assert_eq!(
            p("(a|b)c"),
            cat(vec![
                cap(1, 0, Ast::Alternation(vec![lit('a'), lit('b')])),
                lit('c'),
            ])
        );
    }

    #[test]
    fn ok_flags() {
        let fold = Ast::Literal { ch: 'a', fold: true };
        assert_eq!(p("(?i)a"), fold.clone());
        assert_eq!(pflags("a", Flags::IGNORE_CASE), fold.clone());
        assert_eq!(p("(?i:a)b"), cat(vec![
            Ast::Group(Group {
                kind: GroupKind::NonCapture,
                sub: Box::new(fold.clone()),
            }),
            lit('b'),
        ]));
        // Flags set inside a group end with the group.
        assert_eq!(
            p("((?i)a)a"),
            cat(vec![cap(1, 0, fold), lit('a')])
        );
        assert_eq!(p("(?m)."), Ast::Dot { dot_all: true });
        assert_eq!(p("."), Ast::Dot { dot_all: false });
        assert_eq!(p("(?x) a b # c"), cat(vec![lit('a'), lit('b')]));
        assert_eq!(p("(?x)[ ]"), class(&[(' ', ' ')]));
        assert_eq!(pflags("(?-i)a", Flags::IGNORE_CASE), lit('a'));
    }

    #[test]
    fn ok_escapes() {
        assert_eq!(p(r"\A"), Ast::Look(Look::StartText));
        assert_eq!(p(r"\G"), Ast::Look(Look::SearchStart));
        assert_eq!(p("^$"), cat(vec![
            Ast::Look(Look::StartLine),
            Ast::Look(Look::EndLine),
        ]));
        assert_eq!(p(r"\h"), class(&[('0', '9'), ('A', 'F'), ('a', 'f')]));
        assert_eq!(
            p(r"\1"),
            Ast::Backref(Backref {
                target: BackrefTarget::Number(1),
                fold: false,
                position: 0,
            })
        );
        assert_eq!(
            p(r"\k<foo>"),
            Ast::Backref(Backref {
                target: BackrefTarget::Name("foo".to_string()),
                fold: false,
                position: 0,
            })
        );
        assert_eq!(
            p(r"\k'2'"),
            Ast::Backref(Backref {
                target: BackrefTarget::Number(2),
                fold: false,
                position: 0,
            })
        );
    }

    #[test]
    fn ok_class() {
        assert_eq!(p("[a]"), class(&[('a', 'a')]));
        assert_eq!(p("[a-c]"), class(&[('a', 'c')]));
        assert_eq!(p("[-a]"), class(&[('-', '-'), ('a', 'a')]));
        assert_eq!(p("[a-]"), class(&[('-', '-'), ('a', 'a')]));
        assert_eq!(p("[]a]"), class(&[(']', ']'), ('a', 'a')]));
        assert_eq!(p(r"[\]\\]"), class(&[('\\', '\\'), (']', ']')]));
        assert_eq!(p(r"[\b]"), class(&[('\x08', '\x08')]));
        assert_eq!(p("[a-z&&[^aeiou]]"), class(&[
            ('b', 'd'),
            ('f', 'h'),
            ('j', 'n'),
            ('p', 't'),
            ('v', 'z'),
        ]));
        assert_eq!(p("[[:xdigit:]&&[^[:digit:]]]"), class(&[
            ('A', 'F'),
            ('a', 'f'),
        ]));
        assert_eq!(p("[x[a-c]]"), class(&[('a', 'c'), ('x', 'x')]));
        assert_eq!(pflags("[a-b]", Flags::IGNORE_CASE), class(&[
            ('A', 'B'),
            ('a', 'b'),
        ]));

        let mut negated = ClassSet::from_pairs([('a', 'a')]);
        negated.negate();
        assert_eq!(p("[^a]"), Ast::Class(negated));
    }

    #[test]
    fn ok_utf16_pattern() {
        let enc = Encoding::Utf16Le;
        let pattern = enc.encode_str("(a").unwrap();
        let err = Parser::new(Config::new().encoding(enc), &pattern)
            .and_then(|p| p.parse())
            .unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn err_unbalanced() {
        let err = perr("(a");
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(err.position(), 2);

        let err = perr("a)");
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(err.position(), 1);

        let err = perr("(?:a|(b)");
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(err.position(), 8);

        assert_eq!(perr("(?i").kind(), CompileErrorKind::UnbalancedGroup);
        assert_eq!(perr("(?#abc").kind(), CompileErrorKind::UnbalancedGroup);
    }

    #[test]
    fn err_quantifier() {
        let err = perr("a{3,2}");
        assert_eq!(err.kind(), CompileErrorKind::InvalidQuantifier);
        assert_eq!(err.position(), 1);

        let err = perr("*a");
        assert_eq!(err.kind(), CompileErrorKind::InvalidQuantifier);
        assert_eq!(err.position(), 0);

        assert_eq!(perr("a|+").kind(), CompileErrorKind::InvalidQuantifier);
        assert_eq!(perr("{2}").kind(), CompileErrorKind::InvalidQuantifier);
        assert_eq!(
            perr("a{100001}").kind(),
            CompileErrorKind::InvalidQuantifier
        );
        assert_eq!(
            perr("a{1,999999999999}").kind(),
            CompileErrorKind::InvalidQuantifier
        );
    }

    #[test]
    fn err_class() {
        let err = perr("[]");
        assert_eq!(err.kind(), CompileErrorKind::InvalidClass);
        assert_eq!(err.position(), 0);

        let err = perr("ab[z-a]");
        assert_eq!(err.kind(), CompileErrorKind::InvalidClass);
        assert_eq!(err.position(), 3);

        assert_eq!(perr("[abc").kind(), CompileErrorKind::InvalidClass);
        assert_eq!(perr("[^]").kind(), CompileErrorKind::InvalidClass);
        assert_eq!(perr(r"[\d-z]").kind(), CompileErrorKind::InvalidClass);
        assert_eq!(perr("[[:foo:]]").kind(), CompileErrorKind::InvalidClass);
        assert_eq!(perr(r"[\A]").kind(), CompileErrorKind::InvalidClass);
    }

    #[test]
    fn err_other() {
        assert_eq!(perr("(?<=a)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?<!a)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?q)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?i-)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?<>a)").kind(), CompileErrorKind::Other);
        assert_eq!(perr("(?<1a>a)").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\y").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\x").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\x{110000}").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\u12").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\k<-1>").kind(), CompileErrorKind::Other);
        assert_eq!(perr(r"\p{Greek").kind(), CompileErrorKind::Other);

        let err = Parser::new(Config::default(), b"a\xFF").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::Other);
        assert_eq!(err.position(), 1);
    }

    #[test]
    fn err_nesting() {
        let config = Config::new().nest_limit(5);
        let parse = |pattern: &str| {
            Parser::new(config, pattern.as_bytes()).and_then(|p| p.parse())
        };
        assert!(parse("((((a))))").is_ok());
        assert_eq!(
            parse("((((((((a))))))))").unwrap_err().kind(),
            CompileErrorKind::Other
        );
        assert_eq!(
            parse("a{1}{1}{1}{1}{1}{1}{1}{1}").unwrap_err().kind(),
            CompileErrorKind::Other
        );
    }

    #[test]
    fn nest_limit_boundary() {
        let parse = |limit: u32, pattern: &str| {
            let config = Config::new().nest_limit(limit);
            Parser::new(config, pattern.as_bytes()).and_then(|p| p.parse())
        };
        assert!(parse(5, "(((((a)))))").is_ok());
        assert!(parse(5, "(((((a)))))b").is_ok());
        assert!(parse(5, "((((a))))*").is_ok());
        assert!(parse(5, "(((([a]))))").is_ok());
        assert!(parse(5, "a{1}{1}{1}{1}{1}").is_ok());
        assert!(parse(5, "((((((a))))))").is_err());
        assert!(parse(5, "(((((a)))))*").is_err());
        assert!(parse(5, "((((([a])))))").is_err());
        assert!(parse(5, "a{1}{1}{1}{1}{1}{1}").is_err());

        assert!(parse(0, "ab|c").is_ok());
        assert!(parse(0, "(a)").is_err());
        assert!(parse(0, "[a]").is_err());
        assert!(parse(0, "a*").is_err());
        assert!(parse(2, "(?:a)*").is_ok());
        assert!(parse(2, "((a))*").is_err());
        assert!(parse(5, "(((([a]))))*").is_err());
    }
}
