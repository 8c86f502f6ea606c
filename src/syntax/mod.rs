/*!
Pattern syntax: flags, parser configuration and the parser itself.

The accepted syntax follows the Ruby flavor of Oniguruma. See the crate
documentation for a summary of what is supported.
*/

use crate::{error::CompileError, util::encoding::Encoding};

pub(crate) use self::ast::Ast;

pub(crate) mod ast;
pub mod class;
mod parse;
pub(crate) mod unicode;

bitflags::bitflags! {
    /// Options that can be given when compiling a pattern.
    ///
    /// Each flag can also be toggled inside a pattern with inline flag
    /// syntax, e.g., `(?i)` or `(?-i:...)`.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Flags: u32 {
        /// Match letters case insensitively, using simple case folding.
        /// Inline flag `i`.
        const IGNORE_CASE = 1 << 0;
        /// Allow `.` to match `\n`. Inline flag `m`, which is the Ruby
        /// meaning of that letter.
        const DOT_ALL = 1 << 1;
        /// Ignore whitespace and `#` comments outside of classes. Inline
        /// flag `x`.
        const EXTENDED = 1 << 2;
    }
}

/// The configuration used for parsing a pattern.
///
/// As with other configuration types in this crate, every setting is
/// optional and unset settings take on their default values. Merging two
/// configurations prefers the settings of the one that is given last.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    case_insensitive: Option<bool>,
    dot_all: Option<bool>,
    extended: Option<bool>,
    encoding: Option<Encoding>,
    nest_limit: Option<u32>,
}

impl Config {
    /// Return a new default syntax configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set all of the flags at once.
    pub fn flags(self, flags: Flags) -> Config {
        self.case_insensitive(flags.contains(Flags::IGNORE_CASE))
            .dot_all(flags.contains(Flags::DOT_ALL))
            .extended(flags.contains(Flags::EXTENDED))
    }

    /// Enable or disable case insensitive matching by default.
    pub fn case_insensitive(mut self, yes: bool) -> Config {
        self.case_insensitive = Some(yes);
        self
    }

    /// Enable or disable the `.` matching `\n` by default.
    pub fn dot_all(mut self, yes: bool) -> Config {
        self.dot_all = Some(yes);
        self
    }

    /// Enable or disable extended mode by default.
    pub fn extended(mut self, yes: bool) -> Config {
        self.extended = Some(yes);
        self
    }

    /// Set the encoding of the pattern and of every haystack it searches.
    pub fn encoding(mut self, encoding: Encoding) -> Config {
        self.encoding = Some(encoding);
        self
    }

    /// Set the nesting limit of the parser.
    ///
    /// The nesting limit is the maximum number of groups, brackets and
    /// repetitions that may enclose one another. A limit of `0` only accepts
    /// patterns without any of them, and a limit of `2` accepts `(?:a)*` but
    /// rejects `((a))*`. It exists so that the parser and the compiler, which
    /// are both recursive, can't overflow the stack on adversarial patterns.
    /// Exceeding it is a compile error.
    ///
    /// The default is `250`.
    pub fn nest_limit(mut self, limit: u32) -> Config {
        self.nest_limit = Some(limit);
        self
    }

    /// Return the flags implied by this configuration.
    pub fn get_flags(&self) -> Flags {
        let mut flags = Flags::empty();
        flags.set(Flags::IGNORE_CASE, self.get_case_insensitive());
        flags.set(Flags::DOT_ALL, self.get_dot_all());
        flags.set(Flags::EXTENDED, self.get_extended());
        flags
    }

    pub fn get_case_insensitive(&self) -> bool {
        self.case_insensitive.unwrap_or(false)
    }

    pub fn get_dot_all(&self) -> bool {
        self.dot_all.unwrap_or(false)
    }

    pub fn get_extended(&self) -> bool {
        self.extended.unwrap_or(false)
    }

    pub fn get_encoding(&self) -> Encoding {
        self.encoding.unwrap_or_default()
    }

    pub fn get_nest_limit(&self) -> u32 {
        self.nest_limit.unwrap_or(250)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            case_insensitive: o.case_insensitive.or(self.case_insensitive),
            dot_all: o.dot_all.or(self.dot_all),
            extended: o.extended.or(self.extended),
            encoding: o.encoding.or(self.encoding),
            nest_limit: o.nest_limit.or(self.nest_limit),
        }
    }
}

/// Parse the given pattern, encoded in the configured encoding.
pub(crate) fn parse(
    config: &Config,
    pattern: &[u8],
) -> Result<Ast, CompileError> {
    let parser = parse::Parser::new(*config, pattern)?;
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_overwrite() {
        let base = Config::new().case_insensitive(true).nest_limit(10);
        let merged = base.overwrite(Config::new().nest_limit(20));
        assert!(merged.get_case_insensitive());
        assert_eq!(merged.get_nest_limit(), 20);
        assert_eq!(merged.get_encoding(), Encoding::Utf8);
    }

    #[test]
    fn config_flags() {
        let config = Config::new().flags(Flags::IGNORE_CASE | Flags::EXTENDED);
        assert!(config.get_case_insensitive());
        assert!(!config.get_dot_all());
        assert_eq!(config.get_flags(), Flags::IGNORE_CASE | Flags::EXTENDED);
    }
}
