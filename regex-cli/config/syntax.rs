use {
    anyhow::Context,
    bstr::ByteVec,
    lexopt::{Arg, Parser},
    regex_backtrack::{syntax, Encoding, Regex},
};

use crate::{
    args::{self, Usage},
    config::Configurable,
};

/// Flags that control how a pattern is parsed and how text given on the
/// command line is encoded.
#[derive(Debug, Default)]
pub struct Config {
    syntax: syntax::Config,
}

impl Config {
    /// Returns the parser configuration.
    pub fn syntax(&self) -> syntax::Config {
        self.syntax
    }

    /// Returns the configured encoding.
    pub fn encoding(&self) -> Encoding {
        self.syntax.get_encoding()
    }

    /// Encodes text given on the command line. For UTF-8, escape sequences
    /// like `\xFF` are supported so that invalid UTF-8 can be searched.
    pub fn encode(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        match self.encoding() {
            Encoding::Utf8 => Ok(Vec::unescape_bytes(text)),
            enc => enc.encode_str(text).with_context(|| {
                format!("'{}' can't be represented in {:?}", text, enc)
            }),
        }
    }

    /// Decodes text for display. Text that isn't UTF-8 is shown with escape
    /// sequences.
    pub fn decode(&self, bytes: &[u8]) -> String {
        use bstr::ByteSlice;

        match self.encoding() {
            Encoding::Utf8 => format!("{:?}", bytes.as_bstr()),
            Encoding::Latin1 => {
                let s: String = bytes.iter().map(|&b| char::from(b)).collect();
                format!("{:?}", s)
            }
            Encoding::Utf16Le => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]));
                let s: String = char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                format!("{:?}", s)
            }
        }
    }

    /// Compiles the given pattern with this configuration and any further
    /// configuration applied by `configure`.
    pub fn build(
        &self,
        pattern: &str,
        configure: impl FnOnce(&mut regex_backtrack::Builder),
    ) -> anyhow::Result<Regex> {
        let mut builder = Regex::builder();
        builder.syntax(self.syntax);
        configure(&mut builder);
        let bytes = self.encode(pattern)?;
        builder.build_bytes(&bytes).context("failed to compile pattern")
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('i') | Arg::Long("ignore-case") => {
                self.syntax = self.syntax.case_insensitive(true);
            }
            Arg::Short('s') | Arg::Long("dot-all") => {
                self.syntax = self.syntax.dot_all(true);
            }
            Arg::Short('x') | Arg::Long("extended") => {
                self.syntax = self.syntax.extended(true);
            }
            Arg::Short('e') | Arg::Long("encoding") => {
                let enc: EncodingArg = args::parse(p, "-e/--encoding")?;
                self.syntax = self.syntax.encoding(enc.0);
            }
            Arg::Long("nest-limit") => {
                let limit = args::parse(p, "--nest-limit")?;
                self.syntax = self.syntax.nest_limit(limit);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &[Usage] = &[
            Usage::new(
                "-i, --ignore-case",
                "Enable case insensitive matching.",
                r#"
Enables case insensitive matching using simple case folding. This is the same
as starting the pattern with '(?i)'.
"#,
            ),
            Usage::new(
                "-s, --dot-all",
                "Make '.' match '\\n'.",
                r#"
Makes '.' match any character including '\n'. This is the same as starting the
pattern with '(?m)', which is what that flag means in Ruby syntax.
"#,
            ),
            Usage::new(
                "-x, --extended",
                "Ignore whitespace and comments in the pattern.",
                r#"
Enables extended mode, in which whitespace and '#' comments outside of
character classes are ignored. This is the same as starting the pattern with
'(?x)'.
"#,
            ),
            Usage::new(
                "-e, --encoding <name>",
                "One of: utf8, utf16le, latin1.",
                r#"
The encoding of the pattern and the haystack (default: utf8). Both are given
as UTF-8 on the command line and are converted to this encoding before
compiling and searching. Offsets, lengths and positions are always in bytes of
the converted text.

For utf8, escape sequences like '\xFF' may be used to search invalid UTF-8.
"#,
            ),
            Usage::new(
                "--nest-limit <limit>",
                "Set the nesting limit of the parser.",
                r#"
Sets the maximum depth of nested groups, classes and repetitions. Patterns
that nest more deeply fail to compile.
"#,
            ),
        ];
        USAGES
    }
}

#[derive(Debug)]
struct EncodingArg(Encoding);

impl std::str::FromStr for EncodingArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<EncodingArg> {
        let enc = match s {
            "utf8" | "utf-8" => Encoding::Utf8,
            "utf16le" | "utf-16le" => Encoding::Utf16Le,
            "latin1" | "iso-8859-1" => Encoding::Latin1,
            unknown => {
                anyhow::bail!(
                    "unrecognized encoding '{}', must be \
                     one of utf8, utf16le or latin1.",
                    unknown,
                )
            }
        };
        Ok(EncodingArg(enc))
    }
}
