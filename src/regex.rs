/*!
A compiled regex and its builder.
*/

use std::sync::Arc;

use crate::{
    backtrack::{self, Backtracker, Cache},
    error::CompileError,
    prog::{self, Compiler, Program},
    region::Region,
    syntax::{self, Flags},
    util::{
        captures::GroupInfo,
        encoding::Encoding,
        search::{Input, MatchError},
    },
};

/// A compiled regular expression, searched with a backtracking engine.
///
/// A `Regex` is immutable once built. It is cheap to clone and may be used
/// from many threads at the same time. Each search uses its own scratch
/// space, either allocated for the call or supplied by the caller through a
/// [`Cache`].
///
/// Searches are leftmost-first: the match that starts earliest wins, and
/// among matches starting at the same offset, the one preferred by the
/// pattern's alternation order and quantifier greediness wins.
///
/// Searches are fallible. A search that exceeds one of the budgets in
/// [`backtrack::Config`] fails with [`MatchError::ResourceExhausted`]
/// instead of running for an unbounded amount of time. Not finding a match
/// is not an error.
///
/// # Example
///
/// ```
/// use regex_backtrack::{Input, Regex};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let re = Regex::new("a+b")?;
/// let region = re.search("xxaaabxx")?.unwrap();
/// assert_eq!((region.position(0), region.length(0)), (2, 4));
///
/// // Searching a window of the haystack.
/// assert_eq!(re.index_in(Input::new("ab--ab").window(1, 5))?, Some(4));
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone, Debug)]
pub struct Regex {
    imp: Arc<RegexI>,
}

#[derive(Debug)]
struct RegexI {
    pattern: Vec<u8>,
    flags: Flags,
    engine: Backtracker,
}

impl Regex {
    /// Compile the given pattern using the default configuration.
    ///
    /// To compile patterns in another encoding, with flags or with
    /// different search budgets, use a [`Builder`].
    pub fn new(pattern: &str) -> Result<Regex, CompileError> {
        Regex::builder().build(pattern)
    }

    /// Return a builder for configuring the construction of a `Regex`.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Search for the leftmost-first match in the given input.
    ///
    /// Returns `Ok(None)` when there is no match.
    pub fn search<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> Result<Option<Region>, MatchError> {
        let mut cache = self.create_cache();
        self.search_with(&mut cache, &input.into())
    }

    /// Like [`Regex::search`], but uses the scratch space given.
    pub fn search_with(
        &self,
        cache: &mut Cache,
        input: &Input<'_>,
    ) -> Result<Option<Region>, MatchError> {
        let group_info = self.group_info();
        let mut slots = vec![None; group_info.slot_len()];
        if !self.imp.engine.search_slots(cache, input, &mut slots)? {
            return Ok(None);
        }
        Ok(Some(Region::new(group_info.clone(), slots)))
    }

    /// Return the start offset of the leftmost-first match in the given
    /// input. This always agrees with the start of the overall match
    /// reported by [`Regex::search`].
    pub fn index_in<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> Result<Option<usize>, MatchError> {
        let mut cache = self.create_cache();
        self.index_in_with(&mut cache, &input.into())
    }

    /// Like [`Regex::index_in`], but uses the scratch space given.
    pub fn index_in_with(
        &self,
        cache: &mut Cache,
        input: &Input<'_>,
    ) -> Result<Option<usize>, MatchError> {
        let mut slots = [None, None];
        if !self.imp.engine.search_slots(cache, input, &mut slots)? {
            return Ok(None);
        }
        Ok(slots[0])
    }

    /// Returns true if there is a match anywhere in the given input.
    pub fn is_match<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> Result<bool, MatchError> {
        Ok(self.index_in(input)?.is_some())
    }

    /// Create scratch space for use with [`Regex::search_with`] and
    /// [`Regex::index_in_with`].
    pub fn create_cache(&self) -> Cache {
        self.imp.engine.create_cache()
    }

    /// Returns the number of capture groups, including the implicit group
    /// `0`. Every region produced by this regex has this many groups.
    pub fn group_len(&self) -> usize {
        self.group_info().group_len()
    }

    /// Returns the capture groups of this regex.
    pub fn group_info(&self) -> &GroupInfo {
        self.imp.engine.program().group_info()
    }

    /// Returns the pattern this regex was compiled from, in its encoding.
    pub fn pattern(&self) -> &[u8] {
        &self.imp.pattern
    }

    /// Returns the flags this regex was compiled with. Inline flags in the
    /// pattern are not included.
    pub fn flags(&self) -> Flags {
        self.imp.flags
    }

    /// Returns the encoding of this regex's pattern and haystacks.
    pub fn encoding(&self) -> Encoding {
        self.imp.engine.program().encoding()
    }

    /// Returns the compiled program.
    pub fn program(&self) -> &Program {
        self.imp.engine.program()
    }

    /// Returns the search configuration of this regex.
    pub fn get_config(&self) -> &backtrack::Config {
        self.imp.engine.get_config()
    }
}

/// A builder for a [`Regex`].
///
/// The builder combines the configuration of the parser, the compiler and
/// the search engine.
///
/// # Example
///
/// ```
/// use regex_backtrack::{backtrack, syntax, Encoding, Regex};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let re = Regex::builder()
///     .syntax(syntax::Config::new().case_insensitive(true))
///     .configure(backtrack::Config::new().step_limit(1_000_000))
///     .build("abc")?;
/// assert!(re.is_match("xxABCxx")?);
///
/// let utf16: Vec<u8> =
///     "ab".encode_utf16().flat_map(u16::to_le_bytes).collect();
/// let re = Regex::builder()
///     .syntax(syntax::Config::new().encoding(Encoding::Utf16Le))
///     .build("b")?;
/// assert_eq!(re.index_in(&utf16)?, Some(2));
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    config: backtrack::Config,
    syntax: syntax::Config,
    program: prog::Config,
}

impl Builder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Builder {
        Builder {
            config: backtrack::Config::default(),
            syntax: syntax::Config::default(),
            program: prog::Config::default(),
        }
    }

    /// Compile the given pattern. The pattern is first encoded in the
    /// configured encoding, so error offsets refer to the encoded pattern.
    pub fn build(&self, pattern: &str) -> Result<Regex, CompileError> {
        let enc = self.syntax.get_encoding();
        let mut bytes = Vec::with_capacity(pattern.len() * enc.unit_len());
        for ch in pattern.chars() {
            if !enc.encode(ch, &mut bytes) {
                return Err(CompileError::other(
                    bytes.len(),
                    "character not representable in the pattern encoding",
                ));
            }
        }
        self.build_bytes(&bytes)
    }

    /// Compile the given pattern, which must be encoded in the configured
    /// encoding.
    pub fn build_bytes(&self, pattern: &[u8]) -> Result<Regex, CompileError> {
        let ast = syntax::parse(&self.syntax, pattern)?;
        let prog = Compiler::new(self.program, self.syntax.get_encoding())
            .compile(&ast)?;
        let engine = Backtracker::new(self.config, prog);
        Ok(Regex {
            imp: Arc::new(RegexI {
                pattern: pattern.to_vec(),
                flags: self.syntax.get_flags(),
                engine,
            }),
        })
    }

    /// Apply the given search configuration.
    pub fn configure(&mut self, config: backtrack::Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    /// Apply the given syntax configuration.
    pub fn syntax(&mut self, config: syntax::Config) -> &mut Builder {
        self.syntax = self.syntax.overwrite(config);
        self
    }

    /// Apply the given compiler configuration.
    pub fn program(&mut self, config: prog::Config) -> &mut Builder {
        self.program = self.program.overwrite(config);
        self
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}
