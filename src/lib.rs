/*!
A backtracking regular expression engine with capture regions.

This crate compiles Oniguruma (Ruby) flavored patterns into a small program
for a backtracking virtual machine and searches windows of haystacks with
it. A successful search produces a [`Region`], which holds the span of the
overall match and of every capture group. Groups that did not participate
in the match are reported as absent, which is distinct from an empty match.

# Example

```
use regex_backtrack::{Input, Regex};

# fn example() -> Result<(), Box<dyn std::error::Error>> {
let re = Regex::new(r"(\w+)@(?<host>\w+)(\.com)?")?;
let haystack = "contact: alice@example";
let region = re.search(haystack)?.unwrap();
assert_eq!(&haystack[region.get_match()], "alice@example");
assert_eq!(region.name("host").map(|s| &haystack[s]), Some("example"));
assert_eq!((region.position(3), region.length(3)), (-1, -1));

// Searching a window. Anchors still see the whole haystack.
let re = Regex::new(r"^\w+")?;
assert_eq!(re.index_in(Input::new(haystack).window(9, 5))?, None);
# Ok(()) }; example().unwrap()
```

# Searches are bounded

Backtracking can take exponential time on some patterns. When a pattern has
no features that depend on how a state was reached (backreferences, atomic
groups, lookaheads and loops over possibly empty bodies), the engine
remembers failed states and runs in time proportional to the size of the
program times the length of the window. For windows too large to remember
in full, it remembers the states closest to the offset being tried. Every
search is also bounded by the budgets in [`backtrack::Config`], and a search
that exceeds them returns [`MatchError::ResourceExhausted`]. Failing to find
a match is never an error.

# Syntax

* Literals, `.`, and the escapes `\t \n \r \f \v \a \e \0oo \xHH \x{H..}
  \uHHHH`. Any other escaped ASCII letter or digit that isn't listed below
  is an error.
* Classes `[...]` and `[^...]` with ranges, nested classes, intersection
  with `&&` and POSIX classes like `[:alpha:]`. Perl classes `\d \D \w \W
  \s \S \h \H` and, with the `unicode` feature, `\p{Name}`, `\P{Name}` and
  `\p{^Name}`.
* Anchors `^` and `$`, which always match at line boundaries, `\A`, `\z`,
  `\Z`, `\b`, `\B`, and `\G`, which matches at the start of the search
  window.
* Quantifiers `* + ? {n} {n,} {,m} {n,m}`, greedy by default, lazy with a
  `?` suffix and possessive with a `+` suffix. A `{` that doesn't begin a
  valid bound is a literal.
* Groups `(...)`, `(?:...)`, named groups `(?<name>...)`, `(?'name'...)`
  and `(?P<name>...)`, atomic groups `(?>...)`, lookaheads `(?=...)` and
  `(?!...)`, and comments `(?#...)`. Look-behind is not supported.
* Backreferences `\1` to `\9` and `\k<name>`, `\k'name'` or `\k<N>`.
* Flags `i` (ignore case), `m` (`.` matches `\n`) and `x` (extended), set
  with `(?imx-imx)` until the end of the enclosing group or scoped with
  `(?imx-imx:...)`.

Patterns and haystacks share an [`Encoding`] chosen when the pattern is
compiled: UTF-8 (the default), UTF-16LE or Latin-1. All offsets are byte
offsets.

# Crate features

* **unicode** (enabled by default) - Enables Unicode aware `\w`, `\d`, `\s`
  and `\b`, `\p{..}` classes and full simple case folding. Without it, all
  of these are ASCII only and `\p{..}` fails to compile.
* **logging** - Emits `debug` and `trace` messages through the `log` crate
  when compiling programs, building prefilters and giving up on searches.
*/

#![deny(missing_debug_implementations)]

#[cfg(not(any(
    target_pointer_width = "16",
    target_pointer_width = "32",
    target_pointer_width = "64"
)))]
compile_error!("regex-backtrack currently not supported on non-{16,32,64}");

pub use crate::{
    error::{CompileError, CompileErrorKind},
    regex::{Builder, Regex},
    region::Region,
    syntax::Flags,
    util::{
        captures::GroupInfo,
        encoding::Encoding,
        search::{Exhausted, Input, MatchError, Span},
    },
};

#[macro_use]
mod macros;

pub mod backtrack;
mod error;
pub mod handle;
pub mod prog;
mod regex;
mod region;
pub mod syntax;
pub mod util;
