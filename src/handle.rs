/*!
A handle based interface with explicit release.

[`Regex`] and [`Region`] are ordinary Rust values: they are released when
dropped, and the borrow checker rules out any use after that. Hosts that
can't hold Rust values directly, such as a foreign function binding, instead
use a [`Registry`], which owns compiled patterns and search results and
hands out small copyable handles to them.

Handles are generational. Releasing a handle bumps the generation of its
slot, so a released handle, or a handle whose slot was later reused, is
reliably rejected with an error instead of referring to some other object.

# Example

```
use regex_backtrack::handle::Registry;

# fn example() -> Result<(), regex_backtrack::handle::Error> {
let registry = Registry::new();
let pattern = registry.compile(b"(A)(.*)", false)?;
let haystack = b"---A---";
let region = registry.search(pattern, haystack, 0, haystack.len())?.unwrap();
assert_eq!(registry.position(region, 0)?, 3);
assert_eq!(registry.length(region, 0)?, 4);
assert_eq!(registry.position(region, 3)?, -1);
registry.release_region(region)?;
registry.release_pattern(pattern)?;

// Released handles are rejected.
assert!(registry.release_pattern(pattern).is_err());
# Ok(()) }; example().unwrap()
```
*/

use std::sync::{Mutex, PoisonError, RwLock};

use crate::{
    error::CompileError,
    regex::{Builder, Regex},
    region::Region,
    syntax,
    util::search::{Input, MatchError},
};

/// A handle to a compiled pattern owned by a [`Registry`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PatternHandle(Key);

/// A handle to a search result owned by a [`Registry`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegionHandle(Key);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct Key {
    index: u32,
    generation: u32,
}

/// An owner of compiled patterns and search results, addressed by handles.
///
/// Every method takes `&self`, and a registry may be shared between
/// threads. Searches don't hold any lock while they run, so searches
/// against the same pattern from different threads proceed in parallel.
///
/// Releasing a pattern doesn't affect regions already produced from it.
#[derive(Debug, Default)]
pub struct Registry {
    builder: Builder,
    patterns: RwLock<Slab<Regex>>,
    regions: Mutex<Slab<Region>>,
}

impl Registry {
    /// Create an empty registry that compiles patterns with the default
    /// configuration.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Create an empty registry that compiles patterns with the given
    /// builder. The `ignore_case` argument of [`Registry::compile`] is
    /// applied on top of the builder's syntax configuration.
    pub fn with_builder(builder: Builder) -> Registry {
        Registry { builder, ..Registry::default() }
    }

    /// Compile a pattern, encoded in the builder's encoding.
    pub fn compile(
        &self,
        pattern: &[u8],
        ignore_case: bool,
    ) -> Result<PatternHandle, Error> {
        let re = self
            .builder
            .clone()
            .syntax(syntax::Config::new().case_insensitive(ignore_case))
            .build_bytes(pattern)
            .map_err(Error::compile)?;
        let mut patterns =
            self.patterns.write().unwrap_or_else(PoisonError::into_inner);
        Ok(PatternHandle(patterns.insert(re)))
    }

    /// Release a compiled pattern.
    pub fn release_pattern(
        &self,
        pattern: PatternHandle,
    ) -> Result<(), Error> {
        let mut patterns =
            self.patterns.write().unwrap_or_else(PoisonError::into_inner);
        match patterns.remove(pattern.0) {
            Some(_) => {
                trace!("released pattern {:?}", pattern);
                Ok(())
            }
            None => Err(Error::released(Handle::Pattern(pattern))),
        }
    }

    /// Search for the leftmost-first match of a pattern in the window of
    /// `haystack` that starts at `offset` and is `length` bytes long.
    ///
    /// On a match, the returned region handle must eventually be released
    /// with [`Registry::release_region`].
    pub fn search(
        &self,
        pattern: PatternHandle,
        haystack: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<Option<RegionHandle>, Error> {
        let re = self.pattern(pattern)?;
        let input = Input::new(haystack).window(offset, length);
        let region = match re.search(input).map_err(Error::search)? {
            None => return Ok(None),
            Some(region) => region,
        };
        let mut regions =
            self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Some(RegionHandle(regions.insert(region))))
    }

    /// Return the start of the leftmost-first match of a pattern in the
    /// given window, or `-1` when there is no match. This agrees with the
    /// position of group `0` of a region returned by [`Registry::search`].
    pub fn index_in(
        &self,
        pattern: PatternHandle,
        haystack: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<isize, Error> {
        let re = self.pattern(pattern)?;
        let input = Input::new(haystack).window(offset, length);
        let start = re.index_in(input).map_err(Error::search)?;
        Ok(start.map_or(-1, |start| isize::try_from(start).unwrap_or(-1)))
    }

    /// Return the start of the given group of a search result, or `-1` if
    /// the group didn't participate in the match or doesn't exist.
    pub fn position(
        &self,
        region: RegionHandle,
        group: usize,
    ) -> Result<isize, Error> {
        self.with_region(region, |r| r.position(group))
    }

    /// Return the length of the given group of a search result, or `-1` if
    /// the group didn't participate in the match or doesn't exist.
    pub fn length(
        &self,
        region: RegionHandle,
        group: usize,
    ) -> Result<isize, Error> {
        self.with_region(region, |r| r.length(group))
    }

    /// Return a copy of a search result.
    pub fn region(&self, region: RegionHandle) -> Result<Region, Error> {
        self.with_region(region, Region::clone)
    }

    /// Release a search result.
    pub fn release_region(&self, region: RegionHandle) -> Result<(), Error> {
        let mut regions =
            self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        match regions.remove(region.0) {
            Some(_) => Ok(()),
            None => Err(Error::released(Handle::Region(region))),
        }
    }

    /// Returns the number of patterns that have not been released.
    pub fn pattern_len(&self) -> usize {
        self.patterns.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the number of search results that have not been released.
    pub fn region_len(&self) -> usize {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns a clone of the given pattern, so that no lock is held while
    /// searching with it.
    fn pattern(&self, pattern: PatternHandle) -> Result<Regex, Error> {
        let patterns =
            self.patterns.read().unwrap_or_else(PoisonError::into_inner);
        patterns
            .get(pattern.0)
            .cloned()
            .ok_or_else(|| Error::released(Handle::Pattern(pattern)))
    }

    fn with_region<T>(
        &self,
        region: RegionHandle,
        f: impl FnOnce(&Region) -> T,
    ) -> Result<T, Error> {
        let regions =
            self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        regions
            .get(region.0)
            .map(f)
            .ok_or_else(|| Error::released(Handle::Region(region)))
    }
}

/// A table of values addressed by generational keys.
#[derive(Debug)]
struct Slab<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Slab<T> {
    fn insert(&mut self, value: T) -> Key {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.value = Some(value);
            return Key { index, generation: entry.generation };
        }
        // A registry with 2^32 live objects is not a supported use.
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(Entry { generation: 0, value: Some(value) });
        Key { index, generation: 0 }
    }

    fn get(&self, key: Key) -> Option<&T> {
        let entry = self.entries.get(key.index as usize)?;
        if entry.generation != key.generation {
            return None;
        }
        entry.value.as_ref()
    }

    fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.entries.get_mut(key.index as usize)?;
        if entry.generation != key.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Slab<T> {
        Slab { entries: vec![], free: vec![], len: 0 }
    }
}

/// A handle of either kind, as reported by [`ErrorKind::UseAfterRelease`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Handle {
    /// A handle returned by [`Registry::compile`].
    Pattern(PatternHandle),
    /// A handle returned by [`Registry::search`].
    Region(RegionHandle),
}

/// An error returned by a [`Registry`].
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of a registry [`Error`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// The pattern could not be compiled.
    Compile(CompileError),
    /// The search gave up or was given an invalid window.
    Search(MatchError),
    /// The handle was already released, or never belonged to this registry.
    UseAfterRelease(Handle),
}

impl Error {
    fn compile(err: CompileError) -> Error {
        Error { kind: ErrorKind::Compile(err) }
    }

    fn search(err: MatchError) -> Error {
        Error { kind: ErrorKind::Search(err) }
    }

    fn released(handle: Handle) -> Error {
        debug!("use after release: {:?}", handle);
        Error { kind: ErrorKind::UseAfterRelease(handle) }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this error reports the use of a released handle.
    pub fn is_use_after_release(&self) -> bool {
        matches!(self.kind, ErrorKind::UseAfterRelease(_))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            ErrorKind::Compile(ref err) => Some(err),
            ErrorKind::Search(ref err) => Some(err),
            ErrorKind::UseAfterRelease(_) => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.kind {
            ErrorKind::Compile(_) => write!(f, "error compiling pattern"),
            ErrorKind::Search(_) => write!(f, "error searching"),
            ErrorKind::UseAfterRelease(Handle::Pattern(h)) => {
                write!(f, "use of released pattern handle {:?}", h)
            }
            ErrorKind::UseAfterRelease(Handle::Region(h)) => {
                write!(f, "use of released region handle {:?}", h)
            }
        }
    }
}
