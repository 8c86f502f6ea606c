/*!
The backtracking matching engine.

The engine runs a compiled [`Program`] depth first. Every choice point pushes
its alternative onto an explicit stack, together with records that undo
capture and register writes, so failure simply pops the stack. Nothing in the
engine recurses, which means deeply nested or long running searches can't
overflow the call stack.

When a program's outcome from a state `(instruction, position)` never depends
on how that state was reached (no backreferences, atomic groups, lookaheads
or empty-loop checks), the engine remembers every state it has visited in a
bitset. Since a state that failed once will fail again, the search then runs
in `O(m * n)` time. When the bitset for the whole search window doesn't fit
in [`Config::visited_capacity`], it instead holds a sliding range of
positions that starts at the offset currently being tried.

Programs that can't be memoized may take exponential time. Every search is
therefore bounded by a step budget, a limit on the depth of the choice point
stack and an optional wall clock budget. Exceeding any of them stops the
search with [`MatchError::ResourceExhausted`], which callers can tell apart
from "no match".
*/

use std::time::{Duration, Instant};

use crate::{
    prog::{Inst, InstPtr, Program},
    syntax::unicode,
    util::{
        encoding::Encoding,
        prefilter::Prefilter,
        search::{Exhausted, Input, MatchError, Span},
    },
};

/// The configuration of the backtracking engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    step_limit: Option<u64>,
    backtrack_limit: Option<usize>,
    visited_capacity: Option<usize>,
    time_limit: Option<Option<Duration>>,
}

impl Config {
    /// Return a new default backtracker configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the maximum number of instructions a single search may execute,
    /// summed over every start position it tries.
    ///
    /// The default is `50_000_000`.
    pub fn step_limit(mut self, limit: u64) -> Config {
        self.step_limit = Some(limit);
        self
    }

    /// Set the maximum number of frames on the backtracking stack. Each
    /// pending alternative and each saved capture counts as one frame.
    ///
    /// The default is `4_000_000`.
    pub fn backtrack_limit(mut self, limit: usize) -> Config {
        self.backtrack_limit = Some(limit);
        self
    }

    /// Set the maximum size, in bytes, of the bitset used to remember visited
    /// states. Remembering every state of a search needs one bit per
    /// instruction per position in the search window (plus one position).
    /// When that doesn't fit, the bitset remembers as many positions as fit,
    /// starting at the offset currently being tried. When the program can't
    /// be memoized, the search runs without the bitset.
    ///
    /// Setting this to `0` disables memoization entirely.
    ///
    /// The default is 256 KiB.
    pub fn visited_capacity(mut self, capacity: usize) -> Config {
        self.visited_capacity = Some(capacity);
        self
    }

    /// Set a wall clock budget for a single search. The clock is checked
    /// every few thousand steps, so a search may overrun its budget slightly.
    ///
    /// The default is `None`, which means no time limit.
    pub fn time_limit(mut self, limit: Option<Duration>) -> Config {
        self.time_limit = Some(limit);
        self
    }

    pub fn get_step_limit(&self) -> u64 {
        self.step_limit.unwrap_or(50_000_000)
    }

    pub fn get_backtrack_limit(&self) -> usize {
        self.backtrack_limit.unwrap_or(4_000_000)
    }

    pub fn get_visited_capacity(&self) -> usize {
        self.visited_capacity.unwrap_or(256 * (1 << 10))
    }

    pub fn get_time_limit(&self) -> Option<Duration> {
        self.time_limit.unwrap_or(None)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            step_limit: o.step_limit.or(self.step_limit),
            backtrack_limit: o.backtrack_limit.or(self.backtrack_limit),
            visited_capacity: o.visited_capacity.or(self.visited_capacity),
            time_limit: o.time_limit.or(self.time_limit),
        }
    }
}

/// A backtracking engine for a single compiled program.
#[derive(Clone, Debug)]
pub struct Backtracker {
    config: Config,
    prog: Program,
    pre: Option<Prefilter>,
}

impl Backtracker {
    pub(crate) fn new(config: Config, prog: Program) -> Backtracker {
        let pre =
            if prog.anchored { None } else { Prefilter::new(&prog.prefix) };
        Backtracker { config, prog, pre }
    }

    /// Returns the configuration of this engine.
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Returns the program this engine runs.
    pub fn program(&self) -> &Program {
        &self.prog
    }

    /// Create scratch space for searches with this engine.
    pub fn create_cache(&self) -> Cache {
        Cache::new(&self.prog)
    }

    /// Search for the leftmost-first match in the given window.
    ///
    /// On success, the capture slots of the match are written to `slots`.
    /// Slot `2 * i` and `2 * i + 1` hold the start and end of group `i`, and
    /// `None` marks a group that didn't participate. If `slots` is shorter
    /// than the program's slot count, the remaining slots are dropped.
    ///
    /// This returns `Ok(false)` when there's no match, in which case `slots`
    /// is left unspecified.
    pub fn search_slots(
        &self,
        cache: &mut Cache,
        input: &Input<'_>,
        slots: &mut [Option<usize>],
    ) -> Result<bool, MatchError> {
        input.validate(self.prog.encoding)?;
        let span = input.get_span();
        cache.setup(&self.prog, span, &self.config);
        let deadline = self
            .config
            .get_time_limit()
            .and_then(|limit| Instant::now().checked_add(limit));
        let mut runner = Runner {
            prog: &self.prog,
            cache,
            input: *input,
            step_limit: self.config.get_step_limit(),
            backtrack_limit: self.config.get_backtrack_limit(),
            deadline,
            steps: 0,
            start: span.start,
        };
        let anchored = input.get_anchored() || self.prog.anchored;
        let haystack = input.haystack();
        let mut at = span.start;
        while at <= span.end {
            if !anchored {
                if let Some(ref pre) = self.pre {
                    let remaining = Span { start: at, end: span.end };
                    match pre.find(haystack, remaining) {
                        None => return Ok(false),
                        Some(i) => at = i,
                    }
                }
            }
            if runner.run(at)? {
                let found = &runner.cache.slots;
                let len = core::cmp::min(slots.len(), found.len());
                slots[..len].copy_from_slice(&found[..len]);
                return Ok(true);
            }
            if anchored {
                break;
            }
            at = self.prog.encoding.next_boundary(haystack, at);
        }
        Ok(false)
    }
}

/// Scratch space used by the backtracking engine.
///
/// A cache can be reused across searches to avoid reallocating. It is never
/// shared between concurrent searches, so every thread needs its own.
#[derive(Clone, Debug)]
pub struct Cache {
    stack: Vec<Frame>,
    slots: Vec<Option<usize>>,
    regs: Vec<Option<usize>>,
    visited: Visited,
}

impl Cache {
    /// Create scratch space for the given program.
    pub fn new(prog: &Program) -> Cache {
        Cache {
            stack: vec![],
            slots: vec![None; prog.group_info.slot_len()],
            regs: vec![None; prog.reg_len],
            visited: Visited::default(),
        }
    }

    /// Returns the heap memory used by this cache, in bytes.
    pub fn memory_usage(&self) -> usize {
        use core::mem::size_of;

        self.stack.capacity() * size_of::<Frame>()
            + self.slots.capacity() * size_of::<Option<usize>>()
            + self.regs.capacity() * size_of::<Option<usize>>()
            + self.visited.bitset.capacity() * size_of::<u32>()
    }

    fn setup(&mut self, prog: &Program, span: Span, config: &Config) {
        self.stack.clear();
        self.slots.resize(prog.group_info.slot_len(), None);
        self.regs.resize(prog.reg_len, None);
        self.visited.setup(prog, span, config.get_visited_capacity());
    }

    /// Removes the innermost barrier and every pending alternative above it.
    /// Records that restore captures and registers are kept, so that they
    /// still run if matching fails later on.
    ///
    /// Returns the position at which the barrier was set.
    fn cut(&mut self) -> Option<usize> {
        let (i, at) = self.stack.iter().enumerate().rev().find_map(
            |(i, frame)| match *frame {
                Frame::Barrier { at, .. } => Some((i, at)),
                _ => None,
            },
        )?;
        let mut keep = i;
        for j in i + 1..self.stack.len() {
            if !matches!(self.stack[j], Frame::Step { .. }) {
                self.stack[keep] = self.stack[j];
                keep += 1;
            }
        }
        self.stack.truncate(keep);
        Some(at)
    }

    /// Pops frames up to and including the innermost barrier, undoing every
    /// capture and register write made since it was set.
    fn unwind(&mut self) {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Step { .. } => {}
                Frame::RestoreSlot { slot, old } => self.slots[slot] = old,
                Frame::RestoreRegister { reg, old } => self.regs[reg] = old,
                Frame::Barrier { .. } => return,
            }
        }
    }
}

/// A single entry of the backtracking stack.
#[derive(Clone, Copy, Debug)]
enum Frame {
    /// An alternative to try on failure.
    Step { pc: InstPtr, at: usize },
    /// Undo a write to a capture slot.
    RestoreSlot { slot: usize, old: Option<usize> },
    /// Undo a write to a loop register.
    RestoreRegister { reg: usize, old: Option<usize> },
    /// The start of an atomic group or lookahead, at position `at`.
    Barrier { kind: Barrier, at: usize },
}

#[derive(Clone, Copy, Debug)]
enum Barrier {
    Atomic,
    LookAhead,
    /// Popping this barrier on failure means the lookahead body didn't
    /// match, so matching resumes at `next`.
    NegLookAhead { next: InstPtr },
}

/// A bitset of visited `(instruction, position)` states.
///
/// The bitset holds `window` consecutive positions starting at the start
/// offset currently being tried. Position `at` lives in slot
/// `at % window`, and the bits of one slot are contiguous. States at
/// positions past the window aren't remembered. Since no search ever moves
/// before the offset it started at, slots of positions that fall behind a
/// new start offset are cleared and reused for positions further ahead.
#[derive(Clone, Debug, Default)]
struct Visited {
    bitset: Vec<u32>,
    /// The number of bits per position, which is the number of
    /// instructions in the program.
    stride: usize,
    /// The number of positions held.
    window: usize,
    /// The first position held.
    start: usize,
    enabled: bool,
}

impl Visited {
    const BLOCK_SIZE: usize = 32;

    /// Prepares the bitset for a search of the given span.
    ///
    /// When the whole span (plus one position) fits in `capacity` bytes,
    /// every state of the search is remembered. Otherwise, the bitset holds
    /// as many positions as fit. The bitset isn't cleared between start
    /// positions of the same search, since a state that failed from one
    /// start position fails from all of them.
    fn setup(&mut self, prog: &Program, span: Span, capacity: usize) {
        self.enabled = false;
        if !prog.memoizable || prog.insts.is_empty() {
            return;
        }
        let stride = prog.insts.len();
        let positions = span.len().saturating_add(1);
        let fits = capacity.saturating_mul(8) / stride;
        let window = core::cmp::min(positions, fits);
        if window == 0 {
            trace!("memoization disabled: no room for a single position");
            return;
        }
        if window < positions {
            trace!(
                "memoizing {} of {} positions at a time",
                window,
                positions
            );
        }
        let bits = window * stride;
        let blocks = (bits + Visited::BLOCK_SIZE - 1) / Visited::BLOCK_SIZE;
        self.bitset.clear();
        self.bitset.resize(blocks, 0);
        self.stride = stride;
        self.window = window;
        self.start = span.start;
        self.enabled = true;
    }

    /// Moves the first position held to `start`, forgetting every position
    /// before it.
    fn advance(&mut self, start: usize) {
        if !self.enabled || start <= self.start {
            return;
        }
        if start - self.start >= self.window {
            self.bitset.iter_mut().for_each(|block| *block = 0);
        } else {
            for at in self.start..start {
                let lo = (at % self.window) * self.stride;
                self.clear(lo, lo + self.stride);
            }
        }
        self.start = start;
    }

    /// Marks the given state as visited. Returns false if it already was.
    /// States outside the window are never marked, and always reported as
    /// new.
    #[inline]
    fn insert(&mut self, pc: InstPtr, at: usize) -> bool {
        if at < self.start || at - self.start >= self.window {
            return true;
        }
        let k = (at % self.window) * self.stride + pc;
        let (block, bit) =
            (k / Visited::BLOCK_SIZE, 1u32 << (k % Visited::BLOCK_SIZE));
        if self.bitset[block] & bit != 0 {
            return false;
        }
        self.bitset[block] |= bit;
        true
    }

    /// Clears the bits in the range `[lo, hi)`.
    fn clear(&mut self, lo: usize, hi: usize) {
        let mut k = lo;
        while k < hi {
            let (block, bit) =
                (k / Visited::BLOCK_SIZE, k % Visited::BLOCK_SIZE);
            if bit == 0 && hi - k >= Visited::BLOCK_SIZE {
                self.bitset[block] = 0;
                k += Visited::BLOCK_SIZE;
            } else {
                self.bitset[block] &= !(1u32 << bit);
                k += 1;
            }
        }
    }
}

/// The state of a single search.
struct Runner<'a, 'h> {
    prog: &'a Program,
    cache: &'a mut Cache,
    input: Input<'h>,
    step_limit: u64,
    backtrack_limit: usize,
    deadline: Option<Instant>,
    steps: u64,
    /// The start position currently being tried.
    start: usize,
}

impl<'a, 'h> Runner<'a, 'h> {
    /// Try to match starting at exactly `start`.
    fn run(&mut self, start: usize) -> Result<bool, MatchError> {
        trace!("trying start offset {}", start);
        self.start = start;
        self.cache.visited.advance(start);
        self.cache.stack.clear();
        self.cache.slots.iter_mut().for_each(|slot| *slot = None);
        self.cache.regs.iter_mut().for_each(|reg| *reg = None);
        self.push(Frame::Step { pc: 0, at: start })?;
        while let Some(frame) = self.cache.stack.pop() {
            match frame {
                Frame::Step { pc, at } => {
                    if self.step(pc, at)? {
                        return Ok(true);
                    }
                }
                Frame::RestoreSlot { slot, old } => {
                    self.cache.slots[slot] = old;
                }
                Frame::RestoreRegister { reg, old } => {
                    self.cache.regs[reg] = old;
                }
                Frame::Barrier {
                    kind: Barrier::NegLookAhead { next },
                    at,
                } => {
                    if self.step(next, at)? {
                        return Ok(true);
                    }
                }
                Frame::Barrier { .. } => {}
            }
        }
        Ok(false)
    }

    /// Runs the program from `pc` at position `at` until it either matches
    /// or fails. Alternatives are pushed onto the stack as they're found.
    fn step(
        &mut self,
        mut pc: InstPtr,
        mut at: usize,
    ) -> Result<bool, MatchError> {
        let prog = self.prog;
        let enc = prog.encoding;
        let haystack = self.input.haystack();
        let end = self.input.end();
        loop {
            self.tick()?;
            let visited = &mut self.cache.visited;
            if visited.enabled && !visited.insert(pc, at) {
                return Ok(false);
            }
            match prog.insts[pc] {
                Inst::Match => return Ok(true),
                Inst::Char(ch) => match enc.decode(&haystack[at..end]) {
                    Some(Ok((c, len))) if c == ch => {
                        pc += 1;
                        at += len;
                    }
                    _ => return Ok(false),
                },
                Inst::Class(ref cls) => match enc.decode(&haystack[at..end]) {
                    Some(Ok((c, len))) if cls.contains(c) => {
                        pc += 1;
                        at += len;
                    }
                    _ => return Ok(false),
                },
                Inst::Any { dot_all } => match enc.decode(&haystack[at..end]) {
                    Some(Ok((c, len))) if dot_all || c != '\n' => {
                        pc += 1;
                        at += len;
                    }
                    _ => return Ok(false),
                },
                Inst::Split { x, y } => {
                    self.push(Frame::Step { pc: y, at })?;
                    pc = x;
                }
                Inst::Jump(to) => pc = to,
                Inst::Save(slot) => {
                    let old = self.cache.slots[slot];
                    self.push(Frame::RestoreSlot { slot, old })?;
                    self.cache.slots[slot] = Some(at);
                    pc += 1;
                }
                Inst::Look(look) => {
                    if !look.matches(enc, haystack, at, self.input.start()) {
                        return Ok(false);
                    }
                    pc += 1;
                }
                Inst::Backref { group, fold } => {
                    let slots = &self.cache.slots;
                    let (s, e) = match (slots[2 * group], slots[2 * group + 1])
                    {
                        (Some(s), Some(e)) if s <= e => (s, e),
                        _ => return Ok(false),
                    };
                    let rest = &haystack[at..end];
                    match backref_len(enc, &haystack[s..e], rest, fold) {
                        None => return Ok(false),
                        Some(len) => {
                            pc += 1;
                            at += len;
                        }
                    }
                }
                Inst::NullCheckStart { reg } => {
                    let old = self.cache.regs[reg];
                    self.push(Frame::RestoreRegister { reg, old })?;
                    self.cache.regs[reg] = Some(at);
                    pc += 1;
                }
                Inst::NullCheckEnd { reg, exit } => {
                    if self.cache.regs[reg] == Some(at) {
                        pc = exit;
                    } else {
                        pc += 1;
                    }
                }
                Inst::AtomicStart => {
                    self.push(Frame::Barrier { kind: Barrier::Atomic, at })?;
                    pc += 1;
                }
                Inst::AtomicEnd => {
                    self.cache.cut();
                    pc += 1;
                }
                Inst::LookStart { negate, next } => {
                    let kind = if negate {
                        Barrier::NegLookAhead { next }
                    } else {
                        Barrier::LookAhead
                    };
                    self.push(Frame::Barrier { kind, at })?;
                    pc += 1;
                }
                Inst::LookEnd { negate: false } => {
                    if let Some(start) = self.cache.cut() {
                        at = start;
                    }
                    pc += 1;
                }
                Inst::LookEnd { negate: true } => {
                    self.cache.unwind();
                    return Ok(false);
                }
            }
        }
    }

    #[inline]
    fn push(&mut self, frame: Frame) -> Result<(), MatchError> {
        if self.cache.stack.len() >= self.backtrack_limit {
            return Err(self.exhausted(Exhausted::BacktrackDepth));
        }
        self.cache.stack.push(frame);
        Ok(())
    }

    #[inline]
    fn tick(&mut self) -> Result<(), MatchError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(self.exhausted(Exhausted::StepBudget));
        }
        if self.steps % 4096 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(self.exhausted(Exhausted::TimeBudget));
                }
            }
        }
        Ok(())
    }

    fn exhausted(&self, reason: Exhausted) -> MatchError {
        debug!(
            "search gave up at offset {} after {} steps: {:?}",
            self.start, self.steps, reason,
        );
        MatchError::ResourceExhausted { reason, offset: self.start }
    }
}

/// Returns the length of the prefix of `haystack` that equals `captured`,
/// comparing characters under simple case folding when `fold` is set.
fn backref_len(
    enc: Encoding,
    captured: &[u8],
    haystack: &[u8],
    fold: bool,
) -> Option<usize> {
    if !fold {
        return if haystack.starts_with(captured) {
            Some(captured.len())
        } else {
            None
        };
    }
    let (mut i, mut j) = (0, 0);
    while i < captured.len() {
        let (a, alen) = enc.decode(&captured[i..])?.ok()?;
        let (b, blen) = enc.decode(&haystack[j..])?.ok()?;
        if !unicode::simple_fold_eq(a, b) {
            return None;
        }
        i += alen;
        j += blen;
    }
    Some(j)
}
