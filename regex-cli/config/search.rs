use std::time::Duration;

use {
    lexopt::{Arg, Parser},
    regex_backtrack::{backtrack, Input},
};

use crate::{
    args::{self, Usage},
    config::Configurable,
};

/// Flags that control a search: its window and its budgets.
#[derive(Debug, Default)]
pub struct Config {
    offset: Option<usize>,
    length: Option<usize>,
    anchored: bool,
    backtrack: backtrack::Config,
}

impl Config {
    /// Returns the search window over the given haystack. When no length is
    /// given, the window extends to the end of the haystack.
    pub fn input<'h>(&self, haystack: &'h [u8]) -> Input<'h> {
        let offset = self.offset.unwrap_or(0);
        let length = self
            .length
            .unwrap_or_else(|| haystack.len().saturating_sub(offset));
        Input::new(haystack).window(offset, length).anchored(self.anchored)
    }

    /// Returns the search budgets.
    pub fn backtrack(&self) -> backtrack::Config {
        self.backtrack
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Long("offset") => {
                self.offset = Some(args::parse(p, "--offset")?);
            }
            Arg::Long("length") => {
                self.length = Some(args::parse(p, "--length")?);
            }
            Arg::Long("anchored") => {
                self.anchored = true;
            }
            Arg::Long("step-limit") => {
                let limit = args::parse(p, "--step-limit")?;
                self.backtrack = self.backtrack.step_limit(limit);
            }
            Arg::Long("backtrack-limit") => {
                let limit = args::parse(p, "--backtrack-limit")?;
                self.backtrack = self.backtrack.backtrack_limit(limit);
            }
            Arg::Long("visited-capacity") => {
                let capacity = args::parse(p, "--visited-capacity")?;
                self.backtrack = self.backtrack.visited_capacity(capacity);
            }
            Arg::Long("time-limit") => {
                let millis: Option<u64> =
                    args::parse_maybe(p, "--time-limit")?;
                let limit = millis.map(Duration::from_millis);
                self.backtrack = self.backtrack.time_limit(limit);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &[Usage] = &[
            Usage::new(
                "--offset <bytes>",
                "Set the start of the search window.",
                r#"
Sets the byte offset at which the search window starts (default: 0). Matches
never start before it, but anchors and word boundaries still see the text
before it.
"#,
            ),
            Usage::new(
                "--length <bytes>",
                "Set the length of the search window.",
                r#"
Sets the length in bytes of the search window. When not set, the window
extends to the end of the haystack.
"#,
            ),
            Usage::new(
                "--anchored",
                "Only match at the start of the window.",
                r#"
When enabled, a match must start exactly at the start of the search window.
"#,
            ),
            Usage::new(
                "--step-limit <steps>",
                "Set the step budget of a search.",
                r#"
Sets the maximum number of instructions a search may execute before giving up
with a resource exhaustion error (default: 50000000).
"#,
            ),
            Usage::new(
                "--backtrack-limit <frames>",
                "Set the backtracking stack limit.",
                r#"
Sets the maximum number of frames on the backtracking stack before the search
gives up with a resource exhaustion error (default: 4000000).
"#,
            ),
            Usage::new(
                "--visited-capacity <bytes>",
                "Set the memoization budget.",
                r#"
Sets the maximum size of the bitset used to remember failed states (default:
262144). Setting this to 0 disables memoization.
"#,
            ),
            Usage::new(
                "--time-limit <millis>",
                "Set a wall clock budget for a search.",
                r#"
Sets the maximum time in milliseconds a search may run before giving up. The
special value 'none' disables the limit, which is the default.
"#,
            ),
        ];
        USAGES
    }
}
