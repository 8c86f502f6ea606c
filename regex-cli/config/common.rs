use lexopt::{Arg, Parser};

use crate::{args::Usage, config::Configurable};

/// Flags shared by every command.
#[derive(Debug, Default)]
pub struct Config {
    pub quiet: bool,
}

impl Configurable for Config {
    fn configure(
        &mut self,
        _: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Short('q') | Arg::Long("quiet") => {
                self.quiet = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const USAGES: &[Usage] = &[Usage::new(
            "-q, --quiet",
            "Suppress some output.",
            r#"
Suppresses some (but not all) output. For 'regex-cli debug', only the summary
table is printed and the program itself is not. For 'regex-cli find', timings
are not printed.
"#,
        )];
        USAGES
    }
}
