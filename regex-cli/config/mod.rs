use std::fmt::Debug;

use lexopt::{Arg, Parser};

use crate::args::Usage;

pub mod common;
pub mod positional;
pub mod search;
pub mod syntax;

pub trait Configurable: Debug + 'static {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    fn usage(&self) -> &[Usage];
}

pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    while let Some(arg) = p.next()? {
        if let Arg::Short('h') | Arg::Long("help") = arg {
            let mut usages = vec![];
            for t in targets.iter() {
                usages.extend_from_slice(t.usage());
            }
            usages.sort_by_key(|u| u.format);
            let options = if arg == Arg::Short('h') {
                Usage::short(&usages)
            } else {
                Usage::long(&usages)
            };
            let usage = usage.replace("%options%", &options);
            anyhow::bail!("{}", usage);
        }
        // Long flag names borrow from the parser, so they're copied out to
        // let each target take the parser mutably.
        let long_flag: Option<String> = match arg {
            Arg::Long(name) => Some(name.to_string()),
            _ => None,
        };
        let mut arg = match (long_flag.as_deref(), arg) {
            (Some(flag), _) => Arg::Long(flag),
            (None, Arg::Short(c)) => Arg::Short(c),
            (None, Arg::Value(value)) => Arg::Value(value),
            (None, Arg::Long(_)) => unreachable!(),
        };
        let mut recognized = false;
        for t in targets.iter_mut() {
            if t.configure(p, &mut arg)? {
                recognized = true;
                break;
            }
        }
        if !recognized {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}
