use std::io::{stdout, Write};

use crate::{
    config::{self, common, positional, syntax},
    util::{self, Table},
};

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Prints the debug representation of the program a pattern compiles to.

USAGE:
    regex-cli debug <pattern>

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut common = common::Config::default();
    let mut positional = positional::Config::new(&["pattern"]);
    let mut syntax = syntax::Config::default();
    config::configure(
        p,
        USAGE,
        &mut [&mut common, &mut positional, &mut syntax],
    )?;

    let pattern = positional.get("pattern")?;
    let (re, time) = util::timeitr(|| syntax.build(pattern, |_| {}))?;
    let prog = re.program();

    let mut table = Table::empty();
    table.add("compile time", time);
    table.add("encoding", prog.encoding());
    table.add("instructions", prog.len());
    table.add("groups", prog.group_info().group_len());
    table.add("memoizable", prog.is_memoizable());
    table.add("anchored", prog.is_anchored());
    table.add("prefix", syntax.decode(prog.prefix()));
    table.print(stdout())?;
    if !common.quiet {
        writeln!(stdout(), "\n{:?}", prog)?;
    }
    Ok(())
}
