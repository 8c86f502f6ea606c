use crate::args;

mod debug;
mod find;

const USAGE: &'static str = "\
A tool for running backtracking regex searches on the command line.

USAGE:
    regex-cli <command> ...

COMMANDS:
    debug    Print the compiled program of a pattern.
    find     Print the capture groups of the first match in a window.
    index    Print the start offset of the first match in a window.
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = args::next_as_command(USAGE, p)?;
    match &*cmd {
        "debug" => debug::run(p),
        "find" => find::run_find(p),
        "index" => find::run_index(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
