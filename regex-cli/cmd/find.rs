use std::io::{stdout, Write};

use regex_backtrack::Regex;

use crate::{
    config::{self, common, positional, search, syntax},
    util::{self, Table},
};

pub fn run_find(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Searches a window of the haystack and prints every capture group of the first
match. Groups that didn't participate in the match are printed as 'None'. If
there is no match, nothing is printed after the summary table.

USAGE:
    regex-cli find <pattern> <haystack>

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut common = common::Config::default();
    let mut positional = positional::Config::new(&["pattern", "haystack"]);
    let mut syntax = syntax::Config::default();
    let mut search = search::Config::default();
    config::configure(
        p,
        USAGE,
        &mut [&mut common, &mut positional, &mut syntax, &mut search],
    )?;

    let (re, haystack) = setup(&positional, &syntax, &search)?;
    let input = search.input(&haystack);
    let (region, time) = util::timeitr(|| re.search(input))?;

    let mut table = Table::empty();
    if !common.quiet {
        table.add("search time", time);
    }
    table.add("haystack length", haystack.len());
    table.add("window", input.get_span());
    table.add("matched", region.is_some());
    table.print(stdout())?;

    let region = match region {
        None => return Ok(()),
        Some(region) => region,
    };
    let mut out = stdout();
    writeln!(out)?;
    let info = region.group_info();
    for (group, span) in region.iter().enumerate() {
        let label = match info.to_name(group) {
            None => group.to_string(),
            Some(name) => format!("{}/{}", group, name),
        };
        match span {
            None => writeln!(out, "{}: None", label)?,
            Some(span) => {
                let text = syntax.decode(&haystack[span.range()]);
                writeln!(out, "{}: {:?} {}", label, span, text)?;
            }
        }
    }
    Ok(())
}

pub fn run_index(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &'static str = "\
Searches a window of the haystack and prints the byte offset at which the first
match starts, or -1 if there is no match.

USAGE:
    regex-cli index <pattern> <haystack>

TIP:
    use -h for short docs and --help for long docs

OPTIONS:
%options%
";

    let mut common = common::Config::default();
    let mut positional = positional::Config::new(&["pattern", "haystack"]);
    let mut syntax = syntax::Config::default();
    let mut search = search::Config::default();
    config::configure(
        p,
        USAGE,
        &mut [&mut common, &mut positional, &mut syntax, &mut search],
    )?;

    let (re, haystack) = setup(&positional, &syntax, &search)?;
    let (index, time) =
        util::timeitr(|| re.index_in(search.input(&haystack)))?;
    if !common.quiet {
        let mut table = Table::empty();
        table.add("search time", time);
        table.print(stdout())?;
    }
    writeln!(stdout(), "{}", index_text(index))?;
    Ok(())
}

/// Formats the result of `index_in` the way the boundary API reports it,
/// with `-1` standing for no match.
fn index_text(index: Option<usize>) -> String {
    match index {
        None => "-1".to_string(),
        Some(i) => i.to_string(),
    }
}

fn setup(
    positional: &positional::Config,
    syntax: &syntax::Config,
    search: &search::Config,
) -> anyhow::Result<(Regex, Vec<u8>)> {
    let re = syntax.build(positional.get("pattern")?, |b| {
        b.configure(search.backtrack());
    })?;
    let haystack = syntax.encode(positional.get("haystack")?)?;
    Ok((re, haystack))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_text_never_truncates() {
        assert_eq!(index_text(None), "-1");
        assert_eq!(index_text(Some(0)), "0");
        assert_eq!(index_text(Some(usize::MAX)), usize::MAX.to_string());
    }
}
