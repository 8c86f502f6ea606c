use std::time::Duration;

use regex_backtrack::{
    backtrack, syntax, CompileErrorKind, Encoding, Exhausted, Input,
    MatchError, Regex, Span,
};

use crate::Result;

fn window(haystack: &str, offset: usize) -> Input<'_> {
    Input::new(haystack).window(offset, haystack.len() - offset)
}

#[test]
fn scenario_literal_run() -> Result<()> {
    let re = Regex::new("a+b")?;
    let region = re.search(Input::new("xxaaabxx").window(0, 8))?.unwrap();
    assert_eq!(region.position(0), 2);
    assert_eq!(region.length(0), 4);
    Ok(())
}

#[test]
fn scenario_optional_group() -> Result<()> {
    let re = Regex::new("(a)(b)?")?;
    let region = re.search("a")?.unwrap();
    assert_eq!(region.len(), 3);
    assert_eq!(region.get(0), Some(Span::from(0..1)));
    assert_eq!(region.get(1), Some(Span::from(0..1)));
    assert_eq!(region.get(2), None);
    assert_eq!((region.position(2), region.length(2)), (-1, -1));
    Ok(())
}

#[test]
fn scenario_unbalanced_group() -> Result<()> {
    let err = Regex::new("(a").unwrap_err();
    assert_eq!(err.kind(), CompileErrorKind::UnbalancedGroup);
    assert_eq!(err.position(), 2);
    Ok(())
}

// With memoization, this finishes quickly. Without it, the budgets must
// stop it.
#[test]
fn scenario_pathological() -> Result<()> {
    let haystack = "a".repeat(30);
    let re = Regex::new("(a?){30}a{30}")?;
    assert!(re.program().is_memoizable());
    assert!(re.search(haystack.as_str())?.is_some());
    assert_eq!(re.search(&haystack[1..])?, None);

    let re = Regex::builder()
        .configure(
            backtrack::Config::new()
                .visited_capacity(0)
                .step_limit(100_000),
        )
        .build("(a?){30}a{30}")?;
    match re.search(&haystack[1..]) {
        Ok(None) => {}
        Err(MatchError::ResourceExhausted { reason, .. }) => {
            assert_eq!(reason, Exhausted::StepBudget);
        }
        result => panic!("unexpected result: {:?}", result),
    }
    Ok(())
}

#[test]
fn index_in_without_offset() -> Result<()> {
    let re = Regex::new("A")?;
    assert_eq!(re.index_in("A--")?, Some(0));
    assert_eq!(re.index_in("-A-")?, Some(1));
    assert_eq!(re.index_in("---")?, None);
    assert_eq!(re.index_in("--A")?, Some(2));
    Ok(())
}

#[test]
fn index_in_with_offset() -> Result<()> {
    let re = Regex::new("A")?;
    assert_eq!(re.index_in(window("A--", 1))?, None);
    assert_eq!(re.index_in(window("AA-", 1))?, Some(1));
    assert_eq!(re.index_in(window("A-A", 2))?, Some(2));
    assert_eq!(re.index_in(window("--A", 2))?, Some(2));
    Ok(())
}

#[test]
fn search_with_offset() -> Result<()> {
    let re = Regex::new("A")?;
    let region = re.search(window("-A-", 1))?.unwrap();
    assert_eq!((region.position(0), region.length(0)), (1, 1));
    assert_eq!(region.as_bytes(b"-A-", 0), Some(&b"A"[..]));
    assert_eq!((region.position(1), region.length(1)), (-1, -1));
    assert_eq!(region.as_bytes(b"-A-", 1), None);

    let re = Regex::new("(A)")?;
    for (haystack, at) in [("-A-", 1), ("--A", 2)] {
        let region = re.search(window(haystack, 1))?.unwrap();
        assert_eq!((region.position(0), region.length(0)), (at, 1));
        assert_eq!((region.position(1), region.length(1)), (at, 1));
        assert_eq!((region.position(2), region.length(2)), (-1, -1));
    }
    Ok(())
}

#[test]
fn multiple_captures() -> Result<()> {
    let haystack = "---A---";
    let re = Regex::new("(A)(.*)")?;
    let region = re.search(haystack)?.unwrap();
    assert_eq!(region.len(), 3);
    assert_eq!((region.position(0), region.length(0)), (3, 4));
    assert_eq!((region.position(1), region.length(1)), (3, 1));
    assert_eq!((region.position(2), region.length(2)), (4, 3));
    assert_eq!((region.position(3), region.length(3)), (-1, -1));
    let texts: Vec<Option<&[u8]>> = (0..region.len())
        .map(|group| region.as_bytes(haystack.as_bytes(), group))
        .collect();
    assert_eq!(
        texts,
        vec![Some(&b"A---"[..]), Some(&b"A"[..]), Some(&b"---"[..])],
    );
    Ok(())
}

#[test]
fn sparse_captures() -> Result<()> {
    let re = Regex::new("((A)|(B))(.*)")?;
    let region = re.search("---A---")?.unwrap();
    assert_eq!(region.len(), 5);
    let spans: Vec<Option<Span>> = region.iter().collect();
    assert_eq!(
        spans,
        vec![
            Some(Span::from(3..7)),
            Some(Span::from(3..4)),
            Some(Span::from(3..4)),
            None,
            Some(Span::from(4..7)),
        ],
    );
    Ok(())
}

#[test]
fn ignore_case() -> Result<()> {
    let build = |ignore_case| {
        Regex::builder()
            .syntax(syntax::Config::new().case_insensitive(ignore_case))
            .build("A")
    };
    let re = build(true)?;
    assert_eq!(re.index_in("A")?, Some(0));
    assert_eq!(re.index_in("a")?, Some(0));

    let re = build(false)?;
    assert_eq!(re.index_in("A")?, Some(0));
    assert_eq!(re.index_in("a")?, None);

    // The default is case sensitive.
    let re = Regex::new("A")?;
    assert_eq!(re.index_in("a")?, None);
    Ok(())
}

#[test]
fn named_groups() -> Result<()> {
    let re = Regex::new(r"(?<user>\w+)@(?<host>\w+)")?;
    let region = re.search("mail foo@bar")?.unwrap();
    assert_eq!(region.name("user"), Some(Span::from(5..8)));
    assert_eq!(region.name("host"), Some(Span::from(9..12)));
    assert_eq!(region.name("nope"), None);
    assert_eq!(re.group_info().to_index("host"), Some(2));
    assert_eq!(re.group_info().to_name(1), Some("user"));
    Ok(())
}

#[test]
fn zero_length_window() -> Result<()> {
    let re = Regex::new("a")?;
    assert_eq!(re.search(Input::new("aaa").window(1, 0))?, None);

    let re = Regex::new("a*")?;
    let region = re.search(Input::new("aaa").window(1, 0))?.unwrap();
    assert_eq!((region.position(0), region.length(0)), (1, 0));
    Ok(())
}

#[test]
fn invalid_window() -> Result<()> {
    let re = Regex::new("a")?;
    let err = re.search(Input::new("aaa").window(2, 5)).unwrap_err();
    assert_eq!(
        err,
        MatchError::InvalidWindow { start: 2, end: 7, haystack_len: 3 },
    );
    assert!(re.index_in(Input::new("aaa").span(2..1)).is_err());
    assert!(re.index_in(Input::new("aaa").window(usize::MAX, 2)).is_err());
    Ok(())
}

#[test]
fn backtrack_budget() -> Result<()> {
    let re = Regex::builder()
        .configure(
            backtrack::Config::new()
                .visited_capacity(0)
                .backtrack_limit(64),
        )
        .build("(?:a|b)*c")?;
    let haystack = "ab".repeat(100);
    let err = re.search(haystack.as_str()).unwrap_err();
    assert_eq!(err.exhausted(), Some(Exhausted::BacktrackDepth));
    assert_eq!(
        err,
        MatchError::ResourceExhausted {
            reason: Exhausted::BacktrackDepth,
            offset: 0,
        },
    );
    // Short haystacks fit the budget.
    assert_eq!(re.search("abab")?, None);
    Ok(())
}

#[test]
fn time_budget() -> Result<()> {
    let re = Regex::builder()
        .configure(
            backtrack::Config::new()
                .visited_capacity(0)
                .step_limit(u64::MAX)
                .time_limit(Some(Duration::from_millis(0))),
        )
        .build(r"(\w+\s?)+$")?;
    let haystack = format!("{}!", "word ".repeat(20));
    let err = re.search(haystack.as_str()).unwrap_err();
    assert_eq!(err.exhausted(), Some(Exhausted::TimeBudget));
    Ok(())
}

// The visited bitset for this window exceeds the default memory budget,
// so only part of the window is remembered at a time.
#[test]
fn large_window_without_match() -> Result<()> {
    let re = Regex::new("a+x")?;
    let haystack = "a".repeat(1_000_000);
    assert_eq!(re.search(haystack.as_str())?, None);
    assert_eq!(re.index_in(haystack.as_str())?, None);

    let haystack = format!("{}x", haystack);
    let region = re.search(window(&haystack, 999_000))?.unwrap();
    assert_eq!(region.get_match(), Span::from(999_000..1_000_001));
    Ok(())
}

#[test]
fn exhaustion_is_not_no_match() -> Result<()> {
    let re = Regex::builder()
        .configure(backtrack::Config::new().step_limit(10))
        .build("x*y")?;
    let err = re.search("xxxxxxxxxxxxxxxxxxxx").unwrap_err();
    assert!(err.exhausted().is_some());
    assert!(re.is_match("xxxxxxxxxxxxxxxxxxxx").is_err());
    assert!(!err.to_string().is_empty());
    Ok(())
}

#[test]
fn utf16() -> Result<()> {
    let encode = |s: &str| -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_le_bytes).collect()
    };
    let re = Regex::builder()
        .syntax(syntax::Config::new().encoding(Encoding::Utf16Le))
        .build("(A)(.*)")?;
    assert_eq!(re.encoding(), Encoding::Utf16Le);
    let haystack = encode("---A---");
    let region = re.search(&haystack)?.unwrap();
    assert_eq!((region.position(0), region.length(0)), (6, 8));
    assert_eq!((region.position(1), region.length(1)), (6, 2));
    assert_eq!(region.as_bytes(&haystack, 2), Some(&encode("---")[..]));

    let input = Input::new(&haystack).window(8, 6);
    assert_eq!(re.index_in(input)?, None);
    Ok(())
}

// A window may not start or end in the middle of a code unit, since the
// bytes there would be read as different characters.
#[test]
fn utf16_window_alignment() -> Result<()> {
    let re = Regex::builder()
        .syntax(syntax::Config::new().encoding(Encoding::Utf16Le))
        .build_bytes(&[0x61, 0x00])?;
    let haystack = [0x00, 0x61, 0x00, 0x00];
    assert_eq!(re.search(&haystack)?, None);

    let err = re.search(Input::new(&haystack).window(1, 3)).unwrap_err();
    assert_eq!(
        err,
        MatchError::InvalidWindow { start: 1, end: 4, haystack_len: 4 },
    );
    assert!(re.index_in(Input::new(&haystack).window(0, 3)).is_err());
    assert_eq!(re.index_in(Input::new(&haystack).window(2, 2))?, None);

    let haystack = [0x61, 0x00, 0x61];
    assert_eq!(re.index_in(&haystack)?, Some(0));
    assert_eq!(re.index_in(Input::new(&haystack).window(2, 1))?, None);
    Ok(())
}

#[test]
fn regions_outlive_their_regex() -> Result<()> {
    let region = {
        let re = Regex::new("(?<x>b)")?;
        re.search("abc")?.unwrap()
    };
    assert_eq!(region.name("x"), Some(Span::from(1..2)));
    assert_eq!(
        format!("{:?}", region),
        r#"{0: Some(1..2), (1, "x"): Some(1..2)}"#,
    );
    Ok(())
}

#[test]
fn deterministic() -> Result<()> {
    let re = Regex::new(r"(\w+)\s+(\w+)?")?;
    let first = re.search("  hello   world ")?;
    for _ in 0..10 {
        assert_eq!(re.search("  hello   world ")?, first);
    }
    Ok(())
}
