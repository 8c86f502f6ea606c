use std::sync::Arc;

use regex_backtrack::{
    handle::{ErrorKind, Handle, Registry},
    syntax, Encoding, MatchError, Regex, Span,
};

use crate::Result;

fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[test]
fn utf16_registry() -> Result<()> {
    let mut builder = Regex::builder();
    builder.syntax(syntax::Config::new().encoding(Encoding::Utf16Le));
    let registry = Registry::with_builder(builder);

    let pattern = registry.compile(&utf16("(A)(.*)"), false)?;
    let haystack = utf16("---A---");
    let region =
        registry.search(pattern, &haystack, 0, haystack.len())?.unwrap();
    assert_eq!(registry.position(region, 0)?, 6);
    assert_eq!(registry.length(region, 0)?, 8);
    assert_eq!(registry.position(region, 2)?, 8);
    assert_eq!(registry.length(region, 3)?, -1);
    assert_eq!(registry.index_in(pattern, &haystack, 8, 6)?, -1);

    let insensitive = registry.compile(&utf16("a"), true)?;
    assert_eq!(registry.index_in(insensitive, &haystack, 0, 14)?, 6);

    registry.release_region(region)?;
    registry.release_pattern(pattern)?;
    registry.release_pattern(insensitive)?;
    Ok(())
}

#[test]
fn window_matches_offset_and_length() -> Result<()> {
    let registry = Registry::new();
    let pattern = registry.compile(b"a+b", false)?;
    let haystack = b"xxaaabxx";
    let region = registry.search(pattern, haystack, 0, 8)?.unwrap();
    assert_eq!(registry.region(region)?.get_match(), Span::from(2..6));
    assert_eq!(registry.index_in(pattern, haystack, 0, 8)?, 2);
    assert_eq!(registry.index_in(pattern, haystack, 3, 5)?, 3);
    assert_eq!(registry.index_in(pattern, haystack, 0, 5)?, -1);
    assert_eq!(registry.search(pattern, haystack, 0, 5)?, None);
    assert_eq!(registry.search(pattern, haystack, 4, 0)?, None);
    Ok(())
}

#[test]
fn misaligned_utf16_window() -> Result<()> {
    let mut builder = Regex::builder();
    builder.syntax(syntax::Config::new().encoding(Encoding::Utf16Le));
    let registry = Registry::with_builder(builder);

    let pattern = registry.compile(&utf16("a"), false)?;
    let haystack = [0x00, 0x61, 0x00, 0x00];
    assert_eq!(registry.search(pattern, &haystack, 0, 4)?, None);
    let err = registry.search(pattern, &haystack, 1, 3).unwrap_err();
    assert!(matches!(
        *err.kind(),
        ErrorKind::Search(MatchError::InvalidWindow { start: 1, .. })
    ));
    assert!(registry.index_in(pattern, &haystack, 1, 3).is_err());
    assert_eq!(registry.region_len(), 0);
    Ok(())
}

#[test]
fn stale_handles_report_their_kind() -> Result<()> {
    let registry = Registry::new();
    let pattern = registry.compile(b"x", false)?;
    let region = registry.search(pattern, b"x", 0, 1)?.unwrap();
    registry.release_region(region)?;
    registry.release_pattern(pattern)?;

    let err = registry.release_pattern(pattern).unwrap_err();
    assert!(matches!(
        *err.kind(),
        ErrorKind::UseAfterRelease(Handle::Pattern(h)) if h == pattern
    ));
    let err = registry.region(region).unwrap_err();
    assert!(matches!(
        *err.kind(),
        ErrorKind::UseAfterRelease(Handle::Region(h)) if h == region
    ));
    assert!(err.to_string().contains("region"));
    Ok(())
}

#[test]
fn handles_from_another_registry() -> Result<()> {
    let first = Registry::new();
    let second = Registry::new();
    let pattern = first.compile(b"x", false)?;
    let err = second.index_in(pattern, b"x", 0, 1).unwrap_err();
    assert!(err.is_use_after_release());
    assert_eq!(first.index_in(pattern, b"x", 0, 1)?, 0);
    Ok(())
}

#[test]
fn shared_between_threads() -> Result<()> {
    let registry = Arc::new(Registry::new());
    let pattern = registry.compile(br"(?<word>\w+)\s*$", false)?;
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let haystack = format!("thread number {}", i);
                let region = registry
                    .search(pattern, haystack.as_bytes(), 0, haystack.len())
                    .unwrap()
                    .unwrap();
                let start = registry.position(region, 1).unwrap();
                registry.release_region(region).unwrap();
                start
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 14);
    }
    assert_eq!(registry.region_len(), 0);
    registry.release_pattern(pattern)?;
    assert_eq!(registry.pattern_len(), 0);
    Ok(())
}
