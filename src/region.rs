use crate::util::{captures::GroupInfo, search::Span};

/// The result of a successful search: the span of the overall match and of
/// every capture group.
///
/// A region has exactly one entry per capture group of the regex that
/// produced it, plus one for the implicit group `0`, which covers the whole
/// match and is always present. Groups that did not participate in the
/// match are absent. An absent group is distinct from a group that matched
/// the empty string.
///
/// Each search produces a fresh region owned by the caller. Regions keep a
/// handle to the group names of their regex, so a region remains usable
/// after the regex that produced it is dropped.
///
/// # Example
///
/// ```
/// use regex_backtrack::Regex;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let re = Regex::new("(a)(b)?")?;
/// let region = re.search("a")?.unwrap();
/// assert_eq!(region.len(), 3);
/// assert_eq!((region.position(0), region.length(0)), (0, 1));
/// assert_eq!((region.position(1), region.length(1)), (0, 1));
/// assert_eq!((region.position(2), region.length(2)), (-1, -1));
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone)]
pub struct Region {
    group_info: GroupInfo,
    slots: Vec<Option<usize>>,
}

impl Region {
    pub(crate) fn new(
        group_info: GroupInfo,
        slots: Vec<Option<usize>>,
    ) -> Region {
        debug_assert_eq!(group_info.slot_len(), slots.len());
        Region { group_info, slots }
    }

    /// Returns the span of the given group, or `None` if the group did not
    /// participate in the match or doesn't exist.
    #[inline]
    pub fn get(&self, group: usize) -> Option<Span> {
        let (start, end) = self.group_info.slots(group)?;
        match (self.slots[start], self.slots[end]) {
            (Some(start), Some(end)) => Some(Span { start, end }),
            _ => None,
        }
    }

    /// Returns the span of the group with the given name, or `None` if it
    /// did not participate in the match or no group has that name.
    pub fn name(&self, name: &str) -> Option<Span> {
        self.get(self.group_info.to_index(name)?)
    }

    /// Returns the span of the overall match.
    #[inline]
    pub fn get_match(&self) -> Span {
        // Group 0 is set by every successful search.
        self.get(0).unwrap_or(Span { start: 0, end: 0 })
    }

    /// Returns the start offset of the given group, or `-1` if the group is
    /// absent or out of range.
    pub fn position(&self, group: usize) -> isize {
        self.get(group).map_or(-1, |span| to_isize(span.start))
    }

    /// Returns the length of the given group, or `-1` if the group is absent
    /// or out of range.
    pub fn length(&self, group: usize) -> isize {
        self.get(group).map_or(-1, |span| to_isize(span.len()))
    }

    /// Returns the text matched by the given group.
    ///
    /// `haystack` must be the haystack that was searched to produce this
    /// region.
    pub fn as_bytes<'h>(
        &self,
        haystack: &'h [u8],
        group: usize,
    ) -> Option<&'h [u8]> {
        haystack.get(self.get(group)?.range())
    }

    /// Returns an iterator over the spans of every group, in index order.
    /// The first item is the overall match.
    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        (0..self.len()).map(move |group| self.get(group))
    }

    /// Returns the number of groups, including group `0`.
    #[inline]
    pub fn len(&self) -> usize {
        self.group_info.group_len()
    }

    /// Always false, since group `0` is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the capture group information of the regex that produced this
    /// region.
    pub fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Region) -> bool {
        self.slots == other.slots
    }
}

impl Eq for Region {}

impl core::fmt::Debug for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut list = f.debug_map();
        for (group, span) in self.iter().enumerate() {
            match self.group_info.to_name(group) {
                None => list.entry(&group, &span),
                Some(name) => list.entry(&(group, name), &span),
            };
        }
        list.finish()
    }
}

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(names: &[Option<&str>], slots: &[Option<usize>]) -> Region {
        let info =
            GroupInfo::new(names.iter().map(|&name| (name, 0))).unwrap();
        Region::new(info, slots.to_vec())
    }

    #[test]
    fn absent_is_not_empty() {
        let r = region(
            &[None, None],
            &[Some(0), Some(0), Some(0), Some(0), None, None],
        );
        assert_eq!(r.len(), 3);
        assert_eq!(r.get(1), Some(Span { start: 0, end: 0 }));
        assert_eq!((r.position(1), r.length(1)), (0, 0));
        assert_eq!(r.get(2), None);
        assert_eq!((r.position(2), r.length(2)), (-1, -1));
        assert_eq!((r.position(3), r.length(3)), (-1, -1));
        assert_eq!(r.position(usize::MAX), -1);
    }

    #[test]
    fn names_and_text() {
        let r = region(
            &[Some("first"), None],
            &[Some(3), Some(7), Some(3), Some(4), Some(4), Some(7)],
        );
        let haystack = b"---A---";
        assert_eq!(r.name("first"), Some(Span { start: 3, end: 4 }));
        assert_eq!(r.name("second"), None);
        assert_eq!(r.as_bytes(haystack, 1), Some(&b"A"[..]));
        assert_eq!(r.as_bytes(haystack, 2), Some(&b"---"[..]));
        assert_eq!(r.get_match(), Span { start: 3, end: 7 });
        let spans: Vec<Option<Span>> = r.iter().collect();
        assert_eq!(spans.len(), 3);
        assert_eq!(
            format!("{:?}", r),
            r#"{0: Some(3..7), (1, "first"): Some(3..4), 2: Some(4..7)}"#
        );
    }
}
