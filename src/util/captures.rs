use std::{collections::HashMap, sync::Arc};

/// Represents information about capturing groups in a compiled regex.
///
/// The information encapsulated by this type consists of the following:
///
/// * A map from every capture group name to its corresponding capture group
/// index.
/// * A map from every capture group index to its corresponding capture group
/// name.
/// * The nesting of groups: for each explicit group, the index of the
/// innermost group enclosing it.
///
/// Group `0` is always present, always unnamed and corresponds to the whole
/// match. Explicit groups are numbered from `1` in the textual order of their
/// opening parentheses. Named groups are numbered too.
///
/// Every group has two slots: a start slot at `2 * index` and an end slot at
/// `2 * index + 1`. A slot is the mechanism by which the matching engine
/// records offsets for each capturing group during a search.
///
/// This type is cheap to clone. Regions produced by a search keep a handle to
/// the `GroupInfo` of the regex that produced them, so group names remain
/// available even after the regex itself is dropped.
#[derive(Clone, Debug)]
pub struct GroupInfo(Arc<GroupInfoInner>);

#[derive(Debug)]
struct GroupInfoInner {
    index_to_name: Vec<Option<Arc<str>>>,
    name_to_index: HashMap<Arc<str>, usize>,
    parents: Vec<Option<usize>>,
}

impl GroupInfo {
    /// Create group info from the explicit groups of a pattern, in index
    /// order. Each item is the group's name (if any) and the index of its
    /// innermost enclosing group, where `0` means the group is not nested
    /// inside any explicit group.
    ///
    /// The implicit group `0` must not be included.
    ///
    /// # Errors
    ///
    /// This returns an error if two groups have the same name, or if a parent
    /// index does not refer to a group that precedes its child.
    pub fn new<G, N>(groups: G) -> Result<GroupInfo, GroupInfoError>
    where
        G: IntoIterator<Item = (Option<N>, usize)>,
        N: AsRef<str>,
    {
        let mut inner = GroupInfoInner {
            index_to_name: vec![None],
            name_to_index: HashMap::new(),
            parents: vec![None],
        };
        for (i, (maybe_name, parent)) in groups.into_iter().enumerate() {
            let index = i + 1;
            if parent >= index {
                return Err(GroupInfoError::invalid_parent(index, parent));
            }
            let name = match maybe_name {
                None => None,
                Some(name) => {
                    let name: Arc<str> = Arc::from(name.as_ref());
                    if inner.name_to_index.contains_key(&name) {
                        return Err(GroupInfoError::duplicate(index, name));
                    }
                    inner.name_to_index.insert(Arc::clone(&name), index);
                    Some(name)
                }
            };
            inner.index_to_name.push(name);
            inner.parents.push(Some(parent));
        }
        Ok(GroupInfo(Arc::new(inner)))
    }

    /// Create group info for a pattern without explicit groups.
    pub fn empty() -> GroupInfo {
        GroupInfo(Arc::new(GroupInfoInner {
            index_to_name: vec![None],
            name_to_index: HashMap::new(),
            parents: vec![None],
        }))
    }

    /// Return the capture group index corresponding to the given name. If no
    /// such capture group name exists, then this returns `None`.
    #[inline]
    pub fn to_index(&self, name: &str) -> Option<usize> {
        self.0.name_to_index.get(name).copied()
    }

    /// Return the capture name for the given index. If the corresponding
    /// group does not have a name, or if the index is invalid, then this
    /// returns `None`.
    #[inline]
    pub fn to_name(&self, group_index: usize) -> Option<&str> {
        self.0.index_to_name.get(group_index)?.as_deref()
    }

    /// Return the index of the innermost group that encloses the given group.
    /// Groups at the top level of a pattern have parent `0`.
    ///
    /// This returns `None` for group `0` and for invalid indices.
    #[inline]
    pub fn parent(&self, group_index: usize) -> Option<usize> {
        self.0.parents.get(group_index).copied().flatten()
    }

    /// Return the number of groups that enclose the given group, not counting
    /// group `0`. Groups at the top level have depth `0`.
    pub fn depth(&self, group_index: usize) -> Option<usize> {
        let mut depth = 0;
        let mut parent = self.parent(group_index)?;
        while parent != 0 {
            depth += 1;
            parent = self.parent(parent)?;
        }
        Some(depth)
    }

    /// Return an iterator over the names of all groups, in index order. The
    /// first item always corresponds to group `0` and is always `None`.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.0.index_to_name.iter().map(|n| n.as_deref())
    }

    /// Return the start and end slots for the given group, if it exists.
    #[inline]
    pub fn slots(&self, group_index: usize) -> Option<(usize, usize)> {
        if group_index >= self.group_len() {
            return None;
        }
        Some((group_index * 2, group_index * 2 + 1))
    }

    /// Return the total number of groups, including the implicit group `0`.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.0.index_to_name.len()
    }

    /// Return the total number of slots. This is always twice the number of
    /// groups.
    #[inline]
    pub fn slot_len(&self) -> usize {
        self.group_len() * 2
    }
}

/// An error that may occur when building a `GroupInfo`.
#[derive(Clone, Debug)]
pub struct GroupInfoError {
    kind: GroupInfoErrorKind,
}

#[derive(Clone, Debug)]
enum GroupInfoErrorKind {
    /// A group name was used more than once.
    Duplicate { index: usize, name: Arc<str> },
    /// A group's parent does not precede it.
    InvalidParent { index: usize, parent: usize },
}

impl GroupInfoError {
    fn duplicate(index: usize, name: Arc<str>) -> GroupInfoError {
        GroupInfoError { kind: GroupInfoErrorKind::Duplicate { index, name } }
    }

    fn invalid_parent(index: usize, parent: usize) -> GroupInfoError {
        GroupInfoError {
            kind: GroupInfoErrorKind::InvalidParent { index, parent },
        }
    }

    /// Return the index of the group that caused this error.
    pub fn group_index(&self) -> usize {
        match self.kind {
            GroupInfoErrorKind::Duplicate { index, .. }
            | GroupInfoErrorKind::InvalidParent { index, .. } => index,
        }
    }
}

impl std::error::Error for GroupInfoError {}

impl core::fmt::Display for GroupInfoError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::GroupInfoErrorKind::*;

        match self.kind {
            Duplicate { index, ref name } => write!(
                f,
                "duplicate capture group name '{}' found at index {}",
                name, index,
            ),
            InvalidParent { index, parent } => write!(
                f,
                "capture group {} has invalid parent group {}",
                index, parent,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_slots() {
        let info = GroupInfo::new([
            (None, 0),
            (Some("foo"), 1),
            (None, 0),
            (Some("bar"), 3),
        ])
        .unwrap();
        assert_eq!(info.group_len(), 5);
        assert_eq!(info.slot_len(), 10);
        assert_eq!(info.to_index("foo"), Some(2));
        assert_eq!(info.to_index("bar"), Some(4));
        assert_eq!(info.to_index("quux"), None);
        assert_eq!(info.to_name(0), None);
        assert_eq!(info.to_name(2), Some("foo"));
        assert_eq!(info.to_name(5), None);
        assert_eq!(info.slots(3), Some((6, 7)));
        assert_eq!(info.slots(5), None);
        assert_eq!(
            info.names().collect::<Vec<_>>(),
            vec![None, None, Some("foo"), None, Some("bar")],
        );
    }

    #[test]
    fn nesting() {
        // ((a)(b(c)))
        let info = GroupInfo::new([
            (None::<&str>, 0),
            (None, 1),
            (None, 1),
            (None, 3),
        ])
        .unwrap();
        assert_eq!(info.parent(0), None);
        assert_eq!(info.parent(1), Some(0));
        assert_eq!(info.parent(4), Some(3));
        assert_eq!(info.depth(1), Some(0));
        assert_eq!(info.depth(4), Some(2));
    }

    #[test]
    fn errors() {
        let err =
            GroupInfo::new([(Some("a"), 0), (Some("a"), 0)]).unwrap_err();
        assert_eq!(err.group_index(), 2);
        let err = GroupInfo::new([(None::<&str>, 1)]).unwrap_err();
        assert_eq!(err.group_index(), 1);
        assert_eq!(GroupInfo::empty().group_len(), 1);
    }
}
