//! Identity memo: original to copy
//!
//! Each original gets a dense [`EntryId`] the first time it is seen. Batches
//! refer to entries by id, never by object handle.

use graphcopy_model::ObjectRef;
use std::collections::HashMap;

/// Dense index of a memo entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(usize);

impl EntryId {
    /// Position in registration order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One original and its copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoEntry {
    /// Object that was copied
    pub original: ObjectRef,

    /// Its copy; equal to `original` for pass-through values
    pub copy: ObjectRef,
}

impl MemoEntry {
    /// Check if the original was kept instead of copied
    #[inline]
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.original == self.copy
    }
}

/// Mapping from originals to copies
#[derive(Debug, Default)]
pub struct IdentityMemo {
    index: HashMap<ObjectRef, EntryId>,
    entries: Vec<MemoEntry>,
}

impl IdentityMemo {
    /// Create empty memo
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy registered for `original`
    #[inline]
    #[must_use]
    pub fn resolve(&self, original: ObjectRef) -> Option<ObjectRef> {
        self.index.get(&original).map(|id| self.entries[id.0].copy)
    }

    /// Register `original -> copy`
    ///
    /// An original is entered at most once: a second registration keeps the
    /// first copy and returns its id.
    pub fn insert(&mut self, original: ObjectRef, copy: ObjectRef) -> EntryId {
        if let Some(existing) = self.index.get(&original) {
            return *existing;
        }
        let id = EntryId(self.entries.len());
        self.entries.push(MemoEntry { original, copy });
        self.index.insert(original, id);
        id
    }

    /// Entry by id
    ///
    /// Ids are only issued by [`IdentityMemo::insert`] on this memo.
    #[inline]
    #[must_use]
    pub fn entry(&self, id: EntryId) -> MemoEntry {
        self.entries[id.0]
    }

    /// Originals of the given entries
    #[must_use]
    pub fn originals(&self, ids: &[EntryId]) -> Vec<ObjectRef> {
        ids.iter().map(|id| self.entries[id.0].original).collect()
    }

    /// Number of registered originals
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &MemoEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcopy_model::ObjectId;

    fn obj(id: u64) -> ObjectRef {
        ObjectRef::current(ObjectId(id))
    }

    #[test]
    fn insert_and_resolve() {
        let mut memo = IdentityMemo::new();
        assert!(memo.is_empty());
        let id = memo.insert(obj(1), obj(10));
        assert_eq!(memo.resolve(obj(1)), Some(obj(10)));
        assert_eq!(memo.resolve(obj(2)), None);
        assert_eq!(memo.entry(id).copy, obj(10));
        assert_eq!(id.index(), 0);
    }

    #[test]
    fn second_insert_keeps_first_copy() {
        let mut memo = IdentityMemo::new();
        let first = memo.insert(obj(1), obj(10));
        let second = memo.insert(obj(1), obj(11));
        assert_eq!(first, second);
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.resolve(obj(1)), Some(obj(10)));
    }

    #[test]
    fn revisions_are_separate_originals() {
        let mut memo = IdentityMemo::new();
        memo.insert(obj(1), obj(10));
        let old = ObjectRef::historic(ObjectId(1), 0);
        assert_eq!(memo.resolve(old), None);
    }

    #[test]
    fn pass_through_entry() {
        let mut memo = IdentityMemo::new();
        let id = memo.insert(obj(3), obj(3));
        assert!(memo.entry(id).is_pass_through());
        assert_eq!(memo.originals(&[id]), vec![obj(3)]);
    }
}
