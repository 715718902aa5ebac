//! Batch scheduler
//!
//! Pending work is grouped so one bulk preload covers a whole batch:
//! descend batches per composition reference, value batches per
//! [`AttributeKey`]. Both maps keep insertion order, which makes the drain
//! order deterministic.

use crate::attributes::{AttributeKey, CopyAttributes};
use crate::memo::EntryId;
use graphcopy_model::{Part, PartKey};
use indexmap::IndexMap;
use std::rc::Rc;

/// Originals whose children under one composition reference are pending
#[derive(Debug, Clone)]
pub struct DescendBatch {
    /// Composition reference to read
    pub reference: Part,

    /// Entries to descend from
    pub entries: Vec<EntryId>,
}

/// Originals whose plain parts are pending
#[derive(Debug, Clone)]
pub struct ValueBatch {
    /// Shared classification of all entries
    pub attributes: Rc<CopyAttributes>,

    /// Entries to populate
    pub entries: Vec<EntryId>,
}

/// Pending descend work of one drain round
pub type DescendRound = IndexMap<PartKey, DescendBatch>;

/// Pending value work
pub type ValueRound = IndexMap<AttributeKey, ValueBatch>;

/// Queue of pending batches
#[derive(Debug, Default)]
pub struct BatchScheduler {
    descend: DescendRound,
    values: ValueRound,
}

impl BatchScheduler {
    /// Create empty scheduler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule descent and population of a freshly allocated copy
    pub fn enqueue(&mut self, entry: EntryId, key: AttributeKey, attributes: &Rc<CopyAttributes>) {
        for reference in attributes.compositions() {
            self.descend
                .entry(reference.key())
                .or_insert_with(|| DescendBatch {
                    reference: reference.clone(),
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }
        if !attributes.plain().is_empty() {
            self.values
                .entry(key)
                .or_insert_with(|| ValueBatch {
                    attributes: Rc::clone(attributes),
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }
    }

    /// Take all pending descend batches, leaving none
    ///
    /// Batches enqueued while the returned round is processed go into the
    /// next round.
    #[inline]
    pub fn take_descend(&mut self) -> DescendRound {
        std::mem::take(&mut self.descend)
    }

    /// Take all pending value batches, leaving none
    #[inline]
    pub fn take_values(&mut self) -> ValueRound {
        std::mem::take(&mut self.values)
    }

    /// Check if descent work is pending
    #[inline]
    #[must_use]
    pub fn has_descend(&self) -> bool {
        !self.descend.is_empty()
    }

    /// Check if nothing is pending
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.descend.is_empty() && self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::IdentityMemo;
    use graphcopy_model::{ObjectId, ObjectRef, StructuredType, TypeKind, TypeRef};

    fn folder_attributes() -> Rc<CopyAttributes> {
        let ty = TypeRef(0);
        let meta = StructuredType {
            id: ty,
            name: "Folder".to_string(),
            kind: TypeKind::Class,
            parts: vec![
                Part::property(ty, "name"),
                Part::composition(ty, "documents"),
                Part::composition(ty, "folders"),
            ],
        };
        Rc::new(CopyAttributes::classify(&meta, &meta))
    }

    fn entries(n: u64) -> Vec<EntryId> {
        let mut memo = IdentityMemo::new();
        (0..n)
            .map(|i| {
                let obj = ObjectRef::current(ObjectId(i));
                memo.insert(obj, obj)
            })
            .collect()
    }

    #[test]
    fn enqueue_groups_by_reference_and_type() {
        let attrs = folder_attributes();
        let key = AttributeKey::new(TypeRef(0), TypeRef(0));
        let mut scheduler = BatchScheduler::new();
        for entry in entries(3) {
            scheduler.enqueue(entry, key, &attrs);
        }

        let descend = scheduler.take_descend();
        assert_eq!(descend.len(), 2);
        let names: Vec<_> = descend.keys().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["documents", "folders"]);
        assert!(descend.values().all(|b| b.entries.len() == 3));

        let values = scheduler.take_values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[&key].entries.len(), 3);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn take_descend_leaves_values() {
        let attrs = folder_attributes();
        let key = AttributeKey::new(TypeRef(0), TypeRef(0));
        let mut scheduler = BatchScheduler::new();
        scheduler.enqueue(entries(1)[0], key, &attrs);
        assert!(scheduler.has_descend());
        scheduler.take_descend();
        assert!(!scheduler.has_descend());
        assert!(!scheduler.is_idle());
    }

    #[test]
    fn no_value_batch_without_plain_parts() {
        let attrs = Rc::new(CopyAttributes::default());
        let key = AttributeKey::new(TypeRef(1), TypeRef(1));
        let mut scheduler = BatchScheduler::new();
        scheduler.enqueue(entries(1)[0], key, &attrs);
        assert!(scheduler.is_idle());
    }
}
