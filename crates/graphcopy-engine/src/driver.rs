//! Shared copy machinery: allocation, descent, population
//!
//! [`OperationCore`] owns all per-operation state. The store is passed into
//! every call so that a [`PreloadScope`] can stand in for it while a batch
//! is being read.

use crate::attributes::{AttributeCache, AttributeKey};
use crate::batch::{BatchScheduler, DescendBatch, ValueBatch};
use crate::context::CopyContext;
use crate::error::CopyError;
use crate::hooks::{AcceptAll, CopyConstructor, CopyFilter, DefaultConstructor};
use crate::memo::{IdentityMemo, MemoEntry};
use crate::options::{CopyOptions, CopyStats};
use graphcopy_model::{HistoryType, ObjectRef, ObjectStore, PartKind, PreloadScope, Value};
use indexmap::IndexSet;

pub(crate) struct OperationCore<'h> {
    memo: IdentityMemo,
    attributes: AttributeCache,
    scheduler: BatchScheduler,
    stats: CopyStats,
    pub(crate) options: CopyOptions,
    pub(crate) filter: Box<dyn CopyFilter + 'h>,
    pub(crate) constructor: Box<dyn CopyConstructor + 'h>,
}

impl<'h> OperationCore<'h> {
    pub(crate) fn new() -> Self {
        Self {
            memo: IdentityMemo::new(),
            attributes: AttributeCache::new(),
            scheduler: BatchScheduler::new(),
            stats: CopyStats::default(),
            options: CopyOptions::default(),
            filter: Box::new(AcceptAll),
            constructor: Box::new(DefaultConstructor),
        }
    }

    pub(crate) fn resolve(&self, orig: ObjectRef) -> Option<ObjectRef> {
        self.memo.resolve(orig)
    }

    pub(crate) fn stats(&self) -> CopyStats {
        self.stats
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &MemoEntry> {
        self.memo.iter()
    }

    pub(crate) fn has_started(&self) -> bool {
        !self.memo.is_empty()
    }

    /// Copy of `orig`, allocated and scheduled on first sight
    pub(crate) fn create_copy(
        &mut self,
        store: &mut dyn ObjectStore,
        orig: ObjectRef,
        context: &CopyContext,
    ) -> Result<ObjectRef, CopyError> {
        if let Some(copy) = self.memo.resolve(orig) {
            return Ok(copy);
        }

        let copy = match self.constructor.allocate(orig, context, store)? {
            Some(copy) => copy,
            None => self.default_allocate(store, orig, context)?,
        };

        let entry = self.memo.insert(orig, copy);
        self.stats.originals += 1;
        if copy == orig {
            self.stats.passed_through += 1;
            tracing::trace!(%orig, "original kept as its own copy");
            return Ok(copy);
        }

        self.stats.allocated += 1;
        let key = AttributeKey::new(store.type_of(orig)?, store.type_of(copy)?);
        let attributes = self.attributes.get_or_classify(store, key)?;
        self.scheduler.enqueue(entry, key, &attributes);
        tracing::trace!(%orig, %copy, %key, "allocated copy");
        Ok(copy)
    }

    fn default_allocate(
        &self,
        store: &mut dyn ObjectStore,
        orig: ObjectRef,
        context: &CopyContext,
    ) -> Result<ObjectRef, CopyError> {
        let ty = store.type_of(orig)?;
        if !store.structured_type(ty)?.is_class() {
            return Ok(orig);
        }
        let Some(current) = store.current_type(ty)? else {
            tracing::debug!(%orig, %ty, "type no longer exists, keeping original");
            return Ok(orig);
        };
        let transient = match self.options.transient {
            Some(transient) => transient,
            None => store.is_transient(orig)?,
        };
        Ok(store.allocate(current, transient, context.container)?)
    }

    /// Copy every object in `value`, keeping the collection category
    pub(crate) fn copy_value(
        &mut self,
        store: &mut dyn ObjectStore,
        value: &Value,
        context: &CopyContext,
    ) -> Result<Value, CopyError> {
        Ok(match value {
            Value::Object(orig) => Value::Object(self.create_copy(store, *orig, context)?),
            Value::List(items) => {
                let mut copied = Vec::with_capacity(items.len());
                for item in items {
                    copied.push(self.copy_value(store, item, context)?);
                }
                Value::List(copied)
            }
            Value::Set(items) => {
                let mut copied = IndexSet::with_capacity(items.len());
                for item in items {
                    copied.insert(self.copy_value(store, item, context)?);
                }
                Value::Set(copied)
            }
            other => other.clone(),
        })
    }

    /// Point references at copies, or apply `history` to uncopied targets
    fn rewrite_reference(
        &self,
        store: &dyn ObjectStore,
        value: &Value,
        history: HistoryType,
    ) -> Result<Value, CopyError> {
        Ok(match value {
            Value::Object(target) => Value::Object(self.rewrite_target(store, *target, history)?),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.rewrite_reference(store, item, history))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Set(items) => Value::Set(
                items
                    .iter()
                    .map(|item| self.rewrite_reference(store, item, history))
                    .collect::<Result<_, _>>()?,
            ),
            other => other.clone(),
        })
    }

    fn rewrite_target(
        &self,
        store: &dyn ObjectStore,
        target: ObjectRef,
        history: HistoryType,
    ) -> Result<ObjectRef, CopyError> {
        if let Some(copy) = self.memo.resolve(target) {
            return Ok(copy);
        }
        match history {
            HistoryType::Historic | HistoryType::Mixed => Ok(target),
            HistoryType::Current => Ok(store.current_version(target)?),
        }
    }

    /// Drain all pending batches
    ///
    /// Composition descent runs round by round until no new children show
    /// up; plain parts are populated only after that, once per value batch.
    pub(crate) fn finish(&mut self, store: &mut dyn ObjectStore) -> Result<(), CopyError> {
        if self.scheduler.is_idle() {
            return Ok(());
        }
        loop {
            while self.scheduler.has_descend() {
                let round = self.scheduler.take_descend();
                self.stats.rounds += 1;
                tracing::debug!(
                    round = self.stats.rounds,
                    batches = round.len(),
                    "descending composition round"
                );
                for batch in round.into_values() {
                    self.descend(store, batch)?;
                }
            }

            let values = self.scheduler.take_values();
            if values.is_empty() {
                break;
            }
            for (key, batch) in values {
                self.populate(store, key, batch)?;
            }
        }
        tracing::debug!(stats = ?self.stats, "copy drained");
        Ok(())
    }

    fn descend(&mut self, store: &mut dyn ObjectStore, batch: DescendBatch) -> Result<(), CopyError> {
        let name = batch.reference.name.as_str();
        let relation = batch.reference.key();
        let originals = self.memo.originals(&batch.entries);
        tracing::debug!(reference = %relation, objects = originals.len(), "descending batch");

        let mut scope = open_scope(
            store,
            self.options.preload,
            &mut self.stats,
            &originals,
            &[name],
        )?;
        self.stats.descend_batches += 1;

        for &id in &batch.entries {
            let entry = self.memo.entry(id);
            let value = scope.get(entry.original, name)?;
            if !self.filter.accept(&batch.reference, &value, entry.original) {
                continue;
            }
            let context = CopyContext::within(entry.copy, relation.clone());
            let copied = self.copy_value(&mut *scope, &value, &context)?;
            scope.set(entry.copy, name, copied)?;
        }
        Ok(())
    }

    fn populate(
        &mut self,
        store: &mut dyn ObjectStore,
        key: AttributeKey,
        batch: ValueBatch,
    ) -> Result<(), CopyError> {
        let attributes = batch.attributes;
        let names = attributes.plain_names();
        let originals = self.memo.originals(&batch.entries);
        tracing::debug!(%key, objects = originals.len(), parts = names.len(), "populating batch");

        let mut scope = open_scope(
            store,
            self.options.preload,
            &mut self.stats,
            &originals,
            &names,
        )?;
        self.stats.value_batches += 1;

        for &id in &batch.entries {
            let entry = self.memo.entry(id);
            for part in attributes.plain() {
                let value = scope.get(entry.original, &part.name)?;
                if !self.filter.accept(part, &value, entry.original) {
                    continue;
                }
                let copied = match part.kind {
                    PartKind::Property => value,
                    PartKind::Reference { history, .. } => {
                        self.rewrite_reference(&*scope, &value, history)?
                    }
                };
                scope.set(entry.copy, &part.name, copied)?;
            }
        }
        Ok(())
    }
}

fn open_scope<'a>(
    store: &'a mut dyn ObjectStore,
    preload: bool,
    stats: &mut CopyStats,
    objects: &[ObjectRef],
    parts: &[&str],
) -> Result<PreloadScope<'a, dyn ObjectStore + 'a>, CopyError> {
    if !preload || objects.is_empty() {
        return Ok(PreloadScope::unloaded(store));
    }
    let scope = PreloadScope::open(store, objects, parts)?;
    stats.preloads += 1;
    Ok(scope)
}
