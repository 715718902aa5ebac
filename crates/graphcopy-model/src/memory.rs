//! In-memory object store
//!
//! [`MemoryStore`] implements [`ObjectStore`] over plain maps. It keeps a
//! versioned schema (types can be superseded or removed), historic object
//! snapshots, and a log of every preload so callers can observe batching.

use crate::ids::{ObjectId, ObjectRef, Revision, TypeRef};
use crate::schema::{HistoryType, Part, StructuredType, TypeKind};
use crate::store::{ObjectStore, PreloadTicket, StoreError};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Lifecycle of a type in the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeState {
    Live,
    Superseded(TypeRef),
    Removed,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    meta: StructuredType,
    state: TypeState,
}

#[derive(Debug, Clone)]
struct ObjectRecord {
    ty: TypeRef,
    transient: bool,
    container: Option<ObjectRef>,
    values: IndexMap<String, Value>,
    snapshots: Vec<IndexMap<String, Value>>,
}

/// One recorded preload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRecord {
    /// Objects covered by the preload
    pub objects: Vec<ObjectRef>,

    /// Parts covered by the preload
    pub parts: Vec<String>,
}

/// In-memory [`ObjectStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    types: Vec<TypeEntry>,
    type_names: HashMap<String, TypeRef>,
    objects: Vec<ObjectRecord>,
    preloads: Vec<PreloadRecord>,
    open: HashSet<u64>,
    next_ticket: u64,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start defining a new type
    pub fn define(&mut self, name: impl Into<String>, kind: TypeKind) -> TypeBuilder<'_> {
        let id = TypeRef(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        TypeBuilder {
            store: self,
            meta: StructuredType {
                id,
                name: name.into(),
                kind,
                parts: Vec::new(),
            },
        }
    }

    /// Define types from a JSON schema document
    ///
    /// The document is an array of type specs; `extends` may only name types
    /// defined earlier (in the store or in the document).
    ///
    /// # Errors
    /// Returns error on malformed JSON, unknown history tags, unknown
    /// supertypes or duplicate names
    pub fn define_json(&mut self, json: &str) -> Result<Vec<TypeRef>, StoreError> {
        let specs: Vec<TypeSpec> = serde_json::from_str(json)?;
        let mut defined = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut builder = self.define(spec.name, spec.kind);
            if let Some(parent) = spec.extends {
                let parent = builder
                    .store
                    .type_named(&parent)
                    .ok_or_else(|| StoreError::InvalidSchema(format!("unknown supertype '{parent}'")))?;
                builder = builder.extends(parent)?;
            }
            for part in spec.parts {
                builder = match part.kind {
                    PartSpecKind::Property => builder.property(part.name),
                    PartSpecKind::Reference { history } => builder.reference(part.name, history),
                    PartSpecKind::Composition => builder.composition(part.name),
                };
                if part.derived {
                    builder = builder.derive_last();
                }
            }
            defined.push(builder.build()?);
        }
        Ok(defined)
    }

    /// Lookup type by name
    #[must_use]
    pub fn type_named(&self, name: &str) -> Option<TypeRef> {
        self.type_names.get(name).copied()
    }

    /// Replace `old` by `new` as the live version
    ///
    /// # Errors
    /// Returns error if either type is unknown
    pub fn supersede_type(&mut self, old: TypeRef, new: TypeRef) -> Result<(), StoreError> {
        self.entry(new)?;
        self.entry_mut(old)?.state = TypeState::Superseded(new);
        tracing::debug!(%old, %new, "type superseded");
        Ok(())
    }

    /// Remove a type from the live model; its instances stay readable
    ///
    /// # Errors
    /// Returns error if the type is unknown
    pub fn remove_type(&mut self, ty: TypeRef) -> Result<(), StoreError> {
        self.entry_mut(ty)?.state = TypeState::Removed;
        tracing::debug!(%ty, "type removed");
        Ok(())
    }

    /// Create a persistent, uncontained instance
    ///
    /// # Errors
    /// Returns error if `ty` cannot be instantiated
    pub fn create(&mut self, ty: TypeRef) -> Result<ObjectRef, StoreError> {
        self.insert_object(ty, false, None)
    }

    /// Create a literal of an enumeration type
    ///
    /// # Errors
    /// Returns error if `ty` is not an enumeration
    pub fn create_literal(&mut self, ty: TypeRef) -> Result<ObjectRef, StoreError> {
        if self.entry(ty)?.meta.kind != TypeKind::Enumeration {
            return Err(StoreError::NotInstantiable(ty));
        }
        Ok(self.push_object(ty, false, None))
    }

    /// Create a persistent instance and set its values
    ///
    /// # Errors
    /// Returns error if `ty` cannot be instantiated or a part is unknown
    pub fn create_with(
        &mut self,
        ty: TypeRef,
        values: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Result<ObjectRef, StoreError> {
        let obj = self.create(ty)?;
        for (part, value) in values {
            self.set(obj, part, value)?;
        }
        Ok(obj)
    }

    /// Freeze the live values of an object into a historic revision
    ///
    /// # Errors
    /// Returns error if the object is unknown
    pub fn snapshot(&mut self, obj: ObjectRef) -> Result<ObjectRef, StoreError> {
        let record = self.record_mut(obj)?;
        let revision = u32::try_from(record.snapshots.len())
            .map_err(|_| StoreError::ReadOnlyRevision(obj))?;
        let frozen = record.values.clone();
        record.snapshots.push(frozen);
        Ok(ObjectRef::historic(obj.id, revision))
    }

    /// Container an object was allocated under
    #[must_use]
    pub fn container_of(&self, obj: ObjectRef) -> Option<ObjectRef> {
        self.record(obj).ok().and_then(|r| r.container)
    }

    /// Number of objects ever created
    #[inline]
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All preload calls so far
    #[inline]
    #[must_use]
    pub fn preloads(&self) -> &[PreloadRecord] {
        &self.preloads
    }

    /// Number of preloads opened but not yet released
    #[inline]
    #[must_use]
    pub fn open_preloads(&self) -> usize {
        self.open.len()
    }

    /// Forget recorded preloads
    pub fn clear_preloads(&mut self) {
        self.preloads.clear();
    }

    fn entry(&self, ty: TypeRef) -> Result<&TypeEntry, StoreError> {
        self.types
            .get(ty.0 as usize)
            .ok_or(StoreError::UnknownType(ty))
    }

    fn entry_mut(&mut self, ty: TypeRef) -> Result<&mut TypeEntry, StoreError> {
        self.types
            .get_mut(ty.0 as usize)
            .ok_or(StoreError::UnknownType(ty))
    }

    fn record(&self, obj: ObjectRef) -> Result<&ObjectRecord, StoreError> {
        usize::try_from(obj.id.0)
            .ok()
            .and_then(|idx| self.objects.get(idx))
            .ok_or(StoreError::UnknownObject(obj))
    }

    fn record_mut(&mut self, obj: ObjectRef) -> Result<&mut ObjectRecord, StoreError> {
        usize::try_from(obj.id.0)
            .ok()
            .and_then(|idx| self.objects.get_mut(idx))
            .ok_or(StoreError::UnknownObject(obj))
    }

    fn insert_object(
        &mut self,
        ty: TypeRef,
        transient: bool,
        container: Option<ObjectRef>,
    ) -> Result<ObjectRef, StoreError> {
        let entry = self.entry(ty)?;
        if entry.meta.kind != TypeKind::Class || entry.state == TypeState::Removed {
            return Err(StoreError::NotInstantiable(ty));
        }
        Ok(self.push_object(ty, transient, container))
    }

    fn push_object(
        &mut self,
        ty: TypeRef,
        transient: bool,
        container: Option<ObjectRef>,
    ) -> ObjectRef {
        let id = ObjectId(self.objects.len() as u64);
        self.objects.push(ObjectRecord {
            ty,
            transient,
            container,
            values: IndexMap::new(),
            snapshots: Vec::new(),
        });
        ObjectRef::current(id)
    }

    fn register(&mut self, meta: StructuredType) -> Result<TypeRef, StoreError> {
        if self.type_names.contains_key(&meta.name) {
            return Err(StoreError::InvalidSchema(format!(
                "duplicate type '{}'",
                meta.name
            )));
        }
        let mut seen = HashSet::new();
        for part in &meta.parts {
            if !seen.insert(part.name.as_str()) {
                return Err(StoreError::InvalidSchema(format!(
                    "duplicate part '{}' in '{}'",
                    part.name, meta.name
                )));
            }
        }
        let id = meta.id;
        self.type_names.insert(meta.name.clone(), id);
        self.types.push(TypeEntry {
            meta,
            state: TypeState::Live,
        });
        Ok(id)
    }
}

impl ObjectStore for MemoryStore {
    fn structured_type(&self, ty: TypeRef) -> Result<&StructuredType, StoreError> {
        self.entry(ty).map(|e| &e.meta)
    }

    fn current_type(&self, ty: TypeRef) -> Result<Option<TypeRef>, StoreError> {
        let mut current = ty;
        // Supersede chains are acyclic only if callers keep them so.
        for _ in 0..=self.types.len() {
            match self.entry(current)?.state {
                TypeState::Live => return Ok(Some(current)),
                TypeState::Removed => return Ok(None),
                TypeState::Superseded(next) => current = next,
            }
        }
        Err(StoreError::InvalidSchema(format!(
            "supersede cycle through {ty}"
        )))
    }

    fn type_of(&self, obj: ObjectRef) -> Result<TypeRef, StoreError> {
        self.record(obj).map(|r| r.ty)
    }

    fn is_transient(&self, obj: ObjectRef) -> Result<bool, StoreError> {
        self.record(obj).map(|r| r.transient)
    }

    fn get(&self, obj: ObjectRef, part: &str) -> Result<Value, StoreError> {
        let record = self.record(obj)?;
        if self.entry(record.ty)?.meta.part(part).is_none() {
            return Err(StoreError::UnknownPart {
                ty: record.ty,
                part: part.to_string(),
            });
        }
        let values = match obj.revision {
            Revision::Current => &record.values,
            Revision::Historic(rev) => record
                .snapshots
                .get(rev as usize)
                .ok_or(StoreError::UnknownObject(obj))?,
        };
        Ok(values.get(part).cloned().unwrap_or_default())
    }

    fn set(&mut self, obj: ObjectRef, part: &str, value: Value) -> Result<(), StoreError> {
        if !obj.is_current() {
            return Err(StoreError::ReadOnlyRevision(obj));
        }
        let ty = self.record(obj)?.ty;
        match self.entry(ty)?.meta.part(part) {
            None => {
                return Err(StoreError::UnknownPart {
                    ty,
                    part: part.to_string(),
                })
            }
            Some(p) if p.derived => {
                return Err(StoreError::DerivedPart {
                    ty,
                    part: part.to_string(),
                })
            }
            Some(_) => {}
        }
        self.record_mut(obj)?.values.insert(part.to_string(), value);
        Ok(())
    }

    fn allocate(
        &mut self,
        ty: TypeRef,
        transient: bool,
        container: Option<ObjectRef>,
    ) -> Result<ObjectRef, StoreError> {
        self.insert_object(ty, transient, container)
    }

    fn current_version(&self, obj: ObjectRef) -> Result<ObjectRef, StoreError> {
        self.record(obj)?;
        Ok(obj.to_current())
    }

    fn preload(
        &mut self,
        objects: &[ObjectRef],
        parts: &[&str],
    ) -> Result<PreloadTicket, StoreError> {
        for obj in objects {
            self.record(*obj)?;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.open.insert(ticket);
        self.preloads.push(PreloadRecord {
            objects: objects.to_vec(),
            parts: parts.iter().map(|p| (*p).to_string()).collect(),
        });
        tracing::trace!(ticket, objects = objects.len(), ?parts, "preload opened");
        Ok(PreloadTicket(ticket))
    }

    fn release(&mut self, ticket: PreloadTicket) {
        if !self.open.remove(&ticket.0) {
            tracing::warn!(ticket = ticket.0, "release of unknown preload");
        }
    }
}

/// Builder for a new type, see [`MemoryStore::define`]
#[derive(Debug)]
pub struct TypeBuilder<'a> {
    store: &'a mut MemoryStore,
    meta: StructuredType,
}

impl TypeBuilder<'_> {
    /// Inherit all parts of `parent`, keeping their declaring type
    ///
    /// # Errors
    /// Returns error if `parent` is unknown
    pub fn extends(mut self, parent: TypeRef) -> Result<Self, StoreError> {
        let inherited = self.store.entry(parent)?.meta.parts.clone();
        self.meta.parts.extend(inherited);
        Ok(self)
    }

    /// Add a property
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        let part = Part::property(self.meta.id, name);
        self.meta.parts.push(part);
        self
    }

    /// Add a derived property
    #[must_use]
    pub fn derived_property(self, name: impl Into<String>) -> Self {
        self.property(name).derive_last()
    }

    /// Add a non-owning reference
    #[must_use]
    pub fn reference(mut self, name: impl Into<String>, history: HistoryType) -> Self {
        let part = Part::reference(self.meta.id, name, history);
        self.meta.parts.push(part);
        self
    }

    /// Add a composition reference
    #[must_use]
    pub fn composition(mut self, name: impl Into<String>) -> Self {
        let part = Part::composition(self.meta.id, name);
        self.meta.parts.push(part);
        self
    }

    /// Register the type
    ///
    /// # Errors
    /// Returns error on duplicate type or part names
    pub fn build(self) -> Result<TypeRef, StoreError> {
        self.store.register(self.meta)
    }

    fn derive_last(mut self) -> Self {
        if let Some(last) = self.meta.parts.last_mut() {
            last.derived = true;
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct TypeSpec {
    name: String,
    kind: TypeKind,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    parts: Vec<PartSpec>,
}

#[derive(Debug, Deserialize)]
struct PartSpec {
    name: String,
    #[serde(default)]
    derived: bool,
    #[serde(flatten)]
    kind: PartSpecKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PartSpecKind {
    Property,
    Reference { history: HistoryType },
    Composition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PreloadScope;
    use pretty_assertions::assert_eq;

    fn folder_schema(store: &mut MemoryStore) -> TypeRef {
        store
            .define("Folder", TypeKind::Class)
            .property("name")
            .derived_property("size")
            .composition("children")
            .build()
            .unwrap()
    }

    #[test]
    fn define_and_lookup_type() {
        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        assert_eq!(store.type_named("Folder"), Some(folder));
        let meta = store.structured_type(folder).unwrap();
        assert_eq!(meta.parts.len(), 3);
        assert!(meta.part("size").unwrap().derived);
        assert!(meta.part("children").unwrap().is_composition());
    }

    #[test]
    fn duplicate_type_rejected() {
        let mut store = MemoryStore::new();
        folder_schema(&mut store);
        let again = store.define("Folder", TypeKind::Class).build();
        assert!(matches!(again, Err(StoreError::InvalidSchema(_))));
    }

    #[test]
    fn extends_keeps_declaring_type() {
        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        let special = store
            .define("SpecialFolder", TypeKind::Class)
            .extends(folder)
            .unwrap()
            .property("color")
            .build()
            .unwrap();
        let meta = store.structured_type(special).unwrap();
        assert_eq!(meta.part("name").unwrap().declaring, folder);
        assert_eq!(meta.part("color").unwrap().declaring, special);
    }

    #[test]
    fn get_and_set_values() {
        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        let obj = store.create(folder).unwrap();
        assert_eq!(store.get(obj, "name").unwrap(), Value::Null);
        store.set(obj, "name", "docs".into()).unwrap();
        assert_eq!(store.get(obj, "name").unwrap(), Value::from("docs"));
        assert!(matches!(
            store.get(obj, "missing"),
            Err(StoreError::UnknownPart { .. })
        ));
        assert!(matches!(
            store.set(obj, "size", Value::Int(3)),
            Err(StoreError::DerivedPart { .. })
        ));
    }

    #[test]
    fn snapshot_is_frozen_and_read_only() {
        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        let obj = store.create(folder).unwrap();
        store.set(obj, "name", "v1".into()).unwrap();
        let old = store.snapshot(obj).unwrap();
        store.set(obj, "name", "v2".into()).unwrap();

        assert_eq!(store.get(old, "name").unwrap(), Value::from("v1"));
        assert_eq!(store.get(obj, "name").unwrap(), Value::from("v2"));
        assert_eq!(store.current_version(old).unwrap(), obj);
        assert!(matches!(
            store.set(old, "name", "v3".into()),
            Err(StoreError::ReadOnlyRevision(_))
        ));
    }

    #[test]
    fn current_type_follows_supersede_and_removal() {
        let mut store = MemoryStore::new();
        let v1 = folder_schema(&mut store);
        let v2 = store
            .define("Folder2", TypeKind::Class)
            .property("name")
            .build()
            .unwrap();
        assert_eq!(store.current_type(v1).unwrap(), Some(v1));
        store.supersede_type(v1, v2).unwrap();
        assert_eq!(store.current_type(v1).unwrap(), Some(v2));
        store.remove_type(v2).unwrap();
        assert_eq!(store.current_type(v1).unwrap(), None);
    }

    #[test]
    fn enumeration_not_instantiable_by_allocate() {
        let mut store = MemoryStore::new();
        let color = store.define("Color", TypeKind::Enumeration).build().unwrap();
        assert!(matches!(
            store.allocate(color, false, None),
            Err(StoreError::NotInstantiable(_))
        ));
        let red = store.create_literal(color).unwrap();
        assert_eq!(store.type_of(red).unwrap(), color);
        let folder = folder_schema(&mut store);
        assert!(store.create_literal(folder).is_err());
    }

    #[test]
    fn preload_scope_releases_on_drop() {
        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        let obj = store.create(folder).unwrap();
        {
            let scope = PreloadScope::open(&mut store, &[obj], &["name"]).unwrap();
            assert!(scope.is_loaded());
            assert_eq!(scope.open_preloads(), 1);
            assert_eq!(scope.get(obj, "name").unwrap(), Value::Null);
        }
        assert_eq!(store.open_preloads(), 0);
        assert_eq!(
            store.preloads(),
            &[PreloadRecord {
                objects: vec![obj],
                parts: vec!["name".to_string()],
            }]
        );
    }

    #[test]
    fn preload_scope_releases_on_error_path() {
        fn read_missing(store: &mut MemoryStore, obj: ObjectRef) -> Result<Value, StoreError> {
            let scope = PreloadScope::open(store, &[obj], &["missing"])?;
            scope.get(obj, "missing")
        }

        let mut store = MemoryStore::new();
        let folder = folder_schema(&mut store);
        let obj = store.create(folder).unwrap();
        assert!(read_missing(&mut store, obj).is_err());
        assert_eq!(store.open_preloads(), 0);
    }

    #[test]
    fn define_json_schema() {
        let mut store = MemoryStore::new();
        let defined = store
            .define_json(
                r#"[
                    {"name": "Person", "kind": "class", "parts": [
                        {"name": "name", "kind": "property"}
                    ]},
                    {"name": "Document", "kind": "class", "parts": [
                        {"name": "title", "kind": "property"},
                        {"name": "words", "kind": "property", "derived": true},
                        {"name": "author", "kind": "reference", "history": "current"},
                        {"name": "pages", "kind": "composition"}
                    ]},
                    {"name": "Report", "kind": "class", "extends": "Document"}
                ]"#,
            )
            .unwrap();
        assert_eq!(defined.len(), 3);
        let report = store.structured_type(defined[2]).unwrap();
        assert_eq!(report.parts.len(), 4);
        assert!(report.part("words").unwrap().derived);
        assert_eq!(report.part("author").unwrap().declaring, defined[1]);
    }

    #[test]
    fn define_json_rejects_unknown_history_type() {
        let mut store = MemoryStore::new();
        let result = store.define_json(
            r#"[{"name": "Doc", "kind": "class", "parts": [
                {"name": "author", "kind": "reference", "history": "eventually"}
            ]}]"#,
        );
        assert!(matches!(result, Err(StoreError::Json(_))));
        assert_eq!(store.type_named("Doc"), None);
    }
}
