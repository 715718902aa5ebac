//! Testing utilities for graphcopy workspace
//!
//! Shared model fixtures and tracing setup.

#![allow(missing_docs)]

use graphcopy_model::{HistoryType, MemoryStore, ObjectRef, ObjectStore, TypeKind, TypeRef, Value};
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG`; repeated calls are harmless
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Types of the document library fixture
///
/// - `Person { name }`
/// - `Category` enumeration with literals `Draft` and `Final`
/// - `Folder { name, documents*, archive, owner -> Person (historic) }`
/// - `Document { title, pages (derived), folder -> Folder (mixed),
///   author -> Person (current), related -> Document* (historic),
///   category -> Category, attachments* }`
/// - `Attachment { file }`
///
/// `*` marks composition references; `archive` is a single composition.
#[derive(Debug, Clone, Copy)]
pub struct LibraryModel {
    pub person: TypeRef,
    pub category: TypeRef,
    pub folder: TypeRef,
    pub document: TypeRef,
    pub attachment: TypeRef,
    pub draft: ObjectRef,
    pub final_: ObjectRef,
}

pub fn library_model(store: &mut MemoryStore) -> LibraryModel {
    let person = store
        .define("Person", TypeKind::Class)
        .property("name")
        .build()
        .unwrap();
    let category = store
        .define("Category", TypeKind::Enumeration)
        .property("label")
        .build()
        .unwrap();
    let folder = store
        .define("Folder", TypeKind::Class)
        .property("name")
        .composition("documents")
        .composition("archive")
        .reference("owner", HistoryType::Historic)
        .build()
        .unwrap();
    let document = store
        .define("Document", TypeKind::Class)
        .property("title")
        .derived_property("pages")
        .reference("folder", HistoryType::Mixed)
        .reference("author", HistoryType::Current)
        .reference("related", HistoryType::Historic)
        .reference("category", HistoryType::Historic)
        .composition("attachments")
        .build()
        .unwrap();
    let attachment = store
        .define("Attachment", TypeKind::Class)
        .property("file")
        .build()
        .unwrap();

    let draft = literal(store, category, "Draft");
    let final_ = literal(store, category, "Final");

    LibraryModel {
        person,
        category,
        folder,
        document,
        attachment,
        draft,
        final_,
    }
}

fn literal(store: &mut MemoryStore, category: TypeRef, label: &str) -> ObjectRef {
    let obj = store.create_literal(category).unwrap();
    store.set(obj, "label", Value::from(label)).unwrap();
    obj
}

pub fn person(store: &mut MemoryStore, model: &LibraryModel, name: &str) -> ObjectRef {
    store
        .create_with(model.person, [("name", Value::from(name))])
        .unwrap()
}

pub fn document(store: &mut MemoryStore, model: &LibraryModel, title: &str) -> ObjectRef {
    store
        .create_with(model.document, [("title", Value::from(title))])
        .unwrap()
}

/// Folder holding one document per title, each pointing back at the folder
pub fn folder_with_documents(
    store: &mut MemoryStore,
    model: &LibraryModel,
    name: &str,
    titles: &[&str],
) -> (ObjectRef, Vec<ObjectRef>) {
    let folder = store
        .create_with(model.folder, [("name", Value::from(name))])
        .unwrap();
    let documents: Vec<ObjectRef> = titles
        .iter()
        .map(|title| {
            let doc = document(store, model, title);
            store.set(doc, "folder", Value::Object(folder)).unwrap();
            doc
        })
        .collect();
    store
        .set(folder, "documents", Value::object_list(documents.iter().copied()))
        .unwrap();
    (folder, documents)
}

/// Object list held by a part
pub fn objects(store: &MemoryStore, obj: ObjectRef, part: &str) -> Vec<ObjectRef> {
    store.get(obj, part).unwrap().objects()
}

/// Text held by a part
pub fn text(store: &MemoryStore, obj: ObjectRef, part: &str) -> Option<String> {
    store.get(obj, part).unwrap().as_text().map(str::to_string)
}
