//! Reference resolution - registers every reachable schema by its absolute id.
//!
//! Documents are walked once when registered. Every `$ref` and `$id` inside a
//! schema position is rewritten to its absolute form, so later stages can
//! look targets up without knowing the base they were written against.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ResolveError;
use crate::loader::{escape_pointer_segment, load_document, navigate_pointer, source_url};
use crate::types::{declared_id, Schema, SchemaId, ID_KEYS};

/// Keywords whose value is a single sub-schema.
const SCHEMA_KEYWORDS: &[&str] = &[
    "additionalItems",
    "additionalProperties",
    "not",
    "contains",
    "propertyNames",
    "if",
    "then",
    "else",
];

/// Keywords whose value is an array of sub-schemas.
const SCHEMA_ARRAY_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value maps names to sub-schemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "dependencies"];

/// Keywords whose entries are registered as named schemas.
const DEFINITION_KEYWORDS: &[&str] = &["definitions", "$defs"];

/// Registry of schema documents and the named schemas inside them.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    pending: VecDeque<Url>,
    documents: HashMap<SchemaId, Value>,
    schemas: BTreeMap<String, Schema>,
    references: BTreeSet<SchemaId>,
}

/// Where a node sits while walking a document.
#[derive(Debug, Clone)]
struct Scope {
    /// Base that relative `$ref`/`$id` values resolve against.
    base: SchemaId,
    /// Pointer id of the node below the nearest document-level `$id`.
    location: SchemaId,
    /// Pointer of the node from the root of the registered document.
    pointer: String,
}

impl Scope {
    fn descend(&self, segments: &[&str]) -> Scope {
        let suffix: String = segments
            .iter()
            .map(|s| format!("/{}", escape_pointer_segment(s)))
            .collect();
        Scope {
            base: self.base.clone(),
            location: self.location.child(&suffix),
            pointer: format!("{}{}", self.pointer, suffix),
        }
    }
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry point (file path or URL) for loading by [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::FileNotFound` for a missing file or
    /// `ResolveError::InvalidId` for a malformed URL.
    pub fn add_source(&mut self, source: &str) -> Result<(), ResolveError> {
        let url = source_url(source)?;
        debug!("queued source {}", url);
        self.pending.push_back(url);
        Ok(())
    }

    /// Register an in-memory document identified by its own `$id`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidId` if the document has no absolute id.
    pub fn register_schema(&mut self, content: Value) -> Result<SchemaId, ResolveError> {
        let id = content
            .as_object()
            .and_then(declared_id)
            .ok_or_else(|| ResolveError::InvalidId {
                id: String::new(),
                message: "in-memory schema must declare an absolute $id".to_string(),
            })?;
        let id = SchemaId::parse(id)?;
        self.register_document(content, &id)
    }

    /// Register an in-memory document loaded from `base`.
    ///
    /// A `$id` inside the document is resolved against `base`.
    pub fn register_schema_with_base(
        &mut self,
        content: Value,
        base: &str,
    ) -> Result<SchemaId, ResolveError> {
        let base = SchemaId::parse(base)?.document_id();
        self.register_document(content, &base)
    }

    /// Load every queued source and every document reachable through `$ref`.
    ///
    /// Completes fully before returning: afterwards each reference target
    /// is registered, or an error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first loading error, `ResolveError::UnresolvedReference` for
    /// a reference into an unknown document, or `ResolveError::PointerNotFound`
    /// when the pointer does not exist in its document.
    pub fn resolve(&mut self) -> Result<(), ResolveError> {
        loop {
            while let Some(url) = self.pending.pop_front() {
                let id = SchemaId::from_url(url.clone());
                if self.documents.contains_key(&id) {
                    continue;
                }
                let content = load_document(&url)?;
                self.register_document(content, &id)?;
            }

            let missing: BTreeSet<SchemaId> = self
                .references
                .iter()
                .map(SchemaId::document_id)
                .filter(|doc| !self.documents.contains_key(doc))
                .collect();
            if missing.is_empty() {
                break;
            }
            for doc in missing {
                if let Some(url) = doc.url() {
                    debug!("following reference into {}", url);
                    self.pending.push_back(url.clone());
                }
            }
        }

        let unregistered: Vec<SchemaId> = self
            .references
            .iter()
            .filter(|target| !self.schemas.contains_key(&target.absolute_id()))
            .cloned()
            .collect();
        for target in unregistered {
            let document = self.documents.get(&target.document_id()).ok_or_else(|| {
                ResolveError::UnresolvedReference {
                    reference: target.absolute_id(),
                }
            })?;
            let content = navigate_pointer(document, target.fragment()).ok_or_else(|| {
                ResolveError::PointerNotFound {
                    document: target.document_id().absolute_id(),
                    pointer: target.fragment().to_string(),
                }
            })?;
            let schema = Schema::new(target.clone(), content.clone());
            self.insert_schema(schema);
        }
        Ok(())
    }

    /// Look up the schema a (rewritten, absolute) `$ref` points to.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::UnresolvedReference` when nothing is registered
    /// under `reference`.
    pub fn dereference(&self, reference: &str) -> Result<&Schema, ResolveError> {
        let key = SchemaId::parse(reference)
            .map(|id| id.absolute_id())
            .unwrap_or_else(|_| reference.to_string());
        self.schemas
            .get(&key)
            .ok_or_else(|| ResolveError::UnresolvedReference {
                reference: reference.to_string(),
            })
    }

    /// All registered schemas, ordered by absolute id.
    pub fn registered_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    fn register_document(
        &mut self,
        mut content: Value,
        source: &SchemaId,
    ) -> Result<SchemaId, ResolveError> {
        let id = match content.as_object().and_then(declared_id) {
            Some(declared) => source.join(declared)?.document_id(),
            None => source.clone(),
        };
        debug!("registering document {}", id);

        let scope = Scope {
            base: id.clone(),
            location: id.clone(),
            pointer: String::new(),
        };
        let mut named = Vec::new();
        self.walk(&mut content, &scope, false, &mut named)?;

        self.insert_schema(Schema::new(id.clone(), content.clone()));
        for (sub_id, pointer) in named {
            if let Some(sub) = navigate_pointer(&content, &pointer) {
                if sub_id.fragment().is_empty() {
                    self.documents.insert(sub_id.clone(), sub.clone());
                }
                self.insert_schema(Schema::new(sub_id, sub.clone()));
            }
        }

        if &id != source {
            self.documents.insert(source.clone(), content.clone());
        }
        self.documents.insert(id.clone(), content);
        Ok(id)
    }

    fn insert_schema(&mut self, schema: Schema) {
        debug!("registered schema {}", schema.id);
        self.schemas.insert(schema.id.absolute_id(), schema);
    }

    /// Rewrite references below `value` and collect named sub-schemas.
    fn walk(
        &mut self,
        value: &mut Value,
        scope: &Scope,
        is_definition: bool,
        named: &mut Vec<(SchemaId, String)>,
    ) -> Result<(), ResolveError> {
        let Value::Object(map) = value else {
            return Ok(());
        };

        let mut scope = scope.clone();
        let is_root = scope.pointer.is_empty();
        match declared_id(map).map(str::to_string) {
            Some(declared) => {
                let id = scope.base.join(&declared)?;
                for key in ID_KEYS {
                    if map.get(*key).is_some_and(Value::is_string) {
                        map.insert(key.to_string(), Value::String(id.absolute_id()));
                    }
                }
                if !is_root {
                    named.push((id.clone(), scope.pointer.clone()));
                }
                if id.fragment().is_empty() {
                    scope.location = id.clone();
                }
                scope.base = id;
            }
            None if is_definition => {
                named.push((scope.location.clone(), scope.pointer.clone()));
            }
            None => {}
        }

        if let Some(reference) = map.get("$ref").and_then(Value::as_str).map(str::to_string) {
            let target = scope.base.join(&reference)?;
            map.insert("$ref".to_string(), Value::String(target.absolute_id()));
            self.references.insert(target);
        }

        for (key, child) in map.iter_mut() {
            let key = key.as_str();
            if key == "items" {
                match child {
                    Value::Array(items) => {
                        for (i, item) in items.iter_mut().enumerate() {
                            let index = i.to_string();
                            self.walk(item, &scope.descend(&[key, index.as_str()]), false, named)?;
                        }
                    }
                    other => self.walk(other, &scope.descend(&[key]), false, named)?,
                }
            } else if SCHEMA_KEYWORDS.contains(&key) {
                self.walk(child, &scope.descend(&[key]), false, named)?;
            } else if SCHEMA_ARRAY_KEYWORDS.contains(&key) {
                if let Value::Array(items) = child {
                    for (i, item) in items.iter_mut().enumerate() {
                        let index = i.to_string();
                        self.walk(item, &scope.descend(&[key, index.as_str()]), false, named)?;
                    }
                }
            } else if SCHEMA_MAP_KEYWORDS.contains(&key) || DEFINITION_KEYWORDS.contains(&key) {
                let is_definition = DEFINITION_KEYWORDS.contains(&key);
                if let Value::Object(entries) = child {
                    for (name, entry) in entries.iter_mut() {
                        self.walk(entry, &scope.descend(&[key, name.as_str()]), is_definition, named)?;
                    }
                }
            }
        }
        Ok(())
    }
}
