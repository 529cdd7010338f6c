//! JSON Schema to TypeScript declarations
//!
//! Turns a set of JSON Schema documents into a TypeScript declaration file
//! (`.d.ts`): one type or interface per identified schema, grouped into
//! nested namespaces derived from each schema's id.
//!
//! # Example
//!
//! ```
//! use schema_dts::{generate, ReferenceResolver};
//! use serde_json::json;
//!
//! let mut resolver = ReferenceResolver::new();
//! resolver
//!     .register_schema(json!({
//!         "$id": "https://example.com/person.json",
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string" },
//!             "age": { "type": "integer" }
//!         },
//!         "required": ["name"]
//!     }))
//!     .unwrap();
//! resolver.resolve().unwrap();
//!
//! let dts = generate(&resolver).unwrap();
//! assert!(dts.contains("export interface Person {"));
//! assert!(dts.contains("name: string;"));
//! assert!(dts.contains("age?: number;"));
//! ```
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Resolve | `resolver` | every reachable document loaded, refs absolute |
//! | Normalize | `normalize` | `allOf` merged, `nullable` folded, types reduced |
//! | Map | `namespace` | schemas grouped by type-name path |
//! | Synthesize | `synth` | a `TypeExpression` per declaration |
//! | Emit | `emitter` | declaration text |
//!
//! Generation is all-or-nothing: any unresolved reference or unknown type
//! aborts with an error and no output.

mod config;
mod docs;
mod emitter;
mod error;
mod loader;
mod namespace;
mod normalize;
mod resolver;
mod synth;
mod types;

pub use config::{load_config, GeneratorConfig};
pub use docs::Documentation;
pub use emitter::{emit, render_expression};
pub use error::{ConfigError, GenerateError, ResolveError};
pub use loader::{is_url, load_schema, load_schema_str, navigate_pointer};
pub use namespace::{build_namespace_tree, NamespaceNode};
pub use normalize::normalize;
pub use resolver::ReferenceResolver;
pub use synth::{
    is_type_alias, Declaration, Literal, Member, MemberKey, Synthesizer, TupleElement,
    TypeExpression,
};
pub use types::{NormalizedSchema, Primitive, Schema, SchemaId};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;

/// Render declarations for every schema registered in a resolved resolver.
///
/// # Errors
///
/// Returns the first `GenerateError` met; no partial output is produced.
pub fn generate(resolver: &ReferenceResolver) -> Result<String, GenerateError> {
    let tree = build_namespace_tree(resolver.registered_schemas().values());
    emit(resolver, &tree)
}

/// Load and resolve `sources` (file paths or URLs), then generate.
///
/// # Errors
///
/// Returns `GenerateError::Resolve` when a source or reference cannot be
/// loaded, otherwise whatever [`generate`] returns.
pub fn generate_from_sources<S: AsRef<str>>(sources: &[S]) -> Result<String, GenerateError> {
    let mut resolver = ReferenceResolver::new();
    for source in sources {
        resolver.add_source(source.as_ref())?;
    }
    resolver.resolve()?;
    generate(&resolver)
}
