//! Namespace mapping - groups registered schemas by their type-name path.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::Schema;

/// A node of the namespace tree.
///
/// A node may own a schema (a declaration named after the node) and have
/// children (a nested namespace of the same name) at the same time.
/// Children are kept sorted by key.
#[derive(Debug, Default)]
pub struct NamespaceNode<'a> {
    pub schema: Option<&'a Schema>,
    pub children: BTreeMap<String, NamespaceNode<'a>>,
}

impl<'a> NamespaceNode<'a> {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Follow a path of name segments from this node.
    pub fn get(&self, path: &[&str]) -> Option<&NamespaceNode<'a>> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
    }

    fn insert(&mut self, names: &[String], schema: &'a Schema) {
        let node = names.iter().fold(self, |node, name| {
            node.children.entry(name.clone()).or_default()
        });
        if let Some(previous) = node.schema.replace(schema) {
            warn!(
                "{} and {} map to the same name {}; keeping {}",
                previous.id,
                schema.id,
                names.join("."),
                schema.id
            );
        }
    }
}

/// Build the namespace tree for a set of schemas.
///
/// Schemas whose id yields no type name (including anonymous ones) are skipped.
pub fn build_namespace_tree<'a, I>(schemas: I) -> NamespaceNode<'a>
where
    I: IntoIterator<Item = &'a Schema>,
{
    let mut root = NamespaceNode::default();
    for schema in schemas {
        let names = schema.id.type_names();
        if names.is_empty() {
            if schema.id.is_empty() {
                debug!("skipping schema without id");
            } else {
                warn!("{} yields no type name; not declared", schema.id);
            }
            continue;
        }
        debug!("mapping {} to {}", schema.id, names.join("."));
        root.insert(&names, schema);
    }
    root
}
