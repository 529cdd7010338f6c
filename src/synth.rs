//! Type synthesis - decides which type expression every schema node denotes.
//!
//! Synthesis produces a [`TypeExpression`] tree and never renders text; the
//! emitter turns the tree into declarations in a single pass.

use serde_json::Value;
use tracing::warn;

use crate::docs::Documentation;
use crate::error::GenerateError;
use crate::loader::escape_pointer_segment;
use crate::normalize::normalize;
use crate::resolver::ReferenceResolver;
use crate::types::{is_truthy, NormalizedSchema, Primitive, SchemaId};

/// Longest tuple expanded position by position; larger arrays become `any[]`.
pub const MAX_TUPLE_LENGTH: u64 = 256;

/// A synthesized type, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpression {
    /// A named schema, rendered by its qualified name.
    Reference(SchemaId),
    Primitive(Primitive),
    Literal(Literal),
    /// Alternatives in declaration order.
    Union(Vec<TypeExpression>),
    ObjectShape(Vec<Member>),
    /// Positional elements, optionally followed by an open-ended rest element.
    Tuple {
        elements: Vec<TupleElement>,
        rest: bool,
    },
    ArrayOf(Box<TypeExpression>),
}

impl TypeExpression {
    /// The unconstrained type.
    pub fn any() -> Self {
        TypeExpression::Primitive(Primitive::Any)
    }

    /// The uninhabited type.
    pub fn never() -> Self {
        TypeExpression::Primitive(Primitive::Never)
    }

    /// Free-form object: arbitrary string keys mapping to anything.
    pub fn any_shape() -> Self {
        TypeExpression::ObjectShape(vec![Member::index(TypeExpression::any(), Documentation::default())])
    }
}

/// A literal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Rendered as a bare numeral.
    Number(String),
    /// Rendered as a quoted string.
    String(String),
}

/// Key of an object-shape member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKey {
    Property(String),
    /// Index signature over arbitrary string keys.
    Index,
}

/// A member of an object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub key: MemberKey,
    pub expr: TypeExpression,
    pub optional: bool,
    pub read_only: bool,
    pub docs: Documentation,
}

impl Member {
    pub fn index(expr: TypeExpression, docs: Documentation) -> Self {
        Self {
            key: MemberKey::Index,
            expr,
            optional: false,
            read_only: false,
            docs,
        }
    }
}

/// One tuple position.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub expr: TypeExpression,
    pub optional: bool,
}

/// Top-level shape of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `type Name = <expr>`; not structurally extensible.
    Alias(TypeExpression),
    /// Interface-style named object shape.
    Interface(Vec<Member>),
}

/// Whether a normalized schema must be declared as a type alias.
pub fn is_type_alias(schema: &NormalizedSchema) -> bool {
    ["$ref", "oneOf", "anyOf", "enum", "const"]
        .iter()
        .any(|key| schema.has(key))
        || schema.type_name() != Some("object")
}

/// Synthesizes types for the declaration currently being emitted.
///
/// One synthesizer is created per declaration; `current` names that
/// declaration for error reporting.
pub struct Synthesizer<'a> {
    resolver: &'a ReferenceResolver,
    current: &'a SchemaId,
}

impl<'a> Synthesizer<'a> {
    pub fn new(resolver: &'a ReferenceResolver, current: &'a SchemaId) -> Self {
        Self { resolver, current }
    }

    /// Build the declaration for a top-level schema.
    pub fn declare(&self, schema: &NormalizedSchema) -> Result<Declaration, GenerateError> {
        if is_type_alias(schema) {
            Ok(Declaration::Alias(self.synthesize(schema)?))
        } else {
            Ok(Declaration::Interface(self.object_members(schema)?))
        }
    }

    /// Convert a normalized schema into a type expression.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::Resolve` for an unregistered `$ref`,
    /// `GenerateError::UnnamedReference` for a target whose id yields no type name, and
    /// `GenerateError::UnknownType` for an unrecognized `type`.
    pub fn synthesize(&self, schema: &NormalizedSchema) -> Result<TypeExpression, GenerateError> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            let target = self.resolver.dereference(reference)?;
            return named_reference(&target.id, reference);
        }

        if schema.has("anyOf") || schema.has("oneOf") {
            let mut branches = self.branches(schema, "anyOf")?;
            branches.extend(self.branches(schema, "oneOf")?);
            return Ok(TypeExpression::Union(branches));
        }

        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            return Ok(TypeExpression::Union(
                values
                    .iter()
                    .map(|value| TypeExpression::Literal(literal(schema, value)))
                    .collect(),
            ));
        }

        if let Some(value) = schema.get("const") {
            return Ok(TypeExpression::Literal(literal(schema, value)));
        }

        match schema.get("type") {
            None => self.object_shape(schema),
            Some(Value::String(name)) => self.synthesize_type_name(schema, name),
            Some(Value::Array(names)) => names
                .iter()
                .map(|name| match name {
                    Value::String(name) => self.synthesize_type_name(schema, name),
                    other => Err(self.unknown_type(&other.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TypeExpression::Union),
            Some(other) => Err(self.unknown_type(&other.to_string())),
        }
    }

    /// Members of an object shape: declared properties, then the index
    /// member for `additionalProperties`.
    pub fn object_members(&self, schema: &NormalizedSchema) -> Result<Vec<Member>, GenerateError> {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut members = Vec::new();
        if let Some(Value::Object(properties)) = schema.get("properties") {
            for name in properties.keys() {
                let pointer = format!("/properties/{}", escape_pointer_segment(name));
                let (sub, expr) = self.nested(schema, &pointer)?;
                members.push(Member {
                    key: MemberKey::Property(name.clone()),
                    expr,
                    optional: !required.contains(&name.as_str()),
                    read_only: sub.get("readOnly").is_some_and(is_truthy),
                    docs: Documentation::from_schema(&sub),
                });
            }
        }

        match schema.get("additionalProperties") {
            Some(Value::Bool(true)) => {
                members.push(Member::index(TypeExpression::any(), Documentation::default()));
            }
            Some(value) if is_truthy(value) => {
                let (sub, expr) = self.nested(schema, "/additionalProperties")?;
                members.push(Member::index(expr, Documentation::from_schema(&sub)));
            }
            _ => {}
        }
        Ok(members)
    }

    fn object_shape(&self, schema: &NormalizedSchema) -> Result<TypeExpression, GenerateError> {
        self.object_members(schema).map(TypeExpression::ObjectShape)
    }

    fn synthesize_type_name(
        &self,
        schema: &NormalizedSchema,
        name: &str,
    ) -> Result<TypeExpression, GenerateError> {
        match name {
            "any" => Ok(TypeExpression::any_shape()),
            "array" => self.array(schema),
            "object" => self.object_shape(schema),
            other => Primitive::from_schema_type(other)
                .map(TypeExpression::Primitive)
                .ok_or_else(|| self.unknown_type(other)),
        }
    }

    /// Normalize the sub-schema at `pointer` and synthesize it; a sub-schema
    /// with its own id becomes a reference instead of being inlined.
    fn nested(
        &self,
        parent: &NormalizedSchema,
        pointer: &str,
    ) -> Result<(NormalizedSchema, TypeExpression), GenerateError> {
        let sub = normalize(self.resolver, &parent.to_schema(), Some(pointer))?;
        let expr = if sub.id.is_empty() {
            self.synthesize(&sub)?
        } else {
            named_reference(&sub.id, &sub.id.absolute_id())?
        };
        Ok((sub, expr))
    }

    fn branches(
        &self,
        schema: &NormalizedSchema,
        key: &str,
    ) -> Result<Vec<TypeExpression>, GenerateError> {
        let count = schema.get(key).and_then(Value::as_array).map_or(0, Vec::len);
        (0..count)
            .map(|i| {
                self.nested(schema, &format!("/{}/{}", key, i))
                    .map(|(_, expr)| expr)
            })
            .collect()
    }

    fn array(&self, schema: &NormalizedSchema) -> Result<TypeExpression, GenerateError> {
        let min_items = schema.get("minItems").and_then(Value::as_u64);
        let max_items = schema.get("maxItems").and_then(Value::as_u64);

        let item_schemas = match schema.get("items") {
            None | Some(Value::Null) => {
                return Ok(TypeExpression::ArrayOf(Box::new(TypeExpression::any())))
            }
            Some(Value::Array(items)) => items.len() as u64,
            Some(_) => {
                let (_, element) = self.nested(schema, "/items")?;
                return Ok(TypeExpression::ArrayOf(Box::new(element)));
            }
        };

        if item_schemas == 0 && min_items.is_none() && max_items.is_none() {
            return Ok(TypeExpression::ArrayOf(Box::new(TypeExpression::any())));
        }
        if let (Some(min), Some(max)) = (min_items, max_items) {
            if max < min {
                return Ok(TypeExpression::never());
            }
        }

        let mut item_count = min_items
            .unwrap_or(0)
            .max(max_items.unwrap_or(0))
            .max(item_schemas);
        if let Some(max) = max_items {
            item_count = item_count.min(max);
        }
        if item_count > MAX_TUPLE_LENGTH {
            warn!(
                "{}: tuple of {} positions exceeds {}, using any[]",
                self.current, item_count, MAX_TUPLE_LENGTH
            );
            return Ok(TypeExpression::ArrayOf(Box::new(TypeExpression::any())));
        }

        let mut elements = Vec::new();
        for i in 0..item_count {
            let expr = if i < item_schemas {
                self.nested(schema, &format!("/items/{}", i))?.1
            } else {
                TypeExpression::any()
            };
            elements.push(TupleElement {
                expr,
                optional: min_items.map_or(true, |min| i >= min),
            });
        }

        Ok(TypeExpression::Tuple {
            elements,
            rest: max_items.is_none(),
        })
    }

    fn unknown_type(&self, type_name: &str) -> GenerateError {
        GenerateError::UnknownType {
            type_name: type_name.to_string(),
            schema: self.current.absolute_id(),
        }
    }
}

/// A reference to a declared schema; ids that yield no type name cannot be
/// declared, so they cannot be referenced either.
fn named_reference(id: &SchemaId, reference: &str) -> Result<TypeExpression, GenerateError> {
    if id.type_names().is_empty() {
        return Err(GenerateError::UnnamedReference {
            reference: reference.to_string(),
        });
    }
    Ok(TypeExpression::Reference(id.clone()))
}

/// Literal for an `enum`/`const` value: numeric when the declared type is
/// `integer` or `number`, otherwise a string.
fn literal(schema: &NormalizedSchema, value: &Value) -> Literal {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if schema.is_numeric() {
        Literal::Number(text)
    } else {
        Literal::String(text)
    }
}
