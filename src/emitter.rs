//! Declaration emission - renders the namespace tree as TypeScript declarations.
//!
//! Output is deterministic: namespaces follow the sorted tree, members and
//! union/tuple entries keep their order in the source schema.

use tracing::debug;

use crate::docs::Documentation;
use crate::error::GenerateError;
use crate::namespace::NamespaceNode;
use crate::normalize::normalize;
use crate::resolver::ReferenceResolver;
use crate::synth::{Declaration, Literal, Member, MemberKey, Synthesizer, TypeExpression};
use crate::types::Schema;

const INDENT: &str = "    ";

/// Render every declaration below `root`.
///
/// # Errors
///
/// Fails on the first schema that cannot be synthesized; no partial output
/// is returned.
pub fn emit(resolver: &ReferenceResolver, root: &NamespaceNode<'_>) -> Result<String, GenerateError> {
    let mut out = String::new();
    emit_children(resolver, root, 0, &mut out)?;
    Ok(out)
}

fn emit_children(
    resolver: &ReferenceResolver,
    node: &NamespaceNode<'_>,
    depth: usize,
    out: &mut String,
) -> Result<(), GenerateError> {
    let indent = INDENT.repeat(depth);
    let modifier = if depth == 0 { "declare" } else { "export" };

    for (name, child) in &node.children {
        if let Some(schema) = child.schema {
            emit_declaration(resolver, schema, depth, out)?;
        }
        if child.has_children() {
            out.push_str(&format!("{}{} namespace {} {{\n", indent, modifier, name));
            emit_children(resolver, child, depth + 1, out)?;
            out.push_str(&indent);
            out.push_str("}\n");
        }
    }
    Ok(())
}

fn emit_declaration(
    resolver: &ReferenceResolver,
    schema: &Schema,
    depth: usize,
    out: &mut String,
) -> Result<(), GenerateError> {
    debug!("emitting {}", schema.id);
    let indent = INDENT.repeat(depth);
    let modifier = if depth == 0 { "declare" } else { "export" };
    let name = schema.id.last_type_name();

    let normalized = normalize(resolver, schema, None)?;
    let declaration = Synthesizer::new(resolver, &schema.id).declare(&normalized)?;
    let docs = Documentation::from_schema(&normalized);

    docs.render_block(&indent, out);
    out.push_str(&indent);
    match declaration {
        Declaration::Alias(expr) => {
            out.push_str(&format!("{} type {} = ", modifier, name));
            render_expression(&expr, depth, out);
            out.push(';');
        }
        Declaration::Interface(members) => {
            out.push_str(&format!("{} interface {} ", modifier, name));
            render_members(&members, depth, out);
        }
    }
    docs.render_trailing(out);
    out.push('\n');
    Ok(())
}

/// Render a type expression whose first line sits at `depth`.
pub fn render_expression(expr: &TypeExpression, depth: usize, out: &mut String) {
    match expr {
        TypeExpression::Reference(id) => out.push_str(&id.type_names().join(".")),
        TypeExpression::Primitive(primitive) => out.push_str(primitive.keyword()),
        TypeExpression::Literal(Literal::Number(text)) => out.push_str(text),
        TypeExpression::Literal(Literal::String(text)) => out.push_str(&quote(text)),
        TypeExpression::Union(items) if items.is_empty() => out.push_str("never"),
        TypeExpression::Union(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                render_expression(item, depth, out);
            }
        }
        TypeExpression::ObjectShape(members) => render_members(members, depth, out),
        TypeExpression::Tuple { elements, rest } => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if element.optional {
                    render_operand(&element.expr, depth, out);
                    out.push('?');
                } else {
                    render_expression(&element.expr, depth, out);
                }
            }
            if *rest {
                if !elements.is_empty() {
                    out.push_str(", ");
                }
                out.push_str("...any[]");
            }
            out.push(']');
        }
        TypeExpression::ArrayOf(element) => {
            render_operand(element, depth, out);
            out.push_str("[]");
        }
    }
}

/// Render an expression used as the operand of a postfix `[]` or `?`.
fn render_operand(expr: &TypeExpression, depth: usize, out: &mut String) {
    if is_compound(expr) {
        out.push('(');
        render_expression(expr, depth, out);
        out.push(')');
    } else {
        render_expression(expr, depth, out);
    }
}

fn is_compound(expr: &TypeExpression) -> bool {
    match expr {
        TypeExpression::Union(items) => match items.as_slice() {
            [] => false,
            [single] => is_compound(single),
            _ => true,
        },
        _ => false,
    }
}

fn render_members(members: &[Member], depth: usize, out: &mut String) {
    if members.is_empty() {
        out.push_str("{}");
        return;
    }

    let indent = INDENT.repeat(depth + 1);
    out.push_str("{\n");
    for member in members {
        member.docs.render_block(&indent, out);
        out.push_str(&indent);
        if member.read_only {
            out.push_str("readonly ");
        }
        match &member.key {
            MemberKey::Property(name) => {
                out.push_str(&property_name(name));
                if member.optional {
                    out.push('?');
                }
            }
            MemberKey::Index => out.push_str("[name: string]"),
        }
        out.push_str(": ");
        render_expression(&member.expr, depth + 1, out);
        out.push(';');
        member.docs.render_trailing(out);
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

/// A property name, quoted unless it is a valid identifier.
fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        name.to_string()
    } else {
        quote(name)
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}
