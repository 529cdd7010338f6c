//! Documentation comments and trailing constraint annotations.

use serde_json::Value;

use crate::types::NormalizedSchema;

/// Documentation attached to a declaration or member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    /// Comment lines, already protected against early block termination.
    pub lines: Vec<String>,
    /// Trailing `format`/`pattern` note.
    pub annotation: Option<String>,
}

impl Documentation {
    /// Collect `$comment`, `title`, `description` and examples, plus the
    /// `format`/`pattern` annotation of a schema.
    pub fn from_schema(schema: &NormalizedSchema) -> Self {
        let mut lines = Vec::new();
        push_lines(&mut lines, schema.get("$comment"));
        push_lines(&mut lines, schema.get("title"));
        push_lines(&mut lines, schema.get("description"));

        if schema.has("example") || schema.has("examples") {
            lines.push("example:".to_string());
            push_lines(&mut lines, schema.get("example"));
            match schema.get("examples") {
                Some(Value::Array(examples)) => {
                    for example in examples {
                        push_lines(&mut lines, Some(example));
                    }
                }
                other => push_lines(&mut lines, other),
            }
        }

        Self {
            lines,
            annotation: annotation(schema),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.annotation.is_none()
    }

    /// Render the comment block at `indent`, or nothing when there are no lines.
    pub fn render_block(&self, indent: &str, out: &mut String) {
        if self.lines.is_empty() {
            return;
        }
        out.push_str(indent);
        out.push_str("/**\n");
        for line in &self.lines {
            out.push_str(indent);
            if line.is_empty() {
                out.push_str(" *\n");
            } else {
                out.push_str(" * ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(indent);
        out.push_str(" */\n");
    }

    /// Render the trailing annotation (with leading space), if any.
    pub fn render_trailing(&self, out: &mut String) {
        if let Some(annotation) = &self.annotation {
            out.push_str(" //");
            out.push_str(annotation);
        }
    }
}

fn push_lines(lines: &mut Vec<String>, value: Option<&Value>) {
    let text = match value {
        None | Some(Value::Null) => return,
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    lines.extend(text.lines().map(protect_comment));
}

/// Break any `*/` so the text cannot close the surrounding block comment.
pub fn protect_comment(text: &str) -> String {
    text.replace("*/", "*\u{200B}/")
}

fn annotation(schema: &NormalizedSchema) -> Option<String> {
    let mut note = String::new();
    for key in ["format", "pattern"] {
        match schema.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                note.push(' ');
                note.push_str(s);
            }
            Some(other) => {
                note.push(' ');
                note.push_str(&other.to_string());
            }
        }
    }
    (!note.is_empty()).then(|| note.replace(['\r', '\n'], " "))
}
