//! End-to-end generation tests.

use serde_json::{json, Value};
use schema_dts::{generate, generate_from_sources, GenerateError, ReferenceResolver, ResolveError};
use std::fs;
use tempfile::TempDir;

fn resolver_with(schemas: Vec<Value>) -> ReferenceResolver {
    let mut resolver = ReferenceResolver::new();
    for schema in schemas {
        resolver.register_schema(schema).unwrap();
    }
    resolver.resolve().unwrap();
    resolver
}

fn generate_all(schemas: Vec<Value>) -> String {
    generate(&resolver_with(schemas)).unwrap()
}

fn wrapped(body: &str) -> String {
    format!("declare namespace ExampleCom {{\n{}}}\n", body)
}

mod objects {
    use super::*;

    #[test]
    fn required_and_optional_members() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/user.json",
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "age": { "type": "integer" }
            },
            "required": ["id"]
        })]);
        assert_eq!(
            out,
            wrapped(
                "    export interface User {\n        id: string;\n        age?: number;\n    }\n"
            )
        );
    }

    #[test]
    fn properties_imply_object() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/point.json",
            "properties": { "x": { "type": "number" } }
        })]);
        assert!(out.contains("export interface Point {"));
    }

    #[test]
    fn additional_properties_schema() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/counts.json",
            "type": "object",
            "additionalProperties": { "type": "integer" }
        })]);
        assert!(out.contains("export interface Counts {\n        [name: string]: number;\n    }"));
    }

    #[test]
    fn readonly_and_quoted_members() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/entity.json",
            "type": "object",
            "properties": {
                "created-at": { "type": "string", "readOnly": true }
            }
        })]);
        assert!(out.contains("readonly \"created-at\"?: string;"));
    }
}

mod primitives {
    use super::*;

    #[test]
    fn nullable_string() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/name.json",
            "type": "string",
            "nullable": true
        })]);
        assert_eq!(out, wrapped("    export type Name = string | null;\n"));
    }

    #[test]
    fn integer_enum() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/level.json",
            "type": "integer",
            "enum": [1, 2, 3]
        })]);
        assert_eq!(out, wrapped("    export type Level = 1 | 2 | 3;\n"));
    }

    #[test]
    fn string_enum() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/color.json",
            "enum": ["red", "green"]
        })]);
        assert_eq!(out, wrapped("    export type Color = \"red\" | \"green\";\n"));
    }

    #[test]
    fn integer_and_number_collapse() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/amount.json",
            "type": ["integer", "number", "null"]
        })]);
        assert_eq!(out, wrapped("    export type Amount = number | null;\n"));
    }

    #[test]
    fn any_sentinel_is_free_form() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/blob.json",
            "type": "any"
        })]);
        assert_eq!(
            out,
            wrapped("    export type Blob = {\n        [name: string]: any;\n    };\n")
        );
    }
}

mod tuples {
    use super::*;

    fn tuple(extra: Value) -> String {
        let mut schema = json!({
            "$id": "https://example.com/pair.json",
            "type": "array",
            "items": [ { "type": "string" }, { "type": "number" } ]
        });
        for (key, value) in extra.as_object().unwrap() {
            schema[key] = value.clone();
        }
        generate_all(vec![schema])
    }

    #[test]
    fn min_items_marks_trailing_optional() {
        assert_eq!(
            tuple(json!({ "minItems": 1 })),
            wrapped("    export type Pair = [string, number?, ...any[]];\n")
        );
    }

    #[test]
    fn padded_to_max_items() {
        assert_eq!(
            tuple(json!({ "minItems": 2, "maxItems": 4 })),
            wrapped("    export type Pair = [string, number, any?, any?];\n")
        );
    }

    #[test]
    fn contradictory_bounds_are_never() {
        assert_eq!(
            tuple(json!({ "minItems": 3, "maxItems": 1 })),
            wrapped("    export type Pair = never;\n")
        );
    }

    #[test]
    fn array_of_union() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/list.json",
            "type": "array",
            "items": { "type": ["string", "null"] }
        })]);
        assert_eq!(out, wrapped("    export type List = (string | null)[];\n"));
    }
}

mod references {
    use super::*;

    #[test]
    fn cross_document_reference_is_emitted_once() {
        let out = generate_all(vec![
            json!({
                "$id": "https://example.com/a.json",
                "definitions": { "B": { "type": "string" } }
            }),
            json!({
                "$id": "https://example.com/c.json",
                "type": "object",
                "properties": { "b": { "$ref": "a.json#/definitions/B" } }
            }),
        ]);
        assert_eq!(out.matches("export type B = string;").count(), 1);
        assert!(out.contains("b?: ExampleCom.A.Definitions.B;"));
    }

    #[test]
    fn identified_property_is_referenced_not_inlined() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/order.json",
            "type": "object",
            "properties": {
                "tag": { "$id": "https://example.com/tag.json", "type": "string" }
            }
        })]);
        assert!(out.contains("tag?: ExampleCom.Tag;"));
        assert!(out.contains("export type Tag = string;"));
    }

    #[test]
    fn union_of_references() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/shape.json",
            "oneOf": [
                { "$ref": "#/definitions/Circle" },
                { "$ref": "#/definitions/Square" }
            ],
            "definitions": {
                "Circle": { "type": "object", "properties": { "r": { "type": "number" } } },
                "Square": { "type": "object", "properties": { "side": { "type": "number" } } }
            }
        })]);
        assert!(out.contains(
            "export type Shape = ExampleCom.Shape.Definitions.Circle | ExampleCom.Shape.Definitions.Square;"
        ));
        assert!(out.contains("export interface Circle {"));
        assert!(out.contains("export interface Square {"));
    }

    #[test]
    fn urn_ids_are_named_from_their_path() {
        let out = generate_all(vec![
            json!({ "$id": "urn:example:tag", "type": "string" }),
            json!({
                "$id": "https://example.com/a.json",
                "type": "object",
                "properties": { "t": { "$ref": "urn:example:tag" } }
            }),
        ]);
        assert_eq!(
            out,
            "declare namespace Example {\n    export type Tag = string;\n}\n\
             declare namespace ExampleCom {\n\
             \x20   export interface A {\n\
             \x20       t?: Example.Tag;\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn reference_to_nameless_id_fails() {
        let resolver = resolver_with(vec![
            json!({ "$id": "file:///", "type": "string" }),
            json!({
                "$id": "https://example.com/a.json",
                "type": "object",
                "properties": { "t": { "$ref": "file:///" } }
            }),
        ]);
        let err = generate(&resolver).unwrap_err();
        assert!(matches!(err, GenerateError::UnnamedReference { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn percent_encoded_pointer_resolves() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/a.json",
            "type": "object",
            "properties": {
                "t": { "$ref": "#/definitions/my%20tag" },
                "u": { "$ref": "#/definitions/gr%C3%B6%C3%9Fe" }
            },
            "definitions": {
                "my tag": { "type": "string" },
                "größe": { "type": "number" }
            }
        })]);
        assert!(out.contains("t?: ExampleCom.A.Definitions.MyTag;"));
        assert_eq!(out.matches("export type MyTag = string;").count(), 1);
        assert_eq!(out.matches("= number;").count(), 1);
    }

    #[test]
    fn self_referencing_tree_terminates() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/node.json",
            "type": "object",
            "properties": {
                "value": { "type": "string" },
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        })]);
        assert_eq!(
            out,
            wrapped(
                "    export interface Node {\n\
                 \x20       value?: string;\n\
                 \x20       children?: ExampleCom.Node[];\n\
                 \x20   }\n"
            )
        );
    }

    #[test]
    fn cross_document_cycle_terminates() {
        let out = generate_all(vec![
            json!({
                "$id": "https://example.com/a.json",
                "type": "object",
                "properties": { "b": { "$ref": "b.json" } }
            }),
            json!({
                "$id": "https://example.com/b.json",
                "type": "object",
                "properties": { "a": { "$ref": "a.json" } }
            }),
        ]);
        assert_eq!(out.matches("export interface A {").count(), 1);
        assert_eq!(out.matches("export interface B {").count(), 1);
        assert!(out.contains("b?: ExampleCom.B;"));
        assert!(out.contains("a?: ExampleCom.A;"));
    }

    #[test]
    fn file_cycle_loads_each_document_once() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.json");
        fs::write(
            &a,
            r#"{ "type": "object", "properties": { "b": { "$ref": "b.json" } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{ "type": "object", "properties": { "a": { "$ref": "a.json" } } }"#,
        )
        .unwrap();

        let out = generate_from_sources(&[a.to_str().unwrap()]).unwrap();
        assert_eq!(
            out,
            "declare interface A {\n    b?: B;\n}\n\
             declare interface B {\n    a?: A;\n}\n"
        );
    }

    #[test]
    fn files_load_transitively() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("address.json"),
            r#"{ "type": "object", "properties": { "city": { "type": "string" } } }"#,
        )
        .unwrap();
        let person = dir.path().join("person.json");
        fs::write(
            &person,
            r#"{ "type": "object", "properties": { "home": { "$ref": "address.json" } } }"#,
        )
        .unwrap();

        let out = generate_from_sources(&[person.to_str().unwrap()]).unwrap();
        assert_eq!(
            out,
            "declare interface Address {\n    city?: string;\n}\n\
             declare interface Person {\n    home?: Address;\n}\n"
        );
    }
}

mod all_of {
    use super::*;

    #[test]
    fn referenced_base_is_merged() {
        let out = generate_all(vec![
            json!({
                "$id": "https://example.com/base.json",
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"]
            }),
            json!({
                "$id": "https://example.com/derived.json",
                "allOf": [
                    { "$ref": "base.json" },
                    {
                        "properties": { "extra": { "type": "boolean" } },
                        "required": ["extra"]
                    }
                ]
            }),
        ]);
        assert!(out.contains(
            "    export interface Derived {\n        id: string;\n        extra: boolean;\n    }\n"
        ));
    }

    #[test]
    fn later_branch_wins_scalar_conflicts() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/value.json",
            "allOf": [ { "type": "string" }, { "type": "boolean" } ]
        })]);
        assert_eq!(out, wrapped("    export type Value = boolean;\n"));
    }

    #[test]
    fn recursive_reference_terminates() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/node.json",
            "allOf": [ { "$ref": "#" }, { "type": "object" } ]
        })]);
        assert!(out.contains("export interface Node {}"));
    }
}

mod documentation {
    use super::*;

    #[test]
    fn comment_terminator_cannot_escape() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/glob.json",
            "type": "string",
            "description": "matches **/*.json and */ tricks"
        })]);
        // one closing token per comment block
        assert_eq!(out.matches("*/").count(), 1);
        assert!(out.contains("*\u{200B}/ tricks"));
    }

    #[test]
    fn format_annotation_trails_member() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/contact.json",
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email", "title": "Email" }
            }
        })]);
        assert!(out.contains(
            "        /**\n         * Email\n         */\n        email?: string; // email\n"
        ));
    }

    #[test]
    fn examples_are_listed() {
        let out = generate_all(vec![json!({
            "$id": "https://example.com/code.json",
            "type": "string",
            "examples": ["ABC"]
        })]);
        assert!(out.contains("     * example:\n     * ABC\n"));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn generation_is_idempotent() {
        let schemas = vec![
            json!({
                "$id": "https://example.com/zoo/animal.json",
                "type": "object",
                "properties": {
                    "kind": { "enum": ["cat", "dog"] },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }
            }),
            json!({
                "$id": "https://example.com/zoo/keeper.json",
                "type": "object",
                "properties": { "animals": { "type": "array", "items": { "$ref": "animal.json" } } }
            }),
        ];
        let resolver = resolver_with(schemas.clone());
        let first = generate(&resolver).unwrap();
        let second = generate(&resolver).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, generate_all(schemas));
        assert!(first.contains("animals?: ExampleCom.Zoo.Animal[];"));
    }

    #[test]
    fn namespaces_are_sorted() {
        let out = generate_all(vec![
            json!({ "$id": "https://example.com/zeta.json", "type": "string" }),
            json!({ "$id": "https://example.com/alpha.json", "type": "string" }),
        ]);
        let alpha = out.find("type Alpha").unwrap();
        let zeta = out.find("type Zeta").unwrap();
        assert!(alpha < zeta);
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_type_aborts() {
        let resolver = resolver_with(vec![
            json!({ "$id": "https://example.com/ok.json", "type": "string" }),
            json!({ "$id": "https://example.com/when.json", "type": "date" }),
        ]);
        let err = generate(&resolver).unwrap_err();
        assert!(matches!(err, GenerateError::UnknownType { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_pointer_target() {
        let mut resolver = ReferenceResolver::new();
        resolver
            .register_schema(json!({
                "$id": "https://example.com/broken.json",
                "properties": { "x": { "$ref": "#/definitions/Nope" } }
            }))
            .unwrap();
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, ResolveError::PointerNotFound { .. }));
    }

    #[test]
    fn missing_referenced_file() {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("root.json");
        fs::write(&schema, r#"{ "properties": { "x": { "$ref": "gone.json" } } }"#).unwrap();

        let err = generate_from_sources(&[schema.to_str().unwrap()]).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Resolve(ResolveError::FileNotFound { .. })
        ));
        assert_eq!(err.exit_code(), 3);
    }
}
