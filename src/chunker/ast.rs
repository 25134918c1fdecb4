//! Syntax-aware splitter for TypeScript and JavaScript sources.
//!
//! Parses with tree-sitter and walks top-level declarations only: one chunk
//! per function declaration, class declaration, and exported named value
//! declaration. Chunk text is sliced from the original source by line range
//! so formatting and comments survive verbatim. File-level import sources and
//! exported names are attached to every chunk. A file with none of these
//! constructs yields an empty sequence, which tells the caller to fall back.

use super::SharedMetadata;
use crate::types::{Chunk, ChunkKind};
use tree_sitter::{Language, Node, Parser};

pub(crate) fn split_source(content: &str, extension: &str, shared: &SharedMetadata) -> Vec<Chunk> {
    let language: Language = match extension {
        "ts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
        "js" | "jsx" => tree_sitter_javascript::LANGUAGE.into(),
        _ => return Vec::new(),
    };

    let mut parser = Parser::new();
    if let Err(error) = parser.set_language(&language) {
        tracing::warn!("failed to load grammar for .{}: {}", extension, error);
        return Vec::new();
    }

    let Some(tree) = parser.parse(content, None) else {
        tracing::warn!("failed to parse {}", shared.file_path);
        return Vec::new();
    };
    let root = tree.root_node();
    let lines: Vec<&str> = content.lines().collect();

    // file-level imports and exports, shared by every chunk of this file
    let mut imports = Vec::new();
    let mut exports = Vec::new();
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        match node.kind() {
            "import_statement" => {
                if let Some(source) = import_source(node, content) {
                    imports.push(source);
                }
            }
            "export_statement" => collect_export_names(node, content, &mut exports),
            _ => {}
        }
    }

    let mut chunks = Vec::new();
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        let Some((chunk_type, name)) = classify(node, content) else {
            continue;
        };

        let start_line = node.start_position().row + 1;
        let end_line = (node.end_position().row + 1).min(lines.len());
        if start_line > end_line {
            continue;
        }

        chunks.push(shared.chunk(
            lines[start_line - 1..end_line].join("\n"),
            chunk_type,
            name,
            imports.clone(),
            exports.clone(),
            start_line,
            end_line,
        ));
    }

    chunks
}

/// Decide whether a top-level node becomes a chunk, and under which identity.
/// Exported function/class declarations chunk under their own kind and name,
/// spanning the whole `export` statement.
fn classify(node: Node, source: &str) -> Option<(ChunkKind, String)> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            Some((ChunkKind::Function, declaration_name(node, source)))
        }
        "class_declaration" | "abstract_class_declaration" => {
            Some((ChunkKind::Class, declaration_name(node, source)))
        }
        "export_statement" => {
            let declaration = node.child_by_field_name("declaration")?;
            match declaration.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    Some((ChunkKind::Function, declaration_name(declaration, source)))
                }
                "class_declaration" | "abstract_class_declaration" => {
                    Some((ChunkKind::Class, declaration_name(declaration, source)))
                }
                "lexical_declaration" | "variable_declaration" => {
                    let name = declarator_names(declaration, source)
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "export".to_string());
                    Some((ChunkKind::Export, name))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn declaration_name(node: Node, source: &str) -> String {
    node.child_by_field_name("name")
        .map(|name| node_text(name, source).to_string())
        .unwrap_or_default()
}

fn declarator_names(declaration: Node, source: &str) -> Vec<String> {
    let mut cursor = declaration.walk();
    declaration
        .children(&mut cursor)
        .filter(|child| child.kind() == "variable_declarator")
        .filter_map(|declarator| declarator.child_by_field_name("name"))
        .map(|name| node_text(name, source).to_string())
        .collect()
}

fn import_source(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("source").map(|string_node| {
        node_text(string_node, source)
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string()
    })
}

fn collect_export_names(node: Node, source: &str, exports: &mut Vec<String>) {
    if let Some(declaration) = node.child_by_field_name("declaration") {
        match declaration.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration" => {
                let name = declaration_name(declaration, source);
                if !name.is_empty() {
                    exports.push(name);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                exports.extend(declarator_names(declaration, source));
            }
            _ => {}
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "default" => exports.push("default".to_string()),
            "export_clause" => {
                let mut specifiers = child.walk();
                for specifier in child.children(&mut specifiers) {
                    if specifier.kind() == "export_specifier"
                        && let Some(name) = specifier.child_by_field_name("name")
                    {
                        exports.push(node_text(name, source).to_string());
                    }
                }
            }
            _ => {}
        }
    }
}
