//! Java front end using tree-sitter
//!
//! Extracts classes, methods, attributes, local variables, and statement
//! blocks into a structural model, together with the owned AST the tree
//! matcher consumes.

use crate::matcher::AstTree;
use crate::models::{Element, ElementId, ElementKind, Signature, SourceRange, StructuralModel};
use crate::parsers::{ModelBuilder, ParseError};
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

pub struct JavaModelBuilder;

impl ModelBuilder for JavaModelBuilder {
    fn build_model(&self, source: &[u8], path: &str) -> Result<StructuralModel, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::new(format!("failed to set Java language: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new("tree-sitter returned no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ParseError::new(format!(
                "syntax errors in {path}; revision cannot be modeled"
            )));
        }

        let ast = AstTree::from_tree_sitter(root, source);
        let mut elements = Vec::new();
        extract_types(&root, source, None, None, &mut elements);
        Ok(StructuralModel::new(path.to_string(), elements, ast))
    }
}

fn node_range(node: &Node) -> SourceRange {
    SourceRange::new(
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

/// Identifier-level token stream of an element's source text, used for
/// body similarity and inline detection.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn modifiers_of(node: &Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "modifiers" {
            if let Some(text) = node_text(&child, source) {
                return text.split_whitespace().map(|s| s.to_string()).collect();
            }
        }
    }
    Vec::new()
}

fn push_element(
    elements: &mut Vec<Element>,
    kind: ElementKind,
    name: String,
    qualified_name: String,
    container: Option<ElementId>,
    signature: Signature,
    node: &Node,
    source: &[u8],
) -> ElementId {
    let id = ElementId(elements.len());
    let body_tokens = node_text(node, source).map(tokenize).unwrap_or_default();
    elements.push(Element {
        id,
        kind,
        name,
        qualified_name,
        container,
        signature,
        range: node_range(node),
        body_tokens,
    });
    id
}

/// Recursively collect type declarations (handles nesting).
fn extract_types(
    node: &Node,
    source: &[u8],
    prefix: Option<&str>,
    container: Option<ElementId>,
    elements: &mut Vec<Element>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration"
            | "record_declaration" => {
                extract_type(&child, source, prefix, container, elements);
            }
            _ => extract_types(&child, source, prefix, container, elements),
        }
    }
}

fn extract_type(
    node: &Node,
    source: &[u8],
    prefix: Option<&str>,
    container: Option<ElementId>,
    elements: &mut Vec<Element>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let Some(name) = node_text(&name_node, source) else {
        return;
    };
    let full_name = match prefix {
        Some(outer) => format!("{outer}.{name}"),
        None => name.to_string(),
    };

    let signature = Signature {
        parameters: Vec::new(),
        return_type: None,
        modifiers: modifiers_of(node, source),
    };
    let class_id = push_element(
        elements,
        ElementKind::Class,
        name.to_string(),
        full_name.clone(),
        container,
        signature,
        node,
        source,
    );

    if let Some(body) = node.child_by_field_name("body") {
        extract_members(&body, source, &full_name, class_id, elements);
    }
}

fn extract_members(
    body: &Node,
    source: &[u8],
    class_name: &str,
    class_id: ElementId,
    elements: &mut Vec<Element>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration"
            | "record_declaration" => {
                extract_type(&child, source, Some(class_name), Some(class_id), elements);
            }
            "field_declaration" => {
                extract_fields(&child, source, class_name, class_id, elements);
            }
            "method_declaration" | "constructor_declaration" => {
                extract_method(&child, source, class_name, class_id, elements);
            }
            // Enum constants and their trailing member section
            "enum_body_declarations" => {
                extract_members(&child, source, class_name, class_id, elements);
            }
            _ => {}
        }
    }
}

fn extract_fields(
    node: &Node,
    source: &[u8],
    class_name: &str,
    class_id: ElementId,
    elements: &mut Vec<Element>,
) {
    let declared_type = node
        .child_by_field_name("type")
        .and_then(|t| node_text(&t, source))
        .map(|s| s.to_string());
    let modifiers = modifiers_of(node, source);

    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator
            .child_by_field_name("name")
            .and_then(|n| node_text(&n, source))
        else {
            continue;
        };
        let signature = Signature {
            parameters: Vec::new(),
            return_type: declared_type.clone(),
            modifiers: modifiers.clone(),
        };
        push_element(
            elements,
            ElementKind::Attribute,
            name.to_string(),
            format!("{class_name}.{name}"),
            Some(class_id),
            signature,
            node,
            source,
        );
    }
}

fn extract_method(
    node: &Node,
    source: &[u8],
    class_name: &str,
    class_id: ElementId,
    elements: &mut Vec<Element>,
) {
    let Some(name) = node
        .child_by_field_name("name")
        .and_then(|n| node_text(&n, source))
    else {
        return;
    };

    let parameters = parameter_types(node.child_by_field_name("parameters"), source);
    let signature = Signature {
        parameters: parameters.clone(),
        return_type: node
            .child_by_field_name("type")
            .and_then(|t| node_text(&t, source))
            .map(|s| s.to_string()),
        modifiers: modifiers_of(node, source),
    };
    let qualified_name = format!("{class_name}.{name}({})", parameters.join(","));
    let method_id = push_element(
        elements,
        ElementKind::Method,
        name.to_string(),
        qualified_name.clone(),
        Some(class_id),
        signature,
        node,
        source,
    );

    if let Some(body) = node.child_by_field_name("body") {
        let mut ordinals: HashMap<&'static str, u32> = HashMap::new();
        extract_statements(
            &body,
            source,
            &qualified_name,
            method_id,
            &mut ordinals,
            elements,
        );
    }
}

/// Declared parameter types, in order.
fn parameter_types(params: Option<Node>, source: &[u8]) -> Vec<String> {
    let Some(params) = params else {
        return Vec::new();
    };
    let mut types = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" | "spread_parameter" => {
                if let Some(ty) = child
                    .child_by_field_name("type")
                    .and_then(|t| node_text(&t, source))
                {
                    types.push(ty.to_string());
                }
            }
            _ => {}
        }
    }
    types
}

/// Statement kinds extracted as trackable blocks.
fn block_label(kind: &str) -> Option<&'static str> {
    match kind {
        "for_statement" => Some("for"),
        "enhanced_for_statement" => Some("foreach"),
        "while_statement" => Some("while"),
        "do_statement" => Some("do"),
        "if_statement" => Some("if"),
        "try_statement" | "try_with_resources_statement" => Some("try"),
        "switch_expression" => Some("switch"),
        "synchronized_statement" => Some("sync"),
        _ => None,
    }
}

/// Walk a method body collecting local variables and statement blocks.
/// Blocks are named by kind and per-method ordinal, which is more stable
/// across edits than raw line numbers.
fn extract_statements(
    node: &Node,
    source: &[u8],
    method_qname: &str,
    method_id: ElementId,
    ordinals: &mut HashMap<&'static str, u32>,
    elements: &mut Vec<Element>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // Anonymous and local classes get their own scope; their
        // internals are not statements of this method.
        if child.kind() == "class_body" {
            continue;
        }
        if child.kind() == "local_variable_declaration" {
            extract_locals(&child, source, method_qname, method_id, elements);
            continue;
        }
        if let Some(label) = block_label(child.kind()) {
            let ordinal = ordinals.entry(label).or_insert(0);
            *ordinal += 1;
            let name = format!("{label}[{ordinal}]");
            push_element(
                elements,
                ElementKind::Block,
                name.clone(),
                format!("{method_qname}${name}"),
                Some(method_id),
                Signature::default(),
                &child,
                source,
            );
        }
        extract_statements(&child, source, method_qname, method_id, ordinals, elements);
    }
}

fn extract_locals(
    node: &Node,
    source: &[u8],
    method_qname: &str,
    method_id: ElementId,
    elements: &mut Vec<Element>,
) {
    let declared_type = node
        .child_by_field_name("type")
        .and_then(|t| node_text(&t, source))
        .map(|s| s.to_string());

    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator
            .child_by_field_name("name")
            .and_then(|n| node_text(&n, source))
        else {
            continue;
        };
        let signature = Signature {
            parameters: Vec::new(),
            return_type: declared_type.clone(),
            modifiers: Vec::new(),
        };
        push_element(
            elements,
            ElementKind::Variable,
            name.to_string(),
            format!("{method_qname}#{name}"),
            Some(method_id),
            signature,
            node,
            source,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
public class Calculator {
    private int total;

    public Calculator(int start) {
        this.total = start;
    }

    public int add(int value) {
        int next = total + value;
        if (next > 1000) {
            next = 1000;
        }
        total = next;
        return total;
    }

    public int add(int a, int b) {
        return add(a + b);
    }

    static class Memory {
        long stamp;
    }
}
"#;

    fn model() -> StructuralModel {
        JavaModelBuilder
            .build_model(SAMPLE.as_bytes(), "Calculator.java")
            .unwrap()
    }

    #[test]
    fn extracts_classes_including_nested() {
        let model = model();
        let classes: Vec<&str> = model
            .iter()
            .filter(|e| e.kind == ElementKind::Class)
            .map(|e| e.qualified_name.as_str())
            .collect();
        assert_eq!(classes, vec!["Calculator", "Calculator.Memory"]);
    }

    #[test]
    fn overloaded_methods_get_distinct_qualified_names() {
        let model = model();
        let methods: Vec<&str> = model
            .iter()
            .filter(|e| e.kind == ElementKind::Method && e.name == "add")
            .map(|e| e.qualified_name.as_str())
            .collect();
        assert_eq!(
            methods,
            vec!["Calculator.add(int)", "Calculator.add(int,int)"]
        );
    }

    #[test]
    fn extracts_attributes_with_types() {
        let model = model();
        let field = model
            .iter()
            .find(|e| e.kind == ElementKind::Attribute && e.name == "total")
            .unwrap();
        assert_eq!(field.qualified_name, "Calculator.total");
        assert_eq!(field.signature.return_type.as_deref(), Some("int"));
        assert!(field.signature.modifiers.contains(&"private".to_string()));
    }

    #[test]
    fn extracts_locals_and_blocks_inside_methods() {
        let model = model();
        let local = model
            .iter()
            .find(|e| e.kind == ElementKind::Variable && e.name == "next")
            .unwrap();
        assert_eq!(local.qualified_name, "Calculator.add(int)#next");

        let block = model
            .iter()
            .find(|e| e.kind == ElementKind::Block)
            .unwrap();
        assert_eq!(block.qualified_name, "Calculator.add(int)$if[1]");
        let container = model.get(block.container.unwrap());
        assert_eq!(container.qualified_name, "Calculator.add(int)");
    }

    #[test]
    fn constructor_is_modeled_as_method() {
        let model = model();
        assert!(model.has_qualified_name("Calculator.Calculator(int)", ElementKind::Method));
    }

    #[test]
    fn syntax_errors_surface_as_parse_error() {
        let err = JavaModelBuilder
            .build_model(b"class Broken { int f( }", "Broken.java")
            .unwrap_err();
        assert!(err.message.contains("syntax errors"));
    }

    #[test]
    fn container_paths_follow_nesting() {
        let model = model();
        let local = model
            .iter()
            .find(|e| e.kind == ElementKind::Variable && e.name == "next")
            .unwrap();
        assert_eq!(model.container_path(local.id), vec!["Calculator", "add"]);
    }
}
