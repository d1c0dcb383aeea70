//! Concrete Syntax Tree (CST) node structure
//!
//! The analyzer works directly on this tree: every construct is a
//! [`CstNode`] whose sub-parts are reachable either positionally or through
//! a named field (`condition`, `body`, `name`, ...).

use serde::Serialize;

use crate::node_kind::NodeKind;
use crate::span::Span;

/// A node in the Concrete Syntax Tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CstNode {
    pub kind: NodeKind,

    pub span: Span,

    pub children: Vec<CstNode>,

    /// Leaf text: identifier names, decoded string contents, operators,
    /// raw type hints, doc comment bodies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Field name if this node is a named field of its parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl CstNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            text: None,
            field: None,
        }
    }

    /// Create a leaf node with text
    pub fn leaf(kind: NodeKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(kind, span)
        }
    }

    pub fn with_children(kind: NodeKind, span: Span, children: Vec<CstNode>) -> Self {
        Self {
            children,
            ..Self::new(kind, span)
        }
    }

    pub fn push_child(&mut self, child: CstNode) {
        self.children.push(child);
    }

    /// Add a child under a field name
    pub fn push_field(&mut self, field: &'static str, mut child: CstNode) {
        child.field = Some(field);
        self.children.push(child);
    }

    /// Add a child under a field name if present
    pub fn push_opt_field(&mut self, field: &'static str, child: Option<CstNode>) {
        if let Some(child) = child {
            self.push_field(field, child);
        }
    }

    /// Builder form of [`CstNode::push_field`]
    pub fn field(mut self, field: &'static str, child: CstNode) -> Self {
        self.push_field(field, child);
        self
    }

    pub fn child(&self, index: usize) -> Option<&CstNode> {
        self.children.get(index)
    }

    /// First child stored under `name`
    pub fn child_by_field(&self, name: &str) -> Option<&CstNode> {
        self.children.iter().find(|c| c.field == Some(name))
    }

    /// All children stored under `name`, in source order
    pub fn children_by_field<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CstNode> {
        self.children.iter().filter(move |c| c.field == Some(name))
    }

    /// Children that are not stored under any field
    pub fn positional_children(&self) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(|c| c.field.is_none())
    }

    /// Children excluding comments and anonymous leaves
    pub fn named_children(&self) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(|c| c.kind.is_named())
    }

    pub fn find_child(&self, kind: NodeKind) -> Option<&CstNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn find_children(&self, kind: NodeKind) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Leaf text, or the empty string
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Text of the field `name` if it is present
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.child_by_field(name).map(CstNode::text)
    }

    /// Flag fields (`reference`, `variadic`, `spread`) are stored as empty leaves
    pub fn has_flag(&self, name: &str) -> bool {
        self.child_by_field(name).is_some()
    }

    /// The doc comment attached to a declaration or statement
    pub fn doc(&self) -> Option<&str> {
        self.field_text("doc")
    }

    pub fn has_error(&self) -> bool {
        self.kind == NodeKind::Error || self.children.iter().any(|c| c.has_error())
    }

    /// All error nodes in pre-order
    pub fn errors(&self) -> Vec<&CstNode> {
        self.walk().filter(|n| n.kind == NodeKind::Error).collect()
    }

    /// Source text covered by this node
    pub fn text_from_source<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.start..self.span.end).unwrap_or("")
    }

    /// Walk the tree in pre-order
    pub fn walk(&self) -> CstWalker<'_> {
        CstWalker { stack: vec![self] }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.kind.as_str(),
            "field": self.field,
            "start_line": self.span.start_line,
            "start_column": self.span.start_column,
            "text": self.text,
            "children": self.children.iter().map(|c| c.to_json()).collect::<Vec<_>>()
        })
    }

    /// Return AST structure as an indented string for debugging
    ///
    /// ```text
    /// Assignment
    ///   left: Variable = "x"
    ///   right: IntegerLiteral = "42"
    /// ```
    pub fn debug_ast_string(&self) -> String {
        let mut output = String::new();
        self.debug_ast_to_string(&mut output, 0);
        output
    }

    fn debug_ast_to_string(&self, output: &mut String, indent: usize) {
        output.push_str(&"  ".repeat(indent));
        if let Some(field) = self.field {
            output.push_str(field);
            output.push_str(": ");
        }
        output.push_str(&format!("{:?}", self.kind));
        if let Some(text) = &self.text {
            output.push_str(&format!(" = {:?}", text));
        }
        output.push('\n');
        for child in &self.children {
            child.debug_ast_to_string(output, indent + 1);
        }
    }
}

/// Pre-order tree walker
#[derive(Debug)]
pub struct CstWalker<'a> {
    stack: Vec<&'a CstNode>,
}

impl<'a> Iterator for CstWalker<'a> {
    type Item = &'a CstNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind, text: &str) -> CstNode {
        CstNode::leaf(kind, Span::empty(), text)
    }

    #[test]
    fn test_field_lookup() {
        let node = CstNode::new(NodeKind::Assignment, Span::empty())
            .field("left", leaf(NodeKind::Variable, "x"))
            .field("right", leaf(NodeKind::IntegerLiteral, "42"));

        assert_eq!(node.field_text("left"), Some("x"));
        assert_eq!(node.child_by_field("right").map(|n| n.kind), Some(NodeKind::IntegerLiteral));
        assert!(node.child_by_field("missing").is_none());
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = CstNode::new(NodeKind::SourceFile, Span::empty());
        let mut stmt = CstNode::new(NodeKind::ExpressionStatement, Span::empty());
        stmt.push_field("expression", leaf(NodeKind::Variable, "a"));
        root.push_child(stmt);
        root.push_child(CstNode::new(NodeKind::Error, Span::empty()));

        let kinds: Vec<_> = root.walk().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::SourceFile,
                NodeKind::ExpressionStatement,
                NodeKind::Variable,
                NodeKind::Error
            ]
        );
        assert!(root.has_error());
        assert_eq!(root.errors().len(), 1);
    }

    #[test]
    fn test_debug_ast_string() {
        let node = CstNode::new(NodeKind::Assignment, Span::empty())
            .field("left", leaf(NodeKind::Variable, "x"));
        assert_eq!(node.debug_ast_string(), "Assignment\n  left: Variable = \"x\"\n");
    }
}
