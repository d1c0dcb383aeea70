//! Tests for node_kind module

use super::*;
use std::collections::HashSet;

#[test]
fn test_all_variants_unique() {
    let all = NodeKind::all_variants();
    let unique: HashSet<NodeKind> = all.iter().copied().collect();
    assert_eq!(all.len(), unique.len());

    let names: HashSet<&str> = all.iter().map(|k| k.as_str()).collect();
    assert_eq!(all.len(), names.len(), "two kinds share a string name");
}

#[test]
fn test_all_variants_roundtrip() {
    for &kind in NodeKind::all_variants() {
        let parsed: NodeKind = kind.as_str().parse().unwrap();
        assert_eq!(kind, parsed);
    }
}

#[test]
fn test_unknown_kind_is_rejected() {
    let err = "definitely_not_a_kind".parse::<NodeKind>().unwrap_err();
    assert!(err.to_string().contains("definitely_not_a_kind"));
}

#[test]
fn test_predicates() {
    assert!(NodeKind::ClassDeclaration.is_declaration());
    assert!(NodeKind::FunctionDefinition.is_declaration());
    assert!(!NodeKind::MethodDeclaration.is_declaration());
    assert!(NodeKind::ForeachStatement.is_loop());
    assert!(NodeKind::SubscriptExpression.is_assignable());
    assert!(!NodeKind::CallExpression.is_assignable());
    assert!(NodeKind::NewExpression.is_call());
    assert!(!NodeKind::Flag.is_named());
}

#[test]
fn test_serializes_as_snake_case() {
    let json = serde_json::to_string(&NodeKind::MethodCallExpression).unwrap();
    assert_eq!(json, "\"method_call_expression\"");
}
