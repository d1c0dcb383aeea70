//! Splitting the environment by a boolean test.
//!
//! Recognized tests narrow one variable at a time; everything else leaves
//! both branches with the incoming environment.

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::lattice::{Type, TypeUnion};
use crate::analyze::scope::{narrow, Narrowing, SplitEnv, TypeEnv};

use super::{Checker, InferResult};

/// A checked condition: its value and the environment on each outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Branches {
    pub ty: TypeUnion,
    pub then_env: TypeEnv,
    pub else_env: TypeEnv,
}

impl Branches {
    fn unchanged(ty: TypeUnion, env: &TypeEnv) -> Self {
        Self::from_split(ty, SplitEnv::unchanged(env))
    }

    fn from_split(ty: TypeUnion, split: SplitEnv) -> Self {
        Self {
            ty,
            then_env: split.then_env,
            else_env: split.else_env,
        }
    }

    fn split(&self) -> SplitEnv {
        SplitEnv {
            then_env: self.then_env.clone(),
            else_env: self.else_env.clone(),
        }
    }

    /// The outcome when it is decided statically
    pub fn known(&self) -> Option<bool> {
        if let Some(value) = self.ty.value() {
            return Some(value.is_truthy());
        }
        if self.ty.is_unknown() {
            return None;
        }
        match (self.ty.as_true().is_empty(), self.ty.as_false().is_empty()) {
            (true, false) => Some(false),
            (false, true) => Some(true),
            _ => None,
        }
    }
}

fn truth(known: Option<bool>) -> TypeUnion {
    TypeUnion::of(Type::Bool(known))
}

/// Type tested by an `is_*()` call
fn type_check(function: &str) -> Option<Narrowing> {
    let ty = match function.trim_start_matches('\\').to_ascii_lowercase().as_str() {
        "is_null" => return Some(Narrowing::IsNull),
        "is_string" => Type::string(),
        "is_int" | "is_integer" | "is_long" => Type::int(),
        "is_float" | "is_double" => Type::float(),
        "is_bool" => Type::bool(),
        "is_array" => Type::array(),
        "is_callable" => Type::callable(),
        "is_resource" => Type::Resource,
        _ => return None,
    };
    Some(Narrowing::Is(TypeUnion::of(ty)))
}

/// `$x === null`, `false != $x`, ...: the variable, the test, and whether
/// the test holds on the else branch
fn comparison_test<'n>(node: &'n CstNode) -> Option<(&'n str, Narrowing, bool)> {
    let operator = node.field_text("operator")?;
    let (strict, negated) = match operator {
        "===" => (true, false),
        "!==" => (true, true),
        "==" => (false, false),
        "!=" | "<>" => (false, true),
        _ => return None,
    };
    let left = node.child_by_field("left")?;
    let right = node.child_by_field("right")?;
    let (variable, literal) = match (left.kind, right.kind) {
        (NodeKind::Variable, _) => (left, right),
        (_, NodeKind::Variable) => (right, left),
        _ => return None,
    };
    let (test, inverted) = match (literal.kind, literal.text()) {
        (NodeKind::NullLiteral, _) if strict => (Narrowing::IsNull, false),
        (NodeKind::BooleanLiteral, "false") if strict => (Narrowing::IsFalse, false),
        (NodeKind::NullLiteral, _) | (NodeKind::BooleanLiteral, "false") => (Narrowing::Truthy, true),
        (NodeKind::BooleanLiteral, _) => (Narrowing::Truthy, false),
        _ => return None,
    };
    Some((variable.text(), test, negated != inverted))
}

impl Checker<'_> {
    /// Check `node` as a condition.
    ///
    /// `scope.env` is left as the join of both outcomes; callers that
    /// branch install `then_env` or `else_env` themselves.
    pub(super) fn condition(&mut self, node: &CstNode) -> InferResult<Branches> {
        let branches = self.split_condition(node)?;
        self.scope.env = TypeEnv::join(&branches.then_env, &branches.else_env);
        Ok(branches)
    }

    fn narrowed(&self, ty: TypeUnion, name: &str, test: Narrowing, negate: bool) -> Branches {
        let split = narrow(&self.scope.env, name, &test, self.registry());
        Branches::from_split(ty, if negate { split.negate() } else { split })
    }

    fn split_condition(&mut self, node: &CstNode) -> InferResult<Branches> {
        match node.kind {
            NodeKind::UnaryExpression if node.field_text("operator") == Some("!") => {
                let Some(operand) = node.child_by_field("operand") else {
                    return Ok(Branches::unchanged(truth(None), &self.scope.env));
                };
                let inner = self.split_condition(operand)?;
                let ty = truth(inner.known().map(|known| !known));
                Ok(Branches::from_split(ty, inner.split().negate()))
            }
            NodeKind::BinaryExpression => self.binary_condition(node),
            NodeKind::Variable => {
                let ty = self.expr(node)?;
                Ok(self.narrowed(ty, node.text(), Narrowing::Truthy, false))
            }
            NodeKind::Assignment => {
                let ty = self.expr(node)?;
                match node.child_by_field("left") {
                    Some(left) if left.kind == NodeKind::Variable => {
                        Ok(self.narrowed(ty, left.text(), Narrowing::Truthy, false))
                    }
                    _ => Ok(Branches::unchanged(ty, &self.scope.env)),
                }
            }
            NodeKind::CallExpression => {
                let ty = self.expr(node)?;
                let test = node
                    .child_by_field("function")
                    .filter(|f| f.kind == NodeKind::Name)
                    .and_then(|f| type_check(f.text()));
                let subject = node
                    .child_by_field("arguments")
                    .and_then(|args| args.positional_children().next())
                    .and_then(|arg| arg.child_by_field("value"))
                    .filter(|value| value.kind == NodeKind::Variable);
                match (test, subject) {
                    (Some(test), Some(subject)) => Ok(self.narrowed(ty, subject.text(), test, false)),
                    _ => Ok(Branches::unchanged(ty, &self.scope.env)),
                }
            }
            NodeKind::IssetExpression => {
                let ty = self.expr(node)?;
                let mut split = SplitEnv::unchanged(&self.scope.env);
                for target in node.positional_children() {
                    if target.kind != NodeKind::Variable {
                        continue;
                    }
                    let next = narrow(&split.then_env, target.text(), &Narrowing::IsSet, self.registry());
                    split = SplitEnv::and(split, next);
                }
                Ok(Branches::from_split(ty, split))
            }
            NodeKind::EmptyExpression => {
                let ty = self.expr(node)?;
                match node.child_by_field("value") {
                    Some(value) if value.kind == NodeKind::Variable => {
                        Ok(self.narrowed(ty, value.text(), Narrowing::Truthy, true))
                    }
                    _ => Ok(Branches::unchanged(ty, &self.scope.env)),
                }
            }
            _ => {
                let ty = self.expr(node)?;
                Ok(Branches::unchanged(ty, &self.scope.env))
            }
        }
    }

    fn binary_condition(&mut self, node: &CstNode) -> InferResult<Branches> {
        let operator = node.field_text("operator").unwrap_or_default();
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(Branches::unchanged(truth(None), &self.scope.env));
        };
        match operator {
            "&&" | "and" => {
                let lhs = self.split_condition(left)?;
                if lhs.known() == Some(false) {
                    let env = lhs.else_env;
                    return Ok(Branches::unchanged(truth(Some(false)), &env));
                }
                self.scope.env = lhs.then_env.clone();
                let rhs = self.split_condition(right)?;
                let ty = truth(match (lhs.known(), rhs.known()) {
                    (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                });
                Ok(Branches::from_split(ty, SplitEnv::and(lhs.split(), rhs.split())))
            }
            "||" | "or" => {
                let lhs = self.split_condition(left)?;
                if lhs.known() == Some(true) {
                    let env = lhs.then_env;
                    return Ok(Branches::unchanged(truth(Some(true)), &env));
                }
                self.scope.env = lhs.else_env.clone();
                let rhs = self.split_condition(right)?;
                let ty = truth(match (lhs.known(), rhs.known()) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                });
                Ok(Branches::from_split(ty, SplitEnv::or(lhs.split(), rhs.split())))
            }
            "instanceof" => {
                let ty = self.expr(node)?;
                if left.kind == NodeKind::Variable && right.kind == NodeKind::Name {
                    let class = self.class_reference(right.text());
                    let test = Narrowing::Is(TypeUnion::of(Type::instance(class)));
                    return Ok(self.narrowed(ty, left.text(), test, false));
                }
                Ok(Branches::unchanged(ty, &self.scope.env))
            }
            _ => {
                let ty = self.expr(node)?;
                match comparison_test(node) {
                    Some((name, test, negate)) => Ok(self.narrowed(ty, name, test, negate)),
                    None => Ok(Branches::unchanged(ty, &self.scope.env)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_from_literal_and_shape() {
        let env = TypeEnv::new();
        let yes = Branches::unchanged(TypeUnion::of(Type::Bool(Some(true))), &env);
        assert_eq!(yes.known(), Some(true));
        let object = Branches::unchanged(TypeUnion::of(Type::instance("Foo")), &env);
        assert_eq!(object.known(), Some(true));
        let null = Branches::unchanged(TypeUnion::of(Type::Null), &env);
        assert_eq!(null.known(), Some(false));
        let maybe = Branches::unchanged(TypeUnion::of(Type::bool()), &env);
        assert_eq!(maybe.known(), None);
        assert_eq!(Branches::unchanged(TypeUnion::mixed(), &env).known(), None);
    }

    #[test]
    fn test_type_check_functions() {
        assert_eq!(type_check("\\IS_NULL"), Some(Narrowing::IsNull));
        assert_eq!(
            type_check("is_integer"),
            Some(Narrowing::Is(TypeUnion::of(Type::int())))
        );
        assert_eq!(type_check("is_object"), None);
    }
}
