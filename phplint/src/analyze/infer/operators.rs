//! Binary and unary operators with constant folding.

use std::cmp::Ordering;

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::lattice::{ConstValue, Hierarchy, Type, TypeUnion};

use super::{Checker, InferResult};

fn number_result() -> TypeUnion {
    TypeUnion::from_types([Type::int(), Type::float()])
}

fn all_int(ty: &TypeUnion) -> bool {
    !ty.is_empty() && ty.members().iter().all(|m| matches!(m, Type::Int(_)))
}

fn all_numeric(ty: &TypeUnion) -> bool {
    !ty.is_empty() && ty.members().iter().all(Type::is_numeric)
}

fn as_float(value: &ConstValue) -> Option<f64> {
    match value {
        ConstValue::Int(i) => Some(*i as f64),
        ConstValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// `l ?? r`: `l` without null, plus `r` when `l` may be null
pub(super) fn coalesce(left: &TypeUnion, right: &TypeUnion) -> TypeUnion {
    if left.is_empty() || left.may_be_null() {
        left.without_null().union(right)
    } else {
        left.clone()
    }
}

/// Result type of a non-logical binary operator; folds known operands.
pub(super) fn binary_result(operator: &str, left: &TypeUnion, right: &TypeUnion) -> TypeUnion {
    let values = left.value().zip(right.value());
    match operator {
        "." => match values {
            Some((a, b)) => TypeUnion::of(Type::string_value(a.to_php_string() + &b.to_php_string())),
            None => TypeUnion::of(Type::string()),
        },
        "+" if left.members().iter().any(Type::is_array) && right.members().iter().any(Type::is_array) => {
            left.union(right)
        }
        "+" | "-" | "*" | "**" => arithmetic(operator, left, right),
        "/" => division(left, right),
        "%" | "<<" | ">>" | "&" | "|" | "^" => {
            let folded = match values {
                Some((ConstValue::Int(a), ConstValue::Int(b))) => integer_op(operator, a, b),
                _ => None,
            };
            TypeUnion::of(Type::Int(folded))
        }
        "<=>" => {
            let folded = values.and_then(|(a, b)| compare(&a, &b)).map(|o| o as i64);
            TypeUnion::of(Type::Int(folded))
        }
        "==" | "!=" | "<>" | "===" | "!==" | "<" | ">" | "<=" | ">=" => {
            let folded = values.and_then(|(a, b)| comparison(operator, &a, &b));
            TypeUnion::of(Type::Bool(folded))
        }
        "xor" => {
            let folded = values.map(|(a, b)| a.is_truthy() != b.is_truthy());
            TypeUnion::of(Type::Bool(folded))
        }
        _ => TypeUnion::mixed(),
    }
}

fn integer_op(operator: &str, a: i64, b: i64) -> Option<i64> {
    match operator {
        "%" => a.checked_rem(b),
        "<<" => u32::try_from(b).ok().and_then(|b| a.checked_shl(b)),
        ">>" => u32::try_from(b).ok().and_then(|b| a.checked_shr(b)),
        "&" => Some(a & b),
        "|" => Some(a | b),
        "^" => Some(a ^ b),
        _ => None,
    }
}

fn arithmetic(operator: &str, left: &TypeUnion, right: &TypeUnion) -> TypeUnion {
    match (left.value(), right.value()) {
        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
            let exact = match operator {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                "**" => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
                _ => None,
            };
            match exact {
                Some(value) => return TypeUnion::of(Type::Int(Some(value))),
                // Overflow and negative exponents leave the integers
                None => return TypeUnion::of(Type::Float(float_op(operator, a as f64, b as f64))),
            }
        }
        (Some(a), Some(b)) => {
            if let (Some(a), Some(b)) = (as_float(&a), as_float(&b)) {
                return TypeUnion::of(Type::Float(float_op(operator, a, b)));
            }
        }
        _ => {}
    }
    if all_int(left) && all_int(right) {
        if operator == "**" {
            return number_result();
        }
        TypeUnion::of(Type::int())
    } else if all_numeric(left) && all_numeric(right) {
        TypeUnion::of(Type::float())
    } else {
        number_result()
    }
}

fn float_op(operator: &str, a: f64, b: f64) -> Option<f64> {
    let value = match operator {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "**" => a.powf(b),
        "/" if b != 0.0 => a / b,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Integer division stays an integer only when it is exact
fn division(left: &TypeUnion, right: &TypeUnion) -> TypeUnion {
    match (left.value(), right.value()) {
        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) if b != 0 => {
            if a.checked_rem(b) == Some(0) {
                if let Some(q) = a.checked_div(b) {
                    return TypeUnion::of(Type::Int(Some(q)));
                }
            }
            TypeUnion::of(Type::Float(Some(a as f64 / b as f64)))
        }
        (Some(a), Some(b)) => match (as_float(&a), as_float(&b)) {
            (Some(a), Some(b)) => TypeUnion::of(Type::Float(float_op("/", a, b))),
            _ => number_result(),
        },
        _ if all_int(left) && all_int(right) => number_result(),
        _ if all_numeric(left) && all_numeric(right) => TypeUnion::of(Type::float()),
        _ => number_result(),
    }
}

fn compare(a: &ConstValue, b: &ConstValue) -> Option<Ordering> {
    match (a, b) {
        (ConstValue::String(a), ConstValue::String(b)) => Some(a.cmp(b)),
        _ => as_float(a)?.partial_cmp(&as_float(b)?),
    }
}

fn loose_equal(a: &ConstValue, b: &ConstValue) -> Option<bool> {
    match (a, b) {
        (ConstValue::Bool(_), _) | (_, ConstValue::Bool(_)) | (ConstValue::Null, _) | (_, ConstValue::Null) => {
            Some(a.is_truthy() == b.is_truthy())
        }
        (ConstValue::String(a), ConstValue::String(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => Some(x == y),
            _ => Some(a == b),
        },
        _ => Some(as_float(a)? == as_float(b)?),
    }
}

fn comparison(operator: &str, a: &ConstValue, b: &ConstValue) -> Option<bool> {
    match operator {
        "===" => Some(a == b),
        "!==" => Some(a != b),
        "==" => loose_equal(a, b),
        "!=" | "<>" => loose_equal(a, b).map(|eq| !eq),
        _ => {
            let ordering = compare(a, b)?;
            Some(match operator {
                "<" => ordering == Ordering::Less,
                ">" => ordering == Ordering::Greater,
                "<=" => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn negate(member: &Type) -> Type {
    match member {
        Type::Int(Some(i)) => match i.checked_neg() {
            Some(n) => Type::Int(Some(n)),
            None => Type::Float(Some(-(*i as f64))),
        },
        Type::Int(None) => Type::int(),
        Type::Float(f) => Type::Float(f.map(|f| -f)),
        _ => Type::Mixed,
    }
}

impl Checker<'_> {
    pub(super) fn binary_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let operator = node.field_text("operator").unwrap_or_default();
        if matches!(operator, "&&" | "||" | "and" | "or") {
            return Ok(self.condition(node)?.ty);
        }
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(TypeUnion::mixed());
        };
        match operator {
            "??" => {
                let l = self.probe(left)?;
                let r = self.expr(right)?;
                Ok(coalesce(&l, &r))
            }
            "instanceof" => {
                let value = self.expr(left)?;
                if right.kind != NodeKind::Name {
                    self.expr(right)?;
                    return Ok(TypeUnion::of(Type::bool()));
                }
                let class = self.class_reference(right.text());
                Ok(TypeUnion::of(Type::Bool(self.fold_instanceof(&value, &class))))
            }
            _ => {
                let l = self.expr(left)?;
                let r = self.expr(right)?;
                Ok(binary_result(operator, &l, &r))
            }
        }
    }

    /// `instanceof` decided from the operand's type, when it can be
    fn fold_instanceof(&self, value: &TypeUnion, class: &str) -> Option<bool> {
        if value.is_unknown() {
            return None;
        }
        let registry = self.registry();
        let objects = |m: &Type| matches!(m, Type::ClassInstance(_) | Type::Function(_) | Type::Mixed);
        if !value.members().iter().any(objects) {
            return Some(false);
        }
        let known_subclass = |m: &Type| match m {
            Type::ClassInstance(name) => {
                registry.declared_class(name).is_some()
                    && registry.is_subclass_of(name, class)
            }
            _ => false,
        };
        value.members().iter().all(known_subclass).then_some(true)
    }

    pub(super) fn unary_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let operator = node.field_text("operator").unwrap_or_default();
        if operator == "!" {
            return Ok(self.condition(node)?.ty);
        }
        let operand = match node.child_by_field("operand") {
            Some(operand) => self.expr(operand)?,
            None => return Ok(TypeUnion::mixed()),
        };
        let ty = match operator {
            "-" if all_numeric(&operand) => operand.members().iter().map(negate).collect(),
            "+" if all_numeric(&operand) => operand,
            "-" | "+" => number_result(),
            "~" => match operand.value() {
                Some(ConstValue::Int(i)) => TypeUnion::of(Type::Int(Some(!i))),
                _ => TypeUnion::of(Type::int()),
            },
            _ => TypeUnion::mixed(),
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(i: i64) -> TypeUnion {
        TypeUnion::of(Type::Int(Some(i)))
    }

    #[test]
    fn test_concat_folds() {
        let left = TypeUnion::of(Type::string_value("a"));
        assert_eq!(
            binary_result(".", &left, &int(1)),
            TypeUnion::of(Type::string_value("a1"))
        );
        assert_eq!(
            binary_result(".", &left, &TypeUnion::of(Type::int())),
            TypeUnion::of(Type::string())
        );
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(binary_result("+", &int(2), &int(3)), int(5));
        assert_eq!(binary_result("/", &int(6), &int(3)), int(2));
        assert_eq!(
            binary_result("/", &int(7), &int(2)),
            TypeUnion::of(Type::Float(Some(3.5)))
        );
        assert_eq!(
            binary_result("*", &TypeUnion::of(Type::int()), &int(2)),
            TypeUnion::of(Type::int())
        );
        assert!(matches!(
            binary_result("+", &int(i64::MAX), &int(1)).single(),
            Some(Type::Float(Some(_)))
        ));
    }

    #[test]
    fn test_mixed_operand_is_number() {
        assert_eq!(binary_result("-", &TypeUnion::mixed(), &int(1)), number_result());
        assert_eq!(
            binary_result("+", &TypeUnion::of(Type::float()), &int(1)),
            TypeUnion::of(Type::float())
        );
    }

    #[test]
    fn test_comparisons_fold() {
        assert_eq!(
            binary_result("<", &int(1), &int(2)),
            TypeUnion::of(Type::Bool(Some(true)))
        );
        assert_eq!(
            binary_result("===", &int(1), &TypeUnion::of(Type::string_value("1"))),
            TypeUnion::of(Type::Bool(Some(false)))
        );
        assert_eq!(
            binary_result("==", &int(1), &TypeUnion::of(Type::string_value("1"))),
            TypeUnion::of(Type::Bool(None))
        );
        assert_eq!(binary_result("<=>", &int(3), &int(1)), int(1));
    }

    #[test]
    fn test_coalesce_drops_null() {
        let nullable = TypeUnion::from_types([Type::string(), Type::Null]);
        assert_eq!(
            coalesce(&nullable, &int(0)),
            TypeUnion::from_types([Type::string(), Type::Int(Some(0))])
        );
        let plain = TypeUnion::of(Type::string());
        assert_eq!(coalesce(&plain, &int(0)), plain);
    }
}
