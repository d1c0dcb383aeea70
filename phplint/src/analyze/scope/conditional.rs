//! Conditional type narrowing.
//!
//! A condition splits the environment into the bindings that hold when it
//! is true and the bindings that hold when it is false. Branch bodies are
//! checked in their own environment and the results are merged afterwards;
//! no conditional types are kept in the lattice itself.

use crate::analyze::lattice::{Hierarchy, Type, TypeUnion};

use super::env::TypeEnv;

/// Result of splitting an environment by a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitEnv {
    /// Environment for the then-branch (condition is true)
    pub then_env: TypeEnv,
    /// Environment for the else-branch (condition is false)
    pub else_env: TypeEnv,
}

impl SplitEnv {
    /// No narrowing: both branches see `env`
    pub fn unchanged(env: &TypeEnv) -> Self {
        Self {
            then_env: env.clone(),
            else_env: env.clone(),
        }
    }

    /// `!cond`: swap then and else environments
    pub fn negate(self) -> Self {
        Self {
            then_env: self.else_env,
            else_env: self.then_env,
        }
    }

    /// `left && right`, where `right` was split inside `left.then_env`.
    ///
    /// then: both hold. else: left false, or left true and right false.
    pub fn and(left: SplitEnv, right: SplitEnv) -> Self {
        let mut else_env = left.else_env;
        else_env.merge(&right.else_env);
        Self {
            then_env: right.then_env,
            else_env,
        }
    }

    /// `left || right`, where `right` was split inside `left.else_env`.
    ///
    /// then: left true, or left false and right true. else: both false.
    pub fn or(left: SplitEnv, right: SplitEnv) -> Self {
        let mut then_env = left.then_env;
        then_env.merge(&right.then_env);
        Self {
            then_env,
            else_env: right.else_env,
        }
    }

    /// Both outcomes merged, for a condition whose value is not branched on
    pub fn joined(&self) -> TypeEnv {
        TypeEnv::join(&self.then_env, &self.else_env)
    }
}

/// A test applied to a single variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Narrowing {
    /// `if ($x)`
    Truthy,
    /// `$x === null`, `is_null($x)`
    IsNull,
    /// `$x === false`
    IsFalse,
    /// `$x instanceof Foo`, `is_string($x)`, ...
    Is(TypeUnion),
    /// `isset($x)`: the variable is bound and not null
    IsSet,
}

/// Split `env` by a test on variable `name`.
///
/// A branch whose narrowed type would be empty keeps the variable's
/// original type. Unbound variables are not narrowed, except that
/// `isset` binds the then-branch to the non-null `mixed`.
pub fn narrow(env: &TypeEnv, name: &str, test: &Narrowing, h: &dyn Hierarchy) -> SplitEnv {
    let Some(current) = env.get(name) else {
        let mut split = SplitEnv::unchanged(env);
        if *test == Narrowing::IsSet {
            split.then_env.set(name, TypeUnion::mixed());
        }
        return split;
    };

    let (then_ty, else_ty) = match test {
        Narrowing::Truthy => (current.as_true(), current.as_false()),
        Narrowing::IsNull | Narrowing::IsSet => {
            let null = if current.may_be_null() {
                TypeUnion::of(Type::Null)
            } else {
                TypeUnion::empty()
            };
            let rest = current.without_null();
            if *test == Narrowing::IsNull {
                (null, rest)
            } else {
                (rest, null)
            }
        }
        Narrowing::IsFalse => {
            let may_be_false = current.members().iter().any(|m| match m {
                Type::Mixed | Type::Bool(None) | Type::Bool(Some(false)) => true,
                Type::Optional { sentinel, .. } => sentinel.has_false(),
                _ => false,
            });
            let falsy = if may_be_false {
                TypeUnion::of(Type::Bool(Some(false)))
            } else {
                TypeUnion::empty()
            };
            (falsy, current.excluding("false"))
        }
        Narrowing::Is(target) => {
            let then_ty = if current.is_mixed() {
                target.clone()
            } else {
                current.intersection(target, h)
            };
            let else_ty = if current.is_mixed() {
                current.clone()
            } else {
                current.difference(target, h)
            };
            (then_ty, else_ty)
        }
    };

    let current = current.clone();
    let mut split = SplitEnv::unchanged(env);
    split.then_env.set(name, non_empty_or(then_ty, &current));
    split.else_env.set(name, non_empty_or(else_ty, &current));
    split
}

fn non_empty_or(narrowed: TypeUnion, original: &TypeUnion) -> TypeUnion {
    if narrowed.is_empty() {
        original.clone()
    } else {
        narrowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lattice::{Flat, Sentinel};

    fn env_with(name: &str, ty: Type) -> TypeEnv {
        let mut env = TypeEnv::new();
        env.set(name, TypeUnion::of(ty));
        env
    }

    fn optional_string() -> Type {
        Type::optional(Type::string(), Sentinel::False)
    }

    #[test]
    fn test_truthy_splits_optional() {
        let env = env_with("x", optional_string());
        let split = narrow(&env, "x", &Narrowing::Truthy, &Flat);
        assert_eq!(split.then_env.get("x"), Some(&TypeUnion::of(Type::string())));
        assert_eq!(
            split.else_env.get("x"),
            Some(&TypeUnion::of(Type::Bool(Some(false))))
        );
        assert_eq!(split.joined().get("x"), Some(&TypeUnion::of(optional_string())));
    }

    #[test]
    fn test_negate_swaps() {
        let env = env_with("x", optional_string());
        let split = narrow(&env, "x", &Narrowing::Truthy, &Flat).negate();
        assert_eq!(split.else_env.get("x"), Some(&TypeUnion::of(Type::string())));
    }

    #[test]
    fn test_null_checks() {
        let env = env_with("x", Type::optional(Type::instance("Foo"), Sentinel::Null));
        let split = narrow(&env, "x", &Narrowing::IsNull, &Flat);
        assert_eq!(split.then_env.get("x"), Some(&TypeUnion::of(Type::Null)));
        assert_eq!(split.else_env.get("x"), Some(&TypeUnion::of(Type::instance("Foo"))));

        let isset = narrow(&env, "x", &Narrowing::IsSet, &Flat);
        assert_eq!(isset.then_env.get("x"), Some(&TypeUnion::of(Type::instance("Foo"))));
    }

    #[test]
    fn test_false_check_keeps_null_sentinel() {
        let env = env_with("x", Type::optional(Type::string(), Sentinel::FalseOrNull));
        let split = narrow(&env, "x", &Narrowing::IsFalse, &Flat);
        assert_eq!(
            split.then_env.get("x"),
            Some(&TypeUnion::of(Type::Bool(Some(false))))
        );
        assert_eq!(
            split.else_env.get("x"),
            Some(&TypeUnion::of(Type::optional(Type::string(), Sentinel::Null)))
        );
    }

    #[test]
    fn test_instanceof_on_mixed() {
        let env = env_with("x", Type::Mixed);
        let target = TypeUnion::of(Type::instance("Foo"));
        let split = narrow(&env, "x", &Narrowing::Is(target.clone()), &Flat);
        assert_eq!(split.then_env.get("x"), Some(&target));
        assert_eq!(split.else_env.get("x"), Some(&TypeUnion::mixed()));
    }

    #[test]
    fn test_impossible_branch_keeps_type() {
        let env = env_with("x", Type::instance("Foo"));
        let split = narrow(&env, "x", &Narrowing::Truthy, &Flat);
        assert_eq!(split.else_env.get("x"), Some(&TypeUnion::of(Type::instance("Foo"))));
    }

    #[test]
    fn test_and_or_composition() {
        let mut env = env_with("a", optional_string());
        env.set("b", TypeUnion::of(Type::optional(Type::int(), Sentinel::Null)));

        // $a && $b
        let left = narrow(&env, "a", &Narrowing::Truthy, &Flat);
        let right = narrow(&left.then_env, "b", &Narrowing::Truthy, &Flat);
        let both = SplitEnv::and(left, right);
        assert_eq!(both.then_env.get("a"), Some(&TypeUnion::of(Type::string())));
        assert_eq!(both.then_env.get("b"), Some(&TypeUnion::of(Type::int())));
        // else: $a falsy, or $a truthy and $b falsy
        assert_eq!(both.else_env.get("a"), Some(&TypeUnion::of(optional_string())));

        // $a || $b
        let left = narrow(&env, "a", &Narrowing::Truthy, &Flat);
        let right = narrow(&left.else_env, "b", &Narrowing::Truthy, &Flat);
        let either = SplitEnv::or(left, right);
        assert_eq!(
            either.else_env.get("a"),
            Some(&TypeUnion::of(Type::Bool(Some(false))))
        );
        assert_eq!(either.else_env.get("b"), Some(&TypeUnion::of(Type::Null)));
    }

    #[test]
    fn test_isset_binds_unknown_variable() {
        let env = TypeEnv::new();
        let split = narrow(&env, "x", &Narrowing::IsSet, &Flat);
        assert!(split.then_env.contains("x"));
        assert!(!split.else_env.contains("x"));
    }
}
