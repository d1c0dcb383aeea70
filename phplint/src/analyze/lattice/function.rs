//! Function and callable signatures

use std::fmt;

use super::ops::Hierarchy;
use super::union::TypeUnion;

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: String,
    /// Declared or documented type; `None` when nothing is known
    pub ty: Option<TypeUnion>,
    pub by_ref: bool,
    pub has_default: bool,
    pub variadic: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: Option<TypeUnion>) -> Self {
        Self {
            name: name.into(),
            ty,
            by_ref: false,
            has_default: false,
            variadic: false,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.has_default && !self.variadic
    }
}

/// A function, method or closure signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub name: Option<String>,
    pub args: Vec<Argument>,
    pub return_type: TypeUnion,
    /// Set when the return type came from a declaration rather than inference
    pub declared_return: bool,
    /// Parameter positions that take a callback
    pub callback_positions: Vec<usize>,
    /// `callable` without a known signature; accepts any arguments
    pub any_signature: bool,
}

impl FunctionType {
    pub fn new(name: impl Into<String>, args: Vec<Argument>, return_type: TypeUnion) -> Self {
        Self {
            name: Some(name.into()),
            args,
            return_type,
            declared_return: false,
            callback_positions: Vec::new(),
            any_signature: false,
        }
    }

    /// The untyped `callable`
    pub fn callable() -> Self {
        Self {
            name: None,
            args: Vec::new(),
            return_type: TypeUnion::mixed(),
            declared_return: false,
            callback_positions: Vec::new(),
            any_signature: true,
        }
    }

    pub fn by_ref_positions(&self) -> Vec<usize> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, a)| a.by_ref)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn required_count(&self) -> usize {
        self.args.iter().filter(|a| a.is_required()).count()
    }

    /// Maximum accepted argument count; `None` when variadic or untyped
    pub fn max_count(&self) -> Option<usize> {
        if self.any_signature || self.args.iter().any(|a| a.variadic) {
            None
        } else {
            Some(self.args.len())
        }
    }

    /// Parameter receiving the argument at `position`, following a trailing variadic
    pub fn arg_at(&self, position: usize) -> Option<&Argument> {
        self.args
            .get(position)
            .or_else(|| self.args.last().filter(|a| a.variadic))
    }

    pub fn arg_named(&self, name: &str) -> Option<(usize, &Argument)> {
        self.args.iter().enumerate().find(|(_, a)| a.name == name)
    }

    /// Whether `self` can stand in where `expected` is required.
    ///
    /// Returns are covariant and parameters contravariant.
    pub fn matches_signature(&self, expected: &FunctionType, h: &dyn Hierarchy) -> bool {
        if expected.any_signature || self.any_signature {
            return true;
        }
        if self.required_count() > expected.args.len() {
            return false;
        }
        for (mine, theirs) in self.args.iter().zip(&expected.args) {
            if let (Some(mine), Some(theirs)) = (&mine.ty, &theirs.ty) {
                if !theirs.complies_with(mine, h) {
                    return false;
                }
            }
        }
        expected.return_type.is_mixed() || self.return_type.complies_with(&expected.return_type, h)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any_signature {
            return write!(f, "callable");
        }
        write!(f, "callable(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &arg.ty {
                Some(ty) => write!(f, "{}", ty)?,
                None => write!(f, "mixed")?,
            }
            if arg.variadic {
                write!(f, "...")?;
            } else if arg.has_default {
                write!(f, "=")?;
            }
        }
        write!(f, "): {}", self.return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lattice::{Flat, Type};

    fn two_ints() -> FunctionType {
        FunctionType::new(
            "add",
            vec![
                Argument::new("a", Some(TypeUnion::of(Type::int()))),
                Argument::new("b", Some(TypeUnion::of(Type::int()))),
            ],
            TypeUnion::of(Type::int()),
        )
    }

    #[test]
    fn test_arity_bounds() {
        let mut f = two_ints();
        assert_eq!(f.required_count(), 2);
        assert_eq!(f.max_count(), Some(2));

        f.args[1].has_default = true;
        assert_eq!(f.required_count(), 1);

        f.args.push(Argument {
            variadic: true,
            ..Argument::new("rest", None)
        });
        assert_eq!(f.max_count(), None);
        assert_eq!(f.arg_at(7).map(|a| a.name.as_str()), Some("rest"));
    }

    #[test]
    fn test_by_ref_positions() {
        let mut f = two_ints();
        f.args[1].by_ref = true;
        assert_eq!(f.by_ref_positions(), vec![1]);
    }

    #[test]
    fn test_signature_variance() {
        let expected = FunctionType::new(
            "cb",
            vec![Argument::new("x", Some(TypeUnion::of(Type::int())))],
            TypeUnion::of(Type::float()),
        );
        // int return is usable where float is expected; mixed parameter accepts int
        let candidate = FunctionType::new(
            "f",
            vec![Argument::new("x", Some(TypeUnion::mixed()))],
            TypeUnion::of(Type::int()),
        );
        assert!(candidate.matches_signature(&expected, &Flat));

        let narrower = FunctionType::new(
            "g",
            vec![Argument::new("x", Some(TypeUnion::of(Type::string())))],
            TypeUnion::of(Type::int()),
        );
        assert!(!narrower.matches_signature(&expected, &Flat));
        assert!(!two_ints().matches_signature(&expected, &Flat));
    }

    #[test]
    fn test_display() {
        assert_eq!(two_ints().to_string(), "callable(int, int): int");
        assert_eq!(FunctionType::callable().to_string(), "callable");
    }
}
