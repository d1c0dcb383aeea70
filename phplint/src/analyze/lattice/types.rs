//! Lattice members.
//!
//! The lattice hierarchy is:
//!
//! ```text
//! Mixed (any value - most general)
//!   ↑
//! Optional (T or a falsy sentinel: false / null)
//!   ↑
//! Scalars, arrays, callables, classes and instances
//!   ↑
//! Literal refinements (Bool(true), Int(0), String("foo"))
//!   ↑
//! Void (empty set - most specific)
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::function::FunctionType;
use super::union::TypeUnion;

/// A literal value known statically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

impl ConstValue {
    /// The lattice member carrying this value
    pub fn to_type(&self) -> Type {
        match self {
            ConstValue::Bool(b) => Type::Bool(Some(*b)),
            ConstValue::Int(i) => Type::Int(Some(*i)),
            ConstValue::Float(f) => Type::Float(Some(*f)),
            ConstValue::String(s) => Type::String(Some(s.clone())),
            ConstValue::Null => Type::Null,
        }
    }

    /// PHP truthiness of the value
    pub fn is_truthy(&self) -> bool {
        match self {
            ConstValue::Bool(b) => *b,
            ConstValue::Int(i) => *i != 0,
            ConstValue::Float(f) => *f != 0.0,
            ConstValue::String(s) => !(s.is_empty() || s == "0"),
            ConstValue::Null => false,
        }
    }

    /// String conversion used when folding concatenations
    pub fn to_php_string(&self) -> String {
        match self {
            ConstValue::Bool(true) => "1".to_string(),
            ConstValue::Bool(false) | ConstValue::Null => String::new(),
            ConstValue::Int(i) => i.to_string(),
            ConstValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            ConstValue::String(s) => s.clone(),
        }
    }
}

/// The falsy fallback carried by an `Optional` type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Sentinel {
    False,
    Null,
    FalseOrNull,
}

impl Sentinel {
    /// The sentinel a plain type stands for, if it is one
    pub fn of(ty: &Type) -> Option<Sentinel> {
        match ty {
            Type::Bool(Some(false)) => Some(Sentinel::False),
            Type::Null => Some(Sentinel::Null),
            _ => None,
        }
    }

    pub fn union(self, other: Sentinel) -> Sentinel {
        if self == other {
            self
        } else {
            Sentinel::FalseOrNull
        }
    }

    /// True when every value of `other` is also a value of `self`
    pub fn contains(self, other: Sentinel) -> bool {
        self == other || self == Sentinel::FalseOrNull
    }

    pub fn has_null(self) -> bool {
        matches!(self, Sentinel::Null | Sentinel::FalseOrNull)
    }

    pub fn has_false(self) -> bool {
        matches!(self, Sentinel::False | Sentinel::FalseOrNull)
    }

    /// The sentinel values as plain lattice members
    pub fn types(self) -> Vec<Type> {
        match self {
            Sentinel::False => vec![Type::Bool(Some(false))],
            Sentinel::Null => vec![Type::Null],
            Sentinel::FalseOrNull => vec![Type::Bool(Some(false)), Type::Null],
        }
    }

    pub fn to_union(self) -> TypeUnion {
        TypeUnion::from_types(self.types())
    }
}

/// A single lattice member.
///
/// Array member unions left empty mean "unknown member type" and match
/// any other member type.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Mixed,
    Void,
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    String(Option<String>),
    Null,
    Resource,
    AssociativeArray(Box<TypeUnion>),
    IndexedArray(Box<TypeUnion>),
    Function(Arc<FunctionType>),
    /// The class itself (static access, `Foo::class`), keyed by qualified name
    Class(String),
    /// An instance of the named class
    ClassInstance(String),
    Optional {
        content: Box<Type>,
        sentinel: Sentinel,
    },
}

impl Type {
    pub fn bool() -> Type {
        Type::Bool(None)
    }

    pub fn int() -> Type {
        Type::Int(None)
    }

    pub fn float() -> Type {
        Type::Float(None)
    }

    pub fn string() -> Type {
        Type::String(None)
    }

    pub fn string_value(value: impl Into<String>) -> Type {
        Type::String(Some(value.into()))
    }

    /// `array` with unknown keys and members
    pub fn array() -> Type {
        Type::AssociativeArray(Box::default())
    }

    pub fn indexed(member: TypeUnion) -> Type {
        Type::IndexedArray(Box::new(member))
    }

    pub fn associative(member: TypeUnion) -> Type {
        Type::AssociativeArray(Box::new(member))
    }

    pub fn instance(name: impl Into<String>) -> Type {
        Type::ClassInstance(name.into())
    }

    pub fn callable() -> Type {
        Type::Function(Arc::new(FunctionType::callable()))
    }

    /// Wrap `content` so it may also be `sentinel`; already-optional content widens its sentinel
    pub fn optional(content: Type, sentinel: Sentinel) -> Type {
        match content {
            Type::Optional {
                content,
                sentinel: inner,
            } => Type::Optional {
                content,
                sentinel: inner.union(sentinel),
            },
            Type::Mixed => Type::Mixed,
            other => Type::Optional {
                content: Box::new(other),
                sentinel,
            },
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Type::Mixed)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::AssociativeArray(_) | Type::IndexedArray(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int(_) | Type::Float(_))
    }

    /// The literal this member is refined to, if any
    pub fn value(&self) -> Option<ConstValue> {
        match self {
            Type::Bool(Some(b)) => Some(ConstValue::Bool(*b)),
            Type::Int(Some(i)) => Some(ConstValue::Int(*i)),
            Type::Float(Some(f)) => Some(ConstValue::Float(*f)),
            Type::String(Some(s)) => Some(ConstValue::String(s.clone())),
            Type::Null => Some(ConstValue::Null),
            _ => None,
        }
    }

    /// The same member without its literal refinement
    pub fn widened(&self) -> Type {
        match self {
            Type::Bool(_) => Type::Bool(None),
            Type::Int(_) => Type::Int(None),
            Type::Float(_) => Type::Float(None),
            Type::String(_) => Type::String(None),
            other => other.clone(),
        }
    }

    /// Member type of an array, or `None` if this is not an array
    pub fn array_member(&self) -> Option<&TypeUnion> {
        match self {
            Type::AssociativeArray(m) | Type::IndexedArray(m) => Some(m),
            _ => None,
        }
    }

    /// Class name for instances and class types
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name) | Type::ClassInstance(name) => Some(name),
            _ => None,
        }
    }

    /// Canonical key used to deduplicate union members
    pub fn signature(&self) -> String {
        match self {
            Type::Mixed => "mixed".to_string(),
            Type::Void => "void".to_string(),
            Type::Bool(_) => "bool".to_string(),
            Type::Int(_) => "int".to_string(),
            Type::Float(_) => "float".to_string(),
            Type::String(_) => "string".to_string(),
            Type::Null => "null".to_string(),
            Type::Resource => "resource".to_string(),
            Type::AssociativeArray(_) | Type::IndexedArray(_) => "array".to_string(),
            Type::Function(_) => "callable".to_string(),
            Type::Class(name) => format!("class:{}", name.to_ascii_lowercase()),
            Type::ClassInstance(name) => name.to_ascii_lowercase(),
            Type::Optional { content, .. } => content.signature(),
        }
    }
}

impl From<ConstValue> for Type {
    fn from(value: ConstValue) -> Self {
        value.to_type()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Mixed => write!(f, "mixed"),
            Type::Void => write!(f, "void"),
            Type::Bool(Some(true)) => write!(f, "true"),
            Type::Bool(Some(false)) => write!(f, "false"),
            Type::Bool(None) => write!(f, "bool"),
            Type::Int(_) => write!(f, "int"),
            Type::Float(_) => write!(f, "float"),
            Type::String(_) => write!(f, "string"),
            Type::Null => write!(f, "null"),
            Type::Resource => write!(f, "resource"),
            Type::IndexedArray(member) => match member.single() {
                _ if member.is_empty() => write!(f, "array"),
                Some(single) if !matches!(single, Type::Optional { .. }) => {
                    write!(f, "{}[]", single)
                }
                _ => write!(f, "list<{}>", member),
            },
            Type::AssociativeArray(member) => {
                if member.is_empty() {
                    write!(f, "array")
                } else {
                    write!(f, "array<{}>", member)
                }
            }
            Type::Function(func) => write!(f, "{}", func),
            Type::Class(name) => write!(f, "class-string<{}>", name),
            Type::ClassInstance(name) => write!(f, "{}", name),
            Type::Optional { content, sentinel } => match sentinel {
                Sentinel::False => write!(f, "{}|false", content),
                Sentinel::Null => write!(f, "{}|null", content),
                Sentinel::FalseOrNull => write!(f, "{}|false|null", content),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_truthiness() {
        assert!(!ConstValue::String("0".into()).is_truthy());
        assert!(ConstValue::String("00".into()).is_truthy());
        assert!(!ConstValue::Float(0.0).is_truthy());
        assert!(ConstValue::Int(-1).is_truthy());
    }

    #[test]
    fn test_optional_flattens() {
        let inner = Type::optional(Type::string(), Sentinel::False);
        let outer = Type::optional(inner, Sentinel::Null);
        assert_eq!(
            outer,
            Type::Optional {
                content: Box::new(Type::string()),
                sentinel: Sentinel::FalseOrNull
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::optional(Type::string(), Sentinel::False).to_string(), "string|false");
        assert_eq!(Type::indexed(TypeUnion::of(Type::int())).to_string(), "int[]");
        assert_eq!(Type::array().to_string(), "array");
        assert_eq!(Type::Bool(Some(true)).to_string(), "true");
    }

    #[test]
    fn test_signature_ignores_literal() {
        assert_eq!(Type::string_value("a").signature(), Type::string().signature());
        assert_eq!(Type::instance("App\\Foo").signature(), "app\\foo");
    }
}
