//! Lattice operations on single members:
//! - matches: "usable where `expected` is required" (not symmetric)
//! - combine: least specific single member covering both inputs
//! - as_true / as_false: truthiness splitting used by narrowing

use super::types::{Sentinel, Type};

/// Class relationships needed by the subtype test.
pub trait Hierarchy {
    /// `child` is `ancestor` or inherits/implements it
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool;

    /// Instances of `class` convert to string (`__toString`)
    fn is_stringable(&self, _class: &str) -> bool {
        false
    }
}

/// Hierarchy without inheritance: classes only match themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl Hierarchy for Flat {
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        child.eq_ignore_ascii_case(ancestor)
    }
}

fn literal_matches<T: PartialEq>(value: &Option<T>, expected: &Option<T>) -> bool {
    expected.is_none() || value == expected
}

impl Type {
    /// Subtype test: `self` is usable where `expected` is required.
    ///
    /// `Mixed` expected accepts anything; a `Mixed` value is only usable
    /// where `Mixed` is expected.
    pub fn matches(&self, expected: &Type, h: &dyn Hierarchy) -> bool {
        use Type::*;
        match (self, expected) {
            (_, Mixed) => true,
            (Mixed, _) => false,
            (Void, _) => true,
            (_, Void) => false,
            (Optional { content, sentinel }, _) => {
                content.matches(expected, h)
                    && sentinel.types().iter().all(|s| s.matches(expected, h))
            }
            (_, Optional { content, sentinel }) => match Sentinel::of(self) {
                Some(own) if sentinel.contains(own) => true,
                _ => self.matches(content, h),
            },
            (Bool(a), Bool(b)) => literal_matches(a, b),
            (Int(a), Int(b)) => literal_matches(a, b),
            (Int(_), Float(None)) => true,
            (Float(a), Float(b)) => literal_matches(a, b),
            (String(a), String(b)) => literal_matches(a, b),
            (Null, Null) | (Resource, Resource) => true,
            (
                IndexedArray(member) | AssociativeArray(member),
                IndexedArray(expected_member) | AssociativeArray(expected_member),
            ) => {
                member.is_empty()
                    || expected_member.is_empty()
                    || member.complies_with(expected_member, h)
            }
            (Function(f), Function(e)) => f.matches_signature(e, h),
            (Function(_), ClassInstance(name)) => name.eq_ignore_ascii_case("Closure"),
            (ClassInstance(name), Function(e)) => {
                e.any_signature && h.is_subclass_of(name, "Closure")
            }
            (String(_) | IndexedArray(_), Function(e)) => e.any_signature,
            (ClassInstance(a), ClassInstance(b)) => h.is_subclass_of(a, b),
            (ClassInstance(a), Class(b)) | (Class(a), Class(b)) => h.is_subclass_of(a, b),
            (ClassInstance(name), String(None)) => h.is_stringable(name),
            _ => false,
        }
    }

    /// Merge two members into one if a single member can express both.
    ///
    /// `false` and `null` combined with another type promote it to an
    /// `Optional` with that sentinel. `None` means both must be kept.
    pub fn combine(&self, other: &Type) -> Option<Type> {
        use Type::*;
        let h = Flat;
        if other.matches(self, &h) {
            return Some(self.clone());
        }
        if self.matches(other, &h) {
            return Some(other.clone());
        }
        match (self, other) {
            (Bool(_), Bool(_)) => Some(Bool(None)),
            (Int(_), Int(_)) => Some(Int(None)),
            (Float(_), Float(_)) | (Int(_), Float(_)) | (Float(_), Int(_)) => Some(Float(None)),
            (String(_), String(_)) => Some(String(None)),
            (IndexedArray(a), IndexedArray(b)) => {
                let mut member = (**a).clone();
                member.add_types_from(b);
                Some(Type::indexed(member))
            }
            (IndexedArray(a) | AssociativeArray(a), IndexedArray(b) | AssociativeArray(b)) => {
                let mut member = (**a).clone();
                member.add_types_from(b);
                Some(Type::associative(member))
            }
            (Function(_), Function(_)) => Some(Type::callable()),
            (
                Optional {
                    content: a,
                    sentinel: sa,
                },
                Optional {
                    content: b,
                    sentinel: sb,
                },
            ) => a
                .combine(b)
                .map(|content| Type::optional(content, sa.union(*sb))),
            (Optional { content, sentinel }, t) | (t, Optional { content, sentinel }) => {
                match Sentinel::of(t) {
                    Some(s) => Some(Type::optional((**content).clone(), sentinel.union(s))),
                    None => content
                        .combine(t)
                        .map(|content| Type::optional(content, *sentinel)),
                }
            }
            (t, s) | (s, t) if Sentinel::of(s).is_some() && promotable(t, s) => {
                Sentinel::of(s).map(|sentinel| Type::optional(t.clone(), sentinel))
            }
            _ => None,
        }
    }

    /// Values of `self` consistent with a truthy test, or `None` if impossible
    pub fn as_true(&self) -> Option<Type> {
        use Type::*;
        match self {
            Void => None,
            Null => None,
            Bool(Some(false)) => None,
            Bool(None) => Some(Bool(Some(true))),
            Int(Some(0)) => None,
            Float(Some(f)) if *f == 0.0 => None,
            String(Some(s)) if s.is_empty() || s == "0" => None,
            Optional { content, .. } => content.as_true(),
            other => Some(other.clone()),
        }
    }

    /// Values of `self` consistent with a falsy test, or `None` if impossible
    pub fn as_false(&self) -> Option<Type> {
        use Type::*;
        match self {
            Void => None,
            Mixed => Some(Mixed),
            Null => Some(Null),
            Bool(Some(true)) => None,
            Bool(_) => Some(Bool(Some(false))),
            Int(Some(0)) => Some(Int(Some(0))),
            Int(Some(_)) => None,
            Int(None) => Some(Int(Some(0))),
            Float(Some(f)) if *f != 0.0 => None,
            Float(_) => Some(Float(Some(0.0))),
            String(Some(s)) if !(s.is_empty() || s == "0") => None,
            String(v) => Some(String(v.clone())),
            AssociativeArray(_) | IndexedArray(_) => Some(self.clone()),
            Resource | Function(_) | Class(_) | ClassInstance(_) => None,
            Optional { sentinel, .. } => match sentinel {
                Sentinel::False => Some(Bool(Some(false))),
                Sentinel::Null => Some(Null),
                Sentinel::FalseOrNull => Some(Type::optional(Bool(Some(false)), Sentinel::Null)),
            },
        }
    }
}

/// Whether `t` can absorb the sentinel `s` into an Optional
fn promotable(t: &Type, s: &Type) -> bool {
    match (t, s) {
        (Type::Mixed | Type::Void | Type::Null, _) => false,
        (Type::Bool(_), Type::Bool(_)) => false,
        (Type::Bool(Some(false)), Type::Null) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lattice::TypeUnion;

    struct Tree;

    impl Hierarchy for Tree {
        fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
            child.eq_ignore_ascii_case(ancestor) || (child == "Bar" && ancestor == "Foo")
        }

        fn is_stringable(&self, class: &str) -> bool {
            class == "Name"
        }
    }

    #[test]
    fn test_mixed_absorption() {
        let samples = [
            Type::int(),
            Type::string_value("x"),
            Type::Null,
            Type::array(),
            Type::instance("Foo"),
            Type::optional(Type::string(), Sentinel::False),
        ];
        for t in &samples {
            assert!(t.matches(&Type::Mixed, &Flat), "{} should match mixed", t);
            assert!(!Type::Mixed.matches(t, &Flat), "mixed should not match {}", t);
        }
        assert!(Type::Mixed.matches(&Type::Mixed, &Flat));
    }

    #[test]
    fn test_literal_refinement() {
        assert!(Type::Int(Some(3)).matches(&Type::int(), &Flat));
        assert!(!Type::int().matches(&Type::Int(Some(3)), &Flat));
        assert!(Type::Int(Some(3)).matches(&Type::float(), &Flat));
        assert!(!Type::float().matches(&Type::int(), &Flat));
    }

    #[test]
    fn test_optional_matching() {
        let nullable = Type::optional(Type::string(), Sentinel::Null);
        assert!(Type::Null.matches(&nullable, &Flat));
        assert!(Type::string_value("a").matches(&nullable, &Flat));
        assert!(!Type::Bool(Some(false)).matches(&nullable, &Flat));
        assert!(!nullable.matches(&Type::string(), &Flat));
        assert!(!Type::Null.matches(&Type::string(), &Flat));
    }

    #[test]
    fn test_instances_follow_hierarchy() {
        assert!(Type::instance("Bar").matches(&Type::instance("Foo"), &Tree));
        assert!(!Type::instance("Foo").matches(&Type::instance("Bar"), &Tree));
        assert!(Type::instance("Foo").matches(&Type::Class("Foo".into()), &Tree));
        assert!(Type::instance("Name").matches(&Type::string(), &Tree));
        assert!(!Type::instance("Foo").matches(&Type::string(), &Tree));
    }

    #[test]
    fn test_indexed_array_covariance() {
        let ints = Type::indexed(TypeUnion::of(Type::int()));
        let floats = Type::indexed(TypeUnion::of(Type::float()));
        let strings = Type::indexed(TypeUnion::of(Type::string()));
        assert!(ints.matches(&floats, &Flat));
        assert!(!strings.matches(&ints, &Flat));
        assert!(Type::indexed(TypeUnion::empty()).matches(&ints, &Flat));
        assert!(strings.matches(&Type::array(), &Flat));
    }

    #[test]
    fn test_false_promotes_to_optional() {
        let combined = Type::Bool(Some(false)).combine(&Type::string()).unwrap();
        assert_eq!(combined, Type::optional(Type::string(), Sentinel::False));
        assert_eq!(combined.as_true(), Some(Type::string()));
        assert_eq!(combined.as_false(), Some(Type::Bool(Some(false))));
        assert_eq!(combined.combine(&Type::Bool(Some(false))), Some(combined.clone()));
    }

    #[test]
    fn test_null_promotes_to_optional() {
        let combined = Type::instance("Foo").combine(&Type::Null).unwrap();
        assert_eq!(combined, Type::optional(Type::instance("Foo"), Sentinel::Null));
        let wider = combined.combine(&Type::Bool(Some(false))).unwrap();
        assert_eq!(wider, Type::optional(Type::instance("Foo"), Sentinel::FalseOrNull));
    }

    #[test]
    fn test_combine_widens_literals() {
        assert_eq!(Type::Int(Some(1)).combine(&Type::Int(Some(2))), Some(Type::int()));
        assert_eq!(Type::Int(Some(1)).combine(&Type::Int(Some(1))), Some(Type::Int(Some(1))));
        assert_eq!(Type::int().combine(&Type::float()), Some(Type::float()));
        assert_eq!(Type::int().combine(&Type::string()), None);
        assert_eq!(Type::Bool(Some(false)).combine(&Type::Bool(Some(true))), Some(Type::bool()));
    }

    #[test]
    fn test_truthiness_split() {
        assert_eq!(Type::Bool(Some(true)).as_false(), None);
        assert_eq!(Type::bool().as_true(), Some(Type::Bool(Some(true))));
        assert_eq!(Type::Null.as_true(), None);
        assert_eq!(Type::instance("Foo").as_false(), None);
        assert_eq!(Type::Int(Some(0)).as_true(), None);
        assert_eq!(Type::string_value("0").as_true(), None);
        assert_eq!(Type::Mixed.as_true(), Some(Type::Mixed));
    }
}
