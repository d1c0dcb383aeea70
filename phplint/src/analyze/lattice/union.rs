//! Deduplicated sets of lattice members.

use std::fmt;

use super::ops::{Flat, Hierarchy};
use super::types::{ConstValue, Sentinel, Type};
use super::MAX_UNION_LENGTH;

/// "This expression could be any one of these types."
///
/// The empty union is the canonical void value. A union holding `Mixed`
/// holds nothing else. Equality ignores member order.
#[derive(Clone, Debug, Default)]
pub struct TypeUnion {
    members: Vec<Type>,
}

impl PartialEq for TypeUnion {
    fn eq(&self, other: &Self) -> bool {
        // Members are pairwise distinct, so equal lengths plus inclusion is set equality
        self.members.len() == other.members.len()
            && self.members.iter().all(|m| other.members.contains(m))
    }
}

impl TypeUnion {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn mixed() -> Self {
        Self {
            members: vec![Type::Mixed],
        }
    }

    pub fn of(ty: Type) -> Self {
        let mut union = Self::empty();
        union.add_type(ty);
        union
    }

    pub fn from_types(types: impl IntoIterator<Item = Type>) -> Self {
        let mut union = Self::empty();
        for ty in types {
            union.add_type(ty);
        }
        union
    }

    pub fn members(&self) -> &[Type] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.members.as_slice(), [Type::Mixed])
    }

    /// Unknown for checking purposes: empty or mixed
    pub fn is_unknown(&self) -> bool {
        self.is_empty() || self.is_mixed()
    }

    pub fn single(&self) -> Option<&Type> {
        match self.members.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// The literal value if this union is exactly one refined member
    pub fn value(&self) -> Option<ConstValue> {
        self.single().and_then(Type::value)
    }

    pub fn contains_signature(&self, signature: &str) -> bool {
        self.members.iter().any(|m| m.signature() == signature)
    }

    pub fn may_be_null(&self) -> bool {
        self.members.iter().any(|m| match m {
            Type::Null | Type::Mixed => true,
            Type::Optional { sentinel, .. } => sentinel.has_null(),
            _ => false,
        })
    }

    /// Add a member, merging with an existing member where one type covers both
    pub fn add_type(&mut self, ty: Type) {
        match ty {
            Type::Void => return,
            Type::Mixed => {
                self.members = vec![Type::Mixed];
                return;
            }
            _ if self.is_mixed() => return,
            _ => {}
        }

        let signature = ty.signature();
        let same = self
            .members
            .iter()
            .position(|m| m.signature() == signature)
            .and_then(|i| self.members[i].combine(&ty).map(|merged| (i, merged)));
        let merged = same.or_else(|| {
            self.members
                .iter()
                .enumerate()
                .find_map(|(i, m)| m.combine(&ty).map(|merged| (i, merged)))
        });

        match merged {
            Some((index, merged)) => {
                self.members.remove(index);
                // The merged member may now cover others (e.g. `null` after promotion)
                self.add_type(merged);
            }
            None => self.members.push(ty),
        }

        if self.members.len() > MAX_UNION_LENGTH {
            self.members = vec![Type::Mixed];
        }
    }

    pub fn add_types_from(&mut self, other: &TypeUnion) {
        for ty in &other.members {
            self.add_type(ty.clone());
        }
    }

    pub fn union(&self, other: &TypeUnion) -> TypeUnion {
        let mut result = self.clone();
        result.add_types_from(other);
        result
    }

    /// Remove the members named by `signature`.
    ///
    /// `"null"` and `"false"` also strip the matching sentinel from
    /// Optional members; `"false"` narrows `bool` to `true`.
    pub fn excluding(&self, signature: &str) -> TypeUnion {
        let mut result = TypeUnion::empty();
        for member in &self.members {
            match (signature, member) {
                ("null", Type::Null) => {}
                ("false", Type::Bool(Some(false))) => {}
                ("false", Type::Bool(None)) => result.add_type(Type::Bool(Some(true))),
                ("null" | "false", Type::Optional { content, sentinel }) => {
                    let stripped = match (signature, sentinel) {
                        ("null", Sentinel::Null) | ("false", Sentinel::False) => None,
                        ("null", Sentinel::FalseOrNull) => Some(Sentinel::False),
                        ("false", Sentinel::FalseOrNull) => Some(Sentinel::Null),
                        _ => Some(*sentinel),
                    };
                    match stripped {
                        Some(sentinel) => {
                            result.add_type(Type::optional((**content).clone(), sentinel))
                        }
                        None => result.add_type((**content).clone()),
                    }
                }
                (sig, m) if m.signature() == sig => {}
                (_, m) => result.add_type(m.clone()),
            }
        }
        result
    }

    pub fn without_null(&self) -> TypeUnion {
        self.excluding("null")
    }

    /// Members of either side that the other side accepts
    pub fn intersection(&self, other: &TypeUnion, h: &dyn Hierarchy) -> TypeUnion {
        if self.is_mixed() {
            return other.clone();
        }
        if other.is_mixed() {
            return self.clone();
        }
        let mut result = TypeUnion::empty();
        for a in &self.members {
            for b in &other.members {
                if a.matches(b, h) {
                    result.add_type(a.clone());
                } else if b.matches(a, h) {
                    result.add_type(b.clone());
                }
            }
        }
        result
    }

    /// Members of `self` not accepted by `other`
    pub fn difference(&self, other: &TypeUnion, h: &dyn Hierarchy) -> TypeUnion {
        let mut result = TypeUnion::empty();
        for member in &self.members {
            if let Type::Optional { content, sentinel } = member {
                let removed: Vec<Type> = sentinel
                    .types()
                    .into_iter()
                    .filter(|s| !other.members.iter().any(|o| s.matches(o, h)))
                    .collect();
                if !other.members.iter().any(|o| content.matches(o, h)) {
                    result.add_type((**content).clone());
                }
                for s in removed {
                    result.add_type(s);
                }
                continue;
            }
            if !other.members.iter().any(|o| member.matches(o, h)) {
                result.add_type(member.clone());
            }
        }
        result
    }

    /// Narrow a single-member union to `value` when the kinds agree
    pub fn with_value(&self, value: ConstValue) -> TypeUnion {
        let refined = value.to_type();
        match self.single() {
            Some(only) if only.signature() == refined.signature() => TypeUnion::of(refined),
            _ => self.clone(),
        }
    }

    /// The same union with literal refinements dropped
    pub fn widened(&self) -> TypeUnion {
        TypeUnion::from_types(self.members.iter().map(Type::widened))
    }

    pub fn as_true(&self) -> TypeUnion {
        TypeUnion::from_types(self.members.iter().filter_map(Type::as_true))
    }

    pub fn as_false(&self) -> TypeUnion {
        TypeUnion::from_types(self.members.iter().filter_map(Type::as_false))
    }

    /// Lenient check: some member of `self` is usable as some member of
    /// `expected`. Unknown values and Optional content are accepted.
    pub fn matches(&self, expected: &TypeUnion, h: &dyn Hierarchy) -> bool {
        if self.is_unknown() || expected.is_unknown() {
            return true;
        }
        self.members.iter().any(|m| {
            expected.members.iter().any(|e| {
                m.matches(e, h)
                    || matches!(m, Type::Optional { content, .. } if content.matches(e, h))
            })
        })
    }

    /// Strict check: every member of `self` is usable as some member of
    /// `expected`. `Mixed` members comply with anything.
    pub fn complies_with(&self, expected: &TypeUnion, h: &dyn Hierarchy) -> bool {
        if expected.is_mixed() {
            return true;
        }
        self.members.iter().all(|m| {
            m.is_mixed() || expected.members.iter().any(|e| m.matches(e, h)) || {
                // `string|false` complies with `string|false` spelled as two members
                match m {
                    Type::Optional { content, sentinel } => {
                        TypeUnion::of((**content).clone()).complies_with(expected, h)
                            && sentinel.to_union().complies_with(expected, h)
                    }
                    _ => false,
                }
            }
        })
    }

    /// Structural equality ignoring literal refinements
    pub fn same_shape(&self, other: &TypeUnion) -> bool {
        let h = Flat;
        self.widened().complies_with(&other.widened(), &h)
            && other.widened().complies_with(&self.widened(), &h)
    }
}

impl From<Type> for TypeUnion {
    fn from(ty: Type) -> Self {
        TypeUnion::of(ty)
    }
}

impl FromIterator<Type> for TypeUnion {
    fn from_iter<I: IntoIterator<Item = Type>>(iter: I) -> Self {
        TypeUnion::from_types(iter)
    }
}

impl fmt::Display for TypeUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() {
            return write!(f, "void");
        }
        let parts: Vec<String> = self.members.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", parts.join("|"))
    }
}
