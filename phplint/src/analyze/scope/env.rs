//! Variable bindings for flow-sensitive inference.
//!
//! This module provides the `TypeEnv` type, which tracks the type of every
//! local variable at one program point. Branches fork the environment by
//! cloning it and converge by merging, so a clone must be cheap and a write
//! in one fork must never show up in another: the bindings live behind an
//! `Arc` and are copied only when a shared map is first written.

use std::collections::HashMap;
use std::sync::Arc;

use crate::analyze::lattice::TypeUnion;

/// Local variable bindings at one program point.
///
/// - `get`/`set`: Basic variable type lookup and assignment
/// - `update`: Join-based type update (only mutates if the type changes)
/// - `merge`: Join two environments (for control flow convergence)
/// - `snapshot`/`restore`: Save and restore environment state
///
/// # Example
/// ```
/// use phplint::analyze::lattice::{Type, TypeUnion};
/// use phplint::analyze::scope::TypeEnv;
///
/// let mut env = TypeEnv::new();
/// env.set("x", TypeUnion::of(Type::int()));
///
/// let mut branch = env.clone();
/// branch.set("x", TypeUnion::of(Type::string()));
/// assert_eq!(env.get("x"), Some(&TypeUnion::of(Type::int())));
///
/// env.merge(&branch);
/// assert_eq!(env.get("x").map(TypeUnion::len), Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeEnv {
    bindings: Arc<HashMap<String, TypeUnion>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the type of a variable, if bound.
    pub fn get(&self, name: &str) -> Option<&TypeUnion> {
        self.bindings.get(name)
    }

    /// Sets the type of a variable, replacing any existing binding.
    pub fn set(&mut self, name: &str, ty: TypeUnion) {
        Arc::make_mut(&mut self.bindings).insert(name.to_string(), ty);
    }

    pub fn remove(&mut self, name: &str) -> Option<TypeUnion> {
        if !self.bindings.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.bindings).remove(name)
    }

    /// Updates a variable's type by joining it with the existing type.
    ///
    /// Returns `true` if the binding changed.
    pub fn update(&mut self, name: &str, ty: TypeUnion) -> bool {
        match self.bindings.get(name) {
            Some(existing) => {
                let joined = existing.union(&ty);
                if &joined == existing {
                    false
                } else {
                    self.set(name, joined);
                    true
                }
            }
            None => {
                self.set(name, ty);
                true
            }
        }
    }

    /// Merges another environment into this one using join.
    ///
    /// Variables bound in both are joined, variables only in `other` are
    /// added, variables only in `self` are unchanged.
    pub fn merge(&mut self, other: &TypeEnv) {
        if Arc::ptr_eq(&self.bindings, &other.bindings) {
            return;
        }
        for (name, ty) in other.bindings.iter() {
            self.update(name, ty.clone());
        }
    }

    /// Merges another environment into this one and reports if anything changed.
    pub fn merge_changed(&mut self, other: &TypeEnv) -> bool {
        if Arc::ptr_eq(&self.bindings, &other.bindings) {
            return false;
        }
        let mut changed = false;
        for (name, ty) in other.bindings.iter() {
            if self.update(name, ty.clone()) {
                changed = true;
            }
        }
        changed
    }

    /// The join of two environments
    pub fn join(a: &TypeEnv, b: &TypeEnv) -> TypeEnv {
        let mut joined = a.clone();
        joined.merge(b);
        joined
    }

    /// Join of every environment in `envs`; `None` when there are none
    pub fn join_all<'a>(envs: impl IntoIterator<Item = &'a TypeEnv>) -> Option<TypeEnv> {
        let mut iter = envs.into_iter();
        let mut joined = iter.next()?.clone();
        for env in iter {
            joined.merge(env);
        }
        Some(joined)
    }

    /// Creates a snapshot of the current environment.
    pub fn snapshot(&self) -> TypeEnv {
        self.clone()
    }

    /// Restores the environment from a snapshot.
    pub fn restore(&mut self, snapshot: TypeEnv) {
        self.bindings = snapshot.bindings;
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Returns an iterator over the variable names in the environment.
    pub fn vars(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeUnion)> {
        self.bindings.iter()
    }

    pub fn clear(&mut self) {
        self.bindings = Arc::default();
    }
}
