//! Process-wide symbol table.
//!
//! Holds every known class, interface and trait plus global functions and
//! constants. Class names are case-insensitive and keyed by their lowercase
//! qualified form without the leading `\`.
//!
//! # Module structure
//!
//! - `class`: [`ClassEntry`] and its member tables, trait flattening
//! - `tests`: registry and lookup tests

mod class;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::analyze::lattice::{FunctionType, Hierarchy, Type, TypeUnion};

pub use class::{
    ClassEntry, ClassKind, Member, MemberKind, TraitCollision, TraitRule, Visibility,
};

/// Registry key for a class or function name
pub fn symbol_key(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

/// A member found by [`Registry::find_member`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub ty: TypeUnion,
    pub declared: Option<TypeUnion>,
    pub visibility: Visibility,
    pub declaring_class: String,
    /// Declared spelling when the name only matched case-insensitively
    pub canonical_name: Option<String>,
    /// Resolved through `__call`, `__callStatic` or `__get`
    pub magic: bool,
}

impl Resolved {
    fn unknown(class: &str) -> Self {
        Self {
            ty: TypeUnion::mixed(),
            declared: None,
            visibility: Visibility::Public,
            declaring_class: class.to_string(),
            canonical_name: None,
            magic: false,
        }
    }

    fn from_member(member: &Member, requested: &str) -> Self {
        Self {
            ty: member.ty.clone(),
            declared: member.declared.clone(),
            visibility: member.visibility,
            declaring_class: member.declaring_class.clone(),
            canonical_name: (member.name != requested).then(|| member.name.clone()),
            magic: false,
        }
    }
}

/// Outcome of a visibility-aware member lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Resolved),
    /// The member exists but the calling class may not see it
    Inaccessible(Resolved),
    Missing,
}

/// Class/function/constant tables shared by every file of a session.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    classes: HashMap<String, ClassEntry>,
    functions: HashMap<String, Arc<FunctionType>>,
    constants: HashMap<String, TypeUnion>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Classes ====================

    /// Register a class. An existing non-placeholder entry wins and the
    /// new one is dropped; returns whether `entry` was stored.
    pub fn add_class(&mut self, entry: ClassEntry) -> bool {
        let key = symbol_key(&entry.name);
        match self.classes.get(&key) {
            Some(existing) if !existing.placeholder => false,
            _ => {
                self.classes.insert(key, entry);
                true
            }
        }
    }

    /// Register a placeholder for `name` unless something is already known
    pub fn add_unknown_class(&mut self, name: &str) {
        let key = symbol_key(name);
        self.classes
            .entry(key)
            .or_insert_with(|| ClassEntry::placeholder(name));
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(&symbol_key(name))
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassEntry> {
        self.classes.get_mut(&symbol_key(name))
    }

    /// A declared (non-placeholder) class
    pub fn declared_class(&self, name: &str) -> Option<&ClassEntry> {
        self.class(name).filter(|c| !c.placeholder)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(&symbol_key(name))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// `name` followed by its parent chain; stops at unknown names and cycles
    pub fn parent_chain(&self, name: &str) -> Vec<&ClassEntry> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.class(name);
        while let Some(entry) = current {
            if !seen.insert(symbol_key(&entry.name)) {
                break;
            }
            chain.push(entry);
            current = entry.parent.as_deref().and_then(|p| self.class(p));
        }
        chain
    }

    /// Every class and interface `name` extends or implements, itself included
    pub fn ancestors(&self, name: &str) -> Vec<&ClassEntry> {
        let mut result: Vec<&ClassEntry> = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(next) = stack.pop() {
            if !seen.insert(symbol_key(&next)) {
                continue;
            }
            let Some(entry) = self.class(&next) else {
                continue;
            };
            if let Some(parent) = &entry.parent {
                stack.push(parent.clone());
            }
            stack.extend(entry.interfaces.iter().rev().cloned());
            result.push(entry);
        }
        result
    }

    /// True when some ancestor of `name` is not fully known
    fn has_unknown_ancestor(&self, name: &str) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(next) = stack.pop() {
            if !seen.insert(symbol_key(&next)) {
                continue;
            }
            match self.class(&next) {
                None => return true,
                Some(entry) if entry.placeholder => return true,
                Some(entry) => {
                    stack.extend(entry.parent.iter().cloned());
                    stack.extend(entry.interfaces.iter().cloned());
                }
            }
        }
        false
    }

    /// Method by name anywhere in the hierarchy, ignoring visibility
    pub fn has_method(&self, class: &str, method: &str) -> bool {
        self.ancestors(class)
            .iter()
            .any(|entry| entry.own_method(method).is_some())
    }

    // ==================== Member lookup ====================

    /// Visibility-aware member lookup.
    ///
    /// Searches the class, its parent chain, then its interfaces. `public`
    /// members are always visible, `protected` ones when `calling` is the
    /// declaring class or a descendant of it, and `private` ones only when
    /// `calling` is the declaring class itself. An exact-case miss retries
    /// case-insensitively (reported through `canonical_name`); a full miss
    /// falls back to `__call`/`__callStatic` for methods and `__get` for
    /// instance properties. Placeholder classes resolve everything to
    /// `mixed`.
    pub fn find_member(
        &self,
        class: &str,
        kind: MemberKind,
        name: &str,
        calling: Option<&str>,
    ) -> Lookup {
        let Some(entry) = self.class(class) else {
            return Lookup::Missing;
        };
        if entry.placeholder {
            return Lookup::Found(Resolved::unknown(&entry.name));
        }

        for ignore_case in [false, true] {
            if let Some(member) = self.search(class, kind, name, ignore_case) {
                let resolved = Resolved::from_member(member, name);
                return if self.is_visible(member, calling) {
                    Lookup::Found(resolved)
                } else {
                    Lookup::Inaccessible(resolved)
                };
            }
        }

        if self.has_unknown_ancestor(class) {
            return Lookup::Found(Resolved::unknown(&entry.name));
        }

        let magic = match kind {
            MemberKind::InstanceMethod => Some("__call"),
            MemberKind::StaticMethod => Some("__callStatic"),
            MemberKind::InstanceProperty => Some("__get"),
            MemberKind::StaticProperty | MemberKind::Constant => None,
        };
        if let Some(magic) = magic {
            if self.search(class, MemberKind::InstanceMethod, magic, true).is_some()
                || self.search(class, MemberKind::StaticMethod, magic, true).is_some()
            {
                return Lookup::Found(Resolved {
                    magic: true,
                    ..Resolved::unknown(&entry.name)
                });
            }
        }
        if kind == MemberKind::InstanceProperty
            && self.ancestors(class).iter().any(|c| c.dynamic_properties)
        {
            return Lookup::Found(Resolved::unknown(&entry.name));
        }
        Lookup::Missing
    }

    fn search(&self, class: &str, kind: MemberKind, name: &str, ignore_case: bool) -> Option<&Member> {
        let ancestors = self.ancestors(class);
        // Methods callable statically may be instance methods (`parent::foo()`)
        // and instance calls may reach static methods.
        let kinds: &[MemberKind] = match kind {
            MemberKind::InstanceMethod => &[MemberKind::InstanceMethod, MemberKind::StaticMethod],
            MemberKind::StaticMethod => &[MemberKind::StaticMethod, MemberKind::InstanceMethod],
            MemberKind::InstanceProperty => &[MemberKind::InstanceProperty],
            MemberKind::StaticProperty => &[MemberKind::StaticProperty],
            MemberKind::Constant => &[MemberKind::Constant],
        };
        kinds.iter().find_map(|kind| {
            ancestors
                .iter()
                .find_map(|entry| entry.own_member(*kind, name, ignore_case))
        })
    }

    fn is_visible(&self, member: &Member, calling: Option<&str>) -> bool {
        match member.visibility {
            Visibility::Public => true,
            Visibility::Protected => {
                calling.is_some_and(|c| self.is_subclass_of(c, &member.declaring_class))
            }
            Visibility::Private => {
                calling.is_some_and(|c| symbol_key(c) == symbol_key(&member.declaring_class))
            }
        }
    }

    /// Replace the signature of a method after its body has been analyzed
    pub fn update_method(&mut self, class: &str, name: &str, function: FunctionType) {
        let Some(entry) = self.class_mut(class) else {
            return;
        };
        for kind in [MemberKind::InstanceMethod, MemberKind::StaticMethod] {
            if let Some(member) = entry.table_mut(kind).get_mut(name) {
                member.ty = TypeUnion::of(Type::Function(Arc::new(function)));
                return;
            }
        }
    }

    // ==================== Functions and constants ====================

    /// Register a function; the first declaration wins
    pub fn add_function(&mut self, qualified: &str, function: FunctionType) -> bool {
        let key = symbol_key(qualified);
        if self.functions.contains_key(&key) {
            return false;
        }
        self.functions.insert(key, Arc::new(function));
        true
    }

    /// Replace a function signature (inferred return type after analysis)
    pub fn update_function(&mut self, qualified: &str, function: FunctionType) {
        self.functions.insert(symbol_key(qualified), Arc::new(function));
    }

    pub fn function(&self, qualified: &str) -> Option<&Arc<FunctionType>> {
        self.functions.get(&symbol_key(qualified))
    }

    /// Define a constant; the first definition wins
    pub fn add_constant(&mut self, qualified: &str, ty: TypeUnion) -> bool {
        let key = qualified.trim_start_matches('\\').to_string();
        if self.constants.contains_key(&key) {
            return false;
        }
        self.constants.insert(key, ty);
        true
    }

    pub fn constant(&self, qualified: &str) -> Option<&TypeUnion> {
        self.constants.get(qualified.trim_start_matches('\\'))
    }
}

impl Hierarchy for Registry {
    /// Unknown classes and classes with unresolved ancestors are assumed to match
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        if symbol_key(child) == symbol_key(ancestor) {
            return true;
        }
        let ancestor_key = symbol_key(ancestor);
        if self
            .ancestors(child)
            .iter()
            .any(|entry| symbol_key(&entry.name) == ancestor_key)
        {
            return true;
        }
        self.has_unknown_ancestor(child)
    }

    fn is_stringable(&self, class: &str) -> bool {
        self.is_subclass_of(class, "Stringable") || self.has_method(class, "__toString")
    }
}
