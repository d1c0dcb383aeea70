//! Class, interface and trait entries.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::analyze::lattice::{FunctionType, Type, TypeUnion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_modifier(text: &str) -> Option<Visibility> {
        match text {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A method, property or constant of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Name as declared (properties without `$`)
    pub name: String,
    /// Type seen by readers
    pub ty: TypeUnion,
    /// Native or documented type writes must satisfy
    pub declared: Option<TypeUnion>,
    pub visibility: Visibility,
    /// Qualified name of the class whose body declares the member
    pub declaring_class: String,
    pub is_abstract: bool,
}

impl Member {
    pub fn new(
        name: impl Into<String>,
        ty: TypeUnion,
        visibility: Visibility,
        declaring_class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            declared: None,
            visibility,
            declaring_class: declaring_class.into(),
            is_abstract: false,
        }
    }

    pub fn method(function: FunctionType, visibility: Visibility, declaring_class: &str) -> Self {
        let name = function.name.clone().unwrap_or_default();
        Self::new(
            name,
            TypeUnion::of(Type::Function(Arc::new(function))),
            visibility,
            declaring_class,
        )
    }

    /// The signature if this member is a method
    pub fn function(&self) -> Option<&Arc<FunctionType>> {
        match self.ty.single() {
            Some(Type::Function(f)) => Some(f),
            _ => None,
        }
    }
}

/// Which member table a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    InstanceMethod,
    StaticMethod,
    InstanceProperty,
    StaticProperty,
    Constant,
}

impl MemberKind {
    pub fn is_method(&self) -> bool {
        matches!(self, MemberKind::InstanceMethod | MemberKind::StaticMethod)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            MemberKind::InstanceMethod | MemberKind::StaticMethod => "method",
            MemberKind::InstanceProperty | MemberKind::StaticProperty => "property",
            MemberKind::Constant => "constant",
        }
    }
}

/// Registry entry for one class-like symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    /// Qualified name without the leading `\`, as declared
    pub name: String,
    pub kind: ClassKind,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    /// Forward reference or unresolved autoload target; every lookup yields `mixed`
    pub placeholder: bool,
    /// Undeclared properties may be read and written (`stdClass`)
    pub dynamic_properties: bool,
    pub origin: Option<PathBuf>,
    pub instance_methods: HashMap<String, Member>,
    pub static_methods: HashMap<String, Member>,
    pub instance_properties: HashMap<String, Member>,
    pub static_properties: HashMap<String, Member>,
    pub constants: HashMap<String, Member>,
}

impl ClassEntry {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into().trim_start_matches('\\').to_string(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            placeholder: false,
            dynamic_properties: false,
            origin: None,
            instance_methods: HashMap::new(),
            static_methods: HashMap::new(),
            instance_properties: HashMap::new(),
            static_properties: HashMap::new(),
            constants: HashMap::new(),
        }
    }

    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(name, ClassKind::Class)
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into().trim_start_matches('\\').to_string());
        self
    }

    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces = interfaces
            .into_iter()
            .map(|i| i.into().trim_start_matches('\\').to_string())
            .collect();
        self
    }

    pub fn table(&self, kind: MemberKind) -> &HashMap<String, Member> {
        match kind {
            MemberKind::InstanceMethod => &self.instance_methods,
            MemberKind::StaticMethod => &self.static_methods,
            MemberKind::InstanceProperty => &self.instance_properties,
            MemberKind::StaticProperty => &self.static_properties,
            MemberKind::Constant => &self.constants,
        }
    }

    pub fn table_mut(&mut self, kind: MemberKind) -> &mut HashMap<String, Member> {
        match kind {
            MemberKind::InstanceMethod => &mut self.instance_methods,
            MemberKind::StaticMethod => &mut self.static_methods,
            MemberKind::InstanceProperty => &mut self.instance_properties,
            MemberKind::StaticProperty => &mut self.static_properties,
            MemberKind::Constant => &mut self.constants,
        }
    }

    /// Add or replace a member
    pub fn add_member(&mut self, kind: MemberKind, member: Member) {
        self.table_mut(kind).insert(member.name.clone(), member);
    }

    pub fn add_method(&mut self, function: FunctionType, visibility: Visibility, is_static: bool) {
        let kind = if is_static {
            MemberKind::StaticMethod
        } else {
            MemberKind::InstanceMethod
        };
        let member = Member::method(function, visibility, &self.name);
        self.add_member(kind, member);
    }

    /// Exact-name member, falling back to the case-insensitive match
    pub fn own_member(&self, kind: MemberKind, name: &str, ignore_case: bool) -> Option<&Member> {
        let table = self.table(kind);
        match table.get(name) {
            Some(member) => Some(member),
            None if ignore_case => table
                .values()
                .find(|m| m.name.eq_ignore_ascii_case(name)),
            None => None,
        }
    }

    /// Method in either the instance or the static table
    pub fn own_method(&self, name: &str) -> Option<&Member> {
        self.own_member(MemberKind::InstanceMethod, name, true)
            .or_else(|| self.own_member(MemberKind::StaticMethod, name, true))
    }

    /// Merge trait members into this class.
    ///
    /// Traits are applied in order and a later trait overwrites an earlier
    /// one's member of the same name, unless an `insteadof` rule excludes
    /// it. Every name provided by more than one trait without such a rule
    /// is returned as a collision. Imported members are re-owned by this
    /// class so their private members stay reachable from its methods.
    pub fn import_traits(&mut self, traits: &[&ClassEntry], rules: &[TraitRule]) -> Vec<TraitCollision> {
        let mut providers: HashMap<String, Vec<String>> = HashMap::new();
        let mut collisions = Vec::new();

        for trait_entry in traits {
            for kind in [MemberKind::InstanceMethod, MemberKind::StaticMethod] {
                for member in trait_entry.table(kind).values() {
                    if excluded(rules, &trait_entry.name, &member.name) {
                        continue;
                    }
                    let key = member.name.to_ascii_lowercase();
                    let seen = providers.entry(key).or_default();
                    if !seen.is_empty() && !seen.contains(&trait_entry.name) {
                        let mut names = seen.clone();
                        names.push(trait_entry.name.clone());
                        collisions.push(TraitCollision {
                            member: member.name.clone(),
                            traits: names,
                        });
                    }
                    seen.push(trait_entry.name.clone());
                    let mut imported = member.clone();
                    imported.declaring_class = self.name.clone();
                    self.add_member(kind, imported);
                }
            }
            for kind in [
                MemberKind::InstanceProperty,
                MemberKind::StaticProperty,
                MemberKind::Constant,
            ] {
                for member in trait_entry.table(kind).values() {
                    let mut imported = member.clone();
                    imported.declaring_class = self.name.clone();
                    self.add_member(kind, imported);
                }
            }
        }

        for rule in rules {
            let TraitRule::Alias {
                trait_name,
                method,
                alias,
                visibility,
            } = rule
            else {
                continue;
            };
            let source = traits
                .iter()
                .filter(|t| {
                    trait_name
                        .as_deref()
                        .map_or(true, |name| t.name.eq_ignore_ascii_case(name))
                })
                .find_map(|t| {
                    [MemberKind::InstanceMethod, MemberKind::StaticMethod]
                        .into_iter()
                        .find_map(|kind| t.own_member(kind, method, true).map(|m| (kind, m)))
                });
            let Some((kind, member)) = source else {
                continue;
            };
            let mut imported = member.clone();
            imported.declaring_class = self.name.clone();
            if let Some(visibility) = visibility {
                imported.visibility = *visibility;
            }
            match alias {
                Some(alias) => {
                    imported.name = alias.clone();
                    self.add_member(kind, imported);
                }
                None => self.add_member(kind, imported),
            }
        }

        collisions
    }
}

fn excluded(rules: &[TraitRule], trait_name: &str, method: &str) -> bool {
    rules.iter().any(|rule| match rule {
        TraitRule::Precedence {
            method: m,
            instead_of,
            ..
        } => m.eq_ignore_ascii_case(method) && instead_of.iter().any(|t| t.eq_ignore_ascii_case(trait_name)),
        TraitRule::Alias { .. } => false,
    })
}

/// Adaptation rule from a trait `use` block.
#[derive(Debug, Clone, PartialEq)]
pub enum TraitRule {
    /// `A::m insteadof B, C`
    Precedence {
        trait_name: String,
        method: String,
        instead_of: Vec<String>,
    },
    /// `[A::]m as [visibility] [alias]`
    Alias {
        trait_name: Option<String>,
        method: String,
        alias: Option<String>,
        visibility: Option<Visibility>,
    },
}

/// A method provided by several imported traits with no `insteadof` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitCollision {
    pub member: String,
    pub traits: Vec<String>,
}
