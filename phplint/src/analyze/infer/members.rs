//! Property, constant and element access, and class references.

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::diagnostics::DiagnosticKind;
use crate::analyze::lattice::{ConstValue, Type, TypeUnion};
use crate::analyze::registry::{symbol_key, Lookup, MemberKind, Registry};

use super::expressions::array_element_type;
use super::{Checker, InferResult};

/// What a member access is applied to.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Receiver {
    /// `mixed` or a class-string; nothing can be checked
    Unknown,
    Null,
    Class(String),
    /// A value that has no members
    Scalar(Type),
}

/// Split a receiver type into the cases member access distinguishes
pub(super) fn receivers(ty: &TypeUnion) -> Vec<Receiver> {
    let mut result = Vec::new();
    for member in ty.members() {
        add_receivers(member, &mut result);
    }
    if result.is_empty() {
        result.push(Receiver::Unknown);
    }
    result
}

fn add_receivers(member: &Type, result: &mut Vec<Receiver>) {
    let receiver = match member {
        Type::ClassInstance(name) => Receiver::Class(name.clone()),
        Type::Function(_) => Receiver::Class("Closure".to_string()),
        Type::Null => Receiver::Null,
        Type::Mixed | Type::Class(_) => Receiver::Unknown,
        Type::Optional { content, sentinel } => {
            add_receivers(content, result);
            if sentinel.has_null() {
                result.push(Receiver::Null);
            }
            if sentinel.has_false() {
                result.push(Receiver::Scalar(Type::Bool(Some(false))));
            }
            return;
        }
        other => Receiver::Scalar(other.clone()),
    };
    if !result.contains(&receiver) {
        result.push(receiver);
    }
}

/// Return type of `class::method()`; `mixed` when it cannot be found
pub(super) fn method_return_type(registry: &Registry, class: &str, method: &str) -> TypeUnion {
    match registry.find_member(class, MemberKind::InstanceMethod, method, Some(class)) {
        Lookup::Found(resolved) | Lookup::Inaccessible(resolved) => {
            if let Some(Type::Function(function)) = resolved.ty.single() {
                return function.return_type.clone();
            }
            resolved.ty
        }
        Lookup::Missing => TypeUnion::mixed(),
    }
}

/// Whether an array key type is a string key
fn is_string_key(key: &TypeUnion) -> bool {
    !key.is_unknown()
        && key
            .members()
            .iter()
            .any(|m| matches!(m, Type::String(_)) && !is_numeric_string(m))
}

fn is_numeric_string(member: &Type) -> bool {
    matches!(member.value(), Some(ConstValue::String(s)) if s.parse::<i64>().is_ok())
}

/// Container type after writing `value` at `key` (`None` for `[]`).
///
/// Null and unbound containers become arrays.
pub(super) fn with_element(
    current: Option<&TypeUnion>,
    key: Option<&TypeUnion>,
    value: &TypeUnion,
) -> TypeUnion {
    let value = value.widened();
    let string_key = key.is_some_and(is_string_key);
    let fresh = || {
        if string_key {
            Type::associative(value.clone())
        } else {
            Type::indexed(value.clone())
        }
    };
    let Some(current) = current else {
        return TypeUnion::of(fresh());
    };
    let mut result = TypeUnion::empty();
    for member in current.members() {
        let updated = match member {
            Type::IndexedArray(m) if !string_key => Type::indexed(m.union(&value)),
            Type::IndexedArray(m) | Type::AssociativeArray(m) => Type::associative(m.union(&value)),
            Type::Null | Type::Bool(Some(false)) => fresh(),
            Type::Optional { content, .. } if content.is_array() => {
                let inner = TypeUnion::of((**content).clone());
                result.add_types_from(&with_element(Some(&inner), key, &value));
                continue;
            }
            other => other.clone(),
        };
        result.add_type(updated);
    }
    if result.is_empty() {
        TypeUnion::of(fresh())
    } else {
        result
    }
}

impl Checker<'_> {
    /// Qualified name of a class written in source; `self`, `static` and
    /// `parent` refer to the enclosing class
    pub(super) fn class_reference(&self, name: &str) -> String {
        let class = self.scope.class.as_ref();
        match name.to_ascii_lowercase().as_str() {
            "self" | "static" => match class {
                Some(class) => class.name.clone(),
                None => name.to_string(),
            },
            "parent" => match class.and_then(|c| c.parent.clone()) {
                Some(parent) => parent,
                None => name.to_string(),
            },
            _ => self.scope.names.resolve_class(name),
        }
    }

    /// Make sure `name` is known, autoloading it if needed.
    ///
    /// An unloadable class is registered as a placeholder and reported
    /// once per file; returns whether a declaration is known.
    pub(super) fn ensure_class(&mut self, name: &str, node: &CstNode) -> InferResult<bool> {
        if self.registry().declared_class(name).is_some() {
            return Ok(true);
        }
        if !self.registry().has_class(name)
            && self.session.autoload(name)
            && self.registry().declared_class(name).is_some()
        {
            return Ok(true);
        }
        self.session.registry_mut().add_unknown_class(name);
        if self.muted == 0 && self.missing_classes.insert(symbol_key(name)) {
            self.report(
                DiagnosticKind::ClassLoadFailure,
                node,
                format!("class {} could not be loaded", name),
            )?;
        }
        Ok(false)
    }

    /// The class a `X::` prefix names. Traits leave `self` and `static`
    /// unresolved.
    pub(super) fn scope_class(&mut self, scope: &CstNode) -> InferResult<Option<String>> {
        if scope.kind == NodeKind::Name {
            let text = scope.text();
            let relative = matches!(text.to_ascii_lowercase().as_str(), "self" | "static" | "parent");
            if relative {
                let in_trait = self.scope.class.as_ref().map_or(true, |c| c.is_trait);
                let class = self.class_reference(text);
                if in_trait || class.eq_ignore_ascii_case(text) {
                    return Ok(None);
                }
                return Ok(Some(class));
            }
            let class = self.class_reference(text);
            return Ok(self.ensure_class(&class, scope)?.then_some(class));
        }
        let ty = self.expr(scope)?;
        let class = match ty.single() {
            Some(Type::ClassInstance(name) | Type::Class(name)) => Some(name.clone()),
            Some(Type::String(Some(name))) => Some(name.trim_start_matches('\\').to_string()),
            _ => None,
        };
        match class {
            Some(class) => Ok(self.ensure_class(&class, scope)?.then_some(class)),
            None => Ok(None),
        }
    }

    /// Name of an accessed member: an identifier, or a dynamic name
    /// resolved when its value is a known string
    fn member_name(&mut self, name: &CstNode) -> InferResult<Option<String>> {
        if name.kind == NodeKind::Name {
            return Ok(Some(name.text().to_string()));
        }
        match self.expr(name)?.value() {
            Some(ConstValue::String(name)) => Ok(Some(name)),
            _ => Ok(None),
        }
    }

    // ==================== Properties ====================

    pub(super) fn property_access(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let (Some(object), Some(name)) = (node.child_by_field("object"), node.child_by_field("name"))
        else {
            return Ok(assigning.unwrap_or_else(TypeUnion::mixed));
        };
        let object_ty = self.expr(object)?;
        let Some(name) = self.member_name(name)? else {
            return Ok(assigning.unwrap_or_else(TypeUnion::mixed));
        };
        let nullsafe = node.has_flag("nullsafe");

        let mut result = TypeUnion::empty();
        let receivers = receivers(&object_ty);
        let only_scalars = receivers.iter().all(|r| matches!(r, Receiver::Scalar(_)));
        for receiver in receivers {
            match receiver {
                Receiver::Class(class) => {
                    let ty = self.access_property(node, &class, &name, assigning.as_ref())?;
                    result.add_types_from(&ty);
                }
                Receiver::Null if nullsafe || self.scope.probing => result.add_type(Type::Null),
                Receiver::Null | Receiver::Unknown => result.add_type(Type::Mixed),
                Receiver::Scalar(ty) => {
                    if only_scalars && !self.scope.probing {
                        self.report(
                            DiagnosticKind::NoSuchMember,
                            node,
                            format!("property ${} accessed on {}", name, ty),
                        )?;
                    }
                    result.add_type(Type::Mixed);
                }
            }
        }
        match assigning {
            Some(value) => Ok(value),
            None => Ok(result),
        }
    }

    fn access_property(
        &mut self,
        node: &CstNode,
        class: &str,
        name: &str,
        assigning: Option<&TypeUnion>,
    ) -> InferResult<TypeUnion> {
        if !self.ensure_class(class, node)? {
            return Ok(TypeUnion::mixed());
        }
        self.access_member(node, class, MemberKind::InstanceProperty, name, assigning)
    }

    /// Shared read/write rule for instance and static properties
    fn access_member(
        &mut self,
        node: &CstNode,
        class: &str,
        kind: MemberKind,
        name: &str,
        assigning: Option<&TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let lookup = self
            .registry()
            .find_member(class, kind, name, self.scope.calling_class());
        let resolved = match lookup {
            Lookup::Found(resolved) => resolved,
            Lookup::Inaccessible(resolved) => {
                if !self.scope.probing {
                    self.report(
                        DiagnosticKind::ScopeViolation,
                        node,
                        format!(
                            "cannot access {} {} {}::${}",
                            resolved.visibility,
                            kind.describe(),
                            resolved.declaring_class,
                            name
                        ),
                    )?;
                }
                resolved
            }
            Lookup::Missing => {
                if self.scope.probing {
                    return Ok(TypeUnion::of(Type::Null));
                }
                self.report(
                    DiagnosticKind::NoSuchMember,
                    node,
                    format!("undefined {} {}::${}", kind.describe(), class, name),
                )?;
                return Ok(TypeUnion::mixed());
            }
        };
        match assigning {
            Some(value) => {
                if let Some(declared) = &resolved.declared {
                    if !self.accepts(value, declared) {
                        self.report(
                            DiagnosticKind::AssignmentTypeMismatch,
                            node,
                            format!(
                                "cannot assign {} to {}::${} of type {}",
                                value, resolved.declaring_class, name, declared
                            ),
                        )?;
                    }
                }
                Ok(value.clone())
            }
            None => Ok(resolved.ty),
        }
    }

    pub(super) fn static_property_access(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let (Some(scope), Some(name)) = (node.child_by_field("scope"), node.child_by_field("name"))
        else {
            return Ok(assigning.unwrap_or_else(TypeUnion::mixed));
        };
        let Some(class) = self.scope_class(scope)? else {
            return Ok(assigning.unwrap_or_else(TypeUnion::mixed));
        };
        let name = match name.kind {
            NodeKind::Variable => name.text().to_string(),
            _ => match self.member_name(name)? {
                Some(name) => name,
                None => return Ok(assigning.unwrap_or_else(TypeUnion::mixed)),
            },
        };
        let ty = self.access_member(
            node,
            &class,
            MemberKind::StaticProperty,
            &name,
            assigning.as_ref(),
        )?;
        Ok(assigning.unwrap_or(ty))
    }

    // ==================== Constants ====================

    pub(super) fn class_constant_access(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(scope), Some(name)) = (node.child_by_field("scope"), node.child_by_field("name"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let name = name.text();
        if name.eq_ignore_ascii_case("class") {
            // `X::class` is resolved at compile time and never autoloads
            if scope.kind != NodeKind::Name {
                self.expr(scope)?;
                return Ok(TypeUnion::of(Type::string()));
            }
            let text = scope.text();
            let class = self.class_reference(text);
            let unresolved = matches!(text.to_ascii_lowercase().as_str(), "self" | "parent")
                && class.eq_ignore_ascii_case(text);
            let in_trait = self.scope.class.as_ref().is_some_and(|c| c.is_trait);
            if unresolved || in_trait || text.eq_ignore_ascii_case("static") {
                return Ok(TypeUnion::of(Type::string()));
            }
            return Ok(TypeUnion::of(Type::string_value(class)));
        }
        let Some(class) = self.scope_class(scope)? else {
            return Ok(TypeUnion::mixed());
        };
        let lookup = self.registry().find_member(
            &class,
            MemberKind::Constant,
            name,
            self.scope.calling_class(),
        );
        match lookup {
            Lookup::Found(resolved) => Ok(resolved.ty),
            Lookup::Inaccessible(resolved) => {
                self.report(
                    DiagnosticKind::ScopeViolation,
                    node,
                    format!(
                        "cannot access {} constant {}::{}",
                        resolved.visibility, resolved.declaring_class, name
                    ),
                )?;
                Ok(resolved.ty)
            }
            Lookup::Missing => {
                if !self.tolerant() {
                    self.report(
                        DiagnosticKind::NoSuchMember,
                        node,
                        format!("undefined constant {}::{}", class, name),
                    )?;
                }
                Ok(TypeUnion::mixed())
            }
        }
    }

    // ==================== Elements ====================

    pub(super) fn subscript(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let Some(object) = node.child_by_field("object") else {
            return Ok(assigning.unwrap_or_else(TypeUnion::mixed));
        };
        let Some(value) = assigning else {
            let container = self.expr(object)?;
            if let Some(index) = node.child_by_field("index") {
                self.expr(index)?;
            }
            let mut element = array_element_type(&container);
            if self.scope.probing {
                element.add_type(Type::Null);
            }
            return Ok(element);
        };

        let key = match node.child_by_field("index") {
            Some(index) => Some(self.expr(index)?),
            None => None,
        };
        // Writing creates the container, so it is read without reporting
        let current = match object.kind {
            NodeKind::Variable => self.scope.lookup(object.text()).cloned(),
            NodeKind::SubscriptExpression | NodeKind::PropertyAccess | NodeKind::StaticPropertyAccess => {
                Some(self.probe(object)?)
            }
            _ => Some(self.expr(object)?),
        };
        let container = with_element(current.as_ref(), key.as_ref(), &value);
        self.assign_to(object, container)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_receivers_split_optional() {
        let ty = TypeUnion::of(Type::optional(
            Type::instance("Foo"),
            crate::analyze::lattice::Sentinel::FalseOrNull,
        ));
        assert_eq!(
            receivers(&ty),
            vec![
                Receiver::Class("Foo".into()),
                Receiver::Null,
                Receiver::Scalar(Type::Bool(Some(false))),
            ]
        );
        assert_eq!(receivers(&TypeUnion::empty()), vec![Receiver::Unknown]);
    }

    #[test]
    fn test_append_to_unbound_creates_list() {
        let value = TypeUnion::of(Type::Int(Some(1)));
        assert_eq!(
            with_element(None, None, &value),
            TypeUnion::of(Type::indexed(TypeUnion::of(Type::int())))
        );
    }

    #[test]
    fn test_string_key_makes_associative() {
        let list = TypeUnion::of(Type::indexed(TypeUnion::of(Type::int())));
        let key = TypeUnion::of(Type::string_value("name"));
        let value = TypeUnion::of(Type::string());
        assert_eq!(
            with_element(Some(&list), Some(&key), &value),
            TypeUnion::of(Type::associative(TypeUnion::from_types([
                Type::int(),
                Type::string()
            ])))
        );
        let numeric = TypeUnion::of(Type::string_value("3"));
        assert!(matches!(
            with_element(Some(&list), Some(&numeric), &value).single(),
            Some(Type::IndexedArray(_))
        ));
    }

    #[test]
    fn test_null_container_autovivifies() {
        let null = TypeUnion::of(Type::Null);
        let value = TypeUnion::of(Type::string());
        assert_eq!(
            with_element(Some(&null), None, &value),
            TypeUnion::of(Type::indexed(TypeUnion::of(Type::string())))
        );
    }
}
