//! Function, method and static calls, and `new`.

use std::sync::Arc;

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::diagnostics::DiagnosticKind;
use crate::analyze::lattice::{Argument, ConstValue, FunctionType, Type, TypeUnion};
use crate::analyze::registry::{Lookup, MemberKind, Resolved};

use super::members::{receivers, Receiver};
use super::{Checker, InferResult};

fn is_numeric_text(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok()
}

/// Scalar juggling PHP applies to arguments outside strict mode
fn coercible(value: &Type, expected: &Type) -> bool {
    use Type::*;
    match (value, expected) {
        (Int(_) | Float(_), String(None)) => true,
        (Float(_), Int(None)) => true,
        (String(Some(text)), Int(None) | Float(None)) => is_numeric_text(text),
        (Bool(_), Int(None) | Float(None) | String(None)) => true,
        (Int(_) | Float(_) | String(_), Bool(None)) => true,
        (Optional { content, .. }, _) => coercible(content, expected),
        _ => false,
    }
}

/// Display name of a called function
fn display_name(function: &FunctionType, fallback: &str) -> String {
    function.name.clone().unwrap_or_else(|| fallback.to_string())
}

impl Checker<'_> {
    /// `value` may be passed where `expected` is declared
    pub(super) fn accepts(&self, value: &TypeUnion, expected: &TypeUnion) -> bool {
        if value.matches(expected, self.registry()) {
            return true;
        }
        !value.is_empty()
            && value
                .members()
                .iter()
                .all(|m| expected.members().iter().any(|e| coercible(m, e)))
    }

    /// Evaluate arguments of a call whose signature is unknown
    pub(super) fn visit_arguments(&mut self, arguments: Option<&CstNode>) -> InferResult<()> {
        let Some(arguments) = arguments else {
            return Ok(());
        };
        for argument in arguments.positional_children() {
            if let Some(value) = argument.child_by_field("value") {
                self.expr(value)?;
            }
        }
        Ok(())
    }

    /// Check the arguments of a call against `function`.
    ///
    /// Named arguments bind by parameter name; a spread argument may
    /// supply any number of parameters, so missing ones are not reported.
    pub(super) fn check_call(
        &mut self,
        node: &CstNode,
        function: &FunctionType,
        arguments: Option<&CstNode>,
        name: &str,
    ) -> InferResult<()> {
        let arguments: Vec<&CstNode> = arguments
            .map(|args| args.positional_children().collect())
            .unwrap_or_default();
        let mut provided = vec![false; function.args.len()];
        let mut positional = 0;
        let mut spread = false;

        for argument in arguments {
            let Some(value) = argument.child_by_field("value") else {
                continue;
            };
            if argument.has_flag("spread") {
                spread = true;
                self.expr(value)?;
                continue;
            }
            let (index, parameter) = match argument.field_text("name") {
                Some(param_name) => match function.arg_named(param_name) {
                    Some((index, parameter)) => (index, Some(parameter)),
                    None => {
                        let variadic = function.args.iter().any(|a| a.variadic);
                        if !function.any_signature && !variadic {
                            self.report(
                                DiagnosticKind::ArgumentArityMismatch,
                                argument,
                                format!("{}() has no parameter named ${}", name, param_name),
                            )?;
                        }
                        (usize::MAX, None)
                    }
                },
                None => {
                    positional += 1;
                    (positional - 1, function.arg_at(positional - 1))
                }
            };
            if let Some(slot) = provided.get_mut(index) {
                *slot = true;
            }
            match parameter {
                Some(parameter) => {
                    let ty = self.check_argument(value, parameter, index, name)?;
                    if function.callback_positions.contains(&index) {
                        self.check_callback(value, &ty)?;
                    }
                }
                None => {
                    self.expr(value)?;
                }
            }
        }

        if function.any_signature {
            return Ok(());
        }
        if let Some(max) = function.max_count() {
            if positional > max && self.session.config().analyzer.strict_arity {
                self.report(
                    DiagnosticKind::ArgumentArityMismatch,
                    node,
                    format!("{}() takes at most {} arguments, {} given", name, max, positional),
                )?;
            }
        }
        let missing: Vec<&Argument> = function
            .args
            .iter()
            .zip(&provided)
            .filter(|(arg, given)| arg.is_required() && !**given)
            .map(|(arg, _)| arg)
            .collect();
        if !spread && !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|a| format!("${}", a.name)).collect();
            self.report(
                DiagnosticKind::ArgumentArityMismatch,
                node,
                format!(
                    "{}() expects at least {} arguments, {} given (missing {})",
                    name,
                    function.required_count(),
                    provided.iter().filter(|p| **p).count(),
                    names.join(", ")
                ),
            )?;
        }
        Ok(())
    }

    /// Check one argument; returns the type passed
    fn check_argument(
        &mut self,
        value: &CstNode,
        parameter: &Argument,
        index: usize,
        function: &str,
    ) -> InferResult<TypeUnion> {
        if parameter.by_ref && value.kind.is_assignable() {
            // The callee may write anything of its declared type back
            let current = match value.kind {
                NodeKind::Variable => self.scope.lookup(value.text()).cloned(),
                _ => Some(self.probe(value)?),
            };
            let declared = parameter
                .ty
                .as_ref()
                .map(TypeUnion::without_null)
                .filter(|ty| !ty.is_empty());
            let written = current
                .filter(|ty| !ty.is_empty())
                .or(declared)
                .unwrap_or_else(TypeUnion::mixed);
            return self.assign_to(value, written);
        }
        let ty = self.expr(value)?;
        let Some(expected) = &parameter.ty else {
            return Ok(ty);
        };
        if !self.accepts(&ty, expected) {
            self.report(
                DiagnosticKind::ArgumentTypeMismatch,
                value,
                format!(
                    "argument {} (${}) of {}() must be {}, {} given",
                    index + 1,
                    parameter.name,
                    function,
                    expected,
                    ty
                ),
            )?;
        }
        Ok(ty)
    }

    /// A string passed as a callback must name a known function
    fn check_callback(&mut self, value: &CstNode, ty: &TypeUnion) -> InferResult<()> {
        let Some(ConstValue::String(callback)) = ty.value() else {
            return Ok(());
        };
        let name = callback.trim_start_matches('\\');
        if name.contains("::") || self.tolerant() || self.registry().function(name).is_some() {
            return Ok(());
        }
        if self.session.autoload(name) && self.registry().function(name).is_some() {
            return Ok(());
        }
        self.report(
            DiagnosticKind::UndefinedName,
            value,
            format!("callback names undefined function {}()", name),
        )
    }

    // ==================== Function calls ====================

    fn lookup_function(&self, candidates: &[String]) -> Option<Arc<FunctionType>> {
        candidates
            .iter()
            .find_map(|name| self.registry().function(name).cloned())
    }

    pub(super) fn call_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let Some(callee) = node.child_by_field("function") else {
            return Ok(TypeUnion::mixed());
        };
        let arguments = node.child_by_field("arguments");
        if callee.kind != NodeKind::Name {
            return self.dynamic_call(node, callee, arguments);
        }

        let text = callee.text();
        let candidates = self.scope.names.resolve_function(text);
        let mut function = self.lookup_function(&candidates);
        if function.is_none() {
            if let Some(first) = candidates.first() {
                if self.session.autoload(first) {
                    function = self.lookup_function(&candidates);
                }
            }
        }
        let Some(function) = function else {
            if !self.tolerant() {
                self.report(
                    DiagnosticKind::UndefinedName,
                    callee,
                    format!("call to undefined function {}()", text.trim_start_matches('\\')),
                )?;
            }
            self.visit_arguments(arguments)?;
            return Ok(TypeUnion::mixed());
        };

        if arguments.is_some_and(|args| args.has_flag("callable")) {
            return Ok(TypeUnion::of(Type::Function(function)));
        }
        let name = display_name(&function, text);
        self.check_call(node, &function, arguments, &name)?;
        if name.eq_ignore_ascii_case("define") {
            self.define_constant(arguments)?;
        }
        Ok(function.return_type.clone())
    }

    /// `define('NAME', value)` registers a global constant
    fn define_constant(&mut self, arguments: Option<&CstNode>) -> InferResult<()> {
        let mut values = arguments
            .into_iter()
            .flat_map(|args| args.positional_children())
            .filter_map(|arg| arg.child_by_field("value"));
        let (Some(name), Some(value)) = (values.next(), values.next()) else {
            return Ok(());
        };
        let name = match self.quietly(|c| c.expr(name))?.value() {
            Some(ConstValue::String(name)) => name,
            _ => return Ok(()),
        };
        let ty = self.quietly(|c| c.expr(value))?;
        self.session.registry_mut().add_constant(&name, ty);
        Ok(())
    }

    /// Calling something other than a plain name: closures, invokable
    /// objects and callable strings
    fn dynamic_call(
        &mut self,
        node: &CstNode,
        callee: &CstNode,
        arguments: Option<&CstNode>,
    ) -> InferResult<TypeUnion> {
        let callee_ty = self.expr(callee)?;
        let function = match callee_ty.single() {
            Some(Type::Function(function)) if !function.any_signature => Some(function.clone()),
            Some(Type::String(Some(name))) => self.registry().function(name).cloned(),
            Some(Type::ClassInstance(class)) => {
                let class = class.clone();
                return self.invoke_method(node, &class, MemberKind::InstanceMethod, "__invoke", arguments);
            }
            _ => None,
        };
        match function {
            Some(function) => {
                let name = display_name(&function, "{closure}");
                self.check_call(node, &function, arguments, &name)?;
                Ok(function.return_type.clone())
            }
            None => {
                self.visit_arguments(arguments)?;
                Ok(TypeUnion::mixed())
            }
        }
    }

    // ==================== Methods ====================

    pub(super) fn method_call(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(object), Some(name)) = (node.child_by_field("object"), node.child_by_field("name"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let arguments = node.child_by_field("arguments");
        let object_ty = self.expr(object)?;
        let name = if name.kind == NodeKind::Name {
            name.text().to_string()
        } else {
            match self.expr(name)?.value() {
                Some(ConstValue::String(name)) => name,
                _ => {
                    self.visit_arguments(arguments)?;
                    return Ok(TypeUnion::mixed());
                }
            }
        };
        let nullsafe = node.has_flag("nullsafe");

        let receivers = receivers(&object_ty);
        let only_scalars = receivers.iter().all(|r| matches!(r, Receiver::Scalar(_)));
        let mut invoked = false;
        let mut result = TypeUnion::empty();
        for receiver in receivers {
            match receiver {
                Receiver::Class(class) => {
                    let ty = if invoked {
                        // Arguments were already checked against the first class
                        self.quietly(|c| {
                            c.invoke_method(node, &class, MemberKind::InstanceMethod, &name, arguments)
                        })?
                    } else {
                        self.invoke_method(node, &class, MemberKind::InstanceMethod, &name, arguments)?
                    };
                    invoked = true;
                    result.add_types_from(&ty);
                }
                Receiver::Null if nullsafe => result.add_type(Type::Null),
                Receiver::Null | Receiver::Unknown => result.add_type(Type::Mixed),
                Receiver::Scalar(ty) => {
                    if only_scalars {
                        self.report(
                            DiagnosticKind::NoSuchMember,
                            node,
                            format!("call to a member function {}() on {}", name, ty),
                        )?;
                    }
                    result.add_type(Type::Mixed);
                }
            }
        }
        if !invoked {
            self.visit_arguments(arguments)?;
        }
        Ok(result)
    }

    pub(super) fn static_call(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(scope), Some(name)) = (node.child_by_field("scope"), node.child_by_field("name"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let arguments = node.child_by_field("arguments");
        let class = self.scope_class(scope)?;
        let name = match name.kind {
            NodeKind::Name => Some(name.text().to_string()),
            _ => match self.expr(name)?.value() {
                Some(ConstValue::String(name)) => Some(name),
                _ => None,
            },
        };
        match (class, name) {
            (Some(class), Some(name)) => {
                self.invoke_method(node, &class, MemberKind::StaticMethod, &name, arguments)
            }
            _ => {
                self.visit_arguments(arguments)?;
                Ok(TypeUnion::mixed())
            }
        }
    }

    /// Look up `class::name` and check the call against it
    pub(super) fn invoke_method(
        &mut self,
        node: &CstNode,
        class: &str,
        kind: MemberKind,
        name: &str,
        arguments: Option<&CstNode>,
    ) -> InferResult<TypeUnion> {
        if !self.ensure_class(class, node)? {
            self.visit_arguments(arguments)?;
            return Ok(TypeUnion::mixed());
        }
        let lookup = self
            .registry()
            .find_member(class, kind, name, self.scope.calling_class());
        match lookup {
            Lookup::Found(resolved) => {
                if let Some(canonical) = &resolved.canonical_name {
                    if self.session.config().analyzer.naming_conventions {
                        self.report(
                            DiagnosticKind::NamingConventionViolation,
                            node,
                            format!(
                                "method {}::{}() called as {}()",
                                resolved.declaring_class, canonical, name
                            ),
                        )?;
                    }
                }
                self.call_member(node, &resolved, class, name, arguments)
            }
            Lookup::Inaccessible(resolved) => {
                self.report(
                    DiagnosticKind::ScopeViolation,
                    node,
                    format!(
                        "cannot call {} method {}::{}()",
                        resolved.visibility, resolved.declaring_class, name
                    ),
                )?;
                self.call_member(node, &resolved, class, name, arguments)
            }
            Lookup::Missing => {
                self.report(
                    DiagnosticKind::NoSuchMember,
                    node,
                    format!("call to undefined method {}::{}()", class, name),
                )?;
                self.visit_arguments(arguments)?;
                Ok(TypeUnion::mixed())
            }
        }
    }

    fn call_member(
        &mut self,
        node: &CstNode,
        resolved: &Resolved,
        class: &str,
        name: &str,
        arguments: Option<&CstNode>,
    ) -> InferResult<TypeUnion> {
        let function = match resolved.ty.single() {
            Some(Type::Function(function)) if !resolved.magic => function.clone(),
            _ => {
                self.visit_arguments(arguments)?;
                return Ok(resolved.ty.clone());
            }
        };
        if arguments.is_some_and(|args| args.has_flag("callable")) {
            return Ok(TypeUnion::of(Type::Function(function)));
        }
        let display = format!("{}::{}", class, function.name.as_deref().unwrap_or(name));
        self.check_call(node, &function, arguments, &display)?;
        Ok(function.return_type.clone())
    }

    // ==================== Instantiation ====================

    pub(super) fn new_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let Some(class_node) = node.child_by_field("class") else {
            return Ok(TypeUnion::mixed());
        };
        let arguments = node.child_by_field("arguments");
        let class = match class_node.kind {
            NodeKind::AnonymousClass => return self.anonymous_class(class_node),
            NodeKind::Name => self.class_reference(class_node.text()),
            _ => match self.expr(class_node)?.single() {
                Some(Type::String(Some(name))) => name.trim_start_matches('\\').to_string(),
                Some(Type::ClassInstance(name) | Type::Class(name)) => name.clone(),
                _ => {
                    self.visit_arguments(arguments)?;
                    return Ok(TypeUnion::mixed());
                }
            },
        };
        if !self.ensure_class(&class, class_node)? {
            self.visit_arguments(arguments)?;
            return Ok(TypeUnion::of(Type::instance(class)));
        }
        self.construct(node, &class, arguments)?;
        let canonical = self
            .registry()
            .declared_class(&class)
            .map_or(class.clone(), |entry| entry.name.clone());
        Ok(TypeUnion::of(Type::instance(canonical)))
    }

    /// Check constructor arguments of `new class(...)`
    pub(super) fn construct(
        &mut self,
        node: &CstNode,
        class: &str,
        arguments: Option<&CstNode>,
    ) -> InferResult<()> {
        let lookup = self.registry().find_member(
            class,
            MemberKind::InstanceMethod,
            "__construct",
            self.scope.calling_class(),
        );
        match lookup {
            Lookup::Found(resolved) => {
                self.call_member(node, &resolved, class, "__construct", arguments)?;
            }
            Lookup::Inaccessible(resolved) => {
                self.report(
                    DiagnosticKind::ScopeViolation,
                    node,
                    format!("cannot call {} constructor of {}", resolved.visibility, class),
                )?;
                self.call_member(node, &resolved, class, "__construct", arguments)?;
            }
            Lookup::Missing => self.visit_arguments(arguments)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_coercion() {
        assert!(coercible(&Type::Int(Some(1)), &Type::string()));
        assert!(coercible(&Type::string_value("12"), &Type::int()));
        assert!(!coercible(&Type::string_value("abc"), &Type::int()));
        assert!(!coercible(&Type::string(), &Type::int()));
        assert!(!coercible(&Type::Null, &Type::string()));
        assert!(!coercible(&Type::instance("Foo"), &Type::string()));
    }
}
