//! Functions, closures and class-like declarations.
//!
//! Top-level declarations are hoisted before the file is walked: class
//! skeletons first, so members may name any class of the file, then
//! constants, then members, then function signatures. A declaration
//! nested in a block is registered when control reaches it.

use std::sync::Arc;

use once_cell::sync::Lazy;
use phplint_parser::{CstNode, NodeKind};
use regex::Regex;
use tracing::debug;

use crate::analyze::diagnostics::DiagnosticKind;
use crate::analyze::docblock::DocBlock;
use crate::analyze::lattice::{Argument, FunctionType, Type, TypeUnion};
use crate::analyze::registry::{
    symbol_key, ClassEntry, ClassKind, Member, MemberKind, TraitCollision, TraitRule, Visibility,
};
use crate::analyze::scope::{ClassContext, NameResolver, ReturnContext, TypeEnv};

use super::statements::import_names;
use super::{Checker, Flow, InferResult};

static CLASS_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").ok());
static METHOD_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^_{0,2}[a-z][A-Za-z0-9]*$").ok());
static CONSTANT_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").ok());

fn conforms(pattern: &Lazy<Option<Regex>>, name: &str) -> bool {
    pattern.as_ref().map_or(true, |re| re.is_match(name))
}

/// One parameter as seen by callers and by the body.
#[derive(Debug, Clone)]
struct Param {
    name: String,
    argument: Argument,
    /// Binding inside the body (variadics collect into a list)
    local: TypeUnion,
    /// Constructor promotion visibility
    promoted: Option<Visibility>,
}

#[derive(Debug, Clone)]
struct Signature {
    function: FunctionType,
    params: Vec<Param>,
    declared: Option<TypeUnion>,
    is_generator: bool,
}

/// What checking a body produced.
struct BodyOutcome {
    returns: TypeUnion,
    env: TypeEnv,
}

/// Gather top-level declarations together with the names in effect at
/// each of them
fn collect_declarations<'n>(
    node: &'n CstNode,
    names: &mut NameResolver,
    out: &mut Vec<(NameResolver, &'n CstNode)>,
) {
    for statement in node.positional_children() {
        match statement.kind {
            NodeKind::NamespaceDefinition => {
                names.set_namespace(statement.field_text("name"));
                if let Some(body) = statement.child_by_field("body") {
                    collect_declarations(body, names, out);
                    names.set_namespace(None);
                }
            }
            NodeKind::UseDeclaration => import_names(names, statement),
            NodeKind::ConstDeclaration
            | NodeKind::FunctionDefinition
            | NodeKind::ClassDeclaration
            | NodeKind::InterfaceDeclaration
            | NodeKind::TraitDeclaration => out.push((names.clone(), statement)),
            _ => {}
        }
    }
}

/// Whether a body yields, ignoring nested functions and classes
fn contains_yield(node: &CstNode) -> bool {
    node.children.iter().any(|child| match child.kind {
        NodeKind::YieldExpression => true,
        NodeKind::AnonymousFunction
        | NodeKind::ArrowFunction
        | NodeKind::FunctionDefinition
        | NodeKind::MethodDeclaration
        | NodeKind::AnonymousClass
        | NodeKind::ClassDeclaration
        | NodeKind::InterfaceDeclaration
        | NodeKind::TraitDeclaration => false,
        _ => contains_yield(child),
    })
}

fn modifiers(node: &CstNode) -> impl Iterator<Item = &str> {
    node.children_by_field("modifier").map(CstNode::text)
}

fn has_modifier(node: &CstNode, modifier: &str) -> bool {
    modifiers(node).any(|m| m.eq_ignore_ascii_case(modifier))
}

fn visibility(node: &CstNode) -> Visibility {
    modifiers(node)
        .find_map(|m| Visibility::from_modifier(&m.to_ascii_lowercase()))
        .unwrap_or(Visibility::Public)
}

fn class_kind(node: &CstNode) -> ClassKind {
    match node.kind {
        NodeKind::InterfaceDeclaration => ClassKind::Interface,
        NodeKind::TraitDeclaration => ClassKind::Trait,
        _ => ClassKind::Class,
    }
}

fn members(node: &CstNode) -> impl Iterator<Item = &CstNode> {
    node.child_by_field("body")
        .into_iter()
        .flat_map(|body| body.positional_children())
}

fn listed_names(node: Option<&CstNode>) -> Vec<&CstNode> {
    match node {
        Some(list) if list.kind == NodeKind::NameList => list.positional_children().collect(),
        Some(name) => vec![name],
        None => Vec::new(),
    }
}

/// Generators evaluate to a `Generator` whatever they return
fn generator_type() -> TypeUnion {
    TypeUnion::of(Type::instance("Generator"))
}

impl Checker<'_> {
    // ==================== Naming ====================

    fn check_name(
        &mut self,
        pattern: &Lazy<Option<Regex>>,
        name: &str,
        node: &CstNode,
        message: impl FnOnce() -> String,
    ) -> InferResult<()> {
        if self.session.config().analyzer.naming_conventions && !conforms(pattern, name) {
            self.report(DiagnosticKind::NamingConventionViolation, node, message())?;
        }
        Ok(())
    }

    pub(super) fn check_constant_name(&mut self, name: &str, node: &CstNode) -> InferResult<()> {
        self.check_name(&CONSTANT_NAME, name, node, || {
            format!("constant {} should be UPPER_CASE", name)
        })
    }

    // ==================== Hoisting ====================

    /// Register the file's top-level declarations before its statements run
    pub(super) fn hoist(&mut self, root: &CstNode) -> InferResult<()> {
        let mut names = self.scope.names.clone();
        let mut declarations = Vec::new();
        collect_declarations(root, &mut names, &mut declarations);
        if declarations.is_empty() {
            return Ok(());
        }
        let saved = self.scope.names.clone();
        let result = self.hoist_declarations(&declarations);
        self.scope.names = saved;
        result
    }

    fn hoist_declarations(&mut self, declarations: &[(NameResolver, &CstNode)]) -> InferResult<()> {
        for (names, node) in declarations {
            if node.kind.is_class_like() {
                self.scope.names = names.clone();
                self.declare_skeleton(node);
            }
        }

        for (names, node) in declarations {
            if node.kind == NodeKind::ConstDeclaration {
                self.scope.names = names.clone();
                self.quietly(|c| c.hoist_constants(node))?;
            }
        }

        // Traits before interfaces before classes, so imports find their members
        let mut classes: Vec<&(NameResolver, &CstNode)> = declarations
            .iter()
            .filter(|(_, node)| node.kind.is_class_like() && self.hoisted.contains(&node.span.start))
            .collect();
        classes.sort_by_key(|(_, node)| match node.kind {
            NodeKind::TraitDeclaration => 0,
            NodeKind::InterfaceDeclaration => 1,
            _ => 2,
        });
        for (names, node) in classes {
            self.scope.names = names.clone();
            let class = self.declared_name(node);
            let collisions = self.quietly(|c| c.populate_class(node, &class))?;
            self.report_collisions(node, &class, collisions)?;
        }

        for (names, node) in declarations {
            if node.kind == NodeKind::FunctionDefinition {
                self.scope.names = names.clone();
                self.quietly(|c| c.declare_function(node))?;
            }
        }
        Ok(())
    }

    fn hoist_constants(&mut self, node: &CstNode) -> InferResult<()> {
        for element in node.children_by_field("element") {
            let (Some(name), Some(value)) = (element.field_text("name"), element.child_by_field("value"))
            else {
                continue;
            };
            let ty = self.expr(value)?;
            let qualified = self.scope.names.prefixed(name);
            self.session.registry_mut().add_constant(&qualified, ty);
        }
        Ok(())
    }

    fn declared_name(&self, node: &CstNode) -> String {
        self.scope.names.prefixed(node.field_text("name").unwrap_or_default())
    }

    // ==================== Signatures ====================

    /// Prefer the documented type when it refines the native one
    fn reconcile(
        &mut self,
        native: Option<TypeUnion>,
        documented: Option<TypeUnion>,
        node: &CstNode,
        what: &str,
    ) -> InferResult<Option<TypeUnion>> {
        match (native, documented) {
            (Some(native), Some(documented)) => {
                if documented.complies_with(&native, self.registry()) {
                    Ok(Some(documented))
                } else {
                    self.report(
                        DiagnosticKind::DocumentationMismatch,
                        node,
                        format!("documented {} {} does not match declared {}", what, documented, native),
                    )?;
                    Ok(Some(native))
                }
            }
            (native, documented) => Ok(native.or(documented)),
        }
    }

    /// Signature of a function, method, closure or arrow function
    fn signature(&mut self, name: &str, node: &CstNode) -> InferResult<Signature> {
        let doc = node.doc().map(DocBlock::parse).unwrap_or_default();
        let mut params = Vec::new();
        let parameters = node
            .child_by_field("parameters")
            .into_iter()
            .flat_map(|list| list.positional_children());
        for parameter in parameters {
            let Some(param_name) = parameter.field_text("name") else {
                continue;
            };
            let resolver = self.resolver().with_templates(&doc.templates);
            let native = parameter
                .field_text("type")
                .and_then(|hint| resolver.resolve_text(hint));
            let documented = doc.param(param_name).map(|ty| resolver.resolve(ty));
            let mut ty = self.reconcile(native, documented, parameter, &format!("type of ${}", param_name))?;

            let mut argument = Argument::new(param_name, None);
            argument.by_ref = parameter.has_flag("reference");
            argument.variadic = parameter.has_flag("variadic");
            let mut local = ty.clone().unwrap_or_else(TypeUnion::mixed);
            if let Some(default) = parameter.child_by_field("default") {
                argument.has_default = true;
                let value = self.expr(default)?;
                if value.may_be_null() {
                    if let Some(ty) = ty.as_mut() {
                        ty.add_type(Type::Null);
                    }
                    local.add_type(Type::Null);
                }
            }
            if argument.variadic {
                local = TypeUnion::of(Type::indexed(ty.clone().unwrap_or_default()));
            }
            argument.ty = ty;
            let promoted = parameter
                .children_by_field("visibility")
                .find_map(|m| Visibility::from_modifier(&m.text().to_ascii_lowercase()));
            params.push(Param {
                name: param_name.to_string(),
                argument,
                local,
                promoted,
            });
        }

        let resolver = self.resolver().with_templates(&doc.templates);
        let native = node
            .field_text("return_type")
            .and_then(|hint| resolver.resolve_text(hint));
        let documented = doc.returns.as_ref().map(|ty| resolver.resolve(ty));
        let declared = self.reconcile(native, documented, node, "return type")?;
        let is_generator = node.child_by_field("body").is_some_and(contains_yield);

        let return_type = if is_generator {
            generator_type()
        } else {
            declared.clone().unwrap_or_else(TypeUnion::mixed)
        };
        let mut function = FunctionType::new(
            name,
            params.iter().map(|p| p.argument.clone()).collect(),
            return_type,
        );
        function.declared_return = declared.is_some();
        Ok(Signature {
            function,
            params,
            declared,
            is_generator,
        })
    }

    /// Check a body in a fresh scope. `node` is the block, or the
    /// expression of an arrow function.
    fn check_body(
        &mut self,
        node: &CstNode,
        signature: &Signature,
        display: &str,
        is_static: bool,
        arrow: bool,
    ) -> InferResult<BodyOutcome> {
        let returns = ReturnContext {
            is_generator: signature.is_generator,
            ..ReturnContext::new(display, signature.declared.clone())
        };
        let scope = if arrow {
            self.scope.arrow_body(returns, is_static)
        } else {
            self.scope.function_body(returns, is_static)
        };
        let saved = std::mem::replace(&mut self.scope, scope);
        for param in &signature.params {
            self.scope.bind(&param.name, param.local.clone());
        }
        let result = if arrow {
            self.expr(node).and_then(|ty| {
                self.check_return(node, Some(&ty))?;
                Ok((ty, Flow::Exit))
            })
        } else {
            self.visit(node).map(|inferred| (TypeUnion::empty(), inferred.flow))
        };
        let scope = std::mem::replace(&mut self.scope, saved);
        let (value, flow) = result?;

        let mut returns = scope
            .function
            .map(|function| function.observed)
            .unwrap_or_default();
        returns.add_types_from(&value);
        if flow.is_normal() {
            self.check_fall_through(node, signature, display)?;
            if !returns.is_empty() {
                returns.add_type(Type::Null);
            }
        }
        if signature.is_generator {
            returns = generator_type();
        }
        Ok(BodyOutcome {
            returns,
            env: scope.env,
        })
    }

    /// Reaching the end of a body returns `null`
    fn check_fall_through(&mut self, node: &CstNode, signature: &Signature, display: &str) -> InferResult<()> {
        if signature.is_generator {
            return Ok(());
        }
        let Some(declared) = &signature.declared else {
            return Ok(());
        };
        if declared.is_empty() || declared.is_mixed() || declared.may_be_null() {
            return Ok(());
        }
        self.report(
            DiagnosticKind::ReturnTypeMismatch,
            node,
            format!("{}() may end without returning {}", display, declared),
        )
    }

    // ==================== Functions ====================

    fn declare_function(&mut self, node: &CstNode) -> InferResult<()> {
        let Some(name) = node.field_text("name") else {
            return Ok(());
        };
        let qualified = self.scope.names.prefixed(name);
        let signature = self.signature(&qualified, node)?;
        if self.session.registry_mut().add_function(&qualified, signature.function) {
            self.own_functions.insert(symbol_key(&qualified));
        } else {
            debug!(function = %qualified, "function already declared");
        }
        self.hoisted.insert(node.span.start);
        Ok(())
    }

    pub(super) fn function_definition(&mut self, node: &CstNode) -> InferResult<Flow> {
        let Some(name) = node.field_text("name") else {
            return Ok(Flow::Normal);
        };
        if !self.hoisted.contains(&node.span.start) {
            self.declare_function(node)?;
        }
        let qualified = self.scope.names.prefixed(name);
        let signature = self.signature(&qualified, node)?;
        let Some(body) = node.child_by_field("body") else {
            return Ok(Flow::Normal);
        };
        let outcome = self.check_body(body, &signature, name, false, false)?;
        if signature.declared.is_none() && self.own_functions.contains(&symbol_key(&qualified)) {
            let mut function = signature.function;
            function.return_type = outcome.returns;
            self.session.registry_mut().update_function(&qualified, function);
        }
        Ok(Flow::Normal)
    }

    /// `function (...) use (...) { ... }`
    pub(super) fn closure(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let signature = self.signature("{closure}", node)?;
        let is_static = node.has_flag("static") || self.scope.is_static;
        let Some(body) = node.child_by_field("body") else {
            return Ok(TypeUnion::of(Type::Function(Arc::new(signature.function))));
        };

        // Captured variables are bound after the parameters
        let mut captured = Vec::new();
        let mut by_reference = Vec::new();
        let uses = node
            .child_by_field("uses")
            .into_iter()
            .flat_map(|list| list.positional_children());
        for capture in uses {
            let Some(name) = capture.field_text("name") else {
                continue;
            };
            let by_ref = capture.has_flag("reference");
            let ty = match self.scope.lookup(name) {
                Some(ty) => ty.clone(),
                None if by_ref => TypeUnion::of(Type::Null),
                None => {
                    if !self.tolerant() {
                        self.report(
                            DiagnosticKind::UndefinedName,
                            capture,
                            format!("undefined variable ${} in closure use", name),
                        )?;
                    }
                    TypeUnion::mixed()
                }
            };
            if by_ref {
                self.scope.bind(name, ty.clone());
                by_reference.push(name.to_string());
            }
            captured.push(Param {
                name: name.to_string(),
                argument: Argument::new(name, None),
                local: ty,
                promoted: None,
            });
        }
        let mut body_signature = signature.clone();
        body_signature.params.extend(captured);

        let outcome = self.check_body(body, &body_signature, "{closure}", is_static, false)?;

        // A by-reference capture may be written whenever the closure runs
        for name in &by_reference {
            if let Some(written) = outcome.env.get(name) {
                let mut ty = self.scope.lookup(name).cloned().unwrap_or_default();
                ty.add_types_from(written);
                self.scope.bind(name, ty);
            }
        }

        let mut function = signature.function;
        if signature.declared.is_none() {
            function.return_type = outcome.returns;
        }
        Ok(TypeUnion::of(Type::Function(Arc::new(function))))
    }

    /// `fn (...) => expr` sees the enclosing locals by value
    pub(super) fn arrow_function(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let signature = self.signature("{closure}", node)?;
        let is_static = node.has_flag("static") || self.scope.is_static;
        let Some(body) = node.child_by_field("body") else {
            return Ok(TypeUnion::of(Type::Function(Arc::new(signature.function))));
        };
        let outcome = self.check_body(body, &signature, "{closure}", is_static, true)?;
        let mut function = signature.function;
        if signature.declared.is_none() {
            function.return_type = outcome.returns;
        }
        Ok(TypeUnion::of(Type::Function(Arc::new(function))))
    }

    // ==================== Classes ====================

    fn class_context(&self, class: &str, node: &CstNode) -> ClassContext {
        ClassContext {
            name: class.to_string(),
            parent: self
                .registry()
                .class(class)
                .and_then(|entry| entry.parent.clone()),
            is_trait: node.kind == NodeKind::TraitDeclaration,
        }
    }

    fn skeleton(&self, node: &CstNode, class: &str) -> ClassEntry {
        let mut entry = ClassEntry::new(class, class_kind(node));
        let resolve = |name: &CstNode| self.scope.names.resolve_class(name.text());
        match node.kind {
            NodeKind::InterfaceDeclaration => {
                entry = entry.with_interfaces(listed_names(node.child_by_field("extends")).into_iter().map(resolve));
            }
            _ => {
                if let Some(parent) = node.child_by_field("extends") {
                    entry = entry.with_parent(resolve(parent));
                }
                entry = entry
                    .with_interfaces(listed_names(node.child_by_field("implements")).into_iter().map(resolve));
            }
        }
        entry.is_abstract = has_modifier(node, "abstract");
        entry.origin = Some(self.file.clone());
        entry
    }

    /// Register the class without members; returns whether it was new
    fn declare_skeleton(&mut self, node: &CstNode) -> bool {
        let class = self.declared_name(node);
        let entry = self.skeleton(node, &class);
        if !self.session.registry_mut().add_class(entry) {
            debug!(class = %class, "class already declared");
            return false;
        }
        self.own_classes.insert(symbol_key(&class));
        self.hoisted.insert(node.span.start);
        true
    }

    fn report_collisions(
        &mut self,
        node: &CstNode,
        class: &str,
        collisions: Vec<TraitCollision>,
    ) -> InferResult<()> {
        for collision in collisions {
            let winner = collision.traits.last().cloned().unwrap_or_default();
            self.report(
                DiagnosticKind::TraitCollision,
                node,
                format!(
                    "{}::{}() is defined by traits {}; {} wins",
                    class,
                    collision.member,
                    collision.traits.join(", "),
                    winner
                ),
            )?;
        }
        Ok(())
    }

    /// Adaptation rules of a trait `use` block
    fn trait_rules(&self, node: &CstNode) -> Vec<TraitRule> {
        let resolve = |name: &str| self.scope.names.resolve_class(name);
        node.children_by_field("adaptation")
            .filter_map(|rule| match rule.kind {
                NodeKind::TraitPrecedence => Some(TraitRule::Precedence {
                    trait_name: resolve(rule.field_text("trait")?),
                    method: rule.field_text("method")?.to_string(),
                    instead_of: listed_names(rule.child_by_field("insteadof"))
                        .into_iter()
                        .map(|name| resolve(name.text()))
                        .collect(),
                }),
                NodeKind::TraitAlias => Some(TraitRule::Alias {
                    trait_name: rule.field_text("trait").map(resolve),
                    method: rule.field_text("method")?.to_string(),
                    alias: rule.field_text("alias").map(str::to_string),
                    visibility: rule
                        .field_text("modifier")
                        .and_then(|m| Visibility::from_modifier(&m.to_ascii_lowercase())),
                }),
                _ => None,
            })
            .collect()
    }

    /// Fill in the members of a registered class
    fn populate_class(&mut self, node: &CstNode, class: &str) -> InferResult<Vec<TraitCollision>> {
        let context = self.class_context(class, node);
        let scope = self.scope.class_body(context);
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.collect_members(node, class);
        self.scope = saved;
        let (own, traits, rules) = result?;

        let trait_entries: Vec<ClassEntry> = traits
            .iter()
            .filter_map(|name| self.registry().declared_class(name).cloned())
            .collect();
        let trait_refs: Vec<&ClassEntry> = trait_entries.iter().collect();
        let Some(entry) = self.session.registry_mut().class_mut(class) else {
            return Ok(Vec::new());
        };
        let collisions = if trait_refs.is_empty() {
            Vec::new()
        } else {
            entry.import_traits(&trait_refs, &rules)
        };
        // Own members override imported ones
        for (kind, member) in own {
            entry.add_member(kind, member);
        }
        Ok(collisions)
    }

    fn collect_members(
        &mut self,
        node: &CstNode,
        class: &str,
    ) -> InferResult<(Vec<(MemberKind, Member)>, Vec<String>, Vec<TraitRule>)> {
        let mut own = Vec::new();
        let mut traits = Vec::new();
        let mut rules = Vec::new();
        let is_interface = node.kind == NodeKind::InterfaceDeclaration;

        if let Some(doc) = node.doc() {
            let doc = DocBlock::parse(doc);
            for tag in &doc.properties {
                let ty = self.resolver().resolve(&tag.ty);
                let mut member = Member::new(tag.name.clone(), ty.clone(), Visibility::Public, class);
                member.declared = Some(ty);
                own.push((MemberKind::InstanceProperty, member));
            }
        }

        for item in members(node) {
            match item.kind {
                NodeKind::ClassConstDeclaration => {
                    let visibility = visibility(item);
                    for element in item.children_by_field("element") {
                        let (Some(name), Some(value)) =
                            (element.field_text("name"), element.child_by_field("value"))
                        else {
                            continue;
                        };
                        let ty = self.expr(value)?;
                        own.push((MemberKind::Constant, Member::new(name, ty, visibility, class)));
                    }
                }
                NodeKind::PropertyDeclaration => {
                    let visibility = visibility(item);
                    let kind = if has_modifier(item, "static") {
                        MemberKind::StaticProperty
                    } else {
                        MemberKind::InstanceProperty
                    };
                    let doc = item.doc().map(DocBlock::parse).unwrap_or_default();
                    let native = item
                        .field_text("type")
                        .and_then(|hint| self.resolver().resolve_text(hint));
                    let documented = doc.var(None).map(|ty| self.resolver().resolve(ty));
                    let declared = self.reconcile(native, documented, item, "property type")?;
                    for element in item.children_by_field("element") {
                        let Some(name) = element.field_text("name") else {
                            continue;
                        };
                        let ty = match (&declared, element.child_by_field("default")) {
                            (Some(declared), _) => declared.clone(),
                            (None, Some(default)) => {
                                let value = self.expr(default)?;
                                if value.members().iter().all(Type::is_null) {
                                    TypeUnion::mixed()
                                } else {
                                    value.widened()
                                }
                            }
                            (None, None) => TypeUnion::mixed(),
                        };
                        let mut member = Member::new(name, ty, visibility, class);
                        member.declared = declared.clone();
                        own.push((kind, member));
                    }
                }
                NodeKind::MethodDeclaration => {
                    let Some(name) = item.field_text("name") else {
                        continue;
                    };
                    let signature = self.signature(name, item)?;
                    if name.eq_ignore_ascii_case("__construct") {
                        for param in signature.params.iter() {
                            let Some(visibility) = param.promoted else {
                                continue;
                            };
                            let ty = param.argument.ty.clone().unwrap_or_else(TypeUnion::mixed);
                            let mut member = Member::new(param.name.clone(), ty, visibility, class);
                            member.declared = param.argument.ty.clone();
                            own.push((MemberKind::InstanceProperty, member));
                        }
                    }
                    let kind = if has_modifier(item, "static") {
                        MemberKind::StaticMethod
                    } else {
                        MemberKind::InstanceMethod
                    };
                    let mut member = Member::method(signature.function, visibility(item), class);
                    member.is_abstract = is_interface || has_modifier(item, "abstract");
                    own.push((kind, member));
                }
                NodeKind::TraitUse => {
                    for name in listed_names(item.child_by_field("traits")) {
                        let qualified = self.scope.names.resolve_class(name.text());
                        self.ensure_class(&qualified, name)?;
                        traits.push(qualified);
                    }
                    rules.extend(self.trait_rules(item));
                }
                _ => {}
            }
        }
        Ok((own, traits, rules))
    }

    /// Register a class reached as a statement and its members
    fn declare_class(&mut self, node: &CstNode, class: &str) -> InferResult<()> {
        if !self.declare_skeleton(node) {
            return Ok(());
        }
        let collisions = self.populate_class(node, class)?;
        self.report_collisions(node, class, collisions)
    }

    pub(super) fn class_declaration(&mut self, node: &CstNode) -> InferResult<Flow> {
        let Some(name) = node.field_text("name") else {
            return Ok(Flow::Normal);
        };
        if let Some(name_node) = node.child_by_field("name") {
            self.check_name(&CLASS_NAME, name, name_node, || {
                format!("class name {} should be PascalCase", name)
            })?;
        }
        let class = self.scope.names.prefixed(name);
        if !self.hoisted.contains(&node.span.start) {
            self.declare_class(node, &class)?;
        }
        self.check_class(node, &class)?;
        Ok(Flow::Normal)
    }

    /// `new class(...) extends Base { ... }`
    pub(super) fn anonymous_class(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let class = format!("class@anonymous{}:{}", self.file.display(), node.span.start);
        if self.registry().declared_class(&class).is_none() {
            let entry = self.skeleton(node, &class);
            self.session.registry_mut().add_class(entry);
            self.own_classes.insert(symbol_key(&class));
            let collisions = self.populate_class(node, &class)?;
            self.report_collisions(node, &class, collisions)?;
        }
        self.check_class(node, &class)?;
        self.construct(node, &class, node.child_by_field("arguments"))?;
        Ok(TypeUnion::of(Type::instance(class)))
    }

    /// Check everything a class body evaluates: referenced classes,
    /// constant and property initializers, and method bodies
    fn check_class(&mut self, node: &CstNode, class: &str) -> InferResult<()> {
        let mut referenced: Vec<&CstNode> = Vec::new();
        if node.kind == NodeKind::InterfaceDeclaration {
            referenced.extend(listed_names(node.child_by_field("extends")));
        } else {
            referenced.extend(node.child_by_field("extends"));
            referenced.extend(listed_names(node.child_by_field("implements")));
        }
        for name in referenced {
            let qualified = self.scope.names.resolve_class(name.text());
            self.ensure_class(&qualified, name)?;
        }

        let context = self.class_context(class, node);
        let scope = self.scope.class_body(context);
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.check_members(node, class);
        self.scope = saved;
        result
    }

    fn check_members(&mut self, node: &CstNode, class: &str) -> InferResult<()> {
        let own = self.own_classes.contains(&symbol_key(class));
        for item in members(node) {
            match item.kind {
                NodeKind::ClassConstDeclaration => {
                    for element in item.children_by_field("element") {
                        if let Some(name) = element.field_text("name") {
                            self.check_constant_name(name, element)?;
                        }
                        if let Some(value) = element.child_by_field("value") {
                            self.expr(value)?;
                        }
                    }
                }
                NodeKind::PropertyDeclaration => {
                    for element in item.children_by_field("element") {
                        let (Some(name), Some(default)) =
                            (element.field_text("name"), element.child_by_field("default"))
                        else {
                            continue;
                        };
                        let value = self.expr(default)?;
                        let kind = if has_modifier(item, "static") {
                            MemberKind::StaticProperty
                        } else {
                            MemberKind::InstanceProperty
                        };
                        let declared = self
                            .registry()
                            .class(class)
                            .and_then(|entry| entry.own_member(kind, name, false))
                            .and_then(|member| member.declared.clone());
                        if let Some(declared) = declared {
                            if !self.accepts(&value, &declared) {
                                self.report(
                                    DiagnosticKind::AssignmentTypeMismatch,
                                    element,
                                    format!(
                                        "default value of {}::${} must be {}, {} given",
                                        class, name, declared, value
                                    ),
                                )?;
                            }
                        }
                    }
                }
                NodeKind::MethodDeclaration => self.check_method(item, class, own)?,
                NodeKind::TraitUse => {
                    for name in listed_names(item.child_by_field("traits")) {
                        let qualified = self.scope.names.resolve_class(name.text());
                        self.ensure_class(&qualified, name)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_method(&mut self, node: &CstNode, class: &str, own: bool) -> InferResult<()> {
        let Some(name) = node.field_text("name") else {
            return Ok(());
        };
        if let Some(name_node) = node.child_by_field("name") {
            self.check_name(&METHOD_NAME, name, name_node, || {
                format!("method name {}::{}() should be camelCase", class, name)
            })?;
        }
        let signature = self.signature(name, node)?;
        let Some(body) = node.child_by_field("body") else {
            return Ok(());
        };
        let display = format!("{}::{}", class, name);
        let is_static = has_modifier(node, "static");
        let outcome = self.check_body(body, &signature, &display, is_static, false)?;
        if own && signature.declared.is_none() {
            let mut function = signature.function;
            function.return_type = outcome.returns;
            self.session.registry_mut().update_method(class, name, function);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phplint_parser::Span;

    fn leaf(kind: NodeKind, text: &str) -> CstNode {
        CstNode::leaf(kind, Span::default(), text)
    }

    #[test]
    fn test_naming_patterns() {
        assert!(conforms(&CLASS_NAME, "HttpClient"));
        assert!(conforms(&CLASS_NAME, "Legacy_Thing"));
        assert!(!conforms(&CLASS_NAME, "httpClient"));
        assert!(conforms(&METHOD_NAME, "__construct"));
        assert!(conforms(&METHOD_NAME, "getName"));
        assert!(!conforms(&METHOD_NAME, "GetName"));
        assert!(!conforms(&METHOD_NAME, "get_name"));
        assert!(conforms(&CONSTANT_NAME, "MAX_SIZE"));
        assert!(!conforms(&CONSTANT_NAME, "maxSize"));
    }

    #[test]
    fn test_yield_in_nested_closure_is_ignored() {
        let yield_node = CstNode::new(NodeKind::YieldExpression, Span::default());
        let closure = CstNode::with_children(NodeKind::AnonymousFunction, Span::default(), vec![
            yield_node.clone(),
        ]);
        let outer = CstNode::with_children(NodeKind::Block, Span::default(), vec![closure]);
        assert!(!contains_yield(&outer));

        let statement = CstNode::with_children(NodeKind::ExpressionStatement, Span::default(), vec![
            yield_node,
        ]);
        let body = CstNode::with_children(NodeKind::Block, Span::default(), vec![statement]);
        assert!(contains_yield(&body));
    }

    #[test]
    fn test_listed_names_accepts_single_name() {
        let name = leaf(NodeKind::Name, "Base");
        assert_eq!(listed_names(Some(&name)).len(), 1);
        let list = CstNode::with_children(NodeKind::NameList, Span::default(), vec![
            leaf(NodeKind::Name, "A"),
            leaf(NodeKind::Name, "B"),
        ]);
        assert_eq!(listed_names(Some(&list)).len(), 2);
        assert!(listed_names(None).is_empty());
    }
}
