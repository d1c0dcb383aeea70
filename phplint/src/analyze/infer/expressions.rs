//! Literals, variables, assignment and language constructs.

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::diagnostics::DiagnosticKind;
use crate::analyze::lattice::{ConstValue, Type, TypeUnion};
use crate::analyze::registry::Registry;
use crate::analyze::scope::{TypeEnv, THIS};
use crate::analyze::session::IncludeOutcome;

use super::members::method_return_type;
use super::operators::{binary_result, coalesce};
use super::{Checker, Flow, InferResult, Inferred};

/// Variables bound in every scope
const SUPERGLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV",
];

pub(super) fn integer_literal(node: &CstNode) -> TypeUnion {
    let text: String = node
        .text()
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(oct) = text.strip_prefix("0o") {
        (oct, 8)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text.as_str(), 10)
    };
    match i64::from_str_radix(digits, radix) {
        Ok(value) => TypeUnion::of(Type::Int(Some(value))),
        // Out of range integers are floats
        Err(_) => match u128::from_str_radix(digits, radix) {
            Ok(value) => TypeUnion::of(Type::Float(Some(value as f64))),
            Err(_) => TypeUnion::of(Type::float()),
        },
    }
}

pub(super) fn float_literal(node: &CstNode) -> TypeUnion {
    let text: String = node.text().chars().filter(|c| *c != '_').collect();
    TypeUnion::of(Type::Float(text.parse().ok()))
}

/// Member type of the arrays in `ty`; `mixed` when unknown.
///
/// Strings index to strings. Null and false read as null.
pub(super) fn array_element_type(ty: &TypeUnion) -> TypeUnion {
    let mut element = TypeUnion::empty();
    for member in ty.members() {
        add_element_type(member, &mut element);
    }
    if element.is_empty() {
        TypeUnion::mixed()
    } else {
        element
    }
}

fn add_element_type(member: &Type, element: &mut TypeUnion) {
    match member {
        Type::AssociativeArray(m) | Type::IndexedArray(m) if m.is_empty() => {
            element.add_type(Type::Mixed)
        }
        Type::AssociativeArray(m) | Type::IndexedArray(m) => element.add_types_from(m),
        Type::String(_) => element.add_type(Type::string()),
        Type::Null | Type::Bool(Some(false)) => element.add_type(Type::Null),
        Type::Optional { content, sentinel } => {
            add_element_type(content, element);
            if sentinel.has_null() || sentinel.has_false() {
                element.add_type(Type::Null);
            }
        }
        _ => element.add_type(Type::Mixed),
    }
}

/// Key and value types bound by `foreach` over `subject`
pub(super) fn iteration_types(registry: &Registry, subject: &TypeUnion) -> (TypeUnion, TypeUnion) {
    let mut keys = TypeUnion::empty();
    let mut values = TypeUnion::empty();
    for member in subject.members() {
        add_iteration_types(registry, member, &mut keys, &mut values);
    }
    if keys.is_empty() {
        keys = TypeUnion::mixed();
    }
    if values.is_empty() {
        values = TypeUnion::mixed();
    }
    (keys, values)
}

fn add_iteration_types(registry: &Registry, member: &Type, keys: &mut TypeUnion, values: &mut TypeUnion) {
    match member {
        Type::IndexedArray(m) => {
            keys.add_type(Type::int());
            values.add_types_from(m);
        }
        Type::AssociativeArray(m) => {
            keys.add_type(Type::int());
            keys.add_type(Type::string());
            values.add_types_from(m);
        }
        Type::Optional { content, .. } => add_iteration_types(registry, content, keys, values),
        // Iterating these is a runtime warning and yields nothing
        Type::Null | Type::Bool(_) => {}
        Type::ClassInstance(class) => {
            keys.add_type(Type::Mixed);
            values.add_types_from(&method_return_type(registry, class, "current"));
        }
        _ => {
            keys.add_type(Type::Mixed);
            values.add_type(Type::Mixed);
        }
    }
}

/// One step of `++`/`--` on a widened member
fn step(member: &Type, increment: bool) -> Type {
    let delta: i64 = if increment { 1 } else { -1 };
    match member {
        Type::Int(Some(i)) => match i.checked_add(delta) {
            Some(next) => Type::Int(Some(next)),
            None => Type::Float(Some(*i as f64 + delta as f64)),
        },
        Type::Int(None) => Type::int(),
        Type::Float(Some(f)) => Type::Float(Some(f + delta as f64)),
        Type::Float(None) => Type::float(),
        Type::Null if increment => Type::Int(Some(1)),
        Type::Null => Type::Null,
        Type::Bool(_) => member.clone(),
        Type::String(_) => Type::string(),
        _ => Type::Mixed,
    }
}

/// Literal result of a scalar cast, when the operand is known
fn cast_value(target: &str, value: &ConstValue) -> Option<Type> {
    let ty = match (target, value) {
        ("int", ConstValue::Int(i)) => Type::Int(Some(*i)),
        ("int", ConstValue::Float(f)) if f.is_finite() => Type::Int(Some(f.trunc() as i64)),
        ("int", ConstValue::Bool(b)) => Type::Int(Some(i64::from(*b))),
        ("int", ConstValue::Null) => Type::Int(Some(0)),
        ("int", ConstValue::String(s)) => Type::Int(s.trim().parse().ok()),
        ("float", ConstValue::Int(i)) => Type::Float(Some(*i as f64)),
        ("float", ConstValue::Float(f)) => Type::Float(Some(*f)),
        ("float", ConstValue::String(s)) => Type::Float(s.trim().parse().ok()),
        ("string", value) => Type::string_value(value.to_php_string()),
        ("bool", value) => Type::Bool(Some(value.is_truthy())),
        _ => return None,
    };
    Some(ty)
}

fn cast_target(text: &str) -> &'static str {
    match text.trim().to_ascii_lowercase().as_str() {
        "int" | "integer" => "int",
        "float" | "double" | "real" => "float",
        "string" | "binary" => "string",
        "bool" | "boolean" => "bool",
        "array" => "array",
        "object" => "object",
        "unset" => "unset",
        _ => "mixed",
    }
}

impl Checker<'_> {
    pub(super) fn interpolated_string(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let mut folded = Some(String::new());
        for part in node.positional_children() {
            let text = if part.kind == NodeKind::StringFragment {
                Some(part.text().to_string())
            } else {
                self.expr(part)?.value().map(|v| v.to_php_string())
            };
            folded = match (folded, text) {
                (Some(mut acc), Some(text)) => {
                    acc.push_str(&text);
                    Some(acc)
                }
                _ => None,
            };
        }
        Ok(TypeUnion::of(Type::String(folded)))
    }

    pub(super) fn magic_constant(&self, node: &CstNode) -> TypeUnion {
        let function = self.scope.function.as_ref().map(|f| f.name.as_str());
        let class = self.scope.class.as_ref();
        let ty = match node.text() {
            "__LINE__" => Type::Int(Some(node.span.start_line as i64)),
            "__FILE__" => Type::string_value(self.file.display().to_string()),
            "__DIR__" => Type::string_value(self.dir.display().to_string()),
            "__CLASS__" => match class {
                Some(c) if !c.is_trait => Type::string_value(c.name.clone()),
                Some(_) => Type::string(),
                None => Type::string_value(""),
            },
            "__TRAIT__" => match class {
                Some(c) if c.is_trait => Type::string_value(c.name.clone()),
                _ => Type::string_value(""),
            },
            "__FUNCTION__" => {
                let name = function.map_or("", |f| f.rsplit("::").next().unwrap_or(f));
                Type::string_value(name)
            }
            "__METHOD__" => Type::string_value(function.unwrap_or("")),
            "__NAMESPACE__" => Type::string_value(self.scope.names.namespace().unwrap_or("")),
            _ => Type::string(),
        };
        TypeUnion::of(ty)
    }

    // ==================== Arrays ====================

    pub(super) fn array_literal(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        if let Some(value) = assigning {
            self.destructure(node, &value)?;
            return Ok(value);
        }
        let mut keyed = false;
        let mut members = TypeUnion::empty();
        for element in node.positional_children() {
            if let Some(key) = element.child_by_field("key") {
                keyed = true;
                self.expr(key)?;
            }
            let Some(value) = element.child_by_field("value") else {
                continue;
            };
            if element.has_flag("reference") {
                let ty = self.reference_source(value)?;
                members.add_types_from(&ty.widened());
                continue;
            }
            let ty = self.expr(value)?;
            if element.has_flag("spread") {
                keyed |= ty
                    .members()
                    .iter()
                    .any(|m| matches!(m, Type::AssociativeArray(_)));
                members.add_types_from(&array_element_type(&ty).widened());
            } else {
                members.add_types_from(&ty.widened());
            }
        }
        let array = if keyed {
            Type::associative(members)
        } else {
            Type::indexed(members)
        };
        Ok(TypeUnion::of(array))
    }

    /// `[$a, 'k' => $b] = $value` / `list(...) = $value`
    fn destructure(&mut self, node: &CstNode, value: &TypeUnion) -> InferResult<()> {
        let element_ty = array_element_type(value);
        for element in node.positional_children() {
            if let Some(key) = element.child_by_field("key") {
                self.expr(key)?;
            }
            if let Some(target) = element.child_by_field("value") {
                self.assign_to(target, element_ty.clone())?;
            }
        }
        Ok(())
    }

    // ==================== Names ====================

    pub(super) fn variable(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let name = node.text();
        if let Some(value) = assigning {
            self.scope.bind(name, value.clone());
            return Ok(value);
        }
        if let Some(ty) = self.scope.lookup(name) {
            return Ok(ty.clone());
        }
        if SUPERGLOBALS.contains(&name) {
            return Ok(TypeUnion::of(Type::associative(TypeUnion::mixed())));
        }
        if self.scope.function.is_none() {
            match name {
                "argv" => return Ok(TypeUnion::of(Type::indexed(TypeUnion::of(Type::string())))),
                "argc" => return Ok(TypeUnion::of(Type::int())),
                _ => {}
            }
        }
        if self.scope.probing {
            return Ok(TypeUnion::of(Type::Null));
        }
        if self.scope.including {
            return Ok(TypeUnion::mixed());
        }
        let message = if name == THIS {
            "$this used outside of an object context".to_string()
        } else {
            format!("undefined variable ${}", name)
        };
        self.report(DiagnosticKind::UndefinedName, node, message)?;
        // Report each undefined variable once per path. Muted loop passes
        // leave it unbound so the reporting pass still sees it undefined.
        if name != THIS && self.muted == 0 {
            self.scope.bind(name, TypeUnion::mixed());
        }
        Ok(TypeUnion::mixed())
    }

    /// `$$name` / `${expr}`: resolvable when the name is a known string
    pub(super) fn variable_variable(
        &mut self,
        node: &CstNode,
        assigning: Option<TypeUnion>,
    ) -> InferResult<TypeUnion> {
        let name = match node.child_by_field("name") {
            Some(name) => self.expr(name)?,
            None => TypeUnion::mixed(),
        };
        let name = match name.value() {
            Some(ConstValue::String(name)) => Some(name),
            _ => None,
        };
        match (assigning, name) {
            (Some(value), Some(name)) => {
                self.scope.bind(&name, value.clone());
                Ok(value)
            }
            (Some(value), None) => Ok(value),
            (None, Some(name)) => Ok(self.scope.lookup(&name).cloned().unwrap_or_else(TypeUnion::mixed)),
            (None, None) => Ok(TypeUnion::mixed()),
        }
    }

    /// A bare name in expression position is a constant
    pub(super) fn constant_fetch(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let text = node.text();
        match text.trim_start_matches('\\').to_ascii_lowercase().as_str() {
            "true" => return Ok(TypeUnion::of(Type::Bool(Some(true)))),
            "false" => return Ok(TypeUnion::of(Type::Bool(Some(false)))),
            "null" => return Ok(TypeUnion::of(Type::Null)),
            _ => {}
        }
        let candidates = self.scope.names.resolve_constant(text);
        if let Some(ty) = self.lookup_constant(&candidates) {
            return Ok(ty);
        }
        if let Some(first) = candidates.first() {
            if self.session.autoload(first) {
                if let Some(ty) = self.lookup_constant(&candidates) {
                    return Ok(ty);
                }
            }
        }
        if !self.tolerant() {
            self.report(
                DiagnosticKind::UndefinedName,
                node,
                format!("undefined constant {}", text.trim_start_matches('\\')),
            )?;
        }
        Ok(TypeUnion::mixed())
    }

    fn lookup_constant(&self, candidates: &[String]) -> Option<TypeUnion> {
        candidates
            .iter()
            .find_map(|name| self.registry().constant(name).cloned())
    }

    // ==================== Assignment ====================

    pub(super) fn assignment(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let mut ty = self.expr(right)?;
        if ty.is_empty() && right.kind.is_call() {
            self.report(
                DiagnosticKind::AssignmentWithoutValue,
                right,
                "assignment of a call that returns no value",
            )?;
            ty = TypeUnion::of(Type::Null);
        }
        self.assign_to(left, ty.clone())?;
        Ok(ty)
    }

    /// Value of the right side of `&`: taking a reference creates the
    /// variable (or element) as null
    fn reference_source(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        if node.kind == NodeKind::Variable {
            if let Some(ty) = self.scope.lookup(node.text()) {
                return Ok(ty.clone());
            }
            let null = TypeUnion::of(Type::Null);
            self.scope.bind(node.text(), null.clone());
            return Ok(null);
        }
        self.probe(node)
    }

    pub(super) fn reference_assignment(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let ty = self.reference_source(right)?;
        self.assign_to(left, ty.clone())?;
        Ok(ty)
    }

    pub(super) fn compound_assignment(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(left), Some(right)) = (node.child_by_field("left"), node.child_by_field("right"))
        else {
            return Ok(TypeUnion::mixed());
        };
        let operator = node.field_text("operator").unwrap_or_default();
        let result = if operator == "??=" {
            let current = self.probe(left)?;
            let value = self.expr(right)?;
            coalesce(&current, &value)
        } else {
            let current = self.expr(left)?;
            let value = self.expr(right)?;
            binary_result(operator.trim_end_matches('='), &current, &value)
        };
        self.assign_to(left, result.clone())?;
        Ok(result)
    }

    pub(super) fn update_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let Some(operand) = node.child_by_field("operand") else {
            return Ok(TypeUnion::mixed());
        };
        let increment = node.field_text("operator") == Some("++");
        let old = self.expr(operand)?;
        let new: TypeUnion = old.members().iter().map(|m| step(m, increment)).collect();
        let new = if new.is_empty() { TypeUnion::mixed() } else { new };
        self.assign_to(operand, new.clone())?;
        Ok(if node.kind == NodeKind::PrefixUpdateExpression {
            new
        } else {
            old
        })
    }

    // ==================== Operators with special forms ====================

    pub(super) fn cast_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let operand = match node.child_by_field("operand") {
            Some(operand) => self.expr(operand)?,
            None => TypeUnion::mixed(),
        };
        let target = cast_target(node.field_text("type").unwrap_or_default());
        if let Some(folded) = operand.value().and_then(|v| cast_value(target, &v)) {
            return Ok(TypeUnion::of(folded));
        }
        let ty = match target {
            "int" => Type::int(),
            "float" => Type::float(),
            "string" => Type::string(),
            "bool" => Type::bool(),
            "array" if !operand.is_unknown() && operand.members().iter().all(Type::is_array) => {
                return Ok(operand)
            }
            "array" => Type::array(),
            "object" => Type::instance("stdClass"),
            "unset" => Type::Null,
            _ => Type::Mixed,
        };
        Ok(TypeUnion::of(ty))
    }

    pub(super) fn error_suppression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        match node.child_by_field("operand") {
            Some(operand) => self.expr(operand),
            None => Ok(TypeUnion::mixed()),
        }
    }

    pub(super) fn ternary_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let (Some(condition), Some(alternative)) = (
            node.child_by_field("condition"),
            node.child_by_field("alternative"),
        ) else {
            return Ok(TypeUnion::mixed());
        };
        let branches = self.condition(condition)?;
        let known = branches.known();
        let mut ty = TypeUnion::empty();
        let mut envs: Vec<TypeEnv> = Vec::new();
        if known != Some(false) {
            self.scope.env = branches.then_env.clone();
            let value = match node.child_by_field("consequence") {
                Some(consequence) => self.expr(consequence)?,
                // `a ?: b` yields `a` when it is truthy
                None => branches.ty.as_true(),
            };
            ty.add_types_from(&value);
            envs.push(self.scope.env.clone());
        }
        if known != Some(true) {
            self.scope.env = branches.else_env.clone();
            ty.add_types_from(&self.expr(alternative)?);
            envs.push(self.scope.env.clone());
        }
        if let Some(env) = TypeEnv::join_all(&envs) {
            self.scope.env = env;
        }
        Ok(ty)
    }

    // ==================== Language constructs ====================

    pub(super) fn clone_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        match node.child_by_field("value") {
            Some(value) => self.expr(value),
            None => Ok(TypeUnion::mixed()),
        }
    }

    pub(super) fn isset_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        for target in node.positional_children() {
            self.probe(target)?;
        }
        Ok(TypeUnion::of(Type::bool()))
    }

    pub(super) fn empty_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        if let Some(value) = node.child_by_field("value") {
            self.probe(value)?;
        }
        Ok(TypeUnion::of(Type::bool()))
    }

    pub(super) fn print_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        if let Some(value) = node.child_by_field("value") {
            self.expr(value)?;
        }
        Ok(TypeUnion::of(Type::Int(Some(1))))
    }

    pub(super) fn eval_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        if let Some(value) = node.child_by_field("value") {
            self.expr(value)?;
        }
        Ok(TypeUnion::mixed())
    }

    pub(super) fn exit_expression(&mut self, node: &CstNode) -> InferResult<Inferred> {
        if let Some(value) = node.child_by_field("value") {
            self.expr(value)?;
        }
        Ok(Inferred::statement(Flow::Exit))
    }

    pub(super) fn throw_expression(&mut self, node: &CstNode) -> InferResult<Inferred> {
        if let Some(value) = node.child_by_field("value") {
            self.expr(value)?;
        }
        Ok(Inferred::statement(Flow::Exit))
    }

    /// `include`/`require`: the value is what the target file returns
    pub(super) fn include_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let kind = node.field_text("kind").unwrap_or("include").to_ascii_lowercase();
        let is_require = kind.starts_with("require");
        let once = kind.ends_with("_once");
        let Some(value) = node.child_by_field("value") else {
            return Ok(TypeUnion::mixed());
        };
        let target = match self.expr(value)?.value() {
            Some(ConstValue::String(target)) => target,
            _ => return Ok(TypeUnion::mixed()),
        };
        let failure = if is_require {
            TypeUnion::mixed()
        } else {
            TypeUnion::of(Type::Bool(Some(false)))
        };
        let Some(path) = self.session.loader().resolve_include(&target, &self.dir) else {
            self.report(
                DiagnosticKind::IncludeFailure,
                node,
                format!("{} target '{}' not found", kind, target),
            )?;
            return Ok(failure);
        };
        match self.session.include(&path, once) {
            IncludeOutcome::Analyzed(value) => Ok(value),
            IncludeOutcome::AlreadyIncluded => Ok(TypeUnion::of(Type::Bool(Some(true)))),
            IncludeOutcome::InProgress => Ok(TypeUnion::mixed()),
            IncludeOutcome::Failed => {
                if is_require {
                    self.report(
                        DiagnosticKind::IncludeFailure,
                        node,
                        format!("{} of '{}' failed", kind, path.display()),
                    )?;
                }
                Ok(TypeUnion::of(Type::Bool(Some(false))))
            }
        }
    }

    pub(super) fn match_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        if let Some(subject) = node.child_by_field("subject") {
            self.expr(subject)?;
        }
        let entry = self.scope.env.clone();
        let mut ty = TypeUnion::empty();
        let mut envs = Vec::new();
        for arm in node.children_by_field("arm") {
            self.scope.env = entry.clone();
            for condition in arm.children_by_field("condition") {
                self.expr(condition)?;
            }
            let Some(body) = arm.child_by_field("body") else {
                continue;
            };
            let inferred = self.visit(body)?;
            if inferred.flow.is_normal() {
                ty.add_types_from(&inferred.ty);
                envs.push(self.scope.env.clone());
            }
        }
        self.scope.env = TypeEnv::join_all(&envs).unwrap_or(entry);
        Ok(ty)
    }

    pub(super) fn yield_expression(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        for field in ["key", "value", "from"] {
            if let Some(part) = node.child_by_field(field) {
                self.expr(part)?;
            }
        }
        Ok(TypeUnion::mixed())
    }

    /// Comma list (`for` headers); the value is the last expression's
    pub(super) fn expression_list(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let mut ty = TypeUnion::empty();
        for expression in node.positional_children() {
            ty = self.expr(expression)?;
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phplint_parser::Span;

    fn literal(kind: NodeKind, text: &str) -> CstNode {
        CstNode::leaf(kind, Span::default(), text)
    }

    #[test]
    fn test_integer_literal_bases() {
        let value = |text| integer_literal(&literal(NodeKind::IntegerLiteral, text)).value();
        assert_eq!(value("42"), Some(ConstValue::Int(42)));
        assert_eq!(value("0x1F"), Some(ConstValue::Int(31)));
        assert_eq!(value("0b101"), Some(ConstValue::Int(5)));
        assert_eq!(value("017"), Some(ConstValue::Int(15)));
        assert_eq!(value("0o17"), Some(ConstValue::Int(15)));
        assert_eq!(value("1_000"), Some(ConstValue::Int(1000)));
        assert!(matches!(
            value("9223372036854775808"),
            Some(ConstValue::Float(_))
        ));
    }

    #[test]
    fn test_element_type() {
        let ints = TypeUnion::of(Type::indexed(TypeUnion::of(Type::int())));
        assert_eq!(array_element_type(&ints), TypeUnion::of(Type::int()));
        assert!(array_element_type(&TypeUnion::of(Type::array())).is_mixed());
        assert_eq!(
            array_element_type(&TypeUnion::of(Type::string_value("abc"))),
            TypeUnion::of(Type::string())
        );
    }

    #[test]
    fn test_step_overflow_promotes() {
        assert_eq!(step(&Type::Int(Some(i64::MAX)), true), Type::Float(Some(i64::MAX as f64 + 1.0)));
        assert_eq!(step(&Type::Null, true), Type::Int(Some(1)));
        assert_eq!(step(&Type::Null, false), Type::Null);
    }

    #[test]
    fn test_cast_folding() {
        assert_eq!(
            cast_value("int", &ConstValue::String(" 12 ".into())),
            Some(Type::Int(Some(12)))
        );
        assert_eq!(
            cast_value("string", &ConstValue::Bool(true)),
            Some(Type::string_value("1"))
        );
        assert_eq!(cast_value("bool", &ConstValue::String("0".into())), Some(Type::Bool(Some(false))));
        assert_eq!(cast_target("DOUBLE"), "float");
    }
}
