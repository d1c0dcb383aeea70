//! Statement rules: blocks, branches, loops, jumps and scope-level
//! declarations (`namespace`, `use`, `global`, `static`, `const`).

use phplint_parser::{CstNode, NodeKind};

use crate::analyze::diagnostics::DiagnosticKind;
use crate::analyze::docblock::DocBlock;
use crate::analyze::lattice::{Type, TypeUnion};
use crate::analyze::scope::{NameResolver, SymbolKind, TypeEnv};

use super::expressions::iteration_types;
use super::{Checker, Flow, InferResult};

/// Upper bound on passes over a loop body before its head environment is
/// taken as stable.
pub(crate) const MAX_LOOP_FIXPOINT_ITERATIONS: usize = 5;

/// What one pass over a loop produced.
struct LoopPass {
    /// Environment flowing back to the loop head, if the body can repeat
    back_edge: Option<TypeEnv>,
    /// Environments leaving the loop (failed condition, `break`)
    exits: Vec<TypeEnv>,
}

/// Register the names imported by a `use` declaration
pub(super) fn import_names(names: &mut NameResolver, node: &CstNode) {
    let default_kind = node.field_text("kind");
    for clause in node.children_by_field("clause") {
        let Some(name) = clause.field_text("name") else {
            continue;
        };
        let kind = SymbolKind::from_use_modifier(clause.field_text("kind").or(default_kind));
        names.add_alias(kind, name, clause.field_text("alias"));
    }
}

fn is_declaration(node: &CstNode) -> bool {
    node.kind.is_declaration()
}

impl Checker<'_> {
    pub(super) fn block(&mut self, node: &CstNode) -> InferResult<Flow> {
        self.statements(node.positional_children())
    }

    /// Check statements in order. Once control has left, only declarations
    /// are still checked: they exist whether or not they are reached.
    pub(super) fn statements<'n>(
        &mut self,
        statements: impl IntoIterator<Item = &'n CstNode>,
    ) -> InferResult<Flow> {
        let mut flow = Flow::Normal;
        for statement in statements {
            if flow.is_normal() {
                flow = self.visit(statement)?.flow;
            } else if is_declaration(statement) {
                self.visit(statement)?;
            }
        }
        Ok(flow)
    }

    pub(super) fn echo_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        for value in node.positional_children() {
            self.expr(value)?;
        }
        Ok(Flow::Normal)
    }

    pub(super) fn expression_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let Some(expression) = node.child_by_field("expression") else {
            return Ok(Flow::Normal);
        };
        let inferred = self.visit(expression)?;
        if let Some(doc) = node.doc() {
            self.apply_var_tags(doc, expression, &inferred.ty)?;
        }
        Ok(inferred.flow)
    }

    /// `/** @var T $x */` before a statement rebinds `$x` to `T`. An unnamed
    /// tag applies to the variable the statement assigns.
    fn apply_var_tags(
        &mut self,
        doc: &str,
        expression: &CstNode,
        inferred: &TypeUnion,
    ) -> InferResult<()> {
        let block = DocBlock::parse(doc);
        let assigned = match expression.kind {
            NodeKind::Assignment | NodeKind::ReferenceAssignment => expression
                .child_by_field("left")
                .filter(|left| left.kind == NodeKind::Variable)
                .map(|left| left.text().to_string()),
            _ => None,
        };
        for tag in &block.vars {
            let Some(name) = tag.name.clone().or_else(|| assigned.clone()) else {
                continue;
            };
            let documented = self.resolver().resolve(&tag.ty);
            if assigned.as_deref() == Some(name.as_str())
                && !inferred.matches(&documented, self.registry())
            {
                self.report(
                    DiagnosticKind::DocumentationMismatch,
                    expression,
                    format!("@var {} does not match the assigned {}", documented, inferred),
                )?;
            }
            self.scope.bind(&name, documented);
        }
        Ok(())
    }

    // ==================== Branches ====================

    pub(super) fn if_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let mut arms: Vec<(Option<&CstNode>, &CstNode)> = Vec::new();
        if let (Some(condition), Some(body)) =
            (node.child_by_field("condition"), node.child_by_field("body"))
        {
            arms.push((Some(condition), body));
        }
        for alternative in node.children_by_field("alternative") {
            if let Some(body) = alternative.child_by_field("body") {
                arms.push((alternative.child_by_field("condition"), body));
            }
        }

        let mut exits: Vec<TypeEnv> = Vec::new();
        let mut flow: Option<Flow> = None;
        // Whether some path skips every arm
        let mut fallthrough = true;
        for (condition, body) in arms {
            let Some(condition) = condition else {
                let arm = self.visit(body)?.flow;
                self.record_arm(arm, &mut flow, &mut exits);
                fallthrough = false;
                break;
            };
            let branches = self.condition(condition)?;
            let known = branches.known();
            if known != Some(false) {
                self.scope.env = branches.then_env.clone();
                let arm = self.visit(body)?.flow;
                self.record_arm(arm, &mut flow, &mut exits);
            }
            if known == Some(true) {
                fallthrough = false;
                break;
            }
            self.scope.env = branches.else_env;
        }
        if fallthrough {
            exits.push(self.scope.env.clone());
            flow = Some(flow.map_or(Flow::Normal, |f| f.either(Flow::Normal)));
        }
        if let Some(env) = TypeEnv::join_all(&exits) {
            self.scope.env = env;
        }
        Ok(flow.unwrap_or(Flow::Normal))
    }

    fn record_arm(&self, arm: Flow, flow: &mut Option<Flow>, exits: &mut Vec<TypeEnv>) {
        *flow = Some(flow.map_or(arm, |f| f.either(arm)));
        if arm.is_normal() {
            exits.push(self.scope.env.clone());
        }
    }

    pub(super) fn switch_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        if let Some(subject) = node.child_by_field("subject") {
            self.expr(subject)?;
        }
        let entry = self.scope.env.clone();
        let mut has_default = false;
        let mut fallthrough: Option<TypeEnv> = None;

        self.scope.enter_loop();
        for clause in node.positional_children() {
            let mut env = entry.clone();
            if let Some(previous) = &fallthrough {
                env.merge(previous);
            }
            self.scope.env = env;
            match clause.kind {
                NodeKind::CaseClause => {
                    if let Some(value) = clause.child_by_field("value") {
                        self.expr(value)?;
                    }
                }
                NodeKind::DefaultClause => has_default = true,
                _ => continue,
            }
            let flow = self.statements(clause.positional_children())?;
            fallthrough = flow.is_normal().then(|| self.scope.env.clone());
        }
        let targets = self.scope.exit_loop();

        let mut exits: Vec<TypeEnv> = fallthrough.into_iter().collect();
        exits.extend(targets.breaks);
        exits.extend(targets.continues);
        if !has_default {
            exits.push(entry);
        }
        match TypeEnv::join_all(&exits) {
            Some(env) => {
                self.scope.env = env;
                Ok(Flow::Normal)
            }
            None => Ok(Flow::Exit),
        }
    }

    pub(super) fn try_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let entry = self.scope.env.clone();
        let mut exits = Vec::new();
        let mut flow: Option<Flow> = None;
        if let Some(body) = node.child_by_field("body") {
            let body_flow = self.block(body)?;
            self.record_arm(body_flow, &mut flow, &mut exits);
        }

        // A throw may leave the try block anywhere
        let handler_entry = TypeEnv::join(&entry, &self.scope.env);
        for clause in node.children_by_field("catch") {
            self.scope.env = handler_entry.clone();
            let caught = self.caught_types(clause);
            if let Some(variable) = clause.child_by_field("variable") {
                self.scope.bind(variable.text(), caught);
            }
            if let Some(body) = clause.child_by_field("body") {
                let catch_flow = self.block(body)?;
                self.record_arm(catch_flow, &mut flow, &mut exits);
            }
        }
        let flow = flow.unwrap_or(Flow::Normal);

        if let Some(finally) = node
            .child_by_field("finally")
            .and_then(|clause| clause.child_by_field("body"))
        {
            let mut env = handler_entry;
            for exit in &exits {
                env.merge(exit);
            }
            self.scope.env = env;
            let finally_flow = self.block(finally)?;
            if !finally_flow.is_normal() {
                return Ok(finally_flow);
            }
            return Ok(if exits.is_empty() { flow } else { Flow::Normal });
        }

        match TypeEnv::join_all(&exits) {
            Some(env) => {
                self.scope.env = env;
                Ok(Flow::Normal)
            }
            None => Ok(flow),
        }
    }

    /// Union of the instances a catch clause accepts
    fn caught_types(&self, clause: &CstNode) -> TypeUnion {
        let mut caught = TypeUnion::empty();
        if let Some(types) = clause.child_by_field("types") {
            for name in types.positional_children() {
                caught.add_type(Type::instance(self.class_reference(name.text())));
            }
        }
        if caught.is_empty() {
            caught.add_type(Type::instance("Throwable"));
        }
        caught
    }

    // ==================== Loops ====================

    /// Run a loop to a fixpoint.
    ///
    /// `pass` checks the loop once from `scope.env`. Passes repeat muted,
    /// widening the head environment with each back edge, until nothing
    /// changes or the iteration bound is reached; a final pass from the
    /// stable head reports diagnostics. Control continues in the join of
    /// the final pass's exits.
    fn run_loop<F>(&mut self, mut pass: F) -> InferResult<Flow>
    where
        F: FnMut(&mut Self) -> InferResult<LoopPass>,
    {
        let mut head = self.scope.env.clone();
        self.muted += 1;
        let settled = self.settle_loop(&mut head, &mut pass);
        self.muted -= 1;
        settled?;

        self.scope.env = head;
        let last = pass(self)?;
        match TypeEnv::join_all(&last.exits) {
            Some(env) => {
                self.scope.env = env;
                Ok(Flow::Normal)
            }
            None => Ok(Flow::Exit),
        }
    }

    fn settle_loop<F>(&mut self, head: &mut TypeEnv, pass: &mut F) -> InferResult<()>
    where
        F: FnMut(&mut Self) -> InferResult<LoopPass>,
    {
        for _ in 0..MAX_LOOP_FIXPOINT_ITERATIONS {
            self.scope.env = head.clone();
            let Some(back_edge) = pass(self)?.back_edge else {
                break;
            };
            if !head.merge_changed(&back_edge) {
                break;
            }
        }
        Ok(())
    }

    /// Check one iteration of a loop body: the environment at its end
    /// (joined with `continue`s) and the environments of its `break`s
    fn loop_body(&mut self, body: &CstNode) -> InferResult<(Option<TypeEnv>, Vec<TypeEnv>)> {
        self.scope.enter_loop();
        let flow = self.visit(body);
        let targets = self.scope.exit_loop();
        let flow = flow?.flow;
        let mut ends = targets.continues;
        if flow.is_normal() {
            ends.push(self.scope.env.clone());
        }
        Ok((TypeEnv::join_all(&ends), targets.breaks))
    }

    pub(super) fn while_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let (Some(condition), Some(body)) =
            (node.child_by_field("condition"), node.child_by_field("body"))
        else {
            return Ok(Flow::Normal);
        };
        self.run_loop(|c| {
            let branches = c.condition(condition)?;
            let known = branches.known();
            let mut exits = Vec::new();
            if known != Some(true) {
                exits.push(branches.else_env.clone());
            }
            if known == Some(false) {
                return Ok(LoopPass {
                    back_edge: None,
                    exits,
                });
            }
            c.scope.env = branches.then_env;
            let (back_edge, breaks) = c.loop_body(body)?;
            exits.extend(breaks);
            Ok(LoopPass { back_edge, exits })
        })
    }

    pub(super) fn do_while_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let (Some(body), Some(condition)) =
            (node.child_by_field("body"), node.child_by_field("condition"))
        else {
            return Ok(Flow::Normal);
        };
        self.run_loop(|c| {
            let (end, mut exits) = c.loop_body(body)?;
            let Some(end) = end else {
                return Ok(LoopPass {
                    back_edge: None,
                    exits,
                });
            };
            c.scope.env = end;
            let branches = c.condition(condition)?;
            let known = branches.known();
            if known != Some(true) {
                exits.push(branches.else_env.clone());
            }
            let back_edge = (known != Some(false)).then_some(branches.then_env);
            Ok(LoopPass { back_edge, exits })
        })
    }

    pub(super) fn for_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        if let Some(init) = node.child_by_field("init") {
            self.expr(init)?;
        }
        let Some(body) = node.child_by_field("body") else {
            return Ok(Flow::Normal);
        };
        let conditions: Vec<&CstNode> = node
            .child_by_field("condition")
            .map(|list| list.positional_children().collect())
            .unwrap_or_default();
        let update = node.child_by_field("update");

        self.run_loop(|c| {
            let mut exits = Vec::new();
            // Only the last expression of the condition list decides; an
            // empty list loops until a break
            if let Some((last, rest)) = conditions.split_last() {
                for expression in rest {
                    c.expr(expression)?;
                }
                let branches = c.condition(last)?;
                let known = branches.known();
                if known != Some(true) {
                    exits.push(branches.else_env.clone());
                }
                if known == Some(false) {
                    return Ok(LoopPass {
                        back_edge: None,
                        exits,
                    });
                }
                c.scope.env = branches.then_env;
            }
            let (end, breaks) = c.loop_body(body)?;
            exits.extend(breaks);
            let back_edge = match end {
                Some(end) => {
                    c.scope.env = end;
                    if let Some(update) = update {
                        c.expr(update)?;
                    }
                    Some(c.scope.env.clone())
                }
                None => None,
            };
            Ok(LoopPass { back_edge, exits })
        })
    }

    pub(super) fn foreach_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let (Some(subject), Some(value), Some(body)) = (
            node.child_by_field("subject"),
            node.child_by_field("value"),
            node.child_by_field("body"),
        ) else {
            return Ok(Flow::Normal);
        };
        let subject_ty = self.expr(subject)?;
        let (key_ty, value_ty) = iteration_types(self.registry(), &subject_ty);
        let key = node.child_by_field("key");

        self.run_loop(|c| {
            // Zero iterations leave the loop straight from the head
            let mut exits = vec![c.scope.env.clone()];
            if let Some(key) = key {
                c.assign_to(key, key_ty.clone())?;
            }
            c.assign_to(value, value_ty.clone())?;
            let (end, breaks) = c.loop_body(body)?;
            exits.extend(breaks);
            exits.extend(end.clone());
            Ok(LoopPass {
                back_edge: end,
                exits,
            })
        })
    }

    // ==================== Jumps ====================

    pub(super) fn jump_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let depth = node
            .field_text("depth")
            .and_then(|d| d.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        self.scope
            .record_jump(depth, node.kind == NodeKind::ContinueStatement);
        Ok(Flow::Jump)
    }

    pub(super) fn return_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        let ty = match node.child_by_field("value") {
            Some(value) => Some(self.expr(value)?),
            None => None,
        };
        if self.scope.function.is_none() {
            // A top-level return ends the file with a value for `include`
            let ty = ty.unwrap_or_else(|| TypeUnion::of(Type::Null));
            self.file_return
                .get_or_insert_with(TypeUnion::empty)
                .add_types_from(&ty);
            return Ok(Flow::Exit);
        }
        if let Some(ty) = &ty {
            self.scope.observe_return(ty);
        }
        self.check_return(node, ty.as_ref())?;
        Ok(Flow::Exit)
    }

    /// Check a `return` against the declared return type
    pub(super) fn check_return(&mut self, node: &CstNode, ty: Option<&TypeUnion>) -> InferResult<()> {
        let Some(function) = &self.scope.function else {
            return Ok(());
        };
        if function.is_generator {
            return Ok(());
        }
        let Some(declared) = function.declared.clone() else {
            return Ok(());
        };
        let name = function.name.clone();
        let message = match ty {
            Some(ty) if declared.is_empty() && !ty.is_empty() => {
                format!("{}() has no return value but returns {}", name, ty)
            }
            None if !declared.is_empty() => {
                format!("{}() must return a value of type {}", name, declared)
            }
            Some(ty) if !declared.is_empty() && !ty.complies_with(&declared, self.registry()) => {
                format!("{}() must return {}, {} returned", name, declared, ty)
            }
            _ => return Ok(()),
        };
        self.report(DiagnosticKind::ReturnTypeMismatch, node, message)
    }

    pub(super) fn goto_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        self.report(
            DiagnosticKind::UnsupportedConstruct,
            node,
            "goto is not supported",
        )?;
        Ok(Flow::Exit)
    }

    pub(super) fn declare_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        match node.child_by_field("body") {
            Some(body) => Ok(self.visit(body)?.flow),
            None => Ok(Flow::Normal),
        }
    }

    // ==================== Scope declarations ====================

    pub(super) fn namespace_definition(&mut self, node: &CstNode) -> InferResult<Flow> {
        self.scope.names.set_namespace(node.field_text("name"));
        let Some(body) = node.child_by_field("body") else {
            return Ok(Flow::Normal);
        };
        let flow = self.block(body)?;
        self.scope.names.set_namespace(None);
        Ok(flow)
    }

    pub(super) fn use_declaration(&mut self, node: &CstNode) -> InferResult<Flow> {
        import_names(&mut self.scope.names, node);
        Ok(Flow::Normal)
    }

    /// `global $x` binds `$x` to whatever the global holds
    pub(super) fn global_declaration(&mut self, node: &CstNode) -> InferResult<Flow> {
        for variable in node.positional_children() {
            if variable.kind == NodeKind::Variable {
                self.scope.bind(variable.text(), TypeUnion::mixed());
            }
        }
        Ok(Flow::Normal)
    }

    /// Static locals keep their value between calls, so only the widened
    /// initializer is known
    pub(super) fn static_declaration(&mut self, node: &CstNode) -> InferResult<Flow> {
        for variable in node.positional_children() {
            let Some(name) = variable.field_text("name") else {
                continue;
            };
            let ty = match variable.child_by_field("default") {
                Some(default) => {
                    let ty = self.expr(default)?;
                    if ty.members().iter().all(Type::is_null) {
                        TypeUnion::mixed()
                    } else {
                        ty.widened()
                    }
                }
                None => TypeUnion::mixed(),
            };
            self.scope.bind(name, ty);
        }
        Ok(Flow::Normal)
    }

    pub(super) fn unset_statement(&mut self, node: &CstNode) -> InferResult<Flow> {
        for target in node.positional_children() {
            if target.kind == NodeKind::Variable {
                self.scope.env.remove(target.text());
            } else {
                self.probe(target)?;
            }
        }
        Ok(Flow::Normal)
    }

    pub(super) fn const_declaration(&mut self, node: &CstNode) -> InferResult<Flow> {
        for element in node.children_by_field("element") {
            let (Some(name), Some(value)) = (element.field_text("name"), element.child_by_field("value"))
            else {
                continue;
            };
            let ty = self.expr(value)?;
            self.check_constant_name(name, element)?;
            let qualified = self.scope.names.prefixed(name);
            self.session.registry_mut().add_constant(&qualified, ty);
        }
        Ok(Flow::Normal)
    }
}
