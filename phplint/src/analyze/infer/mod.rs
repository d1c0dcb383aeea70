//! The node inference table.
//!
//! [`Checker`] walks one file's tree depth-first. Every [`NodeKind`] has
//! exactly one rule in [`Checker::visit`], which returns the node's type
//! together with how control leaves it. Statements update `scope.env` in
//! place; branches swap in the environment of their own path and the
//! surviving paths are joined afterwards.
//!
//! Rules are grouped by concern:
//! - `statements`: blocks, control flow, loops (fixpoint iteration)
//! - `declarations`: functions, closures, classes, hoisting
//! - `expressions`: literals, variables, assignment, language constructs
//! - `operators`: binary/unary operators and constant folding
//! - `calls`: function, method, static calls and `new`
//! - `members`: property and constant access, class references
//! - `condition`: splitting the environment by a boolean test

mod calls;
mod condition;
mod declarations;
mod expressions;
mod members;
mod operators;
mod statements;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use phplint_parser::{CstNode, NodeKind};
use tracing::warn;

use crate::analyze::diagnostics::{Diagnostic, DiagnosticKind};
use crate::analyze::docblock::TypeResolver;
use crate::analyze::lattice::{Type, TypeUnion};
use crate::analyze::registry::Registry;
use crate::analyze::scope::Scope;
use crate::analyze::session::AnalysisSession;
use crate::error::AnalysisAbort;
use crate::span::Location;

pub use condition::Branches;

pub(crate) type InferResult<T> = Result<T, AnalysisAbort>;

/// How control leaves a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Falls through to what follows
    Normal,
    /// `break`/`continue`; the environment was recorded on the loop
    Jump,
    /// `return`, `throw` or `exit`
    Exit,
}

impl Flow {
    pub fn is_normal(self) -> bool {
        self == Flow::Normal
    }

    /// Flow of a statement whose paths end in `self` or `other`
    pub fn either(self, other: Flow) -> Flow {
        match (self, other) {
            (Flow::Normal, _) | (_, Flow::Normal) => Flow::Normal,
            (Flow::Jump, _) | (_, Flow::Jump) => Flow::Jump,
            _ => Flow::Exit,
        }
    }
}

/// Result of one rule: the node's type and how control leaves it.
#[derive(Debug, Clone, PartialEq)]
pub struct Inferred {
    pub ty: TypeUnion,
    pub flow: Flow,
}

impl Inferred {
    pub fn value(ty: TypeUnion) -> Self {
        Self {
            ty,
            flow: Flow::Normal,
        }
    }

    /// A statement has no value
    pub fn statement(flow: Flow) -> Self {
        Self {
            ty: TypeUnion::empty(),
            flow,
        }
    }
}

/// Inference state for one file.
#[derive(Debug)]
pub struct Checker<'s> {
    session: &'s mut AnalysisSession,
    file: PathBuf,
    dir: PathBuf,
    scope: Scope,
    diagnostics: Vec<Diagnostic>,
    /// Non-fatal diagnostics are dropped while positive (loop fixpoint passes)
    muted: usize,
    /// Span starts of declarations registered ahead of their statement
    hoisted: HashSet<usize>,
    /// Symbol keys of classes and functions this file declared
    own_classes: HashSet<String>,
    own_functions: HashSet<String>,
    /// Classes already reported as unloadable in this file
    missing_classes: HashSet<String>,
    /// Union of top-level `return` values
    file_return: Option<TypeUnion>,
}

impl<'s> Checker<'s> {
    pub fn new(session: &'s mut AnalysisSession, file: &Path, including: bool) -> Self {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            session,
            file: file.to_path_buf(),
            dir,
            scope: Scope::file(including),
            diagnostics: Vec::new(),
            muted: 0,
            hoisted: HashSet::new(),
            own_classes: HashSet::new(),
            own_functions: HashSet::new(),
            missing_classes: HashSet::new(),
            file_return: None,
        }
    }

    /// Check a whole file; the value is what `include` of it evaluates to
    pub fn check_file(&mut self, root: &CstNode) -> InferResult<TypeUnion> {
        self.hoist(root)?;
        self.visit(root)?;
        Ok(self
            .file_return
            .take()
            .unwrap_or_else(|| TypeUnion::of(Type::Int(Some(1)))))
    }

    /// Diagnostics found so far, duplicates removed
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics;
        diagnostics.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then(a.kind.cmp(&b.kind))
                .then(a.message.cmp(&b.message))
        });
        diagnostics.dedup();
        diagnostics
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub(crate) fn location(&self, node: &CstNode) -> Location {
        Location::from_span(&self.file, &node.span)
    }

    /// Record a diagnostic at `node`.
    ///
    /// Fatal kinds abort the file with `Err`; everything else is recorded
    /// and analysis continues.
    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        node: &CstNode,
        message: impl Into<String>,
    ) -> InferResult<()> {
        let location = self.location(node);
        let message = message.into();
        if kind.is_fatal() {
            warn!(%location, kind = kind.as_str(), "{}", message);
            self.diagnostics
                .push(Diagnostic::new(kind, location.clone(), message.clone()));
            return Err(AnalysisAbort::new(location, message));
        }
        if self.muted == 0 {
            self.diagnostics.push(Diagnostic::new(kind, location, message));
        }
        Ok(())
    }

    pub(crate) fn registry(&self) -> &Registry {
        self.session.registry()
    }

    /// Resolver for type hints and doc types in the current scope
    pub(crate) fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(&self.scope.names, self.scope.class.as_ref())
    }

    /// Type of an expression node
    pub(crate) fn expr(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        Ok(self.visit(node)?.ty)
    }

    /// Evaluate `target` in assignment mode, writing `value` into it
    pub(crate) fn assign_to(&mut self, target: &CstNode, value: TypeUnion) -> InferResult<TypeUnion> {
        self.scope.assigning = Some(value);
        let result = self.visit(target);
        self.scope.assigning = None;
        Ok(result?.ty)
    }

    /// Evaluate `node` tolerating unbound names (`isset`, `??`, `empty`)
    pub(crate) fn probe(&mut self, node: &CstNode) -> InferResult<TypeUnion> {
        let saved = std::mem::replace(&mut self.scope.probing, true);
        let result = self.expr(node);
        self.scope.probing = saved;
        result
    }

    /// Run `f` with non-fatal diagnostics dropped
    pub(crate) fn quietly<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> InferResult<T>,
    ) -> InferResult<T> {
        self.muted += 1;
        let result = f(self);
        self.muted -= 1;
        result
    }

    /// Whether unbound reads are currently tolerated
    pub(crate) fn tolerant(&self) -> bool {
        self.scope.probing || self.scope.including
    }

    /// The single rule for each node kind.
    pub fn visit(&mut self, node: &CstNode) -> InferResult<Inferred> {
        use NodeKind::*;

        // Only targets consume a pending assignment; anything else reads
        let assigning = if node.kind.is_assignable() {
            self.scope.take_assigning()
        } else {
            self.scope.assigning = None;
            None
        };

        let value = |ty: InferResult<TypeUnion>| ty.map(Inferred::value);
        let statement = |flow: InferResult<Flow>| flow.map(Inferred::statement);

        match node.kind {
            // ===== Statements =====
            SourceFile | Block => statement(self.block(node)),
            InlineHtml | EmptyStatement | LabelStatement => Ok(Inferred::statement(Flow::Normal)),
            EchoStatement => statement(self.echo_statement(node)),
            ExpressionStatement => statement(self.expression_statement(node)),
            IfStatement => statement(self.if_statement(node)),
            WhileStatement => statement(self.while_statement(node)),
            DoWhileStatement => statement(self.do_while_statement(node)),
            ForStatement => statement(self.for_statement(node)),
            ForeachStatement => statement(self.foreach_statement(node)),
            SwitchStatement => statement(self.switch_statement(node)),
            BreakStatement | ContinueStatement => statement(self.jump_statement(node)),
            ReturnStatement => statement(self.return_statement(node)),
            TryStatement => statement(self.try_statement(node)),
            GotoStatement => statement(self.goto_statement(node)),
            DeclareStatement => statement(self.declare_statement(node)),
            NamespaceDefinition => statement(self.namespace_definition(node)),
            UseDeclaration => statement(self.use_declaration(node)),
            GlobalDeclaration => statement(self.global_declaration(node)),
            StaticDeclaration => statement(self.static_declaration(node)),
            UnsetStatement => statement(self.unset_statement(node)),
            ConstDeclaration => statement(self.const_declaration(node)),

            // ===== Declarations =====
            FunctionDefinition => statement(self.function_definition(node)),
            ClassDeclaration | InterfaceDeclaration | TraitDeclaration => {
                statement(self.class_declaration(node))
            }

            // ===== Literals =====
            IntegerLiteral => value(Ok(expressions::integer_literal(node))),
            FloatLiteral => value(Ok(expressions::float_literal(node))),
            StringLiteral | StringFragment => {
                value(Ok(TypeUnion::of(Type::string_value(node.text()))))
            }
            BooleanLiteral => value(Ok(TypeUnion::of(Type::Bool(Some(
                node.text().eq_ignore_ascii_case("true"),
            ))))),
            NullLiteral => value(Ok(TypeUnion::of(Type::Null))),
            InterpolatedString => value(self.interpolated_string(node)),
            MagicConstant => value(Ok(self.magic_constant(node))),
            ArrayLiteral | ListExpression => value(self.array_literal(node, assigning)),

            // ===== Names =====
            Variable => value(self.variable(node, assigning)),
            VariableVariable => value(self.variable_variable(node, assigning)),
            Name => value(self.constant_fetch(node)),

            // ===== Operators =====
            Assignment => value(self.assignment(node)),
            ReferenceAssignment => value(self.reference_assignment(node)),
            CompoundAssignment => value(self.compound_assignment(node)),
            BinaryExpression => value(self.binary_expression(node)),
            UnaryExpression => value(self.unary_expression(node)),
            PrefixUpdateExpression | PostfixUpdateExpression => value(self.update_expression(node)),
            CastExpression => value(self.cast_expression(node)),
            ErrorSuppression => value(self.error_suppression(node)),
            TernaryExpression => value(self.ternary_expression(node)),

            // ===== Calls and access =====
            CallExpression => value(self.call_expression(node)),
            MethodCallExpression => value(self.method_call(node)),
            StaticCallExpression => value(self.static_call(node)),
            NewExpression => value(self.new_expression(node)),
            PropertyAccess => value(self.property_access(node, assigning)),
            StaticPropertyAccess => value(self.static_property_access(node, assigning)),
            ClassConstantAccess => value(self.class_constant_access(node)),
            SubscriptExpression => value(self.subscript(node, assigning)),
            CloneExpression => value(self.clone_expression(node)),
            AnonymousClass => value(self.anonymous_class(node)),

            // ===== Functions =====
            AnonymousFunction => value(self.closure(node)),
            ArrowFunction => value(self.arrow_function(node)),

            // ===== Language constructs =====
            IssetExpression => value(self.isset_expression(node)),
            EmptyExpression => value(self.empty_expression(node)),
            ExitExpression => self.exit_expression(node),
            ThrowExpression => self.throw_expression(node),
            PrintExpression => value(self.print_expression(node)),
            IncludeExpression => value(self.include_expression(node)),
            EvalExpression => value(self.eval_expression(node)),
            MatchExpression => value(self.match_expression(node)),
            YieldExpression => value(self.yield_expression(node)),
            ExpressionList => value(self.expression_list(node)),

            // ===== Parts checked by their parent's rule =====
            ElseifClause | ElseClause | CaseClause | DefaultClause | CatchClause | FinallyClause
            | ParameterList | Parameter | TypeHint | ClassBody | ClassConstDeclaration
            | ConstElement | PropertyDeclaration | PropertyElement | MethodDeclaration
            | TraitUse | TraitPrecedence | TraitAlias | Modifier | UseClause | StaticVariable
            | ArrayElement | NameList | Operator | ArgumentList | Argument | ClosureUseList
            | ClosureUse | MatchArm | DocComment | Flag => Ok(Inferred::value(TypeUnion::mixed())),

            // Trees with errors never reach the checker
            Error => Ok(Inferred::value(TypeUnion::mixed())),
        }
    }
}
