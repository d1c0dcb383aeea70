//! Lexical context threaded through inference.
//!
//! # Module structure
//!
//! - `env`: copy-on-write local variable bindings (`TypeEnv`)
//! - `names`: namespace and import alias resolution
//! - `conditional`: environment splitting for boolean narrowing

pub mod conditional;
pub mod env;
pub mod names;

pub use conditional::{narrow, Narrowing, SplitEnv};
pub use env::TypeEnv;
pub use names::{NameResolver, SymbolKind};

use crate::analyze::lattice::{Type, TypeUnion};

/// Name under which the receiver is bound inside instance methods
pub const THIS: &str = "this";

/// The class whose body is being checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassContext {
    pub name: String,
    pub parent: Option<String>,
    /// Set for traits: `$this` and `self` stay unresolved
    pub is_trait: bool,
}

/// Return bookkeeping for the function body being checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnContext {
    /// Display name used in diagnostics (`foo`, `Foo::bar`, `{closure}`)
    pub name: String,
    /// Native or documented return type
    pub declared: Option<TypeUnion>,
    /// Union of every `return` seen so far
    pub observed: TypeUnion,
    pub is_generator: bool,
}

impl ReturnContext {
    pub fn new(name: impl Into<String>, declared: Option<TypeUnion>) -> Self {
        Self {
            name: name.into(),
            declared,
            ..Self::default()
        }
    }
}

/// Environments collected by `break` and `continue` inside one loop or switch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpTargets {
    pub breaks: Vec<TypeEnv>,
    pub continues: Vec<TypeEnv>,
}

/// The mutable context for one file or function body.
///
/// Function and closure bodies get a fresh [`Scope`] with an empty local
/// tier; branches of a statement share the scope and swap its `env`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub env: TypeEnv,
    pub names: NameResolver,
    pub class: Option<ClassContext>,
    pub is_static: bool,
    pub function: Option<ReturnContext>,
    /// Type being written while the target of an assignment is inferred
    pub assigning: Option<TypeUnion>,
    /// Reads of unbound names are tolerated (`isset`, `??`, `empty`)
    pub probing: bool,
    /// Best-effort mode for files entered through `include`
    pub including: bool,
    pub jumps: Vec<JumpTargets>,
}

impl Scope {
    /// Root scope of a file
    pub fn file(including: bool) -> Self {
        Self {
            including,
            ..Self::default()
        }
    }

    /// Scope for a function or method body.
    ///
    /// Locals start empty; non-static methods bind `$this`.
    pub fn function_body(&self, returns: ReturnContext, is_static: bool) -> Scope {
        let mut env = TypeEnv::new();
        if let Some(class) = &self.class {
            if !is_static {
                let this = if class.is_trait {
                    Type::Mixed
                } else {
                    Type::instance(class.name.clone())
                };
                env.set(THIS, TypeUnion::of(this));
            }
        }
        Scope {
            env,
            names: self.names.clone(),
            class: self.class.clone(),
            is_static,
            function: Some(returns),
            assigning: None,
            probing: false,
            including: self.including,
            jumps: Vec::new(),
        }
    }

    /// Scope for a class body
    pub fn class_body(&self, class: ClassContext) -> Scope {
        Scope {
            env: TypeEnv::new(),
            names: self.names.clone(),
            class: Some(class),
            is_static: false,
            function: None,
            assigning: None,
            probing: false,
            including: self.including,
            jumps: Vec::new(),
        }
    }

    /// Scope for an arrow function: the parent's locals are captured by value
    pub fn arrow_body(&self, returns: ReturnContext, is_static: bool) -> Scope {
        let mut scope = self.function_body(returns, is_static);
        let captured = scope.env.get(THIS).cloned();
        scope.env = self.env.clone();
        if let Some(this) = captured {
            scope.env.set(THIS, this);
        } else {
            scope.env.remove(THIS);
        }
        scope
    }

    /// Name of the class whose private/protected members are visible here
    pub fn calling_class(&self) -> Option<&str> {
        self.class.as_ref().map(|c| c.name.as_str())
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeUnion> {
        self.env.get(name)
    }

    pub fn bind(&mut self, name: &str, ty: TypeUnion) {
        self.env.set(name, ty);
    }

    /// Clear assignment mode, returning the pending value
    pub fn take_assigning(&mut self) -> Option<TypeUnion> {
        self.assigning.take()
    }

    /// Record a `return` value
    pub fn observe_return(&mut self, ty: &TypeUnion) {
        if let Some(function) = &mut self.function {
            function.observed.add_types_from(ty);
        }
    }

    pub fn enter_loop(&mut self) {
        self.jumps.push(JumpTargets::default());
    }

    pub fn exit_loop(&mut self) -> JumpTargets {
        self.jumps.pop().unwrap_or_default()
    }

    /// Record the current env as leaving `depth` loops up (1 = innermost)
    pub fn record_jump(&mut self, depth: usize, is_continue: bool) {
        let env = self.env.clone();
        let len = self.jumps.len();
        if depth == 0 || depth > len {
            return;
        }
        let targets = &mut self.jumps[len - depth];
        if is_continue {
            targets.continues.push(env);
        } else {
            targets.breaks.push(env);
        }
    }
}
