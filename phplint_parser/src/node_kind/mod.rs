//! Node kinds for the PHP CST
//!
//! Each kind documents the fields the parser attaches to it. Fields marked
//! `*` may repeat; fields marked `?` are optional. Flag fields (`reference`,
//! `variadic`, `spread`, `static`, `nullsafe`, `default`) are empty leaves
//! whose presence is the value.

mod convert;
mod predicates;

#[cfg(test)]
mod tests;

use serde::Serialize;

macro_rules! node_kinds {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, )*) => {
        /// CST node kinds
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $( $(#[$meta])* $variant, )*
        }

        impl NodeKind {
            /// Every node kind, in declaration order
            pub fn all_variants() -> &'static [NodeKind] {
                &[$( NodeKind::$variant, )*]
            }

            /// snake_case name used in JSON dumps
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( NodeKind::$variant => $name, )*
                }
            }
        }
    };
}

node_kinds! {
    // ==================== Top Level ====================
    /// Root node; children are statements
    SourceFile => "source_file",
    /// Text outside `<?php ... ?>` (leaf)
    InlineHtml => "inline_html",
    /// `{ ... }` or the body of an alternative-syntax block
    Block => "block",
    /// `;`
    EmptyStatement => "empty_statement",
    /// `echo a, b;` / `<?= a ?>`; children are expressions
    EchoStatement => "echo_statement",
    /// expression, doc?
    ExpressionStatement => "expression_statement",

    // ==================== Control Flow ====================
    /// condition, body, alternative* (ElseifClause | ElseClause)
    IfStatement => "if_statement",
    /// condition, body
    ElseifClause => "elseif_clause",
    /// body
    ElseClause => "else_clause",
    /// condition, body
    WhileStatement => "while_statement",
    /// body, condition
    DoWhileStatement => "do_while_statement",
    /// init (ExpressionList), condition (ExpressionList), update (ExpressionList), body
    ForStatement => "for_statement",
    /// subject, key?, value, reference?, body
    ForeachStatement => "foreach_statement",
    /// subject; children are CaseClause / DefaultClause
    SwitchStatement => "switch_statement",
    /// value; remaining children are statements
    CaseClause => "case_clause",
    /// children are statements
    DefaultClause => "default_clause",
    /// depth?
    BreakStatement => "break_statement",
    /// depth?
    ContinueStatement => "continue_statement",
    /// value?
    ReturnStatement => "return_statement",
    /// body, catch* (CatchClause), finally? (FinallyClause)
    TryStatement => "try_statement",
    /// types (NameList), variable?, body
    CatchClause => "catch_clause",
    /// body
    FinallyClause => "finally_clause",
    /// label (Name)
    GotoStatement => "goto_statement",
    /// label (Name)
    LabelStatement => "label_statement",
    /// directive* (ConstElement), body?
    DeclareStatement => "declare_statement",

    // ==================== Declarations ====================
    /// name, parameters, return_type?, body, doc?, reference?
    FunctionDefinition => "function_definition",
    /// children are Parameter
    ParameterList => "parameter_list",
    /// name (Variable), type?, default?, reference?, variadic?, visibility* (Modifier)
    Parameter => "parameter",
    /// Raw type hint text (leaf): `?int`, `int|string`, `\Foo\Bar`
    TypeHint => "type_hint",
    /// name, extends?, implements? (NameList), modifier*, body (ClassBody), doc?
    ClassDeclaration => "class_declaration",
    /// name, extends? (NameList), body, doc?
    InterfaceDeclaration => "interface_declaration",
    /// name, body, doc?
    TraitDeclaration => "trait_declaration",
    /// children are member declarations
    ClassBody => "class_body",
    /// modifier*, element* (ConstElement), doc?
    ClassConstDeclaration => "class_const_declaration",
    /// name (Name), value
    ConstElement => "const_element",
    /// modifier*, type?, element* (PropertyElement), doc?
    PropertyDeclaration => "property_declaration",
    /// name (Variable), default?
    PropertyElement => "property_element",
    /// modifier*, name, parameters, return_type?, body?, doc?, reference?
    MethodDeclaration => "method_declaration",
    /// traits (NameList), adaptation* (TraitPrecedence | TraitAlias)
    TraitUse => "trait_use",
    /// trait (Name), method (Name), insteadof (NameList)
    TraitPrecedence => "trait_precedence",
    /// trait?, method, modifier?, alias?
    TraitAlias => "trait_alias",
    /// `public`, `static`, `abstract`, ... (leaf)
    Modifier => "modifier",
    /// name?, body?
    NamespaceDefinition => "namespace_definition",
    /// kind? (`function` / `const`), clause* (UseClause)
    UseDeclaration => "use_declaration",
    /// name, alias?
    UseClause => "use_clause",
    /// children are Variable
    GlobalDeclaration => "global_declaration",
    /// children are StaticVariable
    StaticDeclaration => "static_declaration",
    /// name (Variable), default?
    StaticVariable => "static_variable",
    /// children are expressions
    UnsetStatement => "unset_statement",
    /// element* (ConstElement), doc?
    ConstDeclaration => "const_declaration",

    // ==================== Literals ====================
    /// Raw integer text (leaf)
    IntegerLiteral => "integer_literal",
    /// Raw float text (leaf)
    FloatLiteral => "float_literal",
    /// Decoded string contents (leaf)
    StringLiteral => "string_literal",
    /// `true` / `false` (leaf, lowercased)
    BooleanLiteral => "boolean_literal",
    /// `null`
    NullLiteral => "null_literal",
    /// Double-quoted or heredoc string; children are StringFragment and expressions
    InterpolatedString => "interpolated_string",
    /// Literal part of an interpolated string (leaf)
    StringFragment => "string_fragment",
    /// `__DIR__`, `__FILE__`, ... (leaf, uppercased)
    MagicConstant => "magic_constant",
    /// children are ArrayElement
    ArrayLiteral => "array_literal",
    /// key?, value?, reference?, spread?
    ArrayElement => "array_element",
    /// `list(...)`; children are ArrayElement
    ListExpression => "list_expression",

    // ==================== Names ====================
    /// `$name` (leaf, text excludes the `$`)
    Variable => "variable",
    /// `$$x` / `${expr}`: name
    VariableVariable => "variable_variable",
    /// Identifier or qualified name, raw text including any leading `\` (leaf)
    Name => "name",
    /// children are Name
    NameList => "name_list",

    // ==================== Operators ====================
    /// left, right
    Assignment => "assignment",
    /// left, right
    ReferenceAssignment => "reference_assignment",
    /// left, operator, right
    CompoundAssignment => "compound_assignment",
    /// left, operator, right
    BinaryExpression => "binary_expression",
    /// operator, operand
    UnaryExpression => "unary_expression",
    /// operator, operand
    PrefixUpdateExpression => "prefix_update_expression",
    /// operand, operator
    PostfixUpdateExpression => "postfix_update_expression",
    /// type (leaf text, e.g. `int`), operand
    CastExpression => "cast_expression",
    /// operand
    ErrorSuppression => "error_suppression",
    /// condition, consequence?, alternative
    TernaryExpression => "ternary_expression",
    /// Operator text (leaf)
    Operator => "operator",

    // ==================== Calls and Access ====================
    /// function, arguments
    CallExpression => "call_expression",
    /// children are Argument
    ArgumentList => "argument_list",
    /// value, spread?, name?
    Argument => "argument",
    /// object, name, arguments, nullsafe?
    MethodCallExpression => "method_call_expression",
    /// object, name, nullsafe?
    PropertyAccess => "property_access",
    /// scope, name, arguments
    StaticCallExpression => "static_call_expression",
    /// scope, name (Variable)
    StaticPropertyAccess => "static_property_access",
    /// scope, name (Name); `Foo::class` included
    ClassConstantAccess => "class_constant_access",
    /// object, index?
    SubscriptExpression => "subscript_expression",
    /// class (Name | expression | AnonymousClass), arguments?
    NewExpression => "new_expression",
    /// arguments?, extends?, implements?, body
    AnonymousClass => "anonymous_class",
    /// value
    CloneExpression => "clone_expression",

    // ==================== Functions ====================
    /// parameters, uses? (ClosureUseList), return_type?, body, static?, reference?
    AnonymousFunction => "anonymous_function",
    /// children are ClosureUse
    ClosureUseList => "closure_use_list",
    /// name (Variable), reference?
    ClosureUse => "closure_use",
    /// parameters, return_type?, body (expression), static?
    ArrowFunction => "arrow_function",

    // ==================== Language Constructs ====================
    /// children are expressions
    IssetExpression => "isset_expression",
    /// value
    EmptyExpression => "empty_expression",
    /// value?
    ExitExpression => "exit_expression",
    /// value
    PrintExpression => "print_expression",
    /// kind (leaf: include / include_once / require / require_once), value
    IncludeExpression => "include_expression",
    /// value
    EvalExpression => "eval_expression",
    /// value
    ThrowExpression => "throw_expression",
    /// subject, arm* (MatchArm)
    MatchExpression => "match_expression",
    /// condition*, body, default?
    MatchArm => "match_arm",
    /// key?, value?, from?
    YieldExpression => "yield_expression",

    // ==================== Misc ====================
    /// children are expressions
    ExpressionList => "expression_list",
    /// `/** ... */` text (leaf)
    DocComment => "doc_comment",
    /// Empty leaf used for flag fields
    Flag => "flag",
    /// Parse error placeholder
    Error => "error",
}

impl Serialize for NodeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
