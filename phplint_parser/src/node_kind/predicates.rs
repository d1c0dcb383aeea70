//! NodeKind predicate methods

use super::NodeKind;

impl NodeKind {
    /// Check if this is a named node (vs flag leaves and doc comments)
    pub fn is_named(&self) -> bool {
        !matches!(self, NodeKind::Flag | NodeKind::DocComment)
    }

    /// Declarations hoisted before a file's statements are analyzed
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDefinition
                | NodeKind::ClassDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::TraitDeclaration
        )
    }

    /// Class-like declarations
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::TraitDeclaration
        )
    }

    /// Check if this is a loop statement
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            NodeKind::WhileStatement
                | NodeKind::DoWhileStatement
                | NodeKind::ForStatement
                | NodeKind::ForeachStatement
        )
    }

    /// Check if this is a literal node
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::IntegerLiteral
                | NodeKind::FloatLiteral
                | NodeKind::StringLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NullLiteral
                | NodeKind::InterpolatedString
                | NodeKind::MagicConstant
                | NodeKind::ArrayLiteral
        )
    }

    /// Nodes that may appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            NodeKind::Variable
                | NodeKind::VariableVariable
                | NodeKind::PropertyAccess
                | NodeKind::StaticPropertyAccess
                | NodeKind::SubscriptExpression
                | NodeKind::ListExpression
                | NodeKind::ArrayLiteral
        )
    }

    /// Calls of any flavor
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            NodeKind::CallExpression
                | NodeKind::MethodCallExpression
                | NodeKind::StaticCallExpression
                | NodeKind::NewExpression
        )
    }

    /// Statements that transfer control out of the enclosing block
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            NodeKind::ReturnStatement
                | NodeKind::BreakStatement
                | NodeKind::ContinueStatement
                | NodeKind::GotoStatement
        )
    }
}
