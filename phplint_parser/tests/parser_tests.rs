//! Structural tests for the PHP parser

use phplint_parser::{parse, parse_with_errors, CstNode, NodeKind};
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> CstNode {
    match parse(source) {
        Ok(cst) => cst,
        Err(e) => panic!("Failed to parse: {}\nError: {}", source, e),
    }
}

/// First statement of a `<?php` snippet
fn first_stmt(body: &str) -> CstNode {
    let cst = parse_ok(&format!("<?php {}", body));
    cst.children
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no statements in {}", body))
}

/// Expression of the first expression statement
fn first_expr(body: &str) -> CstNode {
    let stmt = first_stmt(body);
    assert_eq!(stmt.kind, NodeKind::ExpressionStatement, "{}", body);
    stmt.child_by_field("expression").cloned().unwrap()
}

fn kind_of(node: &CstNode, field: &str) -> Option<NodeKind> {
    node.child_by_field(field).map(|n| n.kind)
}

// =============================================================================
// Tree shape
// =============================================================================

#[test]
fn test_debug_ast_of_assignment() {
    let cst = parse_ok("<?php $x = 1 + 2;");
    assert_eq!(
        cst.debug_ast_string(),
        "SourceFile\n  ExpressionStatement\n    expression: Assignment\n      left: Variable = \"x\"\n      right: BinaryExpression\n        left: IntegerLiteral = \"1\"\n        operator: Operator = \"+\"\n        right: IntegerLiteral = \"2\"\n"
    );
}

#[test]
fn test_spans_report_lines() {
    let cst = parse_ok("<?php\n\n$a = 1;\nfoo();");
    assert_eq!(cst.children[0].span.start_line, 3);
    assert_eq!(cst.children[1].span.start_line, 4);
    assert_eq!(cst.children[1].span.start_column, 1);
}

#[test]
fn test_inline_html_between_tags() {
    let cst = parse_ok("<b><?php echo 1 ?></b>");
    let kinds: Vec<_> = cst.children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::InlineHtml, NodeKind::EchoStatement, NodeKind::InlineHtml]
    );
}

#[test]
fn test_short_echo_tag() {
    let cst = parse_ok("<?= $a, $b ?>");
    assert_eq!(cst.children[0].kind, NodeKind::EchoStatement);
    assert_eq!(cst.children[0].children.len(), 2);
}

// =============================================================================
// Operators and precedence
// =============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    let expr = first_expr("1 + 2 * 3;");
    assert_eq!(expr.kind, NodeKind::BinaryExpression);
    assert_eq!(expr.field_text("operator"), Some("+"));
    assert_eq!(kind_of(&expr, "right"), Some(NodeKind::BinaryExpression));
}

#[test]
fn test_not_applies_to_assignment() {
    let expr = first_expr("!$a = foo();");
    assert_eq!(expr.kind, NodeKind::UnaryExpression);
    assert_eq!(kind_of(&expr, "operand"), Some(NodeKind::Assignment));
}

#[test]
fn test_not_instanceof() {
    let expr = first_expr("!$a instanceof Foo;");
    assert_eq!(expr.kind, NodeKind::UnaryExpression);
    let operand = expr.child_by_field("operand").unwrap();
    assert_eq!(operand.field_text("operator"), Some("instanceof"));
    assert_eq!(operand.child_by_field("right").unwrap().kind, NodeKind::Name);
}

#[test]
fn test_keyword_and_is_below_assignment() {
    let expr = first_expr("$a = true and false;");
    assert_eq!(expr.kind, NodeKind::BinaryExpression);
    assert_eq!(expr.field_text("operator"), Some("and"));
    assert_eq!(kind_of(&expr, "left"), Some(NodeKind::Assignment));
}

#[test]
fn test_logical_operators_nest() {
    let expr = first_expr("$a || $b && $c;");
    assert_eq!(expr.field_text("operator"), Some("||"));
    assert_eq!(
        expr.child_by_field("right").unwrap().field_text("operator"),
        Some("&&")
    );
}

#[test]
fn test_coalesce_is_right_associative() {
    let expr = first_expr("$a ?? $b ?? $c;");
    assert_eq!(expr.field_text("operator"), Some("??"));
    assert_eq!(kind_of(&expr, "left"), Some(NodeKind::Variable));
    assert_eq!(kind_of(&expr, "right"), Some(NodeKind::BinaryExpression));
}

#[test]
fn test_ternary_and_short_ternary() {
    let full = first_expr("$a ? 1 : 2;");
    assert_eq!(full.kind, NodeKind::TernaryExpression);
    assert!(full.child_by_field("consequence").is_some());

    let short = first_expr("$a ?: 2;");
    assert_eq!(short.kind, NodeKind::TernaryExpression);
    assert!(short.child_by_field("consequence").is_none());
}

#[test]
fn test_compound_and_reference_assignment() {
    let compound = first_expr("$s .= 'x';");
    assert_eq!(compound.kind, NodeKind::CompoundAssignment);
    assert_eq!(compound.field_text("operator"), Some("."));

    let by_ref = first_expr("$a = &$b;");
    assert_eq!(by_ref.kind, NodeKind::ReferenceAssignment);
}

#[test]
fn test_casts() {
    let expr = first_expr("(int) $x;");
    assert_eq!(expr.kind, NodeKind::CastExpression);
    assert_eq!(expr.field_text("type"), Some("int"));

    let paren = first_expr("($x);");
    assert_eq!(paren.kind, NodeKind::Variable);
}

#[test]
fn test_increment_forms() {
    assert_eq!(first_expr("$i++;").kind, NodeKind::PostfixUpdateExpression);
    assert_eq!(first_expr("--$i;").kind, NodeKind::PrefixUpdateExpression);
}

// =============================================================================
// Calls and member access
// =============================================================================

#[test]
fn test_method_chain() {
    let expr = first_expr("$a->b()->c;");
    assert_eq!(expr.kind, NodeKind::PropertyAccess);
    let object = expr.child_by_field("object").unwrap();
    assert_eq!(object.kind, NodeKind::MethodCallExpression);
    assert_eq!(object.field_text("name"), Some("b"));
}

#[test]
fn test_nullsafe_access() {
    let expr = first_expr("$a?->b;");
    assert!(expr.has_flag("nullsafe"));
}

#[test]
fn test_static_members() {
    assert_eq!(first_expr("Foo::bar();").kind, NodeKind::StaticCallExpression);
    assert_eq!(first_expr("Foo::$bar;").kind, NodeKind::StaticPropertyAccess);
    assert_eq!(first_expr("Foo::BAR;").kind, NodeKind::ClassConstantAccess);
    let class_name = first_expr("Foo::class;");
    assert_eq!(class_name.field_text("name"), Some("class"));
    let scoped = first_expr("static::create();");
    assert_eq!(scoped.field_text("scope"), Some("static"));
}

#[test]
fn test_qualified_function_call() {
    let expr = first_expr("\\App\\helper(1, ...$rest);");
    assert_eq!(expr.kind, NodeKind::CallExpression);
    assert_eq!(expr.field_text("function"), Some("\\App\\helper"));
    let args = expr.child_by_field("arguments").unwrap();
    assert_eq!(args.children.len(), 2);
    assert!(args.children[1].has_flag("spread"));
}

#[test]
fn test_named_argument() {
    let expr = first_expr("foo(bar: 1);");
    let args = expr.child_by_field("arguments").unwrap();
    assert_eq!(args.children[0].field_text("name"), Some("bar"));
}

#[test]
fn test_new_expressions() {
    let expr = first_expr("new Foo(1);");
    assert_eq!(expr.kind, NodeKind::NewExpression);
    assert_eq!(expr.field_text("class"), Some("Foo"));

    let chained = first_expr("(new Foo)->bar();");
    assert_eq!(chained.kind, NodeKind::MethodCallExpression);

    let anon = first_expr("new class { public $x; };");
    assert_eq!(kind_of(&anon, "class"), Some(NodeKind::AnonymousClass));
}

#[test]
fn test_subscripts() {
    let expr = first_expr("$a['k'][] = 1;");
    assert_eq!(expr.kind, NodeKind::Assignment);
    let left = expr.child_by_field("left").unwrap();
    assert_eq!(left.kind, NodeKind::SubscriptExpression);
    assert!(left.child_by_field("index").is_none());
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn test_literal_names() {
    assert_eq!(first_expr("TRUE;").kind, NodeKind::BooleanLiteral);
    assert_eq!(first_expr("Null;").kind, NodeKind::NullLiteral);
    assert_eq!(first_expr("__DIR__;").kind, NodeKind::MagicConstant);
    assert_eq!(first_expr("PHP_EOL;").kind, NodeKind::Name);
}

#[test]
fn test_strings() {
    let single = first_expr("'a\\'b';");
    assert_eq!(single.kind, NodeKind::StringLiteral);
    assert_eq!(single.text(), "a'b");

    let plain = first_expr("\"line\\n\";");
    assert_eq!(plain.kind, NodeKind::StringLiteral);
    assert_eq!(plain.text(), "line\n");
}

#[test]
fn test_interpolation() {
    let expr = first_expr("\"Hi $name, {$user->id} and $arr[0]\";");
    assert_eq!(expr.kind, NodeKind::InterpolatedString);
    let kinds: Vec<_> = expr.children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::StringFragment,
            NodeKind::Variable,
            NodeKind::StringFragment,
            NodeKind::PropertyAccess,
            NodeKind::StringFragment,
            NodeKind::SubscriptExpression,
        ]
    );
}

#[test]
fn test_interpolated_expression_spans_are_absolute() {
    let cst = parse_ok("<?php\n\"{$a->b}\";");
    let stmt = &cst.children[0];
    let string = stmt.child_by_field("expression").unwrap();
    let access = &string.children[0];
    assert_eq!(access.kind, NodeKind::PropertyAccess);
    assert_eq!(access.span.start_line, 2);
    assert_eq!(access.span.start_column, 3);
}

#[test]
fn test_heredoc_and_nowdoc() {
    let heredoc = first_expr("<<<EOT\n    Hello $who\n    EOT;");
    assert_eq!(heredoc.kind, NodeKind::InterpolatedString);
    assert_eq!(heredoc.children[0].text(), "Hello ");

    let nowdoc = first_expr("<<<'EOT'\n  raw $x\n  EOT;");
    assert_eq!(nowdoc.kind, NodeKind::StringLiteral);
    assert_eq!(nowdoc.text(), "raw $x");
}

#[test]
fn test_array_literals() {
    let short = first_expr("['a' => 1, 2, ...$rest];");
    assert_eq!(short.kind, NodeKind::ArrayLiteral);
    assert_eq!(short.children.len(), 3);
    assert_eq!(kind_of(&short.children[0], "key"), Some(NodeKind::StringLiteral));
    assert!(short.children[2].has_flag("spread"));

    let long = first_expr("array(1, 2,);");
    assert_eq!(long.kind, NodeKind::ArrayLiteral);
    assert_eq!(long.children.len(), 2);
}

#[test]
fn test_list_destructuring() {
    let expr = first_expr("list($a, , $b) = $pair;");
    assert_eq!(expr.kind, NodeKind::Assignment);
    let list = expr.child_by_field("left").unwrap();
    assert_eq!(list.kind, NodeKind::ListExpression);
    assert_eq!(list.children.len(), 3);
    assert!(list.children[1].child_by_field("value").is_none());
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_if_elseif_else() {
    let stmt = first_stmt("if ($a) { x(); } elseif ($b) y(); else { z(); }");
    assert_eq!(stmt.kind, NodeKind::IfStatement);
    let alternatives: Vec<_> = stmt.children_by_field("alternative").map(|c| c.kind).collect();
    assert_eq!(alternatives, vec![NodeKind::ElseifClause, NodeKind::ElseClause]);
    assert_eq!(kind_of(&stmt, "body"), Some(NodeKind::Block));
}

#[test]
fn test_alternative_syntax() {
    let stmt = first_stmt("if ($a): x(); else: y(); endif; while (1): endwhile;");
    assert_eq!(stmt.kind, NodeKind::IfStatement);
    assert_eq!(stmt.children_by_field("alternative").count(), 1);

    let cst = parse_ok("<?php foreach ($xs as $k => $v): echo $v; endforeach;");
    let foreach = &cst.children[0];
    assert_eq!(foreach.kind, NodeKind::ForeachStatement);
    assert_eq!(kind_of(foreach, "key"), Some(NodeKind::Variable));
}

#[test]
fn test_for_statement_clauses() {
    let stmt = first_stmt("for ($i = 0, $j = 1; $i < 10; $i++) {}");
    assert_eq!(stmt.kind, NodeKind::ForStatement);
    assert_eq!(stmt.child_by_field("init").unwrap().children.len(), 2);
    assert_eq!(stmt.child_by_field("update").unwrap().children.len(), 1);
}

#[test]
fn test_foreach_by_reference() {
    let stmt = first_stmt("foreach ($xs as &$x) {}");
    assert!(stmt.has_flag("reference"));
}

#[test]
fn test_switch() {
    let stmt = first_stmt("switch ($a) { case 1: case 2: f(); break; default: g(); }");
    assert_eq!(stmt.kind, NodeKind::SwitchStatement);
    let clauses: Vec<_> = stmt.positional_children().map(|c| c.kind).collect();
    assert_eq!(
        clauses,
        vec![NodeKind::CaseClause, NodeKind::CaseClause, NodeKind::DefaultClause]
    );
}

#[test]
fn test_try_catch_finally() {
    let stmt = first_stmt("try { f(); } catch (A | B $e) { } catch (C) { } finally { }");
    assert_eq!(stmt.kind, NodeKind::TryStatement);
    let catches: Vec<_> = stmt.children_by_field("catch").collect();
    assert_eq!(catches.len(), 2);
    assert_eq!(catches[0].child_by_field("types").unwrap().children.len(), 2);
    assert!(catches[1].child_by_field("variable").is_none());
    assert!(stmt.child_by_field("finally").is_some());
}

#[test]
fn test_return_and_jumps() {
    let stmt = first_stmt("return;");
    assert_eq!(stmt.kind, NodeKind::ReturnStatement);
    assert!(stmt.child_by_field("value").is_none());

    assert_eq!(first_stmt("break 2;").kind, NodeKind::BreakStatement);
    assert_eq!(first_stmt("goto end;").kind, NodeKind::GotoStatement);
    assert_eq!(first_stmt("end:").kind, NodeKind::LabelStatement);
}

#[test]
fn test_global_static_unset() {
    assert_eq!(first_stmt("global $a, $b;").children.len(), 2);
    let stat = first_stmt("static $n = 0;");
    assert_eq!(stat.kind, NodeKind::StaticDeclaration);
    assert_eq!(first_stmt("unset($a['x']);").kind, NodeKind::UnsetStatement);
}

#[test]
fn test_include_forms() {
    let expr = first_expr("require_once __DIR__ . '/lib.php';");
    assert_eq!(expr.kind, NodeKind::IncludeExpression);
    assert_eq!(expr.field_text("kind"), Some("require_once"));
    assert_eq!(kind_of(&expr, "value"), Some(NodeKind::BinaryExpression));
}

#[test]
fn test_language_constructs() {
    assert_eq!(first_expr("isset($a, $b);").kind, NodeKind::IssetExpression);
    assert_eq!(first_expr("empty($a);").kind, NodeKind::EmptyExpression);
    assert_eq!(first_expr("exit(1);").kind, NodeKind::ExitExpression);
    assert_eq!(first_expr("print 'x';").kind, NodeKind::PrintExpression);
    let m = first_expr("match ($x) { 1, 2 => 'a', default => 'b' };");
    assert_eq!(m.kind, NodeKind::MatchExpression);
    assert_eq!(m.children_by_field("arm").count(), 2);
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_function_definition() {
    let stmt = first_stmt(
        "/** @param int $a */\nfunction add(int $a, ?int &$b = null, string ...$rest): int { return $a; }",
    );
    assert_eq!(stmt.kind, NodeKind::FunctionDefinition);
    assert_eq!(stmt.field_text("name"), Some("add"));
    assert_eq!(stmt.field_text("return_type"), Some("int"));
    assert!(stmt.doc().unwrap().contains("@param int $a"));

    let params: Vec<_> = stmt.child_by_field("parameters").unwrap().children.iter().collect();
    assert_eq!(params.len(), 3);
    assert_eq!(params[1].field_text("type"), Some("?int"));
    assert!(params[1].has_flag("reference"));
    assert_eq!(kind_of(params[1], "default"), Some(NodeKind::NullLiteral));
    assert!(params[2].has_flag("variadic"));
    assert_eq!(params[2].field_text("name"), Some("rest"));
}

#[test]
fn test_union_and_class_type_hints() {
    let stmt = first_stmt("function f(int|string $a, \\Foo\\Bar $b, A&B $c) {}");
    let params = stmt.child_by_field("parameters").unwrap();
    let types: Vec<_> = params.children.iter().map(|p| p.field_text("type")).collect();
    assert_eq!(types, vec![Some("int|string"), Some("\\Foo\\Bar"), Some("A&B")]);
}

#[test]
fn test_closures() {
    let closure = first_expr("$f = function ($x) use (&$total, $n): int { return 1; };");
    let right = closure.child_by_field("right").unwrap();
    assert_eq!(right.kind, NodeKind::AnonymousFunction);
    let uses = right.child_by_field("uses").unwrap();
    assert_eq!(uses.children.len(), 2);
    assert!(uses.children[0].has_flag("reference"));

    let arrow = first_expr("$g = static fn($x) => $x * 2;");
    let right = arrow.child_by_field("right").unwrap();
    assert_eq!(right.kind, NodeKind::ArrowFunction);
    assert!(right.has_flag("static"));
    assert_eq!(kind_of(right, "body"), Some(NodeKind::BinaryExpression));
}

#[test]
fn test_class_declaration() {
    let stmt = first_stmt(
        r#"/** A thing */
        abstract class Foo extends Base implements A, B {
            use T1, T2 { T1::hello insteadof T2; T2::hello as protected hi; }
            const X = 1, Y = 2;
            public static ?int $count = 0;
            private $a, $b;
            /** @return void */
            abstract protected function run(array $opts): void;
            public function __construct() { parent::__construct(); }
        }"#,
    );
    assert_eq!(stmt.kind, NodeKind::ClassDeclaration);
    assert_eq!(stmt.field_text("name"), Some("Foo"));
    assert_eq!(stmt.field_text("extends"), Some("Base"));
    assert_eq!(stmt.child_by_field("implements").unwrap().children.len(), 2);
    let modifiers: Vec<_> = stmt.children_by_field("modifier").map(|m| m.text()).collect();
    assert_eq!(modifiers, vec!["abstract"]);
    assert_eq!(stmt.doc(), Some("/** A thing */"));

    let body = stmt.child_by_field("body").unwrap();
    let kinds: Vec<_> = body.children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::TraitUse,
            NodeKind::ClassConstDeclaration,
            NodeKind::PropertyDeclaration,
            NodeKind::PropertyDeclaration,
            NodeKind::MethodDeclaration,
            NodeKind::MethodDeclaration,
        ]
    );

    let trait_use = &body.children[0];
    let adaptations: Vec<_> = trait_use.children_by_field("adaptation").map(|a| a.kind).collect();
    assert_eq!(adaptations, vec![NodeKind::TraitPrecedence, NodeKind::TraitAlias]);
    assert_eq!(
        trait_use.children_by_field("adaptation").nth(1).unwrap().field_text("alias"),
        Some("hi")
    );

    let count = &body.children[2];
    assert_eq!(count.field_text("type"), Some("?int"));
    let run = &body.children[4];
    assert!(run.child_by_field("body").is_none());
    assert!(run.doc().is_some());
}

#[test]
fn test_interface_and_trait() {
    let iface = first_stmt("interface I extends J, K { public function f(); }");
    assert_eq!(iface.kind, NodeKind::InterfaceDeclaration);
    assert_eq!(iface.child_by_field("extends").unwrap().children.len(), 2);

    let tr = first_stmt("trait T { public function g() {} }");
    assert_eq!(tr.kind, NodeKind::TraitDeclaration);
}

#[test]
fn test_namespace_and_use() {
    let cst = parse_ok(
        "<?php namespace App\\Models; use Foo\\Bar as Baz, Qux; use function A\\f; use Lib\\{X, Y as Z};",
    );
    assert_eq!(cst.children[0].kind, NodeKind::NamespaceDefinition);
    assert_eq!(cst.children[0].field_text("name"), Some("App\\Models"));

    let first = &cst.children[1];
    let clauses: Vec<_> = first.children_by_field("clause").collect();
    assert_eq!(clauses[0].field_text("alias"), Some("Baz"));
    assert_eq!(clauses[1].field_text("name"), Some("Qux"));

    assert_eq!(cst.children[2].field_text("kind"), Some("function"));

    let group: Vec<_> = cst.children[3]
        .children_by_field("clause")
        .map(|c| c.field_text("name").unwrap().to_string())
        .collect();
    assert_eq!(group, vec!["Lib\\X".to_string(), "Lib\\Y".to_string()]);
}

#[test]
fn test_const_and_declare() {
    assert_eq!(first_stmt("declare(strict_types=1);").kind, NodeKind::DeclareStatement);
    let c = first_stmt("const A = 1, B = 'x';");
    assert_eq!(c.kind, NodeKind::ConstDeclaration);
    assert_eq!(c.children_by_field("element").count(), 2);
}

#[test]
fn test_keyword_member_names() {
    let expr = first_expr("$q->list()->print;");
    assert_eq!(expr.field_text("name"), Some("print"));
}

// =============================================================================
// Error recovery
// =============================================================================

#[test]
fn test_recovers_after_bad_statement() {
    let (cst, errors) = parse_with_errors("<?php $a = ; $b = 2;");
    assert_eq!(errors.len(), 1);
    assert!(cst.has_error());
    let last = cst.children.last().unwrap();
    assert_eq!(last.kind, NodeKind::ExpressionStatement);
}

#[test]
fn test_recovers_inside_class_body() {
    let (cst, errors) = parse_with_errors("<?php class A { public function f( { } public function g() {} }");
    assert!(!errors.is_empty());
    assert_eq!(cst.children[0].kind, NodeKind::ClassDeclaration);
}

#[test]
fn test_unterminated_string_is_reported() {
    let (_, errors) = parse_with_errors("<?php $a = 'oops;");
    assert!(errors
        .iter()
        .any(|e| matches!(e, phplint_parser::ParseError::UnterminatedString { .. })));
}

#[test]
fn test_trailing_backslash_in_unterminated_string() {
    let (_, errors) = parse_with_errors("<?php '\\");
    assert!(errors
        .iter()
        .any(|e| matches!(e, phplint_parser::ParseError::UnterminatedString { .. })));
}

#[test]
fn test_deep_nesting_is_an_error() {
    let depth = phplint_parser::MAX_NESTING_DEPTH * 20;
    let source = format!("<?php $a = {}1{};", "(".repeat(depth), ")".repeat(depth));
    let (cst, errors) = parse_with_errors(&source);
    assert!(cst.has_error());
    assert!(errors
        .iter()
        .any(|e| matches!(e, phplint_parser::ParseError::NestingTooDeep { .. })));

    let shallow = format!("<?php $a = {}1{};", "(".repeat(32), ")".repeat(32));
    assert!(parse_with_errors(&shallow).1.is_empty());
}
