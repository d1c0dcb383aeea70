use super::*;
use crate::analyze::diagnostics::{DiagnosticKind, Report};
use crate::config::LintConfig;
use crate::loader::MemoryLoader;
use pretty_assertions::assert_eq;

use DiagnosticKind::*;

fn session() -> AnalysisSession {
    AnalysisSession::new(LintConfig::default(), Box::new(MemoryLoader::new()))
}

fn analyze(source: &str) -> Report {
    session().analyze_source("/test.php", source)
}

fn kinds(source: &str) -> Vec<DiagnosticKind> {
    analyze(source).kinds()
}

// ==================== End-to-end ====================

#[test]
fn test_string_assigned_then_echoed() {
    assert_eq!(kinds("<?php $foo = '1234'; echo $foo;"), vec![]);
}

#[test]
fn test_undefined_variable_reported_once() {
    let report = analyze("<?php echo $foo;");
    assert_eq!(report.kinds(), vec![UndefinedName]);
    assert!(!report.success);
}

#[test]
fn test_private_property_hidden_from_subclass() {
    let source = |visibility: &str| {
        format!(
            "<?php
            class Foo {{ {} $x = 1; }}
            class Bar extends Foo {{
                public function get() {{ return $this->x; }}
            }}",
            visibility
        )
    };
    assert_eq!(kinds(&source("private")), vec![ScopeViolation]);
    assert_eq!(kinds(&source("protected")), vec![]);
}

#[test]
fn test_null_returned_from_string_function() {
    assert_eq!(
        kinds("<?php function name(): string { return null; }"),
        vec![ReturnTypeMismatch]
    );
    assert_eq!(kinds("<?php function name(): ?string { return null; }"), vec![]);
}

// ==================== Narrowing ====================

#[test]
fn test_truthiness_removes_null() {
    assert_eq!(
        kinds("<?php function f(?string $s): string { return $s; }"),
        vec![ReturnTypeMismatch]
    );
    assert_eq!(
        kinds("<?php function f(?string $s): string { if ($s) { return $s; } return ''; }"),
        vec![]
    );
    assert_eq!(
        kinds("<?php function f(?string $s): string { if ($s !== null) { return $s; } return ''; }"),
        vec![]
    );
}

#[test]
fn test_instanceof_narrows_mixed() {
    let source = "<?php
        class Dog { public function bark() {} }
        function speak($animal) {
            if ($animal instanceof Dog) {
                $animal->bark();
                $animal->meow();
            }
        }";
    assert_eq!(kinds(source), vec![NoSuchMember]);
}

#[test]
fn test_false_branch_is_not_checked() {
    assert_eq!(kinds("<?php if (false) { echo $undefined; }"), vec![]);
}

#[test]
fn test_code_after_return_is_skipped() {
    assert_eq!(kinds("<?php function f() { return 1; echo $undefined; }"), vec![]);
}

// ==================== Scopes ====================

#[test]
fn test_function_does_not_see_caller_locals() {
    assert_eq!(
        kinds("<?php $outer = 1; function f() { return $outer; }"),
        vec![UndefinedName]
    );
}

#[test]
fn test_function_locals_do_not_leak() {
    assert_eq!(
        kinds("<?php function f() { $inner = 1; return $inner; } f(); echo $inner;"),
        vec![UndefinedName]
    );
}

#[test]
fn test_closure_captures() {
    assert_eq!(
        kinds("<?php $a = 1; $f = function () use ($a) { return $a; }; echo $f();"),
        vec![]
    );
    assert_eq!(
        kinds("<?php $a = 1; $f = function () { return $a; };"),
        vec![UndefinedName]
    );
    assert_eq!(
        kinds("<?php $n = 0; $inc = function () use (&$n) { $n++; }; $inc(); echo $n;"),
        vec![]
    );
}

#[test]
fn test_arrow_function_sees_enclosing_locals() {
    assert_eq!(kinds("<?php $a = 2; $f = fn($x) => $x * $a; echo $f(3);"), vec![]);
}

#[test]
fn test_loop_diagnostics_are_not_repeated() {
    let report = analyze("<?php for ($i = 0; $i < 3; $i++) { echo $undefined; }");
    assert_eq!(report.count(UndefinedName), 1);
}

#[test]
fn test_undefined_variable_in_every_loop_kind() {
    for source in [
        "<?php foreach ([1, 2] as $v) { echo $nope; }",
        "<?php while (rand()) { echo $nope; }",
        "<?php do { echo $nope; } while (rand());",
        "<?php for ($i = 0; $i < 3; $i++) { echo $nope; echo $nope; }",
        "<?php function f() { while (rand()) { if (rand()) { echo $nope; } } }",
    ] {
        assert_eq!(kinds(source), vec![UndefinedName], "{}", source);
    }
}

// ==================== Calls ====================

#[test]
fn test_missing_required_argument() {
    assert_eq!(
        kinds("<?php function two($a, $b) {} two(1);"),
        vec![ArgumentArityMismatch]
    );
}

#[test]
fn test_optional_and_variadic_arguments() {
    assert_eq!(
        kinds("<?php function opt($a, $b = 2, ...$rest) {} opt(1); opt(1, 2, 3, 4);"),
        vec![]
    );
}

#[test]
fn test_too_many_arguments_under_strict_arity() {
    assert_eq!(
        kinds("<?php function one($a) {} one(1, 2);"),
        vec![ArgumentArityMismatch]
    );

    let mut config = LintConfig::default();
    config.analyzer.strict_arity = false;
    let mut session = AnalysisSession::new(config, Box::new(MemoryLoader::new()));
    let report = session.analyze_source("/test.php", "<?php function one($a) {} one(1, 2);");
    assert_eq!(report.kinds(), vec![]);
}

#[test]
fn test_named_arguments() {
    let declaration = "function greet(string $name, string $greeting = 'Hi') {}";
    assert_eq!(
        kinds(&format!("<?php {} greet(greeting: 'Yo', name: 'Ann');", declaration)),
        vec![]
    );
    assert!(kinds(&format!("<?php {} greet(nmae: 'Ann');", declaration))
        .contains(&ArgumentArityMismatch));
}

#[test]
fn test_argument_types() {
    assert_eq!(kinds("<?php echo strlen([1]);"), vec![ArgumentTypeMismatch]);
    assert_eq!(kinds("<?php echo strlen(42);"), vec![]);
    assert_eq!(
        kinds("<?php function takes(int $x) {} takes('abc');"),
        vec![ArgumentTypeMismatch]
    );
    assert_eq!(kinds("<?php function takes(int $x) {} takes('12');"), vec![]);
}

#[test]
fn test_string_callbacks_name_functions() {
    assert_eq!(kinds("<?php $xs = array_map('strtoupper', ['a']);"), vec![]);
    assert_eq!(
        kinds("<?php function twice($x) { return $x * 2; } $xs = array_map('twice', [1]);"),
        vec![]
    );
    assert_eq!(
        kinds("<?php $xs = array_filter([1, 2], 'no_such_filter');"),
        vec![UndefinedName]
    );
    assert_eq!(kinds("<?php $xs = array_map(fn ($x) => $x, [1]);"), vec![]);
    assert_eq!(kinds("<?php usort($list, 'Sorter::compare');"), vec![]);
}

#[test]
fn test_by_reference_argument_binds_variable() {
    assert_eq!(
        kinds("<?php preg_match('/a/', 'abc', $m); echo count($m);"),
        vec![]
    );
}

#[test]
fn test_undefined_function() {
    assert_eq!(kinds("<?php nope(1);"), vec![UndefinedName]);
}

#[test]
fn test_functions_are_hoisted() {
    assert_eq!(
        kinds("<?php echo twice(2); function twice(int $n): int { return $n * 2; }"),
        vec![]
    );
}

#[test]
fn test_inferred_return_type_is_registered() {
    let mut session = session();
    session.analyze_source(
        "/test.php",
        "<?php function answer() { return 42; } function maybe($x) { if ($x) { return 'a'; } }",
    );
    let answer = session.registry().function("answer").unwrap();
    assert_eq!(answer.return_type, TypeUnion::of(Type::Int(Some(42))));
    let maybe = session.registry().function("maybe").unwrap();
    assert!(maybe.return_type.may_be_null());
}

#[test]
fn test_void_call_assigned() {
    assert_eq!(
        kinds("<?php function nothing(): void {} $x = nothing();"),
        vec![AssignmentWithoutValue]
    );
}

// ==================== Classes ====================

#[test]
fn test_undefined_method() {
    assert_eq!(
        kinds("<?php class A {} $a = new A(); $a->missing();"),
        vec![NoSuchMember]
    );
}

#[test]
fn test_private_method_called_from_outside() {
    assert_eq!(
        kinds("<?php class A { private function secret() {} } $a = new A(); $a->secret();"),
        vec![ScopeViolation]
    );
}

#[test]
fn test_method_called_with_wrong_case() {
    assert_eq!(
        kinds("<?php class A { public function doIt() {} } $a = new A(); $a->DOIT();"),
        vec![NamingConventionViolation]
    );
}

#[test]
fn test_static_factory_return_type() {
    let source = "<?php
        class M { public static function make(): M { return new M(); } }
        $m = M::make();
        $m->nope();";
    assert_eq!(kinds(source), vec![NoSuchMember]);
}

#[test]
fn test_unknown_class_reported_once() {
    assert_eq!(
        kinds("<?php $a = new Missing(); $b = new Missing();"),
        vec![ClassLoadFailure]
    );
}

#[test]
fn test_classes_are_hoisted() {
    assert_eq!(kinds("<?php $p = new Point(); class Point {}"), vec![]);
}

#[test]
fn test_typed_property_assignment() {
    assert_eq!(
        kinds("<?php class T { public int $n = 0; } $t = new T(); $t->n = 'abc';"),
        vec![AssignmentTypeMismatch]
    );
}

#[test]
fn test_static_members_and_constants() {
    let source = "<?php
        class K {
            const LIMIT = 1;
            public static int $count = 0;
        }
        K::$count = 5;
        echo K::$count + K::LIMIT;
        echo K::OTHER;";
    assert_eq!(kinds(source), vec![NoSuchMember]);
}

#[test]
fn test_anonymous_class_methods() {
    assert_eq!(
        kinds("<?php $o = new class { public function hi() { return 1; } }; echo $o->hi();"),
        vec![]
    );
}

#[test]
fn test_caught_exception_type() {
    let source = "<?php
        try {
            throw new RuntimeException('x');
        } catch (Exception $e) {
            echo $e->getMessage();
        }";
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn test_promoted_constructor_parameters() {
    let source = "<?php
        class User {
            public function __construct(private string $name) {}
            public function name(): string { return $this->name; }
        }
        $u = new User('ann');
        echo $u->name();";
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn test_constructor_arity() {
    let source = "<?php
        class P { public function __construct(int $x, int $y) {} }
        $p = new P(1);";
    assert_eq!(kinds(source), vec![ArgumentArityMismatch]);
}

// ==================== Traits ====================

#[test]
fn test_trait_methods_are_imported() {
    let source = "<?php
        trait Hello { public function hello() { return 'hi'; } }
        class Greeter { use Hello; }
        $g = new Greeter();
        echo $g->hello();";
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn test_trait_collision() {
    let traits = "trait A { public function run() {} } trait B { public function run() {} }";
    assert_eq!(
        kinds(&format!("<?php {} class C {{ use A, B; }}", traits)),
        vec![TraitCollision]
    );
    assert_eq!(
        kinds(&format!(
            "<?php {} class C {{ use A, B {{ A::run insteadof B; }} }}",
            traits
        )),
        vec![]
    );
}

// ==================== Declarations ====================

#[test]
fn test_constants() {
    assert_eq!(kinds("<?php const LIMIT = 10; echo LIMIT;"), vec![]);
    assert_eq!(kinds("<?php define('GREETING', 'hi'); echo GREETING;"), vec![]);
    assert_eq!(kinds("<?php echo UNKNOWN_CONSTANT;"), vec![UndefinedName]);
    assert_eq!(kinds("<?php const lower = 1;"), vec![NamingConventionViolation]);
}

#[test]
fn test_naming_conventions() {
    assert_eq!(kinds("<?php class lowercase {}"), vec![NamingConventionViolation]);
    assert_eq!(
        kinds("<?php class Thing { public function Run() {} }"),
        vec![NamingConventionViolation]
    );

    let mut config = LintConfig::default();
    config.analyzer.naming_conventions = false;
    let mut session = AnalysisSession::new(config, Box::new(MemoryLoader::new()));
    assert_eq!(session.analyze_source("/test.php", "<?php class lowercase {}").kinds(), vec![]);
}

#[test]
fn test_documentation_mismatch() {
    assert_eq!(
        kinds("<?php /** @param int $x */ function f(string $x) {}"),
        vec![DocumentationMismatch]
    );
    assert_eq!(
        kinds("<?php /** @param non-empty-string $x */ function f(string $x) {}"),
        vec![]
    );
}

#[test]
fn test_generator_function() {
    assert_eq!(
        kinds("<?php function gen() { yield 1; } foreach (gen() as $v) { echo $v; }"),
        vec![]
    );
}

#[test]
fn test_goto_aborts_file() {
    let report = analyze("<?php goto end; echo $x; end:");
    assert_eq!(report.kinds(), vec![UnsupportedConstruct]);
    assert!(!report.success);
}

// ==================== Loading ====================

#[test]
fn test_require_defines_functions() {
    let loader = MemoryLoader::new()
        .with_file("/p/lib.php", "<?php function helper() { return 1; }")
        .with_file("/p/main.php", "<?php require 'lib.php'; echo helper();");
    let mut session = AnalysisSession::new(LintConfig::default(), Box::new(loader));
    let report = session.analyze_file(Path::new("/p/main.php")).unwrap();
    assert_eq!(report.kinds(), vec![]);
}

#[test]
fn test_missing_include_target() {
    assert_eq!(kinds("<?php include 'missing.php';"), vec![IncludeFailure]);
}

#[test]
fn test_autoloaded_class() {
    let loader = MemoryLoader::new().with_class_file(
        "App\\Model\\User",
        "/src/User.php",
        "<?php namespace App\\Model; class User { public function name(): string { return 'u'; } }",
    );
    let mut session = AnalysisSession::new(LintConfig::default(), Box::new(loader));
    let report = session.analyze_source(
        "/main.php",
        "<?php use App\\Model\\User; $u = new User(); echo $u->name(); $u->missing();",
    );
    assert_eq!(report.kinds(), vec![NoSuchMember]);
}
