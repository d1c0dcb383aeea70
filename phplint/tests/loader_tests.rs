//! Autoloading and include resolution through the filesystem loader.

mod common;

use std::path::PathBuf;

use common::{analyze_file, config_in, create_test_files, kinds};
use phplint::analyze::DiagnosticKind::*;
use phplint::loader::{FsLoader, Loader};
use pretty_assertions::assert_eq;

const USER_CLASS: &str = r#"<?php
namespace App\Model;

class User
{
    public function __construct(private string $name) {}

    public function name(): string
    {
        return $this->name;
    }
}
"#;

#[test]
fn test_psr4_resolution_prefers_longest_prefix() {
    let dir = create_test_files(&[
        ("src/Model/User.php", USER_CLASS),
        ("model/User.php", USER_CLASS),
    ]);
    let loader = FsLoader::new()
        .with_psr4("App\\", vec![dir.path().join("src")])
        .with_psr4("App\\Model\\", vec![dir.path().join("model")]);
    assert_eq!(
        loader.resolve_qualified_name_to_file("\\App\\Model\\User"),
        Some(dir.path().join("model/User.php"))
    );
    assert_eq!(loader.resolve_qualified_name_to_file("App\\Missing"), None);
    assert_eq!(loader.resolve_qualified_name_to_file("Other\\User"), None);
}

#[test]
fn test_classmap_wins_over_psr4() {
    let dir = create_test_files(&[("lib/legacy.php", "<?php class Legacy_Thing {}")]);
    let loader = FsLoader::new()
        .with_psr4("", vec![dir.path().join("src")])
        .with_class("Legacy_Thing", dir.path().join("lib/legacy.php"));
    assert_eq!(
        loader.resolve_qualified_name_to_file("legacy_thing"),
        Some(dir.path().join("lib/legacy.php"))
    );
}

#[test]
fn test_psr4_autoload_from_config() {
    let dir = create_test_files(&[
        ("src/Model/User.php", USER_CLASS),
        (
            "main.php",
            r#"<?php
use App\Model\User;

$user = new User('ada');
echo strlen($user->name());
$user->rename('bob');
"#,
        ),
    ]);
    let config = config_in(
        dir.path(),
        r#"
[autoload]
psr4 = { "App\\" = ["src/"] }
"#,
    );
    let report = analyze_file(config, &dir.path().join("main.php"));
    assert_eq!(kinds(&report), vec![NoSuchMember]);
    assert!(report.diagnostics[0].message.contains("rename"));
}

#[test]
fn test_unresolvable_class_is_a_load_failure() {
    let dir = create_test_files(&[("main.php", "<?php $x = new App\\Nowhere();")]);
    let config = config_in(dir.path(), "");
    let report = analyze_file(config, &dir.path().join("main.php"));
    assert_eq!(kinds(&report), vec![ClassLoadFailure]);
    assert!(report.success);
}

#[test]
fn test_classmap_autoload_from_config() {
    let dir = create_test_files(&[
        (
            "lib/legacy.php",
            "<?php class Legacy_Thing { public static function make(): int { return 1; } }",
        ),
        ("main.php", "<?php echo Legacy_Thing::make() + 1;"),
    ]);
    let config = config_in(
        dir.path(),
        r#"
[autoload]
classmap = { "Legacy_Thing" = "lib/legacy.php" }
"#,
    );
    let report = analyze_file(config, &dir.path().join("main.php"));
    assert_eq!(kinds(&report), vec![]);
}

#[test]
fn test_require_searches_include_path() {
    let dir = create_test_files(&[
        ("lib/helpers.php", "<?php function helper(int $n): int { return $n * 2; }"),
        ("app/main.php", "<?php require_once 'helpers.php'; echo helper(21);"),
    ]);
    let config = config_in(
        dir.path(),
        r#"
[autoload]
include_path = ["lib"]
"#,
    );
    let report = analyze_file(config, &dir.path().join("app/main.php"));
    assert_eq!(kinds(&report), vec![]);
}

#[test]
fn test_relative_include_resolves_against_current_file() {
    let dir = create_test_files(&[
        ("app/config.php", "<?php return ['debug' => true];"),
        (
            "app/main.php",
            "<?php $config = require './config.php'; echo count($config);",
        ),
    ]);
    let loader = FsLoader::new();
    assert_eq!(
        loader.resolve_include("./config.php", &dir.path().join("app")),
        Some(dir.path().join("app/config.php"))
    );
    let report = analyze_file(config_in(dir.path(), ""), &dir.path().join("app/main.php"));
    assert_eq!(kinds(&report), vec![]);
}

#[test]
fn test_missing_require_is_reported() {
    let dir = create_test_files(&[("main.php", "<?php require 'nope.php';")]);
    let report = analyze_file(config_in(dir.path(), ""), &dir.path().join("main.php"));
    assert_eq!(kinds(&report), vec![IncludeFailure]);
    assert!(!report.success);
}

#[test]
fn test_unreadable_entry_file_is_an_error() {
    let dir = create_test_files(&[]);
    let loader = FsLoader::new();
    let missing: PathBuf = dir.path().join("missing.php");
    assert!(loader.read_source(&missing).is_err());
}
