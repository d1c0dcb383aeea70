use super::*;
use crate::analyze::lattice::{Argument, Type};

fn property(name: &str, ty: Type, visibility: Visibility, class: &str) -> Member {
    Member::new(name, TypeUnion::of(ty), visibility, class)
}

fn method(name: &str, ret: Type) -> FunctionType {
    FunctionType::new(name, vec![], TypeUnion::of(ret))
}

/// Foo { private $x; protected $y; public $z }, Bar extends Foo, Other
fn hierarchy() -> Registry {
    let mut registry = Registry::new();
    let mut foo = ClassEntry::new("Foo", ClassKind::Class);
    foo.add_member(
        MemberKind::InstanceProperty,
        property("x", Type::int(), Visibility::Private, "Foo"),
    );
    foo.add_member(
        MemberKind::InstanceProperty,
        property("y", Type::string(), Visibility::Protected, "Foo"),
    );
    foo.add_member(
        MemberKind::InstanceProperty,
        property("z", Type::float(), Visibility::Public, "Foo"),
    );
    foo.add_method(method("getName", Type::string()), Visibility::Public, false);
    registry.add_class(foo);
    registry.add_class(ClassEntry::new("Bar", ClassKind::Class).with_parent("Foo"));
    registry.add_class(ClassEntry::new("Other", ClassKind::Class));
    registry
}

#[test]
fn test_first_declaration_wins() {
    let mut registry = Registry::new();
    let mut first = ClassEntry::new("App\\Foo", ClassKind::Class);
    first.add_method(method("a", Type::int()), Visibility::Public, false);
    assert!(registry.add_class(first));
    assert!(!registry.add_class(ClassEntry::new("\\app\\foo", ClassKind::Interface)));
    let entry = registry.class("APP\\FOO").unwrap();
    assert_eq!(entry.kind, ClassKind::Class);
    assert!(entry.own_method("a").is_some());
}

#[test]
fn test_placeholder_is_replaced_by_declaration() {
    let mut registry = Registry::new();
    registry.add_unknown_class("Later");
    assert!(registry.class("Later").unwrap().placeholder);
    assert!(registry.add_class(ClassEntry::new("Later", ClassKind::Class)));
    assert!(!registry.class("Later").unwrap().placeholder);
    // A placeholder never overwrites a declaration
    registry.add_unknown_class("Later");
    assert!(!registry.class("Later").unwrap().placeholder);
}

#[test]
fn test_placeholder_members_are_mixed() {
    let mut registry = Registry::new();
    registry.add_unknown_class("Vendor\\Thing");
    match registry.find_member("Vendor\\Thing", MemberKind::InstanceMethod, "anything", None) {
        Lookup::Found(resolved) => assert!(resolved.ty.is_mixed()),
        other => panic!("expected mixed, got {:?}", other),
    }
}

#[test]
fn test_private_visible_only_from_declaring_class() {
    let registry = hierarchy();
    assert!(matches!(
        registry.find_member("Foo", MemberKind::InstanceProperty, "x", Some("Foo")),
        Lookup::Found(_)
    ));
    assert!(matches!(
        registry.find_member("Foo", MemberKind::InstanceProperty, "x", Some("Other")),
        Lookup::Inaccessible(_)
    ));
    assert!(matches!(
        registry.find_member("Bar", MemberKind::InstanceProperty, "x", Some("Bar")),
        Lookup::Inaccessible(_)
    ));
    assert!(matches!(
        registry.find_member("Foo", MemberKind::InstanceProperty, "x", None),
        Lookup::Inaccessible(_)
    ));
}

#[test]
fn test_protected_visible_from_subclass() {
    let registry = hierarchy();
    match registry.find_member("Bar", MemberKind::InstanceProperty, "y", Some("Bar")) {
        Lookup::Found(resolved) => {
            assert_eq!(resolved.declaring_class, "Foo");
            assert_eq!(resolved.ty, TypeUnion::of(Type::string()));
        }
        other => panic!("expected protected member, got {:?}", other),
    }
    assert!(matches!(
        registry.find_member("Bar", MemberKind::InstanceProperty, "y", Some("Other")),
        Lookup::Inaccessible(_)
    ));
    assert!(matches!(
        registry.find_member("Bar", MemberKind::InstanceProperty, "z", None),
        Lookup::Found(_)
    ));
}

#[test]
fn test_missing_member() {
    let registry = hierarchy();
    assert_eq!(
        registry.find_member("Bar", MemberKind::InstanceProperty, "nope", Some("Bar")),
        Lookup::Missing
    );
    assert_eq!(
        registry.find_member("Nope", MemberKind::InstanceProperty, "x", None),
        Lookup::Missing
    );
}

#[test]
fn test_case_insensitive_hit_reports_canonical_name() {
    let registry = hierarchy();
    match registry.find_member("Bar", MemberKind::InstanceMethod, "GETNAME", None) {
        Lookup::Found(resolved) => {
            assert_eq!(resolved.canonical_name.as_deref(), Some("getName"));
        }
        other => panic!("expected case-insensitive hit, got {:?}", other),
    }
    match registry.find_member("Bar", MemberKind::InstanceMethod, "getName", None) {
        Lookup::Found(resolved) => assert!(resolved.canonical_name.is_none()),
        other => panic!("expected exact hit, got {:?}", other),
    }
    // The lookup does not rewrite the registry
    assert!(registry.class("Foo").unwrap().instance_methods.contains_key("getName"));
}

#[test]
fn test_magic_fallbacks() {
    let mut registry = Registry::new();
    let mut magic = ClassEntry::new("Magic", ClassKind::Class);
    magic.add_method(method("__call", Type::Mixed), Visibility::Public, false);
    magic.add_method(method("__get", Type::Mixed), Visibility::Public, false);
    registry.add_class(magic);

    match registry.find_member("Magic", MemberKind::InstanceMethod, "whatever", None) {
        Lookup::Found(resolved) => assert!(resolved.magic),
        other => panic!("expected __call fallback, got {:?}", other),
    }
    assert!(matches!(
        registry.find_member("Magic", MemberKind::InstanceProperty, "prop", None),
        Lookup::Found(Resolved { magic: true, .. })
    ));
    assert_eq!(
        registry.find_member("Magic", MemberKind::StaticMethod, "make", None),
        Lookup::Missing
    );
}

#[test]
fn test_unknown_parent_makes_lookups_lenient() {
    let mut registry = Registry::new();
    registry.add_class(ClassEntry::new("Child", ClassKind::Class).with_parent("Vendor\\Base"));
    assert!(matches!(
        registry.find_member("Child", MemberKind::InstanceMethod, "inherited", None),
        Lookup::Found(_)
    ));
    assert!(registry.is_subclass_of("Child", "Anything"));
}

#[test]
fn test_interface_members_are_found() {
    let mut registry = Registry::new();
    let mut iface = ClassEntry::new("HasName", ClassKind::Interface);
    iface.add_member(
        MemberKind::Constant,
        property("PREFIX", Type::string_value("n_"), Visibility::Public, "HasName"),
    );
    registry.add_class(iface);
    registry.add_class(ClassEntry::new("Named", ClassKind::Class).with_interfaces(["HasName"]));
    match registry.find_member("Named", MemberKind::Constant, "PREFIX", None) {
        Lookup::Found(resolved) => assert_eq!(resolved.declaring_class, "HasName"),
        other => panic!("expected interface constant, got {:?}", other),
    }
}

#[test]
fn test_hierarchy_queries() {
    let mut registry = hierarchy();
    assert!(registry.is_subclass_of("Bar", "Foo"));
    assert!(registry.is_subclass_of("bar", "FOO"));
    assert!(!registry.is_subclass_of("Foo", "Bar"));
    assert!(!registry.is_subclass_of("Other", "Foo"));

    let mut stringy = ClassEntry::new("Stringy", ClassKind::Class);
    stringy.add_method(method("__toString", Type::string()), Visibility::Public, false);
    registry.add_class(stringy);
    assert!(registry.is_stringable("Stringy"));
    assert!(!registry.is_stringable("Other"));
}

#[test]
fn test_inheritance_cycle_terminates() {
    let mut registry = Registry::new();
    registry.add_class(ClassEntry::new("A", ClassKind::Class).with_parent("B"));
    registry.add_class(ClassEntry::new("B", ClassKind::Class).with_parent("A"));
    assert_eq!(registry.parent_chain("A").len(), 2);
    assert_eq!(
        registry.find_member("A", MemberKind::InstanceMethod, "m", None),
        Lookup::Missing
    );
}

#[test]
fn test_functions_and_constants() {
    let mut registry = Registry::new();
    let mut args = vec![Argument::new("a", None)];
    args[0].has_default = true;
    assert!(registry.add_function("\\App\\helper", FunctionType::new("helper", args, TypeUnion::mixed())));
    assert!(!registry.add_function("app\\HELPER", method("helper", Type::int())));
    assert_eq!(registry.function("App\\Helper").unwrap().required_count(), 0);

    assert!(registry.add_constant("APP_ROOT", TypeUnion::of(Type::string())));
    assert!(!registry.add_constant("\\APP_ROOT", TypeUnion::of(Type::int())));
    assert_eq!(registry.constant("\\APP_ROOT"), Some(&TypeUnion::of(Type::string())));
    assert!(registry.constant("app_root").is_none());
}

// ==================== Trait import ====================

fn trait_with(name: &str, methods: &[&str]) -> ClassEntry {
    let mut entry = ClassEntry::new(name, ClassKind::Trait);
    for m in methods {
        entry.add_method(method(m, Type::string_value(name)), Visibility::Public, false);
    }
    entry
}

fn returns(entry: &ClassEntry, name: &str) -> TypeUnion {
    entry
        .own_method(name)
        .and_then(Member::function)
        .map(|f| f.return_type.clone())
        .unwrap_or_default()
}

#[test]
fn test_trait_import_reowns_members() {
    let mut t = trait_with("Greets", &["hello"]);
    t.add_member(
        MemberKind::InstanceProperty,
        property("greeting", Type::string(), Visibility::Private, "Greets"),
    );
    let mut class = ClassEntry::new("Host", ClassKind::Class);
    let collisions = class.import_traits(&[&t], &[]);
    assert!(collisions.is_empty());
    assert_eq!(class.own_method("hello").unwrap().declaring_class, "Host");
    assert_eq!(class.instance_properties["greeting"].declaring_class, "Host");
}

#[test]
fn test_trait_collision_last_wins() {
    let a = trait_with("A", &["talk"]);
    let b = trait_with("B", &["talk"]);
    let mut class = ClassEntry::new("Host", ClassKind::Class);
    let collisions = class.import_traits(&[&a, &b], &[]);
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].member, "talk");
    assert_eq!(collisions[0].traits, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(returns(&class, "talk"), TypeUnion::of(Type::string_value("B")));
}

#[test]
fn test_trait_insteadof_and_alias() {
    let a = trait_with("A", &["talk"]);
    let b = trait_with("B", &["talk"]);
    let rules = vec![
        TraitRule::Precedence {
            trait_name: "A".into(),
            method: "talk".into(),
            instead_of: vec!["B".into()],
        },
        TraitRule::Alias {
            trait_name: Some("B".into()),
            method: "talk".into(),
            alias: Some("bTalk".into()),
            visibility: Some(Visibility::Protected),
        },
    ];
    let mut class = ClassEntry::new("Host", ClassKind::Class);
    let collisions = class.import_traits(&[&a, &b], &rules);
    assert!(collisions.is_empty());
    assert_eq!(returns(&class, "talk"), TypeUnion::of(Type::string_value("A")));
    let alias = class.own_method("bTalk").unwrap();
    assert_eq!(alias.visibility, Visibility::Protected);
    assert_eq!(returns(&class, "bTalk"), TypeUnion::of(Type::string_value("B")));
}
