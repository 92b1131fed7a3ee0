//! Class hierarchy, MRO and method resolution tests

use std::sync::Arc;

use olol_runtime::*;
use pretty_assertions::assert_eq;

fn define(scope: &Scope, name: &str, parents: &[&str]) -> Arc<Class> {
    scope
        .define_class(Class::new(name, "", parents.iter().copied()))
        .unwrap()
}

fn mro(scope: &Scope, name: &str) -> Vec<String> {
    scope.get_class(name).unwrap().mro(scope).unwrap().to_vec()
}

fn tagged(name: &str, tag: &str) -> Function {
    Function::native(name, |_, _, _| Ok(Value::Nothing)).with_docs([tag])
}

// ═══════════════════════════════════════════════════════════════════════
// C3 Linearization
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_root_class_mro_is_itself() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    assert_eq!(mro(&scope, "A"), vec!["A"]);
}

#[test]
fn test_single_inheritance_chain() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    define(&scope, "B", &["A"]);
    define(&scope, "C", &["B"]);
    assert_eq!(mro(&scope, "C"), vec!["C", "B", "A"]);
}

#[test]
fn test_diamond() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    define(&scope, "B", &["A"]);
    define(&scope, "C", &["A"]);
    define(&scope, "D", &["B", "C"]);
    assert_eq!(mro(&scope, "D"), vec!["D", "B", "C", "A"]);
}

#[test]
fn test_complex_hierarchy() {
    let scope = Scope::new();
    define(&scope, "O", &[]);
    define(&scope, "A", &["O"]);
    define(&scope, "B", &["O"]);
    define(&scope, "C", &["O"]);
    define(&scope, "D", &["A"]);
    define(&scope, "E", &["C"]);
    define(&scope, "F", &["D", "E"]);
    assert_eq!(mro(&scope, "F"), vec!["F", "D", "A", "E", "C", "O"]);
}

#[test]
fn test_conflicting_order_fails() {
    let scope = Scope::new();
    define(&scope, "B", &[]);
    define(&scope, "C", &[]);
    define(&scope, "X", &["B", "C"]);
    define(&scope, "Y", &["C", "B"]);
    let z = define(&scope, "Z", &["X", "Y"]);

    let err = z.mro(&scope).unwrap_err();
    assert!(err.is_inconsistent_hierarchy());
    assert!(err.to_string().contains("class Z"));

    // Failed computations are never cached; parents still are.
    assert!(z.cached_mro().is_none());
    assert!(scope.get_class("X").unwrap().cached_mro().is_some());
}

#[test]
fn test_parents_listed_before_their_own_parents() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    define(&scope, "B", &["A"]);
    // A before B contradicts B's own MRO
    let bad = define(&scope, "BAD", &["A", "B"]);
    assert!(bad.mro(&scope).unwrap_err().is_inconsistent_hierarchy());
}

#[test]
fn test_qualified_names_in_mro() {
    let scope = Scope::new();
    scope
        .define_class(Class::new("BASE", "stdlib:CORE", Vec::<String>::new()))
        .unwrap();
    let derived = scope
        .define_class(Class::new("DERIVED", "main", ["BASE"]))
        .unwrap();
    assert_eq!(
        derived.mro(&scope).unwrap().to_vec(),
        vec!["main.DERIVED", "stdlib:CORE.BASE"]
    );
}

#[test]
fn test_missing_parent_is_not_found() {
    let scope = Scope::new();
    let orphan = define(&scope, "ORPHAN", &["NOBODY"]);
    let err = orphan.mro(&scope).unwrap_err();
    assert!(err.is_not_found());
    assert!(orphan.cached_mro().is_none());
}

#[test]
fn test_inheritance_cycle_fails() {
    let scope = Scope::new();
    define(&scope, "A", &["B"]);
    define(&scope, "B", &["A"]);

    let err = scope.get_class("A").unwrap().mro(&scope).unwrap_err();
    assert!(err.is_inconsistent_hierarchy());
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn test_self_parent_fails() {
    let scope = Scope::new();
    let ouroboros = define(&scope, "SELF", &["SELF"]);
    assert!(ouroboros.mro(&scope).unwrap_err().is_inconsistent_hierarchy());
}

// ═══════════════════════════════════════════════════════════════════════
// Memoization
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_mro_is_memoized() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    let b = define(&scope, "B", &["A"]);

    assert!(b.cached_mro().is_none());
    let first = b.mro(&scope).unwrap();
    let second = b.mro(&scope).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(b.cached_mro().unwrap().to_vec(), vec!["B", "A"]);
}

#[test]
fn test_cache_is_authoritative_after_parent_change() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    define(&scope, "OTHER", &[]);
    let b = define(&scope, "B", &["A"]);

    let before = b.mro(&scope).unwrap().to_vec();
    b.set_parents(["OTHER"]);

    assert_eq!(b.parents(), vec!["OTHER"]);
    assert_eq!(b.mro(&scope).unwrap().to_vec(), before);
}

#[test]
fn test_subclass_reuses_parent_cache() {
    let scope = Scope::new();
    define(&scope, "A", &[]);
    let b = define(&scope, "B", &["A"]);
    let cached = b.mro(&scope).unwrap();

    define(&scope, "C", &["B"]);
    assert_eq!(mro(&scope, "C"), vec!["C", "B", "A"]);
    assert!(Arc::ptr_eq(&cached, &b.cached_mro().unwrap()));
}

// ═══════════════════════════════════════════════════════════════════════
// Method Resolution
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_resolution_follows_mro() {
    let scope = Scope::new();
    define(&scope, "A", &[]);

    let mut b = Class::new("B", "", ["A"]);
    b.declare_function(tagged("HI", "from B"), Visibility::Public);
    scope.define_class(b).unwrap();

    let mut c = Class::new("C", "", ["A"]);
    c.declare_function(tagged("HI", "from C"), Visibility::Public);
    c.declare_function(tagged("ONLY_C", "from C"), Visibility::Public);
    scope.define_class(c).unwrap();

    let d = define(&scope, "D", &["B", "C"]);

    let hi = d.resolve(&scope, "HI", &Caller::Outside).unwrap();
    assert_eq!(hi.documentation, vec!["from B"]);
    let only_c = d.resolve(&scope, "ONLY_C", &Caller::Outside).unwrap();
    assert_eq!(only_c.documentation, vec!["from C"]);
}

#[test]
fn test_own_definition_overrides_ancestor() {
    let scope = Scope::new();
    let mut a = Class::new("A", "", Vec::<String>::new());
    a.declare_function(tagged("SPEAK", "A"), Visibility::Public);
    scope.define_class(a).unwrap();

    let mut b = Class::new("B", "", ["A"]);
    b.declare_function(tagged("SPEAK", "B"), Visibility::Public);
    let b = scope.define_class(b).unwrap();

    let speak = b.resolve(&scope, "SPEAK", &Caller::Outside).unwrap();
    assert_eq!(speak.documentation, vec!["B"]);
}

#[test]
fn test_shared_functions_resolve() {
    let scope = Scope::new();
    let mut a = Class::new("A", "", Vec::<String>::new());
    a.declare_shared_function(tagged("CREATE", "shared"));
    scope.define_class(a).unwrap();
    let b = define(&scope, "B", &["A"]);

    let create = b.resolve(&scope, "CREATE", &Caller::Outside).unwrap();
    assert_eq!(create.is_shared(), Some(true));
}

#[test]
fn test_private_method_visibility() {
    let scope = Scope::new();
    let mut a = Class::new("A", "main", Vec::<String>::new());
    a.declare_function(tagged("SECRET", "A"), Visibility::Private);
    let a = scope.define_class(a).unwrap();
    let b = scope.define_class(Class::new("B", "main", ["A"])).unwrap();

    assert!(a.resolve(&scope, "SECRET", &Caller::class("main.A")).is_ok());
    assert!(a.resolve(&scope, "SECRET", &Caller::Outside).unwrap_err().is_private());

    // Subclasses do not see their parents' private methods.
    let err = b
        .resolve(&scope, "SECRET", &Caller::class("main.B"))
        .unwrap_err();
    assert!(err.is_private());
    assert_eq!(err.to_string(), "member function 'SECRET' is private");
}

#[test]
fn test_unknown_method_is_not_found() {
    let scope = Scope::new();
    let a = define(&scope, "A", &[]);
    let err = a.resolve(&scope, "NOPE", &Caller::Outside).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_fallback_is_last_resort() {
    let scope = Scope::new();
    let mut proxy = Class::new("PROXY", "", Vec::<String>::new());
    proxy.declare_function(tagged("REAL", "real"), Visibility::Public);
    proxy.set_fallback(|name, _caller| Ok(Arc::new(tagged(name, "fallback"))));
    scope.define_class(proxy).unwrap();
    let child = define(&scope, "CHILD", &["PROXY"]);

    let real = child.resolve(&scope, "REAL", &Caller::Outside).unwrap();
    assert_eq!(real.documentation, vec!["real"]);

    let dynamic = child.resolve(&scope, "ANYTHING", &Caller::Outside).unwrap();
    assert_eq!(dynamic.name, "ANYTHING");
    assert_eq!(dynamic.documentation, vec!["fallback"]);
    assert_eq!(dynamic.kind, FunctionKind::Instance);
    assert!(!child.has_fallback());
}
