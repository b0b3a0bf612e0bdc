use osc_symbol::{GlobalEnvironment, ResolutionError, Scope, ScopeError};
use osc_syntax::{EntityRef, ParameterValue, Value};
use proptest::prelude::*;

fn root() -> Scope {
    Scope::new(GlobalEnvironment::new("scenario.yaml"))
}

/// Builds `depth` nested named scopes below `root`, returning all of them outermost first
fn nest(root: &Scope, depth: usize) -> Vec<Scope> {
    let mut scopes = vec![root.clone()];
    for level in 0..depth {
        let next = scopes[level].child(&format!("level{level}"));
        scopes.push(next);
    }
    scopes
}

#[test]
fn catalog_entries_resolve_with_and_without_prefix() {
    let root = root();
    let named = root.child("vehicles");
    named.define("sedan", EntityRef::new("sedan_model"));
    let transparent = root.child("");
    transparent.define("truck", EntityRef::new("truck_model"));

    let act = root.child("story").child("act");

    assert_eq!(
        act.resolve::<EntityRef>("vehicles::sedan").unwrap(),
        EntityRef::new("sedan_model")
    );
    assert_eq!(
        act.resolve::<EntityRef>("truck").unwrap(),
        EntityRef::new("truck_model")
    );
    assert!(act.resolve::<EntityRef>("sedan").is_err());
}

#[test]
fn equally_near_catalog_entries_are_ambiguous() {
    let root = root();
    root.child("").define("limit", ParameterValue::Integer(1));
    root.child("").define("limit", ParameterValue::Integer(2));

    assert_eq!(
        root.child("story").parameter("limit"),
        Err(ScopeError::Resolution(ResolutionError::AmbiguousReferenceTo(
            "limit".into()
        )))
    );
}

#[test]
fn different_types_under_one_name_do_not_conflict() {
    let root = root();
    root.define("ego", ParameterValue::String("label".into()));
    root.define("ego", EntityRef::new("ego"));

    assert!(root.parameter("ego").is_ok());
    assert!(root.resolve::<EntityRef>("ego").is_ok());
    assert!(root.resolve_value::<Value>("ego").is_err());
}

proptest! {
    /// Tenet: the nearest binding shadows every outer one
    #[test]
    fn prop_innermost_binding_shadows_outer(
        depth in 1usize..6,
        bound_at in 0usize..6,
        outer_values in prop::collection::vec(any::<i64>(), 6),
    ) {
        let bound_at = bound_at.min(depth);
        let root = root();
        let scopes = nest(&root, depth);

        for (level, scope) in scopes.iter().enumerate().take(bound_at + 1) {
            scope.define("x", ParameterValue::Integer(outer_values[level]));
        }

        let innermost = &scopes[depth];
        prop_assert_eq!(
            innermost.parameter("x").unwrap(),
            ParameterValue::Integer(outer_values[bound_at])
        );
    }

    /// Tenet: an absolute reference means the same thing from everywhere
    #[test]
    fn prop_absolute_reference_is_position_independent(
        depth in 1usize..6,
        target in 0usize..6,
        value in any::<i64>(),
    ) {
        let target = target.min(depth);
        let root = root();
        let scopes = nest(&root, depth);
        scopes[target].define("x", ParameterValue::Integer(value));
        // decoys on the way that a relative lookup would prefer
        for scope in &scopes[target + 1..] {
            scope.define("x", ParameterValue::Integer(value.wrapping_add(1)));
        }

        let path: String = (0..target).map(|level| format!("::level{level}")).collect();
        let absolute = format!("{path}::x");

        for scope in &scopes {
            prop_assert_eq!(
                scope.parameter(&absolute).unwrap(),
                ParameterValue::Integer(value)
            );
        }
    }
}
