//! Hash keys, structural equality, cloning and rendering.

use proptest::prelude::*;
use rayon::prelude::*;

use sqlexpr::expression::SCALAR_FUNCTION_FLAG;
use sqlexpr::{Constant, Datum, ExprColumn, Expression, FieldType, StatementContext};

use super::{call, col_a, col_b, col_s};

fn sc() -> StatementContext {
    StatementContext::default()
}

fn plus_ab() -> Expression {
    call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()])
}

#[test]
fn test_identical_trees_hash_equal() {
    let first = plus_ab();
    let second = plus_ab();
    assert_eq!(first.hash_code(&sc()), second.hash_code(&sc()));
    assert_eq!(first.hash_code(&sc())[0], SCALAR_FUNCTION_FLAG);
    assert!(first.equal(&second));
}

#[test]
fn test_hash_is_memoized() {
    let expr = plus_ab();
    let key = expr.hash_code(&sc()).to_vec();
    assert_eq!(expr.hash_code(&sc()), key.as_slice());
    assert_eq!(expr.hash_code(&StatementContext::with_offset(-7200)), key.as_slice());
}

#[test]
fn test_different_names_hash_differently() {
    let plus = plus_ab();
    let minus = call("minus", FieldType::longlong(), vec![col_a().into(), col_b().into()]);
    assert_ne!(plus.hash_code(&sc()), minus.hash_code(&sc()));
    assert!(!plus.equal(&minus));
}

#[test]
fn test_argument_order_matters() {
    let ab = plus_ab();
    let ba = call("plus", FieldType::longlong(), vec![col_b().into(), col_a().into()]);
    assert_ne!(ab.hash_code(&sc()), ba.hash_code(&sc()));
    assert!(!ab.equal(&ba));
}

#[test]
fn test_function_never_equals_leaf() {
    let expr = plus_ab();
    assert!(!expr.equal(&col_a().into()));
    assert!(!expr.equal(&Constant::int(11).into()));
}

#[test]
fn test_clone_is_equal_and_independent() {
    let original = call(
        "concat",
        FieldType::varchar(),
        vec![col_s().into(), Constant::string("x").into()],
    );
    let original_key = original.hash_code(&sc()).to_vec();

    let mut copy = original.clone();
    assert!(copy.equal(&original));
    assert_eq!(copy.hash_code(&sc()), original_key.as_slice());

    let Expression::ScalarFunction(sf) = &mut copy else {
        panic!("expected a call");
    };
    sf.args_mut()[1] = Constant::string("y").into();

    assert_eq!(original.to_string(), "concat(t.s, x)");
    assert_eq!(copy.to_string(), "concat(t.s, y)");
    assert_eq!(original.hash_code(&sc()), original_key.as_slice());
    assert_ne!(copy.hash_code(&sc()), original_key.as_slice());
    assert!(!copy.equal(&original));
}

#[test]
fn test_leaf_rewrite_matches_fresh_tree() {
    let mut expr = call(
        "plus",
        FieldType::longlong(),
        vec![col_a().into(), Constant::int(1).into()],
    );
    let before = expr.hash_code(&sc()).to_vec();

    let Expression::ScalarFunction(sf) = &mut expr else {
        panic!("expected a call");
    };
    let args = sf.args_mut();
    let Expression::Constant(con) = &mut args[1] else {
        panic!("expected a constant");
    };
    con.set_value(Datum::Int64(2));
    let Expression::Column(col) = &mut args[0] else {
        panic!("expected a column");
    };
    col.set_unique_id(9);

    let fresh = call(
        "plus",
        FieldType::longlong(),
        vec![
            ExprColumn::new(9, "t.a", FieldType::longlong()).into(),
            Constant::int(2).into(),
        ],
    );
    assert!(expr.equal(&fresh));
    assert_eq!(expr.hash_code(&sc()), fresh.hash_code(&sc()));
    assert_ne!(expr.hash_code(&sc()), before.as_slice());
}

#[test]
fn test_rendering() {
    let nested = call(
        "plus",
        FieldType::longlong(),
        vec![
            col_a().into(),
            call("mul", FieldType::longlong(), vec![col_b().into(), Constant::int(3).into()]),
        ],
    );
    assert_eq!(nested.to_string(), "plus(t.a, mul(t.b, 3))");
    assert_eq!(
        serde_json::to_string(&nested).unwrap(),
        "\"plus(t.a, mul(t.b, 3))\""
    );
}

#[test]
fn test_concurrent_first_hash() {
    let expr = call(
        "plus",
        FieldType::longlong(),
        vec![
            call("mul", FieldType::longlong(), vec![col_a().into(), col_b().into()]),
            Constant::int(1).into(),
        ],
    );
    let expected = expr.clone().hash_code(&sc()).to_vec();
    let keys: Vec<Vec<u8>> = (0..64)
        .into_par_iter()
        .map(|_| expr.hash_code(&sc()).to_vec())
        .collect();
    assert!(keys.iter().all(|k| *k == expected));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: equal constant arguments give equal keys; different ones do not.
    #[test]
    fn prop_hash_tracks_arguments(a in any::<i64>(), b in any::<i64>()) {
        let x = call("plus", FieldType::longlong(), vec![Constant::int(a).into(), Constant::int(b).into()]);
        let y = call("plus", FieldType::longlong(), vec![Constant::int(a).into(), Constant::int(b).into()]);
        prop_assert_eq!(x.hash_code(&sc()), y.hash_code(&sc()));
        prop_assert!(x.equal(&y));

        let swapped = call("plus", FieldType::longlong(), vec![Constant::int(b).into(), Constant::int(a).into()]);
        prop_assert_eq!(a == b, x.hash_code(&sc()) == swapped.hash_code(&sc()));
    }

    /// Property: string arguments never collide across different names.
    #[test]
    fn prop_hash_separates_names(s in "[a-z]{0,12}") {
        let lower = call("lower", FieldType::varchar(), vec![Constant::string(s.clone()).into()]);
        let upper = call("upper", FieldType::varchar(), vec![Constant::string(s).into()]);
        prop_assert_ne!(lower.hash_code(&sc()), upper.hash_code(&sc()));
    }
}
