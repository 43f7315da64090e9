//! Construction, return-type reconciliation and folding.

use sqlexpr::expression::UNFOLDABLE_FUNCTIONS;
use sqlexpr::{
    scalar_funcs_to_exprs, Constant, Datum, ExprError, Expression, FieldType, FunctionRegistry,
    ScalarFunction, TypeCode,
};

use super::{call, col_a, col_b, ctx, stub_registry};

#[test]
fn test_every_registered_name_constructs() {
    let registry = FunctionRegistry::global();
    let cases: Vec<(&str, Vec<Expression>)> = vec![
        ("plus", vec![col_a().into(), col_b().into()]),
        ("minus", vec![col_a().into(), col_b().into()]),
        ("mul", vec![col_a().into(), col_b().into()]),
        ("div", vec![col_a().into(), col_b().into()]),
        ("eq", vec![col_a().into(), col_b().into()]),
        ("ne", vec![col_a().into(), col_b().into()]),
        ("lt", vec![col_a().into(), col_b().into()]),
        ("le", vec![col_a().into(), col_b().into()]),
        ("gt", vec![col_a().into(), col_b().into()]),
        ("ge", vec![col_a().into(), col_b().into()]),
        ("bitneg", vec![col_a().into()]),
        ("concat", vec![col_a().into(), col_b().into()]),
        ("lower", vec![col_a().into()]),
        ("upper", vec![col_a().into()]),
        ("length", vec![col_a().into()]),
        ("rand", vec![]),
        ("now", vec![]),
        ("unix_timestamp", vec![]),
        ("sec_to_time", vec![col_a().into()]),
    ];
    assert_eq!(registry.len(), cases.len());
    for (name, args) in cases {
        let expr = ScalarFunction::new_function(&ctx(), name, Some(FieldType::longlong()), args)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        let sf = expr.as_scalar_function().expect("not folded");
        assert_eq!(sf.name(), name);
        assert!(!sf.ret_type().is_unspecified());
    }
}

#[test]
fn test_absent_return_type() {
    let err = ScalarFunction::new_function(&ctx(), "plus", None, vec![]).unwrap_err();
    assert!(matches!(err, ExprError::InvalidReturnType));
    assert_eq!(err.to_string(), "RetType cannot be nil for ScalarFunction");
}

#[test]
fn test_unknown_name() {
    let err = ScalarFunction::new_function(&ctx(), "no_such", Some(FieldType::longlong()), vec![])
        .unwrap_err();
    assert_eq!(err.to_string(), "FUNCTION no_such does not exist");
}

#[test]
fn test_builtin_error_surfaces() {
    let err = ScalarFunction::new_function(
        &ctx(),
        "bitneg",
        Some(FieldType::longlong()),
        vec![col_a().into(), col_b().into()],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExprError::IncorrectParameterCount { ref name, actual: 2, .. } if name == "bitneg"
    ));
}

#[test]
fn test_internal_constructor_swallows_errors() {
    assert!(ScalarFunction::new_function_internal(&ctx(), "no_such", Some(FieldType::longlong()), vec![]).is_none());
    let built = ScalarFunction::new_function_internal(
        &ctx(),
        "plus",
        Some(FieldType::longlong()),
        vec![col_a().into(), Constant::int(1).into()],
    );
    assert!(built.is_some_and(|e| e.as_scalar_function().is_some()));
}

#[test]
fn test_case_insensitive_name() {
    let expr = call("CoNcAt", FieldType::varchar(), vec![col_a().into()]);
    let sf = expr.as_scalar_function().unwrap();
    assert_eq!(sf.name(), "concat");
    assert_eq!(sf.func_name().o, "CoNcAt");
    assert_eq!(expr.to_string(), "concat(t.a)");
}

#[test]
fn test_builtin_type_wins() {
    // bitneg infers BIGINT UNSIGNED regardless of the declared type.
    let expr = call("bitneg", FieldType::varchar(), vec![col_a().into()]);
    let tp = expr.field_type();
    assert_eq!(tp.tp, TypeCode::LongLong);
    assert!(tp.is_unsigned());
}

#[test]
fn test_declared_type_fills_unspecified_builtin_type() {
    let registry = stub_registry(FieldType::unspecified(), 7);
    let expr = ScalarFunction::new_function_with_registry(
        &registry,
        &ctx(),
        false,
        "stub",
        Some(FieldType::longlong()),
        vec![],
    )
    .unwrap();
    assert_eq!(expr.field_type(), &FieldType::longlong());
}

#[test]
fn test_unspecified_both_keeps_builtin_type() {
    let registry = stub_registry(FieldType::unspecified(), 7);
    let expr = ScalarFunction::new_function_with_registry(
        &registry,
        &ctx(),
        false,
        "stub",
        Some(FieldType::unspecified()),
        vec![],
    )
    .unwrap();
    assert!(expr.field_type().is_unspecified());
}

#[test]
fn test_fold_plus_one_two() {
    let expr = ScalarFunction::new_function(
        &ctx(),
        "plus",
        Some(FieldType::longlong()),
        vec![Constant::int(1).into(), Constant::int(2).into()],
    )
    .unwrap();
    let Expression::Constant(con) = expr else {
        panic!("expected a folded constant, got {expr:?}");
    };
    assert_eq!(con.value(), &Datum::Int64(3));
    assert_eq!(con.ret_type.tp, TypeCode::LongLong);
}

#[test]
fn test_no_fold_without_request() {
    let expr = call(
        "plus",
        FieldType::longlong(),
        vec![Constant::int(1).into(), Constant::int(2).into()],
    );
    assert!(expr.as_scalar_function().is_some());
    assert!(expr.const_item());
}

#[test]
fn test_unfoldable_functions_stay_calls() {
    let rand = ScalarFunction::new_function(&ctx(), "rand", Some(FieldType::double()), vec![])
        .unwrap();
    assert!(rand.as_scalar_function().is_some());

    let seeded = ScalarFunction::new_function(
        &ctx(),
        "rand",
        Some(FieldType::double()),
        vec![Constant::int(3).into()],
    )
    .unwrap();
    assert!(seeded.as_scalar_function().is_some());
    assert!(UNFOLDABLE_FUNCTIONS.contains(&"rand"));
}

#[test]
fn test_folding_failure_is_not_an_error() {
    let expr = ScalarFunction::new_function(
        &ctx(),
        "mul",
        Some(FieldType::longlong()),
        vec![Constant::int(i64::MAX).into(), Constant::int(2).into()],
    )
    .unwrap();
    assert!(expr.as_scalar_function().is_some());
}

#[test]
fn test_decimal_call_is_not_folded() {
    let registry = stub_registry(FieldType::decimal(10, 2), 1);
    let expr = ScalarFunction::new_function_with_registry(
        &registry,
        &ctx(),
        true,
        "stub",
        Some(FieldType::decimal(10, 2)),
        vec![],
    )
    .unwrap();
    assert!(expr.as_scalar_function().is_some());
}

#[test]
fn test_scalar_funcs_to_exprs_preserves_order() {
    let funcs: Vec<ScalarFunction> = ["lower", "upper"]
        .into_iter()
        .map(|name| match call(name, FieldType::varchar(), vec![col_a().into()]) {
            Expression::ScalarFunction(sf) => sf,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    let exprs = scalar_funcs_to_exprs(funcs);
    let names: Vec<String> = exprs.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["lower(t.a)", "upper(t.a)"]);
}
