//! Planner rewrites: decorrelation, index resolution and constant-ness.

use sqlexpr::{
    Constant, CorrelatedColumn, ExprColumn, ExprError, Expression, FieldType, Schema,
    StatementContext,
};

use super::{call, col_a, col_b, test_chunk};

fn outer_col() -> ExprColumn {
    ExprColumn::new(50, "o.k", FieldType::longlong())
}

fn correlated_call() -> Expression {
    call(
        "eq",
        FieldType::longlong(),
        vec![col_a().into(), CorrelatedColumn::new(outer_col()).into()],
    )
}

#[test]
fn test_is_correlated_follows_arguments() {
    assert!(correlated_call().is_correlated());
    let nested = call("bitneg", FieldType::longlong(), vec![correlated_call()]);
    assert!(nested.is_correlated());
    assert!(!call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()]).is_correlated());
}

#[test]
fn test_decorrelate_rewrites_in_place() {
    let mut expr = call("bitneg", FieldType::longlong(), vec![correlated_call()]);
    let before = expr.hash_code(&StatementContext::default()).to_vec();

    let Expression::ScalarFunction(sf) = &mut expr else {
        panic!("expected a call");
    };
    sf.decorrelate(&Schema::new(vec![outer_col()]));

    assert!(!expr.is_correlated());
    assert_ne!(expr.hash_code(&StatementContext::default()), before.as_slice());
}

#[test]
fn test_decorrelate_ignores_unknown_columns() {
    let expr = correlated_call().decorrelate(&Schema::new(vec![col_b()]));
    assert!(expr.is_correlated());
}

#[test]
fn test_resolve_indices_leaves_receiver_untouched() {
    let expr = call("plus", FieldType::longlong(), vec![col_b().into(), col_a().into()]);
    let key = expr.hash_code(&StatementContext::default()).to_vec();
    let rendered = expr.to_string();

    // Reversed layout: t.b at 0, t.a at 1.
    let schema = Schema::new(vec![col_b(), col_a()]);
    let resolved = expr.resolve_indices(&schema).unwrap();

    assert_eq!(expr.to_string(), rendered);
    assert_eq!(expr.hash_code(&StatementContext::default()), key.as_slice());
    let args = expr.as_scalar_function().unwrap().args();
    assert_eq!(args[0].as_column().map(|c| c.index), Some(1));

    let resolved_args = resolved.as_scalar_function().unwrap().args();
    assert_eq!(resolved_args[0].as_column().map(|c| c.index), Some(0));
    assert_eq!(resolved_args[1].as_column().map(|c| c.index), Some(1));
    assert_eq!(resolved.hash_code(&StatementContext::default()), key.as_slice());
    assert!(resolved.equal(&expr));
}

#[test]
fn test_resolved_tree_reads_new_layout() {
    let unbound_b = ExprColumn::new(2, "t.b", FieldType::longlong());
    let expr = call("minus", FieldType::longlong(), vec![unbound_b.into(), col_a().into()]);
    let schema = Schema::new(vec![col_a(), col_b()]);
    let resolved = expr.resolve_indices(&schema).unwrap();
    let chunk = test_chunk();
    assert_eq!(resolved.eval_int(&chunk.row(0)).unwrap(), Some(9));
}

#[test]
fn test_resolve_indices_reports_partial_copy() {
    let missing = ExprColumn::new(77, "t.missing", FieldType::longlong());
    let expr = call(
        "plus",
        FieldType::longlong(),
        vec![col_b().into(), missing.into()],
    );
    let err = expr.resolve_indices(&Schema::new(vec![col_b()])).unwrap_err();
    assert!(matches!(err.cause, ExprError::ColumnNotFound(ref name) if name == "t.missing"));
    let partial = err.partial.as_scalar_function().unwrap();
    assert_eq!(partial.args()[0].as_column().map(|c| c.index), Some(0));

    let as_expr_error: ExprError = err.into();
    assert!(as_expr_error.to_string().contains("t.missing"));
}

#[test]
fn test_const_item_truth_table() {
    let c = || -> Expression { Constant::int(1).into() };
    let cases: Vec<(Expression, bool)> = vec![
        (call("plus", FieldType::longlong(), vec![c(), c()]), true),
        (call("plus", FieldType::longlong(), vec![c(), col_a().into()]), false),
        (
            call(
                "plus",
                FieldType::longlong(),
                vec![c(), CorrelatedColumn::new(outer_col()).into()],
            ),
            false,
        ),
        (
            call(
                "bitneg",
                FieldType::longlong(),
                vec![call("plus", FieldType::longlong(), vec![c(), c()])],
            ),
            true,
        ),
        (call("rand", FieldType::double(), vec![c()]), false),
        (call("unix_timestamp", FieldType::longlong(), vec![]), false),
        (call("now", FieldType::datetime(), vec![]), false),
        (call("concat", FieldType::varchar(), vec![c()]), true),
    ];
    for (expr, expected) in cases {
        assert_eq!(expr.const_item(), expected, "{expr}");
    }
}
