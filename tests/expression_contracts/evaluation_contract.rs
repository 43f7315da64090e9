//! Row-at-a-time and vectorized evaluation.

use sqlexpr::{
    Column, Constant, CorrelatedColumn, Datum, EvalType, ExprError, Expression, FieldType, Row,
    ScalarFunction,
};

use super::{call, col_a, col_b, col_s, col_x, ctx, stub_registry, test_chunk};

fn stub_call(tp: FieldType, value: i64) -> Expression {
    let registry = stub_registry(tp.clone(), value);
    ScalarFunction::new_function_with_registry(&registry, &ctx(), false, "stub", Some(tp), vec![])
        .unwrap()
}

#[test]
fn test_unsigned_bit_pattern_boxes_to_u64_max() {
    let expr = stub_call(FieldType::unsigned_longlong(), -1);
    assert_eq!(expr.eval(&Row::empty()).unwrap(), Datum::Uint64(u64::MAX));

    let signed = stub_call(FieldType::longlong(), -1);
    assert_eq!(signed.eval(&Row::empty()).unwrap(), Datum::Int64(-1));
}

#[test]
fn test_bitneg_zero_evaluates_to_u64_max() {
    let expr = call("bitneg", FieldType::longlong(), vec![Constant::int(0).into()]);
    assert_eq!(expr.eval(&Row::empty()).unwrap(), Datum::Uint64(u64::MAX));
}

#[test]
fn test_decimal_node_yields_null_without_error() {
    let expr = stub_call(FieldType::decimal(10, 2), 5);
    assert_eq!(expr.eval(&Row::empty()).unwrap(), Datum::Null);
}

#[test]
fn test_datetime_and_duration_nodes_yield_null() {
    let now = call("now", FieldType::datetime(), vec![]);
    assert_eq!(now.eval(&Row::empty()).unwrap(), Datum::Null);

    let chunk = test_chunk();
    let dur = call("sec_to_time", FieldType::duration(), vec![col_a().into()]);
    assert_eq!(dur.eval(&chunk.row(0)).unwrap(), Datum::Null);
}

#[test]
fn test_row_eval_by_category() {
    let chunk = test_chunk();
    let row = chunk.row(0);

    let sum = call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()]);
    assert_eq!(sum.eval(&row).unwrap(), Datum::Int64(11));
    assert_eq!(sum.eval_int(&row).unwrap(), Some(11));

    let real = call("plus", FieldType::double(), vec![col_a().into(), col_x().into()]);
    assert_eq!(real.eval(&row).unwrap(), Datum::Float64(1.5));

    let text = call("concat", FieldType::varchar(), vec![col_s().into(), col_a().into()]);
    assert_eq!(text.eval(&row).unwrap(), Datum::String("ab1".into()));
    assert_eq!(text.eval(&chunk.row(1)).unwrap(), Datum::Null);
}

#[test]
fn test_null_argument_yields_null() {
    let chunk = test_chunk();
    let sum = call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()]);
    assert_eq!(sum.eval(&chunk.row(2)).unwrap(), Datum::Null);
    assert_eq!(sum.eval_int(&chunk.row(3)).unwrap(), None);
}

#[test]
fn test_vectorized_matches_row_eval() {
    let chunk = test_chunk();
    let exprs = vec![
        call(
            "mul",
            FieldType::longlong(),
            vec![
                call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()]),
                Constant::int(2).into(),
            ],
        ),
        call("lt", FieldType::longlong(), vec![col_x().into(), col_a().into()]),
        call("div", FieldType::double(), vec![col_b().into(), col_a().into()]),
        call("upper", FieldType::varchar(), vec![col_s().into()]),
        call("length", FieldType::longlong(), vec![col_s().into()]),
        call(
            "eq",
            FieldType::longlong(),
            vec![Constant::real(f64::NAN).into(), Constant::real(f64::NAN).into()],
        ),
        call("lt", FieldType::longlong(), vec![col_x().into(), Constant::real(f64::NAN).into()]),
        call("ne", FieldType::longlong(), vec![col_x().into(), Constant::real(f64::NAN).into()]),
    ];

    for expr in exprs {
        assert!(expr.vectorized(), "{expr} should be vectorized");
        let eval_type = expr.field_type().eval_type();
        let mut out = Column::new(eval_type);
        expr.vec_eval(&chunk, &mut out).unwrap();
        assert_eq!(out.len(), chunk.num_rows());

        for (i, row) in chunk.rows().enumerate() {
            let expected = expr.eval(&row).unwrap();
            let got = Datum::from_array(out.array().unwrap().as_ref(), i, expr.field_type())
                .unwrap();
            assert_eq!(got, expected, "{expr} row {i}");
        }
    }
}

#[test]
fn test_vectorized_flag_needs_whole_subtree() {
    let stub = stub_call(FieldType::longlong(), 1);
    assert!(!stub.vectorized());

    let parent = call("plus", FieldType::longlong(), vec![stub, col_a().into()]);
    let sf = parent.as_scalar_function().unwrap();
    assert!(sf.function().vectorized());
    assert!(!parent.vectorized());
}

#[test]
fn test_unsupported_category_errors() {
    let chunk = test_chunk();
    let sum = call("plus", FieldType::longlong(), vec![col_a().into(), col_b().into()]);
    let mut out = Column::new(EvalType::String);
    let err = sum.vec_eval_string(&chunk, &mut out).unwrap_err();
    assert!(matches!(err, ExprError::Unsupported(_)));
}

#[test]
fn test_batch_error_propagates() {
    let chunk = test_chunk();
    let overflow = call(
        "plus",
        FieldType::longlong(),
        vec![col_a().into(), Constant::int(i64::MAX).into()],
    );
    let mut out = Column::new(EvalType::Int);
    let err = overflow.vec_eval_int(&chunk, &mut out).unwrap_err();
    assert!(matches!(err, ExprError::Overflow { .. }));
}

#[test]
fn test_correlated_argument_reads_bound_value() {
    let outer = CorrelatedColumn::new(sqlexpr::ExprColumn::new(99, "o.v", FieldType::longlong()));
    let expr = call(
        "plus",
        FieldType::longlong(),
        vec![outer.clone().into(), Constant::int(1).into()],
    );
    outer.set_value(Datum::Int64(41));
    assert_eq!(expr.eval(&Row::empty()).unwrap(), Datum::Int64(42));

    let chunk = test_chunk();
    let mut out = Column::new(EvalType::Int);
    expr.vec_eval_int(&chunk, &mut out).unwrap();
    assert!(out.int64s().unwrap().values().iter().all(|&v| v == 42));
}
