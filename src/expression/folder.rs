//! Constant folding.

use std::mem;

use log::debug;

use crate::chunk::Row;
use crate::types::EvalType;

use super::{Constant, Expression};

/// Replaces constant function calls with their value, bottom-up.
///
/// Folding is best effort: a call that fails to evaluate is kept as is and
/// will report the error when evaluated for real. Only int, real and string
/// calls are folded, since row evaluation yields NULL for other categories.
#[must_use]
pub fn fold_constant(expr: Expression) -> Expression {
    let Expression::ScalarFunction(mut sf) = expr else {
        return expr;
    };

    for arg in sf.args_mut() {
        let folded = fold_constant(mem::replace(arg, Constant::null().into()));
        *arg = folded;
    }

    if !sf.const_item() {
        return sf.into();
    }
    match sf.ret_type().eval_type() {
        EvalType::Int | EvalType::Real | EvalType::String => {}
        _ => return sf.into(),
    }

    match sf.eval(&Row::empty()) {
        Ok(value) => {
            debug!("folded {sf} to {value}");
            Constant::new(value, sf.ret_type().clone()).into()
        }
        Err(err) => {
            debug!("keeping {sf} unfolded: {err}");
            sf.into()
        }
    }
}
