// SPDX: CC0-1.0

use crate::{
    op::{apply, OperatorTriple},
    Number,
};

pub const DEFAULT_A: Number = 2.0;

/// Evaluates `(a op1 y) op2 ((y op3 z) op3 x)`.
///
/// The third operator slot is used twice, for the inner `(y, z)` step and the
/// outer step with `x`. Any undefined intermediate makes the result undefined.
pub fn evaluate(x: Number, y: Number, z: Number, ops: OperatorTriple, a: Number) -> Option<Number> {
    let OperatorTriple(op1, op2, op3) = ops;
    let left = apply(op1, a, y)?;
    let yz = apply(op3, y, z)?;
    let right = apply(op3, yz, x)?;
    apply(op2, left, right)
}
