//! mosasm-eval - The expression engine.
//!
//! This crate evaluates the arithmetic, logical, and string expressions
//! that appear in assembly source lines: operand values, directive
//! arguments, and symbol assignments. The numeric dialect is BBC BASIC,
//! corner cases included (comparisons yield -1/0, `<<`/`>>` are
//! sign-symmetric 32-bit shifts, `RND` has the classic three ranges).
//!
//! The engine is a shunting-yard evaluator: no AST is built, results are
//! computed directly as operators come off the stack. The driver hands it
//! a [`mosasm_lex::LineCursor`] and a [`Context`]; the engine consumes
//! bytes up to the next sub-statement terminator and returns one
//! [`Value`].
//!
//! Module map:
//! - `value` / `string` - the dual-typed value model
//! - `ops` - the operator catalogue (two static tables)
//! - `eval` - the parser/evaluator driver
//! - `funcs` - the operator and built-in function evaluators
//! - `context` - symbol table, PC, clock, PRNG
//! - `convert` - 32-bit integer coercion

pub mod context;
pub mod convert;
mod edge_cases;
pub mod eval;
mod funcs;
pub mod ops;
pub mod string;
pub mod value;

pub use context::{format_time, Context, RAND_MAX};
pub use convert::{double_to_int, double_to_uint};
pub use eval::{Evaluator, MAX_EVAL_DEPTH, MAX_OPERATORS, MAX_VALUES};
pub use string::Str;
pub use value::{Value, ValueKind};

use mosasm_lex::LineCursor;
use mosasm_util::ExprResult;

/// Evaluates a whole line as one expression.
///
/// A convenience for directive arguments and tests; the assembler's line
/// driver owns its cursor and calls [`Evaluator`] directly.
pub fn evaluate_line(source: &str, ctx: &mut Context) -> ExprResult<Value> {
    let mut cursor = LineCursor::new(source, 1);
    Evaluator::new(&mut cursor, ctx).evaluate(false)
}
