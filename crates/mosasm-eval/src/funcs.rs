//! Operator and built-in function evaluators.
//!
//! Each [`OpKind`] maps to one small evaluator working against the value
//! stack. Numeric semantics follow the BBC BASIC dialect: comparisons
//! yield -1 for true and 0 for false, shifts are 32-bit with
//! sign-symmetric directions, and integer operators accept the full
//! combined signed/unsigned 32-bit range.
//!
//! Floating-point domain and range failures are detected with explicit
//! checks on the arguments or the result rather than errno.

use std::cmp::Ordering;

use mosasm_lex::{parse_double_prefix, LineCursor};
use mosasm_util::{format_number, ErrorKind, ExprError, ExprResult};

use crate::context::format_time;
use crate::convert::double_to_int;
use crate::eval::{EvalState, Evaluator, MAX_EVAL_DEPTH};
use crate::ops::OpKind;
use crate::string::Str;
use crate::value::Value;

/// STRING$ refuses results at or beyond this many bytes.
const MAX_STRING_LEN: usize = 65536;

/// Executes one operator against the value stack.
pub(crate) fn apply(
    ev: &mut Evaluator<'_, '_>,
    state: &mut EvalState,
    kind: OpKind,
) -> ExprResult<()> {
    let span = ev.cursor.span();
    apply_inner(ev, state, kind).map_err(|kind| ExprError::new(kind, span))
}

fn apply_inner(
    ev: &mut Evaluator<'_, '_>,
    state: &mut EvalState,
    kind: OpKind,
) -> Result<(), ErrorKind> {
    match kind {
        // ---- arithmetic -------------------------------------------------
        OpKind::Add => {
            let rhs = state.pop_value()?;
            let lhs = state.pop_value()?;
            match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => push_number(state, a + b),
                (Value::String(a), Value::String(b)) => push_string(state, a.concat(&b)),
                _ => return Err(ErrorKind::TypeMismatch),
            }
        }
        OpKind::Subtract => {
            let (a, b) = pop_number_pair(state)?;
            push_number(state, a - b);
        }
        OpKind::Multiply => {
            let (a, b) = pop_number_pair(state)?;
            push_number(state, a * b);
        }
        OpKind::Divide => {
            let (a, b) = pop_number_pair(state)?;
            if b == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            push_number(state, a / b);
        }
        OpKind::Power => {
            let (a, b) = pop_number_pair(state)?;
            let result = a.powf(b);
            if result.is_nan() && !a.is_nan() && !b.is_nan() {
                return Err(ErrorKind::IllegalOperation);
            }
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(ErrorKind::NumberTooBig);
            }
            push_number(state, result);
        }
        OpKind::Div => {
            let (a, b) = pop_int_pair(state)?;
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            push_number(state, f64::from(a.wrapping_div(b)));
        }
        OpKind::Mod => {
            let (a, b) = pop_int_pair(state)?;
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            push_number(state, f64::from(a.wrapping_rem(b)));
        }

        // ---- shifts and bitwise -----------------------------------------
        OpKind::ShiftLeft => {
            let (value, shift) = pop_int_pair(state)?;
            push_number(state, f64::from(shift_left(value, shift)));
        }
        OpKind::ShiftRight => {
            let (value, shift) = pop_int_pair(state)?;
            push_number(state, f64::from(shift_right(value, shift)));
        }
        OpKind::And => {
            let (a, b) = pop_int_pair(state)?;
            push_number(state, f64::from(a & b));
        }
        OpKind::Or => {
            let (a, b) = pop_int_pair(state)?;
            push_number(state, f64::from(a | b));
        }
        OpKind::Eor => {
            let (a, b) = pop_int_pair(state)?;
            push_number(state, f64::from(a ^ b));
        }
        OpKind::Not => {
            let value = pop_int(state)?;
            push_number(state, f64::from(!value));
        }

        // ---- comparisons (BBC truth: -1 / 0) ----------------------------
        OpKind::Equal => {
            let ordering = pop_comparison(state)?;
            push_bool(state, ordering == Some(Ordering::Equal));
        }
        OpKind::NotEqual => {
            let ordering = pop_comparison(state)?;
            push_bool(state, ordering != Some(Ordering::Equal));
        }
        OpKind::LessThan => {
            let ordering = pop_comparison(state)?;
            push_bool(state, ordering == Some(Ordering::Less));
        }
        OpKind::LessOrEqual => {
            let ordering = pop_comparison(state)?;
            push_bool(state, matches!(ordering, Some(Ordering::Less | Ordering::Equal)));
        }
        OpKind::MoreThan => {
            let ordering = pop_comparison(state)?;
            push_bool(state, ordering == Some(Ordering::Greater));
        }
        OpKind::MoreOrEqual => {
            let ordering = pop_comparison(state)?;
            push_bool(
                state,
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            );
        }

        // ---- signs and byte extractors ----------------------------------
        OpKind::Negate => {
            let value = pop_number(state)?;
            push_number(state, -value);
        }
        OpKind::Posate => {
            let value = pop_number(state)?;
            push_number(state, value);
        }
        OpKind::Hi => {
            let value = pop_int(state)?;
            push_number(state, f64::from((value & 0xFFFF) >> 8));
        }
        OpKind::Lo => {
            let value = pop_int(state)?;
            push_number(state, f64::from(value & 0xFF));
        }

        // ---- transcendentals --------------------------------------------
        OpKind::Sin => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.sin())?);
        }
        OpKind::Cos => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.cos())?);
        }
        OpKind::Tan => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.tan())?);
        }
        OpKind::Asn => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.asin())?);
        }
        OpKind::Acs => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.acos())?);
        }
        OpKind::Atn => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.atan())?);
        }
        OpKind::Sqr => {
            let value = pop_number(state)?;
            push_number(state, checked(value, value.sqrt())?);
        }
        OpKind::Log => {
            let value = pop_number(state)?;
            if value <= 0.0 {
                return Err(ErrorKind::IllegalOperation);
            }
            push_number(state, value.log10());
        }
        OpKind::Ln => {
            let value = pop_number(state)?;
            if value <= 0.0 {
                return Err(ErrorKind::IllegalOperation);
            }
            push_number(state, value.ln());
        }
        OpKind::Exp => {
            let value = pop_number(state)?;
            let result = value.exp();
            if result.is_infinite() && value.is_finite() {
                return Err(ErrorKind::IllegalOperation);
            }
            push_number(state, result);
        }
        OpKind::Rad => {
            let value = pop_number(state)?;
            push_number(state, value * std::f64::consts::PI / 180.0);
        }
        OpKind::Deg => {
            let value = pop_number(state)?;
            push_number(state, value * 180.0 / std::f64::consts::PI);
        }

        // ---- rounding, sign, random -------------------------------------
        OpKind::Int => {
            let value = pop_number(state)?;
            push_number(state, f64::from(double_to_int(value)?));
        }
        OpKind::Abs => {
            let value = pop_number(state)?;
            push_number(state, value.abs());
        }
        OpKind::Sgn => {
            let value = pop_number(state)?;
            let sign = if value < 0.0 {
                -1.0
            } else if value > 0.0 {
                1.0
            } else {
                0.0
            };
            push_number(state, sign);
        }
        OpKind::Rnd => {
            let value = pop_number(state)?;
            if value < 1.0 {
                return Err(ErrorKind::IllegalOperation);
            }
            if value == 1.0 {
                let unit = ev.ctx.random_unit();
                push_number(state, unit);
            } else {
                let scaled = ev.ctx.random_unit() * value;
                push_number(state, f64::from(double_to_int(scaled)?));
            }
        }

        // ---- strings ----------------------------------------------------
        OpKind::Str => {
            let value = pop_number(state)?;
            push_string(state, Str::from(format_number(value)));
        }
        OpKind::StrHex => {
            let value = pop_int(state)?;
            push_string(state, Str::from(format!("{:X}", value as u32)));
        }
        OpKind::Val => {
            let text = pop_string(state)?;
            push_number(state, parse_double_prefix(text.as_bytes()));
        }
        OpKind::Eval => {
            let text = pop_string(state)?;
            let value = eval_nested(ev, &text)?;
            state.values.push(value);
        }
        OpKind::Len => {
            let text = pop_string(state)?;
            push_number(state, text.len() as f64);
        }
        OpKind::Chr => {
            let value = pop_int(state)?;
            if !(0..=255).contains(&value) {
                return Err(ErrorKind::IllegalOperation);
            }
            push_string(state, Str::from(&[value as u8][..]));
        }
        OpKind::Asc => {
            let text = pop_string(state)?;
            if text.is_empty() {
                return Err(ErrorKind::IllegalOperation);
            }
            push_number(state, f64::from(text.byte_at(0)));
        }
        OpKind::Mid => {
            let count = pop_int(state)?;
            let index = pop_int(state)?;
            let text = pop_string(state)?;
            let start = i64::from(index) - 1;
            if start < 0 || start as usize > text.len() || count < 0 {
                return Err(ErrorKind::IllegalOperation);
            }
            let start = start as usize;
            // an overlong count is clamped to the end of the string
            let length = (count as usize).min(text.len() - start);
            push_string(state, text.substring(start, length));
        }
        OpKind::Left => {
            let count = pop_int(state)?;
            let text = pop_string(state)?;
            if count < 0 || count as usize > text.len() {
                return Err(ErrorKind::IllegalOperation);
            }
            push_string(state, text.substring(0, count as usize));
        }
        OpKind::Right => {
            let count = pop_int(state)?;
            let text = pop_string(state)?;
            if count < 0 || count as usize > text.len() {
                return Err(ErrorKind::IllegalOperation);
            }
            let count = count as usize;
            push_string(state, text.substring(text.len() - count, count));
        }
        OpKind::StringRepeat => {
            let text = pop_string(state)?;
            let count = pop_int(state)?;
            if count < 0
                || count as usize >= MAX_STRING_LEN
                || text.len() >= MAX_STRING_LEN
                || count as usize * text.len() >= MAX_STRING_LEN
            {
                return Err(ErrorKind::IllegalOperation);
            }
            push_string(state, text.repeat(count as usize));
        }
        OpKind::Upper => {
            let text = pop_string(state)?;
            push_string(state, text.to_upper());
        }
        OpKind::Lower => {
            let text = pop_string(state)?;
            push_string(state, text.to_lower());
        }
        OpKind::Time => {
            let format = pop_string(state)?;
            let text = format_time(&ev.ctx.assembly_time(), &format.to_text())?;
            push_string(state, Str::from(text));
        }
    }
    Ok(())
}

/// Runs a fresh engine over the text of an `EVAL` argument.
///
/// The nested call shares the symbol table, PC, clock, and PRNG, but has
/// its own stacks and cursor.
fn eval_nested(ev: &mut Evaluator<'_, '_>, text: &Str) -> Result<Value, ErrorKind> {
    if ev.depth >= MAX_EVAL_DEPTH {
        return Err(ErrorKind::ExpressionTooComplex);
    }
    log::trace!("EVAL recursion at depth {}", ev.depth + 1);

    let mut cursor = LineCursor::from_bytes(text.as_bytes(), ev.cursor.line_number());
    let mut nested = Evaluator::nested(&mut cursor, &mut *ev.ctx, ev.depth + 1);
    nested.evaluate(false).map_err(|error| error.kind)
}

/// 32-bit left shift; negative counts shift right arithmetically, and
/// anything further than 31 bits in either direction clears the value.
fn shift_left(value: i32, shift: i32) -> i32 {
    if shift.unsigned_abs() > 31 {
        0
    } else if shift >= 0 {
        ((value as u32) << shift) as i32
    } else {
        value >> -shift
    }
}

/// 32-bit arithmetic right shift; negative counts shift left logically.
fn shift_right(value: i32, shift: i32) -> i32 {
    if shift.unsigned_abs() > 31 {
        0
    } else if shift >= 0 {
        value >> shift
    } else {
        ((value as u32) << -shift) as i32
    }
}

/// Maps a NaN produced from a non-NaN argument to `IllegalOperation`
/// (the domain errors of the trig and square-root family).
fn checked(argument: f64, result: f64) -> Result<f64, ErrorKind> {
    if result.is_nan() && !argument.is_nan() {
        Err(ErrorKind::IllegalOperation)
    } else {
        Ok(result)
    }
}

fn push_number(state: &mut EvalState, value: f64) {
    state.values.push(Value::Number(value));
}

fn push_bool(state: &mut EvalState, flag: bool) {
    state.values.push(Value::from_bool(flag));
}

fn push_string(state: &mut EvalState, value: Str) {
    state.values.push(Value::String(value));
}

fn pop_number(state: &mut EvalState) -> Result<f64, ErrorKind> {
    state.pop_value()?.as_number()
}

fn pop_int(state: &mut EvalState) -> Result<i32, ErrorKind> {
    double_to_int(pop_number(state)?)
}

fn pop_string(state: &mut EvalState) -> Result<Str, ErrorKind> {
    match state.pop_value()? {
        Value::String(text) => Ok(text),
        Value::Number(_) => Err(ErrorKind::TypeMismatch),
    }
}

fn pop_number_pair(state: &mut EvalState) -> Result<(f64, f64), ErrorKind> {
    let rhs = pop_number(state)?;
    let lhs = pop_number(state)?;
    Ok((lhs, rhs))
}

fn pop_int_pair(state: &mut EvalState) -> Result<(i32, i32), ErrorKind> {
    let rhs = pop_int(state)?;
    let lhs = pop_int(state)?;
    Ok((lhs, rhs))
}

/// Pops two same-typed operands and compares them. `None` is the
/// unordered case (a NaN operand).
fn pop_comparison(state: &mut EvalState) -> Result<Option<Ordering>, ErrorKind> {
    let rhs = state.pop_value()?;
    let lhs = state.pop_value()?;
    match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.compare(b))),
        _ => Err(ErrorKind::TypeMismatch),
    }
}
