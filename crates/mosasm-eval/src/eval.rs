//! The expression parser/evaluator.
//!
//! A shunting-yard driver over two bounded stacks. There is no AST: as
//! operators come off the stack their results are computed immediately,
//! so a successful parse leaves exactly one value behind.
//!
//! The parser alternates between two states. Expecting a value it matches
//! the unary table (prefix operators, functions, open brackets) or reads
//! an atom; expecting an operator it matches the binary table (infix
//! operators, close brackets, the argument comma). Function tokens
//! include their opening bracket; after matching one the bracket is
//! un-read so the next iteration processes it as an ordinary open
//! sentinel carrying the function's expected comma count.

use mosasm_lex::{get_symbol_name, is_symbol_start, parse_numeric, LineCursor};
use mosasm_util::{ErrorKind, ExprError, ExprResult};

use crate::context::{format_time, Context};
use crate::convert::{double_to_int, double_to_uint};
use crate::funcs;
use crate::ops::{match_operator, OpKind, BINARY_OPERATORS, UNARY_OPERATORS};
use crate::string::Str;
use crate::value::Value;

/// Value stack limit.
pub const MAX_VALUES: usize = 64;

/// Operator stack limit.
pub const MAX_OPERATORS: usize = 32;

/// Nesting limit for `EVAL`.
pub const MAX_EVAL_DEPTH: u32 = 16;

/// The fixed format used by a bare `TIME$` (no arguments).
const TIME_DEFAULT_FORMAT: &str = "%a,%d %b %Y.%H:%M:%S";

/// An operator pushed on the stack.
///
/// Open-bracket sentinels (`kind == None`) reuse the parameter slot to
/// count the argument commas still owed inside the bracket.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StackedOp {
    kind: Option<OpKind>,
    precedence: i8,
    parameter_count: u8,
}

/// What the parser expects next.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
    ValueOrUnary,
    Binary,
}

/// Per-call parse state. Both stacks live and die with one
/// [`Evaluator::evaluate`] call; `EVAL` recursion gets fresh ones.
pub(crate) struct EvalState {
    pub(crate) values: Vec<Value>,
    operators: Vec<StackedOp>,
    bracket_count: i32,
    pending_comma_count: u8,
}

impl EvalState {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            operators: Vec::new(),
            bracket_count: 0,
            pending_comma_count: 0,
        }
    }

    /// Pop an operand for an executing operator.
    pub(crate) fn pop_value(&mut self) -> Result<Value, ErrorKind> {
        self.values.pop().ok_or(ErrorKind::MissingValue)
    }
}

/// Evaluates one expression from a line of source.
///
/// The evaluator borrows the driver's cursor and the shared context; all
/// other state is scoped to a single `evaluate` call.
///
/// # Example
///
/// ```
/// use mosasm_eval::{Context, Evaluator, Value};
/// use mosasm_lex::LineCursor;
///
/// let mut ctx = Context::new();
/// let mut cursor = LineCursor::new("1 + 2 * 3", 1);
/// let value = Evaluator::new(&mut cursor, &mut ctx).evaluate(false).unwrap();
/// assert_eq!(value, Value::Number(7.0));
/// ```
pub struct Evaluator<'a, 'src> {
    pub(crate) cursor: &'a mut LineCursor<'src>,
    pub(crate) ctx: &'a mut Context,
    pub(crate) depth: u32,
}

impl<'a, 'src> Evaluator<'a, 'src> {
    /// Creates an evaluator over the driver's cursor and context.
    pub fn new(cursor: &'a mut LineCursor<'src>, ctx: &'a mut Context) -> Self {
        Self {
            cursor,
            ctx,
            depth: 0,
        }
    }

    /// Creates the nested evaluator behind `EVAL`.
    pub(crate) fn nested(
        cursor: &'a mut LineCursor<'src>,
        ctx: &'a mut Context,
        depth: u32,
    ) -> Self {
        Self { cursor, ctx, depth }
    }

    /// Evaluates one expression, leaving the cursor on the sub-statement
    /// terminator that ended it.
    ///
    /// `allow_one_trailing_close` permits a single unmatched close
    /// bracket, which is then left for the caller to consume; the
    /// addressing mode `LDA (addr),Y` needs this.
    ///
    /// On the first pass an undefined symbol still consumes the rest of
    /// the expression before the error is raised, so the driver can carry
    /// on at the right place.
    pub fn evaluate(&mut self, allow_one_trailing_close: bool) -> ExprResult<Value> {
        let mut state = EvalState::new();
        let result = self.run(&mut state, allow_one_trailing_close);
        if let Err(ref error) = result {
            if error.is_symbol_not_defined() && self.ctx.is_first_pass() {
                log::debug!(
                    "forward reference at {}, skipping rest of expression",
                    error.span
                );
                self.cursor
                    .skip_expression(state.bracket_count, allow_one_trailing_close);
            }
        }
        result
    }

    /// Evaluates an expression that must be a number.
    pub fn evaluate_as_double(&mut self, allow_one_trailing_close: bool) -> ExprResult<f64> {
        let span = self.cursor.span();
        match self.evaluate(allow_one_trailing_close)? {
            Value::Number(value) => Ok(value),
            Value::String(_) => Err(ExprError::new(ErrorKind::TypeMismatch, span)),
        }
    }

    /// Evaluates an expression that must coerce to a signed 32-bit integer.
    pub fn evaluate_as_int(&mut self, allow_one_trailing_close: bool) -> ExprResult<i32> {
        let span = self.cursor.span();
        let value = self.evaluate_as_double(allow_one_trailing_close)?;
        double_to_int(value).map_err(|kind| ExprError::new(kind, span))
    }

    /// Evaluates an expression that must coerce to an unsigned 32-bit
    /// integer (negative values wrap to their bit pattern).
    pub fn evaluate_as_unsigned_int(
        &mut self,
        allow_one_trailing_close: bool,
    ) -> ExprResult<u32> {
        let span = self.cursor.span();
        let value = self.evaluate_as_double(allow_one_trailing_close)?;
        double_to_uint(value).map_err(|kind| ExprError::new(kind, span))
    }

    /// Evaluates an expression that must be a string.
    pub fn evaluate_as_string(&mut self, allow_one_trailing_close: bool) -> ExprResult<Str> {
        let span = self.cursor.span();
        match self.evaluate(allow_one_trailing_close)? {
            Value::String(value) => Ok(value),
            Value::Number(_) => Err(ExprError::new(ErrorKind::TypeMismatch, span)),
        }
    }

    /// The parse loop proper.
    fn run(&mut self, state: &mut EvalState, allow_one_trailing_close: bool) -> ExprResult<Value> {
        let mut expected = Expect::ValueOrUnary;

        'parse: while self.cursor.advance(state.bracket_count == 0) {
            match expected {
                Expect::ValueOrUnary => {
                    let matched =
                        match_operator(UNARY_OPERATORS, self.cursor.bytes(), self.cursor.position());
                    let Some((operator, token_len)) = matched else {
                        // not an operator, so it must be an atom
                        let value = self.get_value()?;
                        self.push_value(state, value)?;
                        expected = Expect::Binary;
                        continue;
                    };

                    let span = self.cursor.span();
                    self.cursor.step_n(token_len);

                    if operator.parameter_count > 0 {
                        // a function: un-read its bracket and note how many
                        // commas it owes
                        self.cursor.step_back(1);
                        state.pending_comma_count = operator.parameter_count - 1;
                    }

                    if operator.is_sentinel() {
                        // open bracket: takes over the pending comma count
                        state.bracket_count += 1;
                        let sentinel = StackedOp {
                            kind: None,
                            precedence: operator.precedence,
                            parameter_count: state.pending_comma_count,
                        };
                        state.pending_comma_count = 0;
                        self.push_operator(state, sentinel, span)?;
                    } else {
                        // strictly-greater pop keeps chained prefix
                        // operators right-associative
                        self.reduce_while(state, |top| top.precedence > operator.precedence)?;
                        self.push_operator(
                            state,
                            StackedOp {
                                kind: operator.op,
                                precedence: operator.precedence,
                                parameter_count: 0,
                            },
                            span,
                        )?;
                    }
                }

                Expect::Binary => {
                    let matched =
                        match_operator(BINARY_OPERATORS, self.cursor.bytes(), self.cursor.position());
                    let Some((operator, token_len)) = matched else {
                        return Err(self.error(ErrorKind::InvalidCharacter));
                    };

                    let span = self.cursor.span();
                    self.cursor.step_n(token_len);

                    if !operator.is_sentinel() {
                        // left-associative: pop while at least as strong
                        self.reduce_while(state, |top| top.precedence >= operator.precedence)?;
                        self.push_operator(
                            state,
                            StackedOp {
                                kind: operator.op,
                                precedence: operator.precedence,
                                parameter_count: 0,
                            },
                            span,
                        )?;
                        expected = Expect::ValueOrUnary;
                        continue;
                    }

                    // close bracket or argument comma: unwind to the
                    // matching open sentinel
                    let is_comma = operator.token == ",";
                    if !is_comma {
                        state.bracket_count -= 1;
                    }
                    self.reduce_while(state, |top| top.kind.is_some())?;

                    match state.operators.last_mut() {
                        None => {
                            if !is_comma && allow_one_trailing_close {
                                // leave the unmatched bracket for the
                                // caller (e.g. LDA (addr),Y)
                                self.cursor.step_back(1);
                                break 'parse;
                            }
                            return Err(ExprError::new(ErrorKind::MismatchedParentheses, span));
                        }
                        Some(sentinel) => {
                            if is_comma {
                                if sentinel.parameter_count == 0 {
                                    return Err(ExprError::new(ErrorKind::ParameterCount, span));
                                }
                                sentinel.parameter_count -= 1;
                                expected = Expect::ValueOrUnary;
                            } else {
                                if sentinel.parameter_count != 0 {
                                    return Err(ExprError::new(ErrorKind::ParameterCount, span));
                                }
                                state.operators.pop();
                                expected = Expect::Binary;
                            }
                        }
                    }
                }
            }
        }

        // end of the sub-statement: execute whatever is still stacked
        while let Some(top) = state.operators.pop() {
            self.execute(state, top)?;
        }

        match state.values.pop() {
            None => Err(self.error(ErrorKind::EmptyExpression)),
            Some(value) => {
                debug_assert!(state.values.is_empty(), "value stack not fully reduced");
                Ok(value)
            }
        }
    }

    /// Pops and executes stacked operators while `keep_popping` holds.
    fn reduce_while(
        &mut self,
        state: &mut EvalState,
        keep_popping: impl Fn(&StackedOp) -> bool,
    ) -> ExprResult<()> {
        while let Some(top) = state.operators.last() {
            if !keep_popping(top) {
                break;
            }
            let top = *top;
            state.operators.pop();
            self.execute(state, top)?;
        }
        Ok(())
    }

    /// Executes one stacked operator against the value stack.
    fn execute(&mut self, state: &mut EvalState, operator: StackedOp) -> ExprResult<()> {
        match operator.kind {
            Some(kind) => funcs::apply(self, state, kind),
            // an open bracket surviving to execution was never closed
            None => Err(self.error(ErrorKind::MismatchedParentheses)),
        }
    }

    /// Reads one atomic value at the cursor.
    fn get_value(&mut self) -> ExprResult<Value> {
        let span = self.cursor.span();

        if let Some(number) = parse_numeric(self.cursor) {
            return Ok(Value::Number(number));
        }

        match self.cursor.peek() {
            // the program counter
            Some(b'*') => {
                self.cursor.step();
                Ok(Value::Number(self.ctx.pc() as f64))
            }

            // a character constant: exactly 'C'
            Some(b'\'') => match (self.cursor.peek_at(1), self.cursor.peek_at(2)) {
                (Some(byte), Some(b'\'')) => {
                    self.cursor.step_n(3);
                    Ok(Value::Number(f64::from(byte)))
                }
                _ => Err(ExprError::new(ErrorKind::InvalidCharacter, span)),
            },

            Some(b'"') => self.get_string_literal(),

            Some(byte) if is_symbol_start(byte) => {
                let Some(name) = get_symbol_name(self.cursor) else {
                    return Err(ExprError::new(ErrorKind::InvalidCharacter, span));
                };
                if name == "TIME$" {
                    // bare TIME$ (without brackets) uses a fixed format
                    let text = format_time(&self.ctx.assembly_time(), TIME_DEFAULT_FORMAT)
                        .map_err(|kind| ExprError::new(kind, span))?;
                    return Ok(Value::String(Str::from(text)));
                }
                match self.ctx.symbol_value(&name) {
                    Some(value) => Ok(value.clone()),
                    None => Err(ExprError::new(ErrorKind::SymbolNotDefined(name), span)),
                }
            }

            _ => Err(ExprError::new(ErrorKind::InvalidCharacter, span)),
        }
    }

    /// Reads a string literal at the cursor. A doubled `""` inside the
    /// literal is a single quote character.
    fn get_string_literal(&mut self) -> ExprResult<Value> {
        let span = self.cursor.span();
        self.cursor.step();

        let mut bytes = Vec::new();
        loop {
            match self.cursor.peek() {
                None => return Err(ExprError::new(ErrorKind::MissingQuote, span)),
                Some(b'"') => {
                    if self.cursor.peek_at(1) == Some(b'"') {
                        bytes.push(b'"');
                        self.cursor.step_n(2);
                    } else {
                        self.cursor.step();
                        break;
                    }
                }
                Some(byte) => {
                    bytes.push(byte);
                    self.cursor.step();
                }
            }
        }
        Ok(Value::String(Str::from(bytes)))
    }

    fn push_value(&mut self, state: &mut EvalState, value: Value) -> ExprResult<()> {
        if state.values.len() >= MAX_VALUES {
            return Err(self.error(ErrorKind::ExpressionTooComplex));
        }
        state.values.push(value);
        Ok(())
    }

    fn push_operator(
        &mut self,
        state: &mut EvalState,
        operator: StackedOp,
        span: mosasm_util::Span,
    ) -> ExprResult<()> {
        if state.operators.len() >= MAX_OPERATORS {
            return Err(ExprError::new(ErrorKind::ExpressionTooComplex, span));
        }
        state.operators.push(operator);
        Ok(())
    }

    /// An error at the current cursor position.
    pub(crate) fn error(&self, kind: ErrorKind) -> ExprError {
        ExprError::new(kind, self.cursor.span())
    }
}
