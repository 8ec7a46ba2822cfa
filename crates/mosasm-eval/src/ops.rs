//! The operator catalogue.
//!
//! Two static tables, one matched when the parser expects a value or
//! prefix operator and one when it expects an infix operator. Rows are
//! tried in order and the first match wins, which is why `>=` sits above
//! `>` and `<<` above `<=` above `<`. Matching is case-insensitive over
//! ASCII, and word operators match greedily with no word-boundary check:
//! `1ANDY` is `1 AND Y`.
//!
//! Function names include their opening bracket (`MID$(` is one token);
//! the parser un-reads the bracket after a match so the next iteration
//! can account for it as an ordinary open-bracket sentinel.

/// Everything an operator can do, dispatched exhaustively in `funcs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    // binary infix
    Power,
    Multiply,
    Divide,
    Mod,
    Div,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Equal,
    NotEqual,
    LessOrEqual,
    MoreOrEqual,
    LessThan,
    MoreThan,
    And,
    Or,
    Eor,

    // unary prefix
    Negate,
    Posate,
    Hi,
    Lo,

    // functions
    Sin,
    Cos,
    Tan,
    Asn,
    Acs,
    Atn,
    Sqr,
    Rad,
    Deg,
    Int,
    Abs,
    Sgn,
    Rnd,
    Not,
    Log,
    Ln,
    Exp,
    Time,
    Str,
    StrHex,
    Val,
    Eval,
    Len,
    Chr,
    Asc,
    Mid,
    Left,
    Right,
    StringRepeat,
    Upper,
    Lower,
}

/// One row of an operator table.
///
/// `op` is `None` for the sentinels (brackets and the argument comma),
/// which never execute; they only steer the stack unwinding. Sentinels
/// carry precedence -1 so no precedence comparison ever pops them.
#[derive(Clone, Copy, Debug)]
pub struct Operator {
    /// Token text, uppercase. Input is matched case-insensitively.
    pub token: &'static str,
    /// Binding strength; higher binds tighter, negative marks a sentinel.
    pub precedence: i8,
    /// For function tokens, the number of arguments; 0 otherwise.
    pub parameter_count: u8,
    /// What to execute, or `None` for sentinels.
    pub op: Option<OpKind>,
}

/// Functions all share the same precedence, above the sign operators.
pub const FUNCTION_PRECEDENCE: i8 = 10;

impl Operator {
    const fn new(token: &'static str, precedence: i8, op: OpKind) -> Self {
        Self {
            token,
            precedence,
            parameter_count: 0,
            op: Some(op),
        }
    }

    const fn function(token: &'static str, parameter_count: u8, op: OpKind) -> Self {
        Self {
            token,
            precedence: FUNCTION_PRECEDENCE,
            parameter_count,
            op: Some(op),
        }
    }

    const fn sentinel(token: &'static str) -> Self {
        Self {
            token,
            precedence: -1,
            parameter_count: 0,
            op: None,
        }
    }

    /// True for brackets and the argument comma.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.op.is_none()
    }
}

/// Infix operators and close sentinels, tried in order.
pub const BINARY_OPERATORS: &[Operator] = &[
    Operator::sentinel(")"),
    Operator::sentinel("]"),
    Operator::sentinel(","),
    Operator::new("^", 7, OpKind::Power),
    Operator::new("*", 6, OpKind::Multiply),
    Operator::new("/", 6, OpKind::Divide),
    Operator::new("%", 6, OpKind::Mod),
    Operator::new("DIV", 6, OpKind::Div),
    Operator::new("MOD", 6, OpKind::Mod),
    Operator::new("<<", 6, OpKind::ShiftLeft),
    Operator::new(">>", 6, OpKind::ShiftRight),
    Operator::new("+", 5, OpKind::Add),
    Operator::new("-", 5, OpKind::Subtract),
    Operator::new("==", 4, OpKind::Equal),
    Operator::new("=", 4, OpKind::Equal),
    Operator::new("<>", 4, OpKind::NotEqual),
    Operator::new("!=", 4, OpKind::NotEqual),
    Operator::new("<=", 4, OpKind::LessOrEqual),
    Operator::new(">=", 4, OpKind::MoreOrEqual),
    Operator::new("<", 4, OpKind::LessThan),
    Operator::new(">", 4, OpKind::MoreThan),
    Operator::new("AND", 3, OpKind::And),
    Operator::new("OR", 2, OpKind::Or),
    Operator::new("EOR", 2, OpKind::Eor),
];

/// Prefix operators, functions, and open sentinels, tried in order.
pub const UNARY_OPERATORS: &[Operator] = &[
    Operator::sentinel("("),
    Operator::sentinel("["),
    Operator::new("-", 8, OpKind::Negate),
    Operator::new("+", 8, OpKind::Posate),
    Operator::function("HI(", 1, OpKind::Hi),
    Operator::function("LO(", 1, OpKind::Lo),
    Operator::new(">", FUNCTION_PRECEDENCE, OpKind::Hi),
    Operator::new("<", FUNCTION_PRECEDENCE, OpKind::Lo),
    Operator::function("SIN(", 1, OpKind::Sin),
    Operator::function("COS(", 1, OpKind::Cos),
    Operator::function("TAN(", 1, OpKind::Tan),
    Operator::function("ASN(", 1, OpKind::Asn),
    Operator::function("ACS(", 1, OpKind::Acs),
    Operator::function("ATN(", 1, OpKind::Atn),
    Operator::function("SQR(", 1, OpKind::Sqr),
    Operator::function("RAD(", 1, OpKind::Rad),
    Operator::function("DEG(", 1, OpKind::Deg),
    Operator::function("INT(", 1, OpKind::Int),
    Operator::function("ABS(", 1, OpKind::Abs),
    Operator::function("SGN(", 1, OpKind::Sgn),
    Operator::function("RND(", 1, OpKind::Rnd),
    Operator::function("NOT(", 1, OpKind::Not),
    Operator::function("LOG(", 1, OpKind::Log),
    Operator::function("LN(", 1, OpKind::Ln),
    Operator::function("EXP(", 1, OpKind::Exp),
    Operator::function("TIME$(", 1, OpKind::Time),
    Operator::function("STR$(", 1, OpKind::Str),
    Operator::function("STR$~(", 1, OpKind::StrHex),
    Operator::function("VAL(", 1, OpKind::Val),
    Operator::function("EVAL(", 1, OpKind::Eval),
    Operator::function("LEN(", 1, OpKind::Len),
    Operator::function("CHR$(", 1, OpKind::Chr),
    Operator::function("ASC(", 1, OpKind::Asc),
    Operator::function("MID$(", 3, OpKind::Mid),
    Operator::function("LEFT$(", 2, OpKind::Left),
    Operator::function("RIGHT$(", 2, OpKind::Right),
    Operator::function("STRING$(", 2, OpKind::StringRepeat),
    Operator::function("UPPER$(", 1, OpKind::Upper),
    Operator::function("LOWER$(", 1, OpKind::Lower),
];

/// Finds the first table row matching the input at `position`.
///
/// # Returns
///
/// The matched row and its token length in bytes.
pub fn match_operator(
    table: &'static [Operator],
    bytes: &[u8],
    position: usize,
) -> Option<(&'static Operator, usize)> {
    'rows: for operator in table {
        let token = operator.token.as_bytes();
        if position + token.len() > bytes.len() {
            continue;
        }
        for (offset, &expected) in token.iter().enumerate() {
            if bytes[position + offset].to_ascii_uppercase() != expected {
                continue 'rows;
            }
        }
        return Some((operator, token.len()));
    }
    None
}
