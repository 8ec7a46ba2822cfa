//! End-to-end expression scenarios.
//!
//! Each case drives the public evaluator API over a literal source line,
//! the way the assembler's line driver does.

use mosasm_eval::{evaluate_line, Context, Evaluator, Str, Value};
use mosasm_lex::LineCursor;
use mosasm_util::ErrorKind;

use proptest::prelude::*;

fn eval(source: &str) -> Result<Value, ErrorKind> {
    evaluate_line(source, &mut Context::new()).map_err(|e| e.kind)
}

fn number(source: &str) -> f64 {
    match eval(source) {
        Ok(Value::Number(value)) => value,
        other => panic!("{:?} for {}", other, source),
    }
}

fn string(source: &str) -> Str {
    match eval(source) {
        Ok(Value::String(value)) => value,
        other => panic!("{:?} for {}", other, source),
    }
}

#[test]
fn scenario_precedence() {
    assert_eq!(number("1 + 2 * 3"), 7.0);
    assert_eq!(number("(1 + 2) * 3"), 9.0);
    assert_eq!(number("2 ^ 10"), 1024.0);
}

#[test]
fn scenario_string_concat() {
    assert_eq!(string("\"foo\" + \"bar\""), Str::from("foobar"));
}

#[test]
fn scenario_mid() {
    assert_eq!(string("MID$(\"hello\", 2, 3)"), Str::from("ell"));
}

#[test]
fn scenario_comparison_truth() {
    assert_eq!(number("5 = 5"), -1.0);
    assert_eq!(number("5 = 6"), 0.0);
    assert_eq!(number("5 <> 6"), -1.0);
    assert_eq!(number("5 != 6"), -1.0);
    assert_eq!(number("5 <= 5"), -1.0);
    assert_eq!(number("5 < 5"), 0.0);
}

#[test]
fn scenario_bitwise() {
    assert_eq!(number("&FF AND &0F"), 15.0);
    assert_eq!(number("&F0 OR &0F"), 255.0);
    assert_eq!(number("&FF EOR &0F"), 240.0);
}

#[test]
fn scenario_shifts() {
    assert_eq!(number("1 << 4"), 16.0);
    assert_eq!(number("-1 >> 1"), -1.0);
    assert_eq!(number("-8 >> 2"), -2.0);
    assert_eq!(number("1 << -2"), 0.0);
    assert_eq!(number("16 >> -1"), 32.0);
    assert_eq!(number("1 << 40"), 0.0);
}

#[test]
fn scenario_string_functions() {
    assert_eq!(number("LEN(STRING$(3, \"ab\"))"), 6.0);
    assert_eq!(string("CHR$(65)"), Str::from("A"));
    assert_eq!(number("ASC(\"Az\")"), 65.0);
    assert_eq!(string("UPPER$(\"mixed Case\")"), Str::from("MIXED CASE"));
    assert_eq!(string("LOWER$(\"MIXED Case\")"), Str::from("mixed case"));
    assert_eq!(eval("CHR$(-1)"), Err(ErrorKind::IllegalOperation));
    assert_eq!(eval("CHR$(256)"), Err(ErrorKind::IllegalOperation));
    assert_eq!(eval("ASC(\"\")"), Err(ErrorKind::IllegalOperation));
}

#[test]
fn scenario_errors() {
    assert_eq!(eval("1/0"), Err(ErrorKind::DivisionByZero));
    assert_eq!(eval("SQR(0-1)"), Err(ErrorKind::IllegalOperation));
    assert_eq!(eval("\"abc"), Err(ErrorKind::MissingQuote));
    assert_eq!(eval("(1+2"), Err(ErrorKind::MismatchedParentheses));
}

#[test]
fn scenario_forward_reference() {
    let mut ctx = Context::new();
    let mut cursor = LineCursor::new("FOO+1", 1);
    let result = Evaluator::new(&mut cursor, &mut ctx).evaluate(false);
    match result {
        Err(error) => assert_eq!(error.kind, ErrorKind::SymbolNotDefined("FOO".to_string())),
        Ok(value) => panic!("unexpected {:?}", value),
    }
    // the engine skipped to the end of the expression before raising
    assert!(cursor.is_at_end());
}

#[test]
fn invariant_cursor_lands_on_terminator() {
    let mut ctx = Context::new();
    let mut cursor = LineCursor::new("2*3 , 5", 1);
    let value = Evaluator::new(&mut cursor, &mut ctx).evaluate(false).unwrap();
    assert_eq!(value, Value::Number(6.0));
    assert_eq!(cursor.peek(), Some(b','));
}

#[test]
fn invariant_pure_expressions_are_stable() {
    let mut ctx = Context::new();
    ctx.define_symbol("base", Value::Number(0x4000 as f64));
    let source = "(base + &20) * 2 - LEN(\"xy\")";
    let first = evaluate_line(source, &mut ctx).unwrap();
    let second = evaluate_line(source, &mut ctx).unwrap();
    assert_eq!(first, second);
}

#[test]
fn invariant_comparison_totality() {
    // (a=b) OR (a<>b) is always true
    for (a, b) in [("1", "1"), ("1", "2"), ("\"x\"", "\"x\""), ("\"x\"", "\"y\"")] {
        let source = format!("({a} = {b}) OR ({a} <> {b})");
        assert_eq!(number(&source), -1.0, "for {}", source);
    }
}

#[test]
fn invariant_hi_lo_recompose() {
    for value in ["0", "&1234", "&FFFF", "&ABCDE", "12345"] {
        let source = format!("HI({value})*256 + LO({value}) = ({value} AND &FFFF)");
        assert_eq!(number(&source), -1.0, "for {}", source);
    }
}

proptest! {
    #[test]
    fn prop_eval_str_round_trips(value in -1.0e12f64..1.0e12) {
        let source = format!("EVAL(STR$({}))", mosasm_util::format_number(value));
        prop_assert_eq!(number(&source), value);
    }

    #[test]
    fn prop_string_repeat_length(count in 0usize..40, text in "[a-z]{0,8}") {
        let source = format!("LEN(STRING$({}, \"{}\"))", count, text);
        prop_assert_eq!(number(&source), (count * text.len()) as f64);
    }

    #[test]
    fn prop_left_right_partition(text in "[A-Za-z0-9 ]{0,12}", split in 0usize..13) {
        let split = split.min(text.len());
        let source = format!(
            "LEFT$(\"{text}\", {split}) + RIGHT$(\"{text}\", LEN(\"{text}\") - {split})"
        );
        prop_assert_eq!(string(&source), Str::from(text.as_str()));
    }

    #[test]
    fn prop_chr_asc_round_trips(text in "[ -~]{1,10}") {
        let escaped = text.replace('"', "\"\"");
        let source = format!("CHR$(ASC(\"{escaped}\")) = LEFT$(\"{escaped}\", 1)");
        prop_assert_eq!(number(&source), -1.0);
    }

    #[test]
    fn prop_comparisons_are_minus_one_or_zero(a in -100i32..100, b in -100i32..100) {
        for op in ["=", "<>", "<", "<=", ">", ">="] {
            let source = format!("{} {} {}", a, op, b);
            let result = number(&source);
            prop_assert!(result == -1.0 || result == 0.0, "{} -> {}", source, result);
        }
    }

    #[test]
    fn prop_shift_symmetry(value in -1000i32..1000, shift in -31i32..31) {
        // v << s equals v >> -s for every in-range count
        let left = number(&format!("{} << {}", value, shift));
        let right = number(&format!("{} >> {}", value, -shift));
        prop_assert_eq!(left, right);
    }
}

#[test]
fn wrappers_type_check() {
    let mut ctx = Context::new();

    let mut cursor = LineCursor::new("\"nan\"", 1);
    assert_eq!(
        Evaluator::new(&mut cursor, &mut ctx)
            .evaluate_as_double(false)
            .map_err(|e| e.kind),
        Err(ErrorKind::TypeMismatch)
    );

    let mut cursor = LineCursor::new("2 + 2", 1);
    assert_eq!(
        Evaluator::new(&mut cursor, &mut ctx)
            .evaluate_as_string(false)
            .map_err(|e| e.kind),
        Err(ErrorKind::TypeMismatch)
    );

    let mut cursor = LineCursor::new("&FF00", 1);
    assert_eq!(
        Evaluator::new(&mut cursor, &mut ctx).evaluate_as_unsigned_int(false),
        Ok(0xFF00)
    );
}
