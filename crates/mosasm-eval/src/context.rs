//! The evaluation context.
//!
//! Everything the engine reads from the outside world lives here: the
//! symbol table, the program counter, the pass flag, the assembly
//! timestamp, and the PRNG behind `RND`. The context is passed explicitly
//! to every evaluation; there is no ambient state.

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rustc_hash::FxHashMap;

use mosasm_util::ErrorKind;

use crate::value::Value;

/// Largest value [`Context::next_rand`] can return, mirroring the C
/// library constant the RND semantics are defined against.
pub const RAND_MAX: u32 = 0x7FFF_FFFF;

/// Shared assembler state the expression engine evaluates against.
///
/// The engine itself only reads the table, the PC and the clock, and
/// advances the PRNG; the driver mutates the rest between statements.
pub struct Context {
    symbols: FxHashMap<String, Value>,
    pc: i64,
    first_pass: bool,
    assembly_time: NaiveDateTime,
    rng: StdRng,
}

impl Context {
    /// A fresh context: empty symbol table, PC 0, first pass, the clock
    /// fixed to now, and an entropy-seeded PRNG.
    pub fn new() -> Self {
        Self {
            symbols: FxHashMap::default(),
            pc: 0,
            first_pass: true,
            assembly_time: Local::now().naive_local(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Pin the assembly timestamp (it is normally fixed once at startup).
    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.assembly_time = time;
        self
    }

    /// Seed the PRNG deterministically.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Define or redefine a symbol.
    pub fn define_symbol(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    /// Look up a symbol. Names are case-sensitive.
    pub fn symbol_value(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    /// True if `name` is in the symbol table.
    pub fn is_symbol_defined(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// The current program counter (the value of `*` in expressions).
    #[inline]
    pub fn pc(&self) -> i64 {
        self.pc
    }

    /// Move the program counter (driver side).
    pub fn set_pc(&mut self, pc: i64) {
        self.pc = pc;
    }

    /// True during the first assembly pass, when forward references are
    /// tolerated.
    #[inline]
    pub fn is_first_pass(&self) -> bool {
        self.first_pass
    }

    /// Switch passes (driver side).
    pub fn set_first_pass(&mut self, first_pass: bool) {
        self.first_pass = first_pass;
    }

    /// The timestamp baked at assembly start.
    #[inline]
    pub fn assembly_time(&self) -> NaiveDateTime {
        self.assembly_time
    }

    /// The next raw PRNG output, uniform over `[0, RAND_MAX]`.
    pub fn next_rand(&mut self) -> u32 {
        self.rng.next_u32() & RAND_MAX
    }

    /// A uniform real in `[0, 1)`, computed as `rand / (RAND_MAX + 1)`.
    pub fn random_unit(&mut self) -> f64 {
        f64::from(self.next_rand()) / (f64::from(RAND_MAX) + 1.0)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a timestamp with a strftime-style format string.
///
/// # Errors
///
/// `TimeResultTooBig` when formatting fails (an invalid specifier) or
/// produces an empty result.
pub fn format_time(time: &NaiveDateTime, format: &str) -> Result<String, ErrorKind> {
    use std::fmt::Write;

    let mut out = String::new();
    if write!(out, "{}", time.format(format)).is_err() || out.is_empty() {
        return Err(ErrorKind::TimeResultTooBig);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1997, 8, 29)
            .unwrap()
            .and_hms_opt(2, 14, 0)
            .unwrap()
    }

    #[test]
    fn test_symbol_table() {
        let mut ctx = Context::new();
        assert!(!ctx.is_symbol_defined("start"));
        ctx.define_symbol("start", Value::Number(0x1900 as f64));
        assert!(ctx.is_symbol_defined("start"));
        assert_eq!(ctx.symbol_value("start"), Some(&Value::Number(6400.0)));
        // case-sensitive
        assert_eq!(ctx.symbol_value("START"), None);
    }

    #[test]
    fn test_pc_and_pass() {
        let mut ctx = Context::new();
        ctx.set_pc(0x2000);
        assert_eq!(ctx.pc(), 0x2000);
        assert!(ctx.is_first_pass());
        ctx.set_first_pass(false);
        assert!(!ctx.is_first_pass());
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = Context::new().with_rng_seed(99);
        let mut b = Context::new().with_rng_seed(99);
        for _ in 0..16 {
            assert_eq!(a.next_rand(), b.next_rand());
        }
    }

    #[test]
    fn test_random_unit_range() {
        let mut ctx = Context::new().with_rng_seed(7);
        for _ in 0..1000 {
            let x = ctx.random_unit();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_format_time() {
        let time = fixed_time();
        assert_eq!(format_time(&time, "%Y-%m-%d").unwrap(), "1997-08-29");
        assert_eq!(
            format_time(&time, "%a,%d %b %Y.%H:%M:%S").unwrap(),
            "Fri,29 Aug 1997.02:14:00"
        );
    }

    #[test]
    fn test_format_time_failures() {
        let time = fixed_time();
        assert_eq!(format_time(&time, ""), Err(ErrorKind::TimeResultTooBig));
        assert_eq!(format_time(&time, "%!"), Err(ErrorKind::TimeResultTooBig));
    }
}
