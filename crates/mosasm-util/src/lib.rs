//! mosasm-util - Shared leaf types for the assembler.
//!
//! This crate holds the pieces every other mosasm crate needs:
//! - `span` - source position tracking for error reporting
//! - `error` - the expression engine error taxonomy
//! - `fmt` - the canonical number printer

pub mod error;
pub mod fmt;
pub mod span;

pub use error::{ErrorKind, ExprError, ExprResult};
pub use fmt::format_number;
pub use span::Span;
