//! Symbol name scanning.
//!
//! Symbol names start with a letter or underscore and continue with
//! letters, digits, and underscores. In the BBC tradition a name may end
//! with a single `$` (string) or `%` (integer) sigil, which is part of
//! the name: `TIME$` and `P%` are complete symbols.

use crate::cursor::LineCursor;

/// Returns true if `byte` can start a symbol name.
#[inline]
pub fn is_symbol_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

/// Consumes a symbol name at the cursor.
///
/// # Returns
///
/// The name, or `None` with the cursor unmoved when the byte at the
/// cursor cannot start a name.
pub fn get_symbol_name(cursor: &mut LineCursor<'_>) -> Option<String> {
    if !cursor.peek().is_some_and(is_symbol_start) {
        return None;
    }

    let start = cursor.position();
    cursor.step();
    while let Some(byte) = cursor.peek() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            cursor.step();
        } else {
            break;
        }
    }
    if matches!(cursor.peek(), Some(b'$') | Some(b'%')) {
        cursor.step();
    }

    // names are scanned from ASCII classes only
    Some(String::from_utf8_lossy(cursor.slice_from(start)).into_owned())
}
