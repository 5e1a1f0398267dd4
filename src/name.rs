//! Symbol name syntax and address-derived default names.
//!
//! Default names look like `LAB_00401000`: a reserved prefix, an underscore, and
//! the hex offset of the symbol's address. User-chosen names may not take that
//! form, otherwise a renamed symbol could collide with the name some dynamic
//! symbol computes on demand.

use crate::address::Address;
use crate::error::{SymbolError, SymbolResult};

/// Separator between namespace path elements.
pub const NAMESPACE_DELIMITER: &str = "::";

/// Prefixes reserved for address-derived names.
pub const DYNAMIC_PREFIXES: [&str; 8] = ["LAB", "FUN", "SUB", "DAT", "EXT", "UNK", "OFF", "PTR"];

/// Render the default name `<prefix>_<hex offset>` for an address.
pub fn default_name(prefix: &str, address: Address) -> String {
    format!("{prefix}_{}", address.hex_offset())
}

/// Whether `name` has the reserved `<PREFIX>_<hex>` shape.
pub fn is_dynamic_form(name: &str) -> bool {
    let Some((prefix, digits)) = name.split_once('_') else {
        return false;
    };
    DYNAMIC_PREFIXES.contains(&prefix)
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check the syntax of a user-supplied name.
pub fn validate_name(name: &str, max_len: usize) -> SymbolResult<()> {
    if name.is_empty() {
        return Err(SymbolError::invalid_input("symbol name may not be empty"));
    }
    if name.chars().count() > max_len {
        return Err(SymbolError::invalid_input(format!(
            "symbol name exceeds {max_len} characters"
        )));
    }
    if let Some(bad) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(SymbolError::invalid_input(format!(
            "symbol name \"{}\" contains invalid character {bad:?}",
            name.escape_default()
        )));
    }
    if is_dynamic_form(name) {
        return Err(SymbolError::invalid_input(format!(
            "\"{name}\" is reserved for address-derived default names"
        )));
    }
    Ok(())
}
