//! Token (named constant) tables for debug display
//!
//! Binding modules declare their constants in static [`TokenDef`] tables
//! built at compile time. [`token_map`] inverts those tables into a
//! value-to-name map so raw integers coming back from a native API can be
//! printed symbolically. Intended for debugging only.

use std::collections::HashMap;
use std::os::raw::c_int;

/// A named integer constant from a native header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDef {
    pub name: &'static str,
    pub value: c_int,
}

/// Build a map from constant value to symbolic name(s).
///
/// Multiple names sharing a value (common in X11: `None`, `RevertToNone`,
/// ... are all 0) are concatenated with `|` in table order.
pub fn token_map(tables: &[&[TokenDef]]) -> HashMap<c_int, String> {
    token_map_filtered(tables, |_| true)
}

/// Build a token map including only the definitions the filter accepts.
pub fn token_map_filtered<F>(tables: &[&[TokenDef]], filter: F) -> HashMap<c_int, String>
where
    F: Fn(&TokenDef) -> bool,
{
    let mut map: HashMap<c_int, String> = HashMap::with_capacity(64);

    for table in tables {
        for token in table.iter().filter(|t| filter(t)) {
            map.entry(token.value)
                .and_modify(|name| {
                    name.push('|');
                    name.push_str(token.name);
                })
                .or_insert_with(|| token.name.to_string());
        }
    }

    map
}

/// Format an unrecognized token value for debug output
pub fn unknown_token(token: c_int) -> String {
    describe_token("Unknown", token)
}

/// Format a token value with a description, e.g. `"Unknown [0x1F]"`
pub fn describe_token(description: &str, token: c_int) -> String {
    format!("{} [0x{:X}]", description, token)
}
