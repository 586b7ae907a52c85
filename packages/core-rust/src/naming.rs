//! Script-visible naming of host members.

use serde::{Deserialize, Serialize};

/// How declared member names are turned into script-visible names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingConvention {
    /// `get_value` and `GetValue` both become `getValue`.
    #[default]
    CamelCase,
    /// Names are exposed exactly as declared.
    AsDeclared,
}

impl NamingConvention {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingConvention::CamelCase => to_camel_case(name),
            NamingConvention::AsDeclared => name.to_string(),
        }
    }
}

/// Converts a declared name to lower camel case.
///
/// The first character is lowercased; each `_` separator is dropped and the
/// character after it uppercased. A leading underscore is kept.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for ch in name.chars() {
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}
