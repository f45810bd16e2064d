//! # Identifier Normalization
//!
//! Turns a raw `RLD or RS Number` value into the token set used for interest
//! matching, tagged with the kind of the original value.

use crate::types::{RldKind, RldValue};
use std::collections::BTreeSet;

/// The tokens extracted from one raw identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub tokens: BTreeSet<String>,
    pub kind: RldKind,
}

/// Normalizes a raw identifier. Total: every value yields at least one token.
///
/// A string containing a space is split on single spaces and each piece is
/// trimmed. Empty pieces (from doubled spaces) are kept as empty tokens. A
/// string without a space is used as-is, untrimmed.
pub fn normalize(raw: &RldValue) -> Normalized {
    let tokens = match raw {
        RldValue::Str(s) if s.contains(' ') => {
            s.split(' ').map(|piece| piece.trim().to_string()).collect()
        }
        RldValue::Str(s) => BTreeSet::from([s.clone()]),
        RldValue::Int(_) | RldValue::Null => BTreeSet::from([raw.to_string()]),
    };
    Normalized {
        tokens,
        kind: raw.kind(),
    }
}
