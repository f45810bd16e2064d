//! # Interest Set
//!
//! The RLD identifiers an operator wants to track, loaded once per run from a
//! newline-delimited text file.

use crate::errors::InterestSetError;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet {
    tokens: HashSet<String>,
}

impl InterestSet {
    /// Reads one identifier per line. Lines are trimmed and blank lines are
    /// ignored, so a trailing newline never adds an empty identifier.
    pub fn load(path: &Path) -> Result<Self, InterestSetError> {
        let content = fs::read_to_string(path).map_err(|source| InterestSetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_lines(&content);
        info!(
            "Loaded {} RLD identifiers from '{}'.",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn from_lines(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// True if any of `tokens` is in the set.
    pub fn matches_any(&self, tokens: &BTreeSet<String>) -> bool {
        tokens.iter().any(|t| self.contains(t))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for InterestSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_trims_and_skips_blank_lines() {
        let set = InterestSet::from_lines("12345\n  67890 \r\n\n   \nN020977\n");
        assert_eq!(set.len(), 3);
        assert!(set.contains("12345"));
        assert!(set.contains("67890"));
        assert!(set.contains("N020977"));
        assert!(!set.contains(""));
    }

    #[test]
    fn test_load_missing_file() {
        let err = InterestSet::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read RLD identifiers file"));
    }
}
