//! Authenticated principal attributed to a commit.
//!
//! Authentication itself happens upstream (gateway verifies the token and
//! forwards the resolved identity). This core only records who committed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap a non-empty identity string. Returns `None` for empty/whitespace input.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_identity() {
        assert!(Principal::new("").is_none());
        assert!(Principal::new("   ").is_none());
    }

    #[test]
    fn test_serde_transparent() {
        let p = Principal::new("user-42").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"user-42\"");
        let back: Principal = serde_json::from_str("\"user-42\"").unwrap();
        assert_eq!(back, p);
    }
}
