//! core::identity
//!
//! Canonical form for maintainer identities.
//!
//! # Normalization
//!
//! Every comparison between a registered maintainer and an external team
//! member goes through [`normalize`]. The rule is deliberately small:
//!
//! - leading and trailing whitespace is trimmed
//! - ASCII letters are lower-cased (e-mail addresses are assumed to be
//!   ASCII-representable; Unicode case folding is not attempted)
//! - empty or all-whitespace input is rejected with
//!   [`IdentityError::InvalidIdentity`]
//!
//! Callers that drop invalid identities are expected to count the drops
//! (see [`crate::reconcile::sets`]).
//!
//! # Example
//!
//! ```
//! use maintainerd::core::identity::normalize;
//!
//! let a = normalize(" Alice@Example.ORG ").unwrap();
//! let b = normalize("alice@example.org").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "alice@example.org");
//!
//! assert!(normalize("   ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from identity normalization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The raw identity was empty or contained only whitespace.
    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),
}

/// An identity in canonical comparable form.
///
/// Holds a trimmed, ASCII-lower-cased, non-empty string. Ordering is the
/// lexicographic ordering of that string, which is what reconciliation
/// output is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedIdentity(String);

impl NormalizedIdentity {
    /// Get the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NormalizedIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NormalizedIdentity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize(&value)
    }
}

impl From<NormalizedIdentity> for String {
    fn from(identity: NormalizedIdentity) -> Self {
        identity.0
    }
}

/// Normalize a raw identity (e-mail address or account handle).
///
/// # Errors
///
/// Returns [`IdentityError::InvalidIdentity`] when the input is empty after
/// trimming.
pub fn normalize(raw: &str) -> Result<NormalizedIdentity, IdentityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::InvalidIdentity(raw.to_string()));
    }
    Ok(NormalizedIdentity(trimmed.to_ascii_lowercase()))
}
