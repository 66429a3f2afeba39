//! Pre-release component of a version
//!
//! A pre-release is an identifier with an optional counter. The canonical
//! grammar writes it as `alpha.1`; the packaging grammar drops separators and
//! may write `alpha1`. Both spellings parse to the same value.

use crate::domain::version::MAX_COMPONENT;
use crate::error::{BumpyError, Result};
use std::fmt;

/// Pre-release with optional counter
///
/// # Examples
/// - "alpha" -> PreRelease { identifier: "alpha", number: None }
/// - "alpha.1" -> PreRelease { identifier: "alpha", number: Some(1) }
/// - "rc3" -> PreRelease { identifier: "rc", number: Some(3) }
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    /// Alphabetic identifier, e.g. `alpha`
    pub identifier: String,
    /// Counter incremented on every pre-release bump
    pub number: Option<u64>,
}

impl PreRelease {
    /// Create a new pre-release
    pub fn new(identifier: impl Into<String>, number: Option<u64>) -> Self {
        PreRelease {
            identifier: identifier.into(),
            number,
        }
    }

    /// Parse a pre-release from either grammar
    ///
    /// Accepts `alpha`, `alpha.1` and `alpha1`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(BumpyError::malformed(s, "empty pre-release identifier"));
        }

        let (identifier, digits) = match s.split_once('.') {
            Some((ident, rest)) => (ident, rest),
            None => {
                let split = s
                    .find(|c: char| c.is_ascii_digit())
                    .unwrap_or(s.len());
                (&s[..split], &s[split..])
            }
        };

        if identifier.is_empty() || !identifier.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BumpyError::malformed(
                s,
                format!("invalid pre-release identifier '{}'", identifier),
            ));
        }

        let number = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<u64>().map_err(|_| {
                BumpyError::malformed(s, format!("invalid pre-release number '{}'", digits))
            })?)
        };

        Ok(PreRelease::new(identifier, number))
    }

    /// Next counter value; a missing counter starts at 1.
    ///
    /// `None` when the counter is already at its maximum.
    pub fn increment(&self) -> Option<Self> {
        let next = match self.number {
            Some(n) => n.checked_add(1).filter(|n| *n <= MAX_COMPONENT)?,
            None => 1,
        };
        Some(PreRelease {
            identifier: self.identifier.clone(),
            number: Some(next),
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(n) = self.number {
            write!(f, ".{}", n)?;
        }
        Ok(())
    }
}
