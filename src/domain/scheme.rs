//! Version grammars and comparison bound to one pre-release tag literal.
//!
//! Two spellings of the same version exist:
//!
//! - canonical: `1.2.3-alpha.4`, used for comparison, git tags and
//!   canonical-grammar manifests
//! - packaging: `1.2.3alpha.4`, hyphen-free, required by packaging-grammar
//!   manifests
//!
//! [VersionScheme] converts between them and implements comparison, bumping
//! and bump distance on top of the canonical form.

use crate::domain::level::BumpLevel;
use crate::domain::prerelease::PreRelease;
use crate::domain::version::{Version, MAX_COMPONENT};
use crate::error::{BumpyError, Result};
use regex::Regex;
use std::cmp::Ordering;

/// Default pre-release tag literal
pub const DEFAULT_TAG_LITERAL: &str = "alpha";

/// Step name used by comparison errors until the caller relabels them
const COMPARISON_STEP: &str = "version check";

/// Hyphen-free packaging shorthand, e.g. `1.2.3a4` or `1.2.3rc.1`
const SHORTHAND_PATTERN: &str = r"^(\d+\.\d+\.\d+)\.?([A-Za-z]+)\.?(\d*)$";

/// Tag literal directly after the numeric core, e.g. `1.2.3alpha.4`
fn tagged_pattern(tag: &str) -> String {
    format!(r"^(\d+\.\d+\.\d+)\.?({})(.*)$", regex::escape(tag))
}

/// Increment one component, refusing to leave the comparable range
fn next_component(current: &str, value: u64) -> Result<u64> {
    value
        .checked_add(1)
        .filter(|n| *n <= MAX_COMPONENT)
        .ok_or_else(|| BumpyError::malformed(current, "version component overflows"))
}

#[derive(Debug, Clone)]
pub struct VersionScheme {
    tag: String,
    tagged: Regex,
    shorthand: Regex,
}

impl VersionScheme {
    /// Create a scheme for a pre-release tag literal
    ///
    /// The literal must be non-empty ASCII letters so it can never be
    /// confused with the numeric parts of a version.
    pub fn new(tag_literal: impl Into<String>) -> Result<Self> {
        let tag = tag_literal.into();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BumpyError::config(format!(
                "pre-release tag literal must be ASCII letters, got '{}'",
                tag
            )));
        }

        let tagged =
            Regex::new(&tagged_pattern(&tag)).map_err(|e| BumpyError::config(e.to_string()))?;
        let shorthand =
            Regex::new(SHORTHAND_PATTERN).map_err(|e| BumpyError::config(e.to_string()))?;

        Ok(VersionScheme {
            tag,
            tagged,
            shorthand,
        })
    }

    pub fn tag_literal(&self) -> &str {
        &self.tag
    }

    /// Convert a version from either grammar to the canonical grammar.
    ///
    /// A hyphen-free string whose pre-release starts with the tag literal gets
    /// a hyphen in front of the literal. Otherwise packaging shorthand such as `1.2.3a4` is
    /// expanded (`a` -> `alpha`, `b` -> `beta`, `c`/`rc` -> `rc`).
    pub fn to_canonical(&self, raw: &str) -> Result<String> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let canonical = if stripped.contains('-') {
            stripped.to_string()
        } else if let Some(caps) = self.tagged.captures(stripped) {
            format!("{}-{}{}", &caps[1], &caps[2], &caps[3])
        } else if let Some(caps) = self.shorthand.captures(stripped) {
            let identifier = match &caps[2] {
                "a" => "alpha",
                "b" => "beta",
                "c" | "rc" => "rc",
                other => other,
            };
            if caps[3].is_empty() {
                format!("{}-{}", &caps[1], identifier)
            } else {
                format!("{}-{}.{}", &caps[1], identifier, &caps[3])
            }
        } else {
            stripped.to_string()
        };

        Version::parse(&canonical).map_err(|_| {
            BumpyError::malformed(raw, "not a valid version in either grammar")
        })?;

        Ok(canonical)
    }

    /// Convert a version from either grammar to the packaging grammar by
    /// stripping hyphens.
    pub fn to_packaging(&self, raw: &str) -> Result<String> {
        let canonical = self.to_canonical(raw)?;
        Ok(canonical.replace('-', ""))
    }

    /// Parse a version from either grammar
    pub fn parse(&self, raw: &str) -> Result<Version> {
        Version::parse(&self.to_canonical(raw)?)
    }

    /// Structural ordering of two versions
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        Ok(self.parse(a)?.cmp(&self.parse(b)?))
    }

    /// True if `new` is strictly newer than `old`.
    ///
    /// # Errors
    /// * `OutdatedBump` - `new < old`
    /// * `NoVersionChange` - `new == old`
    pub fn is_newer(&self, old: &str, new: &str) -> Result<bool> {
        match self.compare(old, new)? {
            Ordering::Less => Ok(true),
            Ordering::Equal => Err(BumpyError::NoVersionChange {
                step: COMPARISON_STEP.to_string(),
                candidate: new.to_string(),
                reference: old.to_string(),
            }),
            Ordering::Greater => Err(BumpyError::OutdatedBump {
                step: COMPARISON_STEP.to_string(),
                candidate: new.to_string(),
                reference: old.to_string(),
            }),
        }
    }

    /// Next version for a bump level, in canonical form.
    ///
    /// - **Major/Minor/Patch**: increment the field, reset less significant
    ///   fields and drop any pre-release
    /// - **PreRelease**: on a release, bump the patch and start
    ///   `<tag>.1`; on a pre-release, increment its counter
    pub fn bump(&self, current: &str, level: BumpLevel) -> Result<String> {
        let version = self.parse(current)?;

        let next = match level {
            BumpLevel::Major => Version::new(next_component(current, version.major)?, 0, 0),
            BumpLevel::Minor => {
                Version::new(version.major, next_component(current, version.minor)?, 0)
            }
            BumpLevel::Patch => Version::new(
                version.major,
                version.minor,
                next_component(current, version.patch)?,
            ),
            BumpLevel::PreRelease => match &version.pre {
                Some(pre) => Version {
                    pre: Some(pre.increment().ok_or_else(|| {
                        BumpyError::malformed(current, "pre-release counter overflows")
                    })?),
                    ..version.clone()
                },
                None => Version::new(
                    version.major,
                    version.minor,
                    next_component(current, version.patch)?,
                )
                .with_pre(PreRelease::new(self.tag.as_str(), Some(1))),
            },
        };

        Ok(next.to_string())
    }

    /// Reset-aware component distance `new - old`, see [Version::delta_from]
    pub fn delta(&self, old: &str, new: &str) -> Result<[i64; 5]> {
        Ok(self.parse(new)?.delta_from(&self.parse(old)?))
    }

    /// Accept `candidate` only if it is exactly one bump level above
    /// `reference`.
    ///
    /// # Errors
    /// * `BumpLevelSize` - a delta component is negative or greater than one
    pub fn ensure_single_level(&self, reference: &str, candidate: &str) -> Result<[i64; 5]> {
        let delta = self.delta(reference, candidate)?;
        if delta.iter().any(|d| !(0..=1).contains(d)) {
            return Err(BumpyError::BumpLevelSize {
                step: COMPARISON_STEP.to_string(),
                candidate: candidate.to_string(),
                reference: reference.to_string(),
                delta,
            });
        }
        Ok(delta)
    }
}

impl Default for VersionScheme {
    fn default() -> Self {
        VersionScheme {
            tag: DEFAULT_TAG_LITERAL.to_string(),
            tagged: Regex::new(&tagged_pattern(DEFAULT_TAG_LITERAL))
                .expect("tag literal pattern is valid"),
            shorthand: Regex::new(SHORTHAND_PATTERN).expect("shorthand pattern is valid"),
        }
    }
}
