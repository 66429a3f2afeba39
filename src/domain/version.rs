use crate::domain::prerelease::PreRelease;
use crate::error::{BumpyError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Largest value a version component may hold, so the numeric tuple fits in `i64`
pub const MAX_COMPONENT: u64 = i64::MAX as u64;

/// Structured version: major.minor.patch with an optional pre-release
///
/// Ordering is numeric per component, and a release sorts after any of its
/// pre-releases (`1.2.3-alpha.1 < 1.2.3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
}

impl Version {
    /// Create a release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Attach a pre-release component
    pub fn with_pre(mut self, pre: PreRelease) -> Self {
        self.pre = Some(pre);
        self
    }

    /// Parse the canonical grammar (`1.2.3`, `1.2.3-alpha.4`, `1.2.3-alpha4`)
    pub fn parse(s: &str) -> Result<Self> {
        let parsed =
            semver::Version::parse(s).map_err(|e| BumpyError::malformed(s, e.to_string()))?;

        if !parsed.build.is_empty() {
            return Err(BumpyError::malformed(s, "build metadata is not supported"));
        }

        let pre = if parsed.pre.is_empty() {
            None
        } else {
            Some(PreRelease::parse(parsed.pre.as_str())?)
        };

        let counter = pre.as_ref().and_then(|p| p.number).unwrap_or(0);
        if [parsed.major, parsed.minor, parsed.patch, counter]
            .iter()
            .any(|&c| c > MAX_COMPONENT)
        {
            return Err(BumpyError::malformed(
                s,
                format!("components must not exceed {}", MAX_COMPONENT),
            ));
        }

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre,
        })
    }

    /// Numeric 5-tuple: major, minor, patch, pre-release kind, pre-release number
    ///
    /// A missing pre-release contributes `0, 0`; a present one contributes a
    /// kind of `1` and its counter (or `0`). Values above [MAX_COMPONENT]
    /// saturate.
    pub fn components(&self) -> [i64; 5] {
        let clamp = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        let (kind, number) = match &self.pre {
            Some(pre) => (1, clamp(pre.number.unwrap_or(0))),
            None => (0, 0),
        };
        [
            clamp(self.major),
            clamp(self.minor),
            clamp(self.patch),
            kind,
            number,
        ]
    }

    /// Component-wise distance from `old` to `self`
    ///
    /// Once a component differs, every less significant component is measured
    /// from zero, because an increment resets them. `1.2.3 -> 1.3.0` is
    /// therefore `[0, 1, 0, 0, 0]`.
    pub fn delta_from(&self, old: &Version) -> [i64; 5] {
        let new = self.components();
        let old = old.components();
        let mut delta = [0; 5];
        let mut reset = false;
        for i in 0..5 {
            delta[i] = if reset { new[i] } else { new[i] - old[i] };
            if delta[i] != 0 {
                reset = true;
            }
        }
        delta
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_pre_release() {
        let v = Version::parse("1.2.3-alpha.4").unwrap();
        assert_eq!(
            v,
            Version::new(1, 2, 3).with_pre(PreRelease::new("alpha", Some(4)))
        );
        assert_eq!(v, Version::parse("1.2.3-alpha4").unwrap());
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("1.2.3alpha1").is_err());
        assert!(Version::parse("1.2.3+build5").is_err());
        assert!(Version::parse("latest").is_err());
    }

    #[test]
    fn test_version_parse_rejects_oversized_components() {
        assert!(Version::parse("9223372036854775807.0.0").is_ok());
        assert!(matches!(
            Version::parse("18446744073709551615.0.0"),
            Err(BumpyError::MalformedVersion { .. })
        ));
        assert!(Version::parse("1.0.0-alpha.9223372036854775808").is_err());
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        assert!(Version::parse("1.10.0").unwrap() > Version::parse("1.9.0").unwrap());
        assert!(
            Version::parse("1.0.0-alpha.10").unwrap() > Version::parse("1.0.0-alpha.9").unwrap()
        );
    }

    #[test]
    fn test_release_after_pre_release() {
        assert!(Version::parse("1.2.3").unwrap() > Version::parse("1.2.3-alpha.7").unwrap());
        assert!(Version::parse("1.2.4-alpha.1").unwrap() > Version::parse("1.2.3").unwrap());
    }

    #[test]
    fn test_components() {
        assert_eq!(Version::parse("1.2.3").unwrap().components(), [1, 2, 3, 0, 0]);
        assert_eq!(
            Version::parse("1.2.3-alpha.4").unwrap().components(),
            [1, 2, 3, 1, 4]
        );
        assert_eq!(
            Version::parse("1.2.3-rc").unwrap().components(),
            [1, 2, 3, 1, 0]
        );
    }

    #[test]
    fn test_delta_resets_lower_components() {
        let old = Version::parse("1.2.3-alpha.2").unwrap();
        assert_eq!(
            Version::parse("1.3.0").unwrap().delta_from(&old),
            [0, 1, 0, 0, 0]
        );
        assert_eq!(
            Version::parse("2.0.0").unwrap().delta_from(&old),
            [1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_delta_pre_release_from_release() {
        let old = Version::parse("1.2.3").unwrap();
        assert_eq!(
            Version::parse("1.2.4-alpha.1").unwrap().delta_from(&old),
            [0, 0, 1, 1, 1]
        );
    }

    #[test]
    fn test_delta_negative_on_regression() {
        let old = Version::parse("2.0.0").unwrap();
        assert_eq!(
            Version::parse("1.9.0").unwrap().delta_from(&old),
            [-1, 9, 0, 0, 0]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::parse("1.2.3-alpha4").unwrap().to_string(), "1.2.3-alpha.4");
        assert_eq!(Version::new(0, 1, 0).to_string(), "0.1.0");
    }
}
