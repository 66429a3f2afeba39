use crate::error::{BumpyError, Result};
use std::fmt;
use std::str::FromStr;

/// Granularity of a version increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
    PreRelease,
}

impl BumpLevel {
    pub const ALL: [BumpLevel; 4] = [
        BumpLevel::Major,
        BumpLevel::Minor,
        BumpLevel::Patch,
        BumpLevel::PreRelease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpLevel::Major => "major",
            BumpLevel::Minor => "minor",
            BumpLevel::Patch => "patch",
            BumpLevel::PreRelease => "pre-release",
        }
    }

    /// Find a `[major]`, `[minor]`, `[patch]`, `[pre-release]` or `[pre]`
    /// marker in a commit message.
    ///
    /// Markers are checked from most to least significant.
    pub fn from_commit_message(message: &str) -> Result<Self> {
        let lower = message.to_lowercase();
        for level in BumpLevel::ALL {
            if lower.contains(&format!("[{}]", level.as_str())) {
                return Ok(level);
            }
        }
        if lower.contains("[pre]") {
            return Ok(BumpLevel::PreRelease);
        }

        Err(BumpyError::InvalidBumpLevel(format!(
            "no bump marker in commit message \"{}\"",
            message.trim()
        )))
    }
}

impl FromStr for BumpLevel {
    type Err = BumpyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(BumpLevel::Major),
            "minor" => Ok(BumpLevel::Minor),
            "patch" => Ok(BumpLevel::Patch),
            "pre-release" | "pre" => Ok(BumpLevel::PreRelease),
            _ => Err(BumpyError::InvalidBumpLevel(s.to_string())),
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
