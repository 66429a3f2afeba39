//! Domain logic - version values and the rules for comparing and bumping them

pub mod level;
pub mod prerelease;
pub mod scheme;
pub mod version;

pub use level::BumpLevel;
pub use prerelease::PreRelease;
pub use scheme::{VersionScheme, DEFAULT_TAG_LITERAL};
pub use version::Version;
