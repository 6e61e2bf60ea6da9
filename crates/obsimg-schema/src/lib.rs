//! Shared types for the OBS image resolver.
//!
//! Everything in this crate is plain data: the description of which image
//! family to fetch ([`DownloadTarget`]), the single artifact chosen for it
//! ([`ResolvedArtifact`]), the package records read from its manifest
//! ([`PackageRecord`]), readiness [`Condition`]s and [`FilterSpec`]s.
//! Network access and verification live in `obsimg-core`.

pub mod arch;
pub mod cloud;
pub mod condition;
pub mod filter;
pub mod package;
pub mod target;
pub mod version;

// Re-exports
pub use arch::*;
pub use cloud::CloudFormat;
pub use condition::{Comparison, Condition, ConditionParseError, ImageCondition, PackageCondition};
pub use filter::FilterSpec;
pub use package::{PackageMap, PackageRecord};
pub use target::{DownloadTarget, ResolvedArtifact};

/// Placeholder for the image version inside a version-format template.
pub const VERSION_PLACEHOLDER: &str = "{kiwi_version}";

/// Placeholder for the build number inside a version-format template.
pub const BUILD_PLACEHOLDER: &str = "{obs_build}";

/// Template used when none is configured, e.g. `1.2.3-Build4.5`.
pub const DEFAULT_VERSION_FORMAT: &str = "{kiwi_version}-Build{obs_build}";
