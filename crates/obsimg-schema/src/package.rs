//! Package records read from an image manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One package listed in an image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name, unique within one manifest snapshot.
    pub name: String,
    /// RPM epoch, absent for most packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<String>,
    /// Upstream version.
    pub version: String,
    /// Distribution release.
    pub release: String,
    /// Package architecture (`noarch`, `x86_64`, ...).
    pub arch: String,
    /// Build service URL the package was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disturl: Option<String>,
    /// License expression as recorded by the package.
    pub license: String,
}

impl PackageRecord {
    /// `version-release`, the form used in condition messages.
    pub fn full_version(&self) -> String {
        format!("{}-{}", self.version, self.release)
    }
}

/// Packages of one manifest snapshot keyed by name, in name order.
pub type PackageMap = BTreeMap<String, PackageRecord>;
