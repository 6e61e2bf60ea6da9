//! Download targets and resolved artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Arch, CloudFormat, DEFAULT_VERSION_FORMAT};

/// Identifies one artifact family on the build service.
///
/// Built once from the resolved configuration and treated as read-only for
/// the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    /// Directory URL holding the published images.
    pub base_url: String,
    /// Image name as it appears at the start of each filename.
    pub image_name: String,
    /// Requested architecture.
    pub arch: Arch,
    /// Multibuild profile, if the image is built with several.
    pub profile: Option<String>,
    /// Image file extension without the leading dot (e.g. `raw.xz`).
    pub extension: String,
    /// Checksum file extension (e.g. `sha256`).
    pub checksum_extension: String,
    /// Detached signature file extension; `None` disables signature checks.
    pub signature_extension: Option<String>,
    /// Template with `{kiwi_version}` and `{obs_build}` placeholders.
    pub version_format: String,
}

impl DownloadTarget {
    /// Target with the default arch, cloud extension and version format.
    pub fn new(base_url: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            image_name: image_name.into(),
            arch: Arch::default(),
            profile: None,
            extension: CloudFormat::default().extension().to_string(),
            checksum_extension: "sha256".to_string(),
            signature_extension: None,
            version_format: DEFAULT_VERSION_FORMAT.to_string(),
        }
    }

    /// Set the architecture.
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = arch;
        self
    }

    /// Set the multibuild profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the image file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the checksum file extension.
    pub fn with_checksum_extension(mut self, extension: impl Into<String>) -> Self {
        self.checksum_extension = extension.into();
        self
    }

    /// Enable signature verification with the given file extension.
    pub fn with_signature_extension(mut self, extension: impl Into<String>) -> Self {
        self.signature_extension = Some(extension.into());
        self
    }

    /// Set the version-format template.
    pub fn with_version_format(mut self, format: impl Into<String>) -> Self {
        self.version_format = format.into();
        self
    }

    /// URL of the directory listing, always ending in `/`.
    pub fn listing_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// URL of a file inside the listing directory.
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}{filename}", self.listing_url())
    }
}

/// The single artifact chosen for a [`DownloadTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Filename as listed remotely.
    pub filename: String,
    /// Version extracted from the `{kiwi_version}` placeholder.
    pub version: String,
    /// Build number extracted from the `{obs_build}` placeholder.
    pub build: String,
    /// Full download URL.
    pub url: String,
}

impl fmt::Display for ResolvedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} build {})", self.filename, self.version, self.build)
    }
}
