//! Cloud frameworks and their image file formats.

use serde::{Deserialize, Serialize};

/// Cloud framework an image is built for.
///
/// Each framework publishes its images in one file format, which decides the
/// file extension searched for in the remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CloudFormat {
    /// Amazon EC2 (`raw.xz`).
    #[default]
    Ec2,
    /// Microsoft Azure (`vhdfixed.xz`).
    Azure,
    /// Google Compute Engine (`tar.gz`).
    Gce,
    /// Oracle Cloud Infrastructure (`qcow2`).
    Oci,
    /// Alibaba Cloud (`qcow2`).
    Aliyun,
}

impl CloudFormat {
    /// All frameworks, in the order shown to users.
    pub const ALL: [CloudFormat; 5] = [
        CloudFormat::Ec2,
        CloudFormat::Azure,
        CloudFormat::Gce,
        CloudFormat::Oci,
        CloudFormat::Aliyun,
    ];

    /// File extension of images built for this framework.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ec2 => "raw.xz",
            Self::Azure => "vhdfixed.xz",
            Self::Gce => "tar.gz",
            Self::Oci | Self::Aliyun => "qcow2",
        }
    }

    /// Lowercase framework name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ec2 => "ec2",
            Self::Azure => "azure",
            Self::Gce => "gce",
            Self::Oci => "oci",
            Self::Aliyun => "aliyun",
        }
    }
}

impl std::fmt::Display for CloudFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CloudFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown cloud framework: {s}"))
    }
}
