//! Image architectures.

/// CPU architecture of an image.
///
/// The build service encodes the architecture directly in artifact
/// filenames (`<image>.<arch>-<version>...`), so [`Arch::as_str`] is the
/// exact token searched for during resolution.
///
/// # Example
///
/// ```
/// use obsimg_schema::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch.as_str(), "aarch64");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// Intel/AMD 64-bit
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    /// ARM 64-bit
    Aarch64,
}

impl Arch {
    /// Convert to the filename token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}
