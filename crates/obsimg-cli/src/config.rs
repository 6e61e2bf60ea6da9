//! Config file loading and option merging.
//!
//! Every shared option can also be set in a TOML file. Values are merged
//! once, flag over file over default, into an immutable [`Settings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use obsimg_core::{ResolveError, ResolverConfig};
use obsimg_schema::{Arch, CloudFormat, DEFAULT_VERSION_FORMAT, DownloadTarget};
use serde::Deserialize;

use crate::SharedArgs;

/// Directory listing used when neither flag nor file names one.
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://download.opensuse.org/repositories/Cloud:/Images:/Leap_15.6/images/";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub download_url: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub cloud: Option<String>,
    pub arch: Option<String>,
    pub profile: Option<String>,
    pub version_format: Option<String>,
    pub checksum_extension: Option<String>,
    pub signature_extension: Option<String>,
    /// Base64 ed25519 key of the build service.
    pub public_key: Option<String>,
    pub no_color: Option<bool>,
    pub log_level: Option<String>,
    pub conditions_wait_time: Option<u64>,
}

impl FileConfig {
    /// `<config_dir>/obs-img/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("obs-img").join("config.toml"))
    }

    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load `explicit` if given (it must exist), otherwise the default file
    /// if present, otherwise an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file {} does not exist", path.display());
            }
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Merged options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target: DownloadTarget,
    pub download_dir: PathBuf,
    pub public_key: Option<String>,
    pub no_color: bool,
    pub log_level: String,
    pub conditions_wait: Duration,
}

impl Settings {
    /// Read the config file named by `shared` and merge it with the flags.
    pub fn load(shared: &SharedArgs) -> Result<Self> {
        let file = FileConfig::discover(shared.config.as_deref())?;
        Ok(Self::merge(shared, file)?)
    }

    /// Merge flags over `file` over built-in defaults.
    pub fn merge(shared: &SharedArgs, file: FileConfig) -> Result<Self, ResolveError> {
        let download_url = shared
            .download_url
            .clone()
            .or(file.download_url)
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string());

        let cloud: CloudFormat = match shared.cloud.as_ref().or(file.cloud.as_ref()) {
            Some(name) => name.parse().map_err(ResolveError::Config)?,
            None => CloudFormat::default(),
        };
        let arch: Arch = match shared.arch.as_ref().or(file.arch.as_ref()) {
            Some(name) => name.parse().map_err(ResolveError::Config)?,
            None => Arch::default(),
        };

        let mut target = DownloadTarget::new(download_url, shared.image_name.clone())
            .with_arch(arch)
            .with_extension(
                shared
                    .extension
                    .clone()
                    .unwrap_or_else(|| cloud.extension().to_string()),
            )
            .with_version_format(
                shared
                    .version_format
                    .clone()
                    .or(file.version_format)
                    .unwrap_or_else(|| DEFAULT_VERSION_FORMAT.to_string()),
            );
        if let Some(profile) = shared.profile.clone().or(file.profile) {
            target = target.with_profile(profile);
        }
        if let Some(ext) = shared.checksum_extension.clone().or(file.checksum_extension) {
            target = target.with_checksum_extension(ext);
        }
        if let Some(ext) = shared.signature_extension.clone().or(file.signature_extension) {
            target = target.with_signature_extension(ext);
        }

        let download_dir = shared
            .download_dir
            .clone()
            .or(file.download_dir)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let log_level = shared
            .verbosity
            .level()
            .map(str::to_string)
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            target,
            download_dir,
            public_key: file.public_key,
            no_color: shared.no_color || file.no_color.unwrap_or(false),
            log_level,
            conditions_wait: Duration::from_secs(file.conditions_wait_time.unwrap_or(0)),
        })
    }

    /// True when only warnings and errors should reach the console.
    pub fn is_quiet(&self) -> bool {
        matches!(self.log_level.as_str(), "warn" | "error" | "off")
    }

    /// Resolver configuration with no conditions or filters yet.
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::new(self.target.clone(), self.download_dir.clone());
        config.conditions_wait = self.conditions_wait;
        config.public_key.clone_from(&self.public_key);
        config
    }
}
