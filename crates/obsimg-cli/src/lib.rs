//! obs-img - Open Build Service image utilities
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Downloads the newest build of an image published on the Open Build
//! Service, optionally waiting until its packages meet a set of conditions,
//! and lists or shows the packages an image ships.
//!
//! # Configuration
//!
//! ```text
//! ~/.config/obs-img/config.toml   # defaults for every shared option
//! ```
//!
//! Command-line flags win over the file, the file wins over built-in
//! defaults.

pub mod cmd;
pub mod config;
pub mod input;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// License of the tool, printed by `--license`.
pub const LICENSE: &str = "GPLv3+";

#[derive(Debug, Parser)]
#[command(name = "obs-img")]
#[command(author, version, about = "Download and inspect images published on the Open Build Service")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Show license information
    #[arg(long)]
    pub license: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download the newest image from the build service
    Download(DownloadArgs),
    /// Inspect the packages of the newest image
    Packages {
        #[command(subcommand)]
        command: PackageCommands,
    },
}

impl Commands {
    pub fn shared(&self) -> &SharedArgs {
        match self {
            Self::Download(args) => &args.shared,
            Self::Packages { command } => command.shared(),
        }
    }
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Interactively enter conditions the image must meet
    #[arg(long)]
    pub conditions: bool,

    /// Condition as name<op>version[-release], e.g. kernel-default>=5.14
    #[arg(long = "condition", value_name = "SPEC")]
    pub condition: Vec<String>,

    /// JSON or TOML file holding a list of conditions
    #[arg(long, value_name = "PATH")]
    pub conditions_file: Option<PathBuf>,

    /// Seconds to wait for conditions to be met; retry period is 150 seconds
    #[arg(long, value_name = "SECS")]
    pub conditions_wait_time: Option<u64>,

    /// Do not fetch or check the checksum and signature
    #[arg(long)]
    pub skip_verify: bool,

    /// Refuse images containing a package under this license
    #[arg(long = "disallow-license", value_name = "LICENSE")]
    pub disallow_licenses: Vec<String>,

    /// Refuse images containing a package matching this pattern (`*` wildcard)
    #[arg(long = "disallow-package", value_name = "PATTERN")]
    pub disallow_packages: Vec<String>,

    /// Interactively enter disallowed licenses and package patterns
    #[arg(long)]
    pub disallow: bool,

    #[command(flatten)]
    pub shared: SharedArgs,
}

#[derive(Debug, Subcommand)]
pub enum PackageCommands {
    /// List the packages of the image
    List {
        /// Only show packages under this license
        #[arg(long = "license", value_name = "LICENSE")]
        licenses: Vec<String>,

        /// Only show packages matching this pattern (`*` wildcard)
        #[arg(long = "name", value_name = "PATTERN")]
        names: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },
    /// Show one package of the image
    Show {
        /// Name of the package
        #[arg(long)]
        package_name: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },
}

impl PackageCommands {
    pub fn shared(&self) -> &SharedArgs {
        match self {
            Self::List { shared, .. } | Self::Show { shared, .. } => shared,
        }
    }
}

/// Options accepted by every command.
#[derive(Debug, Clone, Args)]
pub struct SharedArgs {
    /// Config file to use (default: ~/.config/obs-img/config.toml)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remove ANSI color and styling from output
    #[arg(long)]
    pub no_color: bool,

    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Build service download URL
    #[arg(long, value_name = "URL")]
    pub download_url: Option<String>,

    /// Directory to store downloaded images and checksums
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Image name as it appears in the download URL listing
    #[arg(long)]
    pub image_name: String,

    /// Cloud framework of the image (ec2, azure, gce, oci, aliyun)
    #[arg(long)]
    pub cloud: Option<String>,

    /// Image file extension, overrides the one implied by --cloud
    #[arg(long)]
    pub extension: Option<String>,

    /// Architecture of the image (x86_64, aarch64)
    #[arg(long)]
    pub arch: Option<String>,

    /// Multibuild profile of the image
    #[arg(long)]
    pub profile: Option<String>,

    /// Version format containing {kiwi_version} and {obs_build}
    #[arg(long)]
    pub version_format: Option<String>,

    /// Checksum file extension (sha256, sha512)
    #[arg(long)]
    pub checksum_extension: Option<String>,

    /// Detached signature file extension; enables signature checks
    #[arg(long)]
    pub signature_extension: Option<String>,
}

/// Console log level flags; at most one may be given.
#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct Verbosity {
    /// Display debug level logging
    #[arg(long)]
    pub debug: bool,

    /// Display info level logging (default)
    #[arg(long)]
    pub verbose: bool,

    /// Only display warnings and errors
    #[arg(long)]
    pub quiet: bool,
}

impl Verbosity {
    /// Level selected on the command line, if any.
    pub fn level(self) -> Option<&'static str> {
        if self.debug {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else if self.verbose {
            Some("info")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "obs-img",
            "packages",
            "list",
            "--image-name",
            "Leap",
            "--debug",
            "--quiet",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn download_collects_repeated_options() {
        let cli = Cli::try_parse_from([
            "obs-img",
            "download",
            "--image-name",
            "Leap",
            "--condition",
            "bash>=5",
            "--condition",
            "kernel-default",
            "--disallow-package",
            "*-devel",
            "--debug",
        ])
        .unwrap();

        let Some(Commands::Download(args)) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.condition, vec!["bash>=5", "kernel-default"]);
        assert_eq!(args.disallow_packages, vec!["*-devel"]);
        assert_eq!(args.shared.verbosity.level(), Some("debug"));
        assert_eq!(args.shared.image_name, "Leap");
    }
}
