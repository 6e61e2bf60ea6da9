//! Picks the newest artifact for a [`DownloadTarget`] out of a listing.
//!
//! Filenames follow `<image>.<arch>-[<profile>-]<version part>.<extension>`
//! where the version part is the version-format template rendered with its
//! `{kiwi_version}` and `{obs_build}` placeholders. The template is compiled
//! into an anchored regex and run in reverse to pull both values back out.

use std::cmp::Ordering;

use obsimg_schema::version::compare_versions;
use obsimg_schema::{BUILD_PLACEHOLDER, DownloadTarget, ResolvedArtifact, VERSION_PLACEHOLDER};
use regex::Regex;
use tracing::{debug, trace};

use crate::ResolveError;

/// Dotted numeric token such as `15.6.0` or `3.12`.
const NUMERIC_TOKEN: &str = r"\d+(?:\.\d+)*";

/// Compiled reverse-matcher for one target's filenames.
#[derive(Debug, Clone)]
pub struct VersionTemplate {
    regex: Regex,
    prefix: String,
    suffix: String,
    profile: Option<String>,
}

impl VersionTemplate {
    /// Compile the matcher for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] if the template does not contain each
    /// placeholder exactly once.
    pub fn compile(target: &DownloadTarget) -> Result<Self, ResolveError> {
        let template = &target.version_format;
        for placeholder in [VERSION_PLACEHOLDER, BUILD_PLACEHOLDER] {
            let count = template.matches(placeholder).count();
            if count != 1 {
                return Err(ResolveError::Config(format!(
                    "version format '{template}' must contain {placeholder} exactly once (found {count})"
                )));
            }
        }

        let version_part = regex::escape(template)
            .replace(
                &regex::escape(VERSION_PLACEHOLDER),
                &format!("(?P<version>{NUMERIC_TOKEN})"),
            )
            .replace(
                &regex::escape(BUILD_PLACEHOLDER),
                &format!("(?P<build>{NUMERIC_TOKEN})"),
            );

        let prefix = format!("{}.{}-", target.image_name, target.arch);
        let suffix = format!(".{}", target.extension);
        let profile = target.profile.as_ref().map(|p| format!("{p}-"));

        let pattern = format!(
            "^{}{}{version_part}{}$",
            regex::escape(&prefix),
            profile.as_deref().map(regex::escape).unwrap_or_default(),
            regex::escape(&suffix),
        );
        trace!("filename pattern: {pattern}");

        let regex = Regex::new(&pattern)
            .map_err(|e| ResolveError::Config(format!("invalid version format: {e}")))?;

        Ok(Self {
            regex,
            prefix,
            suffix,
            profile,
        })
    }

    /// Cheap pre-filter on architecture, extension and profile.
    pub fn targets(&self, filename: &str) -> bool {
        filename.starts_with(&self.prefix)
            && filename.ends_with(&self.suffix)
            && self.profile.as_ref().is_none_or(|p| {
                filename[self.prefix.len()..].starts_with(p.as_str())
            })
    }

    /// Extract `(version, build)` from a filename, or `None` if it does not
    /// follow the template.
    pub fn extract(&self, filename: &str) -> Option<(String, String)> {
        let caps = self.regex.captures(filename)?;
        Some((
            caps.name("version")?.as_str().to_string(),
            caps.name("build")?.as_str().to_string(),
        ))
    }

    /// Human readable pattern for error messages.
    pub fn describe(&self) -> String {
        format!(
            "{}{}<version>...{}",
            self.prefix,
            self.profile.as_deref().unwrap_or_default(),
            self.suffix
        )
    }
}

/// Select the artifact with the highest `(version, build)` among `entries`.
///
/// Entries for another architecture, extension or profile, and entries not
/// following the version template, are skipped. Exact ties on
/// `(version, build)` go to the lexicographically smallest filename.
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] if no entry survives, or
/// [`ResolveError::Config`] for an unusable template.
pub fn resolve(entries: &[String], target: &DownloadTarget) -> Result<ResolvedArtifact, ResolveError> {
    let template = VersionTemplate::compile(target)?;

    let best = entries
        .iter()
        .filter(|name| template.targets(name))
        .filter_map(|name| match template.extract(name) {
            Some((version, build)) => Some((name, version, build)),
            None => {
                trace!("Skipping non-matching entry: {name}");
                None
            }
        })
        .max_by(|(name_a, ver_a, build_a), (name_b, ver_b, build_b)| {
            rank(ver_a, build_a, name_a, ver_b, build_b, name_b)
        });

    let Some((filename, version, build)) = best else {
        return Err(ResolveError::NotFound {
            url: target.listing_url(),
            pattern: template.describe(),
        });
    };

    debug!("Resolved {filename} (version {version}, build {build})");

    Ok(ResolvedArtifact {
        url: target.file_url(filename),
        filename: filename.clone(),
        version,
        build,
    })
}

/// Version first, then build; on an exact tie the smaller filename ranks higher.
fn rank(
    ver_a: &str,
    build_a: &str,
    name_a: &str,
    ver_b: &str,
    build_b: &str,
    name_b: &str,
) -> Ordering {
    compare_versions(ver_a, ver_b)
        .then_with(|| compare_versions(build_a, build_b))
        .then_with(|| name_b.cmp(name_a))
}
