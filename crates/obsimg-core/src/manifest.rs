//! Package manifest (`.packages`) parsing.
//!
//! One package per line, seven pipe-delimited fields:
//!
//! ```text
//! name|epoch|version|release|arch|disturl|license
//! ```
//!
//! Epoch and disturl are often empty (or `(none)`); both are kept so a
//! parsed manifest serializes back to the same records.

use obsimg_schema::{DownloadTarget, PackageMap, PackageRecord, ResolvedArtifact};
use tracing::warn;

use crate::ResolveError;

const FIELD_COUNT: usize = 7;
const MANIFEST_EXTENSION: &str = "packages";

/// Name of the manifest published next to `artifact`.
pub fn manifest_filename(artifact: &ResolvedArtifact, target: &DownloadTarget) -> String {
    let stem = artifact
        .filename
        .strip_suffix(&format!(".{}", target.extension))
        .unwrap_or(&artifact.filename);
    format!("{stem}.{MANIFEST_EXTENSION}")
}

/// Parse manifest bytes into a map keyed by package name.
///
/// Blank lines are ignored. If a name appears twice the later line wins.
///
/// # Errors
///
/// Returns [`ResolveError::Parse`] naming the offending line when the
/// manifest is not UTF-8, a line has fewer than seven fields, or a
/// required field is empty.
pub fn parse(manifest: &[u8]) -> Result<PackageMap, ResolveError> {
    let text = std::str::from_utf8(manifest).map_err(|e| ResolveError::parse("manifest", e))?;

    let mut packages = PackageMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(line)
            .map_err(|msg| ResolveError::parse(format!("manifest line {}", idx + 1), format!("{msg}: '{line}'")))?;

        if let Some(previous) = packages.insert(record.name.clone(), record) {
            warn!(
                "Duplicate package '{}' in manifest (line {}), keeping the later entry",
                previous.name,
                idx + 1
            );
        }
    }

    Ok(packages)
}

fn parse_line(line: &str) -> Result<PackageRecord, String> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, '|').collect();
    let [name, epoch, version, release, arch, disturl, license] = fields.as_slice() else {
        return Err(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        ));
    };

    for (field, value) in [("name", name), ("version", version), ("arch", arch)] {
        if value.trim().is_empty() {
            return Err(format!("empty {field}"));
        }
    }

    Ok(PackageRecord {
        name: name.trim().to_string(),
        epoch: optional(epoch),
        version: version.trim().to_string(),
        release: release.trim().to_string(),
        arch: arch.trim().to_string(),
        disturl: optional(disturl),
        license: license.trim().to_string(),
    })
}

fn optional(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field == "(none)" {
        None
    } else {
        Some(field.to_string())
    }
}

/// Serialize records back to the manifest schema, one line per package.
pub fn to_manifest(packages: &PackageMap) -> String {
    packages
        .values()
        .map(|p| {
            format!(
                "{}|{}|{}|{}|{}|{}|{}\n",
                p.name,
                p.epoch.as_deref().unwrap_or_default(),
                p.version,
                p.release,
                p.arch,
                p.disturl.as_deref().unwrap_or_default(),
                p.license
            )
        })
        .collect()
}
