//! License and name filters over a package map.
//!
//! All operations are pure: they return a new map and leave the input
//! untouched.

use obsimg_schema::{FilterSpec, PackageMap, PackageRecord};

/// Keep records whose license shares a term with `licenses`.
///
/// Comparison is case-insensitive. See [`license_terms`] for how compound
/// license fields are split.
pub fn filter_by_licenses(records: &PackageMap, licenses: &[String]) -> PackageMap {
    let wanted: Vec<String> = licenses.iter().map(|l| l.trim().to_lowercase()).collect();
    retain(records, |record| license_matches(record, &wanted))
}

/// Keep records whose name matches at least one pattern.
pub fn filter_by_name(records: &PackageMap, patterns: &[String]) -> PackageMap {
    let patterns = compile(patterns);
    retain(records, |record| patterns.iter().any(|p| p.matches(&record.name)))
}

/// Apply every non-empty rule of `spec`, licenses first.
pub fn apply(records: &PackageMap, spec: &FilterSpec) -> PackageMap {
    let mut result = records.clone();
    if !spec.licenses.is_empty() {
        result = filter_by_licenses(&result, &spec.licenses);
    }
    if !spec.packages.is_empty() {
        result = filter_by_name(&result, &spec.packages);
    }
    result
}

/// Names of records hit by any rule of `spec`, in name order.
///
/// Unlike [`apply`], the rules are alternatives: a record is reported if
/// its license is listed or its name matches a pattern.
pub fn disallowed(records: &PackageMap, spec: &FilterSpec) -> Vec<String> {
    let by_license = filter_by_licenses(records, &spec.licenses);
    let by_name = filter_by_name(records, &spec.packages);
    records
        .keys()
        .filter(|name| by_license.contains_key(*name) || by_name.contains_key(*name))
        .cloned()
        .collect()
}

/// Split a license field into lowercase terms.
///
/// Terms are separated by `,`, `;` and the operators `AND`, `OR` and
/// `WITH`; parentheses are dropped. A field without separators is one term.
pub fn license_terms(field: &str) -> Vec<String> {
    field
        .replace(['(', ')', ',', ';'], " ")
        .split_whitespace()
        .fold(vec![String::new()], |mut terms, word| {
            if ["and", "or", "with"].contains(&word.to_lowercase().as_str()) {
                terms.push(String::new());
            } else if let Some(last) = terms.last_mut() {
                if !last.is_empty() {
                    last.push(' ');
                }
                last.push_str(&word.to_lowercase());
            }
            terms
        })
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect()
}

fn license_matches(record: &PackageRecord, wanted: &[String]) -> bool {
    license_terms(&record.license)
        .iter()
        .any(|term| wanted.contains(term))
}

fn retain(records: &PackageMap, keep: impl Fn(&PackageRecord) -> bool) -> PackageMap {
    records
        .iter()
        .filter(|(_, record)| keep(record))
        .map(|(name, record)| (name.clone(), record.clone()))
        .collect()
}

/// A whole-name pattern where `*` is the only wildcard.
#[derive(Debug, Clone)]
pub struct NamePattern(glob::Pattern);

impl NamePattern {
    /// Compile `pattern`; every character other than `*` is literal.
    pub fn new(pattern: &str) -> Result<Self, glob::PatternError> {
        let mut escaped = pattern
            .split('*')
            .map(glob::Pattern::escape)
            .collect::<Vec<_>>()
            .join("*");
        // glob reserves `**` for recursive path matching
        while escaped.contains("**") {
            escaped = escaped.replace("**", "*");
        }
        glob::Pattern::new(&escaped).map(Self)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.matches(name)
    }
}

fn compile(patterns: &[String]) -> Vec<NamePattern> {
    patterns
        .iter()
        .filter_map(|p| match NamePattern::new(p.trim()) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Ignoring invalid package pattern '{p}': {e}");
                None
            }
        })
        .collect()
}
