//! Package filter rules.

use serde::{Deserialize, Serialize};

/// License and name rules applied over a package collection.
///
/// Used both to narrow what is displayed (keep matching records) and to
/// reject images that ship disallowed packages (fail on matching records).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Licenses compared case-insensitively against each record's license terms.
    #[serde(default)]
    pub licenses: Vec<String>,
    /// Package name patterns where `*` matches any run of characters.
    #[serde(default)]
    pub packages: Vec<String>,
}

impl FilterSpec {
    /// True when neither licenses nor package patterns are set.
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty() && self.packages.is_empty()
    }
}
