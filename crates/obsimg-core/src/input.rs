//! Interactive list building.
//!
//! The resolver never prompts on its own. Callers that want to build a
//! condition, license or package list interactively hand in an
//! [`InputProvider`]; tests use [`StaticInput`].

use std::collections::VecDeque;

use obsimg_schema::Condition;

use crate::ResolveError;

/// Source of user-entered entries.
pub trait InputProvider {
    /// Read entries for `prompt` until the user ends the list.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the underlying input fails.
    fn read_entries(&mut self, prompt: &str) -> Result<Vec<String>, ResolveError>;
}

/// Replays canned answers, one list per call.
#[derive(Debug, Clone, Default)]
pub struct StaticInput {
    answers: VecDeque<Vec<String>>,
}

impl StaticInput {
    pub fn new<I, L, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|list| list.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl InputProvider for StaticInput {
    fn read_entries(&mut self, _prompt: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

/// Ask for a list of conditions.
///
/// Each entry is either a JSON object (`{"package_name": ...}`) or the
/// `name<op>version[-release]` shorthand.
///
/// # Errors
///
/// Returns [`ResolveError::Parse`] for the first entry that is neither.
pub fn collect_conditions<P: InputProvider + ?Sized>(
    provider: &mut P,
) -> Result<Vec<Condition>, ResolveError> {
    provider
        .read_entries("Enter image conditions (empty line to finish)")?
        .iter()
        .map(|entry| parse_condition(entry))
        .collect()
}

/// Ask for a plain list of strings (licenses, package patterns).
///
/// # Errors
///
/// Propagates provider failures.
pub fn collect_list<P: InputProvider + ?Sized>(
    provider: &mut P,
    prompt: &str,
) -> Result<Vec<String>, ResolveError> {
    Ok(provider
        .read_entries(prompt)?
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Parse one condition entry, JSON object or shorthand.
///
/// # Errors
///
/// Returns [`ResolveError::Parse`] naming the entry.
pub fn parse_condition(entry: &str) -> Result<Condition, ResolveError> {
    let entry = entry.trim();
    if entry.starts_with('{') {
        serde_json::from_str(entry).map_err(|e| ResolveError::parse(format!("condition '{entry}'"), e))
    } else {
        entry
            .parse()
            .map_err(|e| ResolveError::parse(format!("condition '{entry}'"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsimg_schema::{Comparison, PackageCondition};

    #[test]
    fn conditions_from_mixed_entries() {
        let mut input = StaticInput::new([vec![
            r#"{"package_name": "bash", "version": "4.4", "condition": ">"}"#,
            "kernel-default>=5.14.21-150500.55.1",
            r#"{"image": "1.2.3"}"#,
        ]]);

        let conditions = collect_conditions(&mut input).unwrap();
        assert_eq!(conditions.len(), 3);
        assert_eq!(
            conditions[0],
            Condition::Package(PackageCondition {
                package_name: "bash".into(),
                version: Some("4.4".into()),
                release: None,
                condition: Comparison::Gt,
            })
        );
        assert_eq!(conditions[2], Condition::image("1.2.3"));
    }

    #[test]
    fn bad_entry_is_parse_error() {
        let mut input = StaticInput::new([vec!["{not json"]]);
        let err = collect_conditions(&mut input).unwrap_err();
        assert!(matches!(err, ResolveError::Parse { .. }));
    }

    #[test]
    fn lists_are_trimmed_and_consumed_in_order() {
        let mut input = StaticInput::new([vec![" MIT ", "", "GPL-3.0"], vec!["*-mini"]]);
        assert_eq!(collect_list(&mut input, "licenses").unwrap(), vec!["MIT", "GPL-3.0"]);
        assert_eq!(collect_list(&mut input, "packages").unwrap(), vec!["*-mini"]);
        assert!(collect_list(&mut input, "more").unwrap().is_empty());
    }
}
