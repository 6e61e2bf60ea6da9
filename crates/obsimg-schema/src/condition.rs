//! Readiness conditions over an image's package metadata.
//!
//! A list of conditions is an AND-conjunction evaluated against one
//! snapshot (resolved artifact plus its manifest). Conditions arrive either
//! already deserialized (JSON/TOML) or as a shorthand string such as
//! `kernel-default>=5.14.21-150500.55.1`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Comparison applied between a package's version and the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Comparison {
    /// Exactly equal.
    #[serde(rename = "==")]
    Eq,
    /// Equal or newer.
    #[default]
    #[serde(rename = ">=")]
    Ge,
    /// Strictly newer.
    #[serde(rename = ">")]
    Gt,
    /// Equal or older.
    #[serde(rename = "<=")]
    Le,
    /// Strictly older.
    #[serde(rename = "<")]
    Lt,
}

impl Comparison {
    /// Whether `actual.cmp(expected) == ord` satisfies this comparison.
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ge => ord != Ordering::Less,
            Self::Gt => ord == Ordering::Greater,
            Self::Le => ord != Ordering::Greater,
            Self::Lt => ord == Ordering::Less,
        }
    }

    /// Operator token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" | "=" => Ok(Self::Eq),
            ">=" => Ok(Self::Ge),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            "<" => Ok(Self::Lt),
            other => Err(ConditionParseError::Operator(other.to_string())),
        }
    }
}

/// Requirement on one package of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageCondition {
    /// Package that must be present.
    pub package_name: String,
    /// Expected version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Expected release, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// How the actual version relates to the expected one.
    #[serde(default)]
    pub condition: Comparison,
}

/// Requirement on the image version itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageCondition {
    /// Exact image version the resolved artifact must carry.
    pub image: String,
}

/// A readiness predicate over one metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Package presence and version requirement.
    Package(PackageCondition),
    /// Image version requirement.
    Image(ImageCondition),
}

impl Condition {
    /// Package presence condition with no version requirement.
    pub fn package(name: impl Into<String>) -> Self {
        Self::Package(PackageCondition {
            package_name: name.into(),
            version: None,
            release: None,
            condition: Comparison::default(),
        })
    }

    /// Image version condition.
    pub fn image(version: impl Into<String>) -> Self {
        Self::Image(ImageCondition {
            image: version.into(),
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(c) => write!(f, "image == {}", c.image),
            Self::Package(c) => {
                write!(f, "{}", c.package_name)?;
                match (&c.version, &c.release) {
                    (Some(v), Some(r)) => write!(f, " {} {v}-{r}", c.condition),
                    (Some(v), None) => write!(f, " {} {v}", c.condition),
                    (None, Some(r)) => write!(f, " {} release {r}", c.condition),
                    (None, None) => Ok(()),
                }
            }
        }
    }
}

/// Errors from the `name<op>version[-release]` shorthand.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConditionParseError {
    /// Nothing before the operator.
    #[error("condition is missing a package name: '{0}'")]
    MissingName(String),

    /// Nothing after the operator.
    #[error("condition is missing a version: '{0}'")]
    MissingVersion(String),

    /// Operator is not one of `==`, `>=`, `>`, `<=`, `<`.
    #[error("unknown comparison operator '{0}'")]
    Operator(String),
}

impl FromStr for Condition {
    type Err = ConditionParseError;

    /// Parse `name`, `name<op>version` or `name<op>version-release`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let is_op = |c: char| matches!(c, '=' | '<' | '>');

        let Some(op_start) = s.find(is_op) else {
            if s.is_empty() {
                return Err(ConditionParseError::MissingName(s.to_string()));
            }
            return Ok(Self::package(s));
        };

        let name = s[..op_start].trim();
        if name.is_empty() {
            return Err(ConditionParseError::MissingName(s.to_string()));
        }

        let rest = &s[op_start..];
        let op_end = rest.find(|c: char| !is_op(c)).unwrap_or(rest.len());
        let condition: Comparison = rest[..op_end].parse()?;

        let expected = rest[op_end..].trim();
        if expected.is_empty() {
            return Err(ConditionParseError::MissingVersion(s.to_string()));
        }

        let (version, release) = match expected.rsplit_once('-') {
            Some((v, r)) if !v.is_empty() && !r.is_empty() => (v, Some(r.to_string())),
            _ => (expected, None),
        };

        Ok(Self::Package(PackageCondition {
            package_name: name.to_string(),
            version: Some(version.to_string()),
            release,
            condition,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_with_release() {
        let cond: Condition = "kernel-default>=5.14.21-150500.55.1".parse().unwrap();
        assert_eq!(
            cond,
            Condition::Package(PackageCondition {
                package_name: "kernel-default".to_string(),
                version: Some("5.14.21".to_string()),
                release: Some("150500.55.1".to_string()),
                condition: Comparison::Ge,
            })
        );
    }

    #[test]
    fn shorthand_without_operator_is_presence() {
        let cond: Condition = " cloud-init ".parse().unwrap();
        assert_eq!(cond, Condition::package("cloud-init"));
    }

    #[test]
    fn shorthand_rejects_bad_input() {
        assert!(matches!(
            ">=1.0".parse::<Condition>(),
            Err(ConditionParseError::MissingName(_))
        ));
        assert!(matches!(
            "bash==".parse::<Condition>(),
            Err(ConditionParseError::MissingVersion(_))
        ));
        assert!(matches!(
            "bash=>1".parse::<Condition>(),
            Err(ConditionParseError::Operator(_))
        ));
    }

    #[test]
    fn deserializes_both_shapes() {
        let json = r#"[
            {"package_name": "kernel-default", "version": "5.14.21", "condition": "=="},
            {"package_name": "openssh"},
            {"image": "15.6.0"}
        ]"#;
        let conds: Vec<Condition> = serde_json::from_str(json).unwrap();

        assert_eq!(conds.len(), 3);
        assert!(matches!(
            &conds[0],
            Condition::Package(PackageCondition { condition: Comparison::Eq, .. })
        ));
        assert_eq!(conds[1], Condition::package("openssh"));
        assert_eq!(conds[2], Condition::image("15.6.0"));
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        for json in [
            r#"{"package_name": "bash", "verison": "5"}"#,
            r#"{"image": "15.6.0", "release": "1"}"#,
        ] {
            assert!(serde_json::from_str::<Condition>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn deserializes_from_toml_tables() {
        #[derive(Deserialize)]
        struct File {
            conditions: Vec<Condition>,
        }

        let file: File = toml::from_str(
            r#"
            [[conditions]]
            package_name = "bash"
            version = "4.4"
            condition = ">"
            "#,
        )
        .unwrap();
        assert_eq!(file.conditions[0].to_string(), "bash > 4.4");
    }

    #[test]
    fn comparison_truth_table() {
        use Ordering::{Equal, Greater, Less};
        assert!(Comparison::Ge.holds(Equal) && Comparison::Ge.holds(Greater));
        assert!(!Comparison::Ge.holds(Less));
        assert!(Comparison::Lt.holds(Less) && !Comparison::Lt.holds(Equal));
        assert!(Comparison::Eq.holds(Equal) && !Comparison::Eq.holds(Greater));
    }
}
