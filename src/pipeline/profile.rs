//! Dataset profile data structures.
//!
//! A profile is the only thing that differs between the institution and the
//! placement datasets: which columns are coerced, how categories collapse,
//! how the target is derived and which features survive. The transform logic
//! itself never branches on the dataset.

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-dataset configuration for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// Human-readable dataset name, used in logs and reports
    pub name: String,

    /// Columns holding numbers that may arrive as strings
    #[serde(default)]
    pub coerce_columns: Vec<String>,

    /// Category collapsing rules, applied in order
    #[serde(default)]
    pub collapse: Vec<CollapseRule>,

    /// How the binary target is derived
    pub target: TargetRule,

    /// Columns retained alongside the target
    pub feature_columns: Vec<String>,

    /// Feature columns to one-hot encode (drop-first)
    #[serde(default)]
    pub categorical_columns: Vec<String>,

    /// Feature columns to min-max normalise
    #[serde(default)]
    pub numeric_columns: Vec<String>,
}

impl DatasetProfile {
    /// Institution-completion dataset: is an institution's on-time graduation
    /// rate above the dataset median?
    pub fn institution() -> Self {
        Self {
            name: "institution".to_owned(),
            coerce_columns: vec!["grad_100_percentile".to_owned()],
            collapse: vec![CollapseRule {
                source: "control".to_owned(),
                output: "control".to_owned(),
                matcher: Matcher::Contains {
                    needle: "Private".to_owned(),
                    category: "Private".to_owned(),
                },
                default: "Public".to_owned(),
            }],
            target: TargetRule::AboveMedian {
                column: "grad_100_percentile".to_owned(),
                output: "high_grad_rate".to_owned(),
            },
            feature_columns: vec![
                "control".to_owned(),
                "level".to_owned(),
                "student_count".to_owned(),
            ],
            categorical_columns: vec!["control".to_owned(), "level".to_owned()],
            numeric_columns: vec!["student_count".to_owned()],
        }
    }

    /// Student-placement dataset: did the student receive a job offer?
    pub fn placement() -> Self {
        Self {
            name: "placement".to_owned(),
            coerce_columns: vec!["degree_p".to_owned()],
            collapse: vec![CollapseRule {
                source: "degree_t".to_owned(),
                output: "degree_type".to_owned(),
                matcher: Matcher::OneOf {
                    values: vec!["Sci&Tech".to_owned(), "Comm&Mgmt".to_owned()],
                    category: "Mainstream".to_owned(),
                },
                default: "Others".to_owned(),
            }],
            target: TargetRule::Equals {
                column: "status".to_owned(),
                value: "Placed".to_owned(),
                output: "job_offer".to_owned(),
            },
            feature_columns: vec!["degree_type".to_owned(), "degree_p".to_owned()],
            categorical_columns: vec!["degree_type".to_owned()],
            numeric_columns: vec!["degree_p".to_owned()],
        }
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "institution" | "college" => Some(Self::institution()),
            "placement" | "campus" => Some(Self::placement()),
            _ => None,
        }
    }

    /// Resolve a built-in name, or fall back to loading a JSON profile file.
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        match Self::builtin(name_or_path) {
            Some(profile) => Ok(profile),
            None => Self::from_file(name_or_path),
        }
    }

    /// Load a profile from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse a profile from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the profile to a pretty JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Name of the derived target column.
    pub fn target_column(&self) -> &str {
        self.target.output()
    }

    /// Every column that goes through numeric coercion: the declared coercion
    /// columns, the numeric features and a median-threshold target source.
    /// Order is stable and duplicates are removed.
    pub fn numeric_inputs(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let target_source = match &self.target {
            TargetRule::AboveMedian { column, .. } => Some(column),
            TargetRule::Equals { .. } => None,
        };

        for name in self
            .coerce_columns
            .iter()
            .chain(&self.numeric_columns)
            .chain(target_source)
        {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        columns
    }

    /// Whether `column` is produced by one of the collapse rules.
    pub fn is_collapse_output(&self, column: &str) -> bool {
        self.collapse.iter().any(|rule| rule.output == column)
    }
}

/// Maps every value of `source` into a reduced category stored in `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseRule {
    pub source: String,
    pub output: String,
    pub matcher: Matcher,
    /// Bucket for values the matcher does not recognise, missing values included
    pub default: String,
}

impl CollapseRule {
    /// Collapse a single raw value. Total over all inputs.
    pub fn apply<'a>(&'a self, value: Option<&str>) -> &'a str {
        match value {
            Some(v) if self.matcher.matches(v) => self.matcher.category(),
            _ => &self.default,
        }
    }
}

/// How a collapse rule recognises its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    /// Value contains `needle` as a substring
    Contains { needle: String, category: String },

    /// Value is exactly one of `values`
    OneOf { values: Vec<String>, category: String },
}

impl Matcher {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Contains { needle, .. } => value.contains(needle.as_str()),
            Self::OneOf { values, .. } => values.iter().any(|v| v == value),
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Self::Contains { category, .. } | Self::OneOf { category, .. } => category,
        }
    }
}

/// Rule deriving the binary target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetRule {
    /// 1 when the coerced value is strictly above the full-table median
    AboveMedian { column: String, output: String },

    /// 1 when the raw value equals `value`
    Equals {
        column: String,
        value: String,
        output: String,
    },
}

impl TargetRule {
    /// Raw column the rule reads.
    pub fn source(&self) -> &str {
        match self {
            Self::AboveMedian { column, .. } | Self::Equals { column, .. } => column,
        }
    }

    /// Name of the derived column.
    pub fn output(&self) -> &str {
        match self {
            Self::AboveMedian { output, .. } | Self::Equals { output, .. } => output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serialization() {
        let profile = DatasetProfile::placement();
        let json = profile.to_json().expect("Failed to serialize");
        assert!(json.contains("\"kind\": \"one_of\""));
        assert!(json.contains("\"kind\": \"equals\""));

        let parsed = DatasetProfile::from_json(&json).expect("Failed to parse");
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_contains_rule_is_total() {
        let profile = DatasetProfile::institution();
        let rule = profile.collapse.first().expect("rule exists");

        assert_eq!(rule.apply(Some("Private not-for-profit")), "Private");
        assert_eq!(rule.apply(Some("Private for-profit")), "Private");
        assert_eq!(rule.apply(Some("Public")), "Public");
        assert_eq!(rule.apply(Some("Tribal")), "Public");
        assert_eq!(rule.apply(None), "Public");
    }

    #[test]
    fn test_one_of_rule_is_total() {
        let profile = DatasetProfile::placement();
        let rule = profile.collapse.first().expect("rule exists");

        assert_eq!(rule.apply(Some("Sci&Tech")), "Mainstream");
        assert_eq!(rule.apply(Some("Comm&Mgmt")), "Mainstream");
        assert_eq!(rule.apply(Some("Others")), "Others");
        assert_eq!(rule.apply(Some("sci&tech")), "Others");
        assert_eq!(rule.apply(None), "Others");
    }

    #[test]
    fn test_numeric_inputs_deduplicated() {
        let mut profile = DatasetProfile::institution();
        profile.coerce_columns.push("student_count".to_owned());

        assert_eq!(
            profile.numeric_inputs(),
            vec!["grad_100_percentile".to_owned(), "student_count".to_owned()]
        );
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(
            DatasetProfile::builtin("College"),
            Some(DatasetProfile::institution())
        );
        assert_eq!(
            DatasetProfile::builtin("placement"),
            Some(DatasetProfile::placement())
        );
        assert!(DatasetProfile::builtin("titanic").is_none());
    }
}
