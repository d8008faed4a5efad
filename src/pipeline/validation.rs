//! Profile validation.
//!
//! Checks a [`DatasetProfile`] against the raw table's columns before any
//! transform runs, collecting every problem instead of stopping at the first.

use super::profile::DatasetProfile;
use crate::error::{Result, StrataError};
use polars::prelude::*;
use std::collections::HashSet;

/// Validation problem with the rule that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub rule: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Validate a profile against the raw table, returning every problem found.
pub fn validate_profile(profile: &DatasetProfile, raw: &DataFrame) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let input_cols: HashSet<&str> = raw
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    let require = |column: &str, rule: &'static str, errors: &mut Vec<ValidationError>| {
        if !input_cols.contains(column) {
            errors.push(ValidationError::new(
                rule,
                format!("column '{column}' not found in input"),
            ));
        }
    };

    for column in &profile.coerce_columns {
        require(column, "coercion", &mut errors);
    }

    for rule in &profile.collapse {
        require(&rule.source, "collapse", &mut errors);
    }

    require(profile.target.source(), "target", &mut errors);

    for column in &profile.feature_columns {
        if !profile.is_collapse_output(column) {
            require(column, "features", &mut errors);
        }
    }

    let features: HashSet<&str> = profile.feature_columns.iter().map(String::as_str).collect();

    for column in &profile.categorical_columns {
        if !features.contains(column.as_str()) {
            errors.push(ValidationError::new(
                "encoding",
                format!("categorical column '{column}' is not a feature column"),
            ));
        }
    }

    for column in &profile.numeric_columns {
        if !features.contains(column.as_str()) {
            errors.push(ValidationError::new(
                "normalisation",
                format!("numeric column '{column}' is not a feature column"),
            ));
        }
        if profile.categorical_columns.contains(column) {
            errors.push(ValidationError::new(
                "normalisation",
                format!("column '{column}' is declared both numeric and categorical"),
            ));
        }
    }

    for column in &profile.feature_columns {
        if !profile.categorical_columns.contains(column)
            && !profile.numeric_columns.contains(column)
        {
            errors.push(ValidationError::new(
                "features",
                format!("feature column '{column}' is neither categorical nor numeric"),
            ));
        }
    }

    let target = profile.target_column();
    if features.contains(target) || input_cols.contains(target) {
        errors.push(ValidationError::new(
            "target",
            format!("target column '{target}' collides with an existing column"),
        ));
    }

    errors
}

/// Validate and turn any problems into a single configuration error.
pub fn ensure_valid(profile: &DatasetProfile, raw: &DataFrame) -> Result<()> {
    let errors = validate_profile(profile, raw);
    if errors.is_empty() {
        return Ok(());
    }

    Err(StrataError::configuration(format!(
        "profile '{}' does not match the input:\n{}",
        profile.name,
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    )))
}
