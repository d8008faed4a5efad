use super::profile::{CollapseRule, TargetRule};
use crate::error::{Result, StrataError};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Per-column count of values that failed numeric coercion.
pub type CoercionFailures = BTreeMap<String, usize>;

/// Per-column count of placeholder tokens replaced by missing values.
pub type MissingTokens = BTreeMap<String, usize>;

/// Text placeholders read as missing, matching common CSV exports.
pub const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// Replace placeholder tokens and blank strings in every text column with
/// missing values, so they never become categories or coercion failures.
pub fn standardize_missing(df: &DataFrame) -> Result<(DataFrame, MissingTokens)> {
    let mut out = df.clone();
    let mut replaced = MissingTokens::new();

    for column in df.get_columns() {
        if column.dtype() != &DataType::String {
            continue;
        }
        let series = column.as_materialized_series();

        let mut count = 0_usize;
        let values: Vec<Option<&str>> = series
            .str()?
            .into_iter()
            .map(|value| match value {
                Some(v) if is_missing_token(v) => {
                    count += 1;
                    None
                }
                other => other,
            })
            .collect();

        if count > 0 {
            tracing::debug!(column = %column.name(), count, "Standardized missing tokens");
            replaced.insert(column.name().to_string(), count);
            out.with_column(Series::new(column.name().clone(), values))?;
        }
    }

    Ok((out, replaced))
}

/// Outcome of the missing-value filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingDrop {
    /// Rows removed because at least one retained column was missing
    pub rows_dropped: usize,
    /// Missing values per retained column, counted before the drop
    pub missing_by_column: BTreeMap<String, usize>,
}

/// Convert `columns` to `Float64`. Values that cannot be parsed become missing
/// and are counted; blank strings are treated as already missing.
///
/// Placeholder tokens should be cleared with [`standardize_missing`] first,
/// otherwise they are counted as failures here.
pub fn coerce_numeric(df: &DataFrame, columns: &[String]) -> Result<(DataFrame, CoercionFailures)> {
    let mut out = df.clone();
    let mut failures = CoercionFailures::new();

    for name in columns {
        let series = df.column(name)?.as_materialized_series();
        let (coerced, failed) = coerce_series(series)?;

        if failed > 0 {
            tracing::warn!(
                column = %name,
                failed,
                "Values failed numeric coercion and were set to missing"
            );
        }

        failures.insert(name.clone(), failed);
        out.with_column(coerced)?;
    }

    Ok((out, failures))
}

fn coerce_series(series: &Series) -> Result<(Series, usize)> {
    let mut failed = 0_usize;

    let values: Vec<Option<f64>> = if series.dtype() == &DataType::String {
        series
            .str()?
            .into_iter()
            .map(|value| {
                let trimmed = value?.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let parsed = trimmed.parse::<f64>().ok().filter(|v| v.is_finite());
                if parsed.is_none() {
                    failed += 1;
                }
                parsed
            })
            .collect()
    } else {
        let nulls_before = series.null_count();
        let casted = series.cast(&DataType::Float64)?;
        failed += casted.null_count().saturating_sub(nulls_before);

        casted
            .f64()?
            .into_iter()
            .map(|value| {
                let value = value?;
                if value.is_finite() {
                    Some(value)
                } else {
                    failed += 1;
                    None
                }
            })
            .collect()
    };

    Ok((Series::new(series.name().clone(), values), failed))
}

/// Apply every collapse rule, writing (or overwriting) each rule's output
/// column. Missing and unrecognised values land in the rule's default bucket.
pub fn collapse_categories(df: &DataFrame, rules: &[CollapseRule]) -> Result<DataFrame> {
    let mut out = df.clone();

    for rule in rules {
        let source = df
            .column(&rule.source)?
            .as_materialized_series()
            .cast(&DataType::String)?;

        let collapsed: Vec<&str> = source
            .str()?
            .into_iter()
            .map(|value| rule.apply(value))
            .collect();

        let defaulted = collapsed.iter().filter(|c| **c == rule.default).count();
        tracing::debug!(
            source = %rule.source,
            output = %rule.output,
            defaulted,
            "Collapsed categories"
        );

        out.with_column(Series::new(rule.output.as_str().into(), collapsed))?;
    }

    Ok(out)
}

/// Derive the binary target column.
///
/// For [`TargetRule::AboveMedian`] the median is taken over the full table
/// handed in here; callers must run this before any row is filtered so the
/// threshold does not move. Returns the threshold when one was computed.
pub fn derive_target(df: &DataFrame, rule: &TargetRule) -> Result<(DataFrame, Option<f64>)> {
    let mut out = df.clone();
    let source = df.column(rule.source())?.as_materialized_series();

    let (labels, threshold): (Vec<i32>, Option<f64>) = match rule {
        TargetRule::AboveMedian { column, .. } => {
            let values = source.cast(&DataType::Float64)?;
            let values = values.f64()?;
            let median = values.median().ok_or_else(|| {
                StrataError::insufficient_data(format!(
                    "column '{column}' has no numeric values to compute a median"
                ))
            })?;

            let labels = values
                .into_iter()
                .map(|v| i32::from(v.is_some_and(|x| x > median)))
                .collect();
            (labels, Some(median))
        }
        TargetRule::Equals { value, .. } => {
            let values = source.cast(&DataType::String)?;
            let labels = values
                .str()?
                .into_iter()
                .map(|v| i32::from(v == Some(value.as_str())))
                .collect();
            (labels, None)
        }
    };

    out.with_column(Series::new(rule.output().into(), labels))?;
    Ok((out, threshold))
}

/// Keep only `features` plus `target` and drop every row with a missing value.
pub fn select_and_drop_missing(
    df: &DataFrame,
    features: &[String],
    target: &str,
) -> Result<(DataFrame, MissingDrop)> {
    let mut retained: Vec<&str> = features.iter().map(String::as_str).collect();
    retained.push(target);

    let selected = df.select(retained.iter().copied())?;

    let missing_by_column = selected
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .filter(|(_, nulls)| *nulls > 0)
        .collect();

    let kept = selected.drop_nulls::<String>(None)?;
    let drop = MissingDrop {
        rows_dropped: selected.height() - kept.height(),
        missing_by_column,
    };

    if drop.rows_dropped > 0 {
        tracing::info!(
            rows_dropped = drop.rows_dropped,
            by_column = ?drop.missing_by_column,
            "Dropped rows with missing feature values"
        );
    }

    Ok((kept, drop))
}
