//! Categorical encoding and numeric normalisation.
//!
//! Both transforms learn their parameters (category sets, column ranges) from
//! the frame they are given, which is the post-filter table.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Indicator columns produced for one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub source: String,
    /// Category represented by all-zero indicators
    pub reference: Option<String>,
    pub indicators: Vec<String>,
}

/// Observed range of a normalised column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    /// Rescale a single value into [0, 1]; a degenerate range maps to 0.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }
}

/// Name of the indicator column for `category` of `column`.
pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{column}_{category}")
}

/// Drop-first one-hot encoding.
///
/// Categories are ordered lexicographically and the first becomes the
/// implicit reference. Indicator columns are `Float64` 0/1 and are appended
/// after the existing columns; source columns are left in place.
pub fn one_hot_drop_first(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, Vec<EncodedColumn>)> {
    let mut exprs = Vec::new();
    let mut encoded = Vec::with_capacity(columns.len());

    for name in columns {
        let values = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let categories: BTreeSet<&str> = values.str()?.into_iter().flatten().collect();

        let mut categories = categories.into_iter();
        let reference = categories.next().map(str::to_owned);

        let mut indicators = Vec::new();
        for category in categories {
            let indicator = indicator_name(name, category);
            exprs.push(
                col(name.as_str())
                    .cast(DataType::String)
                    .eq(lit(category))
                    .cast(DataType::Float64)
                    .alias(indicator.as_str()),
            );
            indicators.push(indicator);
        }

        tracing::debug!(
            column = %name,
            reference = ?reference,
            indicators = indicators.len(),
            "One-hot encoded column"
        );

        encoded.push(EncodedColumn {
            source: name.clone(),
            reference,
            indicators,
        });
    }

    if exprs.is_empty() {
        return Ok((df.clone(), encoded));
    }

    let out = df.clone().lazy().with_columns(exprs).collect()?;
    Ok((out, encoded))
}

/// Min-max normalisation of `columns` into [0, 1].
///
/// Every value goes through [`ColumnRange::scale`], so the ranges returned
/// here reproduce the output exactly and the column extremes land on 0 and 1.
/// When a column's max equals its min every value becomes 0.
pub fn normalise_min_max(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, Vec<(String, ColumnRange)>)> {
    let mut out = df.clone();
    let mut ranges = Vec::with_capacity(columns.len());

    for name in columns {
        let values = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = values.f64()?;

        let (Some(min), Some(max)) = (values.min(), values.max()) else {
            continue;
        };
        let range = ColumnRange { min, max };
        if max - min <= 0.0 {
            tracing::warn!(column = %name, value = min, "Degenerate range, column scaled to 0");
        }

        let scaled: Float64Chunked = values
            .into_iter()
            .map(|value| value.map(|v| range.scale(v)))
            .collect();
        out.with_column(scaled.with_name(name.as_str().into()).into_series())?;
        ranges.push((name.clone(), range));
    }

    Ok((out, ranges))
}
