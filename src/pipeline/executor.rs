//! Pipeline execution engine.
//!
//! Runs a [`DatasetProfile`] over a raw table as one forward pass and
//! produces the partitions together with a [`RunReport`].

use super::cleaning::{
    coerce_numeric, collapse_categories, derive_target, select_and_drop_missing,
    standardize_missing,
};
use super::encoding::{ColumnRange, EncodedColumn, normalise_min_max, one_hot_drop_first};
use super::profile::DatasetProfile;
use super::split::{Partitions, SplitConfig, split_three_way};
use super::validation::ensure_valid;
use crate::error::{Result, StrataError};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Fully encoded, normalised table with no missing values.
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    pub frame: DataFrame,
    /// Name of the 0/1 target column
    pub target: String,
}

impl ProcessedTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Target values in row order.
    pub fn labels(&self) -> Result<Vec<i32>> {
        let target = self.frame.column(&self.target)?.as_materialized_series();
        Ok(target.i32()?.into_no_null_iter().collect())
    }

    /// Fraction of rows whose target is 1.
    pub fn prevalence(&self) -> Result<f64> {
        let labels = self.labels()?;
        if labels.is_empty() {
            return Ok(0.0);
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        Ok(positives as f64 / labels.len() as f64)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Row/column counts and prevalence of one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub prevalence: f64,
}

/// Diagnostics gathered while running a pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dataset: String,
    pub generated_at: DateTime<Utc>,

    /// Rows in the raw input
    pub rows_raw: usize,

    /// Placeholder tokens ("NULL", "NA", blanks, ...) read as missing, per column
    pub missing_tokens: BTreeMap<String, usize>,

    /// Values set to missing by numeric coercion, per column
    pub coercion_failures: BTreeMap<String, usize>,

    /// Median used by a median-threshold target, computed before filtering
    pub median_threshold: Option<f64>,

    /// Rows removed by the missing-value filter
    pub rows_dropped_missing: usize,

    /// Missing values per retained column before the filter
    pub missing_by_column: BTreeMap<String, usize>,

    /// Rows in the processed table
    pub rows_processed: usize,

    /// Fraction of processed rows with target 1
    pub prevalence: f64,

    pub encoded: Vec<EncodedColumn>,
    pub scaling: BTreeMap<String, ColumnRange>,

    /// Output schema shared by all partitions
    pub columns: Vec<String>,

    pub partitions: Vec<PartitionSummary>,
    pub seed: u64,

    #[serde(with = "duration_serde", rename = "run_duration")]
    pub duration: Duration,
}

mod duration_serde {
    use serde::{Serializer, ser::SerializeStruct as _};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Duration", 2)?;
        state.serialize_field("secs", &duration.as_secs())?;
        state.serialize_field("nanos", &duration.subsec_nanos())?;
        state.end()
    }
}

impl RunReport {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        let shapes = self
            .partitions
            .iter()
            .map(|p| format!("{} ({}, {})", p.name, p.rows, p.columns))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{}: prevalence {:.2}%, {} → {} rows ({} dropped for missing values), partitions {}, {:.2}s",
            self.dataset,
            self.prevalence * 100.0,
            self.rows_raw,
            self.rows_processed,
            self.rows_dropped_missing,
            shapes,
            self.duration.as_secs_f64()
        )
    }

    /// Pretty JSON rendering of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub processed: ProcessedTable,
    pub partitions: Partitions,
    pub report: RunReport,
}

/// A single generic pipeline parameterised by a dataset profile.
#[derive(Debug, Clone)]
pub struct Pipeline {
    profile: DatasetProfile,
    split: SplitConfig,
}

impl Pipeline {
    pub fn new(profile: DatasetProfile) -> Self {
        Self {
            profile,
            split: SplitConfig::default(),
        }
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    /// Steps 1 through 7: missing-token cleanup, coercion, collapsing, target derivation, column
    /// selection, encoding, normalisation and prevalence.
    ///
    /// The returned report has no partition summaries yet.
    ///
    /// # Errors
    ///
    /// [`StrataError::Configuration`] when the profile does not match `raw`,
    /// [`StrataError::InsufficientData`] when no rows survive filtering.
    pub fn process(&self, raw: &DataFrame) -> Result<(ProcessedTable, RunReport)> {
        let start = Instant::now();
        let profile = &self.profile;
        let target = profile.target_column().to_owned();

        ensure_valid(profile, raw)?;
        self.split.validate()?;

        let (standardized, missing_tokens) = standardize_missing(raw)?;
        let (coerced, coercion_failures) =
            coerce_numeric(&standardized, &profile.numeric_inputs())?;
        let collapsed = collapse_categories(&coerced, &profile.collapse)?;

        // The threshold must be computed on the unfiltered table.
        let (with_target, median_threshold) = derive_target(&collapsed, &profile.target)?;

        let (filtered, missing) =
            select_and_drop_missing(&with_target, &profile.feature_columns, &target)?;
        if filtered.height() == 0 {
            return Err(StrataError::insufficient_data(format!(
                "all {} rows of '{}' have a missing value in a retained column",
                raw.height(),
                profile.name
            )));
        }

        let (encoded_frame, encoded) = one_hot_drop_first(&filtered, &profile.categorical_columns)?;
        let (scaled, ranges) = normalise_min_max(&encoded_frame, &profile.numeric_columns)?;

        let mut columns = vec![target.clone()];
        columns.extend(profile.numeric_columns.iter().cloned());
        columns.extend(encoded.iter().flat_map(|e| e.indicators.iter().cloned()));

        let table = ProcessedTable {
            frame: scaled.select(columns.iter().map(String::as_str))?,
            target,
        };
        let prevalence = table.prevalence()?;

        let report = RunReport {
            dataset: profile.name.clone(),
            generated_at: Utc::now(),
            rows_raw: raw.height(),
            missing_tokens,
            coercion_failures,
            median_threshold,
            rows_dropped_missing: missing.rows_dropped,
            missing_by_column: missing.missing_by_column,
            rows_processed: table.height(),
            prevalence,
            encoded,
            scaling: ranges.into_iter().collect(),
            columns,
            partitions: Vec::new(),
            seed: self.split.seed,
            duration: start.elapsed(),
        };

        Ok((table, report))
    }

    /// Run the full pipeline, including the stratified three-way split.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::process`]; additionally
    /// [`StrataError::InsufficientData`] when the target has a single class.
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutput> {
        let start = Instant::now();
        let _span = tracing::info_span!("pipeline", dataset = %self.profile.name).entered();

        let (processed, mut report) = self.process(raw)?;
        let partitions = split_three_way(&processed, &self.split)?;

        let labels = processed.labels()?;
        report.partitions = partitions
            .named()
            .iter()
            .map(|(name, part)| {
                let (rows, columns) = part.shape();
                let positives = part
                    .rows
                    .iter()
                    .filter(|&&r| labels.get(r).copied() == Some(1))
                    .count();
                PartitionSummary {
                    name: (*name).to_owned(),
                    rows,
                    columns,
                    prevalence: if part.is_empty() {
                        0.0
                    } else {
                        positives as f64 / rows as f64
                    },
                }
            })
            .collect();
        report.duration = start.elapsed();

        tracing::info!("{}", report.summary());

        Ok(PipelineOutput {
            processed,
            partitions,
            report,
        })
    }
}

/// Run `profile` over `raw` with the default split (60/20/20, seed 42).
///
/// # Errors
///
/// See [`Pipeline::run`].
pub fn run(raw: &DataFrame, profile: &DatasetProfile) -> Result<PipelineOutput> {
    Pipeline::new(profile.clone()).run(raw)
}

/// Run `profile` over `raw` with explicit split settings.
///
/// # Errors
///
/// See [`Pipeline::run`].
pub fn run_with(
    raw: &DataFrame,
    profile: &DatasetProfile,
    split: &SplitConfig,
) -> Result<PipelineOutput> {
    Pipeline::new(profile.clone()).with_split(*split).run(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement_frame(rows: usize) -> DataFrame {
        let degree_p: Vec<String> = (0..rows).map(|i| format!("{}.0", 50 + i % 40)).collect();
        let degree_t: Vec<&str> = (0..rows)
            .map(|i| match i % 3 {
                0 => "Sci&Tech",
                1 => "Comm&Mgmt",
                _ => "Others",
            })
            .collect();
        let status: Vec<&str> = (0..rows)
            .map(|i| if i % 10 < 7 { "Placed" } else { "Not Placed" })
            .collect();

        df!(
            "degree_p" => degree_p,
            "degree_t" => degree_t,
            "status" => status
        )
        .expect("valid frame")
    }

    #[test]
    fn test_processed_schema() -> Result<()> {
        let pipeline = Pipeline::new(DatasetProfile::placement());
        let (table, report) = pipeline.process(&placement_frame(50))?;

        assert_eq!(
            table.column_names(),
            vec!["job_offer", "degree_p", "degree_type_Others"]
        );
        assert_eq!(report.columns, table.column_names());
        assert_eq!(report.rows_processed, 50);
        assert!((report.prevalence - 0.7).abs() < 1e-9);
        assert!(report.median_threshold.is_none());
        assert!(report.partitions.is_empty());
        Ok(())
    }

    #[test]
    fn test_run_reports_partitions() -> Result<()> {
        let output = run(&placement_frame(100), &DatasetProfile::placement())?;
        let report = &output.report;

        let rows: Vec<usize> = report.partitions.iter().map(|p| p.rows).collect();
        assert_eq!(rows, vec![60, 20, 20]);
        assert!(report.partitions.iter().all(|p| p.columns == 3));
        assert!(
            report
                .partitions
                .iter()
                .all(|p| (p.prevalence - 0.7).abs() < 0.02)
        );
        assert!(report.summary().contains("prevalence 70.00%"));
        Ok(())
    }

    #[test]
    fn test_single_class_is_insufficient() {
        let raw = df!(
            "degree_p" => ["60.0", "70.0", "80.0"],
            "degree_t" => ["Sci&Tech", "Others", "Comm&Mgmt"],
            "status" => ["Placed", "Placed", "Placed"]
        )
        .expect("valid frame");

        let result = run(&raw, &DatasetProfile::placement());
        assert!(matches!(result, Err(StrataError::InsufficientData(_))));
    }

    #[test]
    fn test_invalid_split_config_rejected() {
        let split = SplitConfig {
            train_fraction: 0.0,
            ..SplitConfig::default()
        };
        let result = run_with(&placement_frame(20), &DatasetProfile::placement(), &split);
        assert!(matches!(result, Err(StrataError::Configuration(_))));
    }

    #[test]
    fn test_report_serializes() -> Result<()> {
        let output = run(&placement_frame(30), &DatasetProfile::placement())?;
        let json = output.report.to_json()?;

        assert!(json.contains("\"dataset\": \"placement\""));
        assert!(json.contains("\"run_duration\""));
        assert!(json.contains("\"degree_type_Others\""));
        Ok(())
    }
}
