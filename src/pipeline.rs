//! Tabular preparation pipeline.
//!
//! Turns a raw table into stratified train/tune/test partitions that are ready
//! for binary classification. The pipeline is a single forward pass; every step
//! takes the previous step's table and returns a new one:
//!
//! Before step 1, blank strings and placeholders such as `NULL` or `NA` in text
//! columns are replaced with missing values.
//!
//! 1. **Type coercion**: numeric-as-string columns become `Float64`; values that
//!    fail to parse become missing and are counted, never raised.
//! 2. **Category collapsing**: total rules map raw categories into a reduced set.
//! 3. **Target derivation**: the 0/1 target is derived from the *unfiltered*
//!    table, so a median threshold is stable regardless of later drops.
//! 4. **Column selection**: features plus target are kept, incomplete rows dropped.
//! 5. **Drop-first one-hot encoding** of categorical features.
//! 6. **Min-max normalisation** of numeric features (degenerate range → 0).
//! 7. **Prevalence** of the target, recorded in the [`RunReport`].
//! 8. **Stratified split**: 60% train, then the remainder halved into tune/test.
//!
//! Everything dataset-specific lives in a [`DatasetProfile`].
//!
//! # Example
//!
//! ```no_run
//! use strata::io::load_csv;
//! use strata::pipeline::{DatasetProfile, run};
//!
//! let raw = load_csv("Placement_Data_Full_Class.csv")?;
//! let output = run(&raw, &DatasetProfile::placement())?;
//!
//! println!("{}", output.report.summary());
//! println!("train rows: {}", output.partitions.train.len());
//! # Ok::<(), strata::error::StrataError>(())
//! ```

pub mod cleaning;
pub mod encoding;
pub mod executor;
pub mod profile;
pub mod split;
pub mod validation;

pub use encoding::{ColumnRange, EncodedColumn};
pub use executor::{
    PartitionSummary, Pipeline, PipelineOutput, ProcessedTable, RunReport, run, run_with,
};
pub use profile::{CollapseRule, DatasetProfile, Matcher, TargetRule};
pub use split::{DEFAULT_SEED, Partition, Partitions, SplitConfig};
pub use validation::{ValidationError, validate_profile};
