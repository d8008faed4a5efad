//! Loading raw tables and writing partitions.
//!
//! Retrieval of remote datasets is not handled here: callers download the file
//! themselves (or build a [`DataFrame`] in memory) and hand the table to the
//! pipeline.

use crate::error::{Result, ResultExt as _, StrataError};
use crate::pipeline::Partitions;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Load a CSV file into a raw table.
///
/// Schema inference looks at up to 10 000 rows; columns that mix numbers and
/// text come through as strings and are handled by the coercion step.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext != "csv" {
        return Err(StrataError::InvalidPath(format!(
            "Unsupported file extension '{ext}' for {}",
            path.display()
        )));
    }
    if !path.exists() {
        return Err(StrataError::InvalidPath(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10_000))
        .with_has_header(true)
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read CSV {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded raw table"
    );
    Ok(df)
}

/// Write a single table as CSV with a header row.
pub fn save_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut df = df.clone();
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write `{stem}_train.csv`, `{stem}_tune.csv` and `{stem}_test.csv` into
/// `dir`, creating it if needed. Returns the written paths in that order.
pub fn write_partitions(
    partitions: &Partitions,
    dir: impl AsRef<Path>,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(3);
    for (name, partition) in partitions.named() {
        let path = dir.join(format!("{stem}_{name}.csv"));
        save_csv(&partition.frame, &path)?;
        tracing::debug!(path = %path.display(), rows = partition.len(), "Wrote partition");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsupported_extension() {
        let result = load_csv("data.parquet");
        assert!(matches!(result, Err(StrataError::InvalidPath(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv("does/not/exist.csv");
        assert!(matches!(result, Err(StrataError::InvalidPath(_))));
    }

    #[test]
    fn test_csv_roundtrip_keeps_strings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.csv");
        std::fs::write(
            &path,
            "degree_p,degree_t,status\n61.0,Sci&Tech,Placed\nabc,Others,Not Placed\n",
        )?;

        let df = load_csv(&path)?;
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("degree_p")?.dtype(), &DataType::String);
        Ok(())
    }
}
