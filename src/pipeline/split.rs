//! Stratified train/tune/test partitioning.
//!
//! The processed table is split twice: first into a train part and a
//! remainder, then the remainder into tune and test. Both splits preserve the
//! target's class proportions up to integer rounding.
//!
//! Allocation per class is the floor of its proportional share; leftover
//! slots go to the classes with the largest remainders, lower label first on
//! ties. Within a class, positions are shuffled with a `ChaCha8Rng` seeded
//! from [`SplitConfig::seed`], so a given seed yields the same membership on
//! every platform.

use super::ProcessedTable;
use crate::error::{Result, StrataError};
use polars::prelude::*;
use rand::SeedableRng as _;
use rand::seq::SliceRandom as _;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Split proportions and seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub seed: u64,
    /// Share of all rows assigned to train
    pub train_fraction: f64,
    /// Share of the remainder assigned to tune; the rest is test
    pub tune_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            train_fraction: 0.6,
            tune_fraction: 0.5,
        }
    }
}

impl SplitConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Both fractions must lie strictly between 0 and 1.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train_fraction", self.train_fraction),
            ("tune_fraction", self.tune_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(StrataError::configuration(format!(
                    "{name} must be between 0 and 1 (exclusive), got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One output subset and the processed-table positions it was taken from.
#[derive(Debug, Clone)]
pub struct Partition {
    pub frame: DataFrame,
    /// Ascending row positions in the processed table
    pub rows: Vec<usize>,
}

impl Partition {
    fn take(df: &DataFrame, rows: Vec<usize>) -> Result<Self> {
        let idx = IdxCa::from_vec(
            "rows".into(),
            rows.iter().map(|&r| r as IdxSize).collect(),
        );
        Ok(Self {
            frame: df.take(&idx)?,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }
}

/// The train/tune/test triple.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: Partition,
    pub tune: Partition,
    pub test: Partition,
}

impl Partitions {
    /// Partitions in output order with their names.
    pub fn named(&self) -> [(&'static str, &Partition); 3] {
        [
            ("train", &self.train),
            ("tune", &self.tune),
            ("test", &self.test),
        ]
    }

    pub fn total_rows(&self) -> usize {
        self.train.len() + self.tune.len() + self.test.len()
    }
}

/// Split `labels` positions into a first part of `floor(n * fraction)` rows
/// and the rest, stratified on label. Both returned lists are ascending.
pub fn stratified_indices(labels: &[i32], fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n = labels.len();
    // Guard against products like 0.6 * n landing just below an integer.
    let first_size = (((n as f64) * fraction + 1e-9).floor() as usize).min(n);

    let mut by_class: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (pos, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(pos);
    }

    let allocation = allocate(&by_class, first_size, n);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut first = Vec::with_capacity(first_size);
    let mut rest = Vec::with_capacity(n - first_size);

    for (label, mut positions) in by_class {
        let take = allocation.get(&label).copied().unwrap_or(0);
        positions.shuffle(&mut rng);
        let (chosen, remaining) = positions.split_at(take.min(positions.len()));
        first.extend_from_slice(chosen);
        rest.extend_from_slice(remaining);
    }

    first.sort_unstable();
    rest.sort_unstable();
    (first, rest)
}

/// Largest-remainder allocation of `size` slots across classes.
fn allocate(by_class: &BTreeMap<i32, Vec<usize>>, size: usize, total: usize) -> BTreeMap<i32, usize> {
    if total == 0 {
        return BTreeMap::new();
    }

    let mut allocation = BTreeMap::new();
    let mut remainders = Vec::with_capacity(by_class.len());
    let mut assigned = 0;

    for (&label, positions) in by_class {
        let share = size * positions.len();
        allocation.insert(label, share / total);
        remainders.push((share % total, label));
        assigned += share / total;
    }

    // Larger remainder first, lower label on ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, label) in remainders.into_iter().take(size - assigned) {
        if let Some(count) = allocation.get_mut(&label) {
            *count += 1;
        }
    }

    allocation
}

/// Partition a processed table into train/tune/test.
///
/// Fails with [`StrataError::InsufficientData`] when the table is empty or
/// its target has fewer than two classes.
pub fn split_three_way(table: &ProcessedTable, config: &SplitConfig) -> Result<Partitions> {
    config.validate()?;

    let labels = table.labels()?;
    if labels.is_empty() {
        return Err(StrataError::insufficient_data(
            "no rows remain after dropping missing values",
        ));
    }

    let classes = labels.iter().collect::<std::collections::BTreeSet<_>>().len();
    if classes < 2 {
        return Err(StrataError::insufficient_data(format!(
            "target '{}' has {classes} distinct class after filtering; stratification needs at least 2",
            table.target
        )));
    }

    let (train_rows, remainder) = stratified_indices(&labels, config.train_fraction, config.seed);

    let remainder_labels: Vec<i32> = remainder
        .iter()
        .filter_map(|&pos| labels.get(pos).copied())
        .collect();
    let (tune_local, test_local) =
        stratified_indices(&remainder_labels, config.tune_fraction, config.seed);

    let to_global = |local: Vec<usize>| -> Vec<usize> {
        local
            .into_iter()
            .filter_map(|i| remainder.get(i).copied())
            .collect()
    };

    let partitions = Partitions {
        train: Partition::take(&table.frame, train_rows)?,
        tune: Partition::take(&table.frame, to_global(tune_local))?,
        test: Partition::take(&table.frame, to_global(test_local))?,
    };

    tracing::debug!(
        train = partitions.train.len(),
        tune = partitions.tune.len(),
        test = partitions.test.len(),
        seed = config.seed,
        "Stratified split complete"
    );

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn labels(ones: usize, zeros: usize) -> Vec<i32> {
        // Interleave so stratification is not trivially positional.
        let mut out = Vec::with_capacity(ones + zeros);
        let (mut o, mut z) = (ones, zeros);
        while o + z > 0 {
            if o > 0 {
                out.push(1);
                o -= 1;
            }
            if z > 0 {
                out.push(0);
                z -= 1;
            }
        }
        out
    }

    fn prevalence(labels: &[i32], rows: &[usize]) -> f64 {
        let ones = rows
            .iter()
            .filter(|&&r| labels.get(r).copied() == Some(1))
            .count();
        ones as f64 / rows.len() as f64
    }

    #[test]
    fn test_sixty_forty_sizes() {
        let labels = labels(30, 70);
        let (first, rest) = stratified_indices(&labels, 0.6, DEFAULT_SEED);

        assert_eq!(first.len(), 60);
        assert_eq!(rest.len(), 40);
        assert!((prevalence(&labels, &first) - 0.3).abs() < 1e-9);
        assert!((prevalence(&labels, &rest) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_largest_remainder_allocation() {
        // 7 ones, 3 zeros, 6 slots: shares 4.2 and 1.8 -> 4 + 2
        let labels = labels(7, 3);
        let (first, _) = stratified_indices(&labels, 0.6, DEFAULT_SEED);

        let ones = first
            .iter()
            .filter(|&&r| labels.get(r).copied() == Some(1))
            .count();
        assert_eq!(first.len(), 6);
        assert_eq!(ones, 4);
    }

    #[test]
    fn test_seed_determinism() {
        let labels = labels(45, 55);
        let a = stratified_indices(&labels, 0.6, 7);
        let b = stratified_indices(&labels, 0.6, 7);
        let c = stratified_indices(&labels, 0.6, 8);

        assert_eq!(a, b);
        assert_ne!(a.0, c.0, "different seeds should pick different rows");
    }

    #[test]
    fn test_split_config_validation() {
        assert!(SplitConfig::default().validate().is_ok());

        let bad = SplitConfig {
            train_fraction: 1.0,
            ..SplitConfig::default()
        };
        assert!(matches!(bad.validate(), Err(StrataError::Configuration(_))));

        let bad = SplitConfig {
            tune_fraction: f64::NAN,
            ..SplitConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_split_is_exhaustive_and_disjoint(
            ones in 1_usize..200,
            zeros in 1_usize..200,
            seed in any::<u64>(),
        ) {
            let labels = labels(ones, zeros);
            let n = labels.len();
            let (first, rest) = stratified_indices(&labels, 0.6, seed);

            prop_assert_eq!(first.len() + rest.len(), n);
            let first_set: HashSet<_> = first.iter().collect();
            prop_assert!(rest.iter().all(|r| !first_set.contains(r)));
            prop_assert!((first.len() as f64 - n as f64 * 0.6).abs() < 1.0);

            // Each class deviates from its exact share by less than one row.
            let first_ones = first.iter().filter(|&&r| labels[r] == 1).count();
            let exact = first.len() as f64 * ones as f64 / n as f64;
            prop_assert!((first_ones as f64 - exact).abs() < 1.0);
        }
    }
}
