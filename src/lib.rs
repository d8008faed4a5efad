//! # Strata - Stratified Dataset Preparation
//!
//! Strata turns a raw tabular dataset into binary-classification-ready
//! train/tune/test partitions. Two dataset shapes ship as built-in profiles:
//! an institution-completion table and a student-placement table.
//!
//! ## Quick Start
//!
//! ```no_run
//! use strata::io::load_csv;
//! use strata::pipeline::{DatasetProfile, run};
//!
//! let raw = load_csv("cc_institution_details.csv")?;
//! let output = run(&raw, &DatasetProfile::institution())?;
//!
//! println!("{}", output.report.summary());
//! for (name, part) in output.partitions.named() {
//!     println!("{name}: {:?}", part.shape());
//! }
//! # Ok::<(), strata::error::StrataError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: the transform steps, profiles and the stratified split
//! - [`io`]: CSV loading and partition output
//! - [`config`]: persisted settings (seed, split fractions, directories)
//! - [`error`]: error types and handling utilities
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Determinism
//!
//! Every step is a pure function of its input table. The split draws from a
//! `ChaCha8Rng` seeded from [`pipeline::SplitConfig::seed`] (42 by default),
//! so the same input and seed always produce the same partition membership.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
