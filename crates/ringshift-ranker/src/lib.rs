//! ringshift-ranker: Classification and batch-wide tallies.
//!
//! Classifies amide protons by shift outlier class and amide–aromatic
//! pairs by the confidence their NOE evidence gives, then cross-tabulates
//! every entry of a batch.

pub mod classify;
pub mod aggregate;
pub mod report;

pub use aggregate::{aggregate, Aggregation, Cell, PairRef, ResultsTable};
pub use classify::{classify_amide, classify_pair, classify_shift, ConfidenceTier, PairClassification, ShiftClass};
pub use report::BatchReport;
