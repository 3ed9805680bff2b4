//! Batch audit report.
//!
//! Counts every fatal and recoverable failure reason across the batch
//! alongside the pairing totals, so data-quality problems in the source
//! corpora stay visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use ringshift_common::analysis_config::AnalysisConfig;
use ringshift_common::residue::AromaticResidue;
use ringshift_model::EntrySet;

use crate::aggregate::ResultsTable;
use crate::classify::{classify_shift, ConfidenceTier, ShiftClass};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: usize,
    pub usable_entries: usize,
    /// Fatal reason → entries
    pub entry_failures: BTreeMap<String, usize>,
    /// Fatal reasons outside the known taxonomy → entries
    pub unanticipated_failures: BTreeMap<String, usize>,
    /// Residue failure reason → residues
    pub residue_failures: BTreeMap<String, usize>,
    /// Restraint failure reason → restraints
    pub restraint_failures: BTreeMap<String, usize>,
    pub pair_skeletons: usize,
    pub defined_pairs: usize,
    pub upfield_defined_pairs: usize,
    pub downfield_defined_pairs: usize,
    pub entries_with_defined_pairs: usize,
}

impl BatchReport {
    pub fn from_entries(entries: &EntrySet, config: &AnalysisConfig) -> Self {
        let mut report = Self {
            entries: entries.len(),
            ..Default::default()
        };

        for (entry, failure) in entries.failures() {
            let reason = failure.to_string();
            if !failure.is_anticipated() {
                warn!(entry = %entry, %reason, "Unanticipated entry failure");
                *report.unanticipated_failures.entry(reason.clone()).or_default() += 1;
            }
            *report.entry_failures.entry(reason).or_default() += 1;
        }

        for model in entries.models() {
            report.usable_entries += 1;
            for reason in model.exceptions_map_residues.values() {
                *report.residue_failures.entry(reason.to_string()).or_default() += 1;
            }
            for reason in model.exceptions_map_restraints.values() {
                *report.restraint_failures.entry(reason.to_string()).or_default() += 1;
            }

            report.pair_skeletons += model.pairs.len();
            let mut defined = 0;
            for pair in model.defined_pairs() {
                defined += 1;
                let class = model
                    .amide(&pair.amide)
                    .map(|a| classify_shift(a.cs_sigma, config.outlier_sigma));
                match class {
                    Some(ShiftClass::Upfield) => report.upfield_defined_pairs += 1,
                    Some(ShiftClass::Downfield) => report.downfield_defined_pairs += 1,
                    _ => {}
                }
            }
            report.defined_pairs += defined;
            if defined > 0 {
                report.entries_with_defined_pairs += 1;
            }
        }
        report
    }

    pub fn failed_entries(&self) -> usize {
        self.entry_failures.values().sum()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entries: {} ({} usable, {} failed)", self.entries, self.usable_entries, self.failed_entries())?;
        write_counts(f, "Entry failures", &self.entry_failures)?;
        if !self.unanticipated_failures.is_empty() {
            write_counts(f, "Unanticipated entry failures", &self.unanticipated_failures)?;
        }
        write_counts(f, "Residue failures", &self.residue_failures)?;
        write_counts(f, "Restraint failures", &self.restraint_failures)?;
        writeln!(f, "Pair skeletons: {}", self.pair_skeletons)?;
        writeln!(
            f,
            "Defined pairs: {} (upfield amide {}, downfield amide {})",
            self.defined_pairs, self.upfield_defined_pairs, self.downfield_defined_pairs
        )?;
        writeln!(f, "Entries with a defined pair: {}", self.entries_with_defined_pairs)
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, title: &str, counts: &BTreeMap<String, usize>) -> fmt::Result {
    writeln!(f, "{title}:")?;
    if counts.is_empty() {
        return writeln!(f, "  (none)");
    }
    for (reason, count) in counts {
        writeln!(f, "  {count:>6}  {reason}")?;
    }
    Ok(())
}

/// Text rendering of one results table; see [`render_table`].
#[derive(Debug, Clone, Copy)]
pub struct TableDisplay<'a> {
    title: &'a str,
    table: &'a ResultsTable,
}

/// One block per shift class: tiers down, residue labels across.
pub fn render_table<'a>(title: &'a str, table: &'a ResultsTable) -> TableDisplay<'a> {
    TableDisplay { title, table }
}

impl fmt::Display for TableDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for class in ShiftClass::ALL {
            write!(f, "{:<14}", class.to_string())?;
            for label in AromaticResidue::ALL {
                write!(f, "{:>6}", label.name())?;
            }
            writeln!(f, "{:>7}", "total")?;
            for tier in ConfidenceTier::ALL {
                write!(f, "  {:<12}", tier.to_string())?;
                for label in AromaticResidue::ALL {
                    write!(f, "{:>6}", self.table.count(class, tier, label))?;
                }
                writeln!(f, "{:>7}", self.table.tier_count(class, tier))?;
            }
        }
        Ok(())
    }
}
