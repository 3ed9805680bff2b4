//! Cross-tabulation of classified pairs over a batch.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ringshift_common::analysis_config::{AnalysisConfig, EntryId};
use ringshift_common::residue::{AromaticResidue, ResidueKey};
use ringshift_model::{EntryModel, EntrySet};

use crate::classify::{classify_amide, classify_pair, classify_shift, ConfidenceTier, PairClassification, ShiftClass};

/// Identifies one pair for later inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRef {
    pub entry: EntryId,
    pub amide: ResidueKey,
    pub ring: ResidueKey,
}

/// Count plus a bounded list of exemplars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub count: usize,
    pub exemplars: Vec<PairRef>,
}

/// Fixed-shape table indexed by (shift class, confidence tier, residue label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsTable {
    cells: [[[Cell; 4]; 4]; 3],
    max_exemplars: usize,
}

impl ResultsTable {
    pub fn new(max_exemplars: usize) -> Self {
        Self {
            cells: std::array::from_fn(|_| std::array::from_fn(|_| std::array::from_fn(|_| Cell::default()))),
            max_exemplars,
        }
    }

    pub fn record(&mut self, class: ShiftClass, tier: ConfidenceTier, label: AromaticResidue, pair: PairRef) {
        let cell = &mut self.cells[class.index()][tier.index()][label.index()];
        cell.count += 1;
        if cell.exemplars.len() < self.max_exemplars {
            cell.exemplars.push(pair);
        }
    }

    pub fn cell(&self, class: ShiftClass, tier: ConfidenceTier, label: AromaticResidue) -> &Cell {
        &self.cells[class.index()][tier.index()][label.index()]
    }

    pub fn count(&self, class: ShiftClass, tier: ConfidenceTier, label: AromaticResidue) -> usize {
        self.cell(class, tier, label).count
    }

    /// Sum over residue labels.
    pub fn tier_count(&self, class: ShiftClass, tier: ConfidenceTier) -> usize {
        self.cells[class.index()][tier.index()].iter().map(|c| c.count).sum()
    }

    pub fn total(&self) -> usize {
        ShiftClass::ALL
            .into_iter()
            .flat_map(|class| ConfidenceTier::ALL.into_iter().map(move |tier| (class, tier)))
            .map(|(class, tier)| self.tier_count(class, tier))
            .sum()
    }

    /// Every cell with its coordinates, in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (ShiftClass, ConfidenceTier, AromaticResidue, &Cell)> + '_ {
        ShiftClass::ALL.into_iter().flat_map(move |class| {
            ConfidenceTier::ALL.into_iter().flat_map(move |tier| {
                AromaticResidue::ALL
                    .into_iter()
                    .map(move |label| (class, tier, label, self.cell(class, tier, label)))
            })
        })
    }
}

/// Tables for pairs and for amide protons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// One count per defined pair
    pub pairs: ResultsTable,
    /// One count per amide with at least one defined pair, at its best tier
    pub amides: ResultsTable,
}

/// Tally every defined pair of every model in the set.
///
/// Undefined pairs (no evidence) are left out; they only count towards
/// pair existence in the batch report.
pub fn aggregate(entries: &EntrySet, config: &AnalysisConfig) -> Aggregation {
    let mut aggregation = Aggregation {
        pairs: ResultsTable::new(config.aggregation.max_exemplars),
        amides: ResultsTable::new(config.aggregation.max_exemplars),
    };
    for model in entries.models() {
        tally_model(model, config, &mut aggregation);
    }
    debug!(
        pairs = aggregation.pairs.total(),
        amides = aggregation.amides.total(),
        "Aggregated results"
    );
    aggregation
}

fn tally_model(model: &EntryModel, config: &AnalysisConfig, aggregation: &mut Aggregation) {
    for amide in &model.amides {
        if config.aggregation.exclude_unscoreable && !amide.scoreable {
            continue;
        }
        let class = classify_shift(amide.cs_sigma, config.outlier_sigma);

        let classified: Vec<(PairRef, PairClassification)> = model
            .defined_pairs()
            .filter(|p| p.amide == amide.residue)
            .filter_map(|p| {
                let classification = classify_pair(p, &config.tiers)?;
                let pair = PairRef {
                    entry: model.entry.clone(),
                    amide: p.amide.clone(),
                    ring: p.ring.clone(),
                };
                Some((pair, classification))
            })
            .collect();

        for (pair, c) in &classified {
            aggregation.pairs.record(class, c.tier, c.label, pair.clone());
        }

        let per_pair: Vec<PairClassification> = classified.iter().map(|(_, c)| *c).collect();
        if let Some(best) = classify_amide(&per_pair, &config.aggregation.label_priority) {
            let exemplar = classified
                .iter()
                .find(|(_, c)| c.tier == best.tier && c.label == best.label)
                .map(|(pair, _)| pair.clone());
            if let Some(exemplar) = exemplar {
                aggregation.amides.record(class, best.tier, best.label, exemplar);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_ref(seq: i32) -> PairRef {
        PairRef {
            entry: EntryId::new("1abc", "4001"),
            amide: ResidueKey::new(seq, "A", "ALA"),
            ring: ResidueKey::new(20, "A", "PHE"),
        }
    }

    #[test]
    fn test_exemplars_bounded() {
        let mut table = ResultsTable::new(2);
        for seq in 0..5 {
            table.record(ShiftClass::Downfield, ConfidenceTier::High, AromaticResidue::Phe, pair_ref(seq));
        }
        let cell = table.cell(ShiftClass::Downfield, ConfidenceTier::High, AromaticResidue::Phe);
        assert_eq!(cell.count, 5);
        assert_eq!(cell.exemplars.len(), 2);
        assert_eq!(table.total(), 5);
    }

    #[test]
    fn test_iter_covers_every_cell_once() {
        let table = ResultsTable::new(1);
        assert_eq!(table.iter().count(), 3 * 4 * 4);
        let (class, tier, label, _) = table.iter().next().unwrap();
        assert_eq!((class, tier, label), (ShiftClass::Upfield, ConfidenceTier::High, AromaticResidue::His));
    }

    #[test]
    fn test_table_serializes() {
        let mut table = ResultsTable::new(1);
        table.record(ShiftClass::Upfield, ConfidenceTier::Low, AromaticResidue::Trp, pair_ref(3));
        let json = serde_json::to_string(&table).unwrap();
        let back: ResultsTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
