//! The fused per-entry model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ringshift_common::analysis_config::EntryId;
use ringshift_common::residue::{distance, AromaticResidue, NumberingConvention, Position, ResidueKey};
use ringshift_ingestion::RingShift;

use crate::failure::{ResidueFailure, RestraintFailure};

/// One backbone amide proton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmideProton {
    pub residue: ResidueKey,
    pub shift: f64,
    pub cs_sigma: f64,
    /// False when `cs_sigma` is the neutral fallback for a residue
    /// without reference statistics
    pub scoreable: bool,
    /// Absent when the coordinates have no matching atom
    pub position: Option<Position>,
}

/// One aromatic side chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AromaticRing {
    pub residue: ResidueKey,
    pub kind: AromaticResidue,
    pub shifts: BTreeMap<String, RingShift>,
    pub positions: BTreeMap<String, Position>,
}

impl AromaticRing {
    pub fn is_positioned(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Closest distance between `point` and any positioned ring atom.
    pub fn min_distance_to(&self, point: &Position) -> Option<f64> {
        self.positions
            .values()
            .map(|atom| distance(point, atom))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// How precisely a restraint names its ring partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceTag {
    /// A single ring atom
    Atom,
    /// A pseudo-atom or atom set within one ring
    Ring,
}

/// One NOE restraint confirming an amide–ring contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub restraint_id: String,
    pub ring_atoms: Vec<String>,
    pub upper_bound: Option<f64>,
    pub tag: EvidenceTag,
}

/// An amide proton within range of an aromatic ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmideAromaticPair {
    pub amide: ResidueKey,
    pub ring: ResidueKey,
    /// Closest amide H to ring atom distance (Å)
    pub min_distance: f64,
    pub evidence: Vec<Evidence>,
}

impl AmideAromaticPair {
    /// A pair skeleton with no evidence yet.
    pub fn skeleton(amide: ResidueKey, ring: ResidueKey, min_distance: f64) -> Self {
        Self {
            amide,
            ring,
            min_distance,
            evidence: Vec::new(),
        }
    }

    /// A pair without restraint evidence.
    pub fn is_undefined(&self) -> bool {
        self.evidence.is_empty()
    }
}

/// The fused model of one (structure, shift set) entry.
///
/// Amides, rings and pairs are kept sorted by residue key, so two models
/// built from the same records compare equal whatever the row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryModel {
    pub entry: EntryId,
    pub numbering: NumberingConvention,
    /// Conformer the positions were taken from
    pub model_number: u32,
    pub amides: Vec<AmideProton>,
    pub rings: Vec<AromaticRing>,
    pub pairs: Vec<AmideAromaticPair>,
    /// Residue index → first identity-resolution failure
    pub exceptions_map_residues: BTreeMap<String, ResidueFailure>,
    /// Restraint id → attachment failure
    pub exceptions_map_restraints: BTreeMap<String, RestraintFailure>,
}

impl EntryModel {
    pub fn new(entry: EntryId, numbering: NumberingConvention, model_number: u32) -> Self {
        Self {
            entry,
            numbering,
            model_number,
            amides: Vec::new(),
            rings: Vec::new(),
            pairs: Vec::new(),
            exceptions_map_residues: BTreeMap::new(),
            exceptions_map_restraints: BTreeMap::new(),
        }
    }

    pub fn amide(&self, residue: &ResidueKey) -> Option<&AmideProton> {
        self.amides
            .binary_search_by(|a| a.residue.cmp(residue))
            .ok()
            .map(|i| &self.amides[i])
    }

    pub fn ring(&self, residue: &ResidueKey) -> Option<&AromaticRing> {
        self.rings
            .binary_search_by(|r| r.residue.cmp(residue))
            .ok()
            .map(|i| &self.rings[i])
    }

    fn pair_index(&self, amide: &ResidueKey, ring: &ResidueKey) -> Option<usize> {
        self.pairs
            .binary_search_by(|p| (&p.amide, &p.ring).cmp(&(amide, ring)))
            .ok()
    }

    pub fn pair(&self, amide: &ResidueKey, ring: &ResidueKey) -> Option<&AmideAromaticPair> {
        self.pair_index(amide, ring).map(|i| &self.pairs[i])
    }

    pub fn pair_mut(&mut self, amide: &ResidueKey, ring: &ResidueKey) -> Option<&mut AmideAromaticPair> {
        self.pair_index(amide, ring).map(move |i| &mut self.pairs[i])
    }

    /// Pairs carrying at least one restraint.
    pub fn defined_pairs(&self) -> impl Iterator<Item = &AmideAromaticPair> + '_ {
        self.pairs.iter().filter(|p| !p.is_undefined())
    }

    /// Log a residue failure; the first reason recorded for a residue wins.
    pub fn record_residue_failure(&mut self, residue: &ResidueKey, reason: ResidueFailure) {
        self.exceptions_map_residues
            .entry(residue.seq_id.to_string())
            .or_insert(reason);
    }

    pub fn record_restraint_failure(&mut self, restraint_id: &str, reason: RestraintFailure) {
        self.exceptions_map_restraints
            .insert(restraint_id.to_string(), reason);
    }

    /// Drop pairs no restraint confirmed. Returns how many were removed.
    pub fn prune_undefined_pairs(&mut self) -> usize {
        let before = self.pairs.len();
        self.pairs.retain(|p| !p.is_undefined());
        before - self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seq: i32, comp: &str) -> ResidueKey {
        ResidueKey::new(seq, "A", comp)
    }

    fn model_with_pairs() -> EntryModel {
        let mut model = EntryModel::new(EntryId::new("1abc", "4001"), NumberingConvention::Label, 1);
        let mut confirmed = AmideAromaticPair::skeleton(key(3, "ALA"), key(7, "PHE"), 4.2);
        confirmed.evidence.push(Evidence {
            restraint_id: "12".into(),
            ring_atoms: vec!["HD1".into()],
            upper_bound: Some(4.5),
            tag: EvidenceTag::Atom,
        });
        model.pairs = vec![
            confirmed,
            AmideAromaticPair::skeleton(key(4, "GLY"), key(7, "PHE"), 6.8),
        ];
        model
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut model = model_with_pairs();
        assert_eq!(model.prune_undefined_pairs(), 1);
        let once = model.pairs.clone();
        assert_eq!(model.prune_undefined_pairs(), 0);
        assert_eq!(model.pairs, once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_pair_lookup() {
        let mut model = model_with_pairs();
        assert!(model.pair(&key(4, "GLY"), &key(7, "PHE")).is_some());
        assert!(model.pair(&key(7, "PHE"), &key(4, "GLY")).is_none());
        model
            .pair_mut(&key(4, "GLY"), &key(7, "PHE"))
            .unwrap()
            .min_distance = 6.0;
        assert_eq!(model.defined_pairs().count(), 1);
    }

    #[test]
    fn test_residue_failure_recorded_once_per_residue() {
        let mut model = model_with_pairs();
        model.record_residue_failure(&key(9, "LEU"), ResidueFailure::ResidueIndexMismatch);
        model.record_residue_failure(&key(9, "LEU"), ResidueFailure::ResidueIndexMismatch);
        assert_eq!(model.exceptions_map_residues.len(), 1);
        assert_eq!(model.exceptions_map_residues["9"], ResidueFailure::ResidueIndexMismatch);
    }

    #[test]
    fn test_min_distance_to_ring() {
        let ring = AromaticRing {
            residue: key(7, "PHE"),
            kind: AromaticResidue::Phe,
            shifts: BTreeMap::new(),
            positions: BTreeMap::from([
                ("CG".to_string(), [0.0, 0.0, 0.0]),
                ("CZ".to_string(), [0.0, 0.0, 3.0]),
            ]),
        };
        assert_eq!(ring.min_distance_to(&[0.0, 0.0, 5.0]), Some(2.0));
    }
}
