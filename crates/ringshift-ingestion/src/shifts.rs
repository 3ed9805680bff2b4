//! Chemical-shift extraction.
//!
//! Keeps two kinds of rows from the assigned-shift loop: backbone amide
//! protons (scored on the way in) and canonical ring atoms of PHE, TYR,
//! TRP and HIS. Everything else is dropped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use ringshift_common::error::Result;
use ringshift_common::outlier::OutlierScorer;
use ringshift_common::residue::{
    normalize_atom_name, normalize_chain, AromaticResidue, AtomKey, NumberingConvention,
    ResidueKey, AMIDE_PROTON,
};

use crate::records::RecordRow;

/// Assigned chemical shifts of one shift set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftTable {
    /// Rows of the `Atom_chem_shift` loop
    pub rows: Vec<RecordRow>,
    /// `_Entity_assembly.Entity_ID`, one value per assembly member
    pub entity_assembly: Vec<String>,
}

/// Column names of the shift loop under one numbering convention.
#[derive(Debug, Clone, Copy)]
pub struct ShiftColumns {
    pub seq_id: &'static str,
    pub chain_id: &'static str,
    pub residue_name: &'static str,
    pub atom_name: &'static str,
    pub value: &'static str,
    pub ambiguity: &'static str,
}

impl ShiftColumns {
    pub fn for_convention(numbering: NumberingConvention) -> Self {
        Self {
            seq_id: match numbering {
                NumberingConvention::Auth => "Auth_seq_ID",
                NumberingConvention::Label => "Comp_index_ID",
            },
            chain_id: "Auth_asym_ID",
            residue_name: "Comp_ID",
            atom_name: "Atom_ID",
            value: "Val",
            ambiguity: "Ambiguity_code",
        }
    }
}

/// Shift of one amide proton with its outlier score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmideShift {
    pub value: f64,
    pub cs_sigma: f64,
    /// False when the residue has no reference statistics and `cs_sigma`
    /// is the neutral 0.0 fallback
    pub scoreable: bool,
}

/// Shift of one aromatic ring atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingShift {
    pub value: f64,
    /// NMR-STAR ambiguity code, absent when the record leaves it null
    pub ambiguity: Option<u8>,
}

/// Output of [`extract_shifts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftExtraction {
    pub amides: BTreeMap<AtomKey, AmideShift>,
    pub aromatics: BTreeMap<ResidueKey, BTreeMap<String, RingShift>>,
    /// Distinct entities in the assembly
    pub entity_count: usize,
    /// Members of the assembly
    pub assembly_count: usize,
}

/// Extract amide and aromatic ring shifts from a shift table.
///
/// Fails with a malformed-record error on the first row that lacks a
/// required column or carries an unparseable value; the entry is then
/// unusable as a whole.
pub fn extract_shifts(
    table: &ShiftTable,
    numbering: NumberingConvention,
    scorer: &OutlierScorer,
) -> Result<ShiftExtraction> {
    let cols = ShiftColumns::for_convention(numbering);
    let mut extraction = ShiftExtraction {
        entity_count: table.entity_assembly.iter().collect::<BTreeSet<_>>().len(),
        assembly_count: table.entity_assembly.len(),
        ..Default::default()
    };

    for row in &table.rows {
        let atom_name = normalize_atom_name(row.require(cols.atom_name)?);
        let residue_name = row.require(cols.residue_name)?;
        let is_amide = atom_name == AMIDE_PROTON;
        let is_ring_atom = AromaticResidue::from_name(residue_name)
            .is_some_and(|aromatic| aromatic.is_ring_atom(atom_name));
        if !is_amide && !is_ring_atom {
            continue;
        }

        let seq_id: i32 = row.parse(cols.seq_id)?;
        let chain_id = normalize_chain(row.require(cols.chain_id)?);
        let value = row.parse_finite(cols.value)?;
        let residue = ResidueKey::new(seq_id, chain_id, residue_name);

        if is_amide {
            extraction.amides.insert(
                residue.atom(AMIDE_PROTON),
                AmideShift {
                    value,
                    cs_sigma: scorer.score(residue_name, value),
                    scoreable: scorer.is_scoreable(residue_name),
                },
            );
        } else {
            let ambiguity = row.parse_optional::<u8>(cols.ambiguity)?;
            extraction
                .aromatics
                .entry(residue)
                .or_default()
                .insert(atom_name.to_string(), RingShift { value, ambiguity });
        }
    }

    debug!(
        amides = extraction.amides.len(),
        rings = extraction.aromatics.len(),
        entities = extraction.entity_count,
        assembly = extraction.assembly_count,
        "Extracted shifts"
    );
    Ok(extraction)
}
