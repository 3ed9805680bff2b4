//! Atom position extraction from `atom_site` rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use ringshift_common::error::Result;
use ringshift_common::residue::{
    normalize_atom_name, normalize_chain, AromaticResidue, AtomKey, NumberingConvention, Position,
    ResidueKey, AMIDE_PROTON,
};

use crate::records::{is_null, RecordRow};

/// One candidate location of an atom.
#[derive(Debug, Clone)]
struct Located {
    alt_id: Option<String>,
    position: Position,
}

impl Located {
    /// Unlabelled first, then by alternate-location id, then by position
    /// so duplicated rows resolve the same way in any order.
    fn preference(&self, other: &Self) -> Ordering {
        self.alt_id.cmp(&other.alt_id).then_with(|| {
            self.position
                .iter()
                .zip(other.position.iter())
                .map(|(a, b)| a.total_cmp(b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }
}

/// Rows of the `atom_site` category of one structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTable {
    pub rows: Vec<RecordRow>,
}

const MODEL_NUM: &str = "pdbx_PDB_model_num";
const CARTN_X: &str = "Cartn_x";
const CARTN_Y: &str = "Cartn_y";
const CARTN_Z: &str = "Cartn_z";
const ALT_ID: &str = "label_alt_id";

/// Identity columns of `atom_site` under one numbering convention.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateColumns {
    pub seq_id: &'static str,
    pub chain_id: &'static str,
    pub residue_name: &'static str,
    pub atom_name: &'static str,
}

impl CoordinateColumns {
    pub fn for_convention(numbering: NumberingConvention) -> Self {
        match numbering {
            NumberingConvention::Auth => Self {
                seq_id: "auth_seq_id",
                chain_id: "auth_asym_id",
                residue_name: "auth_comp_id",
                atom_name: "auth_atom_id",
            },
            NumberingConvention::Label => Self {
                seq_id: "label_seq_id",
                chain_id: "label_asym_id",
                residue_name: "label_comp_id",
                atom_name: "label_atom_id",
            },
        }
    }
}

/// Positions of one conformer.
pub type ModelCoordinates = BTreeMap<AtomKey, Position>;

/// Positions of every conformer, by model number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateModels {
    models: BTreeMap<u32, ModelCoordinates>,
}

impl CoordinateModels {
    pub fn model(&self, model_number: u32) -> Option<&ModelCoordinates> {
        self.models.get(&model_number)
    }

    pub fn model_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.models.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The preferred conformer, or the lowest-numbered one when the
    /// preferred model is not present.
    pub fn representative(&self, preferred: u32) -> Option<(u32, &ModelCoordinates)> {
        self.models
            .get_key_value(&preferred)
            .or_else(|| self.models.iter().next())
            .map(|(n, m)| (*n, m))
    }
}

/// Extract amide proton and aromatic ring atom positions.
///
/// Atoms without a sequence position (waters, ligands) are skipped. When
/// alternate locations repeat an atom, the unlabelled location is kept,
/// otherwise the lowest `label_alt_id`, whatever order the rows come in.
pub fn extract_coordinates(
    table: &CoordinateTable,
    numbering: NumberingConvention,
) -> Result<CoordinateModels> {
    let cols = CoordinateColumns::for_convention(numbering);
    let mut located: BTreeMap<u32, BTreeMap<AtomKey, Located>> = BTreeMap::new();

    for row in &table.rows {
        let atom_name = normalize_atom_name(row.require(cols.atom_name)?);
        let residue_name = row.require(cols.residue_name)?;
        let keep = atom_name == AMIDE_PROTON
            || AromaticResidue::from_name(residue_name)
                .is_some_and(|aromatic| aromatic.is_ring_atom(atom_name));
        if !keep {
            continue;
        }
        let Some(seq_id) = row.parse_optional::<i32>(cols.seq_id)? else {
            continue;
        };

        let model_number: u32 = row.parse(MODEL_NUM)?;
        let position: Position = [
            row.parse_finite(CARTN_X)?,
            row.parse_finite(CARTN_Y)?,
            row.parse_finite(CARTN_Z)?,
        ];
        let chain_id = normalize_chain(row.require(cols.chain_id)?);
        let key = ResidueKey::new(seq_id, chain_id, residue_name).atom(atom_name);
        let candidate = Located {
            alt_id: row.get(ALT_ID).filter(|v| !is_null(v)).map(str::to_string),
            position,
        };

        let atoms = located.entry(model_number).or_default();
        let replace = atoms
            .get(&key)
            .map_or(true, |kept| kept.preference(&candidate) == Ordering::Greater);
        if replace {
            atoms.insert(key, candidate);
        }
    }

    let models: BTreeMap<u32, ModelCoordinates> = located
        .into_iter()
        .map(|(n, atoms)| (n, atoms.into_iter().map(|(k, l)| (k, l.position)).collect()))
        .collect();

    debug!(
        models = models.len(),
        atoms = models.values().next().map(|m| m.len()).unwrap_or(0),
        "Extracted coordinates"
    );
    Ok(CoordinateModels { models })
}
