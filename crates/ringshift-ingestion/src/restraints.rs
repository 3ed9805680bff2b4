//! NOE distance restraint records.
//!
//! Upstream restraint lists arrive as one row per atom reference; rows
//! sharing a `restraint_id` form one restraint with two sides. A side with
//! several references (or a pseudo-atom name) is an atom set that the
//! attacher has to resolve.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ringshift_common::error::{Result, RingshiftError};
use ringshift_common::residue::{normalize_atom_name, normalize_chain, ResidueKey};

use crate::records::RecordRow;

const RESTRAINT_ID: &str = "restraint_id";
const SIDE: &str = "side";
const SEQ_ID: &str = "seq_id";
const CHAIN_ID: &str = "chain_id";
const RESIDUE_NAME: &str = "residue_name";
const ATOM_NAME: &str = "atom_name";
const UPPER_BOUND: &str = "upper_bound";

/// One atom reference as written in the restraint list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomRef {
    pub seq_id: i32,
    pub chain_id: String,
    pub residue_name: String,
    pub atom_name: String,
}

impl AtomRef {
    pub fn new(
        seq_id: i32,
        chain_id: impl Into<String>,
        residue_name: impl Into<String>,
        atom_name: impl Into<String>,
    ) -> Self {
        Self {
            seq_id,
            chain_id: chain_id.into(),
            residue_name: residue_name.into(),
            atom_name: atom_name.into(),
        }
    }

    pub fn residue_key(&self) -> ResidueKey {
        ResidueKey::new(self.seq_id, self.chain_id.clone(), self.residue_name.clone())
    }
}

/// A distance restraint between two atom sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestraintRecord {
    pub id: String,
    pub sides: [Vec<AtomRef>; 2],
    /// Upper distance bound in Å
    pub upper_bound: Option<f64>,
}

/// Group per-reference rows into restraints, in order of first appearance.
pub fn group_restraint_rows(rows: &[RecordRow]) -> Result<Vec<RestraintRecord>> {
    let mut restraints: Vec<RestraintRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let id = row.require(RESTRAINT_ID)?.to_string();
        let side: usize = match row.require(SIDE)? {
            "1" => 0,
            "2" => 1,
            other => {
                return Err(RingshiftError::malformed(
                    SIDE,
                    format!("`{other}` is not 1 or 2"),
                ))
            }
        };
        let atom = AtomRef {
            seq_id: row.parse(SEQ_ID)?,
            chain_id: normalize_chain(row.require(CHAIN_ID)?).to_string(),
            residue_name: row.require(RESIDUE_NAME)?.to_string(),
            atom_name: normalize_atom_name(row.require(ATOM_NAME)?).to_string(),
        };
        let bound = row.parse_optional_finite(UPPER_BOUND)?;

        let slot = *index.entry(id.clone()).or_insert_with(|| {
            restraints.push(RestraintRecord {
                id,
                sides: [Vec::new(), Vec::new()],
                upper_bound: None,
            });
            restraints.len() - 1
        });
        let restraint = &mut restraints[slot];
        restraint.sides[side].push(atom);
        if restraint.upper_bound.is_none() {
            restraint.upper_bound = bound;
        }
    }

    if let Some(open) = restraints.iter().find(|r| r.sides.iter().any(Vec::is_empty)) {
        return Err(RingshiftError::malformed(
            SIDE,
            format!("restraint {} names atoms on one side only", open.id),
        ));
    }
    Ok(restraints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, side: &str, seq: &str, comp: &str, atom: &str) -> RecordRow {
        RecordRow::new()
            .with("restraint_id", id)
            .with("side", side)
            .with("seq_id", seq)
            .with("chain_id", ".")
            .with("residue_name", comp)
            .with("atom_name", atom)
            .with("upper_bound", "5.0")
    }

    #[test]
    fn test_rows_grouped_by_id() {
        let rows = vec![
            member("1", "1", "3", "ALA", "HN"),
            member("1", "2", "7", "PHE", "HD1"),
            member("1", "2", "7", "PHE", "HD2"),
            member("2", "1", "4", "GLY", "H"),
            member("2", "2", "7", "PHE", "QE"),
        ];
        let restraints = group_restraint_rows(&rows).unwrap();
        assert_eq!(restraints.len(), 2);
        assert_eq!(restraints[0].sides[0], vec![AtomRef::new(3, "A", "ALA", "H")]);
        assert_eq!(restraints[0].sides[1].len(), 2);
        assert_eq!(restraints[1].upper_bound, Some(5.0));
    }

    #[test]
    fn test_one_sided_restraint_is_malformed() {
        let rows = vec![member("9", "1", "3", "ALA", "H")];
        assert!(group_restraint_rows(&rows).unwrap_err().is_malformed_record());
    }

    #[test]
    fn test_bad_side_is_malformed() {
        let rows = vec![member("9", "3", "3", "ALA", "H")];
        assert!(group_restraint_rows(&rows).is_err());
    }
}
