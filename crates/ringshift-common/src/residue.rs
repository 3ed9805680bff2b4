//! Residue and atom identity shared by the shift, coordinate and restraint
//! record sets.
//!
//! All three sources are keyed by the same normalized tuple
//! `(sequence index, chain id, residue name[, atom name])`. Which upstream
//! column feeds the sequence index is decided once per run by
//! [`NumberingConvention`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain label used when a record leaves the chain identifier unset.
pub const DEFAULT_CHAIN: &str = "A";

/// Backbone amide proton atom name.
pub const AMIDE_PROTON: &str = "H";

/// Cartesian position in Å.
pub type Position = [f64; 3];

/// Euclidean distance between two positions.
pub fn distance(a: &Position, b: &Position) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Which numbering scheme keys are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingConvention {
    /// Author-provided sequence numbering (`Auth_seq_ID` / `auth_seq_id`).
    Auth,
    /// Internal sequential numbering (`Comp_index_ID` / `label_seq_id`).
    #[default]
    Label,
}

impl fmt::Display for NumberingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Label => write!(f, "label"),
        }
    }
}

// ── Keys ─────────────────────────────────────────────────────────────────────

/// Normalized residue identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResidueKey {
    pub seq_id: i32,
    pub chain_id: String,
    pub residue_name: String,
}

impl ResidueKey {
    pub fn new(seq_id: i32, chain_id: impl Into<String>, residue_name: impl Into<String>) -> Self {
        Self {
            seq_id,
            chain_id: chain_id.into(),
            residue_name: residue_name.into(),
        }
    }

    pub fn atom(&self, atom_name: impl Into<String>) -> AtomKey {
        AtomKey {
            residue: self.clone(),
            atom_name: atom_name.into(),
        }
    }

    /// Number of residues between `self` and `other`, `None` across chains.
    pub fn sequence_separation(&self, other: &ResidueKey) -> Option<u32> {
        (self.chain_id == other.chain_id).then(|| self.seq_id.abs_diff(other.seq_id))
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.chain_id, self.residue_name, self.seq_id)
    }
}

/// Normalized atom identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomKey {
    pub residue: ResidueKey,
    pub atom_name: String,
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.residue, self.atom_name)
    }
}

/// Map an empty or placeholder chain identifier to [`DEFAULT_CHAIN`].
pub fn normalize_chain(raw: &str) -> &str {
    match raw.trim() {
        "" | "." | "?" => DEFAULT_CHAIN,
        chain => chain,
    }
}

/// Trim an atom name and fold the `HN` amide alias onto `H`.
pub fn normalize_atom_name(raw: &str) -> &str {
    match raw.trim() {
        "HN" => AMIDE_PROTON,
        name => name,
    }
}

// ── Aromatic residues ────────────────────────────────────────────────────────

/// Residues carrying an aromatic side-chain ring.
///
/// Variant order is the reporting order used by the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AromaticResidue {
    His,
    Trp,
    Phe,
    Tyr,
}

const PHE_RING: &[&str] = &[
    "CG", "CD1", "CD2", "CE1", "CE2", "CZ", "HD1", "HD2", "HE1", "HE2", "HZ",
];
const TYR_RING: &[&str] = &[
    "CG", "CD1", "CD2", "CE1", "CE2", "CZ", "HD1", "HD2", "HE1", "HE2", "HH",
];
const TRP_RING: &[&str] = &[
    "CD2", "CE2", "CE3", "CZ2", "CZ3", "CH2", "HE3", "HZ2", "HZ3", "HH2", "HE1",
];
const HIS_RING: &[&str] = &["CG", "ND1", "CD2", "CE1", "NE2", "HD1", "HD2", "HE1", "HE2"];

impl AromaticResidue {
    pub const ALL: [AromaticResidue; 4] = [Self::His, Self::Trp, Self::Phe, Self::Tyr];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "HIS" => Some(Self::His),
            "TRP" => Some(Self::Trp),
            "PHE" => Some(Self::Phe),
            "TYR" => Some(Self::Tyr),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::His => "HIS",
            Self::Trp => "TRP",
            Self::Phe => "PHE",
            Self::Tyr => "TYR",
        }
    }

    /// Position in [`AromaticResidue::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical ring atoms, heavy atoms first.
    pub fn ring_atoms(self) -> &'static [&'static str] {
        match self {
            Self::His => HIS_RING,
            Self::Trp => TRP_RING,
            Self::Phe => PHE_RING,
            Self::Tyr => TYR_RING,
        }
    }

    pub fn is_ring_atom(self, atom_name: &str) -> bool {
        self.ring_atoms().contains(&atom_name)
    }

    /// Resolve an atom reference, possibly a pseudo-atom, to ring atoms.
    ///
    /// Exact names resolve to themselves. `HD#`, `HD%` and `HD*` expand to
    /// every ring atom sharing the `HD` prefix, `QD` is the same group in
    /// pseudo-atom notation, and `QR` names all ring protons. Anything that
    /// matches no ring atom yields an empty list.
    pub fn expand_ring_atom(self, atom_name: &str) -> Vec<&'static str> {
        let name = atom_name.trim();
        if let Some(exact) = self.ring_atoms().iter().find(|a| **a == name) {
            return vec![*exact];
        }
        let prefix = if name == "QR" {
            "H".to_string()
        } else if let Some(stem) = name.strip_suffix(|c: char| matches!(c, '#' | '%' | '*')) {
            stem.to_string()
        } else if let Some(stem) = name.strip_prefix('Q') {
            format!("H{stem}")
        } else {
            return Vec::new();
        };
        self.ring_atoms()
            .iter()
            .copied()
            .filter(|a| a.starts_with(prefix.as_str()))
            .collect()
    }
}

impl fmt::Display for AromaticResidue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chain_defaults() {
        assert_eq!(normalize_chain("."), "A");
        assert_eq!(normalize_chain(""), "A");
        assert_eq!(normalize_chain("B"), "B");
    }

    #[test]
    fn test_hn_alias() {
        assert_eq!(normalize_atom_name("HN"), "H");
        assert_eq!(normalize_atom_name(" HA "), "HA");
    }

    #[test]
    fn test_his_ring_has_no_placeholders() {
        assert_eq!(AromaticResidue::His.ring_atoms().len(), 9);
        assert!(!AromaticResidue::His.is_ring_atom("xx"));
    }

    #[test]
    fn test_pseudo_atom_expansion() {
        let phe = AromaticResidue::Phe;
        assert_eq!(phe.expand_ring_atom("HD1"), vec!["HD1"]);
        assert_eq!(phe.expand_ring_atom("HD#"), vec!["HD1", "HD2"]);
        assert_eq!(phe.expand_ring_atom("QE"), vec!["HE1", "HE2"]);
        assert_eq!(phe.expand_ring_atom("QR"), vec!["HD1", "HD2", "HE1", "HE2", "HZ"]);
        assert!(phe.expand_ring_atom("HB2").is_empty());
    }

    #[test]
    fn test_residue_key_ordering_is_numeric() {
        let a = ResidueKey::new(9, "A", "ALA");
        let b = ResidueKey::new(10, "A", "ALA");
        assert!(a < b);
        assert_eq!(a.sequence_separation(&b), Some(1));
        assert_eq!(a.sequence_separation(&ResidueKey::new(9, "B", "ALA")), None);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(&[0.0, 0.0, 0.0], &[8.0, 0.0, 0.0]), 8.0);
    }
}
