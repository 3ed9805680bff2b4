//! Fusion of extracted shifts with one conformer's coordinates.
//!
//! Shift keys and coordinate keys are matched verbatim; both extractors
//! already normalized them under the same numbering convention.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use ringshift_common::analysis_config::{AnalysisConfig, EntryId};
use ringshift_common::residue::{AromaticResidue, ResidueKey};
use ringshift_ingestion::{CoordinateModels, ShiftExtraction};

use crate::failure::{EntryFailure, ResidueFailure};
use crate::protein::{AmideProton, AromaticRing, EntryModel};

/// Build the entry model from extractor outputs.
///
/// Residue-level mismatches are logged in the model; only whole-entry
/// problems produce an error.
pub fn fuse(
    entry: &EntryId,
    shifts: ShiftExtraction,
    coordinates: &CoordinateModels,
    config: &AnalysisConfig,
) -> Result<EntryModel, EntryFailure> {
    if shifts.entity_count > 1 || shifts.assembly_count > 1 {
        return Err(EntryFailure::NonProteinEntry);
    }

    let preferred = config.fusion.model_number;
    let (model_number, positions) = coordinates
        .representative(preferred)
        .ok_or(EntryFailure::EmptyCoordinateFile)?;
    if model_number != preferred {
        warn!(
            entry = %entry,
            preferred,
            used = model_number,
            "Preferred conformer missing, using lowest model"
        );
    }

    let mut model = EntryModel::new(entry.clone(), config.numbering, model_number);
    let present: BTreeSet<&ResidueKey> = positions.keys().map(|atom| &atom.residue).collect();

    // ── Amide protons ────────────────────────────────────────────────────────

    let mut unresolved = 0usize;
    for (key, amide) in shifts.amides {
        let position = positions.get(&key).copied();
        if position.is_none() {
            unresolved += 1;
            debug!(
                entry = %entry,
                residue = %key.residue,
                residue_positioned = present.contains(&key.residue),
                "Amide proton unresolved"
            );
            model.record_residue_failure(&key.residue, ResidueFailure::ResidueIndexMismatch);
        }
        model.amides.push(AmideProton {
            residue: key.residue,
            shift: amide.value,
            cs_sigma: amide.cs_sigma,
            scoreable: amide.scoreable,
            position,
        });
    }

    // ── Aromatic rings ───────────────────────────────────────────────────────

    let mut ring_shifts = shifts.aromatics;
    let ring_residues: BTreeSet<ResidueKey> = ring_shifts
        .keys()
        .cloned()
        .chain(
            present
                .iter()
                .filter(|r| AromaticResidue::from_name(&r.residue_name).is_some())
                .map(|r| (*r).clone()),
        )
        .collect();

    for residue in ring_residues {
        let Some(kind) = AromaticResidue::from_name(&residue.residue_name) else {
            continue;
        };
        let atom_shifts = ring_shifts.remove(&residue).unwrap_or_default();
        let ring_positions: BTreeMap<String, _> = kind
            .ring_atoms()
            .iter()
            .filter_map(|atom| {
                positions
                    .get(&residue.atom(*atom))
                    .map(|p| (atom.to_string(), *p))
            })
            .collect();
        if let Some(atom) = atom_shifts.keys().find(|a| !ring_positions.contains_key(*a)) {
            debug!(
                entry = %entry,
                residue = %residue,
                atom = %atom,
                residue_positioned = present.contains(&residue),
                "Ring atom unresolved"
            );
            model.record_residue_failure(&residue, ResidueFailure::ResidueIndexMismatch);
        }
        model.rings.push(AromaticRing {
            residue,
            kind,
            shifts: atom_shifts,
            positions: ring_positions,
        });
    }

    if model.rings.is_empty() {
        return Err(EntryFailure::NoAromaticResidues);
    }

    let total = model.amides.len();
    if total > 0 {
        let fraction = unresolved as f64 / total as f64;
        if unresolved == total || fraction > config.fusion.max_unresolved_fraction {
            warn!(entry = %entry, unresolved, total, "Severe residue index mismatch");
            return Err(EntryFailure::SevereResidueIndexMismatch);
        }
    }

    debug!(
        entry = %entry,
        amides = model.amides.len(),
        rings = model.rings.len(),
        residue_failures = model.exceptions_map_residues.len(),
        "Fused entry"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringshift_common::residue::AtomKey;
    use ringshift_ingestion::{AmideShift, RingShift};

    fn amide_shift(value: f64) -> AmideShift {
        AmideShift { value, cs_sigma: 0.5, scoreable: true }
    }

    fn extraction(amides: &[(i32, &str)], rings: &[(i32, &str)]) -> ShiftExtraction {
        let mut out = ShiftExtraction {
            entity_count: 1,
            assembly_count: 1,
            ..Default::default()
        };
        for (seq, comp) in amides {
            out.amides
                .insert(ResidueKey::new(*seq, "A", *comp).atom("H"), amide_shift(8.2));
        }
        for (seq, comp) in rings {
            out.aromatics.insert(
                ResidueKey::new(*seq, "A", *comp),
                BTreeMap::from([("HD1".to_string(), RingShift { value: 7.1, ambiguity: Some(1) })]),
            );
        }
        out
    }

    fn coordinates(model: u32, atoms: &[(i32, &str, &str)]) -> CoordinateModels {
        let mut atom_site = ringshift_ingestion::CoordinateTable::default();
        for (i, (seq, comp, atom)) in atoms.iter().enumerate() {
            atom_site.rows.push(
                ringshift_ingestion::RecordRow::new()
                    .with("pdbx_PDB_model_num", model.to_string())
                    .with("label_seq_id", seq.to_string())
                    .with("label_asym_id", "A")
                    .with("label_comp_id", *comp)
                    .with("label_atom_id", *atom)
                    .with("Cartn_x", format!("{}.0", i))
                    .with("Cartn_y", "0.0")
                    .with("Cartn_z", "0.0"),
            );
        }
        ringshift_ingestion::extract_coordinates(&atom_site, Default::default()).unwrap()
    }

    fn entry() -> EntryId {
        EntryId::new("2xyz", "5002")
    }

    #[test]
    fn test_unresolved_amide_kept_without_position() {
        let shifts = extraction(&[(3, "ALA"), (4, "GLY"), (5, "LEU")], &[(7, "PHE")]);
        let coords = coordinates(1, &[(3, "ALA", "H"), (4, "GLY", "H"), (7, "PHE", "HD1")]);
        let model = fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap();

        assert_eq!(model.amides.len(), 3);
        let missing = model.amide(&ResidueKey::new(5, "A", "LEU")).unwrap();
        assert!(missing.position.is_none());
        assert_eq!(
            model.exceptions_map_residues["5"],
            ResidueFailure::ResidueIndexMismatch
        );
    }

    #[test]
    fn test_ring_atom_missing_from_positioned_residue() {
        let shifts = extraction(&[(3, "ALA"), (4, "GLY")], &[(7, "PHE")]);
        let coords = coordinates(1, &[(3, "ALA", "H"), (4, "GLY", "H"), (7, "PHE", "CZ")]);
        let model = fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            model.exceptions_map_residues["7"],
            ResidueFailure::ResidueIndexMismatch
        );
        let ring = model.ring(&ResidueKey::new(7, "A", "PHE")).unwrap();
        assert!(ring.is_positioned());
        assert!(ring.positions.contains_key("CZ"));
    }

    #[test]
    fn test_aromatic_amide_without_proton_position() {
        let shifts = extraction(&[(3, "ALA"), (4, "GLY"), (7, "PHE")], &[(7, "PHE")]);
        let coords = coordinates(
            1,
            &[(3, "ALA", "H"), (4, "GLY", "H"), (7, "PHE", "HD1"), (7, "PHE", "CZ")],
        );
        let model = fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap();
        let amide = model.amide(&ResidueKey::new(7, "A", "PHE")).unwrap();
        assert!(amide.position.is_none());
        assert_eq!(
            model.exceptions_map_residues["7"],
            ResidueFailure::ResidueIndexMismatch
        );
        assert!(model.ring(&ResidueKey::new(7, "A", "PHE")).unwrap().is_positioned());
    }

    #[test]
    fn test_ring_only_in_coordinates_is_added() {
        let shifts = extraction(&[(3, "ALA")], &[]);
        let coords = coordinates(1, &[(3, "ALA", "H"), (9, "TYR", "HE1")]);
        let model = fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap();
        let ring = model.ring(&ResidueKey::new(9, "A", "TYR")).unwrap();
        assert!(ring.shifts.is_empty());
        assert_eq!(ring.kind, AromaticResidue::Tyr);
    }

    #[test]
    fn test_multi_entity_is_non_protein() {
        let mut shifts = extraction(&[(3, "ALA")], &[(7, "PHE")]);
        shifts.entity_count = 2;
        shifts.assembly_count = 2;
        let coords = coordinates(1, &[(3, "ALA", "H")]);
        assert_eq!(
            fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap_err(),
            EntryFailure::NonProteinEntry
        );
    }

    #[test]
    fn test_no_aromatic_residues() {
        let shifts = extraction(&[(3, "ALA")], &[]);
        let coords = coordinates(1, &[(3, "ALA", "H")]);
        assert_eq!(
            fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap_err(),
            EntryFailure::NoAromaticResidues
        );
    }

    #[test]
    fn test_severe_mismatch_when_no_amide_resolves() {
        let shifts = extraction(&[(3, "ALA"), (4, "GLY")], &[(7, "PHE")]);
        let coords = coordinates(1, &[(103, "ALA", "H"), (7, "PHE", "HD1")]);
        assert_eq!(
            fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap_err(),
            EntryFailure::SevereResidueIndexMismatch
        );
    }

    #[test]
    fn test_falls_back_to_lowest_model() {
        let shifts = extraction(&[(3, "ALA")], &[(7, "PHE")]);
        let coords = coordinates(4, &[(3, "ALA", "H"), (7, "PHE", "HD1")]);
        let model = fuse(&entry(), shifts, &coords, &AnalysisConfig::default()).unwrap();
        assert_eq!(model.model_number, 4);
        assert!(model.amides[0].position.is_some());
        assert!(coords
            .model(4)
            .unwrap()
            .contains_key(&AtomKey {
                residue: ResidueKey::new(3, "A", "ALA"),
                atom_name: "H".into()
            }));
    }
}
