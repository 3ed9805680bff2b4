//! Attachment of NOE restraints to amide–aromatic pairs.
//!
//! Each side of a restraint is resolved against the entities of the model:
//! the amide proton of a known residue, or atoms of a known ring (pseudo-
//! atoms expanded). A restraint is attached only when one side is an amide,
//! the other a single ring, and the two already form a pair skeleton.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use ringshift_common::analysis_config::RestraintConfig;
use ringshift_common::residue::{AromaticResidue, ResidueKey, AMIDE_PROTON};
use ringshift_ingestion::{AtomRef, RestraintRecord};

use crate::failure::{EntryFailure, RestraintFailure};
use crate::protein::{EntryModel, Evidence, EvidenceTag};

/// Counts from one attachment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachSummary {
    pub attached: usize,
    pub rejected: usize,
}

/// What one side of a restraint resolved to.
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Amide(ResidueKey),
    Ring {
        residue: ResidueKey,
        atoms: BTreeSet<&'static str>,
        tag: EvidenceTag,
    },
}

/// Lookup of the model's amide protons and rings by residue key.
struct EntityIndex {
    amides: HashSet<ResidueKey>,
    rings: HashMap<ResidueKey, AromaticResidue>,
}

impl EntityIndex {
    fn new(model: &EntryModel) -> Self {
        Self {
            amides: model.amides.iter().map(|a| a.residue.clone()).collect(),
            rings: model
                .rings
                .iter()
                .map(|r| (r.residue.clone(), r.kind))
                .collect(),
        }
    }

    fn resolve_atom(&self, atom: &AtomRef) -> Option<Target> {
        let residue = atom.residue_key();
        if atom.atom_name == AMIDE_PROTON && self.amides.contains(&residue) {
            return Some(Target::Amide(residue));
        }
        let kind = self.rings.get(&residue)?;
        let expanded = kind.expand_ring_atom(&atom.atom_name);
        if expanded.is_empty() {
            return None;
        }
        let tag = if expanded.len() == 1 {
            EvidenceTag::Atom
        } else {
            EvidenceTag::Ring
        };
        Some(Target::Ring {
            residue,
            atoms: expanded.into_iter().collect(),
            tag,
        })
    }

    /// Resolve one side to a single entity.
    fn resolve_side(&self, side: &[AtomRef]) -> Result<Target, RestraintFailure> {
        let resolved: Vec<Option<Target>> = side.iter().map(|a| self.resolve_atom(a)).collect();
        let mut targets = resolved.iter().flatten();
        let Some(first) = targets.next().cloned() else {
            return Err(RestraintFailure::UnknownAtom);
        };
        if resolved.iter().any(Option::is_none) {
            return Err(RestraintFailure::Ambiguous);
        }

        match first {
            Target::Amide(residue) => {
                if targets.all(|t| *t == Target::Amide(residue.clone())) {
                    Ok(Target::Amide(residue))
                } else {
                    Err(RestraintFailure::Ambiguous)
                }
            }
            Target::Ring { residue, mut atoms, mut tag } => {
                for target in targets {
                    match target {
                        Target::Ring { residue: other, atoms: more, .. } if *other == residue => {
                            atoms.extend(more.iter().copied());
                        }
                        _ => return Err(RestraintFailure::Ambiguous),
                    }
                }
                if atoms.len() > 1 {
                    tag = EvidenceTag::Ring;
                }
                Ok(Target::Ring { residue, atoms, tag })
            }
        }
    }
}

/// Attach restraint evidence to the model's pair skeletons.
///
/// Whole-list problems (no restraints, implausibly many) fail the entry;
/// every other problem is logged against the restraint id and the rest of
/// the list is still processed.
pub fn attach_restraints(
    model: &mut EntryModel,
    restraints: &[RestraintRecord],
    config: &RestraintConfig,
) -> Result<AttachSummary, EntryFailure> {
    if restraints.is_empty() {
        return Err(EntryFailure::NoDistanceRestraints);
    }
    if restraints.len() > config.max_restraints {
        return Err(EntryFailure::TooManyRestraints(config.max_restraints));
    }

    let index = EntityIndex::new(model);
    let mut summary = AttachSummary::default();

    for restraint in restraints {
        let outcome = resolve_restraint(&index, restraint).and_then(|(amide, ring, evidence)| {
            let pair = model
                .pair_mut(&amide, &ring)
                .ok_or(RestraintFailure::NoPairSkeleton)?;
            pair.evidence.push(evidence);
            Ok(())
        });
        match outcome {
            Ok(()) => summary.attached += 1,
            Err(reason) => {
                debug!(entry = %model.entry, restraint = %restraint.id, %reason, "Restraint rejected");
                model.record_restraint_failure(&restraint.id, reason);
                summary.rejected += 1;
            }
        }
    }

    debug!(
        entry = %model.entry,
        attached = summary.attached,
        rejected = summary.rejected,
        "Attached restraints"
    );
    Ok(summary)
}

fn resolve_restraint(
    index: &EntityIndex,
    restraint: &RestraintRecord,
) -> Result<(ResidueKey, ResidueKey, Evidence), RestraintFailure> {
    let first = index.resolve_side(&restraint.sides[0]);
    let second = index.resolve_side(&restraint.sides[1]);
    let (first, second) = match (first, second) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(RestraintFailure::Ambiguous), _) | (_, Err(RestraintFailure::Ambiguous)) => {
            return Err(RestraintFailure::Ambiguous)
        }
        (Err(reason), _) | (_, Err(reason)) => return Err(reason),
    };

    let (amide, ring, atoms, tag) = match (first, second) {
        (Target::Amide(amide), Target::Ring { residue, atoms, tag })
        | (Target::Ring { residue, atoms, tag }, Target::Amide(amide)) => (amide, residue, atoms, tag),
        _ => return Err(RestraintFailure::NotAmideAromatic),
    };

    let evidence = Evidence {
        restraint_id: restraint.id.clone(),
        ring_atoms: atoms.into_iter().map(str::to_string).collect(),
        upper_bound: restraint.upper_bound,
        tag,
    };
    Ok((amide, ring, evidence))
}
