//! Geometric pairing of amide protons with aromatic rings.

use tracing::debug;

use ringshift_common::analysis_config::PairingConfig;

use crate::protein::{AmideAromaticPair, EntryModel};

/// Create a pair skeleton for every positioned amide within
/// `distance_threshold` of a positioned ring atom.
///
/// Replaces any pairs already in the model. Amides too close in sequence
/// to the ring residue on the same chain are never paired. Returns the
/// number of skeletons created.
pub fn pair_amides_with_rings(model: &mut EntryModel, config: &PairingConfig) -> usize {
    let mut pairs = Vec::new();

    for amide in &model.amides {
        let Some(proton) = amide.position else {
            continue;
        };
        for ring in &model.rings {
            let too_close_in_sequence = amide
                .residue
                .sequence_separation(&ring.residue)
                .is_some_and(|sep| sep < config.min_sequence_separation);
            if too_close_in_sequence {
                continue;
            }
            let Some(min_distance) = ring.min_distance_to(&proton) else {
                continue;
            };
            if min_distance <= config.distance_threshold {
                pairs.push(AmideAromaticPair::skeleton(
                    amide.residue.clone(),
                    ring.residue.clone(),
                    min_distance,
                ));
            }
        }
    }

    pairs.sort_by(|a, b| (&a.amide, &a.ring).cmp(&(&b.amide, &b.ring)));
    debug!(entry = %model.entry, pairs = pairs.len(), "Paired amides with rings");
    model.pairs = pairs;
    model.pairs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use ringshift_common::analysis_config::EntryId;
    use ringshift_common::residue::{AromaticResidue, NumberingConvention, ResidueKey};

    use crate::protein::{AmideProton, AromaticRing};

    fn amide(seq: i32, position: Option<[f64; 3]>) -> AmideProton {
        AmideProton {
            residue: ResidueKey::new(seq, "A", "ALA"),
            shift: 8.3,
            cs_sigma: 0.1,
            scoreable: true,
            position,
        }
    }

    fn phe(seq: i32, atoms: &[(&str, [f64; 3])]) -> AromaticRing {
        AromaticRing {
            residue: ResidueKey::new(seq, "A", "PHE"),
            kind: AromaticResidue::Phe,
            shifts: BTreeMap::new(),
            positions: atoms.iter().map(|(a, p)| (a.to_string(), *p)).collect(),
        }
    }

    fn model(amides: Vec<AmideProton>, rings: Vec<AromaticRing>) -> EntryModel {
        let mut model = EntryModel::new(EntryId::new("1abc", "4001"), NumberingConvention::Label, 1);
        model.amides = amides;
        model.rings = rings;
        model
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut m = model(
            vec![amide(3, Some([8.0, 0.0, 0.0])), amide(4, Some([9.0, 0.0, 0.0]))],
            vec![phe(20, &[("CZ", [0.0, 0.0, 0.0])])],
        );
        assert_eq!(pair_amides_with_rings(&mut m, &PairingConfig::default()), 1);
        let pair = &m.pairs[0];
        assert_eq!(pair.amide.seq_id, 3);
        assert_eq!(pair.min_distance, 8.0);
        assert!(pair.is_undefined());
    }

    #[test]
    fn test_closest_ring_atom_decides() {
        let mut m = model(
            vec![amide(3, Some([0.0, 0.0, 0.0]))],
            vec![phe(20, &[("CG", [0.0, 0.0, 12.0]), ("HZ", [0.0, 7.5, 0.0])])],
        );
        pair_amides_with_rings(&mut m, &PairingConfig::default());
        assert_eq!(m.pairs.len(), 1);
        assert_eq!(m.pairs[0].min_distance, 7.5);
    }

    #[test]
    fn test_unpositioned_never_paired() {
        let mut m = model(
            vec![amide(3, None)],
            vec![phe(20, &[("CZ", [0.0, 0.0, 0.0])]), phe(21, &[])],
        );
        assert_eq!(pair_amides_with_rings(&mut m, &PairingConfig::default()), 0);
    }

    #[test]
    fn test_own_residue_excluded() {
        let mut own = amide(20, Some([1.0, 0.0, 0.0]));
        own.residue = ResidueKey::new(20, "A", "PHE");
        let mut m = model(vec![own], vec![phe(20, &[("CG", [0.0, 0.0, 0.0])])]);
        assert_eq!(pair_amides_with_rings(&mut m, &PairingConfig::default()), 0);

        let config = PairingConfig {
            min_sequence_separation: 0,
            ..Default::default()
        };
        assert_eq!(pair_amides_with_rings(&mut m, &config), 1);
    }
}
