//! Shift outlier classes and pair confidence tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use ringshift_common::analysis_config::TierThresholds;
use ringshift_common::residue::AromaticResidue;
use ringshift_model::{AmideAromaticPair, EvidenceTag};

/// Where an amide proton shift lies relative to its residue's reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftClass {
    Upfield,
    Downfield,
    NonOutlier,
}

impl ShiftClass {
    pub const ALL: [ShiftClass; 3] = [Self::Upfield, Self::Downfield, Self::NonOutlier];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_outlier(self) -> bool {
        self != Self::NonOutlier
    }
}

impl fmt::Display for ShiftClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upfield => write!(f, "upfield"),
            Self::Downfield => write!(f, "downfield"),
            Self::NonOutlier => write!(f, "non_outlier"),
        }
    }
}

/// Three-way threshold on `cs_sigma`.
///
/// A score exactly at ±`outlier_sigma` is an outlier. NaN compares false
/// against both bounds and lands in `NonOutlier`.
pub fn classify_shift(cs_sigma: f64, outlier_sigma: f64) -> ShiftClass {
    if cs_sigma <= -outlier_sigma {
        ShiftClass::Upfield
    } else if cs_sigma >= outlier_sigma {
        ShiftClass::Downfield
    } else {
        ShiftClass::NonOutlier
    }
}

/// How well NOE evidence supports an amide–ring contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Intermediate,
    Low,
    None,
}

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; 4] = [Self::High, Self::Intermediate, Self::Low, Self::None];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Low => write!(f, "low"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Tier and label assigned to one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairClassification {
    pub tier: ConfidenceTier,
    pub label: AromaticResidue,
    pub restraints: usize,
    /// Atom-specific restraints with a tight upper bound
    pub strong: usize,
}

/// Tier from restraint counts. See [`TierThresholds`].
pub fn tier_for_counts(restraints: usize, strong: usize, thresholds: &TierThresholds) -> ConfidenceTier {
    if restraints >= thresholds.high_min_restraints || strong >= thresholds.high_min_strong {
        ConfidenceTier::High
    } else if restraints >= thresholds.intermediate_min_restraints
        || strong >= thresholds.intermediate_min_strong
    {
        ConfidenceTier::Intermediate
    } else if restraints >= thresholds.low_min_restraints {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::None
    }
}

/// Majority label, ties going to whichever comes first in `priority`.
///
/// Labels missing from `priority` rank after every listed one, in
/// [`AromaticResidue::ALL`] order. `None` for no labels.
pub fn dominant_label<I>(labels: I, priority: &[AromaticResidue]) -> Option<AromaticResidue>
where
    I: IntoIterator<Item = AromaticResidue>,
{
    let mut counts = [0usize; 4];
    for label in labels {
        counts[label.index()] += 1;
    }
    let rank = |label: AromaticResidue| {
        priority
            .iter()
            .position(|p| *p == label)
            .unwrap_or(priority.len() + label.index())
    };
    AromaticResidue::ALL
        .into_iter()
        .filter(|label| counts[label.index()] > 0)
        .min_by_key(|label| (std::cmp::Reverse(counts[label.index()]), rank(*label)))
}

/// Classify one pair by its evidence.
///
/// Every evidence item of a pair names atoms of the pair's ring, so the
/// label is that ring's residue type.
pub fn classify_pair(pair: &AmideAromaticPair, thresholds: &TierThresholds) -> Option<PairClassification> {
    let label = AromaticResidue::from_name(&pair.ring.residue_name)?;
    let restraints = pair.evidence.len();
    let strong = pair
        .evidence
        .iter()
        .filter(|e| {
            e.tag == EvidenceTag::Atom
                && e.upper_bound
                    .is_some_and(|bound| bound <= thresholds.strong_upper_bound)
        })
        .count();
    Some(PairClassification {
        tier: tier_for_counts(restraints, strong, thresholds),
        label,
        restraints,
        strong,
    })
}

/// Classify an amide proton across all of its pairs: the best tier any
/// pair reaches, labelled by the majority residue type among the pairs at
/// that tier.
pub fn classify_amide(
    pairs: &[PairClassification],
    label_priority: &[AromaticResidue],
) -> Option<PairClassification> {
    let best = pairs.iter().map(|c| c.tier).min()?;
    let at_best: Vec<&PairClassification> = pairs.iter().filter(|c| c.tier == best).collect();
    let label = dominant_label(at_best.iter().map(|c| c.label), label_priority)?;
    Some(PairClassification {
        tier: best,
        label,
        restraints: at_best.iter().map(|c| c.restraints).sum(),
        strong: at_best.iter().map(|c| c.strong).sum(),
    })
}
