//! Failure taxonomy of entry construction.
//!
//! Entry-level failures replace the model entirely; residue- and
//! restraint-level failures are logged inside the model and processing
//! carries on.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use ringshift_ingestion::SourceError;

use crate::protein::EntryModel;

/// Why an entry could not be turned into a model.
///
/// Persisted and displayed as its reason string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EntryFailure {
    #[error("DNA/RNA entries, entries with ligands, oligomers and protein complexes")]
    NonProteinEntry,

    #[error("Severe residue index mismatch")]
    SevereResidueIndexMismatch,

    #[error("Restraint file not found")]
    RestraintFileAbsent,

    #[error("No distance restraints")]
    NoDistanceRestraints,

    #[error("No aromatic residues")]
    NoAromaticResidues,

    #[error(">{0} distance restraints")]
    TooManyRestraints(usize),

    #[error("Shift file not found")]
    ShiftFileAbsent,

    #[error("Empty shift file")]
    EmptyShiftFile,

    #[error("Coordinate file not found")]
    CoordinateFileAbsent,

    #[error("Empty coordinate file")]
    EmptyCoordinateFile,

    #[error("Empty restraint file")]
    EmptyRestraintFile,

    #[error("Misformatted restraint file")]
    MalformedRestraintFile,

    #[error("Misformatted shift file")]
    MalformedShiftFile,

    #[error("Misformatted coordinate file")]
    MalformedCoordinateFile,

    #[error("No pairs found")]
    NoPairsFound,

    #[error("{0}")]
    Other(String),
}

impl EntryFailure {
    /// Reasons whose string carries no parameter.
    pub const FIXED_REASONS: [EntryFailure; 14] = [
        Self::NonProteinEntry,
        Self::SevereResidueIndexMismatch,
        Self::RestraintFileAbsent,
        Self::NoDistanceRestraints,
        Self::NoAromaticResidues,
        Self::ShiftFileAbsent,
        Self::EmptyShiftFile,
        Self::CoordinateFileAbsent,
        Self::EmptyCoordinateFile,
        Self::EmptyRestraintFile,
        Self::MalformedRestraintFile,
        Self::MalformedShiftFile,
        Self::MalformedCoordinateFile,
        Self::NoPairsFound,
    ];

    /// False for reasons outside the known data-quality taxonomy.
    pub fn is_anticipated(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn from_shift_source(err: SourceError) -> Self {
        match err {
            SourceError::Absent(_) => Self::ShiftFileAbsent,
            SourceError::Empty(_) => Self::EmptyShiftFile,
            SourceError::Malformed { .. } | SourceError::NoDistanceRestraints(_) => {
                Self::MalformedShiftFile
            }
        }
    }

    pub fn from_coordinate_source(err: SourceError) -> Self {
        match err {
            SourceError::Absent(_) => Self::CoordinateFileAbsent,
            SourceError::Empty(_) => Self::EmptyCoordinateFile,
            SourceError::Malformed { .. } | SourceError::NoDistanceRestraints(_) => {
                Self::MalformedCoordinateFile
            }
        }
    }

    pub fn from_restraint_source(err: SourceError) -> Self {
        match err {
            SourceError::Absent(_) => Self::RestraintFileAbsent,
            SourceError::Empty(_) => Self::EmptyRestraintFile,
            SourceError::NoDistanceRestraints(_) => Self::NoDistanceRestraints,
            SourceError::Malformed { .. } => Self::MalformedRestraintFile,
        }
    }
}

impl From<EntryFailure> for String {
    fn from(failure: EntryFailure) -> Self {
        failure.to_string()
    }
}

impl FromStr for EntryFailure {
    type Err = Infallible;

    fn from_str(reason: &str) -> Result<Self, Self::Err> {
        let fixed = Self::FIXED_REASONS.into_iter().find(|f| f.to_string() == reason);
        if let Some(failure) = fixed {
            return Ok(failure);
        }
        let limit = reason
            .strip_prefix('>')
            .and_then(|rest| rest.strip_suffix(" distance restraints"))
            .and_then(|n| n.parse().ok());
        Ok(match limit {
            Some(limit) => Self::TooManyRestraints(limit),
            None => Self::Other(reason.to_string()),
        })
    }
}

impl From<String> for EntryFailure {
    fn from(reason: String) -> Self {
        match reason.parse() {
            Ok(failure) => failure,
            Err(never) => match never {},
        }
    }
}

/// Why one residue kept no geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResidueFailure {
    /// An amide proton or ring atom with a shift has no position under
    /// the residue key
    ResidueIndexMismatch,
}

impl fmt::Display for ResidueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResidueIndexMismatch => write!(f, "ResidueIndexMismatch"),
        }
    }
}

/// Why one restraint was not attached to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RestraintFailure {
    /// An atom names no amide proton or ring atom of the entry
    UnknownAtom,
    /// Both sides resolve, but not to one amide and one ring
    NotAmideAromatic,
    /// Amide and ring were never paired
    NoPairSkeleton,
    /// A side names an atom set spanning several entities
    Ambiguous,
}

impl fmt::Display for RestraintFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAtom => write!(f, "UnknownAtom"),
            Self::NotAmideAromatic => write!(f, "NotAmideAromatic"),
            Self::NoPairSkeleton => write!(f, "NoPairSkeleton"),
            Self::Ambiguous => write!(f, "Ambiguous"),
        }
    }
}

/// Result of constructing one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOutcome {
    Model(Box<EntryModel>),
    Failure(EntryFailure),
}

impl EntryOutcome {
    pub fn model(&self) -> Option<&EntryModel> {
        match self {
            Self::Model(model) => Some(model.as_ref()),
            Self::Failure(_) => None,
        }
    }

    pub fn model_mut(&mut self) -> Option<&mut EntryModel> {
        match self {
            Self::Model(model) => Some(model.as_mut()),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&EntryFailure> {
        match self {
            Self::Model(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl From<Result<EntryModel, EntryFailure>> for EntryOutcome {
    fn from(result: Result<EntryModel, EntryFailure>) -> Self {
        match result {
            Ok(model) => Self::Model(Box::new(model)),
            Err(failure) => Self::Failure(failure),
        }
    }
}
