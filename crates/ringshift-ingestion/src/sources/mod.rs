//! Entry record sources.
//!
//! The batch driver reads each entry through these traits, which keeps the
//! fusion pipeline independent of where the records come from. The only
//! bundled implementation reads pre-computed CSV bundles
//! ([`csv_bundle::CsvBundleSource`]).

pub mod csv_bundle;

use std::path::PathBuf;
use thiserror::Error;

use ringshift_common::analysis_config::EntryId;

use crate::coordinates::CoordinateTable;
use crate::restraints::RestraintRecord;
use crate::shifts::ShiftTable;

/// Why a source could not hand over its records for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0} not found")]
    Absent(String),

    #[error("{0} is empty")]
    Empty(String),

    #[error("no distance restraints in {0}")]
    NoDistanceRestraints(String),

    #[error("malformed {what}: {reason}")]
    Malformed { what: String, reason: String },
}

impl SourceError {
    pub fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Supplies assigned chemical shifts for an entry.
pub trait ShiftRecordSource: Send + Sync {
    fn shift_table(&self, entry: &EntryId) -> Result<ShiftTable, SourceError>;
}

/// Supplies `atom_site` rows for an entry.
pub trait CoordinateRecordSource: Send + Sync {
    fn coordinate_table(&self, entry: &EntryId) -> Result<CoordinateTable, SourceError>;
}

/// Supplies NOE distance restraints for an entry.
///
/// Implementations must tell an absent list, an empty file, a list with
/// no distance restraints and an unparseable file apart.
pub trait RestraintRecordSource: Send + Sync {
    fn restraint_records(&self, entry: &EntryId) -> Result<Vec<RestraintRecord>, SourceError>;
}

/// Black-box ring-current calculation.
///
/// Produces the per-entry data location the record sources read from.
pub trait RingCurrentCalculator: Send + Sync {
    fn calculate(&self, entry: &EntryId) -> Result<PathBuf, SourceError>;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// In-memory sources keyed by entry.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    pub shifts: std::collections::HashMap<EntryId, ShiftTable>,
    pub coordinates: std::collections::HashMap<EntryId, CoordinateTable>,
    pub restraints: std::collections::HashMap<EntryId, Vec<RestraintRecord>>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the complete record set of one entry.
    pub fn with(
        mut self,
        entry: EntryId,
        shifts: ShiftTable,
        coordinates: CoordinateTable,
        restraints: Vec<RestraintRecord>,
    ) -> Self {
        self.shifts.insert(entry.clone(), shifts);
        self.coordinates.insert(entry.clone(), coordinates);
        self.restraints.insert(entry, restraints);
        self
    }
}

impl ShiftRecordSource for MemorySources {
    fn shift_table(&self, entry: &EntryId) -> Result<ShiftTable, SourceError> {
        self.shifts
            .get(entry)
            .cloned()
            .ok_or_else(|| SourceError::Absent(format!("shift set {}", entry.bmrb_id)))
    }
}

impl CoordinateRecordSource for MemorySources {
    fn coordinate_table(&self, entry: &EntryId) -> Result<CoordinateTable, SourceError> {
        self.coordinates
            .get(entry)
            .cloned()
            .ok_or_else(|| SourceError::Absent(format!("structure {}", entry.pdb_id)))
    }
}

impl RestraintRecordSource for MemorySources {
    fn restraint_records(&self, entry: &EntryId) -> Result<Vec<RestraintRecord>, SourceError> {
        match self.restraints.get(entry) {
            Some(records) if records.is_empty() => {
                Err(SourceError::NoDistanceRestraints(format!("restraints of {entry}")))
            }
            Some(records) => Ok(records.clone()),
            None => Err(SourceError::Absent(format!("restraints of {entry}"))),
        }
    }
}
