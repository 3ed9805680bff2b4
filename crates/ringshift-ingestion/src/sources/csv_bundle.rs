//! Pre-computed CSV bundles.
//!
//! The external ring-current program writes one directory per entry,
//! named `<pdb>_<bmrb>`, holding the records it worked from:
//!
//! - `shifts.csv`: `Atom_chem_shift` loop (NMR-STAR column names)
//! - `entity_assembly.csv`: `Entity_ID` per assembly member (optional)
//! - `atom_site.csv`: `atom_site` category (mmCIF column names)
//! - `restraints.csv`: one row per restraint atom reference

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use ringshift_common::analysis_config::EntryId;

use super::{
    CoordinateRecordSource, RestraintRecordSource, RingCurrentCalculator, ShiftRecordSource,
    SourceError,
};
use crate::coordinates::CoordinateTable;
use crate::records::RecordRow;
use crate::restraints::{group_restraint_rows, RestraintRecord};
use crate::shifts::ShiftTable;

pub const SHIFTS_FILE: &str = "shifts.csv";
pub const ENTITY_ASSEMBLY_FILE: &str = "entity_assembly.csv";
pub const ATOM_SITE_FILE: &str = "atom_site.csv";
pub const RESTRAINTS_FILE: &str = "restraints.csv";

/// Locates bundles already produced by the ring-current program.
#[derive(Debug, Clone)]
pub struct PrecomputedBundles {
    data_dir: PathBuf,
}

impl PrecomputedBundles {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Every entry with a bundle directory, sorted.
    pub fn list_entries(&self) -> anyhow::Result<Vec<EntryId>> {
        let mut entries = Vec::new();
        let listing = fs::read_dir(&self.data_dir)
            .with_context(|| format!("Cannot list bundles in {:?}", self.data_dir))?;
        for dirent in listing {
            let dirent = dirent?;
            if !dirent.file_type()?.is_dir() {
                continue;
            }
            let name = dirent.file_name().to_string_lossy().into_owned();
            if let Some((pdb_id, bmrb_id)) = name.split_once('_') {
                entries.push(EntryId::new(pdb_id, bmrb_id));
            }
        }
        entries.sort();
        Ok(entries)
    }
}

impl RingCurrentCalculator for PrecomputedBundles {
    fn calculate(&self, entry: &EntryId) -> Result<PathBuf, SourceError> {
        let dir = self.data_dir.join(entry.stem());
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(SourceError::Absent(format!("ring-current bundle {}", dir.display())))
        }
    }
}

/// Reads every record kind from the bundle the calculator points at.
#[derive(Debug, Clone)]
pub struct CsvBundleSource<C = PrecomputedBundles> {
    calculator: C,
}

impl<C: RingCurrentCalculator> CsvBundleSource<C> {
    pub fn new(calculator: C) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    fn bundle_file(&self, entry: &EntryId, name: &str) -> Result<PathBuf, SourceError> {
        Ok(self.calculator.calculate(entry)?.join(name))
    }
}

/// Read a CSV file into rows, separating absent, empty and unparseable files.
fn read_rows(path: &Path) -> Result<Vec<RecordRow>, SourceError> {
    let what = path.display().to_string();
    if !path.exists() {
        return Err(SourceError::Absent(what));
    }
    let content = fs::read_to_string(path).map_err(|e| SourceError::malformed(&what, e))?;
    if content.trim().is_empty() {
        return Err(SourceError::Empty(what));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let rows = reader
        .deserialize::<RecordRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SourceError::malformed(&what, e))?;
    debug!(file = %what, rows = rows.len(), "Read bundle file");
    Ok(rows)
}

impl<C: RingCurrentCalculator> ShiftRecordSource for CsvBundleSource<C> {
    fn shift_table(&self, entry: &EntryId) -> Result<ShiftTable, SourceError> {
        let shifts_path = self.bundle_file(entry, SHIFTS_FILE)?;
        let rows = read_rows(&shifts_path)?;
        if rows.is_empty() {
            return Err(SourceError::Empty(shifts_path.display().to_string()));
        }

        let assembly_path = self.bundle_file(entry, ENTITY_ASSEMBLY_FILE)?;
        // An absent or blank assembly file means no assembly metadata
        let entity_assembly = match read_rows(&assembly_path) {
            Ok(rows) => rows
                .iter()
                .map(|row| row.require("Entity_ID").map(str::to_string))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SourceError::malformed(assembly_path.display().to_string(), e))?,
            Err(SourceError::Absent(_) | SourceError::Empty(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(ShiftTable { rows, entity_assembly })
    }
}

impl<C: RingCurrentCalculator> CoordinateRecordSource for CsvBundleSource<C> {
    fn coordinate_table(&self, entry: &EntryId) -> Result<CoordinateTable, SourceError> {
        let path = self.bundle_file(entry, ATOM_SITE_FILE)?;
        let rows = read_rows(&path)?;
        if rows.is_empty() {
            return Err(SourceError::Empty(path.display().to_string()));
        }
        Ok(CoordinateTable { rows })
    }
}

impl<C: RingCurrentCalculator> RestraintRecordSource for CsvBundleSource<C> {
    fn restraint_records(&self, entry: &EntryId) -> Result<Vec<RestraintRecord>, SourceError> {
        let path = self.bundle_file(entry, RESTRAINTS_FILE)?;
        let rows = read_rows(&path)?;
        if rows.is_empty() {
            return Err(SourceError::NoDistanceRestraints(path.display().to_string()));
        }
        group_restraint_rows(&rows).map_err(|e| SourceError::malformed(path.display().to_string(), e))
    }
}
