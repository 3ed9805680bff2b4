//! One-entry construction: extract, fuse, pair, attach.
//!
//! [`build_entry`] is pure: it sees only the records handed to it and
//! never touches the cache.

use tracing::{debug, info};

use ringshift_common::analysis_config::{AnalysisConfig, EntryId};
use ringshift_common::outlier::OutlierScorer;
use ringshift_ingestion::{
    extract_coordinates, extract_shifts, CoordinateRecordSource, CoordinateTable, RestraintRecord,
    RestraintRecordSource, ShiftRecordSource, ShiftTable, SourceError,
};

use crate::attach::attach_restraints;
use crate::failure::{EntryFailure, EntryOutcome};
use crate::fusion::fuse;
use crate::pairing::pair_amides_with_rings;
use crate::protein::EntryModel;

/// The raw records of one entry, each possibly missing.
#[derive(Debug, Clone)]
pub struct EntryInputs {
    pub shifts: Result<ShiftTable, SourceError>,
    pub coordinates: Result<CoordinateTable, SourceError>,
    pub restraints: Result<Vec<RestraintRecord>, SourceError>,
}

impl EntryInputs {
    /// Read every record kind of `entry` from its source.
    pub fn load(
        entry: &EntryId,
        shifts: &dyn ShiftRecordSource,
        coordinates: &dyn CoordinateRecordSource,
        restraints: &dyn RestraintRecordSource,
    ) -> Self {
        Self {
            shifts: shifts.shift_table(entry),
            coordinates: coordinates.coordinate_table(entry),
            restraints: restraints.restraint_records(entry),
        }
    }
}

/// Build the model of one entry, or the reason it cannot be built.
pub fn build_entry(entry: &EntryId, inputs: EntryInputs, config: &AnalysisConfig) -> EntryOutcome {
    let outcome = EntryOutcome::from(try_build(entry, inputs, config));
    match &outcome {
        EntryOutcome::Model(model) => info!(
            entry = %entry,
            amides = model.amides.len(),
            rings = model.rings.len(),
            pairs = model.pairs.len(),
            defined = model.defined_pairs().count(),
            "Entry built"
        ),
        EntryOutcome::Failure(reason) => info!(entry = %entry, %reason, "Entry failed"),
    }
    outcome
}

fn try_build(
    entry: &EntryId,
    inputs: EntryInputs,
    config: &AnalysisConfig,
) -> Result<EntryModel, EntryFailure> {
    let scorer = OutlierScorer::new(config.reference_table);

    let shift_table = inputs.shifts.map_err(EntryFailure::from_shift_source)?;
    let shifts = extract_shifts(&shift_table, config.numbering, &scorer).map_err(|e| {
        debug!(entry = %entry, error = %e, "Shift records unreadable");
        EntryFailure::MalformedShiftFile
    })?;

    let atom_site = inputs
        .coordinates
        .map_err(EntryFailure::from_coordinate_source)?;
    let coordinates = extract_coordinates(&atom_site, config.numbering).map_err(|e| {
        debug!(entry = %entry, error = %e, "Coordinate records unreadable");
        EntryFailure::MalformedCoordinateFile
    })?;

    let mut model = fuse(entry, shifts, &coordinates, config)?;

    let restraints = inputs
        .restraints
        .map_err(EntryFailure::from_restraint_source)?;
    pair_amides_with_rings(&mut model, &config.pairing);
    attach_restraints(&mut model, &restraints, &config.restraints)?;

    if model.pairs.is_empty() {
        return Err(EntryFailure::NoPairsFound);
    }
    Ok(model)
}
