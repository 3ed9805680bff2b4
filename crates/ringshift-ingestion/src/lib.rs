//! ringshift-ingestion: Turns parsed shift, coordinate and restraint
//! records into normalized, keyed maps.
//!
//! Raw NMR-STAR / mmCIF parsing happens upstream; this crate receives
//! key→value rows carrying the upstream column names and:
//!   1. Extracts amide proton and aromatic ring shifts (`shifts`)
//!   2. Extracts per-conformer atom positions (`coordinates`)
//!   3. Groups restraint rows into distance restraints (`restraints`)
//!   4. Defines the source traits the batch driver reads entries through
//!      (`sources`), with a CSV-bundle implementation

pub mod records;
pub mod shifts;
pub mod coordinates;
pub mod restraints;
pub mod sources;

pub use records::RecordRow;
pub use shifts::{extract_shifts, AmideShift, RingShift, ShiftExtraction, ShiftTable};
pub use coordinates::{extract_coordinates, CoordinateModels, CoordinateTable, ModelCoordinates};
pub use restraints::{group_restraint_rows, AtomRef, RestraintRecord};
pub use sources::{
    CoordinateRecordSource, RestraintRecordSource, RingCurrentCalculator, ShiftRecordSource,
    SourceError,
};
