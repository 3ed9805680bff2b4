//! Fixture builders shared by the workspace's integration tests.
//!
//! [`EntryFixture`] assembles the shift, `atom_site` and restraint rows of
//! one small entry. Ring atoms are laid out along +z from an anchor point,
//! the first canonical ring atom sitting on the anchor, so an amide placed
//! at `anchor + [d, 0, 0]` is exactly `d` Å from the ring.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use ringshift_common::analysis_config::EntryId;
use ringshift_common::residue::{AromaticResidue, Position};
use ringshift_ingestion::sources::csv_bundle::{
    ATOM_SITE_FILE, ENTITY_ASSEMBLY_FILE, RESTRAINTS_FILE, SHIFTS_FILE,
};
use ringshift_ingestion::sources::MemorySources;
use ringshift_ingestion::{
    group_restraint_rows, CoordinateTable, RecordRow, RestraintRecord, ShiftTable,
};

/// Spacing (Å) between consecutive ring atoms along +z.
pub const RING_ATOM_SPACING: f64 = 0.5;

/// One `Atom_chem_shift` row; label and author numbering agree.
pub fn shift_row(seq: i32, comp: &str, atom: &str, value: f64) -> RecordRow {
    RecordRow::new()
        .with("Comp_index_ID", seq.to_string())
        .with("Auth_seq_ID", seq.to_string())
        .with("Auth_asym_ID", "A")
        .with("Comp_ID", comp)
        .with("Atom_ID", atom)
        .with("Val", value.to_string())
        .with("Ambiguity_code", "1")
}

/// One `atom_site` row; label and author numbering agree.
pub fn atom_row(model: u32, seq: i32, comp: &str, atom: &str, position: Position) -> RecordRow {
    RecordRow::new()
        .with("pdbx_PDB_model_num", model.to_string())
        .with("label_seq_id", seq.to_string())
        .with("label_asym_id", "A")
        .with("label_comp_id", comp)
        .with("label_atom_id", atom)
        .with("label_entity_id", "1")
        .with("label_alt_id", ".")
        .with("auth_seq_id", seq.to_string())
        .with("auth_asym_id", "A")
        .with("auth_comp_id", comp)
        .with("auth_atom_id", atom)
        .with("pdbx_PDB_ins_code", "?")
        .with("Cartn_x", position[0].to_string())
        .with("Cartn_y", position[1].to_string())
        .with("Cartn_z", position[2].to_string())
}

/// Restraint rows, one per atom reference.
pub fn restraint_rows(
    id: &str,
    first: &[(i32, &str, &str)],
    second: &[(i32, &str, &str)],
    upper_bound: f64,
) -> Vec<RecordRow> {
    let side = |side: &str, refs: &[(i32, &str, &str)]| {
        refs.iter()
            .map(|(seq, comp, atom)| {
                RecordRow::new()
                    .with("restraint_id", id)
                    .with("side", side)
                    .with("seq_id", seq.to_string())
                    .with("chain_id", "A")
                    .with("residue_name", *comp)
                    .with("atom_name", *atom)
                    .with("upper_bound", upper_bound.to_string())
            })
            .collect::<Vec<_>>()
    };
    let mut rows = side("1", first);
    rows.extend(side("2", second));
    rows
}

/// Builder for the complete record set of one entry.
#[derive(Debug, Clone)]
pub struct EntryFixture {
    pub entry: EntryId,
    pub shift_rows: Vec<RecordRow>,
    pub atom_rows: Vec<RecordRow>,
    pub restraint_rows: Vec<RecordRow>,
    pub entity_assembly: Vec<String>,
}

impl EntryFixture {
    /// A single-entity protein entry with no residues yet.
    pub fn new(pdb_id: &str, bmrb_id: &str) -> Self {
        Self {
            entry: EntryId::new(pdb_id, bmrb_id),
            shift_rows: Vec::new(),
            atom_rows: Vec::new(),
            restraint_rows: Vec::new(),
            entity_assembly: vec!["1".to_string()],
        }
    }

    /// Amide proton with a shift, positioned in model 1 when `position`
    /// is given.
    pub fn amide(mut self, seq: i32, comp: &str, shift: f64, position: Option<Position>) -> Self {
        self.shift_rows.push(shift_row(seq, comp, "H", shift));
        if let Some(position) = position {
            self.atom_rows.push(atom_row(1, seq, comp, "H", position));
        }
        self
    }

    /// Aromatic ring with shifts on its protons and every ring atom
    /// positioned in model 1.
    pub fn ring(mut self, seq: i32, kind: AromaticResidue, anchor: Position) -> Self {
        for (i, atom) in kind.ring_atoms().iter().enumerate() {
            if atom.starts_with('H') {
                self.shift_rows
                    .push(shift_row(seq, kind.name(), atom, 7.0 + 0.05 * i as f64));
            }
            let position = [anchor[0], anchor[1], anchor[2] + RING_ATOM_SPACING * i as f64];
            self.atom_rows.push(atom_row(1, seq, kind.name(), atom, position));
        }
        self
    }

    pub fn restraint(
        mut self,
        id: &str,
        first: &[(i32, &str, &str)],
        second: &[(i32, &str, &str)],
        upper_bound: f64,
    ) -> Self {
        self.restraint_rows
            .extend(restraint_rows(id, first, second, upper_bound));
        self
    }

    /// Entity ids of the assembly members.
    pub fn assembly(mut self, entity_ids: &[&str]) -> Self {
        self.entity_assembly = entity_ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn shift_table(&self) -> ShiftTable {
        ShiftTable {
            rows: self.shift_rows.clone(),
            entity_assembly: self.entity_assembly.clone(),
        }
    }

    pub fn coordinate_table(&self) -> CoordinateTable {
        CoordinateTable {
            rows: self.atom_rows.clone(),
        }
    }

    pub fn restraint_records(&self) -> Vec<RestraintRecord> {
        group_restraint_rows(&self.restraint_rows).unwrap_or_default()
    }

    /// Write the entry as a CSV bundle under `data_dir`.
    pub fn write_bundle(&self, data_dir: &Path) -> Result<PathBuf> {
        let dir = data_dir.join(self.entry.stem());
        fs::create_dir_all(&dir)?;
        write_csv(&dir.join(SHIFTS_FILE), &self.shift_rows)?;
        write_csv(&dir.join(ATOM_SITE_FILE), &self.atom_rows)?;
        write_csv(&dir.join(RESTRAINTS_FILE), &self.restraint_rows)?;
        let assembly: Vec<RecordRow> = self
            .entity_assembly
            .iter()
            .map(|id| RecordRow::new().with("Entity_ID", id.as_str()))
            .collect();
        write_csv(&dir.join(ENTITY_ASSEMBLY_FILE), &assembly)?;
        Ok(dir)
    }
}

/// Register every fixture in one set of in-memory sources.
pub fn memory_sources(fixtures: &[EntryFixture]) -> MemorySources {
    fixtures.iter().fold(MemorySources::new(), |sources, fixture| {
        sources.with(
            fixture.entry.clone(),
            fixture.shift_table(),
            fixture.coordinate_table(),
            fixture.restraint_records(),
        )
    })
}

/// Write rows sharing one column set as CSV. No rows gives an empty file.
pub fn write_csv(path: &Path, rows: &[RecordRow]) -> Result<()> {
    let Some(first) = rows.first() else {
        fs::write(path, "")?;
        return Ok(());
    };
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(first.iter().map(|(column, _)| column))?;
    for row in rows {
        writer.write_record(row.iter().map(|(_, value)| value))?;
    }
    writer.flush()?;
    Ok(())
}

/// The entry most tests start from: PHE 20 with its ring anchored at the
/// origin, and three amides 4, 6 and 9 Å away along +x.
pub fn phe_entry() -> EntryFixture {
    EntryFixture::new("1rng", "5001")
        .ring(20, AromaticResidue::Phe, [0.0, 0.0, 0.0])
        .amide(3, "ALA", 9.5, Some([4.0, 0.0, 0.0]))
        .amide(4, "GLY", 8.3, Some([6.0, 0.0, 0.0]))
        .amide(5, "LEU", 8.1, Some([9.0, 0.0, 0.0]))
        .restraint("1", &[(3, "ALA", "H")], &[(20, "PHE", "CG")], 4.5)
        .restraint("2", &[(3, "ALA", "H")], &[(20, "PHE", "CD1")], 4.8)
        .restraint("3", &[(4, "GLY", "H")], &[(20, "PHE", "QD")], 6.0)
}
