//! Entry construction from fixture records through to attached evidence.

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use ringshift_common::analysis_config::AnalysisConfig;
use ringshift_common::residue::{AromaticResidue, ResidueKey};
use ringshift_ingestion::sources::MemorySources;
use ringshift_model::{
    build_entry, CachedBuilder, EntryCache, EntryFailure, EntryInputs, EntryModel, EntryOutcome,
    EvidenceTag, ResidueFailure, RestraintFailure,
};
use ringshift_test_utils::{atom_row, memory_sources, phe_entry, shift_row, EntryFixture};

fn inputs(fixture: &EntryFixture) -> EntryInputs {
    EntryInputs {
        shifts: Ok(fixture.shift_table()),
        coordinates: Ok(fixture.coordinate_table()),
        restraints: Ok(fixture.restraint_records()),
    }
}

fn build(fixture: &EntryFixture) -> EntryOutcome {
    build_entry(&fixture.entry, inputs(fixture), &AnalysisConfig::default())
}

fn model(fixture: &EntryFixture) -> EntryModel {
    match build(fixture) {
        EntryOutcome::Model(model) => *model,
        EntryOutcome::Failure(reason) => panic!("entry failed: {reason}"),
    }
}

fn key(seq: i32, comp: &str) -> ResidueKey {
    ResidueKey::new(seq, "A", comp)
}

#[test]
fn test_phe_entry_pairs_and_evidence() {
    let model = model(&phe_entry());

    let pairs: Vec<_> = model.pairs.iter().map(|p| (p.amide.seq_id, p.ring.seq_id)).collect();
    assert_eq!(pairs, vec![(3, 20), (4, 20)]);

    let close = model.pair(&key(3, "ALA"), &key(20, "PHE")).unwrap();
    assert_eq!(close.min_distance, 4.0);
    assert_eq!(close.evidence.len(), 2);
    assert!(close.evidence.iter().all(|e| e.tag == EvidenceTag::Atom));

    let far = model.pair(&key(4, "GLY"), &key(20, "PHE")).unwrap();
    assert_eq!(far.evidence[0].tag, EvidenceTag::Ring);
    assert!(model.exceptions_map_residues.is_empty());
    assert!(model.exceptions_map_restraints.is_empty());
}

#[test]
fn test_unmatched_amide_logged_and_never_paired() {
    let fixture = phe_entry().amide(7, "SER", 8.0, None);
    let model = model(&fixture);

    assert_eq!(
        model.exceptions_map_residues.get("7"),
        Some(&ResidueFailure::ResidueIndexMismatch)
    );
    assert!(model.amide(&key(7, "SER")).unwrap().position.is_none());
    assert!(model.pairs.iter().all(|p| p.amide.seq_id != 7));
}

#[test]
fn test_aromatic_amide_without_proton_is_index_mismatch() {
    let mut fixture = phe_entry();
    fixture.shift_rows.push(shift_row(20, "PHE", "H", 8.4));
    let model = model(&fixture);

    assert_eq!(
        model.exceptions_map_residues.get("20"),
        Some(&ResidueFailure::ResidueIndexMismatch)
    );
    assert!(model.amide(&key(20, "PHE")).unwrap().position.is_none());
    assert!(model.ring(&key(20, "PHE")).unwrap().is_positioned());
}

#[test]
fn test_alternate_locations_do_not_depend_on_row_order() {
    let mut fixture = EntryFixture::new("2alt", "5002")
        .ring(30, AromaticResidue::Tyr, [0.0, 0.0, 0.0])
        .amide(10, "ALA", 8.2, Some([7.5, 0.0, 0.0]))
        .restraint("1", &[(10, "ALA", "H")], &[(30, "TYR", "HH")], 6.0);
    fixture
        .atom_rows
        .push(atom_row(1, 10, "ALA", "H", [12.0, 0.0, 0.0]).with("label_alt_id", "B"));
    let mut reversed = fixture.clone();
    reversed.atom_rows.reverse();

    let forward = model(&fixture);
    assert_eq!(forward.pair(&key(10, "ALA"), &key(30, "TYR")).unwrap().min_distance, 7.5);
    assert_eq!(model(&reversed), forward);
}

#[test]
fn test_non_finite_shift_is_malformed() {
    let mut fixture = phe_entry();
    fixture.shift_rows.push(shift_row(6, "SER", "H", f64::NAN));
    assert_eq!(build(&fixture), EntryOutcome::Failure(EntryFailure::MalformedShiftFile));
}

#[test]
fn test_distance_cutoff_at_eight_angstrom() {
    let fixture = EntryFixture::new("2cut", "5002")
        .ring(30, AromaticResidue::Tyr, [0.0, 0.0, 0.0])
        .amide(10, "ALA", 8.2, Some([8.0, 0.0, 0.0]))
        .amide(11, "ALA", 8.2, Some([9.0, 0.0, 0.0]))
        .restraint("1", &[(10, "ALA", "H")], &[(30, "TYR", "HH")], 6.0);
    let model = model(&fixture);

    assert!(model.pair(&key(10, "ALA"), &key(30, "TYR")).is_some());
    assert!(model.pair(&key(11, "ALA"), &key(30, "TYR")).is_none());
    assert_eq!(model.pair(&key(10, "ALA"), &key(30, "TYR")).unwrap().min_distance, 8.0);
}

#[test]
fn test_unknown_atom_rejected_without_touching_pair() {
    let baseline = model(&phe_entry());
    let fixture = phe_entry().restraint("99", &[(3, "ALA", "H")], &[(20, "PHE", "HB2")], 5.0);
    let model = model(&fixture);

    assert_eq!(
        model.exceptions_map_restraints.get("99"),
        Some(&RestraintFailure::UnknownAtom)
    );
    assert_eq!(model.pairs, baseline.pairs);
}

#[test]
fn test_row_order_does_not_change_model() {
    let fixture = phe_entry();
    let mut shuffled = fixture.clone();
    shuffled.shift_rows.reverse();
    shuffled.atom_rows.reverse();
    shuffled.atom_rows.rotate_left(5);

    assert_eq!(model(&shuffled), model(&fixture));
}

#[test]
fn test_entry_level_failures() {
    let dimer = phe_entry().assembly(&["1", "1"]);
    assert_eq!(build(&dimer), EntryOutcome::Failure(EntryFailure::NonProteinEntry));

    let no_ring = EntryFixture::new("3non", "5003")
        .amide(3, "ALA", 8.0, Some([0.0, 0.0, 0.0]))
        .restraint("1", &[(3, "ALA", "H")], &[(4, "GLY", "H")], 5.0);
    assert_eq!(build(&no_ring), EntryOutcome::Failure(EntryFailure::NoAromaticResidues));

    let isolated = EntryFixture::new("4far", "5004")
        .ring(30, AromaticResidue::Trp, [0.0, 0.0, 0.0])
        .amide(10, "ALA", 8.2, Some([20.0, 0.0, 0.0]))
        .restraint("1", &[(10, "ALA", "H")], &[(30, "TRP", "HZ2")], 5.0);
    assert_eq!(build(&isolated), EntryOutcome::Failure(EntryFailure::NoPairsFound));
}

#[test]
fn test_source_failures_map_to_reasons() {
    let fixture = phe_entry();
    let sources = MemorySources::new();
    let inputs = EntryInputs::load(&fixture.entry, &sources, &sources, &sources);
    assert_eq!(
        build_entry(&fixture.entry, inputs, &AnalysisConfig::default()),
        EntryOutcome::Failure(EntryFailure::ShiftFileAbsent)
    );

    let mut sources = memory_sources(&[fixture.clone()]);
    sources.restraints.remove(&fixture.entry);
    let inputs = EntryInputs::load(&fixture.entry, &sources, &sources, &sources);
    assert_eq!(
        build_entry(&fixture.entry, inputs, &AnalysisConfig::default()),
        EntryOutcome::Failure(EntryFailure::RestraintFileAbsent)
    );
}

#[test]
fn test_too_many_restraints_fails_entry() {
    let mut config = AnalysisConfig::default();
    config.restraints.max_restraints = 2;
    let fixture = phe_entry();
    assert_eq!(
        build_entry(&fixture.entry, inputs(&fixture), &config),
        EntryOutcome::Failure(EntryFailure::TooManyRestraints(2))
    );
}

#[test]
fn test_cached_model_round_trips_exactly() {
    let dir = tempdir().unwrap();
    let fixture = phe_entry().amide(7, "SER", 8.0, None).restraint(
        "99",
        &[(3, "ALA", "H")],
        &[(20, "PHE", "HB2")],
        5.0,
    );
    let cache = EntryCache::new(dir.path());
    let built = build(&fixture);
    cache.store(&fixture.entry, &built).unwrap();

    let reloaded = cache.load(&fixture.entry).unwrap().unwrap();
    assert_eq!(reloaded, built);

    let builder = CachedBuilder::new(cache, false);
    let served = builder.get_or_build(&fixture.entry, || panic!("cache should serve the entry"));
    assert_eq!(served, built);
}
