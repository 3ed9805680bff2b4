//! ringshift-model: The fused per-entry model and the pipeline that
//! builds it.
//!
//! For one (structure, shift set) entry:
//!   1. Fuse extracted shifts with the representative conformer (`fusion`)
//!   2. Pair amide protons with nearby aromatic rings (`pairing`)
//!   3. Attach NOE restraint evidence to the pairs (`attach`)
//!
//! `builder` runs the three steps as one pure function; `cache` layers
//! per-entry JSON dumps on top and `entry_set` collects a batch.

pub mod failure;
pub mod protein;
pub mod fusion;
pub mod pairing;
pub mod attach;
pub mod builder;
pub mod entry_set;
pub mod cache;

pub use builder::{build_entry, EntryInputs};
pub use cache::{CachedBuilder, EntryCache};
pub use entry_set::EntrySet;
pub use failure::{EntryFailure, EntryOutcome, ResidueFailure, RestraintFailure};
pub use protein::{AmideAromaticPair, AmideProton, AromaticRing, EntryModel, Evidence, EvidenceTag};
