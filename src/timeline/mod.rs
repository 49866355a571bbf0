//! Timeline-aligned dub synthesis.
//!
//! The aligner places one synthesized clip into its segment's window on the
//! master timeline; the builder assembles the placed clips plus silence fill
//! into one continuous track matching the master media duration exactly.

pub mod align;
pub mod composite;

pub use align::{align, AlignmentConfig, PlacedClip};
pub use composite::{build, CompositeTrack};
