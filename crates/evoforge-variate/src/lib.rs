//! Variation policy: mutation, crossover, neutral drift, and timestep
//! orchestration for `evoforge-genome`'s three genome variants.
//!
//! This crate deliberately sits above `evoforge-genome`: the genome crate
//! owns construction and the mechanical structural primitives
//! (`exchange_node`, `bump`, `downstream_of`, `active_set`, ...), and this
//! crate owns the *policy* of when and how to call them — which is where
//! `gene_mut_rate`/`node_mut_rate` and the other variation-rate knobs live.

pub mod cgp;
pub mod icgp;
pub mod tree;

pub mod prelude {
    pub use crate::cgp::mutate as mutate_cgp;
    pub use crate::icgp::{merge as merge_icgp, mutate as mutate_icgp, tick as tick_icgp, vary_neutral};
    pub use crate::tree::crossover as crossover_tree;
}
