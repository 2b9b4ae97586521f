//! Compiles `evoforge-genome` genomes into callable straight-line programs.
//!
//! This crate owns the runtime [`Value`] type, the documented pathological-
//! value numeric policies, an external-operator [`registry::Registry`], the
//! flattened [`program::Program`] representation, the [`compiler::Compile`]
//! trait (one impl per genome variant), and a fingerprint-keyed
//! [`cache::CachedGenome`] wrapper that keeps compiled-program caching
//! outside the genome value itself.

pub mod cache;
pub mod compiler;
pub mod numeric;
pub mod program;
pub mod registry;
pub mod value;

pub mod prelude {
    pub use crate::cache::CachedGenome;
    pub use crate::compiler::Compile;
    pub use crate::program::{Program, Step};
    pub use crate::registry::Registry;
    pub use crate::value::Value;
}
