//! `evoforge`: a genetic programming engine evolving typed program-graphs
//! under stochastic variation and selection.
//!
//! This crate is a thin re-export over the workspace's seven core crates —
//! [`evoforge_core`] (RNG, population/history bookkeeping), [`evoforge_lang`]
//! (the typed operator vocabulary), [`evoforge_genome`] (Tree/CGP/ICGP
//! genomes), [`evoforge_compile`] (genome → callable compilation, with
//! caching), [`evoforge_variate`] (mutation/crossover/vary-neutral policy),
//! and [`evoforge_engine`] (the discrete-generation evolve/coevolve driver).
//! Most callers want [`prelude`].

pub use evoforge_compile as compile;
pub use evoforge_core as core;
pub use evoforge_engine as engine;
pub use evoforge_error as error;
pub use evoforge_genome as genome;
pub use evoforge_lang as lang;
pub use evoforge_variate as variate;

pub mod prelude {
    pub use evoforge_core::prelude::*;
    pub use evoforge_error::{EvoError, ErrorCode, Result};
    pub use evoforge_lang::{ErcGen, LangEntry, Language, SymbolType, Ty};
    pub use evoforge_genome::prelude::*;
    pub use evoforge_compile::prelude::*;
    pub use evoforge_variate::prelude::*;
    pub use evoforge_engine::prelude::*;
    pub use evoforge_engine::init_logging;
}
