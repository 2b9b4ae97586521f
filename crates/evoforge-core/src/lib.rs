//! The ambient stack shared by every other `evoforge` crate: a thread-local
//! random provider, the `Individual`/`Population` bookkeeping types the
//! driver threads alongside a genome, the per-generation fitness history, and
//! the small statistics kernel (`median`, `sign`, the peak detector) that
//! both `distil` and coevolution's parasite selection build on.
//!
//! Nothing in this crate knows what a genome looks like — that is
//! [`evoforge-genome`](https://docs.rs/evoforge-genome)'s job. This crate is
//! pure bookkeeping and utility, generic over an opaque genome type `G`.

pub mod history;
pub mod population;
pub mod random;
pub mod stats;

pub mod prelude {
    pub use crate::history::{GenerationSummary, History};
    pub use crate::population::{Individual, Population, SubPopId};
    pub use crate::stats::{find_peaks, median, sign, Peak};
}
