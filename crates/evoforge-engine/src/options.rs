//! Recognised `evolve_discrete`/`simple_evolve` options (§6): termination,
//! reporting cadence, and snapshot resume.

use evoforge_core::population::Population;

/// Driver options. Construct with [`EvolveOptions::default`] and adjust the
/// fields that matter; every field has the documented default.
pub struct EvolveOptions<G> {
    /// Maximum generations to run. Default `100`.
    pub n_gens: usize,
    /// Terminate early once any individual's fitness reaches this value.
    /// Default `+∞` (never triggers).
    pub target: f64,
    /// Call `progress` every `progress_every`-th generation, in addition to
    /// the first, the last, and whichever generation first reaches `target`.
    /// Default `1` (every generation).
    pub progress_every: usize,
    /// A previously evaluated population to seed `eval_popn_fitness`'s `prev`
    /// argument with, for snapshot resume. Default `None`.
    pub prev_popn: Option<Population<G>>,
}

impl<G> Default for EvolveOptions<G> {
    fn default() -> Self {
        EvolveOptions {
            n_gens: 100,
            target: f64::INFINITY,
            progress_every: 1,
            prev_popn: None,
        }
    }
}

impl<G> EvolveOptions<G> {
    pub(crate) fn should_report(&self, gen: usize, target_reached: bool) -> bool {
        gen == 0
            || gen + 1 >= self.n_gens
            || target_reached
            || (self.progress_every > 0 && gen % self.progress_every == 0)
    }
}
