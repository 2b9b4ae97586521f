//! `evolve_discrete` (§4.6): the discrete-generation population loop every
//! other driver (`simple_evolve`, `coevolve`) is built from.

use evoforge_core::history::History;
use evoforge_core::population::{Individual, Population};

use crate::options::EvolveOptions;

/// The result of a completed `evolve_discrete` run.
pub struct EvolveResult<G> {
    pub popn: Population<G>,
    pub history: History<G>,
    pub n_gens: usize,
}

/// Runs the discrete-generation loop: evaluate, distil into `history`, gate
/// `progress`, check termination, else regenerate and advance.
///
/// `eval_popn_fitness(current, prev, history) -> evaluated` may reorder
/// individuals freely — fitness tags travel with each `Individual`, not with
/// population position.
#[tracing::instrument(skip_all)]
pub fn evolve_discrete<G, F, R, P>(
    init: Population<G>,
    mut eval_popn_fitness: F,
    mut regenerate: R,
    mut options: EvolveOptions<G>,
    mut progress: P,
) -> EvolveResult<G>
where
    G: Clone,
    F: FnMut(Population<G>, Option<&Population<G>>, &History<G>) -> Population<G>,
    R: FnMut(Population<G>) -> Population<G>,
    P: FnMut(usize, &Population<G>, &History<G>),
{
    let mut history: History<G> = History::new();
    let mut prev = options.prev_popn.take();
    let mut current = init;
    let mut gen = 0usize;

    loop {
        let evaluated = eval_popn_fitness(current, prev.as_ref(), &history);
        history.record(gen, &evaluated);

        let max_fitness = evaluated.max_fitness();
        let target_reached = max_fitness >= options.target;
        if options.should_report(gen, target_reached) {
            progress(gen, &evaluated, &history);
        }

        if target_reached || gen + 1 >= options.n_gens {
            tracing::info!(gen, max_fitness, target_reached, "evolve_discrete terminated");
            return EvolveResult { popn: evaluated, history, n_gens: gen };
        }

        let next = regenerate(evaluated.clone());
        prev = Some(evaluated);
        current = next;
        gen += 1;
    }
}

/// The default `map_fn`: fitness evaluated sequentially, in population order.
pub fn sequential_map<G>(individuals: &[Individual<G>], fitness: &impl Fn(&G) -> f64) -> Vec<f64> {
    individuals.iter().map(|i| fitness(&i.genome)).collect()
}

/// A rayon-backed `map_fn`, available under the `rayon` feature. The fitness
/// callback must be a pure, `Sync` function of the genome — `simple_evolve`'s
/// concurrency contract (§5): no shared-state mutation across the evaluation
/// pass.
#[cfg(feature = "rayon")]
pub fn parallel_map<G: Sync>(individuals: &[Individual<G>], fitness: &(impl Fn(&G) -> f64 + Sync)) -> Vec<f64> {
    use rayon::prelude::*;
    individuals.par_iter().map(|i| fitness(&i.genome)).collect()
}

/// Wraps `evolve_discrete` for the common case where fitness is a pure
/// function of one individual: `map_fn` controls whether that function is
/// applied sequentially or in parallel across the population.
pub fn simple_evolve<G, Fit, Map, R, P>(
    init: Population<G>,
    fitness: Fit,
    map_fn: Map,
    regenerate: R,
    options: EvolveOptions<G>,
    progress: P,
) -> EvolveResult<G>
where
    G: Clone,
    Fit: Fn(&G) -> f64,
    Map: Fn(&[Individual<G>], &Fit) -> Vec<f64>,
    R: FnMut(Population<G>) -> Population<G>,
    P: FnMut(usize, &Population<G>, &History<G>),
{
    let eval = |current: Population<G>, _prev: Option<&Population<G>>, _history: &History<G>| {
        let individuals = current.into_inner();
        let scores = map_fn(&individuals, &fitness);
        let evaluated: Vec<Individual<G>> =
            individuals.into_iter().zip(scores).map(|(ind, f)| ind.with_fitness(f)).collect();
        Population::new(evaluated)
    };
    evolve_discrete(init, eval, regenerate, options, progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_on_target() {
        let init = Population::from_genomes(vec![0.0_f64, 1.0, 2.0]);
        let options = EvolveOptions { n_gens: 50, target: 5.0, ..EvolveOptions::default() };

        let result = simple_evolve(
            init,
            |g: &f64| *g,
            sequential_map,
            |evaluated: Population<f64>| {
                Population::from_genomes(evaluated.iter().map(|i| i.genome + 1.0))
            },
            options,
            |_, _, _| {},
        );

        assert!(result.popn.max_fitness() >= 5.0);
        assert!(result.n_gens < 50);
    }

    #[test]
    fn terminates_on_n_gens_when_target_unreachable() {
        let init = Population::from_genomes(vec![0.0_f64]);
        let options = EvolveOptions { n_gens: 5, target: 1000.0, ..EvolveOptions::default() };

        let result = simple_evolve(
            init,
            |g: &f64| *g,
            sequential_map,
            |evaluated: Population<f64>| Population::from_genomes(evaluated.iter().map(|i| i.genome + 1.0)),
            options,
            |_, _, _| {},
        );

        assert_eq!(result.n_gens, 4);
        assert_eq!(result.history.len(), 5);
    }
}
