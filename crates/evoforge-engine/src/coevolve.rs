//! `coevolve` (§4.7): two tagged sub-populations duelling through a
//! user-supplied pairwise fitness, with pluggable parasite selection.

use evoforge_core::history::History;
use evoforge_core::population::{Individual, Population, SubPopId};
use evoforge_core::random;

/// How a sub-population's duelling opponents ("parasites") are drawn from
/// the *other* sub-population each generation.
#[derive(Debug, Clone)]
pub enum ParasiteSelection {
    /// The `n` current highest-fitness members.
    TopN(usize),
    /// `top_n` from the current generation, plus up to `peaks_m` champions
    /// drawn from the history's fitness peaks: eligible peaks are sorted by
    /// value, the top `2 * peaks_m` are kept, shuffled, and `peaks_m` taken —
    /// so the pool isn't dominated by whichever peak happened to be largest.
    CurrentBestPlusHistoryPeaks { top_n: usize, peaks_m: usize },
}

/// `coevolve` options. No `prev_popn` snapshot field — unlike
/// `evolve_discrete`, coevolution always starts both sub-populations fresh.
pub struct CoevolveOptions {
    pub n_gens: usize,
    pub target: f64,
    pub progress_every: usize,
}

impl Default for CoevolveOptions {
    fn default() -> Self {
        CoevolveOptions {
            n_gens: 100,
            target: f64::INFINITY,
            progress_every: 1,
        }
    }
}

impl CoevolveOptions {
    fn should_report(&self, gen: usize, target_reached: bool) -> bool {
        gen == 0
            || gen + 1 >= self.n_gens
            || target_reached
            || (self.progress_every > 0 && gen % self.progress_every == 0)
    }
}

/// The result of a completed `coevolve` run.
pub struct CoevolveResult<G> {
    pub popn_a: Population<G>,
    pub popn_b: Population<G>,
    pub history_a: History<G>,
    pub history_b: History<G>,
    pub n_gens: usize,
}

fn top_n_genomes<G: Clone>(popn: &Population<G>, n: usize) -> Vec<G> {
    let mut ranked: Vec<&Individual<G>> = popn.iter().collect();
    ranked.sort_by(|a, b| b.fitness_or_zero().partial_cmp(&a.fitness_or_zero()).expect("NaN fitness"));
    ranked.into_iter().take(n).map(|i| i.genome.clone()).collect()
}

/// Champion genomes from the history's local fitness peaks (§4.8), newest
/// member of a flat top wins when several summaries share a peak's value.
fn champion_genomes_from_peaks<G: Clone>(history: &History<G>, m: usize) -> Vec<G> {
    if m == 0 {
        return Vec::new();
    }
    let summaries = history.summaries();
    let mut eligible: Vec<(f64, G)> = history
        .peaks()
        .into_iter()
        .filter_map(|peak| {
            summaries[peak.start..=peak.end]
                .iter()
                .find(|s| s.max == peak.value)
                .and_then(|s| s.best.clone())
                .map(|g| (peak.value, g))
        })
        .collect();

    eligible.sort_by(|a, b| b.0.partial_cmp(&a.0).expect("NaN peak value"));
    eligible.truncate(2 * m);

    let mut genomes: Vec<G> = eligible.into_iter().map(|(_, g)| g).collect();
    random::shuffle(&mut genomes);
    genomes.truncate(m);
    genomes
}

fn select_parasites<G: Clone>(popn: &Population<G>, history: &History<G>, selection: &ParasiteSelection) -> Vec<G> {
    match selection {
        ParasiteSelection::TopN(n) => top_n_genomes(popn, *n),
        ParasiteSelection::CurrentBestPlusHistoryPeaks { top_n, peaks_m } => {
            let mut genomes = top_n_genomes(popn, *top_n);
            genomes.extend(champion_genomes_from_peaks(history, *peaks_m));
            genomes
        }
    }
}

/// Duels every member of `popn` against every genome in `parasites`, scoring
/// each individual as the mean over its duels. `is_a` selects which half of
/// `fitness`'s `(fitness_a, fitness_b)` result belongs to `popn` — callers on
/// the B side pass their parasite as `fitness`'s first argument, since the
/// user's callback fixes argument order to (A, B).
fn duel<G, Fit>(popn: Population<G>, parasites: &[G], fitness: &mut Fit, is_a: bool, tag: SubPopId) -> Population<G>
where
    G: Clone,
    Fit: FnMut(&G, &G) -> (f64, f64),
{
    let individuals = popn.into_inner();
    let evaluated = individuals
        .into_iter()
        .map(|ind| {
            if parasites.is_empty() {
                return Individual::tagged(ind.genome, tag).with_fitness(0.0);
            }
            let scores: Vec<f64> = parasites
                .iter()
                .map(|parasite| {
                    let (fa, fb) = if is_a {
                        fitness(&ind.genome, parasite)
                    } else {
                        fitness(parasite, &ind.genome)
                    };
                    if is_a {
                        fa
                    } else {
                        fb
                    }
                })
                .collect();
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Individual::tagged(ind.genome, tag).with_fitness(mean)
        })
        .collect();
    Population::new(evaluated)
}

/// Runs coevolution: each generation, A duels the parasites drawn from B
/// (and vice versa), both sides are distilled into their own `History`, and
/// both regenerate independently. Terminates when either side's max fitness
/// reaches `options.target`, or after `options.n_gens` generations.
#[tracing::instrument(skip_all)]
pub fn coevolve<G, Fit, RA, RB, P>(
    init_a: Population<G>,
    init_b: Population<G>,
    mut fitness: Fit,
    parasite_selection: ParasiteSelection,
    mut regenerate_a: RA,
    mut regenerate_b: RB,
    options: CoevolveOptions,
    mut progress: P,
) -> CoevolveResult<G>
where
    G: Clone,
    Fit: FnMut(&G, &G) -> (f64, f64),
    RA: FnMut(Population<G>) -> Population<G>,
    RB: FnMut(Population<G>) -> Population<G>,
    P: FnMut(usize, &Population<G>, &Population<G>, &History<G>, &History<G>),
{
    let mut history_a: History<G> = History::new();
    let mut history_b: History<G> = History::new();
    let mut current_a = init_a;
    let mut current_b = init_b;
    let mut gen = 0usize;

    loop {
        let parasites_for_a = select_parasites(&current_b, &history_b, &parasite_selection);
        let parasites_for_b = select_parasites(&current_a, &history_a, &parasite_selection);

        let evaluated_a = duel(current_a, &parasites_for_a, &mut fitness, true, SubPopId::A);
        let evaluated_b = duel(current_b, &parasites_for_b, &mut fitness, false, SubPopId::B);

        history_a.record(gen, &evaluated_a);
        history_b.record(gen, &evaluated_b);

        let max_fitness = evaluated_a.max_fitness().max(evaluated_b.max_fitness());
        let target_reached = max_fitness >= options.target;
        if options.should_report(gen, target_reached) {
            progress(gen, &evaluated_a, &evaluated_b, &history_a, &history_b);
        }

        if target_reached || gen + 1 >= options.n_gens {
            tracing::info!(gen, max_fitness, target_reached, "coevolve terminated");
            return CoevolveResult {
                popn_a: evaluated_a,
                popn_b: evaluated_b,
                history_a,
                history_b,
                n_gens: gen,
            };
        }

        current_a = regenerate_a(evaluated_a);
        current_b = regenerate_b(evaluated_b);
        gen += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coevolve_terminates_on_target() {
        let popn_a = Population::from_genomes(vec![0.0_f64, 1.0, 2.0]);
        let popn_b = Population::from_genomes(vec![0.0_f64, 1.0, 2.0]);

        let result = coevolve(
            popn_a,
            popn_b,
            |a: &f64, b: &f64| (a - b, b - a),
            ParasiteSelection::TopN(2),
            |evaluated: Population<f64>| Population::from_genomes(evaluated.iter().map(|i| i.genome + 1.0)),
            |evaluated: Population<f64>| Population::from_genomes(evaluated.iter().map(|i| i.genome)),
            CoevolveOptions { n_gens: 50, target: 4.0, ..CoevolveOptions::default() },
            |_, _, _, _, _| {},
        );

        assert!(result.popn_a.max_fitness() >= 4.0 || result.n_gens + 1 >= 50);
        assert_eq!(result.history_a.len(), result.n_gens + 1);
        assert_eq!(result.history_b.len(), result.n_gens + 1);
    }

    #[test]
    fn current_best_plus_history_peaks_respects_m() {
        let mut history: History<i32> = History::new();
        for (gen, max) in [0.1, 0.4, 0.9, 0.9, 0.6, 0.2, 0.8].into_iter().enumerate() {
            let pop = Population::new(vec![Individual::new(gen as i32).with_fitness(max)]);
            history.record(gen, &pop);
        }
        let champions = champion_genomes_from_peaks(&history, 1);
        assert_eq!(champions.len(), 1);
    }
}
