//! Regeneration policies (§4.6): negative selection, tournament, and
//! fully-mixed. Each takes the caller's own `crossover`/`mutate` closures,
//! since those are genome-variant-specific (`evoforge-variate`'s CGP/ICGP/
//! Tree operators all have different signatures) — this module only owns
//! the selection/replacement arithmetic.

use evoforge_core::population::{Individual, Population};
use evoforge_core::random;

fn sorted_by_fitness_desc<G: Clone>(individuals: &[Individual<G>]) -> Vec<Individual<G>> {
    let mut ranked = individuals.to_vec();
    ranked.sort_by(|a, b| b.fitness_or_zero().partial_cmp(&a.fitness_or_zero()).expect("NaN fitness"));
    ranked
}

/// Keeps the top `select_n` by fitness as the breeding pool, preserves
/// `elitism` champions unchanged, and fills the rest by pairing random picks
/// from the pool through `crossover` then `mutate`.
pub fn negative_selection<G, X, M>(
    evaluated: Population<G>,
    select_n: usize,
    elitism: usize,
    mut crossover: X,
    mut mutate: M,
) -> Population<G>
where
    G: Clone,
    X: FnMut(&G, &G) -> G,
    M: FnMut(G) -> G,
{
    let individuals = evaluated.into_inner();
    let n = individuals.len();
    let ranked = sorted_by_fitness_desc(&individuals);

    let pool: Vec<G> = ranked.iter().take(select_n.max(1).min(n.max(1))).map(|i| i.genome.clone()).collect();
    let mut next: Vec<Individual<G>> = ranked.iter().take(elitism.min(n)).map(|i| Individual::new(i.genome.clone())).collect();

    while next.len() < n {
        let a = random::choose(&pool);
        let b = random::choose(&pool);
        let child = mutate(crossover(a, b));
        next.push(Individual::new(child));
    }

    Population::new(next)
}

/// Runs `n - elitism` tournaments of `size` random contestants (shuffled
/// first, so fitness ties break randomly and neutral drift still
/// propagates); each tournament's best two go through `crossover` then
/// `mutate`.
pub fn tournament<G, X, M>(
    evaluated: Population<G>,
    size: usize,
    elitism: usize,
    mut crossover: X,
    mut mutate: M,
) -> Population<G>
where
    G: Clone,
    X: FnMut(&G, &G) -> G,
    M: FnMut(G) -> G,
{
    let individuals = evaluated.into_inner();
    let n = individuals.len();
    let ranked = sorted_by_fitness_desc(&individuals);
    let mut next: Vec<Individual<G>> = ranked.iter().take(elitism.min(n)).map(|i| Individual::new(i.genome.clone())).collect();

    if n == 0 {
        return Population::new(next);
    }
    let contest_size = size.clamp(2, n);

    while next.len() < n {
        let mut order: Vec<usize> = (0..n).collect();
        random::shuffle(&mut order);
        let mut contestants: Vec<&Individual<G>> = order.iter().take(contest_size).map(|&i| &individuals[i]).collect();
        contestants.sort_by(|a, b| b.fitness_or_zero().partial_cmp(&a.fitness_or_zero()).expect("NaN fitness"));

        let child = mutate(crossover(&contestants[0].genome, &contestants[1].genome));
        next.push(Individual::new(child));
    }

    Population::new(next)
}

/// A deterministic proportional split: `elitism` champions pass through
/// unchanged, then the remainder splits between mutation-only and
/// crossover-then-nothing-else children according to `mutation_prob`, each
/// parent drawn uniformly from the whole evaluated population.
pub fn fully_mixed<G, X, M>(
    evaluated: Population<G>,
    elitism: usize,
    mutation_prob: f64,
    mut crossover: X,
    mut mutate: M,
) -> Population<G>
where
    G: Clone,
    X: FnMut(&G, &G) -> G,
    M: FnMut(G) -> G,
{
    let individuals = evaluated.into_inner();
    let n = individuals.len();
    let ranked = sorted_by_fitness_desc(&individuals);
    let mut next: Vec<Individual<G>> = ranked.iter().take(elitism.min(n)).map(|i| Individual::new(i.genome.clone())).collect();

    let remaining = n.saturating_sub(next.len());
    let n_mutation = ((remaining as f64) * mutation_prob.clamp(0.0, 1.0)).round() as usize;
    let n_crossover = remaining.saturating_sub(n_mutation);

    let pool: Vec<G> = individuals.iter().map(|i| i.genome.clone()).collect();
    if pool.is_empty() {
        return Population::new(next);
    }

    for _ in 0..n_mutation {
        let parent = random::choose(&pool).clone();
        next.push(Individual::new(mutate(parent)));
    }
    for _ in 0..n_crossover {
        let a = random::choose(&pool);
        let b = random::choose(&pool);
        next.push(Individual::new(crossover(a, b)));
    }

    Population::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop(fitnesses: &[f64]) -> Population<f64> {
        Population::new(fitnesses.iter().map(|&f| Individual::new(f).with_fitness(f)).collect())
    }

    #[test]
    fn negative_selection_preserves_elitism_and_size() {
        let p = pop(&[0.1, 0.9, 0.5, 0.3, 0.7]);
        let next = negative_selection(p, 3, 2, |a, b| (a + b) / 2.0, |g| g);
        assert_eq!(next.len(), 5);
        assert!(next.iter().any(|i| i.genome == 0.9));
        assert!(next.iter().any(|i| i.genome == 0.7));
    }

    #[test]
    fn tournament_preserves_size() {
        let p = pop(&[0.1, 0.9, 0.5, 0.3, 0.7, 0.2]);
        let next = tournament(p, 3, 1, |a, b| (a + b) / 2.0, |g| g);
        assert_eq!(next.len(), 6);
    }

    #[test]
    fn fully_mixed_preserves_size() {
        let p = pop(&[0.1, 0.9, 0.5, 0.3]);
        let next = fully_mixed(p, 1, 0.5, |a, b| (a + b) / 2.0, |g| g);
        assert_eq!(next.len(), 4);
    }
}
