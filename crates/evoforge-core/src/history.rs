//! Per-generation fitness history, used both to feed `progress!` snapshots
//! (`spec.md` §4.6's `distil`) and to drive coevolution's history-peak
//! parasite selection (§4.7).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::population::Population;
use crate::stats::{find_peaks, median, Peak};

/// The distilled fitness statistics for one generation: the min/median/max
/// across the population, and a clone of the best genome seen that
/// generation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationSummary<G> {
    pub generation: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    pub best: Option<G>,
}

/// A growable record of [`GenerationSummary`], one per completed generation.
/// `evolve_discrete` appends to this every generation and passes it to
/// `progress!`; `coevolve`'s history-peak parasite policy reads the max-
/// fitness series back out of it.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct History<G> {
    summaries: Vec<GenerationSummary<G>>,
}

impl<G> History<G> {
    pub fn new() -> Self {
        History {
            summaries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn summaries(&self) -> &[GenerationSummary<G>] {
        &self.summaries
    }

    pub fn latest(&self) -> Option<&GenerationSummary<G>> {
        self.summaries.last()
    }

    /// Distils `population`'s fitness values into a [`GenerationSummary`] and
    /// appends it. A missing fitness counts as `0.0`, matching
    /// [`crate::population::Individual::fitness_or_zero`].
    pub fn record(&mut self, generation: usize, population: &Population<G>)
    where
        G: Clone,
    {
        let mut values: Vec<f64> = population.iter().map(|i| i.fitness_or_zero()).collect();
        values.sort_by(|a, b| a.partial_cmp(b).expect("record: NaN fitness value"));

        let min = values.first().copied().unwrap_or(0.0);
        let max = values.last().copied().unwrap_or(0.0);
        let med = median(&values);
        let best = population.best().map(|i| i.genome.clone());

        self.summaries.push(GenerationSummary {
            generation,
            min,
            median: med,
            max,
            best,
        });
    }

    /// The per-generation max-fitness series, in generation order.
    pub fn max_series(&self) -> Vec<f64> {
        self.summaries.iter().map(|s| s.max).collect()
    }

    /// Local peaks of [`Self::max_series`] — generations where the running
    /// best genuinely improved before plateauing or regressing. Used by
    /// coevolution's history-peak parasite selection to pick adversaries
    /// from past high points, not just the current generation.
    pub fn peaks(&self) -> Vec<Peak> {
        find_peaks(&self.max_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::Individual;

    #[test]
    fn record_distils_min_median_max() {
        let pop = Population::new(vec![
            Individual::new(1).with_fitness(0.1),
            Individual::new(2).with_fitness(0.5),
            Individual::new(3).with_fitness(0.9),
        ]);
        let mut history: History<i32> = History::new();
        history.record(0, &pop);

        let summary = history.latest().unwrap();
        assert_eq!(summary.min, 0.1);
        assert_eq!(summary.median, 0.5);
        assert_eq!(summary.max, 0.9);
        assert_eq!(summary.best, Some(3));
    }

    #[test]
    fn peaks_reflect_improvement_then_plateau() {
        let mut history: History<i32> = History::new();
        for (gen, max) in [0.1, 0.4, 0.9, 0.9, 0.6].into_iter().enumerate() {
            let pop = Population::new(vec![Individual::new(gen as i32).with_fitness(max)]);
            history.record(gen, &pop);
        }
        let peaks = history.peaks();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].value, 0.9);
    }
}
