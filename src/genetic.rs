//! Generational step: fitness-proportionate selection with elitism, followed
//! by mutation and pairwise layer crossover.
//!
//! One [`GeneticAlgorithm::advance`] call consumes a fully played-out
//! generation (every individual dead, fitness final) and produces the next
//! one. The engine owns a seeded [`Pcg64`], so a fixed seed makes the whole
//! step deterministic.

use std::cmp::Ordering;

use rand::prelude::SeedableRng;
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::NeuralNetwork;
use crate::population::Individual;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GaConfig {
    /// Number of top-fitness individuals carried over verbatim. Elitism is
    /// skipped entirely when the population is not larger than this.
    pub elite_count: usize,
    /// Per-weight-entry mutation probability.
    pub mutation_chance: f32,
    /// Threshold on the per-individual pairing draw; see
    /// [`GeneticAlgorithm::advance`] step 5.
    pub crossover_chance: f32,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            elite_count: 10,
            mutation_chance: 0.1,
            crossover_chance: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct GeneticAlgorithm {
    config: GaConfig,
    rng: Pcg64,
}

impl GeneticAlgorithm {
    pub fn new(config: GaConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Produces the next generation from a played-out one. The result has
    /// the same length; every member owns a fresh brain and reset run-time
    /// state.
    ///
    /// Steps, in order:
    /// 1. extract the fitness scores;
    /// 2. roulette selection over the normalized cumulative distribution;
    ///    an all-zero generation falls back to uniform probabilities instead
    ///    of dividing by zero;
    /// 3. elitism: the top `elite_count` by fitness overwrite the first
    ///    slots verbatim;
    /// 4. mutation of every member, elites included;
    /// 5. pairwise layer crossover gated by per-individual draws.
    pub fn advance(&mut self, old: &[Individual]) -> Result<Vec<Individual>> {
        if old.is_empty() {
            return Ok(Vec::new());
        }

        let scores: Vec<u32> = old.iter().map(|i| i.fitness).collect();
        let cumulative = match roulette_distribution(&scores) {
            Ok(q) => q,
            Err(Error::DegenerateFitness) => {
                tracing::warn!(
                    population = old.len(),
                    "every individual scored zero; selecting uniformly"
                );
                uniform_distribution(scores.len())
            }
            Err(e) => return Err(e),
        };

        // Selection: each slot deep-copies the brain of the parent whose
        // cumulative interval contains a fresh draw from (0, 1].
        let mut next: Vec<Individual> = (0..old.len())
            .map(|_| {
                let r = 1.0 - self.rng.random::<f32>();
                let parent = pick(&cumulative, r);
                Individual::new(old[parent].brain.clone())
            })
            .collect();

        // Elitism: ascending sort by fitness, trailing `elite_count` indices
        // are the elites.
        if self.config.elite_count < old.len() {
            let mut by_fitness: Vec<usize> = (0..old.len()).collect();
            by_fitness.sort_by_key(|&i| scores[i]);
            let elites = &by_fitness[old.len() - self.config.elite_count..];
            for (slot, &source) in elites.iter().enumerate() {
                next[slot] = Individual::new(old[source].brain.clone());
            }
        }

        // Mutation runs after the elite copy-in, so elites mutate too.
        for individual in &mut next {
            individual
                .brain
                .mutate(self.config.mutation_chance, &mut self.rng);
        }

        self.recombine(&mut next)?;
        Ok(next)
    }

    /// Step 5: every individual gets a uniform draw from `[0, 1)`, the
    /// population is sorted by draw ascending, and adjacent pairs are walked
    /// until the first draw of a pair exceeds `crossover_chance`. A pair
    /// whose draws both fall under the threshold recombines unconditionally;
    /// a pair whose second draw landed past it is gated by
    /// [`second_draw_coin`].
    fn recombine(&mut self, population: &mut Vec<Individual>) -> Result<()> {
        let chance = self.config.crossover_chance;
        let mut drawn: Vec<(f32, Individual)> = population
            .drain(..)
            .map(|individual| (self.rng.random::<f32>(), individual))
            .collect();
        drawn.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut i = 0;
        while i + 1 < drawn.len() {
            if drawn[i].0 > chance {
                break;
            }
            if drawn[i + 1].0 < chance || second_draw_coin(&mut self.rng) {
                let (left, right) =
                    NeuralNetwork::crossover(&drawn[i].1.brain, &drawn[i + 1].1.brain)?;
                drawn[i].1.brain = left;
                drawn[i + 1].1.brain = right;
            }
            i += 2;
        }

        population.extend(drawn.into_iter().map(|(_, individual)| individual));
        Ok(())
    }
}

/// Gate for pairs whose second draw landed past the crossover threshold. The
/// integer draw ranges over `0..1` and therefore only ever yields zero, so
/// the gate never opens; such pairs stay uncrossed.
fn second_draw_coin<R: Rng>(rng: &mut R) -> bool {
    rng.random_range(0..1_u32) == 1
}

/// Cumulative selection distribution `q` with `q[0] = 0` and
/// `q[i+1] = q[i] + score[i] / total`. Fails with [`Error::DegenerateFitness`]
/// when the total is zero.
fn roulette_distribution(scores: &[u32]) -> Result<Vec<f32>> {
    let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    if total == 0 {
        return Err(Error::DegenerateFitness);
    }
    let mut q = Vec::with_capacity(scores.len() + 1);
    q.push(0.0);
    let mut acc = 0.0;
    for &score in scores {
        acc += score as f32 / total as f32;
        q.push(acc);
    }
    Ok(q)
}

/// Uniform fallback distribution over `n` individuals.
fn uniform_distribution(n: usize) -> Vec<f32> {
    (0..=n).map(|i| i as f32 / n as f32).collect()
}

/// Index `j` such that `q[j] < r <= q[j + 1]`. Float roundoff can leave the
/// last boundary slightly below 1, in which case the final interval wins.
fn pick(cumulative: &[f32], r: f32) -> usize {
    for j in 0..cumulative.len() - 1 {
        if cumulative[j] < r && r <= cumulative[j + 1] {
            return j;
        }
    }
    cumulative.len() - 2
}
