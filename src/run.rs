//! Headless training driver: the generation loop the game scene performs,
//! minus rendering.
//!
//! A [`Run`] seeds a population (randomly, or from a persisted brain),
//! alternates episodes with [`GeneticAlgorithm::advance`], tracks the
//! run-wide [`Champion`], and stops at the generation cap or when the
//! champion reaches a target score.

use std::path::PathBuf;

use rand::prelude::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::genetic::{GaConfig, GeneticAlgorithm};
use crate::network::NeuralNetwork;
use crate::population::{Champion, Environment, GenerationStats, Individual};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub population_size: usize,
    /// Hard cap on the number of generations played.
    pub max_generations: usize,
    /// Stop early once the champion reaches this score.
    pub target_fitness: Option<u32>,
    /// Layer-size vector for freshly seeded brains.
    pub layers: Vec<usize>,
    /// When set, every initial individual starts from a deep copy of this
    /// persisted brain instead of a random network.
    pub resume_from: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 150,
            target_fitness: None,
            layers: vec![2, 3, 1],
            resume_from: None,
        }
    }
}

/// Outcome of [`Run::evolve`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub generations: usize,
    pub champion: Champion,
    pub history: Vec<GenerationStats>,
}

pub struct Run {
    config: RunConfig,
    ga: GeneticAlgorithm,
    population: Vec<Individual>,
    champion: Champion,
    generation: usize,
}

impl Run {
    pub fn new(config: RunConfig, ga_config: GaConfig, seed: u64) -> Result<Self> {
        // Decorrelate the seeding stream from the evolution stream.
        let mut rng = Pcg64::seed_from_u64(seed);
        let ga = GeneticAlgorithm::new(ga_config, seed.wrapping_add(0x9e37_79b9_7f4a_7c15));

        let population = match &config.resume_from {
            Some(path) => {
                let brain = NeuralNetwork::import(path)?;
                tracing::info!(path = %path.display(), layers = ?brain.layer_sizes(), "resuming from persisted brain");
                (0..config.population_size)
                    .map(|_| Individual::new(brain.clone()))
                    .collect()
            }
            None => (0..config.population_size)
                .map(|_| NeuralNetwork::random(&config.layers, &mut rng).map(Individual::new))
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Self {
            config,
            ga,
            population,
            champion: Champion::new(),
            generation: 0,
        })
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn champion(&self) -> &Champion {
        &self.champion
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Plays generations until the cap or the target score is reached.
    pub fn evolve<E: Environment>(&mut self, env: &mut E) -> Result<Report> {
        let mut history = Vec::new();

        while self.generation < self.config.max_generations {
            env.run_episode(&mut self.population);
            self.generation += 1;

            let stats = GenerationStats::measure(&self.population);
            self.champion.observe_all(&self.population);
            tracing::info!(
                generation = self.generation,
                highest = stats.highest,
                mean = stats.mean,
                over_mean = stats.over_mean,
                "generation complete"
            );
            history.push(stats);

            if let Some(target) = self.config.target_fitness {
                if self.champion.fitness() >= target {
                    tracing::info!(target, "target fitness reached");
                    break;
                }
            }
            if self.generation < self.config.max_generations {
                self.population = self.ga.advance(&self.population)?;
            }
        }

        Ok(Report {
            generations: self.generation,
            champion: self.champion.clone(),
            history,
        })
    }
}
