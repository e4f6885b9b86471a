//! Individuals, the episode-driver boundary, and run-level bookkeeping.
//!
//! The game engine (out of scope here) owns the simulation: it runs one
//! episode per generation, ticking every live bird, rewarding survival, and
//! killing birds that collide or leave the field. This module is the thin
//! seam between that world and the evolutionary core.

use serde::{Deserialize, Serialize};

use crate::network::NeuralNetwork;

/// One member of the population: a brain plus the run-time state the
/// environment accumulates during an episode.
///
/// Run-time state is never inherited. Every generation member starts at
/// fitness zero and alive, whatever its parent scored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub brain: NeuralNetwork,
    /// Non-negative and monotonically non-decreasing during an episode.
    pub fitness: u32,
    pub alive: bool,
}

impl Individual {
    pub fn new(brain: NeuralNetwork) -> Self {
        Self {
            brain,
            fitness: 0,
            alive: true,
        }
    }

    /// Credits `points` to a live individual. Dead individuals score nothing.
    pub fn reward(&mut self, points: u32) {
        if self.alive {
            self.fitness = self.fitness.saturating_add(points);
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }
}

/// The episode driver. An implementation plays one full episode: every
/// individual is ticked until dead, calling `individual.brain.infer` with an
/// input vector built from live game state, and crediting fitness via
/// [`Individual::reward`]. The environment alone decides termination.
pub trait Environment {
    fn run_episode(&mut self, population: &mut [Individual]);
}

/// Highest-fitness brain observed over a whole run, decoupled from any live
/// individual. Owned by the caller and fed once per generation; the brain is
/// deep-copied only on improvement.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Champion {
    brain: Option<NeuralNetwork>,
    fitness: u32,
}

impl Champion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, individual: &Individual) {
        if self.brain.is_none() || individual.fitness > self.fitness {
            self.brain = Some(individual.brain.clone());
            self.fitness = individual.fitness;
        }
    }

    pub fn observe_all(&mut self, population: &[Individual]) {
        for individual in population {
            self.observe(individual);
        }
    }

    pub fn brain(&self) -> Option<&NeuralNetwork> {
        self.brain.as_ref()
    }

    pub fn fitness(&self) -> u32 {
        self.fitness
    }
}

/// Per-generation score summary: the highest score, the mean, and how many
/// individuals scored at or above the mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub highest: u32,
    pub mean: f32,
    pub over_mean: usize,
}

impl GenerationStats {
    pub fn measure(population: &[Individual]) -> Self {
        if population.is_empty() {
            return Self {
                highest: 0,
                mean: 0.0,
                over_mean: 0,
            };
        }
        let highest = population.iter().map(|i| i.fitness).max().unwrap_or(0);
        let total: u64 = population.iter().map(|i| u64::from(i.fitness)).sum();
        let mean = total as f32 / population.len() as f32;
        let over_mean = population
            .iter()
            .filter(|i| i.fitness as f32 >= mean)
            .count();
        Self {
            highest,
            mean,
            over_mean,
        }
    }
}
