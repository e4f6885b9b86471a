//! Neuroevolution core for a Flappy-Bird-style game.
//!
//! A population of small sigmoid feedforward networks is evaluated by an
//! external environment (one episode per generation, scalar fitness per
//! individual) and evolved with fitness-proportionate selection, elitism,
//! per-weight mutation, and layer-level crossover.
//!
//! The crate is deliberately rendering-free: physics, pipes, collisions, and
//! UI live on the other side of the [`Environment`] trait. What lives here is
//! the numeric core ([`Matrix`]), the evolvable brain ([`NeuralNetwork`]),
//! the generational step ([`GeneticAlgorithm`]), and a headless training
//! loop ([`Run`]).
//!
//! Everything randomized draws from a caller-provided [`rand::Rng`] or an
//! engine-owned seeded `Pcg64`, so a fixed seed reproduces a whole run.

pub mod error;
pub mod genetic;
pub mod matrix;
pub mod network;
pub mod population;
pub mod run;

pub use error::{Error, Result};
pub use genetic::{GaConfig, GeneticAlgorithm};
pub use matrix::Matrix;
pub use network::{Action, NeuralNetwork};
pub use population::{Champion, Environment, GenerationStats, Individual};
pub use run::{Report, Run, RunConfig};
