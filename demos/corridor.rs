//! Headless stand-in for the game: birds fly down a meandering corridor and
//! die on contact with its walls. Demonstrates the full training loop and
//! exports the best brain found, like the in-game simulation does.

use flappy_evolution::{Environment, GaConfig, Individual, Matrix, Run, RunConfig};

const GRAVITY: f32 = -0.012;
const FLAP_IMPULSE: f32 = 0.09;
const HALF_WIDTH: f32 = 0.35;
const MAX_TICKS: u32 = 1_000;

struct Corridor;

impl Environment for Corridor {
    fn run_episode(&mut self, population: &mut [Individual]) {
        let mut altitudes = vec![0.0f32; population.len()];
        let mut velocities = vec![0.0f32; population.len()];

        for tick in 0..MAX_TICKS {
            let center = (tick as f32 * 0.02).sin() * 0.5;

            for (i, bird) in population.iter_mut().enumerate() {
                if !bird.alive {
                    continue;
                }

                let offset = altitudes[i] - center;
                let input = Matrix::from_vec(2, 1, vec![offset, velocities[i]])
                    .expect("2x1 input");
                let action = bird.brain.infer(&input).expect("brain matches input width");

                if action.is_flap() {
                    velocities[i] = FLAP_IMPULSE;
                }
                velocities[i] += GRAVITY;
                altitudes[i] += velocities[i];

                if (altitudes[i] - center).abs() > HALF_WIDTH {
                    bird.kill();
                } else {
                    bird.reward(1);
                }
            }

            if population.iter().all(|bird| !bird.alive) {
                break;
            }
        }
        for bird in population.iter_mut() {
            bird.kill();
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = RunConfig {
        population_size: 100,
        max_generations: 60,
        target_fitness: Some(MAX_TICKS),
        layers: vec![2, 3, 1],
        resume_from: None,
    };
    let ga_config = GaConfig {
        elite_count: 10,
        mutation_chance: 0.1,
        crossover_chance: 0.3,
    };

    let mut run = Run::new(config, ga_config, 42).expect("run setup");
    let report = run.evolve(&mut Corridor).expect("evolution step");

    println!(
        "Finished after {} generation(s); best bird survived {} tick(s)",
        report.generations,
        report.champion.fitness()
    );
    if let Some(brain) = report.champion.brain() {
        brain.export("bestBird.txt").expect("export best brain");
        println!("Best brain written to bestBird.txt");
    }
}
