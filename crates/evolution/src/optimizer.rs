//! Evolution engine - runs the generation lifecycle over a model-variant
//! population.

use crate::population::{
    convergence_rate, crossover, diversity_index, environmental_selection, evaluate_fitness,
    mutate, select_elites,
};
use adaptix_core::{
    Direction, EngineConfig, EngineEvent, EventSink, ModelEvolution, OptimizationObjective,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Error type for evolution cycles.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// The population was never seeded
    #[error("population is empty, seed it before evolving")]
    EmptyPopulation,
}

/// Report produced by one completed cycle.
#[derive(Debug, Clone)]
pub struct EvolutionReport {
    /// Generation number reached
    pub generation: u64,

    /// Best member of the surviving population
    pub best: ModelEvolution,

    /// Mean pairwise diversity of the survivors
    pub diversity_index: f64,

    /// Relative fitness change across recent generations
    pub convergence_rate: f64,

    /// Survivors after environmental selection
    pub population_size: usize,
}

/// State guarded by a single lock: population, capped history and the
/// per-generation mean fitness trail.
struct EvolutionState {
    population: Vec<ModelEvolution>,
    history: Vec<ModelEvolution>,
    mean_fitness: Vec<f64>,
    objectives: Vec<OptimizationObjective>,
    generation: u64,
}

/// The standing objectives the cycle optimizes for. Current values are
/// refreshed from the best survivor after every generation.
fn default_objectives() -> Vec<OptimizationObjective> {
    vec![
        OptimizationObjective {
            name: "accuracy".to_string(),
            weight: 0.4,
            target: Direction::Maximize,
            current_value: 0.0,
            target_value: 0.95,
            importance: 1.0,
        },
        OptimizationObjective {
            name: "efficiency".to_string(),
            weight: 0.3,
            target: Direction::Maximize,
            current_value: 0.0,
            target_value: 0.9,
            importance: 0.8,
        },
        OptimizationObjective {
            name: "complexity".to_string(),
            weight: 0.2,
            target: Direction::Minimize,
            current_value: 0.0,
            target_value: 0.3,
            importance: 0.6,
        },
    ]
}

/// Maintains the variant population across generations.
pub struct EvolutionEngine {
    state: Mutex<EvolutionState>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl EvolutionEngine {
    /// Create an engine with an empty population.
    pub fn new(sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        Self {
            state: Mutex::new(EvolutionState {
                population: Vec::new(),
                history: Vec::new(),
                mean_fitness: Vec::new(),
                objectives: default_objectives(),
                generation: 0,
            }),
            sink,
            config,
        }
    }

    /// Seed the population with `count` random variants.
    pub async fn seed_population(&self, count: usize) {
        let mut rng = StdRng::from_entropy();
        let mut state = self.state.lock().await;
        state.population = (0..count)
            .map(|_| {
                ModelEvolution::seed(
                    rng.gen_range(0.5..0.9),
                    rng.gen_range(0.2..0.8),
                    rng.gen_range(0.4..0.9),
                )
            })
            .collect();
        info!(count, "evolution population seeded");
    }

    /// Replace the population (tests and restarts).
    pub async fn set_population(&self, population: Vec<ModelEvolution>) {
        self.state.lock().await.population = population;
    }

    /// Current population size.
    pub async fn population_size(&self) -> usize {
        self.state.lock().await.population.len()
    }

    /// Number of retained history entries.
    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    /// The standing objectives with their latest observed values.
    pub async fn objectives(&self) -> Vec<OptimizationObjective> {
        self.state.lock().await.objectives.clone()
    }

    /// Run one full generation cycle.
    ///
    /// Evaluate, select elites, breed, mutate, select survivors,
    /// re-evaluate, record history, report.
    pub async fn run_cycle(&self) -> Result<EvolutionReport, EvolutionError> {
        let mut rng = StdRng::from_entropy();
        let mut state = self.state.lock().await;
        if state.population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        state.generation += 1;
        let generation = state.generation;

        evaluate_fitness(&mut state.population);
        let elites = select_elites(&mut state.population, self.config.elite_fraction);

        let mut children = crossover(
            &state.population,
            self.config.pool_size,
            generation,
            &mut rng,
        );
        mutate(&mut children, self.config.mutation_rate, &mut rng);

        state.population.extend(children);
        evaluate_fitness(&mut state.population);
        environmental_selection(&mut state.population, self.config.pool_size);
        evaluate_fitness(&mut state.population);

        let mean = state.population.iter().map(|m| m.fitness).sum::<f64>()
            / state.population.len() as f64;
        state.mean_fitness.push(mean);

        let survivors = state.population.clone();
        state.history.extend(survivors);
        if state.history.len() > self.config.evolution_history_cap {
            let keep = self.config.evolution_history_cap / 2;
            let drop = state.history.len() - keep;
            state.history.drain(..drop);
        }

        let best = state
            .population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .cloned()
            .ok_or(EvolutionError::EmptyPopulation)?;
        let diversity = diversity_index(&state.population);
        let convergence = convergence_rate(&state.mean_fitness);

        for objective in &mut state.objectives {
            objective.current_value = match objective.name.as_str() {
                "accuracy" => best.accuracy,
                "efficiency" => best.efficiency,
                "complexity" => best.complexity,
                _ => objective.current_value,
            };
        }

        info!(
            generation,
            elites = elites.len(),
            survivors = state.population.len(),
            best_fitness = best.fitness,
            diversity,
            "evolution cycle complete"
        );
        self.sink.emit(EngineEvent::EvolutionCompleted {
            generation,
            best_fitness: best.fitness,
            diversity_index: diversity,
            convergence_rate: convergence,
            timestamp: chrono::Utc::now(),
        });

        Ok(EvolutionReport {
            generation,
            best,
            diversity_index: diversity,
            convergence_rate: convergence,
            population_size: state.population.len(),
        })
    }
}
