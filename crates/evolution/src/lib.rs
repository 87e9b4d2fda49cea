//! Self-learning optimizer: evolutionary model-variant search and
//! multi-strategy hyperparameter tuning.

mod optimizer;
mod population;
mod tuner;

pub use optimizer::{EvolutionEngine, EvolutionError, EvolutionReport};
pub use population::{
    convergence_rate, crossover, diversity_index, environmental_selection, evaluate_fitness,
    mutate, select_elites, MUTATION_CATALOG,
};
pub use tuner::{
    HyperparameterTuner, ParameterSpec, SearchSpace, TuningError, TuningReport, TuningSample,
    TuningStrategy,
};
