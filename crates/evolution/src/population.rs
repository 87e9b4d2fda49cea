//! Population operators: selection, crossover, mutation and the scores
//! that drive them.

use adaptix_core::{ModelEvolution, ModelId};
use rand::Rng;

/// Fixed catalog of architecture tweaks mutation draws from.
pub const MUTATION_CATALOG: [&str; 6] = [
    "widen_hidden_layer",
    "increase_depth",
    "prune_connections",
    "add_dropout",
    "swap_activation",
    "tune_learning_rate",
];

/// Jitter applied to child metrics during crossover.
const CROSSOVER_JITTER: f64 = 0.05;

/// Weight of the diversity bonus in the fitness score.
const DIVERSITY_BONUS_WEIGHT: f64 = 0.1;

/// Fitness: `0.4*accuracy + 0.3*efficiency - 0.2*complexity` plus a
/// bonus for distance from the population centroid.
pub fn evaluate_fitness(population: &mut [ModelEvolution]) {
    let centroid = centroid(population);
    for member in population.iter_mut() {
        let base = 0.4 * member.accuracy + 0.3 * member.efficiency - 0.2 * member.complexity;
        let bonus = DIVERSITY_BONUS_WEIGHT * distance_to(member, centroid).min(1.0);
        member.fitness = base + bonus;
    }
}

/// Mark the top `fraction` of the population (by fitness) as elites and
/// return them.
pub fn select_elites(population: &mut [ModelEvolution], fraction: f64) -> Vec<ModelEvolution> {
    for member in population.iter_mut() {
        member.is_elite = false;
    }
    let mut ranked: Vec<usize> = (0..population.len()).collect();
    ranked.sort_by(|&a, &b| population[b].fitness.total_cmp(&population[a].fitness));

    let count = ((population.len() as f64 * fraction).ceil() as usize).max(1);
    let mut elites = Vec::with_capacity(count);
    for &idx in ranked.iter().take(count) {
        population[idx].is_elite = true;
        elites.push(population[idx].clone());
    }
    elites
}

/// Breed `count` children from uniformly random parent pairs. Child
/// metrics are the parent average plus a small jitter.
pub fn crossover<R: Rng>(
    population: &[ModelEvolution],
    count: usize,
    generation: u64,
    rng: &mut R,
) -> Vec<ModelEvolution> {
    if population.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            let a = &population[rng.gen_range(0..population.len())];
            let b = &population[rng.gen_range(0..population.len())];
            let jitter = |rng: &mut R| rng.gen_range(-CROSSOVER_JITTER..CROSSOVER_JITTER);
            ModelEvolution {
                id: ModelId::new(),
                generation,
                parent_models: vec![a.id, b.id],
                mutations: Vec::new(),
                fitness: 0.0,
                accuracy: ((a.accuracy + b.accuracy) / 2.0 + jitter(rng)).clamp(0.0, 1.0),
                complexity: ((a.complexity + b.complexity) / 2.0 + jitter(rng)).clamp(0.0, 1.0),
                efficiency: ((a.efficiency + b.efficiency) / 2.0 + jitter(rng)).clamp(0.0, 1.0),
                is_elite: false,
            }
        })
        .collect()
}

/// Mutate each member with probability `rate`, drawing one tweak from
/// the catalog and perturbing the affected metrics.
pub fn mutate<R: Rng>(population: &mut [ModelEvolution], rate: f64, rng: &mut R) {
    for member in population.iter_mut() {
        if rng.gen::<f64>() >= rate {
            continue;
        }
        let tweak = MUTATION_CATALOG[rng.gen_range(0..MUTATION_CATALOG.len())];
        member.mutations.push(tweak.to_string());
        match tweak {
            "widen_hidden_layer" | "increase_depth" => {
                member.accuracy = (member.accuracy + rng.gen_range(0.0..0.05)).clamp(0.0, 1.0);
                member.complexity = (member.complexity + rng.gen_range(0.0..0.1)).clamp(0.0, 1.0);
            }
            "prune_connections" | "add_dropout" => {
                member.complexity = (member.complexity - rng.gen_range(0.0..0.1)).clamp(0.0, 1.0);
                member.efficiency = (member.efficiency + rng.gen_range(0.0..0.05)).clamp(0.0, 1.0);
            }
            _ => {
                member.accuracy =
                    (member.accuracy + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
            }
        }
    }
}

/// Keep the top `pool_size` members by the multi-objective score
/// `0.5*fitness + 0.3*accuracy + 0.2*efficiency`.
pub fn environmental_selection(population: &mut Vec<ModelEvolution>, pool_size: usize) {
    population.sort_by(|a, b| selection_score(b).total_cmp(&selection_score(a)));
    population.truncate(pool_size);
}

fn selection_score(member: &ModelEvolution) -> f64 {
    0.5 * member.fitness + 0.3 * member.accuracy + 0.2 * member.efficiency
}

/// Mean pairwise Euclidean distance over (fitness, accuracy,
/// complexity). Zero for populations of size one or less.
pub fn diversity_index(population: &[ModelEvolution]) -> f64 {
    if population.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..population.len() {
        for j in (i + 1)..population.len() {
            let a = &population[i];
            let b = &population[j];
            total += ((a.fitness - b.fitness).powi(2)
                + (a.accuracy - b.accuracy).powi(2)
                + (a.complexity - b.complexity).powi(2))
            .sqrt();
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// Relative change between the first and second half of the last ten
/// generations' mean fitness. Zero until enough generations exist.
pub fn convergence_rate(mean_fitness_history: &[f64]) -> f64 {
    let window: Vec<f64> = mean_fitness_history
        .iter()
        .rev()
        .take(10)
        .rev()
        .copied()
        .collect();
    if window.len() < 2 {
        return 0.0;
    }
    let mid = window.len() / 2;
    let first = window[..mid].iter().sum::<f64>() / mid as f64;
    let second = window[mid..].iter().sum::<f64>() / (window.len() - mid) as f64;
    if first.abs() < 1e-9 {
        return 0.0;
    }
    (second - first) / first.abs()
}

fn centroid(population: &[ModelEvolution]) -> (f64, f64, f64) {
    if population.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = population.len() as f64;
    (
        population.iter().map(|m| m.accuracy).sum::<f64>() / n,
        population.iter().map(|m| m.complexity).sum::<f64>() / n,
        population.iter().map(|m| m.efficiency).sum::<f64>() / n,
    )
}

fn distance_to(member: &ModelEvolution, centroid: (f64, f64, f64)) -> f64 {
    ((member.accuracy - centroid.0).powi(2)
        + (member.complexity - centroid.1).powi(2)
        + (member.efficiency - centroid.2).powi(2))
    .sqrt()
}
