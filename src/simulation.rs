//! Small generational GA that records its own genealogy.
//!
//! Genomes are real vectors scored with the negated sphere function, so
//! fitness is at most 0 and higher is better. Each child comes from two
//! tournament-selected parents via uniform crossover followed by per-gene
//! mutation. When both tournaments pick the same parent the child is a
//! mutated clone and is linked with a single mutation edge instead.

use crate::config::SimulationSettings;
use crate::error::{LineageError, LineageResult};
use crate::lineage::LineageTracker;
use crate::types::{EdgeKind, Individual, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{debug, info};

const GENE_RANGE: f64 = 5.12;
const MUTATION_STEP: f64 = 0.5;

#[derive(Debug, Clone)]
struct Member {
    node: NodeId,
    genome: Vec<f64>,
    fitness: f64,
}

/// Result of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub tracker: LineageTracker,
    pub best: Option<NodeId>,
    pub generations: u64,
}

pub struct EvolutionSimulation {
    settings: SimulationSettings,
}

impl EvolutionSimulation {
    pub fn new(settings: SimulationSettings) -> LineageResult<Self> {
        if settings.population_size == 0 || settings.genome_length == 0 {
            return Err(LineageError::ConfigurationError {
                reason: "population size and genome length must be greater than 0".to_string(),
            });
        }
        if settings.tournament_size == 0 {
            return Err(LineageError::ConfigurationError {
                reason: "tournament size must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&settings.mutation_rate) {
            return Err(LineageError::ConfigurationError {
                reason: format!("mutation rate {} is outside [0, 1]", settings.mutation_rate),
            });
        }

        Ok(Self { settings })
    }

    pub fn run(&self) -> LineageResult<SimulationOutcome> {
        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let mut tracker = LineageTracker::new();

        let mut population = Vec::with_capacity(self.settings.population_size);
        for _ in 0..self.settings.population_size {
            let genome: Vec<f64> = (0..self.settings.genome_length)
                .map(|_| rng.random_range(-GENE_RANGE..=GENE_RANGE))
                .collect();
            population.push(self.record(&mut tracker, genome, &[], None, 0)?);
        }
        self.log_generation(0, &population);

        for generation in 1..=self.settings.generations {
            let mut offspring = Vec::with_capacity(population.len());

            for _ in 0..self.settings.population_size {
                let first = self.tournament(&population, &mut rng);
                let second = self.tournament(&population, &mut rng);

                let mut genome: Vec<f64> = first
                    .genome
                    .iter()
                    .zip(&second.genome)
                    .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
                    .collect();

                let mut mutated_genes = Vec::new();
                for (index, gene) in genome.iter_mut().enumerate() {
                    if rng.random_bool(self.settings.mutation_rate) {
                        let step = rng.random_range(-MUTATION_STEP..=MUTATION_STEP);
                        *gene = (*gene + step).clamp(-GENE_RANGE, GENE_RANGE);
                        mutated_genes.push(index);
                    }
                }
                let mutation_info = if mutated_genes.is_empty() {
                    None
                } else {
                    Some(json!({ "genes": mutated_genes, "step": MUTATION_STEP }))
                };

                let child = if first.node == second.node {
                    let child = self.record(&mut tracker, genome, &[], mutation_info, generation)?;
                    tracker.record_derivation(first.node, child.node, EdgeKind::Mutation)?;
                    child
                } else {
                    self.record(
                        &mut tracker,
                        genome,
                        &[first.node, second.node],
                        mutation_info,
                        generation,
                    )?
                };
                offspring.push(child);
            }

            population = offspring;
            self.log_generation(generation, &population);
        }

        let best = tracker.best_individual();
        info!(
            "Simulation finished: {} individuals over {} generations, best node {:?}",
            tracker.len(),
            self.settings.generations + 1,
            best
        );

        Ok(SimulationOutcome {
            tracker,
            best,
            generations: self.settings.generations + 1,
        })
    }

    fn record(
        &self,
        tracker: &mut LineageTracker,
        genome: Vec<f64>,
        parents: &[NodeId],
        mutation_info: Option<serde_json::Value>,
        generation: u64,
    ) -> LineageResult<Member> {
        let fitness = -genome.iter().map(|gene| gene * gene).sum::<f64>();
        let individual = Individual::new(fitness)
            .with_detail("genome", json!(genome))
            .with_detail("generation", json!(generation));
        let node = tracker.add_individual(individual, parents, mutation_info, Some(generation))?;

        Ok(Member {
            node,
            genome,
            fitness,
        })
    }

    fn tournament<'a>(&self, population: &'a [Member], rng: &mut StdRng) -> &'a Member {
        let mut best = &population[rng.random_range(0..population.len())];
        for _ in 1..self.settings.tournament_size {
            let candidate = &population[rng.random_range(0..population.len())];
            if candidate.fitness > best.fitness {
                best = candidate;
            }
        }
        best
    }

    fn log_generation(&self, generation: u64, population: &[Member]) {
        let best = population
            .iter()
            .map(|member| member.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let average =
            population.iter().map(|member| member.fitness).sum::<f64>() / population.len() as f64;
        debug!(
            "Generation {} complete: best {:.3}, average {:.3}",
            generation, best, average
        );
    }
}
