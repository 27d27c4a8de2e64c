use crate::error::{LineageError, LineageResult};
use crate::lineage::graph::LineageTracker;
use crate::types::GenerationFitness;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

impl LineageTracker {
    /// Average fitness per generation, ascending by generation.
    ///
    /// Nodes are grouped by their recorded `generation`; nodes added without
    /// one count as generation 0. The `details` payload is never consulted.
    pub fn fitness_by_generation(&self) -> LineageResult<Vec<GenerationFitness>> {
        if self.is_empty() {
            return Err(LineageError::EmptyGraph);
        }

        let mut groups: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
        for node in self.nodes() {
            let entry = groups.entry(node.generation.unwrap_or(0)).or_insert((0.0, 0));
            entry.0 += node.fitness;
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(generation, (total, count))| GenerationFitness {
                generation,
                average_fitness: total / count as f64,
                individuals: count,
            })
            .collect())
    }

    /// Get graph statistics
    pub fn statistics(&self) -> GraphStatistics {
        let total_nodes = self.len();
        let total_edges = self.edge_count();

        let average_degree = if total_nodes > 0 {
            // Every edge contributes one in-degree and one out-degree
            (2 * total_edges) as f64 / total_nodes as f64
        } else {
            0.0
        };

        let fitness = self.nodes().map(|node| node.fitness);
        let (min_fitness, max_fitness) = fitness.fold((None::<f64>, None::<f64>), |(min, max), value| {
            (
                Some(min.map_or(value, |m: f64| m.min(value))),
                Some(max.map_or(value, |m: f64| m.max(value))),
            )
        });

        GraphStatistics {
            total_nodes,
            total_edges,
            root_nodes: self.roots().len(),
            leaf_nodes: self.leaves().len(),
            average_degree,
            min_fitness,
            max_fitness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub root_nodes: usize,
    pub leaf_nodes: usize,
    pub average_degree: f64,
    pub min_fitness: Option<f64>,
    pub max_fitness: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Individual;
    use serde_json::json;

    #[test]
    fn test_fitness_by_generation_averages() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(2.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(4.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(9.0), &[0, 1], None, Some(1)).unwrap();

        let series = tracker.fitness_by_generation().unwrap();
        let pairs: Vec<(u64, f64)> = series
            .iter()
            .map(|point| (point.generation, point.average_fitness))
            .collect();

        assert_eq!(pairs, vec![(0, 3.0), (1, 9.0)]);
        assert_eq!(series[0].individuals, 2);
    }

    #[test]
    fn test_fitness_by_generation_sorted_and_defaulted() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, Some(5)).unwrap();
        tracker.add_individual(Individual::new(3.0), &[], None, None).unwrap();
        // Payload generation is opaque and ignored
        tracker
            .add_individual(
                Individual::new(5.0).with_detail("generation", json!(5)),
                &[],
                None,
                None,
            )
            .unwrap();

        let generations: Vec<u64> = tracker
            .fitness_by_generation()
            .unwrap()
            .iter()
            .map(|point| point.generation)
            .collect();
        assert_eq!(generations, vec![0, 5]);
        assert_eq!(tracker.fitness_by_generation().unwrap()[0].average_fitness, 4.0);
    }

    #[test]
    fn test_fitness_by_generation_empty() {
        let tracker = LineageTracker::new();
        assert_eq!(tracker.fitness_by_generation(), Err(LineageError::EmptyGraph));
    }

    #[test]
    fn test_statistics() {
        let mut tracker = LineageTracker::new();
        assert_eq!(tracker.statistics().average_degree, 0.0);

        tracker.add_individual(Individual::new(1.0), &[], None, None).unwrap();
        tracker.add_individual(Individual::new(-2.0), &[0], None, None).unwrap();
        tracker.add_individual(Individual::new(6.0), &[0, 1], None, None).unwrap();

        let stats = tracker.statistics();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.root_nodes, 1);
        assert_eq!(stats.leaf_nodes, 1);
        assert_eq!(stats.average_degree, 2.0);
        assert_eq!(stats.min_fitness, Some(-2.0));
        assert_eq!(stats.max_fitness, Some(6.0));
    }
}
