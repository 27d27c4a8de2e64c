use crate::error::LineageResult;
use crate::lineage::{GraphStatistics, LineageTracker};
use crate::types::{GenerationFitness, NodeId};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a tracked population: statistics, the best individual with
/// its root path, and the fitness trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub statistics: GraphStatistics,
    pub best: Option<BestIndividual>,
    pub fitness_by_generation: Vec<GenerationFitness>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestIndividual {
    pub node: NodeId,
    pub fitness: f64,
    pub generation: u64,
    pub root_path: Option<Vec<NodeId>>,
}

impl LineageReport {
    pub fn from_tracker(tracker: &LineageTracker) -> LineageResult<Self> {
        let best = match tracker.best_individual() {
            Some(node) => Some(BestIndividual {
                node,
                fitness: tracker.node(node)?.fitness,
                generation: tracker.generation_of(node)?,
                root_path: tracker.path_from_root(node)?,
            }),
            None => None,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            statistics: tracker.statistics(),
            best,
            fitness_by_generation: tracker.fitness_by_generation()?,
        })
    }

    /// Render the report in the specified format
    pub fn generate(&self, format: &str) -> Result<String> {
        match format.to_lowercase().as_str() {
            "json" => Ok(serde_json::to_string_pretty(self)?),
            "text" => Ok(self.to_text()),
            _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
        }
    }

    fn to_text(&self) -> String {
        let best = match &self.best {
            Some(best) => format!(
                "Best Individual: node {} (fitness {:.3}, generation {})\nRoot Path: {}",
                best.node,
                best.fitness,
                best.generation,
                best.root_path
                    .as_ref()
                    .map(|path| {
                        path.iter()
                            .map(|node| node.to_string())
                            .collect::<Vec<_>>()
                            .join(" -> ")
                    })
                    .unwrap_or_else(|| "none".to_string())
            ),
            None => "Best Individual: none".to_string(),
        };

        let trend = self
            .fitness_by_generation
            .iter()
            .map(|point| {
                format!(
                    "  generation {}: {:.3} ({} individuals)",
                    point.generation, point.average_fitness, point.individuals
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Lineage Report
==============

Individuals: {}
Derivations: {}
Roots: {}
Leaves: {}
Average Degree: {:.2}

{}

Average Fitness by Generation:
{}

Generated at: {}
"#,
            self.statistics.total_nodes,
            self.statistics.total_edges,
            self.statistics.root_nodes,
            self.statistics.leaf_nodes,
            self.statistics.average_degree,
            best,
            trend,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineageError;
    use crate::types::Individual;

    fn create_tracker() -> LineageTracker {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(2.0), &[0], None, Some(1)).unwrap();
        tracker.add_individual(Individual::new(3.0), &[1], None, Some(2)).unwrap();
        tracker
    }

    #[test]
    fn test_report_from_tracker() {
        let report = LineageReport::from_tracker(&create_tracker()).unwrap();
        let best = report.best.as_ref().unwrap();

        assert_eq!(best.node, 2);
        assert_eq!(best.generation, 2);
        assert_eq!(best.root_path, Some(vec![0, 1, 2]));
        assert_eq!(report.fitness_by_generation.len(), 3);
        assert_eq!(report.statistics.total_edges, 2);
    }

    #[test]
    fn test_report_formats() {
        let report = LineageReport::from_tracker(&create_tracker()).unwrap();

        let text = report.generate("text").unwrap();
        assert!(text.contains("Root Path: 0 -> 1 -> 2"));
        assert!(text.contains("generation 1: 2.000 (1 individuals)"));

        let json: serde_json::Value = serde_json::from_str(&report.generate("JSON").unwrap()).unwrap();
        assert_eq!(json["best"]["node"], 2);

        assert!(report.generate("xml").is_err());
    }

    #[test]
    fn test_report_requires_individuals() {
        let result = LineageReport::from_tracker(&LineageTracker::new());
        assert!(matches!(result, Err(LineageError::EmptyGraph)));
    }
}
