/// Configuration management for the lineage tracker
use crate::render::LayoutKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderSettings,
    pub chart: ChartSettings,
    pub simulation: SimulationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub layout: String,
    pub width: u32,
    pub height: u32,
    pub node_size: f64,
    pub highlight_node_size: f64,
    pub node_separation: f64,
    pub rank_separation: f64,
    pub label_font_size: u32,
    pub seed: u64,
    pub spring_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub population_size: usize,
    pub generations: u64,
    pub genome_length: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Hierarchical.to_string(),
            width: 1600,
            height: 1200,
            node_size: 300.0,
            highlight_node_size: 600.0,
            node_separation: 0.5,
            rank_separation: 1.5,
            label_font_size: 8,
            seed: 42,
            spring_iterations: 50,
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: "Fitness Over Generations".to_string(),
            x_label: "Generation".to_string(),
            y_label: "Average Fitness".to_string(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            population_size: 10,
            generations: 5,
            genome_length: 4,
            mutation_rate: 0.1,
            tournament_size: 3,
            seed: 7,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RenderSettings {
    /// Parsed layout; unsupported names are a configuration error
    pub fn layout_kind(&self) -> Result<LayoutKind, crate::error::LineageError> {
        self.layout.parse()
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(layout) = std::env::var("LINEAGE_TRACKER_LAYOUT") {
            config.render.layout = layout;
        }

        if let Ok(seed) = std::env::var("LINEAGE_TRACKER_RENDER_SEED") {
            config.render.seed = seed.parse()?;
        }

        if let Ok(population) = std::env::var("LINEAGE_TRACKER_POPULATION_SIZE") {
            config.simulation.population_size = population.parse()?;
        }

        if let Ok(generations) = std::env::var("LINEAGE_TRACKER_GENERATIONS") {
            config.simulation.generations = generations.parse()?;
        }

        if let Ok(seed) = std::env::var("LINEAGE_TRACKER_SIMULATION_SEED") {
            config.simulation.seed = seed.parse()?;
        }

        if let Ok(level) = std::env::var("LINEAGE_TRACKER_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Merge with another configuration (other takes precedence where it
    /// differs from the defaults)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        if other.render != defaults.render {
            let render = other.render;
            let base = &defaults.render;
            if render.layout != base.layout {
                self.render.layout = render.layout;
            }
            if render.width != base.width {
                self.render.width = render.width;
            }
            if render.height != base.height {
                self.render.height = render.height;
            }
            if render.node_size != base.node_size {
                self.render.node_size = render.node_size;
            }
            if render.highlight_node_size != base.highlight_node_size {
                self.render.highlight_node_size = render.highlight_node_size;
            }
            if render.node_separation != base.node_separation {
                self.render.node_separation = render.node_separation;
            }
            if render.rank_separation != base.rank_separation {
                self.render.rank_separation = render.rank_separation;
            }
            if render.label_font_size != base.label_font_size {
                self.render.label_font_size = render.label_font_size;
            }
            if render.seed != base.seed {
                self.render.seed = render.seed;
            }
            if render.spring_iterations != base.spring_iterations {
                self.render.spring_iterations = render.spring_iterations;
            }
        }

        if other.chart != defaults.chart {
            self.chart = other.chart;
        }

        let simulation = other.simulation;
        let base = &defaults.simulation;
        if simulation.population_size != base.population_size {
            self.simulation.population_size = simulation.population_size;
        }
        if simulation.generations != base.generations {
            self.simulation.generations = simulation.generations;
        }
        if simulation.genome_length != base.genome_length {
            self.simulation.genome_length = simulation.genome_length;
        }
        if simulation.mutation_rate != base.mutation_rate {
            self.simulation.mutation_rate = simulation.mutation_rate;
        }
        if simulation.tournament_size != base.tournament_size {
            self.simulation.tournament_size = simulation.tournament_size;
        }
        if simulation.seed != base.seed {
            self.simulation.seed = simulation.seed;
        }

        if other.logging != defaults.logging {
            self.logging = other.logging;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.render.layout_kind()?;

        if self.render.width == 0 || self.render.height == 0 {
            return Err(anyhow::anyhow!("Render width and height must be greater than 0"));
        }

        if self.render.node_size <= 0.0 || self.render.highlight_node_size <= 0.0 {
            return Err(anyhow::anyhow!("Node sizes must be positive"));
        }

        if self.render.node_separation <= 0.0 || self.render.rank_separation <= 0.0 {
            return Err(anyhow::anyhow!("Node and rank separation must be positive"));
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(anyhow::anyhow!("Chart width and height must be greater than 0"));
        }

        if self.simulation.population_size == 0 {
            return Err(anyhow::anyhow!("Population size must be greater than 0"));
        }

        if self.simulation.genome_length == 0 {
            return Err(anyhow::anyhow!("Genome length must be greater than 0"));
        }

        if self.simulation.tournament_size == 0 {
            return Err(anyhow::anyhow!("Tournament size must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.simulation.mutation_rate) {
            return Err(anyhow::anyhow!("Mutation rate must be between 0 and 1"));
        }

        Ok(())
    }
}
