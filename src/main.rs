use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lineage_tracker::{
    config::Config,
    render::{DotRenderer, FitnessChart, JsonRenderer, LayoutKind, Renderer, SvgRenderer},
    report::LineageReport,
    simulation::{EvolutionSimulation, SimulationOutcome},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lineage-tracker")]
#[command(about = "Record and draw the family tree of an evolutionary run")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and print a lineage report
    Simulate {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Run the simulation and draw its family tree
    RenderTree {
        /// Output format (svg, dot, json)
        #[arg(short, long, default_value = "svg")]
        format: String,

        /// Layout (hierarchical, force-directed, circular, random)
        #[arg(short = 'L', long)]
        layout: Option<String>,

        /// Do not highlight the best individual
        #[arg(long)]
        no_highlight: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the simulation and plot average fitness per generation
    RenderChart {
        /// Output format (svg, csv)
        #[arg(short, long, default_value = "svg")]
        format: String,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "lineage-tracker.yml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    let config = load_config(cli.config.as_ref()).await?;

    let log_level = cli.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    init_tracing(log_level)?;

    if let Some(path) = cli.config.as_ref().filter(|path| !path.exists()) {
        warn!("Configuration file not found: {:?}. Using defaults.", path);
    }

    config.validate().context("Invalid configuration")?;
    info!("Starting lineage tracker");

    match cli.command {
        Commands::Simulate { output } => {
            simulate(&config, &output).await?;
        }

        Commands::RenderTree {
            format,
            layout,
            no_highlight,
            output,
        } => {
            render_tree(&config, &format, layout.as_deref(), !no_highlight, output.as_ref()).await?;
        }

        Commands::RenderChart { format, output } => {
            render_chart(&config, &format, output.as_ref()).await?;
        }

        Commands::Init { config_file } => {
            init_config(config_file).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Load configuration from file (when present), then apply environment overrides.
/// Runs before tracing is initialised.
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = config_path.filter(|path| path.exists()) {
        config = Config::load_from_file(path)
            .await
            .with_context(|| format!("Failed to load configuration file: {:?}", path))?;
    }

    let env_config = Config::load_from_env().context("Invalid environment configuration")?;
    config.merge_with(env_config);

    Ok(config)
}

fn run_simulation(config: &Config) -> Result<SimulationOutcome> {
    let simulation = EvolutionSimulation::new(config.simulation.clone())
        .context("Failed to set up simulation")?;
    Ok(simulation.run().context("Simulation failed")?)
}

/// Run the simulation and print the lineage report
async fn simulate(config: &Config, output_format: &str) -> Result<()> {
    let outcome = run_simulation(config)?;
    let report = LineageReport::from_tracker(&outcome.tracker)?;

    println!("{}", report.generate(output_format)?);
    Ok(())
}

/// Run the simulation and render the family tree
async fn render_tree(
    config: &Config,
    format: &str,
    layout: Option<&str>,
    highlight_best: bool,
    output_file: Option<&PathBuf>,
) -> Result<()> {
    let layout: LayoutKind = match layout {
        Some(layout) => layout.parse()?,
        None => config.render.layout_kind()?,
    };

    let renderer: Box<dyn Renderer> = match format.to_lowercase().as_str() {
        "svg" => Box::new(SvgRenderer::new(config.render.clone())),
        "dot" => Box::new(DotRenderer::new(config.render.clone())),
        "json" => Box::new(JsonRenderer::new(config.render.clone())),
        _ => return Err(anyhow::anyhow!("Unsupported tree format: {}", format)),
    };

    let outcome = run_simulation(config)?;
    let highlight = if highlight_best { outcome.best } else { None };

    let content = outcome
        .tracker
        .render_with(renderer.as_ref(), highlight, layout)
        .context("Failed to render family tree")?;

    write_output(&content, output_file).await
}

/// Run the simulation and render the fitness chart
async fn render_chart(config: &Config, format: &str, output_file: Option<&PathBuf>) -> Result<()> {
    let outcome = run_simulation(config)?;
    let chart = FitnessChart::from_tracker(&outcome.tracker, &config.chart)?;

    let content = match format.to_lowercase().as_str() {
        "svg" => chart.to_svg(&config.chart)?,
        "csv" => chart.to_csv(),
        _ => return Err(anyhow::anyhow!("Unsupported chart format: {}", format)),
    };

    write_output(&content, output_file).await
}

/// Initialize configuration file
async fn init_config(config_file: PathBuf) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() {
        warn!("Configuration file already exists: {:?}. Leaving it untouched.", config_file);
        return Ok(());
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    info!("Configuration file created successfully: {:?}", config_file);
    println!("Configuration file created: {:?}", config_file);
    Ok(())
}

async fn write_output(content: &str, output_file: Option<&PathBuf>) -> Result<()> {
    if let Some(file_path) = output_file {
        tokio::fs::write(file_path, content)
            .await
            .with_context(|| format!("Failed to write output to: {:?}", file_path))?;
        info!("Output written to: {:?}", file_path);
    } else {
        println!("{}", content);
    }

    Ok(())
}
