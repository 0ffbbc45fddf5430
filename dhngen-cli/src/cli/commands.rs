//! Command definitions and execution for the dhngen CLI.

use std::io::{self, Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dhngen_core::{
    BackfillBoundary, GenerationError, GeneratorParams, GeneratorParamsBuilder, ParamsError,
    PropertyRange, Topology, TopologyAssembler,
};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

fn defaults() -> GeneratorParams {
    GeneratorParams::default()
}

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "dhngen",
    about = "Generate synthetic district heating network topologies."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate one network and print its nodes and pipes.
    Generate(GenerateCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Probability that node 0 is a central producer.
    #[arg(long, default_value_t = defaults().central_producer_probability())]
    pub central_producer_probability: f64,

    /// Probability that a region receives its own producer.
    #[arg(long, default_value_t = defaults().region_producer_probability())]
    pub region_producer_probability: f64,

    /// Probability of an inter-region pipe per region pair and pass.
    #[arg(long, default_value_t = defaults().inter_region_pipe_probability())]
    pub inter_region_pipe_probability: f64,

    /// Nodes generated per region.
    #[arg(long, default_value_t = defaults().nodes_per_region())]
    pub nodes_per_region: usize,

    /// Number of regions.
    #[arg(long, default_value_t = defaults().region_count())]
    pub regions: usize,

    /// Hop diameter above which a warning is logged.
    #[arg(long, default_value_t = defaults().max_diameter())]
    pub max_diameter: usize,

    /// Cycles with at most this many pipes are broken.
    #[arg(long, default_value_t = defaults().min_cycle_length())]
    pub min_cycle_length: usize,

    /// Target pipes / (nodes - 1) per region.
    #[arg(long, default_value_t = defaults().target_ratio())]
    pub target_ratio: f64,

    /// Minimum hop distance between producers.
    #[arg(long, default_value_t = defaults().min_producer_distance())]
    pub min_producer_distance: usize,

    /// Target number of producers.
    #[arg(long, default_value_t = defaults().producer_target())]
    pub producers: usize,

    /// Degree cap used while building regions.
    #[arg(long, default_value_t = defaults().max_degree())]
    pub max_degree: usize,

    /// Cursor step of the region construction walk.
    #[arg(long, default_value_t = defaults().jump_step())]
    pub jump_step: usize,

    /// Mean pipe weight.
    #[arg(long, default_value_t = defaults().edge_weights().mean())]
    pub edge_weight_mean: f64,

    /// Standard deviation of pipe weights.
    #[arg(long, default_value_t = defaults().edge_weights().std())]
    pub edge_weight_std: f64,

    /// Smallest pipe diameter in metres.
    #[arg(long, default_value_t = defaults().pipe_diameter().min())]
    pub min_pipe_diameter: f64,

    /// Largest pipe diameter in metres.
    #[arg(long, default_value_t = defaults().pipe_diameter().max())]
    pub max_pipe_diameter: f64,

    /// Smallest pipe convective coefficient.
    #[arg(long, default_value_t = defaults().convective_coefficient().min())]
    pub min_pipe_h: f64,

    /// Largest pipe convective coefficient.
    #[arg(long, default_value_t = defaults().convective_coefficient().max())]
    pub max_pipe_h: f64,

    /// Seed for the random generator; drawn from entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Assembly attempts before giving up.
    #[arg(long, default_value_t = defaults().retry().assembly_attempts)]
    pub max_attempts: usize,

    /// When producer backfill stops.
    #[arg(long, value_enum, default_value_t = BackfillArg::from(defaults().backfill()))]
    pub backfill: BackfillArg,

    /// Print node ids starting at one instead of zero.
    #[arg(long)]
    pub one_based: bool,
}

/// Command-line spelling of [`BackfillBoundary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackfillArg {
    /// Stop backfilling at the producer target.
    Exclusive,
    /// Add one producer beyond the target.
    Inclusive,
}

impl From<BackfillArg> for BackfillBoundary {
    fn from(value: BackfillArg) -> Self {
        match value {
            BackfillArg::Exclusive => Self::Exclusive,
            BackfillArg::Inclusive => Self::Inclusive,
        }
    }
}

impl From<BackfillBoundary> for BackfillArg {
    fn from(value: BackfillBoundary) -> Self {
        match value {
            BackfillBoundary::Exclusive => Self::Exclusive,
            BackfillBoundary::Inclusive => Self::Inclusive,
        }
    }
}

impl GenerateCommand {
    fn params_builder(&self) -> GeneratorParamsBuilder {
        GeneratorParamsBuilder::new()
            .with_central_producer_probability(self.central_producer_probability)
            .with_region_producer_probability(self.region_producer_probability)
            .with_inter_region_pipe_probability(self.inter_region_pipe_probability)
            .with_nodes_per_region(self.nodes_per_region)
            .with_region_count(self.regions)
            .with_max_diameter(self.max_diameter)
            .with_min_cycle_length(self.min_cycle_length)
            .with_target_ratio(self.target_ratio)
            .with_min_producer_distance(self.min_producer_distance)
            .with_producer_target(self.producers)
            .with_max_degree(self.max_degree)
            .with_jump_step(self.jump_step)
            .with_edge_weight_mean(self.edge_weight_mean)
            .with_edge_weight_std(self.edge_weight_std)
            .with_pipe_diameter(PropertyRange::new(
                self.min_pipe_diameter,
                self.max_pipe_diameter,
            ))
            .with_convective_coefficient(PropertyRange::new(self.min_pipe_h, self.max_pipe_h))
            .with_assembly_attempts(self.max_attempts)
            .with_backfill(self.backfill.into())
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The supplied flags do not form a valid parameter set.
    #[error(transparent)]
    Params(#[from] ParamsError),
    /// Network generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl CliError {
    /// Stable code of the underlying failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Params(err) => err.code().as_str(),
            Self::Generation(err) => err.code().as_str(),
        }
    }
}

/// Outcome of a `generate` run.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Seed the random generator was created from.
    pub seed: u64,
    /// Whether rendered ids start at one.
    pub one_based: bool,
    /// Generated network.
    pub topology: Topology,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the parameters are invalid or generation fails.
///
/// # Examples
/// ```
/// use clap::Parser;
/// use dhngen_cli::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from([
///     "dhngen", "generate", "--regions", "2", "--nodes-per-region", "12", "--seed", "3",
/// ]);
/// let summary = run_cli(cli).expect("generation succeeds");
/// assert_eq!(summary.seed, 3);
/// assert_eq!(summary.topology.stats().components, 1);
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Generate(generate) => {
            Span::current().record("command", field::display("generate"));
            run_command(&generate)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        seed = field::Empty,
        regions = command.regions,
        nodes_per_region = command.nodes_per_region,
    ),
)]
pub(super) fn run_command(command: &GenerateCommand) -> Result<ExecutionSummary, CliError> {
    let params = command.params_builder().build()?;
    let seed = command.seed.unwrap_or_else(rand::random);
    Span::current().record("seed", seed);

    let mut rng = SmallRng::seed_from_u64(seed);
    let topology = TopologyAssembler::new(params).generate(&mut rng)?;
    let stats = topology.stats();
    info!(
        seed,
        nodes = stats.nodes,
        pipes = stats.pipes,
        producers = stats.producers,
        "command completed"
    );
    Ok(ExecutionSummary {
        seed,
        one_based: command.one_based,
        topology,
    })
}

/// Renders `summary` as tab-separated text: statistics, then a node table
/// and a pipe table.
///
/// # Errors
/// Returns [`io::Error`] if writing to `writer` fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let topology = &summary.topology;
    let base = usize::from(summary.one_based);
    let stats = topology.stats();
    let producers: Vec<String> = topology
        .producers()
        .iter()
        .map(|id| (id + base).to_string())
        .collect();

    writeln!(writer, "seed: {}", summary.seed)?;
    writeln!(writer, "nodes: {}", stats.nodes)?;
    writeln!(writer, "pipes: {}", stats.pipes)?;
    writeln!(writer, "ratio: {:.4}", stats.ratio)?;
    writeln!(writer, "hop diameter: {}", stats.hop_diameter)?;
    writeln!(writer, "regions: {}", topology.regions().len())?;
    writeln!(writer, "producers: {}", producers.join(" "))?;

    writeln!(writer)?;
    writeln!(writer, "id\tx\ty\tproducer\tregion")?;
    for node in topology.nodes() {
        let region = node
            .region
            .map_or_else(|| "-".to_owned(), |region| (region + base).to_string());
        writeln!(
            writer,
            "{}\t{:.4}\t{:.4}\t{}\t{region}",
            node.id + base,
            node.position.x,
            node.position.y,
            u8::from(node.is_producer),
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "source\ttarget\tweight\tlength\tdiameter\th")?;
    for pipe in topology.pipes() {
        writeln!(
            writer,
            "{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}",
            pipe.source + base,
            pipe.target + base,
            pipe.weight,
            pipe.length,
            pipe.diameter,
            pipe.convective_coefficient,
        )?;
    }
    Ok(())
}
