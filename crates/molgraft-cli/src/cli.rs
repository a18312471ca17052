use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "molgraft developers",
    version,
    about = "molgraft CLI - Explore building-block graphs: ring closures, crossover sites and vertex substitutions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a summary of a graph file.
    Inspect(InspectArgs),
    /// Sample combinations of rings that can be closed on a graph.
    Rings(RingsArgs),
    /// List the crossover sites shared by two graphs.
    Xover(XoverArgs),
    /// Replace a vertex with another building block, or insert one above it.
    Link(LinkArgs),
}

/// Options shared by every command that needs a fragment space.
#[derive(Args, Debug, Clone)]
pub struct SpaceArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Seed for the random generator, overriding the config file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S ring-closure.max-ring-size=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the graph file (TOML).
    #[arg(required = true, value_name = "PATH")]
    pub graph: PathBuf,
}

#[derive(Args, Debug)]
pub struct RingsArgs {
    /// Path to the graph file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub graph: PathBuf,

    #[command(flatten)]
    pub space: SpaceArgs,

    /// Number of independent ring sets to draw.
    #[arg(short = 'n', long, default_value_t = 10, value_name = "INT")]
    pub samples: usize,

    /// Close one sampled ring set and write the resulting graph here.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct XoverArgs {
    /// Path to the first parent graph (TOML).
    #[arg(required = true, value_name = "PATH")]
    pub first: PathBuf,

    /// Path to the second parent graph (TOML).
    #[arg(required = true, value_name = "PATH")]
    pub second: PathBuf,

    #[command(flatten)]
    pub space: SpaceArgs,

    /// Write the sites as CSV to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Path to the graph file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub graph: PathBuf,

    #[command(flatten)]
    pub space: SpaceArgs,

    /// Integer id of the vertex to work on.
    #[arg(long, required = true, value_name = "ID")]
    pub vertex: u32,

    /// Only consider this library entry as the replacement.
    #[arg(short, long, value_name = "INDEX", conflicts_with = "insert_above")]
    pub building_block: Option<usize>,

    /// Insert a new vertex on the edge above the vertex instead of replacing it.
    #[arg(long)]
    pub insert_above: bool,

    /// Path for the edited graph.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}
