//! Command-line parsing for the regional indices analyses.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! statistics and projection code. `app` turns these structs into plain
//! configuration values.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{DEFAULT_REGION_COLUMN, Delimiter, IDHM_INDICATORS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ri",
    version,
    about = "IDEB x IDHM regional analysis: statistics, correlations and projections"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Project IDHM indicators to a target year (linear and exponential models).
    Project(ProjectArgs),
    /// Print shape, column kinds, missing cells and duplicates of the input files.
    Inspect(InspectArgs),
    /// Position and dispersion statistics of IDEB per region, plus evolution charts.
    Stats(StatsArgs),
    /// Correlate regional IDEB means with IDHM, period by period.
    Correlate(CorrelateArgs),
    /// Write synthetic IDHM / IDEB input files.
    Sample(SampleArgs),
    /// Run inspect, project, stats and correlate on the conventional file names.
    All(AllArgs),
}

/// Options shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory holding the input files (CSV, or `.xlsx` with the same stem).
    #[arg(long, env = "RI_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory receiving CSV exports, charts and the run manifest.
    #[arg(long, env = "RI_OUTPUT_DIR", default_value = "results")]
    pub out_dir: PathBuf,

    /// Column identifying the region of each row.
    #[arg(long, env = "RI_REGION_COLUMN", default_value = DEFAULT_REGION_COLUMN)]
    pub region_column: String,

    /// Field delimiter of the input files.
    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    pub delimiter: Delimiter,

    /// Worksheet to read from `.xlsx` inputs (defaults to the first sheet).
    #[arg(long)]
    pub sheet: Option<String>,

    /// Numbers in the inputs use a decimal comma (`0,700`).
    #[arg(long)]
    pub decimal_comma: bool,

    /// Skip SVG chart rendering.
    #[arg(long)]
    pub no_charts: bool,

    /// Print ASCII scatter plots to the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Years and indicators of a projection run.
#[derive(Debug, Args, Clone)]
pub struct ProjectionArgs {
    /// Indicators to project (comma-separated).
    #[arg(long, value_delimiter = ',', default_values = IDHM_INDICATORS)]
    pub indicators: Vec<String>,

    /// First observed year (t0).
    #[arg(long, default_value_t = 2000)]
    pub base_year: i32,

    /// Last observed year (t1).
    #[arg(long, default_value_t = 2010)]
    pub last_year: i32,

    /// Year to project to (t2).
    #[arg(long, default_value_t = 2020)]
    pub target_year: i32,
}

#[derive(Debug, Args, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub projection: ProjectionArgs,

    /// IDHM input file, CSV or `.xlsx` (defaults to `idhm_subpref_anos.csv` inside --data-dir).
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file, written as a workbook when it ends in `.xlsx`
    /// (defaults to `idhm_projecao_{target}.csv` inside --out-dir).
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rows to print from the projected table.
    #[arg(long, default_value_t = 10)]
    pub preview: usize,
}

#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Files to inspect (defaults to the three conventional inputs inside --data-dir).
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// IDEB file (defaults to both stage files inside --data-dir).
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Title used in charts and to name the exports.
    #[arg(long)]
    pub title: Option<String>,

    /// Prefix of the yearly IDEB columns.
    #[arg(long, default_value = "IDEB_")]
    pub prefix: String,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// IDHM periods to correlate against (comma-separated).
    #[arg(long, value_delimiter = ',', default_values_t = [2000, 2010, 2020])]
    pub periods: Vec<i32>,

    /// Histogram bins per column.
    #[arg(long, default_value_t = 10)]
    pub bins: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Directory to write the synthetic files into.
    #[arg(long, env = "RI_DATA_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// Number of regions (at most 32).
    #[arg(long, default_value_t = 32)]
    pub regions: usize,

    /// Schools per region in each IDEB file.
    #[arg(long, default_value_t = 12)]
    pub schools: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability of writing an IDEB cell as `ND`.
    #[arg(long, default_value_t = 0.08)]
    pub missing_prob: f64,
}

#[derive(Debug, Args, Clone)]
pub struct AllArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub projection: ProjectionArgs,

    /// IDHM periods to correlate against (comma-separated).
    #[arg(long, value_delimiter = ',', default_values_t = [2000, 2010, 2020])]
    pub periods: Vec<i32>,
}
