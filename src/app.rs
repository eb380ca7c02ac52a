//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - converts arguments into plain configuration
//! - runs the pipelines and prints their reports
//! - writes the run manifest

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{
    AllArgs, Cli, Command, CommonArgs, CorrelateArgs, InspectArgs, ProjectArgs, ProjectionArgs, SampleArgs, StatsArgs,
};
use crate::data::SampleConfig;
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::io::{RunManifest, ensure_dir, write_manifest};
use crate::projection::ProjectionPlan;

pub mod pipeline;

use pipeline::{CorrelateOptions, CorrelateRun, InspectRun, ProjectRun, StatsJob, StatsRun};

/// Rows of the projected table printed by `ri all`.
const ALL_PREVIEW_ROWS: usize = 10;

/// Entry point for the `ri` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Project(args) => handle_project(args),
        Command::Inspect(args) => handle_inspect(args),
        Command::Stats(args) => handle_stats(args),
        Command::Correlate(args) => handle_correlate(args),
        Command::Sample(args) => handle_sample(args),
        Command::All(args) => handle_all(args),
    }
}

/// Logs go to stderr; stdout is reserved for reports.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // An already-installed subscriber stays in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_project(args: ProjectArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.common);
    let plan = plan_from_args(&args.projection);
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.data_file(crate::domain::IDHM_FILE));
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| pipeline::default_projection_path(&config, &plan));

    let run = pipeline::run_project(&config, &plan, &input, &output)?;
    print_project(&run, &plan, args.preview);

    finish(&config, run.manifest)
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.common);
    let files = if args.files.is_empty() {
        pipeline::default_inputs(&config)
    } else {
        args.files.clone()
    };

    let run = pipeline::run_inspect(&config, &files)?;
    print_inspect(&run);

    finish(&config, run.manifest)
}

fn handle_stats(args: StatsArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.common);

    let jobs = match &args.input {
        Some(path) => {
            let title = args.title.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "IDEB".to_string())
            });
            vec![StatsJob {
                input: path.clone(),
                title,
            }]
        }
        None => pipeline::stage_jobs(&config),
    };

    let mut manifest = RunManifest::new("stats");
    for run in pipeline::run_stats(&config, &jobs, &args.prefix)? {
        print_stats(&run);
        manifest.absorb(run.manifest);
    }

    finish(&config, manifest)
}

fn handle_correlate(args: CorrelateArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.common);
    let run = pipeline::run_correlate(
        &config,
        CorrelateOptions {
            periods: &args.periods,
            bins: args.bins,
        },
    )?;
    print_correlate(&run, &config);

    finish(&config, run.manifest)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        out_dir: args.out_dir,
        regions: args.regions,
        schools_per_region: args.schools,
        seed: args.seed,
        missing_prob: args.missing_prob,
    };
    let written = crate::data::write_sample(&config)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_all(args: AllArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.common);
    let plan = plan_from_args(&args.projection);

    let run = pipeline::run_all(&config, &plan, &args.periods)?;
    print_inspect(&run.inspect);
    print_project(&run.project, &plan, ALL_PREVIEW_ROWS);
    for stats in &run.stats {
        print_stats(stats);
    }
    print_correlate(&run.correlate, &config);

    finish(&config, run.manifest)
}

/// Write the manifest as the last file of the run.
fn finish(config: &AnalysisConfig, mut manifest: RunManifest) -> Result<(), AppError> {
    manifest.read = config.read_options();
    ensure_dir(&config.out_dir)?;
    let path = write_manifest(&config.out_dir, &manifest)?;
    info!(
        command = %manifest.command,
        outputs = manifest.outputs.len(),
        manifest = %path.display(),
        "run complete"
    );
    Ok(())
}

fn print_project(run: &ProjectRun, plan: &ProjectionPlan, preview: usize) {
    println!(
        "{}",
        crate::report::format_projection_summary(plan, run.output.table.len(), &run.output.summaries)
    );
    if preview > 0 {
        let mut columns: Vec<String> = run.output.table.columns().first().cloned().into_iter().collect();
        for indicator in &plan.indicators {
            columns.push(plan.linear_column(indicator));
            columns.push(plan.rate_column(indicator));
            columns.push(plan.exp_column(indicator));
        }
        println!("{}", crate::report::format_table_preview(&run.output.table, &columns, preview));
    }
    println!("Written: {}\n", run.written.display());
}

fn print_inspect(run: &InspectRun) {
    for report in &run.reports {
        println!("{}", crate::report::format_structure(report));
    }
}

fn print_stats(run: &StatsRun) {
    println!("=== {} ({} year columns) ===", run.title, run.columns.len());
    let first_year: Vec<String> = run
        .summaries
        .columns()
        .iter()
        .take(1 + crate::stats::GROUP_STATS.len())
        .cloned()
        .collect();
    println!("{}", crate::report::format_table_preview(&run.summaries, &first_year, usize::MAX));
}

fn print_correlate(run: &CorrelateRun, config: &AnalysisConfig) {
    for section in &run.sections {
        println!("=== {} ({} regions) ===", section.title, section.merged.len());
        println!("{}", crate::report::format_describe(&section.summaries));
        println!("{}", crate::report::format_correlation(&section.matrix));
        for scatter in &section.scatters {
            if let Some(fit) = &scatter.fit {
                print!("{}", crate::report::format_line_fit(&scatter.x_column, &scatter.y_column, fit));
            }
            if config.plot {
                println!(
                    "{}",
                    crate::plot::render_ascii_scatter(
                        &scatter.points,
                        scatter.fit.as_ref(),
                        config.plot_width,
                        config.plot_height,
                    )
                );
            }
        }
        println!();
    }
}

pub fn config_from_args(args: &CommonArgs) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: args.data_dir.clone(),
        out_dir: args.out_dir.clone(),
        region_column: args.region_column.clone(),
        delimiter: args.delimiter,
        sheet: args.sheet.clone(),
        decimal_comma: args.decimal_comma,
        charts: !args.no_charts,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
    }
}

pub fn plan_from_args(args: &ProjectionArgs) -> ProjectionPlan {
    ProjectionPlan {
        indicators: args
            .indicators
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        base_year: args.base_year,
        last_year: args.last_year,
        target_year: args.target_year,
    }
}
