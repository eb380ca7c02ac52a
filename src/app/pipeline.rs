//! Shared analysis pipelines used by every command (and by `ri all`).
//!
//! Each pipeline loads all of its inputs, computes, and only then writes its
//! exports and charts, so a missing or malformed input leaves the output
//! directory untouched. It returns both the computed values (for terminal
//! reports) and a `RunManifest` fragment listing what it read and wrote.
//! Printing and the final `manifest.json` are left to `app`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::{
    AnalysisConfig, IDHM_FILE, IDHM_INDICATORS, Stage, Table, Value, YearColumn, period_of, slugify, year_columns,
};
use crate::error::AppError;
use crate::io::{IngestedTable, RunManifest, ensure_dir, load_table, write_series_csv};
use crate::math::{LineFit, fit_line};
use crate::plot::{EvolutionSeries, render_evolution, render_heatmap, render_histograms, render_scatter};
use crate::projection::{ProjectionOutput, ProjectionPlan, project_table};
use crate::stats::{
    ColumnSummary, CorrelationMatrix, StructureReport, correlation_matrix, describe, dispersion, group_means,
    group_summaries, histogram, inner_join, inspect, value_counts,
};

/// Load a file and record it as an input of the run.
fn load(path: &Path, config: &AnalysisConfig, manifest: &mut RunManifest) -> Result<IngestedTable, AppError> {
    let ingest = load_table(path, &config.read_options())?;
    manifest.record_input(path);
    Ok(ingest)
}

fn write_table(path: PathBuf, table: &Table, manifest: &mut RunManifest) -> Result<(), AppError> {
    crate::io::write_table(&path, table)?;
    manifest.record_output(&path);
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone)]
pub struct ProjectRun {
    pub output: ProjectionOutput,
    pub written: PathBuf,
    pub manifest: RunManifest,
}

/// Default projection output: `idhm_projecao_{target}.csv` in the output directory.
pub fn default_projection_path(config: &AnalysisConfig, plan: &ProjectionPlan) -> PathBuf {
    config.out_file(&format!("idhm_projecao_{}.csv", plan.target_year))
}

/// Load the IDHM table, project every indicator and write the augmented table.
pub fn run_project(
    config: &AnalysisConfig,
    plan: &ProjectionPlan,
    input: &Path,
    output: &Path,
) -> Result<ProjectRun, AppError> {
    plan.validate()?;
    let mut manifest = RunManifest::new("project");

    let ingest = load(input, config, &mut manifest)?;
    if ingest.table.is_empty() {
        return Err(AppError::no_data(format!("No rows to project in '{}'.", input.display())));
    }

    let result = project_table(&ingest.table, plan)?;

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        ensure_dir(dir)?;
    }
    write_table(output.to_path_buf(), &result.table, &mut manifest)?;
    info!(
        path = %output.display(),
        rows = result.table.len(),
        indicators = plan.indicators.len(),
        "projection written"
    );

    Ok(ProjectRun {
        output: result,
        written: output.to_path_buf(),
        manifest,
    })
}

#[derive(Debug, Clone)]
pub struct InspectRun {
    pub reports: Vec<StructureReport>,
    pub manifest: RunManifest,
}

/// The three conventional input files inside the data directory.
pub fn default_inputs(config: &AnalysisConfig) -> Vec<PathBuf> {
    let mut files = vec![config.data_file(IDHM_FILE)];
    files.extend(Stage::ALL.iter().map(|s| config.data_file(s.file_name())));
    files
}

pub fn run_inspect(config: &AnalysisConfig, files: &[PathBuf]) -> Result<InspectRun, AppError> {
    let mut manifest = RunManifest::new("inspect");
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let ingest = load(path, config, &mut manifest)?;
        if !ingest.row_errors.is_empty() {
            warn!(path = %path.display(), errors = ingest.row_errors.len(), "rows skipped while reading");
        }
        reports.push(inspect(&file_stem(path), &ingest.table));
    }
    Ok(InspectRun { reports, manifest })
}

/// One IDEB file to summarize, and the title naming its exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsJob {
    pub input: PathBuf,
    pub title: String,
}

/// Both stage files inside the data directory.
pub fn stage_jobs(config: &AnalysisConfig) -> Vec<StatsJob> {
    Stage::ALL
        .iter()
        .map(|s| StatsJob {
            input: config.data_file(s.file_name()),
            title: format!("IDEB {}", s.label()),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct StatsRun {
    pub title: String,
    pub columns: Vec<YearColumn>,
    /// Per-region `{column}_{stat}` table, as exported.
    pub summaries: Table,
    /// Per-region mean of each year column, as charted.
    pub means: Table,
    pub manifest: RunManifest,
}

/// Position and dispersion statistics of IDEB files, per region.
///
/// Every file is read and summarized before the first export is written.
pub fn run_stats(config: &AnalysisConfig, jobs: &[StatsJob], prefix: &str) -> Result<Vec<StatsRun>, AppError> {
    let loaded = jobs
        .iter()
        .map(|job| -> Result<_, AppError> {
            let mut manifest = RunManifest::new("stats");
            let table = load(&job.input, config, &mut manifest)?.table;
            Ok((job, table, manifest))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut runs = loaded
        .into_iter()
        .map(|(job, table, manifest)| summarize_stats(config, job, table, prefix, manifest))
        .collect::<Result<Vec<_>, AppError>>()?;

    for run in &mut runs {
        write_stats(config, run)?;
    }
    Ok(runs)
}

fn summarize_stats(
    config: &AnalysisConfig,
    job: &StatsJob,
    mut table: Table,
    prefix: &str,
    manifest: RunManifest,
) -> Result<StatsRun, AppError> {
    let columns = year_columns(table.columns(), prefix);
    if columns.is_empty() {
        return Err(AppError::no_data(format!(
            "No `{prefix}<year>` columns in '{}'.",
            job.input.display()
        )));
    }
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    table.coerce_numeric(&names);

    let summaries = group_summaries(&table, &config.region_column, &names)?;
    let means = group_means(&table, &config.region_column, &names)?;
    if summaries.is_empty() {
        return Err(AppError::no_data(format!(
            "No rows with a `{}` value in '{}'.",
            config.region_column,
            job.input.display()
        )));
    }
    debug!(title = %job.title, regions = summaries.len(), columns = names.len(), "grouped statistics");

    Ok(StatsRun {
        title: job.title.clone(),
        columns,
        summaries,
        means,
        manifest,
    })
}

fn write_stats(config: &AnalysisConfig, run: &mut StatsRun) -> Result<(), AppError> {
    let slug = slugify(&run.title);
    ensure_dir(&config.out_dir)?;
    write_table(config.out_file(&format!("stats_{slug}.csv")), &run.summaries, &mut run.manifest)?;

    if config.charts {
        let years: Vec<i32> = run.columns.iter().map(|c| c.year).collect();
        let series: Vec<EvolutionSeries> = run
            .means
            .rows()
            .iter()
            .map(|row| EvolutionSeries {
                label: row[0].to_string(),
                values: row[1..].iter().map(Value::as_f64).collect(),
            })
            .collect();
        let path = config.out_file(&format!("evolution_{slug}.svg"));
        render_evolution(&path, &format!("Evolução do {} por Região", run.title), "IDEB", &years, &series)?;
        run.manifest.record_output(&path);
    }

    info!(title = %run.title, regions = run.summaries.len(), "statistics written");
    Ok(())
}

/// Points and trend of one IDEB column against the period's IDHM.
#[derive(Debug, Clone)]
pub struct ScatterFit {
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<(f64, f64)>,
    pub fit: Option<LineFit>,
}

/// Everything computed for one stage and period.
#[derive(Debug, Clone)]
pub struct CorrelationSection {
    pub stage: Stage,
    pub period: i32,
    pub title: String,
    pub merged: Table,
    pub summaries: Vec<ColumnSummary>,
    pub matrix: CorrelationMatrix,
    pub scatters: Vec<ScatterFit>,
}

#[derive(Debug, Clone)]
pub struct CorrelateRun {
    pub sections: Vec<CorrelationSection>,
    pub manifest: RunManifest,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelateOptions<'a> {
    pub periods: &'a [i32],
    pub bins: usize,
}

/// Correlate regional IDEB means with IDHM for every stage and period.
///
/// The IDHM file and both stage files are read, and every section computed,
/// before the first export is written.
pub fn run_correlate(config: &AnalysisConfig, options: CorrelateOptions<'_>) -> Result<CorrelateRun, AppError> {
    let mut manifest = RunManifest::new("correlate");
    let idhm = load(&config.data_file(IDHM_FILE), config, &mut manifest)?.table;
    let stages = Stage::ALL
        .iter()
        .map(|&stage| -> Result<_, AppError> {
            Ok((stage, load(&config.data_file(stage.file_name()), config, &mut manifest)?.table))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut sections = Vec::new();
    for (stage, mut ideb) in stages {
        let columns = year_columns(ideb.columns(), "IDEB_");
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        ideb.coerce_numeric(&names);

        for &period in options.periods {
            let in_period: Vec<String> = columns
                .iter()
                .filter(|c| period_of(c.year) == period)
                .map(|c| c.name.clone())
                .collect();
            if in_period.is_empty() {
                warn!(stage = stage.label(), period, "no IDEB columns for period, skipping");
                continue;
            }
            if let Some(section) = correlate_period(config, stage, period, &ideb, &idhm, &in_period)? {
                sections.push(section);
            }
        }
    }

    if sections.is_empty() {
        return Err(AppError::no_data("No period had both IDEB and IDHM data to correlate."));
    }

    ensure_dir(&config.out_dir)?;
    for section in &sections {
        write_section(config, options, section, &mut manifest)?;
    }
    Ok(CorrelateRun { sections, manifest })
}

fn correlate_period(
    config: &AnalysisConfig,
    stage: Stage,
    period: i32,
    ideb: &Table,
    idhm: &Table,
    ideb_columns: &[String],
) -> Result<Option<CorrelationSection>, AppError> {
    let region = &config.region_column;
    let idhm_columns: Vec<String> = IDHM_INDICATORS.iter().map(|i| format!("{i}_{period}")).collect();
    if let Some(missing) = idhm_columns.iter().find(|c| !idhm.has_column(c)) {
        warn!(stage = stage.label(), period, column = %missing, "IDHM column missing, skipping period");
        return Ok(None);
    }

    let means = group_means(ideb, region, ideb_columns)?;
    let mut selection = vec![region.clone()];
    selection.extend(idhm_columns.iter().cloned());
    let mut idhm_period = idhm.select(&selection).map_err(AppError::input)?;
    idhm_period.coerce_numeric(&idhm_columns);

    let merged = inner_join(&means, &idhm_period, region)?;
    if merged.is_empty() {
        warn!(stage = stage.label(), period, "no region matched between IDEB and IDHM, skipping");
        return Ok(None);
    }

    let title = format!("IDEB {} x IDHM {period}", stage.label());
    debug!(title = %title, regions = merged.len(), "merged period table");

    let summaries = describe(&merged);
    let matrix = correlation_matrix(&merged);

    let y_column = format!("IDHM_{period}");
    let y = merged.numeric_column(&y_column).unwrap_or_default();
    let scatters: Vec<ScatterFit> = ideb_columns
        .iter()
        .filter_map(|x_column| {
            let x = merged.numeric_column(x_column)?;
            let pairs: Vec<(Option<f64>, Option<f64>)> = x.into_iter().zip(y.iter().copied()).collect();
            Some(ScatterFit {
                x_column: x_column.clone(),
                y_column: y_column.clone(),
                points: pairs.iter().filter_map(|&(a, b)| Some((a?, b?))).collect(),
                fit: fit_line(&pairs),
            })
        })
        .collect();

    Ok(Some(CorrelationSection {
        stage,
        period,
        title,
        merged,
        summaries,
        matrix,
        scatters,
    }))
}

fn write_section(
    config: &AnalysisConfig,
    options: CorrelateOptions<'_>,
    section: &CorrelationSection,
    manifest: &mut RunManifest,
) -> Result<(), AppError> {
    let region = &config.region_column;
    let (title, merged, period) = (&section.title, &section.merged, section.period);
    let slug = slugify(title);

    write_table(config.out_file(&format!("merged_{slug}.csv")), merged, manifest)?;
    write_table(config.out_file(&format!("correlation_{slug}.csv")), &section.matrix.to_table(), manifest)?;

    let spread = dispersion(merged);
    let range: Vec<(String, Option<f64>)> = spread.iter().map(|d| (d.name.clone(), d.range)).collect();
    let range_path = config.out_file(&format!("range_{slug}.csv"));
    write_series_csv(&range_path, ["column", "range"], &range)?;
    manifest.record_output(&range_path);

    let cv: Vec<(String, Option<f64>)> = spread.iter().map(|d| (d.name.clone(), d.cv_percent)).collect();
    let cv_path = config.out_file(&format!("cv_{slug}.csv"));
    write_series_csv(&cv_path, ["column", "cv_percent"], &cv)?;
    manifest.record_output(&cv_path);

    let mut frequency = Table::new(vec![region.clone(), "count".to_string()]);
    for (key, n) in value_counts(merged, region)? {
        frequency.push_row(vec![Value::Text(key), Value::Number(n as f64)]);
    }
    write_table(config.out_file(&format!("frequency_{slug}.csv")), &frequency, manifest)?;

    if config.charts {
        if section.matrix.names.len() >= 2 {
            let path = config.out_file(&format!("heatmap_{slug}.svg"));
            render_heatmap(&path, &format!("Correlação {title}"), &section.matrix)?;
            manifest.record_output(&path);
        }

        for s in section.scatters.iter().filter(|s| !s.points.is_empty()) {
            let path = config.out_file(&format!("scatter_{}_vs_IDHM_{period}.svg", s.x_column));
            let chart_title = format!("{} vs {}", s.x_column, s.y_column);
            render_scatter(&path, &chart_title, &s.x_column, &s.y_column, &s.points, s.fit.as_ref())?;
            manifest.record_output(&path);
        }

        let panels: Vec<(String, crate::stats::Histogram)> = merged
            .numeric_columns()
            .into_iter()
            .filter_map(|name| {
                let values: Vec<f64> = merged.numeric_column(&name)?.into_iter().flatten().collect();
                histogram(&values, options.bins).map(|h| (name, h))
            })
            .collect();
        if !panels.is_empty() {
            let path = config.out_file(&format!("histograms_{slug}.svg"));
            render_histograms(&path, &format!("Histogramas {title}"), &panels)?;
            manifest.record_output(&path);
        }
    }

    info!(title = %title, regions = merged.len(), "correlation written");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AllRun {
    pub inspect: InspectRun,
    pub project: ProjectRun,
    pub stats: Vec<StatsRun>,
    pub correlate: CorrelateRun,
    pub manifest: RunManifest,
}

/// Inspect, project, stats (both stages) and correlate on the conventional inputs.
pub fn run_all(config: &AnalysisConfig, plan: &ProjectionPlan, periods: &[i32]) -> Result<AllRun, AppError> {
    let mut manifest = RunManifest::new("all");

    let inspect = run_inspect(config, &default_inputs(config))?;
    manifest.absorb(inspect.manifest.clone());

    let project = run_project(
        config,
        plan,
        &config.data_file(IDHM_FILE),
        &default_projection_path(config, plan),
    )?;
    manifest.absorb(project.manifest.clone());

    let stats = run_stats(config, &stage_jobs(config), "IDEB_")?;
    for run in &stats {
        manifest.absorb(run.manifest.clone());
    }

    let correlate = run_correlate(config, CorrelateOptions { periods, bins: 10 })?;
    manifest.absorb(correlate.manifest.clone());

    Ok(AllRun {
        inspect,
        project,
        stats,
        correlate,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, write_sample};
    use crate::domain::{DEFAULT_REGION_COLUMN, ReadOptions};

    fn workspace(tag: &str, charts: bool) -> AnalysisConfig {
        let root = std::env::temp_dir().join(format!("ri-pipeline-{tag}-{}", std::process::id()));
        let data_dir = root.join("data");
        write_sample(&SampleConfig {
            out_dir: data_dir.clone(),
            regions: 6,
            schools_per_region: 5,
            seed: 11,
            missing_prob: 0.1,
        })
        .unwrap();
        AnalysisConfig {
            data_dir,
            out_dir: root.join("results"),
            charts,
            ..AnalysisConfig::default()
        }
    }

    fn plan() -> ProjectionPlan {
        ProjectionPlan {
            indicators: IDHM_INDICATORS.iter().map(|s| s.to_string()).collect(),
            base_year: 2000,
            last_year: 2010,
            target_year: 2020,
        }
    }

    #[test]
    fn project_writes_augmented_table() {
        let config = workspace("project", false);
        let plan = plan();
        let out = default_projection_path(&config, &plan);
        let run = run_project(&config, &plan, &config.data_file(IDHM_FILE), &out).unwrap();

        assert!(out.exists());
        assert_eq!(run.output.table.len(), 6);
        assert!(run.output.table.has_column("IDHM_Renda_Linear_2020"));
        assert_eq!(run.manifest.outputs, vec![out.clone()]);

        let reloaded = load_table(&out, &config.read_options()).unwrap();
        let cols = reloaded.table.columns();
        let tail: Vec<&str> = cols[cols.len() - 3..].iter().map(String::as_str).collect();
        assert_eq!(tail, vec!["IDHM_Educacao_Linear_2020", "IDHM_Educacao_r", "IDHM_Educacao_Exp_2020"]);
    }

    #[test]
    fn project_missing_input_is_input_error() {
        let config = AnalysisConfig {
            data_dir: std::env::temp_dir().join("ri-pipeline-does-not-exist"),
            ..AnalysisConfig::default()
        };
        let plan = plan();
        let err = run_project(
            &config,
            &plan,
            &config.data_file(IDHM_FILE),
            &default_projection_path(&config, &plan),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    fn files_in(dir: &Path) -> Vec<String> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn project_missing_column_leaves_no_output() {
        let root = std::env::temp_dir().join(format!("ri-pipeline-project-column-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let input = root.join("idhm.csv");
        std::fs::write(
            &input,
            "Prefeitura Regional,IDHM_2000,IDHM_2010,IDHM_Renda_2010,IDHM_Educacao_2000,IDHM_Educacao_2010\n\
             Sé,0.70,0.75,0.80,0.60,0.70\n",
        )
        .unwrap();
        let config = AnalysisConfig {
            out_dir: root.join("results"),
            ..AnalysisConfig::default()
        };
        let out = default_projection_path(&config, &plan());

        let err = run_project(&config, &plan(), &input, &out).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("IDHM_Renda_2000"));
        assert!(!out.exists());
        assert!(!out.with_file_name(".idhm_projecao_2020.csv.tmp").exists());
        assert!(files_in(&config.out_dir).is_empty());
    }

    #[test]
    fn project_writes_a_workbook_when_asked() {
        let config = workspace("project-xlsx", false);
        let out = config.out_file("idhm_projecao_2020.xlsx");
        run_project(&config, &plan(), &config.data_file(IDHM_FILE), &out).unwrap();

        let back = load_table(&out, &ReadOptions::default()).unwrap().table;
        assert_eq!(back.len(), 6);
        assert!(back.has_column("IDHM_Exp_2020"));
        assert!(back.numeric_column("IDHM_r").unwrap().iter().any(Option::is_some));
    }

    #[test]
    fn project_reads_decimal_comma_exports() {
        let root = std::env::temp_dir().join(format!("ri-pipeline-decimal-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let input = root.join("idhm.csv");
        std::fs::write(&input, "Prefeitura Regional;IDHM_2000;IDHM_2010\nSé;0,700;0,750\n").unwrap();
        let plan = ProjectionPlan {
            indicators: vec!["IDHM".to_string()],
            ..plan()
        };
        let out = root.join("out.csv");

        let plain = AnalysisConfig::default();
        let run = run_project(&plain, &plan, &input, &out).unwrap();
        assert_eq!(run.output.unparsed_columns, vec!["IDHM_2000", "IDHM_2010"]);

        let comma = AnalysisConfig {
            decimal_comma: true,
            ..AnalysisConfig::default()
        };
        let run = run_project(&comma, &plan, &input, &out).unwrap();
        assert!(run.output.unparsed_columns.is_empty());
        let linear = run.output.table.numeric_column("IDHM_Linear_2020").unwrap();
        assert!((linear[0].unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn stats_groups_by_region_and_charts() {
        let config = workspace("stats", true);
        let jobs = vec![StatsJob {
            input: config.data_file(Stage::Initial.file_name()),
            title: "IDEB Anos Iniciais".to_string(),
        }];
        let runs = run_stats(&config, &jobs, "IDEB_").unwrap();
        let run = &runs[0];

        assert_eq!(run.columns.len(), 9);
        assert_eq!(run.summaries.len(), 6);
        assert_eq!(run.summaries.columns()[0], DEFAULT_REGION_COLUMN);
        assert!(run.summaries.has_column("IDEB_2005_iniciais_p90"));
        assert!(config.out_file("stats_ideb_anos_iniciais.csv").exists());
        assert!(config.out_file("evolution_ideb_anos_iniciais.svg").exists());
    }

    #[test]
    fn stats_without_year_columns_is_no_data() {
        let config = workspace("stats-empty", false);
        let jobs = vec![StatsJob {
            input: config.data_file(IDHM_FILE),
            title: "IDHM".to_string(),
        }];
        let err = run_stats(&config, &jobs, "IDEB_").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn stats_missing_stage_file_writes_nothing() {
        let config = workspace("stats-missing", true);
        std::fs::remove_file(config.data_file(Stage::Final.file_name())).unwrap();

        let err = run_stats(&config, &stage_jobs(&config), "IDEB_").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert_eq!(files_in(&config.out_dir), Vec::<String>::new());
    }

    #[test]
    fn stats_no_data_in_second_file_writes_nothing() {
        let config = workspace("stats-late-no-data", false);
        let jobs = vec![
            StatsJob {
                input: config.data_file(Stage::Initial.file_name()),
                title: "IDEB Anos Iniciais".to_string(),
            },
            StatsJob {
                input: config.data_file(IDHM_FILE),
                title: "IDHM".to_string(),
            },
        ];
        let err = run_stats(&config, &jobs, "IDEB_").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
        assert_eq!(files_in(&config.out_dir), Vec::<String>::new());
    }

    #[test]
    fn correlate_missing_stage_file_writes_nothing() {
        let config = workspace("correlate-missing", true);
        std::fs::remove_file(config.data_file(Stage::Final.file_name())).unwrap();

        let err = run_correlate(&config, CorrelateOptions { periods: &[2010], bins: 10 }).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert_eq!(files_in(&config.out_dir), Vec::<String>::new());
    }

    #[test]
    fn correlate_produces_one_section_per_stage_and_period() {
        let config = workspace("correlate", true);
        let run = run_correlate(&config, CorrelateOptions { periods: &[2000, 2010, 2020], bins: 10 }).unwrap();

        assert_eq!(run.sections.len(), 6);
        let s = &run.sections[1];
        assert_eq!((s.stage, s.period), (Stage::Initial, 2010));
        assert_eq!(s.merged.len(), 6);
        // Region + five IDEB years of the decade + three IDHM indicators.
        assert_eq!(s.merged.width(), 1 + 5 + 3);
        assert_eq!(s.scatters.len(), 5);

        for name in [
            "merged_ideb_anos_iniciais_x_idhm_2010.csv",
            "correlation_ideb_anos_iniciais_x_idhm_2010.csv",
            "range_ideb_anos_iniciais_x_idhm_2010.csv",
            "cv_ideb_anos_iniciais_x_idhm_2010.csv",
            "frequency_ideb_anos_iniciais_x_idhm_2010.csv",
            "heatmap_ideb_anos_iniciais_x_idhm_2010.svg",
            "histograms_ideb_anos_iniciais_x_idhm_2010.svg",
            "scatter_IDEB_2011_iniciais_vs_IDHM_2010.svg",
        ] {
            assert!(config.out_file(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn correlate_skips_periods_without_data() {
        let config = workspace("correlate-skip", false);
        let run = run_correlate(&config, CorrelateOptions { periods: &[2010, 1990], bins: 10 }).unwrap();
        assert_eq!(run.sections.len(), 2);

        let err = run_correlate(&config, CorrelateOptions { periods: &[1990], bins: 10 }).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn all_collects_every_output_in_one_manifest() {
        let config = workspace("all", false);
        let run = run_all(&config, &plan(), &[2010]).unwrap();
        assert_eq!(run.inspect.reports.len(), 3);
        assert_eq!(run.stats.len(), 2);
        assert_eq!(run.manifest.inputs.len(), 3);
        assert!(run.manifest.outputs.contains(&default_projection_path(&config, &plan())));
        assert!(run.manifest.outputs.iter().any(|p| p.ends_with("stats_ideb_anos_finais.csv")));
    }
}
