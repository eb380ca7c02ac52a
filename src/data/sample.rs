//! Synthetic IDHM / IDEB datasets with the real column layout.
//!
//! The generated files feed every analysis command without needing the
//! municipal spreadsheets. Values are plausible rather than realistic:
//! each region gets an IDHM trajectory, and its schools' IDEB scores are
//! centered on a level tied to that region's 2010 IDHM, with a mild upward
//! trend over the years.

use std::path::PathBuf;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::{debug, info};

use crate::domain::{DEFAULT_PERIODS, DEFAULT_REGION_COLUMN, IDHM_FILE, IDHM_INDICATORS, Stage, Table, Value};
use crate::error::AppError;
use crate::io::{ensure_dir, write_table_csv};

/// Subprefeituras of São Paulo, used as region names.
pub const REGIONS: [&str; 32] = [
    "Aricanduva/Formosa/Carrão",
    "Butantã",
    "Campo Limpo",
    "Capela do Socorro",
    "Casa Verde/Cachoeirinha",
    "Cidade Ademar",
    "Cidade Tiradentes",
    "Ermelino Matarazzo",
    "Freguesia/Brasilândia",
    "Guaianases",
    "Ipiranga",
    "Itaim Paulista",
    "Itaquera",
    "Jabaquara",
    "Jaçanã/Tremembé",
    "Lapa",
    "M'Boi Mirim",
    "Mooca",
    "Parelheiros",
    "Penha",
    "Perus",
    "Pinheiros",
    "Pirituba/Jaraguá",
    "Santana/Tucuruvi",
    "Santo Amaro",
    "São Mateus",
    "São Miguel Paulista",
    "Sapopemba",
    "Sé",
    "Vila Maria/Vila Guilherme",
    "Vila Mariana",
    "Vila Prudente",
];

/// Years with a published IDEB.
pub const IDEB_YEARS: [i32; 9] = [2005, 2009, 2011, 2013, 2015, 2017, 2019, 2021, 2023];

/// Written in place of an unavailable IDEB score.
pub const MISSING_MARKER: &str = "ND";

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out_dir: PathBuf,
    /// Number of regions, taken from the start of `REGIONS`.
    pub regions: usize,
    pub schools_per_region: usize,
    pub seed: u64,
    /// Probability that an IDEB cell is written as `ND`.
    pub missing_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data"),
            regions: REGIONS.len(),
            schools_per_region: 12,
            seed: 42,
            missing_prob: 0.08,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub idhm: Table,
    pub ideb: Vec<(Stage, Table)>,
}

/// IDHM trajectory of one region at the default periods.
#[derive(Debug, Clone, Copy)]
struct RegionProfile {
    /// `[indicator][period]`, same order as `IDHM_INDICATORS` / `DEFAULT_PERIODS`.
    idhm: [[f64; 3]; 3],
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.regions == 0 || config.regions > REGIONS.len() {
        return Err(AppError::input(format!(
            "Region count must be between 1 and {}.",
            REGIONS.len()
        )));
    }
    if config.schools_per_region == 0 {
        return Err(AppError::input("Schools per region must be > 0."));
    }
    if !(0.0..1.0).contains(&config.missing_prob) {
        return Err(AppError::input("Missing probability must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0).map_err(|e| AppError::output(format!("Noise distribution error: {e}")))?;

    let regions = &REGIONS[..config.regions];
    let profiles: Vec<RegionProfile> = regions.iter().map(|_| region_profile(&mut rng, &noise)).collect();

    let idhm = idhm_table(regions, &profiles);
    let ideb = Stage::ALL
        .iter()
        .map(|&stage| (stage, ideb_table(regions, &profiles, stage, config, &mut rng, &noise)))
        .collect();

    Ok(SampleData { idhm, ideb })
}

/// Generate and write the three input files into `config.out_dir`.
pub fn write_sample(config: &SampleConfig) -> Result<Vec<PathBuf>, AppError> {
    let data = generate_sample(config)?;
    ensure_dir(&config.out_dir)?;

    let mut written = Vec::with_capacity(3);
    let idhm_path = config.out_dir.join(IDHM_FILE);
    write_table_csv(&idhm_path, &data.idhm)?;
    written.push(idhm_path);

    for (stage, table) in &data.ideb {
        let path = config.out_dir.join(stage.file_name());
        write_table_csv(&path, table)?;
        debug!(stage = stage.label(), rows = table.len(), "wrote IDEB sample");
        written.push(path);
    }

    info!(
        dir = %config.out_dir.display(),
        regions = config.regions,
        schools = config.regions * config.schools_per_region,
        seed = config.seed,
        "synthetic datasets written"
    );
    Ok(written)
}

fn region_profile(rng: &mut StdRng, noise: &Normal<f64>) -> RegionProfile {
    // Overall IDHM sets the level; income and education deviate around it.
    let level = (0.72 + 0.07 * noise.sample(rng)).clamp(0.55, 0.90);
    let income_offset = 0.03 + 0.02 * noise.sample(rng);
    let education_offset = -0.08 + 0.02 * noise.sample(rng);

    let mut idhm = [[0.0; 3]; 3];
    for (i, offset) in [0.0, income_offset, education_offset].into_iter().enumerate() {
        let mut v = (level + offset).clamp(0.40, 0.95);
        for (p, slot) in idhm[i].iter_mut().enumerate() {
            if p > 0 {
                // Education grew faster than income over the decades.
                let drift = if i == 2 { 0.07 } else { 0.04 };
                v = (v + drift + 0.015 * noise.sample(rng)).clamp(0.40, 0.98);
            }
            *slot = round_to(v, 3);
        }
    }
    RegionProfile { idhm }
}

fn idhm_table(regions: &[&str], profiles: &[RegionProfile]) -> Table {
    let mut columns = vec![DEFAULT_REGION_COLUMN.to_string()];
    for indicator in IDHM_INDICATORS {
        for period in DEFAULT_PERIODS {
            columns.push(format!("{indicator}_{period}"));
        }
    }

    let mut table = Table::new(columns);
    for (name, profile) in regions.iter().zip(profiles) {
        let mut row = vec![Value::Text(name.to_string())];
        row.extend(profile.idhm.iter().flatten().map(|&v| Value::Number(v)));
        table.push_row(row);
    }
    table
}

fn ideb_table(
    regions: &[&str],
    profiles: &[RegionProfile],
    stage: Stage,
    config: &SampleConfig,
    rng: &mut StdRng,
    noise: &Normal<f64>,
) -> Table {
    let mut columns = vec![DEFAULT_REGION_COLUMN.to_string(), "Escola".to_string()];
    columns.extend(IDEB_YEARS.iter().map(|y| format!("IDEB_{y}_{}", stage.column_suffix())));

    let stage_shift = match stage {
        Stage::Initial => 0.0,
        Stage::Final => -1.1,
    };

    let mut table = Table::new(columns);
    for (r, (name, profile)) in regions.iter().zip(profiles).enumerate() {
        let region_level = 4.6 + stage_shift + 8.0 * (profile.idhm[0][1] - 0.78);
        for s in 0..config.schools_per_region {
            let school_level = region_level + 0.5 * noise.sample(rng);
            let mut row = vec![
                Value::Text(name.to_string()),
                Value::Text(format!("EMEF {:02}-{:03}", r + 1, s + 1)),
            ];
            for year in IDEB_YEARS {
                if rng.gen_bool(config.missing_prob) {
                    row.push(Value::Text(MISSING_MARKER.to_string()));
                    continue;
                }
                let trend = 0.07 * f64::from(year - IDEB_YEARS[0]);
                let score = (school_level + trend + 0.3 * noise.sample(rng)).clamp(0.0, 10.0);
                row.push(Value::Number(round_to(score, 1)));
            }
            table.push_row(row);
        }
    }
    table
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let k = 10f64.powi(decimals);
    (v * k).round() / k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReadOptions, year_columns};
    use crate::io::load_table;

    fn small() -> SampleConfig {
        SampleConfig {
            out_dir: std::env::temp_dir().join(format!("ri-sample-{}", std::process::id())),
            regions: 5,
            schools_per_region: 4,
            seed: 7,
            missing_prob: 0.2,
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_sample(&small()).unwrap();
        let b = generate_sample(&small()).unwrap();
        assert_eq!(a.idhm, b.idhm);
        assert_eq!(a.ideb[0].1, b.ideb[0].1);

        let c = generate_sample(&SampleConfig { seed: 8, ..small() }).unwrap();
        assert_ne!(a.ideb[0].1, c.ideb[0].1);
    }

    #[test]
    fn tables_have_expected_layout() {
        let data = generate_sample(&small()).unwrap();
        assert_eq!(data.idhm.len(), 5);
        assert_eq!(data.idhm.width(), 1 + 9);
        assert!(data.idhm.has_column("IDHM_Educacao_2020"));
        for row in data.idhm.rows() {
            for v in &row[1..] {
                let v = v.as_f64().unwrap();
                assert!(v > 0.0 && v < 1.0);
            }
        }

        let (stage, final_years) = &data.ideb[1];
        assert_eq!(*stage, Stage::Final);
        assert_eq!(final_years.len(), 5 * 4);
        let years = year_columns(final_years.columns(), "IDEB_");
        assert_eq!(years.len(), IDEB_YEARS.len());
        assert_eq!(years[0].name, "IDEB_2005_finais");
    }

    #[test]
    fn missing_marker_fraction_follows_probability() {
        let config = SampleConfig {
            regions: 32,
            schools_per_region: 20,
            ..small()
        };
        let data = generate_sample(&config).unwrap();
        let table = &data.ideb[0].1;
        let cells = table.len() * IDEB_YEARS.len();
        let nd = table
            .rows()
            .iter()
            .flat_map(|r| r[2..].iter())
            .filter(|v| v.as_text() == Some(MISSING_MARKER))
            .count();
        let frac = nd as f64 / cells as f64;
        assert!((frac - 0.2).abs() < 0.05, "marker fraction {frac}");
    }

    #[test]
    fn rejects_invalid_settings() {
        assert_eq!(generate_sample(&SampleConfig { regions: 0, ..small() }).unwrap_err().exit_code(), 2);
        assert_eq!(generate_sample(&SampleConfig { regions: 33, ..small() }).unwrap_err().exit_code(), 2);
        assert_eq!(generate_sample(&SampleConfig { missing_prob: 1.0, ..small() }).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn written_files_load_back() {
        let config = small();
        let written = write_sample(&config).unwrap();
        assert_eq!(written.len(), 3);

        let idhm = load_table(&config.out_dir.join(IDHM_FILE), &ReadOptions::default()).unwrap();
        assert_eq!(idhm.table.len(), 5);
        assert_eq!(idhm.table.numeric_columns().len(), 9);

        let ideb = load_table(&config.out_dir.join(Stage::Initial.file_name()), &ReadOptions::default()).unwrap();
        let mut table = ideb.table;
        let cols: Vec<String> = year_columns(table.columns(), "IDEB_").into_iter().map(|c| c.name).collect();
        table.coerce_numeric(&cols);
        let present = table.numeric_column(&cols[0]).unwrap().into_iter().flatten().count();
        assert!(present > 0 && present <= table.len());
    }
}
