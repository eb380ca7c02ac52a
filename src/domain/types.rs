//! Shared configuration and naming conventions.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default grouping key of the municipal datasets.
pub const DEFAULT_REGION_COLUMN: &str = "Prefeitura Regional";

/// Conventional input file names inside the data directory.
pub const IDHM_FILE: &str = "idhm_subpref_anos.csv";
pub const IDEB_INITIAL_FILE: &str = "ideb_anos_iniciais.csv";
pub const IDEB_FINAL_FILE: &str = "ideb_anos_finais.csv";

/// IDHM indicators, in the order their columns are produced.
pub const IDHM_INDICATORS: [&str; 3] = ["IDHM", "IDHM_Renda", "IDHM_Educacao"];

/// IDHM census periods the IDEB years are compared against.
pub const DEFAULT_PERIODS: [i32; 3] = [2000, 2010, 2020];

/// Field delimiter of input CSV files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Pick `;` when the header line has more semicolons than commas.
    #[default]
    Auto,
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Resolve to a byte, given the header line of the file.
    pub fn resolve(self, header_line: &str) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Auto => {
                let semis = header_line.matches(';').count();
                let commas = header_line.matches(',').count();
                let tabs = header_line.matches('\t').count();
                if tabs > semis && tabs > commas {
                    b'\t'
                } else if semis > commas {
                    b';'
                } else {
                    b','
                }
            }
        }
    }
}

/// How input files are decoded. Recorded in the run manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Field delimiter of CSV inputs (ignored for workbooks).
    pub delimiter: Delimiter,
    /// Worksheet of `.xlsx` inputs; the first sheet when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Numbers are written with a decimal comma (`0,700`).
    #[serde(default)]
    pub decimal_comma: bool,
}

/// IDEB school stage. The datasets ship one file per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Initial years of elementary school.
    Initial,
    /// Final years of elementary school.
    Final,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::Initial, Stage::Final];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Initial => "Anos Iniciais",
            Stage::Final => "Anos Finais",
        }
    }

    /// Column suffix used by the datasets (`IDEB_2011_iniciais`).
    pub fn column_suffix(self) -> &'static str {
        match self {
            Stage::Initial => "iniciais",
            Stage::Final => "finais",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Stage::Initial => IDEB_INITIAL_FILE,
            Stage::Final => IDEB_FINAL_FILE,
        }
    }
}

/// Options shared by every analysis command.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub region_column: String,
    pub delimiter: Delimiter,
    pub sheet: Option<String>,
    pub decimal_comma: bool,
    /// Render SVG charts next to the CSV exports.
    pub charts: bool,
    /// Print ASCII scatter plots to the terminal.
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl AnalysisConfig {
    /// Input file inside the data directory. A workbook with the same stem
    /// stands in for a CSV that is absent.
    pub fn data_file(&self, name: &str) -> PathBuf {
        let path = self.data_dir.join(name);
        let workbook = path.with_extension("xlsx");
        if !path.exists() && workbook.exists() { workbook } else { path }
    }

    pub fn out_file(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            delimiter: self.delimiter,
            sheet: self.sheet.clone(),
            decimal_comma: self.decimal_comma,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            out_dir: PathBuf::from("results"),
            region_column: DEFAULT_REGION_COLUMN.to_string(),
            delimiter: Delimiter::Auto,
            sheet: None,
            decimal_comma: false,
            charts: true,
            plot: false,
            plot_width: 72,
            plot_height: 20,
        }
    }
}

/// A column holding one year of an indexed series (`IDEB_2011_iniciais`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub name: String,
    pub year: i32,
}

/// Find the columns starting with `prefix` whose second `_`-token is a year,
/// sorted by year (stable for equal years).
pub fn year_columns(columns: &[String], prefix: &str) -> Vec<YearColumn> {
    let mut out: Vec<YearColumn> = columns
        .iter()
        .filter(|c| c.starts_with(prefix))
        .filter_map(|c| {
            let year = c.split('_').nth(1)?.parse::<i32>().ok()?;
            Some(YearColumn {
                name: c.clone(),
                year,
            })
        })
        .collect();
    out.sort_by_key(|c| c.year);
    out
}

/// Census period (decade) an observation year is compared against.
pub fn period_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Lowercase file-name friendly form of a title.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_columns_are_filtered_and_sorted() {
        let cols: Vec<String> = [
            "Prefeitura Regional",
            "IDEB_2011_finais",
            "IDEB_2005_finais",
            "IDEB_media",
            "Escola",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let found = year_columns(&cols, "IDEB_");
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["IDEB_2005_finais", "IDEB_2011_finais"]);
        assert_eq!(found[0].year, 2005);
    }

    #[test]
    fn periods_follow_decades() {
        assert_eq!(period_of(2005), 2000);
        assert_eq!(period_of(2009), 2000);
        assert_eq!(period_of(2011), 2010);
        assert_eq!(period_of(2019), 2010);
        assert_eq!(period_of(2023), 2020);
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("IDEB (Anos Finais) x IDHM 2000"), "ideb_anos_finais_x_idhm_2000");
        assert_eq!(slugify("  Anos Iniciais "), "anos_iniciais");
        assert_eq!(slugify("Educação"), "educação");
    }

    #[test]
    fn data_file_falls_back_to_a_workbook() {
        let dir = std::env::temp_dir().join(format!("ri-data-file-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ideb_anos_finais.xlsx"), b"").unwrap();
        std::fs::write(dir.join("ideb_anos_iniciais.csv"), b"").unwrap();
        std::fs::write(dir.join("ideb_anos_iniciais.xlsx"), b"").unwrap();

        let config = AnalysisConfig {
            data_dir: dir.clone(),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.data_file(IDEB_FINAL_FILE), dir.join("ideb_anos_finais.xlsx"));
        assert_eq!(config.data_file(IDEB_INITIAL_FILE), dir.join(IDEB_INITIAL_FILE));
        assert_eq!(config.data_file(IDHM_FILE), dir.join(IDHM_FILE));
    }

    #[test]
    fn delimiter_auto_detection() {
        assert_eq!(Delimiter::Auto.resolve("a;b;c"), b';');
        assert_eq!(Delimiter::Auto.resolve("a,b;c,d"), b',');
        assert_eq!(Delimiter::Auto.resolve("a\tb\tc"), b'\t');
        assert_eq!(Delimiter::Semicolon.resolve("a,b"), b';');
    }
}
