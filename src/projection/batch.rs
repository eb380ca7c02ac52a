//! Apply the projector to every row of a table.
//!
//! For each indicator `I` the input needs `I_{base_year}` and `I_{last_year}`;
//! the output gains, in this order:
//!
//! - `I_Linear_{target_year}`
//! - `I_r`
//! - `I_Exp_{target_year}`
//!
//! Rows are independent, so they are projected in parallel. A row with a
//! missing or unusable value only degrades its own output cells.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{Table, Value};
use crate::error::AppError;
use crate::projection::model::{RowProjection, project_row};

/// Which series to project, and from/to which years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionPlan {
    pub indicators: Vec<String>,
    pub base_year: i32,
    pub last_year: i32,
    pub target_year: i32,
}

impl ProjectionPlan {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.indicators.is_empty() {
            return Err(AppError::input("At least one indicator is required for projection."));
        }
        if !(self.base_year < self.last_year && self.last_year < self.target_year) {
            return Err(AppError::input(format!(
                "Projection years must satisfy base < last < target (got {} / {} / {}).",
                self.base_year, self.last_year, self.target_year
            )));
        }
        Ok(())
    }

    pub fn base_column(&self, indicator: &str) -> String {
        format!("{indicator}_{}", self.base_year)
    }

    pub fn last_column(&self, indicator: &str) -> String {
        format!("{indicator}_{}", self.last_year)
    }

    pub fn linear_column(&self, indicator: &str) -> String {
        format!("{indicator}_Linear_{}", self.target_year)
    }

    pub fn rate_column(&self, indicator: &str) -> String {
        format!("{indicator}_r")
    }

    pub fn exp_column(&self, indicator: &str) -> String {
        format!("{indicator}_Exp_{}", self.target_year)
    }

    /// Input columns the plan reads, in indicator order.
    pub fn required_columns(&self) -> Vec<String> {
        self.indicators
            .iter()
            .flat_map(|i| [self.base_column(i), self.last_column(i)])
            .collect()
    }
}

/// How many rows of one indicator ended up with undefined forecasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSummary {
    pub indicator: String,
    pub rows: usize,
    pub missing_input: usize,
    pub undefined_linear: usize,
    pub undefined_exponential: usize,
}

#[derive(Debug, Clone)]
pub struct ProjectionOutput {
    pub table: Table,
    pub summaries: Vec<IndicatorSummary>,
    /// Required columns in which no cell parsed as a number.
    pub unparsed_columns: Vec<String>,
}

/// Project every indicator of `plan` over `input`.
///
/// Fails (before producing anything) only when a required column is absent.
pub fn project_table(input: &Table, plan: &ProjectionPlan) -> Result<ProjectionOutput, AppError> {
    plan.validate()?;

    let required = plan.required_columns();
    if let Some(missing) = required.iter().find(|c| !input.has_column(c)) {
        return Err(AppError::input(format!(
            "Missing required column for projection: `{missing}`"
        )));
    }

    let mut table = input.clone();
    table.coerce_numeric(&required);

    let unparsed_columns: Vec<String> = if table.is_empty() {
        Vec::new()
    } else {
        required
            .iter()
            .filter(|c| table.numeric_column(c).is_some_and(|v| v.iter().all(Option::is_none)))
            .cloned()
            .collect()
    };
    for column in &unparsed_columns {
        warn!(
            column = %column,
            "no cell parsed as a number; if the file uses decimal commas, pass --decimal-comma"
        );
    }

    let (t0, t1, t2) = (
        f64::from(plan.base_year),
        f64::from(plan.last_year),
        f64::from(plan.target_year),
    );

    let mut summaries = Vec::with_capacity(plan.indicators.len());
    for indicator in &plan.indicators {
        let base = table.numeric_column(&plan.base_column(indicator)).unwrap_or_default();
        let last = table.numeric_column(&plan.last_column(indicator)).unwrap_or_default();

        let rows: Vec<RowProjection> = base
            .par_iter()
            .zip(last.par_iter())
            .map(|(&v0, &v1)| project_row(v0, v1, t0, t1, t2))
            .collect();

        let summary = summarize(indicator, &base, &last, &rows);
        if summary.undefined_linear > 0 || summary.undefined_exponential > 0 {
            warn!(
                indicator = %indicator,
                rows = summary.rows,
                missing_input = summary.missing_input,
                undefined_linear = summary.undefined_linear,
                undefined_exponential = summary.undefined_exponential,
                "some projections are undefined"
            );
        }
        for (i, r) in rows.iter().enumerate() {
            if r.exponential.is_none() {
                debug!(indicator = %indicator, row = i, v0 = ?base[i], v1 = ?last[i], "undefined exponential projection");
            }
        }

        table.add_column(plan.linear_column(indicator), rows.iter().map(|r| Value::from_opt(r.linear)).collect());
        table.add_column(plan.rate_column(indicator), rows.iter().map(|r| Value::from_opt(r.rate)).collect());
        table.add_column(plan.exp_column(indicator), rows.iter().map(|r| Value::from_opt(r.exponential)).collect());

        summaries.push(summary);
    }

    Ok(ProjectionOutput {
        table,
        summaries,
        unparsed_columns,
    })
}

fn summarize(indicator: &str, base: &[Option<f64>], last: &[Option<f64>], rows: &[RowProjection]) -> IndicatorSummary {
    IndicatorSummary {
        indicator: indicator.to_string(),
        rows: rows.len(),
        missing_input: base
            .iter()
            .zip(last)
            .filter(|(a, b)| a.is_none() || b.is_none())
            .count(),
        undefined_linear: rows.iter().filter(|r| r.linear.is_none()).count(),
        undefined_exponential: rows.iter().filter(|r| r.exponential.is_none()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(indicators: &[&str]) -> ProjectionPlan {
        ProjectionPlan {
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
            base_year: 2000,
            last_year: 2010,
            target_year: 2020,
        }
    }

    fn idhm_table() -> Table {
        let mut t = Table::new(vec![
            "Prefeitura Regional".into(),
            "IDHM_2000".into(),
            "IDHM_2010".into(),
        ]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Number(0.700), Value::Number(0.750)]);
        t.push_row(vec![Value::Text("Perus".into()), Value::Missing, Value::Number(0.700)]);
        t.push_row(vec![Value::Text("Lapa".into()), Value::Number(0.0), Value::Number(0.5)]);
        t.push_row(vec![Value::Text("Mooca".into()), Value::Text("n/d".into()), Value::Number(0.8)]);
        t
    }

    #[test]
    fn output_columns_are_appended_in_order() {
        let out = project_table(&idhm_table(), &plan(&["IDHM"])).unwrap();
        let cols = out.table.columns();
        assert_eq!(&cols[3..], &["IDHM_Linear_2020", "IDHM_r", "IDHM_Exp_2020"]);
    }

    #[test]
    fn bad_rows_degrade_only_their_own_cells() {
        let out = project_table(&idhm_table(), &plan(&["IDHM"])).unwrap();
        let linear = out.table.numeric_column("IDHM_Linear_2020").unwrap();
        let exp = out.table.numeric_column("IDHM_Exp_2020").unwrap();

        assert!((linear[0].unwrap() - 0.8).abs() < 1e-12);
        assert!((exp[0].unwrap() - 0.8036).abs() < 1e-4);

        assert_eq!(linear[1], None);
        assert_eq!(exp[1], None);

        assert!((linear[2].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(exp[2], None);

        // Non-numeric text is coerced to missing.
        assert_eq!(linear[3], None);

        let s = &out.summaries[0];
        assert_eq!(s.rows, 4);
        assert_eq!(s.missing_input, 2);
        assert_eq!(s.undefined_linear, 2);
        assert_eq!(s.undefined_exponential, 3);
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = project_table(&idhm_table(), &plan(&["IDHM", "IDHM_Renda"])).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("IDHM_Renda_2000"));
    }

    #[test]
    fn columns_without_any_number_are_flagged() {
        let mut t = Table::new(vec!["Prefeitura Regional".into(), "IDHM_2000".into(), "IDHM_2010".into()]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Text("0,700".into()), Value::Number(0.75)]);
        t.push_row(vec![Value::Text("Lapa".into()), Value::Text("0,650".into()), Value::Missing]);

        let out = project_table(&t, &plan(&["IDHM"])).unwrap();
        assert_eq!(out.unparsed_columns, vec!["IDHM_2000"]);
        assert_eq!(out.summaries[0].undefined_linear, 2);

        let clean = project_table(&idhm_table(), &plan(&["IDHM"])).unwrap();
        assert!(clean.unparsed_columns.is_empty());
    }

    #[test]
    fn years_must_be_increasing() {
        let mut p = plan(&["IDHM"]);
        p.target_year = 2010;
        assert!(p.validate().is_err());
        p.target_year = 2030;
        p.base_year = 2010;
        assert!(p.validate().is_err());
    }

    #[test]
    fn input_table_is_left_untouched() {
        let input = idhm_table();
        let _ = project_table(&input, &plan(&["IDHM"])).unwrap();
        assert_eq!(input.width(), 3);
        assert_eq!(input.cell(3, 1), &Value::Text("n/d".into()));
    }
}
