//! Two-stage expression filter
//!
//! Stage (a) keeps genes detected above `min_expression` in more than
//! `min_expressed_fraction` of patients; stage (b) keeps the survivors whose
//! sample standard deviation exceeds `min_sd`.

use log::info;
use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::config::PrepConfig;
use crate::data::ExpressionMatrix;
use crate::error::{Result, SubtypeError};
use crate::stats::sample_sd;

/// How many genes each preparation filter removed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_genes: usize,
    pub removed_by_symbol: usize,
    pub removed_low_expression: usize,
    pub removed_low_variance: usize,
    pub kept_genes: usize,
}

impl std::fmt::Display for FilterReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Gene filtering")?;
        writeln!(f, "==============")?;
        writeln!(f, "Input genes: {}", self.input_genes)?;
        writeln!(f, "  Removed (biotype/symbol): {}", self.removed_by_symbol)?;
        writeln!(f, "  Removed (low expression): {}", self.removed_low_expression)?;
        writeln!(f, "  Removed (low variance): {}", self.removed_low_variance)?;
        writeln!(f, "Kept genes: {}", self.kept_genes)?;
        Ok(())
    }
}

/// Indices of genes passing stage (a)
pub fn expressed_genes(matrix: &ExpressionMatrix, min_expression: f64, min_fraction: f64) -> Vec<usize> {
    let n = matrix.n_patients() as f64;
    matrix
        .values()
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| {
            let detected = row.iter().filter(|&&x| x > min_expression).count();
            detected as f64 / n > min_fraction
        })
        .map(|(i, _)| i)
        .collect()
}

/// Indices of genes passing stage (b)
pub fn variable_genes(matrix: &ExpressionMatrix, min_sd: f64) -> Vec<usize> {
    matrix
        .values()
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| sample_sd(&row.to_vec()) > min_sd)
        .map(|(i, _)| i)
        .collect()
}

/// Apply both stages; `report` receives the per-stage counts
pub fn filter_genes(
    matrix: &ExpressionMatrix,
    config: &PrepConfig,
    report: &mut FilterReport,
) -> Result<ExpressionMatrix> {
    let expressed = expressed_genes(matrix, config.min_expression, config.min_expressed_fraction);
    report.removed_low_expression = matrix.n_genes() - expressed.len();
    let stage_a = matrix.subset_genes(&expressed)?;

    let variable = variable_genes(&stage_a, config.min_sd);
    report.removed_low_variance = stage_a.n_genes() - variable.len();
    let stage_b = stage_a.subset_genes(&variable)?;

    report.kept_genes = stage_b.n_genes();
    info!(
        "Expression filter: {} -> {} (detection > {} in > {:.0}% of patients) -> {} (sd > {})",
        matrix.n_genes(),
        stage_a.n_genes(),
        config.min_expression,
        config.min_expressed_fraction * 100.0,
        stage_b.n_genes(),
        config.min_sd
    );

    if stage_b.n_genes() == 0 {
        return Err(SubtypeError::EmptyData {
            reason: "No genes passed the expression filters".to_string(),
        });
    }

    Ok(stage_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix() -> ExpressionMatrix {
        ExpressionMatrix::new(
            array![
                [0.0, 0.0, 0.0, 5.0],  // detected in 25% only
                [3.0, 3.1, 3.0, 3.1],  // detected, flat
                [1.0, 4.0, 2.0, 6.0],  // detected, variable
                [0.5, 0.9, 0.2, 0.1],  // never above threshold
            ],
            vec!["LOW".into(), "FLAT".into(), "KEEP".into(), "OFF".into()],
            vec!["P1".into(), "P2".into(), "P3".into(), "P4".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_expressed_genes_strict_fraction() {
        // 1 of 4 detected is exactly 0.25, which does not exceed 0.25
        let kept = expressed_genes(&matrix(), 1.0, 0.25);
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn test_filter_genes_report() {
        let config = PrepConfig::default();
        let mut report = FilterReport {
            input_genes: 4,
            ..Default::default()
        };
        let filtered = filter_genes(&matrix(), &config, &mut report).unwrap();

        assert_eq!(filtered.gene_ids(), &["KEEP".to_string()]);
        assert_eq!(report.removed_low_expression, 2);
        assert_eq!(report.removed_low_variance, 1);
        assert_eq!(report.kept_genes, 1);
    }

    #[test]
    fn test_everything_filtered_is_error() {
        let config = PrepConfig {
            min_sd: 100.0,
            ..Default::default()
        };
        let mut report = FilterReport::default();
        assert!(filter_genes(&matrix(), &config, &mut report).is_err());
    }
}
