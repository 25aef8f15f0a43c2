//! Precomputation of the full stat table
//!
//! Every gene is tested against every subtype and corrected within its own
//! row. Genes run in parallel; each worker only reads the shared cohort and
//! returns its own row.

use log::{debug, info};
use ndarray::ArrayView1;
use rayon::prelude::*;

use super::table::{StatCell, StatTable};
use crate::data::{AlignedCohort, MutationMatrix};
use crate::error::Result;
use crate::testing::{benjamini_hochberg, test_gene, Significance};

/// Test one gene against all subtypes and adjust across that row only
pub fn gene_row(gene_id: &str, expression: ArrayView1<f64>, mutations: &MutationMatrix) -> Vec<StatCell> {
    let tests = test_gene(expression, mutations);

    let pvalues: Vec<Option<f64>> = tests
        .iter()
        .map(|t| match t {
            Ok(test) => Some(test.pvalue),
            Err(e) => {
                debug!("{}: {}", gene_id, e);
                None
            }
        })
        .collect();

    let padj = benjamini_hochberg(&pvalues);

    tests
        .iter()
        .zip(padj)
        .map(|(test, adj)| match (test, adj) {
            (Ok(test), Some(adj)) => StatCell::Computed {
                statistic: test.statistic,
                n_mutated: test.n_mutated,
                n_unmutated: test.n_unmutated,
                pvalue: test.pvalue,
                padj: adj,
                significance: Significance::from_padj(Some(adj)),
                direction: test.direction,
            },
            _ => StatCell::NotComputed,
        })
        .collect()
}

/// Build the gene x subtype table for every gene of the cohort
///
/// Fails if the finished table does not cover exactly the expression genes.
pub fn build_stat_table(cohort: &AlignedCohort) -> Result<StatTable> {
    let expression = cohort.raw();
    let mutations = cohort.mutations();
    let gene_ids = expression.gene_ids();

    info!(
        "Testing {} genes x {} subtypes ({} tests)...",
        gene_ids.len(),
        mutations.n_subtypes(),
        gene_ids.len() * mutations.n_subtypes()
    );

    let rows: Vec<Vec<StatCell>> = (0..gene_ids.len())
        .into_par_iter()
        .map(|i| gene_row(&gene_ids[i], expression.gene_row(i), mutations))
        .collect();

    let table = StatTable::new(gene_ids.to_vec(), mutations.subtypes().to_vec(), rows)?;
    table.check_complete(gene_ids, mutations.subtypes())?;

    let summary = table.summary();
    info!(
        "Stat table complete: {} significant cells, {} not computed",
        summary.weak + summary.moderate + summary.strong,
        summary.not_computed
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ExpressionMatrix;
    use ndarray::array;

    fn cohort() -> AlignedCohort {
        let patients: Vec<String> = (1..=6).map(|i| format!("P{}", i)).collect();
        let raw = ExpressionMatrix::new(
            array![
                [5.0, 6.0, 7.0, 1.0, 2.0, 3.0],
                [4.0, 4.0, 4.0, 4.0, 4.0, 4.1],
                [1.0, 6.0, 2.0, 5.0, 3.0, 4.0],
            ],
            vec!["G1".into(), "G2".into(), "G3".into()],
            patients.clone(),
        )
        .unwrap();
        let scaled = raw.z_scaled().unwrap();
        let mutations = MutationMatrix::new(
            array![[1, 1], [1, 0], [1, 1], [0, 0], [0, 1], [0, 0]],
            patients,
            vec!["NPM1".into(), "FLT3".into()],
        )
        .unwrap();
        AlignedCohort::new(raw, scaled, mutations).unwrap()
    }

    #[test]
    fn test_every_gene_one_row() {
        let table = build_stat_table(&cohort()).unwrap();
        assert_eq!(table.n_genes(), 3);
        for (_, row) in table.rows() {
            assert_eq!(row.len(), 2);
        }
    }

    #[test]
    fn test_rowwise_adjustment_only() {
        let cohort = cohort();
        let table = build_stat_table(&cohort).unwrap();

        // Each row must match a correction computed on that row alone
        for (i, gene) in cohort.raw().gene_ids().iter().enumerate() {
            let alone = gene_row(gene, cohort.raw().gene_row(i), cohort.mutations());
            assert_eq!(table.row(gene).unwrap(), alone.as_slice());
        }
    }

    #[test]
    fn test_adjusted_never_below_raw() {
        let table = build_stat_table(&cohort()).unwrap();
        for (_, row) in table.rows() {
            for cell in row {
                if let (Some(p), Some(adj)) = (cell.pvalue(), cell.padj()) {
                    assert!(adj >= p);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_subtype_not_computed() {
        let patients: Vec<String> = (1..=4).map(|i| format!("P{}", i)).collect();
        let mutations = MutationMatrix::new(
            array![[1, 1], [1, 1], [0, 1], [0, 1]],
            patients,
            vec!["NPM1".into(), "EVERYONE".into()],
        )
        .unwrap();
        let row = gene_row("G", array![4.0, 5.0, 1.0, 2.0].view(), &mutations);

        assert!(matches!(
            row[0],
            StatCell::Computed { statistic, n_mutated: 2, n_unmutated: 2, .. } if statistic == 4.0
        ));
        assert_eq!(row[1], StatCell::NotComputed);
        // the single computed test is a family of one
        assert_eq!(row[0].pvalue(), row[0].padj());
    }

    #[test]
    fn test_build_is_idempotent() {
        let cohort = cohort();
        let first = build_stat_table(&cohort).unwrap();
        let second = build_stat_table(&cohort).unwrap();
        assert_eq!(first, second);
    }
}
