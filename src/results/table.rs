//! Gene x subtype table of adjusted significance

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtypeError};
use crate::testing::{display_padj, Direction, Significance};

/// One (gene, subtype) comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatCell {
    /// Test ran; `padj` is adjusted within the gene's row
    Computed {
        /// U statistic of the mutated group
        statistic: f64,
        n_mutated: usize,
        n_unmutated: usize,
        pvalue: f64,
        padj: f64,
        significance: Significance,
        direction: Direction,
    },
    /// Test could not run (an empty group)
    NotComputed,
}

impl StatCell {
    pub fn statistic(&self) -> Option<f64> {
        match self {
            StatCell::Computed { statistic, .. } => Some(*statistic),
            StatCell::NotComputed => None,
        }
    }

    /// (mutated, unmutated) group sizes of the test
    pub fn group_sizes(&self) -> Option<(usize, usize)> {
        match self {
            StatCell::Computed {
                n_mutated,
                n_unmutated,
                ..
            } => Some((*n_mutated, *n_unmutated)),
            StatCell::NotComputed => None,
        }
    }

    pub fn pvalue(&self) -> Option<f64> {
        match self {
            StatCell::Computed { pvalue, .. } => Some(*pvalue),
            StatCell::NotComputed => None,
        }
    }

    pub fn padj(&self) -> Option<f64> {
        match self {
            StatCell::Computed { padj, .. } => Some(*padj),
            StatCell::NotComputed => None,
        }
    }

    pub fn significance(&self) -> Significance {
        match self {
            StatCell::Computed { significance, .. } => *significance,
            StatCell::NotComputed => Significance::NotSignificant,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            StatCell::Computed { direction, .. } => Some(*direction),
            StatCell::NotComputed => None,
        }
    }

    pub fn is_significant(&self) -> bool {
        self.significance().is_significant()
    }

    /// Adjusted p-value with its label, e.g. `0.0012**`
    pub fn display(&self) -> Option<String> {
        self.padj().map(display_padj)
    }
}

/// Dense gene x subtype table; the only artifact the lookup layer reads
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    gene_ids: Vec<String>,
    subtypes: Vec<String>,
    /// One row per gene, one cell per subtype
    rows: Vec<Vec<StatCell>>,
    gene_index: HashMap<String, usize>,
}

impl StatTable {
    /// Create a table; every row must hold exactly one cell per subtype
    pub fn new(gene_ids: Vec<String>, subtypes: Vec<String>, rows: Vec<Vec<StatCell>>) -> Result<Self> {
        if rows.len() != gene_ids.len() {
            return Err(SubtypeError::IncompleteTable {
                reason: format!("{} rows for {} genes", rows.len(), gene_ids.len()),
            });
        }

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != subtypes.len()) {
            return Err(SubtypeError::IncompleteTable {
                reason: format!(
                    "gene '{}' has {} cells for {} subtypes",
                    gene_ids[i],
                    row.len(),
                    subtypes.len()
                ),
            });
        }

        let mut gene_index = HashMap::with_capacity(gene_ids.len());
        for (i, gene) in gene_ids.iter().enumerate() {
            if gene_index.insert(gene.clone(), i).is_some() {
                return Err(SubtypeError::DuplicateGene { gene: gene.clone() });
            }
        }

        Ok(Self {
            gene_ids,
            subtypes,
            rows,
            gene_index,
        })
    }

    pub fn n_genes(&self) -> usize {
        self.gene_ids.len()
    }

    pub fn n_subtypes(&self) -> usize {
        self.subtypes.len()
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    /// All cells for one gene, in subtype order
    pub fn row(&self, gene_id: &str) -> Option<&[StatCell]> {
        self.gene_index.get(gene_id).map(|&i| self.rows[i].as_slice())
    }

    /// Rows in gene order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[StatCell])> {
        self.gene_ids
            .iter()
            .zip(self.rows.iter())
            .map(|(g, r)| (g.as_str(), r.as_slice()))
    }

    pub fn cell(&self, gene_id: &str, subtype: &str) -> Option<&StatCell> {
        let j = self.subtypes.iter().position(|s| s == subtype)?;
        self.row(gene_id).map(|row| &row[j])
    }

    /// Require the table's genes to be exactly `expected`, in the same order,
    /// and its subtype columns to equal `subtypes`
    pub fn check_complete(&self, expected: &[String], subtypes: &[String]) -> Result<()> {
        if self.subtypes != subtypes {
            return Err(SubtypeError::IncompleteTable {
                reason: format!(
                    "table has {} subtype columns, mutation matrix has {}",
                    self.subtypes.len(),
                    subtypes.len()
                ),
            });
        }

        if let Some(missing) = expected.iter().find(|g| !self.gene_index.contains_key(g.as_str())) {
            return Err(SubtypeError::IncompleteTable {
                reason: format!("no row for gene '{}'", missing),
            });
        }

        if self.gene_ids.len() != expected.len() {
            return Err(SubtypeError::IncompleteTable {
                reason: format!(
                    "table has {} genes, expression matrix has {}",
                    self.gene_ids.len(),
                    expected.len()
                ),
            });
        }

        if self.gene_ids != expected {
            return Err(SubtypeError::IncompleteTable {
                reason: "table rows are not in expression matrix order".to_string(),
            });
        }

        Ok(())
    }

    /// Counts of computed, missing and significant cells
    pub fn summary(&self) -> TableSummary {
        let mut summary = TableSummary {
            genes: self.n_genes(),
            subtypes: self.n_subtypes(),
            ..Default::default()
        };

        for cell in self.rows.iter().flatten() {
            match cell.significance() {
                Significance::Strong => summary.strong += 1,
                Significance::Moderate => summary.moderate += 1,
                Significance::Weak => summary.weak += 1,
                Significance::NotSignificant => {}
            }
            if *cell == StatCell::NotComputed {
                summary.not_computed += 1;
            }
        }

        summary.genes_with_hits = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|c| c.is_significant()))
            .count();

        summary
    }
}

/// Summary of a stat table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    pub genes: usize,
    pub subtypes: usize,
    pub not_computed: usize,
    pub weak: usize,
    pub moderate: usize,
    pub strong: usize,
    pub genes_with_hits: usize,
}

impl std::fmt::Display for TableSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Subtype Expression Summary")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Genes: {}", self.genes)?;
        writeln!(f, "Subtypes: {}", self.subtypes)?;
        writeln!(f, "Tests not computed: {}", self.not_computed)?;
        writeln!(f, "Significant (padj < 0.05): {}", self.weak + self.moderate + self.strong)?;
        writeln!(f, "  padj < 0.0001 (***): {}", self.strong)?;
        writeln!(f, "  padj < 0.01 (**): {}", self.moderate)?;
        writeln!(f, "  padj < 0.05 (*): {}", self.weak)?;
        writeln!(f, "Genes with at least one hit: {}", self.genes_with_hits)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(padj: f64) -> StatCell {
        StatCell::Computed {
            statistic: 8.0,
            n_mutated: 3,
            n_unmutated: 3,
            pvalue: padj / 2.0,
            padj,
            significance: Significance::from_padj(Some(padj)),
            direction: Direction::Up,
        }
    }

    fn table() -> StatTable {
        StatTable::new(
            vec!["G1".into(), "G2".into()],
            vec!["FLT3".into(), "NPM1".into()],
            vec![
                vec![computed(0.001), computed(0.2)],
                vec![StatCell::NotComputed, computed(0.00001)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let table = table();
        assert_eq!(table.row("G1").unwrap().len(), 2);
        assert_eq!(table.cell("G2", "FLT3"), Some(&StatCell::NotComputed));
        assert!(table.row("G3").is_none());
        assert_eq!(table.cell("G1", "NPM1").unwrap().group_sizes(), Some((3, 3)));
        assert_eq!(table.cell("G2", "FLT3").unwrap().statistic(), None);
        assert_eq!(table.cell("G1", "FLT3").unwrap().display().unwrap(), "0.001**");
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = StatTable::new(
            vec!["G1".into()],
            vec!["FLT3".into(), "NPM1".into()],
            vec![vec![computed(0.5)]],
        );
        assert!(matches!(result, Err(SubtypeError::IncompleteTable { .. })));
    }

    #[test]
    fn test_check_complete() {
        let table = table();
        let subtypes = vec!["FLT3".to_string(), "NPM1".to_string()];
        assert!(table
            .check_complete(&["G1".to_string(), "G2".to_string()], &subtypes)
            .is_ok());

        let err = table
            .check_complete(&["G1".to_string(), "G2".to_string(), "G3".to_string()], &subtypes)
            .unwrap_err();
        assert!(err.is_data_contract());

        assert!(table
            .check_complete(&["G1".to_string()], &subtypes)
            .is_err());
        assert!(table
            .check_complete(&["G2".to_string(), "G1".to_string()], &subtypes)
            .is_err());
    }

    #[test]
    fn test_summary() {
        let summary = table().summary();
        assert_eq!(summary.not_computed, 1);
        assert_eq!(summary.strong, 1);
        assert_eq!(summary.moderate, 1);
        assert_eq!(summary.weak, 0);
        assert_eq!(summary.genes_with_hits, 2);
        assert!(summary.to_string().contains("Genes: 2"));
    }
}
