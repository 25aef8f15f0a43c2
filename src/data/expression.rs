//! Expression matrix representation (genes x patients)

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, SubtypeError};
use crate::stats::{mean, sample_sd};

/// Check that every identifier in `ids` is unique, returning the first repeat
pub(crate) fn first_duplicate(ids: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().find(|id| !seen.insert(id.as_str())).map(|s| s.as_str())
}

/// Expression values on a shared patient axis
/// Rows are genes, columns are patients
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    /// Expression values (genes x patients)
    values: Array2<f64>,
    /// Gene identifiers (row keys)
    gene_ids: Vec<String>,
    /// Patient identifiers (column keys)
    patient_ids: Vec<String>,
    /// Row lookup by gene identifier
    gene_index: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Create a new expression matrix
    ///
    /// Gene and patient identifiers must be unique and every value finite.
    pub fn new(values: Array2<f64>, gene_ids: Vec<String>, patient_ids: Vec<String>) -> Result<Self> {
        let (n_genes, n_patients) = values.dim();

        if gene_ids.len() != n_genes {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} gene IDs", n_genes),
                got: format!("{} gene IDs", gene_ids.len()),
            });
        }

        if patient_ids.len() != n_patients {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} patient IDs", n_patients),
                got: format!("{} patient IDs", patient_ids.len()),
            });
        }

        if values.iter().any(|x| !x.is_finite()) {
            return Err(SubtypeError::InvalidMatrix {
                reason: "Expression values must be finite".to_string(),
            });
        }

        if let Some(gene) = first_duplicate(&gene_ids) {
            return Err(SubtypeError::DuplicateGene {
                gene: gene.to_string(),
            });
        }

        if let Some(patient) = first_duplicate(&patient_ids) {
            return Err(SubtypeError::InvalidMatrix {
                reason: format!("Duplicate patient ID '{}' in expression matrix", patient),
            });
        }

        let gene_index = gene_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        Ok(Self {
            values,
            gene_ids,
            patient_ids,
            gene_index,
        })
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of patients
    pub fn n_patients(&self) -> usize {
        self.values.ncols()
    }

    /// Get the values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Get gene IDs
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Get patient IDs
    pub fn patient_ids(&self) -> &[String] {
        &self.patient_ids
    }

    /// Get gene index by ID
    pub fn gene_index(&self, gene_id: &str) -> Option<usize> {
        self.gene_index.get(gene_id).copied()
    }

    /// Get expression for a specific gene
    pub fn gene_row(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }

    /// Get expression for a gene by ID
    pub fn gene(&self, gene_id: &str) -> Option<ArrayView1<'_, f64>> {
        self.gene_index(gene_id).map(|i| self.values.row(i))
    }

    /// Subset to specific genes, preserving the given order
    pub fn subset_genes(&self, gene_indices: &[usize]) -> Result<Self> {
        let new_values = self.values.select(Axis(0), gene_indices);
        let new_gene_ids: Vec<String> = gene_indices
            .iter()
            .map(|&i| self.gene_ids[i].clone())
            .collect();

        Self::new(new_values, new_gene_ids, self.patient_ids.clone())
    }

    /// Row-wise z-scaling: subtract the gene mean, divide by the sample SD (n - 1)
    ///
    /// Fails if a row has zero or undefined standard deviation, which the SD
    /// filter rules out for prepared matrices.
    pub fn z_scaled(&self) -> Result<Self> {
        let mut scaled = self.values.clone();

        for (i, mut row) in scaled.axis_iter_mut(Axis(0)).enumerate() {
            let values = row.to_vec();
            let mu = mean(&values);
            let sd = sample_sd(&values);
            if !(sd > 0.0) {
                return Err(SubtypeError::InvalidMatrix {
                    reason: format!(
                        "Cannot z-scale gene '{}': standard deviation is {}",
                        self.gene_ids[i], sd
                    ),
                });
            }
            row.mapv_inplace(|x| (x - mu) / sd);
        }

        Self::new(scaled, self.gene_ids.clone(), self.patient_ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_expression_matrix_creation() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let matrix = ExpressionMatrix::new(values, ids("G", 2), ids("P", 3)).unwrap();
        assert_eq!(matrix.n_genes(), 2);
        assert_eq!(matrix.n_patients(), 3);
        assert_eq!(matrix.gene_index("G2"), Some(1));
        assert_eq!(matrix.gene("G1").unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_duplicate_gene_rejected() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let genes = vec!["TP53".to_string(), "TP53".to_string()];
        let result = ExpressionMatrix::new(values, genes, ids("P", 2));
        assert!(matches!(result, Err(SubtypeError::DuplicateGene { gene }) if gene == "TP53"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let values = array![[1.0, f64::NAN]];
        assert!(ExpressionMatrix::new(values, ids("G", 1), ids("P", 2)).is_err());
    }

    #[test]
    fn test_z_scaled_mean_zero_sd_one() {
        let values = array![
            [1.0, 2.0, 3.0, 4.0, 10.0],
            [5.5, 3.2, 8.1, 0.4, 2.2],
        ];
        let matrix = ExpressionMatrix::new(values, ids("G", 2), ids("P", 5)).unwrap();
        let scaled = matrix.z_scaled().unwrap();

        assert_eq!(scaled.gene_ids(), matrix.gene_ids());
        assert_eq!(scaled.patient_ids(), matrix.patient_ids());
        for row in scaled.values().axis_iter(Axis(0)) {
            let v = row.to_vec();
            assert!(mean(&v).abs() < 1e-12);
            assert!((sample_sd(&v) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_z_scaled_constant_row_fails() {
        let values = array![[2.0, 2.0, 2.0]];
        let matrix = ExpressionMatrix::new(values, ids("G", 1), ids("P", 3)).unwrap();
        assert!(matrix.z_scaled().is_err());
    }

    #[test]
    fn test_subset_genes() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let matrix = ExpressionMatrix::new(values, ids("G", 3), ids("P", 3)).unwrap();
        let sub = matrix.subset_genes(&[2, 0]).unwrap();
        assert_eq!(sub.gene_ids(), &["G3".to_string(), "G1".to_string()]);
        assert_eq!(sub.gene_index("G1"), Some(1));
        assert_eq!(sub.gene_row(0).to_vec(), vec![7.0, 8.0, 9.0]);
    }
}
