//! Binary mutation matrix (patients x subtype genes)

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::expression::first_duplicate;
use crate::error::{Result, SubtypeError};

/// Number and fraction of mutated patients for one subtype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrevalenceSummary {
    pub subtype: String,
    pub n_mutated: usize,
    pub fraction: f64,
}

/// Mutation calls on the shared patient axis
/// Rows are patients, columns are subtypes; every value is 0 or 1
#[derive(Debug, Clone, PartialEq)]
pub struct MutationMatrix {
    /// 0/1 calls (patients x subtypes)
    calls: Array2<u8>,
    /// Patient identifiers (row keys)
    patient_ids: Vec<String>,
    /// Subtype gene symbols (column keys)
    subtypes: Vec<String>,
}

impl MutationMatrix {
    /// Create a new mutation matrix
    pub fn new(calls: Array2<u8>, patient_ids: Vec<String>, subtypes: Vec<String>) -> Result<Self> {
        let (n_patients, n_subtypes) = calls.dim();

        if patient_ids.len() != n_patients {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} patient IDs", n_patients),
                got: format!("{} patient IDs", patient_ids.len()),
            });
        }

        if subtypes.len() != n_subtypes {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} subtypes", n_subtypes),
                got: format!("{} subtypes", subtypes.len()),
            });
        }

        if calls.iter().any(|&v| v > 1) {
            return Err(SubtypeError::InvalidMatrix {
                reason: "Mutation calls must be 0 or 1".to_string(),
            });
        }

        if let Some(patient) = first_duplicate(&patient_ids) {
            return Err(SubtypeError::InvalidMatrix {
                reason: format!("Duplicate patient ID '{}' in mutation matrix", patient),
            });
        }

        if let Some(subtype) = first_duplicate(&subtypes) {
            return Err(SubtypeError::InvalidMatrix {
                reason: format!("Duplicate subtype '{}' in mutation matrix", subtype),
            });
        }

        Ok(Self {
            calls,
            patient_ids,
            subtypes,
        })
    }

    /// Get the number of patients
    pub fn n_patients(&self) -> usize {
        self.calls.nrows()
    }

    /// Get the number of subtypes
    pub fn n_subtypes(&self) -> usize {
        self.calls.ncols()
    }

    /// Get patient IDs
    pub fn patient_ids(&self) -> &[String] {
        &self.patient_ids
    }

    /// Get subtype names in column order
    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    /// Calls for one subtype across all patients
    pub fn subtype_column(&self, subtype_idx: usize) -> ArrayView1<'_, u8> {
        self.calls.column(subtype_idx)
    }

    /// Calls for one patient across all subtypes
    pub fn patient_row(&self, patient_idx: usize) -> ArrayView1<'_, u8> {
        self.calls.row(patient_idx)
    }

    /// Patients mutated per subtype, in column order
    pub fn prevalence(&self) -> Vec<PrevalenceSummary> {
        let n = self.n_patients().max(1) as f64;
        self.calls
            .axis_iter(Axis(1))
            .zip(self.subtypes.iter())
            .map(|(col, subtype)| {
                let n_mutated = col.iter().filter(|&&v| v == 1).count();
                PrevalenceSummary {
                    subtype: subtype.clone(),
                    n_mutated,
                    fraction: n_mutated as f64 / n,
                }
            })
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix() -> MutationMatrix {
        MutationMatrix::new(
            array![[1, 0], [0, 0], [1, 1], [0, 1]],
            vec!["P1".into(), "P2".into(), "P3".into(), "P4".into()],
            vec!["FLT3".into(), "NPM1".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_prevalence() {
        let prev = matrix().prevalence();
        assert_eq!(prev[0].subtype, "FLT3");
        assert_eq!(prev[0].n_mutated, 2);
        assert!((prev[1].fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_binary_rejected() {
        let result = MutationMatrix::new(
            array![[2u8]],
            vec!["P1".into()],
            vec!["FLT3".into()],
        );
        assert!(result.is_err());
    }
}
