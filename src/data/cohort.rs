//! Aligned cohort: both expression views and the mutation matrix on one patient axis

use super::{ExpressionMatrix, MutationMatrix};
use crate::error::{Result, SubtypeError};

/// The frozen inputs shared by precomputation and lookup
///
/// Invariants checked on construction:
/// - raw and scaled expression share gene and patient keys in the same order
/// - mutation rows equal the expression columns element for element
/// - the patient axis is strictly ascending (lexicographic)
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCohort {
    raw: ExpressionMatrix,
    scaled: ExpressionMatrix,
    mutations: MutationMatrix,
}

impl AlignedCohort {
    pub fn new(raw: ExpressionMatrix, scaled: ExpressionMatrix, mutations: MutationMatrix) -> Result<Self> {
        if raw.gene_ids() != scaled.gene_ids() {
            return Err(SubtypeError::InvalidMatrix {
                reason: "Raw and scaled expression have different gene rows".to_string(),
            });
        }

        if raw.patient_ids() != scaled.patient_ids() {
            return Err(SubtypeError::PatientAxisMismatch {
                reason: "Raw and scaled expression have different patient columns".to_string(),
            });
        }

        check_patient_axis(raw.patient_ids(), mutations.patient_ids())?;

        if raw.n_patients() == 0 {
            return Err(SubtypeError::EmptyData {
                reason: "Patient axis is empty".to_string(),
            });
        }

        if let Some(w) = raw.patient_ids().windows(2).find(|w| w[0] >= w[1]) {
            return Err(SubtypeError::PatientAxisMismatch {
                reason: format!(
                    "Patient axis is not in ascending order: '{}' precedes '{}'",
                    w[0], w[1]
                ),
            });
        }

        Ok(Self {
            raw,
            scaled,
            mutations,
        })
    }

    /// Raw log-scale expression
    pub fn raw(&self) -> &ExpressionMatrix {
        &self.raw
    }

    /// Row-wise z-scaled expression
    pub fn scaled(&self) -> &ExpressionMatrix {
        &self.scaled
    }

    /// Patient x subtype calls
    pub fn mutations(&self) -> &MutationMatrix {
        &self.mutations
    }

    /// The shared patient axis
    pub fn patient_ids(&self) -> &[String] {
        self.raw.patient_ids()
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.raw.n_genes()
    }

    /// Get the number of patients
    pub fn n_patients(&self) -> usize {
        self.raw.n_patients()
    }
}

/// Require the expression column keys and mutation row keys to be identical sequences
pub fn check_patient_axis(expression: &[String], mutations: &[String]) -> Result<()> {
    if expression.len() != mutations.len() {
        return Err(SubtypeError::PatientAxisMismatch {
            reason: format!(
                "expression has {} patients, mutation matrix has {}",
                expression.len(),
                mutations.len()
            ),
        });
    }

    if let Some((i, (a, b))) = expression
        .iter()
        .zip(mutations.iter())
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(SubtypeError::PatientAxisMismatch {
            reason: format!(
                "position {}: expression has '{}', mutation matrix has '{}'",
                i, a, b
            ),
        });
    }

    Ok(())
}
