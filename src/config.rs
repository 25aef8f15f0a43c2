//! Configuration for the offline preparation step
//!
//! Every filter constant lives here under a name, so the reason a gene or
//! subtype was excluded can be traced back to a single value.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtypeError};

/// Filter thresholds and input column names used by `prepare`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Detection threshold on the raw log2 scale (strictly exceeded)
    pub min_expression: f64,
    /// Fraction of patients that must exceed `min_expression` (strictly exceeded)
    pub min_expressed_fraction: f64,
    /// Minimum across-patient sample standard deviation (strictly exceeded)
    pub min_sd: f64,
    /// Minimum fraction of the cohort carrying a mutation for a subtype to be kept
    pub min_subtype_fraction: f64,
    /// Calls with a variant allele fraction below this do not qualify
    pub min_vaf: f64,
    /// Biotype value marking protein-coding genes
    pub protein_coding_biotype: String,

    pub symbol_column: String,
    pub biotype_column: String,

    pub sample_column: String,
    pub gene_column: String,
    pub vaf_column: String,

    pub patient_column: String,
    pub rna_sample_column: String,
    pub dna_sample_column: String,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            min_expression: 1.0,
            min_expressed_fraction: 0.25,
            min_sd: 0.5,
            min_subtype_fraction: 0.03,
            min_vaf: 0.0,
            protein_coding_biotype: "protein_coding".to_string(),
            symbol_column: "symbol".to_string(),
            biotype_column: "biotype".to_string(),
            sample_column: "sample_id".to_string(),
            gene_column: "symbol".to_string(),
            vaf_column: "t_vaf".to_string(),
            patient_column: "patient_id".to_string(),
            rna_sample_column: "rna_sample_id".to_string(),
            dna_sample_column: "dna_sample_id".to_string(),
        }
    }
}

impl PrepConfig {
    /// Load a configuration from JSON; absent keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: PrepConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is in its valid range
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("min_expressed_fraction", self.min_expressed_fraction),
            ("min_subtype_fraction", self.min_subtype_fraction),
            ("min_vaf", self.min_vaf),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(SubtypeError::InvalidConfig {
                    reason: format!("{} must be in [0, 1], got {}", name, value),
                });
            }
        }

        if !self.min_sd.is_finite() || self.min_sd < 0.0 {
            return Err(SubtypeError::InvalidConfig {
                reason: format!("min_sd must be a non-negative finite value, got {}", self.min_sd),
            });
        }

        if !self.min_expression.is_finite() {
            return Err(SubtypeError::InvalidConfig {
                reason: format!("min_expression must be finite, got {}", self.min_expression),
            });
        }

        Ok(())
    }

    /// Minimum number of mutated patients for a subtype in a cohort of `n_patients`
    pub fn min_subtype_patients(&self, n_patients: usize) -> usize {
        (self.min_subtype_fraction * n_patients as f64).ceil() as usize
    }
}
