//! Error types for aml_subtypes

use thiserror::Error;

/// Main error type for alignment, testing and lookup
#[derive(Error, Debug)]
pub enum SubtypeError {
    #[error("Invalid matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Patient axis mismatch: {reason}")]
    PatientAxisMismatch { reason: String },

    #[error("Duplicate gene key after filtering: {gene}")]
    DuplicateGene { gene: String },

    #[error("Incomplete stat table: {reason}")]
    IncompleteTable { reason: String },

    #[error("Stale stat table: {reason}")]
    StaleTable { reason: String },

    #[error("Degenerate groups for subtype {subtype}: {mutated} mutated, {unmutated} unmutated")]
    DegenerateGroup {
        subtype: String,
        mutated: usize,
        unmutated: usize,
    },

    #[error("Unknown gene '{gene}': not in the autocomplete list")]
    UnknownGene { gene: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    RegexError(#[from] regex::Error),
}

impl SubtypeError {
    /// True for violations of the offline data contract, which abort a build
    pub fn is_data_contract(&self) -> bool {
        matches!(
            self,
            SubtypeError::PatientAxisMismatch { .. }
                | SubtypeError::DuplicateGene { .. }
                | SubtypeError::IncompleteTable { .. }
                | SubtypeError::StaleTable { .. }
                | SubtypeError::DimensionMismatch { .. }
                | SubtypeError::InvalidMatrix { .. }
                | SubtypeError::EmptyData { .. }
        )
    }
}

/// Result type alias for aml_subtypes operations
pub type Result<T> = std::result::Result<T, SubtypeError>;
