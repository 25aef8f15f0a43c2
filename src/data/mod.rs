//! Data structures for the aligned cohort

mod cohort;
mod expression;
mod mutation;

pub use cohort::{check_patient_axis, AlignedCohort};
pub use expression::ExpressionMatrix;
pub use mutation::{MutationMatrix, PrevalenceSummary};
