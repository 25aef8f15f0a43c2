//! aml_subtypes: gene expression by genetic subtype in AML cohorts
//!
//! Offline, raw expression and mutation tables are aligned on one patient axis
//! and every gene is tested against every recurrent mutation (Wilcoxon
//! rank-sum, Benjamini-Hochberg within each gene). Online, a loaded data
//! directory answers heatmap and boxplot queries for a single gene.
//!
//! # Example
//!
//! ```ignore
//! use aml_subtypes::prelude::*;
//!
//! // Offline
//! let config = PrepConfig::default();
//! build("expression.tsv", "mutations.tsv", "mapping.tsv", "data/", &config)?;
//!
//! // Online
//! let store = CohortStore::load("data/")?;
//! let heatmap = store.heatmap("MEIS1")?;
//! let boxplot = store.boxplot("MEIS1")?;
//! ```

pub mod align;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod io;
pub mod lookup;
pub mod results;
pub mod stats;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::align::{align_cohort, prepare_from_files, PreparedCohort};
    pub use crate::config::PrepConfig;
    pub use crate::data::{AlignedCohort, ExpressionMatrix, MutationMatrix, PrevalenceSummary};
    pub use crate::error::{Result, SubtypeError};
    pub use crate::filter::FilterReport;
    pub use crate::io::{read_cohort, read_stat_table, write_cohort, write_stat_results, STAT_RESULTS_FILE};
    pub use crate::lookup::{AutocompleteIndex, BoxplotResult, CohortStore, HeatmapBundle};
    pub use crate::results::{build_stat_table, StatCell, StatTable};
    pub use crate::testing::{benjamini_hochberg, rank_sum_test, Significance};
    pub use crate::{build, precompute, prepare};
}

use std::path::Path;

use log::info;

use prelude::*;

/// Align the raw inputs and write the aligned tables to `out_dir`
///
/// Any stat table left in `out_dir` is removed; run [`precompute`] again.
pub fn prepare<P: AsRef<Path>, Q: AsRef<Path>>(
    expression_path: P,
    mutations_path: P,
    mapping_path: P,
    out_dir: Q,
    config: &PrepConfig,
) -> Result<PreparedCohort> {
    let prepared = prepare_from_files(expression_path, mutations_path, mapping_path, config)?;
    info!("{}", prepared.report);
    for prevalence in prepared.cohort.mutations().prevalence() {
        info!(
            "  {}: {} patients ({:.1}%)",
            prevalence.subtype,
            prevalence.n_mutated,
            100.0 * prevalence.fraction
        );
    }
    write_cohort(out_dir, &prepared.cohort)?;
    Ok(prepared)
}

/// Compute the stat table for an aligned data directory and store it there
pub fn precompute<P: AsRef<Path>>(data_dir: P) -> Result<StatTable> {
    let data_dir = data_dir.as_ref();
    let cohort = read_cohort(data_dir)?;
    let table = build_stat_table(&cohort)?;
    write_stat_results(data_dir, &table)?;
    Ok(table)
}

/// Run preparation and precomputation in one pass
pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
    expression_path: P,
    mutations_path: P,
    mapping_path: P,
    out_dir: Q,
    config: &PrepConfig,
) -> Result<StatTable> {
    let out_dir = out_dir.as_ref();
    let prepared = prepare(expression_path, mutations_path, mapping_path, out_dir, config)?;
    let table = build_stat_table(&prepared.cohort)?;
    write_stat_results(out_dir, &table)?;
    Ok(table)
}
