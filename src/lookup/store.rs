//! Loaded data directory serving gene queries

use std::path::Path;

use log::info;

use super::boxplot::{boxplot_bundle, BoxplotResult};
use super::heatmap::{heatmap_bundle, HeatmapBundle};
use super::index::AutocompleteIndex;
use crate::data::AlignedCohort;
use crate::error::{Result, SubtypeError};
use crate::io::{check_stat_source, read_cohort, read_gene_list, read_stat_table, GENES_FILE, STAT_RESULTS_FILE};
use crate::results::StatTable;

/// Read-only view over the aligned cohort and its precomputed table
///
/// Queries never recompute a test; they slice the cohort and read the table.
#[derive(Debug, Clone)]
pub struct CohortStore {
    cohort: AlignedCohort,
    table: StatTable,
    index: AutocompleteIndex,
}

impl CohortStore {
    /// Pair a cohort with its table; the table must cover every expression gene
    pub fn new(cohort: AlignedCohort, table: StatTable) -> Result<Self> {
        table.check_complete(cohort.raw().gene_ids(), cohort.mutations().subtypes())?;
        let index = AutocompleteIndex::new(cohort.raw().gene_ids().to_vec());
        Ok(Self { cohort, table, index })
    }

    /// Load a data directory written by the prepare and precompute stages
    ///
    /// Fails with `StaleTable` if the expression or mutation table changed
    /// after the stat table was computed.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let cohort = read_cohort(dir)?;
        check_stat_source(dir)?;
        let table = read_stat_table(dir.join(STAT_RESULTS_FILE))?;

        let genes = read_gene_list(dir.join(GENES_FILE))?;
        if genes != cohort.raw().gene_ids() {
            return Err(SubtypeError::IncompleteTable {
                reason: format!("{} does not match the expression row keys", GENES_FILE),
            });
        }

        let store = Self::new(cohort, table)?;
        info!(
            "Loaded {} genes x {} patients x {} subtypes from {}",
            store.cohort.n_genes(),
            store.cohort.n_patients(),
            store.table.n_subtypes(),
            dir.display()
        );
        Ok(store)
    }

    pub fn cohort(&self) -> &AlignedCohort {
        &self.cohort
    }

    pub fn table(&self) -> &StatTable {
        &self.table
    }

    pub fn index(&self) -> &AutocompleteIndex {
        &self.index
    }

    /// Heatmap bundle for a user-supplied gene
    pub fn heatmap(&self, gene: &str) -> Result<HeatmapBundle> {
        let gene = self.index.validate(gene)?;
        heatmap_bundle(&self.cohort, &self.table, gene)
    }

    /// Boxplot bundle for a user-supplied gene
    pub fn boxplot(&self, gene: &str) -> Result<BoxplotResult> {
        let gene = self.index.validate(gene)?;
        boxplot_bundle(&self.cohort, &self.table, gene)
    }

    /// Autocomplete list in expression row order
    pub fn genes(&self) -> &[String] {
        self.index.genes()
    }

    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<&str> {
        self.index.suggest(prefix, limit)
    }
}
