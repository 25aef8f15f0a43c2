//! Precomputed gene x subtype results

mod builder;
mod table;

pub use builder::{build_stat_table, gene_row};
pub use table::{StatCell, StatTable, TableSummary};
