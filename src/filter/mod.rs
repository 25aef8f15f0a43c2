//! Gene filtering applied during preparation

mod genes;
mod symbols;

pub use genes::{expressed_genes, filter_genes, variable_genes, FilterReport};
pub use symbols::SymbolFilter;
