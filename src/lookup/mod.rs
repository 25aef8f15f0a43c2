//! Interactive gene lookups over precomputed results

mod boxplot;
mod heatmap;
mod index;
mod store;

pub use boxplot::{boxplot_bundle, BoxplotBundle, BoxplotPanel, BoxplotRecord, BoxplotResult, MutationStatus};
pub use heatmap::{heatmap_bundle, track_label, HeatmapBundle, SubtypeTrack};
pub use index::{AutocompleteIndex, ValidatedGene};
pub use store::CohortStore;
