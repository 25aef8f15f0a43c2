//! Statistical testing of expression between mutated and unmutated patients

mod fdr;
mod rank_sum;
mod significance;

pub use fdr::benjamini_hochberg;
pub use rank_sum::{partition, rank_sum_test, test_gene, Direction, RankSumTest};
pub use significance::{display_padj, Significance};
