//! Wilcoxon rank-sum (Mann-Whitney U) test for two independent groups
//!
//! Normal approximation with tie-corrected variance and no continuity
//! correction, two-sided. A zero variance (every value tied) yields p = 1.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::data::MutationMatrix;
use crate::error::{Result, SubtypeError};
use crate::stats::{average_ranks, median};

/// Which group has the higher median expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Unchanged,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Unchanged => "unchanged",
        })
    }
}

impl FromStr for Direction {
    type Err = SubtypeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "unchanged" => Ok(Direction::Unchanged),
            other => Err(SubtypeError::InvalidInput {
                reason: format!("Unknown direction '{}'", other),
            }),
        }
    }
}

/// Outcome of one rank-sum test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSumTest {
    /// U statistic of the mutated group
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
    pub n_mutated: usize,
    pub n_unmutated: usize,
    /// Mutated median relative to unmutated median
    pub direction: Direction,
}

/// Compare the expression of mutated and unmutated patients for one subtype
///
/// Fails with `DegenerateGroup` when either group is empty.
pub fn rank_sum_test(subtype: &str, mutated: &[f64], unmutated: &[f64]) -> Result<RankSumTest> {
    let n1 = mutated.len();
    let n2 = unmutated.len();
    if n1 == 0 || n2 == 0 {
        return Err(SubtypeError::DegenerateGroup {
            subtype: subtype.to_string(),
            mutated: n1,
            unmutated: n2,
        });
    }

    let n = n1 + n2;
    let mut pooled = Vec::with_capacity(n);
    pooled.extend_from_slice(mutated);
    pooled.extend_from_slice(unmutated);
    let (ranks, ties) = average_ranks(&pooled);

    let r1: f64 = ranks[..n1].iter().sum();
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let nf = n as f64;
    let u = r1 - n1f * (n1f + 1.0) / 2.0;

    // Var(U) = n1 n2 / 12 * ((n + 1) - sum(t^3 - t) / (n (n - 1)))
    let tie_term: f64 = ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance = if n > 1 {
        n1f * n2f / 12.0 * ((nf + 1.0) - tie_term / (nf * (nf - 1.0)))
    } else {
        0.0
    };

    let pvalue = if variance > 0.0 {
        let z = (u - n1f * n2f / 2.0) / variance.sqrt();
        // 2 * P(Z > |z|) = erfc(|z| / sqrt(2))
        erfc(z.abs() / std::f64::consts::SQRT_2).min(1.0)
    } else {
        1.0
    };

    let m1 = median(mutated);
    let m2 = median(unmutated);
    let direction = if m1 > m2 {
        Direction::Up
    } else if m1 < m2 {
        Direction::Down
    } else {
        Direction::Unchanged
    };

    Ok(RankSumTest {
        statistic: u,
        pvalue,
        n_mutated: n1,
        n_unmutated: n2,
        direction,
    })
}

/// Split one expression row into (mutated, unmutated) by a 0/1 column
pub fn partition(expression: ArrayView1<f64>, calls: ArrayView1<u8>) -> (Vec<f64>, Vec<f64>) {
    let mut mutated = Vec::new();
    let mut unmutated = Vec::new();
    for (&value, &call) in expression.iter().zip(calls.iter()) {
        if call == 1 {
            mutated.push(value);
        } else {
            unmutated.push(value);
        }
    }
    (mutated, unmutated)
}

/// Run one rank-sum test per subtype column for a single gene
///
/// `expression` must follow the mutation matrix's patient order. Cells are
/// independent: a degenerate subtype yields an `Err` in its own slot only.
pub fn test_gene(expression: ArrayView1<f64>, mutations: &MutationMatrix) -> Vec<Result<RankSumTest>> {
    mutations
        .subtypes()
        .iter()
        .enumerate()
        .map(|(j, subtype)| {
            let (mutated, unmutated) = partition(expression, mutations.subtype_column(j));
            rank_sum_test(subtype, &mutated, &unmutated)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_complete_separation_three_vs_three() {
        let result = rank_sum_test("S", &[5.0, 6.0, 7.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(result.statistic, 9.0);
        assert_eq!((result.n_mutated, result.n_unmutated), (3, 3));
        assert_eq!(result.direction, Direction::Up);
        // z = 4.5 / sqrt(5.25) = 1.963961
        assert!((result.pvalue - 0.049535).abs() < 1e-5, "p={}", result.pvalue);
        assert!(result.pvalue < 0.05);
    }

    #[test]
    fn test_separation_is_symmetric() {
        let up = rank_sum_test("S", &[5.0, 6.0, 7.0], &[1.0, 2.0, 3.0]).unwrap();
        let down = rank_sum_test("S", &[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0]).unwrap();
        assert!((up.pvalue - down.pvalue).abs() < 1e-15);
        assert_eq!(down.direction, Direction::Down);
        assert_eq!(down.statistic, 0.0);
    }

    #[test]
    fn test_all_tied_gives_one() {
        let result = rank_sum_test("S", &[4.0, 4.0, 4.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(result.pvalue, 1.0);
        assert_eq!(result.direction, Direction::Unchanged);
    }

    #[test]
    fn test_ties_reduce_variance() {
        // four tied 3s: Var(U) = 16/12 * (9 - 60/56) = 10.5714, z = 6 / sqrt(10.5714) = 1.8454
        let tied = rank_sum_test("S", &[3.0, 3.0, 4.0, 5.0], &[1.0, 2.0, 3.0, 3.0]).unwrap();
        assert_eq!(tied.statistic, 14.0);
        assert!((tied.pvalue - 0.064983).abs() < 1e-5, "p={}", tied.pvalue);

        // without the tie term Var(U) = 12 and p = 0.0833
        let untied_p = erfc(6.0 / 12.0_f64.sqrt() / std::f64::consts::SQRT_2);
        assert!((untied_p - 0.083265).abs() < 1e-5);
        assert!(tied.pvalue < untied_p - 0.01);
    }

    #[test]
    fn test_interleaved_groups_not_significant() {
        let result = rank_sum_test("S", &[1.0, 3.0, 5.0, 7.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!(result.pvalue > 0.5, "p={}", result.pvalue);
    }

    #[test]
    fn test_empty_group_is_typed_error() {
        let err = rank_sum_test("NPM1", &[], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SubtypeError::DegenerateGroup { ref subtype, mutated: 0, unmutated: 2 } if subtype == "NPM1"
        ));
    }

    #[test]
    fn test_gene_one_slot_per_subtype() {
        let mutations = MutationMatrix::new(
            array![[1, 0], [1, 0], [0, 0], [0, 0]],
            vec!["P1".into(), "P2".into(), "P3".into(), "P4".into()],
            vec!["FLT3".into(), "NEVER".into()],
        )
        .unwrap();
        let expression = array![9.0, 8.0, 1.0, 2.0];

        let results = test_gene(expression.view(), &mutations);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SubtypeError::DegenerateGroup { .. })));
    }
}
