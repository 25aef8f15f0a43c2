//! P-value adjustment for multiple testing
//!
//! Benjamini-Hochberg over one family of tests. Here a family is one gene's
//! row of subtype tests; callers never pass p-values from more than one gene.

/// Apply Benjamini-Hochberg FDR correction to one family of p-values
///
/// `None` marks a test that was not computed. It keeps its slot, stays `None`
/// in the output and does not count towards the family size.
pub fn benjamini_hochberg(pvalues: &[Option<f64>]) -> Vec<Option<f64>> {
    let n = pvalues.len();
    let mut padj = vec![None; n];

    // Indices of computed p-values, sorted ascending
    let mut indices: Vec<usize> = (0..n)
        .filter(|&i| pvalues[i].map_or(false, |p| p.is_finite()))
        .collect();
    let m = indices.len();
    if m == 0 {
        return padj;
    }
    indices.sort_by(|&a, &b| {
        let pa = pvalues[a].unwrap_or(f64::NAN);
        let pb = pvalues[b].unwrap_or(f64::NAN);
        pa.total_cmp(&pb)
    });

    // Walk from the largest p-value down, keeping the running minimum
    let mut cummin = f64::INFINITY;
    for (rank0, &i) in indices.iter().enumerate().rev() {
        if let Some(p) = pvalues[i] {
            let rank = (rank0 + 1) as f64;
            let adj = (p * m as f64 / rank).min(1.0);
            cummin = cummin.min(adj);
            padj[i] = Some(cummin);
        }
    }

    padj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&p| Some(p)).collect()
    }

    #[test]
    fn test_bh_known_values() {
        // R: p.adjust(c(0.01, 0.04, 0.03, 0.02), "BH") = 0.04 0.04 0.04 0.04
        let padj = benjamini_hochberg(&some(&[0.01, 0.04, 0.03, 0.02]));
        for adj in padj {
            assert!((adj.unwrap() - 0.04).abs() < 1e-12);
        }

        // R: p.adjust(c(0.001, 0.01, 0.05, 0.5), "BH") = 0.004 0.02 0.0666667 0.5
        let padj = benjamini_hochberg(&some(&[0.001, 0.01, 0.05, 0.5]));
        let expected = [0.004, 0.02, 0.05 * 4.0 / 3.0, 0.5];
        for (adj, e) in padj.iter().zip(expected.iter()) {
            assert!((adj.unwrap() - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bh_never_decreases_and_keeps_rank_order() {
        let pvalues = some(&[0.2, 0.001, 0.03, 0.5, 0.04, 0.0001, 0.9]);
        let padj = benjamini_hochberg(&pvalues);

        for (p, adj) in pvalues.iter().zip(padj.iter()) {
            let (p, adj) = (p.unwrap(), adj.unwrap());
            assert!(adj >= p);
            assert!(adj <= 1.0);
        }

        let mut order: Vec<usize> = (0..pvalues.len()).collect();
        order.sort_by(|&a, &b| pvalues[a].unwrap().total_cmp(&pvalues[b].unwrap()));
        for w in order.windows(2) {
            assert!(padj[w[0]].unwrap() <= padj[w[1]].unwrap());
        }
    }

    #[test]
    fn test_bh_not_computed_slots() {
        let pvalues = vec![Some(0.01), None, Some(0.03), Some(0.02)];
        let padj = benjamini_hochberg(&pvalues);

        assert!(padj[1].is_none());
        // family size is 3, not 4
        assert!((padj[0].unwrap() - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_bh_single_and_empty() {
        assert_eq!(benjamini_hochberg(&[Some(0.2)]), vec![Some(0.2)]);
        assert!(benjamini_hochberg(&[]).is_empty());
        assert_eq!(benjamini_hochberg(&[None, None]), vec![None, None]);
    }
}
