//! Statistical utility functions shared across modules
//!
//! Row summaries used by the gene filters and z-scaling, average ranking
//! used by the rank-sum test, and significant-figure rounding for display.

/// Arithmetic mean; NaN for an empty slice
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Sample standard deviation (denominator n - 1); NaN when n < 2
pub fn sample_sd(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(x);
    let ss: f64 = x.iter().map(|&v| (v - m).powi(2)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Median; NaN for an empty slice
pub fn median(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Average ranks (1-based) of `x`, plus the sizes of every tie group
///
/// Tied values share the mean of the ranks they would occupy. The tie group
/// sizes feed the variance correction of the rank-sum test.
pub fn average_ranks(x: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = x.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let mut ranks = vec![0.0; n];
    let mut ties = Vec::new();

    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && x[order[j]] == x[order[i]] {
            j += 1;
        }
        // positions i..j hold ranks i+1..=j
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        if j - i > 1 {
            ties.push(j - i);
        }
        i = j;
    }

    (ranks, ties)
}

/// Round to `digits` significant figures
pub fn signif(x: f64, digits: u32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits as i32 - 1 - magnitude);
    (x * factor).round() / factor
}

/// Format a p-value rounded to two significant figures
///
/// Values below 1e-4 use scientific notation.
pub fn format_pvalue(p: f64) -> String {
    let rounded = signif(p, 2);
    if rounded != 0.0 && rounded.abs() < 1e-4 {
        format!("{:.1e}", rounded)
    } else {
        // shortest representation of the already rounded value
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sd() {
        let x = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population sd is 2.0; sample sd = sqrt(32 / 7)
        assert!((sample_sd(&x) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_sd(&[1.0]).is_nan());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let (ranks, ties) = average_ranks(&[10.0, 20.0, 10.0, 30.0, 20.0, 20.0]);
        assert_eq!(ranks, vec![1.5, 4.0, 1.5, 6.0, 4.0, 4.0]);
        assert_eq!(ties, vec![2, 3]);
    }

    #[test]
    fn test_average_ranks_no_ties() {
        let (ranks, ties) = average_ranks(&[3.0, 1.0, 2.0]);
        assert_eq!(ranks, vec![3.0, 1.0, 2.0]);
        assert!(ties.is_empty());
    }

    #[test]
    fn test_signif() {
        assert!((signif(0.012345, 2) - 0.012).abs() < 1e-15);
        assert!((signif(0.04953, 2) - 0.05).abs() < 1e-15);
        assert!((signif(123.0, 2) - 120.0).abs() < 1e-9);
        assert_eq!(signif(0.0, 2), 0.0);
    }

    #[test]
    fn test_format_pvalue() {
        assert_eq!(format_pvalue(0.0012345), "0.0012");
        assert_eq!(format_pvalue(1.0), "1");
        assert_eq!(format_pvalue(0.000012345), "1.2e-5");
    }
}
