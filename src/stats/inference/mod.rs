// Significance tests for correlation coefficients and regression slopes

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::collections::HashMap;

/// Two-sided p-value of a t statistic with `df` degrees of freedom
pub(crate) fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a standard normal statistic
pub(crate) fn normal_two_sided(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * dist.sf(z.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// p-value of a Pearson (or Spearman) coefficient from n pairs
///
/// Uses t = r·sqrt((n-2)/(1-r²)) with n-2 degrees of freedom.
pub(crate) fn pearson_pvalue(r: f64, n: usize) -> f64 {
    if n < 3 || r.is_nan() {
        return f64::NAN;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    student_t_two_sided(t, df)
}

/// Sums over tie groups: (Σt(t-1), Σt(t-1)(t-2), Σt(t-1)(2t+5))
fn tie_sums(values: &[f64]) -> (f64, f64, f64) {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for v in values {
        // -0.0 and 0.0 compare equal, so fold them together
        let key = if *v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() };
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .values()
        .filter(|&&t| t > 1)
        .fold((0.0, 0.0, 0.0), |(a, b, c), &t| {
            let t = t as f64;
            (
                a + t * (t - 1.0),
                b + t * (t - 1.0) * (t - 2.0),
                c + t * (t - 1.0) * (2.0 * t + 5.0),
            )
        })
}

/// Largest sample for which untied inputs use the exact null distribution
const KENDALL_EXACT_MAX_N: usize = 33;

/// Exact two-sided p-value of Kendall's tau for untied samples of size `n`
///
/// Under independence the number of discordant pairs follows the Mahonian
/// distribution (inversions of a random permutation); `c` is the smaller of
/// the discordant and concordant counts.
fn kendall_exact_pvalue(n: usize, c: usize) -> f64 {
    // prob[k] = P(a random permutation of j items has k inversions), truncated at c
    let mut prob = vec![0.0; c + 1];
    prob[0] = 1.0;
    for j in 2..=n {
        let mut next = vec![0.0; c + 1];
        for (k, slot) in next.iter_mut().enumerate() {
            let reach = k.min(j - 1);
            *slot = prob[k - reach..=k].iter().sum::<f64>() / j as f64;
        }
        prob = next;
    }
    (2.0 * prob.iter().sum::<f64>()).min(1.0)
}

/// Kendall tau-b with a two-sided p-value
///
/// Untied inputs with n <= 33 (or at most one discordant or concordant pair)
/// get the exact permutation p-value; otherwise the asymptotic normal
/// approximation with tie-corrected variance is used. Returns None when
/// either input is constant.
pub(crate) fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let mut concordant = 0.0;
    let mut discordant = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let s = (x[i] - x[j]).signum() * (y[i] - y[j]).signum();
            let tied = x[i] == x[j] || y[i] == y[j];
            if tied {
                continue;
            }
            if s > 0.0 {
                concordant += 1.0;
            } else if s < 0.0 {
                discordant += 1.0;
            }
        }
    }

    let nf = n as f64;
    let n0 = nf * (nf - 1.0) / 2.0;
    let (x_tie, x0, x1) = tie_sums(&x[..n]);
    let (y_tie, y0, y1) = tie_sums(&y[..n]);

    let denominator = ((n0 - x_tie / 2.0) * (n0 - y_tie / 2.0)).sqrt();
    if denominator <= 0.0 || denominator.is_nan() {
        return None;
    }
    let score = concordant - discordant;
    let tau = (score / denominator).clamp(-1.0, 1.0);

    if x_tie == 0.0 && y_tie == 0.0 {
        let fewer = concordant.min(discordant) as usize;
        if n <= KENDALL_EXACT_MAX_N || fewer <= 1 {
            return Some((tau, kendall_exact_pvalue(n, fewer)));
        }
    }

    let m = nf * (nf - 1.0);
    let mut variance = (m * (2.0 * nf + 5.0) - x1 - y1) / 18.0 + (2.0 * x_tie * y_tie) / m;
    if n > 2 {
        variance += x0 * y0 / (9.0 * m * (nf - 2.0));
    }
    let p_value = if variance > 0.0 {
        normal_two_sided(score / variance.sqrt())
    } else {
        f64::NAN
    };

    Some((tau, p_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_t_symmetry() {
        let p = student_t_two_sided(2.0, 10.0);
        assert!((p - student_t_two_sided(-2.0, 10.0)).abs() < 1e-12);
        // t(10) two-sided p for |t| = 2.228 is about 0.05
        assert!((student_t_two_sided(2.228, 10.0) - 0.05).abs() < 1e-3);
        assert!((student_t_two_sided(0.0, 5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_two_sided() {
        assert!((normal_two_sided(1.959964) - 0.05).abs() < 1e-5);
        assert!(normal_two_sided(f64::NAN).is_nan());
    }

    #[test]
    fn test_pearson_pvalue_edges() {
        assert_eq!(pearson_pvalue(1.0, 5), 0.0);
        assert!(pearson_pvalue(0.5, 2).is_nan());
        assert!((pearson_pvalue(0.0, 10) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kendall_perfect_agreement() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (tau, p) = kendall_tau_b(&x, &x).unwrap();
        assert!((tau - 1.0).abs() < 1e-12);
        assert!(p < 0.05);

        let reversed = [5.0, 4.0, 3.0, 2.0, 1.0];
        let (tau, _) = kendall_tau_b(&x, &reversed).unwrap();
        assert!((tau + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kendall_exact_small_samples() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        // perfect agreement: 2 / 5!
        let (_, p) = kendall_tau_b(&x, &x).unwrap();
        assert!((p - 2.0 / 120.0).abs() < 1e-12);

        // one swapped pair: 2 / 4!
        let (tau, p) = kendall_tau_b(&x, &[1.0, 2.0, 3.0, 5.0, 4.0]).unwrap();
        assert!((tau - 0.8).abs() < 1e-12);
        assert!((p - 1.0 / 12.0).abs() < 1e-12);

        // three discordant pairs among six: 49 of 720 permutations have <= 3 inversions
        let x6 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y6 = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let (_, p) = kendall_tau_b(&x6, &y6).unwrap();
        assert!((p - 0.1361111111111111).abs() < 1e-12);
    }

    #[test]
    fn test_kendall_exact_distribution_is_symmetric() {
        // 7 items, 21 pairs: c = 10 sits just below the centre
        assert!(kendall_exact_pvalue(7, 10) > 0.9);
        assert_eq!(kendall_exact_pvalue(4, 3), 1.0);
        assert_eq!(kendall_exact_pvalue(2, 0), 1.0);
    }

    #[test]
    fn test_kendall_large_untied_uses_normal_approximation() {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..40).map(|i| ((i * 17) % 40) as f64).collect();
        let (tau, p) = kendall_tau_b(&x, &y).unwrap();
        let z = tau * 780.0 / (40.0 * 39.0 * 85.0 / 18.0_f64).sqrt();
        assert!((p - normal_two_sided(z)).abs() < 1e-12);
    }

    #[test]
    fn test_kendall_with_ties() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let (tau, p) = kendall_tau_b(&x, &y).unwrap();
        // C = 5, D = 0, pairs untied in x = 5, in y = 6
        assert!((tau - 5.0 / 30.0_f64.sqrt()).abs() < 1e-12);
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn test_kendall_constant() {
        assert!(kendall_tau_b(&[1.0, 2.0, 3.0], &[7.0, 7.0, 7.0]).is_none());
    }
}
