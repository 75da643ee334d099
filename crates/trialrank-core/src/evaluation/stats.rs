//! Significance testing for comparing two runs over the same topics.
//!
//! - Bootstrap confidence intervals for a mean score
//! - Paired t-test on per-topic differences
//! - Cohen's d effect size
//! - [`compare_runs`], which pairs per-topic nDCG by topic id
//!
//! # References
//!
//! - Efron & Tibshirani (1993). "An Introduction to the Bootstrap"
//! - Smucker et al. (2007). "A comparison of statistical significance tests for IR evaluation"

use crate::search::TopicId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean with a 95% bootstrap confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapResult {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl BootstrapResult {
    /// Renders as `mean [lower, upper]` with `precision` decimals.
    pub fn format(&self, precision: usize) -> String {
        format!(
            "{:.p$} [{:.p$}, {:.p$}]",
            self.mean,
            self.lower,
            self.upper,
            p = precision
        )
    }
}

/// 95% bootstrap confidence interval for the mean of `values`.
///
/// Draws `n_bootstrap` resamples with replacement using a seeded LCG, so
/// the interval is reproducible for a given `seed`. The bounds are the 2.5th
/// and 97.5th percentiles of the resample means.
///
/// All fields are NaN when `values` is empty.
///
/// # Example
///
/// ```
/// use trialrank_core::evaluation::bootstrap_ci;
///
/// let ndcg = [0.62, 0.71, 0.55, 0.80, 0.67];
/// let ci = bootstrap_ci(&ndcg, 1000, 7);
/// assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
/// ```
pub fn bootstrap_ci(values: &[f64], n_bootstrap: usize, seed: u64) -> BootstrapResult {
    if values.is_empty() || n_bootstrap == 0 {
        let mean = if values.is_empty() {
            f64::NAN
        } else {
            mean_of(values)
        };
        return BootstrapResult {
            mean,
            lower: mean,
            upper: mean,
        };
    }

    let n = values.len();
    let mut rng = LcgRng::new(seed);
    let mut resample_means: Vec<f64> = (0..n_bootstrap)
        .map(|_| (0..n).map(|_| values[rng.next_index(n)]).sum::<f64>() / n as f64)
        .collect();
    resample_means.sort_by(f64::total_cmp);

    let last = resample_means.len() - 1;
    let percentile = |q: f64| resample_means[((n_bootstrap as f64 * q) as usize).min(last)];

    BootstrapResult {
        mean: mean_of(values),
        lower: percentile(0.025),
        upper: percentile(0.975),
    }
}

/// Outcome of a paired t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    /// Positive when the first system scores higher on average
    pub t_statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Degrees of freedom (pairs - 1)
    pub df: usize,
}

impl TTestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// Renders as `t(df)=x, p=y` with a `*` at the 0.05 level.
    pub fn format(&self) -> String {
        format!(
            "t({})={:.3}, p={:.4}{}",
            self.df,
            self.t_statistic,
            self.p_value,
            if self.is_significant(0.05) { "*" } else { "" }
        )
    }
}

/// Paired t-test of `system_a` against `system_b`.
///
/// Element `i` of both slices must belong to the same topic.
///
/// # Panics
///
/// Panics if the slices differ in length or hold fewer than two pairs.
pub fn paired_ttest(system_a: &[f64], system_b: &[f64]) -> TTestResult {
    assert_eq!(
        system_a.len(),
        system_b.len(),
        "paired t-test needs one score per topic from each system"
    );
    assert!(system_a.len() >= 2, "paired t-test needs at least two pairs");

    let n = system_a.len();
    let df = n - 1;
    let diffs: Vec<f64> = system_a.iter().zip(system_b).map(|(a, b)| a - b).collect();

    let mean_diff = mean_of(&diffs);
    let variance = diffs.iter().map(|d| (d - mean_diff).powi(2)).sum::<f64>() / df as f64;
    let std_error = variance.sqrt() / (n as f64).sqrt();

    let t = if std_error > 0.0 {
        mean_diff / std_error
    } else {
        0.0
    };

    TTestResult {
        t_statistic: t,
        p_value: two_tailed_p(t.abs(), df),
        df,
    }
}

/// Cohen's d with pooled standard deviation; positive when `group_a` is higher.
///
/// Returns 0.0 when either group has fewer than two values or the pooled
/// deviation is 0.
pub fn cohens_d(group_a: &[f64], group_b: &[f64]) -> f64 {
    let (n_a, n_b) = (group_a.len(), group_b.len());
    if n_a < 2 || n_b < 2 {
        return 0.0;
    }

    let (mean_a, mean_b) = (mean_of(group_a), mean_of(group_b));
    let sum_sq = |values: &[f64], mean: f64| values.iter().map(|x| (x - mean).powi(2)).sum::<f64>();

    let pooled_var = (sum_sq(group_a, mean_a) + sum_sq(group_b, mean_b)) / (n_a + n_b - 2) as f64;
    let pooled_std = pooled_var.sqrt();

    if pooled_std == 0.0 {
        0.0
    } else {
        (mean_a - mean_b) / pooled_std
    }
}

/// Cohen's conventional label for `|d|`.
pub fn interpret_cohens_d(d: f64) -> &'static str {
    match d.abs() {
        x if x < 0.2 => "negligible",
        x if x < 0.5 => "small",
        x if x < 0.8 => "medium",
        _ => "large",
    }
}

// ============================================================================
// Run comparison
// ============================================================================

/// Seed for the bootstrap intervals in [`compare_runs`].
pub const COMPARISON_SEED: u64 = 42;

/// Resamples drawn for each interval in [`compare_runs`].
pub const COMPARISON_RESAMPLES: usize = 1000;

/// Per-topic nDCG comparison of a system run against a baseline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunComparison {
    /// Topics scored by both runs
    pub topics: usize,
    pub system: BootstrapResult,
    pub baseline: BootstrapResult,
    pub ttest: TTestResult,
    pub effect_size: f64,
    pub effect: &'static str,
}

/// Compares two runs on the topics they share.
///
/// Topics present in only one map are ignored. Returns `None` when fewer
/// than two topics are shared.
pub fn compare_runs(
    system: &BTreeMap<TopicId, f64>,
    baseline: &BTreeMap<TopicId, f64>,
) -> Option<RunComparison> {
    let (a, b): (Vec<f64>, Vec<f64>) = system
        .iter()
        .filter_map(|(topic, &score)| baseline.get(topic).map(|&base| (score, base)))
        .unzip();

    if a.len() < 2 {
        return None;
    }

    let effect_size = cohens_d(&a, &b);
    Some(RunComparison {
        topics: a.len(),
        system: bootstrap_ci(&a, COMPARISON_RESAMPLES, COMPARISON_SEED),
        baseline: bootstrap_ci(&b, COMPARISON_RESAMPLES, COMPARISON_SEED),
        ttest: paired_ttest(&a, &b),
        effect_size,
        effect: interpret_cohens_d(effect_size),
    })
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================================================
// Internal: LCG
// ============================================================================

/// 64-bit linear congruential generator (Knuth MMIX constants).
struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_index(&mut self, len: usize) -> usize {
        // High bits have the longest period
        ((self.next_u64() >> 33) as usize) % len
    }
}

// ============================================================================
// Internal: Student's t distribution
// ============================================================================

/// Two-tailed p-value of `|t|` with `df` degrees of freedom.
///
/// `p = I_x(df/2, 1/2)` with `x = df / (df + t²)`; normal approximation
/// above 100 degrees of freedom.
fn two_tailed_p(t_abs: f64, df: usize) -> f64 {
    if df > 100 {
        return 2.0 * (1.0 - normal_cdf(t_abs));
    }
    let df = df as f64;
    regularized_beta(df / 2.0, 0.5, df / (df + t_abs * t_abs))
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    const A: [f64; 5] = [
        0.254829592,
        -0.284496736,
        1.421413741,
        -1.453152027,
        1.061405429,
    ];
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x.abs());
    let poly = A.iter().rev().fold(0.0, |acc, &a| acc * t + a) * t;
    let y = 1.0 - poly * (-x * x).exp();
    y.copysign(x)
}

/// Regularized incomplete beta `I_x(a, b)` via Lentz's continued fraction.
fn regularized_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-12;
    const TINY: f64 = 1e-30;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((a - 1.0 + m2) * (a + m2));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + m2) * (a + 1.0 + m2));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Lanczos approximation of `ln Γ(x)` for `x > 0`.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let series = COEFFS
        .iter()
        .enumerate()
        .fold(1.000000000190015, |acc, (i, &c)| acc + c / (x + 1.0 + i as f64));

    -tmp + (2.5066282746310005 * series / x).ln()
}
