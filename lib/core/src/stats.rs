//! Descriptive and robust per-feature statistics
//!
//! All statistics are computed once when profiles are built and persisted
//! alongside them; nothing here runs per request.

use serde::{Deserialize, Serialize};

/// IQR multiplier used when clipping a path's member values before the
/// clipped mean/std are computed.
pub const CLIP_IQR_FACTOR: f64 = 3.0;

/// IQR multiplier for the category-wide outlier fences applied to queries.
pub const FENCE_IQR_FACTOR: f64 = 1.5;

/// Distribution summary of one feature over a group of applicants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    /// Mean after clipping at `q25 - 3·IQR` / `q75 + 3·IQR`
    pub clipped_mean: f64,
    /// Sample std-dev after the same clipping
    pub clipped_std: f64,
}

impl FeatureStats {
    /// Summarize a set of values. Non-finite values are ignored.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::empty();
        }
        sorted.sort_by(f64::total_cmp);

        let q25 = quantile_sorted(&sorted, 0.25);
        let q75 = quantile_sorted(&sorted, 0.75);
        let iqr = q75 - q25;
        let clipped: Vec<f64> = if iqr > 0.0 {
            let lo = q25 - CLIP_IQR_FACTOR * iqr;
            let hi = q75 + CLIP_IQR_FACTOR * iqr;
            sorted.iter().map(|v| v.clamp(lo, hi)).collect()
        } else {
            sorted.clone()
        };

        Self {
            mean: mean(&sorted),
            std: sample_std(&sorted),
            median: quantile_sorted(&sorted, 0.5),
            q25,
            q75,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            count: sorted.len(),
            clipped_mean: mean(&clipped),
            clipped_std: sample_std(&clipped),
        }
    }

    /// Statistics for a feature with no observations
    pub fn empty() -> Self {
        Self {
            mean: 0.0,
            std: 0.0,
            median: 0.0,
            q25: 0.0,
            q75: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
            clipped_mean: 0.0,
            clipped_std: 0.0,
        }
    }

    #[inline]
    pub fn iqr(&self) -> f64 {
        self.q75 - self.q25
    }

    pub fn is_finite(&self) -> bool {
        [
            self.mean,
            self.std,
            self.median,
            self.q25,
            self.q75,
            self.min,
            self.max,
            self.clipped_mean,
            self.clipped_std,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Category-wide statistics of one feature, used to fill and clip queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RobustStats {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub iqr: f64,
    /// `q25 - 1.5·IQR`
    pub lower_fence: f64,
    /// `q75 + 1.5·IQR`
    pub upper_fence: f64,
    /// Mean of values winsorized to the 5th/95th percentiles
    pub robust_mean: f64,
    /// Std-dev of values winsorized to the 5th/95th percentiles
    pub robust_std: f64,
    pub count: usize,
}

impl RobustStats {
    /// Summarize a set of values. Non-finite values are ignored.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self {
                mean: 0.0,
                std: 1.0,
                median: 0.0,
                iqr: 1.0,
                lower_fence: f64::MIN,
                upper_fence: f64::MAX,
                robust_mean: 0.0,
                robust_std: 1.0,
                count: 0,
            };
        }
        sorted.sort_by(f64::total_cmp);

        let q25 = quantile_sorted(&sorted, 0.25);
        let q75 = quantile_sorted(&sorted, 0.75);
        let iqr = q75 - q25;
        let p05 = quantile_sorted(&sorted, 0.05);
        let p95 = quantile_sorted(&sorted, 0.95);
        let winsorized: Vec<f64> = sorted.iter().map(|v| v.clamp(p05, p95)).collect();

        Self {
            mean: mean(&sorted),
            std: sample_std(&sorted),
            median: quantile_sorted(&sorted, 0.5),
            iqr,
            lower_fence: q25 - FENCE_IQR_FACTOR * iqr,
            upper_fence: q75 + FENCE_IQR_FACTOR * iqr,
            robust_mean: mean(&winsorized),
            robust_std: sample_std(&winsorized),
            count: sorted.len(),
        }
    }

    /// Clip a value into the outlier fences
    #[inline]
    pub fn clip(&self, value: f64) -> f64 {
        if self.lower_fence <= self.upper_fence {
            value.clamp(self.lower_fence, self.upper_fence)
        } else {
            value
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.mean,
            self.std,
            self.median,
            self.iqr,
            self.robust_mean,
            self.robust_std,
        ]
        .iter()
        .all(|v| v.is_finite())
            && !self.lower_fence.is_nan()
            && !self.upper_fence.is_nan()
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator); 0 for an empty slice
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Population variance; 0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    let s = population_std(values);
    s * s
}

/// Quantile of an ascending-sorted slice using linear interpolation
/// between closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}
