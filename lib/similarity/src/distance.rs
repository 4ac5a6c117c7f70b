//! Per-feature similarity curves and name similarity
//!
//! All similarity functions return a score in [0.0, 1.0] where 1.0 means identical.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Spread below which a path feature is treated as constant
pub const ZERO_SPREAD: f64 = 1e-9;

/// Monotonically decreasing mapping from a z-score to a similarity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZCurve {
    /// `max(0, 1 - z/3)`
    #[default]
    Linear,
    /// Piecewise curve that is lenient within one standard deviation and never
    /// drops below 0.1
    Tiered,
}

impl ZCurve {
    pub fn similarity(self, z: f64) -> f64 {
        let z = z.abs();
        match self {
            ZCurve::Linear => (1.0 - z / 3.0).max(0.0),
            ZCurve::Tiered => {
                if z <= 0.5 {
                    1.0 - 0.2 * z
                } else if z <= 1.0 {
                    0.9 - 0.3 * (z - 0.5)
                } else if z <= 2.0 {
                    0.75 - 0.4 * (z - 1.0)
                } else {
                    (0.35 - 0.1 * (z - 2.0)).max(0.1)
                }
            }
        }
    }
}

/// Similarity of a value to a path's per-feature distribution, linear curve.
///
/// A constant feature (zero spread) is scored by relative difference.
pub fn distribution_similarity(value: f64, mean: f64, std: f64) -> f64 {
    let diff = (value - mean).abs();
    if std > ZERO_SPREAD {
        return ZCurve::Linear.similarity(diff / std);
    }
    if diff < 0.01 {
        1.0
    } else {
        (1.0 - diff / mean.abs().max(1.0)).max(0.0)
    }
}

/// Similarity of a value to a path's per-feature distribution, tiered curve.
///
/// A constant feature scores 1.0 on an exact hit and 0.5 otherwise.
pub fn robust_distribution_similarity(value: f64, mean: f64, spread: f64) -> f64 {
    let diff = (value - mean).abs();
    if spread > ZERO_SPREAD {
        return ZCurve::Tiered.similarity(diff / spread);
    }
    if diff <= ZERO_SPREAD * mean.abs().max(1.0) {
        1.0
    } else {
        0.5
    }
}

/// Trigram similarity between two names, case-insensitive
///
/// Uses character trigrams for fuzzy matching.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let trigrams_a = generate_trigrams(&a.to_lowercase());
    let trigrams_b = generate_trigrams(&b.to_lowercase());

    if trigrams_a.is_empty() && trigrams_b.is_empty() {
        return 1.0;
    }

    if trigrams_a.is_empty() || trigrams_b.is_empty() {
        return 0.0;
    }

    let intersection = trigrams_a.intersection(&trigrams_b).count();
    let union = trigrams_a.union(&trigrams_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Generate character trigrams from a string
fn generate_trigrams(s: &str) -> HashSet<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return HashSet::new();
    }
    let padded = format!("  {}  ", trimmed);
    let chars: Vec<char> = padded.chars().collect();

    chars.windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Up to `limit` candidate names ordered by similarity to `query`, most
/// similar first; ties are broken alphabetically.
pub fn rank_suggestions<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|c| (trigram_similarity(query, c), c))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, c)| c.to_string())
        .collect()
}
