//! Silhouette coefficient of a partition.

use pathmatch_core::vector::euclidean_distance;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Mean silhouette over all rows, or over a seeded subsample of
/// `sample_size` rows when the input is larger.
///
/// Returns `None` when fewer than two clusters are populated.
pub fn silhouette_score(
    data: &[Vec<f64>],
    assignments: &[usize],
    k: usize,
    sample_size: usize,
    seed: u64,
) -> Option<f64> {
    debug_assert_eq!(data.len(), assignments.len());
    let indices: Vec<usize> = if data.len() > sample_size {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec();
        picked.sort_unstable();
        picked
    } else {
        (0..data.len()).collect()
    };

    let mut sizes = vec![0usize; k];
    for &i in &indices {
        sizes[assignments[i]] += 1;
    }
    if sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return None;
    }

    let mut total = 0.0;
    let mut sums = vec![0.0f64; k];
    for &i in &indices {
        let own = assignments[i];
        if sizes[own] <= 1 {
            // Singleton clusters contribute zero
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for &j in &indices {
            if i != j {
                sums[assignments[j]] += euclidean_distance(&data[i], &data[j]);
            }
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::MAX, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / indices.len() as f64)
}
