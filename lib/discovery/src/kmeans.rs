//! Seeded k-means with k-means++ initialization and random restarts.

use pathmatch_core::vector::{euclidean_distance, squared_distance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of one k-means fit
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster index of every input row
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeansFit {
    #[inline]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.k()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }

    pub fn non_empty_clusters(&self) -> usize {
        self.cluster_sizes().iter().filter(|&&s| s > 0).count()
    }

    /// Row indices per cluster
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.k()];
        for (i, &c) in self.assignments.iter().enumerate() {
            members[c].push(i);
        }
        members
    }
}

/// K-means runner for one candidate k
#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl KMeans {
    pub fn new(k: usize, n_init: usize, max_iterations: usize, tolerance: f64, seed: u64) -> Self {
        Self {
            k,
            n_init,
            max_iterations,
            tolerance,
            seed,
        }
    }

    /// Run `n_init` restarts and keep the lowest-inertia fit whose clusters
    /// are all non-empty.
    ///
    /// Returns `None` when there are fewer rows than `k` or every restart
    /// collapsed to fewer than `k` groups.
    pub fn fit(&self, data: &[Vec<f64>]) -> Option<KMeansFit> {
        if self.k == 0 || data.len() < self.k {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for _ in 0..self.n_init.max(1) {
            let centroids = kmeans_plus_plus_init(data, self.k, &mut rng);
            let fit = self.lloyd(data, centroids);
            if fit.non_empty_clusters() < self.k {
                continue;
            }
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best
    }

    fn lloyd(&self, data: &[Vec<f64>], mut centroids: Vec<Vec<f64>>) -> KMeansFit {
        let mut assignments = vec![0usize; data.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;
            assign(data, &centroids, &mut assignments);

            let updated = compute_centroids(data, &assignments, &centroids);
            let shift = centroids
                .iter()
                .zip(updated.iter())
                .map(|(a, b)| euclidean_distance(a, b))
                .fold(0.0f64, f64::max);
            centroids = updated;

            if shift <= self.tolerance {
                break;
            }
        }

        let inertia = assign(data, &centroids, &mut assignments);
        KMeansFit {
            assignments,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// Pick initial centroids with probability proportional to squared distance
/// from the centroids chosen so far.
pub fn kmeans_plus_plus_init<R: Rng>(data: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    if n == 0 || k == 0 {
        return centroids;
    }

    centroids.push(data[rng.random_range(0..n)].clone());
    let mut min_distances = vec![f64::MAX; n];

    while centroids.len() < k {
        let Some(last) = centroids.last() else { break };
        for (d, row) in min_distances.iter_mut().zip(data.iter()) {
            let dist = squared_distance(row, last);
            if dist < *d {
                *d = dist;
            }
        }

        let total: f64 = min_distances.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = n - 1;
            for (i, d) in min_distances.iter().enumerate() {
                acc += d;
                if acc >= target && *d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every row coincides with a chosen centroid
            rng.random_range(0..n)
        };
        centroids.push(data[next].clone());
    }

    centroids
}

/// Assign every row to its nearest centroid; returns the inertia.
fn assign(data: &[Vec<f64>], centroids: &[Vec<f64>], assignments: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (row, slot) in data.iter().zip(assignments.iter_mut()) {
        let (best, dist) = nearest(row, centroids);
        *slot = best;
        inertia += dist;
    }
    inertia
}

/// Index and squared distance of the nearest centroid
#[inline]
pub fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    (best, best_dist)
}

/// Mean of assigned rows per cluster; an empty cluster keeps its previous centroid.
fn compute_centroids(
    data: &[Vec<f64>],
    assignments: &[usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let dim = previous.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0f64; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (row, &c) in data.iter().zip(assignments.iter()) {
        counts[c] += 1;
        for (s, x) in sums[c].iter_mut().zip(row.iter()) {
            *s += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((mut sum, count), prev)| {
            if count == 0 {
                return prev.clone();
            }
            for s in sum.iter_mut() {
                *s /= count as f64;
            }
            sum
        })
        .collect()
}
