//! Dense feature-vector arithmetic
//!
//! Feature vectors are short (tens of dimensions) and `f64`, so the
//! accumulators here are plain scalar loops with two partial sums for
//! better pipelining.

/// Dot product of two equal-length slices
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum0 = 0.0f64;
    let mut sum1 = 0.0f64;

    let a_chunks = a.chunks_exact(2);
    let b_chunks = b.chunks_exact(2);
    let (a_rest, b_rest) = (a_chunks.remainder(), b_chunks.remainder());
    for (a_pair, b_pair) in a_chunks.zip(b_chunks) {
        sum0 += a_pair[0] * b_pair[0];
        sum1 += a_pair[1] * b_pair[1];
    }
    for (x, y) in a_rest.iter().zip(b_rest.iter()) {
        sum0 += x * y;
    }

    sum0 + sum1
}

/// Euclidean norm
#[inline]
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero length
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }

    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Squared Euclidean distance
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Component-wise mean of a set of rows, or `None` when there are no rows
pub fn mean_vector<R: AsRef<[f64]>>(rows: &[R]) -> Option<Vec<f64>> {
    let first = rows.first()?;
    let dim = first.as_ref().len();
    let mut sums = vec![0.0f64; dim];

    for row in rows {
        for (s, x) in sums.iter_mut().zip(row.as_ref().iter()) {
            *s += x;
        }
    }

    let n = rows.len() as f64;
    for s in &mut sums {
        *s /= n;
    }
    Some(sums)
}

/// True when every component is finite
#[inline]
pub fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_odd_length() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot(&[2.0], &[3.0]), 6.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_distances() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert_eq!(squared_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_mean_vector() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 20.0]];
        assert_eq!(mean_vector(&rows), Some(vec![2.0, 15.0]));
        assert_eq!(mean_vector::<Vec<f64>>(&[]), None);
    }
}
