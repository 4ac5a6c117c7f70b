//! Per-feature standardization.

use pathmatch_core::stats::{mean, population_std};

/// Zero-mean, unit-variance scaling fitted on one category's rows.
///
/// Constant features get a scale of 1 so they standardize to zero instead
/// of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut means = Vec::with_capacity(dim);
        let mut scales = Vec::with_capacity(dim);
        let mut column = Vec::with_capacity(rows.len());

        for j in 0..dim {
            column.clear();
            column.extend(rows.iter().map(|r| r.as_ref()[j]));
            means.push(mean(&column));
            let std = population_std(&column);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Self { means, scales }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform_all<R: AsRef<[f64]>>(&self, rows: &[R]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r.as_ref())).collect()
    }

    pub fn inverse_transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(z, (m, s))| z * s + m)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);
        let z = scaler.transform_all(&rows);
        assert_eq!(z[0], vec![-1.0, 0.0]);
        assert_eq!(z[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_inverse_restores_original_units() {
        let rows = vec![vec![2.0, 50.0], vec![4.0, 70.0], vec![9.0, 65.0]];
        let scaler = StandardScaler::fit(&rows);
        for row in &rows {
            let back = scaler.inverse_transform(&scaler.transform(row));
            for (a, b) in back.iter().zip(row.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
