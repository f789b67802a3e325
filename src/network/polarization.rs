// Polarization matrix from shared audiences.
//
// N[i][j] counts the accounts in both audience i and audience j (so N[i][i]
// is the audience size). The polarization score for a pair is
//
//   phi[i][j] = (N[i][i] * N[j][j] - N[i][j] * N[j][i])
//               / sqrt(max(sum_k N[i][k] * N[j][k] * N[k][i] * N[k][j], 1e-6))
//
// The floor keeps pairs with no shared four-way co-occurrence finite. N is
// symmetric, which makes phi symmetric with an exactly zero diagonal, so
// it can be handed to hierarchical clustering as a distance matrix.

use super::audience::AudienceSets;

/// Floor applied to the quartic co-occurrence sum.
pub const DENOMINATOR_FLOOR: f64 = 1e-6;

/// Dense row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n = rows.len();
        let mut m = Self::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate().take(n) {
                m.set(i, j, v);
            }
        }
        m
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Upper triangle (i < j) flattened row by row, length n(n-1)/2.
    pub fn condensed(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n * self.n.saturating_sub(1) / 2);
        for i in 0..self.n {
            for j in i + 1..self.n {
                out.push(self.get(i, j));
            }
        }
        out
    }
}

/// Overlap counts, polarization scores and the labels both are indexed by.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarizationReport {
    pub overlap: SquareMatrix,
    pub polarization: SquareMatrix,
    pub labels: Vec<String>,
}

/// `N[i][j] = |audience(i) ∩ audience(j)|`.
pub fn overlap_matrix(audiences: &AudienceSets) -> SquareMatrix {
    let n = audiences.len();
    let mut m = SquareMatrix::zeros(n);
    for i in 0..n {
        m.set(i, i, audiences.audience(i).len() as f64);
        for j in i + 1..n {
            let shared = audiences
                .audience(i)
                .intersection(audiences.audience(j))
                .count() as f64;
            m.set(i, j, shared);
            m.set(j, i, shared);
        }
    }
    m
}

/// Apply the quartic normalization to an overlap matrix.
pub fn polarization_matrix(overlap: &SquareMatrix) -> SquareMatrix {
    let n = overlap.dim();
    let mut phi = SquareMatrix::zeros(n);
    for i in 0..n {
        for j in 0..n {
            let quartic: f64 = (0..n)
                .map(|k| {
                    overlap.get(i, k) * overlap.get(j, k) * overlap.get(k, i) * overlap.get(k, j)
                })
                .sum();
            let denom = quartic.max(DENOMINATOR_FLOOR);
            let numer =
                overlap.get(i, i) * overlap.get(j, j) - overlap.get(i, j) * overlap.get(j, i);
            phi.set(i, j, numer / denom.sqrt());
        }
    }
    phi
}

pub fn compute(audiences: &AudienceSets) -> PolarizationReport {
    let overlap = overlap_matrix(audiences);
    let polarization = polarization_matrix(&overlap);
    PolarizationReport {
        overlap,
        polarization,
        labels: audiences.labels().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_disjoint_audiences() {
        // |A|=2, |B|=3, no overlap
        let n = SquareMatrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 3.0]]);
        let phi = polarization_matrix(&n);
        // pair: numer = 6, quartic = 0 -> floored
        let expected = 6.0 / DENOMINATOR_FLOOR.sqrt();
        assert!((phi.get(0, 1) - expected).abs() < 1e-6);
        assert_eq!(phi.get(0, 0), 0.0);
        assert_eq!(phi.get(1, 1), 0.0);
    }

    #[test]
    fn test_partial_overlap_value() {
        let n = SquareMatrix::from_rows(&[vec![3.0, 1.0], vec![1.0, 2.0]]);
        let phi = polarization_matrix(&n);
        // numer = 3*2 - 1*1 = 5
        // quartic(0,1) = N00*N10*N00*N01 + N01*N11*N10*N11 = 3*1*3*1 + 1*2*1*2 = 13
        let expected = 5.0 / 13f64.sqrt();
        assert!((phi.get(0, 1) - expected).abs() < 1e-12);
        assert_eq!(phi.get(0, 1), phi.get(1, 0));
    }

    #[test]
    fn test_condensed_is_row_major_upper_triangle() {
        let m = SquareMatrix::from_rows(&[
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0, 3.0],
            vec![2.0, 3.0, 0.0],
        ]);
        assert_eq!(m.condensed(), vec![1.0, 2.0, 3.0]);
        assert!(SquareMatrix::zeros(1).condensed().is_empty());
        assert!(SquareMatrix::zeros(0).condensed().is_empty());
    }
}
