//! Skyline (envelope) matrix storage, factorization and solve.
//!
//! Column `j` stores the upper-triangle entries of rows `first_row[j]..j`
//! contiguously, starting at `col_start[j]`. In unsymmetric form the lower
//! triangle is stored row-wise in the same envelope: row `j`, columns
//! `first_row[j]..j`. The diagonal is kept separately.
//!
//! Factorization is done in place, as `Uᵀ D U` for symmetric storage and as
//! `L D U` (Crout order) for unsymmetric storage. Fill-in never leaves the
//! envelope, so no reallocation happens after construction.

use nalgebra::DMatrix;
use thiserror::Error;

/// Storage layout of the off-diagonal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixForm {
    /// Upper triangle only; `(i, j)` and `(j, i)` share one slot.
    #[default]
    Symmetric,
    /// Separate upper and lower triangles.
    Unsymmetric,
}

impl MatrixForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixForm::Symmetric => "symmetric",
            MatrixForm::Unsymmetric => "unsymmetric",
        }
    }
}

/// A pivot was not finite or not sufficiently positive.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Singular pivot {pivot} at equation {equation}")]
pub struct SingularPivot {
    pub equation: usize,
    pub pivot: f64,
}

/// Square sparse matrix in skyline storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineMatrix {
    form: MatrixForm,
    first_row: Vec<usize>,
    col_start: Vec<usize>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    lower: Vec<f64>,
    factored: bool,
}

impl SkylineMatrix {
    /// Build the envelope from the pairs of equations coupled by links.
    ///
    /// The height of column `j` is `j` minus the smallest row coupled to it.
    /// Pairs with equal or out-of-range indices are ignored.
    pub fn from_pairs(
        n: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
        form: MatrixForm,
    ) -> Self {
        let mut first_row: Vec<usize> = (0..n).collect();
        for (a, b) in pairs {
            if a == b || a >= n || b >= n {
                continue;
            }
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if lo < first_row[hi] {
                first_row[hi] = lo;
            }
        }
        let mut m = Self::empty(form);
        m.set_profile(first_row);
        m
    }

    /// A 0x0 matrix, used as a reusable target for compression.
    pub fn empty(form: MatrixForm) -> Self {
        Self {
            form,
            first_row: Vec::new(),
            col_start: vec![0],
            diag: Vec::new(),
            upper: Vec::new(),
            lower: Vec::new(),
            factored: false,
        }
    }

    fn set_profile(&mut self, first_row: Vec<usize>) {
        let n = first_row.len();
        self.col_start.clear();
        self.col_start.push(0);
        let mut total = 0;
        for (j, &f) in first_row.iter().enumerate() {
            total += j - f;
            self.col_start.push(total);
        }
        self.first_row = first_row;
        self.diag.clear();
        self.diag.resize(n, 0.0);
        self.upper.clear();
        self.upper.resize(total, 0.0);
        self.lower.clear();
        if self.form == MatrixForm::Unsymmetric {
            self.lower.resize(total, 0.0);
        }
        self.factored = false;
    }

    /// Number of equations.
    pub fn dim(&self) -> usize {
        self.diag.len()
    }

    pub fn form(&self) -> MatrixForm {
        self.form
    }

    /// Number of stored entries above the diagonal in column `j`.
    pub fn column_height(&self, j: usize) -> usize {
        j - self.first_row[j]
    }

    /// First row stored in column `j`.
    pub fn first_row(&self, j: usize) -> usize {
        self.first_row[j]
    }

    /// Total number of off-diagonal slots per triangle.
    pub fn envelope_len(&self) -> usize {
        self.upper.len()
    }

    pub fn is_factored(&self) -> bool {
        self.factored
    }

    /// Zero every entry, keeping the envelope.
    pub fn zero(&mut self) {
        self.diag.fill(0.0);
        self.upper.fill(0.0);
        self.lower.fill(0.0);
        self.factored = false;
    }

    /// Offset of entry `(row, col)` with `row < col` in the triangle arrays.
    fn slot(&self, row: usize, col: usize) -> Option<usize> {
        let first = self.first_row[col];
        (row >= first).then(|| self.col_start[col] + row - first)
    }

    /// Add `value` to entry `(i, j)`.
    ///
    /// Returns `false` when the entry lies outside the envelope and nothing
    /// was stored. In symmetric form `(i, j)` and `(j, i)` are the same slot.
    pub fn add(&mut self, i: usize, j: usize, value: f64) -> bool {
        if i == j {
            self.diag[i] += value;
            return true;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let Some(s) = self.slot(lo, hi) else {
            return false;
        };
        match self.form {
            MatrixForm::Symmetric => self.upper[s] += value,
            MatrixForm::Unsymmetric if i < j => self.upper[s] += value,
            MatrixForm::Unsymmetric => self.lower[s] += value,
        }
        true
    }

    pub fn add_diag(&mut self, i: usize, value: f64) {
        self.diag[i] += value;
    }

    /// Entry `(i, j)`, zero outside the envelope.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return self.diag[i];
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        match (self.slot(lo, hi), self.form) {
            (None, _) => 0.0,
            (Some(s), MatrixForm::Symmetric) => self.upper[s],
            (Some(s), MatrixForm::Unsymmetric) if i < j => self.upper[s],
            (Some(s), MatrixForm::Unsymmetric) => self.lower[s],
        }
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diag
    }

    /// Dense copy of the (unfactored) matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.dim();
        let mut m = DMatrix::zeros(n, n);
        for j in 0..n {
            m[(j, j)] = self.diag[j];
            for i in self.first_row[j]..j {
                m[(i, j)] = self.get(i, j);
                m[(j, i)] = self.get(j, i);
            }
        }
        m
    }

    /// Copy into `out` with the leading zero entries of every column trimmed.
    ///
    /// Nonzero entries are never dropped. `out` keeps its allocations between
    /// calls.
    pub fn compress_into(&self, out: &mut SkylineMatrix) {
        let unsymmetric = self.form == MatrixForm::Unsymmetric;
        out.form = self.form;
        out.first_row.clear();
        out.col_start.clear();
        out.col_start.push(0);
        out.upper.clear();
        out.lower.clear();
        out.diag.clear();
        out.diag.extend_from_slice(&self.diag);

        for j in 0..self.dim() {
            let fj = self.first_row[j];
            let cj = self.col_start[j];
            let first = (fj..j)
                .find(|&i| {
                    let s = cj + i - fj;
                    self.upper[s] != 0.0 || (unsymmetric && self.lower[s] != 0.0)
                })
                .unwrap_or(j);
            out.first_row.push(first);
            let range = cj + first - fj..cj + j - fj;
            out.upper.extend_from_slice(&self.upper[range.clone()]);
            if unsymmetric {
                out.lower.extend_from_slice(&self.lower[range]);
            }
            out.col_start.push(out.upper.len());
        }
        out.factored = false;
    }

    /// Factor in place.
    ///
    /// A pivot that is not finite or not greater than
    /// `pivot_tolerance * |a_jj|` is rejected; the matrix is then left
    /// partially factored and must be reassembled.
    pub fn factor(&mut self, pivot_tolerance: f64) -> Result<(), SingularPivot> {
        match self.form {
            MatrixForm::Symmetric => self.factor_symmetric(pivot_tolerance)?,
            MatrixForm::Unsymmetric => self.factor_unsymmetric(pivot_tolerance)?,
        }
        self.factored = true;
        Ok(())
    }

    fn factor_symmetric(&mut self, tol: f64) -> Result<(), SingularPivot> {
        for j in 0..self.dim() {
            let fj = self.first_row[j];
            let cj = self.col_start[j];

            // Column j of D·U, top to bottom.
            for i in fj..j {
                let fi = self.first_row[i];
                let ci = self.col_start[i];
                let mut s = 0.0;
                for k in fi.max(fj)..i {
                    s += self.upper[ci + k - fi] * self.upper[cj + k - fj];
                }
                self.upper[cj + i - fj] -= s;
            }

            let a_jj = self.diag[j];
            let mut d = a_jj;
            for i in fj..j {
                let g = self.upper[cj + i - fj];
                let u = g / self.diag[i];
                self.upper[cj + i - fj] = u;
                d -= u * g;
            }
            check_pivot(j, d, a_jj, tol)?;
            self.diag[j] = d;
        }
        Ok(())
    }

    fn factor_unsymmetric(&mut self, tol: f64) -> Result<(), SingularPivot> {
        for j in 0..self.dim() {
            let fj = self.first_row[j];
            let cj = self.col_start[j];

            // Column j of D·U and row j of L·D.
            for i in fj..j {
                let fi = self.first_row[i];
                let ci = self.col_start[i];
                let mut su = 0.0;
                let mut sl = 0.0;
                for k in fi.max(fj)..i {
                    su += self.lower[ci + k - fi] * self.upper[cj + k - fj];
                    sl += self.lower[cj + k - fj] * self.upper[ci + k - fi];
                }
                self.upper[cj + i - fj] -= su;
                self.lower[cj + i - fj] -= sl;
            }

            let a_jj = self.diag[j];
            let mut d = a_jj;
            for i in fj..j {
                let di = self.diag[i];
                let g = self.upper[cj + i - fj];
                let h = self.lower[cj + i - fj];
                self.upper[cj + i - fj] = g / di;
                self.lower[cj + i - fj] = h / di;
                d -= h * g / di;
            }
            check_pivot(j, d, a_jj, tol)?;
            self.diag[j] = d;
        }
        Ok(())
    }

    /// Solve `A x = rhs` in place with a factored matrix.
    pub fn solve(&self, rhs: &mut [f64]) {
        debug_assert!(self.factored, "solve called on an unfactored matrix");
        debug_assert_eq!(rhs.len(), self.dim());
        let n = self.dim();
        let lower = match self.form {
            MatrixForm::Symmetric => &self.upper,
            MatrixForm::Unsymmetric => &self.lower,
        };

        for j in 0..n {
            let fj = self.first_row[j];
            let cj = self.col_start[j];
            let mut s = 0.0;
            for i in fj..j {
                s += lower[cj + i - fj] * rhs[i];
            }
            rhs[j] -= s;
        }

        for (x, d) in rhs.iter_mut().zip(&self.diag) {
            *x /= d;
        }

        for j in (0..n).rev() {
            let fj = self.first_row[j];
            let cj = self.col_start[j];
            let x = rhs[j];
            for i in fj..j {
                rhs[i] -= self.upper[cj + i - fj] * x;
            }
        }
    }
}

fn check_pivot(equation: usize, pivot: f64, original: f64, tol: f64) -> Result<(), SingularPivot> {
    if !pivot.is_finite() || pivot <= tol * original.abs() {
        return Err(SingularPivot { equation, pivot });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn laplacian_like(form: MatrixForm) -> SkylineMatrix {
        // 0 - 1 - 2 - 3 chain plus 0 - 3, each node grounded.
        let pairs = [(0, 1), (1, 2), (2, 3), (0, 3)];
        let mut m = SkylineMatrix::from_pairs(4, pairs, form);
        for (a, b) in pairs {
            let w = 1.0 + (a + b) as f64;
            m.add(a, a, w);
            m.add(b, b, w);
            m.add(a, b, -w);
            if form == MatrixForm::Unsymmetric {
                m.add(b, a, -w);
            }
        }
        for i in 0..4 {
            m.add_diag(i, 0.5);
        }
        m
    }

    fn dense_solve(m: &SkylineMatrix, b: &[f64]) -> Vec<f64> {
        let x = m
            .to_dense()
            .lu()
            .solve(&DVector::from_column_slice(b))
            .unwrap();
        x.iter().copied().collect()
    }

    #[test]
    fn column_heights_follow_pairs() {
        let m = SkylineMatrix::from_pairs(
            4,
            [(0, 2), (2, 1), (2, 3), (3, 3)],
            MatrixForm::Symmetric,
        );
        let heights: Vec<_> = (0..4).map(|j| m.column_height(j)).collect();
        assert_eq!(heights, vec![0, 0, 2, 1]);
        assert_eq!(m.envelope_len(), 3);
    }

    #[test]
    fn symmetric_slots_are_shared() {
        let mut m = SkylineMatrix::from_pairs(2, [(0, 1)], MatrixForm::Symmetric);
        assert!(m.add(1, 0, -2.0));
        assert_eq!(m.get(0, 1), -2.0);
        assert_eq!(m.get(1, 0), -2.0);
    }

    #[test]
    fn entries_outside_envelope_are_refused() {
        let mut m = SkylineMatrix::from_pairs(3, [(1, 2)], MatrixForm::Unsymmetric);
        assert!(!m.add(0, 2, 1.0));
        assert_eq!(m.get(0, 2), 0.0);
        assert!(m.add(2, 1, 3.0));
        assert_eq!(m.get(2, 1), 3.0);
        assert_eq!(m.get(1, 2), 0.0);
    }

    #[test]
    fn symmetric_solve_matches_dense() {
        let mut m = laplacian_like(MatrixForm::Symmetric);
        let b = [1.0, -2.0, 0.5, 3.0];
        let expected = dense_solve(&m, &b);

        let mut x = b;
        m.factor(1e-12).unwrap();
        m.solve(&mut x);
        for (a, e) in x.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-10 * e.abs().max(1.0));
        }
    }

    #[test]
    fn unsymmetric_solve_matches_dense() {
        let mut m = laplacian_like(MatrixForm::Unsymmetric);
        // Break the symmetry.
        m.add(3, 0, -0.7);
        m.add_diag(3, 0.7);
        let b = [0.2, 1.0, -1.0, 4.0];
        let expected = dense_solve(&m, &b);

        let mut x = b;
        m.factor(1e-12).unwrap();
        m.solve(&mut x);
        for (a, e) in x.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-10 * e.abs().max(1.0));
        }
    }

    #[test]
    fn zero_diagonal_is_singular() {
        let mut m = SkylineMatrix::from_pairs(3, [(0, 1)], MatrixForm::Symmetric);
        m.add(0, 0, 1.0);
        m.add(1, 1, 2.0);
        m.add(0, 1, -1.0);
        let err = m.factor(1e-12).unwrap_err();
        assert_eq!(err.equation, 2);
        assert!(!m.is_factored());
    }

    #[test]
    fn floating_pair_is_singular() {
        // Two unknowns coupled only to each other.
        let mut m = SkylineMatrix::from_pairs(2, [(0, 1)], MatrixForm::Symmetric);
        m.add(0, 0, 0.3);
        m.add(1, 1, 0.3);
        m.add(0, 1, -0.3);
        assert_eq!(m.factor(1e-12).unwrap_err().equation, 1);
    }

    #[test]
    fn compression_trims_leading_zeros_only() {
        let mut m = SkylineMatrix::from_pairs(
            4,
            [(0, 3), (1, 3), (2, 3), (0, 1)],
            MatrixForm::Symmetric,
        );
        for i in 0..4 {
            m.add_diag(i, 4.0);
        }
        // (0, 3) stays zero, (1, 3) is nonzero, (2, 3) is zero but interior.
        m.add(1, 3, -1.0);
        m.add(0, 1, -1.0);

        let mut c = SkylineMatrix::empty(MatrixForm::Symmetric);
        m.compress_into(&mut c);
        assert_eq!(c.dim(), 4);
        assert_eq!(c.first_row(3), 1);
        assert_eq!(c.column_height(3), 2);
        assert_eq!(c.get(2, 3), 0.0);
        assert_eq!(c.to_dense(), m.to_dense());

        let b = [1.0, 2.0, 3.0, 4.0];
        let mut x1 = b;
        let mut x2 = b;
        m.factor(1e-12).unwrap();
        m.solve(&mut x1);
        c.factor(1e-12).unwrap();
        c.solve(&mut x2);
        for (a, e) in x1.iter().zip(&x2) {
            assert!((a - e).abs() < 1e-14);
        }
    }

    #[test]
    fn zero_resets_values_and_factored_flag() {
        let mut m = laplacian_like(MatrixForm::Symmetric);
        m.factor(1e-12).unwrap();
        m.zero();
        assert!(!m.is_factored());
        assert!(m.to_dense().iter().all(|v| *v == 0.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn build(
            n: usize,
            edges: &[(usize, usize, f64, f64)],
            form: MatrixForm,
        ) -> SkylineMatrix {
            let pairs = edges.iter().map(|&(a, b, _, _)| (a % n, b % n));
            let mut m = SkylineMatrix::from_pairs(n, pairs, form);
            for &(a, b, w1, w2) in edges {
                let (a, b) = (a % n, b % n);
                if a == b {
                    continue;
                }
                let w2 = if form == MatrixForm::Symmetric { w1 } else { w2 };
                m.add(a, a, w1);
                m.add(b, b, w2);
                m.add(a, b, -w1);
                if form == MatrixForm::Unsymmetric {
                    m.add(b, a, -w2);
                }
            }
            for i in 0..n {
                m.add_diag(i, 0.1);
            }
            m
        }

        proptest! {
            #[test]
            fn skyline_matches_dense_lu(
                n in 1usize..9,
                edges in prop::collection::vec(
                    (0usize..9, 0usize..9, 0.01f64..10.0, 0.01f64..10.0), 0..20),
                b in prop::collection::vec(-10.0f64..10.0, 9),
                unsymmetric in any::<bool>(),
            ) {
                let form = if unsymmetric { MatrixForm::Unsymmetric } else { MatrixForm::Symmetric };
                let mut m = build(n, &edges, form);
                let rhs = &b[..n];
                let dense = m.to_dense();
                let expected = dense
                    .lu()
                    .solve(&DVector::from_column_slice(rhs))
                    .unwrap();

                let mut x = rhs.to_vec();
                m.factor(1e-12).unwrap();
                m.solve(&mut x);
                for (a, e) in x.iter().zip(expected.iter()) {
                    prop_assert!((a - e).abs() <= 1e-8 * e.abs().max(1.0));
                }
            }

            #[test]
            fn compressed_matches_uncompressed(
                n in 1usize..9,
                edges in prop::collection::vec(
                    (0usize..9, 0usize..9, 0.01f64..10.0, 0.01f64..10.0), 0..20),
                b in prop::collection::vec(-10.0f64..10.0, 9),
            ) {
                let mut m = build(n, &edges, MatrixForm::Symmetric);
                let mut c = SkylineMatrix::empty(MatrixForm::Symmetric);
                m.compress_into(&mut c);
                prop_assert_eq!(c.to_dense(), m.to_dense());

                let mut x1 = b[..n].to_vec();
                let mut x2 = b[..n].to_vec();
                m.factor(1e-12).unwrap();
                m.solve(&mut x1);
                c.factor(1e-12).unwrap();
                c.solve(&mut x2);
                for (a, e) in x1.iter().zip(&x2) {
                    prop_assert!((a - e).abs() <= 1e-10 * e.abs().max(1.0));
                }
            }
        }
    }
}
