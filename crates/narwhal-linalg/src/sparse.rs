use std::ops::Mul;

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::vector::Vector;

/// Matrix in compressed sparse row (CSR) format.
///
/// Row `i` owns the entries `row_pointers[i]..row_pointers[i + 1]` of `values` and
/// `column_indices`. Columns inside a row need not be sorted, and repeated columns are summed by
/// every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    values: Vec<f64>,
    column_indices: Vec<usize>,
    row_pointers: Vec<usize>,
    num_cols: usize,
}

impl SparseMatrix {
    /// Builds a matrix from raw CSR arrays, checking every structural invariant.
    pub fn new(
        values: Vec<f64>,
        column_indices: Vec<usize>,
        row_pointers: Vec<usize>,
        num_cols: usize,
    ) -> Result<Self> {
        let matrix = Self {
            values,
            column_indices,
            row_pointers,
            num_cols,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Builds a matrix from `(row, column, value)` triplets. Duplicate coordinates are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut triplets: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        for &(row, col, _) in &triplets {
            if row >= num_rows || col >= num_cols {
                return Err(Error::MalformedMatrix(format!(
                    "triplet ({row}, {col}) lies outside a {num_rows}x{num_cols} matrix"
                )));
            }
        }
        triplets.sort_by_key(|&(row, col, _)| (row, col));

        let mut builder = CsrBuilder::with_capacity(num_rows, triplets.len(), num_cols);
        let mut iter = triplets.into_iter().peekable();
        for row in 0..num_rows {
            while let Some(&(r, col, mut value)) = iter.peek() {
                if r != row {
                    break;
                }
                iter.next();
                while let Some(&(r2, c2, v2)) = iter.peek() {
                    if r2 != row || c2 != col {
                        break;
                    }
                    value += v2;
                    iter.next();
                }
                builder.push(col, value);
            }
            builder.finish_row();
        }
        builder.build()
    }

    /// Copies the non-zero entries of a dense matrix.
    pub fn from_dense(dense: &DMatrix<f64>) -> Self {
        let mut builder = CsrBuilder::with_capacity(dense.nrows(), 0, dense.ncols());
        for row in 0..dense.nrows() {
            for col in 0..dense.ncols() {
                let value = dense[(row, col)];
                if value != 0.0 {
                    builder.push(col, value);
                }
            }
            builder.finish_row();
        }
        builder.into_matrix()
    }

    pub fn num_rows(&self) -> usize {
        self.row_pointers.len().saturating_sub(1)
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    pub fn row_pointers(&self) -> &[usize] {
        &self.row_pointers
    }

    /// Stored `(column, value)` entries of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_pointers[row]..self.row_pointers[row + 1];
        self.column_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Matrix-vector product `A * x`.
    pub fn multiply(&self, x: &Vector) -> Result<Vector> {
        if x.len() != self.num_cols {
            return Err(Error::DimensionMismatch {
                context: "sparse matrix-vector product",
                expected: self.num_cols,
                actual: x.len(),
            });
        }
        Ok(self.multiply_unchecked(x))
    }

    fn multiply_unchecked(&self, x: &Vector) -> Vector {
        let x = x.as_slice();
        (0..self.num_rows())
            .map(|row| self.row(row).map(|(col, value)| value * x[col]).sum())
            .collect()
    }

    /// Jacobi preconditioner: `1 / a_ii` per row, or `0` where the diagonal entry is absent or
    /// zero.
    pub fn diagonal_preconditioner(&self) -> Vector {
        (0..self.num_rows())
            .map(|row| {
                let diagonal: f64 = self
                    .row(row)
                    .filter(|&(col, _)| col == row)
                    .map(|(_, value)| value)
                    .sum();
                if diagonal != 0.0 { 1.0 / diagonal } else { 0.0 }
            })
            .collect()
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.num_rows(), self.num_cols);
        for row in 0..self.num_rows() {
            for (col, value) in self.row(row) {
                dense[(row, col)] += value;
            }
        }
        dense
    }

    fn validate(&self) -> Result<()> {
        let Some((&first, &last)) = self.row_pointers.first().zip(self.row_pointers.last()) else {
            return Err(Error::MalformedMatrix(
                "row pointer array must hold at least one entry".to_string(),
            ));
        };
        if first != 0 {
            return Err(Error::MalformedMatrix(format!(
                "row pointers must start at 0, found {first}"
            )));
        }
        if self.column_indices.len() != self.values.len() {
            return Err(Error::MalformedMatrix(format!(
                "{} column indices for {} values",
                self.column_indices.len(),
                self.values.len()
            )));
        }
        if let Some(row) = self.row_pointers.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::MalformedMatrix(format!(
                "row pointers decrease at row {row}"
            )));
        }
        if last != self.values.len() {
            return Err(Error::MalformedMatrix(format!(
                "last row pointer is {last} but {} values are stored",
                self.values.len()
            )));
        }
        if let Some(&col) = self.column_indices.iter().find(|&&c| c >= self.num_cols) {
            return Err(Error::MalformedMatrix(format!(
                "column index {col} out of range for {} columns",
                self.num_cols
            )));
        }
        Ok(())
    }
}

/// `&A * &x`. Panics when `x.len()` differs from the column count; use
/// [`SparseMatrix::multiply`] for a checked product.
impl Mul<&Vector> for &SparseMatrix {
    type Output = Vector;

    fn mul(self, rhs: &Vector) -> Vector {
        assert_eq!(
            rhs.len(),
            self.num_cols,
            "sparse matrix-vector product: vector length differs from column count"
        );
        self.multiply_unchecked(rhs)
    }
}

/// Row-by-row CSR assembly.
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    values: Vec<f64>,
    column_indices: Vec<usize>,
    row_pointers: Vec<usize>,
    num_cols: usize,
}

impl CsrBuilder {
    pub fn new(num_cols: usize) -> Self {
        Self::with_capacity(0, 0, num_cols)
    }

    pub fn with_capacity(num_rows: usize, nnz: usize, num_cols: usize) -> Self {
        let mut row_pointers = Vec::with_capacity(num_rows + 1);
        row_pointers.push(0);
        Self {
            values: Vec::with_capacity(nnz),
            column_indices: Vec::with_capacity(nnz),
            row_pointers,
            num_cols,
        }
    }

    /// Appends an entry to the row currently being built.
    pub fn push(&mut self, col: usize, value: f64) {
        self.column_indices.push(col);
        self.values.push(value);
    }

    /// Closes the current row; a row with no pushed entries is empty.
    pub fn finish_row(&mut self) {
        self.row_pointers.push(self.values.len());
    }

    pub fn build(self) -> Result<SparseMatrix> {
        SparseMatrix::new(
            self.values,
            self.column_indices,
            self.row_pointers,
            self.num_cols,
        )
    }

    // Only for callers that cannot produce out-of-range columns.
    fn into_matrix(self) -> SparseMatrix {
        SparseMatrix {
            values: self.values,
            column_indices: self.column_indices,
            row_pointers: self.row_pointers,
            num_cols: self.num_cols,
        }
    }
}
