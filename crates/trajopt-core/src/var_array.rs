//! Rectangular, row-major layout of [`Variable`]s over the primal vector.
//!
//! Mirrors the original `BasicArray<T>` template (`basic_array.hpp`):
//! elements are stored row-major in a flat `Vec`, and `block`/`rblock`
//! return new arrays that alias the same underlying `Variable` handles
//! rather than copying coordinates — slicing a [`VariableArray`] is a view
//! over existing decision variables, never a fresh allocation of them.

use crate::expr::Variable;

/// A `rows x cols` grid of [`Variable`] handles, stored row-major.
///
/// Used both in joint-only mode (`n_steps x n_dof`) and in belief mode,
/// where each row instead holds `n_dof` means, the lower-triangle entries
/// of `sqrt(Sigma)`, and `n_dof` controls concatenated (§3, §4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableArray {
    rows: usize,
    cols: usize,
    data: Vec<Variable>,
}

impl VariableArray {
    /// Builds an array from row-major data. Panics if `data.len() !=
    /// rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<Variable>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "VariableArray: data length does not match rows * cols"
        );
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(row, col)`.
    pub fn at(&self, row: usize, col: usize) -> &Variable {
        &self.data[row * self.cols + col]
    }

    /// All elements in row-major order.
    pub fn as_slice(&self) -> &[Variable] {
        &self.data
    }

    /// The full row at `row`.
    pub fn row(&self, row: usize) -> &[Variable] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// The full column at `col`, copied out since columns are not
    /// contiguous in row-major storage.
    pub fn col(&self, col: usize) -> Vec<Variable> {
        (0..self.rows).map(|r| self.at(r, col).clone()).collect()
    }

    /// `[row_start, row_end) x [col_start, col_end)` sub-view, aliasing the
    /// same `Variable` handles (`block` in the original).
    pub fn block(&self, row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> VariableArray {
        let new_rows = row_end - row_start;
        let new_cols = col_end - col_start;
        let mut data = Vec::with_capacity(new_rows * new_cols);
        for r in row_start..row_end {
            for c in col_start..col_end {
                data.push(self.at(r, c).clone());
            }
        }
        VariableArray::from_row_major(new_rows, new_cols, data)
    }

    /// `[row_start, row_end)` with all columns (`rblock`/`middleRows` in the
    /// original).
    pub fn rblock(&self, row_start: usize, row_end: usize) -> VariableArray {
        self.block(row_start, row_end, 0, self.cols)
    }

    /// The first `n` rows.
    pub fn top_rows(&self, n: usize) -> VariableArray {
        self.rblock(0, n)
    }

    /// The last `n` rows.
    pub fn bottom_rows(&self, n: usize) -> VariableArray {
        self.rblock(self.rows - n, self.rows)
    }

    /// Transposed view: element `(i, j)` of the result is `(j, i)` of `self`.
    pub fn transpose(&self) -> VariableArray {
        let mut data = Vec::with_capacity(self.rows * self.cols);
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.at(r, c).clone());
            }
        }
        VariableArray::from_row_major(self.cols, self.rows, data)
    }

    /// Diagonal entries of a square array, used for covariance-trace style
    /// costs.
    pub fn diagonal(&self) -> Vec<Variable> {
        assert_eq!(self.rows, self.cols, "diagonal: array is not square");
        (0..self.rows).map(|i| self.at(i, i).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(rows: usize, cols: usize) -> VariableArray {
        let data = (0..rows * cols).map(|i| Variable::new(i, format!("v{i}"))).collect();
        VariableArray::from_row_major(rows, cols, data)
    }

    #[test]
    fn at_matches_row_major_order() {
        let arr = make(2, 3);
        assert_eq!(arr.at(0, 0).index(), 0);
        assert_eq!(arr.at(0, 2).index(), 2);
        assert_eq!(arr.at(1, 0).index(), 3);
        assert_eq!(arr.at(1, 2).index(), 5);
    }

    #[test]
    fn rblock_selects_contiguous_rows() {
        let arr = make(4, 2);
        let mid = arr.rblock(1, 3);
        assert_eq!(mid.rows(), 2);
        assert_eq!(mid.at(0, 0).index(), 2);
        assert_eq!(mid.at(1, 1).index(), 5);
    }

    #[test]
    fn top_and_bottom_rows_partition_the_array() {
        let arr = make(5, 1);
        assert_eq!(arr.top_rows(2).at(1, 0).index(), 1);
        assert_eq!(arr.bottom_rows(2).at(0, 0).index(), 3);
    }

    #[test]
    fn transpose_swaps_indices() {
        let arr = make(2, 3);
        let t = arr.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(arr.at(r, c).index(), t.at(c, r).index());
            }
        }
    }

    #[test]
    fn block_aliases_variables_rather_than_copying_them() {
        let arr = make(3, 3);
        let b = arr.block(1, 3, 1, 3);
        assert_eq!(b.at(0, 0).name(), arr.at(1, 1).name());
    }
}
