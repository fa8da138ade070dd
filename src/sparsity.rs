/*!
 * Sparsity patterns in compressed column storage.
 *
 * A [Sparsity] records which positions of a matrix are structurally nonzero, independent
 * of any numerical values. Both numeric matrices and symbolic expressions store one value
 * per structural nonzero, in column major order of the pattern.
 *
 * ```
 * use easy_sens::sparsity::Sparsity;
 * let pattern = Sparsity::diagonal(3);
 * assert_eq!(pattern.shape(), (3, 3));
 * assert_eq!(pattern.nnz(), 3);
 * assert_eq!(pattern.find(1, 1), Some(1));
 * assert_eq!(pattern.find(0, 1), None);
 * ```
 */

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/**
 * The structurally nonzero positions of a `rows` x `columns` matrix.
 *
 * Nonzeros of column `c` are `row_indices[column_starts[c]..column_starts[c + 1]]`, with
 * row indices strictly increasing within each column.
 */
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Sparsity {
    rows: usize,
    columns: usize,
    column_starts: Vec<usize>,
    row_indices: Vec<usize>,
}

/**
 * An error indicating a malformed sparsity pattern.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SparsityError {
    /// The column starts do not have one entry per column plus one.
    ColumnStartsLength { expected: usize, actual: usize },
    /// The column starts are not non decreasing from 0 to the number of nonzeros.
    ColumnStartsNotMonotonic,
    /// A row index is outside the matrix or rows are not strictly increasing in a column.
    InvalidRow { column: usize, row: usize },
    /// A (row, column) position lies outside the matrix.
    OutOfBounds {
        row: usize,
        column: usize,
        shape: (usize, usize),
    },
}

impl Error for SparsityError {}

impl fmt::Display for SparsityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparsityError::ColumnStartsLength { expected, actual } => write!(
                f,
                "Expected {} column starts but got {}",
                expected, actual
            ),
            SparsityError::ColumnStartsNotMonotonic => write!(
                f,
                "Column starts must increase from 0 up to the number of nonzeros"
            ),
            SparsityError::InvalidRow { column, row } => write!(
                f,
                "Row index {} in column {} is out of range or not strictly increasing",
                row, column
            ),
            SparsityError::OutOfBounds { row, column, shape } => write!(
                f,
                "Position ({}, {}) is outside a {}x{} matrix",
                row, column, shape.0, shape.1
            ),
        }
    }
}

/**
 * Deserialization goes through [Sparsity::new], so malformed patterns are rejected.
 */
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Sparsity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct SparsityData {
            rows: usize,
            columns: usize,
            column_starts: Vec<usize>,
            row_indices: Vec<usize>,
        }

        let data = SparsityData::deserialize(deserializer)?;
        Sparsity::new(data.rows, data.columns, data.column_starts, data.row_indices)
            .map_err(serde::de::Error::custom)
    }
}

impl Sparsity {
    /**
     * Creates a pattern from its compressed column storage, checking every structural
     * invariant.
     */
    pub fn new(
        rows: usize,
        columns: usize,
        column_starts: Vec<usize>,
        row_indices: Vec<usize>,
    ) -> Result<Sparsity, SparsityError> {
        if column_starts.len() != columns + 1 {
            return Err(SparsityError::ColumnStartsLength {
                expected: columns + 1,
                actual: column_starts.len(),
            });
        }
        if column_starts[0] != 0
            || column_starts[columns] != row_indices.len()
            || column_starts.windows(2).any(|w| w[0] > w[1])
        {
            return Err(SparsityError::ColumnStartsNotMonotonic);
        }
        for column in 0..columns {
            let column_rows = &row_indices[column_starts[column]..column_starts[column + 1]];
            for (i, &row) in column_rows.iter().enumerate() {
                if row >= rows || (i > 0 && column_rows[i - 1] >= row) {
                    return Err(SparsityError::InvalidRow { column, row });
                }
            }
        }
        Ok(Sparsity {
            rows,
            columns,
            column_starts,
            row_indices,
        })
    }

    /**
     * A pattern with every position structurally nonzero.
     */
    pub fn dense(rows: usize, columns: usize) -> Sparsity {
        Sparsity {
            rows,
            columns,
            column_starts: (0..=columns).map(|c| c * rows).collect(),
            row_indices: (0..columns).flat_map(|_| 0..rows).collect(),
        }
    }

    /**
     * A pattern of the given shape with no structural nonzeros at all.
     */
    pub fn empty(rows: usize, columns: usize) -> Sparsity {
        Sparsity {
            rows,
            columns,
            column_starts: vec![0; columns + 1],
            row_indices: Vec::new(),
        }
    }

    /**
     * A dense 1x1 pattern.
     */
    pub fn scalar() -> Sparsity {
        Sparsity::dense(1, 1)
    }

    /**
     * An `n` x `n` pattern with only the diagonal structurally nonzero.
     */
    pub fn diagonal(n: usize) -> Sparsity {
        Sparsity {
            rows: n,
            columns: n,
            column_starts: (0..=n).collect(),
            row_indices: (0..n).collect(),
        }
    }

    /**
     * Creates a pattern from a list of (row, column) positions in any order. Repeated
     * positions are merged.
     */
    pub fn from_triplets(
        rows: usize,
        columns: usize,
        positions: &[(usize, usize)],
    ) -> Result<Sparsity, SparsityError> {
        if let Some(&(row, column)) = positions
            .iter()
            .find(|&&(row, column)| row >= rows || column >= columns)
        {
            return Err(SparsityError::OutOfBounds {
                row,
                column,
                shape: (rows, columns),
            });
        }
        let mut sorted: Vec<(usize, usize)> = positions.iter().map(|&(r, c)| (c, r)).collect();
        sorted.sort_unstable();
        sorted.dedup();
        Ok(Sparsity::from_sorted_column_major(rows, columns, &sorted))
    }

    /**
     * Builds a pattern from (column, row) pairs already sorted and free of duplicates.
     */
    pub(crate) fn from_sorted_column_major(rows: usize, columns: usize, sorted: &[(usize, usize)]) -> Sparsity {
        let mut column_starts = vec![0; columns + 1];
        for &(column, _) in sorted {
            column_starts[column + 1] += 1;
        }
        for column in 0..columns {
            column_starts[column + 1] += column_starts[column];
        }
        Sparsity {
            rows,
            columns,
            column_starts,
            row_indices: sorted.iter().map(|&(_, row)| row).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /**
     * Returns the dimensionality of this pattern in Row, Column format
     */
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /**
     * The number of structural nonzeros.
     */
    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    /**
     * The number of elements, structural zeros included.
     */
    pub fn numel(&self) -> usize {
        self.rows * self.columns
    }

    pub fn is_dense(&self) -> bool {
        self.nnz() == self.numel()
    }

    /**
     * True for any 1x1 pattern, whether or not its single element is structurally nonzero.
     */
    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.columns == 1
    }

    /**
     * True if the pattern has no elements at all, such as a 0x0 or 3x0 matrix.
     */
    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.columns == 1
    }

    pub fn column_starts(&self) -> &[usize] {
        &self.column_starts
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /**
     * Iterates through the (row, column) position of every structural nonzero in
     * nonzero order.
     */
    pub fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.columns).flat_map(move |column| {
            self.row_indices[self.column_starts[column]..self.column_starts[column + 1]]
                .iter()
                .map(move |&row| (row, column))
        })
    }

    /**
     * Finds the nonzero index of a position, or None if it is a structural zero or out
     * of bounds.
     */
    pub fn find(&self, row: usize, column: usize) -> Option<usize> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let start = self.column_starts[column];
        let end = self.column_starts[column + 1];
        self.row_indices[start..end]
            .binary_search(&row)
            .ok()
            .map(|offset| start + offset)
    }

    /**
     * The nonzero index of the element at a column major linear index, or None if that
     * element is a structural zero.
     */
    pub fn find_element(&self, element: usize) -> Option<usize> {
        if self.rows == 0 {
            return None;
        }
        self.find(element % self.rows, element / self.rows)
    }

    #[track_caller]
    fn assert_same_shape(&self, other: &Sparsity, operation: &str) {
        assert!(
            self.shape() == other.shape(),
            "Mismatched sparsity patterns, left is {}x{}, right is {}x{}, {} is only defined for MxN and MxN",
            self.rows,
            self.columns,
            other.rows,
            other.columns,
            operation
        );
    }

    /**
     * The pattern nonzero wherever either pattern is nonzero.
     */
    #[track_caller]
    pub fn union(&self, other: &Sparsity) -> Sparsity {
        self.assert_same_shape(other, "union");
        if self == other {
            return self.clone();
        }
        self.merge(other, |a, b| a || b)
    }

    /**
     * The pattern nonzero wherever both patterns are nonzero.
     */
    #[track_caller]
    pub fn intersection(&self, other: &Sparsity) -> Sparsity {
        self.assert_same_shape(other, "intersection");
        if self == other {
            return self.clone();
        }
        self.merge(other, |a, b| a && b)
    }

    fn merge(&self, other: &Sparsity, keep: impl Fn(bool, bool) -> bool) -> Sparsity {
        let mut column_starts = Vec::with_capacity(self.columns + 1);
        let mut row_indices = Vec::new();
        column_starts.push(0);
        for column in 0..self.columns {
            let left = &self.row_indices[self.column_starts[column]..self.column_starts[column + 1]];
            let right =
                &other.row_indices[other.column_starts[column]..other.column_starts[column + 1]];
            let (mut i, mut j) = (0, 0);
            while i < left.len() || j < right.len() {
                let l = left.get(i).copied().unwrap_or(usize::MAX);
                let r = right.get(j).copied().unwrap_or(usize::MAX);
                let row = l.min(r);
                if keep(l == row, r == row) {
                    row_indices.push(row);
                }
                if l == row {
                    i += 1;
                }
                if r == row {
                    j += 1;
                }
            }
            column_starts.push(row_indices.len());
        }
        Sparsity {
            rows: self.rows,
            columns: self.columns,
            column_starts,
            row_indices,
        }
    }

    /**
     * Returns the transposed pattern together with, for each of its nonzeros, the index
     * of the corresponding nonzero in this pattern.
     */
    pub fn transpose(&self) -> (Sparsity, Vec<usize>) {
        let mut entries: Vec<(usize, usize, usize)> = self
            .coordinates()
            .enumerate()
            .map(|(k, (row, column))| (row, column, k))
            .collect();
        // the transposed column is our row
        entries.sort_unstable();
        let sorted: Vec<(usize, usize)> = entries.iter().map(|&(r, c, _)| (r, c)).collect();
        let mapping = entries.iter().map(|&(_, _, k)| k).collect();
        (
            Sparsity::from_sorted_column_major(self.columns, self.rows, &sorted),
            mapping,
        )
    }

    /**
     * The compact integer representation `[rows, columns, column_starts.., row_indices..]`
     * used by generated code.
     */
    pub fn compress(&self) -> Vec<usize> {
        let mut compressed = Vec::with_capacity(2 + self.column_starts.len() + self.nnz());
        compressed.push(self.rows);
        compressed.push(self.columns);
        compressed.extend_from_slice(self.column_starts());
        compressed.extend_from_slice(self.row_indices());
        compressed
    }
}

/**
 * A pattern is displayed by its shape and number of nonzeros, ie `2x3, 4 nnz`.
 */
impl fmt::Display for Sparsity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}, {} nnz", self.rows, self.columns, self.nnz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_coordinates_are_column_major() {
        let pattern = Sparsity::dense(2, 2);
        let coordinates: Vec<_> = pattern.coordinates().collect();
        assert_eq!(coordinates, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn rejects_unsorted_rows() {
        let result = Sparsity::new(3, 1, vec![0, 2], vec![2, 1]);
        assert_eq!(result, Err(SparsityError::InvalidRow { column: 0, row: 1 }));
    }

    #[test]
    fn merge_patterns() {
        let a = Sparsity::from_triplets(2, 2, &[(0, 0), (1, 1)]).unwrap();
        let b = Sparsity::from_triplets(2, 2, &[(1, 0), (1, 1)]).unwrap();
        assert_eq!(a.union(&b).nnz(), 3);
        assert_eq!(
            a.intersection(&b),
            Sparsity::from_triplets(2, 2, &[(1, 1)]).unwrap()
        );
    }
}
