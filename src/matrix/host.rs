//! Host-resident matrix buffer.
//!
//! A contiguous `Vec` in process memory interpreted as a dense column-major
//! matrix. Host buffers are the staging ground for initialization: filled on
//! the CPU, uploaded to a paired device buffer, then usually dropped.

use std::fmt;

use super::{idx2c, Element};

/// Dense column-major matrix in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMatrix<T: Element> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Element> HostMatrix<T> {
    /// All-zeros matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// All-ones matrix.
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::one())
    }

    /// Matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Zeroed column vector (a `len`×1 matrix).
    pub fn vector(len: usize) -> Self {
        Self::zeros(len, 1)
    }

    /// Wrap an existing column-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_column_major(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "buffer length {} does not match {rows}x{cols}",
            data.len()
        );
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffer size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len() * T::WIDTH
    }

    /// Element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.data[idx2c(i, j, self.rows)]
    }

    /// Set element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        let idx = idx2c(i, j, self.rows);
        self.data[idx] = value;
    }

    /// The underlying column-major buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Column `j` as a contiguous slice.
    pub fn column(&self, j: usize) -> &[T] {
        let start = idx2c(0, j, self.rows);
        &self.data[start..start + self.rows]
    }
}

/// Row-major pretty printer for debugging, one matrix row per line.
impl<T: Element> fmt::Display for HostMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
