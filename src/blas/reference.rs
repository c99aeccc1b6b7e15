//! Column-major reference kernels.
//!
//! Straight-line loop implementations of the BLAS-style operations the
//! trainer uses, with the vendor library's calling convention: leading
//! dimensions, transpose options, and alpha/beta scaling. Precision dispatch
//! happens through the [`Real`] trait — `f32` and `f64` take the place of
//! the S/D entry-point pairs.

use thiserror::Error;

use crate::matrix::{idx2c, Real};

/// Transpose option for an operand, mirroring `cublasOperation_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Use the operand as stored.
    None,
    /// Use the operand's transpose.
    Transpose,
}

/// Which side a diagonal matrix multiplies from, mirroring `cublasSideMode_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `C = diag(x) * A`.
    Left,
    /// `C = A * diag(x)`.
    Right,
}

#[derive(Error, Debug)]
pub enum BlasError {
    #[error("leading dimension {ld} smaller than row count {rows}")]
    BadLeadingDim { ld: usize, rows: usize },

    #[error("{operand} buffer too small: need {needed} elements, have {have}")]
    BufferTooSmall {
        operand: &'static str,
        needed: usize,
        have: usize,
    },

    #[error("dimension mismatch: {0}")]
    DimMismatch(String),
}

fn check_operand<T>(
    operand: &'static str,
    buf: &[T],
    ld: usize,
    rows: usize,
    cols: usize,
) -> Result<(), BlasError> {
    if ld < rows.max(1) {
        return Err(BlasError::BadLeadingDim { ld, rows });
    }
    let needed = ld * cols;
    if buf.len() < needed {
        return Err(BlasError::BufferTooSmall {
            operand,
            needed,
            have: buf.len(),
        });
    }
    Ok(())
}

/// `C = alpha * op(A) * op(B) + beta * C`.
///
/// `op(A)` is m×k, `op(B)` is k×n, `C` is m×n. As with the vendor call,
/// `beta == 0` overwrites `C` without reading it.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Real>(
    transa: Op,
    transb: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) -> Result<(), BlasError> {
    let (a_rows, a_cols) = match transa {
        Op::None => (m, k),
        Op::Transpose => (k, m),
    };
    let (b_rows, b_cols) = match transb {
        Op::None => (k, n),
        Op::Transpose => (n, k),
    };
    check_operand("A", a, lda, a_rows, a_cols)?;
    check_operand("B", b, ldb, b_rows, b_cols)?;
    check_operand("C", c, ldc, m, n)?;

    for j in 0..n {
        for i in 0..m {
            let mut acc = T::ZERO;
            for l in 0..k {
                let av = match transa {
                    Op::None => a[idx2c(i, l, lda)],
                    Op::Transpose => a[idx2c(l, i, lda)],
                };
                let bv = match transb {
                    Op::None => b[idx2c(l, j, ldb)],
                    Op::Transpose => b[idx2c(j, l, ldb)],
                };
                acc = acc + av * bv;
            }
            let cidx = idx2c(i, j, ldc);
            c[cidx] = if beta == T::ZERO {
                alpha * acc
            } else {
                alpha * acc + beta * c[cidx]
            };
        }
    }
    Ok(())
}

/// `C = alpha * op(A) + beta * op(B)`, all m×n.
#[allow(clippy::too_many_arguments)]
pub fn geam<T: Real>(
    transa: Op,
    transb: Op,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    beta: T,
    b: &[T],
    ldb: usize,
    c: &mut [T],
    ldc: usize,
) -> Result<(), BlasError> {
    let (a_rows, a_cols) = match transa {
        Op::None => (m, n),
        Op::Transpose => (n, m),
    };
    let (b_rows, b_cols) = match transb {
        Op::None => (m, n),
        Op::Transpose => (n, m),
    };
    check_operand("A", a, lda, a_rows, a_cols)?;
    check_operand("B", b, ldb, b_rows, b_cols)?;
    check_operand("C", c, ldc, m, n)?;

    for j in 0..n {
        for i in 0..m {
            let av = match transa {
                Op::None => a[idx2c(i, j, lda)],
                Op::Transpose => a[idx2c(j, i, lda)],
            };
            let bv = match transb {
                Op::None => b[idx2c(i, j, ldb)],
                Op::Transpose => b[idx2c(j, i, ldb)],
            };
            c[idx2c(i, j, ldc)] = alpha * av + beta * bv;
        }
    }
    Ok(())
}

/// `y = alpha * op(A) * x + beta * y`.
///
/// `A` is stored m×n; with `Op::None`, `x` has n elements and `y` has m,
/// swapped under transpose. Strides are in elements and must be nonzero.
#[allow(clippy::too_many_arguments)]
pub fn gemv<T: Real>(
    trans: Op,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    x: &[T],
    incx: usize,
    beta: T,
    y: &mut [T],
    incy: usize,
) -> Result<(), BlasError> {
    check_operand("A", a, lda, m, n)?;
    if incx == 0 || incy == 0 {
        return Err(BlasError::DimMismatch("vector stride must be nonzero".into()));
    }

    let (x_len, y_len) = match trans {
        Op::None => (n, m),
        Op::Transpose => (m, n),
    };
    if x.len() < (x_len.saturating_sub(1)) * incx + 1 {
        return Err(BlasError::BufferTooSmall {
            operand: "x",
            needed: (x_len.saturating_sub(1)) * incx + 1,
            have: x.len(),
        });
    }
    if y.len() < (y_len.saturating_sub(1)) * incy + 1 {
        return Err(BlasError::BufferTooSmall {
            operand: "y",
            needed: (y_len.saturating_sub(1)) * incy + 1,
            have: y.len(),
        });
    }

    for r in 0..y_len {
        let mut acc = T::ZERO;
        for c in 0..x_len {
            let av = match trans {
                Op::None => a[idx2c(r, c, lda)],
                Op::Transpose => a[idx2c(c, r, lda)],
            };
            acc = acc + av * x[c * incx];
        }
        let yi = r * incy;
        y[yi] = if beta == T::ZERO {
            alpha * acc
        } else {
            alpha * acc + beta * y[yi]
        };
    }
    Ok(())
}

/// Diagonal scaling: `C = diag(x) * A` (left) or `C = A * diag(x)` (right),
/// with `A` and `C` both m×n.
#[allow(clippy::too_many_arguments)]
pub fn dgmm<T: Real>(
    side: Side,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    x: &[T],
    incx: usize,
    c: &mut [T],
    ldc: usize,
) -> Result<(), BlasError> {
    check_operand("A", a, lda, m, n)?;
    check_operand("C", c, ldc, m, n)?;
    if incx == 0 {
        return Err(BlasError::DimMismatch("vector stride must be nonzero".into()));
    }

    let x_len = match side {
        Side::Left => m,
        Side::Right => n,
    };
    if x.len() < (x_len.saturating_sub(1)) * incx + 1 {
        return Err(BlasError::BufferTooSmall {
            operand: "x",
            needed: (x_len.saturating_sub(1)) * incx + 1,
            have: x.len(),
        });
    }

    for j in 0..n {
        for i in 0..m {
            let scale = match side {
                Side::Left => x[i * incx],
                Side::Right => x[j * incx],
            };
            c[idx2c(i, j, ldc)] = scale * a[idx2c(i, j, lda)];
        }
    }
    Ok(())
}
