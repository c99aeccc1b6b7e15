//! BLAS-style operations on device matrices.
//!
//! - [`reference`]: raw column-major kernels with the vendor calling
//!   convention (leading dimensions, transpose flags, alpha/beta)
//!
//! The shaped wrappers here derive every dimension from the matrix shapes
//! and check them before dispatching. In a real CUDA build these dispatch to
//! cuBLAS through `cudarc` — `cublasSgemm`/`cublasDgemm` and friends, chosen
//! by element width exactly as the [`Real`] impl chooses the kernel here.
//! Without the `cuda` feature they run the reference kernels on the
//! simulated device memory.

pub mod reference;

pub use reference::{dgmm, geam, gemm, gemv, BlasError, Op, Side};

use crate::matrix::{DeviceMatrix, Real};

fn op_shape<T: Real>(m: &DeviceMatrix<T>, op: Op) -> (usize, usize) {
    match op {
        Op::None => (m.rows(), m.cols()),
        Op::Transpose => (m.cols(), m.rows()),
    }
}

/// `C = alpha * op(A) * op(B) + beta * C`.
pub fn matmul<T: Real>(
    transa: Op,
    transb: Op,
    alpha: T,
    a: &DeviceMatrix<T>,
    b: &DeviceMatrix<T>,
    beta: T,
    c: &mut DeviceMatrix<T>,
) -> Result<(), BlasError> {
    let (m, k) = op_shape(a, transa);
    let (k2, n) = op_shape(b, transb);
    if k != k2 {
        return Err(BlasError::DimMismatch(format!(
            "op(A) is {m}x{k} but op(B) is {k2}x{n}"
        )));
    }
    if !c.has_shape(m, n) {
        return Err(BlasError::DimMismatch(format!(
            "C is {}x{} but product is {m}x{n}",
            c.rows(),
            c.cols()
        )));
    }

    let (lda, ldb, ldc) = (a.rows(), b.rows(), c.rows());
    gemm(
        transa,
        transb,
        m,
        n,
        k,
        alpha,
        a.as_slice(),
        lda,
        b.as_slice(),
        ldb,
        beta,
        c.as_mut_slice(),
        ldc,
    )
}

/// `C = alpha * op(A) + beta * op(B)`.
pub fn matadd<T: Real>(
    transa: Op,
    transb: Op,
    alpha: T,
    a: &DeviceMatrix<T>,
    beta: T,
    b: &DeviceMatrix<T>,
    c: &mut DeviceMatrix<T>,
) -> Result<(), BlasError> {
    let (m, n) = op_shape(a, transa);
    let (m2, n2) = op_shape(b, transb);
    if (m, n) != (m2, n2) || !c.has_shape(m, n) {
        return Err(BlasError::DimMismatch(format!(
            "op(A) {m}x{n}, op(B) {m2}x{n2}, C {}x{}",
            c.rows(),
            c.cols()
        )));
    }

    let (lda, ldb, ldc) = (a.rows(), b.rows(), c.rows());
    geam(
        transa,
        transb,
        m,
        n,
        alpha,
        a.as_slice(),
        lda,
        beta,
        b.as_slice(),
        ldb,
        c.as_mut_slice(),
        ldc,
    )
}

/// `y = alpha * op(A) * x + beta * y`, with `x` and `y` device column vectors.
pub fn matvec<T: Real>(
    trans: Op,
    alpha: T,
    a: &DeviceMatrix<T>,
    x: &DeviceMatrix<T>,
    beta: T,
    y: &mut DeviceMatrix<T>,
) -> Result<(), BlasError> {
    let (x_len, y_len) = match trans {
        Op::None => (a.cols(), a.rows()),
        Op::Transpose => (a.rows(), a.cols()),
    };
    if !x.has_shape(x_len, 1) || !y.has_shape(y_len, 1) {
        return Err(BlasError::DimMismatch(format!(
            "A is {}x{}, x is {}x{}, y is {}x{}",
            a.rows(),
            a.cols(),
            x.rows(),
            x.cols(),
            y.rows(),
            y.cols()
        )));
    }

    let lda = a.rows();
    gemv(
        trans,
        a.rows(),
        a.cols(),
        alpha,
        a.as_slice(),
        lda,
        x.as_slice(),
        1,
        beta,
        y.as_mut_slice(),
        1,
    )
}

/// Diagonal scaling: `C = diag(x) * A` (left, row scaling) or
/// `C = A * diag(x)` (right, column scaling).
pub fn diag_scale<T: Real>(
    side: Side,
    a: &DeviceMatrix<T>,
    x: &DeviceMatrix<T>,
    c: &mut DeviceMatrix<T>,
) -> Result<(), BlasError> {
    let x_len = match side {
        Side::Left => a.rows(),
        Side::Right => a.cols(),
    };
    if !x.has_shape(x_len, 1) || !c.has_shape(a.rows(), a.cols()) {
        return Err(BlasError::DimMismatch(format!(
            "A is {}x{}, x is {}x{}, C is {}x{}",
            a.rows(),
            a.cols(),
            x.rows(),
            x.cols(),
            c.rows(),
            c.cols()
        )));
    }

    dgmm(
        side,
        a.rows(),
        a.cols(),
        a.as_slice(),
        a.rows(),
        x.as_slice(),
        1,
        c.as_mut_slice(),
        a.rows(),
    )
}

/// Elementwise `e^x` in place (`expf` for f32, `exp` for f64).
pub fn exp_inplace<T: Real>(m: &mut DeviceMatrix<T>) {
    for v in m.as_mut_slice() {
        *v = v.exp();
    }
}

/// Elementwise natural log in place (`logf` for f32, `log` for f64).
pub fn ln_inplace<T: Real>(m: &mut DeviceMatrix<T>) {
    for v in m.as_mut_slice() {
        *v = v.ln();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::DeviceContext;
    use crate::matrix::HostMatrix;
    use crate::transfer::TransferEngine;

    fn upload(
        ctx: &DeviceContext,
        engine: &mut TransferEngine,
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    ) -> DeviceMatrix<f64> {
        let host = HostMatrix::from_column_major(rows, cols, data);
        let mut dev = ctx.alloc_matrix(rows, cols).unwrap();
        engine.upload(&host, &mut dev).unwrap();
        dev
    }

    #[test]
    fn test_matmul_shapes_and_result() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let a = upload(&ctx, &mut engine, 2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = upload(&ctx, &mut engine, 3, 1, vec![1.0, 1.0, 1.0]);
        let mut c = ctx.alloc_matrix::<f64>(2, 1).unwrap();

        matmul(Op::None, Op::None, 1.0, &a, &b, 0.0, &mut c).unwrap();
        let result = engine.download_new(&c);
        // Row sums of A = [1 3 5; 2 4 6].
        assert_eq!(result.as_slice(), &[9.0, 12.0]);
    }

    #[test]
    fn test_matmul_inner_dim_checked() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let a = ctx.alloc_matrix::<f64>(2, 3).unwrap();
        let b = ctx.alloc_matrix::<f64>(2, 2).unwrap();
        let mut c = ctx.alloc_matrix::<f64>(2, 2).unwrap();

        let err = matmul(Op::None, Op::None, 1.0, &a, &b, 0.0, &mut c).unwrap_err();
        assert!(matches!(err, BlasError::DimMismatch(_)));

        // A^T makes the inner dimensions agree.
        matmul(Op::Transpose, Op::None, 1.0, &b, &a, 0.0, &mut c)
            .unwrap_err(); // C is 2x2 but product is 2x3
    }

    #[test]
    fn test_matadd() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let a = upload(&ctx, &mut engine, 2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = upload(&ctx, &mut engine, 2, 2, vec![4.0, 3.0, 2.0, 1.0]);
        let mut c = ctx.alloc_matrix::<f64>(2, 2).unwrap();

        matadd(Op::None, Op::None, 1.0, &a, 1.0, &b, &mut c).unwrap();
        assert_eq!(engine.download_new(&c).as_slice(), &[5.0; 4]);
    }

    #[test]
    fn test_matvec_transpose() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let a = upload(&ctx, &mut engine, 2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let x = upload(&ctx, &mut engine, 2, 1, vec![1.0, 1.0]);
        let mut y = ctx.alloc_vector::<f64>(2).unwrap();

        matvec(Op::Transpose, 1.0, &a, &x, 0.0, &mut y).unwrap();
        // Column sums of [1 3; 2 4].
        assert_eq!(engine.download_new(&y).as_slice(), &[3.0, 7.0]);
    }

    #[test]
    fn test_diag_scale_columns() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let a = upload(&ctx, &mut engine, 2, 2, vec![1.0, 1.0, 1.0, 1.0]);
        let x = upload(&ctx, &mut engine, 2, 1, vec![2.0, 3.0]);
        let mut c = ctx.alloc_matrix::<f64>(2, 2).unwrap();

        diag_scale(Side::Right, &a, &x, &mut c).unwrap();
        assert_eq!(engine.download_new(&c).as_slice(), &[2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_exp_ln_round_trip() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let host = HostMatrix::from_column_major(2, 1, vec![0.5f64, 2.0]);
        let mut m = ctx.alloc_vector::<f64>(2).unwrap();
        engine.upload(&host, &mut m).unwrap();

        exp_inplace(&mut m);
        ln_inplace(&mut m);

        let back = engine.download_new(&m);
        for (orig, round) in host.as_slice().iter().zip(back.as_slice()) {
            assert!((orig - round).abs() < 1e-12);
        }
    }
}
