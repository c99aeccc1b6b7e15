//! Dense column-major matrix buffers and the scalar traits they range over.
//!
//! All storage in this crate follows the BLAS convention: element `(i, j)` of
//! an R-row matrix sits at linear offset `i + j*R`. Vectors are R×1 matrices.

use std::fmt;

use bytemuck::Pod;

pub mod device;
pub mod host;

pub use device::DeviceMatrix;
pub use host::HostMatrix;

/// Column-major linear index of element `(i, j)` with leading dimension `ld`.
#[inline]
pub const fn idx2c(i: usize, j: usize, ld: usize) -> usize {
    j * ld + i
}

/// A scalar that can live in a matrix buffer.
///
/// Covers the storage types the trainer moves around: `f32`/`f64` weights,
/// `f16` activations, and `i32` vocabulary indices.
pub trait Element:
    Pod + Copy + PartialEq + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Element width in bytes.
    const WIDTH: usize = std::mem::size_of::<Self>();

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;

    fn zero() -> Self {
        Self::default()
    }

    fn one() -> Self {
        Self::from_f64(1.0)
    }
}

impl Element for f32 {
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Element for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Element for half::f16 {
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }

    fn to_f64(self) -> f64 {
        half::f16::to_f64(self)
    }
}

impl Element for i32 {
    fn from_f64(v: f64) -> Self {
        v as i32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

/// A real scalar the BLAS-style kernels can compute with.
///
/// Implemented for `f32` and `f64` only; the impl selects the precision the
/// same way the vendor library's S/D entry points do. Use `f32` for speed,
/// `f64` for gradient checking.
pub trait Real:
    Element
    + PartialOrd
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn abs(self) -> Self;
}

impl Real for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn exp(self) -> Self {
        f32::exp(self)
    }

    fn ln(self) -> Self {
        f32::ln(self)
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Real for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idx2c_column_major() {
        // 3-row matrix: column 1 starts at offset 3.
        assert_eq!(idx2c(0, 0, 3), 0);
        assert_eq!(idx2c(2, 0, 3), 2);
        assert_eq!(idx2c(0, 1, 3), 3);
        assert_eq!(idx2c(1, 2, 3), 7);
    }

    #[test]
    fn test_element_widths() {
        assert_eq!(<f32 as Element>::WIDTH, 4);
        assert_eq!(<f64 as Element>::WIDTH, 8);
        assert_eq!(<half::f16 as Element>::WIDTH, 2);
        assert_eq!(<i32 as Element>::WIDTH, 4);
    }

    #[test]
    fn test_f16_round_trip() {
        let x = half::f16::from_f64(0.0625);
        assert_eq!(x.to_f64(), 0.0625);
    }
}
