//! Host ↔ device transfer engine.
//!
//! Moves matrix and vector buffers between host memory and device memory,
//! byte-for-byte — no element conversion happens in flight, so round-trips
//! are exact for every element type. When the `cuda` feature is disabled the
//! copies land in the simulated VRAM backing of [`DeviceMatrix`].

use thiserror::Error;
use tracing::debug;

use crate::matrix::{DeviceMatrix, Element, HostMatrix};

#[derive(Error, Debug)]
pub enum TransferError {
    #[error(
        "shape mismatch: host is {host_rows}x{host_cols}, device is {dev_rows}x{dev_cols}"
    )]
    ShapeMismatch {
        host_rows: usize,
        host_cols: usize,
        dev_rows: usize,
        dev_cols: usize,
    },
}

/// Transfer statistics.
#[derive(Debug, Default)]
pub struct TransferStats {
    pub total_h2d_bytes: u64,
    pub total_d2h_bytes: u64,
    pub total_h2d_transfers: u64,
    pub total_d2h_transfers: u64,
}

/// Host ↔ device copy engine.
///
/// In a real CUDA build the copies go through `cudarc`'s
/// `htod_sync_copy`/`dtoh_sync_copy` (the `cublasSetMatrix`/`cublasGetMatrix`
/// path); leading dimensions always equal the row count, so whole buffers
/// move as single contiguous copies.
#[derive(Default)]
pub struct TransferEngine {
    stats: TransferStats,
}

impl TransferEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a host matrix into a device matrix of the same shape.
    pub fn upload<T: Element>(
        &mut self,
        host: &HostMatrix<T>,
        device: &mut DeviceMatrix<T>,
    ) -> Result<(), TransferError> {
        self.check_shapes(host, device)?;

        device.as_mut_slice().copy_from_slice(host.as_slice());

        debug!(
            device = device.device_id(),
            rows = host.rows(),
            cols = host.cols(),
            bytes = host.size_bytes(),
            "H2D transfer"
        );
        self.stats.total_h2d_bytes += host.size_bytes() as u64;
        self.stats.total_h2d_transfers += 1;
        Ok(())
    }

    /// Copy a device matrix back into a host matrix of the same shape.
    pub fn download<T: Element>(
        &mut self,
        device: &DeviceMatrix<T>,
        host: &mut HostMatrix<T>,
    ) -> Result<(), TransferError> {
        self.check_shapes(host, device)?;

        host.as_mut_slice().copy_from_slice(device.as_slice());

        debug!(
            device = device.device_id(),
            rows = device.rows(),
            cols = device.cols(),
            bytes = device.size_bytes(),
            "D2H transfer"
        );
        self.stats.total_d2h_bytes += device.size_bytes() as u64;
        self.stats.total_d2h_transfers += 1;
        Ok(())
    }

    /// Download into a freshly allocated host matrix.
    pub fn download_new<T: Element>(&mut self, device: &DeviceMatrix<T>) -> HostMatrix<T> {
        let mut host = HostMatrix::zeros(device.rows(), device.cols());
        // Shapes match by construction.
        let _ = self.download(device, &mut host);
        host
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    fn check_shapes<T: Element>(
        &self,
        host: &HostMatrix<T>,
        device: &DeviceMatrix<T>,
    ) -> Result<(), TransferError> {
        if !device.has_shape(host.rows(), host.cols()) {
            return Err(TransferError::ShapeMismatch {
                host_rows: host.rows(),
                host_cols: host.cols(),
                dev_rows: device.rows(),
                dev_cols: device.cols(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::DeviceContext;

    #[test]
    fn test_round_trip_exact_f32() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let host = HostMatrix::from_column_major(2, 3, vec![1.5f32, -2.25, 0.0, 4.0, 1e-7, -0.08]);
        let mut device = ctx.alloc_matrix::<f32>(2, 3).unwrap();

        engine.upload(&host, &mut device).unwrap();
        let back = engine.download_new(&device);
        assert_eq!(back, host);
    }

    #[test]
    fn test_round_trip_exact_i32_and_f16() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let ints = HostMatrix::from_column_major(4, 1, vec![0i32, 1, 49_999, -7]);
        let mut d_ints = ctx.alloc_vector::<i32>(4).unwrap();
        engine.upload(&ints, &mut d_ints).unwrap();
        assert_eq!(engine.download_new(&d_ints), ints);

        let halves = HostMatrix::from_column_major(
            2,
            1,
            vec![half::f16::from_f64(0.5), half::f16::from_f64(-0.0625)],
        );
        let mut d_halves = ctx.alloc_vector::<half::f16>(2).unwrap();
        engine.upload(&halves, &mut d_halves).unwrap();
        assert_eq!(engine.download_new(&d_halves), halves);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let host: HostMatrix<f32> = HostMatrix::zeros(2, 3);
        let mut device = ctx.alloc_matrix::<f32>(3, 2).unwrap();

        let err = engine.upload(&host, &mut device).unwrap_err();
        assert!(matches!(err, TransferError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_stats_accumulate() {
        let ctx = DeviceContext::new(0, 1 << 20);
        let mut engine = TransferEngine::new();

        let host: HostMatrix<f32> = HostMatrix::zeros(4, 4);
        let mut device = ctx.alloc_matrix::<f32>(4, 4).unwrap();

        engine.upload(&host, &mut device).unwrap();
        engine.upload(&host, &mut device).unwrap();
        let _ = engine.download_new(&device);

        assert_eq!(engine.stats().total_h2d_transfers, 2);
        assert_eq!(engine.stats().total_h2d_bytes, 128);
        assert_eq!(engine.stats().total_d2h_transfers, 1);
        assert_eq!(engine.stats().total_d2h_bytes, 64);
    }
}
