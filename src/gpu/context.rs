//! Budgeted device-memory context.
//!
//! Every device matrix is allocated through a [`DeviceContext`], which counts
//! bytes in use against a fixed VRAM budget. Allocation past the budget is an
//! error; the count drops when a buffer is dropped.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::gpu::device::GpuDeviceInfo;
use crate::matrix::{DeviceMatrix, Element};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error(
        "out of GPU memory on device {device_id}: requested {requested} bytes, {available} available"
    )]
    OutOfMemory {
        device_id: usize,
        requested: usize,
        available: usize,
    },

    #[error("zero-sized allocation: {rows}x{cols} matrix on device {device_id}")]
    ZeroSized {
        device_id: usize,
        rows: usize,
        cols: usize,
    },
}

/// Per-device allocation context.
///
/// Owns the VRAM budget for one GPU. Device buffers created here hold a
/// handle to the shared bytes-in-use counter and release their share when
/// dropped, so the context's view of free memory stays accurate without any
/// free-list bookkeeping.
pub struct DeviceContext {
    device_id: usize,

    /// VRAM budget in bytes.
    vram_budget: usize,

    /// Bytes currently allocated, shared with live buffers.
    vram_used: Arc<AtomicUsize>,

    /// Total number of allocations performed.
    alloc_count: AtomicU64,
}

impl DeviceContext {
    /// Create a context with an explicit byte budget.
    pub fn new(device_id: usize, vram_budget: usize) -> Self {
        Self {
            device_id,
            vram_budget,
            vram_used: Arc::new(AtomicUsize::new(0)),
            alloc_count: AtomicU64::new(0),
        }
    }

    /// Create a context budgeted to a detected device's free VRAM.
    pub fn for_device(info: &GpuDeviceInfo) -> Self {
        Self::new(info.id, info.free_vram)
    }

    /// Allocate a `rows`×`cols` device matrix.
    pub fn alloc_matrix<T: Element>(
        &self,
        rows: usize,
        cols: usize,
    ) -> Result<DeviceMatrix<T>, GpuError> {
        if rows == 0 || cols == 0 {
            return Err(GpuError::ZeroSized {
                device_id: self.device_id,
                rows,
                cols,
            });
        }

        let bytes = rows * cols * T::WIDTH;
        let used = self.vram_used.load(Ordering::Relaxed);
        if used + bytes > self.vram_budget {
            return Err(GpuError::OutOfMemory {
                device_id: self.device_id,
                requested: bytes,
                available: self.vram_budget.saturating_sub(used),
            });
        }

        self.vram_used.fetch_add(bytes, Ordering::Relaxed);
        self.alloc_count.fetch_add(1, Ordering::Relaxed);
        debug!(
            device = self.device_id,
            rows, cols, bytes, "Allocated device matrix"
        );

        Ok(DeviceMatrix::new(
            self.device_id,
            rows,
            cols,
            self.vram_used.clone(),
        ))
    }

    /// Allocate a `len`-element device column vector.
    pub fn alloc_vector<T: Element>(&self, len: usize) -> Result<DeviceMatrix<T>, GpuError> {
        self.alloc_matrix(len, 1)
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// Bytes currently allocated.
    pub fn vram_used(&self) -> usize {
        self.vram_used.load(Ordering::Relaxed)
    }

    pub fn vram_budget(&self) -> usize {
        self.vram_budget
    }

    /// Fraction of the budget in use.
    pub fn utilization(&self) -> f64 {
        if self.vram_budget == 0 {
            return 0.0;
        }
        self.vram_used() as f64 / self.vram_budget as f64
    }

    /// Total number of allocations performed over the context's lifetime.
    pub fn alloc_count(&self) -> u64 {
        self.alloc_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_within_budget() {
        let ctx = DeviceContext::new(0, 1024);

        // 64 f32 elements = 256 bytes.
        let m = ctx.alloc_matrix::<f32>(8, 8).unwrap();
        assert_eq!(m.size_bytes(), 256);
        assert_eq!(ctx.vram_used(), 256);
        assert_eq!(ctx.alloc_count(), 1);
    }

    #[test]
    fn test_budget_exhaustion() {
        let ctx = DeviceContext::new(0, 256);

        let _a = ctx.alloc_matrix::<f32>(8, 8).unwrap(); // fills the budget
        let err = ctx.alloc_matrix::<f32>(1, 1).unwrap_err();
        assert!(matches!(err, GpuError::OutOfMemory { available: 0, .. }));
    }

    #[test]
    fn test_drop_returns_budget() {
        let ctx = DeviceContext::new(0, 256);

        {
            let _a = ctx.alloc_matrix::<f32>(8, 8).unwrap();
            assert_eq!(ctx.utilization(), 1.0);
        }
        assert_eq!(ctx.vram_used(), 0);

        // Budget is available again.
        ctx.alloc_matrix::<f64>(4, 8).unwrap();
    }

    #[test]
    fn test_zero_sized_rejected() {
        let ctx = DeviceContext::new(0, 1024);
        assert!(matches!(
            ctx.alloc_matrix::<f32>(0, 8),
            Err(GpuError::ZeroSized { .. })
        ));
    }

    #[test]
    fn test_element_width_in_sizing() {
        let ctx = DeviceContext::new(0, 1024);
        let h = ctx.alloc_matrix::<half::f16>(8, 8).unwrap();
        assert_eq!(h.size_bytes(), 128);

        let d = ctx.alloc_matrix::<f64>(8, 8).unwrap();
        assert_eq!(d.size_bytes(), 512);
    }
}
