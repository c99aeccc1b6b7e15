//! Device-resident matrix buffer.
//!
//! Allocated only through [`DeviceContext`](crate::gpu::context::DeviceContext)
//! so every buffer is counted against the VRAM budget; the accounting is
//! released on drop. Without the `cuda` feature the backing store is host
//! memory standing in for VRAM — in a real CUDA build this would wrap a
//! `cudarc` device allocation instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::Element;

/// Dense column-major matrix in device memory.
///
/// Device buffers live for the duration of the owning model structure and are
/// only readable/writable from the host through the transfer engine.
#[derive(Debug)]
pub struct DeviceMatrix<T: Element> {
    device_id: usize,
    rows: usize,
    cols: usize,

    /// Simulated VRAM. The real implementation holds a
    /// `cudarc::driver::CudaSlice<T>` here.
    data: Vec<T>,

    /// Shared bytes-in-use counter of the owning context.
    vram_used: Arc<AtomicUsize>,
}

impl<T: Element> DeviceMatrix<T> {
    pub(crate) fn new(
        device_id: usize,
        rows: usize,
        cols: usize,
        vram_used: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            device_id,
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
            vram_used,
        }
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len() * T::WIDTH
    }

    /// Whether this buffer has the same shape as an `rows`×`cols` matrix.
    pub fn has_shape(&self, rows: usize, cols: usize) -> bool {
        self.rows == rows && self.cols == cols
    }

    // Raw access for the transfer engine and the BLAS wrappers. Host code
    // outside this crate goes through the transfer engine.
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Element> Drop for DeviceMatrix<T> {
    fn drop(&mut self) {
        self.vram_used
            .fetch_sub(self.size_bytes(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_queries() {
        let used = Arc::new(AtomicUsize::new(0));
        let m: DeviceMatrix<f32> = DeviceMatrix::new(0, 4, 3, used);
        assert_eq!(m.len(), 12);
        assert_eq!(m.size_bytes(), 48);
        assert!(m.has_shape(4, 3));
        assert!(!m.has_shape(3, 4));
    }

    #[test]
    fn test_drop_releases_accounting() {
        let used = Arc::new(AtomicUsize::new(48));
        {
            let _m: DeviceMatrix<f32> = DeviceMatrix::new(0, 4, 3, used.clone());
        }
        assert_eq!(used.load(Ordering::Relaxed), 0);
    }
}
