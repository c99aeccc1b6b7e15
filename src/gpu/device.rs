//! GPU device discovery and information.
//!
//! Detects available GPUs and their VRAM capacity.
//! When compiled without the `cuda` feature, provides stub info.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Information about a single GPU device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuDeviceInfo {
    /// Device index.
    pub id: usize,

    /// Device name (e.g., "NVIDIA GeForce GTX TITAN X").
    pub name: String,

    /// Total VRAM in bytes.
    pub total_vram: usize,

    /// Free VRAM in bytes (at detection time).
    pub free_vram: usize,

    /// Compute capability (major, minor).
    pub compute_capability: (u32, u32),
}

impl GpuDeviceInfo {
    /// Whether a buffer of `bytes` would fit in this device's free VRAM.
    pub fn fits(&self, bytes: usize) -> bool {
        bytes <= self.free_vram
    }
}

/// Detect all available GPU devices.
///
/// With the `cuda` feature enabled, uses the CUDA runtime to enumerate
/// devices. Without it, returns an empty list (CPU-only mode).
pub fn detect_devices() -> Vec<GpuDeviceInfo> {
    #[cfg(feature = "cuda")]
    {
        detect_devices_cuda()
    }

    #[cfg(not(feature = "cuda"))]
    {
        info!("CUDA not enabled, running in CPU-only mode");
        Vec::new()
    }
}

#[cfg(feature = "cuda")]
fn detect_devices_cuda() -> Vec<GpuDeviceInfo> {
    // Real implementation would use cudarc to enumerate devices and query
    // cuMemGetInfo per device. Compile-time gated until cudarc is wired up.
    todo!("Implement CUDA device detection with cudarc")
}

/// Stub info for the single training GPU used in tests and CPU-only runs.
pub fn stub_device() -> GpuDeviceInfo {
    GpuDeviceInfo {
        id: 0,
        name: "NVIDIA GeForce GTX TITAN X".to_string(),
        total_vram: 12 * 1024 * 1024 * 1024,      // 12 GB
        free_vram: 11 * 1024 * 1024 * 1024,        // ~11 GB free
        compute_capability: (5, 2),
    }
}
