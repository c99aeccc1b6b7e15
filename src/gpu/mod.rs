//! GPU device management and VRAM accounting.
//!
//! - [`device`]: GPU device discovery and info
//! - [`context`]: Budgeted allocation of device matrix buffers

pub mod context;
pub mod device;

pub use context::{DeviceContext, GpuError};
pub use device::{detect_devices, stub_device, GpuDeviceInfo};
