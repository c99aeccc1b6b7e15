//! rnn-gpu-util: GPU memory-management and numeric-initialization helpers
//! for LSTM/RNN training.
//!
//! Provides the buffer plumbing a recurrent-network trainer needs around its
//! kernels: column-major host/device matrices, weight initialization, host ↔
//! device transfers, CPU-reference comparison for correctness debugging, and
//! per-precision wrappers over BLAS-style operations.
//!
//! Without the `cuda` feature, device memory is simulated in host RAM so the
//! entire crate is testable on CPU-only machines.

pub mod blas;
pub mod check;
pub mod config;
pub mod gpu;
pub mod init;
pub mod matrix;
pub mod setup;
pub mod transfer;

pub use matrix::{idx2c, DeviceMatrix, Element, HostMatrix, Real};
