//! Composite buffer-setup helpers.
//!
//! Each helper runs the standard lifecycle for one model buffer: allocate a
//! host staging matrix, fill it with the named strategy, allocate the paired
//! device matrix, upload, then drop the host copy. With the `keep_host`
//! debug flag the host copy survives so it can feed the CPU reference path.

use thiserror::Error;

use crate::gpu::{DeviceContext, GpuError};
use crate::init::Initializer;
use crate::matrix::{DeviceMatrix, Element, HostMatrix};
use crate::transfer::{TransferEngine, TransferError};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// A device buffer plus its host staging copy when `keep_host` is set.
#[derive(Debug)]
pub struct Setup<T: Element> {
    pub device: DeviceMatrix<T>,
    pub host: Option<HostMatrix<T>>,
}

/// Bundles the pieces every setup call needs.
pub struct SetupContext<'a> {
    ctx: &'a DeviceContext,
    engine: &'a mut TransferEngine,
    init: &'a mut Initializer,
    keep_host: bool,
}

impl<'a> SetupContext<'a> {
    pub fn new(
        ctx: &'a DeviceContext,
        engine: &'a mut TransferEngine,
        init: &'a mut Initializer,
        keep_host: bool,
    ) -> Self {
        Self {
            ctx,
            engine,
            init,
            keep_host,
        }
    }

    fn finish<T: Element>(
        &mut self,
        host: HostMatrix<T>,
    ) -> Result<Setup<T>, SetupError> {
        let mut device = self.ctx.alloc_matrix::<T>(host.rows(), host.cols())?;
        self.engine.upload(&host, &mut device)?;
        Ok(Setup {
            device,
            host: self.keep_host.then_some(host),
        })
    }

    /// Uniform-random weight matrix.
    pub fn matrix_uniform<T: Element>(
        &mut self,
        rows: usize,
        cols: usize,
    ) -> Result<Setup<T>, SetupError> {
        let mut host = HostMatrix::zeros(rows, cols);
        self.init.fill_uniform(&mut host);
        self.finish(host)
    }

    /// All-zeros matrix (gradient accumulators and the like).
    pub fn matrix_zeros<T: Element>(
        &mut self,
        rows: usize,
        cols: usize,
    ) -> Result<Setup<T>, SetupError> {
        self.finish(HostMatrix::zeros(rows, cols))
    }

    /// Uniform-random column vector.
    pub fn vector_uniform<T: Element>(&mut self, len: usize) -> Result<Setup<T>, SetupError> {
        self.matrix_uniform(len, 1)
    }

    /// All-ones column vector.
    pub fn vector_ones<T: Element>(&mut self, len: usize) -> Result<Setup<T>, SetupError> {
        self.finish(HostMatrix::ones(len, 1))
    }

    /// Vector of random vocabulary indices in `[0, vocab_size)`.
    pub fn vector_vocab(
        &mut self,
        len: usize,
        vocab_size: usize,
    ) -> Result<Setup<i32>, SetupError> {
        let mut host = HostMatrix::vector(len);
        self.init.fill_vocab(&mut host, vocab_size);
        self.finish(host)
    }

    /// Vector of random 0/1 values.
    pub fn vector_binary(&mut self, len: usize) -> Result<Setup<i32>, SetupError> {
        let mut host = HostMatrix::vector(len);
        self.init.fill_binary(&mut host);
        self.finish(host)
    }
}
