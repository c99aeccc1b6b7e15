//! Benchmarks for buffer fills, transfers, and the reference kernels.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rnn_gpu_util::blas::{self, Op};
use rnn_gpu_util::config::InitConfig;
use rnn_gpu_util::gpu::DeviceContext;
use rnn_gpu_util::init::Initializer;
use rnn_gpu_util::matrix::HostMatrix;
use rnn_gpu_util::transfer::TransferEngine;

fn bench_uniform_fill(c: &mut Criterion) {
    let mut init = Initializer::new(&InitConfig {
        seed: Some(42),
        ..InitConfig::default()
    })
    .unwrap();
    let mut m: HostMatrix<f32> = HostMatrix::zeros(256, 1024);

    c.bench_function("uniform_fill_256x1024_f32", |b| {
        b.iter(|| {
            init.fill_uniform(black_box(&mut m));
        })
    });
}

fn bench_upload(c: &mut Criterion) {
    let ctx = DeviceContext::new(0, 64 * 1024 * 1024);
    let mut engine = TransferEngine::new();
    let host: HostMatrix<f32> = HostMatrix::ones(256, 1024);
    let mut device = ctx.alloc_matrix::<f32>(256, 1024).unwrap();

    c.bench_function("upload_256x1024_f32", |b| {
        b.iter(|| {
            engine.upload(black_box(&host), &mut device).unwrap();
        })
    });
}

fn bench_gemm(c: &mut Criterion) {
    let ctx = DeviceContext::new(0, 64 * 1024 * 1024);
    let mut engine = TransferEngine::new();
    let mut init = Initializer::new(&InitConfig {
        seed: Some(42),
        ..InitConfig::default()
    })
    .unwrap();

    let n = 64;
    let mut host: HostMatrix<f32> = HostMatrix::zeros(n, n);
    init.fill_uniform(&mut host);

    let mut a = ctx.alloc_matrix::<f32>(n, n).unwrap();
    let mut b_mat = ctx.alloc_matrix::<f32>(n, n).unwrap();
    let mut out = ctx.alloc_matrix::<f32>(n, n).unwrap();
    engine.upload(&host, &mut a).unwrap();
    engine.upload(&host, &mut b_mat).unwrap();

    c.bench_function("gemm_64x64_f32", |bench| {
        bench.iter(|| {
            blas::matmul(Op::None, Op::None, 1.0, &a, &b_mat, 0.0, &mut out).unwrap();
        })
    });
}

criterion_group!(benches, bench_uniform_fill, bench_upload, bench_gemm);
criterion_main!(benches);
