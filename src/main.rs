//! rnn-gpu-util selfcheck.
//!
//! Exercises the whole helper surface end to end on one device: discovery,
//! budgeted allocation, every fill strategy, host ↔ device round-trips, and
//! an f32-vs-f64 gemm cross-precision check. Any failure terminates the
//! process with a non-zero exit, after the report has been logged — the
//! fatal policy the training framework expects from these helpers.

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use rnn_gpu_util::blas::{self, Op};
use rnn_gpu_util::check;
use rnn_gpu_util::config::{Cli, Config};
use rnn_gpu_util::gpu::{detect_devices, stub_device, DeviceContext};
use rnn_gpu_util::init::Initializer;
use rnn_gpu_util::matrix::HostMatrix;
use rnn_gpu_util::setup::SetupContext;
use rnn_gpu_util::transfer::TransferEngine;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "rnn_gpu_util=debug"
    } else {
        "rnn_gpu_util=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("rnn-gpu-util v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.init.seed = Some(seed);
    }

    // Pick a device: a detected GPU, or the stub when running CPU-only.
    let devices = detect_devices();
    let device = devices
        .into_iter()
        .find(|d| d.id == config.gpu.device_id)
        .unwrap_or_else(|| {
            info!("No GPU detected, using simulated device");
            stub_device()
        });
    info!(
        device = device.id,
        name = %device.name,
        free_vram = device.free_vram,
        "Selected device"
    );

    let budget = if config.gpu.vram_budget == 0 {
        device.free_vram
    } else {
        config.gpu.vram_budget
    };
    let ctx = DeviceContext::new(device.id, budget);
    let mut engine = TransferEngine::new();
    let mut rng = Initializer::new(&config.init).context("invalid init configuration")?;

    let (rows, cols) = (cli.rows, cli.cols);

    // 1. Round-trip exactness per element type.
    round_trip::<f32>(&ctx, &mut engine, rows, cols)?;
    round_trip::<f64>(&ctx, &mut engine, rows, cols)?;
    round_trip::<half::f16>(&ctx, &mut engine, rows, cols)?;
    round_trip::<i32>(&ctx, &mut engine, rows, cols)?;
    info!("Round-trip checks passed");

    // 2. Fill strategies through the setup pipeline, with bounds verified.
    {
        let mut setup = SetupContext::new(&ctx, &mut engine, &mut rng, true);

        let w = setup.matrix_uniform::<f32>(rows, cols)?;
        let host = w.host.as_ref().context("keep_host was set")?;
        let (lo, hi) = (config.init.lower, config.init.upper);
        if !host
            .as_slice()
            .iter()
            .all(|&x| (x as f64) >= lo && (x as f64) <= hi)
        {
            bail!("uniform fill escaped [{lo}, {hi}]");
        }

        let vocab = setup.vector_vocab(rows, config.check.vocab_size)?;
        let bits = setup.vector_binary(rows)?;
        let _ones = setup.vector_ones::<f32>(rows)?;
        let _zeros = setup.matrix_zeros::<f32>(rows, cols)?;

        let vocab_host = vocab.host.as_ref().context("keep_host was set")?;
        if !vocab_host
            .as_slice()
            .iter()
            .all(|&x| x >= 0 && (x as usize) < config.check.vocab_size)
        {
            bail!("vocabulary fill escaped [0, {})", config.check.vocab_size);
        }
        if !bits
            .host
            .as_ref()
            .context("keep_host was set")?
            .as_slice()
            .iter()
            .all(|&x| x == 0 || x == 1)
        {
            bail!("binary fill produced a value outside {{0, 1}}");
        }
    }
    info!(
        vram_used = ctx.vram_used(),
        utilization = ctx.utilization(),
        allocations = ctx.alloc_count(),
        "Fill strategies passed"
    );

    // 3. Cross-precision gemm: the f32 kernel against the f64 reference.
    cross_precision_gemm(&ctx, &mut engine, &mut rng, rows, cols, config.check.threshold)?;
    info!("Cross-precision gemm check passed");

    let stats = engine.stats();
    info!(
        h2d_transfers = stats.total_h2d_transfers,
        h2d_bytes = stats.total_h2d_bytes,
        d2h_transfers = stats.total_d2h_transfers,
        d2h_bytes = stats.total_d2h_bytes,
        "Selfcheck passed"
    );
    Ok(())
}

/// Upload a patterned matrix and verify the download is bit-identical.
fn round_trip<T: rnn_gpu_util::Element>(
    ctx: &DeviceContext,
    engine: &mut TransferEngine,
    rows: usize,
    cols: usize,
) -> anyhow::Result<()> {
    let mut host: HostMatrix<T> = HostMatrix::zeros(rows, cols);
    for j in 0..cols {
        for i in 0..rows {
            host.set(i, j, T::from_f64((i + j * rows) as f64 / 64.0));
        }
    }

    let mut device = ctx.alloc_matrix::<T>(rows, cols)?;
    engine.upload(&host, &mut device)?;
    let back = engine.download_new(&device);

    if !check::exact_match(&host, &back) {
        bail!(
            "round-trip altered a {}-byte element buffer",
            T::WIDTH
        );
    }
    Ok(())
}

/// Run the same gemm in f32 and f64 and require agreement within `threshold`.
fn cross_precision_gemm(
    ctx: &DeviceContext,
    engine: &mut TransferEngine,
    rng: &mut Initializer,
    rows: usize,
    cols: usize,
    threshold: f64,
) -> anyhow::Result<()> {
    // Shared random input, staged once in f64.
    let mut a64: HostMatrix<f64> = HostMatrix::zeros(rows, cols);
    let mut b64: HostMatrix<f64> = HostMatrix::zeros(cols, rows);
    rng.fill_uniform(&mut a64);
    rng.fill_uniform(&mut b64);

    let a32 = demote(&a64);
    let b32 = demote(&b64);

    // f64 path on the device.
    let mut d_a64 = ctx.alloc_matrix::<f64>(rows, cols)?;
    let mut d_b64 = ctx.alloc_matrix::<f64>(cols, rows)?;
    let mut d_c64 = ctx.alloc_matrix::<f64>(rows, rows)?;
    engine.upload(&a64, &mut d_a64)?;
    engine.upload(&b64, &mut d_b64)?;
    blas::matmul(Op::None, Op::None, 1.0, &d_a64, &d_b64, 0.0, &mut d_c64)?;
    let c64 = engine.download_new(&d_c64);

    // f32 path on the device.
    let mut d_a32 = ctx.alloc_matrix::<f32>(rows, cols)?;
    let mut d_b32 = ctx.alloc_matrix::<f32>(cols, rows)?;
    let mut d_c32 = ctx.alloc_matrix::<f32>(rows, rows)?;
    engine.upload(&a32, &mut d_a32)?;
    engine.upload(&b32, &mut d_b32)?;
    blas::matmul(Op::None, Op::None, 1.0, &d_a32, &d_b32, 0.0, &mut d_c32)?;

    // Narrow the f64 reference to f32 and compare against the f32 result.
    let reference = demote(&c64);
    check::check_device(&reference, &d_c32, engine, "gemm f32 vs f64", threshold)?;
    Ok(())
}

/// Narrow an f64 host matrix to f32.
fn demote(m: &HostMatrix<f64>) -> HostMatrix<f32> {
    let data = m.as_slice().iter().map(|&x| x as f32).collect();
    HostMatrix::from_column_major(m.rows(), m.cols(), data)
}
