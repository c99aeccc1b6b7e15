//! Runtime configuration for rnn-gpu-util.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically. All numeric knobs (init interval, comparison threshold,
//! VRAM budget) live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments for the selfcheck binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "rnn-gpu-util", about = "GPU buffer and numeric helper selfcheck")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Override the RNG seed for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Matrix rows used by the selfcheck workload.
    #[arg(long, default_value_t = 128)]
    pub rows: usize,

    /// Matrix columns used by the selfcheck workload.
    #[arg(long, default_value_t = 96)]
    pub cols: usize,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Initialization settings.
    pub init: InitConfig,

    /// CPU-reference comparison settings.
    pub check: CheckConfig,

    /// GPU memory settings.
    pub gpu: GpuConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            init: InitConfig::default(),
            check: CheckConfig::default(),
            gpu: GpuConfig::default(),
        }
    }
}

/// Weight/input initialization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Lower bound of the uniform init interval.
    pub lower: f64,

    /// Upper bound of the uniform init interval.
    pub upper: f64,

    /// RNG seed (None = draw from OS entropy).
    pub seed: Option<u64>,

    /// Keep the host copy of each buffer after upload.
    ///
    /// Normally the host staging buffer is dropped as soon as the device copy
    /// exists; enable this when debugging against the CPU reference.
    pub keep_host: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            lower: -0.08,
            upper: 0.08,
            seed: None,
            keep_host: false,
        }
    }
}

/// CPU-reference comparison settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum tolerated absolute deviation; deviations strictly above this
    /// fail.
    pub threshold: f64,

    /// Vocabulary size for index fills.
    pub vocab_size: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            threshold: 1e-4,
            vocab_size: 50_000,
        }
    }
}

/// GPU memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuConfig {
    /// Device index to allocate on.
    pub device_id: usize,

    /// VRAM budget for buffers in bytes (0 = use detected free VRAM).
    pub vram_budget: usize,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            vram_budget: 1024 * 1024 * 1024, // 1 GB
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file is missing.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}
