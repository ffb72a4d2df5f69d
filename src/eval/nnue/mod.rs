pub mod checkpoint;
pub mod codec;
pub mod network;
pub mod quant;
pub mod quantized;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

pub use codec::NetworkCodec;
pub use network::{Group, Layer, Network};
pub use quant::{dequantize, quantize, GroupQuant, QuantConfig, Quantized};
pub use quantized::{QuantizedLayer, QuantizedNetwork};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value {value} at scale {scale} does not fit in [{min}, {max}]")]
    Overflow { value: f32, scale: f32, min: i64, max: i64 },
    #[error("truncated input: {block} needs {needed} bytes, {remaining} remain")]
    Truncated { block: &'static str, needed: usize, remaining: usize },
    #[error("{extra} trailing bytes after the output block")]
    TrailingBytes { extra: usize },
    #[error("bad checkpoint magic")]
    BadMagic,
    #[error("unsupported checkpoint version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("{group}: expected shape {expected:?}, found {found:?}")]
    ShapeMismatch { group: &'static str, expected: (usize, usize), found: (usize, usize) },
    #[error("unknown model format (expected .nnue or .ckpt): {path}")]
    UnknownFormat { path: String },
    #[error("feature index {index} out of range (input size {limit})")]
    FeatureOutOfRange { index: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// On-disk model representation, chosen once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Fixed-point five-block file consumed by the engine (`.nnue`).
    Quantized,
    /// Lossless float checkpoint (`.ckpt`).
    Checkpoint,
}

impl ModelFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "nnue" => Some(Self::Quantized),
            "ckpt" => Some(Self::Checkpoint),
            _ => None,
        }
    }

    pub fn detect(path: &Path) -> Result<Self, CodecError> {
        Self::from_path(path).ok_or_else(|| CodecError::UnknownFormat { path: path.display().to_string() })
    }
}

pub fn load_model<P: AsRef<Path>>(path: P, cfg: &QuantConfig) -> Result<Network> {
    let path = path.as_ref();
    let format = ModelFormat::detect(path)?;
    let f = File::open(path).with_context(|| format!("open model: {}", path.display()))?;
    let mut r = BufReader::new(f);
    let net = match format {
        ModelFormat::Quantized => NetworkCodec::new(*cfg).read_from(&mut r),
        ModelFormat::Checkpoint => checkpoint::read_checkpoint(&mut r),
    }
    .with_context(|| format!("read {:?} model: {}", format, path.display()))?;
    log::info!("loaded {:?} model from {}", format, path.display());
    Ok(net)
}

pub fn save_model<P: AsRef<Path>>(path: P, net: &Network, cfg: &QuantConfig) -> Result<()> {
    let path = path.as_ref();
    let format = ModelFormat::detect(path)?;
    let f = File::create(path).with_context(|| format!("create model: {}", path.display()))?;
    let mut w = BufWriter::new(f);
    match format {
        ModelFormat::Quantized => NetworkCodec::new(*cfg).write_to(net, &mut w),
        ModelFormat::Checkpoint => checkpoint::write_checkpoint(net, &mut w),
    }
    .with_context(|| format!("write {:?} model: {}", format, path.display()))?;
    log::info!("saved {:?} model to {}", format, path.display());
    Ok(())
}
