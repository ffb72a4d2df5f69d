//! Quantization policy: scales, clamp bounds and float <-> fixed-point conversion.
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::CodecError;

/// Integer widths used on disk.
pub trait Quantized: Copy + Default + Send + Sync + 'static {
    const BYTES: usize;
    const MIN: i64;
    const MAX: i64;
    fn narrow(v: i64) -> Self;
    fn widen(self) -> i64;
    fn put_le(self, out: &mut Vec<u8>);
    /// `bytes.len()` must equal `BYTES`.
    fn get_le(bytes: &[u8]) -> Self;
}

impl Quantized for i16 {
    const BYTES: usize = 2;
    const MIN: i64 = i16::MIN as i64;
    const MAX: i64 = i16::MAX as i64;
    #[inline] fn narrow(v: i64) -> Self { v as i16 }
    #[inline] fn widen(self) -> i64 { self as i64 }
    #[inline] fn put_le(self, out: &mut Vec<u8>) { out.extend_from_slice(&self.to_le_bytes()); }
    #[inline] fn get_le(bytes: &[u8]) -> Self { i16::from_le_bytes([bytes[0], bytes[1]]) }
}

impl Quantized for i32 {
    const BYTES: usize = 4;
    const MIN: i64 = i32::MIN as i64;
    const MAX: i64 = i32::MAX as i64;
    #[inline] fn narrow(v: i64) -> Self { v as i32 }
    #[inline] fn widen(self) -> i64 { self as i64 }
    #[inline] fn put_le(self, out: &mut Vec<u8>) { out.extend_from_slice(&self.to_le_bytes()); }
    #[inline] fn get_le(bytes: &[u8]) -> Self { i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) }
}

/// `round(value * scale)` (half away from zero), narrowed to `T`.
/// Out-of-range results are an error, never truncated.
#[inline]
pub fn quantize<T: Quantized>(value: f32, scale: f32) -> Result<T, CodecError> {
    let scaled = value as f64 * scale as f64;
    let rounded = scaled.round();
    if !rounded.is_finite() || rounded < T::MIN as f64 || rounded > T::MAX as f64 {
        return Err(CodecError::Overflow { value, scale, min: T::MIN, max: T::MAX });
    }
    Ok(T::narrow(rounded as i64))
}

#[inline]
pub fn dequantize<T: Quantized>(raw: T, scale: f32) -> f32 { (raw.widen() as f64 / scale as f64) as f32 }

/// Scales and clamp bound of one weight group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupQuant {
    pub weight_scale: f32,
    pub bias_scale: f32,
    /// Symmetric float-domain bound enforced on weights; `None` for the accumulator.
    pub weight_bound: Option<f32>,
}

impl GroupQuant {
    pub fn weight<T: Quantized>(&self, w: f32) -> Result<T, CodecError> {
        if let Some(bound) = self.weight_bound {
            if w.is_nan() || w.abs() > bound {
                return Err(CodecError::Overflow {
                    value: w,
                    scale: self.weight_scale,
                    min: -(bound as f64 * self.weight_scale as f64).round() as i64,
                    max: (bound as f64 * self.weight_scale as f64).round() as i64,
                });
            }
        }
        quantize(w, self.weight_scale)
    }

    pub fn bias<T: Quantized>(&self, b: f32) -> Result<T, CodecError> { quantize(b, self.bias_scale) }

    pub fn weights<T: Quantized>(&self, src: &[f32]) -> Result<Vec<T>, CodecError> {
        src.iter().map(|&w| self.weight(w)).collect()
    }

    pub fn biases<T: Quantized>(&self, src: &[f32]) -> Result<Vec<T>, CodecError> {
        src.iter().map(|&b| self.bias(b)).collect()
    }

    /// Clamps a float weight into the group's bound (no-op without a bound).
    #[inline]
    pub fn clamp(&self, w: f32) -> f32 {
        match self.weight_bound { Some(b) => w.clamp(-b, b), None => w }
    }
}

/// Scale constants of the quantized format. The defaults are format v1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantConfig {
    /// Fixed-point value of an activation of 1.0 (8-bit range).
    pub input_scale: f32,
    pub accumulator_scale: f32,
    pub hidden_1_weight_scale: f32,
    pub hidden_2_weight_scale: f32,
    pub output_weight_scale: f32,
}

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            input_scale: 127.0,
            accumulator_scale: 127.0,
            hidden_1_weight_scale: 128.0,
            hidden_2_weight_scale: 64.0,
            output_weight_scale: 64.0,
        }
    }
}

impl QuantConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("read quant config: {}", path.as_ref().display()))?;
        let cfg: Self = serde_json::from_str(&s).context("parse quant config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, s) in [
            ("input_scale", self.input_scale),
            ("accumulator_scale", self.accumulator_scale),
            ("hidden_1_weight_scale", self.hidden_1_weight_scale),
            ("hidden_2_weight_scale", self.hidden_2_weight_scale),
            ("output_weight_scale", self.output_weight_scale),
        ] {
            // the integer pipeline divides by the rounded scale
            if !(s.is_finite() && s >= 1.0) { anyhow::bail!("{} must be at least 1, got {}", name, s); }
        }
        Ok(())
    }

    /// Accumulator weights and biases share one scale and have no clamp.
    pub fn accumulator(&self) -> GroupQuant {
        GroupQuant { weight_scale: self.accumulator_scale, bias_scale: self.accumulator_scale, weight_bound: None }
    }

    pub fn hidden_1(&self) -> GroupQuant { self.dense(self.hidden_1_weight_scale) }
    pub fn hidden_2(&self) -> GroupQuant { self.dense(self.hidden_2_weight_scale) }
    pub fn output(&self) -> GroupQuant { self.dense(self.output_weight_scale) }

    // Bias lives in the weight x input domain; the bound keeps every
    // quantized weight x 8-bit activation product inside the engine's accumulator width.
    fn dense(&self, weight_scale: f32) -> GroupQuant {
        GroupQuant {
            weight_scale,
            bias_scale: self.input_scale * weight_scale,
            weight_bound: Some(self.input_scale / weight_scale),
        }
    }
}
