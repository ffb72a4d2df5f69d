use cozy_chess::Color;

use super::quant::{Quantized, QuantConfig};
use super::CodecError;
use crate::consts::{ACCUMULATOR_HSIZE, ACCUMULATOR_SIZE, HIDDEN_1_SIZE, HIDDEN_2_SIZE};

/// Raw integer layer as stored on disk: `weight` is row-major `output_dim x input_dim`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedLayer<B> {
    pub input_dim: usize,
    pub output_dim: usize,
    pub weight: Vec<i16>,
    pub bias: Vec<B>,
}

impl<B: Quantized> QuantizedLayer<B> {
    pub fn zeros(input_dim: usize, output_dim: usize) -> Self {
        Self { input_dim, output_dim, weight: vec![0; input_dim * output_dim], bias: vec![B::default(); output_dim] }
    }

    fn forward(&self, input: &[i32], output: &mut [i64]) {
        for (j, o) in output.iter_mut().enumerate() {
            let row = &self.weight[j * self.input_dim..(j + 1) * self.input_dim];
            *o = self.bias[j].widen() + dot_i16_i32(row, input);
        }
    }
}

/// The quantized network in exactly the units written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedNetwork {
    pub white_accumulator: QuantizedLayer<i16>,
    pub black_accumulator: QuantizedLayer<i16>,
    pub hidden_1: QuantizedLayer<i32>,
    pub hidden_2: QuantizedLayer<i32>,
    pub output: QuantizedLayer<i32>,
}

impl QuantizedNetwork {
    /// Integer reference evaluation mirroring the engine's fixed-point pipeline.
    /// Returns the float-domain output so it can be compared with `Network::evaluate`.
    pub fn evaluate(&self, cfg: &QuantConfig, white_active: &[usize], black_active: &[usize], stm: Color) -> Result<f32, CodecError> {
        let one = cfg.input_scale.round() as i64;
        let acc_scale = cfg.accumulator_scale.round() as i64;

        let white = accumulate(&self.white_accumulator, white_active)?;
        let black = accumulate(&self.black_accumulator, black_active)?;
        let (first, second) = if stm == Color::White { (&white, &black) } else { (&black, &white) };

        let mut x = [0i32; ACCUMULATOR_SIZE];
        for (dst, &v) in x.iter_mut().zip(first.iter().chain(second.iter())) {
            *dst = clip(v as i64 * one / acc_scale, one);
        }

        let mut sums = [0i64; HIDDEN_1_SIZE];
        self.hidden_1.forward(&x, &mut sums);
        let h1 = activate::<HIDDEN_1_SIZE>(&sums, cfg.hidden_1_weight_scale.round() as i64, one);
        let mut sums = [0i64; HIDDEN_2_SIZE];
        self.hidden_2.forward(&h1, &mut sums);
        let h2 = activate::<HIDDEN_2_SIZE>(&sums, cfg.hidden_2_weight_scale.round() as i64, one);
        let mut out = [0i64; 1];
        self.output.forward(&h2, &mut out);
        Ok((out[0] as f64 / (cfg.input_scale as f64 * cfg.output_weight_scale as f64)) as f32)
    }
}

fn accumulate(layer: &QuantizedLayer<i16>, active: &[usize]) -> Result<[i32; ACCUMULATOR_HSIZE], CodecError> {
    let mut acc = [0i32; ACCUMULATOR_HSIZE];
    for (a, b) in acc.iter_mut().zip(&layer.bias) { *a = *b as i32; }
    for &idx in active {
        if idx >= layer.input_dim { return Err(CodecError::FeatureOutOfRange { index: idx, limit: layer.input_dim }); }
        for (j, a) in acc.iter_mut().enumerate() { *a += layer.weight[j * layer.input_dim + idx] as i32; }
    }
    Ok(acc)
}

// Drop the weight scale (floor, like the engine's arithmetic shift) and clip to [0, one].
fn activate<const N: usize>(sums: &[i64; N], weight_scale: i64, one: i64) -> [i32; N] {
    let mut out = [0i32; N];
    for (o, &s) in out.iter_mut().zip(sums) { *o = clip(s.div_euclid(weight_scale), one); }
    out
}

#[inline]
fn clip(v: i64, one: i64) -> i32 { v.clamp(0, one) as i32 }

#[inline]
pub fn dot_i16_i32(w_row: &[i16], x: &[i32]) -> i64 {
    let mut acc: i64 = 0;
    for i in 0..w_row.len() { acc += (w_row[i] as i64) * (x[i] as i64); }
    acc
}
