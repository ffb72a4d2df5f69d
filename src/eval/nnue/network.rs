use cozy_chess::Color;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::quant::{GroupQuant, QuantConfig};
use super::CodecError;
use crate::consts::{
    ACCUMULATOR_HSIZE, ACCUMULATOR_SIZE, HIDDEN_1_SIZE, HIDDEN_2_SIZE, INPUT_HSIZE, MAX_ACTIVE_FEATURES, OUTPUT_SIZE,
};

/// The five parameter groups, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    WhiteAccumulator,
    BlackAccumulator,
    Hidden1,
    Hidden2,
    Output,
}

impl Group {
    pub const ALL: [Group; 5] = [Group::WhiteAccumulator, Group::BlackAccumulator, Group::Hidden1, Group::Hidden2, Group::Output];

    /// (input_dim, output_dim)
    pub const fn shape(self) -> (usize, usize) {
        match self {
            Group::WhiteAccumulator | Group::BlackAccumulator => (INPUT_HSIZE, ACCUMULATOR_HSIZE),
            Group::Hidden1 => (ACCUMULATOR_SIZE, HIDDEN_1_SIZE),
            Group::Hidden2 => (HIDDEN_1_SIZE, HIDDEN_2_SIZE),
            Group::Output => (HIDDEN_2_SIZE, OUTPUT_SIZE),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Group::WhiteAccumulator => "white accumulator",
            Group::BlackAccumulator => "black accumulator",
            Group::Hidden1 => "hidden 1",
            Group::Hidden2 => "hidden 2",
            Group::Output => "output",
        }
    }

    pub fn quant(self, cfg: &QuantConfig) -> GroupQuant {
        match self {
            Group::WhiteAccumulator | Group::BlackAccumulator => cfg.accumulator(),
            Group::Hidden1 => cfg.hidden_1(),
            Group::Hidden2 => cfg.hidden_2(),
            Group::Output => cfg.output(),
        }
    }
}

/// Dense layer in float form. `weight` is row-major `output_dim x input_dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub input_dim: usize,
    pub output_dim: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Layer {
    pub fn zeros(input_dim: usize, output_dim: usize) -> Self {
        Self { input_dim, output_dim, weight: vec![0.0; input_dim * output_dim], bias: vec![0.0; output_dim] }
    }

    #[inline]
    pub fn row(&self, j: usize) -> &[f32] { &self.weight[j * self.input_dim..(j + 1) * self.input_dim] }

    #[inline]
    pub fn at(&self, out: usize, inp: usize) -> f32 { self.weight[out * self.input_dim + inp] }

    #[inline]
    pub fn set(&mut self, out: usize, inp: usize, v: f32) { self.weight[out * self.input_dim + inp] = v; }

    fn forward(&self, input: &[f32], output: &mut [f32]) {
        for (j, o) in output.iter_mut().enumerate() {
            *o = self.bias[j] + self.row(j).iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
        }
    }

    // Sum of the weight columns of the active features, plus bias.
    fn accumulate(&self, active: &[usize], out: &mut [f32]) -> Result<(), CodecError> {
        out.copy_from_slice(&self.bias);
        for &idx in active {
            if idx >= self.input_dim { return Err(CodecError::FeatureOutOfRange { index: idx, limit: self.input_dim }); }
            for (j, o) in out.iter_mut().enumerate() { *o += self.weight[j * self.input_dim + idx]; }
        }
        Ok(())
    }
}

/// Float-domain network parameters as owned by the trainer and the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub white_accumulator: Layer,
    pub black_accumulator: Layer,
    pub hidden_1: Layer,
    pub hidden_2: Layer,
    pub output: Layer,
}

impl Network {
    pub fn zeros() -> Self {
        let l = |g: Group| { let (i, o) = g.shape(); Layer::zeros(i, o) };
        Self {
            white_accumulator: l(Group::WhiteAccumulator),
            black_accumulator: l(Group::BlackAccumulator),
            hidden_1: l(Group::Hidden1),
            hidden_2: l(Group::Hidden2),
            output: l(Group::Output),
        }
    }

    /// Random initialization followed by [`Network::clamp`].
    pub fn init<R: Rng + ?Sized>(rng: &mut R, cfg: &QuantConfig) -> Self {
        let mut net = Self::zeros();
        let acc_std = (2.0 / MAX_ACTIVE_FEATURES as f32).sqrt();
        fill_normal(&mut net.white_accumulator.weight, acc_std, rng);
        fill_normal(&mut net.black_accumulator.weight, acc_std, rng);
        for layer in [&mut net.hidden_1, &mut net.hidden_2, &mut net.output] {
            // kaiming normal, fan-in mode
            let std = (2.0 / layer.input_dim as f32).sqrt();
            fill_normal(&mut layer.weight, std, rng);
        }
        net.clamp(cfg);
        net
    }

    /// Restores the weight bounds of the dense layers. Call after every optimizer step.
    pub fn clamp(&mut self, cfg: &QuantConfig) {
        for g in [Group::Hidden1, Group::Hidden2, Group::Output] {
            let q = g.quant(cfg);
            for w in self.layer_mut(g).weight.iter_mut() { *w = q.clamp(*w); }
        }
    }

    /// True when every dense weight is within its group bound.
    pub fn is_clamped(&self, cfg: &QuantConfig) -> bool {
        [Group::Hidden1, Group::Hidden2, Group::Output].into_iter().all(|g| {
            let q = g.quant(cfg);
            self.layer(g).weight.iter().all(|&w| q.clamp(w) == w)
        })
    }

    pub fn layer(&self, g: Group) -> &Layer {
        match g {
            Group::WhiteAccumulator => &self.white_accumulator,
            Group::BlackAccumulator => &self.black_accumulator,
            Group::Hidden1 => &self.hidden_1,
            Group::Hidden2 => &self.hidden_2,
            Group::Output => &self.output,
        }
    }

    pub fn layer_mut(&mut self, g: Group) -> &mut Layer {
        match g {
            Group::WhiteAccumulator => &mut self.white_accumulator,
            Group::BlackAccumulator => &mut self.black_accumulator,
            Group::Hidden1 => &mut self.hidden_1,
            Group::Hidden2 => &mut self.hidden_2,
            Group::Output => &mut self.output,
        }
    }

    /// Forward pass on sparse active-feature lists. Returns the float-domain
    /// output; multiply by `OUTPUT_SCALE` for centipawns.
    pub fn evaluate(&self, white_active: &[usize], black_active: &[usize], stm: Color) -> Result<f32, CodecError> {
        let mut white = [0f32; ACCUMULATOR_HSIZE];
        let mut black = [0f32; ACCUMULATOR_HSIZE];
        self.white_accumulator.accumulate(white_active, &mut white)?;
        self.black_accumulator.accumulate(black_active, &mut black)?;

        let (first, second) = if stm == Color::White { (&white, &black) } else { (&black, &white) };
        let mut x = [0f32; ACCUMULATOR_SIZE];
        x[..ACCUMULATOR_HSIZE].copy_from_slice(first);
        x[ACCUMULATOR_HSIZE..].copy_from_slice(second);
        crelu(&mut x);

        let mut h1 = [0f32; HIDDEN_1_SIZE];
        self.hidden_1.forward(&x, &mut h1);
        crelu(&mut h1);
        let mut h2 = [0f32; HIDDEN_2_SIZE];
        self.hidden_2.forward(&h1, &mut h2);
        crelu(&mut h2);
        let mut out = [0f32; OUTPUT_SIZE];
        self.output.forward(&h2, &mut out);
        Ok(out[0])
    }
}

#[inline]
fn crelu(v: &mut [f32]) { for x in v { *x = x.clamp(0.0, 1.0); } }

fn fill_normal<R: Rng + ?Sized>(dst: &mut [f32], std: f32, rng: &mut R) {
    let dist = Normal::new(0.0f32, std).expect("std is finite and positive");
    for w in dst { *w = dist.sample(rng); }
}
