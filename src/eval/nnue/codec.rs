use std::io::{Read, Write};

use super::network::{Group, Layer, Network};
use super::quant::{dequantize, Quantized, QuantConfig};
use super::quantized::{QuantizedLayer, QuantizedNetwork};
use super::CodecError;
use crate::consts::{ACCUMULATOR_HSIZE, INPUT_HSIZE};

const fn dense_len(g: Group) -> usize {
    let (i, o) = g.shape();
    o * 4 + o * i * 2
}

/// Binary network codec.
///
/// Layout (little-endian, no header, no length fields):
///   accumulator: i16 white bias, i16 black bias, i16 white weight, i16 black weight
///   hidden 1:    i32 bias, i16 weight
///   hidden 2:    i32 bias, i16 weight
///   output:      i32 bias, i16 weight
/// Weights are row-major `out x in`. The shapes are compiled in; the byte
/// stream carries nothing that describes them.
#[derive(Debug, Clone, Default)]
pub struct NetworkCodec {
    config: QuantConfig,
}

impl NetworkCodec {
    pub const ACCUMULATOR_BLOCK_LEN: usize = 2 * (ACCUMULATOR_HSIZE * 2 + ACCUMULATOR_HSIZE * INPUT_HSIZE * 2);
    pub const ENCODED_LEN: usize = Self::ACCUMULATOR_BLOCK_LEN
        + dense_len(Group::Hidden1)
        + dense_len(Group::Hidden2)
        + dense_len(Group::Output);

    pub fn new(config: QuantConfig) -> Self { Self { config } }

    pub fn config(&self) -> &QuantConfig { &self.config }

    pub fn quantize(&self, net: &Network) -> Result<QuantizedNetwork, CodecError> {
        Ok(QuantizedNetwork {
            white_accumulator: self.quantize_layer(net, Group::WhiteAccumulator)?,
            black_accumulator: self.quantize_layer(net, Group::BlackAccumulator)?,
            hidden_1: self.quantize_layer(net, Group::Hidden1)?,
            hidden_2: self.quantize_layer(net, Group::Hidden2)?,
            output: self.quantize_layer(net, Group::Output)?,
        })
    }

    fn quantize_layer<B: Quantized>(&self, net: &Network, g: Group) -> Result<QuantizedLayer<B>, CodecError> {
        let layer = net.layer(g);
        let q = g.quant(&self.config);
        let weight = q.weights(&layer.weight).map_err(|e| failed(g, "weight", e))?;
        let bias = q.biases(&layer.bias).map_err(|e| failed(g, "bias", e))?;
        Ok(QuantizedLayer { input_dim: layer.input_dim, output_dim: layer.output_dim, weight, bias })
    }

    pub fn dequantize(&self, q: &QuantizedNetwork) -> Network {
        Network {
            white_accumulator: self.dequantize_layer(&q.white_accumulator, Group::WhiteAccumulator),
            black_accumulator: self.dequantize_layer(&q.black_accumulator, Group::BlackAccumulator),
            hidden_1: self.dequantize_layer(&q.hidden_1, Group::Hidden1),
            hidden_2: self.dequantize_layer(&q.hidden_2, Group::Hidden2),
            output: self.dequantize_layer(&q.output, Group::Output),
        }
    }

    fn dequantize_layer<B: Quantized>(&self, l: &QuantizedLayer<B>, g: Group) -> Layer {
        let q = g.quant(&self.config);
        Layer {
            input_dim: l.input_dim,
            output_dim: l.output_dim,
            weight: l.weight.iter().map(|&w| dequantize(w, q.weight_scale)).collect(),
            bias: l.bias.iter().map(|&b| dequantize(b, q.bias_scale)).collect(),
        }
    }

    /// Serializes raw integers in block order.
    pub fn encode(q: &QuantizedNetwork) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        put_all(&mut out, &q.white_accumulator.bias);
        put_all(&mut out, &q.black_accumulator.bias);
        put_all(&mut out, &q.white_accumulator.weight);
        put_all(&mut out, &q.black_accumulator.weight);
        for l in [&q.hidden_1, &q.hidden_2, &q.output] {
            put_all(&mut out, &l.bias);
            put_all(&mut out, &l.weight);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<QuantizedNetwork, CodecError> {
        let mut cur = Cursor { buf: bytes, pos: 0 };
        let mut white = QuantizedLayer::<i16>::zeros(INPUT_HSIZE, ACCUMULATOR_HSIZE);
        let mut black = QuantizedLayer::<i16>::zeros(INPUT_HSIZE, ACCUMULATOR_HSIZE);
        white.bias = cur.take(ACCUMULATOR_HSIZE, "white accumulator bias")?;
        black.bias = cur.take(ACCUMULATOR_HSIZE, "black accumulator bias")?;
        white.weight = cur.take(ACCUMULATOR_HSIZE * INPUT_HSIZE, "white accumulator weight")?;
        black.weight = cur.take(ACCUMULATOR_HSIZE * INPUT_HSIZE, "black accumulator weight")?;
        let hidden_1 = cur.dense(Group::Hidden1, "hidden 1 bias", "hidden 1 weight")?;
        let hidden_2 = cur.dense(Group::Hidden2, "hidden 2 bias", "hidden 2 weight")?;
        let output = cur.dense(Group::Output, "output bias", "output weight")?;
        if cur.remaining() != 0 {
            return Err(CodecError::TrailingBytes { extra: cur.remaining() });
        }
        Ok(QuantizedNetwork { white_accumulator: white, black_accumulator: black, hidden_1, hidden_2, output })
    }

    pub fn write(&self, net: &Network) -> Result<Vec<u8>, CodecError> { Ok(Self::encode(&self.quantize(net)?)) }

    /// Decodes and dequantizes. Dense weights beyond the clamp bound are rejected
    /// so the float model always satisfies [`Network::is_clamped`].
    pub fn read(&self, bytes: &[u8]) -> Result<Network, CodecError> {
        let q = Self::decode(bytes)?;
        self.check_bounds(&q)?;
        Ok(self.dequantize(&q))
    }

    /// Raw dense weights must stay within `round(bound * weight_scale)`.
    pub fn check_bounds(&self, q: &QuantizedNetwork) -> Result<(), CodecError> {
        for (g, l) in [(Group::Hidden1, &q.hidden_1), (Group::Hidden2, &q.hidden_2), (Group::Output, &q.output)] {
            let gq = g.quant(&self.config);
            let Some(bound) = gq.weight_bound else { continue };
            let limit = (bound as f64 * gq.weight_scale as f64).round() as i64;
            if let Some(&w) = l.weight.iter().find(|w| (**w as i64).abs() > limit) {
                log::error!("{} weight {} outside [-{}, {}]", g.name(), w, limit, limit);
                return Err(CodecError::Overflow { value: dequantize(w, gq.weight_scale), scale: gq.weight_scale, min: -limit, max: limit });
            }
        }
        Ok(())
    }

    pub fn write_to<W: Write>(&self, net: &Network, w: &mut W) -> Result<(), CodecError> {
        w.write_all(&self.write(net)?)?;
        w.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(&self, r: &mut R) -> Result<Network, CodecError> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        r.read_to_end(&mut buf)?;
        self.read(&buf)
    }
}

fn failed(g: Group, what: &str, e: CodecError) -> CodecError {
    log::error!("quantizing {} {} failed: {}", g.name(), what, e);
    e
}

fn put_all<T: Quantized>(out: &mut Vec<u8>, vals: &[T]) {
    for &v in vals { v.put_le(out); }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn remaining(&self) -> usize { self.buf.len() - self.pos }

    fn take<T: Quantized>(&mut self, n: usize, block: &'static str) -> Result<Vec<T>, CodecError> {
        let needed = n * T::BYTES;
        if self.remaining() < needed {
            return Err(CodecError::Truncated { block, needed, remaining: self.remaining() });
        }
        let bytes = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes.chunks_exact(T::BYTES).map(T::get_le).collect())
    }

    fn dense(&mut self, g: Group, bias: &'static str, weight: &'static str) -> Result<QuantizedLayer<i32>, CodecError> {
        let (i, o) = g.shape();
        let bias = self.take(o, bias)?;
        let weight = self.take(o * i, weight)?;
        Ok(QuantizedLayer { input_dim: i, output_dim: o, weight, bias })
    }
}
