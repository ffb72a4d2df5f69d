// Quantized NNUE codec + training data tooling
pub mod consts;
pub mod board;
pub mod eval;
pub mod td;
pub mod pgn;

pub use eval::nnue::{load_model, save_model, CodecError, ModelFormat, Network, NetworkCodec, QuantConfig};
