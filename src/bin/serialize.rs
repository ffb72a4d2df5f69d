use clap::Parser;
use evalnet::{load_model, save_model, QuantConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "serialize", about = "Convert a model between .nnue and .ckpt")]
struct Args {
    /// Source model (.nnue or .ckpt)
    #[arg(value_name = "SOURCE")]
    source: PathBuf,
    /// Target model (.nnue or .ckpt)
    #[arg(value_name = "TARGET")]
    target: PathBuf,
    /// JSON file overriding the quantization scales
    #[arg(long)]
    quant_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    let cfg = match &a.quant_config {
        Some(p) => QuantConfig::load(p)?,
        None => QuantConfig::default(),
    };
    println!("Converting {} to {}.", a.source.display(), a.target.display());
    let mut net = load_model(&a.source, &cfg)?;
    // a float checkpoint may hold weights the fixed-point file cannot represent
    if !net.is_clamped(&cfg) {
        log::warn!("clamping dense weights of {} before writing", a.source.display());
        net.clamp(&cfg);
    }
    save_model(&a.target, &net, &cfg)?;
    Ok(())
}
