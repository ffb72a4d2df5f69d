use clap::Parser;
use evalnet::{save_model, Network, QuantConfig};
use rand::{rngs::SmallRng, SeedableRng};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "init-net", about = "Write a freshly initialized network")]
struct Args {
    /// Target model (.nnue or .ckpt)
    #[arg(value_name = "TARGET")]
    target: PathBuf,
    #[arg(long, default_value_t = 42)]
    seed: u64,
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
    let mut rng = SmallRng::seed_from_u64(a.seed);
    let net = Network::init(&mut rng, &cfg);
    save_model(&a.target, &net, &cfg)?;
    println!("Model saved to: {}", a.target.display());
    Ok(())
}
