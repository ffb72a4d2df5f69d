use anyhow::{bail, Context};
use clap::Parser;
use evalnet::pgn::{read_games, PgnReader, TranscodeConfig, Transcoder};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pgn-to-td", about = "Convert annotated PGN games to training records")]
struct Args {
    /// Source file (.pgn)
    #[arg(value_name = "SOURCE")]
    source: PathBuf,
    /// Target file (.td)
    #[arg(value_name = "TARGET")]
    target: PathBuf,
    /// Worker threads; 1 streams games sequentially
    #[arg(long, default_value_t = 1)]
    threads: usize,
    #[arg(long)]
    transcode_config: Option<PathBuf>,
}

fn has_ext(p: &Path, ext: &str) -> bool { p.extension().and_then(|e| e.to_str()) == Some(ext) }

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    if !has_ext(&a.source, "pgn") || !has_ext(&a.target, "td") {
        bail!("invalid file types: expected <source>.pgn <target>.td, got {} {}", a.source.display(), a.target.display());
    }
    let cfg = match &a.transcode_config {
        Some(p) => TranscodeConfig::load(p)?,
        None => TranscodeConfig::default(),
    };
    println!("Converting {} to {}.", a.source.display(), a.target.display());

    let f = File::open(&a.source).with_context(|| format!("open {}", a.source.display()))?;
    let len = f.metadata().map(|m| m.len()).unwrap_or(0);
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .context("progress template")?,
    );
    let input = BufReader::new(progress.wrap_read(f));

    let mut tr = Transcoder::new(cfg);
    if a.threads <= 1 {
        tr.transcode(PgnReader::new(input)).with_context(|| format!("read {}", a.source.display()))?;
    } else {
        let games = read_games(input).with_context(|| format!("read {}", a.source.display()))?;
        progress.set_message(format!("transcoding {} games", games.len()));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(a.threads).build()?;
        pool.install(|| tr.transcode_parallel(&games));
    }
    progress.finish_and_clear();

    let stats = *tr.stats();
    stats.log();
    if stats.invalid_scores > 0 {
        println!("WARNING: Number of invalid scores: {}.", stats.invalid_scores);
    }

    // written once, at the end of the run
    let out = File::create(&a.target).with_context(|| format!("create {}", a.target.display()))?;
    let mut w = BufWriter::new(out);
    tr.write_to(&mut w).with_context(|| format!("write {}", a.target.display()))?;
    println!("{} positions from {} games written to {}.", stats.positions, stats.games, a.target.display());
    Ok(())
}
