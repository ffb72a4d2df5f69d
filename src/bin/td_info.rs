use anyhow::Context;
use clap::Parser;
use evalnet::td::{summarize, RecordReader};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "td-info", about = "Summarize a training record file")]
struct Args {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    let f = File::open(&a.file).with_context(|| format!("open {}", a.file.display()))?;
    let s = summarize(RecordReader::new(BufReader::new(f))).with_context(|| format!("read {}", a.file.display()))?;
    if a.json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }
    println!("records:      {}", s.records);
    println!("outcomes:     +{} ={} -{}", s.wins, s.draws, s.losses);
    if s.bad_outcomes > 0 { println!("bad outcomes: {}", s.bad_outcomes); }
    println!("mate scores:  {}", s.mate_scores);
    if let (Some(lo), Some(hi)) = (s.min_score, s.max_score) {
        println!("score:        min {} max {} mean {:.1}", lo, hi, s.mean_score);
    }
    println!("longest board: {} bytes", s.max_board_len);
    if s.empty_boards > 0 { println!("empty boards: {}", s.empty_boards); }
    Ok(())
}
