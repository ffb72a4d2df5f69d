use cozy_chess::Color;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evalnet::eval::nnue::{Network, NetworkCodec, QuantConfig};
use evalnet::pgn::{read_games, TranscodeConfig, Transcoder};
use evalnet::td::{encode_into, RecordReader};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const FEN: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";

fn bench_records(c: &mut Criterion) {
    let mut buf = Vec::with_capacity(1 << 20);
    for i in 0..10_000 { encode_into(&mut buf, FEN, (i % 600) as i16 - 300, (i % 3) as i8 - 1).unwrap(); }
    c.bench_function("td_encode_10k", |b| {
        let mut out = Vec::with_capacity(buf.len());
        b.iter(|| {
            out.clear();
            for i in 0..10_000 { encode_into(&mut out, black_box(FEN), i as i16, 0).unwrap(); }
            black_box(out.len())
        })
    });
    c.bench_function("td_decode_10k", |b| {
        b.iter(|| black_box(RecordReader::new(buf.as_slice()).filter(|r| r.is_ok()).count()))
    });
}

fn bench_eval(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let cfg = QuantConfig::default();
    let net = Network::init(&mut rng, &cfg);
    let codec = NetworkCodec::new(cfg);
    let q = codec.quantize(&net).unwrap();
    let white: Vec<usize> = (0..32).map(|_| rng.gen_range(0..41916)).collect();
    let black: Vec<usize> = (0..32).map(|_| rng.gen_range(0..41916)).collect();
    c.bench_function("eval_float", |b| b.iter(|| net.evaluate(black_box(&white), black_box(&black), Color::White).unwrap()));
    c.bench_function("eval_quantized", |b| {
        b.iter(|| q.evaluate(&cfg, black_box(&white), black_box(&black), Color::White).unwrap())
    });
}

fn bench_transcode(c: &mut Criterion) {
    let game = "[Result \"1-0\"]\n\n1. e4 {+0.30/10} e5 {-0.25/10} 2. Nf3 {+0.20/11} Nc6 {-0.22/11} 3. Bb5 {+0.40/12} a6 {-0.35/12} 1-0\n\n";
    let games = read_games(game.repeat(500).as_bytes()).unwrap();
    c.bench_function("transcode_500_games", |b| {
        b.iter(|| {
            let mut tr = Transcoder::new(TranscodeConfig::default());
            for g in &games { tr.push_game(g); }
            black_box(tr.stats().positions)
        })
    });
}

criterion_group!(benches, bench_records, bench_eval, bench_transcode);
criterion_main!(benches);
