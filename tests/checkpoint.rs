use evalnet::eval::nnue::checkpoint::{read_checkpoint, write_checkpoint, CKPT_MAGIC};
use evalnet::eval::nnue::{CodecError, Network};

fn small_net() -> Network {
    let mut net = Network::zeros();
    net.white_accumulator.set(3, 100, 0.125);
    net.black_accumulator.bias[9] = -0.5;
    net.hidden_1.set(31, 511, 0.3);
    net.output.bias[0] = 1.0e-3;
    net
}

#[test]
fn checkpoint_round_trip_is_lossless() {
    let net = small_net();
    let mut buf = Vec::new();
    write_checkpoint(&net, &mut buf).unwrap();
    assert_eq!(&buf[..8], CKPT_MAGIC);
    let back = read_checkpoint(&mut buf.as_slice()).unwrap();
    assert!(back == net);
}

#[test]
fn checkpoint_header_errors() {
    let mut buf = Vec::new();
    write_checkpoint(&small_net(), &mut buf).unwrap();

    let mut bad = buf.clone();
    bad[0] = b'X';
    assert!(matches!(read_checkpoint(&mut bad.as_slice()), Err(CodecError::BadMagic)));

    let mut bad = buf.clone();
    bad[8..12].copy_from_slice(&9u32.to_le_bytes());
    assert!(matches!(read_checkpoint(&mut bad.as_slice()), Err(CodecError::UnsupportedVersion { found: 9 })));

    let mut bad = buf.clone();
    // hidden 2 input dim
    bad[12 + 3 * 8..12 + 3 * 8 + 4].copy_from_slice(&16u32.to_le_bytes());
    match read_checkpoint(&mut bad.as_slice()) {
        Err(CodecError::ShapeMismatch { group, expected, found }) => {
            assert_eq!(group, "hidden 2");
            assert_eq!(expected, (32, 32));
            assert_eq!(found, (16, 32));
        }
        other => panic!("expected shape mismatch, got {:?}", other.map(|_| ())),
    }

    let short = &buf[..buf.len() - 2];
    assert!(matches!(read_checkpoint(&mut &short[..]), Err(CodecError::Truncated { block: "output", .. })));
}
