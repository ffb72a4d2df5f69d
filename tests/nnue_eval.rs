use cozy_chess::Color;
use evalnet::consts::INPUT_HSIZE;
use evalnet::eval::nnue::{CodecError, Network, NetworkCodec};

// Every parameter is exactly representable, so both pipelines agree bit for bit.
fn exact_net() -> Network {
    let mut net = Network::zeros();
    net.white_accumulator.set(0, 3, 64.0 / 127.0);
    net.black_accumulator.set(0, 7, 32.0 / 127.0);
    // dense weights stay inside their clamp bounds (127/128 for hidden 1)
    net.hidden_1.set(0, 0, 0.5);
    net.hidden_1.set(0, 256, 0.25);
    net.hidden_2.set(0, 0, 1.0);
    net.output.set(0, 0, 0.5);
    net.output.bias[0] = 0.25;
    net
}

#[test]
fn integer_and_float_forward_agree() {
    let net = exact_net();
    let codec = NetworkCodec::default();
    let q = codec.quantize(&net).unwrap();

    let fw = net.evaluate(&[3], &[7], Color::White).unwrap();
    let iw = q.evaluate(codec.config(), &[3], &[7], Color::White).unwrap();
    assert!((fw - (0.25 + 20.0 / 127.0)).abs() < 1e-6, "{}", fw);
    assert!((fw - iw).abs() < 1e-6, "float {} int {}", fw, iw);

    // black to move puts the black accumulator first
    let fb = net.evaluate(&[3], &[7], Color::Black).unwrap();
    let ib = q.evaluate(codec.config(), &[3], &[7], Color::Black).unwrap();
    assert!((fb - (0.25 + 16.0 / 127.0)).abs() < 1e-6, "{}", fb);
    assert!((fb - ib).abs() < 1e-6, "float {} int {}", fb, ib);
}

#[test]
fn activations_clip_at_one() {
    let mut net = exact_net();
    // five copies of feature 3 push white accumulator rows 0 and 1 past 1.0
    let hot = [3usize; 5];
    net.white_accumulator.set(1, 3, 64.0 / 127.0);
    net.hidden_1.set(0, 1, 0.5);
    net.output.bias[0] = 0.0;
    let q = NetworkCodec::default().quantize(&net).unwrap();
    let f = net.evaluate(&hot, &[], Color::White).unwrap();
    let i = q.evaluate(&Default::default(), &hot, &[], Color::White).unwrap();
    assert!((f - 0.5).abs() < 1e-6, "{}", f);
    assert!((f - i).abs() < 1e-6);
}

#[test]
fn feature_index_is_checked() {
    let net = Network::zeros();
    assert!(matches!(
        net.evaluate(&[INPUT_HSIZE], &[], Color::White),
        Err(CodecError::FeatureOutOfRange { index, limit }) if index == INPUT_HSIZE && limit == INPUT_HSIZE
    ));
}
