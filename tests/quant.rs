use evalnet::eval::nnue::{dequantize, quantize, CodecError, QuantConfig};

#[test]
fn round_trip_within_half_step() {
    let cfg = QuantConfig::default();
    for q in [cfg.accumulator(), cfg.hidden_1(), cfg.hidden_2(), cfg.output()] {
        let bound = q.weight_bound.unwrap_or(1.5);
        for i in -20..=20 {
            let w = bound * i as f32 / 20.0;
            let raw: i16 = q.weight(w).unwrap();
            let back = dequantize(raw, q.weight_scale);
            assert!((back - w).abs() <= 0.5 / q.weight_scale + 1e-6, "w={} back={}", w, back);
            let again: i16 = q.weight(back).unwrap();
            assert_eq!(again, raw);
        }
    }
}

#[test]
fn clamp_bound_is_inclusive() {
    let cfg = QuantConfig::default();
    for q in [cfg.hidden_1(), cfg.hidden_2(), cfg.output()] {
        let bound = q.weight_bound.unwrap();
        let at: i16 = q.weight(bound).unwrap();
        assert_eq!(at as f32, (bound * q.weight_scale).round());
        let neg: i16 = q.weight(-bound).unwrap();
        assert_eq!(neg, -at);

        let beyond = f32::from_bits(bound.to_bits() + 1);
        assert!(matches!(q.weight::<i16>(beyond), Err(CodecError::Overflow { .. })));
        assert!(matches!(q.weight::<i16>(-beyond), Err(CodecError::Overflow { .. })));
    }
}

#[test]
fn dense_scales() {
    let cfg = QuantConfig::default();
    assert_eq!(cfg.hidden_1().weight_bound, Some(127.0 / 128.0));
    assert_eq!(cfg.hidden_2().weight_bound, Some(127.0 / 64.0));
    assert_eq!(cfg.output().bias_scale, 127.0 * 64.0);
    assert_eq!(cfg.accumulator().weight_bound, None);
}

#[test]
fn accumulator_overflow_is_an_error() {
    let q = QuantConfig::default().accumulator();
    // 300 * 127 = 38100 does not fit i16
    match q.weight::<i16>(300.0) {
        Err(CodecError::Overflow { min, max, .. }) => {
            assert_eq!(min, i16::MIN as i64);
            assert_eq!(max, i16::MAX as i64);
        }
        other => panic!("expected overflow, got {:?}", other),
    }
    assert_eq!(q.weight::<i16>(258.0).unwrap(), 32766);
    assert!(quantize::<i16>(f32::NAN, 127.0).is_err());
    assert!(quantize::<i32>(f32::INFINITY, 8128.0).is_err());
}

#[test]
fn config_file() {
    let path = "target/quant_config.json";
    std::fs::write(path, r#"{ "hidden_1_weight_scale": 64.0 }"#).unwrap();
    let cfg = QuantConfig::load(path).unwrap();
    assert_eq!(cfg.hidden_1_weight_scale, 64.0);
    assert_eq!(cfg.input_scale, 127.0);

    std::fs::write(path, r#"{ "output_weight_scale": 0.0 }"#).unwrap();
    assert!(QuantConfig::load(path).is_err());
    // would round to a zero divisor in the integer forward pass
    std::fs::write(path, r#"{ "accumulator_scale": 0.4 }"#).unwrap();
    assert!(QuantConfig::load(path).is_err());
}
