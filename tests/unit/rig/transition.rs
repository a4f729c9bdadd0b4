use super::*;

#[test]
fn curves_hit_endpoints() {
    for curve in [
        BlendCurve::Linear,
        BlendCurve::SmoothStep,
        BlendCurve::SmootherStep,
        BlendCurve::EaseIn,
        BlendCurve::EaseOut,
    ] {
        assert_eq!(curve.apply(0.0), 0.0, "{curve:?}");
        assert!((curve.apply(1.0) - 1.0).abs() < 1e-12, "{curve:?}");
        assert!((curve.apply(2.0) - 1.0).abs() < 1e-12, "{curve:?}");
    }
}

#[test]
fn smoothstep_is_symmetric_at_half() {
    assert!((BlendCurve::SmoothStep.apply(0.5) - 0.5).abs() < 1e-12);
}

#[test]
fn cut_is_full_weight_immediately() {
    let t = TransitionSpec::cut();
    assert!(t.is_cut());
    assert_eq!(t.weight_at(0.0), 1.0);
}

#[test]
fn timed_blend_progresses_with_elapsed_time() {
    let t = TransitionSpec::blend(2.0, BlendCurve::Linear);
    assert!((t.weight_at(0.5) - 0.25).abs() < 1e-12);
    assert_eq!(t.weight_at(5.0), 1.0);
}

#[test]
fn deserializes_from_json_with_default_curve() {
    let t: TransitionSpec = serde_json::from_str(r#"{"duration_secs": 1.5}"#).unwrap();
    assert_eq!(t.curve, BlendCurve::SmoothStep);
    let t: TransitionSpec =
        serde_json::from_str(r#"{"duration_secs": 1.0, "curve": "ease_out"}"#).unwrap();
    assert_eq!(t.curve, BlendCurve::EaseOut);
}
