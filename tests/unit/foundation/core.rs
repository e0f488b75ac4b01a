use super::*;

#[test]
fn fps_rejects_zero_terms() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(30, 1).is_ok());
}

#[test]
fn whole_seconds_are_exact_in_frame_space() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.frames_to_secs(30), 1.0);
    assert_eq!(fps.frames_to_secs(90), 3.0);
    assert_eq!(fps.secs_to_frames_ceil(4.0), 120);
    assert_eq!(fps.secs_to_frames_ceil(4.01), 121);
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn vertical_canvas_aspect() {
    let c = Canvas {
        width: 1080,
        height: 1920,
    };
    assert!(c.is_vertical());
    assert!((c.aspect() - 0.5625).abs() < 1e-9);
}

#[test]
fn premul_rounds_half_alpha() {
    let c = Rgba8::new(255, 0, 0, 128);
    assert_eq!(c.to_premul_array(), [128, 0, 0, 128]);
    assert_eq!(c.with_opacity(0.5).a, 64);
}

#[test]
fn frames_to_cover_matches_the_stepped_end_condition() {
    let fps = Fps::new(20, 1).unwrap();
    assert_eq!(fps.frames_to_cover(0.3), 6);
    assert!(fps.frames_to_secs(6) >= 0.3);
    assert_eq!(fps.frames_to_cover(0.31), 7);
    assert_eq!(fps.frames_to_cover(0.0), 0);
    assert_eq!(Fps::new(30, 1).unwrap().frames_to_cover(1.0), 30);

    let ntsc = Fps::new(30000, 1001).unwrap();
    let n = ntsc.frames_to_cover(2.5);
    assert!(ntsc.frames_to_secs(n) >= 2.5);
    assert!(ntsc.frames_to_secs(n - 1) < 2.5);
}
