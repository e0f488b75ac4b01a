use super::*;

#[test]
fn defaults_are_vertical_30fps_and_valid() {
    let cfg = RenderConfig::default();
    assert!(cfg.canvas.is_vertical());
    assert_eq!((cfg.canvas.width, cfg.canvas.height), (1080, 1920));
    assert_eq!(cfg.fps, Fps { num: 30, den: 1 });
    assert_eq!(cfg.analyser.bin_count(), 32);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let cfg: RenderConfig =
        serde_json::from_str(r#"{ "zoom_range": 0.3, "pacing": "realtime" }"#).unwrap();
    assert_eq!(cfg.zoom_range, 0.3);
    assert_eq!(cfg.pacing, Pacing::Realtime);
    assert_eq!(cfg.line_height, RenderConfig::default().line_height);
    assert_eq!(cfg.formats, default_formats());
}

#[test]
fn validate_rejects_bad_values() {
    let mut cfg = RenderConfig::default();
    cfg.analyser.fft_size = 48;
    assert!(cfg.validate().is_err());

    let mut cfg = RenderConfig::default();
    cfg.canvas.width = 1081;
    assert!(cfg.validate().is_err());

    let mut cfg = RenderConfig::default();
    cfg.scroll_smoothing = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = RenderConfig::default();
    cfg.formats.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reports_missing_file() {
    let err = RenderConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("not/here.json"));
}
