use super::*;
use crate::audio::graph::CaptureAudio;
use crate::config::OutputFormat;
use crate::encode::negotiate::query_encoders;
use crate::foundation::core::{Fps, Rgba8};

fn spec(audio: Option<CaptureAudio>) -> EncodeSpec {
    EncodeSpec {
        width: 64,
        height: 112,
        fps: Fps { num: 30, den: 1 },
        format: OutputFormat::new(Container::Mp4, "libx264", "aac"),
        audio,
        background: Rgba8::opaque(0, 0, 0),
    }
}

#[test]
fn args_stream_mp4_to_stdout_with_audio() {
    let audio = CaptureAudio {
        path: "/tmp/capture.f32le".into(),
        sample_rate: 48_000,
        channels: 2,
    };
    let args = ffmpeg_args(&spec(Some(audio)));
    let joined = args.join(" ");
    assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 64x112 -r 30/1 -i pipe:0"));
    assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i /tmp/capture.f32le"));
    assert!(joined.contains("-c:v libx264"));
    assert!(joined.contains("-c:a aac -shortest"));
    assert!(joined.contains("-movflags frag_keyframe+empty_moov"));
    assert!(joined.ends_with("-f mp4 pipe:1"));
}

#[test]
fn args_for_silent_webm() {
    let mut s = spec(None);
    s.format = OutputFormat::new(Container::WebM, "libvpx-vp9", "libopus");
    let joined = ffmpeg_args(&s).join(" ");
    assert!(joined.contains("-an"));
    assert!(!joined.contains("-movflags"));
    assert!(!joined.contains("f32le"));
    assert!(joined.ends_with("-f webm pipe:1"));
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new();
    let frame = FrameRGBA {
        width: 64,
        height: 112,
        data: vec![0; 64 * 112 * 4],
    };
    assert!(sink.push_frame(&frame).is_err());
    assert!(sink.finish().is_err());
    sink.abort();
}

#[test]
fn encodes_muxed_mp4_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let Ok(caps) = query_encoders() else {
        return;
    };
    if !caps.supports("libx264") || !caps.supports("aac") {
        eprintln!("skipping: libx264/aac not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let pcm_path = dir.path().join("capture.f32le");
    let samples: Vec<f32> = (0..48_000)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin() * 0.3)
        .collect();
    crate::audio::decode::write_f32le_file(&samples, &pcm_path).unwrap();

    let mut sink = FfmpegSink::new();
    sink.begin(&spec(Some(CaptureAudio {
        path: pcm_path,
        sample_rate: 48_000,
        channels: 1,
    })))
    .unwrap();
    for i in 0..30u8 {
        let frame = FrameRGBA {
            width: 64,
            height: 112,
            data: [i * 8, 40, 90, 255].repeat(64 * 112),
        };
        sink.push_frame(&frame).unwrap();
    }
    let video = sink.finish().unwrap();
    assert_eq!(video.frame_count, 30);
    assert_eq!(video.mime, "video/mp4");
    assert!(video.len_bytes() > 0);
    assert_eq!(&video.data[4..8], b"ftyp");
}

#[test]
fn abort_leaves_no_artifact() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut s = spec(None);
    s.format = OutputFormat::new(Container::Mp4, "mpeg4", "aac");
    let mut sink = FfmpegSink::new();
    sink.begin(&s).unwrap();
    sink.abort();
    assert!(sink.finish().is_err());
}
