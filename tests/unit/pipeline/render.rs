use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::*;
use crate::compositor::schedule::active_image;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::model::assets::{AudioHandle, Container, ImageHandle};
use crate::model::content::Category;
use crate::text::metrics::FixedAdvanceMetrics;

#[derive(Clone, Debug)]
struct Painted {
    index: u64,
    position_secs: f64,
    progress: f64,
    active_word: Option<usize>,
}

#[derive(Default)]
struct RecordingPainter {
    prepared: usize,
    painted: Vec<Painted>,
    fail_at: Option<u64>,
    delay: Option<Duration>,
}

impl ScenePainter for RecordingPainter {
    fn prepare(&mut self, item: &ContentItem, _bundle: &MediaAssetBundle) -> LectioResult<Scene> {
        self.prepared += 1;
        let cfg = cfg(10);
        Ok(Scene::layout_only(
            item,
            &cfg,
            &mut FixedAdvanceMetrics::new(10.0),
            &mut FixedAdvanceMetrics::new(10.0),
        ))
    }

    fn paint_frame(
        &mut self,
        scene: &Scene,
        frame: &FrameState,
        _carry: &mut CarryState,
    ) -> LectioResult<FrameRGBA> {
        if self.fail_at == Some(frame.index.0) {
            return Err(LectioError::evaluation("surface lost"));
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.painted.push(Painted {
            index: frame.index.0,
            position_secs: frame.position_secs,
            progress: frame.progress,
            active_word: scene.words.active_index(frame.progress),
        });
        Ok(FrameRGBA {
            width: 16,
            height: 16,
            data: [frame.index.0 as u8, 0, 0, 255].repeat(16 * 16),
        })
    }
}

#[derive(Default)]
struct SinkEvents {
    begun: AtomicBool,
    aborted: AtomicBool,
}

struct WatchedSink {
    inner: InMemorySink,
    events: Arc<SinkEvents>,
    fail_at: Option<usize>,
    pushed: usize,
}

impl WatchedSink {
    fn new(events: Arc<SinkEvents>, fail_at: Option<usize>) -> Box<Self> {
        Box::new(Self {
            inner: InMemorySink::new(),
            events,
            fail_at,
            pushed: 0,
        })
    }
}

impl CaptureSink for WatchedSink {
    fn begin(&mut self, spec: &EncodeSpec) -> LectioResult<()> {
        self.events.begun.store(true, Ordering::SeqCst);
        assert!(spec.audio.as_ref().is_some_and(|a| a.path.exists()));
        self.inner.begin(spec)
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> LectioResult<()> {
        if self.fail_at == Some(self.pushed) {
            return Err(LectioError::encode("muxer rejected stream"));
        }
        self.pushed += 1;
        self.inner.push_frame(frame)
    }

    fn finish(&mut self) -> LectioResult<VideoHandle> {
        self.inner.finish()
    }

    fn abort(&mut self) {
        self.events.aborted.store(true, Ordering::SeqCst);
        self.inner.abort();
    }
}

fn cfg(fps: u32) -> RenderConfig {
    RenderConfig {
        canvas: Canvas {
            width: 16,
            height: 16,
        },
        fps: Fps { num: fps, den: 1 },
        caption_max_width: 300.0,
        ..RenderConfig::default()
    }
}

fn raw() -> OutputFormat {
    OutputFormat::new(Container::Raw, "rawvideo", "none")
}

fn wav(secs: f64) -> Vec<u8> {
    let rate = 8000u32;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (secs * f64::from(rate)).round() as usize;
        for i in 0..n {
            let s = ((i as f32) * 0.05).sin() * 8000.0;
            w.write_sample(s as i16).unwrap();
        }
        w.finalize().unwrap();
    }
    cursor.into_inner()
}

fn item(body: &str) -> ContentItem {
    ContentItem {
        id: "gospel".into(),
        category: Category::Gospel,
        title: "Prólogo".into(),
        citation: "Jn 1, 1-5".into(),
        body_text: body.into(),
        display_date: "18 oct 2026".into(),
    }
}

fn bundle(images: usize, secs: f64) -> MediaAssetBundle {
    let mut b = MediaAssetBundle::empty("gospel");
    b.images = (0..images)
        .map(|i| ImageHandle::from_bytes(vec![i as u8; 4]))
        .collect();
    b.audio = Some(AudioHandle::from_bytes(wav(secs)));
    b
}

#[tokio::test]
async fn offline_render_produces_one_frame_per_period() {
    let mut painter = RecordingPainter::default();
    let events = Arc::new(SinkEvents::default());
    let video = render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 1.0),
        &cfg(30),
        &mut painter,
        WatchedSink::new(events.clone(), None),
        raw(),
    )
    .await
    .unwrap();

    assert_eq!(painter.prepared, 1);
    assert_eq!(painter.painted.len(), 30);
    assert_eq!(video.frame_count, 30);
    assert_eq!(video.len_bytes(), 30 * 16 * 16 * 4);
    assert_eq!(painter.painted[0].progress, 0.0);
    assert!(
        painter
            .painted
            .windows(2)
            .all(|w| w[0].progress < w[1].progress && w[0].index + 1 == w[1].index)
    );
    assert!(!events.aborted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn active_word_follows_playback_time() {
    let mut painter = RecordingPainter::default();
    render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 4.0),
        &cfg(10),
        &mut painter,
        Box::new(InMemorySink::new()),
        raw(),
    )
    .await
    .unwrap();

    let at = |t: f64| {
        painter
            .painted
            .iter()
            .find(|p| (p.position_secs - t).abs() < 1e-9)
            .cloned()
            .unwrap()
    };
    let one = at(1.0);
    assert!((one.progress - 0.25).abs() < 1e-12);
    assert_eq!(one.active_word, Some(1));
    assert_eq!(at(3.9).active_word, Some(3));
    assert_eq!(at(0.0).active_word, Some(0));
}

#[tokio::test]
async fn active_image_follows_playback_time() {
    let mut painter = RecordingPainter::default();
    render_with(
        &item("In principio erat Verbum"),
        &bundle(3, 9.0),
        &cfg(10),
        &mut painter,
        Box::new(InMemorySink::new()),
        raw(),
    )
    .await
    .unwrap();

    let image_at = |t: f64| {
        let p = painter
            .painted
            .iter()
            .find(|p| (p.position_secs - t).abs() < 1e-9)
            .unwrap();
        active_image(p.progress, 3).unwrap().index
    };
    assert_eq!(image_at(2.0), 0);
    assert_eq!(image_at(3.5), 1);
    assert_eq!(image_at(8.9), 2);
    assert_eq!(painter.painted.len(), 90);
}

#[tokio::test]
async fn incomplete_bundles_never_reach_the_painter_or_sink() {
    for b in [bundle(0, 1.0), {
        let mut b = bundle(2, 1.0);
        b.audio = None;
        b
    }] {
        let mut painter = RecordingPainter::default();
        let events = Arc::new(SinkEvents::default());
        let err = render_with(
            &item("x"),
            &b,
            &cfg(30),
            &mut painter,
            WatchedSink::new(events.clone(), None),
            raw(),
        )
        .await
        .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(painter.prepared, 0);
        assert!(painter.painted.is_empty());
        assert!(!events.begun.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn encode_failure_rejects_and_aborts() {
    let mut painter = RecordingPainter::default();
    let events = Arc::new(SinkEvents::default());
    let err = render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 1.0),
        &cfg(30),
        &mut painter,
        WatchedSink::new(events.clone(), Some(4)),
        raw(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LectioError::Encode(_)));
    assert!(err.to_string().contains("muxer rejected stream"));
    assert!(painter.painted.len() < 30);
}

#[tokio::test]
async fn paint_failure_discards_partial_output() {
    let mut painter = RecordingPainter {
        fail_at: Some(3),
        ..RecordingPainter::default()
    };
    let events = Arc::new(SinkEvents::default());
    let err = render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 1.0),
        &cfg(30),
        &mut painter,
        WatchedSink::new(events.clone(), None),
        raw(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LectioError::Evaluation(_)));
    assert_eq!(painter.painted.len(), 3);
    assert!(events.aborted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn realtime_pacing_follows_the_wall_clock() {
    let mut painter = RecordingPainter::default();
    let cfg = RenderConfig {
        pacing: Pacing::Realtime,
        ..cfg(20)
    };
    let video = render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 0.3),
        &cfg,
        &mut painter,
        Box::new(InMemorySink::new()),
        raw(),
    )
    .await
    .unwrap();

    // 0.3s at 20 fps covers exactly six slots, however many paints fit in.
    assert_eq!(video.frame_count, 6);
    assert!(!painter.painted.is_empty() && painter.painted.len() <= 6);
    assert!(painter.painted.iter().all(|p| p.position_secs <= 0.3));
    assert!(
        painter
            .painted
            .windows(2)
            .all(|w| w[0].position_secs < w[1].position_secs && w[0].index < w[1].index)
    );
}

#[tokio::test]
async fn slow_realtime_paints_still_span_the_whole_narration() {
    let mut painter = RecordingPainter {
        delay: Some(Duration::from_millis(60)),
        ..RecordingPainter::default()
    };
    let cfg = RenderConfig {
        pacing: Pacing::Realtime,
        ..cfg(30)
    };
    let video = render_with(
        &item("In principio erat Verbum"),
        &bundle(1, 1.0),
        &cfg,
        &mut painter,
        Box::new(InMemorySink::new()),
        raw(),
    )
    .await
    .unwrap();

    assert_eq!(video.frame_count, 30);
    assert_eq!(video.duration, Duration::from_secs(1));
    assert!(painter.painted.len() < 30, "{}", painter.painted.len());

    // Each painted frame sits in the slot of its playback instant; gaps repeat the previous one.
    for p in &painter.painted {
        assert_eq!(p.index, cfg.fps.secs_to_frames_floor(p.position_secs).min(29));
    }
    let slots: Vec<u8> = video.data.chunks(16 * 16 * 4).map(|f| f[0]).collect();
    assert_eq!(slots.len(), 30);
    assert!(slots.windows(2).all(|w| w[0] <= w[1]), "{slots:?}");
    assert!(slots.iter().enumerate().all(|(k, &s)| usize::from(s) <= k));
    let last = painter.painted.last().unwrap();
    assert_eq!(u64::from(slots[29]), last.index);
}

#[test]
fn encoder_holds_gaps_and_pads_to_the_requested_length() {
    let spec = EncodeSpec {
        width: 2,
        height: 2,
        fps: Fps { num: 10, den: 1 },
        format: raw(),
        audio: None,
        background: Rgba8::opaque(0, 0, 0),
    };
    let frame = |tag: u8| FrameRGBA {
        width: 2,
        height: 2,
        data: [tag, 0, 0, 255].repeat(4),
    };
    let (tx, rx) = mpsc::channel(8);
    for msg in [
        EncoderMsg::Frame {
            frame: frame(1),
            hold: 0,
        },
        EncoderMsg::Frame {
            frame: frame(2),
            hold: 2,
        },
        EncoderMsg::Finish { total: 6 },
    ] {
        tx.blocking_send(msg).unwrap();
    }
    drop(tx);

    let video = run_encoder(Box::new(InMemorySink::new()), &spec, rx).unwrap();
    assert_eq!(video.frame_count, 6);
    let tags: Vec<u8> = video.data.chunks(16).map(|f| f[0]).collect();
    assert_eq!(tags, [1, 1, 1, 2, 2, 2]);
}

#[test]
fn still_paints_once_at_the_given_progress() {
    let mut painter = RecordingPainter::default();
    let frame = render_still(
        &mut painter,
        &item("In principio erat Verbum"),
        &bundle(1, 1.0),
        &cfg(30),
        1.5,
    )
    .unwrap();
    assert_eq!(frame.width, 16);
    assert_eq!(painter.painted.len(), 1);
    assert_eq!(painter.painted[0].progress, 1.0);
    assert_eq!(painter.painted[0].active_word, Some(3));
}
