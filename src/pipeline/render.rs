use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::audio::analyser::FrequencySnapshot;
use crate::audio::clock::{PlaybackClock, RealtimeClock, SteppedClock, TransportStatus};
use crate::audio::decode::decode_audio;
use crate::audio::graph::AudioGraph;
use crate::compositor::paint::{Compositor, ScenePainter};
use crate::compositor::raster::FrameRGBA;
use crate::compositor::scene::{CarryState, FrameState, Scene};
use crate::config::{OutputFormat, Pacing, RenderConfig};
use crate::encode::ffmpeg::FfmpegSink;
use crate::encode::negotiate::negotiate_format;
use crate::encode::sink::{CaptureSink, EncodeSpec};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::{MediaAssetBundle, VideoHandle};
use crate::model::content::ContentItem;

enum EncoderMsg {
    /// Fill `hold` slots with the previous frame, then push `frame`.
    Frame { frame: FrameRGBA, hold: u64 },
    /// Repeat the last frame until `total` frames were pushed, then finalize.
    Finish { total: u64 },
}

/// Render one item to a muxed video with the built-in compositor and the system `ffmpeg`.
///
/// Fails fast with a precondition error before any font, surface or encoder is touched when the
/// bundle lacks images or audio.
#[tracing::instrument(skip_all, fields(item = %item.id))]
pub async fn render(
    item: &ContentItem,
    bundle: &MediaAssetBundle,
    cfg: &RenderConfig,
) -> LectioResult<VideoHandle> {
    bundle.check_renderable()?;
    cfg.validate()?;

    let formats = cfg.formats.clone();
    let format = tokio::task::spawn_blocking(move || negotiate_format(&formats))
        .await
        .map_err(|e| LectioError::encode(format!("codec negotiation task failed: {e}")))??;
    let mut painter = Compositor::new(cfg.clone())?;
    render_with(
        item,
        bundle,
        cfg,
        &mut painter,
        Box::new(FfmpegSink::new()),
        format,
    )
    .await
}

/// Render with a caller-supplied painter and sink.
///
/// The audio transport is the only clock: the loop stops when playback ends (or is paused), and
/// each frame samples the analyser at the instant it then paints. Under realtime pacing a painted
/// frame lands in the slot `floor(position * fps)`; slots skipped by a slow paint repeat the
/// previous frame and the stream is padded to cover the whole track. Frames go to a blocking
/// encoder task over a bounded channel. On any failure the sink is aborted, the audio graph
/// released and no artifact returned.
#[tracing::instrument(skip_all, fields(item = %item.id, pacing = ?cfg.pacing))]
pub async fn render_with(
    item: &ContentItem,
    bundle: &MediaAssetBundle,
    cfg: &RenderConfig,
    painter: &mut dyn ScenePainter,
    sink: Box<dyn CaptureSink>,
    format: OutputFormat,
) -> LectioResult<VideoHandle> {
    bundle.check_renderable()?;
    cfg.validate()?;
    let Some(audio) = bundle.audio.clone() else {
        return Err(LectioError::precondition("bundle has no audio"));
    };

    let decoded = tokio::task::spawn_blocking(move || decode_audio(&audio))
        .await
        .map_err(|e| LectioError::evaluation(format!("audio decode task failed: {e}")))??;
    if decoded.is_empty() {
        return Err(LectioError::precondition("audio track is empty"));
    }

    let scene = painter.prepare(item, bundle)?;
    let duration = decoded.duration_secs();
    let transport: Box<dyn PlaybackClock> = match cfg.pacing {
        Pacing::Realtime => Box::new(RealtimeClock::new(duration)),
        Pacing::Offline => Box::new(SteppedClock::new(cfg.fps, duration)),
    };
    let mut graph = AudioGraph::new(decoded, transport, &cfg.analyser)?;
    let capture = graph.open_capture(&std::env::temp_dir())?;

    let spec = EncodeSpec {
        width: cfg.canvas.width,
        height: cfg.canvas.height,
        fps: cfg.fps,
        format,
        audio: Some(capture),
        background: cfg.theme.background,
    };
    tracing::info!(
        duration_secs = duration,
        images = scene.images.len(),
        words = scene.words.len(),
        "render started"
    );

    let (tx, rx) = mpsc::channel::<EncoderMsg>(cfg.channel_capacity);
    let encoder = tokio::task::spawn_blocking(move || run_encoder(sink, &spec, rx));

    let produced = frame_loop(&scene, cfg, painter, &mut graph, &tx).await;
    let outcome = match produced {
        Ok(frames) => {
            // A closed channel means the encoder already failed; its error wins below.
            let _ = tx.send(EncoderMsg::Finish { total: frames }).await;
            drop(tx);
            join_encoder(encoder).await.map(|video| (frames, video))
        }
        Err(e) => {
            drop(tx);
            match join_encoder(encoder).await {
                Err(encode_err) if matches!(e, LectioError::Encode(_)) => Err(encode_err),
                _ => Err(e),
            }
        }
    };
    graph.release();

    let (frames, video) = outcome?;
    tracing::info!(
        frames,
        bytes = video.len_bytes(),
        mime = %video.mime,
        "render finished"
    );
    Ok(video)
}

/// Returns the number of frames the encoder must end up with.
async fn frame_loop(
    scene: &Scene,
    cfg: &RenderConfig,
    painter: &mut dyn ScenePainter,
    graph: &mut AudioGraph,
    tx: &mpsc::Sender<EncoderMsg>,
) -> LectioResult<u64> {
    let mut carry = CarryState::new(cfg);
    let total = cfg.fps.frames_to_cover(graph.duration_secs());
    let mut ticker = match cfg.pacing {
        Pacing::Realtime => {
            let mut ticker = tokio::time::interval(cfg.fps.frame_period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(ticker)
        }
        Pacing::Offline => None,
    };
    // Output slots already filled.
    let mut slots = 0u64;
    let mut painted = 0u64;

    graph.start();
    loop {
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
        if !graph.is_playing() {
            break;
        }

        let sample = graph.sample()?;
        let slot = match cfg.pacing {
            Pacing::Realtime => cfg
                .fps
                .secs_to_frames_floor(sample.position_secs)
                .min(total.saturating_sub(1)),
            Pacing::Offline => slots,
        };
        if slot < slots {
            continue;
        }
        let state = FrameState {
            index: FrameIndex(slot),
            progress: sample.progress,
            position_secs: sample.position_secs,
            snapshot: sample.snapshot,
        };
        let frame = painter.paint_frame(scene, &state, &mut carry)?;
        tx.send(EncoderMsg::Frame {
            frame,
            hold: slot - slots,
        })
        .await
        .map_err(|_| LectioError::encode("encoder stopped accepting frames"))?;
        graph.frame_presented();
        slots = slot + 1;
        painted += 1;
    }

    let frames = if graph.status() == TransportStatus::Ended {
        total.max(slots)
    } else {
        slots
    };
    tracing::debug!(frames, painted, status = ?graph.status(), "frame loop stopped");
    Ok(frames)
}

fn run_encoder(
    mut sink: Box<dyn CaptureSink>,
    spec: &EncodeSpec,
    mut rx: mpsc::Receiver<EncoderMsg>,
) -> LectioResult<VideoHandle> {
    sink.begin(spec)?;
    match feed_encoder(sink.as_mut(), &mut rx) {
        Ok(true) => sink.finish(),
        Ok(false) => {
            sink.abort();
            Err(LectioError::encode("render cancelled before finalize"))
        }
        Err(e) => {
            sink.abort();
            Err(e)
        }
    }
}

/// Push frames until `Finish` (`Ok(true)`) or the channel closes (`Ok(false)`).
fn feed_encoder(
    sink: &mut dyn CaptureSink,
    rx: &mut mpsc::Receiver<EncoderMsg>,
) -> LectioResult<bool> {
    let mut last: Option<FrameRGBA> = None;
    let mut pushed = 0u64;
    while let Some(msg) = rx.blocking_recv() {
        match msg {
            EncoderMsg::Frame { frame, hold } => {
                let held = last.as_ref().unwrap_or(&frame);
                for _ in 0..hold {
                    sink.push_frame(held)?;
                }
                sink.push_frame(&frame)?;
                pushed += hold + 1;
                last = Some(frame);
            }
            EncoderMsg::Finish { total } => {
                if pushed < total {
                    let Some(frame) = last.as_ref() else {
                        return Err(LectioError::encode("no frame to pad the stream with"));
                    };
                    for _ in pushed..total {
                        sink.push_frame(frame)?;
                    }
                }
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn join_encoder(
    encoder: tokio::task::JoinHandle<LectioResult<VideoHandle>>,
) -> LectioResult<VideoHandle> {
    encoder
        .await
        .map_err(|e| LectioError::encode(format!("encoder task failed: {e}")))?
}

/// Paint a single frame at `progress` without audio, for thumbnails and previews.
pub fn render_still(
    painter: &mut dyn ScenePainter,
    item: &ContentItem,
    bundle: &MediaAssetBundle,
    cfg: &RenderConfig,
    progress: f64,
) -> LectioResult<FrameRGBA> {
    let scene = painter.prepare(item, bundle)?;
    let mut carry = CarryState::new(cfg);
    let state = FrameState {
        index: FrameIndex(0),
        progress: progress.clamp(0.0, 1.0),
        position_secs: 0.0,
        snapshot: FrequencySnapshot::silent(cfg.analyser.bin_count()),
    };
    painter.paint_frame(&scene, &state, &mut carry)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/render.rs"]
mod tests;
