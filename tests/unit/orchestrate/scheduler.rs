use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;
use crate::model::assets::Container;
use crate::model::content::Category;
use crate::orchestrate::sources::BoxFuture;

#[derive(Default)]
struct Gauge {
    now: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let n = self.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(n, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.now.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct GenState {
    image_calls: Mutex<Vec<String>>,
    audio_calls: Mutex<Vec<String>>,
    broken_audio: Mutex<HashSet<String>>,
    transient_audio_failures: AtomicUsize,
    jobs: Gauge,
}

#[derive(Clone, Default)]
struct FakeGenerator(Arc<GenState>);

impl AssetGenerator for FakeGenerator {
    fn images(
        &self,
        item: ContentItem,
        _art_direction: Option<String>,
    ) -> BoxFuture<LectioResult<Vec<ImageHandle>>> {
        let s = self.0.clone();
        Box::pin(async move {
            s.jobs.enter();
            s.image_calls.lock().unwrap().push(item.id.clone());
            tokio::time::sleep(Duration::from_millis(50)).await;
            s.jobs.leave();
            Ok(vec![ImageHandle::from_bytes(item.id.into_bytes())])
        })
    }

    fn audio(&self, item: ContentItem) -> BoxFuture<LectioResult<AudioHandle>> {
        let s = self.0.clone();
        Box::pin(async move {
            s.audio_calls.lock().unwrap().push(item.id.clone());
            tokio::time::sleep(Duration::from_millis(30)).await;
            if s.broken_audio.lock().unwrap().contains(&item.id) {
                return Err(LectioError::upstream("voice rejected the text"));
            }
            let pending = s.transient_audio_failures.load(Ordering::SeqCst);
            if pending > 0 {
                s.transient_audio_failures.store(pending - 1, Ordering::SeqCst);
                return Err(LectioError::transient("speech model overloaded"));
            }
            Ok(AudioHandle::from_bytes(vec![1, 2, 3]))
        })
    }
}

#[derive(Default)]
struct RenderState {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    jobs: Gauge,
}

#[derive(Clone, Default)]
struct FakeRenderer(Arc<RenderState>);

impl VideoRenderer for FakeRenderer {
    fn render(
        &self,
        item: ContentItem,
        bundle: MediaAssetBundle,
    ) -> BoxFuture<LectioResult<VideoHandle>> {
        let s = self.0.clone();
        Box::pin(async move {
            s.jobs.enter();
            s.calls.lock().unwrap().push(item.id.clone());
            tokio::time::sleep(Duration::from_millis(200)).await;
            s.jobs.leave();
            bundle.check_renderable()?;
            if s.failing.lock().unwrap().contains(&item.id) {
                return Err(LectioError::encode("unsupported container"));
            }
            Ok(VideoHandle {
                data: Arc::from(item.id.into_bytes()),
                mime: "video/mp4".into(),
                container: Container::Mp4,
                frame_count: 1,
                duration: Duration::from_secs(1),
            })
        })
    }
}

fn item(id: &str, category: Category) -> ContentItem {
    ContentItem {
        id: id.into(),
        category,
        title: String::new(),
        citation: String::new(),
        body_text: "Palabra del Señor".into(),
        display_date: "18 oct 2026".into(),
    }
}

fn scheduler(generator: &FakeGenerator, renderer: &FakeRenderer) -> Scheduler {
    let mut s = Scheduler::new(Arc::new(generator.clone()), Arc::new(renderer.clone()))
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            is_retryable: LectioError::is_transient,
        });
    s.register([
        item("first", Category::FirstReading),
        item("psalm", Category::Psalm),
        item("gospel", Category::Gospel),
    ]);
    s
}

#[tokio::test(start_paused = true)]
async fn every_item_reaches_video_ready_one_job_per_slot() {
    let generator = FakeGenerator::default();
    let renderer = FakeRenderer::default();
    let mut s = scheduler(&generator, &renderer);
    s.run_until_idle().await;

    for rec in s.records() {
        assert_eq!(rec.state, ItemState::VideoReady, "{}", rec.item.id);
        assert!(rec.bundle.rendered_video.is_some());
        assert!(!rec.bundle.video_job_running);
        assert!(rec.failures.is_empty());
    }
    assert_eq!(generator.0.jobs.max.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.0.jobs.max.load(Ordering::SeqCst), 1);
    assert_eq!(
        *renderer.0.calls.lock().unwrap(),
        ["first", "psalm", "gospel"]
    );
    assert!(s.is_idle());
}

#[tokio::test(start_paused = true)]
async fn partial_failure_keeps_images_and_retry_fetches_only_audio() {
    let generator = FakeGenerator::default();
    generator
        .0
        .broken_audio
        .lock()
        .unwrap()
        .insert("psalm".into());
    let renderer = FakeRenderer::default();
    let mut s = scheduler(&generator, &renderer);
    s.run_until_idle().await;

    let psalm = s.record("psalm").unwrap();
    assert!(matches!(
        psalm.state,
        ItemState::Failed {
            stage: Stage::Assets,
            ..
        }
    ));
    assert_eq!(psalm.bundle.images.len(), 1);
    assert!(psalm.bundle.audio.is_none());
    assert!(!psalm.bundle.audio_job_running);
    assert!(psalm.failures[0].contains("voice rejected"));
    assert_eq!(s.state("first"), Some(&ItemState::VideoReady));
    assert_eq!(s.state("gospel"), Some(&ItemState::VideoReady));

    generator.0.broken_audio.lock().unwrap().clear();
    s.retry("psalm").unwrap();
    s.run_until_idle().await;

    assert_eq!(s.state("psalm"), Some(&ItemState::VideoReady));
    let image_calls = generator.0.image_calls.lock().unwrap();
    assert_eq!(image_calls.iter().filter(|id| *id == "psalm").count(), 1);
    let audio_calls = generator.0.audio_calls.lock().unwrap();
    assert_eq!(audio_calls.iter().filter(|id| *id == "psalm").count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_generation_failures_are_retried() {
    let generator = FakeGenerator::default();
    generator
        .0
        .transient_audio_failures
        .store(2, Ordering::SeqCst);
    let renderer = FakeRenderer::default();
    let mut s = scheduler(&generator, &renderer);
    s.run_until_idle().await;

    assert!(
        s.records()
            .iter()
            .all(|r| r.state == ItemState::VideoReady)
    );
    let audio_calls = generator.0.audio_calls.lock().unwrap();
    assert_eq!(audio_calls.iter().filter(|id| *id == "first").count(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_render_waits_for_explicit_retry() {
    let generator = FakeGenerator::default();
    let renderer = FakeRenderer::default();
    renderer.0.failing.lock().unwrap().insert("gospel".into());
    let mut s = scheduler(&generator, &renderer);
    s.run_until_idle().await;

    assert!(matches!(
        s.state("gospel"),
        Some(ItemState::Failed {
            stage: Stage::Render,
            ..
        })
    ));
    let count = |s: &FakeRenderer| {
        s.0.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| *id == "gospel")
            .count()
    };
    assert_eq!(count(&renderer), 1);
    assert!(s.is_idle());
    assert!(!s.step().await);

    renderer.0.failing.lock().unwrap().clear();
    s.retry("gospel").unwrap();
    s.run_until_idle().await;
    assert_eq!(s.state("gospel"), Some(&ItemState::VideoReady));
    assert_eq!(count(&renderer), 2);
}

#[tokio::test]
async fn retry_rejects_unknown_or_healthy_items() {
    let generator = FakeGenerator::default();
    let renderer = FakeRenderer::default();
    let mut s = scheduler(&generator, &renderer);
    assert!(s.retry("missing").is_err());
    assert!(s.retry("psalm").is_err());
    s.register([item("psalm", Category::Psalm)]);
    assert_eq!(s.records().len(), 3);
}
