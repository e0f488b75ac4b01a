use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};

use crate::foundation::error::{LectioError, LectioResult};
use crate::model::assets::{AudioHandle, ImageHandle, MediaAssetBundle, VideoHandle};
use crate::model::content::ContentItem;
use crate::orchestrate::sources::{AssetGenerator, ContentSource, VideoRenderer};
use crate::orchestrate::state::{ItemEvent, ItemState, Stage};
use crate::retry::{RetryPolicy, with_retry};

/// One registered item with its bundle and the failures recorded so far.
#[derive(Clone, Debug)]
pub struct ItemRecord {
    pub item: ContentItem,
    pub state: ItemState,
    pub bundle: MediaAssetBundle,
    pub failures: Vec<String>,
}

struct AssetOutcome {
    images: Option<LectioResult<Vec<ImageHandle>>>,
    audio: Option<LectioResult<AudioHandle>>,
}

struct Job<T> {
    item_id: String,
    handle: JoinHandle<T>,
}

/// Drives every registered item through its [`ItemState`] machine.
///
/// One generation job and one render job may be in flight at any time, across all items. Each
/// [`Scheduler::step`] dispatches whatever is eligible, then waits for one job to settle. Failures
/// stay local to their item; nothing leaves `Failed` without [`Scheduler::retry`].
pub struct Scheduler {
    items: Vec<ItemRecord>,
    generator: Arc<dyn AssetGenerator>,
    renderer: Arc<dyn VideoRenderer>,
    retry_policy: RetryPolicy<LectioError>,
    generation: Option<Job<AssetOutcome>>,
    render: Option<Job<LectioResult<VideoHandle>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("items", &self.items.len())
            .field(
                "generating",
                &self.generation.as_ref().map(|j| j.item_id.as_str()),
            )
            .field("rendering", &self.render.as_ref().map(|j| j.item_id.as_str()))
            .finish()
    }
}

impl Scheduler {
    pub fn new(generator: Arc<dyn AssetGenerator>, renderer: Arc<dyn VideoRenderer>) -> Self {
        Self {
            items: Vec::new(),
            generator,
            renderer,
            retry_policy: RetryPolicy::transient(),
            generation: None,
            render: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy<LectioError>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Add items as `Pending` with empty bundles. Ids already registered are ignored.
    pub fn register(&mut self, items: impl IntoIterator<Item = ContentItem>) {
        for item in items {
            if self.items.iter().any(|r| r.item.id == item.id) {
                tracing::debug!(item = %item.id, "item already registered");
                continue;
            }
            self.items.push(ItemRecord {
                bundle: MediaAssetBundle::empty(item.id.clone()),
                state: ItemState::Pending,
                failures: Vec::new(),
                item,
            });
        }
    }

    /// Fetch and register the items of `date`. Returns how many items the source produced.
    pub async fn load_date(&mut self, source: &dyn ContentSource, date: &str) -> LectioResult<usize> {
        let items = source.items_for(date).await?;
        let n = items.len();
        self.register(items);
        tracing::info!(date, items = n, "content loaded");
        Ok(n)
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.items
    }

    pub fn record(&self, id: &str) -> Option<&ItemRecord> {
        self.items.iter().find(|r| r.item.id == id)
    }

    pub fn state(&self, id: &str) -> Option<&ItemState> {
        self.record(id).map(|r| &r.state)
    }

    /// Set the art direction passed to the next image generation of `id`.
    pub fn set_art_direction(&mut self, id: &str, prompt: impl Into<String>) -> LectioResult<()> {
        let rec = self.record_mut(id)?;
        rec.bundle.art_direction_prompt = Some(prompt.into());
        Ok(())
    }

    /// Explicitly re-run a failed item. Failed generation resumes at `Pending` and only asks for the
    /// media still missing; a failed render resumes at `AssetsReady`.
    pub fn retry(&mut self, id: &str) -> LectioResult<()> {
        self.transition(id, ItemEvent::Retry)
    }

    fn record_mut(&mut self, id: &str) -> LectioResult<&mut ItemRecord> {
        self.items
            .iter_mut()
            .find(|r| r.item.id == id)
            .ok_or_else(|| LectioError::validation(format!("unknown item '{id}'")))
    }

    fn transition(&mut self, id: &str, event: ItemEvent) -> LectioResult<()> {
        let rec = self.record_mut(id)?;
        let next = rec.state.next(&event)?;
        tracing::debug!(item = id, from = rec.state.name(), to = next.name(), "transition");
        rec.state = next;
        Ok(())
    }

    /// True when no job is running and no item can make progress without a retry.
    pub fn is_idle(&self) -> bool {
        self.generation.is_none()
            && self.render.is_none()
            && !self
                .items
                .iter()
                .any(|r| matches!(r.state, ItemState::Pending | ItemState::AssetsReady))
    }

    /// Start the next eligible jobs in registration order.
    #[tracing::instrument(level = "debug", skip_all)]
    fn dispatch(&mut self) {
        if self.generation.is_none()
            && let Some(idx) = self
                .items
                .iter()
                .position(|r| r.state == ItemState::Pending)
        {
            self.start_generation(idx);
        }
        if self.render.is_none()
            && let Some(idx) = self
                .items
                .iter()
                .position(|r| r.state == ItemState::AssetsReady)
        {
            self.start_render(idx);
        }
    }

    fn start_generation(&mut self, idx: usize) {
        let rec = &mut self.items[idx];
        let id = rec.item.id.clone();
        let need_images = rec.bundle.images.is_empty();
        let need_audio = rec.bundle.audio.is_none();
        rec.bundle.image_job_running = need_images;
        rec.bundle.audio_job_running = need_audio;
        let item = rec.item.clone();
        let prompt = rec.bundle.art_direction_prompt.clone();
        if let Err(e) = self.transition(&id, ItemEvent::AssetsStarted) {
            tracing::error!(item = %id, error = %e, "cannot start generation");
            return;
        }
        tracing::info!(item = %id, need_images, need_audio, "generating media");

        let generator = self.generator.clone();
        let policy = self.retry_policy.clone();
        let handle = tokio::spawn(async move {
            let images = async {
                if !need_images {
                    return None;
                }
                Some(
                    with_retry(&policy, || {
                        generator.images(item.clone(), prompt.clone())
                    })
                    .await,
                )
            };
            let audio = async {
                if !need_audio {
                    return None;
                }
                Some(with_retry(&policy, || generator.audio(item.clone())).await)
            };
            let (images, audio) = tokio::join!(images, audio);
            AssetOutcome { images, audio }
        });
        self.generation = Some(Job {
            item_id: id,
            handle,
        });
    }

    fn start_render(&mut self, idx: usize) {
        let rec = &mut self.items[idx];
        let id = rec.item.id.clone();
        if let Err(e) = rec.bundle.check_renderable() {
            tracing::error!(item = %id, error = %e, "assets ready but bundle incomplete");
            rec.failures.push(e.to_string());
            rec.state = ItemState::Failed {
                stage: Stage::Assets,
                reason: e.to_string(),
            };
            return;
        }
        rec.bundle.video_job_running = true;
        let item = rec.item.clone();
        let bundle = rec.bundle.clone();
        if let Err(e) = self.transition(&id, ItemEvent::RenderStarted) {
            tracing::error!(item = %id, error = %e, "cannot start render");
            return;
        }
        tracing::info!(item = %id, "rendering video");

        let handle = tokio::spawn(self.renderer.render(item, bundle));
        self.render = Some(Job {
            item_id: id,
            handle,
        });
    }

    fn settle_assets(&mut self, id: &str, outcome: Result<AssetOutcome, JoinError>) {
        let Ok(rec) = self.record_mut(id) else {
            return;
        };
        rec.bundle.image_job_running = false;
        rec.bundle.audio_job_running = false;

        let mut reasons = Vec::new();
        match outcome {
            Ok(AssetOutcome { images, audio }) => {
                match images {
                    Some(Ok(images)) => rec.bundle.images = images,
                    Some(Err(e)) => reasons.push(format!("images: {e}")),
                    None => {}
                }
                match audio {
                    Some(Ok(audio)) => rec.bundle.audio = Some(audio),
                    Some(Err(e)) => reasons.push(format!("audio: {e}")),
                    None => {}
                }
            }
            Err(e) => reasons.push(format!("generation task failed: {e}")),
        }
        for r in &reasons {
            tracing::warn!(item = id, reason = %r, "media generation failed");
        }
        rec.failures.extend(reasons.iter().cloned());

        let complete = rec.bundle.is_renderable();
        let reason = (!reasons.is_empty()).then(|| reasons.join("; "));
        if let Err(e) = self.transition(id, ItemEvent::AssetsSettled { complete, reason }) {
            tracing::error!(item = id, error = %e, "unexpected generation result");
        }
    }

    fn settle_render(&mut self, id: &str, outcome: Result<LectioResult<VideoHandle>, JoinError>) {
        let Ok(rec) = self.record_mut(id) else {
            return;
        };
        rec.bundle.video_job_running = false;
        let event = match outcome {
            Ok(Ok(video)) => {
                tracing::info!(item = id, bytes = video.len_bytes(), "video ready");
                rec.bundle.rendered_video = Some(video);
                ItemEvent::RenderSucceeded
            }
            Ok(Err(e)) => {
                tracing::warn!(item = id, error = %e, "render failed");
                rec.failures.push(e.to_string());
                ItemEvent::RenderFailed(e.to_string())
            }
            Err(e) => {
                let reason = format!("render task failed: {e}");
                tracing::warn!(item = id, error = %reason, "render failed");
                rec.failures.push(reason.clone());
                ItemEvent::RenderFailed(reason)
            }
        };
        if let Err(e) = self.transition(id, event) {
            tracing::error!(item = id, error = %e, "unexpected render result");
        }
    }

    /// Dispatch eligible work, then wait for one job to settle. Returns `false` when idle.
    pub async fn step(&mut self) -> bool {
        self.dispatch();
        if self.generation.is_none() && self.render.is_none() {
            return false;
        }
        tokio::select! {
            (id, res) = join_slot(&mut self.generation), if self.generation.is_some() => {
                self.settle_assets(&id, res);
            }
            (id, res) = join_slot(&mut self.render), if self.render.is_some() => {
                self.settle_render(&id, res);
            }
        }
        true
    }

    /// Step until nothing can progress without an explicit retry.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }
}

async fn join_slot<T>(slot: &mut Option<Job<T>>) -> (String, Result<T, JoinError>) {
    let Some(job) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let res = (&mut job.handle).await;
    let id = job.item_id.clone();
    *slot = None;
    (id, res)
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/scheduler.rs"]
mod tests;
