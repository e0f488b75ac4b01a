use crate::foundation::error::{LectioError, LectioResult};

/// Which half of the pipeline an item failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Assets,
    Render,
}

/// Per-item pipeline state.
///
/// `Pending -> AssetsGenerating -> AssetsReady -> VideoRendering -> VideoReady`, with `Failed`
/// reachable from either running state. Only [`ItemEvent::Retry`] leaves `Failed`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    AssetsGenerating,
    AssetsReady,
    VideoRendering,
    VideoReady,
    Failed { stage: Stage, reason: String },
}

/// What happened to an item; fed to [`ItemState::next`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemEvent {
    AssetsStarted,
    /// Generation settled. `complete` is false when at least one medium is still missing.
    AssetsSettled { complete: bool, reason: Option<String> },
    RenderStarted,
    RenderSucceeded,
    RenderFailed(String),
    Retry,
}

impl ItemState {
    pub fn next(&self, event: &ItemEvent) -> LectioResult<ItemState> {
        use ItemEvent as E;
        use ItemState as S;

        let next = match (self, event) {
            (S::Pending, E::AssetsStarted) => S::AssetsGenerating,
            (S::AssetsGenerating, E::AssetsSettled { complete: true, .. }) => S::AssetsReady,
            (S::AssetsGenerating, E::AssetsSettled { complete: false, reason }) => S::Failed {
                stage: Stage::Assets,
                reason: reason
                    .clone()
                    .unwrap_or_else(|| "media generation incomplete".to_string()),
            },
            (S::AssetsReady, E::RenderStarted) => S::VideoRendering,
            (S::VideoRendering, E::RenderSucceeded) => S::VideoReady,
            (S::VideoRendering, E::RenderFailed(reason)) => S::Failed {
                stage: Stage::Render,
                reason: reason.clone(),
            },
            (S::Failed { stage: Stage::Assets, .. }, E::Retry) => S::Pending,
            (S::Failed { stage: Stage::Render, .. }, E::Retry) => S::AssetsReady,
            (state, event) => {
                return Err(LectioError::validation(format!(
                    "invalid transition {event:?} from {}",
                    state.name()
                )));
            }
        };
        Ok(next)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::AssetsGenerating => "assets_generating",
            ItemState::AssetsReady => "assets_ready",
            ItemState::VideoRendering => "video_rendering",
            ItemState::VideoReady => "video_ready",
            ItemState::Failed { .. } => "failed",
        }
    }

    /// A job for this item is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, ItemState::AssetsGenerating | ItemState::VideoRendering)
    }

    /// Nothing more happens without an explicit retry.
    pub fn is_settled(&self) -> bool {
        matches!(self, ItemState::VideoReady | ItemState::Failed { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/state.rs"]
mod tests;
