//! Per-item lifecycle: content lookup, media generation with retry, and the single-slot job
//! scheduler that turns bundles into videos.

pub mod scheduler;
pub mod sources;
pub mod state;

pub use scheduler::{ItemRecord, Scheduler};
pub use sources::{
    AssetGenerator, BoxFuture, ContentSource, DirectoryAssets, JsonContentSource,
    PipelineRenderer, VideoRenderer,
};
pub use state::{ItemEvent, ItemState, Stage};
