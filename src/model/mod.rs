//! Content items and their per-item media bundles.

pub mod assets;
pub mod content;

#[cfg(test)]
#[path = "../../tests/unit/model/model.rs"]
mod tests;
