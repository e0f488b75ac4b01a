use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{LectioError, LectioResult};

/// Liturgical category of a reading, in celebration order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FirstReading,
    Psalm,
    SecondReading,
    Gospel,
}

impl Category {
    /// All categories in liturgical order.
    pub const ALL: [Category; 4] = [
        Category::FirstReading,
        Category::Psalm,
        Category::SecondReading,
        Category::Gospel,
    ];

    /// Stable snake_case key (matches the serialized form).
    pub fn key(self) -> &'static str {
        match self {
            Category::FirstReading => "first_reading",
            Category::Psalm => "psalm",
            Category::SecondReading => "second_reading",
            Category::Gospel => "gospel",
        }
    }

    /// Heading shown in the header badge.
    pub fn label(self) -> &'static str {
        match self {
            Category::FirstReading => "Primera Lectura",
            Category::Psalm => "Salmo Responsorial",
            Category::SecondReading => "Segunda Lectura",
            Category::Gospel => "Evangelio",
        }
    }

    /// Title-cased key, used when an item arrives without a title ("Second Reading").
    pub fn fallback_title(self) -> String {
        self.key()
            .split('_')
            .map(|w| {
                let mut cs = w.chars();
                match cs.next() {
                    Some(first) => first.to_uppercase().chain(cs).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One liturgical text unit to be turned into a video. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub citation: String,
    pub body_text: String,
    #[serde(default)]
    pub display_date: String,
}

impl ContentItem {
    /// Title to render, falling back to the category name when empty.
    pub fn display_title(&self) -> String {
        let t = self.title.trim();
        if t.is_empty() {
            self.category.fallback_title()
        } else {
            t.to_string()
        }
    }

    pub fn validate(&self) -> LectioResult<()> {
        if self.id.trim().is_empty() {
            return Err(LectioError::validation("content item id must be non-empty"));
        }
        if self.body_text.split_whitespace().next().is_none() {
            return Err(LectioError::validation(format!(
                "content item '{}' has an empty body",
                self.id
            )));
        }
        Ok(())
    }

    /// Load a single item from a JSON file.
    pub fn from_path(path: &Path) -> LectioResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read content item '{}'", path.display()))?;
        let item: Self = serde_json::from_slice(&bytes).map_err(|e| {
            LectioError::validation(format!("invalid content item '{}': {e}", path.display()))
        })?;
        item.validate()?;
        Ok(item)
    }
}

/// Sort items into liturgical order, keeping the first item of each category.
pub fn liturgical_order(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut out: Vec<ContentItem> = Vec::with_capacity(items.len());
    for item in items {
        if out.iter().any(|o| o.category == item.category) {
            continue;
        }
        out.push(item);
    }
    out.sort_by_key(|i| i.category);
    out
}
