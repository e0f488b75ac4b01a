use super::*;
use crate::model::assets::MediaSource;
use crate::model::content::Category;

const CONTENT: &str = r#"{
  "2026-10-18": [
    { "id": "gospel", "category": "gospel", "body_text": "In principio erat Verbum" },
    { "id": "first", "category": "first_reading", "title": "Is 53", "body_text": "Quiso el Señor" },
    { "id": "psalm", "category": "psalm", "body_text": "Que tu misericordia" }
  ],
  "2026-10-19": []
}"#;

#[tokio::test]
async fn json_source_orders_items_liturgically() {
    let src = JsonContentSource::from_json(CONTENT).unwrap();
    assert_eq!(src.dates().collect::<Vec<_>>(), ["2026-10-18", "2026-10-19"]);

    let items = src.items_for("2026-10-18").await.unwrap();
    let cats: Vec<_> = items.iter().map(|i| i.category).collect();
    assert_eq!(
        cats,
        [Category::FirstReading, Category::Psalm, Category::Gospel]
    );
}

#[tokio::test]
async fn json_source_reports_missing_dates() {
    let src = JsonContentSource::from_json(CONTENT).unwrap();
    for date in ["2026-10-19", "2026-12-25"] {
        let err = src.items_for(date).await.unwrap_err();
        assert!(matches!(err, LectioError::Upstream(_)));
        assert!(err.to_string().contains(date));
    }
}

#[test]
fn json_source_rejects_invalid_items() {
    let bad = r#"{ "d": [ { "id": "x", "category": "gospel", "body_text": "   " } ] }"#;
    assert!(JsonContentSource::from_json(bad).is_err());
    assert!(JsonContentSource::from_json("[]").is_err());
}

fn item(id: &str) -> ContentItem {
    ContentItem {
        id: id.into(),
        category: Category::Psalm,
        title: String::new(),
        citation: String::new(),
        body_text: "Que tu misericordia".into(),
        display_date: String::new(),
    }
}

#[tokio::test]
async fn directory_assets_find_sorted_images_and_narration() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("psalm");
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["b.jpg", "a.png", "notes.txt", "narration.wav", "c.WEBP"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    let assets = DirectoryAssets::new(root.path());
    let images = assets.images(item("psalm"), None).await.unwrap();
    let names: Vec<_> = images
        .iter()
        .map(|h| {
            h.source
                .path()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(names, ["a.png", "b.jpg", "c.WEBP"]);

    let audio = assets.audio(item("psalm")).await.unwrap();
    assert_eq!(audio.source, MediaSource::Path(dir.join("narration.wav")));
}

#[tokio::test]
async fn directory_assets_fail_per_medium() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("psalm");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.png"), b"x").unwrap();

    let assets = DirectoryAssets::new(root.path());
    assert_eq!(assets.images(item("psalm"), None).await.unwrap().len(), 1);
    let err = assets.audio(item("psalm")).await.unwrap_err();
    assert!(err.to_string().contains("no narration"));
    assert!(assets.images(item("missing"), None).await.is_err());
}
