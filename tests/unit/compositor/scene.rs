use std::io::Cursor;

use super::*;
use crate::model::assets::{AudioHandle, ImageHandle};
use crate::model::content::Category;
use crate::text::metrics::FixedAdvanceMetrics;

fn item() -> ContentItem {
    ContentItem {
        id: "gospel".into(),
        category: Category::Gospel,
        title: String::new(),
        citation: "Jn 1, 1".into(),
        body_text: "In principio erat Verbum".into(),
        display_date: "18 oct 2026".into(),
    }
}

fn png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn metrics() -> FixedAdvanceMetrics {
    FixedAdvanceMetrics::approximate(58.0)
}

#[test]
fn build_lays_out_text_and_decodes_images() {
    let mut bundle = MediaAssetBundle::empty("gospel");
    bundle.images = vec![ImageHandle::from_bytes(png()), ImageHandle::from_bytes(png())];
    bundle.audio = Some(AudioHandle::from_bytes(vec![0u8; 4]));

    let cfg = RenderConfig::default();
    let scene = Scene::build(&item(), &bundle, &cfg, &mut metrics(), &mut metrics()).unwrap();
    assert_eq!(scene.images.len(), 2);
    assert_eq!(scene.words.len(), 4);
    assert_eq!(scene.title_lines, vec!["Gospel"]);
    assert_eq!(scene.badge, "Evangelio · 18 oct 2026");
}

#[test]
fn build_refuses_incomplete_bundles() {
    let bundle = MediaAssetBundle::empty("gospel");
    let cfg = RenderConfig::default();
    let err = Scene::build(&item(), &bundle, &cfg, &mut metrics(), &mut metrics()).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn broken_image_fails_the_scene() {
    let mut bundle = MediaAssetBundle::empty("gospel");
    bundle.images = vec![
        ImageHandle::from_bytes(png()),
        ImageHandle::from_bytes(vec![1u8, 2, 3]),
    ];
    bundle.audio = Some(AudioHandle::from_bytes(vec![0u8; 4]));
    let err = Scene::build(
        &item(),
        &bundle,
        &RenderConfig::default(),
        &mut metrics(),
        &mut metrics(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("background image 1"));
}

#[test]
fn carry_state_starts_unscrolled_with_configured_particles() {
    let cfg = RenderConfig {
        particle_count: 7,
        ..RenderConfig::default()
    };
    let carry = CarryState::new(&cfg);
    assert_eq!(carry.scroll, ScrollState::default());
    assert_eq!(carry.particles.len(), 7);
}
