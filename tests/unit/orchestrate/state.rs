use super::*;

#[test]
fn happy_path_walks_every_state() {
    let mut s = ItemState::Pending;
    for (event, expect) in [
        (ItemEvent::AssetsStarted, ItemState::AssetsGenerating),
        (
            ItemEvent::AssetsSettled {
                complete: true,
                reason: None,
            },
            ItemState::AssetsReady,
        ),
        (ItemEvent::RenderStarted, ItemState::VideoRendering),
        (ItemEvent::RenderSucceeded, ItemState::VideoReady),
    ] {
        s = s.next(&event).unwrap();
        assert_eq!(s, expect);
    }
    assert!(s.is_settled());
}

#[test]
fn incomplete_assets_fail_and_retry_from_pending() {
    let s = ItemState::AssetsGenerating
        .next(&ItemEvent::AssetsSettled {
            complete: false,
            reason: Some("audio: quota".into()),
        })
        .unwrap();
    assert_eq!(
        s,
        ItemState::Failed {
            stage: Stage::Assets,
            reason: "audio: quota".into()
        }
    );
    assert_eq!(s.next(&ItemEvent::Retry).unwrap(), ItemState::Pending);
}

#[test]
fn failed_render_retries_without_regenerating() {
    let s = ItemState::VideoRendering
        .next(&ItemEvent::RenderFailed("encoder died".into()))
        .unwrap();
    assert!(s.is_settled());
    assert!(!s.is_running());
    assert_eq!(s.next(&ItemEvent::Retry).unwrap(), ItemState::AssetsReady);
}

#[test]
fn out_of_order_events_are_rejected() {
    assert!(ItemState::Pending.next(&ItemEvent::RenderStarted).is_err());
    assert!(ItemState::VideoReady.next(&ItemEvent::Retry).is_err());
    assert!(ItemState::AssetsReady.next(&ItemEvent::AssetsStarted).is_err());
    let err = ItemState::Pending
        .next(&ItemEvent::RenderSucceeded)
        .unwrap_err();
    assert!(err.to_string().contains("from pending"));
}

#[test]
fn serializes_with_state_tag() {
    let json = serde_json::to_value(ItemState::Failed {
        stage: Stage::Render,
        reason: "x".into(),
    })
    .unwrap();
    assert_eq!(json["state"], "failed");
    assert_eq!(json["stage"], "render");
    assert_eq!(
        serde_json::to_value(ItemState::AssetsReady).unwrap()["state"],
        "assets_ready"
    );
}
